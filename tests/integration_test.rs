use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Matcher, Server};

fn rehttp() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("rehttp"));
    // keep waits between attempts short: only the jitter remains
    cmd.env("REHTTP_MAX_DELAY", "0");
    cmd.env_remove("REHTTP_ATTEMPTS");
    cmd.env_remove("REHTTP_TIMEOUT");
    cmd
}

#[test]
fn test_get_prints_body() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body("ok")
        .create();

    rehttp()
        .arg(format!("{}/health", server.url()))
        .assert()
        .success()
        .stdout("ok")
        .stderr(predicates::str::contains("200 OK"));

    mock.assert();
}

#[test]
fn test_server_error_exhausts_attempts() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/broken")
        .with_status(500)
        .expect(2)
        .create();

    rehttp()
        .arg("--attempts")
        .arg("2")
        .arg(format!("{}/broken", server.url()))
        .assert()
        .failure()
        .stderr(predicates::str::contains(
            "after 2 attempts: invalid status: 500 Internal Server Error",
        ));

    mock.assert();
}

#[test]
fn test_attempts_from_env() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/limited")
        .with_status(429)
        .expect(1)
        .create();

    rehttp()
        .env("REHTTP_ATTEMPTS", "1")
        .arg(format!("{}/limited", server.url()))
        .assert()
        .failure()
        .stderr(predicates::str::contains(
            "after 1 attempts: invalid status: 429 Too Many Requests",
        ));

    mock.assert();
}

#[test]
fn test_client_error_is_final() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("nope")
        .expect(1)
        .create();

    rehttp()
        .arg(format!("{}/missing", server.url()))
        .assert()
        .success()
        .stdout("nope")
        .stderr(predicates::str::contains("404 Not Found"));

    mock.assert();
}

#[test]
fn test_post_json_with_headers() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/items")
        .match_header("content-type", "application/json")
        .match_header("accept", "application/json")
        .match_header("x-request-id", "42")
        .match_body(Matcher::JsonString(r#"{"name":"widget"}"#.to_string()))
        .with_status(201)
        .with_body(r#"{"id":1}"#)
        .create();

    rehttp()
        .args(["-X", "POST", "-H", "X-Request-Id: 42", "--json"])
        .arg(r#"{"name":"widget"}"#)
        .arg(format!("{}/items", server.url()))
        .assert()
        .success()
        .stdout(r#"{"id":1}"#);

    mock.assert();
}

#[test]
fn test_invalid_url_fails_before_sending() {
    rehttp()
        .arg("not a url")
        .assert()
        .failure()
        .stderr(predicates::str::contains("Invalid request URL"));
}

#[test]
fn test_zero_attempts_is_rejected() {
    rehttp()
        .args(["--attempts", "0", "http://localhost/"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("invalid max attempts: 0"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    rehttp()
        .args(["--timeout", "0", "http://localhost/"])
        .assert()
        .failure()
        .stderr(predicates::str::contains(
            "invalid timeout: must be greater than zero",
        ));
}
