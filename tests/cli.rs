use std::fs;
use std::path::Path;

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::json;

const CG_VARS: &[&str] = &[
    "CG_API_URL",
    "CG_API",
    "CG_USERNAME",
    "CG_PASSWORD",
    "CG_TOKEN",
    "CG_TOKEN_FILE",
    "CG_APP_NAME",
    "CG_JOB_NAME",
    "CG_JOB_ID",
    "CG_CLIENT_ID",
    "CG_CLIENT_IP",
    "CG_INSECURE",
    "CG_ALLOW_PRIVATE_ENDPOINT",
];

fn cg_cmd(server: &MockServer, workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cg").expect("cg binary");
    for var in CG_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(workdir)
        .env("CG_TOKEN_FILE", workdir.join("token"))
        .arg("--url")
        .arg(server.url("/rest"))
        .arg("--allow-private-endpoint");
    cmd
}

#[test]
fn token_issue_prints_and_saves_token() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let issue = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/token")
            .x_www_form_urlencoded_tuple("username", "alice")
            .x_www_form_urlencoded_tuple("lifetime", "3600")
            .x_www_form_urlencoded_tuple("binding", "0");
        then.status(200)
            .json_body(json!({"status": "success", "result": {"token": "abc123"}}));
    });

    cg_cmd(&server, dir.path())
        .env("CG_USERNAME", "alice")
        .env("CG_PASSWORD", "secret")
        .args(["token", "issue", "--lifetime", "3600", "--no-binding", "--save"])
        .assert()
        .success()
        .stdout("abc123\n");

    issue.assert();
    assert_eq!(fs::read_to_string(dir.path().join("token")).unwrap(), "abc123\n");
}

#[test]
fn stored_token_is_used_and_cleared_on_revoke() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("token"), "abc123\n").unwrap();
    let revoke = server.mock(|when, then| {
        when.method(DELETE)
            .path("/rest/token")
            .query_param("token", "abc123");
        then.status(200)
            .json_body(json!({"status": "success", "result": {}}));
    });

    cg_cmd(&server, dir.path())
        .args(["-u", "alice", "--password", "secret", "token", "revoke"])
        .assert()
        .success()
        .stdout("");

    revoke.assert();
    assert!(!dir.path().join("token").exists());
}

#[test]
fn gateway_error_exits_with_one_and_reports_message() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(PUT).path("/rest/token");
        then.status(200).json_body(json!({
            "status": "error",
            "result": {"error_code": 3, "message": "Token expired"}
        }));
    });

    cg_cmd(&server, dir.path())
        .args(["--token", "stale", "token", "verify"])
        .assert()
        .code(1)
        .stderr(contains("Error 3").and(contains("Token expired")));
}

#[test]
fn verify_prints_remaining_lifetime() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(PUT)
            .path("/rest/token")
            .x_www_form_urlencoded_tuple("consumer", "portal");
        then.status(200)
            .json_body(json!({"status": "success", "result": {"lifetime": "1200"}}));
    });

    cg_cmd(&server, dir.path())
        .env("CG_TOKEN", "abc123")
        .env("CG_CLIENT_ID", "portal")
        .args(["token", "verify"])
        .assert()
        .success()
        .stdout("1200\n");
}

#[test]
fn missing_token_fails_before_any_request() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let any = server.mock(|when, then| {
        when.any_request();
        then.status(200);
    });

    cg_cmd(&server, dir.path())
        .args(["-a", "myapp", "app", "register"])
        .assert()
        .code(1)
        .stderr(contains("CG_TOKEN"));

    any.assert_hits(0);
}

#[test]
fn app_getinfo_writes_result_to_default_file_once() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let info = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/app")
            .query_param("app", "myapp")
            .query_param("token", "abc123");
        then.status(200).json_body(json!({
            "status": "success",
            "result": {"app": "myapp", "author": "alice"}
        }));
    });

    cg_cmd(&server, dir.path())
        .args(["-t", "abc123", "-a", "myapp", "app", "getinfo"])
        .assert()
        .success();

    let written = fs::read_to_string(dir.path().join("getinfo_out.json")).unwrap();
    assert_eq!(
        written,
        "{\n    \"app\": \"myapp\",\n    \"author\": \"alice\"\n}\n"
    );

    // The default file now exists and must not be overwritten.
    cg_cmd(&server, dir.path())
        .args(["-t", "abc123", "-a", "myapp", "app", "getinfo"])
        .assert()
        .code(1)
        .stderr(contains("getinfo_out.json"));

    info.assert_hits(1);
}

#[test]
fn app_configure_policy_controls_empty_object() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("conf.json");
    fs::write(&config_path, "{}").unwrap();
    let configure = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/appconfig")
            .x_www_form_urlencoded_tuple("config", "{}");
        then.status(200)
            .json_body(json!({"status": "success", "result": {}}));
    });

    cg_cmd(&server, dir.path())
        .args(["-t", "abc123", "-a", "myapp", "app", "configure", "--configfile"])
        .arg(&config_path)
        .assert()
        .success();

    cg_cmd(&server, dir.path())
        .args(["-t", "abc123", "-a", "myapp", "app", "configure", "--strict-config", "--configfile"])
        .arg(&config_path)
        .assert()
        .code(1)
        .stderr(contains("incorrectly formatted"));

    configure.assert_hits(1);
}

#[test]
fn job_launch_then_output() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("job.json");
    fs::write(&config_path, "{\"steps\": 2}").unwrap();
    let launch = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/job")
            .x_www_form_urlencoded_tuple("name", "run1")
            .x_www_form_urlencoded_tuple("app", "myapp")
            .x_www_form_urlencoded_tuple("computation", "{\"ncpu\":2}");
        then.status(200)
            .json_body(json!({"status": "success", "result": {"id": "job-9"}}));
    });
    let output = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/joboutput")
            .query_param("id", "job-9");
        then.status(200).json_body(json!({
            "status": "success",
            "result": {"uri": "https://gw.example.org/out/job-9.zip"}
        }));
    });

    cg_cmd(&server, dir.path())
        .env("CG_TOKEN", "abc123")
        .env("CG_APP_NAME", "myapp")
        .args(["job", "launch", "-j", "run1", "--ncpu", "2", "--configfile"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout("job-9\n");

    cg_cmd(&server, dir.path())
        .env("CG_TOKEN", "abc123")
        .env("CG_JOB_ID", "job-9")
        .args(["job", "output"])
        .assert()
        .success()
        .stdout("https://gw.example.org/out/job-9.zip\n");

    launch.assert();
    output.assert();
}

#[test]
fn version_prints_version() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/rest/version");
        then.status(200).json_body(json!({"version": "3.1.4"}));
    });

    cg_cmd(&server, dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout("3.1.4\n");
}

#[test]
fn localhost_endpoint_is_rejected_without_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("cg").expect("cg binary");
    for var in CG_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir.path())
        .args(["--url", "http://localhost:8080/rest", "version"])
        .assert()
        .code(1)
        .stderr(contains("invalid URL"));
}

#[test]
fn switch_env_vars_accept_numeric_values() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/rest/version");
        then.status(200).json_body(json!({"version": "3.1.4"}));
    });

    let mut cmd = Command::cargo_bin("cg").expect("cg binary");
    for var in CG_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir.path())
        .env("CG_TOKEN_FILE", dir.path().join("token"))
        .env("CG_API_URL", server.url("/rest"))
        .env("CG_ALLOW_PRIVATE_ENDPOINT", "1")
        .env("CG_INSECURE", "1")
        .arg("version")
        .assert()
        .success()
        .stdout("3.1.4\n");
}

#[test]
fn unreadable_token_file_does_not_block_tokenless_commands() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("token")).unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/rest/version");
        then.status(200).json_body(json!({"version": "3.1.4"}));
    });

    cg_cmd(&server, dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout("3.1.4\n");

    cg_cmd(&server, dir.path())
        .args(["-a", "myapp", "app", "getinfo"])
        .assert()
        .code(1)
        .stderr(contains("token"));
}
