use clap::Parser;
use courier_cli::{run_cli, Cli};
use courier_render::RenderState;
use httpmock::prelude::*;
use serde_json::json;

const JOBS: &str = r#"{"Patch":"MyProject/Patch_Build"}"#;

struct RelayHarness {
    jenkins: MockServer,
    slack: MockServer,
}

impl RelayHarness {
    fn new() -> Self {
        let harness = Self {
            jenkins: MockServer::start(),
            slack: MockServer::start(),
        };
        harness.slack.mock(|when, then| {
            when.method(POST)
                .path("/chat.postMessage")
                .header("authorization", "Bearer xoxb-test")
                .json_body_includes(json!({"channel": "C1", "thread_ts": "100.0"}).to_string());
            then.status(200)
                .json_body(json!({"ok": true, "channel": "C1", "ts": "100.1"}));
        });
        harness
    }

    fn cli(&self, extra: &[&str], command: &[&str]) -> Cli {
        let jenkins_url = self.jenkins.base_url();
        let slack_url = self.slack.base_url();
        let mut argv = vec![
            "courier",
            "--channel",
            "C1",
            "--thread-ts",
            "100.0",
            "--jenkins-url",
            jenkins_url.as_str(),
            "--jenkins-user",
            "bot",
            "--jenkins-token",
            "secret",
            "--jenkins-jobs",
            JOBS,
            "--slack-api-base",
            slack_url.as_str(),
            "--slack-bot-token",
            "xoxb-test",
            "--slack-retry-base-delay-ms",
            "1",
        ];
        argv.extend_from_slice(extra);
        argv.extend_from_slice(command);
        Cli::try_parse_from(argv).expect("parse cli")
    }

    fn expect_update(&self, text: &str) -> httpmock::Mock<'_> {
        self.slack.mock(|when, then| {
            when.method(POST)
                .path("/chat.update")
                .json_body_includes(
                    json!({"channel": "C1", "ts": "100.1", "text": text}).to_string(),
                );
            then.status(200)
                .json_body(json!({"ok": true, "channel": "C1", "ts": "100.1"}));
        })
    }
}

#[tokio::test]
async fn integration_build_command_relays_triggered_build_summary() {
    let harness = RelayHarness::new();
    let queue_url = format!("{}/queue/item/7/", harness.jenkins.base_url());
    let trigger = harness.jenkins.mock(|when, then| {
        when.method(POST)
            .path("/job/MyProject/job/Patch_Build/build")
            .header_exists("authorization");
        then.status(201).header("Location", queue_url.as_str());
    });
    harness.jenkins.mock(|when, then| {
        when.method(GET).path("/queue/item/7/api/json");
        then.status(200).json_body(json!({"executable": {"number": 42}}));
    });
    harness.jenkins.mock(|when, then| {
        when.method(GET)
            .path("/job/MyProject/job/Patch_Build/42/api/json");
        then.status(200).json_body(json!({
            "building": false,
            "result": "SUCCESS",
            "duration": 1234,
            "number": 42
        }));
    });
    harness.jenkins.mock(|when, then| {
        when.method(GET)
            .path("/job/MyProject/job/Patch_Build/42/consoleText");
        then.status(200).body("Finished: SUCCESS\n");
    });
    let summary = harness.expect_update(
        "*Patch* MyProject/Patch_Build #42: *success* in 1.2s\n```\nFinished: SUCCESS\n```",
    );

    let state = run_cli(harness.cli(&[], &["build", "Patch"]))
        .await
        .expect("build command");

    assert_eq!(state, RenderState::Finished);
    trigger.assert_calls(1);
    summary.assert_calls(2);
}

#[tokio::test]
async fn integration_build_command_reports_absent_fallback_without_retrying() {
    let harness = RelayHarness::new();
    let trigger = harness.jenkins.mock(|when, then| {
        when.method(POST).path("/job/MyProject/job/Patch_Build/build");
        then.status(500).body("jenkins is restarting");
    });
    let last_build = harness.jenkins.mock(|when, then| {
        when.method(GET)
            .path("/job/MyProject/job/Patch_Build/lastBuild/api/json");
        then.status(200).json_body(json!({
            "building": true,
            "result": null,
            "duration": 0,
            "number": 43
        }));
    });
    let notice = harness.slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.update")
            .body_includes("Could not trigger a new build");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "100.1"}));
    });
    let failure = harness.slack.mock(|when, then| {
        when.method(POST)
            .path("/chat.update")
            .body_includes("no completed build available for 'Patch'");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "100.1"}));
    });

    let state = run_cli(harness.cli(&[], &["build", "Patch"]))
        .await
        .expect("build command");

    assert_eq!(state, RenderState::Failed);
    trigger.assert_calls(1);
    last_build.assert_calls(1);
    notice.assert_calls(1);
    failure.assert_calls(1);
}

#[tokio::test]
async fn integration_last_build_command_never_triggers() {
    let harness = RelayHarness::new();
    let trigger = harness.jenkins.mock(|when, then| {
        when.method(POST).path("/job/MyProject/job/Patch_Build/build");
        then.status(201);
    });
    harness.jenkins.mock(|when, then| {
        when.method(GET)
            .path("/job/MyProject/job/Patch_Build/lastBuild/api/json");
        then.status(200).json_body(json!({
            "building": false,
            "result": "ABORTED",
            "duration": 400,
            "number": 40
        }));
    });
    harness.jenkins.mock(|when, then| {
        when.method(GET)
            .path("/job/MyProject/job/Patch_Build/40/consoleText");
        then.status(500);
    });
    let summary = harness.expect_update(
        "*Patch* MyProject/Patch_Build #40: *aborted* in 400ms (last completed build)\n_(no console output)_",
    );

    let state = run_cli(harness.cli(&[], &["last-build", "Patch"]))
        .await
        .expect("last-build command");

    assert_eq!(state, RenderState::Finished);
    trigger.assert_calls(0);
    summary.assert_calls(2);
}

#[cfg(unix)]
#[tokio::test]
async fn integration_brainstorm_command_streams_assistant_output() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tempdir");
    let script = dir.path().join("mock-claude.sh");
    std::fs::write(
        &script,
        "#!/bin/sh\nset -eu\nprintf '%s\\n' '{\"type\":\"result\",\"result\":\"Ship the patch after QA.\"}'\n",
    )
    .expect("write script");
    let mut perms = std::fs::metadata(&script)
        .expect("script metadata")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).expect("chmod script");
    let script = script.display().to_string();

    let harness = RelayHarness::new();
    let answer = harness.expect_update("Ship the patch after QA.");

    let state = run_cli(harness.cli(
        &["--claude-command", script.as_str()],
        &["brainstorm", "should", "we", "ship?"],
    ))
    .await
    .expect("brainstorm command");

    assert_eq!(state, RenderState::Finished);
    answer.assert_calls(2);
}
