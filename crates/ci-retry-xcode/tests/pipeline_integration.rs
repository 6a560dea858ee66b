//! End-to-end tests for the check and report pipelines.
//!
//! `xcresulttool` is replaced by small `sh` scripts so the tests run without Xcode.

use std::path::{Path, PathBuf};

use ci_retry_core::fakes::RecordingRemediator;
use ci_retry_core::{Decision, RemediationTier, RetryError, SignatureProfile};
use ci_retry_xcode::{
    check_build_errors, gather_failures, CheckConfig, ReportConfig, XcresultToolConfig,
};
use serde_json::json;
use tempfile::{tempdir, TempDir};

/// Workspace with a `log/` directory and an env file path.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("log")).unwrap();
        Self { dir }
    }

    fn log_dir(&self) -> PathBuf {
        self.dir.path().join("log")
    }

    fn env_path(&self) -> PathBuf {
        self.dir.path().join("github_env")
    }

    fn write_log(&self, name: &str, contents: &str) {
        std::fs::write(self.log_dir().join(name), contents).unwrap();
    }

    fn add_bundle(&self, name: &str) -> PathBuf {
        let path = self.log_dir().join(name);
        std::fs::create_dir(&path).unwrap();
        path
    }

    /// A stub tool that runs `body` under `sh`, ignoring its arguments.
    fn stub_tool(&self, body: &str, timeout_secs: u64) -> XcresultToolConfig {
        let script = self.dir.path().join("xcresulttool.sh");
        std::fs::write(&script, body).unwrap();
        stub_config(&script, timeout_secs)
    }

    /// A stub tool that prints `value` as JSON.
    fn json_tool(&self, value: serde_json::Value) -> XcresultToolConfig {
        let payload = self.dir.path().join("payload.json");
        std::fs::write(&payload, value.to_string()).unwrap();
        self.stub_tool(&format!("cat '{}'\n", payload.display()), 10)
    }

    fn check_config(&self, tool: XcresultToolConfig) -> CheckConfig {
        CheckConfig {
            log_dir: self.log_dir(),
            env_file: Some(self.env_path()),
            tool,
            ..Default::default()
        }
    }

    fn env_contents(&self) -> Option<String> {
        std::fs::read_to_string(self.env_path()).ok()
    }
}

fn stub_config(script: &Path, timeout_secs: u64) -> XcresultToolConfig {
    XcresultToolConfig {
        program: "sh".to_string(),
        base_args: vec![script.display().to_string()],
        timeout_secs,
    }
}

fn error_summaries(messages: &[&str]) -> serde_json::Value {
    let values: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| json!({ "message": { "_type": { "_name": "String" }, "_value": m } }))
        .collect();
    json!({ "issues": { "errorSummaries": { "_values": values } } })
}

// ---------------------------------------------------------------------------
// check-build-errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_linker_error_in_log_clears_derived_data() {
    let fx = Fixture::new();
    fx.write_log("build.log", "Undefined symbols for architecture arm64\nld: symbol(s) not found\n");
    let config = fx.check_config(fx.stub_tool("exit 1\n", 10));

    let remediator = RecordingRemediator::new();
    let outcome = check_build_errors(&config, &remediator).await.unwrap();

    assert_eq!(
        outcome.decision,
        Decision::Remediate {
            tier: RemediationTier::ClearDerivedData,
            signature: "ld: symbol(s) not found".to_string(),
            source: "build.log".to_string(),
        }
    );
    assert_eq!(remediator.calls(), vec![RemediationTier::ClearDerivedData]);
    assert_eq!(fx.env_contents().as_deref(), Some("RETRY_BUILD=true\n"));
}

#[tokio::test]
async fn test_clean_logs_leave_env_untouched() {
    let fx = Fixture::new();
    fx.write_log("build.log", "** BUILD SUCCEEDED **\n");
    fx.write_log("test.log", "Executed 12 tests, with 0 failures\n");
    let config = fx.check_config(fx.json_tool(error_summaries(&[])));
    fx.add_bundle("Tests.xcresult");

    let remediator = RecordingRemediator::new();
    let outcome = check_build_errors(&config, &remediator).await.unwrap();

    assert_eq!(outcome.decision, Decision::NoAction);
    assert!(remediator.calls().is_empty());
    assert!(fx.env_contents().is_none());
}

#[tokio::test]
async fn test_bundle_error_summary_clears_build_cache() {
    let fx = Fixture::new();
    fx.write_log("build.log", "The Xcode build system has crashed\n");
    fx.add_bundle("UITests.xcresult");
    let config = fx.check_config(fx.json_tool(error_summaries(&[
        "Test crashed with signal kill",
        "Failed to load the test bundle. Underlying Error: Crash",
    ])));

    let remediator = RecordingRemediator::new();
    let outcome = check_build_errors(&config, &remediator).await.unwrap();

    // Cache tier outranks the retry-only match in build.log.
    assert_eq!(outcome.decision.tier(), Some(RemediationTier::ClearBuildCache));
    assert_eq!(remediator.calls(), vec![RemediationTier::ClearBuildCache]);
    assert!(outcome.flag_written);
}

#[tokio::test]
async fn test_malformed_bundle_json_is_skipped() {
    let fx = Fixture::new();
    fx.add_bundle("A.xcresult");
    fx.write_log("z.log", "Command CodeSign failed with a nonzero exit code\n");
    let config = fx.check_config(fx.stub_tool("echo '{not json'\n", 10));

    let remediator = RecordingRemediator::new();
    let outcome = check_build_errors(&config, &remediator).await.unwrap();

    assert_eq!(outcome.decision.tier(), Some(RemediationTier::RetryOnly));
    assert!(remediator.calls().is_empty());
    assert_eq!(fx.env_contents().as_deref(), Some("RETRY_BUILD=true\n"));
}

#[tokio::test]
async fn test_tool_timeout_is_skipped() {
    let fx = Fixture::new();
    fx.add_bundle("Slow.xcresult");
    fx.write_log("build.log", "clang: error: unable to execute command: Segmentation fault\n");
    let config = fx.check_config(fx.stub_tool("sleep 5\n", 1));

    let remediator = RecordingRemediator::new();
    let outcome = check_build_errors(&config, &remediator).await.unwrap();

    assert_eq!(
        outcome.decision,
        Decision::Remediate {
            tier: RemediationTier::RetryOnly,
            signature: "Segmentation fault".to_string(),
            source: "build.log".to_string(),
        }
    );
}

#[tokio::test]
async fn test_missing_log_dir_writes_no_flag() {
    let fx = Fixture::new();
    let mut config = fx.check_config(XcresultToolConfig::default());
    config.log_dir = fx.dir.path().join("no-such-dir");

    let remediator = RecordingRemediator::new();
    let err = check_build_errors(&config, &remediator).await.unwrap_err();

    assert!(matches!(err, RetryError::LogDirMissing(_)));
    assert!(fx.env_contents().is_none());
}

#[tokio::test]
async fn test_legacy_profile_ignores_bundles_and_linker_errors() {
    let fx = Fixture::new();
    fx.write_log("build.log", "ld: symbol(s) not found\n");
    fx.add_bundle("Tests.xcresult");
    let mut config = fx.check_config(fx.json_tool(error_summaries(&[
        "The Xcode build system has crashed",
    ])));
    config.profile = SignatureProfile::Legacy;

    let remediator = RecordingRemediator::new();
    let outcome = check_build_errors(&config, &remediator).await.unwrap();

    assert_eq!(outcome.decision, Decision::NoAction);
    assert!(fx.env_contents().is_none());
}

#[tokio::test]
async fn test_legacy_profile_reads_log_infix_names() {
    let fx = Fixture::new();
    fx.write_log("build.log.txt", "error: The Xcode build system has crashed\n");
    let mut config = fx.check_config(XcresultToolConfig::default());
    config.profile = SignatureProfile::Legacy;

    let remediator = RecordingRemediator::new();
    let outcome = check_build_errors(&config, &remediator).await.unwrap();

    match &outcome.decision {
        Decision::Remediate { source, tier, .. } => {
            assert_eq!(source, "build.log.txt");
            assert_eq!(*tier, RemediationTier::RetryOnly);
        }
        other => panic!("expected Remediate, got {:?}", other),
    }
    assert_eq!(fx.env_contents().as_deref(), Some("RETRY_BUILD=true\n"));

    // The shared profile only reads `*.log`.
    config.profile = SignatureProfile::Shared;
    let outcome = check_build_errors(&config, &remediator).await.unwrap();
    assert_eq!(outcome.decision, Decision::NoAction);
}

#[tokio::test]
async fn test_unconfigured_env_file_is_noop() {
    let fx = Fixture::new();
    fx.write_log("build.log", "error: stat cache file\n");
    let mut config = fx.check_config(XcresultToolConfig::default());
    config.env_file = None;

    let remediator = RecordingRemediator::new();
    let outcome = check_build_errors(&config, &remediator).await.unwrap();

    assert_eq!(outcome.decision.tier(), Some(RemediationTier::RetryOnly));
    assert!(!outcome.flag_written);
}

// ---------------------------------------------------------------------------
// show-test-failures
// ---------------------------------------------------------------------------

fn test_results_payload() -> serde_json::Value {
    json!({
        "devices": [
            { "deviceId": "6F1B", "deviceName": "iPhone 15", "osVersion": "17.0" }
        ],
        "testNodes": [{
            "nodeType": "Test Plan",
            "name": "App",
            "result": "Failed",
            "children": [{
                "nodeType": "Unit test bundle",
                "name": "AppTests",
                "result": "Failed",
                "children": [{
                    "nodeType": "Test Suite",
                    "name": "SuiteA",
                    "result": "Failed",
                    "children": [{
                        "nodeType": "Test Case",
                        "name": "testFoo",
                        "result": "Failed",
                        "children": [{
                            "nodeType": "Device",
                            "name": "iPhone 15 (17.0)",
                            "children": [{
                                "nodeType": "Failure Message",
                                "name": "SuiteA.swift:12: XCTAssertTrue failed",
                                "details": "XCTAssertTrue failed - expected login"
                            }]
                        }]
                    }, {
                        "nodeType": "Test Case",
                        "name": "testBar",
                        "result": "Passed"
                    }]
                }]
            }]
        }]
    })
}

#[tokio::test]
async fn test_gather_failures_from_log_dir() {
    let fx = Fixture::new();
    fx.add_bundle("Tests.xcresult");
    let config = ReportConfig {
        log_dir: fx.log_dir(),
        bundle: None,
        tool: fx.json_tool(test_results_payload()),
    };

    let failures = gather_failures(&config).await;

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].path, vec!["AppTests", "SuiteA", "testFoo"]);
    assert_eq!(failures[0].device.as_deref(), Some("iPhone 15 (17.0)"));
    assert_eq!(failures[0].message, "XCTAssertTrue failed - expected login");
}

#[tokio::test]
async fn test_gather_failures_explicit_bundle() {
    let fx = Fixture::new();
    let bundle = fx.dir.path().join("Explicit.xcresult");
    std::fs::create_dir(&bundle).unwrap();
    let config = ReportConfig {
        log_dir: fx.dir.path().join("no-such-dir"),
        bundle: Some(bundle),
        tool: fx.json_tool(test_results_payload()),
    };

    assert_eq!(gather_failures(&config).await.len(), 1);
}

#[tokio::test]
async fn test_gather_failures_tool_failure_is_empty() {
    let fx = Fixture::new();
    fx.add_bundle("Tests.xcresult");
    let config = ReportConfig {
        log_dir: fx.log_dir(),
        bundle: None,
        tool: fx.stub_tool("echo 'xcresulttool: error' >&2\nexit 65\n", 10),
    };

    assert!(gather_failures(&config).await.is_empty());
}
