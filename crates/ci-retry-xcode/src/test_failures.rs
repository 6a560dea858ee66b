//! `show-test-failures`: collect failures from result bundles and print them.

use std::path::PathBuf;

use ci_retry_core::{collect_failures, format_annotation, format_summary, FailureRecord};
use tracing::{debug, warn};

use crate::config::ReportConfig;
use crate::source::LogSource;
use crate::xcresult::XcresultTool;

/// Bundles to inspect: the explicit `.xcresult` argument when it exists,
/// otherwise every bundle in the log directory.
pub fn bundles_to_scan(config: &ReportConfig) -> Vec<PathBuf> {
    if let Some(bundle) = &config.bundle {
        if bundle.to_string_lossy().ends_with(".xcresult") {
            if bundle.exists() {
                return vec![bundle.clone()];
            }
            warn!(path = %bundle.display(), "result bundle not found");
            return Vec::new();
        }
    }

    match LogSource::new(&config.log_dir).bundles() {
        Ok(bundles) => bundles,
        Err(e) => {
            debug!("no result bundles to scan: {}", e);
            Vec::new()
        }
    }
}

/// Failures across all bundles, in bundle order then tree order.
///
/// A bundle whose extraction fails or times out contributes nothing.
pub async fn gather_failures(config: &ReportConfig) -> Vec<FailureRecord> {
    let tool = XcresultTool::new(config.tool.clone());
    let mut failures = Vec::new();

    for bundle in bundles_to_scan(config) {
        match tool.test_results(&bundle).await {
            Ok(results) => failures.extend(collect_failures(&results)),
            Err(e) => warn!(
                path = %bundle.display(),
                "failed to get test results: {}", e
            ),
        }
    }
    failures
}

/// Annotation lines followed by the summary block. Empty when there are no failures.
pub fn render_report(failures: &[FailureRecord]) -> String {
    let Some(summary) = format_summary(failures) else {
        return String::new();
    };

    let mut out = String::new();
    for failure in failures {
        out.push_str(&format_annotation(failure));
        out.push('\n');
    }
    out.push_str(&summary);
    out
}

/// Gather and print the report to stdout. Prints nothing without failures.
pub async fn show_test_failures(config: &ReportConfig) -> Vec<FailureRecord> {
    let failures = gather_failures(config).await;
    let report = render_report(&failures);
    if !report.is_empty() {
        print!("{}", report);
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_render_report_empty() {
        assert_eq!(render_report(&[]), "");
    }

    #[test]
    fn test_render_report_annotations_first() {
        let failures = vec![FailureRecord {
            path: vec!["AppTests".to_string(), "testFoo".to_string()],
            message: "50% done".to_string(),
            device: None,
        }];
        let report = render_report(&failures);
        assert!(report.starts_with("::error title=AppTests/testFoo::50%25 done\n"));
        assert!(report.contains("Total failures: 1"));
    }

    #[test]
    fn test_explicit_bundle_must_exist() {
        let dir = tempdir().unwrap();
        let config = ReportConfig {
            log_dir: dir.path().join("log"),
            bundle: Some(dir.path().join("Missing.xcresult")),
            ..Default::default()
        };
        assert!(bundles_to_scan(&config).is_empty());
    }

    #[test]
    fn test_non_bundle_argument_falls_back_to_log_dir() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("A.xcresult")).unwrap();
        let config = ReportConfig {
            log_dir: dir.path().to_path_buf(),
            bundle: Some(PathBuf::from("something-else")),
            ..Default::default()
        };
        assert_eq!(bundles_to_scan(&config), vec![dir.path().join("A.xcresult")]);
    }

    #[test]
    fn test_missing_log_dir_scans_nothing() {
        let dir = tempdir().unwrap();
        let config = ReportConfig {
            log_dir: dir.path().join("log"),
            ..Default::default()
        };
        assert!(bundles_to_scan(&config).is_empty());
    }
}
