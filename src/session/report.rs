// src/session/report.rs
// Human-readable summaries and on-disk artifacts

use super::{AppliedConfig, SessionSummary, TestOutcome};
use crate::classifier::ClassifiedError;
use crate::error::Result;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const RULE: &str = "============================================================";

/// Timestamp used in artifact names
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Keep artifact names to `[A-Za-z0-9_-]`
fn file_stem(test_name: &str) -> String {
    test_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Render the session summary: counts, grouped results, distinct errors
pub fn render_summary(summary: &SessionSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Test session started {}\n", summary.started_at.to_rfc3339()));
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "Total: {}  Passed: {}  Failed: {}  Skipped: {}\n",
        summary.total, summary.passed, summary.failed, summary.skipped
    ));
    out.push_str(&format!("Duration: {:.2}s\n", summary.duration.as_secs_f64()));

    for (title, outcome) in [
        ("Passed", TestOutcome::Passed),
        ("Failed", TestOutcome::Failed),
        ("Skipped", TestOutcome::Skipped),
    ] {
        let group: Vec<_> = summary.records.iter().filter(|r| r.outcome == outcome).collect();
        if group.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{} tests:\n", title));
        for record in group {
            match &record.reason {
                Some(reason) => out.push_str(&format!("  - {}: {}\n", record.name, reason)),
                None => out.push_str(&format!(
                    "  - {} ({:.2}s)\n",
                    record.name,
                    record.duration.as_secs_f64()
                )),
            }
        }
    }

    if !summary.errors.is_empty() {
        out.push_str(&format!("\nErrors ({} distinct):\n", summary.errors.len()));
        for entry in &summary.errors {
            out.push_str(&indent(&entry.error.render(), "  "));
            out.push_str(&format!("\n    tests: {}\n", entry.tests.join(", ")));
        }
    }
    out
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|l| format!("{}{}", prefix, l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `session_<ts>.log` and `session_<ts>.json` under `dir`
pub fn write_session_artifacts(dir: &Path, summary: &SessionSummary) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let ts = timestamp();

    let log = dir.join(format!("session_{}.log", ts));
    fs::write(&log, &summary.report)?;
    let json = dir.join(format!("session_{}.json", ts));
    fs::write(&json, serde_json::to_string_pretty(summary)?)?;

    debug!(log = %log.display(), "Wrote session artifacts");
    Ok(vec![log, json])
}

#[derive(Debug, Serialize)]
struct TestErrorReport<'a> {
    test_name: &'a str,
    timestamp: String,
    applied: Option<&'a AppliedConfig>,
    errors: &'a [ClassifiedError],
    diagnostic_text: &'a str,
}

/// `errors_<test>_<ts>.log` and `.json` for one failing test
pub fn write_test_artifacts(
    dir: &Path,
    test_name: &str,
    applied: Option<&AppliedConfig>,
    errors: &[ClassifiedError],
    diagnostic_text: &str,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let ts = timestamp();
    let stem = format!("errors_{}_{}", file_stem(test_name), ts);

    let mut log = String::new();
    log.push_str(&format!("Test: {}\nTime: {}\n", test_name, chrono::Local::now().to_rfc3339()));
    if let Some(applied) = applied {
        log.push_str(&format!(
            "\nVariant:\n{}\n\nGenerated configuration:\n{}\n",
            serde_json::to_string_pretty(&applied.variant)?,
            applied.config_text.trim_end()
        ));
    }
    log.push_str(&format!("\n{}\nErrors:\n", RULE));
    for error in errors {
        log.push_str(&error.render());
        log.push('\n');
        if let Some(ctx) = &error.context {
            log.push_str(&format!("  context:\n{}\n", indent(ctx, "    ")));
        }
    }
    log.push_str(&format!("\n{}\nDiagnostic output:\n{}\n", RULE, diagnostic_text));

    let log_path = dir.join(format!("{}.log", stem));
    fs::write(&log_path, log)?;

    let report = TestErrorReport {
        test_name,
        timestamp: ts,
        applied,
        errors,
        diagnostic_text,
    };
    let json_path = dir.join(format!("{}.json", stem));
    fs::write(&json_path, serde_json::to_string_pretty(&report)?)?;

    debug!(test = test_name, log = %log_path.display(), "Wrote error artifacts");
    Ok(vec![log_path, json_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ErrorClassifier;
    use crate::generator::ConfigurationVariant;
    use tempfile::TempDir;

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(file_stem("random_config_3"), "random_config_3");
        assert_eq!(file_stem("matrix/desktop=gnome"), "matrix_desktop_gnome");
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
    }

    #[test]
    fn test_write_test_artifacts() {
        let dir = TempDir::new().unwrap();
        let applied = AppliedConfig {
            test_name: "gaming_profile".into(),
            variant: ConfigurationVariant::new().with("systemType", "gaming"),
            config_text: "{\n  systemType = \"gaming\";\n}\n".into(),
        };
        let raw = "error: attribute 'foo' missing";
        let errors = vec![ErrorClassifier::new().classify(raw, "gaming_profile")];

        let paths = write_test_artifacts(dir.path(), "gaming_profile", Some(&applied), &errors, raw).unwrap();
        assert_eq!(paths.len(), 2);

        let log = fs::read_to_string(&paths[0]).unwrap();
        assert!(log.contains("Test: gaming_profile"));
        assert!(log.contains("systemType = \"gaming\""));
        assert!(log.contains("[undefined_reference]"));

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths[1]).unwrap()).unwrap();
        assert_eq!(json["errors"][0]["kind"], "undefined_reference");
        assert_eq!(json["applied"]["variant"]["systemType"], "gaming");
    }
}
