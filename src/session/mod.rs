// src/session/mod.rs
// Session-scoped state: error ledger, applied configs, pass/fail aggregation

pub mod report;

use crate::classifier::{ClassifiedError, ErrorSignature};
use crate::generator::ConfigurationVariant;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// The configuration a test staged, kept for failure reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedConfig {
    pub test_name: String,
    pub variant: ConfigurationVariant,
    pub config_text: String,
}

/// One distinct failure across the session and the tests that hit it
#[derive(Debug, Clone, Serialize)]
pub struct SessionError {
    #[serde(flatten)]
    pub error: ClassifiedError,
    pub tests: Vec<String>,
}

#[derive(Debug, Default)]
struct Ledger {
    session: Vec<SessionError>,
    by_signature: HashMap<ErrorSignature, usize>,
    seen: HashSet<ClassifiedError>,
    per_test: BTreeMap<String, Vec<ClassifiedError>>,
    applied: BTreeMap<String, AppliedConfig>,
}

/// Per-run state shared by the config manager and the reporter.
///
/// Constructed once per session and passed explicitly; nothing here is
/// process-global. Errors are deduplicated twice: per test on the full
/// error identity, and session-wide on the identity without the test name.
#[derive(Debug, Default)]
pub struct SessionContext {
    ledger: Mutex<Ledger>,
}

impl SessionContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a classified error. Returns false for an exact duplicate.
    pub fn record_error(&self, error: ClassifiedError) -> bool {
        let mut ledger = self.ledger();
        if !ledger.seen.insert(error.clone()) {
            return false;
        }

        let test = error.test_name.clone();
        ledger
            .per_test
            .entry(test.clone())
            .or_default()
            .push(error.clone());

        let signature = error.signature();
        match ledger.by_signature.get(&signature).copied() {
            Some(idx) => ledger.session[idx].tests.push(test),
            None => {
                let idx = ledger.session.len();
                ledger.by_signature.insert(signature, idx);
                ledger.session.push(SessionError {
                    error,
                    tests: vec![test],
                });
            }
        }
        true
    }

    /// Errors recorded for one test, in first-seen order
    pub fn errors_for(&self, test_name: &str) -> Vec<ClassifiedError> {
        self.ledger()
            .per_test
            .get(test_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Deduplicated session-wide errors, in first-seen order
    pub fn session_errors(&self) -> Vec<SessionError> {
        self.ledger().session.clone()
    }

    pub fn error_count(&self) -> usize {
        self.ledger().session.len()
    }

    pub fn record_applied(&self, applied: AppliedConfig) {
        self.ledger()
            .applied
            .insert(applied.test_name.clone(), applied);
    }

    pub fn applied_for(&self, test_name: &str) -> Option<AppliedConfig> {
        self.ledger().applied.get(test_name).cloned()
    }

    /// Drop everything recorded so far
    pub fn reset(&self) {
        *self.ledger() = Ledger::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TestOutcome {
    Passed,
    Failed,
    Skipped,
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRunRecord {
    pub name: String,
    pub outcome: TestOutcome,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TestRunRecord {
    pub fn passed(&self) -> bool {
        self.outcome == TestOutcome::Passed
    }
}

/// Aggregate of one session. `passed + failed + skipped == total`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Local>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub records: Vec<TestRunRecord>,
    pub errors: Vec<SessionError>,
    #[serde(skip)]
    pub report: String,
}

impl SessionSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Collects pass/fail records for a session and renders the summary.
#[derive(Debug)]
pub struct SessionReporter {
    context: Arc<SessionContext>,
    log_dir: Option<PathBuf>,
    started: Option<(Instant, DateTime<Local>)>,
    records: Vec<TestRunRecord>,
}

impl SessionReporter {
    pub fn new(context: Arc<SessionContext>) -> Self {
        Self {
            context,
            log_dir: None,
            started: None,
            records: Vec::new(),
        }
    }

    /// Write session artifacts to `dir` on `finish`
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn records(&self) -> &[TestRunRecord] {
        &self.records
    }

    /// Begin a session from empty state
    pub fn start(&mut self) {
        self.records.clear();
        self.context.reset();
        self.started = Some((Instant::now(), Local::now()));
        info!("Test session started");
    }

    pub fn record_result(&mut self, test_name: &str, passed: bool, duration: Duration) {
        let outcome = if passed {
            TestOutcome::Passed
        } else {
            TestOutcome::Failed
        };
        self.push(test_name, outcome, duration, None);
    }

    pub fn record_skipped(&mut self, test_name: &str, reason: &str) {
        self.push(
            test_name,
            TestOutcome::Skipped,
            Duration::ZERO,
            Some(reason.to_string()),
        );
    }

    fn push(&mut self, name: &str, outcome: TestOutcome, duration: Duration, reason: Option<String>) {
        if self.started.is_none() {
            warn!(test = name, "Result recorded before session start; starting now");
            self.started = Some((Instant::now(), Local::now()));
        }
        info!(test = name, outcome = %outcome, elapsed_ms = duration.as_millis() as u64, "Test finished");
        self.records.push(TestRunRecord {
            name: name.to_string(),
            outcome,
            duration,
            reason,
        });
    }

    /// Compute the summary, write artifacts and reset for the next session.
    pub fn finish(&mut self) -> SessionSummary {
        let (duration, started_at) = match self.started.take() {
            Some((instant, at)) => (instant.elapsed(), at),
            None => (Duration::ZERO, Local::now()),
        };
        let records = std::mem::take(&mut self.records);
        let count = |o: TestOutcome| records.iter().filter(|r| r.outcome == o).count();

        let mut summary = SessionSummary {
            started_at,
            passed: count(TestOutcome::Passed),
            failed: count(TestOutcome::Failed),
            skipped: count(TestOutcome::Skipped),
            total: records.len(),
            duration,
            errors: self.context.session_errors(),
            records,
            report: String::new(),
        };
        summary.report = report::render_summary(&summary);

        if let Some(dir) = &self.log_dir {
            if let Err(e) = report::write_session_artifacts(dir, &summary) {
                warn!(dir = %dir.display(), error = %e, "Failed to write session report");
            }
        }

        self.context.reset();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "Test session finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ErrorClassifier;
    use tempfile::TempDir;

    const MISSING_FOO: &str = "error: attribute 'foo' missing\n  at /tmp/env.nix:3:5:";

    // ============================================================================
    // SessionContext
    // ============================================================================

    #[test]
    fn test_exact_duplicates_recorded_once() {
        let ctx = SessionContext::new();
        let c = ErrorClassifier::new();
        assert!(ctx.record_error(c.classify(MISSING_FOO, "a")));
        assert!(!ctx.record_error(c.classify(MISSING_FOO, "a")));
        assert_eq!(ctx.errors_for("a").len(), 1);
        assert_eq!(ctx.error_count(), 1);
    }

    #[test]
    fn test_same_failure_across_tests_collapses() {
        let ctx = SessionContext::new();
        let c = ErrorClassifier::new();
        ctx.record_error(c.classify(MISSING_FOO, "a"));
        ctx.record_error(c.classify(MISSING_FOO, "b"));
        let errors = ctx.session_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].tests, vec!["a", "b"]);
        assert_eq!(ctx.errors_for("b").len(), 1);
    }

    #[test]
    fn test_applied_config_roundtrip() {
        let ctx = SessionContext::new();
        ctx.record_applied(AppliedConfig {
            test_name: "t".into(),
            variant: ConfigurationVariant::new().with("desktop", "gnome"),
            config_text: "{ }".into(),
        });
        assert_eq!(ctx.applied_for("t").unwrap().config_text, "{ }");
        ctx.reset();
        assert!(ctx.applied_for("t").is_none());
    }

    // ============================================================================
    // SessionReporter
    // ============================================================================

    #[test]
    fn test_counts_add_up() {
        let mut reporter = SessionReporter::new(SessionContext::new());
        reporter.start();
        reporter.record_result("a", true, Duration::from_millis(5));
        reporter.record_result("b", false, Duration::from_millis(7));
        reporter.record_skipped("c", "not implemented");
        let summary = reporter.finish();
        assert_eq!((summary.passed, summary.failed, summary.skipped), (1, 1, 1));
        assert_eq!(summary.passed + summary.failed + summary.skipped, summary.total);
        assert!(!summary.is_success());
        assert!(summary.report.contains("not implemented"));
    }

    #[test]
    fn test_finish_clears_state() {
        let ctx = SessionContext::new();
        let mut reporter = SessionReporter::new(ctx.clone());
        reporter.start();
        reporter.record_result("a", false, Duration::ZERO);
        ctx.record_error(ErrorClassifier::new().classify(MISSING_FOO, "a"));
        let first = reporter.finish();
        assert_eq!(first.errors.len(), 1);

        let second = reporter.finish();
        assert_eq!(second.total, 0);
        assert!(second.errors.is_empty());
        assert!(reporter.records().is_empty());
    }

    #[test]
    fn test_start_resets_previous_errors() {
        let ctx = SessionContext::new();
        ctx.record_error(ErrorClassifier::new().classify(MISSING_FOO, "old"));
        let mut reporter = SessionReporter::new(ctx.clone());
        reporter.start();
        assert_eq!(ctx.error_count(), 0);
    }

    #[test]
    fn test_finish_writes_session_artifacts() {
        let dir = TempDir::new().unwrap();
        let mut reporter = SessionReporter::new(SessionContext::new()).with_log_dir(dir.path());
        reporter.start();
        reporter.record_result("a", true, Duration::ZERO);
        reporter.finish();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with("session_") && n.ends_with(".log")));
        assert!(names.iter().any(|n| n.starts_with("session_") && n.ends_with(".json")));
    }

    #[test]
    fn test_summary_json_shape() {
        let mut reporter = SessionReporter::new(SessionContext::new());
        reporter.start();
        reporter.record_result("a", true, Duration::from_millis(1500));
        let summary = reporter.finish();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["passed"], 1);
        assert_eq!(json["records"][0]["outcome"], "passed");
        assert_eq!(json["records"][0]["duration_secs"], 1.5);
        assert!(json.get("report").is_none());
    }
}
