// src/classifier/mod.rs
// Turns raw nix diagnostics into typed, deduplicable errors

pub mod extract;
pub mod rules;

pub use rules::{DiagnosticMatcher, Pattern, Rule, RuleMatch, RuleSpec};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Error taxonomy
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::IntoStaticStr,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    SyntaxError,
    TypeError,
    UndefinedReference,
    OptionError,
    ModuleError,
    EvaluationError,
    BuildError,
    DependencyError,
    ConfigurationError,
    PermissionError,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn severity(&self) -> Severity {
        match self {
            ErrorKind::BuildError | ErrorKind::DependencyError => Severity::Critical,
            _ => Severity::Error,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::IntoStaticStr,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Critical,
}

/// Source position referenced by a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: Option<u32>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(col) => write!(f, "{}:{}:{}", self.file, self.line, col),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// A structured error derived from diagnostic text.
///
/// Identity is `(test_name, kind, location, message)`; context, suggestion
/// and trace are derived data and do not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
    pub context: Option<String>,
    pub suggestion: Option<String>,
    pub severity: Severity,
    pub test_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
}

impl ClassifiedError {
    fn identity(&self) -> (&str, ErrorKind, Option<&Location>, &str) {
        (&self.test_name, self.kind, self.location.as_ref(), &self.message)
    }

    /// Identity without the test name, used to collapse the same failure
    /// seen by several tests into one session entry.
    pub fn signature(&self) -> ErrorSignature {
        ErrorSignature {
            kind: self.kind,
            location: self.location.clone(),
            message: self.message.clone(),
        }
    }

    /// Multi-line form returned to the test layer. Long unmatched
    /// diagnostics are shortened to their first `error:` line.
    pub fn render(&self) -> String {
        let title = if self.message.contains('\n') {
            extract::headline(&self.message)
                .unwrap_or_else(|| self.message.lines().next().unwrap_or_default().to_string())
        } else {
            self.message.clone()
        };
        let mut out = format!("[{}] {}", self.kind, title);
        if let Some(loc) = &self.location {
            out.push_str(&format!("\n  at {}", loc));
        }
        if let Some(s) = &self.suggestion {
            out.push_str(&format!("\n  suggestion: {}", s));
        }
        out
    }
}

impl PartialEq for ClassifiedError {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ClassifiedError {}

impl Hash for ClassifiedError {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorSignature {
    pub kind: ErrorKind,
    pub location: Option<Location>,
    pub message: String,
}

/// Ordered first-match classifier over a rule table.
pub struct ErrorClassifier {
    rules: Vec<Rule>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|r| r.name).collect();
        f.debug_struct("ErrorClassifier").field("rules", &names).finish()
    }
}

impl ErrorClassifier {
    /// Classifier with the built-in rule table
    pub fn new() -> Self {
        Self::with_rules(rules::default_rules())
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Append a rule with the lowest priority
    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }

    /// Classify diagnostic text for a test. Unmatched text becomes `Unknown`
    /// with the original text kept as the message.
    pub fn classify(&self, diagnostic_text: &str, test_name: &str) -> ClassifiedError {
        let location = extract::find_location(diagnostic_text);
        let trace = extract::extract_trace(diagnostic_text);

        let hit = self
            .rules
            .iter()
            .find_map(|rule| rule.find(diagnostic_text).map(|m| (rule, m)));

        let (kind, message, suggestion, anchor) = match &hit {
            Some((rule, m)) => {
                debug!(rule = rule.name, test = test_name, "Diagnostic matched rule");
                (rule.kind, m.matched.trim().to_string(), rule.suggest(m), Some(m.offset))
            }
            None => {
                debug!(test = test_name, "No rule matched diagnostic");
                (ErrorKind::Unknown, diagnostic_text.trim().to_string(), None, None)
            }
        };

        let focus = location
            .as_ref()
            .map(|(_, offset)| *offset)
            .or(anchor)
            .map(|offset| extract::line_index_at(diagnostic_text, offset));
        let context = focus.and_then(|idx| {
            extract::context_window(diagnostic_text, idx, extract::CONTEXT_LINES)
        });

        ClassifiedError {
            kind,
            message,
            location: location.map(|(loc, _)| loc),
            context,
            suggestion,
            severity: kind.severity(),
            test_name: test_name.to_string(),
            trace,
        }
    }
}
