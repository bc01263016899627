// src/classifier/rules.rs
// Ordered, data-driven rule table mapping diagnostic text to error kinds

use super::ErrorKind;
use regex::Regex;
use tracing::warn;

/// A successful match of one rule against diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// The full matched text
    pub matched: String,
    /// Capture groups, 1-based in templates (`{1}`, `{2}`)
    pub groups: Vec<Option<String>>,
    /// Byte offset of the match in the diagnostic
    pub offset: usize,
}

/// Anything that can locate a rule's evidence in diagnostic text.
pub trait DiagnosticMatcher: Send + Sync {
    fn find(&self, text: &str) -> Option<RuleMatch>;
}

/// Regex-backed matcher
pub struct RegexMatcher(Regex);

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }
}

impl DiagnosticMatcher for RegexMatcher {
    fn find(&self, text: &str) -> Option<RuleMatch> {
        let caps = self.0.captures(text)?;
        let whole = caps.get(0)?;
        Some(RuleMatch {
            matched: whole.as_str().to_string(),
            groups: caps
                .iter()
                .skip(1)
                .map(|g| g.map(|m| m.as_str().to_string()))
                .collect(),
            offset: whole.start(),
        })
    }
}

/// Plain case-insensitive substring matcher, no captures
pub struct SubstringMatcher(String);

impl SubstringMatcher {
    pub fn new(needle: &str) -> Self {
        Self(needle.to_lowercase())
    }
}

impl DiagnosticMatcher for SubstringMatcher {
    fn find(&self, text: &str) -> Option<RuleMatch> {
        // ASCII lowering keeps byte offsets aligned with `text`
        let offset = text.to_ascii_lowercase().find(&self.0)?;
        let line_end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
        Some(RuleMatch {
            matched: text[offset..line_end].trim_end().to_string(),
            groups: Vec::new(),
            offset,
        })
    }
}

/// How a rule's evidence is located
#[derive(Debug, Clone, Copy)]
pub enum Pattern {
    Regex(&'static str),
    Substring(&'static str),
}

/// One row of the rule table. Adding a rule is adding a row.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub name: &'static str,
    pub kind: ErrorKind,
    pub pattern: Pattern,
    /// Remediation template; `{1}`.. are replaced by capture groups
    pub suggestion: &'static str,
}

/// A rule with its matcher built
pub struct Rule {
    pub name: &'static str,
    pub kind: ErrorKind,
    pub suggestion: &'static str,
    matcher: Box<dyn DiagnosticMatcher>,
}

impl Rule {
    pub fn new(
        name: &'static str,
        kind: ErrorKind,
        matcher: Box<dyn DiagnosticMatcher>,
        suggestion: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            suggestion,
            matcher,
        }
    }

    /// Build a rule from its spec; `None` if the pattern does not compile.
    pub fn compile(spec: &RuleSpec) -> Option<Self> {
        let matcher: Box<dyn DiagnosticMatcher> = match spec.pattern {
            Pattern::Regex(p) => match RegexMatcher::new(p) {
                Ok(m) => Box::new(m),
                Err(e) => {
                    warn!(rule = spec.name, error = %e, "Skipping rule with invalid pattern");
                    return None;
                }
            },
            Pattern::Substring(s) => Box::new(SubstringMatcher::new(s)),
        };
        Some(Self::new(spec.name, spec.kind, matcher, spec.suggestion))
    }

    pub fn find(&self, text: &str) -> Option<RuleMatch> {
        self.matcher.find(text)
    }

    /// Fill the suggestion template from a match
    pub fn suggest(&self, m: &RuleMatch) -> Option<String> {
        if self.suggestion.is_empty() {
            return None;
        }
        let mut out = self.suggestion.to_string();
        for (i, group) in m.groups.iter().enumerate() {
            let placeholder = format!("{{{}}}", i + 1);
            out = out.replace(&placeholder, group.as_deref().unwrap_or(""));
        }
        Some(out)
    }
}

/// Default rule table. Order matters: the first matching row wins.
pub const DEFAULT_RULES: &[RuleSpec] = &[
    RuleSpec {
        name: "null-coercion",
        kind: ErrorKind::TypeError,
        pattern: Pattern::Regex(r"error: cannot coerce null to a string"),
        suggestion: "A value is null where a string is expected; make sure the option is defined",
    },
    RuleSpec {
        name: "syntax-unexpected",
        kind: ErrorKind::SyntaxError,
        pattern: Pattern::Regex(r"error: syntax error, unexpected ([^\n]+)"),
        suggestion: "Check the generated file for a stray or missing token near {1}",
    },
    RuleSpec {
        name: "syntax-generic",
        kind: ErrorKind::SyntaxError,
        pattern: Pattern::Regex(r"error: syntax error, ([^\n]+)"),
        suggestion: "Fix the Nix syntax error: {1}",
    },
    RuleSpec {
        name: "type-mismatch",
        kind: ErrorKind::TypeError,
        pattern: Pattern::Regex(r"error: value is ([^\n]+?) while ([^\n]+?) was expected"),
        suggestion: "Provide {2} instead of {1} for this option",
    },
    RuleSpec {
        name: "type-unsupported",
        kind: ErrorKind::TypeError,
        pattern: Pattern::Regex(r"error: type ([^\n]+?) does not support ([^\n]+)"),
        suggestion: "Values of type {1} cannot be used for {2}",
    },
    RuleSpec {
        name: "undefined-variable",
        kind: ErrorKind::UndefinedReference,
        pattern: Pattern::Regex(r"error: undefined variable '([^']+)'"),
        suggestion: "Bring '{1}' into scope (function argument, let binding or `with`)",
    },
    RuleSpec {
        name: "attribute-missing",
        kind: ErrorKind::UndefinedReference,
        pattern: Pattern::Regex(r"error: attribute '([^']+)' missing"),
        suggestion: "Define the attribute '{1}' or check the attribute path for typos",
    },
    RuleSpec {
        name: "option-missing",
        kind: ErrorKind::OptionError,
        pattern: Pattern::Regex(r"The option `([^']+)' does not exist"),
        suggestion: "Remove '{1}' or import the module that declares it",
    },
    RuleSpec {
        name: "option-undefined",
        kind: ErrorKind::OptionError,
        pattern: Pattern::Regex(r"The option `([^']+)' is used but not defined"),
        suggestion: "Give '{1}' a value or a default in its module",
    },
    RuleSpec {
        name: "option-conflict",
        kind: ErrorKind::ConfigurationError,
        pattern: Pattern::Regex(r"The option `([^']+)' has conflicting definition values"),
        suggestion: "Only one module may set '{1}'; use lib.mkForce or lib.mkDefault to resolve the conflict",
    },
    RuleSpec {
        name: "failed-assertions",
        kind: ErrorKind::ConfigurationError,
        pattern: Pattern::Regex(r"Failed assertions:\s*\n?\s*-?\s*([^\n]*)"),
        suggestion: "A module assertion failed: {1}",
    },
    RuleSpec {
        name: "module-missing",
        kind: ErrorKind::ModuleError,
        pattern: Pattern::Regex(r"The module `([^']+)' does not exist"),
        suggestion: "Check the import path of module '{1}'",
    },
    RuleSpec {
        name: "module-load",
        kind: ErrorKind::ModuleError,
        pattern: Pattern::Regex(r"Failed to load module '([^']+)'"),
        suggestion: "Module '{1}' could not be loaded; check that it evaluates on its own",
    },
    RuleSpec {
        name: "builder-failed",
        kind: ErrorKind::BuildError,
        pattern: Pattern::Regex(r"builder for '([^']+)' failed"),
        suggestion: "Inspect the build log of {1} (`nix log {1}`)",
    },
    RuleSpec {
        name: "derivation-unbuildable",
        kind: ErrorKind::BuildError,
        pattern: Pattern::Regex(r"cannot build derivation '([^']+)'"),
        suggestion: "A dependency of {1} failed to build",
    },
    RuleSpec {
        name: "dependency-cycle",
        kind: ErrorKind::DependencyError,
        pattern: Pattern::Regex(r"cycle detected in ([^\n]+)"),
        suggestion: "Break the dependency cycle in {1}",
    },
    RuleSpec {
        name: "dependency-missing",
        kind: ErrorKind::DependencyError,
        pattern: Pattern::Regex(r"dependency '([^']+)' not found"),
        suggestion: "Add '{1}' to the flake inputs or package set",
    },
    RuleSpec {
        name: "infinite-recursion",
        kind: ErrorKind::EvaluationError,
        pattern: Pattern::Regex(r"error: infinite recursion encountered"),
        suggestion: "An option depends on itself; look for config values defined in terms of config",
    },
    RuleSpec {
        name: "timeout",
        kind: ErrorKind::EvaluationError,
        pattern: Pattern::Regex(r"timed out after (\d+)s"),
        suggestion: "The tool did not finish within {1}s; raise the timeout or simplify the configuration",
    },
    RuleSpec {
        name: "permission-denied",
        kind: ErrorKind::PermissionError,
        pattern: Pattern::Substring("permission denied"),
        suggestion: "Check file permissions in the workspace and access to the nix store/daemon",
    },
];

/// Compile the default table, dropping rows whose patterns fail to build.
pub fn default_rules() -> Vec<Rule> {
    DEFAULT_RULES.iter().filter_map(Rule::compile).collect()
}
