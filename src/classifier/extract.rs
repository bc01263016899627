// src/classifier/extract.rs
// Location, context window and trace extraction from raw diagnostics

use super::Location;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Lines kept on each side of the offending line
pub const CONTEXT_LINES: usize = 3;

/// Trace lines kept per error
pub const MAX_TRACE_LINES: usize = 20;

/// Stands in for the per-test workspace root in classified diagnostics
pub const WORKSPACE_TOKEN: &str = "<workspace>";

/// `at /path/file.nix:12:5:` as printed by nix
static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: This is a static literal regex pattern; compilation cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"\bat (?:«[^»]+»|([^\s:]+)):(\d+)(?::(\d+))?").expect("location regex")
});

/// First `file:line[:column]` reference in the diagnostic.
pub fn find_location(text: &str) -> Option<(Location, usize)> {
    for caps in LOCATION_RE.captures_iter(text) {
        // «none»/«string» pseudo-files carry no useful position
        let Some(file) = caps.get(1) else { continue };
        let Some(line) = caps.get(2).and_then(|m| m.as_str().parse().ok()) else {
            continue;
        };
        let column = caps.get(3).and_then(|m| m.as_str().parse().ok());
        let offset = caps.get(0).map_or(0, |m| m.start());
        return Some((
            Location {
                file: file.as_str().to_string(),
                line,
                column,
            },
            offset,
        ));
    }
    None
}

/// Index of the line containing byte `offset`
pub fn line_index_at(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count()
}

/// Bounded window of diagnostic lines around `line_idx`.
pub fn context_window(text: &str, line_idx: usize, radius: usize) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return None;
    }
    let center = line_idx.min(lines.len() - 1);
    let start = center.saturating_sub(radius);
    let end = (center + radius + 1).min(lines.len());
    let window = lines[start..end].join("\n");
    if window.trim().is_empty() {
        None
    } else {
        Some(window)
    }
}

/// The `… while evaluating` / `at …` breadcrumb lines nix prints with
/// `--show-trace`, in order, bounded.
pub fn extract_trace(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| l.starts_with("… ") || l.starts_with("at ") || l.starts_with("while evaluating"))
        .take(MAX_TRACE_LINES)
        .map(str::to_string)
        .collect()
}

/// Replace the workspace root with [`WORKSPACE_TOKEN`] so the same failure
/// in two workspaces yields the same location.
pub fn mask_workspace(text: &str, root: &Path) -> String {
    let mut roots = vec![root.to_string_lossy().into_owned()];
    if let Ok(canonical) = root.canonicalize() {
        roots.push(canonical.to_string_lossy().into_owned());
    }
    roots.sort_by_key(|r| std::cmp::Reverse(r.len()));
    roots.dedup();

    let mut out = text.to_string();
    for r in roots.iter().filter(|r| !r.is_empty()) {
        out = out.replace(r.as_str(), WORKSPACE_TOKEN);
    }
    out
}

/// First line carrying `error:`, with whitespace collapsed.
pub fn headline(text: &str) -> Option<String> {
    text.lines()
        .find(|l| l.contains("error:"))
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
}
