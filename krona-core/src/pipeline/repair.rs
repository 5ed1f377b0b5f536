//! Quoted-line repair
//!
//! Some bank exports wrap every data line in one redundant pair of double
//! quotes, which turns the whole line into a single CSV field. A line is
//! treated as redundantly wrapped only when the outer quotes provably carry
//! no field semantics: the interior holds no further quote characters and
//! contains at least one delimiter candidate. Ordinary per-field quoting and
//! legitimately quoted single-column values are left untouched, which also
//! makes the repair idempotent.

use super::sniff::DELIMITER_CANDIDATES;

/// Strip one redundant outer quote pair from a single line, if present
pub fn repair_line(line: &str) -> &str {
    let trimmed = line.trim_end_matches('\r');
    if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
        return trimmed;
    }
    let interior = &trimmed[1..trimmed.len() - 1];
    if interior.contains('"') {
        return trimmed;
    }
    if !DELIMITER_CANDIDATES.iter().any(|d| interior.contains(*d)) {
        return trimmed;
    }
    interior
}

/// Apply [`repair_line`] to every line of a decoded file
pub fn repair_wrapped_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(repair_line(line));
        out.push('\n');
    }
    out
}
