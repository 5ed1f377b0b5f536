//! Delimiter sniffing and the Excel `sep=` hint
//!
//! Sniffing is statistical: a candidate wins when it occurs a consistent,
//! non-zero number of times on every sampled line. Inconclusive input yields
//! `None` and the parser falls back to trying each candidate in turn.

/// Field delimiter candidates, in fallback order
pub const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '\t', '|'];

/// How much decoded text the sniffer looks at
pub const SNIFF_SAMPLE_CHARS: usize = 50_000;

/// How many lines of the sample are scored
const SNIFF_SAMPLE_LINES: usize = 20;

/// How many leading lines may hold a `sep=` hint
const SEP_HINT_WINDOW: usize = 5;

/// An explicit separator hint found in the file preamble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SepHint {
    pub delimiter: char,
    /// Number of leading lines (hint included) the parser must skip
    pub skip_lines: usize,
}

/// Guess the delimiter from a bounded text sample
///
/// Pure function; returns `None` when no candidate is consistent.
pub fn sniff_delimiter(sample: &str) -> Option<char> {
    let sample = bounded(sample);
    let lines: Vec<&str> = sample
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_SAMPLE_LINES)
        .collect();
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(char, usize)> = None;
    for candidate in DELIMITER_CANDIDATES {
        let counts: Vec<usize> = lines
            .iter()
            .map(|l| l.matches(candidate).count())
            .collect();
        let first = counts[0];
        if first == 0 || counts.iter().any(|c| *c != first) {
            continue;
        }
        // Strictly-greater keeps the earlier candidate on equal counts
        if best.map_or(true, |(_, b)| first > b) {
            best = Some((candidate, first));
        }
    }
    best.map(|(c, _)| c)
}

/// Look for an Excel-style `sep=X` line in the first few lines
///
/// When present the hint is authoritative: the returned delimiter is the
/// only one worth trying, and everything up to and including the hint line
/// is preamble.
pub fn find_sep_hint(text: &str) -> Option<SepHint> {
    for (i, line) in text.lines().take(SEP_HINT_WINDOW).enumerate() {
        let trimmed = line.trim().trim_matches('"');
        let lower = trimmed.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("sep=") {
            let mut chars = trimmed[trimmed.len() - rest.len()..].chars();
            if let (Some(delimiter), None) = (chars.next(), chars.next()) {
                return Some(SepHint {
                    delimiter,
                    skip_lines: i + 1,
                });
            }
        }
    }
    None
}

fn bounded(sample: &str) -> &str {
    match sample.char_indices().nth(SNIFF_SAMPLE_CHARS) {
        Some((idx, _)) => &sample[..idx],
        None => sample,
    }
}
