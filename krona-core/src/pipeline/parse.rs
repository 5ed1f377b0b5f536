//! Tabular parsing under encoding/delimiter hypotheses
//!
//! The parser combines the decode, repair and sniff stages into one ordered
//! search: for each encoding candidate, for each delimiter candidate (an
//! explicit `sep=` hint is authoritative, otherwise the sniffed delimiter is
//! tried first), parse and accept the first result with more than one
//! column. Rows longer than the header reject a hypothesis; shorter rows
//! are padded so the accepted table is rectangular.

use tracing::{debug, info};

use crate::domain::result::{Error, Result};
use crate::domain::RawTable;

use super::decode::{decode_all, DecodedText};
use super::repair::repair_wrapped_lines;
use super::sniff::{find_sep_hint, sniff_delimiter, DELIMITER_CANDIDATES, SNIFF_SAMPLE_CHARS};

/// How many offending values a parse failure reports
const FAILURE_SAMPLE_LEN: usize = 3;

/// Context from a rejected hypothesis, kept for the terminal error
struct Attempt {
    encoding: &'static str,
    delimiter: char,
    sample: Vec<String>,
    delimiter_in_value: bool,
}

/// Parse raw bytes into a rectangular table
pub fn parse_table(raw: &[u8]) -> Result<RawTable> {
    let mut last_attempt: Option<Attempt> = None;

    for decoded in decode_all(raw)? {
        let DecodedText { text, encoding } = decoded;
        let text = repair_wrapped_lines(&text);

        let (body, delimiters) = match find_sep_hint(&text) {
            Some(hint) => {
                debug!(encoding, delimiter = %hint.delimiter, "honoring sep= hint");
                (skip_lines(&text, hint.skip_lines), vec![hint.delimiter])
            }
            None => {
                let sniffed = sniff_delimiter(sample_of(&text));
                let mut order: Vec<char> = Vec::with_capacity(DELIMITER_CANDIDATES.len());
                if let Some(d) = sniffed {
                    order.push(d);
                }
                order.extend(
                    DELIMITER_CANDIDATES
                        .iter()
                        .copied()
                        .filter(|d| Some(*d) != sniffed),
                );
                (text.as_str(), order)
            }
        };

        for delimiter in delimiters {
            debug!(encoding, %delimiter, "trying parse hypothesis");
            match read_rows(body, delimiter) {
                Some((headers, rows)) if headers.len() > 1 => {
                    info!(
                        encoding,
                        %delimiter,
                        columns = headers.len(),
                        rows = rows.len(),
                        "accepted parse hypothesis"
                    );
                    return Ok(RawTable {
                        headers,
                        rows,
                        encoding,
                        delimiter,
                    });
                }
                Some((headers, rows)) => {
                    let sample = single_column_sample(&headers, &rows);
                    let attempt = Attempt {
                        encoding,
                        delimiter,
                        delimiter_in_value: sample.iter().any(|v| v.contains(delimiter)),
                        sample,
                    };
                    // A delimiter trapped inside a value is the most useful
                    // diagnosis, keep it over later attempts
                    if attempt.delimiter_in_value
                        || !last_attempt.as_ref().is_some_and(|a| a.delimiter_in_value)
                    {
                        last_attempt = Some(attempt);
                    }
                }
                None => {
                    if last_attempt.is_none() {
                        last_attempt = Some(Attempt {
                            encoding,
                            delimiter,
                            sample: Vec::new(),
                            delimiter_in_value: false,
                        });
                    }
                }
            }
        }
    }

    let attempt = last_attempt.unwrap_or(Attempt {
        encoding: "utf-8",
        delimiter: ',',
        sample: Vec::new(),
        delimiter_in_value: false,
    });
    Err(Error::Parse {
        encoding: attempt.encoding.to_string(),
        delimiter: attempt.delimiter,
        sample: attempt.sample,
        delimiter_in_value: attempt.delimiter_in_value,
    })
}

/// Parse one delimiter hypothesis; `None` rejects it outright
fn read_rows(text: &str, delimiter: char) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.ok()?;
        // The csv reader can yield a lone empty field for stray blank lines
        if record.len() == 1 && record.get(0).unwrap_or("").is_empty() {
            continue;
        }
        let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        match &headers {
            None => headers = Some(cells),
            Some(h) => {
                if cells.len() > h.len() {
                    return None;
                }
                let mut row = cells;
                row.resize(h.len(), String::new());
                rows.push(row);
            }
        }
    }

    headers.map(|h| (h, rows))
}

/// A few non-empty values from a rejected single-column parse
fn single_column_sample(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    headers
        .iter()
        .chain(rows.iter().flatten())
        .filter(|v| !v.trim().is_empty())
        .take(FAILURE_SAMPLE_LEN)
        .cloned()
        .collect()
}

fn sample_of(text: &str) -> &str {
    match text.char_indices().nth(SNIFF_SAMPLE_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn skip_lines(text: &str, count: usize) -> &str {
    let mut offset = 0;
    let mut skipped = 0;
    for (idx, ch) in text.char_indices() {
        if skipped == count {
            break;
        }
        if ch == '\n' {
            skipped += 1;
            offset = idx + 1;
        }
    }
    if skipped < count {
        ""
    } else {
        &text[offset..]
    }
}
