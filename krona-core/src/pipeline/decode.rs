//! Byte/encoding resolution
//!
//! Bank exports arrive as UTF-8 (with or without BOM) or, from older Excel
//! installs, in a Windows code page. Candidates are tried in strict priority
//! order and the first clean decode wins. The WHATWG single-byte decoders
//! accept every byte, so the candidate list always terminates for non-empty
//! input.

use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1252};

use crate::domain::result::{Error, Result};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Candidate encodings, highest priority first
const CANDIDATES: [(&str, &Encoding); 3] = [
    ("utf-8", UTF_8),
    ("windows-1252", WINDOWS_1252),
    ("iso-8859-15", ISO_8859_15),
];

/// Source text with the encoding candidate that produced it
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
}

/// Decode under every candidate that accepts the input, in priority order
///
/// Returns at least one entry, or `Error::Decode` carrying one note per
/// failed candidate (and a note for empty input).
pub fn decode_all(raw: &[u8]) -> Result<Vec<DecodedText>> {
    if raw.is_empty() {
        return Err(Error::Decode {
            attempted: vec!["source was empty".to_string()],
        });
    }

    let mut decoded = Vec::new();
    let mut failures = Vec::new();

    // A UTF-8 BOM is authoritative: strip it and decode the remainder
    if let Some(body) = raw.strip_prefix(&UTF8_BOM) {
        match UTF_8.decode_without_bom_handling_and_without_replacement(body) {
            Some(text) => decoded.push(DecodedText {
                text: text.into_owned(),
                encoding: "utf-8-sig",
            }),
            None => failures.push("utf-8-sig: invalid UTF-8 after byte order mark".to_string()),
        }
    }

    for (name, encoding) in CANDIDATES {
        match encoding.decode_without_bom_handling_and_without_replacement(raw) {
            Some(text) => decoded.push(DecodedText {
                text: text.into_owned(),
                encoding: name,
            }),
            None => failures.push(format!("{}: decode failed", name)),
        }
    }

    if decoded.is_empty() {
        return Err(Error::Decode { attempted: failures });
    }
    Ok(decoded)
}

/// First candidate that decodes the input cleanly
pub fn decode_bytes(raw: &[u8]) -> Result<DecodedText> {
    let mut all = decode_all(raw)?;
    Ok(all.remove(0))
}
