//! Column normalization
//!
//! Bank exports disagree about header spelling, language and casing. Each
//! raw header is fuzzy-matched against every known variant of every
//! canonical field; the best score wins when it reaches the threshold,
//! otherwise the header keeps its original name and is dropped later when
//! the caller selects canonical columns only.

use strsim::normalized_levenshtein;

use crate::config::FieldMapping;

/// Minimum similarity for a header to adopt a canonical name
pub const SIMILARITY_THRESHOLD: f64 = 0.80;

/// Rewrite headers to canonical names where a variant matches
///
/// Deterministic: evaluation follows mapping declaration order and a
/// strictly-greater comparison, so score ties keep the first canonical name
/// reached. A header maps to at most one canonical name.
pub fn normalize_headers(headers: &[String], mapping: &FieldMapping) -> Vec<String> {
    headers
        .iter()
        .map(|header| {
            match best_match(header, mapping) {
                Some((canonical, score)) if score >= SIMILARITY_THRESHOLD => canonical.to_string(),
                _ => header.clone(),
            }
        })
        .collect()
}

/// Best-scoring canonical name for one header
fn best_match<'a>(header: &str, mapping: &'a FieldMapping) -> Option<(&'a str, f64)> {
    let needle = header.trim().to_lowercase();
    let mut best: Option<(&str, f64)> = None;
    for rule in mapping.iter() {
        for variant in &rule.variants {
            let score = normalized_levenshtein(&needle, &variant.trim().to_lowercase());
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((&rule.canonical, score));
            }
        }
    }
    best
}
