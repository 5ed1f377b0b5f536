//! Category rule table for training-set labeling
//!
//! The rules are versioned data, not code: they are loaded from JSON and
//! define the ground truth used to label classifier training examples.
//! Precedence is fixed and part of the contract:
//!
//! 1. merchant exact match
//! 2. merchant prefix match (chains and store variants)
//! 3. keyword match on the purchase details
//! 4. legacy-category mapping
//! 5. fallback label

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Default rule table bundled with the crate
const BUNDLED_RULES: &str = include_str!("../../rules/category_rules.json");

/// One keyword rule: the label applies when any needle occurs in the
/// lowercased purchase details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRule {
    pub label: String,
    pub any_of: Vec<String>,
}

/// One merchant prefix rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixRule {
    pub prefix: String,
    pub label: String,
}

/// The full rule table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRules {
    /// The closed label set the classifier is trained on
    pub labels: Vec<String>,
    /// Label used when no rule matches or a rule maps outside `labels`
    pub fallback: String,
    /// Merchant name (lowercased) -> label
    #[serde(default)]
    pub merchants: HashMap<String, String>,
    /// Ordered prefix rules, evaluated after exact merchant matches
    #[serde(default)]
    pub merchant_prefixes: Vec<PrefixRule>,
    /// Ordered keyword rules, first match wins
    #[serde(default)]
    pub keywords: Vec<KeywordRule>,
    /// Legacy hand-entered category -> label
    #[serde(default)]
    pub legacy: HashMap<String, String>,
}

impl CategoryRules {
    /// The rule table shipped with the crate
    pub fn bundled() -> Self {
        serde_json::from_str(BUNDLED_RULES).expect("bundled category rules are valid JSON")
    }

    /// Load a rule table from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Map one training row to its label following the fixed precedence
    pub fn map_label(&self, merchant: &str, legacy_category: &str, details: &str) -> &str {
        let m = merchant.trim().to_lowercase();
        let d = details.trim().to_lowercase();

        if let Some(label) = self.merchants.get(&m) {
            return self.clamp(label);
        }

        if let Some(rule) = self.merchant_prefixes.iter().find(|r| m.starts_with(&r.prefix)) {
            return self.clamp(&rule.label);
        }

        if let Some(rule) = self
            .keywords
            .iter()
            .find(|r| r.any_of.iter().any(|needle| d.contains(needle.as_str())))
        {
            return self.clamp(&rule.label);
        }

        if let Some(label) = self.legacy.get(legacy_category.trim()) {
            return self.clamp(label);
        }

        &self.fallback
    }

    /// Labels outside the closed set collapse to the fallback
    fn clamp<'a>(&'a self, label: &'a str) -> &'a str {
        if self.labels.iter().any(|l| l == label) {
            label
        } else {
            &self.fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> CategoryRules {
        CategoryRules {
            labels: vec![
                "Dagligvaror".into(),
                "Alkohol".into(),
                "Fika & Kafé".into(),
                "Restaurang".into(),
                "Övrigt/Okänt".into(),
            ],
            fallback: "Övrigt/Okänt".into(),
            merchants: HashMap::from([("systembolaget".to_string(), "Alkohol".to_string())]),
            merchant_prefixes: vec![PrefixRule {
                prefix: "ica".into(),
                label: "Dagligvaror".into(),
            }],
            keywords: vec![KeywordRule {
                label: "Fika & Kafé".into(),
                any_of: vec!["fika".into(), "kaffe".into()],
            }],
            legacy: HashMap::from([("Mat".to_string(), "Restaurang".to_string())]),
        }
    }

    #[test]
    fn test_merchant_exact_wins() {
        let r = rules();
        // exact match beats the keyword rule even when a keyword is present
        assert_eq!(r.map_label("Systembolaget", "Mat", "kaffe och bröd"), "Alkohol");
    }

    #[test]
    fn test_prefix_after_exact() {
        let r = rules();
        assert_eq!(r.map_label("ICA NARA STAN", "", ""), "Dagligvaror");
    }

    #[test]
    fn test_keyword_before_legacy() {
        let r = rules();
        assert_eq!(r.map_label("Pressbyrån", "Mat", "en kaffe"), "Fika & Kafé");
    }

    #[test]
    fn test_legacy_fallback_chain() {
        let r = rules();
        assert_eq!(r.map_label("Okänd Butik", "Mat", "ingenting"), "Restaurang");
        assert_eq!(r.map_label("Okänd Butik", "Okänd", "ingenting"), "Övrigt/Okänt");
    }

    #[test]
    fn test_label_outside_set_clamps() {
        let mut r = rules();
        r.merchants
            .insert("nyab".into(), "Påhittad Kategori".into());
        assert_eq!(r.map_label("NYAB", "", ""), "Övrigt/Okänt");
    }

    #[test]
    fn test_bundled_rules_parse() {
        let r = CategoryRules::bundled();
        assert!(r.labels.contains(&r.fallback));
        assert!(!r.merchants.is_empty());
        assert!(!r.keywords.is_empty());
    }
}
