//! Keyword-based safety checker
//!
//! Matching is literal substring containment over the embedded taxonomy:
//! no word boundaries, no tokenization, so embedded matches count
//! ("assholeness" matches "asshole"). Case and surrounding whitespace are
//! normalized away before matching.

use crate::error::ModerationError;
use crate::taxonomy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Verdict for a single piece of text.
///
/// `categories` always carries every known category key, even for empty
/// input. `flagged` is the logical OR across the per-category flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    pub flagged: bool,
    pub categories: BTreeMap<String, bool>,
}

/// Prepare text for keyword matching (trim + lowercase).
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Check the provided text against the keyword taxonomy.
///
/// Empty or whitespace-only input is never flagged. Deterministic and
/// side-effect-free; the error paths cover a corrupted taxonomy and are
/// effectively unreachable with the embedded table.
pub fn check_safety(text: &str) -> Result<ModerationResult, ModerationError> {
    let table = taxonomy::categories();
    if table.is_empty() {
        return Err(ModerationError::TaxonomyUnavailable);
    }

    let normalized = normalize(text);
    if normalized.is_empty() {
        let categories = table.keys().map(|c| (c.to_string(), false)).collect();
        return Ok(ModerationResult {
            flagged: false,
            categories,
        });
    }

    let mut categories = BTreeMap::new();
    for (category, phrases) in table {
        if phrases.is_empty() {
            return Err(ModerationError::EmptyCategory {
                category: category.to_string(),
            });
        }
        let hit = phrases.iter().any(|phrase| normalized.contains(phrase));
        categories.insert(category.to_string(), hit);
    }

    let flagged = categories.values().any(|hit| *hit);
    Ok(ModerationResult { flagged, categories })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(text: &str) -> ModerationResult {
        check_safety(text).expect("embedded taxonomy is available")
    }

    #[test]
    fn test_empty_text_never_flagged() {
        for text in ["", "   ", "\t\n", "  \r\n  "] {
            let result = check(text);
            assert!(!result.flagged, "{text:?} should not flag");
            assert_eq!(result.categories.len(), taxonomy::categories().len());
            assert!(result.categories.values().all(|hit| !hit));
        }
    }

    #[test]
    fn test_clean_text_carries_every_category_key() {
        let result = check("have a lovely afternoon");
        assert!(!result.flagged);
        assert_eq!(result.categories.len(), 10);
        assert!(result.categories.values().all(|hit| !hit));
    }

    #[test]
    fn test_known_phrase_flags_its_category() {
        let result = check("I want to kill you");
        assert!(result.flagged);
        assert_eq!(result.categories["violence"], true);
        assert_eq!(result.categories["drugs"], false);
    }

    #[test]
    fn test_flagged_equals_or_of_categories() {
        for text in ["kill myself", "buy weed and cocaine", "totally fine"] {
            let result = check(text);
            assert_eq!(result.flagged, result.categories.values().any(|hit| *hit));
        }
    }

    #[test]
    fn test_case_insensitive_and_trimming() {
        let a = check("KILL MYSELF");
        let b = check(" kill myself ");
        let c = check("kill myself");

        assert!(a.flagged && b.flagged && c.flagged);
        assert_eq!(a.categories, b.categories);
        assert_eq!(b.categories, c.categories);
    }

    #[test]
    fn test_substring_containment_not_word_boundary() {
        // Embedded match inside a longer word still counts.
        let result = check("what assholeness");
        assert!(result.flagged);
        assert_eq!(result.categories["profanity"], true);

        // Phrase surrounded by arbitrary characters, no word break needed.
        let result = check("xxkill myselfyy");
        assert!(result.flagged);
        assert_eq!(result.categories["self-harm"], true);
    }

    #[test]
    fn test_multiple_categories_in_one_text() {
        let result = check("sell drugs or I will kill you");
        assert!(result.flagged);
        assert_eq!(result.categories["drugs"], true);
        assert_eq!(result.categories["violence"], true);
        assert_eq!(result.categories["bullying"], false);
    }

    #[test]
    fn test_result_serializes_with_stable_keys() {
        let result = check("go die");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["flagged"], true);
        assert_eq!(value["categories"]["bullying"], true);
        assert_eq!(value["categories"]["weapons"], false);
    }
}
