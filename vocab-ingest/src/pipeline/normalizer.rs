//! Input normalization and request validation

use crate::error::ValidationError;
use crate::models::{BulkAddRequest, CardType};

/// Accepted word count range (inclusive, after normalization)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for WordBounds {
    fn default() -> Self {
        Self { min: 2, max: 100 }
    }
}

/// Request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    /// Trimmed, non-empty words in submission order
    pub words: Vec<String>,
    pub card_type: CardType,
}

/// Trim every word and drop the empty ones, keeping order
pub fn normalize_words(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|word| word.trim())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Key used for duplicate comparison: trimmed, interior whitespace runs
/// collapsed to one space, lowercased
pub fn dedup_key(word: &str) -> String {
    word.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize the words and check count bounds and card subtype
pub fn validate_request(
    request: &BulkAddRequest,
    bounds: WordBounds,
) -> Result<NormalizedRequest, ValidationError> {
    let words = normalize_words(&request.words);

    if words.len() < bounds.min {
        return Err(ValidationError::TooFewWords {
            count: words.len(),
            min: bounds.min,
        });
    }
    if words.len() > bounds.max {
        return Err(ValidationError::TooManyWords {
            count: words.len(),
            max: bounds.max,
        });
    }

    let card_type = request
        .card_type
        .parse::<CardType>()
        .ok()
        .filter(CardType::is_bulk_supported)
        .ok_or_else(|| ValidationError::UnsupportedCardType(request.card_type.clone()))?;

    Ok(NormalizedRequest { words, card_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(words: &[&str], card_type: &str) -> BulkAddRequest {
        BulkAddRequest::new(words.iter().map(|w| w.to_string()).collect(), card_type)
    }

    #[test]
    fn test_normalize_trims_and_drops_blanks() {
        let raw = vec![
            "  apple ".to_string(),
            "".to_string(),
            "\t".to_string(),
            "ice cream".to_string(),
        ];
        assert_eq!(normalize_words(&raw), vec!["apple", "ice cream"]);
    }

    #[test]
    fn test_dedup_key_ignores_case_and_spacing() {
        assert_eq!(dedup_key("Apple"), "apple");
        assert_eq!(dedup_key(" apple "), "apple");
        assert_eq!(dedup_key("APPLE"), "apple");
        assert_eq!(dedup_key("  Ice   Cream "), "ice cream");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = WordBounds::default();

        assert!(validate_request(&request(&["a", "b"], "word"), bounds).is_ok());

        let hundred: Vec<String> = (0..100).map(|i| format!("w{}", i)).collect();
        assert!(validate_request(&BulkAddRequest::new(hundred, "word"), bounds).is_ok());

        let too_many: Vec<String> = (0..101).map(|i| format!("w{}", i)).collect();
        assert_eq!(
            validate_request(&BulkAddRequest::new(too_many, "word"), bounds),
            Err(ValidationError::TooManyWords { count: 101, max: 100 })
        );
    }

    #[test]
    fn test_blank_words_do_not_count() {
        assert_eq!(
            validate_request(&request(&["apple", "  ", ""], "word"), WordBounds::default()),
            Err(ValidationError::TooFewWords { count: 1, min: 2 })
        );
    }

    #[test]
    fn test_unsupported_card_types_rejected() {
        let bounds = WordBounds::default();

        assert_eq!(
            validate_request(&request(&["a", "b"], "sentence"), bounds),
            Err(ValidationError::UnsupportedCardType("sentence".to_string()))
        );
        assert!(matches!(
            validate_request(&request(&["a", "b"], "verb"), bounds),
            Err(ValidationError::UnsupportedCardType(_))
        ));

        let ok = validate_request(&request(&["a", "b"], "Phrase"), bounds).unwrap();
        assert_eq!(ok.card_type, CardType::Phrase);
    }
}
