//! Stored card and tag entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Card subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Word,
    Phrase,
    Sentence,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Word => "word",
            CardType::Phrase => "phrase",
            CardType::Sentence => "sentence",
        }
    }

    /// Subtypes accepted by bulk add and eligible for image backfill
    pub fn is_bulk_supported(&self) -> bool {
        matches!(self, CardType::Word | CardType::Phrase)
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Ok(CardType::Word),
            "phrase" => Ok(CardType::Phrase),
            "sentence" => Ok(CardType::Sentence),
            other => Err(format!("unknown card type: {}", other)),
        }
    }
}

/// Vocabulary card as held by the card store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    /// Primary text (the word or phrase being learned)
    pub text: String,
    pub card_type: CardType,
    pub translation: Option<String>,
    pub image_url: Option<String>,
    pub level_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// New unsaved card with a fresh id
    pub fn new(text: impl Into<String>, card_type: CardType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            card_type,
            translation: None,
            image_url: None,
            level_id: None,
            tag_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_url
            .as_deref()
            .map(|url| !url.trim().is_empty())
            .unwrap_or(false)
    }

    /// Text an image prompt is built around: the translation when present,
    /// otherwise the card text. `None` when both are blank.
    pub fn prompt_subject(&self) -> Option<&str> {
        self.translation
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| Some(self.text.trim()).filter(|t| !t.is_empty()))
    }
}

/// Category tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Restricts which stored cards an image backfill run visits
///
/// Every field is optional; an empty filter matches all cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillFilter {
    pub card_type: Option<CardType>,
    /// Tag the card must carry
    pub category_id: Option<Uuid>,
    pub level_id: Option<String>,
}

impl BackfillFilter {
    pub fn matches(&self, card: &Card) -> bool {
        if let Some(card_type) = self.card_type {
            if card.card_type != card_type {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if !card.tag_ids.contains(&category_id) {
                return false;
            }
        }
        if let Some(level_id) = &self.level_id {
            if card.level_id.as_ref() != Some(level_id) {
                return false;
            }
        }
        true
    }

    /// Card is a backfill candidate: supported subtype, no image yet, matches
    /// the filter and has something to build a prompt from
    pub fn is_eligible(&self, card: &Card) -> bool {
        card.card_type.is_bulk_supported()
            && !card.has_image()
            && self.matches(card)
            && card.prompt_subject().is_some()
    }
}
