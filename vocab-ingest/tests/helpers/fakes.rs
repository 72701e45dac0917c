//! In-memory collaborators with failure injection and call recording

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vocab_common::config::PipelineConfig;
use vocab_common::events::{EventBus, ProgressSnapshot};
use vocab_ingest::error::RemoteError;
use vocab_ingest::models::{BackfillSummary, Card, Tag};
use vocab_ingest::pipeline::{
    BackfillObserver, BackfillPipeline, BulkAddPipeline, Collaborators, ProgressObserver,
};
use vocab_ingest::types::{CardStore, ImageGenerator, TagStore, Translator};
use vocab_ingest::AppState;

use super::fast_retry;

/// Scripted failures for one collaborator method
///
/// Queued errors are returned first, one per call. After the queue drains,
/// `always` (if set) is returned on every call.
#[derive(Default)]
pub struct Faults {
    queued: Mutex<VecDeque<RemoteError>>,
    always: Mutex<Option<RemoteError>>,
}

impl Faults {
    pub fn fail_times(&self, times: usize, err: RemoteError) {
        let mut queued = self.queued.lock().unwrap();
        for _ in 0..times {
            queued.push_back(err.clone());
        }
    }

    pub fn fail_always(&self, err: RemoteError) {
        *self.always.lock().unwrap() = Some(err);
    }

    fn next(&self) -> Option<RemoteError> {
        if let Some(err) = self.queued.lock().unwrap().pop_front() {
            return Some(err);
        }
        self.always.lock().unwrap().clone()
    }
}

// ========================================
// Card store
// ========================================

#[derive(Default)]
pub struct MemoryCardStore {
    cards: Mutex<Vec<Card>>,
    /// Cards with these texts are silently left out of batch upsert results
    dropped_from_batch: Mutex<HashSet<String>>,
    /// Cards with these texts fail single upserts permanently
    rejected_upserts: Mutex<HashSet<String>>,
    pub load_faults: Faults,
    pub batch_faults: Faults,
    pub upsert_faults: Faults,
    pub tag_faults: Faults,
    load_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    tag_calls: AtomicUsize,
}

impl MemoryCardStore {
    pub fn with_cards(cards: Vec<Card>) -> Self {
        Self {
            cards: Mutex::new(cards),
            ..Self::default()
        }
    }

    pub fn insert(&self, card: Card) {
        self.cards.lock().unwrap().push(card);
    }

    pub fn cards(&self) -> Vec<Card> {
        self.cards.lock().unwrap().clone()
    }

    pub fn card_by_text(&self, text: &str) -> Option<Card> {
        self.cards().into_iter().find(|card| card.text == text)
    }

    pub fn drop_from_batch(&self, text: &str) {
        self.dropped_from_batch.lock().unwrap().insert(text.to_string());
    }

    pub fn reject_upsert(&self, text: &str) {
        self.rejected_upserts.lock().unwrap().insert(text.to_string());
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn tag_calls(&self) -> usize {
        self.tag_calls.load(Ordering::SeqCst)
    }

    fn store(&self, card: Card) {
        let mut cards = self.cards.lock().unwrap();
        match cards.iter_mut().find(|existing| existing.id == card.id) {
            Some(existing) => *existing = card,
            None => cards.push(card),
        }
    }
}

#[async_trait::async_trait]
impl CardStore for MemoryCardStore {
    async fn load_all(&self) -> Result<Vec<Card>, RemoteError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.load_faults.next() {
            return Err(err);
        }
        Ok(self.cards())
    }

    async fn batch_upsert(&self, cards: &[Card]) -> Result<Vec<Card>, RemoteError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.batch_faults.next() {
            return Err(err);
        }

        let dropped = self.dropped_from_batch.lock().unwrap().clone();
        let mut stored = Vec::new();
        for card in cards.iter().filter(|card| !dropped.contains(&card.text)) {
            self.store(card.clone());
            stored.push(card.clone());
        }
        Ok(stored)
    }

    async fn upsert_one(&self, card: &Card) -> Result<Card, RemoteError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.upsert_faults.next() {
            return Err(err);
        }
        if self.rejected_upserts.lock().unwrap().contains(&card.text) {
            return Err(RemoteError::Storage(format!(
                "constraint failed for '{}'",
                card.text
            )));
        }

        self.store(card.clone());
        Ok(card.clone())
    }

    async fn set_tag_associations(&self, card_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RemoteError> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.tag_faults.next() {
            return Err(err);
        }

        let mut cards = self.cards.lock().unwrap();
        let card = cards
            .iter_mut()
            .find(|card| card.id == card_id)
            .ok_or_else(|| RemoteError::Storage(format!("unknown card {}", card_id)))?;
        card.tag_ids = tag_ids.to_vec();
        Ok(())
    }
}

// ========================================
// Tag store
// ========================================

#[derive(Default)]
pub struct MemoryTagStore {
    tags: Mutex<Vec<Tag>>,
    pub list_faults: Faults,
    pub create_faults: Faults,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl MemoryTagStore {
    pub fn insert(&self, name: &str) -> Uuid {
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
        };
        let id = tag.id;
        self.tags.lock().unwrap().push(tag);
        id
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TagStore for MemoryTagStore {
    async fn list(&self) -> Result<Vec<Tag>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_faults.next() {
            return Err(err);
        }
        Ok(self.tags())
    }

    async fn create(&self, name: &str, description: &str) -> Result<Tag, RemoteError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.create_faults.next() {
            return Err(err);
        }

        let mut tags = self.tags.lock().unwrap();
        if let Some(existing) = tags.iter().find(|tag| tag.name.eq_ignore_ascii_case(name)) {
            return Ok(existing.clone());
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
        };
        tags.push(tag.clone());
        Ok(tag)
    }
}

// ========================================
// Translator
// ========================================

/// One recorded remote call
#[derive(Debug, Clone)]
pub struct Call {
    pub input: String,
    pub at: Instant,
}

/// Translates `word` to `word-en` unless told otherwise
#[derive(Default)]
pub struct FakeTranslator {
    translations: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    latency: Mutex<Duration>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTranslator {
    pub fn set_translation(&self, word: &str, translation: &str) {
        self.translations
            .lock()
            .unwrap()
            .insert(word.to_string(), translation.to_string());
    }

    pub fn fail_word(&self, word: &str) {
        self.failing.lock().unwrap().insert(word.to_string());
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, _from: &str, _to: &str) -> Result<String, RemoteError> {
        self.calls.lock().unwrap().push(Call {
            input: text.to_string(),
            at: Instant::now(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = self.failing.lock().unwrap().contains(text);
        if failing {
            return Err(RemoteError::status(502, "translation backend unavailable"));
        }

        let translation = self.translations.lock().unwrap().get(text).cloned();
        Ok(translation.unwrap_or_else(|| format!("{}-en", text)))
    }
}

// ========================================
// Image generator
// ========================================

/// Returns `https://images.test/<n>.png` for the n-th call
#[derive(Default)]
pub struct FakeImageGenerator {
    failing_subjects: Mutex<HashSet<String>>,
    empty_subjects: Mutex<HashSet<String>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
    latency: Mutex<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl FakeImageGenerator {
    /// Fail every prompt built around `subject`
    pub fn fail_subject(&self, subject: &str) {
        self.failing_subjects
            .lock()
            .unwrap()
            .insert(subject.to_string());
    }

    /// Answer prompts built around `subject` with an empty URL
    pub fn empty_url_for(&self, subject: &str) {
        self.empty_subjects
            .lock()
            .unwrap()
            .insert(subject.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_subjects.lock().unwrap().clear();
        self.empty_subjects.lock().unwrap().clear();
    }

    /// Cancel `token` while serving call number `call` (1-based)
    pub fn cancel_during_call(&self, call: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((call, token));
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Subjects in call order, extracted from the quoted part of each prompt
    pub fn subjects(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| {
                call.input
                    .split('"')
                    .nth(1)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    fn matches(set: &Mutex<HashSet<String>>, prompt: &str) -> bool {
        set.lock()
            .unwrap()
            .iter()
            .any(|subject| prompt.contains(&format!("\"{}\"", subject)))
    }
}

#[async_trait::async_trait]
impl ImageGenerator for FakeImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, RemoteError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                input: prompt.to_string(),
                at: Instant::now(),
            });
            calls.len()
        };

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let cancel = self.cancel_after.lock().unwrap().clone();
        if let Some((after, token)) = cancel {
            if after == call_number {
                token.cancel();
            }
        }

        if Self::matches(&self.failing_subjects, prompt) {
            return Err(RemoteError::Rejected("prompt refused by content policy".to_string()));
        }
        if Self::matches(&self.empty_subjects, prompt) {
            return Ok(String::new());
        }
        Ok(format!("https://images.test/{}.png", call_number))
    }
}

// ========================================
// Observer
// ========================================

#[derive(Default)]
pub struct RecordingObserver {
    snapshots: Mutex<Vec<ProgressSnapshot>>,
    summaries: Mutex<Vec<BackfillSummary>>,
}

impl RecordingObserver {
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<BackfillSummary> {
        self.summaries.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}

impl BackfillObserver for RecordingObserver {
    fn on_complete(&self, summary: &BackfillSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }
}

// ========================================
// Harness
// ========================================

/// One set of fakes wired together
#[derive(Default)]
pub struct Harness {
    pub cards: Arc<MemoryCardStore>,
    pub tags: Arc<MemoryTagStore>,
    pub translator: Arc<FakeTranslator>,
    pub images: Arc<FakeImageGenerator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: Vec<Card>) -> Self {
        Self {
            cards: Arc::new(MemoryCardStore::with_cards(cards)),
            ..Self::default()
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            cards: self.cards.clone(),
            tags: self.tags.clone(),
            translator: self.translator.clone(),
            images: self.images.clone(),
        }
    }

    pub fn bulk_add(&self, config: &PipelineConfig) -> BulkAddPipeline {
        BulkAddPipeline::new(&self.collaborators(), config, fast_retry())
    }

    pub fn backfill(&self, config: &PipelineConfig) -> BackfillPipeline {
        BackfillPipeline::new(&self.collaborators(), config, fast_retry())
    }

    pub fn app_state(&self, config: &PipelineConfig) -> AppState {
        AppState::new(
            self.collaborators(),
            config,
            fast_retry(),
            EventBus::new(100),
        )
    }
}
