//! Completion store: which topics and reviews the learner has finished.
//!
//! The store is the only mutable state the engine depends on. It changes only
//! through explicit toggles and never infers dates: a completion date is
//! recorded only when the caller supplies one.
//!
//! Un-completing a topic also forgets every review completion derived from
//! it. Reviews are generated only for completed topics, so this keeps the
//! store free of review state that no schedule can show.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::curriculum::TopicKey;
use crate::error::StoreError;
use crate::review::ReviewId;
use crate::storage::KeyValueStore;

/// Key under which completed topics are persisted.
pub const TOPICS_KEY: &str = "completed_topics";
/// Key under which completed review ids are persisted.
pub const REVIEWS_KEY: &str = "completed_reviews";

/// Completion state of a single topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub topic_key: TopicKey,
    pub completed: bool,
    pub completed_on: Option<NaiveDate>,
}

/// Persisted shape of one completed topic.
///
/// Older saves hold a bare array of topic keys, so both forms are accepted.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredTopic {
    Record {
        key: TopicKey,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completed_on: Option<NaiveDate>,
    },
    Key(TopicKey),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionStore {
    topics: BTreeMap<TopicKey, Option<NaiveDate>>,
    reviews: BTreeSet<ReviewId>,
    revision: u64,
}

impl CompletionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a topic's completion state and return the new state.
    ///
    /// `completed_on` is recorded when the topic becomes complete and ignored
    /// otherwise.
    pub fn toggle_topic(&mut self, key: &TopicKey, completed_on: Option<NaiveDate>) -> bool {
        self.revision += 1;
        if self.topics.remove(key).is_some() {
            let before = self.reviews.len();
            self.reviews.retain(|id| !id.belongs_to(key));
            tracing::info!(
                topic = %key,
                reviews_cleared = before - self.reviews.len(),
                "topic marked incomplete"
            );
            false
        } else {
            self.topics.insert(key.clone(), completed_on);
            tracing::info!(topic = %key, completed_on = ?completed_on, "topic marked complete");
            true
        }
    }

    /// Flip a review's completion state and return the new state.
    pub fn toggle_review(&mut self, review_id: &ReviewId) -> bool {
        self.revision += 1;
        if self.reviews.remove(review_id) {
            tracing::info!(review = %review_id, "review marked pending");
            false
        } else {
            self.reviews.insert(review_id.clone());
            tracing::info!(review = %review_id, "review marked complete");
            true
        }
    }

    pub fn is_topic_complete(&self, key: &TopicKey) -> bool {
        self.topics.contains_key(key)
    }

    pub fn is_review_complete(&self, review_id: &ReviewId) -> bool {
        self.reviews.contains(review_id)
    }

    /// Recorded completion date, if the topic is complete and one was supplied.
    pub fn completion_date(&self, key: &TopicKey) -> Option<NaiveDate> {
        self.topics.get(key).copied().flatten()
    }

    /// Completion record for a topic; absent topics read as not completed.
    pub fn record(&self, key: &TopicKey) -> CompletionRecord {
        CompletionRecord {
            topic_key: key.clone(),
            completed: self.is_topic_complete(key),
            completed_on: self.completion_date(key),
        }
    }

    pub fn completed_reviews(&self) -> &BTreeSet<ReviewId> {
        &self.reviews
    }

    pub fn completed_topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Read the store from `kv`. Missing keys read as empty.
    pub fn load<K: KeyValueStore + ?Sized>(kv: &K) -> Result<Self, StoreError> {
        let mut store = Self::new();

        if let Some(raw) = kv.get(TOPICS_KEY)? {
            let stored: Vec<StoredTopic> = decode(TOPICS_KEY, &raw)?;
            for item in stored {
                let (key, completed_on) = match item {
                    StoredTopic::Record { key, completed_on } => (key, completed_on),
                    StoredTopic::Key(key) => (key, None),
                };
                store.topics.insert(key, completed_on);
            }
        }

        if let Some(raw) = kv.get(REVIEWS_KEY)? {
            store.reviews = decode(REVIEWS_KEY, &raw)?;
        }

        tracing::debug!(
            topics = store.topics.len(),
            reviews = store.reviews.len(),
            "completion store loaded"
        );
        Ok(store)
    }

    /// Write both sets to `kv` in one `set_many` call.
    pub fn save<K: KeyValueStore + ?Sized>(&self, kv: &mut K) -> Result<(), StoreError> {
        let topics: Vec<StoredTopic> = self
            .topics
            .iter()
            .map(|(key, completed_on)| StoredTopic::Record {
                key: key.clone(),
                completed_on: *completed_on,
            })
            .collect();
        let topics = encode(TOPICS_KEY, &topics)?;
        let reviews = encode(REVIEWS_KEY, &self.reviews)?;
        kv.set_many(&[(TOPICS_KEY, topics.as_str()), (REVIEWS_KEY, reviews.as_str())])
    }
}

fn decode<T: for<'de> Deserialize<'de>>(key: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}
