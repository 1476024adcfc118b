//! Spaced-repetition review derivation.
//!
//! A completed topic is reviewed at fixed offsets after its completion date.
//! Dates are anchored on the topic's own completion date, so deriving twice
//! with the same inputs always yields the same events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::curriculum::TopicKey;
use crate::error::ScheduleError;
use crate::schedule::add_days;

/// Day offsets of the review cycle, counted from the completion date.
pub const REVIEW_OFFSETS: [u32; 5] = [1, 7, 14, 30, 90];

/// Synthetic review identity: `${topicKey}-${offsetDays}d`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(String);

impl ReviewId {
    pub fn new(topic_key: &TopicKey, offset_days: u32) -> Self {
        Self(format!("{topic_key}-{offset_days}d"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Offset encoded in the id when it was derived from `topic_key`.
    pub fn offset_for(&self, topic_key: &TopicKey) -> Option<u32> {
        self.0
            .strip_prefix(topic_key.as_str())?
            .strip_prefix('-')?
            .strip_suffix('d')?
            .parse()
            .ok()
    }

    pub fn belongs_to(&self, topic_key: &TopicKey) -> bool {
        self.offset_for(topic_key).is_some()
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReviewId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ReviewId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One scheduled review of a completed topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub review_id: ReviewId,
    pub topic_key: TopicKey,
    pub offset_days: u32,
    pub scheduled_date: NaiveDate,
    pub completed: bool,
}

/// Minutes allotted to a single review: half the topic's study time, rounded up.
pub fn review_minutes(topic_minutes: u32) -> u32 {
    topic_minutes.div_ceil(2)
}

/// Derive the review cycle for a topic completed on `completion_date`.
///
/// Always returns one event per entry of [`REVIEW_OFFSETS`], in offset order.
/// Each event's `completed` flag is read from `completed_reviews`.
pub fn derive_reviews(
    topic_key: &TopicKey,
    completion_date: NaiveDate,
    completed_reviews: &BTreeSet<ReviewId>,
) -> Result<Vec<ReviewEvent>, ScheduleError> {
    REVIEW_OFFSETS
        .iter()
        .map(|&offset_days| {
            let review_id = ReviewId::new(topic_key, offset_days);
            Ok(ReviewEvent {
                completed: completed_reviews.contains(&review_id),
                review_id,
                topic_key: topic_key.clone(),
                offset_days,
                scheduled_date: add_days(completion_date, u64::from(offset_days))?,
            })
        })
        .collect()
}
