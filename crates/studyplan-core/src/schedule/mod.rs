//! Schedule generation.
//!
//! [`generate`] walks the curriculum in study order and places topics on
//! calendar days, then layers spaced-repetition reviews on top of completed
//! topics. It is a pure function of its inputs: the completion store is read
//! once as an immutable snapshot, and the same inputs always produce the same
//! entries in the same order.
//!
//! Two allocation strategies are available:
//! - [`AllocationMode::DailyBudget`]: pack topics into a fixed number of
//!   minutes per day, splitting a topic across two days when it overflows.
//! - [`AllocationMode::OnePerDay`]: one topic per day, repeating a topic on the
//!   following day until it is marked complete. Bounded by `max_days`.

mod budget;
mod carryover;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::completion::CompletionStore;
use crate::curriculum::{Curriculum, CurriculumTopic, TopicKey};
use crate::error::ScheduleError;
use crate::review::{derive_reviews, review_minutes, ReviewEvent, ReviewId};

/// Default minutes of study per day in budget mode.
pub const DEFAULT_DAILY_BUDGET_MINUTES: u32 = 120;
/// Default number of days the carryover mode considers before giving up.
pub const DEFAULT_CARRYOVER_MAX_DAYS: u32 = 365;

/// Strategy used to place topics on days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AllocationMode {
    /// Fill each day with up to `minutes` of study
    DailyBudget { minutes: u32 },
    /// One topic per day with carryover of incomplete topics, considering at
    /// most `max_days` days
    OnePerDay { max_days: u32 },
}

impl AllocationMode {
    pub fn daily_budget() -> Self {
        Self::DailyBudget {
            minutes: DEFAULT_DAILY_BUDGET_MINUTES,
        }
    }

    pub fn one_per_day() -> Self {
        Self::OnePerDay {
            max_days: DEFAULT_CARRYOVER_MAX_DAYS,
        }
    }
}

impl Default for AllocationMode {
    fn default() -> Self {
        Self::daily_budget()
    }
}

/// Inputs of a generation run besides the curriculum and completion store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// First calendar day eligible for allocation
    pub start_date: NaiveDate,
    pub mode: AllocationMode,
    /// Include volumes whose priority is complementary
    pub include_complementary: bool,
}

impl ScheduleRequest {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            mode: AllocationMode::default(),
            include_complementary: false,
        }
    }

    /// Build a request from a `YYYY-MM-DD` start date.
    ///
    /// # Errors
    /// Returns [`ScheduleError::InvalidDate`] for empty or malformed input.
    pub fn parse(start_date: &str) -> Result<Self, ScheduleError> {
        Ok(Self::new(parse_date(start_date)?))
    }

    pub fn with_mode(mut self, mode: AllocationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_complementary(mut self, include: bool) -> Self {
        self.include_complementary = include;
        self
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| ScheduleError::InvalidDate {
        input: input.to_string(),
    })
}

pub(crate) fn add_days(base: NaiveDate, days: u64) -> Result<NaiveDate, ScheduleError> {
    base.checked_add_days(Days::new(days))
        .ok_or(ScheduleError::DateOutOfRange { base, days })
}

/// Which part of a split topic a study entry covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fragment {
    First,
    Continuation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    Study {
        /// Set only when the topic was split across two days
        fragment: Option<Fragment>,
    },
    Review {
        review_id: ReviewId,
        offset_days: u32,
    },
}

/// One line of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub date: NaiveDate,
    pub topic_key: TopicKey,
    /// Topic index in full curriculum order
    pub position: usize,
    pub volume_id: String,
    pub volume_number: u32,
    pub volume_title: String,
    pub chapter_name: String,
    pub topic_name: String,
    pub duration_minutes: u32,
    pub completed: bool,
    pub kind: EntryKind,
}

impl ScheduleEntry {
    pub(crate) fn study(
        topic: &CurriculumTopic<'_>,
        date: NaiveDate,
        duration_minutes: u32,
        fragment: Option<Fragment>,
        completed: bool,
    ) -> Self {
        let key = topic.key();
        Self {
            id: format!("study_{key}_{date}"),
            date,
            topic_key: key,
            position: topic.position,
            volume_id: topic.volume.id.clone(),
            volume_number: topic.volume.number,
            volume_title: topic.volume.title.clone(),
            chapter_name: topic.chapter.name.clone(),
            topic_name: topic.topic.name.clone(),
            duration_minutes,
            completed,
            kind: EntryKind::Study { fragment },
        }
    }

    pub(crate) fn review(topic: &CurriculumTopic<'_>, event: ReviewEvent) -> Self {
        Self {
            id: format!("review_{}", event.review_id),
            date: event.scheduled_date,
            topic_key: event.topic_key,
            position: topic.position,
            volume_id: topic.volume.id.clone(),
            volume_number: topic.volume.number,
            volume_title: topic.volume.title.clone(),
            chapter_name: topic.chapter.name.clone(),
            topic_name: topic.topic.name.clone(),
            duration_minutes: review_minutes(topic.topic.duration_minutes),
            completed: event.completed,
            kind: EntryKind::Review {
                review_id: event.review_id,
                offset_days: event.offset_days,
            },
        }
    }

    pub fn is_study(&self) -> bool {
        matches!(self.kind, EntryKind::Study { .. })
    }

    pub fn is_review(&self) -> bool {
        matches!(self.kind, EntryKind::Review { .. })
    }

    pub fn review_id(&self) -> Option<&ReviewId> {
        match &self.kind {
            EntryKind::Review { review_id, .. } => Some(review_id),
            EntryKind::Study { .. } => None,
        }
    }

    /// Display label of the entry.
    pub fn label(&self) -> String {
        match &self.kind {
            EntryKind::Study {
                fragment: Some(Fragment::Continuation),
            } => format!("{} (continued)", self.topic_name),
            EntryKind::Study { .. } => self.topic_name.clone(),
            EntryKind::Review { .. } => format!("[REVIEW] {}", self.topic_name),
        }
    }

    /// Date, then reviews before study, then curriculum order.
    fn sort_key(&self) -> (NaiveDate, u8, usize, u32) {
        match &self.kind {
            EntryKind::Review { offset_days, .. } => (self.date, 0, self.position, *offset_days),
            EntryKind::Study { fragment } => {
                let part = match fragment {
                    None | Some(Fragment::First) => 0,
                    Some(Fragment::Continuation) => 1,
                };
                (self.date, 1, self.position, part)
            }
        }
    }
}

/// Whether every included topic was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleStatus {
    Complete,
    /// The carryover day cap was reached while topics were still unplaced
    Truncated {
        days_considered: u32,
        next_topic: TopicKey,
        remaining_topics: usize,
    },
}

/// Generated schedule, sorted by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub entries: Vec<ScheduleEntry>,
    pub status: ScheduleStatus,
}

impl Schedule {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            status: ScheduleStatus::Complete,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self.status, ScheduleStatus::Truncated { .. })
    }

    pub fn study_entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(|e| e.is_study())
    }

    pub fn review_entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(|e| e.is_review())
    }

    /// Agenda for one day.
    pub fn entries_on(&self, date: NaiveDate) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(move |e| e.date == date)
    }
}

/// Raw allocator output before ordering and de-duplication.
pub(crate) struct Allocation {
    pub entries: Vec<ScheduleEntry>,
    pub status: ScheduleStatus,
}

/// Review entries for `topic` if it is complete, anchored on its recorded
/// completion date or, when none was recorded, on `scheduled_on`.
pub(crate) fn reviews_for(
    topic: &CurriculumTopic<'_>,
    scheduled_on: NaiveDate,
    store: &CompletionStore,
) -> Result<Vec<ScheduleEntry>, ScheduleError> {
    let key = topic.key();
    if !store.is_topic_complete(&key) {
        return Ok(Vec::new());
    }
    let anchor = store.completion_date(&key).unwrap_or(scheduled_on);
    Ok(derive_reviews(&key, anchor, store.completed_reviews())?
        .into_iter()
        .map(|event| ScheduleEntry::review(topic, event))
        .collect())
}

/// Generate the schedule for `curriculum` under `request`.
///
/// An empty curriculum (possibly after filtering out complementary volumes)
/// yields an empty, complete schedule.
///
/// # Errors
/// Fails before allocating anything when the daily budget is zero, and with
/// [`ScheduleError::DateOutOfRange`] if a date leaves chrono's range.
pub fn generate(
    curriculum: &Curriculum,
    request: &ScheduleRequest,
    store: &CompletionStore,
) -> Result<Schedule, ScheduleError> {
    if let AllocationMode::DailyBudget { minutes: 0 } = request.mode {
        return Err(ScheduleError::ZeroBudget);
    }

    let topics = curriculum.included_topics(request.include_complementary);
    if topics.is_empty() {
        tracing::debug!(start = %request.start_date, "no topics to schedule");
        return Ok(Schedule::empty());
    }

    let Allocation { mut entries, status } = match request.mode {
        AllocationMode::DailyBudget { minutes } => {
            budget::allocate(&topics, request.start_date, minutes, store)?
        }
        AllocationMode::OnePerDay { max_days } => {
            carryover::allocate(&topics, request.start_date, max_days, store)?
        }
    };

    let mut seen = HashSet::new();
    entries.retain(|e| seen.insert(e.id.clone()));
    entries.sort_by_key(ScheduleEntry::sort_key);

    if let ScheduleStatus::Truncated {
        days_considered,
        next_topic,
        remaining_topics,
    } = &status
    {
        tracing::warn!(
            days_considered,
            next_topic = %next_topic,
            remaining_topics,
            "schedule truncated at carryover day cap"
        );
    }
    tracing::debug!(
        start = %request.start_date,
        mode = ?request.mode,
        topics = topics.len(),
        entries = entries.len(),
        "schedule generated"
    );

    Ok(Schedule { entries, status })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::curriculum::{Chapter, Curriculum, Priority, Topic, Volume};
    use chrono::NaiveDate;

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// One essential volume, one chapter, topics `t1..` with the given minutes.
    pub fn single_chapter(minutes: &[u32]) -> Curriculum {
        let topics = minutes
            .iter()
            .enumerate()
            .map(|(i, m)| Topic::new(format!("t{}", i + 1), format!("Topic {}", i + 1), *m))
            .collect();
        Curriculum::new(vec![Volume::new(
            "vol1",
            1,
            "Volume One",
            Priority::Essential,
            vec![Chapter::new("ch1", "Chapter One", topics)],
        )])
        .unwrap()
    }
}
