//! One-topic-per-day allocation with carryover.
//!
//! Each day presents the topic at the current index. An incomplete topic is
//! carried over and presented again the next day; a completed topic moves the
//! index forward and starts its review cycle. The walk stops after `max_days`
//! days and reports truncation if topics were left unplaced.

use chrono::NaiveDate;

use super::{add_days, reviews_for, Allocation, ScheduleEntry, ScheduleStatus};
use crate::completion::CompletionStore;
use crate::curriculum::CurriculumTopic;
use crate::error::ScheduleError;

pub(super) fn allocate(
    topics: &[CurriculumTopic<'_>],
    start_date: NaiveDate,
    max_days: u32,
    store: &CompletionStore,
) -> Result<Allocation, ScheduleError> {
    let mut entries = Vec::new();
    let mut cursor = start_date;
    let mut index = 0;
    let mut days = 0u32;

    while index < topics.len() && days < max_days {
        let topic = &topics[index];
        let completed = store.is_topic_complete(&topic.key());

        entries.push(ScheduleEntry::study(
            topic,
            cursor,
            topic.topic.duration_minutes,
            None,
            completed,
        ));

        if completed {
            entries.extend(reviews_for(topic, cursor, store)?);
            index += 1;
        }

        days += 1;
        if index < topics.len() && days < max_days {
            cursor = add_days(cursor, 1)?;
        }
    }

    let status = match topics.get(index) {
        Some(next) => ScheduleStatus::Truncated {
            days_considered: days,
            next_topic: next.key(),
            remaining_topics: topics.len() - index,
        },
        None => ScheduleStatus::Complete,
    };

    Ok(Allocation { entries, status })
}
