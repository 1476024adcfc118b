//! Daily-budget allocation.
//!
//! Topics are packed greedily, in curriculum order, into a fixed number of
//! minutes per day. A topic that does not fit the rest of the day is split
//! into exactly two fragments: one filling the day, one continuing on the
//! next day.

use chrono::NaiveDate;

use super::{add_days, reviews_for, Allocation, Fragment, ScheduleEntry, ScheduleStatus};
use crate::completion::CompletionStore;
use crate::curriculum::CurriculumTopic;
use crate::error::ScheduleError;

pub(super) fn allocate(
    topics: &[CurriculumTopic<'_>],
    start_date: NaiveDate,
    budget_minutes: u32,
    store: &CompletionStore,
) -> Result<Allocation, ScheduleError> {
    let mut entries = Vec::with_capacity(topics.len());
    let mut cursor = start_date;
    // Starts exhausted, so the first topic lands on the day after `start_date`.
    let mut minutes_remaining = 0u32;

    for topic in topics {
        let duration = topic.topic.duration_minutes;
        let completed = store.is_topic_complete(&topic.key());

        if minutes_remaining == 0 {
            minutes_remaining = budget_minutes;
            cursor = add_days(cursor, 1)?;
        }
        let scheduled_on = cursor;

        if duration <= minutes_remaining {
            entries.push(ScheduleEntry::study(topic, cursor, duration, None, completed));
            minutes_remaining -= duration;
        } else {
            entries.push(ScheduleEntry::study(
                topic,
                cursor,
                minutes_remaining,
                Some(Fragment::First),
                completed,
            ));
            let leftover = duration - minutes_remaining;
            cursor = add_days(cursor, 1)?;
            entries.push(ScheduleEntry::study(
                topic,
                cursor,
                leftover,
                Some(Fragment::Continuation),
                completed,
            ));
            // A continuation longer than a whole day closes that day too.
            minutes_remaining = budget_minutes.saturating_sub(leftover);
        }

        entries.extend(reviews_for(topic, scheduled_on, store)?);
    }

    Ok(Allocation {
        entries,
        status: ScheduleStatus::Complete,
    })
}
