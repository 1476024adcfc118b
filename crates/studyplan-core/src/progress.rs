//! Progress aggregation over a generated schedule.
//!
//! Study time and review time are kept apart: minute totals sum study entries
//! only, and review minutes are reported on their own.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::completion::CompletionStore;
use crate::schedule::ScheduleEntry;

/// Summary statistics of a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Completed study entries over all study entries, 0-100
    pub percent_complete: u32,
    pub total_minutes: u64,
    pub completed_minutes: u64,
    /// Distinct calendar dates across all entries
    pub total_days: usize,
    /// Date of the last entry; `None` for an empty schedule
    pub end_date: Option<NaiveDate>,
    pub study_entries: usize,
    pub completed_study_entries: usize,
    pub review_entries: usize,
    pub review_minutes: u64,
    pub reviews_completed: usize,
    /// Incomplete reviews, overdue ones included
    pub reviews_pending: usize,
    /// Incomplete reviews dated before today
    pub reviews_overdue: usize,
}

impl ProgressSummary {
    pub fn total_hours(&self) -> f64 {
        hours(self.total_minutes)
    }

    pub fn completed_hours(&self) -> f64 {
        hours(self.completed_minutes)
    }

    pub fn remaining_minutes(&self) -> u64 {
        self.total_minutes.saturating_sub(self.completed_minutes)
    }
}

fn hours(minutes: u64) -> f64 {
    (minutes as f64 / 60.0 * 10.0).round() / 10.0
}

fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (done as f64 / total as f64 * 100.0).round() as u32
}

fn is_complete(entry: &ScheduleEntry, store: &CompletionStore) -> bool {
    match entry.review_id() {
        Some(review_id) => store.is_review_complete(review_id),
        None => store.is_topic_complete(&entry.topic_key),
    }
}

/// Summarize `entries` (sorted by date) against the completion store.
///
/// Completion is read from the store rather than the entries' own flags, so a
/// cached schedule can be summarized after a review toggle.
pub fn summarize(
    entries: &[ScheduleEntry],
    store: &CompletionStore,
    today: NaiveDate,
) -> ProgressSummary {
    let mut summary = ProgressSummary {
        total_days: entries.iter().map(|e| e.date).collect::<BTreeSet<_>>().len(),
        end_date: entries.last().map(|e| e.date),
        ..ProgressSummary::default()
    };

    for entry in entries {
        let done = is_complete(entry, store);
        let minutes = u64::from(entry.duration_minutes);
        if entry.is_study() {
            summary.study_entries += 1;
            summary.total_minutes += minutes;
            if done {
                summary.completed_study_entries += 1;
                summary.completed_minutes += minutes;
            }
        } else {
            summary.review_entries += 1;
            summary.review_minutes += minutes;
            if done {
                summary.reviews_completed += 1;
            } else {
                summary.reviews_pending += 1;
                if entry.date < today {
                    summary.reviews_overdue += 1;
                }
            }
        }
    }

    summary.percent_complete = percent(summary.completed_study_entries, summary.study_entries);
    summary
}

/// Study progress of one volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeProgress {
    pub volume_number: u32,
    pub volume_title: String,
    pub completed: usize,
    pub total: usize,
    pub percent_complete: u32,
}

/// Per-volume study progress, ordered by volume number.
pub fn volume_progress(entries: &[ScheduleEntry], store: &CompletionStore) -> Vec<VolumeProgress> {
    let mut by_volume: BTreeMap<u32, VolumeProgress> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.is_study()) {
        let progress = by_volume
            .entry(entry.volume_number)
            .or_insert_with(|| VolumeProgress {
                volume_number: entry.volume_number,
                volume_title: entry.volume_title.clone(),
                completed: 0,
                total: 0,
                percent_complete: 0,
            });
        progress.total += 1;
        if is_complete(entry, store) {
            progress.completed += 1;
        }
    }

    by_volume
        .into_values()
        .map(|mut p| {
            p.percent_complete = percent(p.completed, p.total);
            p
        })
        .collect()
}
