//! Flat CSV export of a schedule.
//!
//! Column order is fixed and is the only externally consumed layout:
//!
//! | # | column           | content                                   |
//! |---|------------------|-------------------------------------------|
//! | 1 | date             | entry date, formatted with `date_format`  |
//! | 2 | volume           | `Vol N`                                   |
//! | 3 | chapter          | chapter name                              |
//! | 4 | topic            | entry label (continuation/review marked)  |
//! | 5 | duration_minutes | minutes                                   |
//! | 6 | kind             | study or review label                     |
//! | 7 | status           | completed or pending label                |
//!
//! Header text and the kind/status labels come from [`ExportConfig`].

use std::fmt::Write as _;
use std::io::Write;

use crate::completion::CompletionStore;
use crate::error::ExportError;
use crate::schedule::ScheduleEntry;
use crate::storage::ExportConfig;

/// Stable column identifiers, in output order.
pub const COLUMNS: [&str; 7] = [
    "date",
    "volume",
    "chapter",
    "topic",
    "duration_minutes",
    "kind",
    "status",
];

fn row(
    entry: &ScheduleEntry,
    store: &CompletionStore,
    config: &ExportConfig,
) -> Result<[String; 7], ExportError> {
    let completed = match entry.review_id() {
        Some(review_id) => store.is_review_complete(review_id),
        None => store.is_topic_complete(&entry.topic_key),
    };
    let kind = if entry.is_study() {
        &config.study_label
    } else {
        &config.review_label
    };
    let status = if completed {
        &config.completed_label
    } else {
        &config.pending_label
    };
    let mut date = String::new();
    write!(date, "{}", entry.date.format(&config.date_format))
        .map_err(|_| ExportError::DateFormat(config.date_format.clone()))?;
    Ok([
        date,
        format!("Vol {}", entry.volume_number),
        entry.chapter_name.clone(),
        entry.label(),
        entry.duration_minutes.to_string(),
        kind.clone(),
        status.clone(),
    ])
}

/// Write `entries` as CSV, header first.
pub fn write_csv<W: Write>(
    entries: &[ScheduleEntry],
    store: &CompletionStore,
    config: &ExportConfig,
    writer: W,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&config.headers)?;
    for entry in entries {
        csv.write_record(row(entry, store, config)?)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    tracing::debug!(rows = entries.len(), "schedule exported");
    Ok(())
}

/// CSV export as a string.
pub fn to_csv_string(
    entries: &[ScheduleEntry],
    store: &CompletionStore,
    config: &ExportConfig,
) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(entries, store, config, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::{Chapter, Curriculum, Priority, Topic, TopicKey, Volume};
    use crate::schedule::test_support::*;
    use crate::schedule::{generate, ScheduleRequest};

    #[test]
    fn header_and_rows_in_fixed_order() {
        let curriculum = single_chapter(&[60, 90]);
        let mut store = CompletionStore::new();
        store.toggle_topic(&TopicKey::from("vol1_ch1_t1"), Some(date("2026-01-02")));
        let schedule = generate(&curriculum, &ScheduleRequest::new(date("2026-01-01")), &store).unwrap();

        let csv = to_csv_string(&schedule.entries, &store, &ExportConfig::default()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Date,Volume,Chapter,Topic,Duration (min),Type,Status");
        assert_eq!(lines[1], "02/01/2026,Vol 1,Chapter One,Topic 1,60,Study,Completed");
        assert_eq!(lines[2], "02/01/2026,Vol 1,Chapter One,Topic 2,60,Study,Pending");
        // Review of t1 sorts before the continuation on 01-03.
        assert_eq!(lines[3], "03/01/2026,Vol 1,Chapter One,[REVIEW] Topic 1,30,Review,Pending");
        assert_eq!(lines[4], "03/01/2026,Vol 1,Chapter One,Topic 2 (continued),30,Study,Pending");
        assert_eq!(lines.len(), 1 + 3 + 5);
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let curriculum = Curriculum::new(vec![Volume::new(
            "vol1",
            1,
            "Sets",
            Priority::Essential,
            vec![Chapter::new(
                "ch1",
                "Relations, functions",
                vec![Topic::new("t1", "Domain, range", 30)],
            )],
        )])
        .unwrap();
        let store = CompletionStore::new();
        let schedule = generate(&curriculum, &ScheduleRequest::new(date("2026-01-01")), &store).unwrap();
        let csv = to_csv_string(&schedule.entries, &store, &ExportConfig::default()).unwrap();
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "02/01/2026,Vol 1,\"Relations, functions\",\"Domain, range\",30,Study,Pending"
        );
    }

    #[test]
    fn labels_and_date_format_configurable() {
        let curriculum = single_chapter(&[45]);
        let store = CompletionStore::new();
        let schedule = generate(&curriculum, &ScheduleRequest::new(date("2026-01-01")), &store).unwrap();
        let config = ExportConfig {
            date_format: "%Y-%m-%d".to_string(),
            study_label: "Estudo".to_string(),
            pending_label: "Pendente".to_string(),
            ..ExportConfig::default()
        };
        let csv = to_csv_string(&schedule.entries, &store, &config).unwrap();
        assert_eq!(
            csv.lines().nth(1).unwrap(),
            "2026-01-02,Vol 1,Chapter One,Topic 1,45,Estudo,Pendente"
        );
    }

    #[test]
    fn invalid_date_format_is_an_error() {
        let curriculum = single_chapter(&[45]);
        let store = CompletionStore::new();
        let schedule = generate(&curriculum, &ScheduleRequest::new(date("2026-01-01")), &store).unwrap();
        let config = ExportConfig {
            date_format: "%d/%".to_string(),
            ..ExportConfig::default()
        };
        let result = to_csv_string(&schedule.entries, &store, &config);
        assert!(matches!(result, Err(ExportError::DateFormat(_))));
    }

    #[test]
    fn empty_schedule_writes_header_only() {
        let csv = to_csv_string(&[], &CompletionStore::new(), &ExportConfig::default()).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert_eq!(COLUMNS.len(), ExportConfig::default().headers.len());
    }
}
