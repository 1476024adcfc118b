//! Study planner facade.
//!
//! [`StudyPlanner`] owns a curriculum, a [`PlannerConfig`] and an injected
//! [`KeyValueStore`]. It generates the schedule once per change of inputs and
//! serves the cached result otherwise. Completion toggles are written through
//! to the key-value store; a failed write leaves the in-memory state exactly
//! as it was before the toggle.

use chrono::NaiveDate;
use std::io::Write;

use crate::completion::CompletionStore;
use crate::curriculum::{Curriculum, TopicKey};
use crate::error::{ConfigError, CoreError, CurriculumError, Result, ScheduleError};
use crate::export;
use crate::progress::{self, ProgressSummary, VolumeProgress};
use crate::review::{ReviewId, REVIEW_OFFSETS};
use crate::schedule::{generate, AllocationMode, Schedule, ScheduleEntry, ScheduleRequest};
use crate::storage::{KeyValueStore, PlannerConfig, ScheduleModeSetting};

/// Cached schedule and the inputs it was generated from.
#[derive(Debug)]
struct CachedSchedule {
    request: ScheduleRequest,
    revision: u64,
    schedule: Schedule,
}

#[derive(Debug)]
pub struct StudyPlanner<K: KeyValueStore> {
    curriculum: Curriculum,
    config: PlannerConfig,
    store: CompletionStore,
    kv: K,
    cache: Option<CachedSchedule>,
    generations: u64,
}

impl<K: KeyValueStore> StudyPlanner<K> {
    /// Open a planner, loading completion state from `kv`.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `config` fails validation and
    /// [`CoreError::Store`] if the stored completion state cannot be read.
    pub fn open(curriculum: Curriculum, config: PlannerConfig, kv: K) -> Result<Self> {
        config.validate()?;
        let store = CompletionStore::load(&kv)?;
        tracing::info!(
            topics = curriculum.topic_count(),
            completed = store.completed_topic_count(),
            "study planner opened"
        );
        Ok(Self {
            curriculum,
            config,
            store,
            kv,
            cache: None,
            generations: 0,
        })
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn store(&self) -> &CompletionStore {
        &self.store
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// Number of times a schedule has actually been generated.
    pub fn generation_count(&self) -> u64 {
        self.generations
    }

    fn request(&self, start_date: NaiveDate) -> ScheduleRequest {
        ScheduleRequest::new(start_date)
            .with_mode(self.config.allocation_mode())
            .with_complementary(self.config.schedule.include_complementary)
    }

    /// Schedule starting at `start_date`.
    ///
    /// Regenerated only when the start date, the schedule config or the
    /// completion state changed since the last call.
    pub fn schedule(&mut self, start_date: NaiveDate) -> Result<&Schedule, ScheduleError> {
        let request = self.request(start_date);
        let revision = self.store.revision();

        let cached = match self.cache.take() {
            Some(cached) if cached.request == request && cached.revision == revision => cached,
            _ => {
                let schedule = generate(&self.curriculum, &request, &self.store)?;
                self.generations += 1;
                CachedSchedule {
                    request,
                    revision,
                    schedule,
                }
            }
        };
        Ok(&self.cache.insert(cached).schedule)
    }

    /// Flip a topic's completion, stamping `today` when it becomes complete.
    ///
    /// # Errors
    /// [`CurriculumError::UnknownTopic`] for keys outside the curriculum;
    /// [`CoreError::Store`] if persisting fails, in which case nothing changes.
    pub fn toggle_topic(&mut self, key: &TopicKey, today: NaiveDate) -> Result<bool> {
        if !self.curriculum.contains(key) {
            return Err(CurriculumError::UnknownTopic(key.to_string()).into());
        }
        let mut next = self.store.clone();
        let completed = next.toggle_topic(key, Some(today));
        self.commit(next)?;
        Ok(completed)
    }

    /// Flip a review's completion.
    ///
    /// # Errors
    /// [`CurriculumError::UnknownReview`] unless the id names a review offset
    /// of a completed topic; [`CoreError::Store`] if persisting fails.
    pub fn toggle_review(&mut self, review_id: &ReviewId) -> Result<bool> {
        let owned = self.curriculum.topics().iter().any(|t| {
            let key = t.key();
            review_id
                .offset_for(&key)
                .is_some_and(|offset| REVIEW_OFFSETS.contains(&offset))
                && self.store.is_topic_complete(&key)
        });
        if !owned {
            return Err(CurriculumError::UnknownReview(review_id.to_string()).into());
        }
        let mut next = self.store.clone();
        let completed = next.toggle_review(review_id);
        self.commit(next)?;
        Ok(completed)
    }

    fn commit(&mut self, next: CompletionStore) -> Result<()> {
        if let Err(e) = next.save(&mut self.kv) {
            tracing::warn!(error = %e, "failed to persist completion state, change discarded");
            return Err(e.into());
        }
        self.store = next;
        Ok(())
    }

    /// Progress of the schedule starting at `start_date`, as seen on `today`.
    pub fn summary(
        &mut self,
        start_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<ProgressSummary, ScheduleError> {
        self.schedule(start_date)?;
        Ok(progress::summarize(self.cached_entries(), &self.store, today))
    }

    pub fn volume_progress(
        &mut self,
        start_date: NaiveDate,
    ) -> Result<Vec<VolumeProgress>, ScheduleError> {
        self.schedule(start_date)?;
        Ok(progress::volume_progress(self.cached_entries(), &self.store))
    }

    /// Write the schedule starting at `start_date` as CSV.
    pub fn export_csv<W: Write>(&mut self, start_date: NaiveDate, writer: W) -> Result<()> {
        self.schedule(start_date)?;
        export::write_csv(self.cached_entries(), &self.store, &self.config.export, writer)?;
        Ok(())
    }

    fn cached_entries(&self) -> &[ScheduleEntry] {
        self.cache
            .as_ref()
            .map(|c| c.schedule.entries.as_slice())
            .unwrap_or_default()
    }

    pub fn set_include_complementary(&mut self, include: bool) {
        self.config.schedule.include_complementary = include;
    }

    /// Switch the allocation mode.
    ///
    /// # Errors
    /// Rejects a zero budget or zero day cap, leaving the config unchanged.
    pub fn set_mode(&mut self, mode: AllocationMode) -> Result<(), ConfigError> {
        let mut next = self.config.clone();
        match mode {
            AllocationMode::DailyBudget { minutes } => {
                next.schedule.mode = ScheduleModeSetting::DailyBudget;
                next.schedule.daily_budget_minutes = minutes;
            }
            AllocationMode::OnePerDay { max_days } => {
                next.schedule.mode = ScheduleModeSetting::OnePerDay;
                next.schedule.carryover_max_days = max_days;
            }
        }
        next.validate()?;
        self.config = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExportError, StoreError};
    use crate::schedule::test_support::*;
    use crate::storage::MemoryKv;

    /// Reads succeed, every write fails.
    struct FailingKv;

    impl KeyValueStore for FailingKv {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }
    }

    fn planner(minutes: &[u32]) -> StudyPlanner<MemoryKv> {
        StudyPlanner::open(single_chapter(minutes), PlannerConfig::default(), MemoryKv::new()).unwrap()
    }

    #[test]
    fn schedule_is_cached_until_inputs_change() {
        let mut planner = planner(&[60, 90]);
        let start = date("2026-01-01");

        let first = planner.schedule(start).unwrap().clone();
        let again = planner.schedule(start).unwrap().clone();
        assert_eq!(first, again);
        assert_eq!(planner.generation_count(), 1);

        planner.summary(start, date("2026-01-05")).unwrap();
        assert_eq!(planner.generation_count(), 1);

        planner.schedule(date("2026-01-02")).unwrap();
        assert_eq!(planner.generation_count(), 2);

        planner
            .toggle_topic(&TopicKey::from("vol1_ch1_t1"), date("2026-01-02"))
            .unwrap();
        let updated = planner.schedule(date("2026-01-02")).unwrap();
        assert_eq!(updated.review_entries().count(), 5);
        assert_eq!(planner.generation_count(), 3);

        planner.set_mode(AllocationMode::one_per_day()).unwrap();
        planner.schedule(date("2026-01-02")).unwrap();
        assert_eq!(planner.generation_count(), 4);
    }

    #[test]
    fn toggles_persist_through_kv() {
        let mut planner = planner(&[60]);
        let key = TopicKey::from("vol1_ch1_t1");
        assert!(planner.toggle_topic(&key, date("2026-03-01")).unwrap());
        assert!(planner.toggle_review(&ReviewId::new(&key, 7)).unwrap());

        let reloaded = CompletionStore::load(planner.kv()).unwrap();
        assert_eq!(reloaded.completion_date(&key), Some(date("2026-03-01")));
        assert!(reloaded.is_review_complete(&ReviewId::from("vol1_ch1_t1-7d")));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut planner = planner(&[60]);
        let err = planner
            .toggle_topic(&TopicKey::from("vol1_ch1_t9"), date("2026-01-01"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Curriculum(CurriculumError::UnknownTopic(_))));

        // Review of a topic that is not complete yet.
        let err = planner.toggle_review(&ReviewId::from("vol1_ch1_t1-1d")).unwrap_err();
        assert!(matches!(err, CoreError::Curriculum(CurriculumError::UnknownReview(_))));

        planner
            .toggle_topic(&TopicKey::from("vol1_ch1_t1"), date("2026-01-01"))
            .unwrap();
        let err = planner.toggle_review(&ReviewId::from("vol1_ch1_t1-2d")).unwrap_err();
        assert!(matches!(err, CoreError::Curriculum(CurriculumError::UnknownReview(_))));
    }

    #[test]
    fn failed_save_rolls_back() {
        let mut planner =
            StudyPlanner::open(single_chapter(&[60]), PlannerConfig::default(), FailingKv).unwrap();
        let key = TopicKey::from("vol1_ch1_t1");
        planner.schedule(date("2026-01-01")).unwrap();

        let err = planner.toggle_topic(&key, date("2026-01-02")).unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::Backend(_))));
        assert!(!planner.store().is_topic_complete(&key));
        assert_eq!(planner.store().revision(), 0);

        planner.schedule(date("2026-01-01")).unwrap();
        assert_eq!(planner.generation_count(), 1);
    }

    #[test]
    fn complementary_toggle_changes_schedule() {
        let curriculum = Curriculum::from_toml_str(
            r#"
            [[volumes]]
            id = "vol1"
            number = 1
            title = "Extras"
            priority = "complementary"

            [[volumes.chapters]]
            id = "ch1"
            name = "Puzzles"

            [[volumes.chapters.topics]]
            id = "t1"
            name = "Riddles"
            "#,
        )
        .unwrap();
        let mut planner = StudyPlanner::open(curriculum, PlannerConfig::default(), MemoryKv::new()).unwrap();
        let start = date("2026-01-01");

        let summary = planner.summary(start, start).unwrap();
        assert_eq!(summary.percent_complete, 0);
        assert_eq!(summary.end_date, None);

        planner.set_include_complementary(true);
        assert_eq!(planner.schedule(start).unwrap().len(), 1);
    }

    #[test]
    fn set_mode_rejects_zero_budget() {
        let mut planner = planner(&[60]);
        let result = planner.set_mode(AllocationMode::DailyBudget { minutes: 0 });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(planner.config(), &PlannerConfig::default());
    }

    #[test]
    fn export_uses_config_labels() {
        let mut planner = planner(&[45]);
        let mut out = Vec::new();
        planner.export_csv(date("2026-01-01"), &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();
        assert_eq!(
            csv.lines().nth(1),
            Some("02/01/2026,Vol 1,Chapter One,Topic 1,45,Study,Pending")
        );
    }

    /// Rejects every write.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn export_write_failure_is_an_export_error() {
        let mut planner = planner(&[45]);
        let err = planner.export_csv(date("2026-01-01"), ClosedPipe).unwrap_err();
        assert!(matches!(err, CoreError::Export(ExportError::Csv(_))));
    }
}
