//! # Studyplan Core Library
//!
//! This library provides the core logic for turning an ordered curriculum of
//! study topics into a dated study plan with spaced-repetition reviews.
//!
//! ## Architecture
//!
//! - **Curriculum**: Ordered volumes, chapters and topics loaded from TOML or JSON
//! - **Schedule**: Pure generator placing topics on days, either against a daily
//!   minute budget or one topic per day with carryover
//! - **Review**: Review events derived at fixed offsets from a completion date
//! - **Completion**: Completed topics and reviews behind an injected
//!   key-value store
//! - **Progress / Export**: Aggregate statistics and flat CSV output
//! - **Storage**: SQLite key-value backend and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`generate`]: Schedule generation
//! - [`StudyPlanner`]: Cached planner over a curriculum, config and store
//! - [`CompletionStore`]: Completion state with explicit load/save
//! - [`Database`]: SQLite-backed [`KeyValueStore`]
//! - [`PlannerConfig`]: Application configuration management

pub mod completion;
pub mod curriculum;
pub mod error;
pub mod export;
pub mod planner;
pub mod progress;
pub mod review;
pub mod schedule;
pub mod storage;

pub use completion::{CompletionRecord, CompletionStore};
pub use curriculum::{Chapter, Curriculum, CurriculumTopic, Priority, Topic, TopicKey, Volume};
pub use error::{ConfigError, CoreError, CurriculumError, ExportError, ScheduleError, StoreError};
pub use export::{to_csv_string, write_csv};
pub use planner::StudyPlanner;
pub use progress::{summarize, volume_progress, ProgressSummary, VolumeProgress};
pub use review::{derive_reviews, ReviewEvent, ReviewId, REVIEW_OFFSETS};
pub use schedule::{
    generate, AllocationMode, EntryKind, Fragment, Schedule, ScheduleEntry, ScheduleRequest,
    ScheduleStatus,
};
pub use storage::{Database, KeyValueStore, MemoryKv, PlannerConfig};
