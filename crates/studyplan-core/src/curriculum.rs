//! Curriculum model: an ordered, read-only tree of Volume → Chapter → Topic.
//!
//! Order is the only sequencing signal: volumes, chapters and topics are
//! studied exactly in the order they appear. A volume's priority is used to
//! filter volumes out of a plan, never to reorder them.
//!
//! Curricula are usually supplied as TOML or JSON:
//!
//! ```toml
//! [[volumes]]
//! id = "vol1"
//! number = 1
//! title = "Sets and Functions"
//! priority = "essential"
//!
//! [[volumes.chapters]]
//! id = "ch1"
//! name = "Sets"
//! topics = [{ id = "t1", name = "Set notation", duration_minutes = 45 }]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::CurriculumError;

/// Duration assumed for a topic that does not declare one.
pub const DEFAULT_TOPIC_MINUTES: u32 = 60;

fn default_topic_minutes() -> u32 {
    DEFAULT_TOPIC_MINUTES
}

/// Priority class of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Essential,
    Important,
    Complementary,
}

impl Priority {
    /// Whether a volume with this priority is part of a plan.
    ///
    /// Essential and important volumes are always included; complementary
    /// volumes only when explicitly requested.
    pub fn is_included(self, include_complementary: bool) -> bool {
        match self {
            Priority::Essential | Priority::Important => true,
            Priority::Complementary => include_complementary,
        }
    }
}

/// Stable topic identity: `${volumeId}_${chapterId}_${topicId}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicKey(String);

impl TopicKey {
    pub fn new(volume_id: &str, chapter_id: &str, topic_id: &str) -> Self {
        Self(format!("{volume_id}_{chapter_id}_{topic_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TopicKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Smallest curriculum unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Estimated study time in minutes
    #[serde(default = "default_topic_minutes", alias = "durationMinutes")]
    pub duration_minutes: u32,
}

impl Topic {
    pub fn new(id: impl Into<String>, name: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            duration_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

impl Chapter {
    pub fn new(id: impl Into<String>, name: impl Into<String>, topics: Vec<Topic>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            topics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub number: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Volume {
    pub fn new(
        id: impl Into<String>,
        number: u32,
        title: impl Into<String>,
        priority: Priority,
        chapters: Vec<Chapter>,
    ) -> Self {
        Self {
            id: id.into(),
            number,
            title: title.into(),
            description: None,
            priority,
            chapters,
        }
    }

    /// Display label used in exports, e.g. `Vol 3`.
    pub fn label(&self) -> String {
        format!("Vol {}", self.number)
    }
}

/// A topic together with its place in the curriculum tree.
#[derive(Debug, Clone, Copy)]
pub struct CurriculumTopic<'a> {
    /// Zero-based index in full curriculum order
    pub position: usize,
    pub volume: &'a Volume,
    pub chapter: &'a Chapter,
    pub topic: &'a Topic,
}

impl CurriculumTopic<'_> {
    pub fn key(&self) -> TopicKey {
        TopicKey::new(&self.volume.id, &self.chapter.id, &self.topic.id)
    }
}

#[derive(Debug, Deserialize)]
struct CurriculumDoc {
    #[serde(default)]
    volumes: Vec<Volume>,
}

/// Ordered sequence of volumes. Topic keys are unique.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "CurriculumDoc")]
pub struct Curriculum {
    volumes: Vec<Volume>,
}

impl TryFrom<CurriculumDoc> for Curriculum {
    type Error = CurriculumError;

    fn try_from(doc: CurriculumDoc) -> Result<Self, Self::Error> {
        Curriculum::new(doc.volumes)
    }
}

impl Curriculum {
    /// Build a curriculum, rejecting duplicate topic keys.
    pub fn new(volumes: Vec<Volume>) -> Result<Self, CurriculumError> {
        let curriculum = Self { volumes };
        let mut seen = HashSet::new();
        for entry in curriculum.topics() {
            let key = entry.key();
            if !seen.insert(key.clone()) {
                return Err(CurriculumError::DuplicateTopic(key.to_string()));
            }
        }
        Ok(curriculum)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, CurriculumError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, CurriculumError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a `.json` or `.toml` file (anything else is read as TOML).
    pub fn load(path: &Path) -> Result<Self, CurriculumError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CurriculumError::Parse(format!("{}: {e}", path.display())))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn is_empty(&self) -> bool {
        self.topic_count() == 0
    }

    pub fn topic_count(&self) -> usize {
        self.volumes
            .iter()
            .flat_map(|v| &v.chapters)
            .map(|c| c.topics.len())
            .sum()
    }

    /// All topics in study order.
    pub fn topics(&self) -> Vec<CurriculumTopic<'_>> {
        let mut out = Vec::new();
        for volume in &self.volumes {
            for chapter in &volume.chapters {
                for topic in &chapter.topics {
                    out.push(CurriculumTopic {
                        position: out.len(),
                        volume,
                        chapter,
                        topic,
                    });
                }
            }
        }
        out
    }

    /// Topics of the volumes a plan includes, in study order.
    ///
    /// Positions still refer to the full curriculum, so they stay comparable
    /// across filtered and unfiltered views.
    pub fn included_topics(&self, include_complementary: bool) -> Vec<CurriculumTopic<'_>> {
        self.topics()
            .into_iter()
            .filter(|t| t.volume.priority.is_included(include_complementary))
            .collect()
    }

    pub fn topic(&self, key: &TopicKey) -> Option<CurriculumTopic<'_>> {
        self.topics().into_iter().find(|t| &t.key() == key)
    }

    pub fn contains(&self, key: &TopicKey) -> bool {
        self.topic(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Curriculum {
        Curriculum::new(vec![
            Volume::new(
                "vol1",
                1,
                "Sets",
                Priority::Essential,
                vec![Chapter::new(
                    "ch1",
                    "Basics",
                    vec![Topic::new("t1", "Notation", 30), Topic::new("t2", "Operations", 45)],
                )],
            ),
            Volume::new(
                "vol9",
                9,
                "Extras",
                Priority::Complementary,
                vec![Chapter::new("ch1", "Puzzles", vec![Topic::new("t1", "Riddles", 60)])],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn topic_key_format() {
        assert_eq!(TopicKey::new("vol1", "ch2", "t3").as_str(), "vol1_ch2_t3");
    }

    #[test]
    fn topics_are_in_tree_order() {
        let curriculum = sample();
        let keys: Vec<_> = curriculum.topics().iter().map(|t| t.key().to_string()).collect();
        assert_eq!(keys, vec!["vol1_ch1_t1", "vol1_ch1_t2", "vol9_ch1_t1"]);
        assert_eq!(curriculum.topic_count(), 3);
    }

    #[test]
    fn complementary_volumes_filtered_out_by_default() {
        let curriculum = sample();
        assert_eq!(curriculum.included_topics(false).len(), 2);
        let all = curriculum.included_topics(true);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].position, 2);
    }

    #[test]
    fn duplicate_keys_rejected() {
        let result = Curriculum::new(vec![Volume::new(
            "vol1",
            1,
            "Sets",
            Priority::Essential,
            vec![Chapter::new(
                "ch1",
                "Basics",
                vec![Topic::new("t1", "A", 30), Topic::new("t1", "B", 30)],
            )],
        )]);
        assert!(matches!(result, Err(CurriculumError::DuplicateTopic(k)) if k == "vol1_ch1_t1"));
    }

    #[test]
    fn toml_defaults_duration() {
        let curriculum = Curriculum::from_toml_str(
            r#"
            [[volumes]]
            id = "vol1"
            number = 1
            title = "Logarithms"
            priority = "important"

            [[volumes.chapters]]
            id = "ch1"
            name = "Powers"
            topics = [{ id = "t1", name = "Roots" }, { id = "t2", name = "Exponentials", duration_minutes = 90 }]
            "#,
        )
        .unwrap();
        let topics = curriculum.topics();
        assert_eq!(topics[0].topic.duration_minutes, DEFAULT_TOPIC_MINUTES);
        assert_eq!(topics[1].topic.duration_minutes, 90);
        assert_eq!(topics[0].volume.priority, Priority::Important);
    }

    #[test]
    fn json_accepts_camel_case_duration() {
        let curriculum = Curriculum::from_json_str(
            r#"{"volumes":[{"id":"vol2","number":2,"title":"Logs","priority":"essential",
                "chapters":[{"id":"ch1","name":"Intro","topics":[{"id":"t1","name":"Def","durationMinutes":20}]}]}]}"#,
        )
        .unwrap();
        assert_eq!(curriculum.topics()[0].topic.duration_minutes, 20);
    }

    #[test]
    fn json_with_duplicates_fails_to_deserialize() {
        let result = Curriculum::from_json_str(
            r#"{"volumes":[{"id":"v","number":1,"title":"T","priority":"essential",
                "chapters":[{"id":"c","name":"C","topics":[{"id":"t","name":"A"},{"id":"t","name":"B"}]}]}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn lookup_by_key() {
        let curriculum = sample();
        let found = curriculum.topic(&TopicKey::from("vol1_ch1_t2")).unwrap();
        assert_eq!(found.topic.name, "Operations");
        assert_eq!(found.position, 1);
        assert!(!curriculum.contains(&TopicKey::from("vol1_ch1_t9")));
        assert_eq!(found.volume.label(), "Vol 1");
    }
}
