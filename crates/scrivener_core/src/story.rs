//! Story content: characters, settings, outline and chapters.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Narrative function of a character.
///
/// Labels produced by a model are normalised leniently when deserialized;
/// anything unrecognised becomes [`CharacterRole::Supporting`].
///
/// # Examples
///
/// ```
/// use scrivener_core::CharacterRole;
///
/// assert_eq!(CharacterRole::from_model_label("Love Interest"), CharacterRole::LoveInterest);
/// assert_eq!(CharacterRole::from_model_label("main protagonist"), CharacterRole::Protagonist);
/// assert_eq!(CharacterRole::from_model_label("comic relief"), CharacterRole::Supporting);
/// assert_eq!(CharacterRole::Mentor.to_string(), "mentor");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CharacterRole {
    /// Drives the story
    Protagonist,
    /// Opposes the protagonist
    Antagonist,
    /// Everyone else
    #[default]
    Supporting,
    /// Guides the protagonist
    Mentor,
    /// Romantic counterpart
    LoveInterest,
}

impl CharacterRole {
    /// Maps a free-form role label onto a known role.
    pub fn from_model_label(label: &str) -> Self {
        let normalized = label
            .trim()
            .to_lowercase()
            .replace(['-', ' '], "_");
        if let Ok(role) = normalized.parse() {
            return role;
        }
        if normalized.contains("protagonist") || normalized == "hero" {
            Self::Protagonist
        } else if normalized.contains("antagonist") || normalized.contains("villain") {
            Self::Antagonist
        } else if normalized.contains("mentor") {
            Self::Mentor
        } else if normalized.contains("love") || normalized.contains("romantic") {
            Self::LoveInterest
        } else {
            Self::Supporting
        }
    }
}

impl<'de> Deserialize<'de> for CharacterRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_model_label(&label))
    }
}

/// A person in the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Character name
    pub name: String,
    /// Narrative role
    #[serde(default)]
    pub role: CharacterRole,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Backstory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// What the character wants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivations: Option<String>,
    /// Other character name to relationship description
    #[serde(default)]
    pub relationships: BTreeMap<String, String>,
}

impl Character {
    /// Creates a character with no optional details.
    pub fn new(name: impl Into<String>, role: CharacterRole, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            description: description.into(),
            background: None,
            motivations: None,
            relationships: BTreeMap::new(),
        }
    }
}

/// Intended overall length of the story.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TargetLength {
    /// A handful of chapters
    Short,
    /// The usual length
    #[default]
    Medium,
    /// Novel length
    Long,
}

/// World and style of the story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorySettings {
    /// Genre
    #[serde(default)]
    pub genre: String,
    /// Tone
    #[serde(default)]
    pub tone: String,
    /// Time and place
    #[serde(default)]
    pub setting: String,
    /// Themes in first-seen order, without duplicates
    #[serde(default, deserialize_with = "deserialize_themes")]
    pub themes: Vec<String>,
    /// World-building notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_building: Option<String>,
    /// Intended length
    #[serde(default, deserialize_with = "deserialize_target_length")]
    pub target_length: TargetLength,
}

impl StorySettings {
    /// Replaces the themes, dropping repeats.
    pub fn set_themes<I, S>(&mut self, themes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.themes = dedup_themes(themes.into_iter().map(Into::into));
    }

    /// Names of the required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("genre", &self.genre),
            ("tone", &self.tone),
            ("setting", &self.setting),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

fn dedup_themes(themes: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    themes
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

fn deserialize_themes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let themes = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(dedup_themes(themes.into_iter()))
}

fn deserialize_target_length<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<TargetLength, D::Error> {
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label
        .and_then(|l| l.trim().parse().ok())
        .unwrap_or_default())
}

/// One planned chapter of the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterPlan {
    /// 1-based chapter number
    pub chapter_number: u32,
    /// Chapter title
    pub title: String,
    /// What happens
    #[serde(default)]
    pub summary: String,
    /// Beats the chapter must hit
    #[serde(default)]
    pub key_events: Vec<String>,
    /// Names of characters who appear
    #[serde(default)]
    pub characters_involved: Vec<String>,
    /// Role of the chapter in the overall arc
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// Chapter-by-chapter plan of the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Story title
    pub title: String,
    /// One-paragraph premise
    #[serde(default)]
    pub premise: String,
    /// Narrative structure, e.g. three-act
    #[serde(default)]
    pub plot_structure: String,
    /// Planned chapters ordered by number
    pub chapters: Vec<ChapterPlan>,
    /// Estimated length of the finished story
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_word_count: Option<u32>,
}

impl Outline {
    /// The plan for a chapter number.
    pub fn chapter(&self, chapter_number: u32) -> Option<&ChapterPlan> {
        self.chapters
            .iter()
            .find(|plan| plan.chapter_number == chapter_number)
    }
}

/// Generated chapter text and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based chapter number
    pub chapter_number: u32,
    /// Title copied from the plan
    pub title: String,
    /// Raw model output, reasoning spans included
    pub content: String,
    /// Words of visible prose
    pub word_count: usize,
    /// Last validation score in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_score: Option<f32>,
    /// Validator remarks from the last validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_feedback: Option<String>,
    /// Wall-clock seconds spent producing the committed draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time_seconds: Option<f64>,
    /// Generation attempts made, at least 1
    pub attempts: u32,
    /// Scene-by-scene plan written before the prose
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_outline: Option<String>,
    /// Dialogue draft written before the prose
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
}

impl Chapter {
    /// Builds a chapter from raw model output, counting visible words.
    pub fn from_content(plan: &ChapterPlan, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            chapter_number: plan.chapter_number,
            title: plan.title.clone(),
            word_count: crate::visible_word_count(&content),
            content,
            validation_score: None,
            validation_feedback: None,
            generation_time_seconds: None,
            attempts: 1,
            scene_outline: None,
            dialogue: None,
        }
    }

    /// The content with reasoning spans removed.
    pub fn visible_content(&self) -> String {
        crate::visible_text(&self.content)
    }
}

/// Result of scoring a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Quality score in [0, 1]
    pub score: f32,
    /// Optional remarks usable as revision notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl ValidationReport {
    /// A report with the score clamped to [0, 1].
    pub fn new(score: f32, feedback: Option<String>) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self { score, feedback }
    }
}
