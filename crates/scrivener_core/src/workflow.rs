//! The workflow aggregate and its step machine.

use crate::{Chapter, ChapterPlan, Character, Outline, SamplingConfig, StorySettings};
use chrono::{DateTime, Utc};
use scrivener_error::{WorkflowError, WorkflowErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use uuid::Uuid;

/// Opaque workflow identifier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct WorkflowId(Uuid);

impl WorkflowId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for WorkflowId {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| WorkflowError::new(WorkflowErrorKind::NotFound(s.to_string())))
    }
}

/// Stage a workflow has reached. Ordering follows the workflow.
///
/// # Examples
///
/// ```
/// use scrivener_core::WorkflowStep;
///
/// assert!(WorkflowStep::Outline > WorkflowStep::CharactersSettings);
/// assert_eq!(WorkflowStep::ChapterGeneration.to_string(), "chapter_generation");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowStep {
    /// Created from a prompt
    #[default]
    Prompt,
    /// Characters and settings exist
    CharactersSettings,
    /// Outline exists
    Outline,
    /// At least one chapter exists
    ChapterGeneration,
    /// Every planned chapter exists
    Completed,
}

/// A story being written.
///
/// Fields are read through getters; changes go through the mutators below,
/// each of which checks its preconditions before touching any state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Workflow {
    /// Identifier
    id: WorkflowId,
    /// Step reached so far
    current_step: WorkflowStep,
    /// Original request
    prompt: String,
    /// Sampling recorded at creation
    sampling_config: SamplingConfig,
    /// Cast of the story
    characters: Vec<Character>,
    /// World and style
    settings: Option<StorySettings>,
    /// Chapter plan
    outline: Option<Outline>,
    /// Committed chapters by number
    chapters: BTreeMap<u32, Chapter>,
    /// Number of committed chapters
    chapters_completed: usize,
    /// Number of chapters in the outline
    total_chapters_planned: usize,
    /// Creation time
    created_at: DateTime<Utc>,
    /// Time of the last change
    updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Creates a workflow at the `prompt` step.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the prompt is blank or sampling is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use scrivener_core::{SamplingConfig, Workflow, WorkflowStep};
    ///
    /// let workflow = Workflow::new("A lighthouse keeper finds a map", SamplingConfig::default()).unwrap();
    /// assert_eq!(*workflow.current_step(), WorkflowStep::Prompt);
    /// assert!(Workflow::new("  ", SamplingConfig::default()).is_err());
    /// ```
    #[track_caller]
    pub fn new(prompt: impl Into<String>, sampling_config: SamplingConfig) -> Result<Self, WorkflowError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(WorkflowError::invalid_input("prompt must not be empty"));
        }
        sampling_config.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: WorkflowId::new(),
            current_step: WorkflowStep::Prompt,
            prompt,
            sampling_config,
            characters: Vec::new(),
            settings: None,
            outline: None,
            chapters: BTreeMap::new(),
            chapters_completed: 0,
            total_chapters_planned: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Fails unless the workflow has reached `required`.
    #[track_caller]
    pub fn require_step(&self, operation: &str, required: WorkflowStep) -> Result<(), WorkflowError> {
        if self.current_step < required {
            return Err(WorkflowError::new(WorkflowErrorKind::StepPrecondition {
                operation: operation.to_string(),
                required: required.to_string(),
                current: self.current_step.to_string(),
            }));
        }
        Ok(())
    }

    /// Stores generated characters and settings, replacing earlier ones.
    #[track_caller]
    pub fn set_characters_settings(
        &mut self,
        characters: Vec<Character>,
        settings: StorySettings,
    ) -> Result<(), WorkflowError> {
        if characters.is_empty() {
            return Err(WorkflowError::invalid_input("at least one character is required"));
        }
        self.characters = characters;
        self.settings = Some(settings);
        self.advance_to(WorkflowStep::CharactersSettings);
        Ok(())
    }

    /// Applies reviewer edits to characters and/or settings.
    #[track_caller]
    pub fn edit_characters_settings(
        &mut self,
        characters: Option<Vec<Character>>,
        settings: Option<StorySettings>,
    ) -> Result<(), WorkflowError> {
        self.require_step("edit characters and settings", WorkflowStep::CharactersSettings)?;
        if characters.as_ref().is_some_and(Vec::is_empty) {
            return Err(WorkflowError::invalid_input("at least one character is required"));
        }
        if let Some(characters) = characters {
            self.characters = characters;
        }
        if let Some(settings) = settings {
            self.settings = Some(settings);
        }
        self.touch();
        Ok(())
    }

    /// Checks everything an outline needs before any model call is made.
    #[track_caller]
    pub fn check_outline_ready(&self) -> Result<(), WorkflowError> {
        self.require_step("generate outline", WorkflowStep::CharactersSettings)?;
        if self.characters.is_empty() {
            return Err(WorkflowError::invalid_input(
                "at least one character is required before outlining",
            ));
        }
        let missing = self
            .settings
            .as_ref()
            .map(StorySettings::missing_fields)
            .unwrap_or_else(|| vec!["genre", "tone", "setting"]);
        if !missing.is_empty() {
            return Err(WorkflowError::invalid_input(format!(
                "settings are missing: {}",
                missing.join(", ")
            )));
        }
        if !self.chapters.is_empty() {
            return Err(WorkflowError::invalid_input(
                "outline cannot be replaced once chapters exist",
            ));
        }
        Ok(())
    }

    /// Validates and stores an outline, replacing any previous one.
    ///
    /// Chapters are sorted by number and must then read `1..=N`.
    #[track_caller]
    pub fn set_outline(&mut self, mut outline: Outline) -> Result<(), WorkflowError> {
        self.check_outline_ready()?;
        outline.chapters.sort_by_key(|plan| plan.chapter_number);
        validate_numbering(&outline.chapters)?;
        self.total_chapters_planned = outline.chapters.len();
        self.outline = Some(outline);
        self.advance_to(WorkflowStep::Outline);
        Ok(())
    }

    /// The plan for a chapter, requiring an outline.
    #[track_caller]
    pub fn chapter_plan(&self, chapter_number: u32) -> Result<&ChapterPlan, WorkflowError> {
        self.require_step("generate chapters", WorkflowStep::Outline)?;
        self.outline
            .as_ref()
            .and_then(|outline| outline.chapter(chapter_number))
            .ok_or_else(|| WorkflowError::new(WorkflowErrorKind::ChapterNotFound(chapter_number)))
    }

    /// Commits a chapter, replacing one with the same number.
    #[track_caller]
    pub fn put_chapter(&mut self, chapter: Chapter) -> Result<(), WorkflowError> {
        self.chapter_plan(chapter.chapter_number)?;
        if chapter.attempts == 0 {
            return Err(WorkflowError::invalid_input("a chapter needs at least one attempt"));
        }
        self.chapters.insert(chapter.chapter_number, chapter);
        self.chapters_completed = self.chapters.len();
        self.advance_to(WorkflowStep::ChapterGeneration);
        if self.all_chapters_written() {
            self.advance_to(WorkflowStep::Completed);
        }
        Ok(())
    }

    /// Records a validation result on a committed chapter.
    #[track_caller]
    pub fn set_validation(
        &mut self,
        chapter_number: u32,
        score: f32,
        feedback: Option<String>,
    ) -> Result<(), WorkflowError> {
        let chapter = self
            .chapters
            .get_mut(&chapter_number)
            .ok_or_else(|| WorkflowError::new(WorkflowErrorKind::ChapterNotFound(chapter_number)))?;
        chapter.validation_score = Some(score);
        chapter.validation_feedback = feedback;
        self.touch();
        Ok(())
    }

    /// Moves to `completed` once every planned chapter is committed.
    #[track_caller]
    pub fn mark_completed(&mut self) -> Result<(), WorkflowError> {
        self.require_step("complete the story", WorkflowStep::Outline)?;
        if !self.all_chapters_written() {
            return Err(WorkflowError::new(WorkflowErrorKind::StepPrecondition {
                operation: "complete the story".to_string(),
                required: format!("{} chapters", self.total_chapters_planned),
                current: format!("{} chapters", self.chapters_completed),
            }));
        }
        self.advance_to(WorkflowStep::Completed);
        Ok(())
    }

    /// Planned chapters that have no committed entry, ascending.
    pub fn pending_chapters(&self) -> Vec<ChapterPlan> {
        self.outline
            .iter()
            .flat_map(|outline| outline.chapters.iter())
            .filter(|plan| !self.chapters.contains_key(&plan.chapter_number))
            .cloned()
            .collect()
    }

    /// The committed chapter immediately before `chapter_number`.
    pub fn previous_chapter(&self, chapter_number: u32) -> Option<&Chapter> {
        chapter_number
            .checked_sub(1)
            .and_then(|previous| self.chapters.get(&previous))
    }

    /// Whether every planned chapter has been committed.
    pub fn all_chapters_written(&self) -> bool {
        self.total_chapters_planned > 0 && self.chapters_completed == self.total_chapters_planned
    }

    /// Outline title, or the prompt cut to 60 characters.
    pub fn title(&self) -> String {
        match &self.outline {
            Some(outline) if !outline.title.trim().is_empty() => outline.title.clone(),
            _ => self.prompt.chars().take(60).collect(),
        }
    }

    /// List view of this workflow.
    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            id: self.id,
            title: self.title(),
            current_step: self.current_step,
            chapters_completed: self.chapters_completed,
            total_chapters_planned: self.total_chapters_planned,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn advance_to(&mut self, step: WorkflowStep) {
        self.current_step = self.current_step.max(step);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[track_caller]
fn validate_numbering(chapters: &[ChapterPlan]) -> Result<(), WorkflowError> {
    if chapters.is_empty() {
        return Err(WorkflowError::new(WorkflowErrorKind::InvalidOutline(
            "outline has no chapters".to_string(),
        )));
    }
    let mut seen = BTreeSet::new();
    for plan in chapters {
        if !seen.insert(plan.chapter_number) {
            return Err(WorkflowError::new(WorkflowErrorKind::InvalidOutline(format!(
                "chapter {} appears more than once",
                plan.chapter_number
            ))));
        }
    }
    for (position, plan) in chapters.iter().enumerate() {
        let expected = position as u32 + 1;
        if plan.chapter_number != expected {
            return Err(WorkflowError::new(WorkflowErrorKind::InvalidOutline(format!(
                "expected chapter {expected}, found {}",
                plan.chapter_number
            ))));
        }
    }
    Ok(())
}

/// Condensed workflow for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    /// Identifier
    pub id: WorkflowId,
    /// Outline title or truncated prompt
    pub title: String,
    /// Step reached
    pub current_step: WorkflowStep,
    /// Committed chapters
    pub chapters_completed: usize,
    /// Planned chapters
    pub total_chapters_planned: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of the last change
    pub updated_at: DateTime<Utc>,
}
