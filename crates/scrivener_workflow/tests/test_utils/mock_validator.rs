//! Mock chapter validators.

use async_trait::async_trait;
use scrivener_core::{ChapterPlan, StorySettings, ValidationReport};
use scrivener_error::{ValidationError, ValidationErrorKind};
use scrivener_interface::ChapterValidator;
use std::sync::{Arc, Mutex};

/// Always returns the same score and feedback.
pub struct FixedValidator {
    score: f32,
    feedback: Option<String>,
    call_count: Arc<Mutex<usize>>,
}

impl FixedValidator {
    /// A validator scoring every chapter `score`.
    pub fn new(score: f32) -> Self {
        Self {
            score,
            feedback: Some("Raise the stakes.".to_string()),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of validate calls.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl ChapterValidator for FixedValidator {
    async fn validate(
        &self,
        _content: &str,
        _plan: &ChapterPlan,
        _settings: &StorySettings,
    ) -> Result<ValidationReport, ValidationError> {
        *self.call_count.lock().unwrap() += 1;
        Ok(ValidationReport::new(self.score, self.feedback.clone()))
    }
}

/// Returns scores in order, repeating the last one.
pub struct SequenceValidator {
    scores: Vec<f32>,
    call_count: Arc<Mutex<usize>>,
}

impl SequenceValidator {
    /// A validator returning `scores` one call at a time.
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of validate calls.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl ChapterValidator for SequenceValidator {
    async fn validate(
        &self,
        _content: &str,
        _plan: &ChapterPlan,
        _settings: &StorySettings,
    ) -> Result<ValidationReport, ValidationError> {
        let mut count = self.call_count.lock().unwrap();
        let index = (*count).min(self.scores.len().saturating_sub(1));
        *count += 1;
        let score = self.scores.get(index).copied().unwrap_or(0.0);
        Ok(ValidationReport::new(score, Some(format!("Attempt {} notes", *count))))
    }
}

/// Always fails as if the scorer were offline.
#[derive(Default)]
pub struct FailingValidator {
    call_count: Arc<Mutex<usize>>,
}

impl FailingValidator {
    /// Number of validate calls.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl ChapterValidator for FailingValidator {
    async fn validate(
        &self,
        _content: &str,
        _plan: &ChapterPlan,
        _settings: &StorySettings,
    ) -> Result<ValidationReport, ValidationError> {
        *self.call_count.lock().unwrap() += 1;
        Err(ValidationError::new(ValidationErrorKind::Upstream(
            "scorer offline".to_string(),
        )))
    }
}
