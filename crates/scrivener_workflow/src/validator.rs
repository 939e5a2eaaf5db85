//! Model-backed chapter scoring.

use crate::prompts;
use regex::Regex;
use scrivener_core::{ChapterPlan, GenerationRequest, StorySettings, ValidationReport, visible_text};
use scrivener_error::{ValidationError, ValidationErrorKind};
use scrivener_interface::{ChapterValidator, ModelDriver};
use std::sync::{Arc, LazyLock};
use tracing::instrument;

static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*#>_-]*score[\s*_]*:[\s*_]*(-?\d+(?:\.\d+)?)\s*(?:/\s*(10|100)\b)?")
        .unwrap_or_else(|e| unreachable!("score pattern is valid: {e}"))
});

static FEEDBACK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[\s*#>_-]*feedback[\s*_]*:[\s*_]*")
        .unwrap_or_else(|e| unreachable!("feedback pattern is valid: {e}"))
});

/// Scores chapters by asking a model to act as editor.
///
/// Empty chapters score 0 without a model call.
#[derive(Debug, Clone)]
pub struct ModelValidator<G: ModelDriver> {
    driver: Arc<G>,
    temperature: f32,
    model: Option<String>,
}

impl<G: ModelDriver> ModelValidator<G> {
    /// A validator with the default temperature.
    pub fn new(driver: Arc<G>) -> Self {
        Self {
            driver,
            temperature: 0.3,
            model: None,
        }
    }

    /// Sets the scoring temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Scores with a different model than the driver's default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn request(&self, prompt: String) -> GenerationRequest {
        GenerationRequest {
            prompt,
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: 0.9,
            system_prompt: Some(prompts::VALIDATION_SYSTEM.to_string()),
            continuation: None,
        }
    }
}

#[async_trait::async_trait]
impl<G: ModelDriver + 'static> ChapterValidator for ModelValidator<G> {
    #[instrument(skip(self, content, plan, settings), fields(chapter_number = plan.chapter_number))]
    async fn validate(
        &self,
        content: &str,
        plan: &ChapterPlan,
        settings: &StorySettings,
    ) -> Result<ValidationReport, ValidationError> {
        let visible = visible_text(content);
        if visible.is_empty() {
            tracing::debug!("Chapter has no visible prose, scoring 0");
            return Ok(ValidationReport::new(
                0.0,
                Some("The chapter contains no story text.".to_string()),
            ));
        }

        let request = self.request(prompts::validation(&visible, plan, settings));
        let output = self.driver.generate(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "Scoring model unavailable");
            ValidationError::new(ValidationErrorKind::Upstream(e.kind.to_string()))
        })?;

        let report = parse_score_response(&output.text)?;
        tracing::debug!(score = report.score, "Chapter scored");
        Ok(report)
    }
}

/// Reads a `SCORE:` line and optional `FEEDBACK:` block from a scorer reply.
///
/// Scores written out of 10 or 100 are rescaled, and the result is clamped
/// to [0, 1]. Without a `FEEDBACK:` marker, the text after the score line
/// is taken as feedback.
///
/// # Errors
///
/// `Unparseable` if no score line is present.
///
/// # Examples
///
/// ```
/// use scrivener_workflow::parse_score_response;
///
/// let report = parse_score_response("**SCORE:** 8/10\nFEEDBACK: Tight pacing.").unwrap();
/// assert_eq!(report.score, 0.8);
/// assert_eq!(report.feedback.as_deref(), Some("Tight pacing."));
/// ```
#[track_caller]
pub fn parse_score_response(reply: &str) -> Result<ValidationReport, ValidationError> {
    let reply = visible_text(reply);
    let captures = SCORE_LINE.captures(&reply).ok_or_else(|| {
        let preview: String = reply.chars().take(80).collect();
        ValidationError::new(ValidationErrorKind::Unparseable(preview))
    })?;

    let raw: f32 = captures[1].parse().map_err(|_| {
        ValidationError::new(ValidationErrorKind::Unparseable(captures[1].to_string()))
    })?;
    let score = match captures.get(2).map(|m| m.as_str()) {
        Some("10") => raw / 10.0,
        Some("100") => raw / 100.0,
        _ if raw > 1.0 && raw <= 10.0 => raw / 10.0,
        _ if raw > 10.0 && raw <= 100.0 => raw / 100.0,
        _ => raw,
    };

    let feedback = match FEEDBACK_LINE.find(&reply) {
        Some(marker) => reply[marker.end()..].trim().to_string(),
        None => {
            let score_end = captures.get(0).map_or(0, |m| m.end());
            reply[score_end..].trim().to_string()
        }
    };

    Ok(ValidationReport::new(
        score,
        (!feedback.is_empty()).then_some(feedback),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_decimal_score() {
        let report = parse_score_response("SCORE: 0.85\nFEEDBACK: Good.\nMore detail.").unwrap();
        assert_eq!(report.score, 0.85);
        assert_eq!(report.feedback.as_deref(), Some("Good.\nMore detail."));
    }

    #[test]
    fn out_of_hundred_is_rescaled() {
        assert_eq!(parse_score_response("Score: 72/100").unwrap().score, 0.72);
        assert_eq!(parse_score_response("score: 65").unwrap().score, 0.65);
    }

    #[test]
    fn bare_ten_point_scale_is_rescaled() {
        assert_eq!(parse_score_response("## SCORE: 7").unwrap().score, 0.7);
    }

    #[test]
    fn huge_scores_are_clamped() {
        assert_eq!(parse_score_response("SCORE: 250").unwrap().score, 1.0);
    }

    #[test]
    fn reasoning_is_ignored() {
        let report =
            parse_score_response("<think>SCORE: 0.1 would be harsh</think>SCORE: 0.6").unwrap();
        assert_eq!(report.score, 0.6);
        assert_eq!(report.feedback, None);
    }

    #[test]
    fn missing_score_is_unparseable() {
        let err = parse_score_response("I liked it a lot.").unwrap_err();
        assert!(matches!(err.kind, ValidationErrorKind::Unparseable(_)));
    }
}
