//! Streaming update events and their wire framing.
//!
//! Events serialize to the JSON shapes browser clients consume. The framing
//! helpers turn any event into a server-sent-events frame or an NDJSON line
//! so an HTTP layer can forward them untouched.

use crate::{Chapter, ChapterPlan, Fragment, Workflow};
use scrivener_error::JsonError;
use serde::{Deserialize, Serialize};

/// Per-chapter status within a bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgressStatus {
    /// A draft is being written
    Generating,
    /// The draft is being scored
    Validating,
    /// The draft scored too low and is being rewritten
    Regenerating,
    /// The chapter was committed
    Completed,
    /// The chapter was committed below the threshold after the last attempt
    CompletedWithWarning,
}

/// Progress of one chapter in a bulk run.
///
/// `current` and `total` count chapters within the run, not the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct ProgressEvent {
    /// Status
    #[setters(skip)]
    pub status: ProgressStatus,
    /// Chapter number
    #[setters(skip)]
    pub chapter_number: u32,
    /// Chapter title
    #[setters(skip)]
    pub chapter_title: String,
    /// 1-based position in this run
    #[setters(skip)]
    pub current: usize,
    /// Chapters in this run
    #[setters(skip)]
    pub total: usize,
    /// Attempt being made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    /// Attempts used by the committed chapter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    /// Latest score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_score: Option<f32>,
    /// Threshold in force
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_threshold: Option<f32>,
    /// Visible words of the committed chapter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    /// Seconds spent on the chapter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_time: Option<f64>,
    /// Seconds expected for the rest of the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<f64>,
    /// The committed chapter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<Chapter>,
}

impl ProgressEvent {
    /// An event with only the required fields set.
    pub fn new(status: ProgressStatus, plan: &ChapterPlan, current: usize, total: usize) -> Self {
        Self {
            status,
            chapter_number: plan.chapter_number,
            chapter_title: plan.title.clone(),
            current,
            total,
            attempt: None,
            attempts: None,
            validation_score: None,
            validation_threshold: None,
            word_count: None,
            chapter_time: None,
            estimated_time_remaining: None,
            chapter: None,
        }
    }
}

/// End of a successful bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteEvent {
    /// Seconds for the whole run
    pub total_time: f64,
    /// Mean seconds per chapter, 0 when nothing was generated
    pub avg_time_per_chapter: f64,
    /// Final workflow state
    pub workflow: Workflow,
}

/// End of a failed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Chapter being generated when the run failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<u32>,
    /// Human-readable message
    pub message: String,
}

/// Events of a bulk chapter run, tagged by `type`.
///
/// # Examples
///
/// ```
/// use scrivener_core::{BulkEvent, ErrorEvent};
///
/// let event = BulkEvent::Error(ErrorEvent { chapter_number: Some(2), message: "refused".into() });
/// let json = serde_json::to_value(&event).unwrap();
/// assert_eq!(json["type"], "error");
/// assert_eq!(json["chapter_number"], 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BulkEvent {
    /// Chapter progress
    Progress(ProgressEvent),
    /// Run finished
    Complete(CompleteEvent),
    /// Run aborted
    Error(ErrorEvent),
}

/// Terminal events of a single-chapter stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChapterOutcome {
    /// The chapter was committed
    ChapterComplete {
        /// Committed chapter
        chapter: Chapter,
        /// Workflow after the commit
        workflow: Workflow,
    },
    /// Generation failed
    Error {
        /// Human-readable message
        message: String,
    },
}

/// Events of a single-chapter stream: fragments, then one outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
#[serde(untagged)]
pub enum ChapterStreamEvent {
    /// Streamed text
    Fragment(Fragment),
    /// Completion or failure
    Outcome(ChapterOutcome),
}

/// Frames an event for a `text/event-stream` response.
///
/// # Examples
///
/// ```
/// use scrivener_core::{sse_frame, Fragment};
///
/// let frame = sse_frame(&Fragment::partial("Hi")).unwrap();
/// assert_eq!(frame, "data: {\"content\":\"Hi\",\"isComplete\":false}\n\n");
/// ```
pub fn sse_frame<T: Serialize>(event: &T) -> Result<String, JsonError> {
    Ok(format!("data: {}\n\n", serde_json::to_string(event)?))
}

/// Frames an event as one line of newline-delimited JSON.
pub fn ndjson_line<T: Serialize>(event: &T) -> Result<String, JsonError> {
    Ok(format!("{}\n", serde_json::to_string(event)?))
}
