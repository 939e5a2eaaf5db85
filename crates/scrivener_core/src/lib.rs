//! Core data types for the Scrivener story workflow library.
//!
//! This crate provides the workflow aggregate, the generation request and
//! response types, the reasoning-span parser and the streaming update
//! protocol shared by every other Scrivener crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod protocol;
mod reasoning;
mod request;
mod sampling;
mod story;
mod workflow;

pub use protocol::{
    BulkEvent, ChapterOutcome, ChapterStreamEvent, CompleteEvent, ErrorEvent, ProgressEvent,
    ProgressStatus, ndjson_line, sse_frame,
};
pub use reasoning::{
    CLOSE_TAG, OPEN_TAG, Segment, SegmentKind, parse_segments, visible_text, visible_word_count,
    word_count,
};
pub use request::{GenerationOutput, GenerationRequest, GenerationRequestBuilder, Fragment};
pub use sampling::{SamplingConfig, SamplingOverride, StageOptions};
pub use story::{
    Chapter, ChapterPlan, Character, CharacterRole, Outline, StorySettings, TargetLength,
    ValidationReport,
};
pub use workflow::{Workflow, WorkflowId, WorkflowStep, WorkflowSummary};
