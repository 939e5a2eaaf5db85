//! Scripted model backend for workflow tests.

use async_trait::async_trait;
use futures::stream;
use scrivener_core::{Fragment, GenerationOutput, GenerationRequest};
use scrivener_error::{GenerationError, GenerationErrorKind};
use scrivener_interface::{FragmentStream, ModelDriver, Streaming};
use scrivener_workflow::prompts;
use serde_json::json;
use std::sync::{Arc, Mutex};

const CHARACTERS_REPLY: &str = r#"<think>A keeper, a rival, a ghost of a storm.</think>
Here is the cast:
```json
{
  "characters": [
    {"name": "Mara", "role": "Protagonist", "description": "Keeper of the Gull Point light"},
    {"name": "Tobias", "role": "villain", "description": "A salvager who wants the map"}
  ],
  "settings": {
    "genre": "mystery",
    "tone": "brooding",
    "setting": "A storm-lashed island in 1890",
    "themes": ["isolation", "Isolation", "legacy"],
    "target_length": "Short"
  }
}
```"#;

/// Outline JSON with `chapters` entries, listed in reverse order.
pub fn outline_reply(chapters: u32) -> String {
    let plans: Vec<_> = (1..=chapters)
        .rev()
        .map(|n| {
            json!({
                "chapter_number": n,
                "title": format!("Chapter {}", n),
                "summary": format!("Events of chapter {}", n),
                "key_events": ["the map"],
                "characters_involved": ["Mara"]
            })
        })
        .collect();
    json!({
        "title": "The Keeper's Map",
        "premise": "A keeper follows a map into the storm",
        "plot_structure": "three-act",
        "chapters": plans
    })
    .to_string()
}

/// Model backend answering by system prompt.
///
/// Structured stages get canned JSON, chapter prose is streamed in a few
/// fragments, and any stream call can be made to break mid-way.
pub struct ScriptedGenerator {
    characters_reply: String,
    outline_reply: String,
    chapter_fragments: Vec<String>,
    fail_stream_on: Option<usize>,
    generate_calls: Arc<Mutex<usize>>,
    stream_calls: Arc<Mutex<usize>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedGenerator {
    /// A generator whose outline has `chapters` chapters.
    pub fn new(chapters: u32) -> Self {
        Self {
            characters_reply: CHARACTERS_REPLY.to_string(),
            outline_reply: outline_reply(chapters),
            chapter_fragments: vec![
                "<think>Plan the scene.</think>".to_string(),
                "The lamp ".to_string(),
                "guttered as ".to_string(),
                "Mara climbed.".to_string(),
            ],
            fail_stream_on: None,
            generate_calls: Arc::new(Mutex::new(0)),
            stream_calls: Arc::new(Mutex::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the characters-and-settings reply.
    pub fn with_characters_reply(mut self, reply: impl Into<String>) -> Self {
        self.characters_reply = reply.into();
        self
    }

    /// Replace the outline reply.
    pub fn with_outline_reply(mut self, reply: impl Into<String>) -> Self {
        self.outline_reply = reply.into();
        self
    }

    /// Break the `n`th stream call (1-based) after its first fragment.
    pub fn failing_stream_on(mut self, n: usize) -> Self {
        self.fail_stream_on = Some(n);
        self
    }

    /// Number of non-streaming calls.
    pub fn generate_calls(&self) -> usize {
        *self.generate_calls.lock().unwrap()
    }

    /// Number of streaming calls.
    pub fn stream_calls(&self) -> usize {
        *self.stream_calls.lock().unwrap()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests sent with the given system prompt.
    pub fn requests_for(&self, system: &str) -> Vec<GenerationRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.system_prompt.as_deref() == Some(system))
            .collect()
    }

    /// The visible prose of every scripted chapter.
    pub fn chapter_text(&self) -> String {
        scrivener_core::visible_text(&self.chapter_fragments.concat())
    }

    fn record(&self, req: &GenerationRequest) {
        self.requests.lock().unwrap().push(req.clone());
    }
}

#[async_trait]
impl ModelDriver for ScriptedGenerator {
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationOutput, GenerationError> {
        tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
        *self.generate_calls.lock().unwrap() += 1;
        self.record(req);

        let text = match req.system_prompt.as_deref() {
            Some(prompts::CHARACTERS_SETTINGS_SYSTEM) => self.characters_reply.clone(),
            Some(prompts::OUTLINE_SYSTEM) => self.outline_reply.clone(),
            Some(prompts::SCENE_OUTLINE_SYSTEM) => {
                "Scene 1: Mara finds the map.\nScene 2: The storm breaks.".to_string()
            }
            Some(prompts::DIALOGUE_SYSTEM) => "MARA: Who drew this?".to_string(),
            other => {
                return Err(GenerationError::new(GenerationErrorKind::Api {
                    status: 400,
                    message: format!("unscripted system prompt: {:?}", other),
                }));
            }
        };
        Ok(GenerationOutput {
            text,
            model_used: "scripted".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[async_trait]
impl Streaming for ScriptedGenerator {
    async fn generate_stream(&self, req: &GenerationRequest) -> Result<FragmentStream, GenerationError> {
        let call = {
            let mut count = self.stream_calls.lock().unwrap();
            *count += 1;
            *count
        };
        self.record(req);

        let mut items: Vec<Result<Fragment, GenerationError>> = self
            .chapter_fragments
            .iter()
            .map(|text| Ok(Fragment::partial(text.clone())))
            .collect();

        if self.fail_stream_on == Some(call) {
            items.truncate(1);
            items.push(Err(GenerationError::new(GenerationErrorKind::Stream(
                "connection reset by peer".to_string(),
            ))));
        } else {
            items.push(Ok(Fragment::last("")));
        }

        Ok(Box::pin(stream::iter(items)))
    }
}
