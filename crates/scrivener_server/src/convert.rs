//! Conversion between Scrivener requests and server wire types.

use crate::{GenerateBody, GenerateOptions};
use scrivener_core::GenerationRequest;

/// Builds the body of a generate call.
///
/// The request's model wins over `default_model`; a continuation is folded
/// into the prompt.
pub fn to_generate_body(req: &GenerationRequest, default_model: &str, stream: bool) -> GenerateBody {
    GenerateBody {
        model: req
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model.to_string()),
        prompt: req.effective_prompt(),
        system: req.system_prompt.clone(),
        stream,
        options: GenerateOptions {
            temperature: req.temperature,
            top_p: req.top_p,
            num_predict: -1,
        },
    }
}

/// Pulls a readable message out of an error response body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_core::GenerationRequestBuilder;
    use serde_json::json;

    #[test]
    fn body_matches_wire_format() {
        let req = GenerationRequestBuilder::default()
            .prompt("Next chapter.")
            .system_prompt("You are a novelist.")
            .continuation("It was dark.")
            .temperature(0.5_f32)
            .build()
            .unwrap();
        let body = serde_json::to_value(to_generate_body(&req, "qwen3:8b", true)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "qwen3:8b",
                "prompt": "Continue this story:\n\nIt was dark.\n\nNext chapter.",
                "system": "You are a novelist.",
                "stream": true,
                "options": {"temperature": 0.5, "top_p": 0.9f32, "num_predict": -1}
            })
        );
    }

    #[test]
    fn request_model_overrides_default() {
        let req = GenerationRequestBuilder::default()
            .prompt("p")
            .model("llama3:70b")
            .build()
            .unwrap();
        assert_eq!(to_generate_body(&req, "qwen3:8b", false).model, "llama3:70b");
    }

    #[test]
    fn error_message_prefers_json_field() {
        assert_eq!(error_message(r#"{"error":"model 'x' not found"}"#), "model 'x' not found");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
