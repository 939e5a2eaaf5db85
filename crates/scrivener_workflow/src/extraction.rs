//! Utilities for pulling structured data out of model replies.
//!
//! Models wrap JSON in markdown fences, surround it with chatter, or think
//! out loud before answering. Reasoning spans are stripped first, then the
//! first JSON object is located.

use scrivener_core::visible_text;
use scrivener_error::{WorkflowError, WorkflowErrorKind};
use serde::de::DeserializeOwned;

/// Extract the first JSON object from a reply.
///
/// Tries a fenced code block first, then the first balanced `{ ... }`.
///
/// # Errors
///
/// Returns `GenerationParse` if no object is found.
///
/// # Examples
///
/// ```
/// use scrivener_workflow::extract_json;
///
/// let reply = "Here you go:\n```json\n{\"title\": \"Tides\"}\n```\nEnjoy!";
/// assert_eq!(extract_json(reply).unwrap(), "{\"title\": \"Tides\"}");
/// ```
pub fn extract_json(reply: &str) -> Result<String, WorkflowError> {
    if let Some(fenced) = fenced_block(reply)
        && let Some(object) = balanced_object(&fenced)
    {
        return Ok(object);
    }
    if let Some(object) = balanced_object(reply) {
        return Ok(object);
    }

    tracing::error!(reply_length = reply.len(), "No JSON object found in model reply");
    Err(WorkflowError::new(WorkflowErrorKind::GenerationParse(format!(
        "no JSON object found in reply ({} chars)",
        reply.len()
    ))))
}

/// Content of the first markdown code fence, tolerating a missing closing fence.
fn fenced_block(reply: &str) -> Option<String> {
    let start = reply.find("```")? + 3;
    let body_start = reply[start..]
        .find('\n')
        .map(|n| start + n + 1)
        .unwrap_or(start);
    let body = match reply[body_start..].find("```") {
        Some(end) => &reply[body_start..body_start + end],
        None => &reply[body_start..],
    };
    Some(body.trim().to_string())
}

/// The first `{ ... }` span with balanced braces outside string literals.
fn balanced_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse JSON into `T`.
///
/// # Errors
///
/// Returns `GenerationParse` describing the serde failure.
pub fn parse_json<T: DeserializeOwned>(json: &str) -> Result<T, WorkflowError> {
    serde_json::from_str(json).map_err(|e| {
        let preview = json.chars().take(100).collect::<String>();
        tracing::error!(error = %e, json_preview = %preview, "JSON parsing failed");
        WorkflowError::new(WorkflowErrorKind::GenerationParse(format!(
            "{} (JSON: {}...)",
            e, preview
        )))
    })
}

/// Strip reasoning, extract and parse the JSON object of a model reply.
pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T, WorkflowError> {
    let visible = visible_text(reply);
    parse_json(&extract_json(&visible)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Title {
        title: String,
    }

    #[test]
    fn finds_object_amid_chatter() {
        let json = extract_json(r#"Sure! {"a": {"b": "}"}} and more {"c": 1}"#).unwrap();
        assert_eq!(json, r#"{"a": {"b": "}"}}"#);
    }

    #[test]
    fn unterminated_fence_is_tolerated() {
        let json = extract_json("```json\n{\"title\": \"Salt\"}\n").unwrap();
        assert_eq!(json, "{\"title\": \"Salt\"}");
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let json = extract_json(r#"{"text": "She said \"{hello\""}"#).unwrap();
        assert!(json.ends_with("\"}"));
    }

    #[test]
    fn plain_text_is_a_parse_error() {
        let err = extract_json("No structure here.").unwrap_err();
        assert!(matches!(err.kind, WorkflowErrorKind::GenerationParse(_)));
    }

    #[test]
    fn reasoning_braces_are_ignored() {
        let reply = "<think>maybe {\"title\": \"Wrong\"}?</think>{\"title\": \"Right\"}";
        let parsed: Title = parse_reply(reply).unwrap();
        assert_eq!(parsed.title, "Right");
    }

    #[test]
    fn wrong_shape_is_a_parse_error() {
        let err = parse_reply::<Title>("{\"name\": 3}").unwrap_err();
        assert!(matches!(err.kind, WorkflowErrorKind::GenerationParse(_)));
    }
}
