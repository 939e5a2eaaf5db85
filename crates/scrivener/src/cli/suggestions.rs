//! `scrivener suggestions`: story ideas for an empty page.

use scrivener_workflow::prompts::PROMPT_SUGGESTIONS;
use serde_json::json;

/// Print the built-in story ideas, numbered or as JSON.
pub fn print_suggestions(json: bool) -> anyhow::Result<()> {
    println!("{}", render(json)?);
    Ok(())
}

fn render(json: bool) -> serde_json::Result<String> {
    if json {
        return serde_json::to_string(&json!({ "suggestions": PROMPT_SUGGESTIONS }));
    }
    Ok(PROMPT_SUGGESTIONS
        .iter()
        .enumerate()
        .map(|(i, idea)| format!("{:>2}. {}", i + 1, idea))
        .collect::<Vec<_>>()
        .join("\n"))
}
