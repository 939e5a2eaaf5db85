//! Markdown export of a finished workflow.

use scrivener_core::Workflow;
use std::fmt::Write as _;
use std::path::Path;
use tracing::instrument;

/// Render a workflow as a Markdown manuscript.
///
/// Reasoning spans are stripped from chapter prose. Chapters appear in
/// chapter order; unwritten chapters are skipped.
pub fn to_markdown(workflow: &Workflow) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", workflow.title());

    if let Some(outline) = workflow.outline()
        && !outline.premise.trim().is_empty()
    {
        let _ = writeln!(out, "*{}*\n", outline.premise.trim());
    }

    if !workflow.characters().is_empty() {
        out.push_str("## Characters\n\n");
        for character in workflow.characters() {
            let _ = writeln!(
                out,
                "- **{}** ({}): {}",
                character.name, character.role, character.description
            );
        }
        out.push('\n');
    }

    for chapter in workflow.chapters().values() {
        let _ = writeln!(out, "## Chapter {}: {}\n", chapter.chapter_number, chapter.title);
        let _ = writeln!(out, "{}\n", chapter.visible_content().trim());
    }

    out
}

/// Write the Markdown manuscript to `path`.
#[instrument(skip(workflow), fields(workflow_id = %workflow.id()))]
pub fn write_markdown(workflow: &Workflow, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, to_markdown(workflow))?;
    tracing::info!(path = %path.display(), "Manuscript written");
    Ok(())
}
