//! Prompt assembly for each generation stage.
//!
//! Every stage pairs one of the system prompts below with a user prompt
//! built from the workflow's current state.

use scrivener_core::{Chapter, ChapterPlan, Character, StorySettings, Workflow};
use std::fmt::Write as _;

/// System prompt for character and setting generation.
pub const CHARACTERS_SETTINGS_SYSTEM: &str = "You are an expert story planner. Generate detailed characters and settings in the specified JSON format.";

/// System prompt for outline generation.
pub const OUTLINE_SYSTEM: &str =
    "You are an expert story outliner. Create a detailed story outline in the specified JSON format.";

/// System prompt for scene outlines in drafted mode.
pub const SCENE_OUTLINE_SYSTEM: &str = "You are an expert chapter outliner. Create detailed, scene-by-scene chapter outlines. Output only the outline content without any headers or explanatory text.";

/// System prompt for dialogue drafts in drafted mode.
pub const DIALOGUE_SYSTEM: &str = "You are an expert dialogue writer. Create realistic, engaging dialogue that advances character and plot. Output only the dialogue content without any headers or explanatory text.";

/// System prompt for chapter prose.
pub const CHAPTER_SYSTEM: &str = "You are an expert novelist. Write engaging, well-crafted chapters with rich description and compelling narrative. Output only the story content without any headers, titles, or explanatory text.";

/// System prompt for one-shot stories outside a workflow.
pub const STORY_SYSTEM: &str = "You are an expert storyteller. Write engaging, creative stories with vivid descriptions and compelling narratives. Output only the story content without any headers, titles, introductory text, or explanatory comments.";

/// System prompt for chapter scoring.
pub const VALIDATION_SYSTEM: &str = "You are an expert story editor. Analyze how well the chapter matches the outline and provide constructive feedback.";

/// Story ideas offered to writers who have no prompt yet.
pub const PROMPT_SUGGESTIONS: &[&str] = &[
    "Write a story about a character who discovers they can see 24 hours into the future",
    "Tell the tale of a librarian who finds a book that writes itself",
    "Create a story set in a world where memories can be traded like currency",
    "Write about a person who wakes up in a different timeline every day",
    "Tell a story about the last bookstore in a digital world",
    "Write about a character who can enter and explore paintings",
    "Create a tale about a detective who solves crimes using dreams",
    "Tell the story of a chef whose food can alter emotions",
    "Write about a world where colors have been outlawed",
    "Create a story about a person who collects lost sounds",
];

const PROSE_RULES: &str = "IMPORTANT: Output ONLY the story content. Do not include:
- Chapter titles or headers
- Introductory text like \"Here is the chapter:\" or \"Chapter X:\"
- Explanatory notes or comments
- Outro text or summaries
- Any text that is not part of the actual story narrative

Start immediately with the story content and end when the chapter naturally concludes.";

/// Drafts produced before the prose in drafted mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterDrafts {
    /// Scene-by-scene plan
    pub scene_outline: Option<String>,
    /// Dialogue in script form
    pub dialogue: Option<String>,
}

/// Everything a chapter prompt is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct ChapterContext<'a> {
    /// Workflow being written
    pub workflow: &'a Workflow,
    /// Plan of the chapter
    pub plan: &'a ChapterPlan,
    /// Visible tail of the previous chapter
    pub previous_tail: Option<&'a str>,
    /// Caller guidance
    pub instructions: Option<&'a str>,
    /// Validator feedback from a rejected attempt
    pub revision_notes: Option<&'a str>,
}

fn push_instructions(prompt: &mut String, instructions: Option<&str>) {
    if let Some(instructions) = instructions {
        let _ = write!(prompt, "\n\nAdditional instructions:\n{}", instructions);
    }
}

fn roster(characters: &[Character]) -> String {
    characters
        .iter()
        .map(|c| format!("- {}: {} ({})", c.name, c.description, c.role))
        .collect::<Vec<_>>()
        .join("\n")
}

fn settings_block(settings: Option<&StorySettings>) -> String {
    match settings {
        Some(s) => {
            let mut block = format!(
                "- Genre: {}\n- Setting: {}\n- Tone: {}",
                s.genre, s.setting, s.tone
            );
            if !s.themes.is_empty() {
                let _ = write!(block, "\n- Themes: {}", s.themes.join(", "));
            }
            if let Some(world) = s.world_building.as_deref().filter(|w| !w.trim().is_empty()) {
                let _ = write!(block, "\n- World: {}", world);
            }
            block
        }
        None => "- (no settings recorded)".to_string(),
    }
}

fn plan_block(plan: &ChapterPlan) -> String {
    let mut block = format!(
        "Chapter {}: {}\nSummary: {}\nKey Events: {}\nCharacters: {}",
        plan.chapter_number,
        plan.title,
        plan.summary,
        plan.key_events.join(", "),
        plan.characters_involved.join(", ")
    );
    if let Some(purpose) = plan.purpose.as_deref() {
        let _ = write!(block, "\nPurpose: {}", purpose);
    }
    block
}

/// Prompt asking for characters and settings as JSON.
pub fn characters_settings(story_prompt: &str, instructions: Option<&str>) -> String {
    let mut prompt = format!(
        r#"Based on this story idea: "{story_prompt}"

Create detailed characters and story settings. Return your response as a JSON object with this structure:

{{
  "characters": [
    {{
      "name": "Character Name",
      "description": "Detailed character description and traits",
      "role": "protagonist/antagonist/supporting",
      "background": "Character's background and history",
      "motivations": "Character's goals and motivations",
      "relationships": {{"other_character": "relationship description"}}
    }}
  ],
  "settings": {{
    "genre": "Story genre",
    "setting": "Time and place description",
    "tone": "Overall tone and mood",
    "themes": ["theme1", "theme2"],
    "world_building": "Additional world details",
    "target_length": "short/medium/long"
  }}
}}

Focus on creating compelling, well-developed characters with clear motivations and relationships. The settings should support the story's themes and provide a rich backdrop for the narrative."#
    );
    push_instructions(&mut prompt, instructions);
    prompt.push_str("\n\nRespond ONLY with valid JSON.");
    prompt
}

/// Prompt asking for a chapter outline as JSON.
pub fn outline(workflow: &Workflow, target_chapters: Option<u32>, instructions: Option<&str>) -> String {
    let target = target_chapters
        .map(|n| n.to_string())
        .unwrap_or_else(|| "flexible".to_string());
    let mut prompt = format!(
        r#"Create a detailed story outline based on:

Original Idea: "{idea}"

Characters:
{roster}

Settings:
{settings}

Target Chapters: {target}

Return your response as a JSON object with this structure:

{{
  "title": "Story Title",
  "premise": "Core story premise",
  "plot_structure": "Overall plot structure and arc",
  "chapters": [
    {{
      "chapter_number": 1,
      "title": "Chapter Title",
      "summary": "Brief chapter summary",
      "key_events": ["event1", "event2"],
      "characters_involved": ["character1", "character2"],
      "purpose": "Purpose of this chapter in the overall story"
    }}
  ],
  "estimated_word_count": 50000
}}

Create a compelling story arc with proper pacing, character development, and thematic exploration."#,
        idea = workflow.prompt(),
        roster = roster(workflow.characters()),
        settings = settings_block(workflow.settings().as_ref()),
    );
    push_instructions(&mut prompt, instructions);
    prompt.push_str("\n\nRespond ONLY with valid JSON.");
    prompt
}

/// Prompt for a chapter's prose, folding in drafts when present.
pub fn chapter(ctx: &ChapterContext<'_>, drafts: &ChapterDrafts) -> String {
    let mut prompt = String::from("Write the complete chapter based on:\n\n");
    let _ = write!(prompt, "{}\n\n", plan_block(ctx.plan));

    if let Some(outline) = drafts.scene_outline.as_deref() {
        let _ = write!(prompt, "Chapter Outline:\n{}\n\n", outline);
    }
    if let Some(dialogue) = drafts.dialogue.as_deref() {
        let _ = write!(prompt, "Key Dialogue:\n{}\n\n", dialogue);
    }

    let _ = write!(
        prompt,
        "Story Details:\n{}\n\nCharacters:\n{}",
        settings_block(ctx.workflow.settings().as_ref()),
        roster(ctx.workflow.characters())
    );

    if let Some(tail) = ctx.previous_tail.filter(|t| !t.trim().is_empty()) {
        let _ = write!(
            prompt,
            "\n\nThe previous chapter ended:\n...{}\n\nContinue smoothly from where it left off.",
            tail
        );
    }
    if let Some(notes) = ctx.revision_notes.filter(|n| !n.trim().is_empty()) {
        let _ = write!(
            prompt,
            "\n\nAn earlier draft of this chapter was rejected. Editor feedback to address:\n{}",
            notes
        );
    }
    push_instructions(&mut prompt, ctx.instructions);

    prompt.push_str("\n\nAim for approximately 2000-4000 words.\n\n");
    prompt.push_str(PROSE_RULES);
    prompt
}

/// Prompt for the scene-by-scene outline of a drafted chapter.
pub fn scene_outline(ctx: &ChapterContext<'_>) -> String {
    let mut prompt = format!(
        "Create a detailed outline for this chapter:\n\n{}\n\nStory Context:\n{}\n\nAvailable Characters:\n{}",
        plan_block(ctx.plan),
        settings_block(ctx.workflow.settings().as_ref()),
        roster(ctx.workflow.characters())
    );
    prompt.push_str(
        "\n\nCreate a detailed scene-by-scene outline for this chapter. Include:
- Opening scene setup
- Character interactions and development
- Plot progression
- Emotional beats
- Transition to next chapter",
    );
    push_instructions(&mut prompt, ctx.instructions);
    prompt.push_str("\n\nWrite a comprehensive outline that serves as a blueprint for the chapter.");
    prompt
}

/// Prompt for the dialogue draft, limited to the characters in the chapter.
pub fn dialogue(ctx: &ChapterContext<'_>, scene_outline: &str) -> String {
    let involved: Vec<Character> = ctx
        .workflow
        .characters()
        .iter()
        .filter(|c| ctx.plan.characters_involved.iter().any(|name| name == &c.name))
        .cloned()
        .collect();
    format!(
        "Based on this chapter outline:

{scene_outline}

Characters in this chapter:
{cast}

Create engaging dialogue for this chapter. Focus on:
- Character voice and personality
- Natural conversation flow
- Emotional subtext
- Plot advancement through dialogue
- Character relationships and dynamics

Present the dialogue in script format with character names and their lines.",
        cast = roster(&involved)
    )
}

/// Prompt asking the scorer to rate a chapter against its plan.
pub fn validation(content: &str, plan: &ChapterPlan, settings: &StorySettings) -> String {
    format!(
        "Analyze how well this generated chapter matches its intended outline:

INTENDED OUTLINE:
{plan}

STORY CONTEXT:
{settings}

GENERATED CHAPTER:
{content}

Evaluate the chapter on:
1. How well it follows the outlined plot points
2. Character consistency and development
3. Achievement of the chapter's purpose
4. Overall quality and engagement

Provide a score from 0.0 to 1.0 and detailed feedback.

Format your response as:
SCORE: [0.0-1.0]
FEEDBACK: [Detailed analysis and suggestions for improvement]",
        plan = plan_block(plan),
        settings = settings_block(Some(settings)),
    )
}

/// The last `max_chars` characters of a chapter's visible prose.
pub fn previous_tail(chapter: &Chapter, max_chars: usize) -> Option<String> {
    let visible = chapter.visible_content();
    if visible.is_empty() || max_chars == 0 {
        return None;
    }
    let total = visible.chars().count();
    Some(visible.chars().skip(total.saturating_sub(max_chars)).collect())
}
