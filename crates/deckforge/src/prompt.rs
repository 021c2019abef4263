//! Prompt composition for deck generation.

use crate::deck::SlideDeck;
use crate::error::{DeckError, Result};

/// Hard cap on slides, stated to the model in [`SYSTEM_PROMPT`].
///
/// The cap is part of the model's contract only; generated decks are not
/// truncated here.
pub const MAX_SLIDES: usize = 7;

/// Fixed instruction describing the deck schema and editing rules.
pub const SYSTEM_PROMPT: &str = r#"
You are an AI assistant that generates and edits structured slide decks in JSON format.

Always return ONLY valid JSON, following this structure exactly:
{
  "title": "Presentation title",
  "slides": [
    { "title": "Slide 1 title", "bullets": ["a", "b"], "image": null },
    ...
  ]
}

Rules:
- When NO existing slides are provided (first prompt), create a NEW deck with 5–7 slides by default and if user specifies to create more than 7 slides or pages, simply generate 7 and not more than that in any case.
- When existing slides are provided (context), MODIFY that JSON based on the user's new instructions:
  - Add, edit, or remove slides or bullets as requested.
  - Maintain consistent JSON structure.
  - Preserve existing slides unless explicitly told to remove or change them.
  - At any time there should not be more than 7 slides and if any user prompt specifies or results in creating more than 7 slides or pages, simply generate 7 and not more than that in any case.
- Never include explanations, notes, or extra text outside the JSON.
"#;

const CONTEXT_HEADER: &str = "\n\nCurrent Slides (JSON):";
const INSTRUCTION_HEADER: &str = "\n\nUser Prompt:";
const CLOSING: &str = "\n\nReturn ONLY the updated slides JSON (no extra commentary).";

/// Build the text sent to the model.
///
/// Order is fixed: system instruction, serialized prior deck (`{}` when
/// there is none), then the instruction verbatim.
pub fn compose_prompt(instruction: &str, prior: Option<&SlideDeck>) -> Result<String> {
    if instruction.trim().is_empty() {
        return Err(DeckError::InvalidInput(
            "instruction must be a non-blank string".into(),
        ));
    }

    let context = match prior {
        Some(deck) => serde_json::to_string(deck)
            .map_err(|e| DeckError::InvalidInput(format!("prior deck is not serializable: {e}")))?,
        None => "{}".to_string(),
    };

    let mut prompt = String::with_capacity(
        SYSTEM_PROMPT.len() + context.len() + instruction.len() + 128,
    );
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str(CONTEXT_HEADER);
    prompt.push_str(&context);
    prompt.push_str(INSTRUCTION_HEADER);
    prompt.push_str(instruction);
    prompt.push_str(CLOSING);
    Ok(prompt)
}
