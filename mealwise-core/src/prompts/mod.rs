//! LLM prompt templates.

pub mod create_plan;
pub mod edit_plan;

pub use create_plan::{render_create_plan_prompt, CREATE_PLAN_SYSTEM_PROMPT, CREATE_PLAN_TASK};
pub use edit_plan::{render_edit_plan_prompt, EDIT_PLAN_SYSTEM_PROMPT, EDIT_PLAN_TASK};

/// Output contract shared by the create and edit system prompts.
const RECIPE_OUTPUT_FORMAT: &str = r#"The output must be a JSON array of recipe objects and nothing else. Each recipe object has these fields (imageUrl may be empty):
{
  "title": string (required),
  "description": string,
  "imageUrl": string,
  "servings": integer,
  "totalTimeMin": integer,
  "tags": [string],
  "ingredients": [{"name": string (required), "amount": string, e.g. "2 tbsp", "note": string}],
  "steps": [{"order": integer starting at 1 (required), "text": string (required), "durationMin": number}]
}
Every recipe needs at least one step. Do not output any content other than the JSON array."#;
