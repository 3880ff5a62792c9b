//! Prompt for editing the recipes of an existing plan.

use std::sync::LazyLock;

use super::RECIPE_OUTPUT_FORMAT;

pub const EDIT_PLAN_TASK: &str = "edit_plan";

pub static EDIT_PLAN_SYSTEM_PROMPT: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"You are an experienced home cooking expert and nutritionist. Modify the provided recipes based on the user's request.

1. You receive a list of existing recipes and a modification request.

2. Generate a NEW list of recipes. You may modify existing recipes, remove them or add new ones as the request requires.

3. {format}"#,
        format = RECIPE_OUTPUT_FORMAT
    )
});

/// Render the edit prompt from the current recipes (as JSON) and the user's
/// instruction.
pub fn render_edit_plan_prompt(recipes_json: &str, instruction: &str) -> String {
    format!(
        r#"Here are the current recipes: {recipes_json}

User's modification request: {instruction}

Please help me generate the updated recipe list, thank you!"#
    )
}
