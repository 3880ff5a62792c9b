//! Prompt for generating recipes from a fresh plan.

use std::sync::LazyLock;

use super::RECIPE_OUTPUT_FORMAT;

/// Task name recorded in the generation log.
pub const CREATE_PLAN_TASK: &str = "create_plan";

pub static CREATE_PLAN_SYSTEM_PROMPT: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"You are an experienced home cooking expert and nutritionist. Provide suitable recipes based on the user's needs.

1. The user provides basic personal information, a cooking plan (including custom requirements), available ingredients and available kitchenware. Take all of them into account.

2. Generate one or more dishes, each with its full preparation process.

3. {format}"#,
        format = RECIPE_OUTPUT_FORMAT
    )
});

/// Render the user prompt. Each argument is a JSON rendering of the slimmed
/// input it names.
pub fn render_create_plan_prompt(
    owner_info: &str,
    plan_info: &str,
    ingredients: &str,
    kitchenware: &str,
) -> String {
    format!(
        r#"Hello, below are my basic personal information, cooking plan (including custom requirements), existing ingredients and existing kitchenware.

Basic Personal Information: {owner_info}
Cooking Plan: {plan_info}
Ingredients: {ingredients}
Kitchenware: {kitchenware}

Please help me generate one or several recipes, thank you!"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt_fills_all_placeholders() {
        let prompt = render_create_plan_prompt(
            r#"{"name":"Ada"}"#,
            r#"{"title":"Date night"}"#,
            r#"[{"name":"Egg"}]"#,
            r#"[{"name":"Wok"}]"#,
        );

        assert!(prompt.contains(r#"Basic Personal Information: {"name":"Ada"}"#));
        assert!(prompt.contains(r#"Cooking Plan: {"title":"Date night"}"#));
        assert!(prompt.contains(r#"Ingredients: [{"name":"Egg"}]"#));
        assert!(prompt.contains(r#"Kitchenware: [{"name":"Wok"}]"#));
    }

    #[test]
    fn test_system_prompt_describes_output() {
        assert!(CREATE_PLAN_SYSTEM_PROMPT.contains("JSON array"));
        assert!(CREATE_PLAN_SYSTEM_PROMPT.contains("totalTimeMin"));
    }
}
