use std::time::Duration;

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    dto::{DailyMealPlan, MealPlanRequest, MealPlanResponse, WeeklyMealPlan},
    llm::{ChatPrompt, MealPlanModel},
};

pub const FALLBACK_WARNING: &str = "Used fallback plan due to AI formatting error.";

const SYSTEM_PROMPT: &str =
    "You are a professional nutritionist. Output ONLY raw JSON in English. No other languages allowed.";

const TEMPERATURE: f32 = 0.3;

/// Result of one generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Parsed(WeeklyMealPlan),
    FallbackUsed { plan: WeeklyMealPlan, reason: String },
}

impl GenerationOutcome {
    pub fn into_response(self) -> MealPlanResponse {
        match self {
            GenerationOutcome::Parsed(plan) => MealPlanResponse {
                meal_plan: plan,
                warning: None,
            },
            GenerationOutcome::FallbackUsed { plan, .. } => MealPlanResponse {
                meal_plan: plan,
                warning: Some(FALLBACK_WARNING.to_string()),
            },
        }
    }
}

/// Static plan served when the model fails or returns unusable output.
pub fn fallback_meal_plan() -> WeeklyMealPlan {
    WeeklyMealPlan::default().with_day(
        "Monday",
        DailyMealPlan {
            breakfast: Some("Oatmeal with berries (Fallback option) - 350 kcal".into()),
            lunch: Some("Chicken salad - 500 kcal".into()),
            dinner: Some("Fish with steamed vegetables - 450 kcal".into()),
            snacks: Some("Mixed nuts - 150 kcal".into()),
        },
    )
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn build_prompt(req: &MealPlanRequest) -> ChatPrompt {
    let diet = or_default(req.diet_type.clone(), "balanced");
    let calories = req
        .calories
        .as_ref()
        .map(|c| c.to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "2000".to_string());
    let allergies = or_default(req.allergies.as_ref().map(|a| a.describe()), "none");
    let cuisine = or_default(req.cuisine.clone(), "any");

    let user = format!(
        r#"Create a 7-day meal plan for a {diet} diet aiming for {calories} calories.
Allergies: {allergies}.
Cuisine: {cuisine}.

IMPORTANT: All meal names and descriptions must be in ENGLISH only.
Return ONLY a valid JSON object.
The keys must be days of the week: "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday".
Each day must have: "Breakfast", "Lunch", "Dinner", "Snacks".
Example format:
{{
  "Monday": {{ "Breakfast": "...", "Lunch": "...", "Dinner": "...", "Snacks": "..." }},
  ...
}}"#
    );

    ChatPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
        temperature: TEMPERATURE,
    }
}

/// Stage one: drop code fences and any prose around the outermost object.
pub fn extract_json_object(raw: &str) -> String {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => cleaned[start..=end].to_string(),
        _ => cleaned.to_string(),
    }
}

/// Stage two: decode, unwrapping a single `mealPlan` wrapper if present.
/// The object is kept exactly as the model wrote it.
pub fn parse_meal_plan(raw: &str) -> anyhow::Result<WeeklyMealPlan> {
    anyhow::ensure!(!raw.trim().is_empty(), "empty model response");

    let candidate = extract_json_object(raw);
    let mut value: Value = serde_json::from_str(&candidate).context("model output is not JSON")?;

    if let Some(inner) = value
        .get_mut("mealPlan")
        .filter(|v| v.is_object())
        .map(Value::take)
    {
        value = inner;
    }

    let plan: WeeklyMealPlan =
        serde_json::from_value(value).context("model output is not a JSON object")?;
    anyhow::ensure!(plan.names_a_weekday(), "model output names no weekdays");
    Ok(plan)
}

/// Runs one generation. Never fails: provider and parse errors degrade to
/// the fallback plan.
pub async fn generate_meal_plan(
    model: &dyn MealPlanModel,
    req: &MealPlanRequest,
    timeout: Duration,
) -> GenerationOutcome {
    let prompt = build_prompt(req);
    debug!(prompt_len = prompt.user.len(), "meal plan prompt built");

    let raw = match tokio::time::timeout(timeout, model.complete(&prompt)).await {
        Ok(Ok(content)) => content,
        Ok(Err(e)) => return fallback(format!("provider error: {e:#}")),
        Err(_) => return fallback(format!("provider timed out after {}s", timeout.as_secs())),
    };

    match parse_meal_plan(&raw) {
        Ok(plan) => {
            info!("meal plan generated");
            GenerationOutcome::Parsed(plan)
        }
        Err(e) => {
            debug!(raw = %raw, "unparsable model output");
            fallback(format!("{e:#}"))
        }
    }
}

fn fallback(reason: String) -> GenerationOutcome {
    warn!(reason = %reason, "using fallback meal plan");
    GenerationOutcome::FallbackUsed {
        plan: fallback_meal_plan(),
        reason,
    }
}
