use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Calorie target as sent by the client: either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Calories {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Calories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Calories::Number(n) => write!(f, "{n}"),
            Calories::Text(s) => f.write_str(s.trim()),
        }
    }
}

/// Allergies as a free-text string or a list of items.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Allergies {
    Text(String),
    List(Vec<String>),
}

impl Allergies {
    pub fn describe(&self) -> String {
        match self {
            Allergies::Text(s) => s.trim().to_string(),
            Allergies::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanRequest {
    pub diet_type: Option<String>,
    pub calories: Option<Calories>,
    pub allergies: Option<Allergies>,
    pub cuisine: Option<String>,
}

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// The four slots the prompt asks for. Used to build plans locally; model
/// output is never forced through it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DailyMealPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lunch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dinner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snacks: Option<String>,
}

/// Plan keyed by weekday name. Holds the decoded object as-is, so extra keys
/// and nested slot values survive and key order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyMealPlan(Map<String, Value>);

impl WeeklyMealPlan {
    pub fn with_day(mut self, weekday: &str, day: DailyMealPlan) -> Self {
        let value = serde_json::to_value(day).unwrap_or(Value::Null);
        self.0.insert(weekday.to_string(), value);
        self
    }

    pub fn names_a_weekday(&self) -> bool {
        WEEKDAYS.iter().any(|d| self.0.contains_key(*d))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanResponse {
    pub meal_plan: WeeklyMealPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
