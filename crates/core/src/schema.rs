//! Strict decoding of model output into the itinerary schema.
//!
//! Lists drop blank entries and cost fields coerce to non-negative integers.
//! Anything else that does not fit the shape is an error, so the caller can
//! retry.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::models::{CostBreakdown, DayPlan, ValidatedItinerary};

pub const MAX_ACTIVITIES_PER_DAY: usize = 10;
const MIN_TITLE_CHARS: usize = 3;
const MAX_TITLE_CHARS: usize = 200;

/// Parses sanitized model text and validates it against the schema.
///
/// `max_day` bounds each day plan's `day` field. The number of day plans is
/// only required to be at least one.
pub fn parse_itinerary(text: &str, max_day: u32) -> Result<ValidatedItinerary, SchemaError> {
    let value = serde_json::from_str::<Value>(text)?;
    validate_itinerary(&value, max_day)
}

pub fn validate_itinerary(value: &Value, max_day: u32) -> Result<ValidatedItinerary, SchemaError> {
    let root = as_object(value, "itinerary")?;

    let raw_plans = match root.get("day_plans") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(SchemaError::invalid("day_plans", "expected an array")),
        None => return Err(SchemaError::MissingField("day_plans".to_string())),
    };
    if raw_plans.is_empty() {
        return Err(SchemaError::NoDayPlans);
    }

    let day_plans = raw_plans
        .iter()
        .enumerate()
        .map(|(index, plan)| validate_day_plan(plan, index, max_day))
        .collect::<Result<Vec<_>, _>>()?;

    let travel_tips = match root.get("travel_tips") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => string_list(value, "travel_tips")?,
    };

    let cost_breakdown = match root.get("cost_breakdown") {
        None | Some(Value::Null) => CostBreakdown::default(),
        Some(value) => validate_cost_breakdown(value)?,
    };

    Ok(ValidatedItinerary {
        day_plans,
        travel_tips,
        cost_breakdown,
    })
}

fn validate_day_plan(value: &Value, index: usize, max_day: u32) -> Result<DayPlan, SchemaError> {
    let path = format!("day_plans[{}]", index);
    let plan = as_object(value, &path)?;

    let day =
        required(plan, &path, "day").and_then(|raw| integer(raw, &format!("{}.day", path)))?;
    let day = u32::try_from(day).unwrap_or(0);
    if day == 0 || day > max_day {
        return Err(SchemaError::DayOutOfRange { day, max: max_day });
    }

    let title = match required(plan, &path, "title")? {
        Value::String(title) => title.trim().to_string(),
        _ => return Err(SchemaError::invalid(format!("{}.title", path), "expected a string")),
    };
    let title_chars = title.chars().count();
    if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&title_chars) {
        return Err(SchemaError::invalid(
            format!("{}.title", path),
            format!("length must be {}..={}", MIN_TITLE_CHARS, MAX_TITLE_CHARS),
        ));
    }

    let activities = string_list(
        required(plan, &path, "activities")?,
        &format!("{}.activities", path),
    )?;
    if activities.is_empty() {
        return Err(SchemaError::EmptyActivities { day });
    }
    if activities.len() > MAX_ACTIVITIES_PER_DAY {
        return Err(SchemaError::TooManyActivities {
            day,
            count: activities.len(),
        });
    }

    let meals = match plan.get("meals") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => string_list(value, &format!("{}.meals", path))?,
    };

    let accommodation = match plan.get("accommodation") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(_) => {
            return Err(SchemaError::invalid(
                format!("{}.accommodation", path),
                "expected a string",
            ))
        }
    };

    let estimated_cost = coerce_cost(required(plan, &path, "estimated_cost")?);

    let tips = match plan.get("tips") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        Some(_) => {
            return Err(SchemaError::invalid(
                format!("{}.tips", path),
                "expected a string",
            ))
        }
    };

    Ok(DayPlan {
        day,
        title,
        activities,
        meals,
        accommodation,
        estimated_cost,
        tips,
    })
}

fn validate_cost_breakdown(value: &Value) -> Result<CostBreakdown, SchemaError> {
    let object = as_object(value, "cost_breakdown")?;
    let field = |name: &str| object.get(name).map(coerce_cost).unwrap_or(0);

    Ok(CostBreakdown {
        accommodation: field("accommodation"),
        food: field("food"),
        activities: field("activities"),
        transport: field("transport"),
    })
}

/// Non-numeric, fractional-string or negative input becomes 0. Floats are
/// truncated toward zero.
pub fn coerce_cost(value: &Value) -> u64 {
    let signed = match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|v| i64::try_from(v).unwrap_or(i64::MAX)))
            .or_else(|| number.as_f64().map(|v| v.trunc() as i64))
            .unwrap_or(0),
        Value::String(text) => text.trim().parse::<i64>().unwrap_or(0),
        Value::Bool(flag) => i64::from(*flag),
        _ => 0,
    };
    u64::try_from(signed.max(0)).unwrap_or(0)
}

fn integer(value: &Value, field: &str) -> Result<i64, SchemaError> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|v| v.fract() == 0.0)
                    .map(|v| v as i64)
            })
            .ok_or_else(|| SchemaError::invalid(field, "expected an integer")),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| SchemaError::invalid(field, "expected an integer")),
        _ => Err(SchemaError::invalid(field, "expected an integer")),
    }
}

/// Strings are trimmed; blank strings and nulls are dropped.
fn string_list(value: &Value, field: &str) -> Result<Vec<String>, SchemaError> {
    let Value::Array(items) = value else {
        return Err(SchemaError::invalid(field, "expected an array"));
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Value::Null => {}
            _ => return Err(SchemaError::invalid(field, "expected only strings")),
        }
    }
    Ok(out)
}

fn required<'a>(
    object: &'a Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<&'a Value, SchemaError> {
    object
        .get(key)
        .ok_or_else(|| SchemaError::MissingField(format!("{}.{}", path, key)))
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::NotAnObject(what.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(day: u32, activities: Value, cost: Value) -> Value {
        json!({
            "day": day,
            "title": "Old town walk",
            "activities": activities,
            "meals": ["Breakfast", " ", "Dinner"],
            "accommodation": "Guesthouse",
            "estimated_cost": cost,
            "tips": "Carry water"
        })
    }

    #[test]
    fn coerces_non_numeric_cost_to_zero() {
        let value = json!({ "day_plans": [day(1, json!(["Walk"]), json!("abc"))] });
        let parsed = validate_itinerary(&value, 3).unwrap();
        assert_eq!(parsed.day_plans[0].estimated_cost, 0);
        assert_eq!(parsed.day_plans[0].meals, vec!["Breakfast", "Dinner"]);
    }

    #[test]
    fn blank_only_activities_fail() {
        let value = json!({ "day_plans": [day(1, json!(["  ", ""]), json!(100))] });
        assert!(matches!(
            validate_itinerary(&value, 3),
            Err(SchemaError::EmptyActivities { day: 1 })
        ));
    }

    #[test]
    fn cost_coercion_rules() {
        assert_eq!(coerce_cost(&json!(-50)), 0);
        assert_eq!(coerce_cost(&json!(12.9)), 12);
        assert_eq!(coerce_cost(&json!(" 300 ")), 300);
        assert_eq!(coerce_cost(&json!("12.5")), 0);
        assert_eq!(coerce_cost(&json!(null)), 0);
        assert_eq!(coerce_cost(&json!([1])), 0);
    }

    #[test]
    fn breakdown_defaults_and_total() {
        let value = json!({
            "day_plans": [day(1, json!(["Walk"]), json!(10))],
            "travel_tips": ["Pack light", "", "  Book early  "],
            "cost_breakdown": { "accommodation": "4000", "food": -3, "transport": 1500.7 }
        });
        let parsed = validate_itinerary(&value, 1).unwrap();
        assert_eq!(
            parsed.cost_breakdown,
            CostBreakdown {
                accommodation: 4000,
                food: 0,
                activities: 0,
                transport: 1500
            }
        );
        assert_eq!(parsed.total_cost(), 5500);
        assert_eq!(parsed.travel_tips, vec!["Pack light", "Book early"]);
    }

    #[test]
    fn requires_day_plans() {
        assert!(matches!(
            validate_itinerary(&json!({ "day_plans": [] }), 2),
            Err(SchemaError::NoDayPlans)
        ));
        assert!(matches!(
            validate_itinerary(&json!({ "travel_tips": [] }), 2),
            Err(SchemaError::MissingField(_))
        ));
        assert!(matches!(
            validate_itinerary(&json!([1, 2]), 2),
            Err(SchemaError::NotAnObject(_))
        ));
    }

    #[test]
    fn day_must_fall_within_trip() {
        let value = json!({ "day_plans": [day(4, json!(["Walk"]), json!(1))] });
        assert!(matches!(
            validate_itinerary(&value, 3),
            Err(SchemaError::DayOutOfRange { day: 4, max: 3 })
        ));
    }

    #[test]
    fn caps_activity_count() {
        let many = (0..11).map(|i| format!("Stop {}", i)).collect::<Vec<_>>();
        let value = json!({ "day_plans": [day(1, json!(many), json!(1))] });
        assert!(matches!(
            validate_itinerary(&value, 1),
            Err(SchemaError::TooManyActivities { count: 11, .. })
        ));
    }

    #[test]
    fn rejects_unparseable_text() {
        assert!(matches!(
            parse_itinerary("not json", 1),
            Err(SchemaError::Json(_))
        ));
    }
}
