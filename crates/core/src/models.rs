use serde::{Deserialize, Serialize};

use crate::error::PlanningError;

pub const MAX_BUDGET: u64 = 10_000_000;
pub const MAX_TRIP_DAYS: u32 = 30;
pub const MAX_TRAVELERS: u32 = 20;
pub const DEFAULT_TRAVELERS: u32 = 2;
pub const DEFAULT_BASE_DAILY_COST: u64 = 3_000;
pub const MAX_CHAT_MESSAGE_CHARS: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub id: String,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "base_cost_per_day", default = "default_base_daily_cost")]
    pub base_daily_cost: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub best_for: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl DestinationRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value.eq_ignore_ascii_case(tag))
    }

    pub fn is_best_for(&self, label: &str) -> bool {
        self.best_for
            .iter()
            .any(|value| value.eq_ignore_ascii_case(label))
    }
}

fn default_base_daily_cost() -> u64 {
    DEFAULT_BASE_DAILY_COST
}

fn default_travelers() -> u32 {
    DEFAULT_TRAVELERS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub budget: u64,
    pub days: u32,
    pub travel_type: String,
    pub interest: String,
    #[serde(default = "default_travelers")]
    pub travelers: u32,
}

impl UserPreferences {
    pub fn validate(&self) -> Result<(), PlanningError> {
        check_budget(self.budget)?;
        check_days(self.days)?;
        check_label("travel_type", &self.travel_type, 2, 50)?;
        check_label("interest", &self.interest, 2, 50)?;
        check_travelers(self.travelers)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredDestination {
    #[serde(flatten)]
    pub destination: DestinationRecord,
    pub score: f64,
    #[serde(skip)]
    pub preferences: UserPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryRequest {
    pub destination: String,
    pub days: u32,
    pub budget: u64,
    pub travel_type: String,
    pub interest: String,
    #[serde(default = "default_travelers")]
    pub travelers: u32,
}

impl ItineraryRequest {
    pub fn validate(&self) -> Result<(), PlanningError> {
        check_label("destination", &self.destination, 2, 100)?;
        check_days(self.days)?;
        check_budget(self.budget)?;
        check_label("travel_type", &self.travel_type, 2, 50)?;
        check_label("interest", &self.interest, 2, 50)?;
        check_travelers(self.travelers)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub title: String,
    pub activities: Vec<String>,
    pub meals: Vec<String>,
    pub accommodation: String,
    pub estimated_cost: u64,
    pub tips: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub accommodation: u64,
    pub food: u64,
    pub activities: u64,
    pub transport: u64,
}

impl CostBreakdown {
    pub fn total(&self) -> u64 {
        self.accommodation
            .saturating_add(self.food)
            .saturating_add(self.activities)
            .saturating_add(self.transport)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub id: String,
    pub destination: String,
    pub days: u32,
    pub total_cost: u64,
    pub day_plans: Vec<DayPlan>,
    pub travel_tips: Vec<String>,
    pub cost_breakdown: CostBreakdown,
}

/// Day plans, tips and costs decoded from model output, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedItinerary {
    pub day_plans: Vec<DayPlan>,
    pub travel_tips: Vec<String>,
    pub cost_breakdown: CostBreakdown,
}

impl ValidatedItinerary {
    pub fn total_cost(&self) -> u64 {
        self.cost_breakdown.total()
    }

    pub fn into_itinerary(self, id: String, request: &ItineraryRequest) -> Itinerary {
        Itinerary {
            id,
            destination: request.destination.clone(),
            days: request.days,
            total_cost: self.total_cost(),
            day_plans: self.day_plans,
            travel_tips: self.travel_tips,
            cost_breakdown: self.cost_breakdown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionContext {
    pub trip_type: Option<String>,
    pub terrain: Option<String>,
    pub budget: Option<String>,
    pub duration: Option<String>,
    pub location_pref: Option<String>,
    pub specific_location: Option<String>,
}

impl SuggestionContext {
    pub fn validate(&self) -> Result<(), PlanningError> {
        let short_fields = [
            ("tripType", &self.trip_type),
            ("terrain", &self.terrain),
            ("budget", &self.budget),
            ("duration", &self.duration),
            ("locationPref", &self.location_pref),
        ];
        for (name, value) in short_fields {
            if let Some(value) = value {
                check_max_len(name, value, 50)?;
            }
        }
        if let Some(value) = &self.specific_location {
            check_max_len("specificLocation", value, 100)?;
        }
        Ok(())
    }

    /// Non-blank fields rendered as `label: value` pairs, in a fixed order.
    pub fn described_parts(&self) -> Vec<String> {
        [
            ("trip type", &self.trip_type),
            ("terrain", &self.terrain),
            ("budget", &self.budget),
            ("duration", &self.duration),
            ("location preference", &self.location_pref),
            ("specific destination", &self.specific_location),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| format!("{}: {}", label, value))
        })
        .collect()
    }

    /// The environment label used to match catalog entries.
    pub fn interest_label(&self) -> Option<&str> {
        non_blank(self.terrain.as_deref()).or_else(|| non_blank(self.trip_type.as_deref()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub name: String,
    pub country: String,
    pub image: String,
    pub score: f64,
    pub reason: String,
    pub estimated_cost: u64,
    pub tags: Vec<String>,
    pub description: String,
}

impl Recommendation {
    pub fn from_scored(scored: &ScoredDestination, reason: String) -> Self {
        let dest = &scored.destination;
        Self {
            id: dest.id.clone(),
            name: dest.name.clone(),
            country: dest.country.clone(),
            image: dest.image.clone(),
            score: scored.score,
            reason,
            estimated_cost: dest
                .base_daily_cost
                .saturating_mul(u64::from(scored.preferences.days)),
            tags: dest.tags.clone(),
            description: dest.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub destinations: Vec<Recommendation>,
    pub query: UserPreferences,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn check_budget(budget: u64) -> Result<(), PlanningError> {
    if budget == 0 || budget > MAX_BUDGET {
        return Err(PlanningError::InvalidPreferences(format!(
            "budget must be within 1..={}",
            MAX_BUDGET
        )));
    }
    Ok(())
}

fn check_days(days: u32) -> Result<(), PlanningError> {
    if !(1..=MAX_TRIP_DAYS).contains(&days) {
        return Err(PlanningError::InvalidPreferences(format!(
            "days must be within 1..={}",
            MAX_TRIP_DAYS
        )));
    }
    Ok(())
}

fn check_travelers(travelers: u32) -> Result<(), PlanningError> {
    if !(1..=MAX_TRAVELERS).contains(&travelers) {
        return Err(PlanningError::InvalidPreferences(format!(
            "travelers must be within 1..={}",
            MAX_TRAVELERS
        )));
    }
    Ok(())
}

fn check_label(field: &str, value: &str, min: usize, max: usize) -> Result<(), PlanningError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(PlanningError::InvalidPreferences(format!(
            "{} must be {}..={} characters",
            field, min, max
        )));
    }
    Ok(())
}

fn check_max_len(field: &str, value: &str, max: usize) -> Result<(), PlanningError> {
    if value.chars().count() > max {
        return Err(PlanningError::InvalidPreferences(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}
