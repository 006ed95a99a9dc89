//! Candidate selection for contextual suggestions.

use serde_json::Value;

use crate::models::{non_blank, DestinationRecord, SuggestionContext};

pub const HOME_COUNTRY: &str = "India";
pub const MAX_PROMPT_DESTINATIONS: usize = 15;
pub const MAX_SUGGESTIONS: usize = 3;

const NEARBY_COUNTRIES: &[&str] = &[
    "Nepal",
    "Bhutan",
    "Sri Lanka",
    "Maldives",
    "Thailand",
    "Singapore",
    "UAE",
    "United Arab Emirates",
    "Vietnam",
    "Malaysia",
    "Indonesia",
    "Cambodia",
    "Myanmar",
    "Bangladesh",
];

const BUDGET_BAND_MAX: u64 = 2_500;
const MODERATE_BAND_MAX: u64 = 6_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Domestic,
    Nearby,
    International,
}

fn region_of(destination: &DestinationRecord) -> Region {
    let country = destination.country.trim();
    if country.eq_ignore_ascii_case(HOME_COUNTRY) {
        Region::Domestic
    } else if NEARBY_COUNTRIES
        .iter()
        .any(|nearby| nearby.eq_ignore_ascii_case(country))
    {
        Region::Nearby
    } else {
        Region::International
    }
}

fn location_matches(destination: &DestinationRecord, preference: &str) -> bool {
    match preference.to_lowercase().as_str() {
        "domestic" | "india" => region_of(destination) == Region::Domestic,
        "nearby" | "neighbouring" | "neighboring" => region_of(destination) == Region::Nearby,
        "international" | "abroad" => region_of(destination) != Region::Domestic,
        _ => true,
    }
}

fn interest_matches(destination: &DestinationRecord, label: &str) -> bool {
    destination.has_tag(label) || destination.is_best_for(label)
}

fn budget_matches(destination: &DestinationRecord, band: &str) -> bool {
    let cost = destination.base_daily_cost;
    match band.to_lowercase().as_str() {
        "budget" => cost < BUDGET_BAND_MAX,
        "moderate" | "mid" | "mid-range" => (BUDGET_BAND_MAX..=MODERATE_BAND_MAX).contains(&cost),
        "luxury" => cost > MODERATE_BAND_MAX,
        _ => true,
    }
}

/// Catalog entries the suggestion flow may mention, in catalog order.
///
/// Location, interest and budget filters apply together. When nothing
/// survives, only the trip type is kept as a filter.
pub fn allowed_destinations<'a>(
    catalog: &'a [DestinationRecord],
    context: &SuggestionContext,
) -> Vec<&'a DestinationRecord> {
    let location = non_blank(context.location_pref.as_deref());
    let interest = context.interest_label();
    let budget = non_blank(context.budget.as_deref());

    let strict = catalog
        .iter()
        .filter(|destination| location.map_or(true, |pref| location_matches(destination, pref)))
        .filter(|destination| interest.map_or(true, |label| interest_matches(destination, label)))
        .filter(|destination| budget.map_or(true, |band| budget_matches(destination, band)))
        .collect::<Vec<_>>();
    if !strict.is_empty() {
        return strict;
    }

    let trip_type = non_blank(context.trip_type.as_deref());
    catalog
        .iter()
        .filter(|destination| trip_type.map_or(true, |label| interest_matches(destination, label)))
        .collect()
}

/// Names for the prompt's allow-list, capped.
pub fn prompt_destination_names(allowed: &[&DestinationRecord]) -> Vec<String> {
    allowed
        .iter()
        .take(MAX_PROMPT_DESTINATIONS)
        .map(|destination| destination.name.clone())
        .collect()
}

/// Reads a sanitized model reply as a list of tips. Anything other than a
/// JSON array yields `None`; non-string and blank entries are skipped.
pub fn parse_suggestions(text: &str) -> Option<Vec<String>> {
    if !text.starts_with('[') {
        return None;
    }
    let Value::Array(items) = serde_json::from_str::<Value>(text).ok()? else {
        return None;
    };

    let tips = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|tip| !tip.is_empty())
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect::<Vec<_>>();

    if tips.is_empty() {
        None
    } else {
        Some(tips)
    }
}
