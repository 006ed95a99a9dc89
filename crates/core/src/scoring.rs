use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{DestinationRecord, ScoredDestination, UserPreferences};

const INTEREST_POINTS_PER_TAG: u32 = 20;
const INTEREST_CAP: u32 = 40;
const INTEREST_EXACT_BONUS: u32 = 15;
const TYPE_POINTS_PER_TAG: u32 = 15;
const TYPE_CAP: u32 = 35;
const TYPE_BEST_FOR_BONUS: u32 = 10;

/// Catalog tags rewarded by a travel type (the kind of experience).
pub fn travel_type_tags(travel_type: &str) -> &'static [&'static str] {
    match travel_type.trim().to_lowercase().as_str() {
        "adventure" => &["adventure", "mountains", "offbeat", "trekking", "rafting"],
        "relaxation" => &[
            "relaxation",
            "nature",
            "backwaters",
            "lakes",
            "beach",
            "spa",
            "scenic",
        ],
        "culture" => &[
            "heritage",
            "culture",
            "spiritual",
            "temples",
            "history",
            "museums",
        ],
        "party" => &["party", "beach", "nightlife", "urban"],
        "romantic" => &[
            "romantic",
            "lakes",
            "nature",
            "scenic",
            "honeymoon",
            "luxury",
        ],
        "family" => &["family", "heritage", "nature", "kid-friendly", "safe"],
        "spiritual" => &["spiritual", "temples", "pilgrimage", "yoga", "meditation"],
        "foodie" => &["food", "culture", "heritage", "markets", "urban"],
        _ => &[],
    }
}

/// Catalog tags rewarded by an interest (terrain and environment).
pub fn interest_tags(interest: &str) -> &'static [&'static str] {
    match interest.trim().to_lowercase().as_str() {
        "mountains" => &[
            "mountains",
            "hills",
            "trekking",
            "snow",
            "adventure",
            "scenic",
        ],
        "beach" => &["beach", "coastal", "sea", "island", "water", "relaxation"],
        "heritage" => &[
            "heritage",
            "culture",
            "history",
            "monuments",
            "forts",
            "museums",
        ],
        "nature" => &[
            "nature",
            "backwaters",
            "wildlife",
            "forests",
            "scenic",
            "lakes",
        ],
        "spiritual" => &["spiritual", "temples", "pilgrimage", "religious", "yoga"],
        "adventure" => &["adventure", "offbeat", "trekking", "rafting", "sports"],
        "city" => &["city", "urban", "nightlife", "shopping", "food"],
        _ => &[],
    }
}

/// Ranks the catalog against the preferences, best first. Equal scores keep
/// catalog order.
pub fn score_destinations(
    catalog: &[DestinationRecord],
    preferences: &UserPreferences,
) -> Vec<ScoredDestination> {
    let travel_type = preferences.travel_type.trim().to_lowercase();
    let interest = preferences.interest.trim().to_lowercase();
    let type_set = travel_type_tags(&travel_type)
        .iter()
        .copied()
        .collect::<HashSet<_>>();
    let interest_set = interest_tags(&interest)
        .iter()
        .copied()
        .collect::<HashSet<_>>();
    let daily_budget = daily_budget(preferences.budget, preferences.days);

    let mut scored = catalog
        .iter()
        .map(|destination| {
            let tags = destination
                .tags
                .iter()
                .map(|tag| tag.to_lowercase())
                .collect::<HashSet<_>>();

            let interest_overlap = overlap(&tags, &interest_set);
            let mut interest_score = (interest_overlap * INTEREST_POINTS_PER_TAG).min(INTEREST_CAP);
            if tags.contains(interest.as_str()) {
                interest_score += INTEREST_EXACT_BONUS;
            }

            let type_overlap = overlap(&tags, &type_set);
            let mut type_score = (type_overlap * TYPE_POINTS_PER_TAG).min(TYPE_CAP);
            if destination.is_best_for(&travel_type) {
                type_score += TYPE_BEST_FOR_BONUS;
            }

            let budget_score = budget_fit(destination.base_daily_cost, daily_budget);
            let raw = f64::from(interest_score + type_score + budget_score);

            ScoredDestination {
                destination: destination.clone(),
                score: round_one_decimal(raw.clamp(0.0, 100.0)),
                preferences: preferences.clone(),
            }
        })
        .collect::<Vec<_>>();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

/// Budget fit in points, from the ratio of a destination's daily cost to the
/// user's daily budget.
pub fn budget_fit(base_daily_cost: u64, daily_budget: f64) -> u32 {
    if daily_budget <= 0.0 {
        return 0;
    }

    let ratio = base_daily_cost as f64 / daily_budget;
    if ratio <= 1.0 {
        if (0.5..=0.8).contains(&ratio) {
            25
        } else if ratio < 0.5 {
            // Possibly too cheap, still credited.
            15
        } else {
            20
        }
    } else if ratio <= 1.2 {
        5
    } else {
        0
    }
}

fn daily_budget(budget: u64, days: u32) -> f64 {
    if days == 0 {
        return 0.0;
    }
    budget as f64 / f64::from(days)
}

fn overlap(tags: &HashSet<String>, wanted: &HashSet<&str>) -> u32 {
    tags.iter().filter(|tag| wanted.contains(tag.as_str())).count() as u32
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
