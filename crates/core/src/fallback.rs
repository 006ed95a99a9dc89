//! Offline answers used when the model is unavailable or its output never
//! validates. Every function here is total and deterministic apart from the
//! generated itinerary id.

use uuid::Uuid;

use crate::models::{
    CostBreakdown, DayPlan, DestinationRecord, Itinerary, ItineraryRequest, SuggestionContext,
    UserPreferences, MAX_TRIP_DAYS,
};
use crate::topic::{classify_chat_topic, ChatTopic};

pub const CHAT_FAILURE_REPLY: &str = "I'd love to help you plan your trip! Try our Trip Planner above for personalized AI recommendations based on your budget and interests.";
pub const EMPTY_CONTEXT_SUGGESTION: &str =
    "✨ Select your preferences and I'll give you personalized tips!";

const DEFAULT_ACTIVITIES: [&str; 3] = ["Local sightseeing", "Cultural experiences", "Food tour"];

fn activity_triad(interest: &str) -> [&'static str; 3] {
    match interest.trim().to_lowercase().as_str() {
        "mountains" => ["Trekking", "Scenic viewpoints", "Local village visit"],
        "beach" => ["Beach activities", "Water sports", "Sunset cruise"],
        "heritage" => ["Monument tours", "Museum visit", "Heritage walk"],
        "nature" => ["Nature trails", "Wildlife spotting", "Photography"],
        "spiritual" => ["Temple visits", "Meditation session", "Evening prayers"],
        "adventure" => ["Adventure sports", "Outdoor activities", "Local exploration"],
        _ => DEFAULT_ACTIVITIES,
    }
}

/// Builds a complete itinerary without calling the model.
///
/// The cost breakdown is a fixed 40/25/20/15 split of the budget, truncated
/// per bucket, and `total_cost` is the input budget itself.
pub fn synthesize_itinerary(request: &ItineraryRequest) -> Itinerary {
    let days = request.days.clamp(1, MAX_TRIP_DAYS);
    let budget = request.budget;
    let daily_budget = budget / u64::from(days);
    let [morning, afternoon, evening] = activity_triad(&request.interest);
    let interest_title = title_case(&request.interest);

    let mut day_plans = Vec::with_capacity(days as usize);
    for day in 1..=days {
        let label = if day == 1 {
            "Arrival & Exploration".to_string()
        } else if day == days {
            "Departure".to_string()
        } else {
            format!("{} Adventure", interest_title)
        };

        day_plans.push(DayPlan {
            day,
            title: format!("Day {} - {}", day, label),
            activities: vec![
                format!("Morning: {}", morning),
                format!("Afternoon: {}", afternoon),
                format!("Evening: {}", evening),
            ],
            meals: vec![
                "Breakfast at hotel".to_string(),
                "Authentic local lunch".to_string(),
                "Dinner at popular restaurant".to_string(),
            ],
            accommodation: "Well-rated hotel in convenient location".to_string(),
            estimated_cost: daily_budget,
            tips: Some(format!(
                "Start early to make the most of your day in {}",
                request.destination
            )),
        });
    }

    Itinerary {
        id: Uuid::new_v4().to_string(),
        destination: request.destination.clone(),
        days,
        total_cost: budget,
        day_plans,
        travel_tips: vec![
            format!("Best time to visit {} varies by season", request.destination),
            "Keep some cash handy for local purchases".to_string(),
            "Respect local customs and dress codes".to_string(),
            "Stay hydrated and carry sunscreen".to_string(),
        ],
        cost_breakdown: fixed_split(budget),
    }
}

fn fixed_split(budget: u64) -> CostBreakdown {
    let share = |percent: u64| budget.saturating_mul(percent) / 100;
    CostBreakdown {
        accommodation: share(40),
        food: share(25),
        activities: share(20),
        transport: share(15),
    }
}

/// Templated reason used in place of a model explanation.
pub fn fallback_explanation(destination_name: &str, preferences: &UserPreferences) -> String {
    format!(
        "{} is perfect for your {}-day {} trip with a focus on {}. Great value within your {} budget.",
        destination_name,
        preferences.days,
        preferences.travel_type,
        preferences.interest,
        format_rupees(preferences.budget)
    )
}

/// Keyword-routed reply for when no model is configured.
pub fn fallback_chat_reply(message: &str) -> &'static str {
    match classify_chat_topic(message) {
        ChatTopic::Beach => "For beach destinations, I highly recommend Goa! It's perfect for a relaxing vacation with beautiful beaches, water sports, and vibrant nightlife. Best time to visit is October to March. Budget around ₹3,000-5,000 per day.",
        ChatTopic::Mountains => "Mountain lovers should definitely check out Manali or Ladakh! Perfect for trekking, paragliding, and stunning views. Best time is March to June. Budget around ₹2,500-4,000 per day.",
        ChatTopic::Heritage => "For heritage and culture, Jaipur is amazing! The Pink City offers magnificent forts, palaces, and rich Rajasthani culture. Best time is October to March. Budget around ₹2,800-4,500 per day.",
        ChatTopic::Budget => "For budget-friendly trips, consider Rishikesh (₹1,800/day) or Varanasi (₹2,000/day). Both offer incredible experiences without breaking the bank!",
        ChatTopic::Romantic => "For romantic getaways, Udaipur is magical! Known as the City of Lakes, it's perfect for couples. Kerala's backwaters are also incredibly romantic. Budget around ₹4,000-6,000 per day.",
        ChatTopic::General => "I'd love to help you plan your perfect trip! Tell me what kind of experience you're looking for - beaches, mountains, heritage, adventure, or something else? Also let me know your approximate budget and duration!",
    }
}

/// Up to three tips: two destination highlights from `candidates` (in order)
/// and one practical tip chosen by budget or duration.
pub fn rule_based_suggestions(
    context: &SuggestionContext,
    candidates: &[&DestinationRecord],
) -> Vec<String> {
    let trip_type = context
        .trip_type
        .as_deref()
        .map(|value| value.trim().to_lowercase())
        .unwrap_or_default();

    let mut suggestions = candidates
        .iter()
        .take(2)
        .map(|destination| destination_tip(&destination.name, &trip_type))
        .collect::<Vec<_>>();

    let budget = context.budget.as_deref().map(|v| v.trim().to_lowercase());
    let duration = context.duration.as_deref().map(|v| v.trim().to_lowercase());
    let practical = match (budget.as_deref(), duration.as_deref()) {
        (Some("budget"), _) => "💡 Travel tip: Local homestays significantly reduce costs",
        (Some("luxury"), _) => "✨ Luxury tip: Book private transfers for comfort",
        (_, Some("weekend")) => "⏰ Weekend tip: Start early to maximize your short trip",
        _ => "📅 Plan ahead: Book 2 months in advance for best deals",
    };
    suggestions.push(practical.to_string());

    suggestions.truncate(3);
    suggestions
}

fn destination_tip(name: &str, trip_type: &str) -> String {
    match trip_type {
        "adventure" => format!("🏔️ {}: Great for trekking & outdoor activities", name),
        "relaxation" => format!("🌴 {}: Perfect for unwinding and peace", name),
        "cultural" | "culture" => format!("🏛️ {}: Rich in history and local culture", name),
        "spiritual" => format!("🕉️ {}: Ideal for spiritual rejuvenation", name),
        "romantic" => format!("💑 {}: Romantic getaway with scenic views", name),
        "nightlife" | "party" => format!("🎉 {}: Vibrant nightlife and entertainment", name),
        _ => format!("✨ {}: A top recommendation for your trip", name),
    }
}

/// `60000` → `₹60,000`.
pub fn format_rupees(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("₹{}", grouped)
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
