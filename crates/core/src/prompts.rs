//! Prompt text sent to the completion provider.

use crate::fallback::format_rupees;
use crate::models::{ItineraryRequest, UserPreferences, MAX_CHAT_MESSAGE_CHARS};
use crate::topic::{normalize_text, truncate_graphemes};

pub const EXPLANATION_SYSTEM: &str =
    "You are a friendly travel expert. Give concise, practical recommendations.";

pub const ITINERARY_SYSTEM: &str = "You are a professional travel planner. Generate realistic, budget-aware itineraries. Return ONLY valid JSON, no markdown.";

pub const CHAT_SYSTEM: &str = "You are TripIT, a friendly and knowledgeable AI travel assistant for Indian destinations.

Your role:
- Help users discover destinations in India
- Provide practical travel tips and recommendations
- Suggest budget estimates in Indian Rupees (₹)
- Be concise but helpful (2-3 sentences max per response)
- Be enthusiastic about travel!

Popular destinations you know well:
- Goa (beaches, nightlife)
- Manali (mountains, adventure)
- Jaipur (heritage, culture)
- Kerala (backwaters, nature)
- Rishikesh (adventure, spiritual)
- Ladakh (mountains, offbeat)
- Udaipur (romantic, lakes)
- Varanasi (spiritual, heritage)

Always encourage users to try the Trip Planner feature for personalized itineraries!";

pub const SUGGESTIONS_SYSTEM: &str = "You are an experienced Indian travel planner with 10+ years of expertise.
You give ONLY realistic, practical advice based on actual destinations, real costs, and genuine travel insights.
Never make up destinations or unrealistic prices. Return ONLY a valid JSON array of strings.";

const ITINERARY_SHAPE: &str = r#"{
  "day_plans": [
    {
      "day": 1,
      "title": "Day title",
      "activities": ["Activity 1", "Activity 2", "Activity 3"],
      "meals": ["Breakfast suggestion", "Lunch suggestion", "Dinner suggestion"],
      "accommodation": "Hotel recommendation",
      "estimated_cost": 5000,
      "tips": "Helpful tip for this day"
    }
  ],
  "travel_tips": ["Tip 1", "Tip 2", "Tip 3"],
  "cost_breakdown": {
    "accommodation": 10000,
    "food": 8000,
    "activities": 5000,
    "transport": 3000
  }
}"#;

const ANY_DESTINATION: &str = "Any popular destination";

pub fn explanation_prompt(destination_name: &str, preferences: &UserPreferences) -> String {
    format!(
        "Explain why {} is suitable for a {}-day {} trip\nwith a budget of {} and interest in {}.\nKeep it concise (2-3 sentences max) and practical. Focus on unique experiences.",
        destination_name,
        preferences.days,
        preferences.travel_type,
        format_rupees(preferences.budget),
        preferences.interest
    )
}

pub fn itinerary_prompt(request: &ItineraryRequest) -> String {
    format!(
        "Create a realistic {}-day travel itinerary for {}.\nBudget: {} total for {} travelers\nTravel style: {}\nMain interest: {}\n\nReturn ONLY valid JSON in this exact format (no markdown, no explanation):\n{}",
        request.days,
        request.destination,
        format_rupees(request.budget),
        request.travelers,
        request.travel_type,
        request.interest,
        ITINERARY_SHAPE
    )
}

pub fn chat_prompt(message: &str) -> String {
    truncate_graphemes(&normalize_text(message), MAX_CHAT_MESSAGE_CHARS)
}

/// `described` is the comma-joined preference summary; `allowed` the
/// destination names the model may mention.
pub fn suggestions_prompt(described: &str, allowed: &[String]) -> String {
    let allowed = if allowed.is_empty() {
        ANY_DESTINATION.to_string()
    } else {
        allowed.join(", ")
    };

    format!(
        "User's travel preferences: {described}
ALLOWED DESTINATIONS: {allowed}

Generate exactly 2-3 PRACTICAL travel suggestions. Follow these rules strictly:

1. RECOMMEND ONLY DESTINATIONS FROM THE ALLOWED LIST ABOVE. Do not hallucinate.
2. Include SPECIFIC actionable advice like:
   - Best time to visit (months)
   - Estimated daily budget in INR (₹2000-5000/day for budget, ₹5000-10000 for moderate, ₹10000+ for luxury)
   - Must-do activities at that destination
   - Booking tips (book X days in advance, etc.)
3. Keep each tip under 20 words
4. Start each with a relevant emoji
5. Be REALISTIC about costs and timing

Return ONLY a JSON array of strings. Example:
[\"🏔️ Manali in May-June: Perfect for paragliding, budget ₹3000/day\", \"💡 Book hotels 2 weeks ahead for 30% savings\"]"
    )
}
