pub mod error;
pub mod fallback;
pub mod models;
pub mod prompts;
pub mod sanitize;
pub mod schema;
pub mod scoring;
pub mod suggest;
pub mod topic;

pub use error::{GenerationFault, PlanningError, SchemaError};
pub use fallback::{
    fallback_chat_reply, fallback_explanation, rule_based_suggestions, synthesize_itinerary,
    CHAT_FAILURE_REPLY, EMPTY_CONTEXT_SUGGESTION,
};
pub use models::*;
pub use sanitize::sanitize_response;
pub use schema::{parse_itinerary, validate_itinerary};
pub use scoring::score_destinations;
pub use suggest::{allowed_destinations, parse_suggestions, prompt_destination_names};
pub use topic::{classify_chat_topic, normalize_text, truncate_graphemes, ChatTopic};
