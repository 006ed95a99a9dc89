use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTopic {
    Beach,
    Mountains,
    Heritage,
    Budget,
    Romantic,
    General,
}

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Cuts `input` to at most `max_graphemes` user-perceived characters.
pub fn truncate_graphemes(input: &str, max_graphemes: usize) -> String {
    input.graphemes(true).take(max_graphemes).collect()
}

/// First matching rule wins, in the order listed.
pub fn classify_chat_topic(text: &str) -> ChatTopic {
    let lower = text.to_lowercase();

    if contains_any(&lower, &["beach", "goa", "sea", "ocean"]) {
        return ChatTopic::Beach;
    }

    if contains_any(
        &lower,
        &["mountain", "manali", "hill", "trek", "himalaya"],
    ) {
        return ChatTopic::Mountains;
    }

    if contains_any(
        &lower,
        &["heritage", "jaipur", "culture", "history", "palace"],
    ) {
        return ChatTopic::Heritage;
    }

    if contains_any(&lower, &["budget", "cheap", "affordable"]) {
        return ChatTopic::Budget;
    }

    if contains_any(&lower, &["romantic", "honeymoon", "couple"]) {
        return ChatTopic::Romantic;
    }

    ChatTopic::General
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
