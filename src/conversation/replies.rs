//! Recognition of short control replies ("yes", "no", "start over").
//!
//! Only whole-message matches count. Anything longer, such as "no, it starts
//! at nine", is a restatement and goes through extraction.

const AFFIRMATIVE: &[&str] = &[
    "yes", "y", "yep", "yeah", "yup", "sure", "ok", "okay", "correct", "confirm", "confirmed",
    "publish", "publish it", "post it", "looks good", "looks great", "that's right",
    "thats right", "perfect", "go ahead", "do it", "si", "sí",
];

const NEGATIVE: &[&str] = &[
    "no", "n", "nope", "nah", "not quite", "wait", "not yet", "incorrect", "wrong",
    "that's wrong", "thats wrong",
];

const ABANDON: &[&str] = &[
    "cancel", "start over", "never mind", "nevermind", "forget it", "discard", "abandon",
    "scrap it", "reset",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortReply {
    Affirmative,
    Negative,
    Abandon,
    Other,
}

pub fn classify(text: &str) -> ShortReply {
    let normalized = normalize(text);
    let phrase = normalized.as_str();

    if ABANDON.contains(&phrase) {
        ShortReply::Abandon
    } else if AFFIRMATIVE.contains(&phrase) {
        ShortReply::Affirmative
    } else if NEGATIVE.contains(&phrase) {
        ShortReply::Negative
    } else {
        ShortReply::Other
    }
}

fn normalize(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| matches!(c, '!' | '.' | '?' | ',' | '¡' | '¿'))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
