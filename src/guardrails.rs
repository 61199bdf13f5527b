//! Query validation and content-safety keyword filtering.

pub const MIN_QUESTION_CHARS: usize = 3;
pub const MAX_QUESTION_CHARS: usize = 1000;
pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 20;

/// Topics the answer generator refuses to engage with.
const HARMFUL_PATTERNS: &[&str] = &[
    "nuclear weapon",
    "bomb",
    "explosive",
    "weapon",
    "hack",
    "cyber attack",
    "illegal",
    "criminal",
    "harmful",
    "dangerous",
    "toxic",
    "poison",
    "kill",
    "murder",
    "suicide",
    "terrorism",
    "drugs",
    "weapons",
];

/// Validate the query boundary inputs. Returns a client-facing message on
/// violation; malformed input is rejected here, never silently coerced.
pub fn validate_query(question: &str, top_k: usize) -> Result<(), String> {
    let len = question.chars().count();
    if len < MIN_QUESTION_CHARS {
        return Err(format!(
            "Question must be at least {MIN_QUESTION_CHARS} characters"
        ));
    }
    if len > MAX_QUESTION_CHARS {
        return Err(format!(
            "Question must be at most {MAX_QUESTION_CHARS} characters"
        ));
    }
    if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
        return Err(format!(
            "top_k must be between {MIN_TOP_K} and {MAX_TOP_K}"
        ));
    }
    Ok(())
}

/// Returns true if the text is free of harmful-topic keywords.
pub fn check_content_safety(text: &str) -> bool {
    let lower = text.to_lowercase();
    !HARMFUL_PATTERNS.iter().any(|p| lower.contains(p))
}
