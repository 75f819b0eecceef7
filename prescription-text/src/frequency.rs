//! Medical frequency shorthand expansion (BID, q8h, "twice daily", ...).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Lowercase shorthand and its plain-language expansion.
const FREQUENCY_TERMS: &[(&str, &str)] = &[
    ("bid", "2 times per day"),
    ("tid", "3 times per day"),
    ("qid", "4 times per day"),
    ("qd", "1 time per day"),
    ("qod", "Every other day"),
    ("prn", "As needed"),
    ("ac", "Before meals"),
    ("pc", "After meals"),
    ("hs", "At bedtime"),
    ("q4h", "Every 4 hours"),
    ("q6h", "Every 6 hours"),
    ("q8h", "Every 8 hours"),
    ("q12h", "Every 12 hours"),
    ("qam", "Every morning"),
    ("qpm", "Every evening"),
    ("stat", "Immediately"),
    ("b.i.d", "2 times per day"),
    ("t.i.d", "3 times per day"),
    ("q.i.d", "4 times per day"),
    ("q.d", "1 time per day"),
    ("q.o.d", "Every other day"),
    ("p.r.n", "As needed"),
    ("a.c", "Before meals"),
    ("p.c", "After meals"),
    ("h.s", "At bedtime"),
    ("1x daily", "1 time per day"),
    ("2x daily", "2 times per day"),
    ("3x daily", "3 times per day"),
    ("4x daily", "4 times per day"),
    ("once daily", "1 time per day"),
    ("twice daily", "2 times per day"),
    ("three times daily", "3 times per day"),
    ("four times daily", "4 times per day"),
    ("once a day", "1 time per day"),
    ("twice a day", "2 times per day"),
    ("three times a day", "3 times per day"),
    ("four times a day", "4 times per day"),
];

static EXPANSIONS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| FREQUENCY_TERMS.iter().copied().collect());

// Longest key first so "q.o.d" wins over "q.d" and "q12h" never loses to a shorter prefix.
static TERM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let mut keys: Vec<&str> = FREQUENCY_TERMS.iter().map(|(key, _)| *key).collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = keys
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("frequency pattern")
});

/// Expansion for a single shorthand term, case-insensitive.
pub fn lookup(term: &str) -> Option<&'static str> {
    EXPANSIONS.get(term.trim().to_lowercase().as_str()).copied()
}

/// Translate frequency shorthand into plain language.
///
/// A string that is exactly one known term returns its expansion. Otherwise every
/// whole-word occurrence of a known term is replaced in place; unknown text passes
/// through untouched.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    if let Some(expansion) = lookup(text) {
        return expansion.to_string();
    }

    TERM_PATTERN
        .replace_all(text, |caps: &Captures| match lookup(&caps[0]) {
            Some(expansion) => expansion.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// [`normalize`] lifted over an optional value; absence stays absent.
pub fn normalize_opt(text: Option<&str>) -> Option<String> {
    text.map(normalize)
}
