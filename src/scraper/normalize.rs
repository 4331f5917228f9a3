// normalize.rs
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn price_in_text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d[\d\s]{3,})\s*€").expect("static price pattern"))
}

/// Strips everything but ASCII digits. `"599 000 €"` becomes `"599000"`.
pub fn price_to_digits(value: &str) -> Option<String> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Finds the first euro-suffixed amount like `1 350 000 €` in free text.
pub fn price_from_text(text: &str) -> Option<String> {
    let text = text.replace('\u{a0}', " ");
    let caps = price_in_text_re().captures(&text)?;
    price_to_digits(caps.get(1)?.as_str())
}

/// Accepts both `120.5` and `120,5`.
pub fn surface_to_float(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn digits_to_price(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Undoes the markup noise found on scraped URLs: HTML-escaped ampersands and
/// trailing backslashes left over from JSON string escapes.
pub fn normalize_url(raw: &str) -> String {
    raw.replace("&amp;", "&").trim_end_matches('\\').to_string()
}

/// Deduplicates while keeping first-seen order.
pub fn unique<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Trims and drops empty strings.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
