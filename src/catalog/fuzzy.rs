//! Approximate title matching.

use rapidfuzz::fuzz;

/// Minimum score kept by the title fallback.
pub const FUZZY_THRESHOLD: f64 = 70.0;

/// Trim and upper-case before scoring.
pub fn normalize(text: &str) -> String {
    text.trim().to_uppercase()
}

/// Indel similarity of two strings, `2 * matches / (len_a + len_b)`, in
/// [0, 100] rounded to a whole number.
pub fn ratio(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    (fuzz::ratio(a.chars(), b.chars()) * 100.0).round()
}

/// Score every candidate against `query`, keeping those at or above `threshold`,
/// best first.
pub fn matches<'a, I>(query: &str, candidates: I, threshold: f64) -> Vec<(i64, f64)>
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    if normalize(query).is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(i64, f64)> = candidates
        .into_iter()
        .map(|(id, title)| (id, ratio(query, title)))
        .filter(|(_, score)| *score >= threshold)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}
