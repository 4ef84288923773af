//! Rule-based expansion of (display name, domain) into candidate addresses.

/// Keep only ASCII alphabetic characters, lowercased.
fn sanitize_name_part(part: &str) -> String {
    part.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase()
}

/// Generate the ordered list of plausible addresses for a lead at `domain`.
///
/// The first whitespace token is the first name and the last token the last
/// name; middle tokens are ignored. Exactly eight patterns are emitted in
/// fixed priority order, and the caller treats the first as the primary
/// address. Returns an empty vector when the name yields no usable parts.
pub fn generate_candidates(name: &str, domain: &str) -> Vec<String> {
    let parts: Vec<&str> = name.split_whitespace().collect();
    let first = sanitize_name_part(parts.first().unwrap_or(&""));
    let last = sanitize_name_part(parts.last().unwrap_or(&""));

    if first.is_empty() || last.is_empty() || domain.is_empty() {
        return Vec::new();
    }

    let fi = first.chars().next().unwrap_or_default();
    let li = last.chars().next().unwrap_or_default();

    vec![
        format!("{}.{}@{}", first, last, domain),
        format!("{}{}@{}", first, last, domain),
        format!("{}{}@{}", fi, last, domain),
        format!("{}@{}", first, domain),
        format!("{}_{}@{}", first, last, domain),
        format!("{}.{}@{}", fi, last, domain),
        format!("{}{}@{}", first, li, domain),
        format!("{}@{}", last, domain),
    ]
}
