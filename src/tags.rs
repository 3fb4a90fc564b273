//! Tags travel as lists and are stored as one comma-separated column.

const SEPARATOR: &str = ", ";

/// Splits a stored category column into its tags.
pub fn parse(raw: Option<&str>) -> Vec<String> {
    normalize(raw.unwrap_or_default().split(','))
}

/// Trims, drops empties and removes duplicates while keeping first-seen order.
pub fn normalize<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.as_ref().trim();
        if trimmed.is_empty() || out.iter().any(|existing| existing == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}

/// Column value for a tag list; `None` when there are no tags.
pub fn join(tags: &[String]) -> Option<String> {
    let tags = normalize(tags);
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(SEPARATOR))
    }
}
