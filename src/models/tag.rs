//! Machine-readable tags derived from titles.
//!
//! Tags are views over mutable state: reordering changes the number, renaming changes the
//! title, and either changes the tag. Never keep one across a mutation without deriving
//! it again.

/// Characters removed from titles when deriving a tag.
const STRIPPED: &[char] = &['!', '.', '\'', '"', ','];

/// Lowercase `text`, replace spaces with underscores and drop punctuation.
pub fn machine_str(text: &str) -> String {
    text.chars()
        .filter(|c| !STRIPPED.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Tag for a numbered entity: `"{number}"` when untitled, else `"{number}__{title}"`.
pub fn derive_tag(number: u32, title: Option<&str>) -> String {
    match title.filter(|t| !t.is_empty()) {
        Some(title) => format!("{}__{}", number, machine_str(title)),
        None => number.to_string(),
    }
}

/// Leading decimal number of a tag, e.g. `12` for `"12__the_storm"`.
pub fn tag_number(tag: &str) -> Option<u32> {
    let digits: &str = &tag[..tag
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(tag.len())];
    digits.parse().ok()
}
