use std::collections::{HashMap, HashSet};

/// Extracts a `{#custom-id}` suffix from heading text.
///
/// If the text ends with `{#some-id}` (where the id contains ASCII alphanumerics,
/// hyphens, or underscores), returns the trimmed text without the suffix and `Some(id)`.
/// Otherwise returns the original text and `None`.
///
/// # Examples
///
/// ```
/// use inkpost_core::slug::extract_custom_id;
///
/// let (text, id) = extract_custom_id("My Heading {#my-heading}");
/// assert_eq!(text, "My Heading");
/// assert_eq!(id, Some("my-heading"));
/// ```
pub fn extract_custom_id(text: &str) -> (&str, Option<&str>) {
    let trimmed = text.trim_end();
    let Some(inner) = trimmed.strip_suffix('}') else {
        return (text, None);
    };
    let Some(open) = inner.rfind("{#") else {
        return (text, None);
    };

    let id = &inner[open + 2..];
    if !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return (inner[..open].trim_end(), Some(id));
    }

    (text, None)
}

/// Turns heading text into an anchor id without deduplication.
///
/// Letters and digits (Unicode included) are lower-cased and kept; every run of
/// other characters becomes a single `-`; leading and trailing hyphens are
/// trimmed. Text with nothing usable yields `heading`.
pub fn anchor_base(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else if is_combining_mark(ch) && !slug.is_empty() {
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("heading");
    }
    slug
}

/// Per-document anchor id generator.
///
/// The first occurrence of a base id is returned as-is; repeats get `-1`,
/// `-2`, … appended. Generated ids never collide with reserved ones or with
/// ids produced earlier for different text.
#[derive(Debug, Default)]
pub struct Slugger {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl Slugger {
    /// Creates a new slugger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the next unique id for the given heading text.
    pub fn next_slug(&mut self, text: &str) -> String {
        let base = anchor_base(text);
        let mut suffix = self.next_suffix.get(&base).copied().unwrap_or(0);
        loop {
            let candidate = if suffix == 0 {
                base.clone()
            } else {
                format!("{base}-{suffix}")
            };
            suffix += 1;
            if self.taken.insert(candidate.clone()) {
                self.next_suffix.insert(base, suffix);
                return candidate;
            }
        }
    }

    /// Reserves an explicit id so later generated ids avoid it.
    ///
    /// Returns false when the id was already taken in this document.
    pub fn reserve(&mut self, slug: &str) -> bool {
        self.taken.insert(slug.to_string())
    }
}

/// Returns true if the character is a Unicode combining mark commonly used by
/// Indic, Arabic, Hebrew and Thai scripts, or a generic diacritic.
fn is_combining_mark(ch: char) -> bool {
    use std::ops::RangeInclusive;

    const RANGES: &[RangeInclusive<u32>] = &[
        0x0300..=0x036F,
        0x0591..=0x05C7,
        0x0610..=0x061A,
        0x064B..=0x065F,
        0x0670..=0x0670,
        0x0900..=0x0903,
        0x093A..=0x094F,
        0x0951..=0x0957,
        0x0962..=0x0963,
        0x0980..=0x0983,
        0x09BC..=0x09CD,
        0x0E31..=0x0E3A,
        0x0E47..=0x0E4E,
        0x1AB0..=0x1AFF,
        0x1DC0..=0x1DFF,
        0xFE20..=0xFE2F,
    ];

    let cp = ch as u32;
    RANGES.iter().any(|r| r.contains(&cp))
}
