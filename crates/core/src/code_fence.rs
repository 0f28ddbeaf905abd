//! Code fence info-string parsing.
//!
//! A fence such as ```` ```rust:src/main.rs {1,3} ```` reaches the tree as
//! `lang = "rust:src/main.rs"` and `meta = "{1,3}"`. This module splits the
//! language from an optional file title.

/// Parsed fenced-code info string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeInfo {
    /// Language tag with any `:title` suffix removed, lower-cased.
    pub language: Option<String>,
    /// Title taken from `lang:title` or a `title="…"` meta attribute.
    pub title: Option<String>,
    /// Remaining meta string, if any.
    pub meta: Option<String>,
}

impl CodeInfo {
    /// Parse the `lang` and `meta` fields of a fenced code node.
    pub fn parse(lang: Option<&str>, meta: Option<&str>) -> Self {
        let mut info = CodeInfo::default();

        if let Some(lang) = lang.map(str::trim).filter(|l| !l.is_empty()) {
            match lang.split_once(':') {
                Some((language, title)) => {
                    info.language = non_empty(language).map(str::to_ascii_lowercase);
                    info.title = non_empty(title).map(str::to_string);
                }
                None => info.language = Some(lang.to_ascii_lowercase()),
            }
        }

        if let Some(meta) = meta.map(str::trim).filter(|m| !m.is_empty()) {
            let (title, rest) = take_title_attr(meta);
            if info.title.is_none() {
                info.title = title;
            }
            info.meta = non_empty(&rest).map(str::to_string);
        }

        info
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Removes a `title="…"` (or `title='…'`) attribute from a meta string.
fn take_title_attr(meta: &str) -> (Option<String>, String) {
    let Some(start) = meta.find("title=") else {
        return (None, meta.to_string());
    };
    let after = &meta[start + "title=".len()..];
    let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return (None, meta.to_string());
    };
    let Some(len) = after[1..].find(quote) else {
        return (None, meta.to_string());
    };

    let title = after[1..1 + len].to_string();
    let rest = format!("{}{}", &meta[..start], &after[len + 2..]);
    (Some(title), rest.split_whitespace().collect::<Vec<_>>().join(" "))
}
