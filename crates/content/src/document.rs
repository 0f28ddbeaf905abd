//! Typed documents and their field values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Resolved fields of a document, declared and computed alike.
pub type Fields = BTreeMap<String, FieldValue>;

/// A date field value. Keeps the authored text for output and the parsed
/// value for ordering. Equality and order look at the parsed value only.
#[derive(Debug, Clone)]
pub struct Date {
    value: NaiveDateTime,
    raw: String,
}

impl Date {
    /// Parses `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` or RFC 3339.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        let value = DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })?;
        Some(Self {
            value,
            raw: text.to_string(),
        })
    }

    /// The date as written in the frontmatter.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed value (UTC for offsets).
    pub fn value(&self) -> NaiveDateTime {
        self.value
    }
}

impl PartialEq for Date {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Date {}

impl PartialOrd for Date {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Date {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Estimated reading time of a document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingTime {
    /// Human readable form, e.g. `3 min read`.
    pub text: String,
    /// Whole minutes, at least one.
    pub minutes: u32,
    /// Word count.
    pub words: usize,
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Heading text.
    pub value: String,
    /// Fragment link, `#<id>`.
    pub url: String,
    /// Heading level.
    pub depth: u8,
}

/// Value of one document field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text.
    String(String),
    /// A parsed date.
    Date(Date),
    /// A flag.
    Boolean(bool),
    /// A number.
    Number(f64),
    /// A list of strings.
    List(Vec<String>),
    /// Computed reading time.
    ReadingTime(ReadingTime),
    /// Computed table of contents.
    Toc(Vec<TocEntry>),
    /// Undeclared frontmatter, passed through untyped.
    Json(JsonValue),
}

impl FieldValue {
    /// The string, if this is a string field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// The date, if this is a date field.
    pub fn as_date(&self) -> Option<&Date> {
        match self {
            FieldValue::Date(date) => Some(date),
            _ => None,
        }
    }

    /// The items, if this is a list field.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Body of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Body {
    /// Source text after the frontmatter block.
    pub raw: String,
    /// Rendered HTML.
    pub html: String,
}

/// One content entry with validated fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(flatten)]
    fields: Fields,
    body: Body,
}

impl Document {
    /// Assembles a document from resolved fields.
    pub fn new(fields: Fields, body: Body) -> Self {
        Self { fields, body }
    }

    /// Field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// All fields.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Raw and rendered body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// String field by name.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    /// Date field by name.
    pub fn date(&self, name: &str) -> Option<&Date> {
        self.get(name).and_then(FieldValue::as_date)
    }

    /// Unique slug.
    pub fn slug(&self) -> &str {
        self.str_field("slug").unwrap_or_default()
    }

    /// Public URL.
    pub fn url(&self) -> &str {
        self.str_field("url").unwrap_or_default()
    }

    /// Source path relative to the content root.
    pub fn file_path(&self) -> &str {
        self.str_field("filePath").unwrap_or_default()
    }

    /// Title, when declared.
    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    /// Tags, empty when absent.
    pub fn tags(&self) -> &[String] {
        self.get("tags").and_then(FieldValue::as_list).unwrap_or_default()
    }

    /// Computed reading time.
    pub fn reading_time(&self) -> Option<&ReadingTime> {
        match self.get("readingTime") {
            Some(FieldValue::ReadingTime(time)) => Some(time),
            _ => None,
        }
    }

    /// Computed table of contents.
    pub fn toc(&self) -> &[TocEntry] {
        match self.get("toc") {
            Some(FieldValue::Toc(entries)) => entries,
            _ => &[],
        }
    }
}
