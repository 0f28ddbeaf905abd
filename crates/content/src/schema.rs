//! Document types: declared frontmatter fields and computed fields.
//!
//! A [`DocumentType`] is plain data. Computed fields name a [`Resolver`]
//! whose inputs are declared up front, so a type can be checked for
//! consistency before any file is read.

use crate::document::{Date, FieldValue, Fields, ReadingTime, TocEntry};
use crate::error::{SchemaDeclarationError, SchemaValidationError};
use inkpost_render::Heading;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;

/// Words per minute used for reading time.
pub const WORDS_PER_MINUTE: usize = 200;

/// Type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Text.
    String,
    /// ISO-like date string.
    Date,
    /// `true` / `false`.
    Boolean,
    /// Integer or float.
    Number,
    /// List of strings.
    List,
}

/// A frontmatter field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Frontmatter key.
    pub name: String,
    /// Expected type.
    pub kind: FieldKind,
    /// Whether the field must be present.
    pub required: bool,
}

impl FieldDef {
    /// A field that must be present.
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// A field that may be absent.
    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// What a resolver reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverInput {
    /// Path relative to the content root.
    SourcePath,
    /// Body text after the frontmatter.
    RawBody,
    /// Headings of the rendered body.
    Headings,
    /// A field resolved earlier.
    Field(&'static str),
}

/// How a computed field is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolver {
    /// Source path without extension, `/index` collapsed.
    Slug,
    /// URL prefix joined with the slug.
    Url,
    /// Source path relative to the content root.
    FilePath,
    /// Word count based reading time.
    ReadingTime,
    /// Table of contents from the rendered headings.
    Toc,
}

impl Resolver {
    /// Inputs the resolver depends on.
    pub fn inputs(self) -> &'static [ResolverInput] {
        match self {
            Resolver::Slug | Resolver::FilePath => &[ResolverInput::SourcePath],
            Resolver::Url => &[ResolverInput::Field("slug")],
            Resolver::ReadingTime => &[ResolverInput::RawBody],
            Resolver::Toc => &[ResolverInput::Headings],
        }
    }
}

/// A computed field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedField {
    /// Output field name.
    pub name: String,
    /// Derivation.
    pub resolver: Resolver,
}

impl ComputedField {
    /// Declares a computed field.
    pub fn new(name: impl Into<String>, resolver: Resolver) -> Self {
        Self {
            name: name.into(),
            resolver,
        }
    }
}

/// Everything a document type needs to resolve one source file.
#[derive(Debug, Clone, Copy)]
pub struct RawDocument<'a> {
    /// Path relative to the content root, `/`-separated.
    pub path: &'a str,
    /// Frontmatter fields.
    pub frontmatter: &'a Map<String, JsonValue>,
    /// Body text after the frontmatter.
    pub raw_body: &'a str,
    /// Headings of the rendered body.
    pub headings: &'a [Heading],
}

/// A named document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentType {
    /// Type name, e.g. `Post`.
    pub name: String,
    /// Glob selecting the type's files, relative to the content root.
    pub file_pattern: String,
    /// Declared frontmatter fields.
    pub fields: Vec<FieldDef>,
    /// Computed fields, resolved in order.
    pub computed: Vec<ComputedField>,
    /// Prefix of document URLs.
    pub url_prefix: String,
}

impl DocumentType {
    /// The blog post type.
    pub fn post() -> Self {
        Self {
            name: "Post".to_string(),
            file_pattern: "**/*.mdx".to_string(),
            fields: vec![
                FieldDef::required("title", FieldKind::String),
                FieldDef::required("author", FieldKind::String),
                FieldDef::required("createdAt", FieldKind::Date),
                FieldDef::optional("updatedAt", FieldKind::Date),
                FieldDef::required("description", FieldKind::String),
                FieldDef::optional("category", FieldKind::String),
                FieldDef::optional("tags", FieldKind::List),
            ],
            computed: vec![
                ComputedField::new("slug", Resolver::Slug),
                ComputedField::new("url", Resolver::Url),
                ComputedField::new("filePath", Resolver::FilePath),
                ComputedField::new("readingTime", Resolver::ReadingTime),
                ComputedField::new("toc", Resolver::Toc),
            ],
            url_prefix: "/posts".to_string(),
        }
    }

    /// Replaces the file pattern.
    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    /// Replaces the URL prefix.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    fn declaration_error(&self, field: &str, reason: &str) -> SchemaDeclarationError {
        SchemaDeclarationError {
            document_type: self.name.clone(),
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Checks the declaration: unique names, a `slug` computed field, and
    /// computed inputs that refer to fields resolved earlier.
    pub fn validate(&self) -> Result<(), SchemaDeclarationError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for field in &self.fields {
            if !seen.insert(&field.name) {
                return Err(self.declaration_error(&field.name, "is declared twice"));
            }
        }

        for computed in &self.computed {
            for input in computed.resolver.inputs() {
                if let ResolverInput::Field(dependency) = input
                    && !seen.contains(dependency)
                {
                    return Err(self.declaration_error(
                        &computed.name,
                        &format!("depends on `{dependency}`, which is not resolved before it"),
                    ));
                }
            }
            if !seen.insert(&computed.name) {
                return Err(self.declaration_error(&computed.name, "is declared twice"));
            }
        }

        if !self
            .computed
            .iter()
            .any(|computed| computed.name == "slug" && computed.resolver == Resolver::Slug)
        {
            return Err(self.declaration_error("slug", "must be a computed field"));
        }
        Ok(())
    }

    /// Validates frontmatter against the declared fields and resolves the
    /// computed ones.
    ///
    /// Undeclared frontmatter keys are carried through as untyped values.
    pub fn resolve(&self, raw: &RawDocument<'_>) -> Result<Fields, SchemaValidationError> {
        let error = |field: &str, reason: String| SchemaValidationError {
            path: raw.path.to_string(),
            field: field.to_string(),
            reason,
        };
        let mut fields = Fields::new();

        for def in &self.fields {
            match raw.frontmatter.get(&def.name) {
                None | Some(JsonValue::Null) if def.required => {
                    return Err(error(&def.name, "is required".to_string()));
                }
                None | Some(JsonValue::Null) => {}
                Some(value) => {
                    let typed = typed_value(def.kind, value).map_err(|reason| error(&def.name, reason))?;
                    fields.insert(def.name.clone(), typed);
                }
            }
        }

        for (key, value) in raw.frontmatter {
            if fields.contains_key(key) || self.fields.iter().any(|def| &def.name == key) {
                continue;
            }
            if self.computed.iter().any(|computed| &computed.name == key) {
                log::debug!("{}: ignoring authored value for computed field `{key}`", raw.path);
                continue;
            }
            fields.insert(key.clone(), FieldValue::Json(value.clone()));
        }

        for computed in &self.computed {
            let value = match computed.resolver {
                Resolver::Slug => {
                    let slug = slug_from_path(raw.path);
                    if slug.is_empty() {
                        return Err(error(&computed.name, "resolves to an empty slug".to_string()));
                    }
                    FieldValue::String(slug)
                }
                Resolver::Url => {
                    let slug = fields
                        .get("slug")
                        .and_then(FieldValue::as_str)
                        .ok_or_else(|| error(&computed.name, "needs a slug".to_string()))?;
                    FieldValue::String(format!("{}/{slug}", self.url_prefix.trim_end_matches('/')))
                }
                Resolver::FilePath => FieldValue::String(raw.path.to_string()),
                Resolver::ReadingTime => FieldValue::ReadingTime(reading_time(raw.raw_body)),
                Resolver::Toc => FieldValue::Toc(toc(raw.headings)),
            };
            fields.insert(computed.name.clone(), value);
        }

        Ok(fields)
    }
}

fn typed_value(kind: FieldKind, value: &JsonValue) -> Result<FieldValue, String> {
    match (kind, value) {
        (FieldKind::String, JsonValue::String(text)) => Ok(FieldValue::String(text.clone())),
        (FieldKind::Date, JsonValue::String(text)) => Date::parse(text)
            .map(FieldValue::Date)
            .ok_or_else(|| format!("is not a valid date: `{text}`")),
        (FieldKind::Boolean, JsonValue::Bool(flag)) => Ok(FieldValue::Boolean(*flag)),
        (FieldKind::Number, JsonValue::Number(number)) => number
            .as_f64()
            .map(FieldValue::Number)
            .ok_or_else(|| format!("is out of range: {number}")),
        (FieldKind::List, JsonValue::Array(items)) => items
            .iter()
            .map(|item| match item {
                JsonValue::String(text) => Ok(text.clone()),
                other => Err(format!("must contain only strings, found {other}")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::List),
        (kind, other) => Err(format!("expected {}, found {other}", kind_name(kind))),
    }
}

fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "a string",
        FieldKind::Date => "a date string",
        FieldKind::Boolean => "a boolean",
        FieldKind::Number => "a number",
        FieldKind::List => "a list of strings",
    }
}

/// Slug of a source path: extension stripped, `/` separators, a trailing
/// `index` segment collapsed into its directory.
pub fn slug_from_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut segments: Vec<&str> = normalized
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if let Some(last) = segments.last_mut()
        && let Some((stem, _ext)) = last.rsplit_once('.')
        && !stem.is_empty()
    {
        *last = stem;
    }
    if segments.last() == Some(&"index") {
        segments.pop();
    }
    segments.join("/")
}

/// Reading time at [`WORDS_PER_MINUTE`], never below one minute.
pub fn reading_time(body: &str) -> ReadingTime {
    let words = body.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    let minutes = u32::try_from(minutes).unwrap_or(u32::MAX);
    ReadingTime {
        text: format!("{minutes} min read"),
        minutes,
        words,
    }
}

fn toc(headings: &[Heading]) -> Vec<TocEntry> {
    headings
        .iter()
        .filter_map(|heading| {
            let id = heading.id.as_ref()?;
            Some(TocEntry {
                value: heading.text.clone(),
                url: format!("#{id}"),
                depth: heading.depth,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frontmatter(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn complete() -> Map<String, JsonValue> {
        frontmatter(json!({
            "title": "Hello",
            "author": "Jane",
            "createdAt": "2024-02-03",
            "description": "First post",
            "tags": ["rust", "Web Dev"],
            "draft": true
        }))
    }

    fn resolve(path: &str, fm: &Map<String, JsonValue>) -> Result<Fields, SchemaValidationError> {
        let headings = vec![
            Heading {
                depth: 2,
                id: Some("intro".into()),
                text: "Intro".into(),
            },
            Heading {
                depth: 3,
                id: None,
                text: "Unanchored".into(),
            },
        ];
        DocumentType::post().resolve(&RawDocument {
            path,
            frontmatter: fm,
            raw_body: "one two three",
            headings: &headings,
        })
    }

    #[test]
    fn post_type_is_consistent() {
        assert_eq!(DocumentType::post().validate(), Ok(()));
    }

    #[test]
    fn declaration_errors() {
        let mut doc_type = DocumentType::post();
        doc_type.computed.swap(0, 1);
        let err = doc_type.validate().unwrap_err();
        assert_eq!(err.field, "url");

        let mut doc_type = DocumentType::post();
        doc_type.fields.push(FieldDef::optional("title", FieldKind::String));
        assert_eq!(doc_type.validate().unwrap_err().field, "title");

        let mut doc_type = DocumentType::post();
        doc_type.computed.retain(|c| c.resolver != Resolver::Slug && c.resolver != Resolver::Url);
        assert_eq!(doc_type.validate().unwrap_err().field, "slug");
    }

    #[test]
    fn resolves_declared_and_computed_fields() {
        let fields = resolve("2024/hello.mdx", &complete()).unwrap();
        assert_eq!(fields["title"], FieldValue::String("Hello".into()));
        assert_eq!(fields["slug"], FieldValue::String("2024/hello".into()));
        assert_eq!(fields["url"], FieldValue::String("/posts/2024/hello".into()));
        assert_eq!(fields["filePath"], FieldValue::String("2024/hello.mdx".into()));
        assert_eq!(fields["draft"], FieldValue::Json(json!(true)));
        assert_eq!(
            fields["tags"],
            FieldValue::List(vec!["rust".into(), "Web Dev".into()])
        );
        assert_eq!(
            fields["readingTime"],
            FieldValue::ReadingTime(ReadingTime {
                text: "1 min read".into(),
                minutes: 1,
                words: 3,
            })
        );
        assert_eq!(
            fields["toc"],
            FieldValue::Toc(vec![TocEntry {
                value: "Intro".into(),
                url: "#intro".into(),
                depth: 2,
            }])
        );
        assert!(!fields.contains_key("updatedAt"));
    }

    #[test]
    fn missing_required_field_names_file_and_field() {
        let mut fm = complete();
        fm.remove("author");
        let err = resolve("a.mdx", &fm).unwrap_err();
        assert_eq!(
            err,
            SchemaValidationError {
                path: "a.mdx".into(),
                field: "author".into(),
                reason: "is required".into(),
            }
        );
        assert_eq!(err.to_string(), "a.mdx: field `author` is required");
    }

    #[test]
    fn null_required_field_is_missing() {
        let mut fm = complete();
        fm.insert("title".into(), JsonValue::Null);
        assert_eq!(resolve("a.mdx", &fm).unwrap_err().field, "title");
    }

    #[test]
    fn type_mismatches_are_rejected() {
        let mut fm = complete();
        fm.insert("createdAt".into(), json!("yesterday"));
        let err = resolve("a.mdx", &fm).unwrap_err();
        assert_eq!(err.field, "createdAt");
        assert!(err.reason.contains("not a valid date"));

        let mut fm = complete();
        fm.insert("tags".into(), json!("rust"));
        assert_eq!(resolve("a.mdx", &fm).unwrap_err().field, "tags");

        let mut fm = complete();
        fm.insert("title".into(), json!(42));
        assert!(resolve("a.mdx", &fm).unwrap_err().reason.contains("expected a string"));
    }

    #[test]
    fn authored_computed_fields_are_ignored() {
        let mut fm = complete();
        fm.insert("slug".into(), json!("custom"));
        let fields = resolve("hello.mdx", &fm).unwrap();
        assert_eq!(fields["slug"], FieldValue::String("hello".into()));
    }

    #[test]
    fn slugs() {
        assert_eq!(slug_from_path("hello.mdx"), "hello");
        assert_eq!(slug_from_path("2024/hello.mdx"), "2024/hello");
        assert_eq!(slug_from_path("guides/index.mdx"), "guides");
        assert_eq!(slug_from_path("a\\b.md"), "a/b");
        assert_eq!(slug_from_path("v1.2/notes.mdx"), "v1.2/notes");
        assert_eq!(slug_from_path("index.mdx"), "");
    }

    #[test]
    fn root_index_has_no_slug() {
        let err = resolve("index.mdx", &complete()).unwrap_err();
        assert_eq!(err.field, "slug");
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time("").minutes, 1);
        let body = "word ".repeat(401);
        let time = reading_time(&body);
        assert_eq!(time.words, 401);
        assert_eq!(time.minutes, 3);
        assert_eq!(time.text, "3 min read");
    }
}
