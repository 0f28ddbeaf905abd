//! `[@key]` citations resolved against a CSL-JSON bibliography.
//!
//! Each citation group becomes an author–year link to its entry, and a
//! references list is appended to the document for every cited entry in
//! order of first citation.

use crate::error::{PipelineConfigError, TransformStageError};
use crate::hast::{Element, Node, normalize_text};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Stage name used in configuration and errors.
pub const NAME: &str = "citation";

/// Options for the citation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationOptions {
    /// CSL-JSON bibliography file.
    pub bibliography_path: PathBuf,
}

static CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(@[\w:.#$%&+?<>~/-]+(?:\s*;\s*@[\w:.#$%&+?<>~/-]+)*)\]")
        .expect("citation pattern is valid")
});

#[derive(Debug, Deserialize)]
struct CslItem {
    id: String,
    #[serde(default)]
    author: Vec<CslName>,
    #[serde(default)]
    issued: Option<CslDate>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "container-title")]
    container_title: Option<String>,
    #[serde(default, rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CslName {
    family: Option<String>,
    given: Option<String>,
    literal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CslDate {
    #[serde(default, rename = "date-parts")]
    date_parts: Vec<Vec<serde_json::Value>>,
}

/// One bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Citation key.
    pub id: String,
    /// Author names, family name first.
    pub authors: Vec<Author>,
    /// Publication year.
    pub year: Option<String>,
    /// Work title.
    pub title: Option<String>,
    /// Journal, book or site.
    pub container: Option<String>,
    /// Link to the work.
    pub url: Option<String>,
}

/// An author of a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Family name (or the literal name for organisations).
    pub family: String,
    /// Given names.
    pub given: Option<String>,
}

/// A loaded bibliography.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bibliography {
    entries: HashMap<String, Reference>,
}

impl Bibliography {
    /// Reads a CSL-JSON array from disk.
    pub fn load(path: &Path) -> Result<Self, PipelineConfigError> {
        let failed = |reason: String| PipelineConfigError::Bibliography {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|err| failed(err.to_string()))?;
        Self::from_json(&text).map_err(|err| failed(err.to_string()))
    }

    /// Parses a CSL-JSON array.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<CslItem> = serde_json::from_str(json)?;
        let entries = items
            .into_iter()
            .map(|item| (item.id.clone(), Reference::from(item)))
            .collect();
        Ok(Self { entries })
    }

    /// Looks up an entry by key.
    pub fn get(&self, key: &str) -> Option<&Reference> {
        self.entries.get(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bibliography has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<CslItem> for Reference {
    fn from(item: CslItem) -> Self {
        let authors = item
            .author
            .into_iter()
            .filter_map(|name| match (name.family, name.literal) {
                (Some(family), _) => Some(Author {
                    family,
                    given: name.given,
                }),
                (None, Some(literal)) => Some(Author {
                    family: literal,
                    given: None,
                }),
                (None, None) => None,
            })
            .collect();
        let year = item
            .issued
            .and_then(|date| date.date_parts.into_iter().next())
            .and_then(|parts| parts.into_iter().next())
            .and_then(|year| match year {
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::String(s) => Some(s),
                _ => None,
            });
        Self {
            id: item.id,
            authors,
            year,
            title: item.title,
            container: item.container_title,
            url: item.url,
        }
    }
}

impl Reference {
    /// Short in-text label, e.g. `Doe & Roe, 2020` or `Doe et al., n.d.`.
    pub fn label(&self) -> String {
        let names = match self.authors.as_slice() {
            [] => self.title.clone().unwrap_or_else(|| self.id.clone()),
            [one] => one.family.clone(),
            [a, b] => format!("{} & {}", a.family, b.family),
            [first, ..] => format!("{} et al.", first.family),
        };
        format!("{names}, {}", self.year.as_deref().unwrap_or("n.d."))
    }

    fn entry_text(&self) -> String {
        let authors = self
            .authors
            .iter()
            .map(|author| match &author.given {
                Some(given) => format!("{}, {}", author.family, initials(given)),
                None => author.family.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let mut text = if authors.is_empty() {
            String::new()
        } else {
            format!("{authors} ")
        };
        text.push_str(&format!("({}).", self.year.as_deref().unwrap_or("n.d.")));
        if let Some(title) = &self.title {
            text.push_str(&format!(" {title}."));
        }
        text
    }
}

fn initials(given: &str) -> String {
    given
        .split_whitespace()
        .filter_map(|part| part.chars().next())
        .map(|c| format!("{c}."))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Anchor id of a bibliography entry.
pub fn reference_id(key: &str) -> String {
    format!("ref-{key}")
}

/// Resolves citations in the tree and appends the references section.
pub fn apply(nodes: &mut Vec<Node>, bibliography: &Bibliography) -> Result<(), TransformStageError> {
    normalize_text(nodes);
    let mut cited = Vec::new();
    cite_in(nodes, bibliography, &mut cited)?;
    if !cited.is_empty() {
        nodes.push(references_section(&cited, bibliography));
    }
    Ok(())
}

fn cite_in(
    nodes: &mut Vec<Node>,
    bibliography: &Bibliography,
    cited: &mut Vec<String>,
) -> Result<(), TransformStageError> {
    let mut idx = 0;
    while idx < nodes.len() {
        match &mut nodes[idx] {
            Node::Text(text) if CITATION.is_match(text) => {
                let replacement = split_citations(text, bibliography, cited)?;
                let count = replacement.len();
                nodes.splice(idx..=idx, replacement);
                idx += count;
                continue;
            }
            Node::Element(el) if !(el.is("code") || el.is("pre") || el.is("a")) => {
                cite_in(&mut el.children, bibliography, cited)?;
            }
            _ => {}
        }
        idx += 1;
    }
    Ok(())
}

fn split_citations(
    text: &str,
    bibliography: &Bibliography,
    cited: &mut Vec<String>,
) -> Result<Vec<Node>, TransformStageError> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in CITATION.captures_iter(text) {
        let (Some(whole), Some(keys)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Node::text(&text[last..whole.start()]));
        }

        let mut children = vec![Node::text("(")];
        for (n, key) in keys.as_str().split(';').enumerate() {
            let key = key.trim().trim_start_matches('@');
            let Some(reference) = bibliography.get(key) else {
                return Err(TransformStageError::new(
                    NAME,
                    format!("unknown citation key `{key}`"),
                ));
            };
            if !cited.iter().any(|seen| seen == key) {
                cited.push(key.to_string());
            }
            if n > 0 {
                children.push(Node::text("; "));
            }
            children.push(
                Element::new("a")
                    .with_attr("href", format!("#{}", reference_id(key)))
                    .with_text(reference.label())
                    .into(),
            );
        }
        children.push(Node::text(")"));
        out.push(
            Element::new("span")
                .with_attr("class", "citation")
                .with_children(children)
                .into(),
        );
        last = whole.end();
    }
    if last < text.len() {
        out.push(Node::text(&text[last..]));
    }
    Ok(out)
}

fn references_section(cited: &[String], bibliography: &Bibliography) -> Node {
    let items = cited
        .iter()
        .filter_map(|key| bibliography.get(key))
        .map(|reference| {
            let mut children = vec![Node::Text(reference.entry_text())];
            if let Some(container) = &reference.container {
                children.push(Node::text(" "));
                children.push(Element::new("em").with_text(container).into());
                children.push(Node::text("."));
            }
            if let Some(url) = &reference.url {
                children.push(Node::text(" "));
                children.push(Element::new("a").with_attr("href", url).with_text(url).into());
            }
            Element::new("li")
                .with_attr("id", reference_id(&reference.id))
                .with_children(children)
                .into()
        })
        .collect();

    Element::new("section")
        .with_attr("class", "references")
        .with_children(vec![
            Element::new("h2")
                .with_attr("id", "references")
                .with_text("References")
                .into(),
            Element::new("ol").with_children(items).into(),
        ])
        .into()
}
