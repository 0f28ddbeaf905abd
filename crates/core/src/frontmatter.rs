use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// A source document split into its YAML metadata and Markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter<'a> {
    /// Top-level frontmatter keys, converted to JSON values.
    pub fields: Map<String, JsonValue>,
    /// Markdown content following the closing fence.
    pub body: &'a str,
    /// Number of source lines that precede `body`.
    pub body_line_offset: usize,
}

impl<'a> Frontmatter<'a> {
    fn absent(body: &'a str) -> Self {
        Self {
            fields: Map::new(),
            body,
            body_line_offset: 0,
        }
    }

    /// Whether the document carried a metadata block at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Errors emitted while splitting or parsing frontmatter.
#[derive(Debug, Error, PartialEq)]
pub enum FrontmatterError {
    /// Opening `---` without a closing fence.
    #[error("unterminated YAML frontmatter block opened on line {0}: expected closing '---'")]
    Unterminated(usize),
    /// YAML failed to parse.
    #[error("frontmatter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
}

/// Splits a leading `---` YAML block off `input`.
///
/// A byte-order mark and blank lines before the opening fence are skipped.
/// Documents whose first non-blank line is not a fence have no frontmatter and
/// are returned unchanged as the body.
pub fn split_frontmatter(input: &str) -> Result<Frontmatter<'_>, FrontmatterError> {
    let text = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut lines = LineCursor::new(text);

    let opening = loop {
        match lines.next() {
            Some(line) if line.text.trim().is_empty() => continue,
            Some(line) if is_fence(line.text) => break line,
            _ => return Ok(Frontmatter::absent(input)),
        }
    };

    let block_start = opening.end;
    for line in lines.by_ref() {
        if is_fence(line.text) {
            let block = &text[block_start..line.start];
            let fields = parse_block(block)?;
            let body = &text[line.end..];
            return Ok(Frontmatter {
                fields,
                body,
                body_line_offset: line.number,
            });
        }
    }

    Err(FrontmatterError::Unterminated(opening.number))
}

fn parse_block(block: &str) -> Result<Map<String, JsonValue>, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(Map::new());
    }

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    let json =
        serde_json::to_value(yaml).map_err(|err| FrontmatterError::Parse(err.to_string()))?;

    match json {
        JsonValue::Null => Ok(Map::new()),
        JsonValue::Object(fields) => Ok(fields),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches('\r').trim_end() == "---"
}

struct Line<'a> {
    text: &'a str,
    start: usize,
    end: usize,
    /// 1-indexed line number.
    number: usize,
}

struct LineCursor<'a> {
    text: &'a str,
    pos: usize,
    number: usize,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            number: 0,
        }
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.pos >= self.text.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.text[start..];
        let (text, end) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], start + idx + 1),
            None => (rest, self.text.len()),
        };
        self.pos = end;
        self.number += 1;
        Some(Line {
            text,
            start,
            end,
            number: self.number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(input: &str) -> Frontmatter<'_> {
        split_frontmatter(input).expect("frontmatter split should succeed")
    }

    #[test]
    fn no_block_returns_whole_input() {
        let result = split("# Title\nBody");
        assert!(result.is_empty());
        assert_eq!(result.body, "# Title\nBody");
        assert_eq!(result.body_line_offset, 0);
    }

    #[test]
    fn parses_post_metadata() {
        let input = "---\ntitle: Example\ncreatedAt: 2023-04-01\ntags:\n  - rust\n---\n# Content\n";
        let result = split(input);
        assert_eq!(result.fields["title"], "Example");
        assert_eq!(result.fields["createdAt"], "2023-04-01");
        assert_eq!(result.fields["tags"][0], "rust");
        assert_eq!(result.body, "# Content\n");
        assert_eq!(result.body_line_offset, 6);
    }

    #[test]
    fn empty_block_is_empty_map() {
        let result = split("---\n---\n# Body");
        assert!(result.is_empty());
        assert_eq!(result.body, "# Body");
    }

    #[test]
    fn skips_bom_blank_lines_and_crlf() {
        let result = split("\u{feff}\n  \n---\r\nfoo: bar\r\n---\r\nBody");
        assert_eq!(result.fields["foo"], "bar");
        assert_eq!(result.body, "Body");
        assert_eq!(result.body_line_offset, 5);
    }

    #[test]
    fn thematic_break_later_in_body_is_not_frontmatter() {
        let result = split("Intro\n\n---\n\nMore");
        assert!(result.is_empty());
        assert_eq!(result.body, "Intro\n\n---\n\nMore");
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let err = split_frontmatter("---\ninvalid: [unterminated\n---\n").unwrap_err();
        assert!(matches!(err, FrontmatterError::Parse(_)), "{err:?}");
    }

    #[test]
    fn errors_on_unterminated_block() {
        let err = split_frontmatter("\n---\ntitle: test").unwrap_err();
        assert_eq!(err, FrontmatterError::Unterminated(2));
    }

    #[test]
    fn errors_on_scalar_root() {
        let err = split_frontmatter("---\njust a string\n---\n").unwrap_err();
        assert_eq!(err, FrontmatterError::InvalidRootType);
    }
}
