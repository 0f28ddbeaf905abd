use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Shift the line number by `lines`, used when the parsed text started
    /// below a stripped frontmatter block.
    pub fn offset_lines(mut self, lines: usize) -> Self {
        self.line += lines;
        self
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors raised while parsing Markdown sources.
#[derive(Debug, Error)]
pub enum CoreError {
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
}

impl CoreError {
    /// Location of the error in the parsed text.
    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::MarkdownAdapter { location, .. } => location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display() {
        assert_eq!(SourceLocation::new(3, 7).to_string(), "3:7");
    }

    #[test]
    fn offset_moves_line_only() {
        let loc = SourceLocation::new(2, 5).offset_lines(4);
        assert_eq!((loc.line, loc.column), (6, 5));
    }

    #[test]
    fn parse_error_display() {
        let err = CoreError::MarkdownAdapter {
            message: "unexpected end".into(),
            location: SourceLocation::new(1, 9),
        };
        assert_eq!(err.location(), &SourceLocation::new(1, 9));
        assert_eq!(err.to_string(), "Parse error at 1:9: unexpected end");
    }
}
