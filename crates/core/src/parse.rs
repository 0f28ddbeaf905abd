//! Markdown parsing options and the markdown-rs adapter.

use crate::{CoreError, SourceLocation};
use markdown::mdast::Node;
use markdown::message::{Message, Place};
use std::path::Path;

/// Flavour of a content source, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Plain Markdown (`.md`, `.markdown`).
    Markdown,
    /// MDX (`.mdx`): JSX, ESM and expressions.
    #[default]
    Mdx,
}

impl SourceKind {
    /// Detect the source kind from a file path. Unknown extensions are treated as MDX.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown") => {
                SourceKind::Markdown
            }
            _ => SourceKind::Mdx,
        }
    }
}

/// Parser options for building markdown-rs parse options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Enable MDX constructs (JSX, ESM, expressions).
    pub mdx: bool,
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Recognise a leading YAML block so it never leaks into the body.
    pub frontmatter: bool,
    /// Enable indented code blocks.
    pub code_indented: bool,
    /// Parse raw HTML into HTML nodes.
    pub raw_html: bool,
    /// Enable math constructs (`$inline$` and `$$block$$`).
    pub math: bool,
}

impl ParseOptions {
    /// Markdown defaults: CommonMark with raw HTML.
    pub const fn markdown() -> Self {
        Self {
            mdx: false,
            gfm: false,
            frontmatter: true,
            code_indented: true,
            raw_html: true,
            math: false,
        }
    }

    /// MDX defaults: JSX/ESM/expressions, no indented code.
    pub const fn mdx() -> Self {
        Self {
            mdx: true,
            gfm: false,
            frontmatter: true,
            code_indented: false,
            raw_html: false,
            math: false,
        }
    }

    /// Defaults for the given source kind.
    pub const fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Markdown => Self::markdown(),
            SourceKind::Mdx => Self::mdx(),
        }
    }

    /// Toggle GFM constructs.
    pub const fn with_gfm(mut self, gfm: bool) -> Self {
        self.gfm = gfm;
        self
    }

    /// Toggle math constructs.
    pub const fn with_math(mut self, math: bool) -> Self {
        self.math = math;
        self
    }

    /// Convert to markdown-rs `ParseOptions`.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            frontmatter: self.frontmatter,
            code_indented: self.code_indented,
            html_flow: self.raw_html,
            html_text: self.raw_html,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        if self.mdx {
            constructs.mdx_esm = true;
            constructs.mdx_expression_flow = true;
            constructs.mdx_expression_text = true;
            constructs.mdx_jsx_flow = true;
            constructs.mdx_jsx_text = true;
        }

        if self.math {
            constructs.math_flow = true;
            constructs.math_text = true;
        }

        markdown::ParseOptions {
            constructs,
            math_text_single_dollar: self.math,
            ..markdown::ParseOptions::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::markdown()
    }
}

/// Parse markdown into an MDAST tree.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, CoreError> {
    markdown::to_mdast(input, &options.to_markdown()).map_err(|err| CoreError::MarkdownAdapter {
        message: err.reason.clone(),
        location: message_location(&err),
    })
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}
