#![deny(missing_docs)]
//! inkpost core: markdown parse options, frontmatter splitting, and anchor slugs.

/// Fenced code info-string parsing.
pub mod code_fence;
/// Core error types.
pub mod error;
/// YAML frontmatter splitting.
pub mod frontmatter;
/// Markdown parsing options and the markdown-rs adapter.
pub mod parse;
/// Heading anchor slug generation.
pub mod slug;

pub use code_fence::CodeInfo;
pub use error::{CoreError, SourceLocation};
pub use frontmatter::{Frontmatter, FrontmatterError, split_frontmatter};
pub use parse::{ParseOptions, SourceKind, parse_mdast};
pub use slug::{Slugger, anchor_base, extract_custom_id};
