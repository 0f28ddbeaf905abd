use inkpost_render::{PipelineConfigError, TransformStageError};
use std::path::PathBuf;
use thiserror::Error;

/// The content configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The YAML is malformed or has unexpected keys.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// `pageSize` is zero.
    #[error("pageSize must be greater than zero")]
    InvalidPageSize,
    /// The pipeline stage list is invalid.
    #[error("invalid pipeline: {0}")]
    Pipeline(#[from] PipelineConfigError),
}

/// A document's fields do not satisfy its document type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{path}: field `{field}` {reason}")]
pub struct SchemaValidationError {
    /// Source path relative to the content root.
    pub path: String,
    /// Offending field.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

/// A document type declaration is inconsistent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("document type `{document_type}`: field `{field}` {reason}")]
pub struct SchemaDeclarationError {
    /// Name of the document type.
    pub document_type: String,
    /// Offending field.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

/// Why a single document could not be built.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Reading the source file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Frontmatter did not match the document type.
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
    /// A pipeline stage failed.
    #[error(transparent)]
    Transform(#[from] TransformStageError),
}

/// The collection as a whole could not be built.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Two documents resolve to the same slug.
    #[error("duplicate slug `{slug}` in {first} and {second}")]
    DuplicateSlug {
        /// The colliding slug.
        slug: String,
        /// Path of the document that claimed it first.
        first: String,
        /// Path of the later document.
        second: String,
    },
    /// The content root is not a directory.
    #[error("content root {0} is not a directory")]
    MissingRoot(PathBuf),
    /// The file pattern is not a valid glob.
    #[error("invalid file pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The configured pattern.
        pattern: String,
        /// Underlying error.
        #[source]
        source: glob::PatternError,
    },
    /// Walking the content root failed.
    #[error("failed to walk content root: {0}")]
    Walk(#[from] walkdir::Error),
    /// The document type declaration is inconsistent.
    #[error(transparent)]
    DocumentType(#[from] SchemaDeclarationError),
    /// Writing the JSON artifact failed.
    #[error("failed to write {path}: {source}")]
    Output {
        /// File or directory being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Encoding a document as JSON failed.
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A page could not be produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaginationError {
    /// The page size is zero.
    #[error("page size must be greater than zero")]
    InvalidPageSize,
    /// The requested page is not a number or is out of range.
    #[error("invalid page `{requested}` (expected 1..={total_pages})")]
    InvalidPage {
        /// The page as requested.
        requested: String,
        /// Number of available pages.
        total_pages: usize,
    },
}
