use thiserror::Error;

/// A stage failed on one document's content.
///
/// Only the document being processed is affected; callers building a
/// collection record the error against the file and continue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{stage} stage failed: {message}")]
pub struct TransformStageError {
    /// Name of the failing stage (as written in configuration).
    pub stage: &'static str,
    /// Human readable detail.
    pub message: String,
}

impl TransformStageError {
    /// Create a stage error.
    pub fn new(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// The configured stage list cannot form a valid pipeline.
#[derive(Debug, Error)]
pub enum PipelineConfigError {
    /// A stage appears more than once.
    #[error("stage `{0}` is configured more than once")]
    DuplicateStage(&'static str),
    /// A stage must run before another one.
    #[error("stage `{before}` must run before `{after}`")]
    Order {
        /// Stage that has to come first.
        before: &'static str,
        /// Stage that was configured too early.
        after: &'static str,
    },
    /// A stage depends on another one that is not configured.
    #[error("stage `{stage}` requires `{requires}` earlier in the pipeline")]
    MissingDependency {
        /// Dependent stage.
        stage: &'static str,
        /// Missing prerequisite.
        requires: &'static str,
    },
    /// The frontmatter stage has to be the first stage.
    #[error("stage `frontmatter` must be the first stage")]
    FrontmatterNotFirst,
    /// The minify stage has to be the last stage.
    #[error("stage `minify` must be the last stage")]
    MinifyNotLast,
    /// `highlight.defaultLanguage` names a language without a grammar.
    #[error("highlight default language `{0}` is not supported")]
    UnknownDefaultLanguage(String),
    /// The citation bibliography could not be loaded.
    #[error("failed to load bibliography {path}: {reason}")]
    Bibliography {
        /// Path that was read.
        path: String,
        /// Why loading failed.
        reason: String,
    },
}
