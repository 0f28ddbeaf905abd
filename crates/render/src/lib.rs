#![deny(missing_docs)]
//! inkpost transform pipeline: markdown lowering, tree stages and HTML output.

/// Stage and pipeline configuration errors.
pub mod error;
/// MDX `import`/`export` blanking.
pub mod esm;
/// HTML tree and serializer.
pub mod hast;
/// mdast to HTML tree lowering.
pub mod lower;
/// Ordered, validated stage list.
pub mod pipeline;
/// Individual stages.
pub mod stages;

pub use error::{PipelineConfigError, TransformStageError};
pub use pipeline::{Heading, Pipeline, Rendered, Stage, default_stages};
pub use stages::autolink::{AutolinkBehavior, AutolinkOptions};
pub use stages::citation::{Bibliography, CitationOptions};
pub use stages::external_links::ExternalLinkOptions;
pub use stages::highlight::HighlightOptions;
pub use stages::math::MathOptions;
