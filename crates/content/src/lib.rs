#![deny(missing_docs)]
//! inkpost content layer: document types, collection building and listings.

/// Collection building and queries.
pub mod collection;
/// Content configuration.
pub mod config;
/// Documents and field values.
pub mod document;
/// Error types.
pub mod error;
/// Paged listings.
pub mod pagination;
/// Document types and field resolution.
pub mod schema;

pub use collection::{BuildOutput, BuildReport, Collection, CollectionBuilder, DocumentFailure, build};
pub use config::ContentConfig;
pub use document::{Body, Date, Document, FieldValue, Fields, ReadingTime, TocEntry};
pub use error::{
    BuildError, ConfigError, DocumentError, PaginationError, SchemaDeclarationError,
    SchemaValidationError,
};
pub use pagination::{Listing, Page, Paginator, paginate};
pub use schema::{ComputedField, DocumentType, FieldDef, FieldKind, RawDocument, Resolver, ResolverInput};
