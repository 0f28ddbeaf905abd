//! Building the document collection from a content directory.

use crate::config::ContentConfig;
use crate::document::{Body, Document};
use crate::error::{BuildError, DocumentError};
use crate::schema::{DocumentType, RawDocument};
use glob::{MatchOptions, Pattern};
use inkpost_core::{SourceKind, anchor_base};
use inkpost_render::Pipeline;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A document that failed to build.
#[derive(Debug)]
pub struct DocumentFailure {
    /// Path relative to the content root.
    pub path: String,
    /// Why it failed.
    pub error: DocumentError,
}

/// Per-document failures of one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Failed documents in path order.
    pub failures: Vec<DocumentFailure>,
}

impl BuildReport {
    /// Whether every matched file became a document.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a build: the collection plus the documents left out of it.
#[derive(Debug)]
pub struct BuildOutput {
    /// Successfully built documents.
    pub collection: Collection,
    /// Documents that failed.
    pub report: BuildReport,
}

/// An immutable, queryable set of documents in path order.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    documents: Vec<Document>,
    by_slug: HashMap<String, usize>,
}

impl Collection {
    /// Builds a collection, rejecting duplicate slugs.
    pub fn from_documents(documents: Vec<Document>) -> Result<Self, BuildError> {
        let mut by_slug = HashMap::with_capacity(documents.len());
        for (idx, document) in documents.iter().enumerate() {
            if let Some(first) = by_slug.insert(document.slug().to_string(), idx) {
                return Err(BuildError::DuplicateSlug {
                    slug: document.slug().to_string(),
                    first: documents[first].file_path().to_string(),
                    second: document.file_path().to_string(),
                });
            }
        }
        Ok(Self { documents, by_slug })
    }

    /// All documents in path order.
    pub fn all(&self) -> &[Document] {
        &self.documents
    }

    /// Iterates documents in path order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Looks a document up by slug.
    pub fn find_by_slug(&self, slug: &str) -> Option<&Document> {
        self.by_slug.get(slug).map(|idx| &self.documents[*idx])
    }

    /// Documents newest first by `field`.
    ///
    /// The sort is stable: equal dates keep path order and documents without
    /// the date come last.
    pub fn sorted_by_date(&self, field: &str) -> Vec<&Document> {
        let mut sorted: Vec<&Document> = self.documents.iter().collect();
        sorted.sort_by(|a, b| b.date(field).cmp(&a.date(field)));
        sorted
    }

    /// Number of documents per tag, keyed by tag slug.
    pub fn tag_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for document in &self.documents {
            for tag in document.tags() {
                *counts.entry(anchor_base(tag)).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Writes `<slug>.json` for every document and `_index.json` listing all.
    pub fn write_json(&self, dir: &Path) -> Result<(), BuildError> {
        let output_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| BuildError::Output { path, source }
        };

        fs::create_dir_all(dir).map_err(output_error(dir))?;
        for document in &self.documents {
            let path = dir.join(format!("{}.json", document.slug()));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(output_error(parent))?;
            }
            let json = serde_json::to_string_pretty(document)?;
            fs::write(&path, json).map_err(output_error(&path))?;
        }

        let index = dir.join("_index.json");
        let json = serde_json::to_string_pretty(&self.documents)?;
        fs::write(&index, json).map_err(output_error(&index))?;
        log::debug!("wrote {} documents to {}", self.documents.len(), dir.display());
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builds a [`Collection`] from files under a content root.
#[derive(Debug, Clone)]
pub struct CollectionBuilder {
    root: PathBuf,
    document_type: DocumentType,
    pipeline: Pipeline,
}

impl CollectionBuilder {
    /// Creates a builder for `root`.
    pub fn new(root: impl Into<PathBuf>, document_type: DocumentType, pipeline: Pipeline) -> Self {
        Self {
            root: root.into(),
            document_type,
            pipeline,
        }
    }

    /// Creates a builder from a loaded configuration.
    pub fn from_config(config: &ContentConfig) -> Self {
        Self::new(
            config.content_root.clone(),
            config.document_type(),
            config.pipeline.clone(),
        )
    }

    /// Processes every matching file and assembles the collection.
    ///
    /// Files are processed in parallel; failures of single documents are
    /// reported, duplicate slugs abort the build.
    pub fn build(&self) -> Result<BuildOutput, BuildError> {
        self.document_type.validate()?;
        if !self.root.is_dir() {
            return Err(BuildError::MissingRoot(self.root.clone()));
        }

        let files = self.discover()?;
        log::debug!(
            "{} files match `{}` under {}",
            files.len(),
            self.document_type.file_pattern,
            self.root.display()
        );

        let results: Vec<(String, Result<Document, DocumentError>)> = files
            .par_iter()
            .map(|rel| (rel.clone(), self.process(rel)))
            .collect();

        let mut documents = Vec::with_capacity(results.len());
        let mut report = BuildReport::default();
        for (path, result) in results {
            match result {
                Ok(document) => documents.push(document),
                Err(error) => {
                    log::warn!("skipping {path}: {error}");
                    report.failures.push(DocumentFailure { path, error });
                }
            }
        }

        let collection = Collection::from_documents(documents)?;
        log::info!(
            "built {} {} documents ({} failed)",
            collection.len(),
            self.document_type.name,
            report.failures.len()
        );
        Ok(BuildOutput { collection, report })
    }

    /// Relative, `/`-separated paths of matching files, sorted.
    fn discover(&self) -> Result<Vec<String>, BuildError> {
        let pattern_text = &self.document_type.file_pattern;
        let pattern = Pattern::new(pattern_text).map_err(|source| BuildError::InvalidPattern {
            pattern: pattern_text.clone(),
            source,
        })?;
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if pattern.matches_with(&relative, options) {
                files.push(relative);
            }
        }
        files.sort();
        Ok(files)
    }

    fn process(&self, relative: &str) -> Result<Document, DocumentError> {
        log::debug!("processing {relative}");
        let path = self.root.join(relative);
        let source = fs::read_to_string(&path)?;
        let rendered = self.pipeline.run(&source, SourceKind::from_path(&path))?;
        let fields = self.document_type.resolve(&RawDocument {
            path: relative,
            frontmatter: &rendered.frontmatter,
            raw_body: &rendered.raw_body,
            headings: &rendered.headings,
        })?;
        Ok(Document::new(
            fields,
            Body {
                raw: rendered.raw_body,
                html: rendered.html,
            },
        ))
    }
}

/// Builds the collection described by `config`, writing the JSON artifact
/// when `outputDir` is set.
pub fn build(config: &ContentConfig) -> Result<BuildOutput, BuildError> {
    let output = CollectionBuilder::from_config(config).build()?;
    if let Some(dir) = &config.output_dir {
        output.collection.write_json(dir)?;
    }
    Ok(output)
}
