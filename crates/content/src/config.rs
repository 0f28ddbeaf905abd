//! YAML configuration of a content build.

use crate::error::ConfigError;
use crate::error::PaginationError;
use crate::pagination::Paginator;
use crate::schema::DocumentType;
use inkpost_render::{Pipeline, Stage, default_stages};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_FILE_PATTERN: &str = "**/*.mdx";
const DEFAULT_URL_PREFIX: &str = "/posts";
const DEFAULT_PAGE_SIZE: usize = 5;
const DEFAULT_DATE_FIELD: &str = "createdAt";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    content_root: PathBuf,
    #[serde(default = "default_file_pattern")]
    file_pattern: String,
    #[serde(default = "default_url_prefix")]
    url_prefix: String,
    #[serde(default = "default_page_size")]
    page_size: usize,
    #[serde(default = "default_date_field")]
    date_field: String,
    #[serde(default)]
    pipeline: Option<Vec<Stage>>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
}

fn default_file_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

fn default_url_prefix() -> String {
    DEFAULT_URL_PREFIX.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_date_field() -> String {
    DEFAULT_DATE_FIELD.to_string()
}

/// A loaded and validated content configuration.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Directory holding the content files.
    pub content_root: PathBuf,
    /// Glob selecting post files relative to the root.
    pub file_pattern: String,
    /// Prefix of post URLs.
    pub url_prefix: String,
    /// Posts per listing page.
    pub page_size: usize,
    /// Date field used to order listings.
    pub date_field: String,
    /// The validated transform pipeline.
    pub pipeline: Pipeline,
    /// Where to write the JSON artifact, if anywhere.
    pub output_dir: Option<PathBuf>,
}

impl ContentConfig {
    /// Reads a YAML file. Relative paths inside it are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_raw(serde_yaml::from_str(&text)?, base)
    }

    /// Parses YAML text. Relative paths stay relative to the working directory.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::from_raw(serde_yaml::from_str(yaml)?, Path::new(""))
    }

    fn from_raw(raw: RawConfig, base: &Path) -> Result<Self, ConfigError> {
        if raw.page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }

        let mut stages = raw.pipeline.unwrap_or_else(default_stages);
        for stage in &mut stages {
            if let Stage::Citation(options) = stage {
                options.bibliography_path = base.join(&options.bibliography_path);
            }
        }

        Ok(Self {
            content_root: base.join(raw.content_root),
            file_pattern: raw.file_pattern,
            url_prefix: raw.url_prefix,
            page_size: raw.page_size,
            date_field: raw.date_field,
            pipeline: Pipeline::new(stages)?,
            output_dir: raw.output_dir.map(|dir| base.join(dir)),
        })
    }

    /// The post document type with the configured pattern and prefix.
    pub fn document_type(&self) -> DocumentType {
        DocumentType::post()
            .with_file_pattern(&self.file_pattern)
            .with_url_prefix(&self.url_prefix)
    }

    /// Paginator for listings.
    pub fn paginator(&self) -> Result<Paginator, PaginationError> {
        Paginator::new(self.page_size, &self.date_field)
    }
}
