//! The configurable transform pipeline.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s checked once at
//! construction. Running it over one source moves the content through three
//! shapes: the raw source, an HTML tree (after the parse step) and finally an
//! HTML string. Tree stages run on the tree, `minify` on the string.

use crate::error::{PipelineConfigError, TransformStageError};
use crate::esm::blank_esm;
use crate::hast::{Node, to_html, visit_elements};
use crate::lower::lower;
use crate::stages::autolink::{self, AutolinkOptions};
use crate::stages::citation::{self, Bibliography, CitationOptions};
use crate::stages::external_links::{self, ExternalLinkOptions};
use crate::stages::highlight::{self, HighlightOptions, grammar};
use crate::stages::math::{self, MathOptions};
use crate::stages::{code_titles, heading_ids, lazy_images, minify};
use inkpost_core::{CoreError, ParseOptions, SourceKind, parse_mdast, split_frontmatter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;

/// One configured pipeline stage.
///
/// Deserializes from objects tagged by `stage`, e.g.
/// `{ stage: highlight, defaultLanguage: js, ignoreMissing: true }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum Stage {
    /// Split the YAML frontmatter block off the source.
    Frontmatter,
    /// Parse the body with GitHub Flavored Markdown constructs.
    Gfm,
    /// File titles on fenced code.
    CodeTitles,
    /// Lazy loading hints on images.
    LazyImages,
    /// Unique heading ids.
    HeadingIds,
    /// Self-links on headings.
    AutolinkHeadings(AutolinkOptions),
    /// Syntax highlighting.
    Highlight(HighlightOptions),
    /// TeX math rendering.
    Math(MathOptions),
    /// Bibliography citations.
    Citation(CitationOptions),
    /// `target`/`rel` on off-site links.
    ExternalLinks(ExternalLinkOptions),
    /// HTML minification.
    Minify,
}

impl Stage {
    /// Name as written in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Frontmatter => "frontmatter",
            Stage::Gfm => "gfm",
            Stage::CodeTitles => code_titles::NAME,
            Stage::LazyImages => lazy_images::NAME,
            Stage::HeadingIds => heading_ids::NAME,
            Stage::AutolinkHeadings(_) => autolink::NAME,
            Stage::Highlight(_) => highlight::NAME,
            Stage::Math(_) => math::NAME,
            Stage::Citation(_) => citation::NAME,
            Stage::ExternalLinks(_) => external_links::NAME,
            Stage::Minify => minify::NAME,
        }
    }

    /// Whether the stage rewrites the HTML tree.
    pub fn is_tree_stage(&self) -> bool {
        !matches!(self, Stage::Frontmatter | Stage::Gfm | Stage::Minify)
    }
}

/// A heading found in the rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// Heading level, 1 to 6.
    pub depth: u8,
    /// Anchor id, when the heading has one.
    pub id: Option<String>,
    /// Plain text of the heading.
    pub text: String,
}

/// Result of running the pipeline over one source.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Frontmatter fields (empty without a `frontmatter` stage or block).
    pub frontmatter: Map<String, JsonValue>,
    /// Source with the frontmatter block removed.
    pub raw_body: String,
    /// Final HTML.
    pub html: String,
    /// Headings in document order, excluding visually hidden ones.
    pub headings: Vec<Heading>,
}

enum Content {
    Source,
    Tree(Vec<Node>),
    Html(String),
}

/// A validated, immutable stage list.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    bibliography: Option<Bibliography>,
}

impl Default for Pipeline {
    /// The deployed blog configuration.
    fn default() -> Self {
        Self {
            stages: default_stages(),
            bibliography: None,
        }
    }
}

/// Stage list of the default pipeline.
pub fn default_stages() -> Vec<Stage> {
    vec![
        Stage::Frontmatter,
        Stage::Gfm,
        Stage::CodeTitles,
        Stage::LazyImages,
        Stage::HeadingIds,
        Stage::AutolinkHeadings(AutolinkOptions::default()),
        Stage::Math(MathOptions::default()),
        Stage::Highlight(HighlightOptions {
            default_language: Some("js".to_string()),
            ignore_missing: true,
        }),
        Stage::Minify,
    ]
}

impl Pipeline {
    /// Validates the stage order and loads any bibliography.
    pub fn new(stages: Vec<Stage>) -> Result<Self, PipelineConfigError> {
        validate(&stages)?;
        let bibliography = stages
            .iter()
            .find_map(|stage| match stage {
                Stage::Citation(options) => Some(Bibliography::load(&options.bibliography_path)),
                _ => None,
            })
            .transpose()?;
        Ok(Self {
            stages,
            bibliography,
        })
    }

    /// Configured stages in run order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    fn has_math(&self) -> bool {
        self.stages.iter().any(|stage| matches!(stage, Stage::Math(_)))
    }

    /// Runs every stage over `source`.
    pub fn run(&self, source: &str, kind: SourceKind) -> Result<Rendered, TransformStageError> {
        let mut frontmatter = Map::new();
        let mut body = source;
        let mut line_offset = 0;
        let mut content = Content::Source;
        let mut headings = Vec::new();

        for stage in &self.stages {
            content = match (stage, content) {
                (Stage::Frontmatter, content) => {
                    let split = split_frontmatter(source)
                        .map_err(|err| TransformStageError::new(stage.name(), err.to_string()))?;
                    frontmatter = split.fields;
                    body = split.body;
                    line_offset = split.body_line_offset;
                    content
                }
                (Stage::Gfm, _) => Content::Tree(self.parse(body, kind, true, line_offset, stage)?),
                (Stage::Minify, content) => {
                    let html = match content {
                        Content::Source => {
                            let nodes = self.parse(body, kind, false, line_offset, stage)?;
                            serialize(&nodes, &mut headings)
                        }
                        Content::Tree(nodes) => serialize(&nodes, &mut headings),
                        Content::Html(html) => html,
                    };
                    Content::Html(minify::apply(&html)?)
                }
                (stage, Content::Tree(mut nodes)) => {
                    self.apply_tree_stage(stage, &mut nodes)?;
                    Content::Tree(nodes)
                }
                (stage, Content::Source) => {
                    let mut nodes = self.parse(body, kind, false, line_offset, stage)?;
                    self.apply_tree_stage(stage, &mut nodes)?;
                    Content::Tree(nodes)
                }
                (stage, Content::Html(_)) => {
                    return Err(TransformStageError::new(
                        stage.name(),
                        "stage cannot run after the document was serialized",
                    ));
                }
            };
        }

        let html = match content {
            Content::Source => {
                let nodes = self.parse(body, kind, false, line_offset, &Stage::Gfm)?;
                serialize(&nodes, &mut headings)
            }
            Content::Tree(nodes) => serialize(&nodes, &mut headings),
            Content::Html(html) => html,
        };

        Ok(Rendered {
            frontmatter,
            raw_body: body.to_string(),
            html,
            headings,
        })
    }

    fn parse(
        &self,
        body: &str,
        kind: SourceKind,
        gfm: bool,
        line_offset: usize,
        stage: &Stage,
    ) -> Result<Vec<Node>, TransformStageError> {
        let options = ParseOptions::for_kind(kind)
            .with_gfm(gfm)
            .with_math(self.has_math());
        let prepared = match kind {
            SourceKind::Mdx => blank_esm(body),
            SourceKind::Markdown => Cow::Borrowed(body),
        };
        let mdast = parse_mdast(&prepared, &options).map_err(|err| {
            let CoreError::MarkdownAdapter { message, location } = err;
            TransformStageError::new(
                stage.name(),
                format!("{message} at {}", location.offset_lines(line_offset)),
            )
        })?;
        Ok(lower(&mdast))
    }

    fn apply_tree_stage(&self, stage: &Stage, nodes: &mut Vec<Node>) -> Result<(), TransformStageError> {
        match stage {
            Stage::CodeTitles => code_titles::apply(nodes),
            Stage::LazyImages => lazy_images::apply(nodes),
            Stage::HeadingIds => heading_ids::apply(nodes),
            Stage::AutolinkHeadings(options) => autolink::apply(nodes, options),
            Stage::Highlight(options) => highlight::apply(nodes, options)?,
            Stage::Math(options) => math::apply(nodes, options)?,
            Stage::Citation(_) => match &self.bibliography {
                Some(bibliography) => citation::apply(nodes, bibliography)?,
                None => {
                    return Err(TransformStageError::new(citation::NAME, "bibliography not loaded"));
                }
            },
            Stage::ExternalLinks(options) => external_links::apply(nodes, options),
            Stage::Frontmatter | Stage::Gfm | Stage::Minify => {}
        }
        Ok(())
    }
}

fn serialize(nodes: &[Node], headings: &mut Vec<Heading>) -> String {
    *headings = collect_headings(nodes);
    to_html(nodes)
}

fn collect_headings(nodes: &[Node]) -> Vec<Heading> {
    let mut headings = Vec::new();
    visit_elements(nodes, &mut |el| {
        if let Some(depth) = el.heading_depth()
            && !el.has_class("sr-only")
        {
            headings.push(Heading {
                depth,
                id: el.attr("id").map(str::to_string),
                text: el.text_content().trim().to_string(),
            });
        }
    });
    headings
}

fn position(stages: &[Stage], name: &str) -> Option<usize> {
    stages.iter().position(|stage| stage.name() == name)
}

fn validate(stages: &[Stage]) -> Result<(), PipelineConfigError> {
    for (idx, stage) in stages.iter().enumerate() {
        if stages[..idx].iter().any(|prev| prev.name() == stage.name()) {
            return Err(PipelineConfigError::DuplicateStage(stage.name()));
        }
    }

    if position(stages, "frontmatter").is_some_and(|idx| idx != 0) {
        return Err(PipelineConfigError::FrontmatterNotFirst);
    }
    if position(stages, minify::NAME).is_some_and(|idx| idx + 1 != stages.len()) {
        return Err(PipelineConfigError::MinifyNotLast);
    }

    if let Some(gfm) = position(stages, "gfm")
        && let Some(early) = stages[..gfm].iter().find(|stage| stage.is_tree_stage())
    {
        return Err(PipelineConfigError::Order {
            before: "gfm",
            after: early.name(),
        });
    }

    if let Some(autolink_at) = position(stages, autolink::NAME) {
        match position(stages, heading_ids::NAME) {
            None => {
                return Err(PipelineConfigError::MissingDependency {
                    stage: autolink::NAME,
                    requires: heading_ids::NAME,
                });
            }
            Some(ids_at) if ids_at > autolink_at => {
                return Err(PipelineConfigError::Order {
                    before: heading_ids::NAME,
                    after: autolink::NAME,
                });
            }
            Some(_) => {}
        }
    }

    if let (Some(titles), Some(highlight_at)) = (
        position(stages, code_titles::NAME),
        position(stages, highlight::NAME),
    ) && titles > highlight_at
    {
        return Err(PipelineConfigError::Order {
            before: code_titles::NAME,
            after: highlight::NAME,
        });
    }

    for stage in stages {
        if let Stage::Highlight(HighlightOptions {
            default_language: Some(language),
            ..
        }) = stage
            && !grammar::is_supported(language)
        {
            return Err(PipelineConfigError::UnknownDefaultLanguage(language.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn run_default(source: &str) -> Rendered {
        Pipeline::default().run(source, SourceKind::Mdx).unwrap()
    }

    #[test]
    fn default_pipeline_is_valid() {
        assert!(Pipeline::new(default_stages()).is_ok());
        assert_eq!(Pipeline::default().stages().len(), 9);
    }

    #[test]
    fn stages_deserialize_from_yaml() {
        let yaml = r#"
- stage: frontmatter
- stage: gfm
- stage: heading-ids
- stage: autolink-headings
  behavior: prepend
- stage: highlight
  defaultLanguage: ts
- stage: external-links
  rel: [noopener]
- stage: minify
"#;
        let stages: Vec<Stage> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(stages.len(), 7);
        assert_eq!(
            stages[3],
            Stage::AutolinkHeadings(AutolinkOptions {
                behavior: autolink::AutolinkBehavior::Prepend,
                class_name: None,
            })
        );
        assert_eq!(
            stages[4],
            Stage::Highlight(HighlightOptions {
                default_language: Some("ts".into()),
                ignore_missing: false,
            })
        );
        match &stages[5] {
            Stage::ExternalLinks(options) => {
                assert_eq!(options.target.as_deref(), Some("_blank"));
                assert_eq!(options.rel, vec!["noopener".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Pipeline::new(stages).is_ok());
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let result: Result<Vec<Stage>, _> = serde_yaml::from_str("- stage: sparkle\n");
        assert!(result.is_err());
    }

    #[test]
    fn ordering_rules() {
        let err = Pipeline::new(vec![Stage::Gfm, Stage::Frontmatter]).unwrap_err();
        assert!(matches!(err, PipelineConfigError::FrontmatterNotFirst));

        let err = Pipeline::new(vec![Stage::Minify, Stage::Gfm]).unwrap_err();
        assert!(matches!(err, PipelineConfigError::MinifyNotLast));

        let err = Pipeline::new(vec![Stage::HeadingIds, Stage::Gfm]).unwrap_err();
        assert!(matches!(
            err,
            PipelineConfigError::Order { before: "gfm", after: "heading-ids" }
        ));

        let err = Pipeline::new(vec![Stage::AutolinkHeadings(AutolinkOptions::default())]).unwrap_err();
        assert!(matches!(err, PipelineConfigError::MissingDependency { .. }));

        let err = Pipeline::new(vec![
            Stage::AutolinkHeadings(AutolinkOptions::default()),
            Stage::HeadingIds,
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineConfigError::Order { before: "heading-ids", .. }));

        let err = Pipeline::new(vec![
            Stage::Highlight(HighlightOptions::default()),
            Stage::CodeTitles,
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineConfigError::Order { before: "code-titles", .. }));

        let err = Pipeline::new(vec![Stage::LazyImages, Stage::LazyImages]).unwrap_err();
        assert!(matches!(err, PipelineConfigError::DuplicateStage("lazy-images")));
    }

    #[test]
    fn unknown_default_language_is_a_config_error() {
        let err = Pipeline::new(vec![Stage::Highlight(HighlightOptions {
            default_language: Some("klingon".into()),
            ignore_missing: true,
        })])
        .unwrap_err();
        assert!(matches!(err, PipelineConfigError::UnknownDefaultLanguage(lang) if lang == "klingon"));
    }

    #[test]
    fn missing_bibliography_is_a_config_error() {
        let err = Pipeline::new(vec![Stage::Citation(CitationOptions {
            bibliography_path: "/nonexistent/refs.json".into(),
        })])
        .unwrap_err();
        assert!(matches!(err, PipelineConfigError::Bibliography { .. }));
    }

    #[test]
    fn default_pipeline_renders_post() {
        let source = "---\ntitle: Hello\n---\n\n# Overview\n\nText with ![alt](/a.png).\n\n## Overview\n\n```ts:app.ts\nconst a = 1\n```\n";
        let rendered = run_default(source);

        assert_eq!(rendered.frontmatter["title"], "Hello");
        assert!(rendered.raw_body.contains("# Overview"));
        assert!(!rendered.raw_body.contains("title:"));
        assert!(
            rendered.html.starts_with("<h1 id=overview><a href=#overview>Overview</a></h1>"),
            "{}",
            rendered.html
        );
        assert!(
            rendered.html.contains("<h2 id=overview-1><a href=#overview-1>Overview</a></h2>"),
            "{}",
            rendered.html
        );
        assert!(rendered.html.contains("remark-code-title"));
        assert!(rendered.html.contains("token keyword"));
        assert!(rendered.html.contains("lazy"));
        assert_eq!(
            rendered.headings,
            vec![
                Heading { depth: 1, id: Some("overview".into()), text: "Overview".into() },
                Heading { depth: 2, id: Some("overview-1".into()), text: "Overview".into() },
            ]
        );
    }

    #[test]
    fn heading_links() {
        let pipeline = Pipeline::new(vec![
            Stage::Frontmatter,
            Stage::Gfm,
            Stage::HeadingIds,
            Stage::AutolinkHeadings(AutolinkOptions::default()),
        ])
        .unwrap();
        let rendered = pipeline.run("## Intro\n\nSome *text*.\n", SourceKind::Mdx).unwrap();
        insta::assert_snapshot!(
            rendered.html,
            @r##"<h2 id="intro"><a href="#intro">Intro</a></h2><p>Some <em>text</em>.</p>"##
        );
    }

    #[test]
    fn untagged_code_uses_default_language() {
        let rendered = run_default("```\nlet x = 1\n```\n");
        assert!(rendered.html.contains("language-js"), "{}", rendered.html);
    }

    #[test]
    fn ignore_missing_controls_unknown_languages() {
        let source = "```cobol\nDISPLAY 'HI'.\n```\n";
        let lenient = run_default(source);
        assert!(lenient.html.contains("DISPLAY"));
        assert!(!lenient.html.contains("token"));

        let strict = Pipeline::new(vec![
            Stage::Frontmatter,
            Stage::Gfm,
            Stage::Highlight(HighlightOptions::default()),
        ])
        .unwrap();
        let err = strict.run(source, SourceKind::Mdx).unwrap_err();
        assert_eq!(err.stage, "highlight");
        assert!(err.to_string().starts_with("highlight stage failed"));
    }

    #[test]
    fn frontmatter_errors_name_the_stage() {
        let err = Pipeline::default()
            .run("---\ntitle: x\n", SourceKind::Mdx)
            .unwrap_err();
        assert_eq!(err.stage, "frontmatter");
    }

    #[test]
    fn tree_stage_without_gfm_parses_commonmark() {
        let pipeline = Pipeline::new(vec![Stage::Frontmatter, Stage::HeadingIds]).unwrap();
        let rendered = pipeline
            .run("# A\n\n| a |\n| - |\n| 1 |\n", SourceKind::Markdown)
            .unwrap();
        assert!(rendered.html.starts_with(r#"<h1 id="a">A</h1>"#), "{}", rendered.html);
        assert!(!rendered.html.contains("<table>"));
    }

    #[test]
    fn no_stages_still_renders() {
        let pipeline = Pipeline::new(Vec::new()).unwrap();
        let rendered = pipeline.run("Hello *world*", SourceKind::Markdown).unwrap();
        assert_eq!(rendered.html, "<p>Hello <em>world</em></p>");
        assert!(rendered.frontmatter.is_empty());
    }

    #[test]
    fn mdx_imports_are_dropped() {
        let pipeline = Pipeline::new(vec![Stage::Frontmatter, Stage::Gfm]).unwrap();
        let rendered = pipeline
            .run("import Card from './card'\n\n<Card title=\"x\">Hi</Card>\n", SourceKind::Mdx)
            .unwrap();
        assert!(!rendered.html.contains("import"), "{}", rendered.html);
        assert!(rendered.html.contains("<Card title=\"x\">"), "{}", rendered.html);
    }

    #[test]
    fn parse_errors_report_body_lines_in_file_coordinates() {
        let pipeline = Pipeline::new(vec![Stage::Frontmatter, Stage::Gfm]).unwrap();
        let err = pipeline
            .run("---\ntitle: x\n---\n\n<a>\n\n</b>\n", SourceKind::Mdx)
            .unwrap_err();
        assert_eq!(err.stage, "gfm");
        assert!(err.message.starts_with("Unexpected closing tag `</b>`"), "{}", err.message);
        assert!(err.message.ends_with(" at 7:1"), "{}", err.message);
    }

    #[test]
    fn citations_and_external_links() {
        let mut bib = tempfile::NamedTempFile::new().unwrap();
        write!(
            bib,
            r#"[{{"id": "knuth", "author": [{{"family": "Knuth"}}], "issued": {{"date-parts": [[1984]]}}}}]"#
        )
        .unwrap();
        let pipeline = Pipeline::new(vec![
            Stage::Frontmatter,
            Stage::Gfm,
            Stage::Citation(CitationOptions {
                bibliography_path: bib.path().to_path_buf(),
            }),
            Stage::ExternalLinks(ExternalLinkOptions::default()),
        ])
        .unwrap();
        let rendered = pipeline
            .run("Literate [@knuth], see [site](https://example.com).\n", SourceKind::Markdown)
            .unwrap();
        assert!(rendered.html.contains(r##"<a href="#ref-knuth">Knuth, 1984</a>"##), "{}", rendered.html);
        assert!(rendered.html.contains(r#"target="_blank""#));
        assert!(rendered.html.contains(r#"<section class="references">"#));
    }
}
