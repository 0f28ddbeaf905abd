use inkpost_content::{BuildError, ContentConfig, DocumentError, FieldValue, build};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn post(title: &str, date: &str, body: &str) -> String {
    format!(
        "---\ntitle: {title}\nauthor: Jane Doe\ncreatedAt: {date}\ndescription: About {title}\ntags:\n  - rust\n---\n\n{body}\n"
    )
}

fn config(root: &Path, extra: &str) -> ContentConfig {
    ContentConfig::from_yaml_str(&format!("contentRoot: {}\n{extra}", root.display())).unwrap()
}

fn content() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "hello.mdx", &post("Hello", "2024-01-02", "# Hello\n\nFirst words."));
    write(
        dir.path(),
        "guides/index.mdx",
        &post("Guides", "2024-02-01", "Some `code` and a [link](https://example.com)."),
    );
    write(dir.path(), "drafts/notes.md", &post("Notes", "2024-03-01", "Not an MDX file."));
    dir
}

#[test]
fn builds_documents_with_computed_fields() {
    let dir = content();
    let output = build(&config(dir.path(), "")).unwrap();

    assert!(output.report.is_clean(), "{:?}", output.report);
    assert_eq!(output.collection.len(), 2);

    let slugs: Vec<&str> = output.collection.iter().map(|doc| doc.slug()).collect();
    assert_eq!(slugs, ["guides", "hello"]);

    let guides = output.collection.find_by_slug("guides").unwrap();
    assert_eq!(guides.url(), "/posts/guides");
    assert_eq!(guides.file_path(), "guides/index.mdx");
    assert_eq!(guides.title(), Some("Guides"));
    assert_eq!(guides.tags(), ["rust".to_string()]);
    assert_eq!(guides.reading_time().unwrap().minutes, 1);
    assert!(guides.body().html.contains("<code>code</code>"), "{}", guides.body().html);
    assert!(!guides.body().raw.contains("title:"));

    assert!(output.collection.find_by_slug("drafts/notes").is_none());
    assert_eq!(output.collection.tag_counts().get("rust"), Some(&2));
}

#[test]
fn builds_are_deterministic() {
    let dir = content();
    let config = config(dir.path(), "");
    let first = build(&config).unwrap();
    let second = build(&config).unwrap();
    assert_eq!(first.collection.all(), second.collection.all());
    assert_eq!(
        serde_json::to_string(first.collection.all()).unwrap(),
        serde_json::to_string(second.collection.all()).unwrap()
    );
}

#[test]
fn duplicate_slugs_abort_the_build() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "intro.mdx", &post("A", "2024-01-01", "A"));
    write(dir.path(), "intro/index.mdx", &post("B", "2024-01-02", "B"));

    match build(&config(dir.path(), "")) {
        Err(BuildError::DuplicateSlug { slug, first, second }) => {
            assert_eq!(slug, "intro");
            assert_eq!(first, "intro.mdx");
            assert_eq!(second, "intro/index.mdx");
        }
        other => panic!("expected duplicate slug, got {other:?}"),
    }
}

#[test]
fn schema_failures_are_isolated() {
    let dir = content();
    write(
        dir.path(),
        "broken.mdx",
        "---\ntitle: Broken\ncreatedAt: 2024-01-01\ndescription: x\n---\n\nNo author.\n",
    );

    let output = build(&config(dir.path(), "")).unwrap();
    assert_eq!(output.collection.len(), 2);
    assert_eq!(output.report.failures.len(), 1);

    let failure = &output.report.failures[0];
    assert_eq!(failure.path, "broken.mdx");
    match &failure.error {
        DocumentError::Schema(err) => {
            assert_eq!(err.path, "broken.mdx");
            assert_eq!(err.field, "author");
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn invalid_dates_fail_validation() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "late.mdx", &post("Late", "someday", "text"));
    let output = build(&config(dir.path(), "")).unwrap();
    assert!(output.collection.is_empty());
    assert!(matches!(
        &output.report.failures[0].error,
        DocumentError::Schema(err) if err.field == "createdAt"
    ));
}

#[test]
fn unknown_languages_follow_ignore_missing() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "legacy.mdx",
        &post("Legacy", "2024-01-01", "```cobol\nDISPLAY 'HI'.\n```"),
    );

    let lenient = build(&config(dir.path(), "")).unwrap();
    assert!(lenient.report.is_clean());
    assert!(lenient.collection.all()[0].body().html.contains("DISPLAY"));

    let strict = config(
        dir.path(),
        "pipeline:\n  - stage: frontmatter\n  - stage: gfm\n  - stage: highlight\n    ignoreMissing: false\n",
    );
    let output = build(&strict).unwrap();
    assert!(output.collection.is_empty());
    match &output.report.failures[0].error {
        DocumentError::Transform(err) => assert_eq!(err.stage, "highlight"),
        other => panic!("expected transform error, got {other:?}"),
    }
}

#[test]
fn repeated_headings_get_unique_ids() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "faq.mdx",
        &post("FAQ", "2024-01-01", "## Overview\n\nFirst.\n\n## Overview\n\nSecond."),
    );

    let output = build(&config(dir.path(), "")).unwrap();
    let doc = output.collection.find_by_slug("faq").unwrap();
    let urls: Vec<&str> = doc.toc().iter().map(|entry| entry.url.as_str()).collect();
    assert_eq!(urls, ["#overview", "#overview-1"]);
    assert!(doc.toc().iter().all(|entry| entry.value == "Overview" && entry.depth == 2));
}

#[test]
fn non_ascii_markup_fences_build() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.mdx", &post("Ok", "2024-01-01", "Plain."));
    write(
        dir.path(),
        "markup.mdx",
        &post("Markup", "2024-01-02", "```html\n<p>ñandú</p>\n```"),
    );

    let output = build(&config(dir.path(), "")).unwrap();
    assert!(output.report.is_clean(), "{:?}", output.report);
    let markup = output.collection.find_by_slug("markup").unwrap();
    assert!(markup.body().html.contains("ñandú"), "{}", markup.body().html);
}

#[test]
fn prose_lines_starting_with_import_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "csv.mdx",
        &post("Csv", "2024-01-01", "Here is how you\nimport data from a CSV file\nand then chart it."),
    );

    let output = build(&config(dir.path(), "")).unwrap();
    let html = &output.collection.find_by_slug("csv").unwrap().body().html;
    assert!(html.contains("import data from a CSV file"), "{html}");
    assert!(html.contains("and then chart it."), "{html}");
}

#[test]
fn undeclared_frontmatter_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "extra.mdx",
        "---\ntitle: T\nauthor: A\ncreatedAt: 2024-01-01\ndescription: D\nseries: intro\n---\n\nBody\n",
    );
    let output = build(&config(dir.path(), "")).unwrap();
    let doc = output.collection.find_by_slug("extra").unwrap();
    assert_eq!(doc.get("series"), Some(&FieldValue::Json("intro".into())));
}

#[test]
fn markdown_sources_with_custom_pattern() {
    let dir = content();
    let output = build(&config(dir.path(), "filePattern: \"**/*.md\"\nurlPrefix: /notes/\n")).unwrap();
    assert_eq!(output.collection.len(), 1);
    let notes = &output.collection.all()[0];
    assert_eq!(notes.slug(), "drafts/notes");
    assert_eq!(notes.url(), "/notes/drafts/notes");
}

#[test]
fn writes_json_artifact_to_output_dir() {
    let dir = content();
    let out = tempfile::tempdir().unwrap();
    let artifact = out.path().join("generated");
    let output = build(&config(dir.path(), &format!("outputDir: {}\n", artifact.display()))).unwrap();
    assert_eq!(output.collection.len(), 2);

    let index: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(artifact.join("_index.json")).unwrap()).unwrap();
    let summary: Vec<String> = index
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| {
            format!(
                "{} {} {} {}",
                doc["slug"].as_str().unwrap(),
                doc["url"].as_str().unwrap(),
                doc["filePath"].as_str().unwrap(),
                doc["readingTime"]["text"].as_str().unwrap(),
            )
        })
        .collect();
    insta::assert_snapshot!(summary.join("\n"), @r"
    guides /posts/guides guides/index.mdx 1 min read
    hello /posts/hello hello.mdx 1 min read
    ");

    let hello: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(artifact.join("hello.json")).unwrap()).unwrap();
    assert_eq!(hello["slug"], "hello");
    assert_eq!(hello["createdAt"], "2024-01-02");
    assert!(hello["body"]["html"].as_str().unwrap().contains("Hello"));
    assert!(artifact.join("guides.json").is_file());
}

#[test]
fn no_artifact_without_output_dir() {
    let dir = content();
    build(&config(dir.path(), "")).unwrap();
    assert!(!dir.path().join("_index.json").exists());
}

#[test]
fn missing_content_root() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(matches!(
        build(&config(&missing, "")),
        Err(BuildError::MissingRoot(_))
    ));
}
