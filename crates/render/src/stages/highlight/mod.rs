//! Syntax highlighting of fenced code blocks.
//!
//! Highlighted code is split into `span.token.<kind>` elements (the class
//! names Prism themes style), and the block gets a `code-highlight` class.

pub mod grammar;

use super::{code_language, code_of_pre};
use crate::error::TransformStageError;
use crate::hast::{Element, Node};
use grammar::{Grammar, Scanner};
use inkpost_core::CodeInfo;
use serde::{Deserialize, Serialize};

/// Stage name used in configuration and errors.
pub const NAME: &str = "highlight";

/// Options for the highlight stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HighlightOptions {
    /// Language assumed for code blocks without a language tag.
    pub default_language: Option<String>,
    /// Leave blocks with an unknown language unhighlighted instead of failing.
    pub ignore_missing: bool,
}

/// Highlights every `pre > code` block in the tree.
pub fn apply(nodes: &mut [Node], options: &HighlightOptions) -> Result<(), TransformStageError> {
    for node in nodes {
        let Node::Element(el) = node else {
            continue;
        };
        if el.is("pre") {
            highlight_block(el, options)?;
        } else {
            apply(&mut el.children, options)?;
        }
    }
    Ok(())
}

fn highlight_block(pre: &mut Element, options: &HighlightOptions) -> Result<(), TransformStageError> {
    let Some(code) = code_of_pre(pre) else {
        return Ok(());
    };

    let tagged = CodeInfo::parse(code_language(code), None).language;
    let Some(language) = tagged.or_else(|| options.default_language.clone()) else {
        return Ok(());
    };

    let Some(grammar) = grammar::find(&language) else {
        if options.ignore_missing {
            log::debug!("no grammar for `{language}`, leaving block unhighlighted");
            return Ok(());
        }
        return Err(TransformStageError::new(
            NAME,
            format!("unknown language `{language}`"),
        ));
    };

    let source = code.text_content();
    code.children = tokenize(grammar, &source);
    let class = format!("language-{language}");
    code.replace_class_prefix("language-", Some(&class));
    code.add_class("code-highlight");
    pre.replace_class_prefix("language-", Some(&class));
    Ok(())
}

/// Splits `source` into plain text and token spans.
pub fn tokenize(grammar: &Grammar, source: &str) -> Vec<Node> {
    let mut tokens = Tokens::default();
    match grammar.scanner {
        Scanner::Code => scan_code(grammar, source, &mut tokens),
        Scanner::Markup => scan_markup(source, &mut tokens),
        Scanner::Diff => scan_diff(source, &mut tokens),
        Scanner::Plain => tokens.push(None, source),
    }
    tokens.finish()
}

#[derive(Default)]
struct Tokens {
    nodes: Vec<Node>,
    plain: String,
}

impl Tokens {
    fn push(&mut self, kind: Option<&str>, text: &str) {
        match kind {
            None => self.plain.push_str(text),
            Some(kind) => {
                self.flush();
                let span = Element::new("span")
                    .with_attr("class", format!("token {kind}"))
                    .with_text(text);
                self.nodes.push(span.into());
            }
        }
    }

    fn flush(&mut self) {
        if !self.plain.is_empty() {
            self.nodes.push(Node::Text(std::mem::take(&mut self.plain)));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.flush();
        self.nodes
    }
}

const OPERATORS: &[char] = &['+', '-', '*', '/', '%', '=', '&', '|', '<', '>', '!', '?', '^', '~'];
const PUNCTUATION: &[char] = &['{', '}', '[', ']', '(', ')', ';', ',', '.', ':'];

fn scan_code(grammar: &Grammar, src: &str, out: &mut Tokens) {
    let mut pos = 0;
    while pos < src.len() {
        let rest = &src[pos..];

        if grammar.line_comments.iter().any(|open| rest.starts_with(open)) {
            let end = rest.find('\n').unwrap_or(rest.len());
            out.push(Some("comment"), &rest[..end]);
            pos += end;
            continue;
        }

        if let Some((open, close)) = grammar.block_comment
            && rest.starts_with(open)
        {
            let end = rest[open.len()..]
                .find(close)
                .map_or(rest.len(), |idx| open.len() + idx + close.len());
            out.push(Some("comment"), &rest[..end]);
            pos += end;
            continue;
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };

        if grammar.quotes.contains(&ch) {
            let end = string_end(rest, ch);
            let kind = if grammar.keys_before_colon && followed_by_colon(&rest[end..]) {
                "property"
            } else {
                "string"
            };
            out.push(Some(kind), &rest[..end]);
            pos += end;
            continue;
        }

        if ch.is_ascii_digit() {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '_'))
                .unwrap_or(rest.len());
            out.push(Some("number"), &rest[..end]);
            pos += end;
            continue;
        }

        if ch.is_alphabetic() || ch == '_' || (ch != '-' && grammar.ident_extra.contains(&ch)) {
            let end = rest
                .char_indices()
                .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || grammar.ident_extra.contains(c)))
                .map_or(rest.len(), |(idx, _)| idx);
            let word = &rest[..end];
            let after = &rest[end..];
            let kind = if grammar.keys_before_colon && followed_by_colon(after) {
                Some("property")
            } else if grammar.keywords.contains(&word) {
                Some("keyword")
            } else if grammar.literals.contains(&word) {
                Some("constant")
            } else if after.starts_with('(') {
                Some("function")
            } else {
                None
            };
            out.push(kind, word);
            pos += end;
            continue;
        }

        let kind = if OPERATORS.contains(&ch) {
            Some("operator")
        } else if PUNCTUATION.contains(&ch) {
            Some("punctuation")
        } else {
            None
        };
        let len = ch.len_utf8();
        out.push(kind, &rest[..len]);
        pos += len;
    }
}

/// Byte length of the string literal starting at `rest[0]`.
///
/// Backtick strings may span lines; other quotes stop at a newline.
fn string_end(rest: &str, quote: char) -> usize {
    let mut chars = rest.char_indices().skip(1);
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '\n' if quote != '`' => return idx,
            c if c == quote => return idx + c.len_utf8(),
            _ => {}
        }
    }
    rest.len()
}

fn followed_by_colon(after: &str) -> bool {
    after.trim_start_matches([' ', '\t']).starts_with(':')
}

fn scan_markup(src: &str, out: &mut Tokens) {
    let mut pos = 0;
    while pos < src.len() {
        let rest = &src[pos..];
        if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(rest.len(), |idx| idx + 3);
            out.push(Some("comment"), &rest[..end]);
            pos += end;
            continue;
        }
        let opens_tag = rest.starts_with('<')
            && rest[1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?');
        if opens_tag {
            let end = rest.find('>').map_or(rest.len(), |idx| idx + 1);
            out.push(Some("tag"), &rest[..end]);
            pos += end;
            continue;
        }
        let first = rest.chars().next().map_or(1, char::len_utf8);
        let end = rest[first..].find('<').map_or(rest.len(), |idx| idx + first);
        out.push(None, &rest[..end]);
        pos += end;
    }
}

fn scan_diff(src: &str, out: &mut Tokens) {
    for line in src.split_inclusive('\n') {
        let kind = match line.as_bytes().first() {
            Some(b'+') => Some("inserted"),
            Some(b'-') => Some("deleted"),
            Some(b'@') => Some("coord"),
            _ => None,
        };
        out.push(kind, line);
    }
}
