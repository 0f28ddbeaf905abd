//! Blanking of top-level MDX `import`/`export` blocks.
//!
//! markdown-rs only recognises ESM when given a JavaScript parser, so MDX
//! bodies are pre-processed instead: a line starting with `import ` or
//! `export ` that starts a new block (first line, after a blank line or after a
//! closing code fence) opens an ESM block that runs until the next blank line.
//! Continuation lines of a paragraph are never ESM. Blocks are replaced by
//! empty lines so parser line numbers stay aligned with the source file.

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, Default)]
struct Fence {
    marker: u8,
    length: usize,
}

/// Returns `body` with ESM blocks blanked out.
pub fn blank_esm(body: &str) -> Cow<'_, str> {
    if !body.contains("import ") && !body.contains("export ") {
        return Cow::Borrowed(body);
    }

    let mut out = String::with_capacity(body.len());
    let mut fence: Option<Fence> = None;
    let mut in_esm = false;
    let mut block_start = true;
    let mut changed = false;

    for line in body.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let is_blank = content.trim().is_empty();

        if in_esm {
            if is_blank {
                in_esm = false;
                block_start = true;
                out.push_str(line);
            } else {
                blank(line, &mut out);
            }
            continue;
        }

        match fence {
            Some(open) => {
                if closes(content, open) {
                    fence = None;
                    block_start = true;
                }
                out.push_str(line);
            }
            None => {
                if let Some(open) = opens(content) {
                    fence = Some(open);
                    out.push_str(line);
                } else if block_start
                    && (content.starts_with("import ") || content.starts_with("export "))
                {
                    in_esm = true;
                    changed = true;
                    blank(line, &mut out);
                } else {
                    block_start = is_blank;
                    out.push_str(line);
                }
            }
        }
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(body)
    }
}

fn blank(line: &str, out: &mut String) {
    if line.ends_with('\n') {
        out.push('\n');
    }
}

fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ').count()
}

fn fence_run(line: &str) -> Option<Fence> {
    let trimmed = &line[leading_spaces(line)..];
    let marker = *trimmed.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let length = trimmed.bytes().take_while(|b| *b == marker).count();
    (length >= 3).then_some(Fence { marker, length })
}

fn opens(line: &str) -> Option<Fence> {
    if leading_spaces(line) > 3 {
        return None;
    }
    fence_run(line)
}

fn closes(line: &str, open: Fence) -> bool {
    if leading_spaces(line) > 3 {
        return false;
    }
    match fence_run(line) {
        Some(close) => {
            let rest = line.trim_start_matches(' ')[close.length..].trim();
            close.marker == open.marker && close.length >= open.length && rest.is_empty()
        }
        None => false,
    }
}
