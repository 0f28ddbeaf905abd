//! Token grammars for the bundled languages.
//!
//! Grammars are small declarative tables driving one shared scanner. They
//! only need to recognise comments, strings, numbers, keywords and
//! punctuation well enough for colouring.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// How a language is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scanner {
    /// C-like token scanning driven by the grammar tables.
    Code,
    /// Tags and comments of HTML/XML.
    Markup,
    /// Unified diff lines.
    Diff,
    /// No tokens at all.
    Plain,
}

/// A language definition.
#[derive(Debug)]
pub struct Grammar {
    /// Canonical name, used in output classes.
    pub name: &'static str,
    /// Alternative fence tags.
    pub aliases: &'static [&'static str],
    /// Scanner driving the grammar.
    pub scanner: Scanner,
    /// Line comment openers.
    pub line_comments: &'static [&'static str],
    /// Block comment delimiters.
    pub block_comment: Option<(&'static str, &'static str)>,
    /// String quote characters.
    pub quotes: &'static [char],
    /// Reserved words.
    pub keywords: &'static [&'static str],
    /// Literal words (`true`, `null`, …).
    pub literals: &'static [&'static str],
    /// Identifiers followed by `:` are keys (YAML, TOML tables, JSON strings).
    pub keys_before_colon: bool,
    /// Characters allowed inside identifiers besides alphanumerics and `_`.
    pub ident_extra: &'static [char],
}

impl Grammar {
    const fn code(name: &'static str) -> Self {
        Self {
            name,
            aliases: &[],
            scanner: Scanner::Code,
            line_comments: &[],
            block_comment: None,
            quotes: &['"', '\''],
            keywords: &[],
            literals: &[],
            keys_before_colon: false,
            ident_extra: &[],
        }
    }
}

const JS_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "finally", "for", "from", "function",
    "get", "if", "import", "in", "instanceof", "let", "new", "of", "return", "set", "static",
    "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while", "with", "yield",
];

const TS_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "break", "case", "catch", "class", "const", "continue",
    "declare", "default", "delete", "do", "else", "enum", "export", "extends", "finally", "for",
    "from", "function", "get", "if", "implements", "import", "in", "infer", "instanceof",
    "interface", "keyof", "let", "namespace", "new", "of", "private", "protected", "public",
    "readonly", "return", "satisfies", "set", "static", "super", "switch", "this", "throw", "try",
    "type", "typeof", "var", "void", "while", "yield",
];

const JS_LITERALS: &[&str] = &["true", "false", "null", "undefined", "NaN", "Infinity"];

static GRAMMARS: Lazy<Vec<Grammar>> = Lazy::new(|| {
    vec![
        Grammar {
            aliases: &["js", "jsx", "mjs", "cjs"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            quotes: &['"', '\'', '`'],
            keywords: JS_KEYWORDS,
            literals: JS_LITERALS,
            ident_extra: &['$'],
            ..Grammar::code("javascript")
        },
        Grammar {
            aliases: &["ts", "tsx", "mts"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            quotes: &['"', '\'', '`'],
            keywords: TS_KEYWORDS,
            literals: JS_LITERALS,
            ident_extra: &['$'],
            ..Grammar::code("typescript")
        },
        Grammar {
            aliases: &["rs"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            quotes: &['"'],
            keywords: &[
                "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else",
                "enum", "extern", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
                "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct",
                "super", "trait", "type", "unsafe", "use", "where", "while",
            ],
            literals: &["true", "false", "None", "Some", "Ok", "Err"],
            ..Grammar::code("rust")
        },
        Grammar {
            aliases: &["py"],
            line_comments: &["#"],
            keywords: &[
                "and", "as", "assert", "async", "await", "break", "class", "continue", "def",
                "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
                "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
                "return", "try", "while", "with", "yield",
            ],
            literals: &["True", "False", "None"],
            ..Grammar::code("python")
        },
        Grammar {
            aliases: &["sh", "shell", "zsh", "console"],
            line_comments: &["#"],
            keywords: &[
                "case", "do", "done", "elif", "else", "esac", "export", "fi", "for", "function",
                "if", "in", "local", "return", "then", "until", "while",
            ],
            literals: &["true", "false"],
            ident_extra: &['-'],
            ..Grammar::code("bash")
        },
        Grammar {
            aliases: &["jsonc", "json5"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            quotes: &['"'],
            literals: &["true", "false", "null"],
            keys_before_colon: true,
            ..Grammar::code("json")
        },
        Grammar {
            aliases: &["scss", "less"],
            block_comment: Some(("/*", "*/")),
            keywords: &["@media", "@import", "@font-face", "@keyframes", "@supports", "!important"],
            ident_extra: &['-', '@', '!'],
            ..Grammar::code("css")
        },
        Grammar {
            aliases: &["yml"],
            line_comments: &["#"],
            literals: &["true", "false", "null", "yes", "no", "on", "off"],
            keys_before_colon: true,
            ident_extra: &['-'],
            ..Grammar::code("yaml")
        },
        Grammar {
            line_comments: &["#"],
            literals: &["true", "false"],
            keys_before_colon: false,
            ident_extra: &['-'],
            ..Grammar::code("toml")
        },
        Grammar {
            aliases: &["golang"],
            line_comments: &["//"],
            block_comment: Some(("/*", "*/")),
            quotes: &['"', '\'', '`'],
            keywords: &[
                "break", "case", "chan", "const", "continue", "default", "defer", "else",
                "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
                "package", "range", "return", "select", "struct", "switch", "type", "var",
            ],
            literals: &["true", "false", "nil", "iota"],
            ..Grammar::code("go")
        },
        Grammar {
            line_comments: &["--"],
            block_comment: Some(("/*", "*/")),
            keywords: &[
                "select", "from", "where", "insert", "into", "values", "update", "set", "delete",
                "create", "table", "drop", "alter", "join", "left", "right", "inner", "outer",
                "on", "group", "by", "order", "limit", "as", "and", "or", "not", "in", "is",
                "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "UPDATE", "SET", "DELETE",
                "CREATE", "TABLE", "DROP", "ALTER", "JOIN", "LEFT", "RIGHT", "INNER", "OUTER",
                "ON", "GROUP", "BY", "ORDER", "LIMIT", "AS", "AND", "OR", "NOT", "IN", "IS",
            ],
            literals: &["null", "NULL", "true", "false", "TRUE", "FALSE"],
            ..Grammar::code("sql")
        },
        Grammar {
            aliases: &["html", "xml", "svg"],
            scanner: Scanner::Markup,
            ..Grammar::code("markup")
        },
        Grammar {
            aliases: &["patch"],
            scanner: Scanner::Diff,
            ..Grammar::code("diff")
        },
        Grammar {
            aliases: &["text", "txt", "plain"],
            scanner: Scanner::Plain,
            ..Grammar::code("plaintext")
        },
    ]
});

static BY_NAME: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (idx, grammar) in GRAMMARS.iter().enumerate() {
        map.insert(grammar.name, idx);
        for alias in grammar.aliases {
            map.insert(*alias, idx);
        }
    }
    map
});

/// Looks up a grammar by canonical name or alias (case-insensitive).
pub fn find(language: &str) -> Option<&'static Grammar> {
    let key = language.trim().to_ascii_lowercase();
    BY_NAME.get(key.as_str()).map(|idx| &GRAMMARS[*idx])
}

/// Whether a grammar exists for the language.
pub fn is_supported(language: &str) -> bool {
    find(language).is_some()
}
