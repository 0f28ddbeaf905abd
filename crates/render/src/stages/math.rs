//! Server-side rendering of TeX math into HTML.
//!
//! Covers the subset used in posts: letters and numbers, Greek letters and
//! common symbols, `^`/`_` scripts, `\frac`, `\sqrt`, `\text` and font
//! commands, `\left`/`\right` delimiters and spacing commands.

use crate::error::TransformStageError;
use crate::hast::{Element, Node};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage name used in configuration and errors.
pub const NAME: &str = "math";

/// Options for the math stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MathOptions {
    /// Fail the document on invalid TeX instead of rendering an error marker.
    pub throw_on_error: bool,
}

/// Invalid TeX input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathError(String);

impl fmt::Display for MathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders every `.math-inline` and `.math-display` element.
pub fn apply(nodes: &mut [Node], options: &MathOptions) -> Result<(), TransformStageError> {
    for node in nodes {
        let Node::Element(el) = node else {
            continue;
        };
        if el.has_class("math") && (el.has_class("math-inline") || el.has_class("math-display")) {
            render_element(el, options)?;
        } else {
            apply(&mut el.children, options)?;
        }
    }
    Ok(())
}

fn render_element(el: &mut Element, options: &MathOptions) -> Result<(), TransformStageError> {
    let tex = el.text_content();
    match render_tex(&tex) {
        Ok(children) => {
            let katex = Element::new("span")
                .with_attr("class", "katex")
                .with_children(children);
            el.children = if el.has_class("math-display") {
                vec![
                    Element::new("span")
                        .with_attr("class", "katex-display")
                        .with_children(vec![katex.into()])
                        .into(),
                ]
            } else {
                vec![katex.into()]
            };
            Ok(())
        }
        Err(err) if options.throw_on_error => Err(TransformStageError::new(
            NAME,
            format!("{err} in `{tex}`"),
        )),
        Err(err) => {
            log::warn!("invalid math `{tex}`: {err}");
            el.children = vec![
                Element::new("span")
                    .with_attr("class", "katex-error")
                    .with_attr("title", err.to_string())
                    .with_text(tex)
                    .into(),
            ];
            Ok(())
        }
    }
}

/// Renders a TeX expression into HTML nodes.
pub fn render_tex(tex: &str) -> Result<Vec<Node>, MathError> {
    let mut parser = Parser {
        chars: tex.chars().collect(),
        pos: 0,
        depth: 0,
    };
    parser.expression(false)
}

/// Deepest group/argument nesting accepted before giving up.
const MAX_DEPTH: usize = 256;

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expression(&mut self, in_group: bool) -> Result<Vec<Node>, MathError> {
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None if in_group => return Err(MathError("missing closing brace".into())),
                None => break,
                Some('}') if in_group => {
                    self.pos += 1;
                    break;
                }
                Some('}') => return Err(MathError("unexpected `}`".into())),
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some(script @ ('^' | '_')) => {
                    self.pos += 1;
                    let tag = if script == '^' { "sup" } else { "sub" };
                    let body = self.argument()?;
                    out.push(Element::new(tag).with_children(body).into());
                }
                Some(_) => out.extend(self.atom()?),
            }
        }
        Ok(out)
    }

    fn argument(&mut self) -> Result<Vec<Node>, MathError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(MathError("expected an argument".into()));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Vec<Node>, MathError> {
        if self.depth >= MAX_DEPTH {
            return Err(MathError("nesting too deep".into()));
        }
        self.depth += 1;
        let nodes = self.nested_atom();
        self.depth -= 1;
        nodes
    }

    fn nested_atom(&mut self) -> Result<Vec<Node>, MathError> {
        let Some(ch) = self.peek() else {
            return Err(MathError("expected an argument".into()));
        };
        self.pos += 1;
        match ch {
            '{' => self.expression(true),
            '\\' => self.command(),
            c if c.is_alphabetic() => Ok(vec![Element::new("i").with_text(c.to_string()).into()]),
            c if c.is_ascii_digit() => {
                let mut number = c.to_string();
                while let Some(next) = self.peek().filter(|n| n.is_ascii_digit() || *n == '.') {
                    number.push(next);
                    self.pos += 1;
                }
                Ok(vec![Node::Text(number)])
            }
            '+' | '=' | '<' | '>' => Ok(vec![operator(&ch.to_string())]),
            '-' => Ok(vec![operator("\u{2212}")]),
            '*' => Ok(vec![operator("\u{2217}")]),
            '\'' => Ok(vec![Node::text("\u{2032}")]),
            other => Ok(vec![Node::Text(other.to_string())]),
        }
    }

    fn command(&mut self) -> Result<Vec<Node>, MathError> {
        let Some(first) = self.peek() else {
            return Err(MathError("unfinished command `\\`".into()));
        };
        let name: String = if first.is_ascii_alphabetic() {
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                self.pos += 1;
            }
            self.chars[start..self.pos].iter().collect()
        } else {
            self.pos += 1;
            first.to_string()
        };

        let nodes = match name.as_str() {
            "frac" | "dfrac" | "tfrac" => {
                let numerator = self.argument()?;
                let denominator = self.argument()?;
                vec![
                    span("mfrac", vec![span("mnum", numerator), span("mden", denominator)]),
                ]
            }
            "sqrt" => {
                let index = self.optional_bracket();
                let radicand = self.argument()?;
                let mut children = Vec::new();
                if let Some(index) = index {
                    children.push(Element::new("sup").with_text(index).into());
                }
                children.push(Node::text("\u{221a}"));
                children.push(span("msqrt-body", radicand));
                vec![span("msqrt", children)]
            }
            "text" | "textrm" | "mathrm" | "operatorname" => {
                vec![span("mtext", vec![Node::Text(self.raw_group()?)])]
            }
            "mathbf" | "boldsymbol" => vec![Element::new("b").with_children(self.argument()?).into()],
            "mathit" => vec![Element::new("i").with_children(self.argument()?).into()],
            "left" | "right" | "big" | "Big" | "bigl" | "bigr" => {
                self.skip_whitespace();
                if self.peek() == Some('.') {
                    self.pos += 1;
                    Vec::new()
                } else {
                    self.argument()?
                }
            }
            "," | ":" | ";" | " " => vec![Node::text("\u{2009}")],
            "!" => Vec::new(),
            "quad" => vec![Node::text("\u{2003}")],
            "qquad" => vec![Node::text("\u{2003}\u{2003}")],
            "\\" => vec![Element::new("br").into()],
            "{" | "}" | "$" | "%" | "&" | "_" | "#" => vec![Node::Text(name.clone())],
            "sin" | "cos" | "tan" | "log" | "ln" | "exp" | "lim" | "max" | "min" | "det"
            | "gcd" | "deg" => vec![span("mop", vec![Node::Text(name.clone())])],
            other => match symbol(other) {
                Some(symbol) => vec![Node::text(symbol)],
                None => {
                    return Err(MathError(format!("undefined control sequence `\\{other}`")));
                }
            },
        };
        Ok(nodes)
    }

    /// Contents of a `{…}` group taken verbatim.
    fn raw_group(&mut self) -> Result<String, MathError> {
        self.skip_whitespace();
        if self.peek() != Some('{') {
            return Err(MathError("expected `{`".into()));
        }
        self.pos += 1;
        let mut depth = 1;
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            self.pos += 1;
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                }
                _ => {}
            }
            out.push(ch);
        }
        Err(MathError("missing closing brace".into()))
    }

    fn optional_bracket(&mut self) -> Option<String> {
        self.skip_whitespace();
        if self.peek() != Some('[') {
            return None;
        }
        let close = self.chars[self.pos..].iter().position(|c| *c == ']')?;
        let inner: String = self.chars[self.pos + 1..self.pos + close].iter().collect();
        self.pos += close + 1;
        Some(inner)
    }
}

fn span(class: &str, children: Vec<Node>) -> Node {
    Element::new("span")
        .with_attr("class", class)
        .with_children(children)
        .into()
}

fn operator(text: &str) -> Node {
    span("mo", vec![Node::text(text)])
}

const SYMBOLS: &[(&str, &str)] = &[
    ("alpha", "α"), ("beta", "β"), ("gamma", "γ"), ("delta", "δ"), ("epsilon", "ϵ"),
    ("varepsilon", "ε"), ("zeta", "ζ"), ("eta", "η"), ("theta", "θ"), ("iota", "ι"),
    ("kappa", "κ"), ("lambda", "λ"), ("mu", "μ"), ("nu", "ν"), ("xi", "ξ"), ("pi", "π"),
    ("rho", "ρ"), ("sigma", "σ"), ("tau", "τ"), ("upsilon", "υ"), ("phi", "ϕ"),
    ("varphi", "φ"), ("chi", "χ"), ("psi", "ψ"), ("omega", "ω"), ("Gamma", "Γ"),
    ("Delta", "Δ"), ("Theta", "Θ"), ("Lambda", "Λ"), ("Xi", "Ξ"), ("Pi", "Π"),
    ("Sigma", "Σ"), ("Phi", "Φ"), ("Psi", "Ψ"), ("Omega", "Ω"),
    ("cdot", "⋅"), ("times", "×"), ("div", "÷"), ("pm", "±"), ("mp", "∓"),
    ("le", "≤"), ("leq", "≤"), ("ge", "≥"), ("geq", "≥"), ("ne", "≠"), ("neq", "≠"),
    ("approx", "≈"), ("equiv", "≡"), ("sim", "∼"), ("propto", "∝"), ("infty", "∞"),
    ("sum", "∑"), ("prod", "∏"), ("int", "∫"), ("oint", "∮"), ("partial", "∂"),
    ("nabla", "∇"), ("to", "→"), ("rightarrow", "→"), ("leftarrow", "←"),
    ("Rightarrow", "⇒"), ("Leftarrow", "⇐"), ("Leftrightarrow", "⇔"), ("mapsto", "↦"),
    ("in", "∈"), ("notin", "∉"), ("subset", "⊂"), ("subseteq", "⊆"), ("cup", "∪"),
    ("cap", "∩"), ("emptyset", "∅"), ("forall", "∀"), ("exists", "∃"), ("neg", "¬"),
    ("land", "∧"), ("lor", "∨"), ("ldots", "…"), ("cdots", "⋯"), ("dots", "…"),
    ("langle", "⟨"), ("rangle", "⟩"), ("lfloor", "⌊"), ("rfloor", "⌋"), ("lceil", "⌈"),
    ("rceil", "⌉"), ("mid", "∣"), ("circ", "∘"), ("prime", "′"), ("hbar", "ℏ"),
    ("ell", "ℓ"),
];

fn symbol(name: &str) -> Option<&'static str> {
    SYMBOLS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hast::to_html;

    fn tex(input: &str) -> String {
        to_html(&render_tex(input).unwrap())
    }

    fn inline(input: &str) -> Vec<Node> {
        vec![
            Element::new("span")
                .with_attr("class", "math math-inline")
                .with_text(input)
                .into(),
        ]
    }

    #[test]
    fn scripts_and_variables() {
        assert_eq!(tex("x^2"), "<i>x</i><sup>2</sup>");
        assert_eq!(tex("a_{i+1}"), r#"<i>a</i><sub><i>i</i><span class="mo">+</span>1</sub>"#);
    }

    #[test]
    fn fractions_and_roots() {
        assert_eq!(
            tex(r"\frac{a}{b}"),
            r#"<span class="mfrac"><span class="mnum"><i>a</i></span><span class="mden"><i>b</i></span></span>"#
        );
        assert_eq!(
            tex(r"\sqrt{2}"),
            r#"<span class="msqrt">√<span class="msqrt-body">2</span></span>"#
        );
    }

    #[test]
    fn symbols_and_text() {
        assert_eq!(tex(r"\alpha \le \pi"), "α≤π");
        assert_eq!(tex(r"\text{if } x"), r#"<span class="mtext">if </span><i>x</i>"#);
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(render_tex(r"\nosuchthing").is_err());
        assert!(render_tex("{x").is_err());
        assert!(render_tex("x}").is_err());
        assert!(render_tex(r"\frac{a}").is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let deep = format!("{}x{}", "{".repeat(200_000), "}".repeat(200_000));
        let err = render_tex(&deep).unwrap_err();
        assert_eq!(err.to_string(), "nesting too deep");

        let roots = format!("{}x", r"\sqrt".repeat(1_000));
        assert!(render_tex(&roots).is_err());

        let shallow = format!("{}x{}", "{".repeat(100), "}".repeat(100));
        assert_eq!(tex(&shallow), "<i>x</i>");
    }

    #[test]
    fn renders_math_elements() {
        let mut nodes = inline("E = mc^2");
        apply(&mut nodes, &MathOptions::default()).unwrap();
        let html = to_html(&nodes);
        assert!(
            html.starts_with(r#"<span class="math math-inline"><span class="katex"><i>E</i>"#),
            "{html}"
        );
        assert!(html.contains("<sup>2</sup>"));
    }

    #[test]
    fn display_math_is_wrapped() {
        let mut nodes: Vec<Node> = vec![
            Element::new("div")
                .with_attr("class", "math math-display")
                .with_text("x")
                .into(),
        ];
        apply(&mut nodes, &MathOptions::default()).unwrap();
        assert_eq!(
            to_html(&nodes),
            r#"<div class="math math-display"><span class="katex-display"><span class="katex"><i>x</i></span></span></div>"#
        );
    }

    #[test]
    fn errors_render_marker_unless_throwing() {
        let mut nodes = inline(r"\oops");
        apply(&mut nodes, &MathOptions::default()).unwrap();
        assert!(to_html(&nodes).contains(r#"<span class="katex-error" title="undefined control sequence `\oops`">\oops</span>"#));

        let mut nodes = inline(r"\oops");
        let err = apply(&mut nodes, &MathOptions { throw_on_error: true }).unwrap_err();
        assert_eq!(err.stage, NAME);
    }
}
