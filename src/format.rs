//! formatting transform for assistant-authored text.
//!
//! escape first, then introduce markup: `[label](url)` links, `\n` line
//! breaks, and a styling span around the 👉 glyph. anything that does not
//! match a well-formed link stays as escaped literal text.

use regex::Regex;
use std::sync::LazyLock;

/// `[label](url)`; label has no `]`, url has no `)`.
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern"));

const POINTER: char = '👉';
const LINK_CLASS: &str = "text-teal-400 hover:text-teal-300 underline font-medium";
const POINTER_HTML: &str = "<span class=\"mr-1\">👉</span>";

/// one display unit of formatted assistant text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Link { label: String, url: String },
    LineBreak,
    Pointer,
}

/// assistant text after the formatting transform.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Markup {
    pub fragments: Vec<Fragment>,
}

impl Markup {
    /// split raw text into fragments. never fails.
    ///
    /// escaping does not touch brackets or parens, so matching links on the
    /// raw text finds exactly the spans that matching on escaped text would.
    pub fn parse(text: &str) -> Self {
        let mut fragments = Vec::new();
        let mut last = 0;
        for caps in LINK.captures_iter(text) {
            let (Some(whole), Some(label), Some(url)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            push_inline(&mut fragments, &text[last..whole.start()]);
            fragments.push(Fragment::Link {
                label: label.as_str().to_string(),
                url: url.as_str().to_string(),
            });
            last = whole.end();
        }
        push_inline(&mut fragments, &text[last..]);
        Self { fragments }
    }

    /// html safe to insert as parsed markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for f in &self.fragments {
            match f {
                Fragment::Text(s) => out.push_str(&escape_html(s)),
                Fragment::LineBreak => out.push_str("<br>"),
                Fragment::Pointer => out.push_str(POINTER_HTML),
                Fragment::Link { label, url } => {
                    out.push_str("<a href=\"");
                    out.push_str(&escape_attr(url));
                    out.push_str("\" class=\"");
                    out.push_str(LINK_CLASS);
                    out.push_str("\">");
                    out.push_str(&inline_html(label));
                    out.push_str("</a>");
                }
            }
        }
        out
    }

    /// text with markup removed (links collapse to their label).
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for f in &self.fragments {
            match f {
                Fragment::Text(s) => out.push_str(s),
                Fragment::Link { label, .. } => out.push_str(label),
                Fragment::LineBreak => out.push('\n'),
                Fragment::Pointer => out.push(POINTER),
            }
        }
        out
    }
}

/// full transform: raw assistant text to html.
pub fn format_assistant(text: &str) -> String {
    Markup::parse(text).to_html()
}

/// escape `&`, `<`, `>`. single pass, so `&` is never escaped twice.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

// href values are quoted, so `"` must not terminate the attribute early.
fn escape_attr(s: &str) -> String {
    escape_html(s).replace('"', "&quot;")
}

fn inline_html(s: &str) -> String {
    let mut frags = Vec::new();
    push_inline(&mut frags, s);
    Markup { fragments: frags }.to_html()
}

fn push_inline(out: &mut Vec<Fragment>, s: &str) {
    let mut buf = String::new();
    for c in s.chars() {
        match c {
            '\n' | POINTER => {
                if !buf.is_empty() {
                    out.push(Fragment::Text(std::mem::take(&mut buf)));
                }
                out.push(if c == '\n' { Fragment::LineBreak } else { Fragment::Pointer });
            }
            _ => buf.push(c),
        }
    }
    if !buf.is_empty() {
        out.push(Fragment::Text(buf));
    }
}
