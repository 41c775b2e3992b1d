//! Markdown body → HTML.
//!
//! Bodies are rendered with `pulldown-cmark`. Fenced code blocks are pulled
//! out of the event stream and handed to a [`Highlighter`]:
//!
//! - a block with a language tag (```` ```rust ````) is passed to
//!   [`Highlighter::highlight`] together with its language. The tag is the
//!   info string up to the first space or comma, so ```` ```rust,ignore ````
//!   is tagged `rust`;
//! - an untagged or indented block is emitted as an escaped
//!   `<pre><code>` block.
//!
//! The default [`ClassHighlighter`] emits `class="language-..."` markup that
//! a client-side highlighter can style. Anything else (a server-side
//! highlighter, a test double) plugs in through the trait.

use maud::html;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("unknown code block language `{0}`")]
    UnknownLanguage(String),
    #[error("highlighting failed: {0}")]
    Highlight(String),
}

/// Turns a tagged code block into HTML.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, language: &str) -> Result<String, RenderError>;
}

/// Emits `<pre><code class="language-{lang}">` with the code escaped.
///
/// Rejects language tags that could not name a lexer (anything outside
/// ASCII alphanumerics and `+ - _ . #`).
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassHighlighter;

impl Highlighter for ClassHighlighter {
    fn highlight(&self, code: &str, language: &str) -> Result<String, RenderError> {
        let valid = language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '.' | '#'));
        if !valid {
            return Err(RenderError::UnknownLanguage(language.to_string()));
        }
        let class = format!("language-{}", language.to_ascii_lowercase());
        Ok(html! {
            div.highlight {
                pre { code class=(class) { (code) } }
            }
        }
        .into_string())
    }
}

/// Markdown renderer with a pluggable code highlighter.
pub struct DocumentRenderer {
    highlighter: Box<dyn Highlighter>,
    options: Options,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new(ClassHighlighter)
    }
}

impl DocumentRenderer {
    pub fn new<H: Highlighter + 'static>(highlighter: H) -> Self {
        Self {
            highlighter: Box::new(highlighter),
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_FOOTNOTES,
        }
    }

    /// Render a markdown body. Pure: the same body always yields the same HTML.
    pub fn render(&self, body: &str) -> Result<String, RenderError> {
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut code: Option<(Option<String>, String)> = None;

        for event in Parser::new_ext(body, self.options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split(|c: char| c == ',' || c.is_whitespace())
                            .next()
                            .filter(|tag| !tag.is_empty())
                            .map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some((language, String::new()));
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, buffer)) = code.as_mut() {
                        buffer.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((language, buffer)) = code.take() {
                        let block = self.code_block(language.as_deref(), &buffer)?;
                        events.push(Event::Html(CowStr::from(block)));
                    }
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(body.len() * 3 / 2);
        md_html::push_html(&mut out, events.into_iter());
        Ok(out)
    }

    fn code_block(&self, language: Option<&str>, code: &str) -> Result<String, RenderError> {
        match language {
            Some(language) => self.highlighter.highlight(code, language),
            None => Ok(html! { pre { code { (code) } } }.into_string()),
        }
    }
}
