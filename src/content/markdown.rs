//! Markdown rendering with syntax highlighting

use anyhow::{bail, Result};
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::MarkdownConfig;

/// Anything that turns a markdown body into an HTML fragment
pub trait Render {
    fn render(&self, markdown: &str) -> Result<String>;
}

impl<F> Render for F
where
    F: Fn(&str) -> Result<String>,
{
    fn render(&self, markdown: &str) -> Result<String> {
        self(markdown)
    }
}

/// Syntect state for fenced code blocks
struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

/// Markdown renderer with optional syntax highlighting
pub struct MarkdownRenderer {
    options: Options,
    highlighter: Option<Highlighter>,
}

impl MarkdownRenderer {
    /// Create a renderer with default settings
    pub fn new() -> Self {
        Self {
            options: base_options() | Options::ENABLE_SMART_PUNCTUATION,
            highlighter: None,
        }
    }

    /// Create a renderer from the site's markdown settings
    pub fn with_config(config: &MarkdownConfig) -> Result<Self> {
        let mut options = base_options();
        if config.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }

        let highlighter = if config.highlight {
            let mut themes = ThemeSet::load_defaults().themes;
            let Some(theme) = themes.remove(&config.theme) else {
                bail!("Unknown highlight theme: {}", config.theme);
            };
            Some(Highlighter {
                syntax_set: SyntaxSet::load_defaults_newlines(),
                theme,
                line_numbers: config.line_numbers,
            })
        } else {
            None
        };

        Ok(Self {
            options,
            highlighter,
        })
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        let parser = Parser::new_ext(markdown, self.options);
        let mut html_output = String::new();

        let Some(highlighter) = &self.highlighter else {
            html::push_html(&mut html_output, parser);
            return Ok(html_output);
        };

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in parser {
            if let Some((lang, code)) = code_block.as_mut() {
                match event {
                    Event::Text(text) => code.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let highlighted = highlighter.highlight(code, lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                        code_block = None;
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    // Only the first word of the info string names the language
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().map(str::to_string)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                event => events.push(event),
            }
        }

        html::push_html(&mut html_output, events.into_iter());
        Ok(html_output)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String> {
        MarkdownRenderer::render(self, markdown)
    }
}

impl Highlighter {
    /// Highlight a code block, falling back to an escaped plain block
    fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");
        let class = html_escape(lang);

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        match highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme) {
            Ok(highlighted) if self.line_numbers => with_line_numbers(&highlighted, &class),
            Ok(highlighted) => format!(
                r#"<figure class="highlight {}">{}</figure>"#,
                class, highlighted
            ),
            Err(e) => {
                tracing::debug!("Highlighting {} failed: {}", lang, e);
                format!(
                    r#"<pre><code class="language-{}">{}</code></pre>"#,
                    class,
                    html_escape(code)
                )
            }
        }
    }
}

fn base_options() -> Options {
    // No YAML metadata blocks: front-matter is split off before rendering
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Wrap highlighted code in a gutter table. `class` must already be escaped.
fn with_line_numbers(code: &str, class: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let gutter: Vec<String> = (1..=lines.len())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect();

    format!(
        r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
        class,
        gutter.join("\n"),
        lines.join("\n")
    )
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
