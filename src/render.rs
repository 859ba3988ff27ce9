//! Markdown to HTML rendering for `html` mode.
//!
//! The pipeline only needs `render(markdown) -> html`; [`MarkdownRenderer`] is
//! the seam so tests and embedders can swap the implementation.
//! [`CmarkRenderer`] is the stock one, built on pulldown-cmark:
//!
//! - soft line breaks become `<br />`
//! - smart punctuation (curly quotes, dashes, ellipses)
//! - definition lists, tables, strikethrough
//! - links to `http(s)` targets open in a new tab (`target="_blank"`)

use crate::config::RenderConfig;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

/// Converts a Markdown body into HTML.
pub trait MarkdownRenderer: Sync {
    fn render(&self, markdown: &str) -> String;
}

/// Renderer switches. Defaults match the stock config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub smart_punctuation: bool,
    pub hard_breaks: bool,
    pub definition_lists: bool,
    pub external_links_new_tab: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            smart_punctuation: true,
            hard_breaks: true,
            definition_lists: true,
            external_links_new_tab: true,
        }
    }
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            smart_punctuation: config.smart_punctuation,
            hard_breaks: config.hard_breaks,
            definition_lists: config.definition_lists,
            external_links_new_tab: config.external_links_new_tab,
        }
    }
}

/// pulldown-cmark backed renderer.
#[derive(Debug, Clone, Default)]
pub struct CmarkRenderer {
    options: RenderOptions,
}

impl CmarkRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        if self.options.smart_punctuation {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        if self.options.definition_lists {
            options.insert(Options::ENABLE_DEFINITION_LIST);
        }
        options
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let hard_breaks = self.options.hard_breaks;
        let new_tab = self.options.external_links_new_tab;

        let events = Parser::new_ext(markdown, self.parser_options()).map(|event| match event {
            Event::SoftBreak if hard_breaks => Event::HardBreak,
            Event::Start(Tag::Link {
                ref dest_url,
                ref title,
                ..
            }) if new_tab && is_external(dest_url) => {
                Event::InlineHtml(CowStr::from(external_anchor(dest_url, title)))
            }
            other => other,
        });

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events);
        out
    }
}

/// Render with the stock options.
pub fn render_markdown(markdown: &str) -> String {
    CmarkRenderer::default().render(markdown)
}

fn is_external(href: &str) -> bool {
    href.contains("http")
}

/// Opening `<a>` tag; the closing tag comes from the regular link end event.
fn external_anchor(href: &str, title: &str) -> String {
    let mut tag = format!(r#"<a href="{}""#, escape_attr(href));
    if !title.is_empty() {
        tag.push_str(&format!(r#" title="{}""#, escape_attr(title)));
    }
    tag.push_str(r#" target="_blank">"#);
    tag
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
