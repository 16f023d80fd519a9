//! HTML article extraction.
//!
//! Strategies are tried in order until one yields text:
//!
//! 1. JSON-LD `articleBody` (with `headline`), which many news sites embed for crawlers.
//! 2. Site rules: CSS selectors for the title, lead, and body paragraphs of known layouts.
//! 3. A generic fallback over `<article> <p>` (or every `<p>`) plus the first `<h1>`.
//!
//! Paragraphs that only wrap a link, carry a non-breaking space, or advertise embedded video
//! are treated as page furniture and dropped.

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const VIDEO_PROMO_MARKER: &str = "ZOBACZ WIDEO";

/// CSS selectors describing one known article layout.
#[derive(Debug, Clone, Copy)]
pub struct SiteRule {
    /// Host suffix the rule is restricted to; `None` applies the layout to any host.
    pub host_suffix: Option<&'static str>,
    /// Selector for the headline element.
    pub title: &'static str,
    /// Selector for the lead paragraph.
    pub lead: &'static str,
    /// Selector for the element containing body paragraphs.
    pub container: &'static str,
    /// Selector for body paragraphs inside the container.
    pub paragraph: &'static str,
}

/// Known layouts, most specific first.
pub const SITE_RULES: &[SiteRule] = &[
    SiteRule {
        host_suffix: Some("sportowefakty.wp.pl"),
        title: "h1.title",
        lead: "p.lead",
        container: "div.contentparts",
        paragraph: "p.contentpart--text",
    },
    SiteRule {
        host_suffix: None,
        title: "h1.article__header--title",
        lead: "p.article__heading",
        container: "div.article__paragraph-item",
        paragraph: "p",
    },
];

/// Extract article text from an HTML document served by `host`.
///
/// Returns an empty string when no strategy finds any text.
pub fn extract_article(html: &str, host: Option<&str>) -> String {
    let document = Html::parse_document(html);

    if let Some(text) = json_ld_article(&document) {
        tracing::debug!(strategy = "json-ld", "Article body located");
        return text;
    }

    let host = host.unwrap_or_default().to_lowercase();
    let matching_rules = SITE_RULES
        .iter()
        .filter(|rule| rule.host_suffix.is_some_and(|suffix| host.ends_with(suffix)))
        .chain(SITE_RULES.iter().filter(|rule| rule.host_suffix.is_none()));
    for rule in matching_rules {
        if let Some(text) = apply_rule(&document, rule) {
            tracing::debug!(strategy = "site-rule", container = rule.container, "Article body located");
            return text;
        }
    }

    generic_article(&document).unwrap_or_default()
}

fn json_ld_article(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    for script in document.select(&selector) {
        let raw: String = script.text().collect();
        let Ok(payload) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        for object in json_ld_objects(&payload) {
            let Some(body) = object.get("articleBody").and_then(Value::as_str) else {
                continue;
            };
            let body = clean_html_fragment(body);
            if body.is_empty() {
                continue;
            }
            let headline = object
                .get("headline")
                .and_then(Value::as_str)
                .map(normalize_whitespace)
                .filter(|headline| !headline.is_empty());
            return Some(match headline {
                Some(headline) => format!("{headline}.{PARAGRAPH_SEPARATOR}{body}"),
                None => body,
            });
        }
    }
    None
}

fn json_ld_objects(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().flat_map(json_ld_objects).collect(),
        Value::Object(object) => match object.get("@graph") {
            Some(graph) => json_ld_objects(graph),
            None => vec![object],
        },
        _ => Vec::new(),
    }
}

/// Strip markup from an HTML fragment, keeping one paragraph per text node.
fn clean_html_fragment(fragment: &str) -> String {
    let mut text = fragment_text(fragment);
    // Bodies are sometimes HTML-escaped twice; a second pass removes the decoded tags.
    if text.contains("</") {
        text = fragment_text(&text);
    }
    text
}

fn fragment_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}

fn apply_rule(document: &Html, rule: &SiteRule) -> Option<String> {
    let container_selector = Selector::parse(rule.container).ok()?;
    let paragraph_selector = Selector::parse(rule.paragraph).ok()?;
    let container = document.select(&container_selector).next()?;

    let paragraphs: Vec<String> = container
        .select(&paragraph_selector)
        .filter_map(body_paragraph)
        .collect();
    if paragraphs.is_empty() {
        return None;
    }

    let mut parts = Vec::with_capacity(paragraphs.len() + 2);
    parts.extend(first_text(document, rule.title));
    parts.extend(first_text(document, rule.lead));
    parts.extend(paragraphs);
    Some(parts.join(PARAGRAPH_SEPARATOR))
}

fn generic_article(document: &Html) -> Option<String> {
    let article_paragraphs = Selector::parse("article p").ok()?;
    let any_paragraph = Selector::parse("p").ok()?;

    let mut paragraphs: Vec<String> = document
        .select(&article_paragraphs)
        .filter_map(body_paragraph)
        .collect();
    if paragraphs.is_empty() {
        paragraphs = document
            .select(&any_paragraph)
            .filter_map(body_paragraph)
            .collect();
    }
    if paragraphs.is_empty() {
        return None;
    }

    let mut parts = Vec::with_capacity(paragraphs.len() + 1);
    parts.extend(first_text(document, "h1"));
    parts.extend(paragraphs);
    Some(parts.join(PARAGRAPH_SEPARATOR))
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

/// Keep a paragraph only if it carries article prose.
fn body_paragraph(paragraph: ElementRef<'_>) -> Option<String> {
    let raw: String = paragraph.text().collect();
    if raw.contains('\u{a0}') || raw.contains(VIDEO_PROMO_MARKER) {
        return None;
    }
    let text = normalize_whitespace(&raw);
    if text.is_empty() {
        return None;
    }

    let link_selector = Selector::parse("a").ok()?;
    if let Some(link) = paragraph.select(&link_selector).next() {
        let link_text = normalize_whitespace(&link.text().collect::<String>());
        if link_text == text {
            return None;
        }
    }
    Some(text)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
