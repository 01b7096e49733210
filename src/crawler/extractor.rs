//! Profile field extraction
//!
//! Pure extraction of structured company attributes from a captured rendered
//! document. Every field is recovered by an independent strategy with a
//! fallback where the page structure is known to vary; a field that cannot
//! be recovered is simply absent. Nothing here touches the browser, so the
//! whole module is testable against fixture documents.

use crate::url::batch_from_url;
use scraper::{ElementRef, Html, Selector};

/// Heading element carrying the company name
pub const TITLE_SELECTOR: &str = "h1";

/// Founder info block; part of the readiness gate together with the title
pub const FOUNDER_BLOCK_SELECTOR: &str = "div.group.flex.gap-4";

/// Grid of founder cards
const FOUNDER_CARD_SELECTOR: &str = "div.grid div.ycdc-card-new";

/// Labeled name node inside a founder card
const FOUNDER_NAME_SELECTOR: &str = "div.text-xl.font-bold";

/// Structured badge node used for location and batch
const PILL_SELECTOR: &str = "div.yc-tw-Pill";

/// Link wrapping the location badge
const LOCATION_LINK_SELECTOR: &str = r#"a[href*="/companies/location/"]"#;

/// Link wrapping the batch badge
const BATCH_LINK_SELECTOR: &str = r#"a[href*="/companies?batch="]"#;

/// Distinctive marker classes on the external-website link
const WEBSITE_LINK_SELECTOR: &str = "a.mb-2.whitespace-nowrap";

/// Top-level section holding the profile summary text
const MAIN_SECTION_SELECTOR: &str = "section.relative.isolate";

/// Card wrapping a launch post
const LAUNCH_CARD_SELECTOR: &str = "div.ycdc-card-new.w-full.rounded-xl";

/// Launch post title node
const LAUNCH_TITLE_SELECTOR: &str = "div.text-3xl.font-bold";

/// Launch post article body
const ARTICLE_SELECTOR: &str = "div.launches-article-container";

/// Path marker identifying personal profile links
const PERSON_PROFILE_MARKER: &str = "linkedin.com/in/";

/// Path marker identifying company profile links
const COMPANY_PROFILE_MARKER: &str = "linkedin.com/company/";

/// Phrases that mark a candidate description as navigation chrome
const DESCRIPTION_DENYLIST: &[&str] = &["Y Combinator", "Active", "Company", "Jobs"];

/// Caption text leaking into badge nodes from an embedded logo
const LOGO_CAPTION: &str = "Y Combinator Logo";

/// Label preceding the location text in the fallback layout
const LOCATION_LABEL: &str = "Location:";

/// Domains never accepted as the company's own website
const EXCLUDED_WEBSITE_DOMAINS: &[&str] = &[
    "linkedin.com",
    "youtube.com",
    "ycombinator.com",
    "startupschool.org",
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "calendly.com",
];

/// Structured attributes recovered from one profile page
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    /// The directory URL this profile was scraped from
    pub directory_url: String,
    pub website: Option<String>,
    pub company_profile_links: Vec<String>,
    pub founder_profile_links: Vec<String>,
    pub founder_names: Vec<String>,
    pub batch: String,
    pub body_text: String,
}

impl CompanyProfile {
    /// Returns true if the free-text body is non-empty after trimming
    pub fn has_body(&self) -> bool {
        !self.body_text.trim().is_empty()
    }
}

/// Extracts a company profile from a captured rendered document
///
/// Pure function: same document and URL always yield the same profile, and
/// no strategy failure is fatal. Soft sanity problems are logged as
/// extraction anomalies and extraction continues best-effort.
pub fn extract_profile(html: &str, url: &str) -> CompanyProfile {
    let document = Html::parse_document(html);

    let name = extract_name(&document).unwrap_or_else(|| {
        tracing::warn!(url, "extraction anomaly: no heading found for company name");
        "Unknown".to_string()
    });

    let location = extract_location(&document);
    if let Some(loc) = &location {
        if loc.len() > 100 {
            tracing::warn!(url, "extraction anomaly: implausibly long location");
        }
    }

    let (founder_names, founder_profile_links) = extract_founders(&document);

    CompanyProfile {
        description: extract_description(&document),
        location,
        directory_url: url.to_string(),
        website: extract_website(&document),
        company_profile_links: extract_company_profile_links(&document),
        founder_profile_links,
        founder_names,
        batch: extract_batch(&document, url),
        body_text: extract_body_text(&document),
        name,
    }
}

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}

/// Collects an element's text, collapsing all whitespace runs to one space
fn normalized_text(el: ElementRef) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_unique(items: &mut Vec<String>, value: String) {
    if !items.contains(&value) {
        items.push(value);
    }
}

fn extract_name(document: &Html) -> Option<String> {
    let heading = selector(TITLE_SELECTOR)?;
    document
        .select(&heading)
        .next()
        .map(normalized_text)
        .filter(|name| !name.is_empty())
}

/// The description is the block right after the heading, unless it reads
/// like navigation chrome
fn extract_description(document: &Html) -> Option<String> {
    let heading = selector(TITLE_SELECTOR)?;
    let h1 = document.select(&heading).next()?;

    let sibling = h1.next_siblings().find_map(ElementRef::wrap)?;
    let text = normalized_text(sibling);

    if text.is_empty() || DESCRIPTION_DENYLIST.iter().any(|phrase| text.contains(phrase)) {
        return None;
    }

    Some(text)
}

/// Location: structured badge first, "Location:" label second
fn extract_location(document: &Html) -> Option<String> {
    if let (Some(link_sel), Some(pill_sel)) = (selector(LOCATION_LINK_SELECTOR), selector(PILL_SELECTOR)) {
        if let Some(link) = document.select(&link_sel).next() {
            if let Some(pill) = link.select(&pill_sel).next() {
                let text = normalized_text(pill);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }

    // Fallback: the text node right after a "Location:" label
    let span_sel = selector("span")?;
    let spans: Vec<ElementRef> = document.select(&span_sel).collect();
    let label_index = spans
        .iter()
        .position(|span| normalized_text(*span) == LOCATION_LABEL)?;

    spans
        .get(label_index + 1)
        .map(|span| normalized_text(*span))
        .filter(|text| !text.is_empty())
}

/// Founder names and personal profile links, as order-preserving sets
fn extract_founders(document: &Html) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut links = Vec::new();

    let (Some(card_sel), Some(name_sel), Some(anchor_sel)) = (
        selector(FOUNDER_CARD_SELECTOR),
        selector(FOUNDER_NAME_SELECTOR),
        selector("a[href]"),
    ) else {
        return (names, links);
    };

    for card in document.select(&card_sel) {
        if let Some(name_node) = card.select(&name_sel).next() {
            let name = normalized_text(name_node);
            if !name.is_empty() {
                push_unique(&mut names, name);
            }
        }

        let profile_link = card.select(&anchor_sel).find_map(|a| {
            a.value()
                .attr("href")
                .filter(|href| href.contains(PERSON_PROFILE_MARKER))
                .map(|href| href.to_string())
        });
        if let Some(href) = profile_link {
            push_unique(&mut links, href);
        }
    }

    (names, links)
}

fn extract_company_profile_links(document: &Html) -> Vec<String> {
    let mut links = Vec::new();

    let Some(anchor_sel) = selector("a[href]") else {
        return links;
    };

    for anchor in document.select(&anchor_sel) {
        if let Some(href) = anchor.value().attr("href") {
            if href.contains(COMPANY_PROFILE_MARKER) {
                push_unique(&mut links, href.to_string());
            }
        }
    }

    links
}

/// Canonical external website: the marked link first, then the first
/// absolute link whose domain is not excluded, in document order
fn extract_website(document: &Html) -> Option<String> {
    if let Some(marked_sel) = selector(WEBSITE_LINK_SELECTOR) {
        if let Some(link) = document.select(&marked_sel).next() {
            if let Some(href) = link.value().attr("href") {
                if href.starts_with("http://") || href.starts_with("https://") {
                    return Some(href.to_string());
                }
            }
        }
    }

    let anchor_sel = selector("a[href]")?;
    document.select(&anchor_sel).find_map(|anchor| {
        let href = anchor.value().attr("href")?;
        let accepted = href.starts_with("https://")
            && !EXCLUDED_WEBSITE_DOMAINS
                .iter()
                .any(|domain| href.contains(domain));
        accepted.then(|| href.to_string())
    })
}

/// Batch label: badge text first, then the URL token, else "Unknown"
fn extract_batch(document: &Html, url: &str) -> String {
    if let (Some(link_sel), Some(pill_sel)) = (selector(BATCH_LINK_SELECTOR), selector(PILL_SELECTOR)) {
        if let Some(link) = document.select(&link_sel).next() {
            if let Some(pill) = link.select(&pill_sel).next() {
                let text = if let Some(span) =
                    selector("span").and_then(|s| pill.select(&s).next())
                {
                    normalized_text(span)
                } else {
                    normalized_text(pill).replace(LOGO_CAPTION, "").trim().to_string()
                };

                if !text.is_empty() {
                    return text;
                }
            }
        }
    }

    batch_from_url(url).unwrap_or_else(|| "Unknown".to_string())
}

/// Free-text body: main section text plus a normalized launch post rendering
fn extract_body_text(document: &Html) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if let Some(section_sel) = selector(MAIN_SECTION_SELECTOR) {
        if let Some(section) = document.select(&section_sel).next() {
            blocks.push(normalized_text(section));
        }
    }

    if let Some(card_sel) = selector(LAUNCH_CARD_SELECTOR) {
        if let Some(card) = document.select(&card_sel).next() {
            if let Some(title_sel) = selector(LAUNCH_TITLE_SELECTOR) {
                if let Some(title) = card.select(&title_sel).next() {
                    blocks.push("LAUNCH POST:".to_string());
                    blocks.push(normalized_text(title));
                }
            }

            if let Some(article_sel) = selector(ARTICLE_SELECTOR) {
                if let Some(article) = card.select(&article_sel).next() {
                    blocks.extend(article_blocks(article));
                }
            }
        }
    }

    blocks
        .iter()
        .map(|block| block.trim())
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders a launch article's paragraphs, lists and standalone bold spans
fn article_blocks(article: ElementRef) -> Vec<String> {
    let mut blocks = Vec::new();

    let Some(node_sel) = selector("p, ul, li, strong") else {
        return blocks;
    };

    for el in article.select(&node_sel) {
        match el.value().name() {
            "p" => blocks.push(render_inline(el)),
            "li" => blocks.push(format!("- {}", render_inline(el))),
            "strong" => {
                // Bold spans inside a paragraph or list item are already
                // rendered inline by their parent block
                if !has_block_ancestor(el) {
                    blocks.push(format!("**{}**", normalized_text(el)));
                }
            }
            // The <ul> wrapper itself contributes no text
            _ => {}
        }
    }

    blocks
}

fn has_block_ancestor(el: ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| matches!(ancestor.value().name(), "p" | "li"))
}

/// Renders a block's direct children: hyperlinks become `text (href)`,
/// bold spans become `**text**`, bare text passes through
fn render_inline(el: ElementRef) -> String {
    let mut out = String::new();

    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            match child_el.value().name() {
                "a" => {
                    let text = normalized_text(child_el);
                    match child_el.value().attr("href") {
                        Some(href) => out.push_str(&format!("{} ({}) ", text, href)),
                        None => out.push_str(&format!("{} ", text)),
                    }
                }
                "strong" => out.push_str(&format!("**{}** ", normalized_text(child_el))),
                _ => {}
            }
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(trimmed);
                out.push(' ');
            }
        }
    }

    out.trim().to_string()
}
