//! Field extractors for film pages
//!
//! Each extractor maps a parsed document to an optional string. A missing
//! element, attribute or pattern is an ordinary outcome and yields `None`;
//! nothing here returns an error or panics on unexpected markup.
//!
//! The selectors mirror the live page layout exactly (tag names, class names,
//! `itemprop` attributes and the Russian row labels), so they must not be
//! "cleaned up" without checking against real pages.

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Marker the site renders in place of elided list entries
pub const ELLIPSIS_MARKER: &str = "...";

/// Separator used when joining list-valued fields
pub const LIST_SEPARATOR: &str = ", ";

/// Heading that precedes the starring cast list
pub const CAST_HEADING: &str = "В главных ролях:";

/// Row label of the slogan cell
pub const SLOGAN_LABEL: &str = "слоган";

/// Inline style of the block carrying the IMDb rating
const IMDB_BLOCK_SELECTOR: &str = r#"div[style="color:#999;font:100 11px tahoma, verdana"]"#;

/// Rating as rendered in the IMDb block, e.g. `IMDb: 7.80 (12 345)`
#[allow(clippy::expect_used)]
static IMDB_SCORE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"IMDb: ([\d.]+) ").expect("IMDb score regex is valid")
});

/// Russian title (`h1.moviename-big`)
///
/// This is the primary title field: a page without it is treated as a ban.
pub fn parse_title_ru(doc: &Html) -> Option<String> {
    first_text(doc, "h1.moviename-big")
}

/// Original title (`span.alternativeHeadline`)
pub fn parse_title_orig(doc: &Html) -> Option<String> {
    first_text(doc, "span.alternativeHeadline")
}

/// Duration, read from the `content` attribute of the duration meta tag
pub fn parse_duration(doc: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[itemprop="duration"]"#).ok()?;
    doc.select(&selector)
        .next()?
        .value()
        .attr("content")
        .map(str::to_string)
}

/// Slogan: the cell that follows the `слоган` label cell
pub fn parse_slogan(doc: &Html) -> Option<String> {
    let td = Selector::parse("td").ok()?;
    let label = find_with_string(doc, &td, SLOGAN_LABEL)?;
    find_next(label, &td).map(element_text)
}

/// A row of the info table, identified by its label cell
///
/// Collects the link texts of the label's row in order, cuts the list at the
/// first ellipsis marker and joins it with `", "`. A row without links gives
/// an empty string rather than `None`.
pub fn parse_tabular(doc: &Html, label: &str) -> Option<String> {
    let td = Selector::parse("td").ok()?;
    let a = Selector::parse("a").ok()?;

    let anchor = find_with_string(doc, &td, label)?;
    let row = anchor.parent().and_then(ElementRef::wrap)?;
    let items = row.select(&a).map(element_text).collect();
    Some(join_truncated(items))
}

/// Starring cast: the list items following the cast heading
pub fn parse_cast(doc: &Html) -> Option<String> {
    let h4 = Selector::parse("h4").ok()?;
    let ul = Selector::parse("ul").ok()?;
    let li = Selector::parse("li").ok()?;

    let heading = find_with_string(doc, &h4, CAST_HEADING)?;
    let list = find_next(heading, &ul)?;
    let items = list.select(&li).map(element_text).collect();
    Some(join_truncated(items))
}

/// Site rating (`span.rating_ball`)
pub fn parse_kinopoisk_score(doc: &Html) -> Option<String> {
    first_text(doc, "span.rating_ball")
}

/// IMDb rating, captured from the free-text rating block
pub fn parse_imdb_score(doc: &Html) -> Option<String> {
    let selector = Selector::parse(IMDB_BLOCK_SELECTOR).ok()?;
    let block = doc.select(&selector).next()?;
    imdb_score_from_text(&element_text(block))
}

/// Applies the `IMDb: <float> ` pattern to arbitrary text
///
/// Returns only the numeric group, or `None` when the pattern is absent.
pub fn imdb_score_from_text(text: &str) -> Option<String> {
    IMDB_SCORE_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Critics rating (`div.ratingNum`)
pub fn parse_critics_score(doc: &Html) -> Option<String> {
    first_text(doc, "div.ratingNum")
}

/// Synopsis block (`div.brand_words.film-synopsys`)
pub fn parse_synopsis(doc: &Html) -> Option<String> {
    first_text(doc, "div.brand_words.film-synopsys")
}

/// Cuts a list at the first ellipsis marker and joins the rest
pub fn join_truncated(mut items: Vec<String>) -> String {
    if let Some(idx) = items.iter().position(|item| item == ELLIPSIS_MARKER) {
        items.truncate(idx);
    }
    items.join(LIST_SEPARATOR)
}

/// Text of the first element matching `css`
fn first_text(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector).next().map(element_text)
}

/// All descendant text of an element, concatenated
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// First element matching `selector` whose own string equals `value`
fn find_with_string<'a>(doc: &'a Html, selector: &Selector, value: &str) -> Option<ElementRef<'a>> {
    doc.select(selector)
        .find(|element| own_string(*element) == Some(value))
}

/// The single string an element stands for
///
/// An element whose only child is text stands for that text; an element
/// whose only child is another element stands for that child's string.
/// Elements with several children, or none, have no string.
fn own_string(element: ElementRef<'_>) -> Option<&str> {
    let mut node = *element;
    loop {
        let mut children = node.children();
        let only = children.next()?;
        if children.next().is_some() {
            return None;
        }
        match only.value() {
            Node::Text(text) => return Some(&**text),
            Node::Element(_) => node = only,
            _ => return None,
        }
    }
}

/// First element after `anchor` in document order that matches `selector`
///
/// Searches the anchor's own descendants first, then everything that
/// follows it: later siblings of the anchor and of each of its ancestors.
fn find_next<'a>(anchor: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    if let Some(found) = anchor.select(selector).next() {
        return Some(found);
    }

    let mut node = Some(*anchor);
    while let Some(current) = node {
        for sibling in current.next_siblings() {
            let Some(element) = ElementRef::wrap(sibling) else {
                continue;
            };
            if selector.matches(&element) {
                return Some(element);
            }
            if let Some(found) = element.select(selector).next() {
                return Some(found);
            }
        }
        node = current.parent();
    }

    None
}
