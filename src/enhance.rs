//! Behaviors layered on top of a rendered feed.
//!
//! These passes run once the feed has settled (rendered, empty or failed) and
//! work on the cards already in the page rather than on the feed data:
//!
//! - [`sort_by_published`]: re-order cards newest first by `data-published`
//! - [`relabel_dates`]: rewrite date labels with the long-form formatter
//! - [`CategoryChips`]: single-select category filter
//! - [`backfill_excerpts`]: scrape missing excerpts from detail pages
//! - [`filter_overlay`]: live text search inside the overlay
//!
//! [`Enhancements::init`] wires them up in that order.

use crate::cards::Card;
use crate::dates::{DateFormatter, timestamp_millis};
use crate::document::Document;
use crate::feed::{FeedOutcome, FeedView, Overlay};
use crate::fetch::{FetchOptions, Fetcher};
use crate::types::FeedPost;
use maud::{Markup, html};
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use rayon::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

/// Region holding the category chips.
pub const FILTERS: &str = "lentaFilters";

/// Chip value that matches every card.
pub const ALL: &str = "all";

/// Sort cards newest first by their raw `data-published` value.
///
/// Missing or unparseable dates count as the epoch. Stable, and therefore
/// idempotent.
pub fn sort_by_published(cards: &mut [Card]) {
    let key = |card: &Card| {
        card.published
            .as_deref()
            .and_then(timestamp_millis)
            .unwrap_or(0)
    };
    cards.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// Reformat the date label of every card that carries `data-published`.
/// Returns the number of labels written.
pub fn relabel_dates<'a>(
    cards: impl IntoIterator<Item = &'a mut Card>,
    format_date: &DateFormatter,
) -> usize {
    let mut count = 0;
    for card in cards {
        if let Some(published) = card.published.as_deref() {
            card.date_label = format_date.format(published);
            count += 1;
        }
    }
    count
}

/// Which cards a relabel pass touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Page cards, plus the overlay if it is open.
    Document,
    /// Only the overlay.
    Overlay,
}

pub fn relabel(view: &mut FeedView, scope: Scope, format_date: &DateFormatter) -> usize {
    let FeedView {
        featured,
        latest,
        overlay,
        ..
    } = view;
    let overlay_cards = overlay
        .iter_mut()
        .filter(|o| scope == Scope::Overlay || o.open)
        .flat_map(Overlay::cards_mut);
    match scope {
        Scope::Document => {
            let page = featured
                .iter_mut()
                .chain(latest.iter_mut())
                .flat_map(|r| r.cards.iter_mut());
            relabel_dates(page.chain(overlay_cards), format_date)
        }
        Scope::Overlay => relabel_dates(overlay_cards, format_date),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub value: String,
    pub label: String,
    pub active: bool,
}

/// Single-select category filter over the latest grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChips {
    chips: Vec<Chip>,
}

impl CategoryChips {
    /// `all` followed by each category in order of first appearance.
    pub fn from_posts(posts: &[FeedPost]) -> Self {
        let mut chips = vec![Chip {
            value: ALL.to_string(),
            label: "Все".to_string(),
            active: true,
        }];
        for post in posts {
            let value = post.post.category.trim().to_lowercase();
            if value.is_empty() || chips.iter().any(|c| c.value == value) {
                continue;
            }
            let label = if post.post.category_label.is_empty() {
                post.post.category.clone()
            } else {
                post.post.category_label.clone()
            };
            chips.push(Chip {
                value,
                label,
                active: false,
            });
        }
        Self { chips }
    }

    pub fn chips(&self) -> &[Chip] {
        &self.chips
    }

    pub fn active(&self) -> Option<&str> {
        self.chips
            .iter()
            .find(|c| c.active)
            .map(|c| c.value.as_str())
    }

    /// Activate the chip for `value` and hide non-matching cards.
    ///
    /// Matching is case-insensitive; cards without a category only show under
    /// `all`. Returns the number of visible cards.
    pub fn select(&mut self, value: &str, cards: &mut [Card]) -> usize {
        let value = value.trim().to_lowercase();
        let value = if value.is_empty() { ALL.to_string() } else { value };
        for chip in &mut self.chips {
            chip.active = chip.value == value;
        }
        let mut visible = 0;
        for card in cards {
            let category = card.category.trim().to_lowercase();
            let category = if category.is_empty() { ALL } else { &category };
            card.hidden = !(value == ALL || category == value);
            if !card.hidden {
                visible += 1;
            }
        }
        visible
    }

    pub fn render(&self) -> Markup {
        html! {
            @for chip in &self.chips {
                @let class = if chip.active { "filter-chip is-active" } else { "filter-chip" };
                button type="button" class=(class) data-filter=(chip.value) {
                    (chip.label)
                }
            }
        }
    }
}

static META_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("static regex"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z][A-Za-z0-9]*);").expect("static regex")
});
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("static regex")
});

/// Extract `<meta name="description" content="...">` from an HTML page.
///
/// Attribute order and quoting style do not matter. Returns `None` when there
/// is no such tag or its content is blank.
pub fn meta_description(page: &str) -> Option<String> {
    META_TAG.find_iter(page).find_map(|tag| {
        let mut name = None;
        let mut content = None;
        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match caps[1].to_ascii_lowercase().as_str() {
                "name" => name = Some(value),
                "content" => content = Some(value),
                _ => {}
            }
        }
        if !name.is_some_and(|n| n.eq_ignore_ascii_case("description")) {
            return None;
        }
        let text = decode_entities(content?).trim().to_string();
        (!text.is_empty()).then_some(text)
    })
}

/// Decode named and numeric character references. Unknown ones stay as written.
fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let raw = &caps[0];
            unescape_with(raw, resolve_html5_entity)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        })
        .replace('\u{a0}', " ")
}

/// Fill in missing excerpts from each card's detail page.
///
/// Cards are fetched concurrently with no ordering between them. A failed
/// fetch or a page without a description leaves the card as it was. Returns
/// the number of cards that gained an excerpt.
pub fn backfill_excerpts(cards: &mut [Card], fetcher: &dyn Fetcher) -> usize {
    cards
        .par_iter_mut()
        .filter(|card| card.excerpt.is_none() && card.links_to_post())
        .map(|card| match fetcher.get(&card.href, FetchOptions::default()) {
            Ok(page) => match meta_description(&page) {
                Some(text) => {
                    card.excerpt = Some(text);
                    1
                }
                None => 0,
            },
            Err(e) => {
                log::debug!("excerpt backfill skipped {}: {e}", card.href);
                0
            }
        })
        .sum()
}

/// Hide overlay items whose text does not contain `query` (case-insensitive).
/// An empty query shows everything. Returns the number of visible items.
pub fn filter_overlay(overlay: &mut Overlay, query: &str) -> usize {
    let query = query.trim().to_lowercase();
    let mut visible = 0;
    for card in overlay.cards_mut() {
        card.hidden = !query.is_empty() && !card.text_content().to_lowercase().contains(&query);
        if !card.hidden {
            visible += 1;
        }
    }
    visible
}

/// State of the post-render passes for one page.
#[derive(Debug, Clone)]
pub struct Enhancements {
    pub chips: CategoryChips,
    pub backfilled: usize,
    query: String,
}

impl Enhancements {
    /// Run the post-render passes. Called once the feed has settled, whatever
    /// the outcome; `posts` is the list carried by the rendered event (empty
    /// when the feed failed).
    pub fn init(
        view: &mut FeedView,
        outcome: FeedOutcome,
        posts: &[FeedPost],
        format_date: &DateFormatter,
        fetcher: &dyn Fetcher,
    ) -> Self {
        log::debug!("feed settled as {outcome:?}, initializing enhancements");
        if let Some(latest) = view.latest.as_mut() {
            sort_by_published(&mut latest.cards);
        }
        relabel(view, Scope::Document, format_date);
        let chips = CategoryChips::from_posts(posts);

        let mut backfilled = 0;
        for region in [view.featured.as_mut(), view.latest.as_mut()]
            .into_iter()
            .flatten()
        {
            backfilled += backfill_excerpts(&mut region.cards, fetcher);
        }

        Self {
            chips,
            backfilled,
            query: String::new(),
        }
    }

    /// Chip click handler.
    pub fn select_category(&mut self, view: &mut FeedView, value: &str) -> usize {
        match view.latest.as_mut() {
            Some(latest) => self.chips.select(value, &mut latest.cards),
            None => 0,
        }
    }

    /// Search input handler; runs on every keystroke.
    pub fn search(&mut self, view: &mut FeedView, query: &str) -> usize {
        self.query = query.to_string();
        match view.overlay.as_mut() {
            Some(overlay) => filter_overlay(overlay, query),
            None => 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn flush(&self, doc: &mut Document) {
        doc.set_html(FILTERS, self.chips.render());
    }
}
