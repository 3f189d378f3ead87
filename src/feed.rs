//! Feed loading and rendering.
//!
//! The feed is a JSON array of posts served from a fixed endpoint
//! (`/posts/index.json` by default). Loading it is a three-step pipeline:
//!
//! ```text
//! fetch (no-cache)  →  normalize (url, timestamp, drop bad dates, sort)  →  render
//! ```
//!
//! ## Outcomes
//!
//! [`load_feed`] never fails with an error the caller has to handle; it
//! returns a [`FeedLoad`] that is either the sorted posts, an empty feed, or a
//! failure. [`render_feed`] consumes that value:
//!
//! - **Loaded / Empty**: every present target is cleared and re-rendered, the
//!   featured section is hidden when nothing is featured, and one
//!   [`FeedEvent::Rendered`] carrying the full sorted list is emitted.
//! - **Failed**: a diagnostic is logged and nothing is touched, so whatever
//!   static fallback markup the page shipped with stays visible. No retry.
//!
//! ## Render Targets
//!
//! | Region id | Content |
//! |-----------|---------|
//! | `featuredGrid` | featured posts, [`cards::featured_card`] |
//! | `latestGrid` | all posts, [`cards::grid_card`] |
//! | `overlayHero` | newest post, [`cards::overlay_hero`] |
//! | `overlayList` | the next posts (9 by default), [`cards::overlay_card`] |
//! | `lentaOverlay` | the overlay itself; hidden unless open |

use crate::cards::{self, Card};
use crate::dates::{DateFormatter, timestamp_millis};
use crate::document::Document;
use crate::enhance;
use crate::fetch::{FetchError, FetchOptions, Fetcher};
use crate::types::{FeedPost, Post};
use std::sync::mpsc::Sender;
use thiserror::Error;

pub const FEATURED_GRID: &str = "featuredGrid";
pub const LATEST_GRID: &str = "latestGrid";
pub const OVERLAY_HERO: &str = "overlayHero";
pub const OVERLAY_LIST: &str = "overlayList";
pub const OVERLAY: &str = "lentaOverlay";

/// URL fragment that opens the overlay on load.
pub const OVERLAY_FRAGMENT: &str = "#lenta";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("feed payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feed payload is not an array")]
    NotArray,
}

/// Result of fetching and normalizing the feed.
#[derive(Debug)]
pub enum FeedLoad {
    Loaded(Vec<FeedPost>),
    Empty,
    Failed(FeedError),
}

impl FeedLoad {
    pub fn from_result(result: Result<Vec<FeedPost>, FeedError>) -> Self {
        match result {
            Ok(posts) if posts.is_empty() => FeedLoad::Empty,
            Ok(posts) => FeedLoad::Loaded(posts),
            Err(e) => FeedLoad::Failed(e),
        }
    }
}

/// How rendering settled. Downstream initializers run after any outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    Rendered,
    Empty,
    Failed,
}

/// Announcement sent once the feed has been rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Rendered { posts: Vec<FeedPost> },
}

pub fn post_url(slug: &str) -> String {
    format!("/posts/{slug}.html")
}

/// Fetch the feed endpoint, bypassing caches.
pub fn load_feed(fetcher: &dyn Fetcher, endpoint: &str) -> FeedLoad {
    let result = fetcher
        .get(endpoint, FetchOptions::no_cache())
        .map_err(FeedError::from)
        .and_then(|body| parse_feed(&body));
    FeedLoad::from_result(result)
}

/// Parse a feed payload. The top-level value must be an array.
pub fn parse_feed(body: &str) -> Result<Vec<FeedPost>, FeedError> {
    match serde_json::from_str::<serde_json::Value>(body)? {
        serde_json::Value::Array(items) => Ok(normalize_posts(items)),
        _ => Err(FeedError::NotArray),
    }
}

/// Attach detail URLs and timestamps, drop undated records, newest first.
///
/// Records that are not post-shaped are dropped the same way as records with
/// an unparseable date. The sort is stable, so equal dates keep input order.
pub fn normalize_posts(raw: Vec<serde_json::Value>) -> Vec<FeedPost> {
    let mut posts: Vec<FeedPost> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Post>(value) {
            Ok(post) => Some(post),
            Err(e) => {
                log::debug!("skipping malformed feed record: {e}");
                None
            }
        })
        .filter_map(|post| {
            let date_value = timestamp_millis(&post.date)?;
            Some(FeedPost {
                url: post_url(&post.slug),
                date_value,
                post,
            })
        })
        .collect();
    posts.sort_by(|a, b| b.date_value.cmp(&a.date_value));
    posts
}

/// A list of cards rendered into one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardRegion {
    pub cards: Vec<Card>,
    /// Whether the enclosing section is hidden.
    pub hidden: bool,
}

/// The full-screen feed overlay. Starts closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub hero: Option<CardRegion>,
    pub list: Option<CardRegion>,
    pub open: bool,
}

impl Overlay {
    pub fn cards_mut(&mut self) -> impl Iterator<Item = &mut Card> {
        self.hero
            .iter_mut()
            .chain(self.list.iter_mut())
            .flat_map(|r| r.cards.iter_mut())
    }
}

/// The feed's render targets on a page. `None` means the page has no such
/// mount point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedView {
    pub featured: Option<CardRegion>,
    pub latest: Option<CardRegion>,
    pub overlay: Option<Overlay>,
    rendered: bool,
}

impl FeedView {
    /// Mirror the feed mount points present in `doc`.
    pub fn from_document(doc: &Document) -> Self {
        let region = |id: &str| doc.has(id).then(CardRegion::default);
        let hero = region(OVERLAY_HERO);
        let list = region(OVERLAY_LIST);
        let overlay = (hero.is_some() || list.is_some() || doc.has(OVERLAY)).then(|| Overlay {
            hero,
            list,
            open: false,
        });
        Self {
            featured: region(FEATURED_GRID),
            latest: region(LATEST_GRID),
            overlay,
            rendered: false,
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Every card on the page, overlay included.
    pub fn cards_mut(&mut self) -> impl Iterator<Item = &mut Card> {
        let page = self
            .featured
            .iter_mut()
            .chain(self.latest.iter_mut())
            .flat_map(|r| r.cards.iter_mut());
        page.chain(self.overlay.iter_mut().flat_map(|o| o.cards_mut()))
    }

    pub fn open_overlay(&mut self, format_date: &DateFormatter) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.open = true;
            enhance::relabel_dates(overlay.cards_mut(), format_date);
        }
    }

    pub fn close_overlay(&mut self) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.open = false;
        }
    }

    /// Open the overlay when the page was loaded with `#lenta`.
    pub fn open_for_fragment(&mut self, fragment: &str, format_date: &DateFormatter) -> bool {
        if fragment != OVERLAY_FRAGMENT || self.overlay.is_none() {
            return false;
        }
        self.open_overlay(format_date);
        true
    }

    /// Write the rendered cards back into `doc`. Does nothing before a
    /// successful render so static fallback content survives failures.
    pub fn flush(&self, doc: &mut Document) {
        if let Some(overlay) = &self.overlay {
            doc.set_hidden(OVERLAY, !overlay.open);
        }
        if !self.rendered {
            return;
        }
        let targets = [
            (FEATURED_GRID, self.featured.as_ref()),
            (LATEST_GRID, self.latest.as_ref()),
            (
                OVERLAY_HERO,
                self.overlay.as_ref().and_then(|o| o.hero.as_ref()),
            ),
            (
                OVERLAY_LIST,
                self.overlay.as_ref().and_then(|o| o.list.as_ref()),
            ),
        ];
        for (id, region) in targets {
            if let Some(region) = region {
                doc.set_html(id, cards::render_cards(&region.cards));
                doc.set_hidden(id, region.hidden);
            }
        }
    }
}

/// Render a settled feed load into `view`.
pub fn render_feed(
    view: &mut FeedView,
    load: FeedLoad,
    format_date: &DateFormatter,
    overlay_list_size: usize,
    events: Option<&Sender<FeedEvent>>,
) -> FeedOutcome {
    let (posts, outcome) = match load {
        FeedLoad::Loaded(posts) => (posts, FeedOutcome::Rendered),
        FeedLoad::Empty => (Vec::new(), FeedOutcome::Empty),
        FeedLoad::Failed(e) => {
            log::error!("[lenta] could not render the feed: {e}");
            return FeedOutcome::Failed;
        }
    };

    if let Some(featured) = view.featured.as_mut() {
        featured.cards = posts
            .iter()
            .filter(|p| p.post.featured)
            .map(|p| cards::featured_card(p, format_date))
            .collect();
        featured.hidden = featured.cards.is_empty();
    }
    if let Some(latest) = view.latest.as_mut() {
        latest.cards = posts
            .iter()
            .map(|p| cards::grid_card(p, format_date))
            .collect();
    }
    if let Some(overlay) = view.overlay.as_mut() {
        if let Some(hero) = overlay.hero.as_mut() {
            hero.cards = posts
                .first()
                .map(|p| cards::overlay_hero(p, format_date))
                .into_iter()
                .collect();
        }
        if let Some(list) = overlay.list.as_mut() {
            list.cards = posts
                .iter()
                .skip(1)
                .take(overlay_list_size)
                .map(|p| cards::overlay_card(p, format_date))
                .collect();
        }
    }
    view.rendered = true;

    if let Some(tx) = events {
        if tx.send(FeedEvent::Rendered { posts }).is_err() {
            log::debug!("no listener for the feed rendered event");
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MemoryFetcher, feed_post};
    use serde_json::json;
    use std::sync::mpsc;

    fn full_document() -> Document {
        Document::with_regions([FEATURED_GRID, LATEST_GRID, OVERLAY_HERO, OVERLAY_LIST, OVERLAY])
    }

    fn formatter() -> DateFormatter {
        DateFormatter::long("en_US")
    }

    #[test]
    fn normalize_drops_bad_dates_and_sorts_descending() {
        let posts = normalize_posts(vec![
            json!({"slug": "old", "date": "2023-01-01"}),
            json!({"slug": "bad", "date": "invalid"}),
            json!({"slug": "new", "date": "2024-06-01"}),
        ]);
        let slugs: Vec<_> = posts.iter().map(|p| p.post.slug.as_str()).collect();
        assert_eq!(slugs, ["new", "old"]);
        assert_eq!(posts[0].url, "/posts/new.html");
    }

    #[test]
    fn normalize_keeps_minute_precision_zoned_dates() {
        let posts = normalize_posts(vec![
            json!({"slug": "z", "date": "2024-01-01T10:00Z"}),
            json!({"slug": "off", "date": "2024-01-02T10:00+03:00"}),
            json!({"slug": "plain", "date": "2024-01-03"}),
        ]);
        let slugs: Vec<_> = posts.iter().map(|p| p.post.slug.as_str()).collect();
        assert_eq!(slugs, ["plain", "off", "z"]);
    }

    #[test]
    fn normalize_is_stable_for_equal_dates() {
        let posts = normalize_posts(vec![
            json!({"slug": "first", "date": "2024-01-01"}),
            json!({"slug": "second", "date": "2024-01-01T00:00:00Z"}),
            json!({"slug": "third", "date": "2024-01-01"}),
        ]);
        let slugs: Vec<_> = posts.iter().map(|p| p.post.slug.as_str()).collect();
        assert_eq!(slugs, ["first", "second", "third"]);
    }

    #[test]
    fn normalize_drops_records_that_are_not_posts() {
        let posts = normalize_posts(vec![json!(42), json!({"date": "2024-01-01"})]);
        assert!(posts.is_empty());
    }

    #[test]
    fn parse_feed_rejects_non_array() {
        assert!(matches!(parse_feed(r#"{"posts": []}"#), Err(FeedError::NotArray)));
        assert!(matches!(parse_feed("not json"), Err(FeedError::Json(_))));
    }

    #[test]
    fn load_feed_reports_missing_endpoint_as_failure() {
        let fetcher = MemoryFetcher::default();
        let load = load_feed(&fetcher, "/posts/index.json");
        assert!(matches!(load, FeedLoad::Failed(FeedError::Fetch(_))));
    }

    #[test]
    fn load_feed_requests_without_cache() {
        let fetcher = MemoryFetcher::default().with("/posts/index.json", "[]");
        let load = load_feed(&fetcher, "/posts/index.json");
        assert!(matches!(load, FeedLoad::Empty));
        assert_eq!(fetcher.requests(), vec![("/posts/index.json".to_string(), true)]);
    }

    #[test]
    fn invalid_date_post_appears_nowhere() {
        let body = json!([
            {"slug": "a", "date": "2024-01-01", "featured": true},
            {"slug": "b", "date": "invalid"}
        ])
        .to_string();
        let fetcher = MemoryFetcher::default().with("/posts/index.json", &body);
        let mut doc = full_document();
        let mut view = FeedView::from_document(&doc);

        let outcome = render_feed(
            &mut view,
            load_feed(&fetcher, "/posts/index.json"),
            &formatter(),
            9,
            None,
        );
        view.flush(&mut doc);

        assert_eq!(outcome, FeedOutcome::Rendered);
        let featured = view.featured.as_ref().unwrap();
        assert_eq!(featured.cards.len(), 1);
        assert_eq!(featured.cards[0].href, "/posts/a.html");
        for (_, region) in doc.regions() {
            assert!(!region.html.contains("/posts/b.html"));
        }
    }

    #[test]
    fn failed_load_leaves_static_fallback() {
        let mut doc = full_document();
        doc.set_html(LATEST_GRID, maud::html! { p { "static" } });
        let mut view = FeedView::from_document(&doc);

        let outcome = render_feed(
            &mut view,
            FeedLoad::Failed(FeedError::NotArray),
            &formatter(),
            9,
            None,
        );
        view.flush(&mut doc);

        assert_eq!(outcome, FeedOutcome::Failed);
        assert!(!view.is_rendered());
        assert_eq!(doc.html(LATEST_GRID), Some("<p>static</p>"));
    }

    #[test]
    fn no_featured_posts_hides_featured_section() {
        let mut doc = full_document();
        let mut view = FeedView::from_document(&doc);
        let posts = vec![feed_post("a", "2024-01-01", false)];
        render_feed(&mut view, FeedLoad::Loaded(posts), &formatter(), 9, None);
        view.flush(&mut doc);
        assert_eq!(doc.is_hidden(FEATURED_GRID), Some(true));
        assert_eq!(doc.is_hidden(LATEST_GRID), Some(false));
    }

    #[test]
    fn overlay_gets_hero_and_capped_list() {
        let mut view = FeedView::from_document(&full_document());
        let posts: Vec<_> = (0..15)
            .map(|i| feed_post(&format!("p{i}"), &format!("2024-01-{:02}", 28 - i), false))
            .collect();
        render_feed(&mut view, FeedLoad::Loaded(posts), &formatter(), 9, None);

        let overlay = view.overlay.as_ref().unwrap();
        let hero = &overlay.hero.as_ref().unwrap().cards;
        let list = &overlay.list.as_ref().unwrap().cards;
        assert_eq!(hero.len(), 1);
        assert_eq!(hero[0].href, "/posts/p0.html");
        assert_eq!(list.len(), 9);
        assert_eq!(list[0].href, "/posts/p1.html");
    }

    #[test]
    fn missing_targets_are_skipped() {
        let mut doc = Document::with_regions([LATEST_GRID]);
        let mut view = FeedView::from_document(&doc);
        assert!(view.featured.is_none());
        assert!(view.overlay.is_none());

        let posts = vec![feed_post("a", "2024-01-01", true)];
        let outcome = render_feed(&mut view, FeedLoad::Loaded(posts), &formatter(), 9, None);
        view.flush(&mut doc);
        assert_eq!(outcome, FeedOutcome::Rendered);
        assert!(doc.html(LATEST_GRID).unwrap().contains("/posts/a.html"));
    }

    #[test]
    fn rendered_event_carries_full_sorted_list_once() {
        let (tx, rx) = mpsc::channel();
        let mut view = FeedView::from_document(&full_document());
        let posts = vec![
            feed_post("new", "2024-02-01", false),
            feed_post("old", "2024-01-01", true),
        ];
        render_feed(&mut view, FeedLoad::Loaded(posts.clone()), &formatter(), 9, Some(&tx));
        drop(tx);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events, vec![FeedEvent::Rendered { posts }]);
    }

    #[test]
    fn empty_feed_still_announces() {
        let (tx, rx) = mpsc::channel();
        let mut view = FeedView::from_document(&full_document());
        let outcome = render_feed(&mut view, FeedLoad::Empty, &formatter(), 9, Some(&tx));
        assert_eq!(outcome, FeedOutcome::Empty);
        assert_eq!(rx.try_recv().unwrap(), FeedEvent::Rendered { posts: vec![] });
    }

    #[test]
    fn fragment_opens_overlay() {
        let mut doc = full_document();
        let mut view = FeedView::from_document(&doc);
        assert!(!view.open_for_fragment("#other", &formatter()));
        assert!(view.open_for_fragment("#lenta", &formatter()));
        view.flush(&mut doc);
        assert_eq!(doc.is_hidden(OVERLAY), Some(false));
        view.close_overlay();
        view.flush(&mut doc);
        assert_eq!(doc.is_hidden(OVERLAY), Some(true));
    }
}
