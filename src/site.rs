//! Page pipelines run by the CLI.
//!
//! Each `build_*` function sets up a page document with its mount points, runs
//! the matching controller against the site data, optionally writes the
//! regions out as fragment files, and returns a report for [`crate::output`].
//!
//! ```text
//! out/
//! ├── feed/{featuredGrid,latestGrid,overlayHero,overlayList,lentaOverlay,lentaFilters}.html
//! ├── shop/{grid,popular,promoStrip,...}.html
//! ├── product/{pTitle,pDescription,reco,...}.html
//! └── timeline/{timeline,tabs,postCount,...}.html
//! ```

use crate::config::SiteConfig;
use crate::dates::DateFormatter;
use crate::document::Document;
use crate::enhance::{self, Enhancements};
use crate::feed::{self, FeedEvent, FeedOutcome, FeedView};
use crate::fetch::{FetchOptions, Fetcher};
use crate::product::{self, ProductPage, Purchase};
use crate::shop::promo::PROMO_STRIP;
use crate::shop::{self, Catalog, CatalogError, ShopPage};
use crate::timeline::{self, Mode, Storage, Timeline, TimelineError};
use crate::types::FeedPost;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("timeline error: {0}")]
    Timeline(#[from] TimelineError),
}

fn write_fragments(doc: &Document, out: Option<&Path>, section: &str) -> Result<usize, SiteError> {
    match out {
        Some(dir) => Ok(doc.write_fragments(&dir.join(section))?),
        None => Ok(0),
    }
}

// ============================================================================
// Feed
// ============================================================================

/// Interactions to replay on the feed page after it settles.
#[derive(Debug, Clone, Default)]
pub struct FeedRequest {
    /// URL fragment the page was opened with (`#lenta` opens the overlay).
    pub fragment: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedReport {
    pub outcome: FeedOutcome,
    pub posts: Vec<FeedPost>,
    pub featured: usize,
    pub latest: usize,
    pub overlay: usize,
    pub overlay_open: bool,
    /// Category chip values, `all` first.
    pub categories: Vec<String>,
    /// Latest-grid cards left visible by the category filter.
    pub visible: Option<usize>,
    /// Overlay items left visible by the search.
    pub matches: Option<usize>,
    pub backfilled: usize,
    pub fragments: usize,
}

pub fn build_feed(
    config: &SiteConfig,
    fetcher: &dyn Fetcher,
    request: &FeedRequest,
    out: Option<&Path>,
) -> Result<FeedReport, SiteError> {
    let mut doc = Document::with_regions([
        feed::FEATURED_GRID,
        feed::LATEST_GRID,
        feed::OVERLAY_HERO,
        feed::OVERLAY_LIST,
        feed::OVERLAY,
        enhance::FILTERS,
    ]);
    let format_date = DateFormatter::long(&config.locale);
    let mut view = FeedView::from_document(&doc);

    let (events, rendered) = mpsc::channel();
    let load = feed::load_feed(fetcher, &config.feed.endpoint);
    let outcome = feed::render_feed(
        &mut view,
        load,
        &format_date,
        config.feed.overlay_list_size,
        Some(&events),
    );
    let posts = match rendered.try_recv() {
        Ok(FeedEvent::Rendered { posts }) => posts,
        Err(_) => Vec::new(),
    };

    let mut enhancements = Enhancements::init(&mut view, outcome, &posts, &format_date, fetcher);
    let overlay_open = match request.fragment.as_deref() {
        Some(fragment) => view.open_for_fragment(fragment, &format_date),
        None => false,
    };
    let visible = request
        .category
        .as_deref()
        .map(|value| enhancements.select_category(&mut view, value));
    let matches = request
        .search
        .as_deref()
        .map(|query| enhancements.search(&mut view, query));

    view.flush(&mut doc);
    enhancements.flush(&mut doc);

    let count = |region: Option<&feed::CardRegion>| region.map_or(0, |r| r.cards.len());
    let overlay = view.overlay.as_ref().map_or(0, |o| {
        count(o.hero.as_ref()) + count(o.list.as_ref())
    });
    Ok(FeedReport {
        outcome,
        featured: count(view.featured.as_ref()),
        latest: count(view.latest.as_ref()),
        overlay,
        overlay_open,
        categories: enhancements
            .chips
            .chips()
            .iter()
            .map(|c| c.value.clone())
            .collect(),
        visible,
        matches,
        backfilled: enhancements.backfilled,
        fragments: write_fragments(&doc, out, "feed")?,
        posts,
    })
}

// ============================================================================
// Shop
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ShopRequest {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub only_preorder: bool,
    /// Promo strip items to step through by hand.
    pub promo_steps: usize,
    /// Let the promo timer run this long before writing the page.
    pub rotate_for: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopReport {
    pub products: usize,
    pub categories: usize,
    /// Product ids in the main grid, in display order.
    pub grid: Vec<String>,
    pub rotation: Vec<String>,
    /// Product shown in the promo strip when the page was written.
    pub promo: Option<String>,
    pub fragments: usize,
}

pub fn build_shop(
    config: &SiteConfig,
    site: &Path,
    request: &ShopRequest,
    year: i32,
    out: Option<&Path>,
) -> Result<ShopReport, SiteError> {
    let catalog = Catalog::load(&site.join(&config.shop.catalog))?;
    let (products, categories) = (catalog.products.len(), catalog.categories.len());

    let mut page = ShopPage::new(
        catalog,
        config.shop.clone(),
        Document::with_regions(shop::page::REGIONS),
    );
    page.render(year);
    if let Some(category) = &request.category {
        page.select_category(category);
    }
    if let Some(query) = &request.search {
        page.search(query);
    }
    if let Some(sort) = &request.sort {
        page.set_sort(sort);
    }
    if request.only_preorder {
        page.set_only_preorder(true);
    }
    for _ in 0..request.promo_steps {
        page.advance_promo();
    }
    if let Some(duration) = request.rotate_for {
        if page.start_promo() {
            thread::sleep(duration);
            page.stop_promo();
        }
    }

    let grid = page.grid().iter().map(|p| p.id.clone()).collect();
    let rotation = page.promo().rotation_ids();
    let doc = page.into_document();
    let promo = doc
        .region(PROMO_STRIP)
        .and_then(|r| r.attrs.get("data-product").cloned());
    Ok(ShopReport {
        products,
        categories,
        grid,
        rotation,
        promo,
        fragments: write_fragments(&doc, out, "shop")?,
    })
}

// ============================================================================
// Product page
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ProductReport {
    /// `None` when the catalog is empty.
    pub id: Option<String>,
    pub title: String,
    /// Whether the requested id was found (otherwise the first product is shown).
    pub matched: bool,
    pub related: Vec<String>,
    pub purchase: Option<Purchase>,
    pub fragments: usize,
}

pub fn build_product(
    config: &SiteConfig,
    site: &Path,
    query: &str,
    year: i32,
    out: Option<&Path>,
) -> Result<ProductReport, SiteError> {
    let catalog = Catalog::load(&site.join(&config.shop.catalog))?;
    let page = ProductPage::new(&catalog, query, config.shop.related_count);
    let mut doc = Document::with_regions(product::REGIONS);
    page.render(&mut doc, year);

    let shown = page.product();
    let matched = product::query_id(query)
        .is_some_and(|id| shown.is_some_and(|p| p.id == id));
    let related = shown
        .map(|p| {
            product::related(&catalog, p, config.shop.related_count)
                .iter()
                .map(|r| r.id.clone())
                .collect()
        })
        .unwrap_or_default();
    Ok(ProductReport {
        id: shown.map(|p| p.id.clone()),
        title: shown.map(|p| p.title.clone()).unwrap_or_default(),
        matched,
        related,
        purchase: page.purchase(),
        fragments: write_fragments(&doc, out, "product")?,
    })
}

// ============================================================================
// Private timeline
// ============================================================================

#[derive(Debug, Clone)]
pub struct TimelineRequest {
    /// Contents of browser storage at load time.
    pub storage: HashMap<String, String>,
    pub mode: Mode,
    /// Pages to load in `all` mode, the first included.
    pub pages: usize,
}

impl Default for TimelineRequest {
    fn default() -> Self {
        Self {
            storage: HashMap::new(),
            mode: Mode::All,
            pages: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineReport {
    pub total: usize,
    pub unlocked: bool,
    pub mode: Mode,
    pub rendered: Vec<String>,
    pub exhausted: bool,
    pub fragments: usize,
}

pub fn build_timeline(
    config: &SiteConfig,
    site: &Path,
    request: &TimelineRequest,
    out: Option<&Path>,
) -> Result<TimelineReport, SiteError> {
    let posts = timeline::load_posts(&site.join(&config.timeline.posts))?;
    let total = posts.len();
    let doc = Document::with_regions([
        timeline::TIMELINE,
        timeline::SENTINEL,
        timeline::LOADER,
        timeline::ABOUT_PANE,
        timeline::TABS,
        timeline::POST_COUNT,
        timeline::LAST_UPDATE,
    ]);
    let mut tl = Timeline::new(posts, config.timeline.clone(), &config.locale, doc);

    let storage: &dyn Storage = &request.storage;
    let unlocked = tl.boot(storage);
    if unlocked {
        if request.mode != Mode::All {
            tl.apply_mode(request.mode);
        }
        for _ in 1..request.pages {
            if tl.on_sentinel(0) == 0 {
                break;
            }
        }
    }

    let report = TimelineReport {
        total,
        unlocked,
        mode: tl.mode(),
        rendered: tl.rendered_ids().to_vec(),
        exhausted: !tl.has_sentinel(),
        fragments: 0,
    };
    let fragments = write_fragments(tl.document(), out, "timeline")?;
    Ok(TimelineReport { fragments, ..report })
}

// ============================================================================
// Check
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    /// Feed records that survived normalization.
    pub feed_posts: usize,
    /// Feed records dropped for a bad shape or date.
    pub dropped: usize,
    /// Feed slugs with no detail page under `posts/`.
    pub missing_pages: Vec<String>,
    /// Detail pages under `posts/` that no feed record points to.
    pub orphan_pages: Vec<String>,
    /// Feed posts that have no excerpt and no meta description to fall back to.
    pub without_excerpt: Vec<String>,
    pub products: usize,
    pub private_posts: usize,
    /// Hard failures: unreadable or invalid data files.
    pub errors: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate the site data files and cross-check the feed against `posts/`.
pub fn check_site(config: &SiteConfig, site: &Path, fetcher: &dyn Fetcher) -> CheckReport {
    let mut report = CheckReport::default();

    match fetcher.get(&config.feed.endpoint, FetchOptions::no_cache()) {
        Ok(body) => match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(serde_json::Value::Array(items)) => {
                let raw = items.len();
                let posts = feed::normalize_posts(items);
                report.feed_posts = posts.len();
                report.dropped = raw - posts.len();
                check_detail_pages(&posts, site, fetcher, &mut report);
            }
            Ok(_) => report.errors.push(format!("{}: not a JSON array", config.feed.endpoint)),
            Err(e) => report.errors.push(format!("{}: {e}", config.feed.endpoint)),
        },
        Err(e) => report.errors.push(e.to_string()),
    }

    match Catalog::load(&site.join(&config.shop.catalog)) {
        Ok(catalog) => report.products = catalog.products.len(),
        Err(e) => report.errors.push(format!("{}: {e}", config.shop.catalog)),
    }

    match timeline::load_posts(&site.join(&config.timeline.posts)) {
        Ok(posts) => report.private_posts = posts.len(),
        Err(e) => report.errors.push(format!("{}: {e}", config.timeline.posts)),
    }

    report
}

fn check_detail_pages(
    posts: &[FeedPost],
    site: &Path,
    fetcher: &dyn Fetcher,
    report: &mut CheckReport,
) {
    let posts_dir = site.join("posts");
    let pages: BTreeSet<String> = WalkDir::new(&posts_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let path = e.path();
            if path.extension()? != "html" {
                return None;
            }
            path.file_stem()?.to_str().map(str::to_string)
        })
        .collect();
    let slugs: BTreeSet<&str> = posts.iter().map(|p| p.post.slug.as_str()).collect();

    report.missing_pages = slugs
        .iter()
        .filter(|slug| !pages.contains(**slug))
        .map(|slug| slug.to_string())
        .collect();
    report.orphan_pages = pages
        .iter()
        .filter(|page| !slugs.contains(page.as_str()))
        .cloned()
        .collect();
    report.without_excerpt = posts
        .iter()
        .filter(|p| p.post.excerpt.trim().is_empty())
        .filter(|p| {
            fetcher
                .get(&p.url, FetchOptions::default())
                .ok()
                .and_then(|page| enhance::meta_description(&page))
                .is_none()
        })
        .map(|p| p.post.slug.clone())
        .collect();
}
