//! Shared test utilities for the lenta test suite.
//!
//! Provides record builders with predictable field values, an in-memory
//! [`Fetcher`] that records every request, and a fixture copier for tests that
//! need a real site directory.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fetcher = MemoryFetcher::default().with("/posts/index.json", "[]");
//! let post = feed_post("alpha", "2024-01-01", true);
//! assert_eq!(post.post.title, "Title alpha");
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use crate::dates::timestamp_millis;
use crate::document::Document;
use crate::feed;
use crate::fetch::{FetchError, FetchOptions, Fetcher};
use crate::types::{FeedPost, Payment, Post, PrivatePost, Product, ProductType};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// In-memory fetcher
// =========================================================================

/// Serves canned bodies by path; anything else is a 404.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<(String, bool)>>,
}

impl MemoryFetcher {
    pub fn with(mut self, path: &str, body: &str) -> Self {
        self.pages.insert(path.to_string(), body.to_string());
        self
    }

    /// Every request made so far as `(path, no_cache)`, in call order.
    pub fn requests(&self) -> Vec<(String, bool)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested(&self, path: &str) -> bool {
        self.requests().iter().any(|(p, _)| p == path)
    }
}

impl Fetcher for MemoryFetcher {
    fn get(&self, path: &str, options: FetchOptions) -> Result<String, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), options.no_cache));
        self.pages.get(path).cloned().ok_or(FetchError::Status {
            path: path.to_string(),
            status: 404,
        })
    }
}

// =========================================================================
// Record builders
// =========================================================================

/// A normalized feed post in category `essays`. Panics on a bad date.
pub fn feed_post(slug: &str, date: &str, featured: bool) -> FeedPost {
    let date_value =
        timestamp_millis(date).unwrap_or_else(|| panic!("test date {date:?} must parse"));
    FeedPost {
        post: Post {
            slug: slug.to_string(),
            date: date.to_string(),
            title: format!("Title {slug}"),
            excerpt: format!("Excerpt {slug}"),
            image: format!("/img/{slug}.jpg"),
            image_alt: format!("Alt {slug}"),
            category: "essays".to_string(),
            category_label: "Essays".to_string(),
            featured,
            layout: None,
        },
        url: feed::post_url(slug),
        date_value,
    }
}

/// A document with every feed mount point.
pub fn feed_document() -> Document {
    Document::with_regions([
        feed::FEATURED_GRID,
        feed::LATEST_GRID,
        feed::OVERLAY_HERO,
        feed::OVERLAY_LIST,
        feed::OVERLAY,
    ])
}

pub fn private_post(id: &str, date: &str, images: usize) -> PrivatePost {
    PrivatePost {
        id: id.to_string(),
        date: date.to_string(),
        text: format!("Post {id}"),
        images: (0..images).map(|i| format!("/img/{id}-{i}.jpg")).collect(),
    }
}

/// A digital product priced at 100 RUB.
pub fn product(id: &str, category: &str) -> Product {
    Product {
        id: id.to_string(),
        title: format!("Product {id}"),
        short: format!("Short {id}"),
        description: format!("Description {id}"),
        cover: format!("/img/{id}.jpg"),
        images: Vec::new(),
        category: category.to_string(),
        kind: ProductType::Digital,
        price: rust_decimal::Decimal::from(100),
        currency: "RUB".to_string(),
        period: None,
        features: Vec::new(),
        payment: Payment::default(),
        popularity: 0,
        added_at: 0,
        recommended: false,
        preorder: false,
    }
}
