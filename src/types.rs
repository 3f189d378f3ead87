//! Shared records used across the feed, timeline and shop pipelines.
//!
//! Everything here is deserialized from the site's JSON data files and is
//! read-only afterwards. Derived values (detail URLs, parsed timestamps) live
//! on wrapper types so the raw records stay a faithful copy of the input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A feed post as published in `/posts/index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub slug: String,
    /// ISO-8601 date or date-time. Posts whose date does not parse are dropped.
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub image_alt: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_label: String,
    #[serde(default)]
    pub featured: bool,
    /// Raw layout key; resolved through [`Layout::from_key`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

/// A post that survived normalization: it has a detail URL and a valid date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    /// `/posts/{slug}.html`
    pub url: String,
    /// Milliseconds since the Unix epoch.
    pub date_value: i64,
}

impl FeedPost {
    pub fn layout(&self) -> Layout {
        Layout::from_key(self.post.layout.as_deref())
    }
}

/// Grid card layout variants.
///
/// Closed set: unknown or missing keys resolve to [`Layout::Standard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    Feature,
    Tall,
    #[default]
    Standard,
}

impl Layout {
    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some("feature") => Layout::Feature,
            Some("tall") => Layout::Tall,
            _ => Layout::Standard,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Layout::Feature => "feature",
            Layout::Tall => "tall",
            Layout::Standard => "standard",
        }
    }
}

/// An entry of the private timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivatePost {
    pub id: String,
    /// ISO-8601 date-time with offset.
    pub date: String,
    /// Free text; may contain newlines, URLs, `#tags` and `@mentions`.
    pub text: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl PrivatePost {
    pub fn has_media(&self) -> bool {
        !self.images.is_empty()
    }
}

/// Shop category as listed in the catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Subscription,
    Digital,
    Service,
}

impl ProductType {
    /// Short badge label used on cards.
    pub fn tag(self) -> &'static str {
        match self {
            ProductType::Subscription => "Подписка",
            ProductType::Digital => "Цифровой",
            ProductType::Service => "Услуга",
        }
    }

    /// Long label used on the product page.
    pub fn label(self) -> &'static str {
        match self {
            ProductType::Subscription => "Подписка",
            ProductType::Digital => "Цифровой товар",
            ProductType::Service => "Услуга",
        }
    }
}

/// Placeholder prefix for checkout links that have not been filled in yet.
pub const CHECKOUT_PLACEHOLDER: &str = "#REPLACE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
}

impl Payment {
    /// The checkout URL, unless it is missing, blank or still a placeholder.
    pub fn checkout_url(&self) -> Option<&str> {
        self.checkout_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && !url.starts_with(CHECKOUT_PLACEHOLDER))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: ProductType,
    pub price: Decimal,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub payment: Payment,
    #[serde(default)]
    pub popularity: i64,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub added_at: i64,
    #[serde(default)]
    pub recommended: bool,
    #[serde(default)]
    pub preorder: bool,
}

impl Product {
    /// Text matched by the shop search box.
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.title, self.short, self.description).to_lowercase()
    }

    /// Short blurb for tiles and banners: `short`, else `description`, cut to `max` chars.
    pub fn blurb(&self, max: usize) -> String {
        let source = if self.short.is_empty() {
            &self.description
        } else {
            &self.short
        };
        source.chars().take(max).collect()
    }

    pub fn page_url(&self) -> String {
        let id: String = url::form_urlencoded::byte_serialize(self.id.as_bytes()).collect();
        format!("/product.html?id={id}")
    }
}
