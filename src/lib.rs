//! # Lenta
//!
//! The rendering layer of a small editorial site: a post feed with a
//! full-screen overlay, a private micro-blog timeline, and a catalog with a
//! product page.
//!
//! Pages are modelled as a [`document::Document`]: a set of named regions, one
//! per mount point in the static markup. Every page controller renders HTML
//! fragments (Maud `Markup`) into those regions and nothing else. A region the
//! page does not have turns the write into a no-op, so one missing element
//! never breaks the rest of the page.
//!
//! # Pipelines
//!
//! ```text
//! Feed       /posts/index.json ─ fetch ─ normalize ─ render ─┬─ featured / latest grids
//!                                                            ├─ overlay hero + list
//!                                                            └─ FeedEvent::Rendered ─ enhancements
//! Timeline   private-posts.json ─ sort ─ unlock gate ─ pages of 5 / media / about
//! Shop       shop-data.json ─ ShopState ─ filter + sort ─ grid, sections, promo strip
//! Product    shop-data.json + ?id= ─ resolve ─ detail + related
//! ```
//!
//! Network access goes through the [`fetch::Fetcher`] trait and comes back as
//! an explicit result. The feed turns that into a [`feed::FeedLoad`]
//! (loaded / empty / failed) that rendering consumes; a failed load leaves the
//! page's static fallback untouched.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Records read from the site's JSON files (`Post`, `PrivatePost`, `Product`, ...) |
//! | [`dates`] | Timestamp parsing and localized date labels with a numeric fallback |
//! | [`fetch`] | [`fetch::Fetcher`] trait, directory and HTTP implementations |
//! | [`document`] | Page regions that render steps write into |
//! | [`cards`] | Featured, grid and overlay card templates |
//! | [`feed`] | Feed loading, normalization and rendering; overlay visibility |
//! | [`enhance`] | Post-render passes: re-sort, date relabel, category chips, excerpt backfill, overlay search |
//! | [`timeline`] | Private timeline: unlock gate, paging sentinel, tabs, post template |
//! | [`shop`] | Catalog, filter pipeline, templates, promo rotation, shop page controller |
//! | [`product`] | Product page: id resolution, detail regions, related products, purchase |
//! | [`money`] | Currency formatting via `rusty-money` |
//! | [`config`] | `lenta.toml` loading, validation and merging |
//! | [`site`] | Page pipelines run by the CLI, with reports |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit State Objects
//!
//! Filter, sort, paging and overlay state live in plain structs
//! ([`shop::ShopState`], [`timeline::Timeline`], [`feed::FeedView`]) owned by
//! the page controller. Handlers take `&mut self`, update the state, and
//! re-render the affected regions synchronously.
//!
//! ## Concurrency
//!
//! Rendering is single-threaded. Two places run work elsewhere: excerpt
//! backfill fetches detail pages on the rayon pool, and the promo strip
//! rotates on a [`shop::RotationTimer`] thread that is stopped through a
//! channel. A strip owns at most one timer; restarting replaces it.

pub mod cards;
pub mod config;
pub mod dates;
pub mod document;
pub mod enhance;
pub mod feed;
pub mod fetch;
pub mod money;
pub mod output;
pub mod product;
pub mod shop;
pub mod site;
pub mod timeline;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
