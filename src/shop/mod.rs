//! Catalog and shop page.
//!
//! | Module | Role |
//! |---|---|
//! | [`catalog`] | Loads `shop-data.json` (products + categories) |
//! | [`filter`] | Filter state, the grid pipeline and the top-N surfaces |
//! | [`render`] | Card, tile, hero, banner and category templates |
//! | [`promo`] | Promo strip rotation and its cancellable timer |
//! | [`page`] | [`ShopPage`]: state + document + event handlers |
//!
//! Filtering and sorting are pure functions over `&[Product]` and an explicit
//! [`ShopState`]; only [`page`] touches the document.

pub mod catalog;
pub mod filter;
pub mod page;
pub mod promo;
pub mod render;

pub use catalog::{Catalog, CatalogError};
pub use filter::{CategoryFilter, ShopState, SortOrder};
pub use page::{BuyAction, ProductModal, ShopPage};
pub use promo::{PromoStrip, RotationTimer};
