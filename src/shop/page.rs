//! The shop page controller.
//!
//! [`ShopPage`] owns the filter state and the page document. Each handler
//! updates the state and re-renders only the regions that depend on it.

use crate::config::ShopConfig;
use crate::document::Document;
use crate::money::price_label;
use crate::shop::catalog::Catalog;
use crate::shop::filter::{
    CategoryFilter, ShopState, SortOrder, filter_sorted, hero_picks, home_sections, top_new,
    top_popular, top_recommended,
};
use crate::shop::promo::{PROMO_STRIP, PromoStrip};
use crate::shop::render;
use crate::types::Product;
use maud::{Markup, html};
use std::time::Duration;

pub const GRID: &str = "grid";
pub const EMPTY_STATE: &str = "emptyState";
pub const POPULAR: &str = "popular";
pub const NEW: &str = "new";
pub const RECOMMENDED: &str = "recommended";
pub const POPULAR_GRID: &str = "popularGrid";
pub const NEW_GRID: &str = "newGrid";
pub const HERO_TILES: &str = "heroTiles";
pub const CATEGORY_TABS: &str = "categoryTabs";
pub const CATEGORY_SHEET: &str = "catSheetList";
pub const CATEGORY_MENU: &str = "catMenu";
pub const PRODUCT_MODAL: &str = "productModal";
pub const YEAR: &str = "year";

/// Every shop mount point.
pub const REGIONS: [&str; 14] = [
    GRID,
    EMPTY_STATE,
    POPULAR,
    NEW,
    RECOMMENDED,
    POPULAR_GRID,
    NEW_GRID,
    HERO_TILES,
    CATEGORY_TABS,
    CATEGORY_SHEET,
    CATEGORY_MENU,
    PRODUCT_MODAL,
    YEAR,
    PROMO_STRIP,
];

/// What the buy button in the quick preview does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuyAction {
    /// Open the configured checkout in a new tab.
    OpenCheckout(String),
    /// No checkout configured: go to the product page instead.
    Navigate(String),
}

impl BuyAction {
    pub fn for_product(product: &Product) -> Self {
        match product.payment.checkout_url() {
            Some(url) => BuyAction::OpenCheckout(url.to_string()),
            None => BuyAction::Navigate(product.page_url()),
        }
    }

    pub fn href(&self) -> &str {
        match self {
            BuyAction::OpenCheckout(url) | BuyAction::Navigate(url) => url,
        }
    }
}

/// Quick preview of one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductModal {
    pub product_id: String,
    pub cover: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub tags: Vec<String>,
    pub buy: BuyAction,
}

impl ProductModal {
    pub const TAG_COUNT: usize = 3;

    pub fn open(product: &Product) -> Self {
        let description = if product.short.is_empty() {
            product.description.clone()
        } else {
            product.short.clone()
        };
        Self {
            product_id: product.id.clone(),
            cover: product.cover.clone(),
            title: product.title.clone(),
            description,
            price: price_label(product.price, &product.currency, product.period.as_deref()),
            tags: product.features.iter().take(Self::TAG_COUNT).cloned().collect(),
            buy: BuyAction::for_product(product),
        }
    }

    pub fn render(&self) -> Markup {
        let (target, rel) = match self.buy {
            BuyAction::OpenCheckout(_) => (Some("_blank"), Some("noopener")),
            BuyAction::Navigate(_) => (None, None),
        };
        html! {
            div class="modal-card" data-product=(self.product_id) {
                button type="button" data-close="" aria-label="Закрыть" { "×" }
                img id="mImg" src=(self.cover) alt=(self.title);
                h3 id="mTitle" { (self.title) }
                p id="mDesc" { (self.description) }
                div id="mPrice" { (self.price) }
                div id="mTags" { (render::feature_tags(&self.tags)) }
                a id="buyBtn" href=(self.buy.href()) target=[target] rel=[rel] { "Купить" }
            }
        }
    }
}

#[derive(Debug)]
pub struct ShopPage {
    catalog: Catalog,
    state: ShopState,
    settings: ShopConfig,
    promo: PromoStrip,
    modal: Option<ProductModal>,
    doc: Document,
}

impl ShopPage {
    pub fn new(catalog: Catalog, settings: ShopConfig, doc: Document) -> Self {
        let promo = PromoStrip::new(&catalog.products);
        Self {
            catalog,
            state: ShopState::default(),
            settings,
            promo,
            modal: None,
            doc,
        }
    }

    pub fn state(&self) -> &ShopState {
        &self.state
    }

    /// The page, with any promo frames published since the last call applied.
    pub fn document(&mut self) -> &Document {
        self.refresh_promo();
        &self.doc
    }

    /// Stop the promo timer and hand back the final page.
    pub fn into_document(mut self) -> Document {
        self.promo.stop();
        self.refresh_promo();
        std::mem::take(&mut self.doc)
    }

    pub fn promo(&self) -> &PromoStrip {
        &self.promo
    }

    /// The main grid's products for the current state.
    pub fn grid(&self) -> Vec<&Product> {
        filter_sorted(&self.catalog.products, &self.state)
    }

    pub fn modal(&self) -> Option<&ProductModal> {
        self.modal.as_ref()
    }

    /// Initial render of every surface the page has.
    pub fn render(&mut self, year: i32) {
        let products = &self.catalog.products;
        let n = self.settings.section_size;
        self.doc.set_html(POPULAR, render::tiles(top_popular(products, n)));
        self.doc.set_html(NEW, render::tiles(top_new(products, n)));
        self.doc.set_html(RECOMMENDED, render::tiles(top_recommended(products, n)));
        self.doc.set_html(HERO_TILES, render::hero_tiles(&hero_picks(products)));
        self.doc.set_html(CATEGORY_SHEET, render::category_sheet(&self.catalog.categories));
        self.doc.set_html(CATEGORY_MENU, render::category_menu(&self.catalog.categories));
        self.doc.set_hidden(PRODUCT_MODAL, true);
        self.doc.set_text(YEAR, &year.to_string());
        self.promo.flush(&mut self.doc);
        self.render_tabs();
        self.render_home_sections();
        self.render_grid();
    }

    fn render_tabs(&mut self) {
        let active = self.state.category.value();
        self.doc.set_html(
            CATEGORY_TABS,
            render::category_tabs(&self.catalog.categories, active),
        );
    }

    fn render_home_sections(&mut self) {
        let sections = home_sections(
            &self.catalog.products,
            &self.state,
            self.settings.home_section_size,
        );
        self.doc.set_html(POPULAR_GRID, render::tiles(sections.popular));
        self.doc.set_html(NEW_GRID, render::tiles(sections.new));
    }

    /// The main grid and its empty state. Skipped when the page has no grid.
    fn render_grid(&mut self) -> usize {
        if !self.doc.has(GRID) {
            return 0;
        }
        let list = filter_sorted(&self.catalog.products, &self.state);
        let count = list.len();
        self.doc.set_html(GRID, render::tiles(list));
        self.doc.set_hidden(EMPTY_STATE, count > 0);
        count
    }

    /// Category chip, menu or sheet click.
    pub fn select_category(&mut self, value: &str) -> usize {
        self.state.category = CategoryFilter::from_value(value);
        self.render_tabs();
        self.render_home_sections();
        self.render_grid()
    }

    pub fn search(&mut self, query: &str) -> usize {
        self.state.query = query.to_string();
        self.render_home_sections();
        self.render_grid()
    }

    pub fn set_sort(&mut self, value: &str) -> usize {
        self.state.sort = SortOrder::from_value(value);
        self.render_grid()
    }

    pub fn set_only_preorder(&mut self, only_preorder: bool) -> usize {
        self.state.only_preorder = only_preorder;
        self.render_grid()
    }

    /// Click on anything carrying `data-product`. Unknown ids do nothing.
    pub fn open_preview(&mut self, product_id: &str) -> Option<&ProductModal> {
        let product = self.catalog.find(product_id)?;
        let modal = ProductModal::open(product);
        self.doc.set_html(PRODUCT_MODAL, modal.render());
        self.doc.set_hidden(PRODUCT_MODAL, false);
        self.modal = Some(modal);
        self.modal.as_ref()
    }

    pub fn close_preview(&mut self) {
        self.modal = None;
        self.doc.set_hidden(PRODUCT_MODAL, true);
    }

    /// Start the promo rotation with the configured timing.
    pub fn start_promo(&mut self) -> bool {
        self.promo.start(
            Duration::from_millis(self.settings.promo_interval_ms),
            Duration::from_millis(self.settings.promo_fade_ms),
            self.settings.reduced_motion,
        )
    }

    pub fn stop_promo(&mut self) {
        self.promo.stop();
        self.refresh_promo();
    }

    /// Apply the promo frames the timer published. Returns how many.
    pub fn refresh_promo(&mut self) -> usize {
        self.promo.drain(&mut self.doc)
    }

    /// Advance the promo strip one item by hand.
    pub fn advance_promo(&mut self) -> bool {
        self.promo.advance();
        self.promo.flush(&mut self.doc)
    }
}
