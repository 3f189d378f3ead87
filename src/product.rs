//! Product detail page.
//!
//! The page shows one product picked by `?id=`. A missing or unknown id falls
//! back to the first catalog entry; only an empty catalog shows nothing.

use crate::document::Document;
use crate::money::format_price;
use crate::shop::Catalog;
use crate::shop::render::related_card;
use crate::types::Product;
use maud::{Markup, html};

pub const IMAGE: &str = "pImage";
pub const TITLE: &str = "pTitle";
pub const SHORT: &str = "pShort";
pub const TYPE: &str = "pType";
pub const PRICE: &str = "pPrice";
pub const PERIOD: &str = "pPeriod";
pub const DESCRIPTION: &str = "pDescription";
pub const FULL: &str = "pFull";
pub const FEATURES: &str = "pFeatures";
pub const SCREENS: &str = "pScreens";
pub const RELATED: &str = "reco";
pub const YEAR: &str = "year";

pub const REGIONS: [&str; 12] = [
    IMAGE, TITLE, SHORT, TYPE, PRICE, PERIOD, DESCRIPTION, FULL, FEATURES, SCREENS, RELATED, YEAR,
];

pub const RELATED_COUNT: usize = 3;

pub const CHECKOUT_MISSING: &str =
    "Ссылка на оплату ещё не настроена. Укажите checkoutUrl в shop-data.json";

/// The `id` parameter of a query string (with or without the leading `?`).
pub fn query_id(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
}

/// The product to show for a query string.
pub fn resolve<'a>(catalog: &'a Catalog, query: &str) -> Option<&'a Product> {
    query_id(query)
        .and_then(|id| catalog.find(&id))
        .or_else(|| catalog.products.first())
}

/// Up to `n` products of the same category, excluding `product`.
pub fn related<'a>(catalog: &'a Catalog, product: &Product, n: usize) -> Vec<&'a Product> {
    catalog
        .products
        .iter()
        .filter(|p| p.category == product.category && p.id != product.id)
        .take(n)
        .collect()
}

/// One paragraph per non-blank line.
pub fn description_html(description: &str) -> Markup {
    html! {
        @for line in description.split('\n').filter(|l| !l.trim().is_empty()) {
            p { (line) }
        }
    }
}

/// Outcome of pressing buy on the product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purchase {
    /// Open the checkout in a new tab.
    Open(String),
    /// Tell the user checkout is not set up.
    Alert(String),
}

pub fn purchase(product: &Product) -> Purchase {
    match product.payment.checkout_url() {
        Some(url) => Purchase::Open(url.to_string()),
        None => Purchase::Alert(CHECKOUT_MISSING.to_string()),
    }
}

#[derive(Debug)]
pub struct ProductPage<'a> {
    catalog: &'a Catalog,
    product: Option<&'a Product>,
    related_count: usize,
}

impl<'a> ProductPage<'a> {
    pub fn new(catalog: &'a Catalog, query: &str, related_count: usize) -> Self {
        Self {
            catalog,
            product: resolve(catalog, query),
            related_count,
        }
    }

    pub fn product(&self) -> Option<&'a Product> {
        self.product
    }

    pub fn purchase(&self) -> Option<Purchase> {
        self.product.map(purchase)
    }

    /// Fill the page. Returns `false` when there is nothing to show.
    pub fn render(&self, doc: &mut Document, year: i32) -> bool {
        doc.set_text(YEAR, &year.to_string());
        let Some(p) = self.product else {
            log::warn!("catalog is empty, nothing to render on the product page");
            return false;
        };

        doc.set_attr(IMAGE, "src", p.cover.clone());
        doc.set_attr(IMAGE, "alt", p.title.clone());
        doc.set_text(TITLE, &p.title);
        doc.set_text(SHORT, &p.short);
        doc.set_text(TYPE, p.kind.label());
        doc.set_text(PRICE, &format_price(p.price, &p.currency));
        doc.set_text(PERIOD, p.period.as_deref().unwrap_or(""));

        let description = description_html(&p.description);
        doc.set_html(DESCRIPTION, description.clone());
        doc.set_html(FULL, description);

        doc.set_html(
            FEATURES,
            html! {
                @for feature in &p.features {
                    li class="flex items-start gap-2" {
                        span class="h-1.5 w-1.5 rounded-full bg-indigo-500 mt-2" {}
                        span { (feature) }
                    }
                }
            },
        );
        doc.set_html(
            SCREENS,
            html! {
                @for src in &p.images {
                    img src=(src) alt="" class="w-full h-auto rounded-xl border border-neutral-200 dark:border-neutral-800";
                }
            },
        );
        doc.set_html(
            RELATED,
            html! {
                @for other in related(self.catalog, p, self.related_count) {
                    (related_card(other))
                }
            },
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::product;
    use crate::types::Payment;

    fn catalog() -> Catalog {
        let mut p1 = product("p1", "fonts");
        p1.description = "First line\n\n  \nSecond <line>".into();
        p1.features = vec!["OTF".into(), "WOFF2".into()];
        p1.images = vec!["/img/s1.png".into()];
        let products = vec![
            p1,
            product("p2", "fonts"),
            product("p3", "subs"),
            product("p4", "fonts"),
            product("p5", "fonts"),
            product("p6", "fonts"),
        ];
        Catalog::new(products, Vec::new()).unwrap()
    }

    #[test]
    fn query_id_accepts_both_forms() {
        assert_eq!(query_id("?id=p2").as_deref(), Some("p2"));
        assert_eq!(query_id("ref=x&id=a+b%26c").as_deref(), Some("a b&c"));
        assert_eq!(query_id(""), None);
    }

    #[test]
    fn unknown_id_falls_back_to_first_product() {
        let catalog = catalog();
        assert_eq!(resolve(&catalog, "?id=nope").unwrap().id, "p1");
        assert_eq!(resolve(&catalog, "").unwrap().id, "p1");
        assert_eq!(resolve(&catalog, "?id=p3").unwrap().id, "p3");
        assert!(resolve(&Catalog::default(), "?id=p1").is_none());
    }

    #[test]
    fn related_is_same_category_without_self() {
        let catalog = catalog();
        let p1 = catalog.find("p1").unwrap();
        let ids: Vec<_> = related(&catalog, p1, RELATED_COUNT).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p2", "p4", "p5"]);
    }

    #[test]
    fn render_fills_both_description_regions() {
        let catalog = catalog();
        let page = ProductPage::new(&catalog, "?id=p1", RELATED_COUNT);
        let mut doc = Document::with_regions(REGIONS);
        assert!(page.render(&mut doc, 2025));

        let expected = "<p>First line</p><p>Second &lt;line&gt;</p>";
        assert_eq!(doc.html(DESCRIPTION), Some(expected));
        assert_eq!(doc.html(FULL), Some(expected));
        assert_eq!(doc.html(TYPE), Some("Цифровой товар"));
        assert_eq!(doc.html(PERIOD), Some(""));
        assert_eq!(doc.html(FEATURES).unwrap().matches("<li").count(), 2);
        assert!(doc.html(SCREENS).unwrap().contains("/img/s1.png"));
        assert_eq!(doc.html(RELATED).unwrap().matches("<a ").count(), 3);
        assert_eq!(doc.region(IMAGE).unwrap().attrs["src"], "/img/p1.jpg");
        assert_eq!(doc.html(YEAR), Some("2025"));
    }

    #[test]
    fn empty_catalog_renders_only_the_year() {
        let catalog = Catalog::default();
        let page = ProductPage::new(&catalog, "", RELATED_COUNT);
        let mut doc = Document::with_regions(REGIONS);
        assert!(!page.render(&mut doc, 2025));
        assert_eq!(doc.html(TITLE), Some(""));
        assert!(page.purchase().is_none());
    }

    #[test]
    fn purchase_needs_a_configured_checkout() {
        let mut p = product("p1", "fonts");
        assert_eq!(purchase(&p), Purchase::Alert(CHECKOUT_MISSING.to_string()));
        p.payment = Payment {
            checkout_url: Some("#REPLACE_ME".into()),
        };
        assert!(matches!(purchase(&p), Purchase::Alert(_)));
        p.payment.checkout_url = Some("https://pay.example/p1".into());
        assert_eq!(purchase(&p), Purchase::Open("https://pay.example/p1".into()));
    }
}
