//! Shop templates.

use crate::money::{format_price, price_label};
use crate::types::{Category, Product};
use maud::{Markup, PreEscaped, html};

/// Characters of blurb shown on hero tiles and the promo banner.
pub const BLURB_CHARS: usize = 120;

const BUY: &str = "Купить";

fn product_price(product: &Product) -> String {
    price_label(product.price, &product.currency, product.period.as_deref())
}

/// Compact tile; clicking it opens the quick preview for `data-product`.
pub fn tile_card(product: &Product) -> Markup {
    html! {
        button class="h-full text-left bg-white dark:bg-neutral-900 border border-neutral-200 dark:border-neutral-800 rounded-2xl p-2 hover:shadow-md transition" data-product=(product.id) {
            div class="aspect-4-5 bg-neutral-100 dark:bg-neutral-800" {
                img src=(product.cover) alt=(product.title) loading="lazy" decoding="async";
            }
            div class="mt-2 text-[13px] md:text-[14px] font-semibold leading-5 line-clamp-2 min-h-[2.6em]" title=(product.title) {
                (product.title)
            }
        }
    }
}

pub fn tiles<'a>(products: impl IntoIterator<Item = &'a Product>) -> Markup {
    html! {
        @for product in products {
            (tile_card(product))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeroVariant {
    Dark,
    Light,
}

impl HeroVariant {
    fn cta_class(self) -> &'static str {
        match self {
            HeroVariant::Dark => "cta cta-dark mt-3",
            HeroVariant::Light => "cta cta-light mt-3",
        }
    }
}

pub fn hero_tile(product: &Product, variant: HeroVariant) -> Markup {
    html! {
        div class="tile" data-product=(product.id) {
            img src=(product.cover) alt=(product.title);
            div class="shade" {}
            div class="copy" {
                div class="headline" { (product.title) }
                div class="subhead" { (product.blurb(BLURB_CHARS)) }
                div class="mt-2 text-sm opacity-90" { (product_price(product)) }
                button class=(variant.cta_class()) type="button" { (BUY) }
            }
        }
    }
}

/// First pick dark, second light.
pub fn hero_tiles(picks: &[&Product]) -> Markup {
    let variants = [HeroVariant::Dark, HeroVariant::Light];
    html! {
        @for (product, variant) in picks.iter().zip(variants) {
            (hero_tile(product, variant))
        }
    }
}

/// Inner content of the promo strip for one product.
pub fn promo_banner(product: &Product) -> Markup {
    html! {
        div class="bg" {}
        div class="copy" {
            span class="text-xs px-2 py-1 rounded-full border border-neutral-200 dark:border-neutral-700 bg-white/60 dark:bg-neutral-900/60" { "Акция" }
            span class="title" { (product.title) }
            span class="text-xs text-neutral-600 dark:text-neutral-300 hidden sm:inline" { (product.blurb(BLURB_CHARS)) }
            button class="btn bg-indigo-600 text-white" type="button" { (BUY) }
        }
    }
}

/// `all` followed by the catalog categories.
pub fn category_entries(categories: &[Category]) -> Vec<Category> {
    let all = Category {
        id: "all".to_string(),
        name: "Все".to_string(),
    };
    std::iter::once(all).chain(categories.iter().cloned()).collect()
}

pub fn category_icon(id: &str) -> Markup {
    let path = match id {
        "all" => r#"<path d="M5 5h4v4H5V5zm10 0h4v4h-4V5zM5 15h4v4H5v-4zm10 0h4v4h-4v-4zM10 10h4v4h-4v-4z"/>"#,
        "subs" => r#"<path d="M12 17.27L18.18 21l-1.64-7.03L22 9.24l-7.19-.61L12 2 9.19 8.63 2 9.24l5.46 4.73L5.82 21z"/>"#,
        "digital" => r#"<path d="M7 14l5-5 5 5-5 5-5-5z"/>"#,
        "services" => r#"<path d="M22.7 19.3l-6.4-6.4a7 7 0 10-3.4 3.4l6.4 6.4 3.4-3.4zM4 10a6 6 0 1112 0A6 6 0 014 10z"/>"#,
        _ => r#"<circle cx="12" cy="12" r="4"/>"#,
    };
    html! {
        svg class="h-4 w-4" viewBox="0 0 24 24" fill="currentColor" { (PreEscaped(path)) }
    }
}

/// Filter chips; exactly the chip for `active` carries `is-active`.
pub fn category_tabs(categories: &[Category], active: &str) -> Markup {
    html! {
        @for category in category_entries(categories) {
            @let class = if category.id == active { "filter-chip is-active" } else { "filter-chip" };
            button data-cat=(category.id) class=(class) { (category.name) }
        }
    }
}

/// Dropdown menu entries with icons.
pub fn category_menu(categories: &[Category]) -> Markup {
    html! {
        @for category in category_entries(categories) {
            button data-cat=(category.id) role="menuitem" class="w-full text-left inline-flex items-center gap-2 rounded-xl border border-neutral-200 dark:border-neutral-700 px-3 py-2 text-sm hover:bg-neutral-50 dark:hover:bg-neutral-800" {
                (category_icon(&category.id))
                span { (category.name) }
            }
        }
    }
}

/// Mobile bottom-sheet entries.
pub fn category_sheet(categories: &[Category]) -> Markup {
    html! {
        @for category in category_entries(categories) {
            button data-cat=(category.id) class="h-11 w-full inline-flex items-center justify-center gap-2 rounded-xl border border-neutral-200 dark:border-neutral-700 text-sm hover:bg-neutral-50 dark:hover:bg-neutral-800" {
                (category.name)
            }
        }
    }
}

/// Short price tag list used in the quick preview.
pub fn feature_tags(features: &[String]) -> Markup {
    html! {
        @for feature in features {
            span class="text-xs px-2 py-1 rounded-full border border-neutral-200 dark:border-neutral-700" { (feature) }
            " "
        }
    }
}

/// Related-product card on the product page.
pub fn related_card(product: &Product) -> Markup {
    let price = format_price(product.price, &product.currency);
    let period = product.period.as_deref().unwrap_or("");
    html! {
        a href=(product.page_url()) class="editorial-item glass glass-border bg-white/70 dark:bg-neutral-900/70 shadow-soft" {
            div class="relative h-36" {
                img src=(product.cover) alt=(product.title) class="absolute inset-0 w-full h-full object-cover" loading="lazy";
                div class="absolute inset-0 bg-gradient-to-t from-black/40 via-black/5 to-transparent" {}
            }
            div class="px-5 pt-4 pb-5" {
                div class="text-xs font-semibold text-indigo-600 dark:text-indigo-400" { (product.kind.tag()) }
                h3 class="title text-lg font-semibold" { (product.title) }
                div class="mt-1 text-sm text-neutral-600 dark:text-neutral-300 line-clamp-2" { (product.short) }
                div class="mt-3 text-base font-semibold" { (price) " " (period) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::product;

    fn categories() -> Vec<Category> {
        vec![
            Category { id: "subs".into(), name: "Подписки".into() },
            Category { id: "fonts".into(), name: "Шрифты".into() },
        ]
    }

    #[test]
    fn tile_carries_product_id_and_escapes_title() {
        let mut p = product("p1", "subs");
        p.title = "<Bold> & co".into();
        let html = tile_card(&p).into_string();
        assert!(html.contains(r#"data-product="p1""#));
        assert!(html.contains("&lt;Bold&gt; &amp; co"));
        assert!(!html.contains("<Bold>"));
    }

    #[test]
    fn hero_tiles_alternate_variants() {
        let a = product("a", "subs");
        let b = product("b", "subs");
        let html = hero_tiles(&[&a, &b]).into_string();
        let dark = html.find("cta-dark").unwrap();
        let light = html.find("cta-light").unwrap();
        assert!(dark < light);
        assert_eq!(hero_tiles(&[&a]).into_string().matches("class=\"tile\"").count(), 1);
    }

    #[test]
    fn blurb_is_capped() {
        let mut p = product("a", "subs");
        p.short = "ж".repeat(200);
        let html = promo_banner(&p).into_string();
        assert!(html.contains(&"ж".repeat(BLURB_CHARS)));
        assert!(!html.contains(&"ж".repeat(BLURB_CHARS + 1)));
    }

    #[test]
    fn tabs_mark_exactly_one_active_chip() {
        let html = category_tabs(&categories(), "fonts").into_string();
        assert_eq!(html.matches("is-active").count(), 1);
        assert!(html.contains(r#"data-cat="fonts" class="filter-chip is-active""#));
        assert!(html.contains(r#"data-cat="all" class="filter-chip""#));
    }

    #[test]
    fn menu_has_icon_per_entry() {
        let html = category_menu(&categories()).into_string();
        assert_eq!(html.matches("<svg").count(), 3);
        assert!(html.contains("<circle"));
        assert!(category_sheet(&categories()).into_string().contains("Все"));
    }
}
