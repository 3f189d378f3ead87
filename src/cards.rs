//! Feed card templates.
//!
//! Each template maps a post and a date formatter to a [`Card`]: the rendered
//! fragment plus the attributes later enhancement passes key on
//! (`data-published`, `data-cat`). Cards stay structured until they are
//! written into the page so that re-sorting, date relabeling, category
//! filtering and excerpt backfill can operate on them without re-parsing HTML.
//!
//! Templates are pure. All text goes through maud and is escaped.

use crate::dates::DateFormatter;
use crate::types::{FeedPost, Layout};
use maud::{Markup, html};

/// Which template a card was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Featured,
    Grid(Layout),
    OverlayHero,
    Overlay,
}

/// Per-layout presentation of a grid card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    pub wrapper: &'static str,
    pub media: &'static str,
    pub content: &'static str,
    pub with_gradient: bool,
    pub shadow: bool,
}

pub fn layout_config(layout: Layout) -> LayoutConfig {
    match layout {
        Layout::Feature => LayoutConfig {
            wrapper: "md:col-span-4 md:row-span-1",
            media: "relative aspect-16-9 md:aspect-auto md:h-[300px]",
            content: "px-6 pt-5 pb-4 md:px-8 md:pt-6 md:pb-4",
            with_gradient: true,
            shadow: true,
        },
        Layout::Tall => LayoutConfig {
            wrapper: "md:col-span-2 md:row-span-1",
            media: "relative h-56 md:h-[300px]",
            content: "px-6 pt-5 pb-4",
            with_gradient: false,
            shadow: false,
        },
        Layout::Standard => LayoutConfig {
            wrapper: "md:col-span-3 md:row-span-1",
            media: "relative aspect-16-9",
            content: "p-6",
            with_gradient: false,
            shadow: true,
        },
    }
}

const EXCERPT_CLASS: &str = "card-excerpt mt-2 text-sm text-neutral-600 dark:text-neutral-300 line-clamp-2";

/// A rendered feed card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub kind: CardKind,
    pub href: String,
    /// Raw `data-published` value.
    pub published: Option<String>,
    /// `data-cat`
    pub category: String,
    /// `data-layout`, grid cards only. Keeps the raw key even when it fell back.
    pub layout_key: Option<String>,
    pub category_label: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub image: String,
    pub image_alt: String,
    pub date_label: String,
    pub hidden: bool,
}

impl Card {
    fn from_post(kind: CardKind, post: &FeedPost, format_date: &DateFormatter) -> Self {
        let p = &post.post;
        Self {
            kind,
            href: post.url.clone(),
            published: Some(p.date.clone()),
            category: p.category.clone(),
            layout_key: None,
            category_label: p.category_label.clone(),
            title: p.title.clone(),
            excerpt: Some(p.excerpt.clone()).filter(|e| !e.trim().is_empty()),
            image: p.image.clone(),
            image_alt: p.image_alt.clone(),
            date_label: format_date.format(&p.date),
            hidden: false,
        }
    }

    /// Concatenated visible text, as the browser's `textContent` would see it.
    pub fn text_content(&self) -> String {
        [
            self.category_label.as_str(),
            self.title.as_str(),
            self.excerpt.as_deref().unwrap_or_default(),
            self.date_label.as_str(),
        ]
        .join(" ")
    }

    /// Cards linking to a post detail page (backfill candidates).
    pub fn links_to_post(&self) -> bool {
        self.href.starts_with("/posts/")
    }

    pub fn render(&self) -> Markup {
        match self.kind {
            CardKind::Featured => self.render_featured(),
            CardKind::Grid(layout) => self.render_grid(layout_config(layout)),
            CardKind::OverlayHero => self.render_overlay_hero(),
            CardKind::Overlay => self.render_overlay_card(),
        }
    }

    fn classes(&self, base: &str) -> String {
        if self.hidden {
            format!("{base} hidden")
        } else {
            base.to_string()
        }
    }

    fn render_featured(&self) -> Markup {
        let class = self.classes(
            "card group overflow-hidden rounded-3xl border border-neutral-200 dark:border-neutral-800 transition glass glass-border shadow-soft bg-white/70 dark:bg-neutral-900/60",
        );
        html! {
            a class=(class) href=(self.href) data-published=[self.published.as_deref()] data-cat=(self.category) {
                div class="aspect-16-9" {
                    img src=(self.image) alt=(self.image_alt) loading="lazy" decoding="async";
                }
                div class="p-6" {
                    div class="text-xs text-red-600 font-semibold" { (self.category_label) }
                    h3 class="mt-2 text-lg font-semibold group-hover:text-red-600 transition" { (self.title) }
                    @if let Some(excerpt) = &self.excerpt {
                        p class=(EXCERPT_CLASS) { (excerpt) }
                    }
                    div class="card-date mt-4 text-xs text-neutral-500" { (self.date_label) }
                }
            }
        }
    }

    fn render_grid(&self, cfg: LayoutConfig) -> Markup {
        let shadow = if cfg.shadow { " shadow-soft" } else { "" };
        let class = self.classes(&format!(
            "editorial-item card {} glass glass-border bg-white/70 dark:bg-neutral-900/60{}",
            cfg.wrapper, shadow
        ));
        let layout = self.layout_key.as_deref().unwrap_or("standard");
        html! {
            a class=(class) href=(self.href) data-published=[self.published.as_deref()] data-cat=(self.category) data-layout=(layout) {
                div class=(cfg.media) {
                    img src=(self.image) alt=(self.image_alt) class="absolute inset-0 w-full h-full object-cover" loading="lazy" decoding="async";
                    @if cfg.with_gradient {
                        div class="absolute inset-0 bg-gradient-to-t from-black/50 via-black/5 to-transparent" {}
                    }
                }
                div class=(cfg.content) {
                    div class="text-xs text-red-600 font-semibold" { (self.category_label) }
                    h3 class="title mt-2 text-xl md:text-2xl font-semibold" { (self.title) }
                    @if let Some(excerpt) = &self.excerpt {
                        p class="card-excerpt mt-3 text-sm text-neutral-600 dark:text-neutral-300 line-clamp-2" { (excerpt) }
                    }
                    div class="card-date mt-3 text-xs text-neutral-500" { (self.date_label) }
                }
            }
        }
    }

    fn render_overlay_hero(&self) -> Markup {
        let class = self.classes("group block md:col-span-2");
        html! {
            a class=(class) href=(self.href) data-published=[self.published.as_deref()] data-cat=(self.category) {
                div class="rounded-3xl overflow-hidden" {
                    img class="w-full h-[320px] md:h-[420px] object-cover group-hover:scale-[1.03] transition-transform duration-700" src=(self.image) alt=(self.image_alt) loading="lazy" decoding="async";
                }
                div class="mt-4 text-red-600 text-xs font-semibold" { (self.category_label) }
                h3 class="mt-1 text-3xl md:text-4xl font-serif font-bold leading-snug group-hover:text-red-600" { (self.title) }
                @if let Some(excerpt) = &self.excerpt {
                    p class="mt-3 text-neutral-600 dark:text-neutral-300" { (excerpt) }
                }
                div class="card-date mt-3 text-xs text-neutral-500" { (self.date_label) }
            }
        }
    }

    fn render_overlay_card(&self) -> Markup {
        let class = self.classes(
            "group block rounded-2xl border border-neutral-200 dark:border-neutral-800 bg-white/80 dark:bg-neutral-900/70 p-4 md:p-5 hover:border-red-200/60 dark:hover:border-red-700/40 transition-colors",
        );
        html! {
            a class=(class) href=(self.href) data-published=[self.published.as_deref()] data-cat=(self.category) {
                div class="overflow-hidden rounded-xl" {
                    img class="w-full h-40 md:h-44 object-cover group-hover:scale-[1.03] transition-transform duration-500" src=(self.image) alt=(self.image_alt) loading="lazy" decoding="async";
                }
                div class="mt-3 text-red-600 text-xs font-semibold" { (self.category_label) }
                h4 class="mt-2 font-serif text-xl font-semibold leading-snug group-hover:text-red-600" { (self.title) }
                @if let Some(excerpt) = &self.excerpt {
                    p class="mt-2 text-sm text-neutral-600 dark:text-neutral-300 line-clamp-3" { (excerpt) }
                }
                div class="card-date mt-3 text-xs text-neutral-500" { (self.date_label) }
            }
        }
    }
}

/// Card for the featured grid.
pub fn featured_card(post: &FeedPost, format_date: &DateFormatter) -> Card {
    Card::from_post(CardKind::Featured, post, format_date)
}

/// Editorial grid card; presentation follows the post's layout key.
pub fn grid_card(post: &FeedPost, format_date: &DateFormatter) -> Card {
    let mut card = Card::from_post(CardKind::Grid(post.layout()), post, format_date);
    card.layout_key = Some(
        post.post
            .layout
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or(Layout::Standard.key())
            .to_string(),
    );
    card
}

/// Large lead card at the top of the overlay.
pub fn overlay_hero(post: &FeedPost, format_date: &DateFormatter) -> Card {
    Card::from_post(CardKind::OverlayHero, post, format_date)
}

/// Compact card in the overlay list.
pub fn overlay_card(post: &FeedPost, format_date: &DateFormatter) -> Card {
    Card::from_post(CardKind::Overlay, post, format_date)
}

/// Render a list of cards back to back.
pub fn render_cards(cards: &[Card]) -> Markup {
    html! {
        @for card in cards {
            (card.render())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::feed_post;

    fn formatter() -> DateFormatter {
        DateFormatter::long("en_US")
    }

    #[test]
    fn featured_card_carries_data_attributes() {
        let post = feed_post("alpha", "2024-01-01", true);
        let html = featured_card(&post, &formatter()).render().into_string();
        assert!(html.contains(r#"href="/posts/alpha.html""#));
        assert!(html.contains(r#"data-published="2024-01-01""#));
        assert!(html.contains(r#"data-cat="essays""#));
        assert!(html.contains("1 January 2024"));
    }

    #[test]
    fn grid_card_uses_layout_config() {
        let mut post = feed_post("alpha", "2024-01-01", false);
        post.post.layout = Some("feature".into());
        let html = grid_card(&post, &formatter()).render().into_string();
        assert!(html.contains("md:col-span-4"));
        assert!(html.contains("bg-gradient-to-t"));
        assert!(html.contains("shadow-soft"));
        assert!(html.contains(r#"data-layout="feature""#));
    }

    #[test]
    fn grid_card_tall_has_no_shadow() {
        let mut post = feed_post("alpha", "2024-01-01", false);
        post.post.layout = Some("tall".into());
        let card = grid_card(&post, &formatter());
        assert_eq!(card.kind, CardKind::Grid(Layout::Tall));
        let html = card.render().into_string();
        assert!(html.contains("md:col-span-2"));
        assert!(!html.contains("shadow-soft"));
    }

    #[test]
    fn grid_card_unknown_layout_renders_standard_but_keeps_key() {
        let mut post = feed_post("alpha", "2024-01-01", false);
        post.post.layout = Some("panorama".into());
        let card = grid_card(&post, &formatter());
        assert_eq!(card.kind, CardKind::Grid(Layout::Standard));
        let html = card.render().into_string();
        assert!(html.contains("md:col-span-3"));
        assert!(html.contains(r#"data-layout="panorama""#));
    }

    #[test]
    fn grid_card_missing_layout_is_standard() {
        let post = feed_post("alpha", "2024-01-01", false);
        let html = grid_card(&post, &formatter()).render().into_string();
        assert!(html.contains(r#"data-layout="standard""#));
    }

    #[test]
    fn grid_card_blank_layout_is_standard() {
        for blank in ["", "  "] {
            let mut post = feed_post("alpha", "2024-01-01", false);
            post.post.layout = Some(blank.into());
            let card = grid_card(&post, &formatter());
            assert_eq!(card.layout_key.as_deref(), Some("standard"));
            assert!(card.render().into_string().contains(r#"data-layout="standard""#));
        }
    }

    #[test]
    fn empty_excerpt_renders_no_excerpt_block() {
        let mut post = feed_post("alpha", "2024-01-01", false);
        post.post.excerpt = "  ".into();
        let card = featured_card(&post, &formatter());
        assert!(card.excerpt.is_none());
        assert!(!card.render().into_string().contains("card-excerpt"));
    }

    #[test]
    fn unparseable_date_renders_empty_label() {
        let mut post = feed_post("alpha", "2024-01-01", false);
        post.post.date = "someday".into();
        let card = overlay_card(&post, &formatter());
        assert_eq!(card.date_label, "");
    }

    #[test]
    fn text_is_escaped() {
        let mut post = feed_post("alpha", "2024-01-01", false);
        post.post.title = "<script>x</script>".into();
        let html = overlay_hero(&post, &formatter()).render().into_string();
        assert!(!html.contains("<script>x"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn hidden_card_gets_hidden_class() {
        let post = feed_post("alpha", "2024-01-01", false);
        let mut card = grid_card(&post, &formatter());
        card.hidden = true;
        assert!(card.render().into_string().contains(" hidden\""));
    }

    #[test]
    fn text_content_covers_visible_text() {
        let post = feed_post("alpha", "2024-01-01", false);
        let text = overlay_card(&post, &formatter()).text_content();
        assert!(text.contains("Title alpha"));
        assert!(text.contains("Excerpt alpha"));
        assert!(text.contains("Essays"));
    }
}
