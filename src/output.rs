//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Feed
//!
//! ```text
//! Feed (3 posts)
//! 001 Night trains → /posts/night-trains.html
//!     Date: 2025-09-18  Category: Essays  Featured
//! 002 Paper notes → /posts/paper-notes.html
//!     Date: 2025-08-02  Category: Notes
//!
//! Featured 1, latest 3, overlay 3 (open)
//! Categories: all, essays, notes
//! Backfilled 1 excerpt
//! ```
//!
//! ## Check
//!
//! ```text
//! Feed: 6 posts (1 dropped)
//!     Missing page: no-page
//! Catalog: 6 products
//! Private timeline: 7 posts
//! OK
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::feed::FeedOutcome;
use crate::product::Purchase;
use crate::site::{CheckReport, FeedReport, ProductReport, ShopReport, TimelineReport};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max).collect::<String>())
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn fragments_line(count: usize) -> Option<String> {
    (count > 0).then(|| format!("Wrote {}", plural(count, "fragment", "fragments")))
}

// ============================================================================
// Feed
// ============================================================================

pub fn format_feed_report(report: &FeedReport) -> Vec<String> {
    let mut lines = Vec::new();
    match report.outcome {
        FeedOutcome::Failed => {
            lines.push("Feed failed to load; static fallback left in place".to_string());
        }
        FeedOutcome::Empty => lines.push("Feed is empty".to_string()),
        FeedOutcome::Rendered => {
            lines.push(format!("Feed ({})", plural(report.posts.len(), "post", "posts")));
            for (i, post) in report.posts.iter().enumerate() {
                lines.push(format!(
                    "{} {} \u{2192} {}",
                    format_index(i + 1),
                    truncate(&post.post.title, 60),
                    post.url
                ));
                let date = post.post.date.get(..10).unwrap_or(&post.post.date);
                let mut context = format!("    Date: {date}");
                if !post.post.category_label.is_empty() {
                    context.push_str(&format!("  Category: {}", post.post.category_label));
                }
                if post.post.featured {
                    context.push_str("  Featured");
                }
                lines.push(context);
            }
            lines.push(String::new());
            let open = if report.overlay_open { " (open)" } else { "" };
            lines.push(format!(
                "Featured {}, latest {}, overlay {}{}",
                report.featured, report.latest, report.overlay, open
            ));
        }
    }
    lines.push(format!("Categories: {}", report.categories.join(", ")));
    if let Some(visible) = report.visible {
        lines.push(format!("Category filter: {visible} visible"));
    }
    if let Some(matches) = report.matches {
        lines.push(format!("Overlay search: {}", plural(matches, "match", "matches")));
    }
    if report.backfilled > 0 {
        lines.push(format!(
            "Backfilled {}",
            plural(report.backfilled, "excerpt", "excerpts")
        ));
    }
    lines.extend(fragments_line(report.fragments));
    lines
}

pub fn print_feed_report(report: &FeedReport) {
    for line in format_feed_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Shop
// ============================================================================

pub fn format_shop_report(report: &ShopReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Catalog: {}, {}",
        plural(report.products, "product", "products"),
        plural(report.categories, "category", "categories")
    )];
    lines.push(format!("Grid ({})", report.grid.len()));
    for (i, id) in report.grid.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), id));
    }
    if report.grid.is_empty() {
        lines.push("    Nothing matches; empty state shown".to_string());
    }
    lines.push(format!("Promo rotation: {}", report.rotation.join(" \u{2192} ")));
    if let Some(id) = &report.promo {
        lines.push(format!("    Showing: {id}"));
    }
    lines.extend(fragments_line(report.fragments));
    lines
}

pub fn print_shop_report(report: &ShopReport) {
    for line in format_shop_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Product page
// ============================================================================

pub fn format_product_report(report: &ProductReport) -> Vec<String> {
    let Some(id) = &report.id else {
        return vec!["Catalog is empty; nothing to show".to_string()];
    };
    let mut lines = vec![format!("{} ({})", report.title, id)];
    if !report.matched {
        lines.push("    Requested id not found; showing the first product".to_string());
    }
    if !report.related.is_empty() {
        lines.push(format!("    Related: {}", report.related.join(", ")));
    }
    match &report.purchase {
        Some(Purchase::Open(url)) => lines.push(format!("    Checkout: {url}")),
        Some(Purchase::Alert(message)) => lines.push(format!("    Checkout: {message}")),
        None => {}
    }
    lines.extend(fragments_line(report.fragments));
    lines
}

pub fn print_product_report(report: &ProductReport) {
    for line in format_product_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Private timeline
// ============================================================================

pub fn format_timeline_report(report: &TimelineReport) -> Vec<String> {
    if !report.unlocked {
        return vec![format!(
            "Timeline locked ({} hidden)",
            plural(report.total, "post", "posts")
        )];
    }
    let mut lines = vec![format!(
        "Timeline [{}]: {} of {} shown",
        report.mode.key(),
        report.rendered.len(),
        report.total
    )];
    for (i, id) in report.rendered.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), id));
    }
    if report.exhausted {
        lines.push("End of timeline".to_string());
    }
    lines.extend(fragments_line(report.fragments));
    lines
}

pub fn print_timeline_report(report: &TimelineReport) {
    for line in format_timeline_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Feed: {} ({} dropped)",
        plural(report.feed_posts, "post", "posts"),
        report.dropped
    )];
    for slug in &report.missing_pages {
        lines.push(format!("    Missing page: {slug}"));
    }
    for slug in &report.orphan_pages {
        lines.push(format!("    Not in feed: {slug}"));
    }
    for slug in &report.without_excerpt {
        lines.push(format!("    No excerpt: {slug}"));
    }
    lines.push(format!(
        "Catalog: {}",
        plural(report.products, "product", "products")
    ));
    lines.push(format!(
        "Private timeline: {}",
        plural(report.private_posts, "post", "posts")
    ));
    if report.is_ok() {
        lines.push("OK".to_string());
    } else {
        for error in &report.errors {
            lines.push(format!("Error: {error}"));
        }
    }
    lines
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::feed_post;
    use crate::timeline::Mode;

    fn feed_report() -> FeedReport {
        let mut first = feed_post("night-trains", "2025-09-18T08:00:00Z", true);
        first.post.title = "Night trains".into();
        let second = feed_post("paper-notes", "2025-08-02", false);
        FeedReport {
            outcome: FeedOutcome::Rendered,
            posts: vec![first, second],
            featured: 1,
            latest: 2,
            overlay: 2,
            overlay_open: true,
            categories: vec!["all".into(), "essays".into()],
            visible: None,
            matches: Some(1),
            backfilled: 1,
            fragments: 6,
        }
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("короткий", 40), "короткий");
        assert_eq!(truncate("абвгд", 3), "абв...");
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn feed_lists_posts_with_context() {
        let lines = format_feed_report(&feed_report());
        assert_eq!(lines[0], "Feed (2 posts)");
        assert_eq!(lines[1], "001 Night trains \u{2192} /posts/night-trains.html");
        assert_eq!(lines[2], "    Date: 2025-09-18  Category: Essays  Featured");
        assert!(lines.contains(&"Featured 1, latest 2, overlay 2 (open)".to_string()));
        assert!(lines.contains(&"Overlay search: 1 match".to_string()));
        assert!(lines.contains(&"Backfilled 1 excerpt".to_string()));
        assert_eq!(lines.last().unwrap(), "Wrote 6 fragments");
    }

    #[test]
    fn failed_feed_says_so() {
        let report = FeedReport {
            outcome: FeedOutcome::Failed,
            posts: Vec::new(),
            categories: vec!["all".into()],
            backfilled: 0,
            fragments: 0,
            ..feed_report()
        };
        let lines = format_feed_report(&report);
        assert_eq!(lines[0], "Feed failed to load; static fallback left in place");
        assert!(!lines.iter().any(|l| l.starts_with("Wrote")));
    }

    #[test]
    fn shop_grid_and_empty_state() {
        let report = ShopReport {
            products: 1,
            categories: 2,
            grid: Vec::new(),
            rotation: vec!["a".into()],
            promo: Some("a".into()),
            fragments: 0,
        };
        let lines = format_shop_report(&report);
        assert_eq!(lines[0], "Catalog: 1 product, 2 categories");
        assert!(lines.contains(&"    Showing: a".to_string()));
        assert!(lines.contains(&"    Nothing matches; empty state shown".to_string()));
    }

    #[test]
    fn product_fallback_and_alert() {
        let report = ProductReport {
            id: Some("p1".into()),
            title: "Font".into(),
            matched: false,
            related: vec!["p2".into()],
            purchase: Some(Purchase::Alert("not configured".into())),
            fragments: 0,
        };
        let lines = format_product_report(&report);
        assert_eq!(
            lines,
            [
                "Font (p1)",
                "    Requested id not found; showing the first product",
                "    Related: p2",
                "    Checkout: not configured",
            ]
        );
    }

    #[test]
    fn locked_timeline_is_one_line() {
        let report = TimelineReport {
            total: 7,
            unlocked: false,
            mode: Mode::All,
            rendered: Vec::new(),
            exhausted: false,
            fragments: 0,
        };
        assert_eq!(format_timeline_report(&report), ["Timeline locked (7 posts hidden)"]);
    }

    #[test]
    fn check_lists_problems() {
        let report = CheckReport {
            feed_posts: 6,
            dropped: 1,
            missing_pages: vec!["no-page".into()],
            products: 1,
            private_posts: 7,
            errors: vec!["shop-data.json: bad".into()],
            ..CheckReport::default()
        };
        let lines = format_check_report(&report);
        assert_eq!(lines[0], "Feed: 6 posts (1 dropped)");
        assert_eq!(lines[1], "    Missing page: no-page");
        assert_eq!(lines[2], "Catalog: 1 product");
        assert_eq!(lines.last().unwrap(), "Error: shop-data.json: bad");
    }
}
