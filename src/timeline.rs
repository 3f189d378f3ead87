//! Private micro-blog timeline.
//!
//! A static list of short posts, sorted newest first once at construction and
//! shown through three tabs:
//!
//! | Mode | Shows |
//! |------|-------|
//! | `all` | every post, five at a time, appended as the sentinel nears the viewport |
//! | `media` | posts with images, all at once |
//! | `about` | the static about pane; the list is hidden |
//!
//! Switching tabs is a full reset of the list. Paging only ever appends; once
//! the list is exhausted the sentinel is removed and stays removed until the
//! next switch to `all`.
//!
//! The timeline stays dormant until unlocked: [`Timeline::boot`] checks the
//! storage flag and [`Timeline::on_unlocked`] handles the unlock event. Either
//! way initialization runs at most once.

use crate::config::TimelineConfig;
use crate::dates::{DateFormatter, DateStyle, timestamp_millis};
use crate::document::Document;
use maud::{Markup, PreEscaped, html};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

use crate::types::PrivatePost;

pub const TIMELINE: &str = "timeline";
pub const SENTINEL: &str = "sentinel";
pub const LOADER: &str = "loader";
pub const ABOUT_PANE: &str = "aboutPane";
pub const TABS: &str = "tabs";
pub const POST_COUNT: &str = "postCount";
pub const LAST_UPDATE: &str = "lastUpdate";

#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read the private post list from a JSON array.
pub fn load_posts(path: &Path) -> Result<Vec<PrivatePost>, TimelineError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Read-only key/value storage (the browser's local storage).
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
}

impl Storage for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    Media,
    About,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::All, Mode::Media, Mode::About];

    pub fn key(self) -> &'static str {
        match self {
            Mode::All => "all",
            Mode::Media => "media",
            Mode::About => "about",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::All => "Посты",
            Mode::Media => "Медиа",
            Mode::About => "О себе",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Mode::ALL.into_iter().find(|m| m.key() == key)
    }
}

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("static regex"));
static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)#([\p{L}0-9_]+)").expect("static regex"));
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)@([A-Za-z0-9_]+)").expect("static regex"));

/// Replace `(lead)(token)` matches that are followed by whitespace or the end
/// of the text.
fn link_tokens(text: &str, re: &Regex, render: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let (Some(whole), Some(lead), Some(token)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let at_boundary = text[whole.end()..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace);
        if !at_boundary {
            continue;
        }
        out.push_str(&text[last..whole.start()]);
        out.push_str(lead.as_str());
        out.push_str(&render(token.as_str()));
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Turn URLs, `#tags` and `@mentions` in already-escaped text into links.
pub fn autolink(escaped: &str) -> String {
    let with_urls = URL.replace_all(escaped, |caps: &regex::Captures<'_>| {
        format!(
            r#"<a href="{0}" target="_blank" rel="noopener" class="underline decoration-red-500/60 underline-offset-2">{0}</a>"#,
            &caps[0]
        )
    });
    let with_tags = link_tokens(&with_urls, &HASHTAG, |tag| {
        format!(r##"<a href="#" class="text-red-600">#{tag}</a>"##)
    });
    link_tokens(&with_tags, &MENTION, |name| {
        format!(r##"<a href="#" class="text-red-600">@{name}</a>"##)
    })
}

/// Escaped, autolinked post text with line breaks.
pub fn post_text_html(text: &str) -> String {
    let escaped = html! { (text) }.into_string();
    autolink(&escaped).replace('\n', "<br>")
}

pub fn image_grid(images: &[String]) -> Markup {
    html! {
        @match images {
            [] => {}
            [single] => {
                img class="mt-3 rounded-2xl border border-neutral-200 dark:border-neutral-800" src=(single) alt="" loading="lazy" decoding="async";
            }
            _ => {
                @let three = images.len() == 3;
                div class="mt-3 grid grid-cols-2 gap-3" {
                    @for (i, src) in images.iter().enumerate() {
                        @let span = if three && i == 2 { " col-span-2" } else { "" };
                        img class={ "w-full h-auto rounded-2xl border border-neutral-200 dark:border-neutral-800" (span) } src=(src) alt="" loading="lazy" decoding="async";
                    }
                }
            }
        }
    }
}

/// One timeline entry.
pub fn post_html(post: &PrivatePost, author: &str, handle: &str, format_date: &DateFormatter) -> Markup {
    html! {
        article class="post rounded-3xl border border-neutral-200 dark:border-neutral-800 bg-white/70 dark:bg-neutral-900/70 shadow-soft p-5 md:p-6" data-id=(post.id) {
            div class="flex flex-col" {
                div class="flex items-center gap-2 text-[12px] text-neutral-500" {
                    span class="font-semibold text-neutral-800 dark:text-neutral-200" { (author) }
                    span { (handle) }
                    span { "·" }
                    time datetime=(post.date) { (format_date.format(&post.date)) }
                }
                div class="mt-2 text-[15px] md:text-[16px] leading-7 text-neutral-800 dark:text-neutral-200 whitespace-pre-wrap" {
                    (PreEscaped(post_text_html(&post.text)))
                }
                (image_grid(&post.images))
            }
        }
    }
}

fn tabs_html(active: Mode) -> Markup {
    html! {
        @for mode in Mode::ALL {
            @let class = if mode == active { "tab is-active" } else { "tab" };
            button type="button" class=(class) data-tab=(mode.key()) { (mode.label()) }
        }
    }
}

/// The timeline page controller.
#[derive(Debug)]
pub struct Timeline {
    /// Newest first.
    sorted: Vec<PrivatePost>,
    /// Indices into `sorted` for the current mode.
    current: Vec<usize>,
    mode: Mode,
    loaded: usize,
    rendered: Vec<String>,
    initialized: bool,
    settings: TimelineConfig,
    post_date: DateFormatter,
    stats_date: DateFormatter,
    doc: Document,
}

impl Timeline {
    pub fn new(mut posts: Vec<PrivatePost>, settings: TimelineConfig, locale: &str, doc: Document) -> Self {
        let key = |p: &PrivatePost| timestamp_millis(&p.date).unwrap_or(i64::MIN);
        posts.sort_by(|a, b| key(b).cmp(&key(a)));
        let current = (0..posts.len()).collect();
        Self {
            sorted: posts,
            current,
            mode: Mode::All,
            loaded: 0,
            rendered: Vec::new(),
            initialized: false,
            settings,
            post_date: DateFormatter::new(locale, DateStyle::DayMonthShort),
            stats_date: DateFormatter::new(locale, DateStyle::DayMonth),
            doc,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Ids of the posts currently in the list, in page order.
    pub fn rendered_ids(&self) -> &[String] {
        &self.rendered
    }

    pub fn has_sentinel(&self) -> bool {
        self.doc.has(SENTINEL)
    }

    /// Initialize now if the storage flag says the timeline is unlocked.
    pub fn boot(&mut self, storage: &dyn Storage) -> bool {
        let unlocked = storage.get(&self.settings.unlock_key).as_deref() == Some("1");
        unlocked && self.init()
    }

    /// Unlock event handler.
    pub fn on_unlocked(&mut self) -> bool {
        self.init()
    }

    /// Render header stats and the first page. Runs once; later calls return
    /// `false`.
    pub fn init(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        if !self.doc.has(TIMELINE) {
            log::debug!("page has no timeline, skipping init");
            return false;
        }
        self.initialized = true;

        self.doc.set_text(POST_COUNT, &self.sorted.len().to_string());
        if let Some(newest) = self.sorted.first() {
            let label = self.stats_date.format(&newest.date);
            self.doc.set_text(LAST_UPDATE, &label);
        }
        self.doc.set_html(TABS, tabs_html(self.mode));
        self.render_more();
        true
    }

    /// Viewport proximity handler for the sentinel.
    ///
    /// `distance_px` is how far the sentinel is outside the viewport (zero or
    /// negative when visible). Loads the next page when it is within the root
    /// margin. Returns the number of posts appended.
    pub fn on_sentinel(&mut self, distance_px: i64) -> usize {
        if !self.initialized || !self.has_sentinel() {
            return 0;
        }
        if distance_px > self.settings.root_margin_px {
            return 0;
        }
        self.render_more()
    }

    /// Append the next page. No-op outside `all` mode or once exhausted.
    fn render_more(&mut self) -> usize {
        if self.mode != Mode::All {
            return 0;
        }
        if self.loaded >= self.current.len() {
            self.doc.remove(SENTINEL);
            return 0;
        }
        self.doc.set_hidden(LOADER, false);
        let end = (self.loaded + self.settings.page_size).min(self.current.len());
        let page: Vec<usize> = self.current[self.loaded..end].to_vec();
        let markup = html! {
            @for &i in &page {
                (post_html(&self.sorted[i], &self.settings.author, &self.settings.handle, &self.post_date))
            }
        };
        self.doc.append_html(TIMELINE, markup);
        self.rendered
            .extend(page.iter().map(|&i| self.sorted[i].id.clone()));
        self.loaded = end;
        self.doc.set_hidden(LOADER, true);
        if self.loaded >= self.current.len() && self.doc.remove(SENTINEL) {
            log::debug!("timeline exhausted after {} posts", self.loaded);
        }
        page.len()
    }

    fn render_all(&mut self) {
        let markup = html! {
            @for &i in &self.current {
                (post_html(&self.sorted[i], &self.settings.author, &self.settings.handle, &self.post_date))
            }
        };
        self.doc.set_html(TIMELINE, markup);
        self.rendered = self
            .current
            .iter()
            .map(|&i| self.sorted[i].id.clone())
            .collect();
        self.loaded = self.current.len();
    }

    /// Tab handler. Every mode switch is a full reset of the list.
    pub fn apply_mode(&mut self, mode: Mode) -> bool {
        if !self.initialized {
            return false;
        }
        self.mode = mode;
        self.doc.set_html(TABS, tabs_html(mode));
        self.doc.set_hidden(ABOUT_PANE, mode != Mode::About);
        self.doc.set_hidden(TIMELINE, mode == Mode::About);
        match mode {
            Mode::All => {
                self.current = (0..self.sorted.len()).collect();
                self.doc.set_html(TIMELINE, html! {});
                self.rendered.clear();
                self.loaded = 0;
                if !self.doc.has(SENTINEL) {
                    self.doc.add_region(SENTINEL);
                }
                self.render_more();
            }
            Mode::Media => {
                self.current = (0..self.sorted.len())
                    .filter(|&i| self.sorted[i].has_media())
                    .collect();
                self.render_all();
                self.doc.set_hidden(LOADER, true);
                self.doc.remove(SENTINEL);
            }
            Mode::About => {}
        }
        true
    }
}
