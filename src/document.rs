//! The page model render steps write into.
//!
//! A [`Document`] is a set of named regions, one per element id the static
//! markup exposes as a mount point (`featuredGrid`, `timeline`, `promoStrip`,
//! ...). A page declares the regions it has; a render step that targets a
//! region the page does not have is a no-op and reports `false`, so a missing
//! mount point never takes the rest of the page down with it.
//!
//! Regions hold already-escaped HTML. When written out, each region becomes a
//! fragment file wrapping its content in the element it stands for.

use maud::{Markup, PreEscaped, html};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// A mount point in the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    pub html: String,
    pub hidden: bool,
    pub attrs: BTreeMap<String, String>,
}

impl Region {
    pub fn with_html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    /// The region as a standalone element.
    pub fn to_markup(&self, id: &str) -> Markup {
        let attrs = self
            .attrs
            .iter()
            .map(|(k, v)| format!(" {}=\"{}\"", k, html! { (v) }.into_string()))
            .collect::<String>();
        let class = if self.hidden { " class=\"hidden\"" } else { "" };
        html! {
            (PreEscaped(format!("<div id=\"{}\"{}{}>", html! { (id) }.into_string(), class, attrs)))
            (PreEscaped(&self.html))
            (PreEscaped("</div>"))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    regions: BTreeMap<String, Region>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document with empty regions for each id.
    pub fn with_regions<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut doc = Self::new();
        for id in ids {
            doc.add_region(id);
        }
        doc
    }

    /// Add (or return the existing) region.
    pub fn add_region(&mut self, id: &str) -> &mut Region {
        self.regions.entry(id.to_string()).or_default()
    }

    pub fn has(&self, id: &str) -> bool {
        self.regions.contains_key(id)
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn region_mut(&mut self, id: &str) -> Option<&mut Region> {
        self.regions.get_mut(id)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &Region)> {
        self.regions.iter().map(|(id, r)| (id.as_str(), r))
    }

    pub fn html(&self, id: &str) -> Option<&str> {
        self.regions.get(id).map(|r| r.html.as_str())
    }

    pub fn is_hidden(&self, id: &str) -> Option<bool> {
        self.regions.get(id).map(|r| r.hidden)
    }

    /// Replace the region's content.
    pub fn set_html(&mut self, id: &str, markup: Markup) -> bool {
        match self.regions.get_mut(id) {
            Some(region) => {
                region.html = markup.into_string();
                true
            }
            None => false,
        }
    }

    /// Append to the region's content.
    pub fn append_html(&mut self, id: &str, markup: Markup) -> bool {
        match self.regions.get_mut(id) {
            Some(region) => {
                region.html.push_str(&markup.into_string());
                true
            }
            None => false,
        }
    }

    /// Replace the region's content with escaped text.
    pub fn set_text(&mut self, id: &str, text: &str) -> bool {
        self.set_html(id, html! { (text) })
    }

    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> bool {
        match self.regions.get_mut(id) {
            Some(region) => {
                region.hidden = hidden;
                true
            }
            None => false,
        }
    }

    pub fn set_attr(&mut self, id: &str, name: &str, value: impl Into<String>) -> bool {
        match self.regions.get_mut(id) {
            Some(region) => {
                region.attrs.insert(name.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    /// Remove the region from the page. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        self.regions.remove(id).is_some()
    }

    /// Write each region to `{dir}/{id}.html`. Returns the number of files.
    pub fn write_fragments(&self, dir: &Path) -> io::Result<usize> {
        fs::create_dir_all(dir)?;
        for (id, region) in &self.regions {
            fs::write(
                dir.join(format!("{id}.html")),
                region.to_markup(id).into_string(),
            )?;
        }
        Ok(self.regions.len())
    }
}
