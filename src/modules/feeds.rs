// Bookmark and history tiles.
//
// A feed asks its source for the most recent links and turns them into
// tiles. Sources answer with whatever they have; an unavailable source is
// simply an empty list.

use serde::{Deserialize, Serialize};

use crate::modules::icons::{is_internal_url, resolve, DEFAULT_ICON};
use crate::store::KeyValueStore;

const BOOKMARKS_KEY: &str = "bookmarks";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkItem {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl LinkItem {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            title: Some(title.to_string()).filter(|t| !t.is_empty()),
        }
    }
}

pub trait LinkSource {
    /// Most recent first, at most `max` items.
    fn recent(&self, max: usize) -> Vec<LinkItem>;
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub url: String,
    pub label: String,
    /// Icon candidates, tried in order by the webview.
    pub icons: Vec<String>,
    /// Browser-internal page; opened through the tabs API, not a link.
    pub internal: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "state", content = "tiles")]
pub enum FeedView {
    Hidden,
    Tiles(Vec<Tile>),
}

fn label_for(url: &str, title: Option<&str>) -> String {
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    match url.split('/').nth(2).filter(|host| !host.is_empty()) {
        Some(host) => host.to_string(),
        None => url.to_string(),
    }
}

/// Tiles for a feed section. A hidden section or a count of 0 hides the
/// feed; items without a URL are dropped.
pub fn build_feed(section_visible: bool, count: u32, source: &dyn LinkSource) -> FeedView {
    if !section_visible || count == 0 {
        return FeedView::Hidden;
    }

    let max = count as usize;
    let tiles = source
        .recent(max)
        .into_iter()
        .take(max)
        .filter_map(|item| {
            let url = item.url.filter(|u| !u.is_empty())?;
            let internal = is_internal_url(&url);
            let icons = if internal {
                vec![DEFAULT_ICON.to_string()]
            } else {
                resolve(&url).unwrap_or_else(|| vec![DEFAULT_ICON.to_string()])
            };
            Some(Tile {
                label: label_for(&url, item.title.as_deref()),
                url,
                icons,
                internal,
            })
        })
        .collect();

    FeedView::Tiles(tiles)
}

/// Bookmarks kept in the settings store, newest first.
#[derive(Clone)]
pub struct StoredBookmarks<S> {
    store: S,
}

impl<S: KeyValueStore> StoredBookmarks<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self) -> Vec<LinkItem> {
        match self.store.get(BOOKMARKS_KEY) {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("[Feeds] Failed to parse bookmarks: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    /// Adds or refreshes a bookmark at the front of the list.
    pub fn add(&self, url: &str, title: &str) {
        let mut bookmarks = self.load();
        bookmarks.retain(|b| b.url.as_deref() != Some(url));
        bookmarks.insert(0, LinkItem::new(url, title));
        match serde_json::to_string(&bookmarks) {
            Ok(json) => self.store.set(BOOKMARKS_KEY, &json),
            Err(e) => log::error!("[Feeds] Failed to serialize bookmarks: {}", e),
        }
    }
}

impl<S: KeyValueStore> LinkSource for StoredBookmarks<S> {
    fn recent(&self, max: usize) -> Vec<LinkItem> {
        let mut bookmarks = self.load();
        bookmarks.truncate(max);
        bookmarks
    }
}
