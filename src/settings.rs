use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::KeyValueStore;

const THEME_KEY: &str = "theme";
const BUTTON_STYLE_KEY: &str = "buttonStyle";
const BOOKMARKS_COUNT_KEY: &str = "bookmarksCount";
const HISTORY_COUNT_KEY: &str = "historyCount";
const HIDE_HEADERS_KEY: &str = "hideHeaders";
const SPACING_KEY: &str = "section-spacing";
const BOX_COLOR_KEY: &str = "customBoxColor";
const FONT_COLOR_KEY: &str = "customFontColor";
const BACKGROUND_KEY: &str = "backgroundImage";

pub const DEFAULT_BOOKMARKS_COUNT: u32 = 8;
pub const DEFAULT_HISTORY_COUNT: u32 = 16;
pub const DEFAULT_SPACING: &str = "1vh";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Auto,
    Dark,
    Light,
}

impl Theme {
    /// Auto follows the system color scheme.
    pub fn is_dark(&self, system_prefers_dark: bool) -> bool {
        match self {
            Self::Auto => system_prefers_dark,
            Self::Dark => true,
            Self::Light => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    #[default]
    Squircle,
    Square,
    Nobox,
}

impl ButtonStyle {
    /// Class put on the root element. Squircle is the stylesheet default.
    pub fn root_class(&self) -> Option<String> {
        match self {
            Self::Squircle => None,
            other => Some(format!("{}-buttons", enum_to_string(other))),
        }
    }
}

/// Appearance and feed preferences. Section visibility and order are kept
/// by the section registry, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub button_style: ButtonStyle,
    /// 0 hides the bookmarks feed.
    pub bookmarks_count: u32,
    /// 0 hides the history feed.
    pub history_count: u32,
    pub hide_headers: bool,
    pub section_spacing: String,
    pub custom_box_color: Option<String>,
    pub custom_font_color: Option<String>,
    pub background_image: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            button_style: ButtonStyle::default(),
            bookmarks_count: DEFAULT_BOOKMARKS_COUNT,
            history_count: DEFAULT_HISTORY_COUNT,
            hide_headers: false,
            section_spacing: DEFAULT_SPACING.to_string(),
            custom_box_color: None,
            custom_font_color: None,
            background_image: None,
        }
    }
}

/// Stored form of a unit enum: its serde name.
pub(crate) fn enum_to_string<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(name)) => name,
        _ => String::new(),
    }
}

/// Reads a unit enum back from its serde name.
pub(crate) fn enum_from_str<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(Value::String(raw.to_string())).ok()
}

fn read_count(store: &dyn KeyValueStore, key: &str, default: u32) -> u32 {
    match store.get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            log::warn!("[Settings] Bad {} {:?}: {}, using {}", key, raw, e, default);
            default
        }),
        None => default,
    }
}

fn read_optional(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    store.get(key).filter(|value| !value.is_empty())
}

fn write_optional(store: &dyn KeyValueStore, key: &str, value: Option<&str>) {
    match value {
        Some(value) if !value.is_empty() => store.set(key, value),
        _ => store.remove(key),
    }
}

impl Settings {
    /// Reads every preference, falling back to the default for anything
    /// missing or unreadable.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();
        Self {
            theme: store
                .get(THEME_KEY)
                .and_then(|raw| enum_from_str(&raw))
                .unwrap_or(defaults.theme),
            button_style: store
                .get(BUTTON_STYLE_KEY)
                .and_then(|raw| enum_from_str(&raw))
                .unwrap_or(defaults.button_style),
            bookmarks_count: read_count(store, BOOKMARKS_COUNT_KEY, DEFAULT_BOOKMARKS_COUNT),
            history_count: read_count(store, HISTORY_COUNT_KEY, DEFAULT_HISTORY_COUNT),
            hide_headers: store.get(HIDE_HEADERS_KEY).as_deref() == Some("true"),
            section_spacing: read_optional(store, SPACING_KEY).unwrap_or(defaults.section_spacing),
            custom_box_color: read_optional(store, BOX_COLOR_KEY),
            custom_font_color: read_optional(store, FONT_COLOR_KEY),
            background_image: read_optional(store, BACKGROUND_KEY),
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        store.set(THEME_KEY, &enum_to_string(&self.theme));
        store.set(BUTTON_STYLE_KEY, &enum_to_string(&self.button_style));
        store.set(BOOKMARKS_COUNT_KEY, &self.bookmarks_count.to_string());
        store.set(HISTORY_COUNT_KEY, &self.history_count.to_string());
        store.set(HIDE_HEADERS_KEY, if self.hide_headers { "true" } else { "false" });
        store.set(SPACING_KEY, &self.section_spacing);
        write_optional(store, BOX_COLOR_KEY, self.custom_box_color.as_deref());
        write_optional(store, FONT_COLOR_KEY, self.custom_font_color.as_deref());
        write_optional(store, BACKGROUND_KEY, self.background_image.as_deref());
    }

    /// CSS custom properties the stylesheet reads.
    pub fn css_properties(&self) -> Vec<(String, String)> {
        let mut properties = vec![("--section-spacing".to_string(), self.section_spacing.clone())];
        if let Some(color) = &self.custom_box_color {
            properties.push(("--custom-box-color".to_string(), color.clone()));
        }
        if let Some(color) = &self.custom_font_color {
            properties.push(("--custom-font-color".to_string(), color.clone()));
        }
        properties
    }
}
