// Weather section state: the cached report and how it is displayed.
// Fetching is done by the webview; this side only caches and formats.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::modules::sections::SectionCallback;
use crate::settings::{enum_from_str, enum_to_string};
use crate::store::KeyValueStore;

const CACHE_KEY: &str = "weatherCache";
const DISPLAY_MODE_KEY: &str = "weatherDisplayMode";

/// Reports older than this are dropped on read.
pub const CACHE_TTL_MS: i64 = 30 * 60 * 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MainReading {
    #[serde(default)]
    pub temp: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// The subset of an OpenWeatherMap "current weather" response we show.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeatherReport {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub main: Option<MainReading>,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

impl WeatherReport {
    fn temp(&self) -> Option<f64> {
        self.main.as_ref().and_then(|m| m.temp)
    }

    fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    /// Text view, e.g. "Oslo: 3.5°C, light snow".
    pub fn summary(&self) -> String {
        let name = self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Location");
        let temp = self
            .temp()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let description = self
            .condition()
            .and_then(|c| c.description.as_deref())
            .filter(|d| !d.is_empty())
            .unwrap_or("No data");
        format!("{}: {}°C, {}", name, temp, description)
    }

    /// Icon view label.
    pub fn rounded_temp(&self) -> String {
        format!("{}°C", self.temp().unwrap_or(0.0).round())
    }

    pub fn icon_url(&self) -> Option<String> {
        self.condition()
            .and_then(|c| c.icon.as_deref())
            .map(|icon| format!("https://openweathermap.org/img/wn/{}@2x.png", icon))
    }
}

#[derive(Serialize, Deserialize)]
struct CachedReport {
    data: WeatherReport,
    timestamp: i64,
}

pub fn cached_report_at(store: &dyn KeyValueStore, now_ms: i64) -> Option<WeatherReport> {
    let raw = store.get(CACHE_KEY)?;
    let cached: CachedReport = match serde_json::from_str(&raw) {
        Ok(cached) => cached,
        Err(e) => {
            log::warn!("[Weather] Dropping unreadable cache: {}", e);
            store.remove(CACHE_KEY);
            return None;
        }
    };

    if now_ms - cached.timestamp > CACHE_TTL_MS {
        log::debug!("[Weather] Cache expired");
        store.remove(CACHE_KEY);
        return None;
    }
    Some(cached.data)
}

pub fn cache_report_at(store: &dyn KeyValueStore, report: &WeatherReport, now_ms: i64) {
    let cached = CachedReport {
        data: report.clone(),
        timestamp: now_ms,
    };
    match serde_json::to_string(&cached) {
        Ok(json) => store.set(CACHE_KEY, &json),
        Err(e) => log::error!("[Weather] Failed to serialize cache: {}", e),
    }
}

pub fn cached_report(store: &dyn KeyValueStore) -> Option<WeatherReport> {
    cached_report_at(store, Utc::now().timestamp_millis())
}

pub fn cache_report(store: &dyn KeyValueStore, report: &WeatherReport) {
    cache_report_at(store, report, Utc::now().timestamp_millis())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Text,
    Icon,
    Hidden,
}

impl DisplayMode {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        store
            .get(DISPLAY_MODE_KEY)
            .and_then(|raw| enum_from_str(&raw))
            .unwrap_or_default()
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        store.set(DISPLAY_MODE_KEY, &enum_to_string(self));
    }
}

/// Callbacks for the weather section: hiding it parks the display mode on
/// `hidden`, showing it again brings `hidden` back to `text`.
pub fn section_callbacks<S>(store: S) -> (SectionCallback, SectionCallback)
where
    S: KeyValueStore + Clone + Send + 'static,
{
    let hide_store = store.clone();
    let on_hide: SectionCallback = Box::new(move || DisplayMode::Hidden.save(&hide_store));
    let on_show: SectionCallback = Box::new(move || {
        if DisplayMode::load(&store) == DisplayMode::Hidden {
            DisplayMode::Text.save(&store);
        }
    });
    (on_hide, on_show)
}
