// Shared state behind the desktop commands.
// No Tauri imports: the shell hands in a notifier for section events, so
// everything here can be tested without a webview.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::dashboard::Dashboard;
use crate::history::HistoryStore;
use crate::modules::feeds::{build_feed, FeedView, StoredBookmarks};
use crate::modules::order::OrderOutcome;
use crate::modules::search::SearchProviders;
use crate::modules::sections::{LayoutSnapshot, Section, SectionId, SectionRegistry, SectionState};
use crate::modules::weather::{self, DisplayMode, WeatherReport};
use crate::settings::Settings;
use crate::store::JsonFileStore;

pub const STORE_FILE: &str = "dashboard.json";

pub const LAYOUT_CHANGED: &str = "layout-changed";
pub const REFRESH_BOOKMARKS: &str = "refresh-bookmarks";
pub const REFRESH_HISTORY: &str = "refresh-history";

/// Fire-and-forget event sink.
pub type Notifier = Arc<dyn Fn(&'static str) + Send + Sync>;

pub type DesktopDashboard = Dashboard<JsonFileStore, LayoutSnapshot>;

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPayload {
    pub sections: Vec<SectionState>,
    pub surface: LayoutSnapshot,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub outcome: OrderOutcome,
    pub layout: LayoutPayload,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPayload {
    pub mode: DisplayMode,
    pub report: Option<WeatherReport>,
    pub summary: Option<String>,
    pub temp: Option<String>,
    pub icon_url: Option<String>,
}

/// Everything the page needs to style itself.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppearancePayload {
    pub dark: bool,
    pub root_class: Option<String>,
    pub css_properties: Vec<(String, String)>,
    pub hide_headers: bool,
    pub background_image: Option<String>,
}

pub struct AppState {
    pub dashboard: Mutex<DesktopDashboard>,
    pub store: JsonFileStore,
    pub search: Mutex<SearchProviders>,
    pub history: Arc<HistoryStore>,
    pub bookmarks: StoredBookmarks<JsonFileStore>,
}

fn feed_section(id: SectionId, notify: &Notifier, event: &'static str) -> Section {
    let on_hide = notify.clone();
    let on_show = notify.clone();
    Section::new(id)
        .on_hide(move || on_hide(event))
        .on_show(move || on_show(event))
}

impl AppState {
    pub fn open(data_dir: &Path, notify: Notifier) -> Self {
        let store = JsonFileStore::open(data_dir.join(STORE_FILE));

        let mut registry = SectionRegistry::new(vec![
            Section::new(SectionId::Weather),
            feed_section(SectionId::Bookmarks, &notify, REFRESH_BOOKMARKS),
            Section::new(SectionId::Search),
            Section::new(SectionId::Apps),
            feed_section(SectionId::History, &notify, REFRESH_HISTORY),
        ]);
        let (on_hide, on_show) = weather::section_callbacks(store.clone());
        registry.set_callbacks(SectionId::Weather, Some(on_hide), Some(on_show));

        let mut dashboard = Dashboard::new(registry, store.clone(), LayoutSnapshot::new());
        dashboard.initialize();

        let history = HistoryStore::open(data_dir);
        if !history.is_empty() {
            if let Err(e) = history.compact() {
                log::warn!("[State] History compaction failed: {}", e);
            }
        }

        Self {
            dashboard: Mutex::new(dashboard),
            search: Mutex::new(SearchProviders::load(&store)),
            bookmarks: StoredBookmarks::new(store.clone()),
            history: Arc::new(history),
            store,
        }
    }

    pub fn dashboard(&self) -> MutexGuard<'_, DesktopDashboard> {
        self.dashboard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn search(&self) -> MutexGuard<'_, SearchProviders> {
        self.search.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> Settings {
        Settings::load(&self.store)
    }

    pub fn appearance(&self, system_prefers_dark: bool) -> AppearancePayload {
        let settings = self.settings();
        AppearancePayload {
            dark: settings.theme.is_dark(system_prefers_dark),
            root_class: settings.button_style.root_class(),
            css_properties: settings.css_properties(),
            hide_headers: settings.hide_headers,
            background_image: settings.background_image,
        }
    }

    pub fn layout(&self) -> LayoutPayload {
        layout_of(&self.dashboard())
    }

    pub fn set_visible(&self, id: SectionId, visible: bool) -> LayoutPayload {
        let mut dashboard = self.dashboard();
        dashboard.set_visible(id, visible);
        // The toggle's own marker writes; draining keeps the log bounded.
        dashboard.flush_mutations();
        layout_of(&dashboard)
    }

    /// `raw` is the text of the section's order input.
    pub fn set_order(&self, id: SectionId, raw: &str) -> OrderPayload {
        let mut dashboard = self.dashboard();
        let outcome = dashboard.order_input_changed(id, raw);
        OrderPayload {
            outcome,
            layout: layout_of(&dashboard),
        }
    }

    /// The webview saw a section's hidden class change outside the toggles.
    pub fn report_class(&self, id: SectionId, hidden: bool) -> LayoutPayload {
        let mut dashboard = self.dashboard();
        dashboard.record_class_change(id, hidden);
        dashboard.flush_mutations();
        layout_of(&dashboard)
    }

    /// Tiles for the bookmarks or history section, `None` for any other.
    pub fn feed(&self, id: SectionId) -> Option<FeedView> {
        let visible = self
            .dashboard()
            .registry()
            .get(id)
            .is_some_and(|s| s.is_anchored() && s.is_visible());
        let settings = self.settings();

        match id {
            SectionId::Bookmarks => Some(build_feed(visible, settings.bookmarks_count, &self.bookmarks)),
            SectionId::History => Some(build_feed(visible, settings.history_count, self.history.as_ref())),
            _ => None,
        }
    }

    /// The weather display select: `text`, `icon` or `hidden`.
    pub fn set_weather_mode(&self, mode: DisplayMode) -> WeatherPayload {
        mode.save(&self.store);
        log::info!("[State] Weather display mode set to {:?}", mode);
        self.weather()
    }

    pub fn weather(&self) -> WeatherPayload {
        let mode = DisplayMode::load(&self.store);
        let report = weather::cached_report(&self.store);
        WeatherPayload {
            mode,
            summary: report.as_ref().map(WeatherReport::summary),
            temp: report.as_ref().map(WeatherReport::rounded_temp),
            icon_url: report.as_ref().and_then(WeatherReport::icon_url),
            report,
        }
    }
}

fn layout_of(dashboard: &DesktopDashboard) -> LayoutPayload {
    LayoutPayload {
        sections: dashboard.states(),
        surface: dashboard.surface().clone(),
    }
}
