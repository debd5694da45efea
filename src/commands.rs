// Tauri commands. Thin wrappers over AppState; errors cross the boundary
// as strings.

use tauri::{AppHandle, Emitter, State};

use crate::modules::apps::{self, AppShortcut};
use crate::modules::feeds::FeedView;
use crate::modules::icons::{is_internal_url, resolve, DEFAULT_ICON};
use crate::modules::search::SearchProvider;
use crate::modules::sections::SectionId;
use crate::modules::weather::{self, DisplayMode, WeatherReport};
use crate::settings::Settings;
use crate::state::{
    AppState, AppearancePayload, LayoutPayload, OrderPayload, WeatherPayload, LAYOUT_CHANGED,
};

fn parse_section(raw: &str) -> Result<SectionId, String> {
    raw.parse::<SectionId>().map_err(|e| e.to_string())
}

fn emit_layout(app: &AppHandle, layout: &LayoutPayload) {
    if let Err(e) = app.emit(LAYOUT_CHANGED, layout) {
        log::warn!("[Commands] Failed to emit {}: {}", LAYOUT_CHANGED, e);
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersPayload {
    providers: Vec<SearchProvider>,
    current: usize,
}

// --- Layout ---

#[tauri::command]
pub fn get_layout(state: State<'_, AppState>) -> LayoutPayload {
    state.layout()
}

#[tauri::command]
pub fn set_section_visible(
    app: AppHandle,
    state: State<'_, AppState>,
    section: String,
    visible: bool,
) -> Result<LayoutPayload, String> {
    let id = parse_section(&section)?;
    let layout = state.set_visible(id, visible);
    emit_layout(&app, &layout);
    Ok(layout)
}

#[tauri::command]
pub fn set_section_order(
    app: AppHandle,
    state: State<'_, AppState>,
    section: String,
    value: String,
) -> Result<OrderPayload, String> {
    let id = parse_section(&section)?;
    let payload = state.set_order(id, &value);
    emit_layout(&app, &payload.layout);
    Ok(payload)
}

#[tauri::command]
pub fn report_section_class(
    app: AppHandle,
    state: State<'_, AppState>,
    section: String,
    hidden: bool,
) -> Result<LayoutPayload, String> {
    let id = parse_section(&section)?;
    let layout = state.report_class(id, hidden);
    emit_layout(&app, &layout);
    Ok(layout)
}

#[tauri::command]
pub fn resolve_icons(url: String) -> Vec<String> {
    if is_internal_url(&url) {
        return vec![DEFAULT_ICON.to_string()];
    }
    resolve(&url).unwrap_or_else(|| vec![DEFAULT_ICON.to_string()])
}

// --- Settings ---

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Settings {
    state.settings()
}

#[tauri::command]
pub fn update_settings(state: State<'_, AppState>, settings: Settings) -> Settings {
    settings.save(&state.store);
    log::info!("[Commands] Settings updated");
    state.settings()
}

#[tauri::command]
pub fn get_appearance(state: State<'_, AppState>, system_prefers_dark: bool) -> AppearancePayload {
    state.appearance(system_prefers_dark)
}

// --- Search ---

#[tauri::command]
pub fn get_search_providers(state: State<'_, AppState>) -> ProvidersPayload {
    let search = state.search();
    ProvidersPayload {
        providers: search.providers().to_vec(),
        current: search.current_index(),
    }
}

#[tauri::command]
pub fn add_search_provider(
    state: State<'_, AppState>,
    name: String,
    url: String,
    icon: Option<String>,
) -> Result<SearchProvider, String> {
    let mut search = state.search();
    search
        .add(&state.store, &name, &url, icon.as_deref().unwrap_or_default())
        .cloned()
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn remove_search_provider(
    state: State<'_, AppState>,
    index: usize,
) -> Result<SearchProvider, String> {
    state
        .search()
        .remove(&state.store, index)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn cycle_search_provider(state: State<'_, AppState>) -> SearchProvider {
    state.search().cycle(&state.store).clone()
}

#[tauri::command]
pub fn search_url(state: State<'_, AppState>, query: String) -> String {
    state.search().search_url(&query)
}

// --- Apps ---

#[tauri::command]
pub fn get_apps(state: State<'_, AppState>) -> Vec<AppShortcut> {
    apps::load_apps(&state.store)
}

#[tauri::command]
pub fn add_app(
    state: State<'_, AppState>,
    name: String,
    url: String,
    icon: Option<String>,
) -> Result<AppShortcut, String> {
    apps::add_app(&state.store, &name, &url, icon.as_deref().unwrap_or_default())
        .ok_or_else(|| "an app URL is required".to_string())
}

#[tauri::command]
pub fn remove_app(state: State<'_, AppState>, index: usize) -> Result<AppShortcut, String> {
    apps::remove_app(&state.store, index).ok_or_else(|| format!("no app at index {}", index))
}

// --- Feeds ---

#[tauri::command]
pub fn get_feed(state: State<'_, AppState>, section: String) -> Result<FeedView, String> {
    let id = parse_section(&section)?;
    state
        .feed(id)
        .ok_or_else(|| format!("section '{}' has no feed", id))
}

#[tauri::command]
pub fn add_bookmark(state: State<'_, AppState>, url: String, title: Option<String>) {
    state.bookmarks.add(&url, title.as_deref().unwrap_or_default());
}

#[tauri::command]
pub fn record_visit(state: State<'_, AppState>, url: String, title: Option<String>) {
    state.history.add_visit(&url, title.as_deref());
}

// --- Weather ---

#[tauri::command]
pub fn get_cached_weather(state: State<'_, AppState>) -> WeatherPayload {
    state.weather()
}

#[tauri::command]
pub fn cache_weather(state: State<'_, AppState>, report: WeatherReport) -> WeatherPayload {
    weather::cache_report(&state.store, &report);
    state.weather()
}

#[tauri::command]
pub fn set_weather_display_mode(state: State<'_, AppState>, mode: DisplayMode) -> WeatherPayload {
    state.set_weather_mode(mode)
}
