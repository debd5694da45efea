// Quick-launch app shortcuts.

use serde::{Deserialize, Serialize};

use crate::modules::icons::{domain_from_url, favicon_url};
use crate::modules::search::format_provider_name;
use crate::store::KeyValueStore;

const APPS_KEY: &str = "apps";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppShortcut {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub icon: Option<String>,
}

pub fn default_apps() -> Vec<AppShortcut> {
    vec![
        AppShortcut {
            name: "Gmail".to_string(),
            url: "https://mail.google.com".to_string(),
            icon: None,
        },
        AppShortcut {
            name: "YouTube".to_string(),
            url: "https://youtube.com".to_string(),
            icon: None,
        },
    ]
}

pub fn load_apps(store: &dyn KeyValueStore) -> Vec<AppShortcut> {
    match store.get(APPS_KEY) {
        Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("[Apps] Failed to parse saved apps: {}, using defaults", e);
            default_apps()
        }),
        None => default_apps(),
    }
}

fn save_apps(store: &dyn KeyValueStore, apps: &[AppShortcut]) {
    match serde_json::to_string(apps) {
        Ok(json) => store.set(APPS_KEY, &json),
        Err(e) => log::error!("[Apps] Failed to serialize apps: {}", e),
    }
}

/// Appends a shortcut. Blank name and icon are derived from the URL; a blank
/// URL adds nothing.
pub fn add_app(
    store: &dyn KeyValueStore,
    name: &str,
    url: &str,
    icon: &str,
) -> Option<AppShortcut> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let domain = domain_from_url(url);
    let name = match name.trim() {
        "" => domain
            .as_deref()
            .map(format_provider_name)
            .unwrap_or_else(|| url.to_string()),
        name => name.to_string(),
    };
    let icon = match icon.trim() {
        "" => domain.as_deref().and_then(favicon_url),
        icon => Some(icon.to_string()),
    };

    let app = AppShortcut {
        name,
        url: url.to_string(),
        icon,
    };
    let mut apps = load_apps(store);
    apps.push(app.clone());
    save_apps(store, &apps);
    log::info!("[Apps] Added '{}'", app.name);
    Some(app)
}

pub fn remove_app(store: &dyn KeyValueStore, index: usize) -> Option<AppShortcut> {
    let mut apps = load_apps(store);
    if index >= apps.len() {
        return None;
    }
    let removed = apps.remove(index);
    save_apps(store, &apps);
    log::info!("[Apps] Removed '{}'", removed.name);
    Some(removed)
}
