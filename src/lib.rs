// tabdeck library entry point.
// The layout core builds without Tauri; the webview shell sits behind the
// `desktop` feature.

pub mod error;
pub mod store;
pub mod settings;
pub mod history;

// Layout coordinator and shared state
pub mod dashboard;
pub mod state;

// Pure logic modules (no Tauri imports)
pub mod modules;

#[cfg(feature = "desktop")]
pub mod commands;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;
    use tauri::{Emitter, Manager};

    use crate::state::{AppState, Notifier};

    tauri::Builder::default()
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }

            let data_dir = app.path().app_data_dir()?;
            let handle = app.handle().clone();
            let notify: Notifier = Arc::new(move |event: &'static str| {
                if let Err(e) = handle.emit(event, ()) {
                    log::warn!("[Setup] Failed to emit {}: {}", event, e);
                }
            });

            log::info!("[Setup] Data dir: {:?}", data_dir);
            app.manage(AppState::open(&data_dir, notify));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_layout,
            commands::set_section_visible,
            commands::set_section_order,
            commands::report_section_class,
            commands::resolve_icons,
            commands::get_settings,
            commands::update_settings,
            commands::get_appearance,
            commands::get_search_providers,
            commands::add_search_provider,
            commands::remove_search_provider,
            commands::cycle_search_provider,
            commands::search_url,
            commands::get_apps,
            commands::add_app,
            commands::remove_app,
            commands::get_feed,
            commands::add_bookmark,
            commands::record_visit,
            commands::get_cached_weather,
            commands::cache_weather,
            commands::set_weather_display_mode
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
