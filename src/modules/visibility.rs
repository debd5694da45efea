// Section visibility toggles - pure logic.

use crate::modules::order::OrderController;
use crate::modules::sections::{LayoutSurface, SectionId, SectionRegistry};
use crate::store::KeyValueStore;

/// A stored visibility flag hides the section only when it reads "false".
pub fn parse_visible(raw: Option<&str>) -> bool {
    raw != Some("false")
}

pub struct VisibilityController<'a> {
    registry: &'a mut SectionRegistry,
    store: &'a dyn KeyValueStore,
    surface: &'a mut dyn LayoutSurface,
}

impl<'a> VisibilityController<'a> {
    pub fn new(
        registry: &'a mut SectionRegistry,
        store: &'a dyn KeyValueStore,
        surface: &'a mut dyn LayoutSurface,
    ) -> Self {
        Self {
            registry,
            store,
            surface,
        }
    }

    fn order(&mut self) -> OrderController<'_> {
        OrderController::new(self.registry, self.store, self.surface)
    }

    /// Loads every section's stored visibility and mirrors it onto the
    /// surface. Sections without an anchor are marked and skipped; the rest
    /// are unaffected. Does not normalize: stored orders must be restored
    /// first.
    pub fn initialize(&mut self) {
        for section in self.registry.iter_mut() {
            let id = section.id();
            if !self.surface.has_anchor(id) {
                log::warn!("[Visibility] No anchor for '{}', skipping", id);
                section.anchored = false;
                continue;
            }
            section.anchored = true;

            let visible = parse_visible(self.store.get(&id.visible_key()).as_deref());
            section.visible = visible;

            self.surface.set_toggle(id, visible);
            self.surface.set_display(id, visible);
            self.surface.set_hidden_marker(id, !visible);
        }
    }

    /// Shows or hides a section.
    ///
    /// The surface and the stored flag are always rewritten. Callbacks fire
    /// only on a real transition: `on_show` when it becomes visible, `on_hide`
    /// when it becomes hidden. A newly shown section is placed after the
    /// other visible ones. Returns false when the section was skipped.
    pub fn set_visible(&mut self, id: SectionId, visible: bool) -> bool {
        let Some(was_visible) = self
            .registry
            .get(id)
            .filter(|s| s.is_anchored())
            .map(|s| s.is_visible())
        else {
            log::warn!("[Visibility] '{}' is not on the page, skipping", id);
            return false;
        };

        self.surface.set_display(id, visible);
        self.surface.set_hidden_marker(id, !visible);
        self.surface.set_toggle(id, visible);

        self.store
            .set(&id.visible_key(), if visible { "true" } else { "false" });

        if let Some(section) = self.registry.get_mut(id) {
            section.visible = visible;
        }

        if was_visible != visible {
            log::info!(
                "[Visibility] '{}' {}",
                id,
                if visible { "shown" } else { "hidden" }
            );
            let last = self.registry.visible_count() as u32;
            if let Some(section) = self.registry.get_mut(id) {
                if visible {
                    section.order = last;
                    if let Some(on_show) = section.on_show.as_mut() {
                        on_show();
                    }
                } else if let Some(on_hide) = section.on_hide.as_mut() {
                    on_hide();
                }
            }
        }

        self.order().normalize();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::sections::SectionId::*;
    use crate::modules::sections::{LayoutSnapshot, Section};
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counters {
        hides: Arc<AtomicUsize>,
        shows: Arc<AtomicUsize>,
    }

    fn registry_with_counters(id: SectionId) -> (SectionRegistry, Counters) {
        let hides = Arc::new(AtomicUsize::new(0));
        let shows = Arc::new(AtomicUsize::new(0));
        let (h, s) = (hides.clone(), shows.clone());
        let sections = SectionId::ALL
            .into_iter()
            .map(|section_id| {
                let section = Section::new(section_id);
                if section_id == id {
                    let (h, s) = (h.clone(), s.clone());
                    section
                        .on_hide(move || {
                            h.fetch_add(1, Ordering::SeqCst);
                        })
                        .on_show(move || {
                            s.fetch_add(1, Ordering::SeqCst);
                        })
                } else {
                    section
                }
            })
            .collect();
        (SectionRegistry::new(sections), Counters { hides, shows })
    }

    #[test]
    fn test_parse_visible() {
        assert!(parse_visible(None));
        assert!(parse_visible(Some("true")));
        assert!(parse_visible(Some("yes")));
        assert!(!parse_visible(Some("false")));
    }

    #[test]
    fn test_hide_then_show_fires_each_callback_once() {
        let (mut registry, counters) = registry_with_counters(Bookmarks);
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut visibility = VisibilityController::new(&mut registry, &store, &mut surface);

        assert!(visibility.set_visible(Bookmarks, false));
        assert_eq!(counters.hides.load(Ordering::SeqCst), 1);
        assert_eq!(counters.shows.load(Ordering::SeqCst), 0);

        assert!(visibility.set_visible(Bookmarks, true));
        assert_eq!(counters.hides.load(Ordering::SeqCst), 1);
        assert_eq!(counters.shows.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noop_toggle_fires_nothing_but_rewrites_state() {
        let (mut registry, counters) = registry_with_counters(History);
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut visibility = VisibilityController::new(&mut registry, &store, &mut surface);

        assert!(visibility.set_visible(History, true));
        assert_eq!(counters.hides.load(Ordering::SeqCst), 0);
        assert_eq!(counters.shows.load(Ordering::SeqCst), 0);
        assert_eq!(store.get("history-visible").as_deref(), Some("true"));
        assert_eq!(registry.get(History).unwrap().order(), 5);

        let view = surface.view(History).unwrap();
        assert!(view.displayed);
        assert!(!view.hidden_class);
        assert!(view.toggle_checked);
    }

    #[test]
    fn test_hide_renormalizes_and_persists() {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut visibility = VisibilityController::new(&mut registry, &store, &mut surface);

        visibility.set_visible(Bookmarks, false);

        assert_eq!(
            registry.visible_orders(),
            vec![(Weather, 1), (Search, 2), (Apps, 3), (History, 4)]
        );
        assert_eq!(store.get("bookmarks-visible").as_deref(), Some("false"));
        assert!(surface.view(Bookmarks).unwrap().hidden_class);
        assert!(!surface.view(Bookmarks).unwrap().displayed);
    }

    #[test]
    fn test_reshown_section_goes_last() {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut visibility = VisibilityController::new(&mut registry, &store, &mut surface);

        visibility.set_visible(Bookmarks, false);
        visibility.set_visible(Bookmarks, true);

        assert_eq!(
            registry.visible_orders(),
            vec![(Weather, 1), (Search, 2), (Apps, 3), (History, 4), (Bookmarks, 5)]
        );
    }

    #[test]
    fn test_all_hidden_then_one_shown() {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut visibility = VisibilityController::new(&mut registry, &store, &mut surface);

        for id in SectionId::ALL {
            visibility.set_visible(id, false);
        }
        visibility.set_visible(Apps, true);

        assert_eq!(registry.visible_orders(), vec![(Apps, 1)]);
        assert_eq!(store.get("apps-order").as_deref(), Some("1"));
    }

    #[test]
    fn test_initialize_reads_storage_and_skips_missing_anchor() {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        store.set("weather-visible", "false");
        store.set("apps-visible", "true");
        let mut surface = LayoutSnapshot::without_anchors(&[Search]);
        let mut visibility = VisibilityController::new(&mut registry, &store, &mut surface);

        visibility.initialize();
        assert!(!visibility.set_visible(Search, false));

        assert!(!registry.get(Weather).unwrap().is_visible());
        assert!(registry.get(Apps).unwrap().is_visible());
        assert!(!registry.get(Search).unwrap().is_anchored());
        assert_eq!(store.get("search-visible"), None);

        assert!(!surface.view(Weather).unwrap().toggle_checked);
        assert!(surface.view(History).unwrap().toggle_checked);
        assert!(surface.view(Search).is_none());
    }

    #[test]
    fn test_unregistered_section_is_skipped() {
        let mut registry = SectionRegistry::new(vec![Section::new(Weather), Section::new(Apps)]);
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut visibility = VisibilityController::new(&mut registry, &store, &mut surface);

        assert!(!visibility.set_visible(History, false));
        assert!(store.is_empty());
        assert_eq!(surface.pending_mutations(), 0);
    }
}
