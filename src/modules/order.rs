// Section ordering - pure logic.
//
// Visible sections always carry the orders 1..V with no gaps or
// duplicates. Every mutation here ends in `normalize`, which re-derives that
// ranking from the in-memory orders and pushes it to every projection: the
// order style, the numeric input, the settings panel attribute, the CSS
// custom property and the persisted store.

use serde::Serialize;

use crate::modules::sections::{LayoutSurface, SectionId, SectionRegistry};
use crate::store::KeyValueStore;

/// Result of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum OrderOutcome {
    /// The requested slot was free; the section moved into it.
    Moved,
    /// Another visible section held the slot and took the old one.
    Swapped { with: SectionId },
    /// The section already held the requested slot.
    Unchanged,
    /// Hidden/unknown section or out-of-range slot. The view was re-synced
    /// and nothing moved.
    Rejected,
}

pub struct OrderController<'a> {
    registry: &'a mut SectionRegistry,
    store: &'a dyn KeyValueStore,
    surface: &'a mut dyn LayoutSurface,
}

impl<'a> OrderController<'a> {
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

    /// Re-ranks the visible sections 1..V.
    ///
    /// Sorting is stable over configuration order, so stale or default orders
    /// that tie keep the configured sequence. With nothing visible this does
    /// nothing.
    pub fn normalize(&mut self) {
        let mut ranked: Vec<(u32, usize, SectionId)> = self
            .registry
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_ranked())
            .map(|(position, s)| (s.order(), position, s.id()))
            .collect();

        if ranked.is_empty() {
            log::debug!("[Order] No visible sections, nothing to normalize");
            return;
        }

        ranked.sort();

        for (rank, (previous, _, id)) in ranked.into_iter().enumerate() {
            let order = rank as u32 + 1;
            if let Some(section) = self.registry.get_mut(id) {
                section.order = order;
            }
            if previous != order {
                log::debug!("[Order] {} {} -> {}", id, previous, order);
            }
            self.project(id, order);
        }
    }

    fn project(&mut self, id: SectionId, order: u32) {
        let value = order.to_string();
        self.surface.set_order_style(id, order);
        self.surface.set_order_input(id, order);
        self.surface.set_panel_order(id, order);
        self.surface.set_property(&id.order_property(), &value);
        self.store.set(&id.order_key(), &value);
    }

    /// Moves `id` to `requested`, swapping with whichever visible section
    /// holds that slot.
    pub fn set_order(&mut self, id: SectionId, requested: i64) -> OrderOutcome {
        let Some((current, ranked)) = self.registry.get(id).map(|s| (s.order(), s.is_ranked()))
        else {
            log::warn!("[Order] Unknown section '{}'", id);
            self.normalize();
            return OrderOutcome::Rejected;
        };

        if !ranked {
            log::warn!("[Order] '{}' is hidden, ignoring order {}", id, requested);
            self.normalize();
            return OrderOutcome::Rejected;
        }

        let visible = self.registry.visible_count() as i64;
        if requested < 1 || requested > visible {
            log::warn!(
                "[Order] Order {} for '{}' outside 1..={}, resetting view",
                requested,
                id,
                visible
            );
            self.normalize();
            return OrderOutcome::Rejected;
        }

        let requested = requested as u32;

        let outcome = match self.registry.section_at(requested) {
            Some(other) if other != id => {
                if let Some(other_section) = self.registry.get_mut(other) {
                    other_section.order = current;
                }
                OrderOutcome::Swapped { with: other }
            }
            Some(_) => OrderOutcome::Unchanged,
            None => OrderOutcome::Moved,
        };

        if let Some(section) = self.registry.get_mut(id) {
            section.order = requested;
        }

        log::info!("[Order] '{}' {} -> {} ({:?})", id, current, requested, outcome);
        self.normalize();
        outcome
    }

    /// Applies the raw text of a section's order input.
    pub fn order_input_changed(&mut self, id: SectionId, raw: &str) -> OrderOutcome {
        match parse_order_input(raw) {
            Some(requested) => self.set_order(id, requested),
            None => {
                log::warn!("[Order] Unreadable order input {:?} for '{}'", raw, id);
                self.normalize();
                OrderOutcome::Rejected
            }
        }
    }

    /// Loads persisted orders as tentative values. Call `normalize`
    /// afterwards to establish the dense ranking.
    pub fn restore_from_storage(&mut self) {
        for section in self.registry.iter_mut() {
            let key = section.id().order_key();
            let Some(raw) = self.store.get(&key) else {
                continue;
            };
            match raw.trim().parse::<u32>() {
                Ok(order) if order > 0 => section.order = order,
                _ => log::warn!("[Order] Ignoring stored {} = {:?}", key, raw),
            }
        }
    }
}

/// Reads a leading integer the way a browser `parseInt` does: surrounding
/// whitespace, an optional sign, then digits up to the first non-digit.
pub fn parse_order_input(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::sections::{LayoutSnapshot, Section};
    use crate::store::MemoryStore;
    use crate::modules::sections::SectionId::*;
    use rstest::rstest;

    fn orders(registry: &SectionRegistry) -> Vec<(SectionId, u32)> {
        registry.visible_orders()
    }

    fn hide(registry: &mut SectionRegistry, id: SectionId) {
        registry.get_mut(id).unwrap().visible = false;
    }

    #[test]
    fn test_scenario_move_history_to_top() {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut order = OrderController::new(&mut registry, &store, &mut surface);

        order.normalize();
        let outcome = order.set_order(History, 1);

        assert_eq!(outcome, OrderOutcome::Swapped { with: Weather });
        assert_eq!(
            orders(&registry),
            vec![(History, 1), (Bookmarks, 2), (Search, 3), (Apps, 4), (Weather, 5)]
        );
    }

    #[test]
    fn test_swap_is_symmetric() {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut order = OrderController::new(&mut registry, &store, &mut surface);

        let outcome = order.set_order(Bookmarks, 4);
        assert_eq!(outcome, OrderOutcome::Swapped { with: Apps });
        assert_eq!(registry.get(Bookmarks).unwrap().order(), 4);
        assert_eq!(registry.get(Apps).unwrap().order(), 2);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-3)]
    fn test_out_of_range_is_rejected(#[case] requested: i64) {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut order = OrderController::new(&mut registry, &store, &mut surface);
        order.normalize();
        let before = orders(&registry);

        let mut order = OrderController::new(&mut registry, &store, &mut surface);
        assert_eq!(order.set_order(Search, requested), OrderOutcome::Rejected);
        assert_eq!(orders(&registry), before);
        assert_eq!(surface.view(Search).and_then(|v| v.order_input), Some(3));
    }

    #[test]
    fn test_range_counts_visible_sections_only() {
        let mut registry = SectionRegistry::standard();
        hide(&mut registry, Weather);
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut order = OrderController::new(&mut registry, &store, &mut surface);
        order.normalize();

        assert_eq!(order.set_order(Apps, 5), OrderOutcome::Rejected);
        assert_eq!(order.set_order(Apps, 4), OrderOutcome::Swapped { with: History });
    }

    #[test]
    fn test_hidden_section_cannot_be_reordered() {
        let mut registry = SectionRegistry::standard();
        hide(&mut registry, Apps);
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut order = OrderController::new(&mut registry, &store, &mut surface);

        assert_eq!(order.set_order(Apps, 1), OrderOutcome::Rejected);
        assert_eq!(registry.get(Weather).unwrap().order(), 1);
    }

    #[test]
    fn test_requesting_current_order_is_noop() {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut order = OrderController::new(&mut registry, &store, &mut surface);
        order.normalize();

        assert_eq!(order.set_order(Search, 3), OrderOutcome::Unchanged);
        assert_eq!(
            orders(&registry),
            vec![(Weather, 1), (Bookmarks, 2), (Search, 3), (Apps, 4), (History, 5)]
        );
    }

    #[test]
    fn test_free_slot_move_is_normalized() {
        // A stale gap left in memory: apps at 9 has nobody at 4.
        let mut registry = SectionRegistry::standard();
        registry.get_mut(Apps).unwrap().order = 9;
        registry.get_mut(History).unwrap().order = 4;
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut order = OrderController::new(&mut registry, &store, &mut surface);

        assert_eq!(order.set_order(Weather, 5), OrderOutcome::Moved);
        assert_eq!(
            orders(&registry),
            vec![(Bookmarks, 1), (Search, 2), (History, 3), (Weather, 4), (Apps, 5)]
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut registry = SectionRegistry::standard();
        registry.get_mut(Weather).unwrap().order = 7;
        registry.get_mut(Search).unwrap().order = 7;
        hide(&mut registry, Apps);
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();

        OrderController::new(&mut registry, &store, &mut surface).normalize();
        let once = orders(&registry);
        OrderController::new(&mut registry, &store, &mut surface).normalize();
        assert_eq!(orders(&registry), once);
        assert_eq!(once, vec![(Bookmarks, 1), (History, 2), (Weather, 3), (Search, 4)]);
    }

    #[test]
    fn test_normalize_with_nothing_visible() {
        let mut registry = SectionRegistry::standard();
        for id in SectionId::ALL {
            hide(&mut registry, id);
        }
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        OrderController::new(&mut registry, &store, &mut surface).normalize();

        assert!(orders(&registry).is_empty());
        assert!(store.is_empty());
        assert!(surface.sections.is_empty());
    }

    #[test]
    fn test_normalize_writes_every_projection() {
        let mut registry = SectionRegistry::standard();
        hide(&mut registry, Bookmarks);
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        OrderController::new(&mut registry, &store, &mut surface).normalize();

        let view = surface.view(Search).unwrap();
        assert_eq!(view.order_style, Some(2));
        assert_eq!(view.order_input, Some(2));
        assert_eq!(view.panel_order, Some(2));
        assert_eq!(surface.property("--search-order"), Some("2"));
        assert_eq!(store.get("search-order").as_deref(), Some("2"));

        // Hidden sections keep whatever was stored for them.
        assert!(surface.view(Bookmarks).is_none());
        assert_eq!(store.get("bookmarks-order"), None);
    }

    #[test]
    fn test_restore_from_storage() {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        store.set("history-order", "1");
        store.set("weather-order", "4");
        store.set("apps-order", "banana");
        store.set("search-order", "0");
        let mut surface = LayoutSnapshot::new();
        let mut order = OrderController::new(&mut registry, &store, &mut surface);

        order.restore_from_storage();
        order.normalize();

        // Apps and search keep their defaults (4 and 3); apps ties with
        // weather at 4 and configuration order puts weather first.
        assert_eq!(
            orders(&registry),
            vec![(History, 1), (Bookmarks, 2), (Search, 3), (Weather, 4), (Apps, 5)]
        );
    }

    #[test]
    fn test_ties_break_by_configuration_order() {
        let mut registry = SectionRegistry::new(vec![
            Section::new(Apps),
            Section::new(Weather),
            Section::new(Search),
        ]);
        for id in [Apps, Weather, Search] {
            registry.get_mut(id).unwrap().order = 1;
        }
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        OrderController::new(&mut registry, &store, &mut surface).normalize();

        assert_eq!(orders(&registry), vec![(Apps, 1), (Weather, 2), (Search, 3)]);
    }

    #[test]
    fn test_order_input_text() {
        let mut registry = SectionRegistry::standard();
        let store = MemoryStore::new();
        let mut surface = LayoutSnapshot::new();
        let mut order = OrderController::new(&mut registry, &store, &mut surface);
        order.normalize();

        assert_eq!(order.order_input_changed(Apps, "abc"), OrderOutcome::Rejected);
        assert_eq!(
            order.order_input_changed(Apps, " 1st"),
            OrderOutcome::Swapped { with: Weather }
        );
        assert_eq!(registry.get(Apps).unwrap().order(), 1);
    }

    #[rstest]
    #[case("3", Some(3))]
    #[case("  2  ", Some(2))]
    #[case("4.9", Some(4))]
    #[case("-1", Some(-1))]
    #[case("+5", Some(5))]
    #[case("7px", Some(7))]
    #[case("", None)]
    #[case("x2", None)]
    #[case("-", None)]
    fn test_parse_order_input(#[case] raw: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_order_input(raw), expected);
    }
}
