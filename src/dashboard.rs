// Top-level coordinator for the dashboard layout.
//
// Owns the section registry, the settings store and the surface, and lends
// them to the visibility and order controllers for the length of one call.

use crate::modules::order::{OrderController, OrderOutcome};
use crate::modules::sections::{LayoutSurface, SectionId, SectionRegistry, SectionState};
use crate::modules::visibility::VisibilityController;
use crate::store::KeyValueStore;

pub struct Dashboard<S, U> {
    registry: SectionRegistry,
    store: S,
    surface: U,
}

impl<S: KeyValueStore, U: LayoutSurface> Dashboard<S, U> {
    pub fn new(registry: SectionRegistry, store: S, surface: U) -> Self {
        Self {
            registry,
            store,
            surface,
        }
    }

    fn order(&mut self) -> OrderController<'_> {
        OrderController::new(&mut self.registry, &self.store, &mut self.surface)
    }

    fn visibility(&mut self) -> VisibilityController<'_> {
        VisibilityController::new(&mut self.registry, &self.store, &mut self.surface)
    }

    /// Startup: stored visibility, then stored orders, then one
    /// normalization so the layout is dense before the first event.
    pub fn initialize(&mut self) {
        self.visibility().initialize();

        let mut order = self.order();
        order.restore_from_storage();
        order.normalize();

        self.flush_mutations();
        log::info!(
            "[Dashboard] Initialized {} sections, {} visible",
            self.registry.len(),
            self.registry.visible_count()
        );
    }

    pub fn set_visible(&mut self, id: SectionId, visible: bool) -> bool {
        self.visibility().set_visible(id, visible)
    }

    pub fn set_order(&mut self, id: SectionId, requested: i64) -> OrderOutcome {
        self.order().set_order(id, requested)
    }

    pub fn order_input_changed(&mut self, id: SectionId, raw: &str) -> OrderOutcome {
        self.order().order_input_changed(id, raw)
    }

    pub fn normalize(&mut self) {
        self.order().normalize();
    }

    /// Some other part of the page toggled a section's hidden class.
    /// The change is only picked up at the next [`Dashboard::flush_mutations`].
    pub fn record_class_change(&mut self, id: SectionId, hidden: bool) {
        self.surface.set_hidden_marker(id, hidden);
    }

    /// Drains the class mutations observed on the surface since the last
    /// flush. The latest observed state of each section wins in memory
    /// (the stored preference is left alone), then the order is
    /// re-normalized once. Returns whether anything was observed.
    pub fn flush_mutations(&mut self) -> bool {
        let mutations = self.surface.take_mutations();
        if mutations.is_empty() {
            return false;
        }

        for mutation in &mutations {
            let Some(section) = self.registry.get_mut(mutation.section) else {
                continue;
            };
            if section.is_anchored() && section.visible == mutation.hidden {
                log::info!(
                    "[Dashboard] '{}' {} outside the toggle",
                    mutation.section,
                    if mutation.hidden { "hidden" } else { "shown" }
                );
                section.visible = !mutation.hidden;
            }
        }

        log::debug!("[Dashboard] {} class mutations, re-normalizing", mutations.len());
        self.order().normalize();
        true
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    /// For wiring callbacks after construction.
    pub fn registry_mut(&mut self) -> &mut SectionRegistry {
        &mut self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn surface(&self) -> &U {
        &self.surface
    }

    pub fn states(&self) -> Vec<SectionState> {
        self.registry.states()
    }
}
