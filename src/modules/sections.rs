// Section registry and the UI surface the layout controllers write to.
// Pure logic: no webview imports, so every layout rule is unit tested here.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One dashboard panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Weather,
    Bookmarks,
    Search,
    Apps,
    History,
}

impl SectionId {
    /// Configuration order of the standard dashboard.
    pub const ALL: [SectionId; 5] = [
        SectionId::Weather,
        SectionId::Bookmarks,
        SectionId::Search,
        SectionId::Apps,
        SectionId::History,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Bookmarks => "bookmarks",
            Self::Search => "search",
            Self::Apps => "apps",
            Self::History => "history",
        }
    }

    pub fn visible_key(&self) -> String {
        format!("{}-visible", self.as_str())
    }

    pub fn order_key(&self) -> String {
        format!("{}-order", self.as_str())
    }

    /// CSS custom property the stylesheet reads the order from.
    pub fn order_property(&self) -> String {
        format!("--{}-order", self.as_str())
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section '{0}'")]
pub struct UnknownSection(pub String);

impl FromStr for SectionId {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

pub type SectionCallback = Box<dyn FnMut() + Send>;

pub struct Section {
    id: SectionId,
    pub(crate) visible: bool,
    pub(crate) order: u32,
    pub(crate) anchored: bool,
    pub(crate) on_hide: Option<SectionCallback>,
    pub(crate) on_show: Option<SectionCallback>,
}

impl Section {
    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            visible: true,
            order: 1,
            anchored: true,
            on_hide: None,
            on_show: None,
        }
    }

    pub fn on_hide(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_hide = Some(Box::new(callback));
        self
    }

    pub fn on_show(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_show = Some(Box::new(callback));
        self
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Visible and present on the surface: the sections that take part in
    /// the dense ranking.
    pub(crate) fn is_ranked(&self) -> bool {
        self.visible && self.anchored
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("visible", &self.visible)
            .field("order", &self.order)
            .field("anchored", &self.anchored)
            .field("on_hide", &self.on_hide.is_some())
            .field("on_show", &self.on_show.is_some())
            .finish()
    }
}

/// Serializable view of one section, sent to the webview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionState {
    pub id: SectionId,
    pub visible: bool,
    pub order: u32,
}

/// Sections in configuration order. Configuration order breaks ties when
/// two sections carry the same tentative order.
#[derive(Debug, Default)]
pub struct SectionRegistry {
    sections: Vec<Section>,
}

impl SectionRegistry {
    /// Builds a registry from a configuration list. Duplicate identifiers
    /// keep their first entry. Default orders follow list position.
    pub fn new(sections: Vec<Section>) -> Self {
        let mut registry = Self { sections: Vec::new() };
        for mut section in sections {
            if registry.get(section.id).is_some() {
                log::warn!("[Sections] Duplicate section '{}' ignored", section.id);
                continue;
            }
            section.order = registry.sections.len() as u32 + 1;
            registry.sections.push(section);
        }
        registry
    }

    /// The five dashboard sections without callbacks.
    pub fn standard() -> Self {
        Self::new(SectionId::ALL.into_iter().map(Section::new).collect())
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.sections.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Replaces the callbacks of an already registered section.
    pub fn set_callbacks(
        &mut self,
        id: SectionId,
        on_hide: Option<SectionCallback>,
        on_show: Option<SectionCallback>,
    ) {
        if let Some(section) = self.get_mut(id) {
            section.on_hide = on_hide;
            section.on_show = on_show;
        }
    }

    pub fn visible_count(&self) -> usize {
        self.sections.iter().filter(|s| s.is_ranked()).count()
    }

    /// Visible section holding `order`, if any.
    pub fn section_at(&self, order: u32) -> Option<SectionId> {
        self.sections
            .iter()
            .find(|s| s.is_ranked() && s.order == order)
            .map(|s| s.id)
    }

    /// Visible sections as (id, order), sorted by order.
    pub fn visible_orders(&self) -> Vec<(SectionId, u32)> {
        let mut visible: Vec<(SectionId, u32)> = self
            .sections
            .iter()
            .filter(|s| s.is_ranked())
            .map(|s| (s.id, s.order))
            .collect();
        visible.sort_by_key(|&(_, order)| order);
        visible
    }

    pub fn states(&self) -> Vec<SectionState> {
        self.sections
            .iter()
            .filter(|s| s.anchored)
            .map(|s| SectionState {
                id: s.id,
                visible: s.visible,
                order: s.order,
            })
            .collect()
    }
}

/// A class attribute write observed on a section element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMutation {
    pub section: SectionId,
    pub hidden: bool,
}

/// The page as the layout controllers see it. Everything behind this trait
/// is opaque to them; they only push values into it.
///
/// Writes to the hidden marker class must be observable through
/// [`LayoutSurface::take_mutations`] whoever makes them, the way a DOM
/// mutation observer sees every attribute change.
pub trait LayoutSurface {
    fn has_anchor(&self, id: SectionId) -> bool;
    fn set_display(&mut self, id: SectionId, visible: bool);
    fn set_hidden_marker(&mut self, id: SectionId, hidden: bool);
    fn set_toggle(&mut self, id: SectionId, checked: bool);
    fn set_order_style(&mut self, id: SectionId, order: u32);
    fn set_order_input(&mut self, id: SectionId, order: u32);
    /// `data-order` of the section's row in the settings panel.
    fn set_panel_order(&mut self, id: SectionId, order: u32);
    fn set_property(&mut self, name: &str, value: &str);
    fn take_mutations(&mut self) -> Vec<ClassMutation>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    pub displayed: bool,
    pub hidden_class: bool,
    pub toggle_checked: bool,
    pub order_style: Option<u32>,
    pub order_input: Option<u32>,
    pub panel_order: Option<u32>,
}

/// In-memory surface. The desktop shell serializes it and the webview
/// applies it; tests read it back directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub sections: BTreeMap<SectionId, SectionView>,
    pub properties: BTreeMap<String, String>,
    #[serde(skip)]
    missing: Vec<SectionId>,
    #[serde(skip)]
    mutations: Vec<ClassMutation>,
}

impl LayoutSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface on which `ids` have no anchor element.
    pub fn without_anchors(ids: &[SectionId]) -> Self {
        Self {
            missing: ids.to_vec(),
            ..Self::default()
        }
    }

    pub fn view(&self, id: SectionId) -> Option<&SectionView> {
        self.sections.get(&id)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn pending_mutations(&self) -> usize {
        self.mutations.len()
    }

    fn view_mut(&mut self, id: SectionId) -> &mut SectionView {
        self.sections.entry(id).or_default()
    }
}

impl LayoutSurface for LayoutSnapshot {
    fn has_anchor(&self, id: SectionId) -> bool {
        !self.missing.contains(&id)
    }

    fn set_display(&mut self, id: SectionId, visible: bool) {
        self.view_mut(id).displayed = visible;
    }

    fn set_hidden_marker(&mut self, id: SectionId, hidden: bool) {
        self.view_mut(id).hidden_class = hidden;
        self.mutations.push(ClassMutation { section: id, hidden });
    }

    fn set_toggle(&mut self, id: SectionId, checked: bool) {
        self.view_mut(id).toggle_checked = checked;
    }

    fn set_order_style(&mut self, id: SectionId, order: u32) {
        self.view_mut(id).order_style = Some(order);
    }

    fn set_order_input(&mut self, id: SectionId, order: u32) {
        self.view_mut(id).order_input = Some(order);
    }

    fn set_panel_order(&mut self, id: SectionId, order: u32) {
        self.view_mut(id).panel_order = Some(order);
    }

    fn set_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }

    fn take_mutations(&mut self) -> Vec<ClassMutation> {
        std::mem::take(&mut self.mutations)
    }
}
