//! The public control surface: catalog, selection, per-tool settings, hover
//! and the status line derived from them.
//!
//! Every mutating call commits first, recomputes the status, then notifies,
//! so a listener never observes a status that lags the selection or the
//! settings it was derived from.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::components::selection::{Cardinality, SelectOptions, SelectionChange, SelectionController};
use crate::components::status::{compose_status, describe_tool_options};
use crate::components::tool_options::{self, OptionPanel, SettingsSink};
use crate::components::tool_settings::{SettingsChange, SettingsRecord, ToolSettingsStore};
use crate::components::tools::{ToolCatalog, ToolDescriptor};
use crate::notify::Notifier;

pub struct ControlSurface {
    selection: SelectionController,
    settings: ToolSettingsStore,
    status: String,
    selection_changes: Notifier<SelectionChange>,
    settings_changes: Notifier<SettingsChange>,
    status_changes: Notifier<String>,
}

impl Default for ControlSurface {
    fn default() -> Self {
        Self::new(ToolCatalog::builtin(), Cardinality::Single, &[])
    }
}

impl ControlSurface {
    pub fn new(catalog: ToolCatalog, cardinality: Cardinality, initial: &[&str]) -> Self {
        let mut surface = Self {
            selection: SelectionController::new(catalog, cardinality, initial),
            settings: ToolSettingsStore::default(),
            status: String::new(),
            selection_changes: Notifier::default(),
            settings_changes: Notifier::default(),
            status_changes: Notifier::default(),
        };
        surface.status = surface.compute_status();
        surface
    }

    // ---- channels ----

    pub fn on_selection_change(&mut self, listener: impl FnMut(&SelectionChange) + 'static) {
        self.selection_changes.subscribe(listener);
    }

    pub fn on_settings_change(&mut self, listener: impl FnMut(&SettingsChange) + 'static) {
        self.settings_changes.subscribe(listener);
    }

    pub fn on_status_change(&mut self, listener: impl FnMut(&String) + 'static) {
        self.status_changes.subscribe(listener);
    }

    // ---- reads ----

    pub fn catalog(&self) -> &ToolCatalog {
        self.selection.catalog()
    }

    pub fn cardinality(&self) -> Cardinality {
        self.selection.cardinality()
    }

    pub fn selection(&self) -> &[String] {
        self.selection.selection()
    }

    pub fn is_selected(&self, tool_id: &str) -> bool {
        self.selection.is_selected(tool_id)
    }

    pub fn selected_tools(&self) -> Vec<Rc<ToolDescriptor>> {
        self.selection.selected_tools()
    }

    pub fn active_tool(&self) -> Option<Rc<ToolDescriptor>> {
        self.selection.active_tool()
    }

    pub fn hovered(&self) -> Option<&Rc<ToolDescriptor>> {
        self.selection.hovered()
    }

    /// Merged settings for one tool.
    pub fn settings(&self, tool_id: &str) -> SettingsRecord {
        self.settings.settings(tool_id)
    }

    /// Merged settings for every tool that has any.
    pub fn all_settings(&self) -> BTreeMap<String, SettingsRecord> {
        self.settings.snapshot()
    }

    pub fn active_settings(&self) -> SettingsRecord {
        self.active_tool()
            .map(|tool| self.settings.settings(&tool.id))
            .unwrap_or_default()
    }

    pub fn status_text(&self) -> &str {
        &self.status
    }

    /// Option panel for the active tool.
    pub fn option_panel(&self) -> OptionPanel {
        match self.active_tool() {
            Some(tool) => tool_options::resolve(&tool, &self.settings.settings(&tool.id)),
            None => OptionPanel::NoOptions,
        }
    }

    // ---- writes ----

    pub fn select(&mut self, tool_id: &str, options: SelectOptions) -> bool {
        if !self.selection.select(tool_id, options) {
            return false;
        }
        self.after_selection();
        true
    }

    /// Authoritative external selection.  Listeners are notified even when
    /// `ids` equals the current selection, so downstream views may
    /// recompute redundantly.
    pub fn set_selection<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.selection.set_selection(ids);
        self.after_selection();
    }

    pub fn set_catalog(&mut self, catalog: ToolCatalog) -> bool {
        let changed = self.selection.set_catalog(catalog);
        if changed {
            self.after_selection();
        } else {
            // Descriptions may differ even when the ids survived.
            self.refresh_status();
        }
        changed
    }

    pub fn set_hovered(&mut self, tool_id: Option<&str>) -> bool {
        if !self.selection.set_hovered(tool_id) {
            return false;
        }
        self.refresh_status();
        true
    }

    fn after_selection(&mut self) {
        self.status = self.compute_status();
        let change = SelectionChange {
            ids: self.selection.selection().to_vec(),
            tools: self.selection.selected_tools(),
        };
        self.selection_changes.emit(&change);
        self.status_changes.emit(&self.status);
    }

    fn refresh_status(&mut self) {
        let next = self.compute_status();
        if next != self.status {
            self.status = next;
            self.status_changes.emit(&self.status);
        }
    }

    fn compute_status(&self) -> String {
        let active = self.active_tool();
        let details = active
            .as_ref()
            .map(|tool| describe_tool_options(&tool.id, &self.settings.settings(&tool.id)))
            .unwrap_or_default();
        compose_status(self.selection.hovered().map(|t| t.as_ref()), active.as_deref(), &details)
    }
}

impl SettingsSink for ControlSurface {
    fn patch_settings(&mut self, tool_id: &str, partial: &SettingsRecord) -> bool {
        if !self.settings.patch_settings(tool_id, partial) {
            return false;
        }
        let change = SettingsChange {
            tool_id: tool_id.to_string(),
            settings: self.settings.settings(tool_id),
        };
        let next = self.compute_status();
        let status_changed = next != self.status;
        self.status = next;
        self.settings_changes.emit(&change);
        if status_changed {
            self.status_changes.emit(&self.status);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tool_options::ControlInput;
    use crate::components::tool_settings::{SIZE, SettingValue, record};
    use std::cell::RefCell;

    fn multi(initial: &[&str]) -> ControlSurface {
        ControlSurface::new(ToolCatalog::builtin(), Cardinality::Multi, initial)
    }

    #[test]
    fn test_controlled_selection_resolves_eraser_panel() {
        let mut surface = multi(&["brush"]);
        assert_eq!(surface.catalog().len(), 16);
        surface.set_selection(&["eraser", "fill"]);

        assert_eq!(surface.selection(), ["eraser", "fill"]);
        assert_eq!(surface.active_tool().map(|t| t.id.clone()).as_deref(), Some("eraser"));
        let panel = surface.option_panel();
        let size = panel.control(SIZE).expect("eraser has a size control");
        assert_eq!(size.tool_id, "eraser");
        let ControlInput::Choice(choices) = &size.input else {
            panic!("eraser size should be a choice");
        };
        let values: Vec<_> = choices.iter().map(|c| c.value.clone()).collect();
        assert_eq!(values, vec![SettingValue::Int(4), SettingValue::Int(8), SettingValue::Int(16)]);
    }

    #[test]
    fn test_status_tracks_selection_settings_and_hover() {
        let mut surface = ControlSurface::new(ToolCatalog::builtin(), Cardinality::Single, &["pencil"]);
        let statuses = Rc::new(RefCell::new(Vec::new()));
        let sink = statuses.clone();
        surface.on_status_change(move |s| sink.borrow_mut().push(s.clone()));

        assert_eq!(surface.status_text(), "Draws a free-form line one pixel wide. Size 1px");
        surface.patch_settings("pencil", &record([(SIZE, 4)]));
        assert_eq!(surface.status_text(), "Draws a free-form line one pixel wide. Size 4px");

        surface.set_hovered(Some("text"));
        assert_eq!(surface.status_text(), "Inserts text into the picture.");
        surface.set_hovered(None);
        assert_eq!(statuses.borrow().len(), 3);

        // Patching an inactive tool leaves the status alone.
        surface.patch_settings("eraser", &record([(SIZE, 16)]));
        assert_eq!(statuses.borrow().len(), 3);
    }

    #[test]
    fn test_listeners_see_committed_state() {
        let mut surface = multi(&["brush"]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        surface.on_selection_change(move |change| {
            sink.borrow_mut().push(change.tool_ids().join(","));
        });
        let settings_seen = Rc::new(RefCell::new(Vec::new()));
        let settings_sink = settings_seen.clone();
        surface.on_settings_change(move |change| {
            settings_sink.borrow_mut().push(change.settings.get(SIZE).cloned());
        });

        surface.select("fill", SelectOptions { multi: true });
        surface.set_selection(&["fill", "brush"]);
        assert_eq!(*seen.borrow(), vec!["fill,brush", "fill,brush"]);

        assert!(surface.patch_settings("brush", &record([(SIZE, 8)])));
        assert!(!surface.patch_settings("brush", &record([(SIZE, 8)])));
        assert_eq!(*settings_seen.borrow(), vec![Some(SettingValue::Int(8))]);
        assert_eq!(surface.active_settings().get(SIZE), Some(&SettingValue::Int(8)));
    }

    #[test]
    fn test_option_panel_select_goes_through_surface() {
        let mut surface = ControlSurface::new(ToolCatalog::builtin(), Cardinality::Single, &["magnifier"]);
        let panel = surface.option_panel();
        let zoom = panel.controls()[0].clone();
        assert!(zoom.select(&mut surface, SettingValue::Int(8)));
        assert!(surface.status_text().ends_with("Zoom 8×"));
        // Out-of-domain values are rejected.
        assert!(!zoom.select(&mut surface, SettingValue::Int(3)));
    }

    #[test]
    fn test_tool_without_options_reports_placeholder() {
        let surface = ControlSurface::new(ToolCatalog::builtin(), Cardinality::Single, &["fill"]);
        assert_eq!(surface.option_panel(), OptionPanel::NoOptions);
        assert_eq!(surface.status_text(), "Fills an area with the selected drawing color.");
    }
}
