use std::rc::Rc;

use crate::components::tools::{ToolCatalog, ToolDescriptor};
use crate::notify::Notifier;

/// How many tools a tool box may have selected at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Cardinality {
    /// Classic tool box: exactly one tool.
    #[default]
    Single,
    /// Modifier-click toggles membership; at least one tool stays selected.
    Multi,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Set when the modifier gesture (Shift/Ctrl) accompanied the click.
    pub multi: bool,
}

/// Delivered synchronously after every committed selection change.
#[derive(Clone, Debug)]
pub struct SelectionChange {
    pub ids: Vec<String>,
    /// Descriptors of `ids`, in catalog order.
    pub tools: Vec<Rc<ToolDescriptor>>,
}

impl SelectionChange {
    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Owns which tools are selected and which one is hovered.
///
/// While the catalog is non-empty the selection is never empty and only
/// holds ids present in the catalog.
#[derive(Debug)]
pub struct SelectionController {
    catalog: ToolCatalog,
    cardinality: Cardinality,
    selected: Vec<String>,
    hovered: Option<Rc<ToolDescriptor>>,
    changes: Notifier<SelectionChange>,
}

impl SelectionController {
    pub fn new(catalog: ToolCatalog, cardinality: Cardinality, initial: &[&str]) -> Self {
        let mut controller = Self {
            catalog,
            cardinality,
            selected: Vec::new(),
            hovered: None,
            changes: Notifier::default(),
        };
        let initial: Vec<String> = initial.iter().map(|id| id.to_string()).collect();
        controller.selected = controller.sanitize(&initial);
        controller
    }

    pub fn on_change(&mut self, listener: impl FnMut(&SelectionChange) + 'static) {
        self.changes.subscribe(listener);
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn selection(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// Selected descriptors in catalog order.
    pub fn selected_tools(&self) -> Vec<Rc<ToolDescriptor>> {
        self.catalog
            .iter()
            .filter(|tool| self.is_selected(&tool.id))
            .cloned()
            .collect()
    }

    /// First selected tool in catalog order, falling back to the first
    /// catalog entry.
    pub fn active_tool(&self) -> Option<Rc<ToolDescriptor>> {
        self.catalog
            .iter()
            .find(|tool| self.is_selected(&tool.id))
            .or_else(|| self.catalog.first())
            .cloned()
    }

    /// Controlled input.  The caller is the source of truth: the sanitized
    /// ids replace the selection and listeners are notified even when the
    /// content did not change.
    pub fn set_selection<S: AsRef<str>>(&mut self, ids: &[S]) {
        let ids: Vec<String> = ids.iter().map(|id| id.as_ref().to_string()).collect();
        self.selected = self.sanitize(&ids);
        self.notify();
    }

    /// User gesture on a tool button.  Returns whether the selection changed.
    pub fn select(&mut self, id: &str, options: SelectOptions) -> bool {
        if !self.catalog.contains(id) {
            log::debug!("Ignoring selection of unknown tool `{}`", id);
            return false;
        }

        if options.multi && self.cardinality == Cardinality::Multi {
            if let Some(index) = self.selected.iter().position(|s| s == id) {
                if self.selected.len() == 1 {
                    // The last member stays selected.
                    return false;
                }
                self.selected.remove(index);
            } else {
                self.selected.push(id.to_string());
            }
            self.notify();
            return true;
        }

        if self.selected.len() == 1 && self.selected[0] == id {
            return false;
        }
        self.selected = vec![id.to_string()];
        self.notify();
        true
    }

    /// Swap the catalog, pruning ids it no longer contains.  Notifies only
    /// when the selection changed.
    pub fn set_catalog(&mut self, catalog: ToolCatalog) -> bool {
        self.catalog = catalog;
        if let Some(hovered) = &self.hovered
            && !self.catalog.contains(&hovered.id)
        {
            self.hovered = None;
        }
        let pruned = self.sanitize(&self.selected);
        if pruned == self.selected {
            return false;
        }
        self.selected = pruned;
        self.notify();
        true
    }

    pub fn hovered(&self) -> Option<&Rc<ToolDescriptor>> {
        self.hovered.as_ref()
    }

    /// Track pointer/focus over a tool button.  Returns whether it changed.
    pub fn set_hovered(&mut self, id: Option<&str>) -> bool {
        let next = id.and_then(|id| self.catalog.get(id)).cloned();
        let unchanged = match (&self.hovered, &next) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return false;
        }
        self.hovered = next;
        true
    }

    fn sanitize(&self, ids: &[String]) -> Vec<String> {
        let mut result: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if self.catalog.contains(id) && !result.contains(id) {
                result.push(id.clone());
            }
        }
        if self.cardinality == Cardinality::Single {
            result.truncate(1);
        }
        if result.is_empty()
            && let Some(first) = self.catalog.first()
        {
            result.push(first.id.clone());
        }
        result
    }

    fn notify(&mut self) {
        let change = SelectionChange {
            ids: self.selected.clone(),
            tools: self.selected_tools(),
        };
        self.changes.emit(&change);
    }
}
