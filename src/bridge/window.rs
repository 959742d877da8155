//! The hosting window: its node tree, the process-wide globals the legacy
//! layer feature-detects, the widget registry and mounted shell roots.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::bridge::document::{Document, NodeId};
use crate::bridge::menu::MenuDescriptor;
use crate::bridge::shell::ShellRoot;
use crate::bridge::widget::{WidgetFactory, WidgetHandle, WidgetRegistry};

pub type Globals = Map<String, Value>;

#[derive(Default)]
pub struct HostWindow {
    document: Document,
    widgets: WidgetRegistry,
    globals: Globals,
    containers: HashMap<String, NodeId>,
    shell_roots: HashMap<NodeId, ShellRoot>,
}

thread_local! {
    static CURRENT: RefCell<HostWindow> = RefCell::new(HostWindow::default());
}

/// Run `f` against the UI thread's window.  Must not be re-entered from
/// inside `f`.
pub fn with_current<R>(f: impl FnOnce(&mut HostWindow) -> R) -> R {
    CURRENT.with(|window| f(&mut window.borrow_mut()))
}

impl HostWindow {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn widgets(&self) -> &WidgetRegistry {
        &self.widgets
    }

    pub fn widgets_mut(&mut self) -> &mut WidgetRegistry {
        &mut self.widgets
    }

    /// Registered widget for `descriptor`, created through `factory` on
    /// first use.
    pub fn widget_for(&mut self, descriptor: &Rc<MenuDescriptor>, factory: WidgetFactory) -> WidgetHandle {
        self.widgets.get_or_create(descriptor, &mut self.document, factory)
    }

    /// Register a named container node, returning the existing one if the
    /// name is taken.
    pub fn add_container(&mut self, id: &str) -> NodeId {
        if let Some(node) = self.containers.get(id) {
            return *node;
        }
        let node = self.document.create_node(id);
        self.containers.insert(id.to_string(), node);
        node
    }

    pub fn container(&self, id: &str) -> Option<NodeId> {
        self.containers.get(id).copied()
    }

    pub fn remove_container(&mut self, id: &str) -> Option<NodeId> {
        let node = self.containers.remove(id)?;
        self.shell_roots.remove(&node);
        self.document.remove_node(node);
        Some(node)
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut Globals {
        &mut self.globals
    }

    pub fn global(&self, key: &str) -> Option<&Value> {
        self.globals.get(key)
    }

    pub fn set_global(&mut self, key: &str, value: Value) -> Option<Value> {
        self.globals.insert(key.to_string(), value)
    }

    pub fn remove_global(&mut self, key: &str) -> Option<Value> {
        self.globals.remove(key)
    }

    pub fn has_shell_root(&self, container: NodeId) -> bool {
        self.shell_roots.contains_key(&container)
    }

    pub fn shell_root(&self, container: NodeId) -> Option<&ShellRoot> {
        self.shell_roots.get(&container)
    }

    pub(crate) fn take_shell_root(&mut self, container: NodeId) -> Option<ShellRoot> {
        self.shell_roots.remove(&container)
    }

    pub(crate) fn put_shell_root(&mut self, container: NodeId, root: ShellRoot) {
        self.shell_roots.insert(container, root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_containers_are_unique_by_name() {
        let mut window = HostWindow::default();
        let a = window.add_container("paint-shell-root");
        assert_eq!(window.add_container("paint-shell-root"), a);
        assert_eq!(window.container("paint-shell-root"), Some(a));
        assert_eq!(window.remove_container("paint-shell-root"), Some(a));
        assert!(window.container("paint-shell-root").is_none());
        assert!(!window.document().contains(a));
    }

    #[test]
    fn test_globals_round_trip() {
        let mut window = HostWindow::default();
        assert!(window.set_global("theme", json!("classic")).is_none());
        assert_eq!(window.global("theme"), Some(&json!("classic")));
        assert_eq!(window.remove_global("theme"), Some(json!("classic")));
        assert!(window.globals().is_empty());
    }

    #[test]
    fn test_with_current_shares_one_window() {
        with_current(|window| {
            window.add_container("shared");
        });
        assert!(with_current(|window| window.container("shared").is_some()));
    }
}
