//! Keeps an imperative menu widget attached, scoped and detached as its
//! hosting container mounts and unmounts.
//!
//! Widgets are registered per descriptor allocation.  Two descriptors with
//! identical content are still two widgets; the same descriptor remounted
//! before disposal gets its existing widget back.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::bridge::document::{Document, NodeId};
use crate::bridge::menu::{MenuBar, MenuDescriptor, MenuWidget};
use crate::bridge::window::HostWindow;

pub type WidgetHandle = Rc<RefCell<dyn MenuWidget>>;
pub type WidgetFactory = fn(Rc<MenuDescriptor>, &mut Document) -> WidgetHandle;

pub fn menu_bar_factory(descriptor: Rc<MenuDescriptor>, document: &mut Document) -> WidgetHandle {
    Rc::new(RefCell::new(MenuBar::new(descriptor, document)))
}

/// Identity of a descriptor allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorKey(usize);

impl DescriptorKey {
    pub fn of(descriptor: &Rc<MenuDescriptor>) -> Self {
        Self(Rc::as_ptr(descriptor) as usize)
    }
}

struct RegistryEntry {
    // Held so the allocation, and with it the key, stays unique.
    _descriptor: Rc<MenuDescriptor>,
    widget: WidgetHandle,
}

#[derive(Default)]
pub struct WidgetRegistry {
    entries: HashMap<DescriptorKey, RegistryEntry>,
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl WidgetRegistry {
    pub fn get(&self, key: DescriptorKey) -> Option<WidgetHandle> {
        self.entries.get(&key).map(|entry| entry.widget.clone())
    }

    pub fn contains(&self, key: DescriptorKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_or_create(
        &mut self,
        descriptor: &Rc<MenuDescriptor>,
        document: &mut Document,
        factory: WidgetFactory,
    ) -> WidgetHandle {
        let key = DescriptorKey::of(descriptor);
        if let Some(widget) = self.get(key) {
            return widget;
        }
        log::debug!("Creating menu widget for descriptor {:?}", key);
        let widget = factory(descriptor.clone(), document);
        self.entries.insert(
            key,
            RegistryEntry {
                _descriptor: descriptor.clone(),
                widget: widget.clone(),
            },
        );
        widget
    }

    pub fn remove(&mut self, key: DescriptorKey) -> Option<WidgetHandle> {
        self.entries.remove(&key).map(|entry| entry.widget)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    Unbound,
    Bound { key: DescriptorKey, container: NodeId },
    Disposed,
}

/// One mount site of a menu widget.
pub struct MenuBridge {
    factory: WidgetFactory,
    state: BridgeState,
    descriptor: Option<Rc<MenuDescriptor>>,
    widget: Option<WidgetHandle>,
}

impl Default for MenuBridge {
    fn default() -> Self {
        Self::new(menu_bar_factory)
    }
}

impl MenuBridge {
    pub fn new(factory: WidgetFactory) -> Self {
        Self {
            factory,
            state: BridgeState::Unbound,
            descriptor: None,
            widget: None,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn widget(&self) -> Option<&WidgetHandle> {
        self.widget.as_ref()
    }

    pub fn descriptor(&self) -> Option<&Rc<MenuDescriptor>> {
        self.descriptor.as_ref()
    }

    /// Bind `descriptor` inside `container`.  Mounting again while bound
    /// acts like an update; mounting after an unmount reuses the registered
    /// widget.
    pub fn mount(
        &mut self,
        window: &mut HostWindow,
        descriptor: Rc<MenuDescriptor>,
        container: NodeId,
    ) -> WidgetHandle {
        if let BridgeState::Bound {
            key,
            container: current,
        } = self.state
            && key == DescriptorKey::of(&descriptor)
            && current == container
            && let Some(widget) = &self.widget
        {
            return widget.clone();
        }
        self.detach(window);
        self.bind(window, descriptor, container)
    }

    /// Swap in a new descriptor at the current container.  Returns `false`
    /// when unbound or when the descriptor is the one already bound.
    pub fn update(&mut self, window: &mut HostWindow, descriptor: Rc<MenuDescriptor>) -> bool {
        let BridgeState::Bound { key, container } = self.state else {
            log::debug!("Menu bridge update ignored while {:?}", self.state);
            return false;
        };
        if key == DescriptorKey::of(&descriptor) {
            return false;
        }
        self.detach(window);
        self.bind(window, descriptor, container);
        true
    }

    /// Close menus and detach the widget.  The registry entry survives so a
    /// quick remount gets the same widget.  Safe to call repeatedly.
    pub fn unmount(&mut self, window: &mut HostWindow) -> bool {
        let detached = self.detach(window);
        if detached {
            self.state = BridgeState::Disposed;
        }
        detached
    }

    /// Unmount and drop the registry entry for the bound descriptor.
    pub fn dispose(&mut self, window: &mut HostWindow) -> bool {
        self.unmount(window);
        self.state = BridgeState::Disposed;
        self.widget = None;
        match self.descriptor.take() {
            Some(descriptor) => window.widgets_mut().remove(DescriptorKey::of(&descriptor)).is_some(),
            None => false,
        }
    }

    fn bind(
        &mut self,
        window: &mut HostWindow,
        descriptor: Rc<MenuDescriptor>,
        container: NodeId,
    ) -> WidgetHandle {
        let key = DescriptorKey::of(&descriptor);
        let widget = window.widget_for(&descriptor, self.factory);
        let element = widget.borrow().element();
        let document = window.document_mut();
        if document.parent_of(element) != Some(container) {
            document.insert_first(container, element);
        }
        {
            let mut widget = widget.borrow_mut();
            widget.set_keyboard_scope(container);
            widget.close_menus();
        }
        self.state = BridgeState::Bound { key, container };
        self.descriptor = Some(descriptor);
        self.widget = Some(widget.clone());
        widget
    }

    fn detach(&mut self, window: &mut HostWindow) -> bool {
        let BridgeState::Bound { container, .. } = self.state else {
            return false;
        };
        if let Some(widget) = &self.widget {
            {
                let mut widget = widget.borrow_mut();
                widget.close_menus();
                // A newer mount re-scoped the widget to its own container.
                if widget.keyboard_scope() == Some(container) {
                    widget.clear_keyboard_scope();
                }
            }
            let element = widget.borrow().element();
            // A newer mount may already own the element; leave it there.
            window.document_mut().remove_child(container, element);
        }
        self.state = BridgeState::Unbound;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::bridge::menu::{KeyShortcut, MenuAction, default_menu};

    fn setup() -> (HostWindow, NodeId, NodeId) {
        let mut window = HostWindow::default();
        let first = window.add_container("vertical-a");
        let second = window.add_container("vertical-b");
        (window, first, second)
    }

    fn element(widget: &WidgetHandle) -> NodeId {
        widget.borrow().element()
    }

    #[test]
    fn test_remount_reuses_widget_and_rescopes() {
        let (mut window, first, second) = setup();
        let descriptor = Rc::new(default_menu());
        let mut bridge = MenuBridge::default();

        let original = bridge.mount(&mut window, descriptor.clone(), first);
        assert_eq!(window.document().first_child(first), Some(element(&original)));
        assert!(bridge.unmount(&mut window));
        assert_eq!(bridge.state(), BridgeState::Disposed);
        assert!(window.document().children(first).is_empty());

        let remounted = bridge.mount(&mut window, descriptor, second);
        assert!(Rc::ptr_eq(&original, &remounted));
        assert_eq!(remounted.borrow().keyboard_scope(), Some(second));
        assert_eq!(window.document().parent_of(element(&remounted)), Some(second));
        assert_eq!(window.widgets().len(), 1);
    }

    #[test]
    fn test_identity_not_content_keys_widgets() {
        let (mut window, first, _) = setup();
        let a = Rc::new(default_menu());
        let b = Rc::new(default_menu());
        let widget_a = MenuBridge::default().mount(&mut window, a, first);
        let widget_b = MenuBridge::default().mount(&mut window, b, first);
        assert!(!Rc::ptr_eq(&widget_a, &widget_b));
        assert_eq!(window.widgets().len(), 2);
    }

    #[test]
    fn test_mount_inserts_as_first_child() {
        let (mut window, first, _) = setup();
        let top = window.document_mut().create_node("component-area top");
        window.document_mut().insert_first(first, top);
        let widget = MenuBridge::default().mount(&mut window, Rc::new(default_menu()), first);
        assert_eq!(window.document().children(first), [element(&widget), top]);
    }

    #[test]
    fn test_unmount_is_idempotent_and_respects_newer_container() {
        let (mut window, first, second) = setup();
        let descriptor = Rc::new(default_menu());
        let mut old = MenuBridge::default();
        let mut new = MenuBridge::default();

        let widget = old.mount(&mut window, descriptor.clone(), first);
        new.mount(&mut window, descriptor, second);
        assert!(old.unmount(&mut window));
        assert!(!old.unmount(&mut window));
        assert_eq!(window.document().parent_of(element(&widget)), Some(second));
        assert_eq!(widget.borrow().keyboard_scope(), Some(second));
    }

    #[test]
    fn test_update_swaps_descriptor_in_place() {
        let (mut window, first, _) = setup();
        let a = Rc::new(default_menu());
        let b = Rc::new(default_menu());
        let mut bridge = MenuBridge::default();

        let widget_a = bridge.mount(&mut window, a.clone(), first);
        widget_a.borrow_mut().open_menu("File");
        assert!(bridge.update(&mut window, b.clone()));
        assert!(!bridge.update(&mut window, b));
        assert_eq!(widget_a.borrow().opened_menu(), None);
        assert_eq!(window.document().parent_of(element(&widget_a)), None);

        let widget_b = bridge.widget().cloned().expect("bound widget");
        assert_eq!(window.document().first_child(first), Some(element(&widget_b)));
        assert_eq!(widget_b.borrow().keyboard_scope(), Some(first));
        // The previous descriptor's registration is kept for reuse.
        assert!(window.widgets().contains(DescriptorKey::of(&a)));
    }

    #[test]
    fn test_update_while_unbound_is_ignored() {
        let (mut window, _, _) = setup();
        let mut bridge = MenuBridge::default();
        assert!(!bridge.update(&mut window, Rc::new(default_menu())));
        assert_eq!(bridge.state(), BridgeState::Unbound);
    }

    #[test]
    fn test_unmounted_menu_ignores_shortcuts() {
        let (mut window, first, _) = setup();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let descriptor = Rc::new(MenuDescriptor::new([(
            "&File",
            vec![
                MenuAction::new("&New", move || counter.set(counter.get() + 1))
                    .with_shortcut("Ctrl+N", "Control+N")
                    .into(),
            ],
        )]));
        let ctrl_n = KeyShortcut::parse("Control+N").expect("valid shortcut");
        let mut bridge = MenuBridge::default();

        let widget = bridge.mount(&mut window, descriptor, first);
        assert!(widget.borrow_mut().handle_shortcut(&ctrl_n));
        assert!(bridge.unmount(&mut window));
        assert_eq!(widget.borrow().keyboard_scope(), None);
        assert!(!widget.borrow_mut().handle_shortcut(&ctrl_n));
        assert!(!widget.borrow_mut().handle_access_key('f'));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_dispose_drops_registration() {
        let (mut window, first, _) = setup();
        let descriptor = Rc::new(default_menu());
        let mut bridge = MenuBridge::default();

        let before = bridge.mount(&mut window, descriptor.clone(), first);
        assert!(bridge.dispose(&mut window));
        assert!(!bridge.dispose(&mut window));
        assert!(window.widgets().is_empty());

        let after = bridge.mount(&mut window, descriptor, first);
        assert!(!Rc::ptr_eq(&before, &after));
    }
}
