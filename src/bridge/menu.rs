//! Menu descriptors and the imperative menu bar widget they drive.

use std::fmt;
use std::rc::Rc;

use eframe::egui;

use crate::bridge::document::{Document, NodeId};

pub type ActionFn = Rc<dyn Fn()>;

// ============================================================================
// DESCRIPTORS
// ============================================================================

#[derive(Clone)]
pub struct MenuAction {
    pub label: String,
    pub shortcut_label: Option<String>,
    /// Key combination in `Control+N` form.
    pub key_shortcuts: Option<String>,
    pub description: Option<String>,
    pub disabled: bool,
    pub action: ActionFn,
}

impl MenuAction {
    pub fn new(label: impl Into<String>, action: impl Fn() + 'static) -> Self {
        Self {
            label: label.into(),
            shortcut_label: None,
            key_shortcuts: None,
            description: None,
            disabled: false,
            action: Rc::new(action),
        }
    }

    pub fn with_shortcut(mut self, shown: &str, keys: &str) -> Self {
        self.shortcut_label = Some(shown.to_string());
        self.key_shortcuts = Some(keys.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

impl fmt::Debug for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuAction")
            .field("label", &self.label)
            .field("key_shortcuts", &self.key_shortcuts)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct MenuSubmenu {
    pub label: String,
    pub description: Option<String>,
    pub items: Vec<MenuItem>,
}

impl MenuSubmenu {
    pub fn new(label: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            label: label.into(),
            description: None,
            items,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

#[derive(Clone, Debug)]
pub enum MenuItem {
    Action(MenuAction),
    Divider,
    Submenu(MenuSubmenu),
}

impl From<MenuAction> for MenuItem {
    fn from(action: MenuAction) -> Self {
        MenuItem::Action(action)
    }
}

impl From<MenuSubmenu> for MenuItem {
    fn from(submenu: MenuSubmenu) -> Self {
        MenuItem::Submenu(submenu)
    }
}

#[derive(Clone, Debug)]
pub struct TopMenu {
    pub label: String,
    pub items: Vec<MenuItem>,
}

/// Ordered top-level menus.  Shared as `Rc<MenuDescriptor>`; the widget
/// registry keys on the `Rc` allocation, not on the content.
#[derive(Clone, Debug, Default)]
pub struct MenuDescriptor {
    menus: Vec<TopMenu>,
}

impl MenuDescriptor {
    pub fn new<L: Into<String>>(menus: impl IntoIterator<Item = (L, Vec<MenuItem>)>) -> Self {
        Self {
            menus: menus
                .into_iter()
                .map(|(label, items)| TopMenu {
                    label: label.into(),
                    items,
                })
                .collect(),
        }
    }

    pub fn menus(&self) -> &[TopMenu] {
        &self.menus
    }

    /// Look up a top-level menu by its label, with or without the `&` marker.
    pub fn menu(&self, label: &str) -> Option<&TopMenu> {
        self.menus.iter().find(|m| label_matches(&m.label, label))
    }
}

fn preview(what: &'static str) -> impl Fn() {
    move || log::info!("Preview menu: {}", what)
}

/// The File/Edit/View/Help menu shown by the preview shell.
pub fn default_menu() -> MenuDescriptor {
    MenuDescriptor::new([
        (
            "&File",
            vec![
                MenuAction::new("&New", preview("File > New"))
                    .with_shortcut("Ctrl+N", "Control+N")
                    .with_description("Start a fresh drawing.")
                    .into(),
                MenuAction::new("&Open…", preview("File > Open"))
                    .with_shortcut("Ctrl+O", "Control+O")
                    .with_description("Pick an existing image to open.")
                    .into(),
                MenuItem::Divider,
                MenuSubmenu::new(
                    "Recen&t Files",
                    vec![
                        MenuAction::new("landscape.png", preview("Open recent: landscape.png")).into(),
                        MenuAction::new("sprite-sheet.bmp", preview("Open recent: sprite-sheet.bmp"))
                            .into(),
                        MenuItem::Divider,
                        MenuAction::new("Clea&r List", preview("Clear recent files")).into(),
                    ],
                )
                .with_description("Quickly reopen recent work.")
                .into(),
                MenuItem::Divider,
                MenuAction::new("E&xit", || {})
                    .with_description("Close the preview window.")
                    .disabled()
                    .into(),
            ],
        ),
        (
            "&Edit",
            vec![
                MenuAction::new("&Undo", || {})
                    .with_shortcut("Ctrl+Z", "Control+Z")
                    .with_description("Undo is disabled in this preview.")
                    .disabled()
                    .into(),
                MenuAction::new("&Redo", || {})
                    .with_shortcut("Ctrl+Y", "Control+Y")
                    .with_description("Redo is disabled in this preview.")
                    .disabled()
                    .into(),
                MenuItem::Divider,
                MenuAction::new("Pr&eferences…", preview("Edit > Preferences"))
                    .with_description("Open prototype settings.")
                    .into(),
            ],
        ),
        (
            "&View",
            vec![
                MenuSubmenu::new(
                    "Zoom",
                    vec![
                        MenuAction::new("100%", preview("View > Zoom 100%")).into(),
                        MenuAction::new("200%", preview("View > Zoom 200%")).into(),
                        MenuAction::new("400%", preview("View > Zoom 400%")).into(),
                    ],
                )
                .into(),
                MenuAction::new("Show &Grid", preview("View > Show Grid"))
                    .with_description("Toggle the canvas grid overlay.")
                    .into(),
                MenuAction::new("&Fullscreen", preview("View > Fullscreen"))
                    .with_shortcut("F11", "F11")
                    .with_description("Try the app without window chrome.")
                    .into(),
            ],
        ),
        (
            "&Help",
            vec![
                MenuAction::new("View &Help", preview("Help > View Help"))
                    .with_description("Open documentation for the classic app.")
                    .into(),
                MenuItem::Divider,
                MenuAction::new("&About Preview", preview("Help > About"))
                    .with_description("Learn about the in-progress shell.")
                    .into(),
            ],
        ),
    ])
}

// ============================================================================
// LABELS AND SHORTCUTS
// ============================================================================

/// A label with its `&` access key removed.  `&&` is a literal ampersand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessLabel {
    pub text: String,
    pub key: Option<char>,
}

pub fn parse_access_label(label: &str) -> AccessLabel {
    let mut text = String::with_capacity(label.len());
    let mut key = None;
    let mut chars = label.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '&' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('&') => text.push('&'),
            Some(next) => {
                if key.is_none() {
                    key = next.to_lowercase().next();
                }
                text.push(next);
            }
            None => {}
        }
    }
    AccessLabel { text, key }
}

fn label_matches(label: &str, wanted: &str) -> bool {
    label == wanted || parse_access_label(label).text == wanted
}

/// A key combination such as `Control+Shift+S`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct KeyShortcut {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    pub key: String,
}

impl KeyShortcut {
    /// Parse `Control+N`, `Ctrl+Shift+Z`, `F11`...  Returns `None` when no
    /// non-modifier key is present.
    pub fn parse(raw: &str) -> Option<KeyShortcut> {
        let mut shortcut = KeyShortcut::default();
        for part in raw.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "control" | "ctrl" => shortcut.ctrl = true,
                "alt" | "option" => shortcut.alt = true,
                "shift" => shortcut.shift = true,
                "meta" | "cmd" | "command" => shortcut.meta = true,
                _ => shortcut.key = part.to_ascii_uppercase(),
            }
        }
        if shortcut.key.is_empty() {
            None
        } else {
            Some(shortcut)
        }
    }

    pub fn from_egui(modifiers: egui::Modifiers, key: egui::Key) -> KeyShortcut {
        KeyShortcut {
            ctrl: modifiers.ctrl,
            alt: modifiers.alt,
            shift: modifiers.shift,
            meta: modifiers.mac_cmd,
            key: key.name().to_ascii_uppercase(),
        }
    }
}

impl fmt::Display for KeyShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, name) in [
            (self.ctrl, "Control"),
            (self.alt, "Alt"),
            (self.shift, "Shift"),
            (self.meta, "Meta"),
        ] {
            if on {
                write!(f, "{}+", name)?;
            }
        }
        f.write_str(&self.key)
    }
}

// ============================================================================
// WIDGET
// ============================================================================

/// The imperative widget contract the bridge drives.
pub trait MenuWidget {
    /// Root node, attached under the hosting container while mounted.
    fn element(&self) -> NodeId;
    fn keyboard_scope(&self) -> Option<NodeId>;
    fn set_keyboard_scope(&mut self, container: NodeId);
    /// Drop the scope on detach; shortcuts and access keys go quiet.
    fn clear_keyboard_scope(&mut self);
    fn close_menus(&mut self);
    fn open_menu(&mut self, label: &str) -> bool;
    fn opened_menu(&self) -> Option<&str>;
    /// Run the action at `path` (top menu, then item labels).  Disabled and
    /// missing entries do nothing.
    fn activate(&mut self, path: &[&str]) -> bool;
    fn handle_shortcut(&mut self, shortcut: &KeyShortcut) -> bool;
    /// Alt+letter: open the top menu owning that access key.
    fn handle_access_key(&mut self, key: char) -> bool;
    /// Draw the bar.  Returns the description of the hovered entry.
    fn show(&mut self, ui: &mut egui::Ui) -> Option<String>;
}

pub struct MenuBar {
    descriptor: Rc<MenuDescriptor>,
    element: NodeId,
    scope: Option<NodeId>,
    open: Option<String>,
}

impl MenuBar {
    pub fn new(descriptor: Rc<MenuDescriptor>, document: &mut Document) -> Self {
        Self {
            descriptor,
            element: document.create_node("menu-bar"),
            scope: None,
            open: None,
        }
    }

    pub fn descriptor(&self) -> &Rc<MenuDescriptor> {
        &self.descriptor
    }

    fn run(&mut self, action: &MenuAction) -> bool {
        if action.disabled {
            log::debug!("Menu entry `{}` is disabled", action.label);
            return false;
        }
        let run = action.action.clone();
        self.close_menus();
        run();
        true
    }
}

fn find_action<'a>(items: &'a [MenuItem], path: &[&str]) -> Option<&'a MenuAction> {
    let (first, rest) = path.split_first()?;
    items.iter().find_map(|item| match item {
        MenuItem::Action(action) if rest.is_empty() && label_matches(&action.label, first) => {
            Some(action)
        }
        MenuItem::Submenu(sub) if !rest.is_empty() && label_matches(&sub.label, first) => {
            find_action(&sub.items, rest)
        }
        _ => None,
    })
}

fn find_shortcut<'a>(items: &'a [MenuItem], wanted: &KeyShortcut) -> Option<&'a MenuAction> {
    items.iter().find_map(|item| match item {
        MenuItem::Action(action) => action
            .key_shortcuts
            .as_deref()
            .and_then(KeyShortcut::parse)
            .filter(|s| s == wanted)
            .map(|_| action),
        MenuItem::Submenu(sub) => find_shortcut(&sub.items, wanted),
        MenuItem::Divider => None,
    })
}

fn show_items(
    ui: &mut egui::Ui,
    items: &[MenuItem],
    clicked: &mut Option<ActionFn>,
    hovered: &mut Option<String>,
) {
    for item in items {
        match item {
            MenuItem::Divider => {
                ui.separator();
            }
            MenuItem::Action(action) => {
                let mut button = egui::Button::new(parse_access_label(&action.label).text);
                if let Some(shown) = &action.shortcut_label {
                    button = button.shortcut_text(shown.as_str());
                }
                let response = ui.add_enabled(!action.disabled, button);
                if response.hovered() {
                    hovered.clone_from(&action.description);
                }
                if response.clicked() {
                    *clicked = Some(action.action.clone());
                }
            }
            MenuItem::Submenu(sub) => {
                let response = ui.menu_button(parse_access_label(&sub.label).text, |ui| {
                    show_items(ui, &sub.items, clicked, hovered);
                });
                if response.response.hovered() {
                    hovered.clone_from(&sub.description);
                }
            }
        }
    }
}

impl MenuWidget for MenuBar {
    fn element(&self) -> NodeId {
        self.element
    }

    fn keyboard_scope(&self) -> Option<NodeId> {
        self.scope
    }

    fn set_keyboard_scope(&mut self, container: NodeId) {
        self.scope = Some(container);
    }

    fn clear_keyboard_scope(&mut self) {
        self.scope = None;
    }

    fn close_menus(&mut self) {
        self.open = None;
    }

    fn open_menu(&mut self, label: &str) -> bool {
        match self.descriptor.menu(label) {
            Some(menu) => {
                self.open = Some(parse_access_label(&menu.label).text);
                true
            }
            None => false,
        }
    }

    fn opened_menu(&self) -> Option<&str> {
        self.open.as_deref()
    }

    fn activate(&mut self, path: &[&str]) -> bool {
        let descriptor = self.descriptor.clone();
        let Some((top, rest)) = path.split_first() else {
            return false;
        };
        let Some(action) = descriptor.menu(top).and_then(|m| find_action(&m.items, rest)) else {
            log::debug!("No menu entry at {:?}", path);
            return false;
        };
        self.run(action)
    }

    fn handle_shortcut(&mut self, shortcut: &KeyShortcut) -> bool {
        if self.scope.is_none() {
            return false;
        }
        let descriptor = self.descriptor.clone();
        let found = descriptor
            .menus()
            .iter()
            .find_map(|menu| find_shortcut(&menu.items, shortcut));
        match found {
            Some(action) => self.run(action),
            None => false,
        }
    }

    fn handle_access_key(&mut self, key: char) -> bool {
        if self.scope.is_none() {
            return false;
        }
        let key = key.to_lowercase().next();
        let label = self
            .descriptor
            .menus()
            .iter()
            .map(|m| parse_access_label(&m.label))
            .find(|parsed| parsed.key.is_some() && parsed.key == key)
            .map(|parsed| parsed.text);
        match label {
            Some(label) => {
                self.open = Some(label);
                true
            }
            None => false,
        }
    }

    fn show(&mut self, ui: &mut egui::Ui) -> Option<String> {
        let mut hovered = None;
        let mut clicked: Option<ActionFn> = None;
        let mut toggled: Option<String> = None;
        let mut anchor = None;

        ui.horizontal(|ui| {
            for menu in self.descriptor.menus() {
                let text = parse_access_label(&menu.label).text;
                let is_open = self.open.as_deref() == Some(text.as_str());
                let response = ui.selectable_label(is_open, text.as_str());
                if is_open {
                    anchor = Some(response.rect);
                }
                // Once a menu is open, hovering a neighbour switches to it.
                if response.clicked() || (response.hovered() && self.open.is_some() && !is_open) {
                    toggled = Some(text);
                }
            }
        });

        if let Some(text) = toggled {
            let clicked_open = self.open.as_deref() == Some(text.as_str())
                && ui.input(|i| i.pointer.any_click());
            if clicked_open {
                self.open = None;
            } else {
                self.open = Some(text);
            }
            return hovered;
        }

        let descriptor = self.descriptor.clone();
        if let (Some(open), Some(rect)) = (self.open.clone(), anchor)
            && let Some(menu) = descriptor.menu(&open)
        {
            let area = egui::Area::new(egui::Id::new(("menu-bar", self.element)))
                .order(egui::Order::Foreground)
                .fixed_pos(rect.left_bottom());
            let inner = area.show(ui.ctx(), |ui| {
                egui::Frame::menu(ui.style()).show(ui, |ui| {
                    ui.set_min_width(160.0);
                    show_items(ui, &menu.items, &mut clicked, &mut hovered);
                })
            });
            if inner.response.clicked_elsewhere() {
                self.open = None;
            }
        }

        if let Some(run) = clicked {
            self.close_menus();
            run();
        }
        hovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn counting_menu(log: &Rc<RefCell<Vec<&'static str>>>) -> Rc<MenuDescriptor> {
        let push = |name: &'static str| {
            let log = log.clone();
            move || log.borrow_mut().push(name)
        };
        Rc::new(MenuDescriptor::new([
            (
                "&File",
                vec![
                    MenuAction::new("&New", push("new"))
                        .with_shortcut("Ctrl+N", "Control+N")
                        .into(),
                    MenuItem::Divider,
                    MenuAction::new("E&xit", push("exit")).disabled().into(),
                    MenuSubmenu::new(
                        "Recen&t Files",
                        vec![MenuAction::new("a.png", push("recent")).into()],
                    )
                    .into(),
                ],
            ),
            (
                "&Edit",
                vec![
                    MenuAction::new("&Undo", push("undo"))
                        .with_shortcut("Ctrl+Z", "Control+Z")
                        .disabled()
                        .into(),
                ],
            ),
        ]))
    }

    #[test]
    fn test_parse_access_label() {
        assert_eq!(
            parse_access_label("&File"),
            AccessLabel { text: "File".into(), key: Some('f') }
        );
        assert_eq!(parse_access_label("Recen&t Files").key, Some('t'));
        assert_eq!(
            parse_access_label("Save && Close"),
            AccessLabel { text: "Save & Close".into(), key: None }
        );
    }

    #[test]
    fn test_shortcut_parse_normalizes() {
        let parsed = KeyShortcut::parse("ctrl+shift+s");
        assert_eq!(parsed.as_ref().map(ToString::to_string).as_deref(), Some("Control+Shift+S"));
        assert_eq!(KeyShortcut::parse("Control+N"), KeyShortcut::parse("Ctrl+n"));
        assert!(KeyShortcut::parse("Control+").is_none());
    }

    #[test]
    fn test_activate_skips_disabled_entries() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut doc = Document::default();
        let mut bar = MenuBar::new(counting_menu(&log), &mut doc);

        assert!(bar.activate(&["File", "New"]));
        assert!(bar.activate(&["&File", "Recent Files", "a.png"]));
        assert!(!bar.activate(&["File", "Exit"]));
        assert!(!bar.activate(&["File", "Missing"]));
        assert!(!bar.activate(&[]));
        assert_eq!(*log.borrow(), vec!["new", "recent"]);
    }

    #[test]
    fn test_shortcuts_need_keyboard_scope() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut doc = Document::default();
        let container = doc.create_node("vertical");
        let mut bar = MenuBar::new(counting_menu(&log), &mut doc);
        let ctrl_n = KeyShortcut::parse("Control+N").expect("valid shortcut");
        let ctrl_z = KeyShortcut::parse("Control+Z").expect("valid shortcut");

        assert!(!bar.handle_shortcut(&ctrl_n));
        bar.set_keyboard_scope(container);
        assert!(bar.handle_shortcut(&ctrl_n));
        assert!(!bar.handle_shortcut(&ctrl_z));
        assert_eq!(*log.borrow(), vec!["new"]);
    }

    #[test]
    fn test_access_keys_open_and_activation_closes() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut doc = Document::default();
        let container = doc.create_node("vertical");
        let mut bar = MenuBar::new(counting_menu(&log), &mut doc);
        bar.set_keyboard_scope(container);

        assert!(bar.handle_access_key('E'));
        assert_eq!(bar.opened_menu(), Some("Edit"));
        assert!(!bar.handle_access_key('q'));
        assert!(bar.open_menu("&File"));
        assert!(bar.activate(&["File", "New"]));
        assert_eq!(bar.opened_menu(), None);
    }

    #[test]
    fn test_default_menu_layout() {
        let menu = default_menu();
        let labels: Vec<_> = menu.menus().iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["&File", "&Edit", "&View", "&Help"]);
        let edit = menu.menu("Edit").expect("edit menu");
        assert!(matches!(&edit.items[0], MenuItem::Action(a) if a.disabled));
    }
}
