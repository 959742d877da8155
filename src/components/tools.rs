use std::collections::HashSet;
use std::rc::Rc;

use crate::components::tool_options::OptionPanel;
use crate::components::tool_settings::SettingsRecord;

/// Tools selected when the shell starts.
pub const DEFAULT_TOOL_SELECTION: &[&str] = &["pencil"];

// ============================================================================
// TOOL KINDS
// ============================================================================

/// Built-in tools.  Every piece of per-tool behaviour (defaults, option
/// schema, status text) dispatches on this enum instead of comparing id
/// strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    FreeFormSelect,
    Select,
    Eraser,
    Fill,
    PickColor,
    Magnifier,
    Pencil,
    Brush,
    Airbrush,
    Text,
    Line,
    Curve,
    Rectangle,
    Polygon,
    Ellipse,
    RoundedRectangle,
}

impl ToolKind {
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::FreeFormSelect,
            ToolKind::Select,
            ToolKind::Eraser,
            ToolKind::Fill,
            ToolKind::PickColor,
            ToolKind::Magnifier,
            ToolKind::Pencil,
            ToolKind::Brush,
            ToolKind::Airbrush,
            ToolKind::Text,
            ToolKind::Line,
            ToolKind::Curve,
            ToolKind::Rectangle,
            ToolKind::Polygon,
            ToolKind::Ellipse,
            ToolKind::RoundedRectangle,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            ToolKind::FreeFormSelect => "free-form-select",
            ToolKind::Select => "select",
            ToolKind::Eraser => "eraser",
            ToolKind::Fill => "fill",
            ToolKind::PickColor => "pick-color",
            ToolKind::Magnifier => "magnifier",
            ToolKind::Pencil => "pencil",
            ToolKind::Brush => "brush",
            ToolKind::Airbrush => "airbrush",
            ToolKind::Text => "text",
            ToolKind::Line => "line",
            ToolKind::Curve => "curve",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Polygon => "polygon",
            ToolKind::Ellipse => "ellipse",
            ToolKind::RoundedRectangle => "rounded-rectangle",
        }
    }

    pub fn from_id(id: &str) -> Option<ToolKind> {
        ToolKind::all().iter().copied().find(|kind| kind.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::FreeFormSelect => "Free-Form Select",
            ToolKind::Select => "Select",
            ToolKind::Eraser => "Eraser",
            ToolKind::Fill => "Fill With Color",
            ToolKind::PickColor => "Pick Color",
            ToolKind::Magnifier => "Magnifier",
            ToolKind::Pencil => "Pencil",
            ToolKind::Brush => "Brush",
            ToolKind::Airbrush => "Airbrush",
            ToolKind::Text => "Text",
            ToolKind::Line => "Line",
            ToolKind::Curve => "Curve",
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Polygon => "Polygon",
            ToolKind::Ellipse => "Ellipse",
            ToolKind::RoundedRectangle => "Rounded Rectangle",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::FreeFormSelect => {
                "Selects a free-form part of the picture to move, copy, or edit."
            }
            ToolKind::Select => "Selects a rectangular part of the picture to move, copy, or edit.",
            ToolKind::Eraser => "Erases a portion of the picture, using the selected eraser shape.",
            ToolKind::Fill => "Fills an area with the selected drawing color.",
            ToolKind::PickColor => "Picks up a color from the picture for drawing.",
            ToolKind::Magnifier => "Changes the magnification.",
            ToolKind::Pencil => "Draws a free-form line one pixel wide.",
            ToolKind::Brush => "Draws using a brush with the selected shape and size.",
            ToolKind::Airbrush => "Draws using an airbrush of the selected size.",
            ToolKind::Text => "Inserts text into the picture.",
            ToolKind::Line => "Draws a straight line with the selected line width.",
            ToolKind::Curve => "Draws a curved line with the selected line width.",
            ToolKind::Rectangle => "Draws a rectangle with the selected fill style.",
            ToolKind::Polygon => "Draws a polygon with the selected fill style.",
            ToolKind::Ellipse => "Draws an ellipse with the selected fill style.",
            ToolKind::RoundedRectangle => "Draws a rounded rectangle with the selected fill style.",
        }
    }

    pub fn shortcut(&self) -> Option<char> {
        match self {
            ToolKind::Select => Some('s'),
            ToolKind::Eraser => Some('e'),
            ToolKind::Fill => Some('f'),
            ToolKind::PickColor => Some('k'),
            ToolKind::Magnifier => Some('z'),
            ToolKind::Pencil => Some('p'),
            ToolKind::Brush => Some('b'),
            ToolKind::Airbrush => Some('a'),
            ToolKind::Text => Some('t'),
            ToolKind::Line => Some('l'),
            ToolKind::Curve => Some('c'),
            ToolKind::Rectangle => Some('r'),
            ToolKind::Ellipse => Some('o'),
            _ => None,
        }
    }

    /// Position of the icon in the tool sprite sheet.
    pub fn icon_index(&self) -> usize {
        ToolKind::all()
            .iter()
            .position(|kind| kind == self)
            .unwrap_or_default()
    }
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

/// Builds the option panel for a tool instead of the built-in table.
pub type OptionsRenderer = fn(&ToolDescriptor, &SettingsRecord) -> OptionPanel;

/// Unnormalized tool registration.  `id` falls back to `name`.
#[derive(Clone, Debug, Default)]
pub struct ToolSpec {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub icon_index: Option<usize>,
    pub shortcut: Option<char>,
    pub options_renderer: Option<OptionsRenderer>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_shortcut(mut self, shortcut: char) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    pub fn with_options_renderer(mut self, renderer: OptionsRenderer) -> Self {
        self.options_renderer = Some(renderer);
        self
    }
}

impl From<ToolKind> for ToolSpec {
    fn from(kind: ToolKind) -> Self {
        Self {
            id: Some(kind.id().to_string()),
            name: kind.name().to_string(),
            description: Some(kind.description().to_string()),
            icon_index: Some(kind.icon_index()),
            shortcut: kind.shortcut(),
            options_renderer: None,
        }
    }
}

/// A registered tool.  Immutable; shared by reference across the shell.
#[derive(Clone, Debug)]
pub struct ToolDescriptor {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_index: Option<usize>,
    pub shortcut: Option<char>,
    pub options_renderer: Option<OptionsRenderer>,
}

impl ToolDescriptor {
    pub fn kind(&self) -> Option<ToolKind> {
        ToolKind::from_id(&self.id)
    }
}

impl From<ToolSpec> for ToolDescriptor {
    fn from(spec: ToolSpec) -> Self {
        let id = match spec.id {
            Some(id) if !id.is_empty() => id,
            _ => spec.name.clone(),
        };
        Self {
            id,
            name: spec.name,
            description: spec.description,
            icon_index: spec.icon_index,
            shortcut: spec.shortcut.map(|c| c.to_ascii_lowercase()),
            options_renderer: spec.options_renderer,
        }
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// Ordered list of registered tools with unique ids.
#[derive(Clone, Debug, Default)]
pub struct ToolCatalog {
    tools: Vec<Rc<ToolDescriptor>>,
}

impl ToolCatalog {
    /// Normalize specs into descriptors.  Later duplicates of an id are dropped.
    pub fn new(specs: impl IntoIterator<Item = ToolSpec>) -> Self {
        let mut seen = HashSet::new();
        let mut tools = Vec::new();
        for spec in specs {
            let descriptor = ToolDescriptor::from(spec);
            if !seen.insert(descriptor.id.clone()) {
                log::warn!("Duplicate tool id `{}` ignored", descriptor.id);
                continue;
            }
            tools.push(Rc::new(descriptor));
        }
        Self { tools }
    }

    /// The sixteen classic tools in tool box order.
    pub fn builtin() -> Self {
        Self::new(ToolKind::all().iter().copied().map(ToolSpec::from))
    }

    pub fn get(&self, id: &str) -> Option<&Rc<ToolDescriptor>> {
        self.tools.iter().find(|tool| tool.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tools.iter().position(|tool| tool.id == id)
    }

    pub fn first(&self) -> Option<&Rc<ToolDescriptor>> {
        self.tools.first()
    }

    pub fn find_by_shortcut(&self, key: char) -> Option<&Rc<ToolDescriptor>> {
        let key = key.to_ascii_lowercase();
        self.tools.iter().find(|tool| tool.shortcut == Some(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<ToolDescriptor>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_order() {
        let catalog = ToolCatalog::builtin();
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog.first().map(|t| t.id.as_str()), Some("free-form-select"));
        assert_eq!(catalog.position("pencil"), Some(6));
        assert_eq!(catalog.get("brush").and_then(|t| t.kind()), Some(ToolKind::Brush));
    }

    #[test]
    fn test_id_defaults_from_name() {
        let catalog = ToolCatalog::new([ToolSpec::new("Spray Can"), ToolSpec::new("Blur").with_id("")]);
        let ids: Vec<_> = catalog.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["Spray Can", "Blur"]);
        assert!(catalog.get("Spray Can").and_then(|t| t.kind()).is_none());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = ToolCatalog::new([
            ToolSpec::new("Pencil").with_id("pencil").with_description("first"),
            ToolSpec::new("Other Pencil").with_id("pencil").with_description("second"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("pencil").and_then(|t| t.description.as_deref()), Some("first"));
    }

    #[test]
    fn test_shortcut_lookup_is_case_insensitive() {
        let catalog = ToolCatalog::builtin();
        assert_eq!(catalog.find_by_shortcut('B').map(|t| t.id.as_str()), Some("brush"));
        assert!(catalog.find_by_shortcut('q').is_none());
    }
}
