use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::tools::ToolKind;
use crate::notify::Notifier;

// ============================================================================
// VALUES
// ============================================================================

/// A single option value.  Option values are the contract with the legacy
/// canvas layer, so enumerations travel as their string ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SettingValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Parse a CLI / config literal: integers, `true`/`false`, else text.
    pub fn parse_literal(raw: &str) -> SettingValue {
        let raw = raw.trim();
        if let Ok(v) = raw.parse::<i64>() {
            return SettingValue::Int(v);
        }
        match raw {
            "true" => SettingValue::Bool(true),
            "false" => SettingValue::Bool(false),
            _ => SettingValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{}", v),
            SettingValue::Int(v) => write!(f, "{}", v),
            SettingValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<i32> for SettingValue {
    fn from(v: i32) -> Self {
        SettingValue::Int(v as i64)
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Text(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Text(v)
    }
}

/// Option name → value for one tool.
pub type SettingsRecord = BTreeMap<String, SettingValue>;

/// Build a record from `(key, value)` pairs.
pub fn record<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> SettingsRecord
where
    K: Into<String>,
    V: Into<SettingValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// Option keys shared by the store, the option panel and the status text.
pub const SIZE: &str = "size";
pub const SHAPE: &str = "shape";
pub const FILL_STYLE: &str = "fillStyle";
pub const ZOOM: &str = "zoom";
pub const SELECTION_MODE: &str = "selectionMode";
pub const BACKGROUND: &str = "background";
pub const FAMILY: &str = "family";
pub const BOLD: &str = "bold";
pub const ITALIC: &str = "italic";
pub const UNDERLINE: &str = "underline";
pub const VERTICAL: &str = "vertical";

// ============================================================================
// VALUE DOMAINS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrushShape {
    Round,
    Square,
    Diagonal,
}

impl BrushShape {
    pub fn all() -> &'static [BrushShape] {
        &[BrushShape::Round, BrushShape::Square, BrushShape::Diagonal]
    }

    pub fn id(&self) -> &'static str {
        match self {
            BrushShape::Round => "round",
            BrushShape::Square => "square",
            BrushShape::Diagonal => "diagonal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BrushShape::Round => "Round",
            BrushShape::Square => "Square",
            BrushShape::Diagonal => "Diagonal",
        }
    }

    pub fn from_id(id: &str) -> Option<BrushShape> {
        Self::all().iter().copied().find(|v| v.id() == id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillStyle {
    Outline,
    Filled,
    OutlineFill,
}

impl FillStyle {
    pub fn all() -> &'static [FillStyle] {
        &[FillStyle::Outline, FillStyle::Filled, FillStyle::OutlineFill]
    }

    pub fn id(&self) -> &'static str {
        match self {
            FillStyle::Outline => "outline",
            FillStyle::Filled => "filled",
            FillStyle::OutlineFill => "outline-fill",
        }
    }

    /// Label used by the status bar.
    pub fn label(&self) -> &'static str {
        match self {
            FillStyle::Outline => "Outline",
            FillStyle::Filled => "Filled",
            FillStyle::OutlineFill => "Outline and Fill",
        }
    }

    pub fn from_id(id: &str) -> Option<FillStyle> {
        Self::all().iter().copied().find(|v| v.id() == id)
    }
}

/// Transparent/opaque choice used by both selection tools and the text
/// background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opacity {
    Transparent,
    Opaque,
}

impl Opacity {
    pub fn all() -> &'static [Opacity] {
        &[Opacity::Transparent, Opacity::Opaque]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Opacity::Transparent => "transparent",
            Opacity::Opaque => "opaque",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Opacity::Transparent => "Transparent",
            Opacity::Opaque => "Opaque",
        }
    }

    pub fn from_id(id: &str) -> Option<Opacity> {
        Self::all().iter().copied().find(|v| v.id() == id)
    }
}

pub const STROKE_SIZES: &[i64] = &[1, 2, 4, 8];
pub const BRUSH_SIZES: &[i64] = &[2, 4, 6, 8];
pub const AIRBRUSH_SIZES: &[i64] = &[10, 20, 30];
pub const ERASER_SIZES: &[i64] = &[4, 8, 16];
pub const ZOOM_LEVELS: &[i64] = &[1, 2, 4, 8];
pub const FONT_SIZE_MIN: i64 = 6;
pub const FONT_SIZE_MAX: i64 = 200;

// ============================================================================
// DEFAULTS
// ============================================================================

/// Fixed defaults for a tool.  Tools without options get an empty record.
pub fn defaults_for(kind: ToolKind) -> SettingsRecord {
    match kind {
        ToolKind::Pencil | ToolKind::Line | ToolKind::Curve => record([(SIZE, 1)]),
        ToolKind::Brush => {
            let mut r = record([(SIZE, 4)]);
            r.insert(SHAPE.into(), BrushShape::Round.id().into());
            r
        }
        ToolKind::Airbrush => record([(SIZE, 20)]),
        ToolKind::Eraser => record([(SIZE, 8)]),
        ToolKind::Rectangle | ToolKind::Polygon | ToolKind::Ellipse | ToolKind::RoundedRectangle => {
            record([(FILL_STYLE, FillStyle::Outline.id())])
        }
        ToolKind::Magnifier => record([(ZOOM, 2)]),
        ToolKind::Select | ToolKind::FreeFormSelect => {
            record([(SELECTION_MODE, Opacity::Transparent.id())])
        }
        ToolKind::Text => {
            let mut r = record([
                (BACKGROUND, Opacity::Transparent.id()),
                (FAMILY, "Arial"),
            ]);
            r.insert(SIZE.into(), 12.into());
            for key in [BOLD, ITALIC, UNDERLINE, VERTICAL] {
                r.insert(key.into(), false.into());
            }
            r
        }
        ToolKind::Fill | ToolKind::PickColor => SettingsRecord::new(),
    }
}

/// Defaults by id; unknown ids have no defaults.
pub fn defaults_for_id(tool_id: &str) -> SettingsRecord {
    ToolKind::from_id(tool_id)
        .map(defaults_for)
        .unwrap_or_default()
}

/// Right-biased shallow merge.
pub fn merge(base: &SettingsRecord, over: &SettingsRecord) -> SettingsRecord {
    let mut merged = base.clone();
    for (key, value) in over {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

// ============================================================================
// STORE
// ============================================================================

/// Emitted after a patch changed at least one value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SettingsChange {
    pub tool_id: String,
    pub settings: SettingsRecord,
}

/// Per-tool option values layered over the fixed defaults.
#[derive(Debug)]
pub struct ToolSettingsStore {
    stored: HashMap<String, SettingsRecord>,
    changes: Notifier<SettingsChange>,
}

impl Default for ToolSettingsStore {
    /// Every built-in tool starts with its own copy of the defaults.
    fn default() -> Self {
        let stored = ToolKind::all()
            .iter()
            .map(|kind| (kind.id().to_string(), defaults_for(*kind)))
            .filter(|(_, record)| !record.is_empty())
            .collect();
        Self {
            stored,
            changes: Notifier::default(),
        }
    }
}

impl ToolSettingsStore {
    /// A store with nothing stored; reads degrade to pure defaults.
    pub fn empty() -> Self {
        Self {
            stored: HashMap::new(),
            changes: Notifier::default(),
        }
    }

    pub fn on_change(&mut self, listener: impl FnMut(&SettingsChange) + 'static) {
        self.changes.subscribe(listener);
    }

    /// `defaults ⊕ stored` for the tool.  Never fails.
    pub fn settings(&self, tool_id: &str) -> SettingsRecord {
        let defaults = defaults_for_id(tool_id);
        match self.stored.get(tool_id) {
            Some(stored) => merge(&defaults, stored),
            None => defaults,
        }
    }

    pub fn value(&self, tool_id: &str, key: &str) -> Option<SettingValue> {
        self.settings(tool_id).get(key).cloned()
    }

    /// Merge `partial` into the tool's settings.  Returns `true` and notifies
    /// only when some value actually changed.
    pub fn patch_settings(&mut self, tool_id: &str, partial: &SettingsRecord) -> bool {
        let previous = self.settings(tool_id);
        let next = merge(&previous, partial);
        if next == previous {
            return false;
        }
        log::debug!("Tool `{}` settings patched: {:?}", tool_id, partial);
        self.stored.insert(tool_id.to_string(), next.clone());
        self.changes.emit(&SettingsChange {
            tool_id: tool_id.to_string(),
            settings: next,
        });
        true
    }

    /// Snapshot of the merged settings for every tool that has any.
    pub fn snapshot(&self) -> BTreeMap<String, SettingsRecord> {
        let mut ids: Vec<&str> = ToolKind::all().iter().map(|k| k.id()).collect();
        ids.extend(self.stored.keys().map(String::as_str));
        ids.into_iter()
            .map(|id| (id.to_string(), self.settings(id)))
            .filter(|(_, record)| !record.is_empty())
            .collect()
    }
}
