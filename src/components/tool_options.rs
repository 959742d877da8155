use eframe::egui;
use egui::{Color32, Sense, Stroke, Vec2};

use crate::components::tool_settings::{
    AIRBRUSH_SIZES, BACKGROUND, BOLD, BRUSH_SIZES, BrushShape, ERASER_SIZES, FAMILY, FILL_STYLE,
    FONT_SIZE_MAX, FONT_SIZE_MIN, FillStyle, ITALIC, Opacity, SELECTION_MODE, SHAPE, SIZE,
    STROKE_SIZES, SettingValue, SettingsRecord, ToolSettingsStore, UNDERLINE, VERTICAL, ZOOM,
    ZOOM_LEVELS, record,
};
use crate::components::tools::{ToolDescriptor, ToolKind};

// ============================================================================
// SETTINGS SINK
// ============================================================================

pub trait SettingsSink {
    fn patch_settings(&mut self, tool_id: &str, partial: &SettingsRecord) -> bool;
}

impl SettingsSink for ToolSettingsStore {
    fn patch_settings(&mut self, tool_id: &str, partial: &SettingsRecord) -> bool {
        ToolSettingsStore::patch_settings(self, tool_id, partial)
    }
}

// ============================================================================
// CONTROLS
// ============================================================================

/// How a choice button is drawn.
#[derive(Clone, Debug, PartialEq)]
pub enum ChoiceGlyph {
    /// Horizontal line of the given width.
    Stroke(i64),
    BrushShape(BrushShape),
    FillStyle(FillStyle),
    Text(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Choice {
    pub value: SettingValue,
    /// Accessible label, e.g. `"4 pixels"`.
    pub label: String,
    pub glyph: ChoiceGlyph,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlInput {
    /// Closed enumeration.
    Choice(Vec<Choice>),
    /// Free text, e.g. a font family.
    Text,
    /// Integer field; unusable input keeps the previous value.
    Integer { min: i64, max: i64 },
    /// On/off toggle.  Disabled toggles are shown but ignore input.
    Toggle { enabled: bool },
}

/// One controlled input bound to a tool option.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionControl {
    pub tool_id: String,
    pub key: &'static str,
    pub label: &'static str,
    pub current: SettingValue,
    pub input: ControlInput,
}

impl OptionControl {
    pub fn is_selected(&self, value: &SettingValue) -> bool {
        &self.current == value
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.input, ControlInput::Toggle { enabled: false })
    }

    /// Check `value` against the control's domain.  Returns the value to
    /// store, or `None` when it is outside the domain.
    pub fn accept(&self, value: SettingValue) -> Option<SettingValue> {
        match &self.input {
            ControlInput::Choice(choices) => {
                choices.iter().any(|c| c.value == value).then_some(value)
            }
            ControlInput::Text => {
                let text = value.to_string();
                let text = text.trim();
                (!text.is_empty()).then(|| SettingValue::Text(text.to_string()))
            }
            ControlInput::Integer { min, max } => {
                let previous = self.current.as_int().unwrap_or(*min);
                let raw = value.to_string();
                Some(SettingValue::Int(parse_integer_input(&raw, previous, *min, *max)))
            }
            ControlInput::Toggle { enabled } => value.as_bool().filter(|_| *enabled).map(SettingValue::Bool),
        }
    }

    /// Validate `value` against the control's domain and forward it as a
    /// patch.  Returns whether the sink reported a change.
    pub fn select(&self, sink: &mut dyn SettingsSink, value: SettingValue) -> bool {
        match self.accept(value) {
            Some(value) => sink.patch_settings(&self.tool_id, &record([(self.key, value)])),
            None => {
                log::debug!("Rejected value for {}.{}", self.tool_id, self.key);
                false
            }
        }
    }

    /// Flip a toggle control.
    pub fn toggle(&self, sink: &mut dyn SettingsSink) -> bool {
        let current = self.current.as_bool().unwrap_or(false);
        self.select(sink, SettingValue::Bool(!current))
    }
}

/// Parse an integer field.  Non-numeric, empty or zero input keeps
/// `previous`; anything else is rounded and clamped to `min..=max`.
pub fn parse_integer_input(raw: &str, previous: i64, min: i64, max: i64) -> i64 {
    let parsed = raw
        .trim()
        .parse::<i64>()
        .ok()
        .or_else(|| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.round() as i64)
        });
    match parsed {
        Some(v) if v != 0 => v.clamp(min, max),
        _ => previous,
    }
}

// ============================================================================
// PANEL
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum OptionPanel {
    Controls {
        tool_id: String,
        controls: Vec<OptionControl>,
    },
    /// The tool has no options.  Rendered as an explicit placeholder.
    NoOptions,
}

/// A button press inside a rendered panel.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlEvent {
    pub index: usize,
    pub value: SettingValue,
}

impl OptionPanel {
    pub fn controls(&self) -> &[OptionControl] {
        match self {
            OptionPanel::Controls { controls, .. } => controls,
            OptionPanel::NoOptions => &[],
        }
    }

    pub fn control(&self, key: &str) -> Option<&OptionControl> {
        self.controls().iter().find(|c| c.key == key)
    }

    pub fn apply(&self, event: ControlEvent, sink: &mut dyn SettingsSink) -> bool {
        match self.controls().get(event.index) {
            Some(control) => control.select(sink, event.value),
            None => false,
        }
    }

    /// Draw the choice controls of the tool box option area.  Non-choice
    /// controls belong to the font box.
    pub fn show(&self, ui: &mut egui::Ui) -> Option<ControlEvent> {
        let mut event = None;
        match self {
            OptionPanel::NoOptions => {
                ui.label("—").on_hover_text("No options available");
            }
            OptionPanel::Controls { controls, .. } => {
                for (index, control) in controls.iter().enumerate() {
                    let ControlInput::Choice(choices) = &control.input else {
                        continue;
                    };
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing = Vec2::splat(2.0);
                        for choice in choices {
                            let selected = control.is_selected(&choice.value);
                            if choice_button(ui, choice, selected)
                                .on_hover_text(&choice.label)
                                .clicked()
                            {
                                event = Some(ControlEvent {
                                    index,
                                    value: choice.value.clone(),
                                });
                            }
                        }
                    });
                }
            }
        }
        event
    }
}

fn choice_button(ui: &mut egui::Ui, choice: &Choice, selected: bool) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(Vec2::new(24.0, 20.0), Sense::click());
    let visuals = ui.style().interact_selectable(&response, selected);
    let painter = ui.painter();
    if selected {
        painter.rect_filled(rect, 2.0, ui.visuals().selection.bg_fill);
    }
    let color = if selected {
        ui.visuals().selection.stroke.color
    } else {
        visuals.fg_stroke.color
    };
    let c = rect.center();
    match &choice.glyph {
        ChoiceGlyph::Stroke(size) => {
            let width = (*size as f32).min(8.0);
            painter.line_segment(
                [c - Vec2::new(7.0, 0.0), c + Vec2::new(7.0, 0.0)],
                Stroke::new(width, color),
            );
        }
        ChoiceGlyph::BrushShape(BrushShape::Round) => {
            painter.circle_filled(c, 5.0, color);
        }
        ChoiceGlyph::BrushShape(BrushShape::Square) => {
            painter.rect_filled(egui::Rect::from_center_size(c, Vec2::splat(8.0)), 0.0, color);
        }
        ChoiceGlyph::BrushShape(BrushShape::Diagonal) => {
            painter.line_segment(
                [c + Vec2::new(-4.0, 4.0), c + Vec2::new(4.0, -4.0)],
                Stroke::new(3.0, color),
            );
        }
        ChoiceGlyph::FillStyle(style) => {
            let r = egui::Rect::from_center_size(c, Vec2::splat(10.0));
            match style {
                FillStyle::Outline => painter.rect_stroke(r, 0.0, Stroke::new(2.0, color)),
                FillStyle::Filled => painter.rect_filled(r, 0.0, color),
                FillStyle::OutlineFill => {
                    painter.rect_filled(r, 0.0, color.gamma_multiply(0.4));
                    painter.rect_stroke(r, 0.0, Stroke::new(2.0, color));
                }
            }
        }
        ChoiceGlyph::Text(text) => {
            painter.text(
                c,
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(11.0),
                color,
            );
        }
    }
    if response.hovered() && !selected {
        painter.rect_stroke(rect, 2.0, Stroke::new(1.0, Color32::from_gray(140)));
    }
    response
}

// ============================================================================
// RESOLVER
// ============================================================================

fn size_choices(sizes: &[i64]) -> Vec<Choice> {
    sizes
        .iter()
        .map(|&size| Choice {
            value: SettingValue::Int(size),
            label: format!("{} pixel{}", size, if size == 1 { "" } else { "s" }),
            glyph: ChoiceGlyph::Stroke(size),
        })
        .collect()
}

fn opacity_choices(noun: &str) -> Vec<Choice> {
    Opacity::all()
        .iter()
        .map(|o| Choice {
            value: o.id().into(),
            label: format!("{} {}", o.label(), noun),
            glyph: ChoiceGlyph::Text(o.label()[..1].to_string()),
        })
        .collect()
}

/// Build the option panel of `tool` from its merged settings.
pub fn resolve(tool: &ToolDescriptor, settings: &SettingsRecord) -> OptionPanel {
    if let Some(renderer) = tool.options_renderer {
        return renderer(tool, settings);
    }
    let Some(kind) = tool.kind() else {
        return OptionPanel::NoOptions;
    };

    let current = |key: &str| settings.get(key).cloned().unwrap_or(SettingValue::Text(String::new()));
    let choice = |key: &'static str, label: &'static str, choices: Vec<Choice>| OptionControl {
        tool_id: tool.id.clone(),
        key,
        label,
        current: current(key),
        input: ControlInput::Choice(choices),
    };

    let controls = match kind {
        ToolKind::Pencil | ToolKind::Line | ToolKind::Curve => {
            vec![choice(SIZE, "Stroke size", size_choices(STROKE_SIZES))]
        }
        ToolKind::Brush => vec![
            choice(SIZE, "Brush size", size_choices(BRUSH_SIZES)),
            choice(
                SHAPE,
                "Brush shape",
                BrushShape::all()
                    .iter()
                    .map(|s| Choice {
                        value: s.id().into(),
                        label: format!("{} brush", s.label()),
                        glyph: ChoiceGlyph::BrushShape(*s),
                    })
                    .collect(),
            ),
        ],
        ToolKind::Airbrush => vec![choice(SIZE, "Airbrush size", size_choices(AIRBRUSH_SIZES))],
        ToolKind::Eraser => vec![choice(SIZE, "Eraser size", size_choices(ERASER_SIZES))],
        ToolKind::Rectangle | ToolKind::Polygon | ToolKind::Ellipse | ToolKind::RoundedRectangle => {
            vec![choice(
                FILL_STYLE,
                "Fill style",
                FillStyle::all()
                    .iter()
                    .map(|s| Choice {
                        value: s.id().into(),
                        label: match s {
                            FillStyle::OutlineFill => "Outline and fill".to_string(),
                            other => other.label().to_string(),
                        },
                        glyph: ChoiceGlyph::FillStyle(*s),
                    })
                    .collect(),
            )]
        }
        ToolKind::Magnifier => vec![choice(
            ZOOM,
            "Zoom level",
            ZOOM_LEVELS
                .iter()
                .map(|&z| Choice {
                    value: SettingValue::Int(z),
                    label: format!("{}× zoom", z),
                    glyph: ChoiceGlyph::Text(format!("{}x", z)),
                })
                .collect(),
        )],
        ToolKind::Select | ToolKind::FreeFormSelect => vec![choice(
            SELECTION_MODE,
            "Selection background mode",
            opacity_choices("selection"),
        )],
        ToolKind::Text => {
            let toggle = |key: &'static str, label: &'static str, enabled: bool| OptionControl {
                tool_id: tool.id.clone(),
                key,
                label,
                current: settings.get(key).cloned().unwrap_or(SettingValue::Bool(false)),
                input: ControlInput::Toggle { enabled },
            };
            vec![
                choice(BACKGROUND, "Text background mode", opacity_choices("background")),
                OptionControl {
                    tool_id: tool.id.clone(),
                    key: FAMILY,
                    label: "Font family",
                    current: current(FAMILY),
                    input: ControlInput::Text,
                },
                OptionControl {
                    tool_id: tool.id.clone(),
                    key: SIZE,
                    label: "Font size in points",
                    current: settings.get(SIZE).cloned().unwrap_or(SettingValue::Int(12)),
                    input: ControlInput::Integer {
                        min: FONT_SIZE_MIN,
                        max: FONT_SIZE_MAX,
                    },
                },
                toggle(BOLD, "Bold", true),
                toggle(ITALIC, "Italic", true),
                toggle(UNDERLINE, "Underline", true),
                toggle(VERTICAL, "Vertical text", false),
            ]
        }
        ToolKind::Fill | ToolKind::PickColor => return OptionPanel::NoOptions,
    };

    OptionPanel::Controls {
        tool_id: tool.id.clone(),
        controls,
    }
}
