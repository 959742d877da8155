//! Status bar text for the active or hovered tool.

use crate::components::tool_settings::{
    self, BACKGROUND, BrushShape, FAMILY, FILL_STYLE, FillStyle, Opacity, SELECTION_MODE, SHAPE,
    SIZE, SettingValue, SettingsRecord, ZOOM,
};
use crate::components::tools::{ToolDescriptor, ToolKind};

pub const DEFAULT_STATUS_TEXT: &str = "For Help, click Help Topics on the Help Menu.";

/// Summarize a tool's settings, e.g. `"Brush 6px Square"`.
///
/// `settings` is layered over the tool's defaults first.  Unknown tools and
/// missing values produce an empty string.
pub fn describe_tool_options(tool_id: &str, settings: &SettingsRecord) -> String {
    let Some(kind) = ToolKind::from_id(tool_id) else {
        return String::new();
    };
    let merged = tool_settings::merge(&tool_settings::defaults_for(kind), settings);
    let get = |key: &str| merged.get(key).map(SettingValue::to_string);

    match kind {
        ToolKind::Pencil | ToolKind::Line | ToolKind::Curve => px("Size", get(SIZE)),
        ToolKind::Brush => {
            let Some(size) = get(SIZE) else {
                return String::new();
            };
            let shape = get(SHAPE)
                .map(|id| BrushShape::from_id(&id).map(|s| s.label().to_string()).unwrap_or(id))
                .unwrap_or_default();
            format!("Brush {}px {}", size, shape).trim().to_string()
        }
        ToolKind::Airbrush => px("Spray", get(SIZE)),
        ToolKind::Eraser => px("Eraser", get(SIZE)),
        ToolKind::Rectangle | ToolKind::Polygon | ToolKind::Ellipse | ToolKind::RoundedRectangle => {
            let label = get(FILL_STYLE)
                .map(|id| FillStyle::from_id(&id).map(|s| s.label().to_string()).unwrap_or(id))
                .unwrap_or_default();
            suffixed(&label, "shape")
        }
        ToolKind::Magnifier => get(ZOOM).map(|z| format!("Zoom {}×", z)).unwrap_or_default(),
        ToolKind::Select | ToolKind::FreeFormSelect => {
            suffixed(&opacity_label(get(SELECTION_MODE)), "selection")
        }
        ToolKind::Text => {
            let background = opacity_label(get(BACKGROUND));
            let family = get(FAMILY).unwrap_or_default();
            let size = get(SIZE).unwrap_or_default();
            let lead = suffixed(&background, "text");
            if family.is_empty() && size.is_empty() {
                return lead;
            }
            let lead = if lead.is_empty() { "Text".to_string() } else { lead };
            let size = if size.is_empty() { size } else { format!("{}pt", size) };
            [lead, family, size]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        }
        ToolKind::Fill | ToolKind::PickColor => String::new(),
    }
}

/// Final status line.  A hovered tool shows only its static description;
/// otherwise the active tool's description is followed by its option
/// summary.  Only a missing description falls back to the default text; an
/// empty one is shown as is.
pub fn compose_status(
    hovered: Option<&ToolDescriptor>,
    active: Option<&ToolDescriptor>,
    details: &str,
) -> String {
    if let Some(tool) = hovered {
        return or_default(tool.description.as_deref());
    }
    match active {
        Some(tool) => {
            let base = or_default(tool.description.as_deref());
            if details.is_empty() {
                base
            } else {
                format!("{} {}", base, details)
            }
        }
        None => DEFAULT_STATUS_TEXT.to_string(),
    }
}

fn px(prefix: &str, size: Option<String>) -> String {
    size.map(|s| format!("{} {}px", prefix, s)).unwrap_or_default()
}

fn suffixed(label: &str, noun: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!("{} {}", label, noun)
    }
}

fn opacity_label(id: Option<String>) -> String {
    id.map(|id| Opacity::from_id(&id).map(|o| o.label().to_string()).unwrap_or(id))
        .unwrap_or_default()
}

fn or_default(description: Option<&str>) -> String {
    description.unwrap_or(DEFAULT_STATUS_TEXT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tool_settings::record;
    use crate::components::tools::{ToolCatalog, ToolSpec};

    #[test]
    fn test_describe_stroke_and_brush() {
        assert_eq!(describe_tool_options("pencil", &record([(SIZE, 4)])), "Size 4px");
        let brush = record([(SIZE, SettingValue::Int(6)), (SHAPE, "square".into())]);
        assert_eq!(describe_tool_options("brush", &brush), "Brush 6px Square");
        assert_eq!(describe_tool_options("airbrush", &SettingsRecord::new()), "Spray 20px");
        assert_eq!(describe_tool_options("eraser", &record([(SIZE, 16)])), "Eraser 16px");
    }

    #[test]
    fn test_describe_unknown_tool_is_empty() {
        assert_eq!(describe_tool_options("unknown-tool", &SettingsRecord::new()), "");
        assert_eq!(describe_tool_options("fill", &SettingsRecord::new()), "");
    }

    #[test]
    fn test_describe_shapes_selection_and_zoom() {
        let filled = record([(FILL_STYLE, "outline-fill")]);
        assert_eq!(describe_tool_options("ellipse", &filled), "Outline and Fill shape");
        assert_eq!(describe_tool_options("rectangle", &SettingsRecord::new()), "Outline shape");
        assert_eq!(
            describe_tool_options("select", &record([(SELECTION_MODE, "opaque")])),
            "Opaque selection"
        );
        assert_eq!(describe_tool_options("magnifier", &record([(ZOOM, 4)])), "Zoom 4×");
        // Unlabelled values pass through.
        assert_eq!(describe_tool_options("brush", &record([(SHAPE, "star")])), "Brush 4px star");
    }

    #[test]
    fn test_describe_text() {
        assert_eq!(
            describe_tool_options("text", &SettingsRecord::new()),
            "Transparent text Arial 12pt"
        );
        let blank = record([(FAMILY, SettingValue::from("")), (SIZE, SettingValue::from(""))]);
        assert_eq!(describe_tool_options("text", &blank), "Transparent text");
        let no_background = record([(BACKGROUND, ""), (FAMILY, "Georgia")]);
        assert_eq!(describe_tool_options("text", &no_background), "Text Georgia 12pt");
    }

    #[test]
    fn test_compose_status_precedence() {
        let catalog = ToolCatalog::builtin();
        let pencil = catalog.get("pencil").map(|t| t.as_ref());
        let text = catalog.get("text").map(|t| t.as_ref());

        assert_eq!(
            compose_status(None, pencil, "Size 1px"),
            "Draws a free-form line one pixel wide. Size 1px"
        );
        assert_eq!(compose_status(text, pencil, "Size 1px"), "Inserts text into the picture.");
        assert_eq!(compose_status(None, pencil, ""), "Draws a free-form line one pixel wide.");
        assert_eq!(compose_status(None, None, ""), DEFAULT_STATUS_TEXT);
    }

    #[test]
    fn test_only_missing_description_uses_default() {
        let catalog = ToolCatalog::new([
            ToolSpec::new("Stamp"),
            ToolSpec::new("Blank").with_description(""),
        ]);
        let stamp = catalog.get("Stamp").map(|t| t.as_ref());
        let blank = catalog.get("Blank").map(|t| t.as_ref());

        assert_eq!(compose_status(stamp, None, ""), DEFAULT_STATUS_TEXT);
        assert_eq!(compose_status(blank, None, ""), "");
        assert_eq!(compose_status(None, blank, ""), "");
    }
}
