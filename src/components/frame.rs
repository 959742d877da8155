//! Docked component chrome and the status bar.
//!
//! Presentation only changes margins and placement, never the data the
//! components show.

use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Tall,
    Wide,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub orientation: Orientation,
    pub direction: Direction,
    pub docked: bool,
    pub allow_undock: bool,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            orientation: Orientation::Tall,
            direction: Direction::Ltr,
            docked: true,
            allow_undock: false,
        }
    }
}

/// Which docked component is being framed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    Tools,
    Colors,
    Fonts,
}

impl ComponentKind {
    pub fn title(&self) -> &'static str {
        match self {
            ComponentKind::Tools => "Tools",
            ComponentKind::Colors => "Colors",
            ComponentKind::Fonts => "Fonts",
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self {
            ComponentKind::Colors => Orientation::Wide,
            ComponentKind::Tools | ComponentKind::Fonts => Orientation::Tall,
        }
    }

    pub fn allows_undock(&self) -> bool {
        matches!(self, ComponentKind::Fonts)
    }
}

/// `(left, right)` outer margin in points.  The color box is always wide
/// and keeps 3pt of space on the side where reading starts.
pub fn component_margins(kind: ComponentKind, presentation: &Presentation) -> (f32, f32) {
    if kind == ComponentKind::Colors && kind.orientation() == Orientation::Wide {
        return match presentation.direction {
            Direction::Ltr => (3.0, 0.0),
            Direction::Rtl => (0.0, 3.0),
        };
    }
    (0.0, 0.0)
}

/// Whether the component floats in its own window.
pub fn is_floating(kind: ComponentKind, presentation: &Presentation) -> bool {
    !presentation.docked && presentation.allow_undock && kind.allows_undock()
}

/// Draw a component's contents with its margins applied.
pub fn show_component<R>(
    ui: &mut egui::Ui,
    kind: ComponentKind,
    presentation: &Presentation,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> R {
    let (left, right) = component_margins(kind, presentation);
    let presentation = Presentation {
        orientation: kind.orientation(),
        ..*presentation
    };
    let layout = match (presentation.orientation, presentation.direction) {
        (Orientation::Tall, _) => egui::Layout::top_down(egui::Align::Min),
        (Orientation::Wide, Direction::Ltr) => egui::Layout::left_to_right(egui::Align::Center),
        (Orientation::Wide, Direction::Rtl) => egui::Layout::right_to_left(egui::Align::Center),
    };
    egui::Frame::none()
        .outer_margin(egui::Margin {
            left,
            right,
            top: 0.0,
            bottom: 0.0,
        })
        .show(ui, |ui| ui.with_layout(layout, add_contents).inner)
        .inner
}

/// The three status bar fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatusFields {
    pub text: String,
    pub position: String,
    pub size: String,
}

impl StatusFields {
    pub fn show(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(&self.text);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(&self.size);
                ui.separator();
                ui.label(&self.position);
                ui.separator();
            });
        });
    }
}
