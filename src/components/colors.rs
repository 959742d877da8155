use eframe::egui;
use egui::{Color32, Sense, Stroke, Vec2};

// ============================================================================
// Palette
// ============================================================================

/// The classic 28-swatch palette: dark row first, light row second.
const DEFAULT_PALETTE: [[u8; 3]; 28] = [
    [0, 0, 0],
    [128, 128, 128],
    [128, 0, 0],
    [128, 128, 0],
    [0, 128, 0],
    [0, 128, 128],
    [0, 0, 128],
    [128, 0, 128],
    [128, 128, 64],
    [0, 64, 64],
    [0, 128, 255],
    [0, 64, 128],
    [64, 0, 255],
    [128, 64, 0],
    [255, 255, 255],
    [192, 192, 192],
    [255, 0, 0],
    [255, 255, 0],
    [0, 255, 0],
    [0, 255, 255],
    [0, 0, 255],
    [255, 0, 255],
    [255, 255, 128],
    [0, 255, 128],
    [128, 255, 255],
    [128, 128, 255],
    [255, 0, 128],
    [255, 128, 64],
];

/// Ordered, non-empty, read-only list of swatches.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<Color32>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE
                .iter()
                .map(|[r, g, b]| Color32::from_rgb(*r, *g, *b))
                .collect(),
        }
    }
}

impl Palette {
    /// An empty list falls back to the default palette.
    pub fn new(colors: Vec<Color32>) -> Self {
        if colors.is_empty() {
            return Self::default();
        }
        Self { colors }
    }

    pub fn colors(&self) -> &[Color32] {
        &self.colors
    }

    pub fn get(&self, index: usize) -> Option<Color32> {
        self.colors.get(index).copied()
    }

    pub fn first(&self) -> Color32 {
        self.colors.first().copied().unwrap_or(Color32::BLACK)
    }

    pub fn last(&self) -> Color32 {
        self.colors.last().copied().unwrap_or(Color32::WHITE)
    }
}

/// `rgb(r,g,b)`, or `rgba(...)` for translucent colors.
pub fn css_color(c: Color32) -> String {
    let [r, g, b, a] = c.to_srgba_unmultiplied();
    if a == 255 {
        format!("rgb({},{},{})", r, g, b)
    } else {
        format!("rgba({},{},{},{:.2})", r, g, b, a as f32 / 255.0)
    }
}

// ============================================================================
// ColorBox
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorChange {
    Primary(Color32),
    Secondary(Color32),
    Swapped { primary: Color32, secondary: Color32 },
}

pub struct ColorBox {
    palette: Palette,
    primary: Color32,
    secondary: Color32,
}

impl Default for ColorBox {
    fn default() -> Self {
        Self::new(Palette::default())
    }
}

impl ColorBox {
    /// Primary defaults to the first swatch, secondary to the last.
    pub fn new(palette: Palette) -> Self {
        Self {
            primary: palette.first(),
            secondary: palette.last(),
            palette,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn primary(&self) -> Color32 {
        self.primary
    }

    pub fn secondary(&self) -> Color32 {
        self.secondary
    }

    /// Left click sets the primary color; right click or Ctrl+click the secondary.
    pub fn pick(&mut self, index: usize, secondary: bool) -> Option<ColorChange> {
        let color = self.palette.get(index)?;
        if secondary {
            self.secondary = color;
            Some(ColorChange::Secondary(color))
        } else {
            self.primary = color;
            Some(ColorChange::Primary(color))
        }
    }

    pub fn swap(&mut self) -> ColorChange {
        std::mem::swap(&mut self.primary, &mut self.secondary);
        ColorChange::Swapped {
            primary: self.primary,
            secondary: self.secondary,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<ColorChange> {
        let mut change = None;
        ui.horizontal(|ui| {
            // Current colors: secondary behind, primary in front.  Click to swap.
            let (rect, response) = ui.allocate_exact_size(Vec2::splat(32.0), Sense::click());
            let painter = ui.painter();
            let back = egui::Rect::from_min_size(rect.min + Vec2::splat(12.0), Vec2::splat(16.0));
            let front = egui::Rect::from_min_size(rect.min + Vec2::splat(4.0), Vec2::splat(16.0));
            painter.rect_filled(back, 0.0, self.secondary);
            painter.rect_stroke(back, 0.0, Stroke::new(1.0, Color32::from_gray(80)));
            painter.rect_filled(front, 0.0, self.primary);
            painter.rect_stroke(front, 0.0, Stroke::new(1.0, Color32::from_gray(80)));
            let hint = format!(
                "Swap colors {} and {}",
                css_color(self.primary),
                css_color(self.secondary)
            );
            if response.on_hover_text(hint).clicked() {
                change = Some(self.swap());
            }

            let ctrl = ui.input(|i| i.modifiers.ctrl);
            egui::Grid::new("palette-grid")
                .spacing(Vec2::splat(2.0))
                .show(ui, |ui| {
                    let columns = self.palette.colors().len().div_ceil(2);
                    for index in 0..self.palette.colors().len() {
                        if index == columns {
                            ui.end_row();
                        }
                        let color = self.palette.colors()[index];
                        let (rect, response) =
                            ui.allocate_exact_size(Vec2::splat(16.0), Sense::click());
                        ui.painter().rect_filled(rect, 0.0, color);
                        ui.painter()
                            .rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::from_gray(100)));
                        let response =
                            response.on_hover_text(format!("Select color {}", css_color(color)));
                        if response.secondary_clicked() {
                            change = self.pick(index, true);
                        } else if response.clicked() {
                            change = self.pick(index, ctrl);
                        }
                    }
                });
        });
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_come_from_palette_ends() {
        let color_box = ColorBox::default();
        assert_eq!(css_color(color_box.primary()), "rgb(0,0,0)");
        assert_eq!(css_color(color_box.secondary()), "rgb(255,128,64)");
    }

    #[test]
    fn test_empty_palette_falls_back() {
        assert_eq!(Palette::new(Vec::new()), Palette::default());
        let single = Palette::new(vec![Color32::RED]);
        assert_eq!(single.first(), single.last());
    }

    #[test]
    fn test_pick_and_swap() {
        let mut color_box = ColorBox::default();
        assert_eq!(color_box.pick(16, false), Some(ColorChange::Primary(Color32::from_rgb(255, 0, 0))));
        assert_eq!(color_box.pick(20, true), Some(ColorChange::Secondary(Color32::from_rgb(0, 0, 255))));
        assert_eq!(color_box.pick(99, false), None);
        color_box.swap();
        assert_eq!(color_box.primary(), Color32::from_rgb(0, 0, 255));
        assert_eq!(color_box.secondary(), Color32::from_rgb(255, 0, 0));
        // The palette itself is never mutated.
        assert_eq!(color_box.palette(), &Palette::default());
    }
}
