use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, TextureHandle, TextureOptions, Vec2};
use image::{Rgba, RgbaImage};

pub const CANVAS_WIDTH: u32 = 480;
pub const CANVAS_HEIGHT: u32 = 320;
pub const BORDER_COLOR: Color32 = Color32::from_rgb(0x7f, 0x7f, 0x7f);

// ============================================================================
// SURFACE CONTRACT
// ============================================================================

/// The only two things the shell ever asks of the drawing surface.  All
/// painting beyond this belongs to the legacy canvas layer.
pub trait CanvasSurface {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self, background: Color32);
    fn stroke_border(&mut self, color: Color32);
}

fn to_rgba(c: Color32) -> Rgba<u8> {
    Rgba(c.to_srgba_unmultiplied())
}

// ============================================================================
// RASTER CANVAS
// ============================================================================

/// CPU pixel buffer mirrored into an egui texture when it changes.
pub struct RasterCanvas {
    pixels: RgbaImage,
    texture: Option<TextureHandle>,
    dirty: bool,
    prepared: bool,
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
            texture: None,
            dirty: true,
            prepared: false,
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// White background with a grey border, applied once when the surface
    /// first becomes available.  Returns whether this call did the work.
    pub fn prepare(&mut self) -> bool {
        if self.prepared {
            return false;
        }
        self.clear(Color32::WHITE);
        self.stroke_border(BORDER_COLOR);
        self.prepared = true;
        true
    }

    fn texture(&mut self, ctx: &egui::Context) -> TextureHandle {
        if !self.dirty
            && let Some(texture) = &self.texture
        {
            return texture.clone();
        }
        let image = ColorImage::from_rgba_unmultiplied(
            [self.pixels.width() as usize, self.pixels.height() as usize],
            self.pixels.as_raw(),
        );
        self.dirty = false;
        match &mut self.texture {
            Some(texture) => {
                texture.set(image, TextureOptions::NEAREST);
                texture.clone()
            }
            None => {
                let texture = ctx.load_texture("main-canvas", image, TextureOptions::NEAREST);
                self.texture = Some(texture.clone());
                texture
            }
        }
    }

    /// Draw the canvas at 1:1, centred in the available space.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        self.prepare();
        let texture = self.texture(ui.ctx());
        let (w, h) = self.pixels.dimensions();
        let available = ui.available_rect_before_wrap();
        let rect = Rect::from_center_size(available.center(), Vec2::new(w as f32, h as f32));
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        ui.painter().image(texture.id(), rect, uv, Color32::WHITE);
    }
}

impl CanvasSurface for RasterCanvas {
    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn clear(&mut self, background: Color32) {
        let px = to_rgba(background);
        for pixel in self.pixels.pixels_mut() {
            *pixel = px;
        }
        self.dirty = true;
    }

    fn stroke_border(&mut self, color: Color32) {
        let px = to_rgba(color);
        let (w, h) = self.pixels.dimensions();
        for x in 0..w {
            self.pixels.put_pixel(x, 0, px);
            self.pixels.put_pixel(x, h - 1, px);
        }
        for y in 0..h {
            self.pixels.put_pixel(0, y, px);
            self.pixels.put_pixel(w - 1, y, px);
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_paints_background_and_border_once() {
        let mut canvas = RasterCanvas::default();
        assert_eq!(canvas.size(), (480, 320));
        assert!(canvas.prepare());

        let grey = Rgba([0x7f, 0x7f, 0x7f, 255]);
        let white = Rgba([255, 255, 255, 255]);
        assert_eq!(*canvas.pixels().get_pixel(0, 0), grey);
        assert_eq!(*canvas.pixels().get_pixel(479, 319), grey);
        assert_eq!(*canvas.pixels().get_pixel(240, 0), grey);
        assert_eq!(*canvas.pixels().get_pixel(240, 160), white);

        canvas.clear(Color32::BLACK);
        assert!(!canvas.prepare());
        assert_eq!(*canvas.pixels().get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_degenerate_size_is_clamped() {
        let mut canvas = RasterCanvas::new(0, 0);
        canvas.prepare();
        assert_eq!(canvas.size(), (1, 1));
    }
}
