use std::rc::Rc;
use std::time::Duration;

use eframe::egui;
use egui::Color32;

use crate::bridge::menu::{KeyShortcut, default_menu};
use crate::bridge::shell::{DefaultShellFactory, HOST_CONTAINER_ID, ShellLoader, ShellMount};
use crate::bridge::widget::{BridgeState, MenuBridge};
use crate::bridge::window;
use crate::canvas::RasterCanvas;
use crate::components::colors::{ColorBox, ColorChange, css_color};
use crate::components::fonts::{FontBox, default_sources};
use crate::components::frame::{ComponentKind, Direction, StatusFields, is_floating, show_component};
use crate::components::selection::{Cardinality, SelectOptions};
use crate::components::tools::{DEFAULT_TOOL_SELECTION, ToolCatalog, ToolDescriptor, ToolKind};
use crate::config::SessionConfig;
use crate::surface::ControlSurface;

/// Container the menu bar is mounted into, ahead of the component areas.
pub const MENU_CONTAINER_ID: &str = "vertical";

/// Colors shown in the status bar, kept in step with the color box.
#[derive(Clone, Copy, Debug, PartialEq)]
struct StatusColors {
    primary: Color32,
    secondary: Color32,
}

impl StatusColors {
    fn from_box(colors: &ColorBox) -> Self {
        Self {
            primary: colors.primary(),
            secondary: colors.secondary(),
        }
    }

    fn apply(&mut self, change: ColorChange) {
        match change {
            ColorChange::Primary(c) => self.primary = c,
            ColorChange::Secondary(c) => self.secondary = c,
            ColorChange::Swapped { primary, secondary } => {
                self.primary = primary;
                self.secondary = secondary;
            }
        }
    }
}

pub struct PaintShellApp {
    config: SessionConfig,
    surface: ControlSurface,
    fonts: FontBox,
    colors: ColorBox,
    status_colors: StatusColors,
    canvas: RasterCanvas,
    menu: MenuBridge,
    shell: ShellLoader,

    /// Description of the menu entry under the pointer; replaces the tool
    /// status while set.
    menu_hint: Option<String>,
    font_box_pos: Option<(f32, f32)>,
    closing: bool,
}

impl PaintShellApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: SessionConfig) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let mut surface = initial_surface(config.effective().cardinality());
        surface.on_selection_change(|change| {
            log::debug!("Selection changed: {}", change.ids.join(","));
        });
        surface.on_settings_change(|change| {
            log::debug!("Settings changed: {:?}", change);
        });
        surface.on_status_change(|text| log::trace!("Status: {}", text));

        let mut fonts = FontBox::default();
        fonts.refresh(default_sources(config.effective().document_fonts.clone()));

        let mut menu = MenuBridge::default();
        let mut shell = ShellLoader::default();
        window::with_current(|window| {
            window.add_container(HOST_CONTAINER_ID);
            let vertical = window.add_container(MENU_CONTAINER_ID);
            menu.mount(window, Rc::new(default_menu()), vertical);
            shell.bootstrap(window, Some(Box::new(DefaultShellFactory)));
        });

        log::info!(
            "PaintShell started ({} tools, {:?} selection)",
            surface.catalog().len(),
            surface.cardinality()
        );

        let colors = ColorBox::default();
        Self {
            config,
            surface,
            fonts,
            status_colors: StatusColors::from_box(&colors),
            colors,
            canvas: RasterCanvas::default(),
            menu,
            shell,
            menu_hint: None,
            font_box_pos: None,
            closing: false,
        }
    }

    fn poll_shell(&mut self, ctx: &egui::Context) {
        if !matches!(self.shell.mount(), ShellMount::Pending) {
            return;
        }
        let mount = window::with_current(|window| self.shell.poll(window).clone());
        match mount {
            ShellMount::Pending => ctx.request_repaint_after(Duration::from_millis(50)),
            ShellMount::Mounted { reused, .. } => {
                log::info!("Shell bridge mounted (reused root: {})", reused);
            }
            ShellMount::Idle | ShellMount::LegacyOnly { .. } => {}
        }
    }

    /// Menu shortcuts and access keys first, then single-letter tool
    /// shortcuts when nothing else wants the keyboard.
    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if !matches!(self.menu.state(), BridgeState::Bound { .. }) {
            return;
        }
        let Some(widget) = self.menu.widget().cloned() else {
            return;
        };
        let typing = ctx.wants_keyboard_input();
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            let egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } = event
            else {
                continue;
            };

            {
                let mut bar = widget.borrow_mut();
                if key == egui::Key::Escape {
                    bar.close_menus();
                    continue;
                }
                if modifiers.alt
                    && !modifiers.ctrl
                    && let Some(letter) = key_letter(key)
                    && bar.handle_access_key(letter)
                {
                    continue;
                }
                if bar.handle_shortcut(&KeyShortcut::from_egui(modifiers, key)) {
                    continue;
                }
            }

            if typing || modifiers.any() {
                continue;
            }
            if let Some(letter) = key_letter(key)
                && let Some(tool) = self.surface.catalog().find_by_shortcut(letter).cloned()
            {
                self.surface.select(&tool.id, SelectOptions::default());
            }
        }
    }

    fn show_tool_box(&mut self, ui: &mut egui::Ui) {
        let multi = ui.input(|i| i.modifiers.shift || i.modifiers.command);
        let tools: Vec<Rc<ToolDescriptor>> = self.surface.catalog().iter().cloned().collect();
        let mut hovered = None;
        let mut clicked = None;

        egui::Grid::new("tool_box")
            .num_columns(2)
            .spacing([2.0, 2.0])
            .show(ui, |ui| {
                for (i, tool) in tools.iter().enumerate() {
                    let selected = self.surface.is_selected(&tool.id);
                    let response = ui
                        .add_sized(
                            [26.0, 26.0],
                            egui::SelectableLabel::new(selected, tool_glyph(&tool.name)),
                        )
                        .on_hover_text(&tool.name);
                    if response.hovered() {
                        hovered = Some(tool.id.clone());
                    }
                    if response.clicked() {
                        clicked = Some(tool.id.clone());
                    }
                    if i % 2 == 1 {
                        ui.end_row();
                    }
                }
            });

        if let Some(id) = clicked {
            self.surface.select(&id, SelectOptions { multi });
        }
        self.surface.set_hovered(hovered.as_deref());

        ui.add_space(6.0);
        ui.separator();
        let panel = self.surface.option_panel();
        if let Some(event) = panel.show(ui) {
            panel.apply(event, &mut self.surface);
        }
    }

    /// Text tool font controls, docked under the menu or in a floating
    /// window when undocking is allowed.
    fn show_font_box(&mut self, ctx: &egui::Context) {
        let is_text = self.surface.active_tool().and_then(|t| t.kind()) == Some(ToolKind::Text);
        if !is_text {
            return;
        }
        let panel = self.surface.option_panel();
        let presentation = self.config.effective().presentation;
        let mut event = None;

        if is_floating(ComponentKind::Fonts, &presentation) {
            let mut font_window = egui::Window::new(ComponentKind::Fonts.title())
                .resizable(false)
                .collapsible(false);
            if self.font_box_pos.is_none() {
                font_window = font_window.current_pos(egui::pos2(160.0, 96.0));
            }
            let resp = font_window.show(ctx, |ui| {
                event = self.fonts.show(ui, &panel);
            });
            if let Some(inner_resp) = resp {
                let win_rect = inner_resp.response.rect;
                self.font_box_pos = Some((win_rect.min.x, win_rect.min.y));
            }
        } else {
            egui::TopBottomPanel::top("font_box").show(ctx, |ui| {
                event = show_component(ui, ComponentKind::Fonts, &presentation, |ui| {
                    self.fonts.show(ui, &panel)
                });
            });
        }

        if let Some(event) = event {
            panel.apply(event, &mut self.surface);
        }
    }

    fn shutdown(&mut self) {
        if self.closing {
            return;
        }
        self.closing = true;
        window::with_current(|window| {
            self.menu.unmount(window);
            self.shell.hot_dispose(window);
        });
        if let Err(e) = self.config.save() {
            log::warn!("Could not save settings: {}", e);
        }
        log::info!("PaintShell closing");
    }
}

impl eframe::App for PaintShellApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // --- Intercept OS window-close button ---
        if ctx.input(|i| i.viewport().close_requested()) {
            self.shutdown();
        }

        // --- Background work ---
        self.poll_shell(ctx);
        self.fonts.poll();

        // --- Keyboard ---
        self.handle_keyboard(ctx);

        // --- Menu bar ---
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            if let Some(widget) = self.menu.widget() {
                self.menu_hint = widget.borrow_mut().show(ui);
            }
        });

        // --- Font box ---
        self.show_font_box(ctx);

        // --- Status bar ---
        let status = status_fields(self.surface.status_text(), self.menu_hint.as_deref(), self.status_colors);
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            status.show(ui);
        });

        // --- Color box ---
        let presentation = self.config.effective().presentation;
        egui::TopBottomPanel::bottom("color_box").show(ctx, |ui| {
            let change = show_component(ui, ComponentKind::Colors, &presentation, |ui| {
                self.colors.show(ui)
            });
            if let Some(change) = change {
                log::debug!("Color change: {:?}", change);
                self.status_colors.apply(change);
            }
        });

        // --- Tool box ---
        let tool_panel = match presentation.direction {
            Direction::Ltr => egui::SidePanel::left("tool_box_panel"),
            Direction::Rtl => egui::SidePanel::right("tool_box_panel"),
        };
        tool_panel.resizable(false).exact_width(64.0).show(ctx, |ui| {
            show_component(ui, ComponentKind::Tools, &presentation, |ui| {
                self.show_tool_box(ui);
            });
        });

        // --- Canvas ---
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(0x80, 0x80, 0x80)))
            .show(ctx, |ui| {
                self.canvas.show(ui);
            });
    }
}

fn initial_surface(cardinality: Cardinality) -> ControlSurface {
    ControlSurface::new(ToolCatalog::builtin(), cardinality, DEFAULT_TOOL_SELECTION)
}

/// Menu hint wins over the tool status while it has text; the other two
/// fields carry the current colors.
fn status_fields(status: &str, menu_hint: Option<&str>, colors: StatusColors) -> StatusFields {
    let text = match menu_hint {
        Some(hint) if !hint.is_empty() => hint,
        _ => status,
    };
    StatusFields {
        text: text.to_string(),
        position: format!("Primary {}", css_color(colors.primary)),
        size: format!("Secondary {}", css_color(colors.secondary)),
    }
}

/// Up to two initials of a tool name, drawn on its tool box button.
fn tool_glyph(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase()
}

/// Lowercase letter for a letter key, `None` for anything else.
fn key_letter(key: egui::Key) -> Option<char> {
    let mut chars = key.name().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_glyph_uses_initials() {
        assert_eq!(tool_glyph("Free-Form Select"), "FF");
        assert_eq!(tool_glyph("Pick Color"), "PC");
        assert_eq!(tool_glyph("Brush"), "B");
        assert_eq!(tool_glyph(""), "");
    }

    #[test]
    fn test_key_letter_only_maps_letters() {
        assert_eq!(key_letter(egui::Key::B), Some('b'));
        assert_eq!(key_letter(egui::Key::Escape), None);
        assert_eq!(key_letter(egui::Key::Num1), None);
    }

    #[test]
    fn test_shell_starts_with_pencil() {
        let surface = initial_surface(Cardinality::Single);
        assert_eq!(surface.selection().to_vec(), vec!["pencil".to_string()]);
        assert!(surface.status_text().starts_with("Draws a free-form line one pixel wide."));
    }

    #[test]
    fn test_status_fields_show_colors() {
        let mut colors = StatusColors::from_box(&ColorBox::default());
        colors.apply(ColorChange::Primary(Color32::from_rgb(255, 0, 0)));
        colors.apply(ColorChange::Secondary(Color32::from_rgb(0, 0, 255)));

        let fields = status_fields("Fills an area.", None, colors);
        assert_eq!(fields.text, "Fills an area.");
        assert_eq!(fields.position, "Primary rgb(255,0,0)");
        assert_eq!(fields.size, "Secondary rgb(0,0,255)");

        colors.apply(ColorChange::Swapped {
            primary: Color32::from_rgb(0, 0, 255),
            secondary: Color32::from_rgb(255, 0, 0),
        });
        let fields = status_fields("Fills an area.", Some("Opens a picture."), colors);
        assert_eq!(fields.text, "Opens a picture.");
        assert_eq!(fields.position, "Primary rgb(0,0,255)");
        assert_eq!(fields.size, "Secondary rgb(255,0,0)");

        assert_eq!(status_fields("Fills an area.", Some(""), colors).text, "Fills an area.");
    }
}
