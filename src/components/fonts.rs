use std::sync::mpsc;
use std::time::Duration;

use eframe::egui;

use crate::components::tool_options::{ControlEvent, ControlInput, OptionPanel};
use crate::components::tool_settings::SettingValue;
use crate::error::{Result, ShellError};

/// Offered when every font source came back empty.
pub const FALLBACK_FONTS: &[&str] = &[
    "Arial",
    "Calibri",
    "Cambria",
    "Courier New",
    "Georgia",
    "Helvetica",
    "Liberation Sans",
    "Times New Roman",
    "Trebuchet MS",
    "Verdana",
];

const ACCESS_ADVISORY: &str = "Local font access denied or unavailable.";

// ============================================================================
// FONT SOURCES
// ============================================================================

/// One link of the enumeration chain.  `Ok(empty)` means "nothing here, try
/// the next source"; `Err` additionally raises the access advisory.
pub trait FontSource: Send {
    fn name(&self) -> &'static str;
    fn families(&self) -> Result<Vec<String>>;
}

/// Installed fonts, queried through font-kit.
pub struct PlatformFonts;

impl FontSource for PlatformFonts {
    fn name(&self) -> &'static str {
        "platform"
    }

    fn families(&self) -> Result<Vec<String>> {
        font_kit::source::SystemSource::new()
            .all_families()
            .map_err(|e| ShellError::FontAccess(format!("{:?}", e)))
    }
}

/// Fonts declared by the document / configuration.
pub struct DeclaredFonts(pub Vec<String>);

impl FontSource for DeclaredFonts {
    fn name(&self) -> &'static str {
        "declared"
    }

    fn families(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// The default chain: platform query, then declared fonts.  The static
/// fallback list is applied by [`enumerate_fonts`] itself.
pub fn default_sources(declared: Vec<String>) -> Vec<Box<dyn FontSource>> {
    vec![Box::new(PlatformFonts), Box::new(DeclaredFonts(declared))]
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontListing {
    pub fonts: Vec<String>,
    /// User-visible advisory when font access failed.
    pub advisory: Option<String>,
}

/// Deduplicate and sort case-insensitively; an empty input yields the
/// fallback list.
pub fn normalize_fonts(fonts: &[String]) -> Vec<String> {
    let mut result: Vec<String> = if fonts.is_empty() {
        FALLBACK_FONTS.iter().map(|f| f.to_string()).collect()
    } else {
        fonts.to_vec()
    };
    result.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    result.dedup();
    result
}

/// Display label for a family name as stored (quotes stripped).
pub fn font_label(font: &str) -> String {
    font.replace('"', "").trim().to_string()
}

/// Walk the chain until a source yields fonts.
pub fn enumerate_fonts(sources: &[Box<dyn FontSource>]) -> FontListing {
    let mut advisory = None;
    for source in sources {
        match source.families() {
            Ok(names) => {
                let names: Vec<String> = names.into_iter().filter(|n| !n.trim().is_empty()).collect();
                if !names.is_empty() {
                    log::info!("Using {} fonts from {} source", names.len(), source.name());
                    return FontListing {
                        fonts: normalize_fonts(&names),
                        advisory: None,
                    };
                }
            }
            Err(e) => {
                log::warn!("Font source {} failed: {}", source.name(), e);
                if matches!(e, ShellError::FontAccess(_)) {
                    advisory = Some(ACCESS_ADVISORY.to_string());
                }
            }
        }
    }
    FontListing {
        fonts: normalize_fonts(&[]),
        advisory,
    }
}

// ============================================================================
// SUPERSEDING ENUMERATOR
// ============================================================================

struct FontBatch {
    generation: u64,
    listing: FontListing,
}

/// Runs enumeration off the UI thread.  Only the result of the most recent
/// request is ever committed; earlier ones are dropped when they arrive.
pub struct FontEnumerator {
    generation: u64,
    pending: bool,
    tx: mpsc::Sender<FontBatch>,
    rx: mpsc::Receiver<FontBatch>,
}

impl Default for FontEnumerator {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            generation: 0,
            pending: false,
            tx,
            rx,
        }
    }
}

impl FontEnumerator {
    /// Start a new enumeration, superseding any request in flight.
    pub fn request(&mut self, sources: Vec<Box<dyn FontSource>>) -> u64 {
        self.generation += 1;
        self.pending = true;
        let generation = self.generation;
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let listing = enumerate_fonts(&sources);
            let _ = tx.send(FontBatch {
                generation,
                listing,
            });
        });
        generation
    }

    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Non-blocking: commit whatever current result has arrived.
    pub fn poll(&mut self) -> Option<FontListing> {
        let mut latest = None;
        while let Ok(batch) = self.rx.try_recv() {
            if let Some(listing) = self.commit(batch) {
                latest = Some(listing);
            }
        }
        latest
    }

    /// Block for the next batch.  Returns `None` on timeout or when the
    /// batch was stale.
    pub fn wait(&mut self, timeout: Duration) -> Option<FontListing> {
        let batch = self.rx.recv_timeout(timeout).ok()?;
        self.commit(batch)
    }

    fn commit(&mut self, batch: FontBatch) -> Option<FontListing> {
        if batch.generation != self.generation {
            log::debug!(
                "Discarding superseded font list #{} (latest #{})",
                batch.generation,
                self.generation
            );
            return None;
        }
        self.pending = false;
        Some(batch.listing)
    }
}

// ============================================================================
// FONT BOX
// ============================================================================

pub struct FontBox {
    pub available_fonts: Vec<String>,
    pub advisory: Option<String>,
    enumerator: FontEnumerator,
    size_draft: String,
    size_editing: bool,
}

impl Default for FontBox {
    fn default() -> Self {
        Self {
            available_fonts: normalize_fonts(&[]),
            advisory: None,
            enumerator: FontEnumerator::default(),
            size_draft: String::new(),
            size_editing: false,
        }
    }
}

impl FontBox {
    pub fn refresh(&mut self, sources: Vec<Box<dyn FontSource>>) {
        self.enumerator.request(sources);
    }

    pub fn poll(&mut self) {
        if let Some(listing) = self.enumerator.poll() {
            self.available_fonts = listing.fonts;
            self.advisory = listing.advisory;
        }
    }

    pub fn status_line(&self) -> String {
        if self.enumerator.is_loading() {
            return "Loading fonts…".to_string();
        }
        if let Some(advisory) = &self.advisory {
            return advisory.clone();
        }
        let n = self.available_fonts.len();
        format!("Using {} font{}.", n, if n == 1 { "" } else { "s" })
    }

    /// Draw the family/size/formatting controls of a text tool panel.
    pub fn show(&mut self, ui: &mut egui::Ui, panel: &OptionPanel) -> Option<ControlEvent> {
        self.poll();
        let mut event = None;
        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                for (index, control) in panel.controls().iter().enumerate() {
                    match &control.input {
                        ControlInput::Text => {
                            let current = control.current.to_string();
                            egui::ComboBox::from_id_source("font-family-select")
                                .selected_text(font_label(&current))
                                .width(160.0)
                                .show_ui(ui, |ui| {
                                    for font in &self.available_fonts {
                                        let label = egui::RichText::new(font_label(font));
                                        if ui.selectable_label(*font == current, label).clicked() {
                                            event = Some(ControlEvent {
                                                index,
                                                value: SettingValue::Text(font.clone()),
                                            });
                                        }
                                    }
                                })
                                .response
                                .on_hover_text(control.label);
                        }
                        ControlInput::Integer { .. } => {
                            if !self.size_editing {
                                self.size_draft = control.current.to_string();
                            }
                            let response = ui.add(
                                egui::TextEdit::singleline(&mut self.size_draft).desired_width(36.0),
                            );
                            self.size_editing = response.has_focus();
                            if response.lost_focus() {
                                event = Some(ControlEvent {
                                    index,
                                    value: SettingValue::Text(self.size_draft.clone()),
                                });
                            }
                            response.on_hover_text(control.label);
                        }
                        _ => {}
                    }
                }
            });
            ui.horizontal(|ui| {
                for (index, control) in panel.controls().iter().enumerate() {
                    let ControlInput::Toggle { enabled } = control.input else {
                        continue;
                    };
                    let on = control.current.as_bool().unwrap_or(false);
                    let glyph = match control.key {
                        "bold" => egui::RichText::new("B").strong(),
                        "italic" => egui::RichText::new("I").italics(),
                        "underline" => egui::RichText::new("U").underline(),
                        _ => egui::RichText::new("⇅"),
                    };
                    let response = ui
                        .add_enabled(enabled, egui::SelectableLabel::new(on, glyph))
                        .on_hover_text(control.label);
                    if response.clicked() {
                        event = Some(ControlEvent {
                            index,
                            value: SettingValue::Bool(!on),
                        });
                    }
                }
            });
            ui.small(self.status_line());
        });
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Fixed(&'static str, Vec<&'static str>);

    impl FontSource for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn families(&self) -> Result<Vec<String>> {
            Ok(self.1.iter().map(|s| s.to_string()).collect())
        }
    }

    struct Denied;

    impl FontSource for Denied {
        fn name(&self) -> &'static str {
            "denied"
        }
        fn families(&self) -> Result<Vec<String>> {
            Err(ShellError::FontAccess("permission denied".into()))
        }
    }

    /// Blocks until the test releases it.
    struct Gated(Arc<Mutex<mpsc::Receiver<()>>>, Vec<&'static str>);

    impl FontSource for Gated {
        fn name(&self) -> &'static str {
            "gated"
        }
        fn families(&self) -> Result<Vec<String>> {
            if let Ok(rx) = self.0.lock() {
                let _ = rx.recv();
            }
            Ok(self.1.iter().map(|s| s.to_string()).collect())
        }
    }

    #[test]
    fn test_normalize_sorts_and_dedupes() {
        let fonts: Vec<String> = ["verdana", "Arial", "Verdana", "Arial"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(normalize_fonts(&fonts), vec!["Arial", "Verdana", "verdana"]);
        assert_eq!(normalize_fonts(&[]).len(), FALLBACK_FONTS.len());
        assert_eq!(font_label("\"Comic Sans\" "), "Comic Sans");
    }

    #[test]
    fn test_chain_falls_through_to_declared_fonts() {
        let sources: Vec<Box<dyn FontSource>> =
            vec![Box::new(Denied), Box::new(Fixed("declared", vec!["Georgia"]))];
        let listing = enumerate_fonts(&sources);
        assert_eq!(listing.fonts, vec!["Georgia"]);
        assert_eq!(listing.advisory, None);
    }

    #[test]
    fn test_chain_ends_at_fallback_with_advisory() {
        let sources: Vec<Box<dyn FontSource>> =
            vec![Box::new(Denied), Box::new(Fixed("declared", vec![]))];
        let listing = enumerate_fonts(&sources);
        assert_eq!(listing.fonts.len(), FALLBACK_FONTS.len());
        assert_eq!(listing.advisory.as_deref(), Some(ACCESS_ADVISORY));

        let quiet: Vec<Box<dyn FontSource>> = vec![Box::new(Fixed("platform", vec![" "]))];
        assert_eq!(enumerate_fonts(&quiet).advisory, None);
    }

    #[test]
    fn test_superseded_request_is_discarded() {
        let (release, gate) = mpsc::channel();
        let gate = Arc::new(Mutex::new(gate));
        let mut enumerator = FontEnumerator::default();

        let a = enumerator.request(vec![Box::new(Gated(gate, vec!["Old Font"]))]);
        let b = enumerator.request(vec![Box::new(Fixed("fresh", vec!["New Font"]))]);
        assert!(b > a);

        let committed = enumerator.wait(Duration::from_secs(5)).expect("request B result");
        assert_eq!(committed.fonts, vec!["New Font"]);
        assert!(!enumerator.is_loading());

        release.send(()).expect("release request A");
        assert_eq!(enumerator.wait(Duration::from_secs(5)), None);
        assert_eq!(enumerator.poll(), None);
    }

    #[test]
    fn test_font_box_status_line() {
        let mut font_box = FontBox::default();
        assert_eq!(font_box.status_line(), format!("Using {} fonts.", FALLBACK_FONTS.len()));
        font_box.available_fonts = vec!["Arial".into()];
        assert_eq!(font_box.status_line(), "Using 1 font.");
        font_box.refresh(vec![Box::new(Fixed("declared", vec!["Georgia"]))]);
        assert_eq!(font_box.status_line(), "Loading fonts…");
    }
}
