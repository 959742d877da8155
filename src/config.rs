use std::path::{Path, PathBuf};

use log::LevelFilter;

use crate::components::frame::{Direction, Orientation, Presentation};
use crate::components::selection::Cardinality;
use crate::error::{Result, ShellError};

const FILE_NAME: &str = "paintshell_settings.cfg";

/// Persisted shell preferences, stored as `key=value` lines.
#[derive(Clone, Debug, PartialEq)]
pub struct ShellConfig {
    pub presentation: Presentation,
    pub multi_select: bool,
    pub log_level: LevelFilter,
    /// Fonts declared by the document, used when the platform list is
    /// unavailable.
    pub document_fonts: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            presentation: Presentation::default(),
            multi_select: false,
            log_level: LevelFilter::Info,
            document_fonts: Vec::new(),
        }
    }
}

impl ShellConfig {
    /// Path to the settings file.
    /// On Linux:   ~/.config/paintshell/paintshell_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\PaintShell\paintshell_settings.cfg
    /// On macOS:   ~/Library/Application Support/PaintShell/paintshell_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("paintshell");
            return Some(config_dir.join(FILE_NAME));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("PaintShell").join(FILE_NAME));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("PaintShell")
                    .join(FILE_NAME),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join(FILE_NAME)))
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        if self.multi_select {
            Cardinality::Multi
        } else {
            Cardinality::Single
        }
    }

    /// Apply one `key=value` pair.  Unknown keys are ignored; bad values are
    /// rejected and leave the field untouched.
    pub fn set(&mut self, key: &str, val: &str) -> Result<()> {
        let invalid = || ShellError::Config {
            key: key.to_string(),
            value: val.to_string(),
        };
        match key {
            "orientation" => {
                self.presentation.orientation = match val {
                    "tall" => Orientation::Tall,
                    "wide" => Orientation::Wide,
                    _ => return Err(invalid()),
                };
            }
            "direction" => {
                self.presentation.direction = match val {
                    "ltr" => Direction::Ltr,
                    "rtl" => Direction::Rtl,
                    _ => return Err(invalid()),
                };
            }
            "docked" => self.presentation.docked = parse_bool(val).ok_or_else(invalid)?,
            "allow_undock" => self.presentation.allow_undock = parse_bool(val).ok_or_else(invalid)?,
            "multi_select" => self.multi_select = parse_bool(val).ok_or_else(invalid)?,
            "log_level" => {
                self.log_level = crate::logger::parse_level(val).ok_or_else(invalid)?;
            }
            "document_fonts" => {
                self.document_fonts = val
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => log::debug!("Ignoring unknown config key `{}`", key),
        }
        Ok(())
    }

    /// Parse file content.  Never fails; bad lines are logged and skipped.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            if let Err(e) = s.set(key.trim(), val.trim()) {
                log::warn!("{}", e);
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        let orientation = match self.presentation.orientation {
            Orientation::Tall => "tall",
            Orientation::Wide => "wide",
        };
        let direction = match self.presentation.direction {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        };
        format!(
            "orientation={orientation}\n\
             direction={direction}\n\
             docked={}\n\
             allow_undock={}\n\
             multi_select={}\n\
             log_level={}\n\
             document_fonts={}\n",
            self.presentation.docked,
            self.presentation.allow_undock,
            self.multi_select,
            self.log_level.as_str().to_ascii_lowercase(),
            self.document_fonts.join(","),
        )
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        match Self::read(&path) {
            Ok(config) => config,
            Err(ShellError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Could not read settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::settings_path() else { return Ok(()) };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| ShellError::ConfigWrite(path.clone(), e))?;
        }
        std::fs::write(&path, self.to_config_string()).map_err(|e| ShellError::ConfigWrite(path, e))
    }
}

/// Settings for one run: what was loaded from disk, and what is in effect
/// after one-off launch overrides.  Only the loaded side is ever saved.
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    saved: ShellConfig,
    effective: ShellConfig,
}

impl SessionConfig {
    pub fn new(saved: ShellConfig) -> Self {
        Self {
            effective: saved.clone(),
            saved,
        }
    }

    pub fn saved(&self) -> &ShellConfig {
        &self.saved
    }

    pub fn effective(&self) -> &ShellConfig {
        &self.effective
    }

    /// One-off override for this run only.
    pub fn overlay(&mut self, key: &str, val: &str) -> Result<()> {
        self.effective.set(key, val)
    }

    /// Persistent change made from the UI; lands on both sides.
    pub fn update(&mut self, key: &str, val: &str) -> Result<()> {
        self.saved.set(key, val)?;
        self.effective.set(key, val)
    }

    pub fn save(&self) -> Result<()> {
        self.saved.save()
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_string_parses_back() {
        let config = ShellConfig {
            presentation: Presentation {
                orientation: Orientation::Wide,
                direction: Direction::Rtl,
                docked: false,
                allow_undock: true,
            },
            multi_select: true,
            log_level: LevelFilter::Debug,
            document_fonts: vec!["Comic Sans MS".into(), "Georgia".into()],
        };
        assert_eq!(ShellConfig::parse(&config.to_config_string()), config);
    }

    #[test]
    fn test_corrupt_lines_keep_defaults() {
        let parsed = ShellConfig::parse("garbage\norientation=diagonal\ndocked=maybe\nfuture_key=1\n");
        assert_eq!(parsed, ShellConfig::default());
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("paintshell-no-such-dir").join(FILE_NAME);
        assert!(matches!(ShellConfig::read(&path), Err(ShellError::Io(_))));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = ShellConfig::default();
        assert!(config.set("multi_select", "yes").is_ok());
        assert_eq!(config.cardinality(), Cardinality::Multi);
        assert!(matches!(
            config.set("log_level", "loud"),
            Err(ShellError::Config { .. })
        ));
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_overlay_is_not_persisted() {
        let mut session = SessionConfig::new(ShellConfig::default());
        session.overlay("direction", "rtl").expect("valid override");
        session.update("multi_select", "true").expect("valid setting");
        assert!(session.overlay("docked", "sideways").is_err());

        assert_eq!(session.effective().presentation.direction, Direction::Rtl);
        assert!(session.effective().multi_select);
        let persisted = session.saved().to_config_string();
        assert!(persisted.contains("direction=ltr"));
        assert!(!persisted.contains("direction=rtl"));
        assert!(persisted.contains("multi_select=true"));
    }
}
