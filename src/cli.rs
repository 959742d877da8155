// ============================================================================
// PaintShell CLI: headless inspection of the tool surface
// ============================================================================
//
// Usage examples:
//   paintshell --list-tools
//   paintshell --describe brush --set size=6 --set shape=square
//   paintshell --select eraser,fill --multi --json
//   paintshell --config direction=rtl          (GUI, one-off setting override)
//
// No window is opened in CLI mode.  Everything runs against the same
// control surface the GUI uses, with the built-in tool catalog.

use std::collections::BTreeMap;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use crate::components::selection::Cardinality;
use crate::components::status::describe_tool_options;
use crate::components::tool_options::{ControlInput, OptionPanel, SettingsSink};
use crate::components::tool_settings::{SettingValue, SettingsRecord};
use crate::components::tools::{ToolCatalog, ToolDescriptor};
use crate::config::SessionConfig;
use crate::surface::ControlSurface;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// PaintShell headless mode.
///
/// Inspect tools, their option panels and the status line without the GUI.
#[derive(Parser, Debug, Default)]
#[command(
    name = "paintshell",
    about = "PaintShell tool surface inspector",
    long_about = "List the built-in tools, resolve option panels and status text\n\
                  for a tool with optional settings, or apply a selection and\n\
                  report the resulting active tool.\n\n\
                  Example:\n  \
                  paintshell --describe brush --set size=6 --set shape=square\n  \
                  paintshell --select eraser,fill --multi --json"
)]
pub struct CliArgs {
    /// Print the tool catalog in tool box order.
    #[arg(long)]
    pub list_tools: bool,

    /// Resolve the option panel and status summary for one tool id.
    #[arg(long, value_name = "TOOL")]
    pub describe: Option<String>,

    /// Setting override applied before describing (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE", requires = "describe")]
    pub set: Vec<String>,

    /// Apply a selection (comma separated ids) and report the result.
    #[arg(long, value_name = "IDS", value_delimiter = ',', num_args = 1..)]
    pub select: Vec<String>,

    /// Use a multi-select tool box for --select.
    #[arg(long)]
    pub multi: bool,

    /// Emit JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Override a saved setting for this launch (repeatable), e.g.
    /// `--config direction=rtl`.
    #[arg(long = "config", value_name = "KEY=VALUE")]
    pub config: Vec<String>,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| {
            a == "--list-tools" || a == "--describe" || a == "--select" || a == "--help" || a == "-h"
        })
    }

    /// Apply `--config` overrides on top of the loaded settings for this run
    /// only.  Bad pairs are logged and skipped.
    pub fn apply_config(&self, config: &mut SessionConfig) {
        for pair in &self.config {
            let Some((key, value)) = pair.split_once('=') else {
                log::warn!("Ignoring --config '{}': expected KEY=VALUE", pair);
                continue;
            };
            if let Err(e) = config.overlay(key.trim(), value.trim()) {
                log::warn!("Ignoring --config '{}': {}", pair, e);
            }
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Serialize, Debug, PartialEq)]
struct ToolReport {
    id: String,
    name: String,
    description: Option<String>,
    shortcut: Option<char>,
}

impl From<&ToolDescriptor> for ToolReport {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            id: tool.id.clone(),
            name: tool.name.clone(),
            description: tool.description.clone(),
            shortcut: tool.shortcut,
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
struct ControlReport {
    key: &'static str,
    label: &'static str,
    current: SettingValue,
    kind: &'static str,
    choices: Vec<SettingValue>,
    enabled: bool,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "panel", rename_all = "snake_case")]
enum PanelReport {
    Controls { controls: Vec<ControlReport> },
    NoOptions,
}

impl From<&OptionPanel> for PanelReport {
    fn from(panel: &OptionPanel) -> Self {
        match panel {
            OptionPanel::NoOptions => PanelReport::NoOptions,
            OptionPanel::Controls { controls, .. } => PanelReport::Controls {
                controls: controls
                    .iter()
                    .map(|control| {
                        let (kind, choices) = match &control.input {
                            ControlInput::Choice(choices) => {
                                ("choice", choices.iter().map(|c| c.value.clone()).collect())
                            }
                            ControlInput::Text => ("text", Vec::new()),
                            ControlInput::Integer { .. } => ("integer", Vec::new()),
                            ControlInput::Toggle { .. } => ("toggle", Vec::new()),
                        };
                        ControlReport {
                            key: control.key,
                            label: control.label,
                            current: control.current.clone(),
                            kind,
                            choices,
                            enabled: control.is_enabled(),
                        }
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Serialize, Debug)]
struct DescribeReport {
    tool: ToolReport,
    settings: SettingsRecord,
    summary: String,
    panel: PanelReport,
}

#[derive(Serialize, Debug)]
struct SelectReport {
    selection: Vec<String>,
    active_tool: Option<String>,
    status: String,
    panel: PanelReport,
    settings: BTreeMap<String, SettingsRecord>,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the requested report and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    let result = if args.list_tools {
        list_tools(args.json)
    } else if let Some(tool) = &args.describe {
        describe(tool, &args.set, args.json)
    } else if !args.select.is_empty() {
        select(&args.select, args.multi, args.json)
    } else {
        Err("nothing to do; pass --list-tools, --describe or --select".to_string())
    };
    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

fn list_tools(json: bool) -> Result<String, String> {
    let catalog = ToolCatalog::builtin();
    let tools: Vec<ToolReport> = catalog.iter().map(|t| ToolReport::from(t.as_ref())).collect();
    if json {
        return to_json(&tools);
    }
    Ok(tools
        .iter()
        .map(|t| {
            let shortcut = t.shortcut.map(String::from).unwrap_or_else(|| "-".to_string());
            format!("{:<20} {:<3} {}", t.id, shortcut, t.name)
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Parse `key=value` overrides into a record.
fn parse_overrides(pairs: &[String]) -> Result<SettingsRecord, String> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", pair))?;
            Ok((key.trim().to_string(), SettingValue::parse_literal(value)))
        })
        .collect()
}

fn describe(tool_id: &str, overrides: &[String], json: bool) -> Result<String, String> {
    let mut surface = ControlSurface::new(ToolCatalog::builtin(), Cardinality::Single, &[tool_id]);
    let tool = surface
        .catalog()
        .get(tool_id)
        .cloned()
        .ok_or_else(|| format!("unknown tool '{}'", tool_id))?;
    // Overrides go through the same control domains as the option panel.
    for (key, value) in parse_overrides(overrides)? {
        let panel = surface.option_panel();
        let control = panel
            .control(&key)
            .ok_or_else(|| format!("{} has no option '{}'", tool.id, key))?;
        let accepted = control
            .accept(value.clone())
            .ok_or_else(|| format!("'{}' is not a valid {} for {}", value, key, tool.id))?;
        surface.patch_settings(&tool.id, &SettingsRecord::from([(key, accepted)]));
    }

    let settings = surface.settings(&tool.id);
    let report = DescribeReport {
        tool: ToolReport::from(tool.as_ref()),
        summary: describe_tool_options(&tool.id, &settings),
        panel: PanelReport::from(&surface.option_panel()),
        settings,
    };
    if json {
        return to_json(&report);
    }

    let mut out = format!(
        "{} ({})\n  {}\n",
        report.tool.name,
        report.tool.id,
        report.tool.description.as_deref().unwrap_or("")
    );
    out.push_str(&format!("  summary: {}\n", report.summary));
    for (key, value) in &report.settings {
        out.push_str(&format!("  {} = {}\n", key, value));
    }
    out.push_str(&panel_text(&report.panel));
    Ok(out.trim_end().to_string())
}

fn select(ids: &[String], multi: bool, json: bool) -> Result<String, String> {
    let cardinality = if multi { Cardinality::Multi } else { Cardinality::Single };
    let mut surface = ControlSurface::new(ToolCatalog::builtin(), cardinality, &[]);
    surface.set_selection(ids);

    let report = SelectReport {
        selection: surface.selection().to_vec(),
        active_tool: surface.active_tool().map(|t| t.id.clone()),
        status: surface.status_text().to_string(),
        panel: PanelReport::from(&surface.option_panel()),
        settings: surface.all_settings(),
    };
    if json {
        return to_json(&report);
    }

    let mut out = format!("selection: {}\n", report.selection.join(", "));
    out.push_str(&format!(
        "active: {}\n",
        report.active_tool.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("status: {}\n", report.status));
    out.push_str(&panel_text(&report.panel));
    Ok(out.trim_end().to_string())
}

fn panel_text(panel: &PanelReport) -> String {
    match panel {
        PanelReport::NoOptions => "  options: none\n".to_string(),
        PanelReport::Controls { controls } => {
            let mut out = String::from("  options:\n");
            for control in controls {
                let choices = control
                    .choices
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("|");
                let disabled = if control.enabled { "" } else { " (disabled)" };
                out.push_str(&format!(
                    "    {:<14} {:<8} {}{}{}\n",
                    control.key,
                    control.kind,
                    control.current,
                    if choices.is_empty() { String::new() } else { format!(" [{}]", choices) },
                    disabled
                ));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;

    #[test]
    fn test_cli_flags_parse() {
        let args = CliArgs::try_parse_from([
            "paintshell", "--describe", "brush", "--set", "size=6", "--set", "shape=square",
        ])
        .expect("valid arguments");
        assert_eq!(args.describe.as_deref(), Some("brush"));
        assert_eq!(args.set, vec!["size=6", "shape=square"]);

        let args = CliArgs::try_parse_from(["paintshell", "--select", "eraser,fill", "--multi"])
            .expect("valid arguments");
        assert_eq!(args.select, vec!["eraser", "fill"]);

        assert!(CliArgs::try_parse_from(["paintshell", "--set", "size=6"]).is_err());
    }

    #[test]
    fn test_config_overrides_apply_to_settings() {
        let args = CliArgs::try_parse_from([
            "paintshell", "--config", "direction=rtl", "--config", "docked=sideways", "--config", "junk",
        ])
        .expect("valid arguments");
        let mut config = SessionConfig::default();
        args.apply_config(&mut config);
        assert_eq!(config.effective().presentation.direction, crate::components::frame::Direction::Rtl);
        assert!(config.effective().presentation.docked);
        assert_eq!(config.saved(), &ShellConfig::default());
    }

    #[test]
    fn test_describe_applies_overrides() {
        let out = describe("brush", &["size=6".into(), "shape=square".into()], false)
            .expect("brush is a known tool");
        assert!(out.contains("summary: Brush 6px Square"));
        assert!(describe("laser", &[], false).is_err());
        assert!(describe("brush", &["size".into()], false).is_err());
    }

    #[test]
    fn test_describe_rejects_values_outside_control_domain() {
        let err = describe("brush", &["size=7".into()], false).expect_err("7 is not a brush size");
        assert!(err.contains("size"));
        assert!(describe("brush", &["shape=star".into()], false).is_err());
        assert!(describe("pencil", &["zoom=4".into()], false).is_err());
        assert!(describe("fill", &["size=4".into()], false).is_err());

        let out = describe("text", &["size=500".into(), "family=Georgia".into()], true)
            .expect("clamped font size is accepted");
        let value: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(value["settings"]["size"], 200);
        assert_eq!(value["settings"]["family"], "Georgia");
    }

    #[test]
    fn test_select_reports_active_tool_json() {
        let out = select(&["eraser".into(), "fill".into()], true, true).expect("json output");
        let value: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(value["selection"], serde_json::json!(["eraser", "fill"]));
        assert_eq!(value["active_tool"], "eraser");
        assert_eq!(value["panel"]["panel"], "controls");
        assert_eq!(value["panel"]["controls"][0]["key"], "size");
        assert_eq!(value["panel"]["controls"][0]["choices"], serde_json::json!([4, 8, 16]));
    }

    #[test]
    fn test_tool_without_options_reports_none() {
        let out = describe("fill", &[], true).expect("json output");
        let value: serde_json::Value = serde_json::from_str(&out).expect("valid json");
        assert_eq!(value["panel"]["panel"], "no_options");
        assert_eq!(value["summary"], "");
    }
}
