// GUI-subsystem binary: no console window is ever allocated by Windows.
// In CLI mode we attach to the launching terminal so println!/eprintln!
// reach it.
#![windows_subsystem = "windows"]

use clap::Parser;
use eframe::egui;

use paintshell::app::PaintShellApp;
use paintshell::bridge::shell;
use paintshell::cli::{self, CliArgs};
use paintshell::config::{SessionConfig, ShellConfig};
use paintshell::logger;

fn main() -> Result<(), eframe::Error> {
    shell::mark_process_start();

    // -- Windows console management ------------------------------------
    #[cfg(target_os = "windows")]
    if CliArgs::is_cli_mode() {
        unsafe extern "system" {
            fn AttachConsole(dwProcessId: u32) -> i32;
        }
        const ATTACH_PARENT_PROCESS: u32 = 0xFFFF_FFFF;
        unsafe {
            AttachConsole(ATTACH_PARENT_PROCESS);
        }
    }

    let args = CliArgs::parse();

    // -- CLI / headless mode ---------------------------------------------
    if CliArgs::is_cli_mode() {
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------
    // Initialize session log first so settings warnings reach it
    // (overwrites previous session log)
    logger::init(log::LevelFilter::Info);

    let mut config = SessionConfig::new(ShellConfig::load());
    args.apply_config(&mut config);
    logger::set_level(config.effective().log_level);
    if let Some(path) = ShellConfig::settings_path() {
        log::info!("Settings file: {}", path.display());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 640.0])
            .with_title("PaintShell"),
        ..Default::default()
    };

    eframe::run_native(
        "PaintShell",
        options,
        Box::new(|cc| Box::new(PaintShellApp::new(cc, config))),
    )
}
