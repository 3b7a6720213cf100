//! Main application entry point and high-level flow coordination.
//!
//! Parses the command line and dispatches to the service runner or one of the
//! one-shot commands. Errors are reported through the logger and turn into a
//! failing exit code.

use anyhow::Result;

use daytime::Daytime;
use daytime::args::{self, CliAction, ParsedArgs};
use daytime::commands;
use daytime::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use daytime::config;
use daytime::logger::Log;

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let code = match dispatch(parsed_args.action) {
        Ok(code) => code,
        Err(e) => {
            Log::set_enabled(true);
            daytime::log_error_exit!("{:#}", e);
            EXIT_FAILURE
        }
    };

    std::process::exit(code);
}

fn dispatch(action: CliAction) -> Result<i32> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(EXIT_SUCCESS)
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(EXIT_SUCCESS)
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(EXIT_FAILURE)
        }
        CliAction::Help { command } => {
            commands::help::run_help_command(command.as_deref())?;
            Ok(EXIT_SUCCESS)
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            dry_run,
            log_file,
        } => {
            config::set_config_dir(config_dir)?;
            // Keep the guard alive until the service has shut down
            let _log_guard = log_file.map(Log::start_file_logging).transpose()?;

            let mut app = Daytime::new(debug_enabled);
            if dry_run {
                app = app.dry_run();
            }
            app.run()?;
            Ok(EXIT_SUCCESS)
        }
        CliAction::Next {
            debug_enabled,
            config_dir,
            json,
        } => {
            config::set_config_dir(config_dir)?;
            commands::next::run_next_command(debug_enabled, json)?;
            Ok(EXIT_SUCCESS)
        }
        CliAction::Simulate {
            debug_enabled,
            config_dir,
            start_time,
            end_time,
            multiplier,
            log_file,
        } => {
            config::set_config_dir(config_dir)?;
            let _log_guard = log_file.map(Log::start_file_logging).transpose()?;

            commands::simulate::run_simulate_command(
                &start_time,
                end_time.as_deref(),
                multiplier,
                debug_enabled,
            )?;
            Ok(EXIT_SUCCESS)
        }
    }
}
