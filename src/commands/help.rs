//! Help command implementation for daytime.
//!
//! Shows command-specific help or the command overview.

use anyhow::Result;

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("next") => super::next::display_help(),
        Some("simulate") => super::simulate::display_help(),
        Some("help") => display_help_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("(none)                        Run the service");
    log_indented!("next [--json]                 Show the current status and next transition");
    log_indented!("simulate <start> [end] [mult] Run the scheduler against simulated time");
    log_indented!("help [COMMAND]                Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'daytime help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'daytime --help' to see all options and general usage.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: daytime help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("daytime help");
    log_indented!("daytime help simulate");
    log_end!();
}
