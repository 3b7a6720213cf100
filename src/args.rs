//! Command-line argument parsing and processing.
//!
//! Arguments are parsed by hand into a [`CliAction`]. Flags may appear
//! anywhere on the line; the first positional argument selects the command.
//!
//! ```text
//! daytime [OPTIONS]                              run the service
//! daytime next [--json]                          print the next transition
//! daytime simulate <start> [end] [multiplier]    run against an accelerated clock
//! daytime help [COMMAND]                         command help
//! ```

use crate::common::constants::DEFAULT_SIMULATION_MULTIPLIER;
use crate::time_source::parse_datetime;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the service
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        dry_run: bool,
        log_file: Option<String>,
    },
    /// Print the current status and the next transition, then exit
    Next {
        debug_enabled: bool,
        config_dir: Option<String>,
        json: bool,
    },
    /// Run the scheduler against simulated time with the logging transport
    Simulate {
        debug_enabled: bool,
        config_dir: Option<String>,
        start_time: String,
        end_time: Option<String>,
        multiplier: f64,
        log_file: Option<String>,
    },
    /// Detailed help for a command, or the command overview
    Help { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to invalid arguments and exit with failure
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

fn invalid(message: String) -> ParsedArgs {
    log_warning!("{}", message);
    ParsedArgs {
        action: CliAction::ShowHelpDueToError,
    }
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut dry_run = false;
        let mut json = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut positionals: Vec<String> = Vec::new();

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut idx = 0;
        while idx < args_vec.len() {
            let arg = args_vec[idx].as_str();
            match arg {
                "--help" | "-h" => {
                    return ParsedArgs {
                        action: CliAction::ShowHelp,
                    };
                }
                "--version" | "-V" | "-v" => {
                    return ParsedArgs {
                        action: CliAction::ShowVersion,
                    };
                }
                "--debug" | "-d" => debug_enabled = true,
                "--dry-run" | "-n" => dry_run = true,
                "--json" | "-j" => json = true,
                "--config" | "-c" | "--log" | "-l" => {
                    let Some(value) = args_vec.get(idx + 1).filter(|v| !v.starts_with('-'))
                    else {
                        return invalid(format!("Missing value for {arg}"));
                    };
                    if matches!(arg, "--config" | "-c") {
                        config_dir = Some(value.clone());
                    } else {
                        log_file = Some(value.clone());
                    }
                    idx += 1;
                }
                _ if arg.starts_with('-') => {
                    return invalid(format!("Unknown option: {arg}"));
                }
                _ => positionals.push(arg.to_string()),
            }
            idx += 1;
        }

        let mut positionals = positionals.into_iter();
        let command = positionals.next();

        if json && command.as_deref() != Some("next") {
            return invalid("--json only applies to the 'next' command".to_string());
        }
        if dry_run && command.is_some() {
            return invalid("--dry-run only applies when running the service".to_string());
        }

        let action = match command.as_deref() {
            None => CliAction::Run {
                debug_enabled,
                config_dir,
                dry_run,
                log_file,
            },
            Some("next") => CliAction::Next {
                debug_enabled,
                config_dir,
                json,
            },
            Some("simulate") => {
                let Some(start_time) = positionals.next() else {
                    return invalid(
                        "Missing start time. Usage: daytime simulate <start> [end] [multiplier]"
                            .to_string(),
                    );
                };
                if let Err(e) = parse_datetime(&start_time) {
                    return invalid(format!("Invalid start time: {e}"));
                }

                let mut end_time = None;
                let mut multiplier = DEFAULT_SIMULATION_MULTIPLIER;
                for value in positionals.by_ref() {
                    if end_time.is_none() && parse_datetime(&value).is_ok() {
                        end_time = Some(value);
                        continue;
                    }
                    match value.parse::<f64>() {
                        Ok(m) if m.is_finite() && m > 0.0 => multiplier = m,
                        _ => {
                            return invalid(format!(
                                "Invalid simulate argument '{value}': expected an end time or a positive multiplier"
                            ));
                        }
                    }
                    break;
                }

                CliAction::Simulate {
                    debug_enabled,
                    config_dir,
                    start_time,
                    end_time,
                    multiplier,
                    log_file,
                }
            }
            Some("help") => CliAction::Help {
                command: positionals.next(),
            },
            Some(unknown) => return invalid(format!("Unknown command: {unknown}")),
        };

        if let Some(extra) = positionals.next() {
            return invalid(format!("Unexpected argument: {extra}"));
        }

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("daytime [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-n, --dry-run          Log messages instead of publishing them");
    log_indented!("-l, --log <file>       Write output to a file");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("next [--json]                   Show the current status and next transition");
    log_indented!("simulate <start> [end] [mult]   Run with simulated time");
    log_indented!("help [COMMAND]                  Show detailed help for a command");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        ParsedArgs::parse(std::iter::once("daytime").chain(args.iter().copied())).action
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(
            parse(&[]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
                dry_run: false,
                log_file: None,
            }
        );
    }

    #[test]
    fn test_parse_run_flags() {
        assert_eq!(
            parse(&["-d", "--config", "/tmp/daytime", "--dry-run", "--log", "out.log"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/daytime".to_string()),
                dry_run: true,
                log_file: Some("out.log".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["-h"]), CliAction::ShowHelp);
        assert_eq!(parse(&["--version"]), CliAction::ShowVersion);
        assert_eq!(parse(&["-V"]), CliAction::ShowVersion);
        // Help wins over whatever follows
        assert_eq!(parse(&["next", "--help", "--bogus"]), CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_next() {
        assert_eq!(
            parse(&["next", "--json", "-c", "conf"]),
            CliAction::Next {
                debug_enabled: false,
                config_dir: Some("conf".to_string()),
                json: true,
            }
        );
    }

    #[test]
    fn test_parse_simulate_defaults() {
        assert_eq!(
            parse(&["simulate", "2024-06-21 00:00:00"]),
            CliAction::Simulate {
                debug_enabled: false,
                config_dir: None,
                start_time: "2024-06-21 00:00:00".to_string(),
                end_time: None,
                multiplier: DEFAULT_SIMULATION_MULTIPLIER,
                log_file: None,
            }
        );
    }

    #[test]
    fn test_parse_simulate_end_and_multiplier() {
        assert_eq!(
            parse(&[
                "simulate",
                "2024-06-21 00:00:00",
                "2024-06-23 00:00:00",
                "7200",
                "--log",
                "sim.log"
            ]),
            CliAction::Simulate {
                debug_enabled: false,
                config_dir: None,
                start_time: "2024-06-21 00:00:00".to_string(),
                end_time: Some("2024-06-23 00:00:00".to_string()),
                multiplier: 7200.0,
                log_file: Some("sim.log".to_string()),
            }
        );

        match parse(&["simulate", "2024-06-21 00:00:00", "60"]) {
            CliAction::Simulate {
                end_time,
                multiplier,
                ..
            } => {
                assert_eq!(end_time, None);
                assert_eq!(multiplier, 60.0);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_parse_simulate_errors() {
        assert_eq!(parse(&["simulate"]), CliAction::ShowHelpDueToError);
        assert_eq!(
            parse(&["simulate", "tomorrow"]),
            CliAction::ShowHelpDueToError
        );
        assert_eq!(
            parse(&["simulate", "2024-06-21 00:00:00", "0"]),
            CliAction::ShowHelpDueToError
        );
        assert_eq!(
            parse(&["simulate", "2024-06-21 00:00:00", "60", "extra"]),
            CliAction::ShowHelpDueToError
        );
    }

    #[test]
    fn test_parse_help_command() {
        assert_eq!(parse(&["help"]), CliAction::Help { command: None });
        assert_eq!(
            parse(&["help", "next"]),
            CliAction::Help {
                command: Some("next".to_string())
            }
        );
    }

    #[test]
    fn test_parse_invalid_combinations() {
        assert_eq!(parse(&["--bogus"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["frobnicate"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--config"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["--json"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["next", "--dry-run"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["next", "now"]), CliAction::ShowHelpDueToError);
    }
}
