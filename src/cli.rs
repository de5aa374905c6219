//! Command-line entrypoint for the pattern program generator.
//!
//! Parses the command and flags, resolves the generator config and dispatches into the
//! build pipeline.

use crate::Flag;
use crate::build_system::core_build::{build_program_file, check_program_file};
use crate::compiler_messages::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_messages::display_messages::print_compiler_messages;
use crate::settings::{CONFIG_FILE_NAME, GeneratorConfig};
use saying::say;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    // Generates the PHP class for a program, to a file or stdout
    Build {
        input: String,
        output: Option<String>,
    },

    // Validates and generates without writing anything
    Check(String),

    Help,
}

pub fn start_cli() -> ExitCode {
    let compiler_args: Vec<String> = env::args().collect();

    if compiler_args.len() < 2 {
        print_help(true);
        return ExitCode::SUCCESS;
    }

    let command = match get_command(&compiler_args[1..]) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return ExitCode::FAILURE;
        }
    };

    let flags = get_flags(&compiler_args);

    let config = match resolve_config(&compiler_args, &flags) {
        Ok(config) => config,
        Err(e) => return report(CompilerMessages::from(e)),
    };

    match command {
        Command::Help => {
            print_help(false);
            ExitCode::SUCCESS
        }

        Command::Build { input, output } => {
            let messages = build_program_file(
                Path::new(&input),
                output.as_deref().map(Path::new),
                &config,
                &flags,
            );
            report(messages)
        }

        Command::Check(input) => {
            let messages = check_program_file(Path::new(&input), &config, &flags);
            if !messages.has_errors() {
                say!(Green "No problems found in ", input);
            }
            report(messages)
        }
    }
}

fn report(messages: CompilerMessages) -> ExitCode {
    let failed = messages.has_errors();
    print_compiler_messages(messages);

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn get_command(args: &[String]) -> Result<Command, String> {
    let command = args.first().map(String::as_str);

    match command {
        Some("help") | Some("--help") => Ok(Command::Help),

        Some("build") => {
            let mut input = None;
            let mut output = None;
            let mut index = 1usize;

            while let Some(arg) = args.get(index) {
                match arg.as_str() {
                    "-o" | "--output" => {
                        let Some(path) = args.get(index + 1) else {
                            return Err(format!("Missing value for {}", arg));
                        };
                        if path.starts_with("--") {
                            return Err(format!("Missing value for {}", arg));
                        }
                        output = Some(path.to_owned());
                        index += 2;
                    }
                    "--config" => index += 2,
                    _ if arg.starts_with("--") => index += 1,
                    _ => {
                        if input.is_some() {
                            return Err(String::from(
                                "Build command accepts exactly one program file.",
                            ));
                        }
                        input = Some(arg.to_owned());
                        index += 1;
                    }
                }
            }

            match input {
                Some(input) => Ok(Command::Build { input, output }),
                None => Err(String::from("Missing program file (try 'patc build program.json')")),
            }
        }

        Some("check") => match first_path_argument(&args[1..]) {
            Some(path) => Ok(Command::Check(path)),
            None => Err(String::from("Missing program file (try 'patc check program.json')")),
        },

        Some(other) => Err(format!("Invalid command: '{}'", other)),
        None => Err(String::from("Missing command")),
    }
}

fn first_path_argument(args: &[String]) -> Option<String> {
    let mut index = 0usize;
    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "--config" | "-o" | "--output" => index += 2,
            _ if arg.starts_with("--") => index += 1,
            _ => return Some(arg.to_owned()),
        }
    }

    None
}

fn get_flags(args: &[String]) -> Vec<Flag> {
    let mut flags = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--hide-warnings" => flags.push(Flag::DisableWarnings),
            "--hide-timers" => flags.push(Flag::DisableTimers),
            "--comments" => flags.push(Flag::Comments),
            "--infer-cursor-usage" => flags.push(Flag::InferCursorUsage),
            _ => {}
        }
    }

    flags
}

fn get_config_path(args: &[String]) -> Result<Option<PathBuf>, String> {
    let Some(index) = args.iter().position(|arg| arg == "--config") else {
        return Ok(None);
    };

    match args.get(index + 1) {
        Some(path) if !path.starts_with("--") => Ok(Some(PathBuf::from(path))),
        _ => Err(String::from("Missing value for --config")),
    }
}

/// Config file (explicit, or `patternc.toml` in the working directory), then flags on top.
fn resolve_config(args: &[String], flags: &[Flag]) -> Result<GeneratorConfig, CompilerError> {
    let explicit = get_config_path(args).map_err(CompilerError::config_error)?;

    let mut config = match explicit {
        Some(path) => GeneratorConfig::load(&path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE_NAME);
            if default_path.is_file() {
                GeneratorConfig::load(default_path)?
            } else {
                GeneratorConfig::default()
            }
        }
    };

    apply_flags(&mut config, flags);
    Ok(config)
}

fn apply_flags(config: &mut GeneratorConfig, flags: &[Flag]) {
    if flags.contains(&Flag::Comments) {
        config.comments = true;
    }

    if flags.contains(&Flag::InferCursorUsage) {
        config.infer_cursor_usage = true;
    }
}

fn print_help(commands_only: bool) {
    if !commands_only {
        say!(Bright Black "------------------------------------");
        say!(Green Bold "patc - generates PHP classes from analysed pattern programs");
        say!("Usage: ", Bold "<command>", Italic " <args>");
    }
    say!(Green Bold "\nCommands:");
    say!("  build <program.json> [-o <out.php>]  - Generates the PHP class");
    say!("  check <program.json>                 - Validates and generates without output");
    say!("  help                                 - Shows this message");

    say!(Green Bold "\nFlags:");
    say!("  --comments             (annotate the output with source lines)");
    say!("  --infer-cursor-usage   (recompute cursor save/restore predicates)");
    say!("  --config <file>        (default: ", CONFIG_FILE_NAME, " when present)");
    say!("  --hide-warnings");
    say!("  --hide-timers");
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
