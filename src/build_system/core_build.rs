// The generation pipeline shared by the library API and the command line:
// - Decode the analysed program
// - Validate it
// - Optionally recompute the cursor predicates
// - Generate the PHP class

use crate::Flag;
use crate::backends::php::{PhpUnit, lower_program_to_php};
use crate::compiler_messages::compiler_errors::{CompilerError, CompilerMessages};
use crate::program::cursor_usage::annotate_cursor_usage;
use crate::program::program::Program;
use crate::program::validation::validate_program;
use crate::settings::GeneratorConfig;
use crate::{program_log, return_file_error, timer_log};
use saying::say;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Validate `program` and lower it to a PHP class.
pub fn generate_php(program: &Program, config: &GeneratorConfig) -> Result<PhpUnit, CompilerMessages> {
    let time = Instant::now();
    let errors = validate_program(program);
    if !errors.is_empty() {
        return Err(CompilerMessages::from_errors(errors));
    }
    timer_log!(time, "Program validated in: ");

    let annotated;
    let program = if config.infer_cursor_usage {
        let time = Instant::now();
        annotated = annotate_cursor_usage(program);
        timer_log!(time, "Cursor usage inferred in: ");
        &annotated
    } else {
        program
    };

    program_log!("Definitions: ", Green #program.definitions.len());
    program_log!("Among tables: ", Green #program.amongs.len());

    let time = Instant::now();
    let unit = lower_program_to_php(program, config)?;
    timer_log!(time, "PHP generated in: ");

    Ok(unit)
}

pub fn read_program(path: &Path) -> Result<Program, CompilerError> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => return_file_error!(path, e.to_string()),
    };

    Program::from_json(&source).map_err(|e| CompilerError::input_error(path, e.to_string()))
}

/// Generate the class for the program in `input`.
/// Without an output path the class goes to stdout and nothing else is printed there.
pub fn build_program_file(
    input: &Path,
    output: Option<&Path>,
    config: &GeneratorConfig,
    flags: &[Flag],
) -> CompilerMessages {
    let time = Instant::now();

    let program = match read_program(input) {
        Ok(program) => program,
        Err(e) => return e.into(),
    };

    let unit = match generate_php(&program, config) {
        Ok(unit) => unit,
        Err(messages) => return messages,
    };

    match output {
        Some(path) => {
            if let Err(e) = fs::write(path, &unit.source) {
                return CompilerError::file_error(path, e.to_string()).into();
            }

            if !flags.contains(&Flag::DisableTimers) {
                say!("Generated ", Bright #unit.routine_names.len(), " methods in: ", Green #time.elapsed());
            }
        }
        None => print!("{}", unit.source),
    }

    collect_warnings(unit, flags)
}

/// Run everything except writing the output.
pub fn check_program_file(input: &Path, config: &GeneratorConfig, flags: &[Flag]) -> CompilerMessages {
    let program = match read_program(input) {
        Ok(program) => program,
        Err(e) => return e.into(),
    };

    match generate_php(&program, config) {
        Ok(unit) => collect_warnings(unit, flags),
        Err(messages) => messages,
    }
}

fn collect_warnings(unit: PhpUnit, flags: &[Flag]) -> CompilerMessages {
    let mut messages = CompilerMessages::new();
    if !flags.contains(&Flag::DisableWarnings) {
        messages.warnings = unit.warnings;
    }
    messages
}
