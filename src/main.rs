use std::process::ExitCode;

fn main() -> ExitCode {
    patternc::cli::start_cli()
}
