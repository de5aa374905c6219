//! Generates PHP classes from analysed backtracking pattern programs.
//!
//! The input is the front end's output: a tree of pattern combinators plus the symbol,
//! among and grouping tables. The output is one PHP class with a method per routine,
//! where failure is threaded through the code as `goto`s and early returns.

pub mod backends;
pub mod cli;
pub mod settings;

pub mod build_system {
    pub mod core_build;
}

pub mod compiler_messages {
    pub mod compiler_dev_logging;
    pub mod compiler_errors;
    pub mod compiler_warnings;
    pub mod display_messages;
}

pub mod program {
    pub mod ast_nodes;
    pub mod cursor_usage;
    #[allow(clippy::module_inception)]
    pub mod program;
    pub mod validation;

    #[cfg(test)]
    mod tests;
}

pub use backends::php::{PhpUnit, lower_program_to_php};
pub use build_system::core_build::generate_php;
pub use compiler_messages::compiler_errors::{CompilerError, CompilerMessages, ErrorType};
pub use program::program::Program;
pub use settings::GeneratorConfig;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Flag {
    DisableWarnings,
    DisableTimers,
    Comments,
    InferCursorUsage,
}
