use crate::compiler_messages::compiler_warnings::CompilerWarning;
use rustc_hash::FxHashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

// The final set of errors and warnings emitted from the generator
#[derive(Debug, Default)]
pub struct CompilerMessages {
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerWarning>,
}

impl CompilerMessages {
    pub fn new() -> Self {
        CompilerMessages {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<CompilerError>) -> Self {
        CompilerMessages {
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl From<CompilerError> for CompilerMessages {
    fn from(error: CompilerError) -> Self {
        CompilerMessages::from_errors(vec![error])
    }
}

/// Where in the analysed program something went wrong.
///
/// The front end has already resolved everything to routines and source lines,
/// so this is all the context the generator can give back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramLocation {
    pub routine: Option<String>,
    pub line: u32,

    // Set for file and input errors
    pub file: Option<PathBuf>,
}

impl ProgramLocation {
    pub fn new(routine: Option<String>, line: u32) -> Self {
        ProgramLocation {
            routine,
            line,
            file: None,
        }
    }

    pub fn in_routine(routine: &str, line: u32) -> Self {
        ProgramLocation::new(Some(routine.to_owned()), line)
    }

    pub fn at_line(line: u32) -> Self {
        ProgramLocation::new(None, line)
    }

    pub fn in_file(path: &Path) -> Self {
        ProgramLocation {
            routine: None,
            line: 0,
            file: Some(path.to_path_buf()),
        }
    }
}

impl Display for ProgramLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if let Some(file) = &self.file {
            write!(f, "{}", file.display())?;
            if self.routine.is_some() || self.line > 0 {
                write!(f, ", ")?;
            }
        }

        match &self.routine {
            Some(routine) => write!(f, "routine '{}', line {}", routine, self.line),
            None if self.line > 0 => write!(f, "line {}", self.line),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy)]
pub enum ErrorMetaDataKey {
    CompilationStage,
    NodeKind,
    RoutineName,
}

#[derive(Debug)]
pub struct CompilerError {
    pub msg: String,
    pub location: ProgramLocation,
    pub error_type: ErrorType,

    // Structured detail for tooling that wants more than the message
    pub metadata: FxHashMap<ErrorMetaDataKey, String>,
}

impl CompilerError {
    pub fn new(msg: impl Into<String>, location: ProgramLocation, error_type: ErrorType) -> Self {
        CompilerError {
            msg: msg.into(),
            location,
            error_type,
            metadata: FxHashMap::default(),
        }
    }

    pub fn with_location(mut self, location: ProgramLocation) -> Self {
        self.location = location;
        self
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: impl Into<String>) {
        self.metadata.insert(key, value.into());
    }

    /// Malformed analyser output. Always a bug upstream, never recoverable here.
    pub fn malformed_program(msg: impl Into<String>, location: ProgramLocation) -> Self {
        CompilerError::new(msg, location, ErrorType::MalformedProgram)
    }

    /// Create a compiler error (internal bug, not user's fault)
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, ProgramLocation::default(), ErrorType::Compiler)
    }

    pub fn file_error(path: &Path, msg: impl Into<String>) -> Self {
        CompilerError::new(msg, ProgramLocation::in_file(path), ErrorType::File)
    }

    pub fn input_error(path: &Path, msg: impl Into<String>) -> Self {
        CompilerError::new(msg, ProgramLocation::in_file(path), ErrorType::Input)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, ProgramLocation::default(), ErrorType::Config)
    }
}

impl Display for CompilerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let location = self.location.to_string();
        if location.is_empty() {
            write!(f, "{}: {}", error_type_to_str(&self.error_type), self.msg)
        } else {
            write!(
                f,
                "{} ({}): {}",
                error_type_to_str(&self.error_type),
                location,
                self.msg
            )
        }
    }
}

impl std::error::Error for CompilerError {}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ErrorType {
    MalformedProgram,
    Input,
    File,
    Config,
    Compiler,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::MalformedProgram => "Malformed Program",
        ErrorType::Input => "Invalid Input",
        ErrorType::File => "File Error",
        ErrorType::Config => "Malformed Config",
        ErrorType::Compiler => "Compiler Bug",
    }
}

/// Returns a new CompilerError for malformed analyser output.
///
/// Usage:
/// `return_malformed_error!("or node needs two branches", location, {
///     NodeKind => "or",
///     CompilationStage => "Validation",
/// })`;
#[macro_export]
macro_rules! return_malformed_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::compiler_messages::compiler_errors::ErrorType::MalformedProgram,
            metadata: {
                let mut map = rustc_hash::FxHashMap::default();
                $(
                    map.insert(
                        $crate::compiler_messages::compiler_errors::ErrorMetaDataKey::$key,
                        String::from($value),
                    );
                )*
                map
            },
        })
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError::malformed_program(
            $msg, $location,
        ))
    };
}

/// Returns a new CompilerError for a config that doesn't make sense.
///
/// Usage: `return_config_error!("class_name must not be empty")`;
#[macro_export]
macro_rules! return_config_error {
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        return Err($crate::compiler_messages::compiler_errors::CompilerError::config_error(
            format!($fmt, $($arg),+),
        ));
    }};
    ($msg:expr) => {{
        return Err($crate::compiler_messages::compiler_errors::CompilerError::config_error(
            $msg,
        ));
    }};
}

/// Returns a new CompilerError for file system problems.
///
/// Usage: `return_file_error!(path, "message")`;
#[macro_export]
macro_rules! return_file_error {
    ($path:expr, $msg:expr) => {{
        return Err($crate::compiler_messages::compiler_errors::CompilerError::file_error(
            $path, $msg,
        ));
    }};
}
