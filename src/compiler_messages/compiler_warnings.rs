use crate::compiler_messages::compiler_errors::ProgramLocation;
use saying::say;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerWarning {
    pub msg: String,
    pub location: ProgramLocation,
    pub warning_kind: WarningKind,
}

impl CompilerWarning {
    pub fn new(msg: &str, location: ProgramLocation, warning_kind: WarningKind) -> CompilerWarning {
        CompilerWarning {
            msg: msg.to_owned(),
            location,
            warning_kind,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    UnusedRoutine,
    UnusedGrouping,
}

pub fn print_formatted_warning(w: CompilerWarning) {
    say!(Yellow "WARNING: ");
    match w.warning_kind {
        WarningKind::UnusedRoutine => {
            say!("Unused routine '", Bright {w.msg.as_str()}, "' was not generated");
        }
        WarningKind::UnusedGrouping => {
            say!("Unused grouping '", Bright {w.msg.as_str()}, "' has no table");
        }
    }
}
