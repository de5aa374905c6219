//! The analysed program: symbol tables plus the top level routine definitions.

use crate::compiler_messages::compiler_errors::CompilerError;
use crate::program::ast_nodes::{Node, NodeKind};
use serde::{Deserialize, Serialize};

/// Index into `Program::names`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameId(pub u32);

/// Index into `Program::amongs`. This is also the table number in the generated class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmongId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    String,
    Boolean,
    Integer,
    Routine,
    External,
    Grouping,
}

impl NameKind {
    /// Field/method prefix in the generated class. Externals keep their own name.
    pub fn prefix(self) -> &'static str {
        match self {
            NameKind::String => "S_",
            NameKind::Boolean => "B_",
            NameKind::Integer => "I_",
            NameKind::Routine => "r_",
            NameKind::External => "",
            NameKind::Grouping => "g_",
        }
    }

    pub fn is_callable(self) -> bool {
        matches!(self, NameKind::Routine | NameKind::External)
    }
}

/// What the analyser proved about a routine's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signals {
    AlwaysSucceeds,
    AlwaysFails,
    #[default]
    Either,
}

fn default_used() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub name: String,
    pub kind: NameKind,

    #[serde(default = "default_used")]
    pub used: bool,

    #[serde(default)]
    pub signals: Signals,
}

impl Name {
    pub fn new(name: &str, kind: NameKind) -> Self {
        Name {
            name: name.to_owned(),
            kind,
            used: true,
            signals: Signals::Either,
        }
    }

    pub fn unused(mut self) -> Self {
        self.used = false;
        self
    }

    pub fn with_signals(mut self, signals: Signals) -> Self {
        self.signals = signals;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmongEntry {
    pub text: String,

    /// Index of the longest entry that is a prefix (or suffix in backward mode) of this one, or -1.
    pub substring_index: i32,
    pub result: i32,

    #[serde(default)]
    pub function: Option<NameId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Among {
    /// The lookup happens in an earlier `substring` node, not at the `among` itself.
    #[serde(default)]
    pub separate_substring: bool,

    /// `$among_var` is read by the dispatch.
    #[serde(default)]
    pub result_used: bool,

    #[serde(default)]
    pub always_matches: bool,

    /// Some entries carry no command, so a match can leave the dispatch without running one.
    #[serde(default)]
    pub no_outcome_branch: bool,

    /// Outcome commands, selected by `result` (1 based).
    #[serde(default)]
    pub commands: Vec<Node>,

    pub entries: Vec<AmongEntry>,

    #[serde(default)]
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub name: NameId,
    pub smallest_ch: u32,
    pub largest_ch: u32,
    pub members: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub names: Vec<Name>,

    #[serde(default)]
    pub amongs: Vec<Among>,

    #[serde(default)]
    pub groupings: Vec<Grouping>,

    pub definitions: Vec<Node>,
}

impl Program {
    pub fn name(&self, id: NameId) -> Result<&Name, CompilerError> {
        self.names.get(id.0 as usize).ok_or_else(|| {
            CompilerError::compiler_error(format!("PHP backend: unknown name id {}", id.0))
        })
    }

    pub fn among(&self, id: AmongId) -> Result<&Among, CompilerError> {
        self.amongs.get(id.0 as usize).ok_or_else(|| {
            CompilerError::compiler_error(format!("PHP backend: unknown among table {}", id.0))
        })
    }

    pub fn grouping_for(&self, name: NameId) -> Option<&Grouping> {
        self.groupings.iter().find(|grouping| grouping.name == name)
    }

    /// Body of the routine defined under `name`, if the program defines one.
    pub fn routine_body(&self, name: NameId) -> Option<&Node> {
        self.definitions
            .iter()
            .find_map(|definition| match &definition.kind {
                NodeKind::Define { routine, body } if *routine == name => Some(body.as_ref()),
                _ => None,
            })
    }

    /// Decode the analyser output from JSON.
    pub fn from_json(source: &str) -> Result<Program, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
