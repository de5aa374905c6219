//! Structural checks on the analyser output.
//!
//! Anything rejected here is a bug in whatever produced the program, so every problem is
//! reported as a malformed program and generation never starts.

use crate::compiler_messages::compiler_errors::{
    CompilerError, ErrorMetaDataKey, ProgramLocation,
};
use crate::program::ast_nodes::{Address, Ae, Node, NodeKind};
use crate::program::program::{AmongId, NameId, NameKind, Program};

const MAX_CODEPOINT: u32 = char::MAX as u32;

/// Validate the whole program, returning every problem found.
pub fn validate_program(program: &Program) -> Vec<CompilerError> {
    let mut validator = Validator {
        program,
        routine: None,
        errors: Vec::new(),
    };

    validator.check_groupings();

    for definition in &program.definitions {
        validator.check_definition(definition);
    }

    for (index, among) in program.amongs.iter().enumerate() {
        validator.routine = None;
        for entry in &among.entries {
            if let Some(function) = entry.function {
                validator.expect_callable(function, among.line, "among");
            }

            let result_in_range = entry.result >= 0 && entry.result as usize <= among.commands.len();
            if !result_in_range {
                validator.push(
                    format!(
                        "among table {} entry \"{}\" selects outcome {} but the table has {} commands",
                        index,
                        entry.text,
                        entry.result,
                        among.commands.len()
                    ),
                    among.line,
                    "among",
                );
            }
        }

        let needs_dispatch = match among.commands.len() {
            0 => false,
            1 => among.no_outcome_branch,
            _ => true,
        };
        if needs_dispatch && !among.result_used {
            validator.push(
                format!(
                    "among table {} dispatches on its result but the result is marked unused",
                    index
                ),
                among.line,
                "among",
            );
        }

        for command in &among.commands {
            validator.check_node(command);
        }
    }

    validator.errors
}

struct Validator<'prog> {
    program: &'prog Program,
    routine: Option<String>,
    errors: Vec<CompilerError>,
}

impl<'prog> Validator<'prog> {
    fn push(&mut self, msg: String, line: u32, node_kind: &str) {
        let mut error = CompilerError::malformed_program(
            msg,
            ProgramLocation::new(self.routine.clone(), line),
        );
        error.new_metadata_entry(ErrorMetaDataKey::NodeKind, node_kind);
        error.new_metadata_entry(ErrorMetaDataKey::CompilationStage, "Validation");
        if let Some(routine) = &self.routine {
            error.new_metadata_entry(ErrorMetaDataKey::RoutineName, routine.as_str());
        }
        self.errors.push(error);
    }

    fn check_groupings(&mut self) {
        for grouping in &self.program.groupings {
            let Some(name) = self.program.names.get(grouping.name.0 as usize) else {
                self.push(
                    format!("grouping refers to unknown name id {}", grouping.name.0),
                    0,
                    "grouping",
                );
                continue;
            };

            if name.kind != NameKind::Grouping {
                self.push(
                    format!("'{}' is described as a grouping but isn't one", name.name),
                    0,
                    "grouping",
                );
            }

            if grouping.smallest_ch > grouping.largest_ch {
                self.push(
                    format!(
                        "grouping '{}' has an empty range {}..{}",
                        name.name, grouping.smallest_ch, grouping.largest_ch
                    ),
                    0,
                    "grouping",
                );
                continue;
            }

            if grouping.largest_ch > MAX_CODEPOINT {
                self.push(
                    format!(
                        "grouping '{}' reaches character {} which is past the last code point",
                        name.name, grouping.largest_ch
                    ),
                    0,
                    "grouping",
                );
                continue;
            }

            let outside = grouping
                .members
                .iter()
                .find(|ch| **ch < grouping.smallest_ch || **ch > grouping.largest_ch);
            if let Some(ch) = outside {
                self.push(
                    format!(
                        "grouping '{}' contains character {} outside its range {}..{}",
                        name.name, ch, grouping.smallest_ch, grouping.largest_ch
                    ),
                    0,
                    "grouping",
                );
            }
        }
    }

    fn check_definition(&mut self, definition: &Node) {
        let NodeKind::Define { routine, body } = &definition.kind else {
            self.routine = None;
            self.push(
                format!(
                    "only routine definitions can appear at the top level, found '{}'",
                    definition.kind.keyword()
                ),
                definition.line,
                definition.kind.keyword(),
            );
            return;
        };

        self.routine = self
            .program
            .names
            .get(routine.0 as usize)
            .map(|name| name.name.clone());
        self.expect_callable(*routine, definition.line, "define");
        self.check_node(body);
    }

    fn check_node(&mut self, node: &Node) {
        let keyword = node.kind.keyword();

        match &node.kind {
            NodeKind::Define { .. } => {
                self.push(
                    "routine definitions can't be nested".to_owned(),
                    node.line,
                    keyword,
                );
                return;
            }

            NodeKind::Or(branches) if branches.len() < 2 => {
                self.push(
                    format!("'or' needs at least two branches, found {}", branches.len()),
                    node.line,
                    keyword,
                );
            }

            NodeKind::GroupingSearch { grouping, .. } | NodeKind::Grouping { grouping, .. } => {
                self.expect_grouping(*grouping, node.line, keyword);
            }

            NodeKind::Loop { count, .. } | NodeKind::AtLeast { count, .. } => {
                self.check_ae(count, node.line, keyword);
            }

            NodeKind::ToMark(ae) | NodeKind::AtMark(ae) | NodeKind::Hop(ae) => {
                self.check_ae(ae, node.line, keyword);
            }

            NodeKind::SetMark(name) => {
                self.expect_kind(*name, NameKind::Integer, node.line, keyword);
            }

            NodeKind::AssignTo(name) | NodeKind::SliceTo(name) | NodeKind::NamedString(name) => {
                self.expect_kind(*name, NameKind::String, node.line, keyword);
            }

            NodeKind::AssignFrom(address)
            | NodeKind::SliceFrom(address)
            | NodeKind::Insert { text: address, .. } => {
                if let Address::Variable(name) = address {
                    self.expect_kind(*name, NameKind::String, node.line, keyword);
                }
            }

            NodeKind::Dollar { variable, .. } => {
                self.expect_kind(*variable, NameKind::String, node.line, keyword);
            }

            NodeKind::IntegerAssign {
                variable, value, ..
            } => {
                self.expect_kind(*variable, NameKind::Integer, node.line, keyword);
                self.check_ae(value, node.line, keyword);
            }

            NodeKind::IntegerTest { left, right, .. } => {
                self.check_ae(left, node.line, keyword);
                self.check_ae(right, node.line, keyword);
            }

            NodeKind::Call(name) => {
                self.expect_callable(*name, node.line, keyword);
            }

            NodeKind::Among(among) | NodeKind::Substring(among) => {
                self.expect_among(*among, node.line, keyword);
            }

            NodeKind::BoolTest { flag: name, .. } | NodeKind::Set(name) | NodeKind::Unset(name) => {
                self.expect_kind(*name, NameKind::Boolean, node.line, keyword);
            }

            _ => {}
        }

        for child in node.kind.children() {
            self.check_node(child);
        }
    }

    fn check_ae(&mut self, ae: &Ae, line: u32, keyword: &str) {
        match ae {
            Ae::Name(name) => self.expect_kind(*name, NameKind::Integer, line, keyword),
            Ae::LenOf(name) | Ae::SizeOf(name) => {
                self.expect_kind(*name, NameKind::String, line, keyword)
            }
            Ae::Neg(inner) => self.check_ae(inner, line, keyword),
            Ae::Binary { left, right, .. } => {
                self.check_ae(left, line, keyword);
                self.check_ae(right, line, keyword);
            }
            _ => {}
        }
    }

    fn expect_kind(&mut self, id: NameId, expected: NameKind, line: u32, keyword: &str) {
        let Some(name) = self.program.names.get(id.0 as usize) else {
            self.push(format!("unknown name id {}", id.0), line, keyword);
            return;
        };

        if name.kind != expected {
            self.push(
                format!(
                    "'{}' is used as {:?} but was declared as {:?}",
                    name.name, expected, name.kind
                ),
                line,
                keyword,
            );
        }
    }

    fn expect_callable(&mut self, id: NameId, line: u32, keyword: &str) {
        let Some(name) = self.program.names.get(id.0 as usize) else {
            self.push(format!("unknown name id {}", id.0), line, keyword);
            return;
        };

        if !name.kind.is_callable() {
            self.push(
                format!("'{}' is not a routine (declared as {:?})", name.name, name.kind),
                line,
                keyword,
            );
        }
    }

    fn expect_grouping(&mut self, id: NameId, line: u32, keyword: &str) {
        self.expect_kind(id, NameKind::Grouping, line, keyword);
        if self.program.grouping_for(id).is_none() {
            self.push(
                format!("grouping name id {} has no character table", id.0),
                line,
                keyword,
            );
        }
    }

    fn expect_among(&mut self, id: AmongId, line: u32, keyword: &str) {
        if self.program.amongs.get(id.0 as usize).is_none() {
            self.push(format!("unknown among table {}", id.0), line, keyword);
        }
    }
}
