use crate::backends::php::continuation::{Continuation, FailTarget, Reach};
use crate::compiler_messages::compiler_errors::{CompilerError, ErrorMetaDataKey, ProgramLocation};
use crate::program::ast_nodes::{Mode, Node};
use crate::program::program::{NameId, Program};
use crate::settings::{GeneratorConfig, ROUTINE_OUTPUT_CAPACITY};
use rustc_hash::FxHashSet;

/// Translation state for a single routine.
///
/// Created fresh for every routine, so label and variable numbering restarts at zero and
/// routines can be translated independently of each other.
pub(crate) struct RoutineEmitter<'prog> {
    pub(crate) program: &'prog Program,
    pub(crate) config: &'prog GeneratorConfig,
    pub(crate) routine_name: String,

    pub(crate) out: String,
    pub(crate) margin: usize,

    next_label: u32,
    var_number: u32,
    keep_count: u32,
    next_debug_id: u32,

    // Labels that some emitted `goto` refers to
    jump_targets: FxHashSet<u32>,
}

impl<'prog> RoutineEmitter<'prog> {
    pub(crate) fn new(
        program: &'prog Program,
        config: &'prog GeneratorConfig,
        routine_name: &str,
        first_debug_id: u32,
    ) -> Self {
        Self {
            program,
            config,
            routine_name: routine_name.to_owned(),
            out: String::with_capacity(ROUTINE_OUTPUT_CAPACITY),
            // Methods sit one level inside the class body
            margin: 1,
            next_label: 0,
            var_number: 0,
            keep_count: 0,
            next_debug_id: first_debug_id,
            jump_targets: FxHashSet::default(),
        }
    }

    pub(crate) fn emit_line(&mut self, line: &str) {
        if !line.is_empty() {
            for _ in 0..self.margin {
                self.out.push_str("    ");
            }
        }

        self.out.push_str(line);
        self.out.push('\n');
    }

    pub(crate) fn with_indent<F, T>(&mut self, callback: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        self.margin += 1;
        let result = callback(self);
        self.margin -= 1;
        result
    }

    /// Bare `{ ... }` block around `callback`.
    pub(crate) fn in_block<F, T>(&mut self, callback: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        self.emit_line("{");
        let result = self.with_indent(callback);
        self.emit_line("}");
        result
    }

    pub(crate) fn emit_comment(&mut self, node: &Node) -> Result<(), CompilerError> {
        if !self.config.comments {
            return Ok(());
        }

        let description = match node.kind.referenced_name() {
            Some(name) => format!(
                "{} {}",
                node.kind.keyword(),
                self.program.name(name)?.name
            ),
            None => node.kind.keyword().to_owned(),
        };

        self.emit_line(&format!("// {}, line {}", description, node.line));
        Ok(())
    }

    pub(crate) fn new_label(&mut self) -> u32 {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    /// Fresh `$v_N` temporary.
    pub(crate) fn new_var(&mut self) -> String {
        self.var_number += 1;
        format!("$v_{}", self.var_number)
    }

    /// Fresh `$cN` cursor keeper.
    pub(crate) fn new_keep(&mut self) -> String {
        self.keep_count += 1;
        format!("$c{}", self.keep_count)
    }

    pub(crate) fn new_debug_id(&mut self) -> u32 {
        let id = self.next_debug_id;
        self.next_debug_id += 1;
        id
    }

    pub(crate) fn emit_label_begin(&mut self, label: u32) {
        self.emit_line(&format!("// begin lab{} block:", label));
    }

    /// Define `labN:`. Code after it is reachable only if something jumps there.
    pub(crate) fn place_label(&mut self, label: u32) -> Reach {
        self.emit_line(&format!("lab{}:", label));

        if self.jump_targets.contains(&label) {
            Reach::FallsThrough
        } else {
            Reach::Terminated
        }
    }

    pub(crate) fn emit_goto(&mut self, label: u32) -> Reach {
        self.jump_targets.insert(label);
        self.emit_line(&format!("goto lab{};", label));
        Reach::Terminated
    }

    pub(crate) fn emit_failure(&mut self, cont: &Continuation) -> Reach {
        for line in &cont.cleanup {
            self.emit_line(line);
        }

        match cont.target {
            FailTarget::Return => {
                self.emit_line("return false;");
                Reach::Terminated
            }
            FailTarget::Label(label) => self.emit_goto(label),
        }
    }

    pub(crate) fn emit_failure_if(&mut self, condition: &str, cont: &Continuation) -> Reach {
        self.emit_line(&format!("if ({})", condition));
        let _ = self.in_block(|emitter| emitter.emit_failure(cont));
        Reach::FallsThrough
    }

    pub(crate) fn emit_save_cursor(&mut self, mode: Mode, var: &str) {
        if mode.is_forward() {
            self.emit_line(&format!("{} = $this->cursor;", var));
        } else {
            self.emit_line(&format!("{} = $this->limit - $this->cursor;", var));
        }
    }

    pub(crate) fn emit_restore_cursor(&mut self, mode: Mode, var: &str) {
        let restore = restore_cursor_code(mode, var);
        self.emit_line(&restore);
    }

    /// Fail if the cursor is already at the limit for this direction.
    pub(crate) fn emit_check_limit(&mut self, mode: Mode, cont: &Continuation) -> Reach {
        if mode.is_forward() {
            self.emit_failure_if("$this->cursor >= $this->limit", cont)
        } else {
            self.emit_failure_if("$this->cursor <= $this->limit_backward", cont)
        }
    }

    pub(crate) fn emit_inc_cursor(&mut self, mode: Mode) {
        if mode.is_forward() {
            self.emit_line("$this->cursor++;");
        } else {
            self.emit_line("$this->cursor--;");
        }
    }

    pub(crate) fn varname(&self, id: NameId) -> Result<String, CompilerError> {
        let name = self.program.name(id)?;
        Ok(format!("{}{}", name.kind.prefix(), name.name))
    }

    pub(crate) fn varref(&self, id: NameId) -> Result<String, CompilerError> {
        Ok(format!("$this->{}", self.varname(id)?))
    }

    /// Internal error tied to the node being translated.
    pub(crate) fn node_error(&self, node: &Node, msg: impl Into<String>) -> CompilerError {
        let mut error = CompilerError::compiler_error(msg).with_location(
            ProgramLocation::in_routine(&self.routine_name, node.line),
        );
        error.new_metadata_entry(ErrorMetaDataKey::NodeKind, node.kind.keyword());
        error.new_metadata_entry(ErrorMetaDataKey::RoutineName, self.routine_name.as_str());
        error.new_metadata_entry(ErrorMetaDataKey::CompilationStage, "PHP generation");
        error
    }
}

pub(crate) fn restore_cursor_code(mode: Mode, var: &str) -> String {
    if mode.is_forward() {
        format!("$this->cursor = {};", var)
    } else {
        format!("$this->cursor = $this->limit - {};", var)
    }
}
