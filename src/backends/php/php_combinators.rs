use crate::backends::php::continuation::{Continuation, Position, Reach};
use crate::backends::php::routine_emitter::{RoutineEmitter, restore_cursor_code};
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::program::ast_nodes::{Node, NodeKind};
use crate::program::program::NameId;

impl<'prog> RoutineEmitter<'prog> {
    pub(crate) fn lower_and(
        &mut self,
        node: &Node,
        statements: &[Node],
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        let saved = node.cursor_save.then(|| self.new_var());

        self.emit_comment(node)?;
        if let Some(saved) = &saved {
            self.emit_save_cursor(node.mode, saved);
        }

        for (index, statement) in statements.iter().enumerate() {
            let position = match statements.get(index + 1) {
                Some(next) if next.is_routine_end() => Position::RoutineTail,
                _ => Position::Inner,
            };

            if self.lower_node(statement, cont, position)?.is_terminated() {
                return Ok(Reach::Terminated);
            }

            if let Some(saved) = &saved {
                if index + 1 < statements.len() {
                    self.emit_restore_cursor(node.mode, saved);
                }
            }
        }

        Ok(Reach::FallsThrough)
    }

    pub(crate) fn lower_or(
        &mut self,
        node: &Node,
        branches: &[Node],
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        let Some((last, alternatives)) = branches.split_last() else {
            return Err(self.node_error(node, "'or' without any branches"));
        };

        let saved = node.cursor_save.then(|| self.new_var());
        let out_label = self.new_label();

        self.emit_comment(node)?;
        self.emit_label_begin(out_label);
        if let Some(saved) = &saved {
            self.emit_save_cursor(node.mode, saved);
        }

        for branch in alternatives {
            let next_label = self.new_label();
            self.emit_label_begin(next_label);

            let reach = self.lower_node(branch, &Continuation::jump_to(next_label), Position::Inner)?;
            if reach.falls_through() {
                let _ = self.emit_goto(out_label);
            }

            // Nothing failed over to the next branch, so the rest of the alternation is dead
            if self.place_label(next_label).is_terminated() {
                return Ok(self.place_label(out_label));
            }

            if let Some(saved) = &saved {
                self.emit_restore_cursor(node.mode, saved);
            }
        }

        let last_reach = self.lower_node(last, cont, Position::Inner)?;
        Ok(last_reach.either(self.place_label(out_label)))
    }

    pub(crate) fn lower_backwards(
        &mut self,
        node: &Node,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        self.emit_line("$this->limit_backward = $this->cursor; $this->cursor = $this->limit;");

        let reach = self.lower_node(body, cont, Position::Inner)?;
        if reach.falls_through() {
            self.emit_line("$this->cursor = $this->limit_backward;");
        }

        Ok(reach)
    }

    pub(crate) fn lower_not(
        &mut self,
        node: &Node,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        let saved = node.cursor_save.then(|| self.new_var());

        self.emit_comment(node)?;

        match saved {
            Some(saved) => self.in_block(|emitter| {
                emitter.emit_save_cursor(node.mode, &saved);
                let reach = emitter.lower_negated_body(body, cont)?;
                if reach.falls_through() {
                    emitter.emit_restore_cursor(node.mode, &saved);
                }
                Ok::<Reach, CompilerError>(reach)
            }),
            None => self.lower_negated_body(body, cont),
        }
    }

    // Success of the body is failure of the `not`. Code after the label only runs when
    // the body failed.
    fn lower_negated_body(
        &mut self,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        let label = self.new_label();
        self.emit_label_begin(label);

        if self
            .lower_node(body, &Continuation::jump_to(label), Position::Inner)?
            .falls_through()
        {
            let _ = self.emit_failure(cont);
        }

        Ok(self.place_label(label))
    }

    /// `try C`: failure of C only restores the cursor and carries on.
    pub(crate) fn lower_try(&mut self, node: &Node, body: &Node) -> Result<Reach, CompilerError> {
        let saved = node.cursor_save.then(|| self.new_var());
        let label = self.new_label();

        self.emit_comment(node)?;

        let mut body_cont = Continuation::jump_to(label);
        if let Some(saved) = &saved {
            self.emit_save_cursor(node.mode, saved);
            body_cont = body_cont.with_cleanup(restore_cursor_code(node.mode, saved));
        }

        self.emit_label_begin(label);
        let reach = self.lower_node(body, &body_cont, Position::Inner)?;

        Ok(reach.either(self.place_label(label)))
    }

    pub(crate) fn lower_fail(
        &mut self,
        node: &Node,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;

        if self.lower_node(body, cont, Position::Inner)?.falls_through() {
            let _ = self.emit_failure(cont);
        }

        Ok(Reach::Terminated)
    }

    /// `test` and `reverse`: run the body, then put the cursor back if it succeeded.
    pub(crate) fn lower_test(
        &mut self,
        node: &Node,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        let saved = node.cursor_save.then(|| self.new_var());

        self.emit_comment(node)?;
        if let Some(saved) = &saved {
            self.emit_save_cursor(node.mode, saved);
        }

        let reach = self.lower_node(body, cont, Position::Inner)?;

        if let Some(saved) = &saved {
            if reach.falls_through() {
                self.emit_restore_cursor(node.mode, saved);
            }
        }

        Ok(reach)
    }

    pub(crate) fn lower_do(&mut self, node: &Node, body: &Node) -> Result<Reach, CompilerError> {
        let saved = node.cursor_save.then(|| self.new_var());

        self.emit_comment(node)?;
        if let Some(saved) = &saved {
            self.emit_save_cursor(node.mode, saved);
        }

        let reach = match &body.kind {
            // The outcome is ignored, so a call needs no failure check at all
            NodeKind::Call(routine) => {
                self.emit_comment(body)?;
                let callee = self.varref(*routine)?;
                self.emit_line(&format!("{}();", callee));
                Reach::FallsThrough
            }
            _ => {
                let label = self.new_label();
                self.emit_label_begin(label);
                let reach =
                    self.lower_node(body, &Continuation::jump_to(label), Position::Inner)?;
                reach.either(self.place_label(label))
            }
        };

        if let Some(saved) = &saved {
            if reach.falls_through() {
                self.emit_restore_cursor(node.mode, saved);
            }
        }

        Ok(reach)
    }

    pub(crate) fn lower_setlimit(
        &mut self,
        node: &Node,
        bound: &Node,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        let saved_limit = self.new_var();
        self.emit_comment(node)?;

        let restore_limit = if node.mode.is_forward() {
            format!("$this->limit += {};", saved_limit)
        } else {
            format!("$this->limit_backward = {};", saved_limit)
        };

        match &bound.kind {
            // `setlimit tomark AE for C`: the new limit is the mark itself,
            // so the cursor never has to move
            NodeKind::ToMark(mark) => {
                self.emit_comment(bound)?;
                let mark = self.lower_ae(mark)?;

                let past_mark = if bound.mode.is_forward() { ">" } else { "<" };
                let _ = self.emit_failure_if(&format!("$this->cursor {} {}", past_mark, mark), cont);

                if node.mode.is_forward() {
                    self.emit_line(&format!("{} = $this->limit - {};", saved_limit, mark));
                    self.emit_line(&format!("$this->limit = {};", mark));
                } else {
                    self.emit_line(&format!("{} = $this->limit_backward;", saved_limit));
                    self.emit_line(&format!("$this->limit_backward = {};", mark));
                }
            }

            _ => {
                let saved_cursor = self.new_var();
                self.emit_save_cursor(node.mode, &saved_cursor);

                if self.lower_node(bound, cont, Position::Inner)?.is_terminated() {
                    return Ok(Reach::Terminated);
                }

                if node.mode.is_forward() {
                    self.emit_line(&format!("{} = $this->limit - $this->cursor;", saved_limit));
                    self.emit_line("$this->limit = $this->cursor;");
                } else {
                    self.emit_line(&format!("{} = $this->limit_backward;", saved_limit));
                    self.emit_line("$this->limit_backward = $this->cursor;");
                }
                self.emit_restore_cursor(node.mode, &saved_cursor);
            }
        }

        let body_cont = cont.with_cleanup(restore_limit.clone());
        let reach = self.lower_node(body, &body_cont, Position::Inner)?;
        if reach.falls_through() {
            self.emit_line(&restore_limit);
        }

        Ok(reach)
    }

    /// `$ s C`: run C against the string variable as if it were the current string.
    pub(crate) fn lower_dollar(
        &mut self,
        node: &Node,
        variable: NameId,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;

        let saved_state = self.new_var();
        let variable = self.varref(variable)?;
        let restore_state = format!("$this->copyFrom({});", saved_state);

        self.in_block(|emitter| {
            emitter.emit_line(&format!("{} = clone $this;", saved_state));
            emitter.emit_line(&format!("$this->current = {};", variable));
            emitter.emit_line("$this->cursor = 0;");
            emitter.emit_line("$this->limit_backward = 0;");
            emitter.emit_line("$this->limit = $this->currentLength();");

            let body_cont = cont.with_cleanup(restore_state.clone());
            let reach = emitter.lower_node(body, &body_cont, Position::Inner)?;

            if reach.falls_through() {
                emitter.emit_line(&format!("{} = $this->current;", variable));
                emitter.emit_line(&restore_state);
            }

            Ok::<Reach, CompilerError>(reach)
        })
    }
}
