use crate::backends::php::continuation::{Continuation, Position, Reach};
use crate::backends::php::routine_emitter::RoutineEmitter;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::program::ast_nodes::{Ae, Node, SearchStyle};
use crate::program::program::NameId;

impl<'prog> RoutineEmitter<'prog> {
    pub(crate) fn lower_repeat(&mut self, node: &Node, body: &Node) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        self.lower_repeat_loop(node, body, None)
    }

    /// `atleast N C`: repeat C, then fail if it matched fewer than N times.
    pub(crate) fn lower_atleast(
        &mut self,
        node: &Node,
        count: &Ae,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        let counter = self.new_var();
        self.emit_comment(node)?;
        let count = self.lower_ae(count)?;

        self.in_block(|emitter| {
            emitter.emit_line(&format!("{} = {};", counter, count));

            let reach = emitter.lower_repeat_loop(node, body, Some(&counter))?;
            if reach.falls_through() {
                let _ = emitter.emit_failure_if(&format!("{} > 0", counter), cont);
            }

            Ok::<Reach, CompilerError>(reach)
        })
    }

    // Shared by `repeat` and `atleast`. The loop is only left through `break`, which is
    // reachable only when some iteration can fail.
    fn lower_repeat_loop(
        &mut self,
        node: &Node,
        body: &Node,
        counter: Option<&str>,
    ) -> Result<Reach, CompilerError> {
        self.emit_line("while(true)");

        self.in_block(|emitter| {
            let saved = node.repeat_restore.then(|| emitter.new_var());
            if let Some(saved) = &saved {
                emitter.emit_save_cursor(node.mode, saved);
            }

            let label = emitter.new_label();
            emitter.emit_label_begin(label);

            let reach = emitter.lower_node(body, &Continuation::jump_to(label), Position::Inner)?;
            if reach.falls_through() {
                if let Some(counter) = counter {
                    emitter.emit_line(&format!("{}--;", counter));
                }
                emitter.emit_line("continue;");
            }

            let exit = emitter.place_label(label);
            if exit.falls_through() {
                if let Some(saved) = &saved {
                    emitter.emit_restore_cursor(node.mode, saved);
                }
                emitter.emit_line("break;");
            }

            Ok::<Reach, CompilerError>(exit)
        })
    }

    /// `loop N C`: C exactly N times, any failure fails the whole loop.
    pub(crate) fn lower_loop(
        &mut self,
        node: &Node,
        count: &Ae,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        let counter = self.new_var();
        self.emit_comment(node)?;
        let count = self.lower_ae(count)?;

        self.emit_line(&format!(
            "for ({} = {}; {} > 0; {}--)",
            counter, count, counter, counter
        ));
        let _ = self.in_block(|emitter| emitter.lower_node(body, cont, Position::Inner))?;

        // A count of zero or less skips the body entirely
        Ok(Reach::FallsThrough)
    }

    /// `goto C` / `gopast C`: try C at each position until it matches.
    pub(crate) fn lower_search(
        &mut self,
        node: &Node,
        style: SearchStyle,
        body: &Node,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;

        let found_label = self.new_label();
        self.emit_label_begin(found_label);
        self.emit_line("while(true){");

        self.with_indent(|emitter| {
            // `goto` always leaves the cursor before the match
            let saved = (style == SearchStyle::To || node.repeat_restore).then(|| emitter.new_var());
            if let Some(saved) = &saved {
                emitter.emit_save_cursor(node.mode, saved);
            }

            let retry_label = emitter.new_label();
            emitter.emit_label_begin(retry_label);

            let reach =
                emitter.lower_node(body, &Continuation::jump_to(retry_label), Position::Inner)?;
            if reach.falls_through() {
                if style == SearchStyle::To {
                    if let Some(saved) = &saved {
                        emitter.emit_restore_cursor(node.mode, saved);
                    }
                }
                let _ = emitter.emit_goto(found_label);
            }

            if emitter.place_label(retry_label).falls_through() {
                if let Some(saved) = &saved {
                    emitter.emit_restore_cursor(node.mode, saved);
                }
                let _ = emitter.emit_check_limit(node.mode, cont);
                emitter.emit_inc_cursor(node.mode);
            }

            Ok::<(), CompilerError>(())
        })?;

        self.emit_line("}");
        Ok(self.place_label(found_label))
    }

    /// Grouping searches are a single runtime call.
    pub(crate) fn lower_grouping_search(
        &mut self,
        node: &Node,
        style: SearchStyle,
        grouping: NameId,
        complement: bool,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;

        let Some(table) = self.program.grouping_for(grouping) else {
            return Err(self.node_error(node, format!("grouping {} has no table", grouping.0)));
        };
        let (smallest, largest) = (table.smallest_ch, table.largest_ch);

        let direction = if node.mode.is_forward() { "" } else { "_b" };
        // Going to a member means skipping non-members
        let skipping = if complement { "in" } else { "out" };

        let failed = format!(
            "!$this->go_{}_grouping{}({}, {}, {})",
            skipping,
            direction,
            self.varref(grouping)?,
            smallest,
            largest
        );
        let _ = self.emit_failure_if(&failed, cont);

        if style == SearchStyle::Past {
            self.emit_inc_cursor(node.mode);
        }

        Ok(Reach::FallsThrough)
    }
}
