use crate::backends::php::continuation::{Continuation, Position, Reach};
use crate::backends::php::routine_emitter::RoutineEmitter;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::program::ast_nodes::Node;
use crate::program::program::AmongId;

impl<'prog> RoutineEmitter<'prog> {
    /// The table lookup half of an among. Fails when nothing in the table matches.
    pub(crate) fn lower_substring(
        &mut self,
        node: &Node,
        among_id: AmongId,
        cont: &Continuation,
        position: Position,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;

        let program = self.program;
        let among = program.among(among_id)?;
        let direction = if node.mode.is_forward() { "" } else { "_b" };
        let lookup = format!("$this->find_among{}($this->a_{})", direction, among_id.0);

        if among.result_used {
            self.emit_line(&format!("$among_var = {};", lookup));
            if among.always_matches {
                return Ok(Reach::FallsThrough);
            }
            return Ok(self.emit_failure_if("0 === $among_var", cont));
        }

        if among.always_matches {
            self.emit_line(&format!("{};", lookup));
            return Ok(Reach::FallsThrough);
        }

        // Nothing to dispatch, so the routine's result is just whether the lookup matched
        if among.commands.is_empty() && position.is_tail() && cont.is_plain_return() {
            self.emit_line(&format!("return {} != 0;", lookup));
            return Ok(Reach::Terminated);
        }

        Ok(self.emit_failure_if(&format!("{} === 0", lookup), cont))
    }

    /// Lookup (unless an earlier `substring` did it) followed by the outcome dispatch.
    pub(crate) fn lower_among(
        &mut self,
        node: &Node,
        among_id: AmongId,
        cont: &Continuation,
        position: Position,
    ) -> Result<Reach, CompilerError> {
        let program = self.program;
        let among = program.among(among_id)?;

        if among.separate_substring {
            self.emit_comment(node)?;
        } else if self
            .lower_substring(node, among_id, cont, position)?
            .is_terminated()
        {
            return Ok(Reach::Terminated);
        }

        match among.commands.as_slice() {
            [] => Ok(Reach::FallsThrough),

            // A match always selects this one outcome
            [only] if !among.no_outcome_branch => self.lower_node(only, cont, Position::Inner),

            commands => {
                self.emit_line("switch ($among_var) {");

                let any_arm_falls_through = self.with_indent(|emitter| {
                    let mut falls_through = false;

                    for (index, command) in commands.iter().enumerate() {
                        emitter.emit_line(&format!("case {}:", index + 1));

                        let reach = emitter
                            .with_indent(|emitter| emitter.lower_node(command, cont, Position::Inner))?;
                        if reach.falls_through() {
                            emitter.with_indent(|emitter| emitter.emit_line("break;"));
                            falls_through = true;
                        }
                    }

                    Ok::<bool, CompilerError>(falls_through)
                })?;

                self.emit_line("}");

                if any_arm_falls_through || among.no_outcome_branch {
                    Ok(Reach::FallsThrough)
                } else {
                    Ok(Reach::Terminated)
                }
            }
        }
    }
}
