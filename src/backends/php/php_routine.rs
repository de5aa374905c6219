use crate::backends::php::continuation::{Continuation, Position, Reach};
use crate::backends::php::php_expr::php_relop;
use crate::backends::php::routine_emitter::RoutineEmitter;
use crate::codegen_log;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::program::ast_nodes::{AssignOp, Ae, Node, NodeKind, RelOp};
use crate::program::program::{NameId, NameKind, Signals};

impl<'prog> RoutineEmitter<'prog> {
    /// Translate one routine definition into a PHP method.
    pub(crate) fn lower_define(
        &mut self,
        node: &Node,
        routine: NameId,
        body: &Node,
    ) -> Result<(), CompilerError> {
        codegen_log!("Lowering routine ", Bright {self.routine_name.as_str()});

        self.emit_comment(node)?;

        let name = self.program.name(routine)?;
        let method = self.varname(routine)?;
        match name.kind {
            NameKind::Routine => {
                self.emit_line(&format!("protected function {}():bool {{", method))
            }
            NameKind::External => self.emit_line(&format!("public function {}():bool {{", method)),
            _ => {
                return Err(self.node_error(
                    node,
                    format!("'{}' is defined but is not a routine", name.name),
                ));
            }
        }

        self.with_indent(|emitter| {
            let reach =
                emitter.lower_node(body, &Continuation::routine_return(), Position::RoutineTail)?;

            if reach.falls_through() {
                emitter.emit_line("return true;");
            }

            Ok::<(), CompilerError>(())
        })?;

        self.emit_line("}");
        Ok(())
    }

    pub(crate) fn lower_node(
        &mut self,
        node: &Node,
        cont: &Continuation,
        position: Position,
    ) -> Result<Reach, CompilerError> {
        match &node.kind {
            NodeKind::Define { .. } => Err(self.node_error(
                node,
                "routine definitions can only appear at the top level",
            )),

            NodeKind::Bra(statements) => {
                self.emit_comment(node)?;
                self.lower_statement_list(statements, cont, position)
            }
            NodeKind::And(statements) => self.lower_and(node, statements, cont),
            NodeKind::Or(branches) => self.lower_or(node, branches, cont),
            NodeKind::Backwards(body) => self.lower_backwards(node, body, cont),
            NodeKind::Not(body) => self.lower_not(node, body, cont),
            NodeKind::Try(body) => self.lower_try(node, body),
            NodeKind::Fail(body) => self.lower_fail(node, body, cont),
            NodeKind::Test(body) | NodeKind::Reverse(body) => self.lower_test(node, body, cont),
            NodeKind::Do(body) => self.lower_do(node, body),

            NodeKind::Search { style, body } => self.lower_search(node, *style, body, cont),
            NodeKind::GroupingSearch {
                style,
                grouping,
                complement,
            } => self.lower_grouping_search(node, *style, *grouping, *complement, cont),

            NodeKind::Repeat(body) => self.lower_repeat(node, body),
            NodeKind::Loop { count, body } => self.lower_loop(node, count, body, cont),
            NodeKind::AtLeast { count, body } => self.lower_atleast(node, count, body, cont),

            NodeKind::SetMark(mark) => self.lower_setmark(node, *mark),
            NodeKind::ToMark(ae) => self.lower_tomark(node, ae, cont),
            NodeKind::AtMark(ae) => self.lower_atmark(node, ae, cont),
            NodeKind::Hop(ae) => self.lower_hop(node, ae, cont),
            NodeKind::Delete => self.lower_simple(node, "$this->slice_del();"),
            NodeKind::Next => self.lower_next(node, cont),
            NodeKind::ToLimit => self.lower_tolimit(node),
            NodeKind::AtLimit => self.lower_atlimit(node, cont),
            NodeKind::LeftSlice => self.lower_slice_marker(node, true),
            NodeKind::RightSlice => self.lower_slice_marker(node, false),
            NodeKind::AssignTo(variable) => self.lower_assignto(node, *variable),
            NodeKind::SliceTo(variable) => self.lower_sliceto(node, *variable, cont),
            NodeKind::AssignFrom(text) => self.lower_assignfrom(node, text),
            NodeKind::Insert { style, text } => self.lower_insert(node, *style, text),
            NodeKind::SliceFrom(text) => self.lower_slicefrom(node, text),

            NodeKind::SetLimit { bound, body } => self.lower_setlimit(node, bound, body, cont),
            NodeKind::Dollar { variable, body } => self.lower_dollar(node, *variable, body, cont),

            NodeKind::IntegerAssign {
                variable,
                op,
                value,
            } => self.lower_integer_assign(node, *variable, *op, value),
            NodeKind::IntegerTest { left, op, right } => {
                self.lower_integer_test(node, left, *op, right, cont, position)
            }

            NodeKind::Call(routine) => self.lower_call(node, *routine, cont, position),
            NodeKind::Grouping {
                grouping,
                complement,
            } => self.lower_grouping_test(node, *grouping, *complement, cont),
            NodeKind::NamedString(variable) => self.lower_named_string(node, *variable, cont),
            NodeKind::Literal(text) => self.lower_literal_string(node, text, cont),
            NodeKind::Among(among) => self.lower_among(node, *among, cont, position),
            NodeKind::Substring(among) => self.lower_substring(node, *among, cont, position),

            NodeKind::BoolTest { flag, inverted } => {
                self.lower_booltest(node, *flag, *inverted, cont, position)
            }
            NodeKind::Set(flag) => self.lower_set_flag(node, *flag, true),
            NodeKind::Unset(flag) => self.lower_set_flag(node, *flag, false),
            NodeKind::False => {
                self.emit_comment(node)?;
                Ok(self.emit_failure(cont))
            }
            NodeKind::True => Ok(Reach::FallsThrough),
            NodeKind::Debug => self.lower_debug(node),
            NodeKind::RoutineEnd => {
                self.emit_line("return true;");
                Ok(Reach::Terminated)
            }
        }
    }

    /// Statements of a `( ... )` group. The group's position passes to its last statement,
    /// and anything directly followed by the routine end is in tail position too.
    pub(crate) fn lower_statement_list(
        &mut self,
        statements: &[Node],
        cont: &Continuation,
        position: Position,
    ) -> Result<Reach, CompilerError> {
        for (index, statement) in statements.iter().enumerate() {
            let statement_position = match statements.get(index + 1) {
                None => position,
                Some(next) if next.is_routine_end() => Position::RoutineTail,
                Some(_) => Position::Inner,
            };

            if self
                .lower_node(statement, cont, statement_position)?
                .is_terminated()
            {
                return Ok(Reach::Terminated);
            }
        }

        Ok(Reach::FallsThrough)
    }

    fn lower_integer_assign(
        &mut self,
        node: &Node,
        variable: NameId,
        op: AssignOp,
        value: &Ae,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let target = self.varref(variable)?;
        let value = self.lower_ae(value)?;

        let line = match op {
            AssignOp::Assign => format!("{} = {};", target, value),
            AssignOp::Plus => format!("{} += {};", target, value),
            AssignOp::Minus => format!("{} -= {};", target, value),
            AssignOp::Multiply => format!("{} *= {};", target, value),
            AssignOp::Divide => format!("{} = intdiv({}, {});", target, target, value),
        };

        self.emit_line(&line);
        Ok(Reach::FallsThrough)
    }

    fn lower_integer_test(
        &mut self,
        node: &Node,
        left: &Ae,
        op: RelOp,
        right: &Ae,
        cont: &Continuation,
        position: Position,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let left = self.lower_ae(left)?;
        let right = self.lower_ae(right)?;

        if position.is_tail() && cont.is_plain_return() {
            self.emit_line(&format!("return {}{}{};", left, php_relop(op), right));
            return Ok(Reach::Terminated);
        }

        let failed = format!("{}{}{}", left, php_relop(op.inverse()), right);
        Ok(self.emit_failure_if(&failed, cont))
    }

    fn lower_call(
        &mut self,
        node: &Node,
        routine: NameId,
        cont: &Continuation,
        position: Position,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let callee = self.varref(routine)?;
        let signals = self.program.name(routine)?.signals;

        if cont.is_plain_return() && (position.is_tail() || signals == Signals::AlwaysFails) {
            self.emit_line(&format!("return {}();", callee));
            return Ok(Reach::Terminated);
        }

        match signals {
            Signals::AlwaysSucceeds => {
                self.emit_line(&format!("{}();", callee));
                Ok(Reach::FallsThrough)
            }
            Signals::AlwaysFails => {
                self.emit_line(&format!("{}();", callee));
                Ok(self.emit_failure(cont))
            }
            Signals::Either => Ok(self.emit_failure_if(&format!("!{}()", callee), cont)),
        }
    }

    fn lower_booltest(
        &mut self,
        node: &Node,
        flag: NameId,
        inverted: bool,
        cont: &Continuation,
        position: Position,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let flag = self.varref(flag)?;

        if position.is_tail() && cont.is_plain_return() {
            if inverted {
                self.emit_line(&format!("return !{};", flag));
            } else {
                self.emit_line(&format!("return {};", flag));
            }
            return Ok(Reach::Terminated);
        }

        if inverted {
            Ok(self.emit_failure_if(&flag, cont))
        } else {
            Ok(self.emit_failure_if(&format!("!{}", flag), cont))
        }
    }

    fn lower_set_flag(
        &mut self,
        node: &Node,
        flag: NameId,
        value: bool,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let flag = self.varref(flag)?;
        self.emit_line(&format!("{} = {};", flag, value));
        Ok(Reach::FallsThrough)
    }

    // Ids come from the range reserved by `count_debug_calls`, so pruned calls leave gaps
    fn lower_debug(&mut self, node: &Node) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let id = self.new_debug_id();
        self.emit_line(&format!("$this->debug({}, {});", id, node.line));
        Ok(Reach::FallsThrough)
    }

    /// Statement with no failure path.
    pub(crate) fn lower_simple(&mut self, node: &Node, line: &str) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        self.emit_line(line);
        Ok(Reach::FallsThrough)
    }
}
