//! Cursor movement, slicing, string edits and single-step tests.

use crate::backends::php::continuation::{Continuation, Reach};
use crate::backends::php::php_expr::php_string_literal;
use crate::backends::php::routine_emitter::RoutineEmitter;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::program::ast_nodes::{Address, Ae, InsertStyle, Node};
use crate::program::program::NameId;

impl<'prog> RoutineEmitter<'prog> {
    pub(crate) fn lower_setmark(&mut self, node: &Node, mark: NameId) -> Result<Reach, CompilerError> {
        let mark = self.varref(mark)?;
        self.lower_simple(node, &format!("{} = $this->cursor;", mark))
    }

    pub(crate) fn lower_tomark(
        &mut self,
        node: &Node,
        mark: &Ae,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let mark = self.lower_ae(mark)?;
        let past_mark = if node.mode.is_forward() { ">" } else { "<" };

        let _ = self.emit_failure_if(&format!("$this->cursor {} {}", past_mark, mark), cont);
        self.emit_line(&format!("$this->cursor = {};", mark));
        Ok(Reach::FallsThrough)
    }

    pub(crate) fn lower_atmark(
        &mut self,
        node: &Node,
        mark: &Ae,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let mark = self.lower_ae(mark)?;
        Ok(self.emit_failure_if(&format!("$this->cursor != {}", mark), cont))
    }

    pub(crate) fn lower_hop(
        &mut self,
        node: &Node,
        distance: &Ae,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        let target = self.new_keep();
        self.emit_comment(node)?;
        let lowered_distance = self.lower_ae(distance)?;

        let (step, beyond_limit, behind_cursor) = if node.mode.is_forward() {
            ("+", "> $this->limit", "<")
        } else {
            ("-", "< $this->limit_backward", ">")
        };

        self.in_block(|emitter| {
            emitter.emit_line(&format!(
                "{} = $this->cursor {} {};",
                target, step, lowered_distance
            ));

            // Only a non-negative literal is known not to move the cursor backwards
            let failed = match distance {
                Ae::Number(n) if *n >= 0 => format!("{} {}", target, beyond_limit),
                _ => format!(
                    "{} {} || {} {} $this->cursor",
                    target, beyond_limit, target, behind_cursor
                ),
            };
            let _ = emitter.emit_failure_if(&failed, cont);

            emitter.emit_line(&format!("$this->cursor = {};", target));
        });

        Ok(Reach::FallsThrough)
    }

    pub(crate) fn lower_next(&mut self, node: &Node, cont: &Continuation) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let _ = self.emit_check_limit(node.mode, cont);
        self.emit_inc_cursor(node.mode);
        Ok(Reach::FallsThrough)
    }

    pub(crate) fn lower_tolimit(&mut self, node: &Node) -> Result<Reach, CompilerError> {
        if node.mode.is_forward() {
            self.lower_simple(node, "$this->cursor = $this->limit;")
        } else {
            self.lower_simple(node, "$this->cursor = $this->limit_backward;")
        }
    }

    pub(crate) fn lower_atlimit(&mut self, node: &Node, cont: &Continuation) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        if node.mode.is_forward() {
            Ok(self.emit_failure_if("$this->cursor < $this->limit", cont))
        } else {
            Ok(self.emit_failure_if("$this->cursor > $this->limit_backward", cont))
        }
    }

    /// `[` and `]`. In backward mode the slice ends swap.
    pub(crate) fn lower_slice_marker(&mut self, node: &Node, left: bool) -> Result<Reach, CompilerError> {
        if left == node.mode.is_forward() {
            self.lower_simple(node, "$this->bra = $this->cursor;")
        } else {
            self.lower_simple(node, "$this->ket = $this->cursor;")
        }
    }

    pub(crate) fn lower_assignto(&mut self, node: &Node, variable: NameId) -> Result<Reach, CompilerError> {
        let variable = self.varref(variable)?;
        self.lower_simple(node, &format!("{} = $this->assign_to();", variable))
    }

    pub(crate) fn lower_sliceto(
        &mut self,
        node: &Node,
        variable: NameId,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let variable = self.varref(variable)?;

        self.emit_line(&format!("{} = $this->slice_to();", variable));
        Ok(self.emit_failure_if(&format!("'' === {}", variable), cont))
    }

    /// `insert` leaves the cursor after the new text, `attach` before it.
    /// Backward mode flips which of the two needs the cursor put back.
    pub(crate) fn lower_insert(
        &mut self,
        node: &Node,
        style: InsertStyle,
        text: &Address,
    ) -> Result<Reach, CompilerError> {
        let keep_cursor = (style == InsertStyle::Attach) == node.mode.is_forward();
        let keep = keep_cursor.then(|| self.new_keep());

        self.emit_comment(node)?;
        let text = self.lower_address(text)?;
        let insert = format!("$this->insert($this->cursor, $this->cursor, {});", text);

        self.emit_keeping_cursor(keep.as_deref(), &insert);
        Ok(Reach::FallsThrough)
    }

    /// `= s`: replace everything between the cursor and the limit.
    pub(crate) fn lower_assignfrom(&mut self, node: &Node, text: &Address) -> Result<Reach, CompilerError> {
        let keep = node.mode.is_forward().then(|| self.new_keep());

        self.emit_comment(node)?;
        let text = self.lower_address(text)?;
        let insert = if node.mode.is_forward() {
            format!("$this->insert($this->cursor, $this->limit, {});", text)
        } else {
            format!("$this->insert($this->limit_backward, $this->cursor, {});", text)
        };

        self.emit_keeping_cursor(keep.as_deref(), &insert);
        Ok(Reach::FallsThrough)
    }

    fn emit_keeping_cursor(&mut self, keep: Option<&str>, line: &str) {
        match keep {
            Some(keep) => self.in_block(|emitter| {
                emitter.emit_line(&format!("{} = $this->cursor;", keep));
                emitter.emit_line(line);
                emitter.emit_line(&format!("$this->cursor = {};", keep));
            }),
            None => self.emit_line(line),
        }
    }

    pub(crate) fn lower_slicefrom(&mut self, node: &Node, text: &Address) -> Result<Reach, CompilerError> {
        let text = self.lower_address(text)?;
        self.lower_simple(node, &format!("$this->slice_from({});", text))
    }

    pub(crate) fn lower_grouping_test(
        &mut self,
        node: &Node,
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
        let membership = if complement { "out" } else { "in" };

        let failed = format!(
            "!($this->{}_grouping{}({}, {}, {}))",
            membership,
            direction,
            self.varref(grouping)?,
            smallest,
            largest
        );
        Ok(self.emit_failure_if(&failed, cont))
    }

    pub(crate) fn lower_named_string(
        &mut self,
        node: &Node,
        variable: NameId,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        let variable = self.varref(variable)?;
        self.lower_eq_s(node, &variable, cont)
    }

    pub(crate) fn lower_literal_string(
        &mut self,
        node: &Node,
        text: &str,
        cont: &Continuation,
    ) -> Result<Reach, CompilerError> {
        self.emit_comment(node)?;
        self.lower_eq_s(node, &php_string_literal(text), cont)
    }

    fn lower_eq_s(&mut self, node: &Node, text: &str, cont: &Continuation) -> Result<Reach, CompilerError> {
        let direction = if node.mode.is_forward() { "" } else { "_b" };
        Ok(self.emit_failure_if(&format!("!($this->eq_s{}({}))", direction, text), cont))
    }
}
