//! Recomputes the two cursor predicates on every node.
//!
//! Front ends that don't run their own analysis can leave `cursor_save` and
//! `repeat_restore` unset and let this pass fill them in. The result is conservative:
//! anything it can't see through is assumed to move the cursor.

use crate::program::ast_nodes::{Node, NodeKind};
use crate::program::program::Program;

// Calls are followed into the callee up to this depth, then assumed to move the cursor.
const MAX_CALL_DEPTH: u32 = 100;

/// Returns a copy of the program with both predicates set on every node.
pub fn annotate_cursor_usage(program: &Program) -> Program {
    let mut annotated = program.clone();

    for definition in &mut annotated.definitions {
        annotate_node(program, definition);
    }

    for among in &mut annotated.amongs {
        for command in &mut among.commands {
            annotate_node(program, command);
        }
    }

    annotated
}

fn annotate_node(program: &Program, node: &mut Node) {
    match &node.kind {
        NodeKind::And(children) | NodeKind::Or(children) => {
            node.cursor_save = may_move_cursor(program, children, 0);
        }

        NodeKind::Not(body)
        | NodeKind::Try(body)
        | NodeKind::Test(body)
        | NodeKind::Reverse(body)
        | NodeKind::Do(body) => {
            node.cursor_save = may_move_cursor(program, std::slice::from_ref(body.as_ref()), 0);
        }

        NodeKind::Repeat(body) | NodeKind::AtLeast { body, .. } | NodeKind::Search { body, .. } => {
            node.repeat_restore =
                repeat_score(program, std::slice::from_ref(body.as_ref()), 0) >= 2;
        }

        _ => {}
    }

    for child in children_mut(&mut node.kind) {
        annotate_node(program, child);
    }
}

fn children_mut(kind: &mut NodeKind) -> Vec<&mut Node> {
    match kind {
        NodeKind::Define { body, .. }
        | NodeKind::Backwards(body)
        | NodeKind::Not(body)
        | NodeKind::Try(body)
        | NodeKind::Fail(body)
        | NodeKind::Test(body)
        | NodeKind::Reverse(body)
        | NodeKind::Do(body)
        | NodeKind::Search { body, .. }
        | NodeKind::Repeat(body)
        | NodeKind::Loop { body, .. }
        | NodeKind::AtLeast { body, .. }
        | NodeKind::Dollar { body, .. } => vec![body.as_mut()],
        NodeKind::Bra(children) | NodeKind::And(children) | NodeKind::Or(children) => {
            children.iter_mut().collect()
        }
        NodeKind::SetLimit { bound, body } => vec![bound.as_mut(), body.as_mut()],
        _ => Vec::new(),
    }
}

/// Statements that leave the cursor where it was whether they succeed or fail.
fn is_cursor_neutral(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::AtLimit
            | NodeKind::Do(_)
            | NodeKind::Dollar { .. }
            | NodeKind::LeftSlice
            | NodeKind::RightSlice
            | NodeKind::IntegerAssign { .. }
            | NodeKind::IntegerTest { .. }
            | NodeKind::SliceTo(_)
            | NodeKind::BoolTest { .. }
            | NodeKind::Set(_)
            | NodeKind::Unset(_)
            | NodeKind::True
            | NodeKind::False
            | NodeKind::Debug
            | NodeKind::RoutineEnd
    )
}

/// Whether running `statements` in sequence may leave the cursor moved on a failure path.
pub fn may_move_cursor(program: &Program, statements: &[Node], call_depth: u32) -> bool {
    for statement in statements {
        if is_cursor_neutral(&statement.kind) {
            continue;
        }

        match &statement.kind {
            // A negation always puts the cursor back
            NodeKind::Not(_) => {}

            NodeKind::Call(routine) => {
                if call_depth >= MAX_CALL_DEPTH {
                    return true;
                }

                let Some(body) = program.routine_body(*routine) else {
                    return true;
                };

                if may_move_cursor(program, std::slice::from_ref(body), call_depth + 1) {
                    return true;
                }
            }

            NodeKind::Bra(children) => {
                if may_move_cursor(program, children, call_depth) {
                    return true;
                }
            }

            _ => return true,
        }
    }

    false
}

/// Rough count of cursor-moving steps in `statements`.
/// A score of two or more means a failed iteration can leave the cursor moved.
pub fn repeat_score(program: &Program, statements: &[Node], call_depth: u32) -> u32 {
    let mut score = 0;

    for statement in statements {
        if is_cursor_neutral(&statement.kind) {
            continue;
        }

        match &statement.kind {
            NodeKind::Call(routine) => {
                if call_depth >= MAX_CALL_DEPTH {
                    return 2;
                }

                let Some(body) = program.routine_body(*routine) else {
                    return 2;
                };

                score += repeat_score(program, std::slice::from_ref(body), call_depth + 1);
            }

            NodeKind::Bra(children) => {
                score += repeat_score(program, children, call_depth);
            }

            // Single step tests: they either fail without moving or succeed
            NodeKind::NamedString(_)
            | NodeKind::Literal(_)
            | NodeKind::Next
            | NodeKind::Grouping { .. }
            | NodeKind::Hop(_) => {
                score += 1;
            }

            _ => return 2,
        }

        if score >= 2 {
            return score;
        }
    }

    score
}
