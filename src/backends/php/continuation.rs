//! Failure continuations and reachability.
//!
//! Every lowering call receives the continuation to use when its pattern fails and
//! reports whether control can fall out of the code it emitted. Nothing here is mutable
//! state on the emitter: a combinator that wants a different failure target builds a new
//! continuation for its child, so the parent's one is untouched on every exit path.

/// Where control goes when a pattern fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailTarget {
    /// `return false;` from the current routine
    Return,
    /// `goto labN;`
    Label(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    pub target: FailTarget,

    /// Statements to run before leaving, innermost first.
    pub cleanup: Vec<String>,
}

impl Continuation {
    pub fn routine_return() -> Self {
        Continuation {
            target: FailTarget::Return,
            cleanup: Vec::new(),
        }
    }

    pub fn jump_to(label: u32) -> Self {
        Continuation {
            target: FailTarget::Label(label),
            cleanup: Vec::new(),
        }
    }

    /// Same target, with `code` run before any cleanup already pending.
    pub fn with_cleanup(&self, code: impl Into<String>) -> Self {
        let mut cleanup = Vec::with_capacity(self.cleanup.len() + 1);
        cleanup.push(code.into());
        cleanup.extend(self.cleanup.iter().cloned());

        Continuation {
            target: self.target,
            cleanup,
        }
    }

    /// Failing here is exactly `return false;`. Tail rewrites rely on this.
    pub fn is_plain_return(&self) -> bool {
        self.target == FailTarget::Return && self.cleanup.is_empty()
    }
}

/// Can control fall out of the emitted code?
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    FallsThrough,
    /// Every path ended in a jump, a return, a `break` or a `continue`.
    Terminated,
}

impl Reach {
    pub fn falls_through(self) -> bool {
        self == Reach::FallsThrough
    }

    pub fn is_terminated(self) -> bool {
        self == Reach::Terminated
    }

    /// Reachable if either path is.
    pub fn either(self, other: Reach) -> Reach {
        if self.falls_through() || other.falls_through() {
            Reach::FallsThrough
        } else {
            Reach::Terminated
        }
    }
}

/// Position of a statement inside its routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Inner,
    /// Nothing but the routine's `return true;` follows this statement.
    RoutineTail,
}

impl Position {
    pub fn is_tail(self) -> bool {
        self == Position::RoutineTail
    }
}
