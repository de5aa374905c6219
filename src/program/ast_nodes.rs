//! AST nodes handed over by the front end.
//!
//! The tree is built and analysed before generation and is read-only from here on.
//! Statement lists are owned vectors rather than right-links, and every node carries the
//! two cursor predicates the analyser computed for it.

use crate::program::program::{AmongId, NameId};
use serde::{Deserialize, Serialize};

/// Scan direction of a node. Backward nodes run between `limit_backward` and the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Forward,
    Backward,
}

impl Mode {
    pub fn is_forward(self) -> bool {
        self == Mode::Forward
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,

    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub line: u32,

    /// The body may have moved the cursor by the time it fails,
    /// so the combinator has to save and restore it.
    #[serde(default)]
    pub cursor_save: bool,

    /// A repetition or search body needs the cursor put back after each failed attempt.
    #[serde(default)]
    pub repeat_restore: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            mode: Mode::Forward,
            line: 0,
            cursor_save: false,
            repeat_restore: false,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn saving_cursor(mut self) -> Self {
        self.cursor_save = true;
        self
    }

    pub fn restoring_per_iteration(mut self) -> Self {
        self.repeat_restore = true;
        self
    }

    pub fn is_routine_end(&self) -> bool {
        matches!(self.kind, NodeKind::RoutineEnd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStyle {
    /// Stop just before the match
    To,
    /// Stop just after the match
    Past,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertStyle {
    /// Cursor ends up after the inserted text
    Insert,
    /// Cursor stays before the inserted text
    Attach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Assign,
    Plus,
    Minus,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl RelOp {
    /// The comparison that holds exactly when this one doesn't.
    pub fn inverse(self) -> RelOp {
        match self {
            RelOp::Eq => RelOp::Ne,
            RelOp::Ne => RelOp::Eq,
            RelOp::Gt => RelOp::Le,
            RelOp::Le => RelOp::Gt,
            RelOp::Ge => RelOp::Lt,
            RelOp::Lt => RelOp::Ge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Plus,
    Minus,
    Multiply,
    Divide,
}

/// Integer-valued expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ae {
    Name(NameId),
    Number(i64),
    MaxInt,
    MinInt,
    Neg(Box<Ae>),
    Binary {
        op: ArithOp,
        left: Box<Ae>,
        right: Box<Ae>,
    },
    Cursor,
    Limit(Mode),
    /// Length of a string variable in characters
    LenOf(NameId),
    /// Length of a string variable in code units
    SizeOf(NameId),
    Len,
    Size,
}

/// Text source for insert/attach/assign/slicefrom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Address {
    Literal(String),
    Variable(NameId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A routine definition. Only valid as a top level definition.
    Define {
        routine: NameId,
        body: Box<Node>,
    },

    /// Bracketed statement list `( ... )`
    Bra(Vec<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
    Backwards(Box<Node>),

    Not(Box<Node>),
    Try(Box<Node>),
    Fail(Box<Node>),
    Test(Box<Node>),
    Reverse(Box<Node>),
    Do(Box<Node>),

    Search {
        style: SearchStyle,
        body: Box<Node>,
    },
    GroupingSearch {
        style: SearchStyle,
        grouping: NameId,
        complement: bool,
    },

    Repeat(Box<Node>),
    Loop {
        count: Ae,
        body: Box<Node>,
    },
    AtLeast {
        count: Ae,
        body: Box<Node>,
    },

    SetMark(NameId),
    ToMark(Ae),
    AtMark(Ae),
    Hop(Ae),
    Delete,
    Next,
    ToLimit,
    AtLimit,
    LeftSlice,
    RightSlice,
    AssignTo(NameId),
    SliceTo(NameId),
    AssignFrom(Address),
    Insert {
        style: InsertStyle,
        text: Address,
    },
    SliceFrom(Address),

    SetLimit {
        bound: Box<Node>,
        body: Box<Node>,
    },
    Dollar {
        variable: NameId,
        body: Box<Node>,
    },

    IntegerAssign {
        variable: NameId,
        op: AssignOp,
        value: Ae,
    },
    IntegerTest {
        left: Ae,
        op: RelOp,
        right: Ae,
    },

    Call(NameId),
    Grouping {
        grouping: NameId,
        complement: bool,
    },
    NamedString(NameId),
    Literal(String),
    Among(AmongId),
    Substring(AmongId),

    BoolTest {
        flag: NameId,
        inverted: bool,
    },
    Set(NameId),
    Unset(NameId),
    False,
    True,
    Debug,
    RoutineEnd,
}

impl NodeKind {
    /// Short keyword used in comments and diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            NodeKind::Define { .. } => "define",
            NodeKind::Bra(_) => "()",
            NodeKind::And(_) => "and",
            NodeKind::Or(_) => "or",
            NodeKind::Backwards(_) => "backwards",
            NodeKind::Not(_) => "not",
            NodeKind::Try(_) => "try",
            NodeKind::Fail(_) => "fail",
            NodeKind::Test(_) => "test",
            NodeKind::Reverse(_) => "reverse",
            NodeKind::Do(_) => "do",
            NodeKind::Search {
                style: SearchStyle::To,
                ..
            } => "goto",
            NodeKind::Search {
                style: SearchStyle::Past,
                ..
            } => "gopast",
            NodeKind::GroupingSearch {
                style: SearchStyle::To,
                complement: false,
                ..
            } => "goto grouping",
            NodeKind::GroupingSearch {
                style: SearchStyle::Past,
                complement: false,
                ..
            } => "gopast grouping",
            NodeKind::GroupingSearch {
                style: SearchStyle::To,
                complement: true,
                ..
            } => "goto non",
            NodeKind::GroupingSearch {
                style: SearchStyle::Past,
                complement: true,
                ..
            } => "gopast non",
            NodeKind::Repeat(_) => "repeat",
            NodeKind::Loop { .. } => "loop",
            NodeKind::AtLeast { .. } => "atleast",
            NodeKind::SetMark(_) => "setmark",
            NodeKind::ToMark(_) => "tomark",
            NodeKind::AtMark(_) => "atmark",
            NodeKind::Hop(_) => "hop",
            NodeKind::Delete => "delete",
            NodeKind::Next => "next",
            NodeKind::ToLimit => "tolimit",
            NodeKind::AtLimit => "atlimit",
            NodeKind::LeftSlice => "[",
            NodeKind::RightSlice => "]",
            NodeKind::AssignTo(_) => "=>",
            NodeKind::SliceTo(_) => "->",
            NodeKind::AssignFrom(_) => "=",
            NodeKind::Insert {
                style: InsertStyle::Insert,
                ..
            } => "insert",
            NodeKind::Insert {
                style: InsertStyle::Attach,
                ..
            } => "attach",
            NodeKind::SliceFrom(_) => "<-",
            NodeKind::SetLimit { .. } => "setlimit",
            NodeKind::Dollar { .. } => "$",
            NodeKind::IntegerAssign { op, .. } => match op {
                AssignOp::Assign => "$ =",
                AssignOp::Plus => "$ +=",
                AssignOp::Minus => "$ -=",
                AssignOp::Multiply => "$ *=",
                AssignOp::Divide => "$ /=",
            },
            NodeKind::IntegerTest { op, .. } => match op {
                RelOp::Eq => "$ ==",
                RelOp::Ne => "$ !=",
                RelOp::Gt => "$ >",
                RelOp::Ge => "$ >=",
                RelOp::Lt => "$ <",
                RelOp::Le => "$ <=",
            },
            NodeKind::Call(_) => "call",
            NodeKind::Grouping {
                complement: false, ..
            } => "grouping",
            NodeKind::Grouping {
                complement: true, ..
            } => "non",
            NodeKind::NamedString(_) => "name",
            NodeKind::Literal(_) => "literal",
            NodeKind::Among(_) => "among",
            NodeKind::Substring(_) => "substring",
            NodeKind::BoolTest {
                inverted: false, ..
            } => "booltest",
            NodeKind::BoolTest { inverted: true, .. } => "not booltest",
            NodeKind::Set(_) => "set",
            NodeKind::Unset(_) => "unset",
            NodeKind::False => "false",
            NodeKind::True => "true",
            NodeKind::Debug => "debug",
            NodeKind::RoutineEnd => "functionend",
        }
    }

    /// The name a node refers to, if any. Used to make comments readable.
    pub fn referenced_name(&self) -> Option<NameId> {
        match self {
            NodeKind::Define { routine, .. } => Some(*routine),
            NodeKind::GroupingSearch { grouping, .. } | NodeKind::Grouping { grouping, .. } => {
                Some(*grouping)
            }
            NodeKind::SetMark(name)
            | NodeKind::AssignTo(name)
            | NodeKind::SliceTo(name)
            | NodeKind::Call(name)
            | NodeKind::NamedString(name)
            | NodeKind::Set(name)
            | NodeKind::Unset(name) => Some(*name),
            NodeKind::Dollar { variable, .. } | NodeKind::IntegerAssign { variable, .. } => {
                Some(*variable)
            }
            NodeKind::BoolTest { flag, .. } => Some(*flag),
            NodeKind::AssignFrom(Address::Variable(name))
            | NodeKind::SliceFrom(Address::Variable(name))
            | NodeKind::Insert {
                text: Address::Variable(name),
                ..
            } => Some(*name),
            _ => None,
        }
    }

    /// Direct child statements, in order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
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
            | NodeKind::Dollar { body, .. } => vec![body.as_ref()],
            NodeKind::Bra(children) | NodeKind::And(children) | NodeKind::Or(children) => {
                children.iter().collect()
            }
            NodeKind::SetLimit { bound, body } => vec![bound.as_ref(), body.as_ref()],
            _ => Vec::new(),
        }
    }
}
