use patternc::backends::php::lower_program_to_php_sequential;
use patternc::program::ast_nodes::{
    Address, Ae, InsertStyle, Mode, Node, NodeKind, RelOp, SearchStyle,
};
use patternc::program::program::{Among, AmongEntry, AmongId, Grouping, Name, NameId, NameKind};
use patternc::settings::GeneratorConfig;
use patternc::{ErrorType, Program, generate_php};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

const STEM: NameId = NameId(0);
const X: NameId = NameId(1);
const FLAG: NameId = NameId(2);
const HELPER: NameId = NameId(3);
const VOWEL: NameId = NameId(4);
const WORD: NameId = NameId(5);

fn program_for(body: Node) -> Program {
    Program {
        names: vec![
            Name::new("stem", NameKind::External),
            Name::new("x", NameKind::Integer),
            Name::new("flag", NameKind::Boolean),
            Name::new("helper", NameKind::Routine),
            Name::new("v", NameKind::Grouping),
            Name::new("word", NameKind::String),
        ],
        amongs: vec![suffixes(), separate_suffixes()],
        groupings: vec![Grouping {
            name: VOWEL,
            smallest_ch: 97,
            largest_ch: 121,
            members: "aeiouy".chars().map(|ch| ch as u32).collect(),
        }],
        definitions: vec![
            define(STEM, body),
            define(HELPER, Node::new(NodeKind::Literal(String::from("s")))),
        ],
    }
}

fn entries() -> Vec<AmongEntry> {
    vec![
        AmongEntry {
            text: String::from("ed"),
            substring_index: -1,
            result: 1,
            function: None,
        },
        AmongEntry {
            text: String::from("ing"),
            substring_index: -1,
            result: 2,
            function: None,
        },
    ]
}

// Every outcome is covered by a case, so the dispatch never skips the switch
fn suffixes() -> Among {
    Among {
        separate_substring: false,
        result_used: true,
        always_matches: false,
        no_outcome_branch: false,
        commands: vec![Node::new(NodeKind::Delete), Node::new(NodeKind::False)],
        entries: entries(),
        line: 1,
    }
}

// Looked up by `substring`, dispatched by a later `among`
fn separate_suffixes() -> Among {
    Among {
        separate_substring: true,
        commands: vec![Node::new(NodeKind::Unset(FLAG)), Node::new(NodeKind::Next)],
        line: 2,
        ..suffixes()
    }
}

fn define(routine: NameId, body: Node) -> Node {
    Node::new(NodeKind::Define {
        routine,
        body: Box::new(body),
    })
}

fn flagged(kind: NodeKind, cursor_save: bool, repeat_restore: bool) -> Node {
    let mut node = Node::new(kind);
    node.cursor_save = cursor_save;
    node.repeat_restore = repeat_restore;
    node
}

fn address() -> impl Strategy<Value = Address> {
    prop_oneof![
        Just(Address::Literal(String::from("x"))),
        Just(Address::Variable(WORD)),
    ]
}

fn leaf() -> impl Strategy<Value = Node> {
    let kind = prop_oneof![
        Just(NodeKind::Literal(String::from("a"))),
        Just(NodeKind::Literal(String::from("b$"))),
        Just(NodeKind::Next),
        Just(NodeKind::Set(FLAG)),
        Just(NodeKind::Unset(FLAG)),
        any::<bool>().prop_map(|inverted| NodeKind::BoolTest {
            flag: FLAG,
            inverted
        }),
        (0i64..4).prop_map(|n| NodeKind::IntegerTest {
            left: Ae::Name(X),
            op: RelOp::Gt,
            right: Ae::Number(n),
        }),
        Just(NodeKind::False),
        Just(NodeKind::True),
        Just(NodeKind::Call(HELPER)),
        Just(NodeKind::Delete),
        Just(NodeKind::Among(AmongId(0))),
        Just(NodeKind::Substring(AmongId(1))),
        Just(NodeKind::Among(AmongId(1))),
        any::<bool>().prop_map(|complement| NodeKind::Grouping {
            grouping: VOWEL,
            complement
        }),
        (any::<bool>(), any::<bool>()).prop_map(|(past, complement)| {
            NodeKind::GroupingSearch {
                style: if past { SearchStyle::Past } else { SearchStyle::To },
                grouping: VOWEL,
                complement,
            }
        }),
        (-1i64..3).prop_map(|n| NodeKind::Hop(Ae::Number(n))),
        Just(NodeKind::Hop(Ae::Name(X))),
        (any::<bool>(), address()).prop_map(|(attach, text)| NodeKind::Insert {
            style: if attach { InsertStyle::Attach } else { InsertStyle::Insert },
            text,
        }),
        address().prop_map(NodeKind::AssignFrom),
        Just(NodeKind::SliceTo(WORD)),
        Just(NodeKind::AtLimit),
        Just(NodeKind::Debug),
        Just(NodeKind::RoutineEnd),
    ];

    (kind, any::<bool>()).prop_map(|(kind, backward)| {
        let mode = if backward { Mode::Backward } else { Mode::Forward };
        Node::new(kind).with_mode(mode)
    })
}

fn tree() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(|s| Node::new(NodeKind::Bra(s))),
            (prop::collection::vec(inner.clone(), 1..4), any::<bool>())
                .prop_map(|(s, save)| flagged(NodeKind::And(s), save, false)),
            (prop::collection::vec(inner.clone(), 2..4), any::<bool>())
                .prop_map(|(s, save)| flagged(NodeKind::Or(s), save, false)),
            (inner.clone(), any::<bool>())
                .prop_map(|(n, save)| flagged(NodeKind::Not(Box::new(n)), save, false)),
            (inner.clone(), any::<bool>())
                .prop_map(|(n, save)| flagged(NodeKind::Try(Box::new(n)), save, false)),
            (inner.clone(), any::<bool>())
                .prop_map(|(n, save)| flagged(NodeKind::Test(Box::new(n)), save, false)),
            inner.clone().prop_map(|n| Node::new(NodeKind::Fail(Box::new(n)))),
            (inner.clone(), any::<bool>())
                .prop_map(|(n, save)| flagged(NodeKind::Do(Box::new(n)), save, false)),
            (inner.clone(), any::<bool>())
                .prop_map(|(n, restore)| flagged(NodeKind::Repeat(Box::new(n)), false, restore)),
            (inner.clone(), 0i64..4, any::<bool>()).prop_map(|(n, count, restore)| {
                flagged(
                    NodeKind::AtLeast {
                        count: Ae::Number(count),
                        body: Box::new(n),
                    },
                    false,
                    restore,
                )
            }),
            (inner.clone(), 0i64..4).prop_map(|(n, count)| Node::new(NodeKind::Loop {
                count: Ae::Number(count),
                body: Box::new(n),
            })),
            (inner.clone(), any::<bool>(), any::<bool>()).prop_map(|(n, past, restore)| {
                let style = if past { SearchStyle::Past } else { SearchStyle::To };
                flagged(NodeKind::Search { style, body: Box::new(n) }, false, restore)
            }),
            inner
                .clone()
                .prop_map(|n| Node::new(NodeKind::Backwards(Box::new(n.with_mode(Mode::Backward))))),
            (inner.clone(), inner.clone()).prop_map(|(bound, body)| {
                Node::new(NodeKind::SetLimit {
                    bound: Box::new(bound),
                    body: Box::new(body),
                })
            }),
            inner.clone().prop_map(|body| Node::new(NodeKind::SetLimit {
                bound: Box::new(Node::new(NodeKind::ToMark(Ae::Name(X)))),
                body: Box::new(body),
            })),
            inner.clone().prop_map(|body| Node::new(NodeKind::Dollar {
                variable: WORD,
                body: Box::new(body),
            })),
        ]
    })
}

// Lines of each generated method, without the signature and closing brace
fn methods(source: &str) -> Vec<Vec<&str>> {
    let mut methods = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in source.lines() {
        if line.starts_with("    public function ") || line.starts_with("    protected function ") {
            current = Some(Vec::new());
        } else if line == "    }" {
            if let Some(lines) = current.take() {
                methods.push(lines);
            }
        } else if let Some(lines) = current.as_mut() {
            lines.push(line.trim());
        }
    }

    methods
}

fn label_of(line: &str) -> Option<&str> {
    line.strip_suffix(':')
        .filter(|name| name.starts_with("lab") && !name.contains(' '))
}

fn goto_target(line: &str) -> Option<&str> {
    line.strip_prefix("goto ").and_then(|rest| rest.strip_suffix(';'))
}

fn is_terminator(line: &str) -> bool {
    line.starts_with("return ")
        || line.starts_with("goto ")
        || line == "break;"
        || line == "continue;"
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockKind {
    If,
    For,
    While,
    Switch,
    Bare,
}

struct Block {
    kind: BlockKind,
    // Whether the statement that opened the block was reachable
    entered: bool,
    // Whether a reachable `break` leaves this block
    broken_out_of: bool,
}

impl Block {
    // Reachability of the statement after the closing brace
    fn after(&self, end_reachable: bool) -> bool {
        match self.kind {
            // The condition can be false, and the body can run zero times
            BlockKind::If | BlockKind::For => self.entered,
            BlockKind::While => self.broken_out_of,
            // The cases cover every outcome of the lookup
            BlockKind::Switch => self.broken_out_of || end_reachable,
            BlockKind::Bare => end_reachable,
        }
    }
}

/// Every `goto` has exactly one matching label in its method, no statement follows a jump
/// unless a label makes it reachable again, and the method can't run off its end.
/// Reachability after a block depends on what opened it: `while(true)` is only left by
/// its own `break`, a bare `{ }` carries the state of its last statement.
fn check_control_flow(method: &[&str]) -> Result<(), String> {
    let mut labels: HashMap<&str, usize> = HashMap::new();
    let mut targets: HashSet<&str> = HashSet::new();

    for line in method {
        if let Some(label) = label_of(line) {
            *labels.entry(label).or_default() += 1;
        }
        if let Some(target) = goto_target(line) {
            targets.insert(target);
        }
    }

    for (label, count) in &labels {
        if *count != 1 {
            return Err(format!("{} defined {} times", label, count));
        }
    }
    for target in &targets {
        if !labels.contains_key(target) {
            return Err(format!("goto {} has no label", target));
        }
    }

    let mut blocks: Vec<Block> = Vec::new();
    let mut header: Option<BlockKind> = None;
    let mut reachable = true;

    for line in method {
        if let Some(label) = label_of(line) {
            reachable = reachable || targets.contains(label);
            continue;
        }

        if line.starts_with("//") {
            continue;
        }

        if *line == "{" {
            blocks.push(Block {
                kind: header.take().unwrap_or(BlockKind::Bare),
                entered: reachable,
                broken_out_of: false,
            });
            continue;
        }
        if header.is_some() {
            return Err(format!("'{}' follows a header without a block", line));
        }

        if *line == "}" {
            let block = blocks.pop().ok_or("unbalanced '}'")?;
            reachable = block.after(reachable);
            continue;
        }

        if line.starts_with("case ") {
            let Some(switch) = blocks.last().filter(|b| b.kind == BlockKind::Switch) else {
                return Err(format!("'{}' outside a switch", line));
            };
            reachable = switch.entered;
            continue;
        }

        if !reachable {
            return Err(format!("unreachable statement '{}'", line));
        }

        if *line == "break;" {
            let exited = blocks
                .iter_mut()
                .rev()
                .find(|b| matches!(b.kind, BlockKind::While | BlockKind::Switch | BlockKind::For))
                .ok_or("'break' outside a loop")?;
            exited.broken_out_of = true;
        }

        if is_terminator(line) {
            reachable = false;
        } else if line.starts_with("if (") {
            header = Some(BlockKind::If);
        } else if line.starts_with("for (") {
            header = Some(BlockKind::For);
        } else if *line == "while(true)" {
            header = Some(BlockKind::While);
        } else if *line == "while(true){" {
            blocks.push(Block {
                kind: BlockKind::While,
                entered: true,
                broken_out_of: false,
            });
        } else if line.starts_with("switch (") && line.ends_with('{') {
            blocks.push(Block {
                kind: BlockKind::Switch,
                entered: true,
                broken_out_of: false,
            });
        }
    }

    if !blocks.is_empty() {
        return Err(format!("{} blocks left open", blocks.len()));
    }
    if reachable {
        return Err(String::from("method can run off its end"));
    }

    Ok(())
}

#[test]
fn control_flow_check_follows_block_kinds() {
    let accepted = [
        "$v_1 = $this->cursor;",
        "// begin lab0 block:",
        "if (!($this->eq_s(\"a\")))",
        "{",
        "goto lab0;",
        "}",
        "while(true)",
        "{",
        "// begin lab1 block:",
        "if (!($this->eq_s(\"b\")))",
        "{",
        "goto lab1;",
        "}",
        "continue;",
        "lab1:",
        "break;",
        "}",
        "lab0:",
        "return true;",
    ];
    assert_eq!(check_control_flow(&accepted), Ok(()));

    // A bare block that ended in a jump leaves what follows dead
    let after_block = ["{", "return false;", "}", "$this->B_flag = true;", "return true;"];
    assert!(check_control_flow(&after_block).is_err());

    // So does a loop with no `break` of its own
    let after_loop = [
        "while(true)",
        "{",
        "switch ($among_var) {",
        "case 1:",
        "break;",
        "}",
        "continue;",
        "}",
        "$this->B_flag = false;",
        "return true;",
    ];
    assert!(check_control_flow(&after_loop).is_err());
}

#[test]
fn control_flow_check_rejects_running_off_the_end() {
    assert!(check_control_flow(&["$this->B_flag = true;"]).is_err());
    assert!(check_control_flow(&["if ($this->I_x > 1)", "{", "return false;", "}"]).is_err());

    let endless = ["while(true)", "{", "$this->cursor++;", "}"];
    assert_eq!(check_control_flow(&endless), Ok(()));
}

proptest! {
    #[test]
    fn generated_control_flow_is_well_formed(body in tree()) {
        let program = program_for(body);
        let unit = generate_php(&program, &GeneratorConfig::default())
            .map_err(|messages| TestCaseError::fail(format!("{:?}", messages.errors)))?;

        let methods = methods(&unit.source);
        prop_assert_eq!(methods.len(), 2);

        for method in &methods {
            if let Err(problem) = check_control_flow(method) {
                return Err(TestCaseError::fail(format!("{}\n{}", problem, unit.source)));
            }
        }
    }

    #[test]
    fn generation_is_deterministic(body in tree()) {
        let program = program_for(body);
        let config = GeneratorConfig::default();

        let first = generate_php(&program, &config)
            .map_err(|messages| TestCaseError::fail(format!("{:?}", messages.errors)))?;
        let second = generate_php(&program, &config)
            .map_err(|messages| TestCaseError::fail(format!("{:?}", messages.errors)))?;
        let sequential = lower_program_to_php_sequential(&program, &config)
            .map_err(|error| TestCaseError::fail(error.msg))?;

        prop_assert_eq!(&first.source, &second.source);
        prop_assert_eq!(&first.source, &sequential.source);
    }

    #[test]
    fn inferred_cursor_usage_still_generates(body in tree()) {
        let program = program_for(body);
        let config = GeneratorConfig {
            infer_cursor_usage: true,
            ..GeneratorConfig::default()
        };

        let unit = generate_php(&program, &config)
            .map_err(|messages| TestCaseError::fail(format!("{:?}", messages.errors)))?;
        for method in &methods(&unit.source) {
            if let Err(problem) = check_control_flow(method) {
                return Err(TestCaseError::fail(problem));
            }
        }
    }
}

#[test]
fn malformed_programs_are_rejected_before_generation() {
    let body = Node::new(NodeKind::Or(vec![Node::new(NodeKind::Delete)]));
    let mut program = program_for(body);
    program.definitions.push(Node::new(NodeKind::Next));

    let messages = generate_php(&program, &GeneratorConfig::default())
        .expect_err("malformed program should be rejected");

    assert_eq!(messages.errors.len(), 2);
    assert!(
        messages
            .errors
            .iter()
            .all(|error| error.error_type == ErrorType::MalformedProgram)
    );
}

#[test]
fn inferred_saves_replace_missing_ones() {
    let body = Node::new(NodeKind::Try(Box::new(Node::new(NodeKind::Bra(vec![
        Node::new(NodeKind::Literal(String::from("a"))),
        Node::new(NodeKind::Literal(String::from("b"))),
    ])))));
    let program = program_for(body);

    let plain = generate_php(&program, &GeneratorConfig::default()).expect("should generate");
    assert!(!plain.source.contains("$v_1 = $this->cursor;"));

    let config = GeneratorConfig {
        infer_cursor_usage: true,
        ..GeneratorConfig::default()
    };
    let inferred = generate_php(&program, &config).expect("should generate");
    assert!(inferred.source.contains("$v_1 = $this->cursor;"));
    assert!(inferred.source.contains("$this->cursor = $v_1;\n            goto lab0;"));
}

#[test]
fn config_names_the_class() {
    let config = GeneratorConfig::from_toml(
        "class_name = \"EnglishStemmer\"\nheader_comment = \"english\"\n",
    )
    .expect("config should parse");
    assert!(!config.comments);

    let unit = generate_php(&program_for(Node::new(NodeKind::Delete)), &config)
        .expect("should generate");
    assert!(
        unit.source
            .starts_with("<?php\n// english\n\nclass EnglishStemmer extends SnowballProgram {\n")
    );
}

#[test]
fn bad_config_is_rejected() {
    let error = GeneratorConfig::from_toml("class_name = \"not-a-class\"\n")
        .expect_err("hyphen is not valid in a class name");
    assert_eq!(error.error_type, ErrorType::Config);

    let error = GeneratorConfig::from_toml("unknown_setting = true\n")
        .expect_err("unknown keys are rejected");
    assert_eq!(error.error_type, ErrorType::Config);

    let error = GeneratorConfig::from_toml("header_comment = \"two\\nlines\"\n")
        .expect_err("header must be one line");
    assert_eq!(error.error_type, ErrorType::Config);
}

#[test]
fn grouping_past_the_last_code_point_is_rejected() {
    let body = Node::new(NodeKind::Grouping {
        grouping: VOWEL,
        complement: false,
    });
    let mut program = program_for(body);
    program.groupings[0].smallest_ch = 0;
    program.groupings[0].largest_ch = u32::MAX;

    let messages = generate_php(&program, &GeneratorConfig::default())
        .expect_err("oversized grouping should be rejected");
    assert_eq!(messages.errors.len(), 1);
    assert_eq!(messages.errors[0].error_type, ErrorType::MalformedProgram);
}
