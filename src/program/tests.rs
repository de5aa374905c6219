use crate::compiler_messages::compiler_errors::{ErrorMetaDataKey, ErrorType};
use crate::program::ast_nodes::{Ae, Node, NodeKind, SearchStyle};
use crate::program::cursor_usage::{annotate_cursor_usage, may_move_cursor, repeat_score};
use crate::program::program::{
    Among, AmongEntry, AmongId, Grouping, Name, NameId, NameKind, Program,
};
use crate::program::validation::validate_program;

const STEM: NameId = NameId(0);
const X: NameId = NameId(1);
const FLAG: NameId = NameId(2);
const HELPER: NameId = NameId(3);
const VOWEL: NameId = NameId(4);

fn node(kind: NodeKind) -> Node {
    Node::new(kind)
}

fn literal(text: &str) -> Node {
    node(NodeKind::Literal(text.to_owned()))
}

fn define(routine: NameId, body: Node) -> Node {
    node(NodeKind::Define {
        routine,
        body: Box::new(body),
    })
}

fn program(definitions: Vec<Node>) -> Program {
    Program {
        names: vec![
            Name::new("stem", NameKind::External),
            Name::new("x", NameKind::Integer),
            Name::new("flag", NameKind::Boolean),
            Name::new("helper", NameKind::Routine),
            Name::new("v", NameKind::Grouping),
        ],
        amongs: Vec::new(),
        groupings: vec![Grouping {
            name: VOWEL,
            smallest_ch: 97,
            largest_ch: 117,
            members: vec![97, 101, 105, 111, 117],
        }],
        definitions,
    }
}

fn among_with(commands: Vec<Node>, result_used: bool, result: i32) -> Among {
    Among {
        separate_substring: false,
        result_used,
        always_matches: false,
        no_outcome_branch: false,
        commands,
        entries: vec![AmongEntry {
            text: String::from("ing"),
            substring_index: -1,
            result,
            function: None,
        }],
        line: 3,
    }
}

#[test]
fn well_formed_program_passes() {
    let body = node(NodeKind::Bra(vec![
        node(NodeKind::Or(vec![literal("a"), literal("b")])),
        node(NodeKind::IntegerAssign {
            variable: X,
            op: crate::program::ast_nodes::AssignOp::Plus,
            value: Ae::Number(1),
        }),
        node(NodeKind::Grouping {
            grouping: VOWEL,
            complement: false,
        }),
        node(NodeKind::Call(HELPER)),
        node(NodeKind::Set(FLAG)),
    ]));

    let program = program(vec![define(STEM, body), define(HELPER, literal("c"))]);
    assert!(validate_program(&program).is_empty());
}

#[test]
fn or_needs_two_branches() {
    let body = node(NodeKind::Or(vec![literal("a")])).at_line(12);
    let program = program(vec![define(STEM, body)]);

    let errors = validate_program(&program);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_type, ErrorType::MalformedProgram);
    assert_eq!(errors[0].location.line, 12);
    assert_eq!(errors[0].location.routine.as_deref(), Some("stem"));
    assert_eq!(
        errors[0].metadata.get(&ErrorMetaDataKey::NodeKind).map(String::as_str),
        Some("or")
    );
}

#[test]
fn name_kinds_are_checked() {
    let body = node(NodeKind::Bra(vec![
        node(NodeKind::Set(X)),
        node(NodeKind::Call(FLAG)),
        node(NodeKind::IntegerTest {
            left: Ae::Name(FLAG),
            op: crate::program::ast_nodes::RelOp::Eq,
            right: Ae::Number(0),
        }),
        node(NodeKind::SetMark(NameId(40))),
    ]));
    let program = program(vec![define(STEM, body)]);

    let errors = validate_program(&program);
    assert_eq!(errors.len(), 4);
    assert!(errors[0].msg.contains("'x' is used as Boolean"));
    assert!(errors[1].msg.contains("'flag' is not a routine"));
    assert!(errors[2].msg.contains("'flag' is used as Integer"));
    assert!(errors[3].msg.contains("unknown name id 40"));
}

#[test]
fn definitions_must_be_top_level_routines() {
    let nested = node(NodeKind::Bra(vec![define(HELPER, literal("a"))]));
    let program = program(vec![
        define(STEM, nested),
        define(X, literal("b")),
        literal("c"),
    ]);

    let errors = validate_program(&program);
    assert_eq!(errors.len(), 3);
    assert!(errors[0].msg.contains("can't be nested"));
    assert!(errors[1].msg.contains("'x' is not a routine"));
    assert!(errors[2].msg.contains("only routine definitions"));
}

#[test]
fn groupings_and_amongs_are_checked() {
    let mut program = program(vec![define(
        STEM,
        node(NodeKind::Bra(vec![
            node(NodeKind::Among(AmongId(0))),
            node(NodeKind::Substring(AmongId(5))),
            node(NodeKind::GroupingSearch {
                style: SearchStyle::To,
                grouping: X,
                complement: false,
            }),
        ])),
    )]);
    program.groupings[0].members.push(200);
    program.amongs.push(among_with(vec![literal("a")], false, 2));

    let errors = validate_program(&program);
    let messages: Vec<&str> = errors.iter().map(|e| e.msg.as_str()).collect();

    assert_eq!(errors.len(), 5, "{:?}", messages);
    assert!(messages[0].contains("outside its range"));
    assert!(messages[1].contains("unknown among table 5"));
    assert!(messages[2].contains("'x' is used as Grouping"));
    assert!(messages[3].contains("no character table"));
    assert!(messages[4].contains("selects outcome 2"));
}

#[test]
fn grouping_range_stops_at_the_last_code_point() {
    let mut program = program(Vec::new());
    program.groupings[0].smallest_ch = 0;
    program.groupings[0].largest_ch = u32::MAX;

    let errors = validate_program(&program);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_type, ErrorType::MalformedProgram);
    assert!(errors[0].msg.contains("past the last code point"));

    program.groupings[0].largest_ch = char::MAX as u32;
    assert!(validate_program(&program).is_empty());
}

#[test]
fn negative_hop_distance_is_accepted() {
    let program = program(vec![define(STEM, node(NodeKind::Hop(Ae::Number(-2))))]);
    assert!(validate_program(&program).is_empty());
}

#[test]
fn dispatch_needs_the_result() {
    let program = Program {
        amongs: vec![among_with(vec![literal("a"), literal("b")], false, 1)],
        ..program(Vec::new())
    };

    let errors = validate_program(&program);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].msg.contains("result is marked unused"));
}

#[test]
fn cursor_movement_is_inferred() {
    let program = program(vec![
        define(STEM, literal("a")),
        define(HELPER, node(NodeKind::Set(FLAG))),
    ]);

    assert!(!may_move_cursor(&program, &[node(NodeKind::Set(FLAG))], 0));
    assert!(!may_move_cursor(&program, &[node(NodeKind::Not(Box::new(literal("a"))))], 0));
    assert!(!may_move_cursor(&program, &[node(NodeKind::Call(HELPER))], 0));
    assert!(may_move_cursor(&program, &[node(NodeKind::Call(STEM))], 0));
    assert!(may_move_cursor(&program, &[node(NodeKind::Next)], 0));

    assert_eq!(repeat_score(&program, &[literal("a")], 0), 1);
    assert_eq!(repeat_score(&program, &[literal("a"), node(NodeKind::Next)], 0), 2);
    assert_eq!(repeat_score(&program, &[node(NodeKind::ToLimit)], 0), 2);
}

#[test]
fn recursive_calls_are_assumed_to_move() {
    let program = program(vec![define(HELPER, node(NodeKind::Call(HELPER)))]);

    assert!(may_move_cursor(&program, &[node(NodeKind::Call(HELPER))], 0));
    assert_eq!(repeat_score(&program, &[node(NodeKind::Call(HELPER))], 0), 2);
}

#[test]
fn annotation_sets_both_predicates() {
    let try_node = node(NodeKind::Try(Box::new(node(NodeKind::Bra(vec![
        literal("a"),
        literal("b"),
    ])))));
    let test_node = node(NodeKind::Test(Box::new(node(NodeKind::Set(FLAG)))));
    let repeat_single = node(NodeKind::Repeat(Box::new(literal("a"))));
    let repeat_double = node(NodeKind::Repeat(Box::new(node(NodeKind::Bra(vec![
        literal("a"),
        literal("b"),
    ])))));

    let source = program(vec![define(
        STEM,
        node(NodeKind::Bra(vec![
            try_node,
            test_node,
            repeat_single,
            repeat_double,
        ])),
    )]);
    let annotated = annotate_cursor_usage(&source);

    let NodeKind::Define { body, .. } = &annotated.definitions[0].kind else {
        panic!("expected a definition");
    };
    let NodeKind::Bra(statements) = &body.kind else {
        panic!("expected a statement list");
    };

    assert!(statements[0].cursor_save);
    assert!(!statements[1].cursor_save);
    assert!(!statements[2].repeat_restore);
    assert!(statements[3].repeat_restore);

    // The input is left alone
    assert_ne!(annotated, source);
}

#[test]
fn program_round_trips_through_json() {
    let mut original = program(vec![define(
        STEM,
        node(NodeKind::Search {
            style: SearchStyle::Past,
            body: Box::new(literal("é")),
        })
        .at_line(2)
        .restoring_per_iteration(),
    )]);
    original.amongs.push(among_with(vec![node(NodeKind::Delete)], false, 1));

    let json = original.to_json().expect("program should encode");
    let decoded = Program::from_json(&json).expect("program should decode");
    assert_eq!(decoded, original);
}

#[test]
fn json_defaults_are_filled_in() {
    let json = r#"{
        "names": [{ "name": "stem", "kind": "external" }],
        "definitions": [
            { "kind": { "define": { "routine": 0, "body": { "kind": "delete" } } } }
        ]
    }"#;

    let program = Program::from_json(json).expect("program should decode");
    assert!(program.names[0].used);
    assert!(program.amongs.is_empty());
    assert_eq!(program.routine_body(STEM).map(|body| &body.kind), Some(&NodeKind::Delete));
    assert!(validate_program(&program).is_empty());
}
