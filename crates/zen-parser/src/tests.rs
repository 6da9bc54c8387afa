//! End-to-end parser tests: the round-trip scenarios from the language
//! contract plus recovery, limits, and scope-aware disambiguation.

use crate::ast::{ImportName, Node, NodeKind, Param, Property, PropertyPath};
use crate::parser::ParseResult;
use crate::scope::{ScopeId, Scopes};
use crate::{Lexer, Parser, TokenKind};
use expect_test::expect;
use pretty_assertions::assert_eq;
use unindent::unindent;

fn parse(source: &str) -> (ParseResult, Scopes) {
    let mut scopes = Scopes::new();
    let mut parser = Parser::new(Lexer::new(source));
    let result = parser.parse(&mut scopes);
    (result, scopes)
}

fn parse_ok(source: &str) -> Node {
    let (result, _) = parse(source);
    assert!(
        !result.has_errors(),
        "unexpected errors: {:?}",
        result.errors()
    );
    result.into_root()
}

fn statements(root: &Node) -> &[Node] {
    match &root.kind {
        NodeKind::Compound(stmts) => stmts,
        _ => panic!("root is not a Compound"),
    }
}

/// Node in the global scope.
fn g(kind: NodeKind) -> Node {
    Node::new(kind, ScopeId::GLOBAL)
}

/// Node in the `n`-th scope created during the parse.
fn in_scope(n: u32, kind: NodeKind) -> Node {
    Node::new(kind, ScopeId(n))
}

fn num(value: f64) -> Node {
    g(NodeKind::Number(value))
}

fn text(value: &str) -> Node {
    g(NodeKind::Str(value.into()))
}

fn var(name: &str) -> Node {
    g(NodeKind::Variable(name.into()))
}

fn call(name: &str, args: Vec<Node>) -> Node {
    g(NodeKind::Call {
        callee: Box::new(var(name)),
        args,
    })
}

#[test]
fn s1_function_call_vs_variable() {
    let root = parse_ok("set x 5\nprint x");
    let expected = g(NodeKind::Compound(vec![
        g(NodeKind::VarDef {
            name: "x".into(),
            init: Box::new(num(5.0)),
        }),
        call("print", vec![var("x")]),
    ]));
    assert_eq!(root, expected);
}

#[test]
fn s2_object_literal_in_assignment() {
    let root = parse_ok("set p name \"Alice\", age 30");
    let expected = g(NodeKind::Compound(vec![g(NodeKind::VarDef {
        name: "p".into(),
        init: Box::new(g(NodeKind::Object {
            keys: vec!["name".into(), "age".into()],
            values: vec![text("Alice"), num(30.0)],
        })),
    })]));
    assert_eq!(root, expected);
}

#[test]
fn s3_numeric_call_is_not_an_object() {
    let root = parse_ok("function sq n\n    return n\nsq 42");
    let expected = g(NodeKind::Compound(vec![
        g(NodeKind::FuncDef {
            name: "sq".into(),
            params: vec![Param::Name("n".into())],
            body: Box::new(in_scope(
                1,
                NodeKind::Compound(vec![in_scope(
                    1,
                    NodeKind::Return(Some(Box::new(in_scope(
                        1,
                        NodeKind::Variable("n".into()),
                    )))),
                )]),
            )),
        }),
        call("sq", vec![num(42.0)]),
    ]));
    assert_eq!(root, expected);
}

#[test]
fn s4_indented_block_initializer() {
    let root = parse_ok("set a\n    1, 2, 3");
    let expected = g(NodeKind::Compound(vec![g(NodeKind::VarDef {
        name: "a".into(),
        init: Box::new(g(NodeKind::Array(vec![num(1.0), num(2.0), num(3.0)]))),
    })]));
    assert_eq!(root, expected);
}

#[test]
fn s5_method_call_promotion() {
    let root = parse_ok("obj.greet \"hi\"");
    let expected = g(NodeKind::Compound(vec![g(NodeKind::Call {
        callee: Box::new(g(NodeKind::PropertyAccess {
            object: Box::new(var("obj")),
            property: Property::Name("greet".into()),
        })),
        args: vec![text("hi")],
    })]));
    assert_eq!(root, expected);
}

#[test]
fn s6_error_recovery_across_a_bad_line() {
    let (result, _) = parse("set x @@@\nset y 1");
    assert!(result.has_errors());
    assert!(result.error_count() >= 1);

    let root = result.into_root();
    let stmts = statements(&root);
    let recovered = g(NodeKind::VarDef {
        name: "y".into(),
        init: Box::new(num(1.0)),
    });
    assert_eq!(stmts.last(), Some(&recovered));
}

#[test]
fn tree_snapshot() {
    let (result, _) = parse("set x 5\nprint x");
    expect![[r#"
        - COMPOUND
            - VARIABLE_DEFINITION "x"
                - NUMBER 5
            - CALL "print"
                - VARIABLE "x"
    "#]]
    .assert_eq(&format!("{result:?}"));
}

#[test]
fn scope_aware_disambiguation() {
    // Without a function named `point`, `set` lookahead sees a record.
    let root = parse_ok("set p point 1, extra 2");
    let NodeKind::VarDef { init, .. } = &statements(&root)[0].kind else {
        panic!("expected a variable definition");
    };
    assert!(matches!(init.kind, NodeKind::Object { .. }));

    // Defining `function point` first must flip the same text to calls.
    let source = unindent(
        "
        function point x
            return x
        set p point 1, extra 2
        ",
    );
    let root = parse_ok(&source);
    let NodeKind::VarDef { init, .. } = &statements(&root)[1].kind else {
        panic!("expected a variable definition");
    };
    assert!(
        !matches!(init.kind, NodeKind::Object { .. }),
        "function name must not parse as an object key"
    );
}

#[test]
fn standalone_identifier_is_a_call_statement() {
    let root = parse_ok("set x 5\nx");
    assert_eq!(statements(&root)[1], call("x", vec![]));
}

#[test]
fn standalone_promotion_stays_out_of_nested_expressions() {
    // `return n` keeps `n` a variable; `print n` keeps the argument one.
    let root = parse_ok("function f n\n    return n");
    let NodeKind::FuncDef { body, .. } = &statements(&root)[0].kind else {
        panic!("expected a function definition");
    };
    let NodeKind::Compound(body) = &body.kind else {
        panic!("expected a compound body");
    };
    assert!(matches!(
        &body[0].kind,
        NodeKind::Return(Some(value)) if matches!(value.kind, NodeKind::Variable(_))
    ));
}

#[test]
fn builtin_name_always_calls() {
    let root = parse_ok("print");
    assert_eq!(statements(&root)[0], call("print", vec![]));

    // Builtins nested in arguments call too.
    let root = parse_ok("print input");
    assert_eq!(
        statements(&root)[0],
        call("print", vec![call("input", vec![])])
    );
}

#[test]
fn comma_statement_becomes_array() {
    let root = parse_ok("1, 2, 3");
    assert_eq!(
        statements(&root)[0],
        g(NodeKind::Array(vec![num(1.0), num(2.0), num(3.0)]))
    );
}

#[test]
fn binary_precedence_and_associativity() {
    let root = parse_ok("set r 1 + 2 * 3");
    let expected = g(NodeKind::VarDef {
        name: "r".into(),
        init: Box::new(g(NodeKind::Binary {
            op: TokenKind::Plus,
            lhs: Box::new(num(1.0)),
            rhs: Box::new(g(NodeKind::Binary {
                op: TokenKind::Star,
                lhs: Box::new(num(2.0)),
                rhs: Box::new(num(3.0)),
            })),
        })),
    });
    assert_eq!(statements(&root)[0], expected);

    let root = parse_ok("set r 1 - 2 - 3");
    let expected = g(NodeKind::VarDef {
        name: "r".into(),
        init: Box::new(g(NodeKind::Binary {
            op: TokenKind::Minus,
            lhs: Box::new(g(NodeKind::Binary {
                op: TokenKind::Minus,
                lhs: Box::new(num(1.0)),
                rhs: Box::new(num(2.0)),
            })),
            rhs: Box::new(num(3.0)),
        })),
    });
    assert_eq!(statements(&root)[0], expected);
}

#[test]
fn range_shares_additive_precedence() {
    let root = parse_ok("set r 1..5");
    let expected = g(NodeKind::VarDef {
        name: "r".into(),
        init: Box::new(g(NodeKind::Binary {
            op: TokenKind::Range,
            lhs: Box::new(num(1.0)),
            rhs: Box::new(num(5.0)),
        })),
    });
    assert_eq!(statements(&root)[0], expected);
}

#[test]
fn unary_operators() {
    let root = parse_ok("set r not true");
    let expected = g(NodeKind::VarDef {
        name: "r".into(),
        init: Box::new(g(NodeKind::Unary {
            op: TokenKind::Not,
            operand: Box::new(g(NodeKind::Bool(true))),
        })),
    });
    assert_eq!(statements(&root)[0], expected);
}

#[test]
fn if_else() {
    let source = unindent(
        "
        if x > 1
            print \"big\"
        else
            print \"small\"
        ",
    );
    let root = parse_ok(&source);
    let expected = g(NodeKind::If {
        condition: Box::new(g(NodeKind::Binary {
            op: TokenKind::Gt,
            lhs: Box::new(var("x")),
            rhs: Box::new(num(1.0)),
        })),
        body: Box::new(g(NodeKind::Compound(vec![call(
            "print",
            vec![text("big")],
        )]))),
        else_body: Some(Box::new(g(NodeKind::Compound(vec![call(
            "print",
            vec![text("small")],
        )])))),
    });
    assert_eq!(statements(&root)[0], expected);
}

#[test]
fn else_if_chains_nest() {
    let source = unindent(
        "
        if a
            print 1
        else if b
            print 2
        else
            print 3
        ",
    );
    let root = parse_ok(&source);
    let NodeKind::If { else_body, .. } = &statements(&root)[0].kind else {
        panic!("expected an if statement");
    };
    let nested = else_body.as_ref().expect("missing else");
    let NodeKind::If { else_body, .. } = &nested.kind else {
        panic!("`else if` must nest an if statement");
    };
    assert!(else_body.is_some());
}

#[test]
fn loop_bodies_get_their_own_scope() {
    let root = parse_ok("while x\n    set y 1");
    let expected = g(NodeKind::While {
        condition: Box::new(var("x")),
        body: Box::new(in_scope(
            1,
            NodeKind::Compound(vec![in_scope(
                1,
                NodeKind::VarDef {
                    name: "y".into(),
                    init: Box::new(in_scope(1, NodeKind::Number(1.0))),
                },
            )]),
        )),
    });
    assert_eq!(statements(&root)[0], expected);
}

#[test]
fn for_in_loop() {
    let root = parse_ok("for item in items\n    print item");
    let expected = g(NodeKind::ForIn {
        binding: "item".into(),
        iterable: Box::new(var("items")),
        body: Box::new(in_scope(
            1,
            NodeKind::Compound(vec![in_scope(
                1,
                NodeKind::Call {
                    callee: Box::new(in_scope(1, NodeKind::Variable("print".into()))),
                    args: vec![in_scope(1, NodeKind::Variable("item".into()))],
                },
            )]),
        )),
    });
    assert_eq!(statements(&root)[0], expected);
}

#[test]
fn class_with_function_and_soft_keyword_methods() {
    let source = unindent(
        "
        class Dog extends Animal
            function bark
                return \"woof\"
            method name
                return \"dog\"
        ",
    );
    let root = parse_ok(&source);
    let NodeKind::ClassDef {
        name,
        parent,
        methods,
    } = &statements(&root)[0].kind
    else {
        panic!("expected a class definition");
    };
    assert_eq!(name, "Dog");
    assert_eq!(parent.as_deref(), Some("Animal"));
    assert_eq!(methods.len(), 2);
    assert!(matches!(
        &methods[0].kind,
        NodeKind::FuncDef { name, .. } if name == "bark"
    ));
    assert!(matches!(
        &methods[1].kind,
        NodeKind::FuncDef { name, .. } if name == "name"
    ));
}

#[test]
fn method_bodies_suppress_object_lookahead() {
    let source = unindent(
        "
        class Point
            method dump
                set p name \"x\", age 1
        ",
    );
    let root = parse_ok(&source);
    let NodeKind::ClassDef { methods, .. } = &statements(&root)[0].kind else {
        panic!("expected a class definition");
    };
    let NodeKind::FuncDef { body, .. } = &methods[0].kind else {
        panic!("expected a method");
    };
    let NodeKind::Compound(body) = &body.kind else {
        panic!("expected a compound body");
    };
    let NodeKind::VarDef { init, .. } = &body[0].kind else {
        panic!("expected a variable definition");
    };
    assert!(
        !matches!(init.kind, NodeKind::Object { .. }),
        "object literals must not form inside method bodies"
    );
}

#[test]
fn new_expression_with_optional_commas() {
    let root = parse_ok("set p new Point 3, 4");
    let NodeKind::VarDef { init, .. } = &statements(&root)[0].kind else {
        panic!("expected a variable definition");
    };
    let NodeKind::New { class, args } = &init.kind else {
        panic!("expected a new expression");
    };
    assert_eq!(class, "Point");
    assert_eq!(args, &vec![num(3.0), num(4.0)]);
}

#[test]
fn import_variants() {
    let root = parse_ok("import \"math\"");
    assert_eq!(
        statements(&root)[0],
        g(NodeKind::Import {
            path: "math".into(),
            names: vec![],
        })
    );

    let root = parse_ok("import sin, cos cosine from \"trig\"");
    assert_eq!(
        statements(&root)[0],
        g(NodeKind::Import {
            path: "trig".into(),
            names: vec![
                ImportName {
                    name: "sin".into(),
                    alias: None,
                },
                ImportName {
                    name: "cos".into(),
                    alias: Some("cosine".into()),
                },
            ],
        })
    );
}

#[test]
fn export_variants() {
    let root = parse_ok("export set x 1");
    let NodeKind::Export { name, value } = &statements(&root)[0].kind else {
        panic!("expected an export");
    };
    assert_eq!(name, "x");
    assert!(matches!(value.kind, NodeKind::VarDef { .. }));

    let root = parse_ok("export function f x\n    return x");
    let NodeKind::Export { name, value } = &statements(&root)[0].kind else {
        panic!("expected an export");
    };
    assert_eq!(name, "f");
    assert!(matches!(value.kind, NodeKind::FuncDef { .. }));

    let root = parse_ok("export foo bar");
    assert_eq!(
        statements(&root)[0],
        g(NodeKind::Export {
            name: "bar".into(),
            value: Box::new(var("foo")),
        })
    );
}

#[test]
fn get_with_property_path() {
    let root = parse_ok("get \"config.json\".settings.debug");
    assert_eq!(
        statements(&root)[0],
        g(NodeKind::FileGet {
            path: Box::new(text("config.json")),
            property: Some(PropertyPath(vec!["settings".into(), "debug".into()])),
        })
    );
}

#[test]
fn put_with_value() {
    let root = parse_ok("put \"config.json\".debug true");
    assert_eq!(
        statements(&root)[0],
        g(NodeKind::FilePut {
            path: Box::new(text("config.json")),
            property: Some(PropertyPath(vec!["debug".into()])),
            value: Box::new(g(NodeKind::Bool(true))),
        })
    );
}

#[test]
fn put_promotes_file_references() {
    let root = parse_ok("put \"a.json\".x \"@ b.json c.d\"");
    let NodeKind::FilePut { value, .. } = &statements(&root)[0].kind else {
        panic!("expected a file put");
    };
    assert_eq!(
        **value,
        g(NodeKind::FileGet {
            path: Box::new(text("b.json")),
            property: Some(PropertyPath(vec!["c".into(), "d".into()])),
        })
    );
}

#[test]
fn compound_assignment() {
    let root = parse_ok("count += 1");
    assert_eq!(
        statements(&root)[0],
        g(NodeKind::CompoundAssign {
            op: TokenKind::PlusEq,
            target: Box::new(var("count")),
            value: Box::new(num(1.0)),
        })
    );
}

#[test]
fn rest_parameters_and_spread_arguments() {
    let source = unindent(
        "
        function join sep ...parts
            return parts
        join \",\" ...list
        ",
    );
    let root = parse_ok(&source);
    let stmts = statements(&root);
    let NodeKind::FuncDef { params, .. } = &stmts[0].kind else {
        panic!("expected a function definition");
    };
    assert_eq!(
        params,
        &vec![Param::Name("sep".into()), Param::Rest("parts".into())]
    );

    let NodeKind::Call { args, .. } = &stmts[1].kind else {
        panic!("expected a call");
    };
    assert!(matches!(
        &args[1].kind,
        NodeKind::Spread(inner) if matches!(inner.kind, NodeKind::Variable(_))
    ));
}

#[test]
fn rest_parameter_must_be_last() {
    let (result, _) = parse("function f ...a b\n    return a");
    assert!(result.has_errors());
}

#[test]
fn try_catch_throw() {
    let source = unindent(
        "
        try
            throw \"boom\"
        catch err
            print err
        ",
    );
    let root = parse_ok(&source);
    let expected = g(NodeKind::TryCatch {
        try_body: Box::new(g(NodeKind::Compound(vec![g(NodeKind::Throw(Some(
            Box::new(text("boom")),
        )))]))),
        catch_body: Box::new(g(NodeKind::Compound(vec![call(
            "print",
            vec![var("err")],
        )]))),
        exception: Some("err".into()),
    });
    assert_eq!(statements(&root)[0], expected);
}

#[test]
fn nested_function_definitions_register_in_inner_scopes() {
    let source = unindent(
        "
        function outer
            function inner
                return 1
            return inner
        outer
        ",
    );
    let (result, scopes) = parse(&source);
    assert!(!result.has_errors(), "{:?}", result.errors());

    // `outer` lands in the global table, `inner` in outer's body scope.
    assert!(scopes.is_function(ScopeId::GLOBAL, "outer"));
    assert!(!scopes.is_function(ScopeId::GLOBAL, "inner"));
    assert!(scopes.is_function(ScopeId(1), "inner"));

    let root = result.into_root();
    assert_eq!(statements(&root)[1], call("outer", vec![]));
}

#[test]
fn indexing_and_property_chains() {
    let root = parse_ok("print rows[0].name");
    let NodeKind::Call { args, .. } = &statements(&root)[0].kind else {
        panic!("expected a call");
    };
    let NodeKind::PropertyAccess { object, property } = &args[0].kind else {
        panic!("expected a property access");
    };
    assert!(matches!(property, Property::Name(name) if name == "name"));
    assert!(matches!(
        &object.kind,
        NodeKind::PropertyAccess {
            property: Property::Index(_),
            ..
        }
    ));
}

#[test]
fn missing_initializer_recovers() {
    let (result, _) = parse("set x\nset y 2");
    assert!(result.has_errors());
    let root = result.into_root();
    let stmts = statements(&root);
    assert_eq!(stmts.len(), 2);
    assert_eq!(
        stmts[1],
        g(NodeKind::VarDef {
            name: "y".into(),
            init: Box::new(num(2.0)),
        })
    );
}

#[test]
fn parser_state_accessors() {
    let mut scopes = Scopes::new();
    let mut parser = Parser::new(Lexer::new("set x @@@\nset y 1"));
    let result = parser.parse(&mut scopes);

    assert!(parser.has_errors());
    assert_eq!(parser.error_count(), result.error_count());
    assert!(!parser.in_panic_mode());
}

#[test]
fn error_positions_point_at_the_offender() {
    let (result, _) = parse("set x @@@");
    let first = &result.errors()[0];
    assert_eq!(first.line(), 1);
    assert_eq!(first.column(), 7);
}

#[test]
fn garbage_inputs_terminate() {
    for source in [
        "@@@@",
        "((((((",
        ")]}",
        "set",
        "function",
        "... .. .",
        "\"unterminated",
        "else else else",
        "set x ]]]]\nset y 1",
        "new",
        "put",
    ] {
        let (result, _) = parse(source);
        assert!(result.has_errors(), "expected errors for {source:?}");
    }
}

#[test]
fn recursion_limit_produces_a_limit_error() {
    let source = format!("set x {}1{}", "(".repeat(600), ")".repeat(600));
    let mut scopes = Scopes::new();
    let mut parser = Parser::new(Lexer::new(&source));
    let result = parser.parse(&mut scopes);

    assert!(result.errors().iter().any(|e| e.is_limit()));

    // A generous limit parses the same input cleanly.
    let mut scopes = Scopes::new();
    let mut parser = Parser::new(Lexer::new(&source)).recursion_limit(10_000);
    let result = parser.parse(&mut scopes);
    assert!(!result.has_errors(), "{:?}", result.errors());
}

#[test]
fn token_limit_produces_a_limit_error() {
    let mut scopes = Scopes::new();
    let mut parser = Parser::new(Lexer::new("set a 1\nset b 2\nset c 3\nset d 4")).token_limit(5);
    let result = parser.parse(&mut scopes);

    assert!(result.errors().iter().any(|e| e.is_limit()));
    assert!(result.token_limit().high >= 5);
}

#[test]
fn deep_indentation_terminates() {
    let mut source = String::new();
    for depth in 0..600 {
        source.push_str(&" ".repeat(depth * 4));
        source.push_str("if x\n");
    }
    let (result, _) = parse(&source);
    // Deeply nested blocks run into the recursion limit, not a hang.
    assert!(result.errors().iter().any(|e| e.is_limit()));
}
