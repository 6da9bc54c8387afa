use crate::ast::{Node, NodeKind};
use crate::lexer::TokenKind;
use crate::parser::grammar::{expr, function, Context};
use crate::parser::Parser;
use crate::scope::Scopes;

/// `class NAME [extends PARENT] <block-of-methods>`
///
/// Methods are introduced by the `function` keyword or the soft keyword
/// `method` (a plain identifier everywhere else). Collection stops at the
/// first non-method token; a terminal `Dedent` is consumed if immediately
/// present.
pub(crate) fn class_definition(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Node {
    p.advance(); // `class`
    let Some(name) = p.ident_lexeme() else {
        p.recover("expected a class name");
        return Node::noop(p.scope);
    };

    let parent = if p.eat(TokenKind::Extends) {
        let parent = p.ident_lexeme();
        if parent.is_none() {
            p.err("expected a parent class name after `extends`");
        }
        parent
    } else {
        None
    };

    if p.at(TokenKind::Newline) {
        p.advance();
    }
    p.eat(TokenKind::Indent);

    let saved = p.scope;
    p.scope = s.enter(saved);
    let mut methods = Vec::new();
    loop {
        while p.at(TokenKind::Newline) {
            p.advance();
        }
        if p.at(TokenKind::Function) {
            p.advance();
            methods.push(function::function_tail(p, s, cx, depth + 1, true));
        } else if p.at(TokenKind::Ident) && p.current().lexeme() == "method" {
            p.advance();
            methods.push(function::function_tail(p, s, cx, depth + 1, true));
        } else {
            break;
        }
    }
    p.scope = saved;

    if p.at(TokenKind::Dedent) {
        p.advance();
    }

    p.node(NodeKind::ClassDef {
        name,
        parent,
        methods,
    })
}

/// `new ClassName args...`: arguments as in a function call, with optional
/// commas between them.
pub(crate) fn new_expression(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    p.advance(); // `new`
    let Some(class) = p.ident_lexeme() else {
        p.recover("expected a class name after `new`");
        return Node::noop(p.scope);
    };

    let cx = cx.with_call_args();
    let mut args = Vec::new();
    while function::starts_arguments(p.current().kind()) {
        args.push(expr::expression(p, s, cx));
        p.eat(TokenKind::Comma);
    }

    p.node(NodeKind::New { class, args })
}
