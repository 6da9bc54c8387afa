use crate::ast::{Node, NodeKind, Property};
use crate::lexer::TokenKind;
use crate::parser::grammar::{class, function, object, Context};
use crate::parser::Parser;
use crate::scope::Scopes;

/// Parse one expression at the lowest precedence. Comma lists are handled
/// one level up in [`stmt::comma_expression`](super::stmt::comma_expression).
pub(crate) fn expression(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    if !p.descend() {
        p.bump_for_limit();
        return Node::noop(p.scope);
    }
    p.expr_depth += 1;
    let node = ternary(p, s, cx);
    p.expr_depth -= 1;
    p.ascend();
    node
}

/// Reserved: `?:` has no surface syntax yet and passes through.
fn ternary(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    null_coalescing(p, s, cx)
}

/// Reserved: passes through to the binary ladder.
fn null_coalescing(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    binary(p, s, cx, 1)
}

/// Precedence-climbing binary parser.
///
/// | prec | operators        |
/// |------|------------------|
/// | 1    | `or`             |
/// | 2    | `and`            |
/// | 3    | `=` `==` `!=`    |
/// | 4    | `<` `>` `<=` `>=`|
/// | 5    | `+` `-` `..`     |
/// | 6    | `*` `/` `%`      |
fn binary(p: &mut Parser, s: &mut Scopes, cx: Context, min_precedence: u8) -> Node {
    let mut lhs = unary(p, s, cx);
    while let Some(precedence) = p.current().kind().binary_precedence() {
        if precedence < min_precedence {
            break;
        }
        let op = p.current().kind();
        p.advance();
        let rhs = binary(p, s, cx, precedence + 1);
        lhs = p.node(NodeKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        });
    }
    lhs
}

fn unary(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    match p.current().kind() {
        op @ (TokenKind::Not | TokenKind::Minus) => {
            if !p.descend() {
                p.bump_for_limit();
                return Node::noop(p.scope);
            }
            p.advance();
            let operand = unary(p, s, cx);
            p.ascend();
            p.node(NodeKind::Unary {
                op,
                operand: Box::new(operand),
            })
        }
        _ => postfix(p, s, cx),
    }
}

/// A primary followed by any number of `.name` and `[index]` accesses. A
/// chain ending in a property access that is immediately followed by
/// argument-shaped tokens is promoted to a method call.
fn postfix(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    let mut node = primary(p, s, cx);
    loop {
        match p.current().kind() {
            TokenKind::Dot if p.peek_kind(1) == TokenKind::Ident => {
                p.advance(); // `.`
                let name = p.current().lexeme().to_string();
                p.advance();
                node = p.node(NodeKind::PropertyAccess {
                    object: Box::new(node),
                    property: Property::Name(name),
                });
            }
            TokenKind::LBracket => {
                p.advance();
                let index = expression(p, s, cx.without_assignment());
                p.expect(TokenKind::RBracket);
                node = p.node(NodeKind::PropertyAccess {
                    object: Box::new(node),
                    property: Property::Index(Box::new(index)),
                });
            }
            _ => break,
        }
    }

    if matches!(node.kind, NodeKind::PropertyAccess { .. })
        && function::starts_arguments(p.current().kind())
    {
        let args = function::call_arguments(p, s, cx);
        node = p.node(NodeKind::Call {
            callee: Box::new(node),
            args,
        });
    }
    node
}

fn primary(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    match p.current().kind() {
        TokenKind::Number => {
            let value = p.current().lexeme().parse::<f64>().unwrap_or_default();
            p.advance();
            p.node(NodeKind::Number(value))
        }
        TokenKind::Str => {
            let value = p.current().lexeme().to_string();
            p.advance();
            p.node(NodeKind::Str(value))
        }
        TokenKind::True => {
            p.advance();
            p.node(NodeKind::Bool(true))
        }
        TokenKind::False => {
            p.advance();
            p.node(NodeKind::Bool(false))
        }
        TokenKind::Null => {
            p.advance();
            p.node(NodeKind::Null)
        }
        TokenKind::Undecidable => {
            p.advance();
            p.node(NodeKind::Undecidable)
        }
        TokenKind::LParen => {
            p.advance();
            let inner = expression(p, s, cx.without_assignment());
            p.expect(TokenKind::RParen);
            inner
        }
        TokenKind::LBracket => array_literal(p, s, cx),
        TokenKind::New => class::new_expression(p, s, cx),
        TokenKind::Spread => spread(p),
        TokenKind::Ident => identifier(p, s, cx),
        _ => {
            p.recover("expected an expression");
            Node::noop(p.scope)
        }
    }
}

fn array_literal(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    p.advance(); // `[`
    let mut items = Vec::new();
    loop {
        if p.eat(TokenKind::RBracket) {
            break;
        }
        if p.at(TokenKind::Eof) {
            p.err("expected `]` to close array literal");
            break;
        }
        items.push(expression(p, s, cx.without_assignment()));
        if p.eat(TokenKind::Comma) {
            continue;
        }
        if !p.eat(TokenKind::RBracket) {
            p.err("expected `]` after array elements");
        }
        break;
    }
    p.node(NodeKind::Array(items))
}

/// `...name` spreads a variable into the surrounding call or array.
fn spread(p: &mut Parser) -> Node {
    p.advance(); // `...`
    match p.ident_lexeme() {
        Some(name) => {
            let inner = p.node(NodeKind::Variable(name));
            p.node(NodeKind::Spread(Box::new(inner)))
        }
        None => {
            p.err("expected a name after `...`");
            Node::noop(p.scope)
        }
    }
}

/// The identifier disambiguation rule: decide among object literal,
/// compound assignment, function call, and plain variable reference.
fn identifier(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    // Object literals are only possible on the right-hand side of `set`,
    // outside method bodies and call arguments.
    if cx.in_assignment
        && !cx.in_method_body
        && !cx.in_call_args
        && object::looks_like_object(p, s)
    {
        return object::object_literal(p, s, cx);
    }

    let name = p.current().lexeme().to_string();
    p.advance();
    let next = p.current().kind();

    if next.is_compound_assign() {
        p.advance();
        let target = p.node(NodeKind::Variable(name));
        let value = expression(p, s, cx.without_assignment());
        return p.node(NodeKind::CompoundAssign {
            op: next,
            target: Box::new(target),
            value: Box::new(value),
        });
    }

    let has_args = function::starts_arguments(next);
    let is_builtin = p.is_builtin(&name);
    // A bare name on its own line calls a zero-argument function, but only
    // at statement level: `return n` keeps `n` a variable reference.
    let is_standalone = matches!(
        next,
        TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent
    ) && cx.standalone_call
        && !cx.in_call_args
        && p.expr_depth == 1;

    if has_args || is_builtin || is_standalone {
        let callee = p.node(NodeKind::Variable(name));
        let args = function::call_arguments(p, s, cx);
        return p.node(NodeKind::Call {
            callee: Box::new(callee),
            args,
        });
    }

    p.node(NodeKind::Variable(name))
}
