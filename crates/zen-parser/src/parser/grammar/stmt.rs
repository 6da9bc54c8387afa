use crate::ast::{Node, NodeKind};
use crate::lexer::TokenKind;
use crate::parser::grammar::{class, expr, file, function, module, Context};
use crate::parser::Parser;
use crate::scope::Scopes;

/// Parse statements until the enclosing block ends.
///
/// At the top level (`depth == 0`) stray `Dedent` tokens are skipped; inside
/// a nested block a `Dedent` terminates the block and is left for the
/// caller to consume.
pub(crate) fn statements(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Vec<Node> {
    let mut stmts = Vec::new();
    loop {
        while matches!(
            p.current().kind(),
            TokenKind::Newline | TokenKind::Semicolon
        ) {
            p.advance();
        }
        match p.current().kind() {
            TokenKind::Eof => break,
            TokenKind::Dedent => {
                if depth == 0 {
                    p.advance();
                } else {
                    break;
                }
            }
            TokenKind::Indent => p.recover("unexpected indent"),
            _ => stmts.push(statement(p, s, cx, depth)),
        }
    }
    stmts
}

/// Dispatch on the first token of a statement.
pub(crate) fn statement(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Node {
    if !p.descend() {
        p.bump_for_limit();
        return Node::noop(p.scope);
    }
    let node = statement_inner(p, s, cx, depth);
    p.ascend();
    node
}

fn statement_inner(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Node {
    match p.current().kind() {
        TokenKind::Set => variable_definition(p, s, cx),
        TokenKind::Function => function::function_definition(p, s, cx, depth),
        TokenKind::If => if_statement(p, s, cx, depth),
        TokenKind::While => while_loop(p, s, cx, depth),
        TokenKind::For => for_in_loop(p, s, cx, depth),
        TokenKind::Return => {
            p.advance();
            let value = trailing_expression(p, s, cx);
            p.node(NodeKind::Return(value))
        }
        TokenKind::Break => {
            p.advance();
            p.node(NodeKind::Break)
        }
        TokenKind::Continue => {
            p.advance();
            p.node(NodeKind::Continue)
        }
        TokenKind::Throw => {
            p.advance();
            let value = trailing_expression(p, s, cx);
            p.node(NodeKind::Throw(value))
        }
        TokenKind::Get => file::file_get(p, s, cx),
        TokenKind::Put => file::file_put(p, s, cx),
        TokenKind::Import => module::import_statement(p),
        TokenKind::Export => module::export_statement(p, s, cx, depth),
        TokenKind::Class => class::class_definition(p, s, cx, depth),
        TokenKind::Try => try_catch(p, s, cx, depth),
        _ => expression_statement(p, s, cx),
    }
}

/// An expression used as a statement. A top-level comma-separated list
/// becomes an array literal.
fn expression_statement(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    comma_expression(p, s, cx.with_standalone())
}

/// One or more expressions separated by commas; a list folds into an array
/// literal.
pub(crate) fn comma_expression(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    let first = expr::expression(p, s, cx);
    if !p.at(TokenKind::Comma) {
        return first;
    }
    let mut items = vec![first];
    while p.eat(TokenKind::Comma) {
        if at_expression_end(p) {
            break;
        }
        items.push(expr::expression(p, s, cx));
    }
    p.node(NodeKind::Array(items))
}

fn at_expression_end(p: &Parser) -> bool {
    matches!(
        p.current().kind(),
        TokenKind::Newline
            | TokenKind::Eof
            | TokenKind::Dedent
            | TokenKind::RParen
            | TokenKind::RBracket
    )
}

/// An optional expression before the end of the line, as used by `return`
/// and `throw`.
fn trailing_expression(p: &mut Parser, s: &mut Scopes, cx: Context) -> Option<Box<Node>> {
    if matches!(
        p.current().kind(),
        TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent | TokenKind::Semicolon
    ) {
        None
    } else {
        Some(Box::new(expr::expression(p, s, cx)))
    }
}

/// `set NAME expr`, `set NAME <newline> <indent> expr`, or `set NAME`
/// followed by an object literal caught by lookahead.
pub(crate) fn variable_definition(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    p.advance(); // `set`
    let Some(name) = p.ident_lexeme() else {
        p.recover("expected a variable name after `set`");
        return Node::noop(p.scope);
    };

    let init = if p.at(TokenKind::Newline) && p.peek_kind(1) == TokenKind::Indent {
        p.advance(); // newline
        p.advance(); // indent
        let value = comma_expression(p, s, cx.with_assignment());
        while p.at(TokenKind::Newline) {
            p.advance();
        }
        if p.at(TokenKind::Dedent) {
            p.advance();
        }
        value
    } else if matches!(
        p.current().kind(),
        TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent
    ) {
        p.err("expected an initializer after `set`");
        Node::noop(p.scope)
    } else {
        comma_expression(p, s, cx.with_assignment())
    };

    p.node(NodeKind::VarDef {
        name,
        init: Box::new(init),
    })
}

/// The shared shape of every block-introducing construct: optional newline,
/// optional indent, statements, optional dedent. Without an indent the
/// block is a single statement.
pub(crate) fn block(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Node {
    if p.at(TokenKind::Newline) {
        p.advance();
    }
    if p.at(TokenKind::Indent) {
        p.advance();
        let stmts = statements(p, s, cx, depth + 1);
        if p.at(TokenKind::Dedent) {
            p.advance();
        }
        p.node(NodeKind::Compound(stmts))
    } else {
        let stmt = statement(p, s, cx, depth);
        p.node(NodeKind::Compound(vec![stmt]))
    }
}

fn if_statement(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Node {
    p.advance(); // `if`
    let condition = expr::expression(p, s, cx);
    let body = block(p, s, cx, depth);

    // `else` sits after the dedent, possibly on its own line.
    while p.at(TokenKind::Newline) {
        p.advance();
    }
    let else_body = if p.eat(TokenKind::Else) {
        if p.at(TokenKind::If) {
            Some(Box::new(statement(p, s, cx, depth)))
        } else {
            Some(Box::new(block(p, s, cx, depth)))
        }
    } else {
        None
    };

    p.node(NodeKind::If {
        condition: Box::new(condition),
        body: Box::new(body),
        else_body,
    })
}

fn while_loop(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Node {
    p.advance(); // `while`
    let condition = expr::expression(p, s, cx);

    let saved = p.scope;
    p.scope = s.enter(saved);
    let body = block(p, s, cx, depth);
    p.scope = saved;

    p.node(NodeKind::While {
        condition: Box::new(condition),
        body: Box::new(body),
    })
}

/// `for NAME in EXPR <block>`; the iterator variable is bound in the
/// loop-body scope.
fn for_in_loop(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Node {
    p.advance(); // `for`
    let Some(binding) = p.ident_lexeme() else {
        p.recover("expected an iterator name after `for`");
        return Node::noop(p.scope);
    };
    if !p.eat(TokenKind::In) {
        p.recover("expected `in` in for loop");
        return Node::noop(p.scope);
    }
    let iterable = expr::expression(p, s, cx);

    let saved = p.scope;
    p.scope = s.enter(saved);
    let body = block(p, s, cx, depth);
    p.scope = saved;

    p.node(NodeKind::ForIn {
        binding,
        iterable: Box::new(iterable),
        body: Box::new(body),
    })
}

fn try_catch(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Node {
    p.advance(); // `try`
    let try_body = block(p, s, cx, depth);

    while p.at(TokenKind::Newline) {
        p.advance();
    }
    let (exception, catch_body) = if p.eat(TokenKind::Catch) {
        let exception = p.ident_lexeme();
        (exception, block(p, s, cx, depth))
    } else {
        p.err("expected `catch` after `try` block");
        (None, Node::noop(p.scope))
    };

    p.node(NodeKind::TryCatch {
        try_body: Box::new(try_body),
        catch_body: Box::new(catch_body),
        exception,
    })
}
