use crate::ast::{Node, NodeKind, Param};
use crate::lexer::TokenKind;
use crate::parser::grammar::{expr, stmt, Context};
use crate::parser::Parser;
use crate::scope::{FunctionSig, Scopes};

/// Whether `kind` can start a call argument: anything except the
/// expression terminators, the postfix openers (`.`, `[`) and binary
/// operators. `;` is also excluded, since it ends a statement wherever a
/// newline can.
pub(crate) fn starts_arguments(kind: TokenKind) -> bool {
    !matches!(
        kind,
        TokenKind::Newline
            | TokenKind::Eof
            | TokenKind::Dedent
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::Comma
            | TokenKind::Semicolon
            | TokenKind::Dot
            | TokenKind::LBracket
    ) && !kind.is_binary_operator()
}

/// Collect call arguments: expressions, one after another, until a
/// terminator or a binary operator ends the list.
pub(crate) fn call_arguments(p: &mut Parser, s: &mut Scopes, cx: Context) -> Vec<Node> {
    let cx = cx.with_call_args();
    let mut args = Vec::new();
    while starts_arguments(p.current().kind()) {
        args.push(expr::expression(p, s, cx));
    }
    args
}

/// `function NAME params… <block>`
pub(crate) fn function_definition(
    p: &mut Parser,
    s: &mut Scopes,
    cx: Context,
    depth: usize,
) -> Node {
    p.advance(); // `function`
    function_tail(p, s, cx, depth, false)
}

/// Everything after the introducing keyword; shared between `function`
/// definitions and class methods.
pub(crate) fn function_tail(
    p: &mut Parser,
    s: &mut Scopes,
    cx: Context,
    depth: usize,
    as_method: bool,
) -> Node {
    let Some(name) = p.ident_lexeme() else {
        p.recover("expected a function name");
        return Node::noop(p.scope);
    };

    let mut params = Vec::new();
    loop {
        match p.current().kind() {
            TokenKind::Ident => {
                params.push(Param::Name(p.current().lexeme().to_string()));
                p.advance();
            }
            TokenKind::Spread => {
                p.advance();
                match p.ident_lexeme() {
                    Some(rest) => {
                        params.push(Param::Rest(rest));
                        if matches!(p.current().kind(), TokenKind::Ident | TokenKind::Spread) {
                            p.err("rest parameter must be the last parameter");
                        }
                    }
                    None => p.err("expected a name after `...`"),
                }
            }
            _ => break,
        }
    }

    // Registered before the body parses so that recursive calls and later
    // object-literal lookahead recognize the name.
    s.add_function(
        p.scope,
        FunctionSig {
            name: name.clone(),
            params: params.clone(),
        },
    );

    let saved = p.scope;
    p.scope = s.enter(saved);
    let body_cx = if as_method {
        cx.body().with_method_body()
    } else {
        cx.body()
    };
    let body = stmt::block(p, s, body_cx, depth);
    p.scope = saved;

    p.node(NodeKind::FuncDef {
        name,
        params,
        body: Box::new(body),
    })
}
