use crate::ast::{Node, NodeKind};
use crate::lexer::TokenKind;
use crate::parser::grammar::{expr, Context};
use crate::parser::Parser;
use crate::scope::Scopes;

/// Bounded lookahead deciding whether the identifier at the current token
/// opens an object literal.
///
/// The stream is inspected without consuming anything. A name that is a
/// builtin or resolves to a function in the current scope chain can never
/// be a key, which is why the parser fills the function table during
/// parsing rather than leaving it to evaluation.
pub(crate) fn looks_like_object(p: &mut Parser, s: &Scopes) -> bool {
    if !p.at(TokenKind::Ident) {
        return false;
    }
    let name = p.current().lexeme().to_string();
    if p.is_builtin(&name) || s.is_function(p.scope, &name) {
        return false;
    }

    let k1 = p.peek_kind(1);

    // `ID ,` is comma-separated keys without values.
    if k1 == TokenKind::Comma {
        return true;
    }
    if !is_value(k1) {
        return false;
    }

    let k2 = p.peek_kind(2);
    let k3 = p.peek_kind(3);

    // `ID VALUE , ID` is unmistakably a record.
    if k2 == TokenKind::Comma && k3 == TokenKind::Ident {
        return true;
    }

    // Two-token patterns are accepted conservatively.
    match k1 {
        TokenKind::Str
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Null
        | TokenKind::Undecidable
        | TokenKind::LBracket => k2 != TokenKind::LParen && !k2.is_binary_operator(),
        // `ID NUMBER` needs a `,` or `:` next, otherwise `sq 42` would be
        // mistaken for a record.
        TokenKind::Number => matches!(k2, TokenKind::Comma | TokenKind::Colon),
        TokenKind::Ident => {
            !matches!(
                k2,
                TokenKind::LParen | TokenKind::Dot | TokenKind::LBracket
            ) && !k2.is_binary_operator()
        }
        _ => false,
    }
}

fn is_value(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Str
            | TokenKind::Number
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::Undecidable
            | TokenKind::LBracket
            | TokenKind::Ident
    )
}

/// `key value, key value, ...`: keys are identifiers, values arbitrary
/// expressions, `:` after a key is allowed. A key without a value gets
/// `Null`. Key order is preserved.
pub(crate) fn object_literal(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    let mut keys = Vec::new();
    let mut values = Vec::new();

    while p.at(TokenKind::Ident) {
        let key = p.current().lexeme().to_string();
        p.advance();
        p.eat(TokenKind::Colon);

        let value = if matches!(
            p.current().kind(),
            TokenKind::Comma | TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent
        ) {
            p.node(NodeKind::Null)
        } else {
            expr::expression(p, s, cx.without_assignment())
        };

        keys.push(key);
        values.push(value);

        if !p.eat(TokenKind::Comma) {
            break;
        }
    }

    p.node(NodeKind::Object { keys, values })
}
