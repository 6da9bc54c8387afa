use crate::ast::{Node, NodeKind, PropertyPath};
use crate::lexer::TokenKind;
use crate::parser::grammar::{expr, Context};
use crate::parser::Parser;
use crate::scope::Scopes;

/// `get PATH_EXPR [. prop[.prop…]]`
pub(crate) fn file_get(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    p.advance(); // `get`
    let path = path_expression(p, s, cx);
    let property = property_path(p);
    p.node(NodeKind::FileGet {
        path: Box::new(path),
        property,
    })
}

/// `put PATH_EXPR [. prop[.prop…]] VALUE`
pub(crate) fn file_put(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    p.advance(); // `put`
    let path = path_expression(p, s, cx);
    let property = property_path(p);
    let value = expr::expression(p, s, cx);
    let value = promote_file_reference(p, value);
    p.node(NodeKind::FilePut {
        path: Box::new(path),
        property,
        value: Box::new(value),
    })
}

/// The path operand. Dots after it belong to the property path, so this
/// deliberately parses no postfix chain.
fn path_expression(p: &mut Parser, s: &mut Scopes, cx: Context) -> Node {
    match p.current().kind() {
        TokenKind::Str => {
            let path = p.current().lexeme().to_string();
            p.advance();
            p.node(NodeKind::Str(path))
        }
        TokenKind::Ident => {
            let name = p.current().lexeme().to_string();
            p.advance();
            p.node(NodeKind::Variable(name))
        }
        TokenKind::LParen => {
            p.advance();
            let inner = expr::expression(p, s, cx.without_assignment());
            p.expect(TokenKind::RParen);
            inner
        }
        _ => {
            p.recover("expected a file path");
            Node::noop(p.scope)
        }
    }
}

/// `.prop[.prop...]`: a dotted path into the file contents.
fn property_path(p: &mut Parser) -> Option<PropertyPath> {
    if !p.at(TokenKind::Dot) {
        return None;
    }
    let mut segments = Vec::new();
    while p.at(TokenKind::Dot) && p.peek_kind(1) == TokenKind::Ident {
        p.advance(); // `.`
        segments.push(p.current().lexeme().to_string());
        p.advance();
    }
    if p.at(TokenKind::Dot) {
        p.err("expected a property name after `.`");
        p.advance();
    }
    if segments.is_empty() {
        None
    } else {
        Some(PropertyPath(segments))
    }
}

/// A `put` VALUE that is a string starting with `"@ "` refers to another
/// file: `"@ target.json a.b"` reads property path `a.b` out of
/// `target.json`. Such strings become `FileGet` nodes.
fn promote_file_reference(p: &Parser, value: Node) -> Node {
    let NodeKind::Str(text) = &value.kind else {
        return value;
    };
    let Some(reference) = text.strip_prefix("@ ") else {
        return value;
    };
    let mut parts = reference.split_whitespace();
    let Some(target) = parts.next() else {
        return value;
    };
    let property = parts
        .next()
        .map(|dotted| PropertyPath(dotted.split('.').map(String::from).collect()));
    let path = p.node(NodeKind::Str(target.to_string()));
    p.node(NodeKind::FileGet {
        path: Box::new(path),
        property,
    })
}
