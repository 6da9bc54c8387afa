use crate::ast::{ImportName, Node, NodeKind};
use crate::lexer::TokenKind;
use crate::parser::grammar::{function, stmt, Context};
use crate::parser::Parser;
use crate::scope::Scopes;

/// `import "PATH"`, or
/// `import NAME [ALIAS], NAME [ALIAS] from "PATH"`
pub(crate) fn import_statement(p: &mut Parser) -> Node {
    p.advance(); // `import`

    if p.at(TokenKind::Str) {
        let path = p.current().lexeme().to_string();
        p.advance();
        return p.node(NodeKind::Import {
            path,
            names: Vec::new(),
        });
    }

    let mut names = Vec::new();
    loop {
        let Some(name) = p.ident_lexeme() else {
            p.err("expected an import name");
            break;
        };
        let alias = p.ident_lexeme();
        names.push(ImportName { name, alias });
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }

    let path = if p.eat(TokenKind::From) {
        if p.at(TokenKind::Str) {
            let path = p.current().lexeme().to_string();
            p.advance();
            path
        } else {
            p.err("expected a module path string after `from`");
            String::new()
        }
    } else {
        p.err("expected `from` after import names");
        String::new()
    };

    p.node(NodeKind::Import { path, names })
}

/// `export function …`, `export set …`, or `export NAME [ALIAS]`
pub(crate) fn export_statement(p: &mut Parser, s: &mut Scopes, cx: Context, depth: usize) -> Node {
    p.advance(); // `export`

    match p.current().kind() {
        TokenKind::Function => {
            let def = function::function_definition(p, s, cx, depth);
            let name = match &def.kind {
                NodeKind::FuncDef { name, .. } => name.clone(),
                _ => String::new(),
            };
            p.node(NodeKind::Export {
                name,
                value: Box::new(def),
            })
        }
        TokenKind::Set => {
            let def = stmt::variable_definition(p, s, cx);
            let name = match &def.kind {
                NodeKind::VarDef { name, .. } => name.clone(),
                _ => String::new(),
            };
            p.node(NodeKind::Export {
                name,
                value: Box::new(def),
            })
        }
        TokenKind::Ident => {
            let name = p.current().lexeme().to_string();
            p.advance();
            let alias = p.ident_lexeme();
            let value = p.node(NodeKind::Variable(name.clone()));
            p.node(NodeKind::Export {
                name: alias.unwrap_or(name),
                value: Box::new(value),
            })
        }
        _ => {
            p.recover("expected `function`, `set`, or a name after `export`");
            Node::noop(p.scope)
        }
    }
}
