//! The ZEN abstract syntax tree.
//!
//! Nodes are a tagged sum type with exclusively owned children; the tree is
//! acyclic and parent-to-child only. Every node records the [`ScopeId`] of
//! the lexical scope it was parsed in, for the evaluator's benefit.

use crate::lexer::TokenKind;
use crate::scope::ScopeId;
use std::fmt;

/// A node in the syntax tree: a [`NodeKind`] plus the scope it was parsed in.
#[derive(Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub scope: ScopeId,
}

impl Node {
    pub fn new(kind: NodeKind, scope: ScopeId) -> Self {
        Self { kind, scope }
    }

    /// A `Noop` placeholder, substituted wherever a child is required but
    /// could not be parsed.
    pub fn noop(scope: ScopeId) -> Self {
        Self::new(NodeKind::Noop, scope)
    }

    pub fn is_noop(&self) -> bool {
        matches!(self.kind, NodeKind::Noop)
    }
}

/// The different kinds of nodes with their payloads.
#[derive(Clone, PartialEq)]
pub enum NodeKind {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undecidable,
    Variable(String),
    Binary {
        op: TokenKind,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Unary {
        op: TokenKind,
        operand: Box<Node>,
    },
    Ternary {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    Array(Vec<Node>),
    /// Keys and values are parallel sequences; key order is preserved.
    Object {
        keys: Vec<String>,
        values: Vec<Node>,
    },
    PropertyAccess {
        object: Box<Node>,
        property: Property,
    },
    /// The callee is either a `Variable` or a `PropertyAccess` (method
    /// call).
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    New {
        class: String,
        args: Vec<Node>,
    },
    VarDef {
        name: String,
        init: Box<Node>,
    },
    FuncDef {
        name: String,
        params: Vec<Param>,
        body: Box<Node>,
    },
    ClassDef {
        name: String,
        parent: Option<String>,
        methods: Vec<Node>,
    },
    If {
        condition: Box<Node>,
        body: Box<Node>,
        else_body: Option<Box<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    ForIn {
        binding: String,
        iterable: Box<Node>,
        body: Box<Node>,
    },
    Return(Option<Box<Node>>),
    Break,
    Continue,
    Throw(Option<Box<Node>>),
    TryCatch {
        try_body: Box<Node>,
        catch_body: Box<Node>,
        exception: Option<String>,
    },
    Import {
        path: String,
        names: Vec<ImportName>,
    },
    Export {
        name: String,
        value: Box<Node>,
    },
    FileGet {
        path: Box<Node>,
        property: Option<PropertyPath>,
    },
    FilePut {
        path: Box<Node>,
        property: Option<PropertyPath>,
        value: Box<Node>,
    },
    CompoundAssign {
        op: TokenKind,
        target: Box<Node>,
        value: Box<Node>,
    },
    Spread(Box<Node>),
    Compound(Vec<Node>),
    Noop,
}

/// A function parameter: a plain name, or a trailing rest parameter that
/// collects the remaining arguments.
#[derive(Clone, PartialEq, Eq)]
pub enum Param {
    Name(String),
    Rest(String),
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Name(name) => write!(f, "{name}"),
            Param::Rest(name) => write!(f, "...{name}"),
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The property side of a [`NodeKind::PropertyAccess`]: a plain name or a
/// computed index expression.
#[derive(Clone, PartialEq)]
pub enum Property {
    Name(String),
    Index(Box<Node>),
}

/// One entry of a named import: the original name with an optional alias.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

/// A dotted property path, as used by `get`/`put` statements.
#[derive(Clone, PartialEq, Eq)]
pub struct PropertyPath(pub Vec<String>);

impl PropertyPath {
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl fmt::Debug for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print(f, 0, self)
    }
}

fn line(f: &mut fmt::Formatter<'_>, indent: usize, text: &str) -> fmt::Result {
    writeln!(f, "{:indent$}- {text}", "", indent = indent)
}

/// Write `node` as an indented tree, one node per line.
fn print(f: &mut fmt::Formatter<'_>, indent: usize, node: &Node) -> fmt::Result {
    let child = indent + 4;
    match &node.kind {
        NodeKind::Number(n) => line(f, indent, &format!("NUMBER {n}")),
        NodeKind::Str(s) => line(f, indent, &format!("STRING {s:?}")),
        NodeKind::Bool(b) => line(f, indent, &format!("BOOLEAN {b}")),
        NodeKind::Null => line(f, indent, "NULL"),
        NodeKind::Undecidable => line(f, indent, "UNDECIDABLE"),
        NodeKind::Variable(name) => line(f, indent, &format!("VARIABLE {name:?}")),
        NodeKind::Binary { op, lhs, rhs } => {
            line(f, indent, &format!("BINARY {:?}", op.name()))?;
            print(f, child, lhs)?;
            print(f, child, rhs)
        }
        NodeKind::Unary { op, operand } => {
            line(f, indent, &format!("UNARY {:?}", op.name()))?;
            print(f, child, operand)
        }
        NodeKind::Ternary {
            condition,
            then,
            otherwise,
        } => {
            line(f, indent, "TERNARY")?;
            print(f, child, condition)?;
            print(f, child, then)?;
            print(f, child, otherwise)
        }
        NodeKind::Array(items) => {
            line(f, indent, "ARRAY")?;
            for item in items {
                print(f, child, item)?;
            }
            Ok(())
        }
        NodeKind::Object { keys, values } => {
            line(f, indent, "OBJECT")?;
            for (key, value) in keys.iter().zip(values) {
                line(f, child, &format!("FIELD {key:?}"))?;
                print(f, child + 4, value)?;
            }
            Ok(())
        }
        NodeKind::PropertyAccess { object, property } => match property {
            Property::Name(name) => {
                line(f, indent, &format!("PROPERTY_ACCESS {name:?}"))?;
                print(f, child, object)
            }
            Property::Index(index) => {
                line(f, indent, "INDEX_ACCESS")?;
                print(f, child, object)?;
                print(f, child, index)
            }
        },
        NodeKind::Call { callee, args } => {
            if let NodeKind::Variable(name) = &callee.kind {
                line(f, indent, &format!("CALL {name:?}"))?;
            } else {
                line(f, indent, "CALL")?;
                print(f, child, callee)?;
            }
            for arg in args {
                print(f, child, arg)?;
            }
            Ok(())
        }
        NodeKind::New { class, args } => {
            line(f, indent, &format!("NEW {class:?}"))?;
            for arg in args {
                print(f, child, arg)?;
            }
            Ok(())
        }
        NodeKind::VarDef { name, init } => {
            line(f, indent, &format!("VARIABLE_DEFINITION {name:?}"))?;
            print(f, child, init)
        }
        NodeKind::FuncDef { name, params, body } => {
            let params = params
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            line(f, indent, &format!("FUNCTION_DEFINITION {name:?} ({params})"))?;
            print(f, child, body)
        }
        NodeKind::ClassDef {
            name,
            parent,
            methods,
        } => {
            match parent {
                Some(parent) => line(
                    f,
                    indent,
                    &format!("CLASS_DEFINITION {name:?} extends {parent:?}"),
                )?,
                None => line(f, indent, &format!("CLASS_DEFINITION {name:?}"))?,
            }
            for method in methods {
                print(f, child, method)?;
            }
            Ok(())
        }
        NodeKind::If {
            condition,
            body,
            else_body,
        } => {
            line(f, indent, "IF")?;
            print(f, child, condition)?;
            print(f, child, body)?;
            if let Some(else_body) = else_body {
                line(f, child, "ELSE")?;
                print(f, child + 4, else_body)?;
            }
            Ok(())
        }
        NodeKind::While { condition, body } => {
            line(f, indent, "WHILE")?;
            print(f, child, condition)?;
            print(f, child, body)
        }
        NodeKind::ForIn {
            binding,
            iterable,
            body,
        } => {
            line(f, indent, &format!("FOR_IN {binding:?}"))?;
            print(f, child, iterable)?;
            print(f, child, body)
        }
        NodeKind::Return(value) => {
            line(f, indent, "RETURN")?;
            if let Some(value) = value {
                print(f, child, value)?;
            }
            Ok(())
        }
        NodeKind::Break => line(f, indent, "BREAK"),
        NodeKind::Continue => line(f, indent, "CONTINUE"),
        NodeKind::Throw(value) => {
            line(f, indent, "THROW")?;
            if let Some(value) = value {
                print(f, child, value)?;
            }
            Ok(())
        }
        NodeKind::TryCatch {
            try_body,
            catch_body,
            exception,
        } => {
            line(f, indent, "TRY_CATCH")?;
            print(f, child, try_body)?;
            match exception {
                Some(name) => line(f, child, &format!("CATCH {name:?}"))?,
                None => line(f, child, "CATCH")?,
            }
            print(f, child + 4, catch_body)
        }
        NodeKind::Import { path, names } => {
            line(f, indent, &format!("IMPORT {path:?}"))?;
            for name in names {
                match &name.alias {
                    Some(alias) => {
                        line(f, child, &format!("NAME {:?} as {alias:?}", name.name))?
                    }
                    None => line(f, child, &format!("NAME {:?}", name.name))?,
                }
            }
            Ok(())
        }
        NodeKind::Export { name, value } => {
            line(f, indent, &format!("EXPORT {name:?}"))?;
            print(f, child, value)
        }
        NodeKind::FileGet { path, property } => {
            match property {
                Some(property) => line(f, indent, &format!("FILE_GET .{property}"))?,
                None => line(f, indent, "FILE_GET")?,
            }
            print(f, child, path)
        }
        NodeKind::FilePut {
            path,
            property,
            value,
        } => {
            match property {
                Some(property) => line(f, indent, &format!("FILE_PUT .{property}"))?,
                None => line(f, indent, "FILE_PUT")?,
            }
            print(f, child, path)?;
            print(f, child, value)
        }
        NodeKind::CompoundAssign { op, target, value } => {
            line(f, indent, &format!("COMPOUND_ASSIGNMENT {:?}", op.name()))?;
            print(f, child, target)?;
            print(f, child, value)
        }
        NodeKind::Spread(inner) => {
            line(f, indent, "SPREAD")?;
            print(f, child, inner)
        }
        NodeKind::Compound(statements) => {
            line(f, indent, "COMPOUND")?;
            for statement in statements {
                print(f, child, statement)?;
            }
            Ok(())
        }
        NodeKind::Noop => line(f, indent, "NOOP"),
    }
}
