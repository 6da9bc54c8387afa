#![doc = include_str!("../README.md")]

pub mod ast;
mod builtins;
mod error;
mod lexer;
mod limit;
mod parser;
pub mod scope;

#[cfg(test)]
mod tests;

pub use crate::ast::{Node, NodeKind};
pub use crate::builtins::{BuiltinOracle, DefaultBuiltins};
pub use crate::error::Error;
pub use crate::lexer::{Lexer, Token, TokenKind};
pub use crate::limit::LimitTracker;
pub use crate::parser::{ParseResult, Parser};
pub use crate::scope::{FunctionSig, Scope, ScopeId, Scopes, VarBinding};
