pub(crate) mod grammar;

use crate::ast::{Node, NodeKind};
use crate::builtins::{BuiltinOracle, DefaultBuiltins};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::scope::{ScopeId, Scopes};
use crate::{Error, LimitTracker};
use std::fmt;

/// Chosen to keep a comfortable safety margin below stack exhaustion in an
/// unoptimized build.
const DEFAULT_RECURSION_LIMIT: usize = 500;

/// Parse ZEN source into an AST.
///
/// The parser is recursive descent with bounded lookahead and a set of
/// parse-mode flags (see [`grammar::Context`]). It consults the function
/// table of the [`Scopes`] passed to [`Parser::parse`] while disambiguating
/// identifiers, and fills that table as function definitions are parsed.
///
/// It never aborts: a syntax error is logged and recorded, panic mode
/// discards tokens up to the next statement boundary, and parsing resumes.
/// The returned tree is always well formed; missing children are `Noop`.
///
/// ## Example
///
/// ```rust
/// use zen_parser::{Lexer, Parser, Scopes};
///
/// let source = "
/// set point x 1, y 2
/// print point.x
/// ";
/// let mut scopes = Scopes::new();
/// let mut parser = Parser::new(Lexer::new(source));
/// let result = parser.parse(&mut scopes);
///
/// assert_eq!(0, result.errors().len());
/// ```
pub struct Parser<'input> {
    lexer: Lexer<'input>,
    current: Token,
    previous: Token,
    /// The list of syntax errors we've accumulated so far.
    errors: Vec<Error>,
    panicking: bool,
    /// How many errors were recovered from via resynchronization.
    recovered: usize,
    recursion_limit: LimitTracker,
    limit_reported: bool,
    /// Accept parsing errors?
    accept_errors: bool,
    builtins: Box<dyn BuiltinOracle>,
    /// The scope new nodes are attached to.
    pub(crate) scope: ScopeId,
    /// Expression nesting depth, used to restrict standalone-call promotion
    /// to statement-level expressions.
    pub(crate) expr_depth: usize,
}

impl<'input> Parser<'input> {
    /// Create a new instance of a parser given a lexer.
    pub fn new(lexer: Lexer<'input>) -> Self {
        let mut parser = Self {
            lexer,
            current: Token::new(TokenKind::Eof, "", 0, 0),
            previous: Token::new(TokenKind::Eof, "", 0, 0),
            errors: Vec::new(),
            panicking: false,
            recovered: 0,
            recursion_limit: LimitTracker::new(DEFAULT_RECURSION_LIMIT),
            limit_reported: false,
            accept_errors: true,
            builtins: Box::new(DefaultBuiltins),
            scope: ScopeId::GLOBAL,
            expr_depth: 0,
        };
        parser.current = parser.next_filtered();
        parser
    }

    /// Configure the recursion limit to use while parsing.
    pub fn recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_limit = LimitTracker::new(recursion_limit);
        self
    }

    /// Configure the limit on the number of tokens to scan. If an input
    /// document is too big, lexing is aborted. By default, there is no
    /// limit.
    pub fn token_limit(mut self, token_limit: usize) -> Self {
        self.lexer.limit = LimitTracker::new(token_limit);
        self
    }

    /// Configure the builtin-function oracle consulted during identifier
    /// disambiguation.
    pub fn builtins(mut self, oracle: Box<dyn BuiltinOracle>) -> Self {
        self.builtins = oracle;
        self
    }

    /// Parse the token stream into a [`ParseResult`]. The root node is
    /// always a `Compound`.
    pub fn parse(&mut self, scopes: &mut Scopes) -> ParseResult {
        self.scope = ScopeId::GLOBAL;
        let statements = grammar::stmt::statements(self, scopes, grammar::Context::default(), 0);
        let root = Node::new(NodeKind::Compound(statements), ScopeId::GLOBAL);

        // Fold lexical errors in with the parse errors.
        let mut errors = self.lexer.take_errors();
        errors.append(&mut self.errors);
        self.errors = errors;

        ParseResult {
            root,
            errors: self.errors.clone(),
            recursion_limit: self.recursion_limit,
            token_limit: self.lexer.limit,
        }
    }

    /// Whether any lexical or syntax errors have been recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || !self.lexer.errors().is_empty()
    }

    /// The number of errors recorded so far.
    pub fn error_count(&self) -> usize {
        self.errors.len() + self.lexer.errors().len()
    }

    /// The errors recorded so far.
    pub fn errors(&self) -> &[Error] {
        self.errors.as_ref()
    }

    /// Whether the parser is currently discarding tokens after an error.
    pub fn in_panic_mode(&self) -> bool {
        self.panicking
    }

    /// How many errors have been recovered from by resynchronizing.
    pub fn recovered_errors(&self) -> usize {
        self.recovered
    }

    pub(crate) fn current(&self) -> &Token {
        &self.current
    }

    #[allow(dead_code)]
    pub(crate) fn previous(&self) -> &Token {
        &self.previous
    }

    pub(crate) fn is_builtin(&self, name: &str) -> bool {
        self.builtins.is_builtin(name)
    }

    /// Attach a node to the scope currently being parsed.
    pub(crate) fn node(&self, kind: NodeKind) -> Node {
        Node::new(kind, self.scope)
    }

    /// Lexical error tokens were already recorded by the lexer; the parser
    /// stream never contains them.
    fn next_filtered(&mut self) -> Token {
        loop {
            let token = self.lexer.next_token();
            if !token.is(TokenKind::Error) {
                return token;
            }
        }
    }

    /// Move forward by one token.
    pub(crate) fn advance(&mut self) {
        let next = self.next_filtered();
        self.previous = std::mem::replace(&mut self.current, next);
    }

    /// Check if the current token is `kind`.
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current.is(kind)
    }

    /// Consume the current token if it is `kind`.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the next token if it is `kind` or record an error otherwise.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.err(&format!("expected `{}`", kind.name()));
            false
        }
    }

    /// Consume an identifier and return its lexeme. Records nothing on
    /// mismatch; callers decide how to recover.
    pub(crate) fn ident_lexeme(&mut self) -> Option<String> {
        if self.at(TokenKind::Ident) {
            let name = self.current.lexeme().to_string();
            self.advance();
            Some(name)
        } else {
            None
        }
    }

    /// The kind of the token `n` positions ahead; `peek_kind(0)` is the
    /// current token. Error tokens are invisible, as in the main stream.
    pub(crate) fn peek_kind(&mut self, n: usize) -> TokenKind {
        if n == 0 {
            return self.current.kind();
        }
        let mut seen = 0;
        let mut k = 0;
        loop {
            let token = self.lexer.peek(k);
            if token.is(TokenKind::Eof) {
                return TokenKind::Eof;
            }
            k += 1;
            if token.is(TokenKind::Error) {
                continue;
            }
            seen += 1;
            if seen == n {
                return token.kind();
            }
        }
    }

    /// Record a syntax error at the current token.
    pub(crate) fn err(&mut self, message: &str) {
        let token = &self.current;
        tracing::error!(
            line = token.line(),
            column = token.column(),
            lexeme = token.lexeme(),
            "{message}"
        );
        let data = if token.is(TokenKind::Eof) {
            String::from("EOF")
        } else {
            token.lexeme().to_string()
        };
        let err = Error::with_pos(message, data, token.line(), token.column());
        self.push_err(err);
    }

    /// Record a syntax error, then enter panic mode and discard tokens up
    /// to the next statement boundary.
    pub(crate) fn recover(&mut self, message: &str) {
        self.err(message);
        self.panicking = true;
        self.synchronize();
        self.recovered += 1;
        self.panicking = false;
    }

    /// Discard tokens until a statement boundary. Always consumes at least
    /// one token unless already at `Eof`.
    fn synchronize(&mut self) {
        if !self.at(TokenKind::Eof) {
            self.advance();
        }
        while !self.at(TokenKind::Eof) {
            if matches!(
                self.current.kind(),
                TokenKind::Newline
                    | TokenKind::Semicolon
                    | TokenKind::LBrace
                    | TokenKind::RBrace
                    | TokenKind::Set
                    | TokenKind::Function
            ) {
                break;
            }
            self.advance();
        }
        tracing::debug!(
            line = self.current.line(),
            "resynchronized after parse error"
        );
    }

    /// Push an error unless a limit error has silenced further reporting.
    fn push_err(&mut self, err: Error) {
        if self.accept_errors {
            self.errors.push(err);
        }
    }

    /// Enter one level of grammar recursion. Returns false once the
    /// recursion limit is exceeded; the caller must then produce a `Noop`
    /// without recursing further.
    pub(crate) fn descend(&mut self) -> bool {
        self.recursion_limit.consume();
        if !self.recursion_limit.limited() {
            return true;
        }
        if !self.limit_reported {
            self.limit_reported = true;
            let err = Error::limit(
                "parser recursion limit reached",
                self.current.line(),
                self.current.column(),
            );
            tracing::error!(line = err.line, column = err.column, "{}", err.message);
            self.errors.push(err);
            self.accept_errors = false;
        }
        false
    }

    pub(crate) fn ascend(&mut self) {
        self.recursion_limit.release();
    }

    /// Guarantee forward progress on the limit path.
    pub(crate) fn bump_for_limit(&mut self) {
        if !self.at(TokenKind::Eof) {
            self.advance();
        }
    }
}

impl fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("errors", &self.errors)
            .field("recovered", &self.recovered)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// The outcome of a parse: the root `Compound` node, the accumulated
/// lexical and syntax errors, and limit high-water marks.
pub struct ParseResult {
    root: Node,
    errors: Vec<Error>,
    recursion_limit: LimitTracker,
    token_limit: LimitTracker,
}

impl ParseResult {
    /// The root node. Always a `Compound`.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Consume the result, returning the root node.
    pub fn into_root(self) -> Node {
        self.root
    }

    /// Get a reference to the errors.
    pub fn errors(&self) -> &[Error] {
        self.errors.as_ref()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Recursion-limit utilization over the parse.
    pub fn recursion_limit(&self) -> LimitTracker {
        self.recursion_limit
    }

    /// Token-limit utilization over the parse.
    pub fn token_limit(&self) -> LimitTracker {
        self.token_limit
    }
}

impl fmt::Debug for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.root)?;
        for err in &self.errors {
            writeln!(f, "- {err:?}")?;
        }
        Ok(())
    }
}
