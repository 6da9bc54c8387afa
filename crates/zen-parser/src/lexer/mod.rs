mod cursor;
mod token;
mod token_kind;

pub use token::Token;
pub use token_kind::TokenKind;

use crate::{Error, LimitTracker};
use cursor::Cursor;
use std::collections::VecDeque;

/// Scans ZEN source text into [`Token`]s on demand.
///
/// Layout is significant: on every physical newline the lexer compares the
/// indentation of the next non-empty, non-comment line against an indent
/// stack and synthesizes `Newline`, `Indent` and `Dedent` tokens. At end of
/// input every open indentation level is closed with a `Dedent` before the
/// final `Eof`.
///
/// Lexical errors (unknown bytes, unterminated strings, mismatched
/// indentation) produce `Error` tokens with a descriptive lexeme and are
/// also recorded in [`Lexer::errors`]; scanning always continues.
///
/// Lookahead through [`Lexer::peek`] is backed by an internal buffer, so
/// peeking never disturbs scanning state.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    /// Open indentation levels, in columns. Empty means column zero.
    indents: Vec<u32>,
    lookahead: VecDeque<Token>,
    errors: Vec<Error>,
    pub(crate) limit: LimitTracker,
    limit_reported: bool,
    line_has_tokens: bool,
    eof: bool,
    iter_done: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new instance of `Lexer` for the given source text.
    pub fn new(input: &'a str) -> Self {
        Self {
            cursor: Cursor::new(input),
            indents: Vec::new(),
            lookahead: VecDeque::new(),
            errors: Vec::new(),
            limit: LimitTracker::default(),
            limit_reported: false,
            line_has_tokens: false,
            eof: false,
            iter_done: false,
        }
    }

    /// Configure the maximum number of tokens to scan before aborting.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = LimitTracker::new(limit);
        self
    }

    /// The next token in the stream. After the end of input this keeps
    /// returning `Eof` tokens.
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.lookahead.pop_front() {
            return token;
        }
        if self.eof {
            return self.eof_token();
        }
        self.scan();
        match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.eof_token(),
        }
    }

    /// The token `k` positions ahead without consuming anything; `peek(0)`
    /// is the token the next call to [`Lexer::next_token`] returns.
    pub fn peek(&mut self, k: usize) -> Token {
        while self.lookahead.len() <= k && !self.eof {
            self.scan();
        }
        match self.lookahead.get(k) {
            Some(token) => token.clone(),
            None => self.eof_token(),
        }
    }

    /// Lexical errors recorded so far.
    pub fn errors(&self) -> &[Error] {
        self.errors.as_ref()
    }

    pub(crate) fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }

    fn eof_token(&self) -> Token {
        Token::new(TokenKind::Eof, "", self.cursor.line(), self.cursor.column())
    }

    fn push(&mut self, token: Token) {
        self.lookahead.push_back(token);
    }

    /// Scan forward until at least one token has been buffered.
    fn scan(&mut self) {
        if self.limit.limited() {
            if !self.limit_reported {
                self.limit_reported = true;
                let err = Error::limit(
                    "token limit reached, aborting lexing",
                    self.cursor.line(),
                    self.cursor.column(),
                );
                tracing::error!(line = err.line, column = err.column, "{}", err.message);
                self.errors.push(err);
            }
            let token = self.eof_token();
            self.push(token);
            self.eof = true;
            return;
        }
        self.limit.consume();

        loop {
            while matches!(self.cursor.current_char(), ' ' | '\t' | '\r') {
                self.cursor.advance();
            }

            if self.cursor.is_at_end() {
                let line = self.cursor.line();
                let column = self.cursor.column();
                while self.indents.pop().is_some() {
                    self.push(Token::new(TokenKind::Dedent, "", line, column));
                }
                self.push(Token::new(TokenKind::Eof, "", line, column));
                self.eof = true;
                return;
            }

            match self.cursor.current_char() {
                '#' => {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                }
                '\n' => {
                    if self.handle_newline() {
                        return;
                    }
                }
                _ => {
                    let token = self.scan_token();
                    self.line_has_tokens = true;
                    self.push(token);
                    return;
                }
            }
        }
    }

    /// Consume a physical newline and run the layout algorithm. Returns
    /// false when the finished line held no tokens (blank or comment-only),
    /// in which case nothing is emitted.
    fn handle_newline(&mut self) -> bool {
        let line = self.cursor.line();
        let column = self.cursor.column();
        self.cursor.advance();

        if !self.line_has_tokens {
            return false;
        }
        self.line_has_tokens = false;
        self.push(Token::new(TokenKind::Newline, "", line, column));

        // Find the indentation of the next line that actually has content.
        loop {
            let mut width: u32 = 0;
            loop {
                match self.cursor.current_char() {
                    ' ' | '\t' => {
                        width += 1;
                        self.cursor.advance();
                    }
                    '\r' => self.cursor.advance(),
                    _ => break,
                }
            }

            if self.cursor.is_at_end() {
                // Remaining dedents are emitted when Eof is scanned.
                return true;
            }
            match self.cursor.current_char() {
                '\n' => {
                    self.cursor.advance();
                }
                '#' => {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                }
                _ => {
                    self.apply_indentation(width);
                    return true;
                }
            }
        }
    }

    fn apply_indentation(&mut self, width: u32) {
        let line = self.cursor.line();
        let top = self.indents.last().copied().unwrap_or(0);

        if width > top {
            self.indents.push(width);
            self.push(Token::new(TokenKind::Indent, "", line, 1));
        } else if width < top {
            while self
                .indents
                .last()
                .is_some_and(|&level| level > width)
            {
                self.indents.pop();
                self.push(Token::new(TokenKind::Dedent, "", line, 1));
            }
            let top = self.indents.last().copied().unwrap_or(0);
            if top != width {
                let token =
                    self.error_token("unindent does not match any outer indentation level", line, 1);
                self.push(token);
            }
        }
    }

    fn error_token(&mut self, message: &str, line: u32, column: u32) -> Token {
        let err = Error::with_pos(message, String::new(), line, column);
        tracing::error!(line, column, "{message}");
        self.errors.push(err);
        Token::new(TokenKind::Error, message, line, column)
    }

    fn scan_token(&mut self) -> Token {
        let line = self.cursor.line();
        let column = self.cursor.column();
        let c = self.cursor.current_char();

        let simple = |kind| Token::new(kind, c, line, column);

        match c {
            '(' | ')' | '[' | ']' | '{' | '}' | ',' | ':' | ';' | '?' => {
                self.cursor.advance();
                match c {
                    '(' => simple(TokenKind::LParen),
                    ')' => simple(TokenKind::RParen),
                    '[' => simple(TokenKind::LBracket),
                    ']' => simple(TokenKind::RBracket),
                    '{' => simple(TokenKind::LBrace),
                    '}' => simple(TokenKind::RBrace),
                    ',' => simple(TokenKind::Comma),
                    ':' => simple(TokenKind::Colon),
                    ';' => simple(TokenKind::Semicolon),
                    _ => simple(TokenKind::Question),
                }
            }
            '.' => {
                self.cursor.advance();
                if self.cursor.match_char('.') {
                    if self.cursor.match_char('.') {
                        Token::new(TokenKind::Spread, "...", line, column)
                    } else {
                        Token::new(TokenKind::Range, "..", line, column)
                    }
                } else {
                    Token::new(TokenKind::Dot, ".", line, column)
                }
            }
            '+' => self.operator(TokenKind::Plus, TokenKind::PlusEq, line, column),
            '-' => self.operator(TokenKind::Minus, TokenKind::MinusEq, line, column),
            '*' => self.operator(TokenKind::Star, TokenKind::StarEq, line, column),
            '/' => self.operator(TokenKind::Slash, TokenKind::SlashEq, line, column),
            '%' => self.operator(TokenKind::Percent, TokenKind::PercentEq, line, column),
            '=' => self.operator(TokenKind::Eq, TokenKind::EqEq, line, column),
            '<' => self.operator(TokenKind::Lt, TokenKind::LtEq, line, column),
            '>' => self.operator(TokenKind::Gt, TokenKind::GtEq, line, column),
            '!' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Token::new(TokenKind::NotEq, "!=", line, column)
                } else {
                    self.error_token("unexpected character `!`", line, column)
                }
            }
            '"' => self.string(line, column),
            c if c.is_ascii_digit() => self.number(line, column),
            c if is_ident_start(c) => self.ident(line, column),
            c => {
                self.cursor.advance();
                self.error_token(&format!("unexpected character `{c}`"), line, column)
            }
        }
    }

    /// A one-character operator that may be followed by `=` to form its
    /// compound (or comparison) sibling.
    fn operator(&mut self, plain: TokenKind, with_eq: TokenKind, line: u32, column: u32) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::new(with_eq, with_eq.name(), line, column)
        } else {
            Token::new(plain, plain.name(), line, column)
        }
    }

    fn string(&mut self, line: u32, column: u32) -> Token {
        self.cursor.advance(); // opening quote
        let mut value = String::new();

        loop {
            if self.cursor.is_at_end() || self.cursor.current_char() == '\n' {
                return self.error_token("unterminated string literal", line, column);
            }
            match self.cursor.current_char() {
                '"' => {
                    self.cursor.advance();
                    return Token::new(TokenKind::Str, value, line, column);
                }
                '\\' => {
                    self.cursor.advance();
                    let escaped = self.cursor.current_char();
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        // Unknown escapes keep the character as written.
                        c => value.push(c),
                    }
                    self.cursor.advance();
                }
                c => {
                    value.push(c);
                    self.cursor.advance();
                }
            }
        }
    }

    fn number(&mut self, line: u32, column: u32) -> Token {
        let start = self.cursor.position();
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        // Only treat `.` as a fraction when a digit follows, so `1..3`
        // stays a range over two integers.
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        Token::new(TokenKind::Number, self.cursor.slice_from(start), line, column)
    }

    fn ident(&mut self, line: u32, column: u32) -> Token {
        let start = self.cursor.position();
        while is_ident_char(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        match TokenKind::keyword(text) {
            Some(kind) => Token::new(kind, text, line, column),
            None => Token::new(TokenKind::Ident, text, line, column),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.iter_done {
            return None;
        }
        let token = self.next_token();
        if token.is(TokenKind::Eof) {
            self.iter_done = true;
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_ident_char(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.kind()).collect()
    }

    #[test]
    fn scans_flat_statements() {
        use TokenKind::*;
        assert_eq!(
            kinds("set x 5\nprint x"),
            vec![Set, Ident, Number, Newline, Ident, Ident, Eof]
        );
    }

    #[test]
    fn synthesizes_indent_and_dedent() {
        use TokenKind::*;
        assert_eq!(
            kinds("while true\n    print 1\nprint 2"),
            vec![
                While, True, Newline, Indent, Ident, Number, Newline, Dedent, Ident, Number, Eof
            ]
        );
    }

    #[test]
    fn closes_open_levels_at_eof() {
        use TokenKind::*;
        assert_eq!(
            kinds("if x\n    if y\n        print 1"),
            vec![
                If, Ident, Newline, Indent, If, Ident, Newline, Indent, Ident, Number, Dedent,
                Dedent, Eof
            ]
        );
    }

    #[test]
    fn indents_balance_dedents() {
        // Invariant: #INDENT == #DEDENT once Eof has been processed.
        for input in [
            "a\n  b\n    c\nd",
            "a\n  b\n    c",
            "if x\n    y\nelse\n    z",
            "a\n\n\n  b\n# comment\nc",
        ] {
            let tokens: Vec<_> = Lexer::new(input).collect();
            let indents = tokens.iter().filter(|t| t.is(TokenKind::Indent)).count();
            let dedents = tokens.iter().filter(|t| t.is(TokenKind::Dedent)).count();
            assert_eq!(indents, dedents, "unbalanced layout for {input:?}");
        }
    }

    #[test]
    fn blank_and_comment_lines_are_invisible_to_layout() {
        use TokenKind::*;
        assert_eq!(
            kinds("a\n\n# note\n\nb"),
            vec![Ident, Newline, Ident, Eof]
        );
    }

    #[test]
    fn mismatched_dedent_is_an_error() {
        let mut lexer = Lexer::new("a\n        b\n    c");
        let tokens: Vec<_> = (&mut lexer).collect();
        assert!(tokens.iter().any(|t| t.is(TokenKind::Error)));
        assert_eq!(lexer.errors().len(), 1);
    }

    #[test]
    fn crlf_is_treated_as_lf() {
        use TokenKind::*;
        assert_eq!(kinds("a\r\nb"), vec![Ident, Newline, Ident, Eof]);
    }

    #[test]
    fn string_escapes() {
        let mut lexer = Lexer::new(r#""a\n\t\"\\\r\0b""#);
        let token = lexer.next_token();
        assert_eq!(token.kind(), TokenKind::Str);
        assert_eq!(token.lexeme(), "a\n\t\"\\\r\0b");
    }

    #[test]
    fn unterminated_string_recovers() {
        let mut lexer = Lexer::new("\"abc\nset x 1");
        let token = lexer.next_token();
        assert_eq!(token.kind(), TokenKind::Error);
        assert_eq!(lexer.errors().len(), 1);
        // Scanning resumes on the next line.
        let rest: Vec<_> = lexer.map(|t| t.kind()).collect();
        assert!(rest.contains(&TokenKind::Set));
    }

    #[test]
    fn unknown_bytes_produce_error_tokens() {
        let mut lexer = Lexer::new("set x @@@");
        let tokens: Vec<_> = (&mut lexer).collect();
        let errors = tokens.iter().filter(|t| t.is(TokenKind::Error)).count();
        assert_eq!(errors, 3);
        assert!(tokens[2].is(TokenKind::Error));
        assert_eq!(tokens[2].lexeme(), "unexpected character `@`");
    }

    #[test]
    fn number_does_not_eat_range_dots() {
        use TokenKind::*;
        assert_eq!(kinds("1..5"), vec![Number, Range, Number, Eof]);
        assert_eq!(kinds("1.5"), vec![Number, Eof]);
    }

    #[test]
    fn spread_and_range() {
        use TokenKind::*;
        assert_eq!(kinds("...args"), vec![Spread, Ident, Eof]);
        assert_eq!(kinds("a..b"), vec![Ident, Range, Ident, Eof]);
        assert_eq!(kinds("a.b"), vec![Ident, Dot, Ident, Eof]);
    }

    #[test]
    fn compound_assignment_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("x += 1"),
            vec![Ident, PlusEq, Number, Eof]
        );
        assert_eq!(kinds("a %= b"), vec![Ident, PercentEq, Ident, Eof]);
        assert_eq!(kinds("a == b"), vec![Ident, EqEq, Ident, Eof]);
        assert_eq!(kinds("a = b"), vec![Ident, Eq, Ident, Eof]);
    }

    #[test]
    fn peek_preserves_scanning_state() {
        let mut lexer = Lexer::new("set x 5");
        assert_eq!(lexer.peek(2).kind(), TokenKind::Number);
        assert_eq!(lexer.peek(0).kind(), TokenKind::Set);
        assert_eq!(lexer.next_token().kind(), TokenKind::Set);
        assert_eq!(lexer.next_token().kind(), TokenKind::Ident);
        assert_eq!(lexer.next_token().kind(), TokenKind::Number);
    }

    #[test]
    fn eof_repeats() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().kind(), TokenKind::Eof);
        assert_eq!(lexer.next_token().kind(), TokenKind::Eof);
    }

    #[test]
    fn token_limit_aborts_lexing() {
        let mut lexer = Lexer::new("a b c d e f g h").with_limit(3);
        let tokens: Vec<_> = (&mut lexer).collect();
        assert!(tokens.len() < 9);
        assert!(lexer.errors().iter().any(|e| e.is_limit()));
    }

    #[test]
    fn positions_are_one_based() {
        let mut lexer = Lexer::new("set x\nprint x");
        let set = lexer.next_token();
        assert_eq!((set.line(), set.column()), (1, 1));
        let x = lexer.next_token();
        assert_eq!((x.line(), x.column()), (1, 5));
        let newline = lexer.next_token();
        assert_eq!(newline.kind(), TokenKind::Newline);
        let print = lexer.next_token();
        assert_eq!((print.line(), print.column()), (2, 1));
    }
}
