use std::fmt;

/// Tracks consumption of a bounded resource against a configured ceiling.
///
/// Two of these protect the front end. The parser's recursion tracker
/// takes one unit on the way into a nested grammar rule and gives it back
/// on the way out; ZEN nests blocks and expressions freely, so a hostile
/// document a few kilobytes long could otherwise smash the stack. The
/// lexer's token tracker, off by default, caps how many tokens are scanned
/// in total. Crossing either ceiling records a limit error and the rest of
/// the input drains as `Noop` statements; parsing still finishes with a
/// well-formed tree.
///
/// `high` keeps the high-water mark, so after a parse you can see how
/// close the input came to the ceiling:
///
/// ```rust
/// use zen_parser::{Lexer, Parser, Scopes};
///
/// let source = format!("set x {}1{}", "(".repeat(40), ")".repeat(40));
/// let mut scopes = Scopes::new();
/// let mut parser = Parser::new(Lexer::new(&source)).recursion_limit(32);
/// let result = parser.parse(&mut scopes);
///
/// assert!(result.errors().iter().any(|e| e.is_limit()));
/// assert!(result.recursion_limit().high > 32);
/// ```
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct LimitTracker {
    current: usize,
    /// High-water mark reached over the lifetime of the tracker.
    pub high: usize,
    /// The configured ceiling.
    pub limit: usize,
}

impl LimitTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    /// Whether the ceiling has been crossed.
    pub fn limited(&self) -> bool {
        self.current > self.limit
    }

    /// Take one unit: a level of grammar recursion, or one scanned token.
    pub fn consume(&mut self) {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
    }

    /// Give a unit back when a grammar rule returns. A frame that was
    /// refused entry never releases, so `high` records the deepest point
    /// actually reached.
    pub fn release(&mut self) {
        self.current = self.current.saturating_sub(1);
    }
}

/// No ceiling at all; the token limit is opt-in.
impl Default for LimitTracker {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl fmt::Debug for LimitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limit: {} (high-water: {})", self.limit, self.high)
    }
}
