use log::debug;

use crate::{
    error::Error,
    matches::MatchResults,
    nfa::Program,
    optimize, parser, pikevm,
};

/// A compiled regular expression.
///
/// A `Regex` ties a pattern string to the program it compiled to. It is
/// immutable once built and can be shared freely across threads; every
/// match runs with its own working state and writes only into the
/// caller-provided [`MatchResults`].
///
/// # Example
///
/// ```
/// use regex_pike::{MatchResults, Regex};
///
/// let re = Regex::new("a(b+)c").unwrap();
/// let mut results = MatchResults::new();
/// assert!(re.search("xxabbcyy", &mut results));
/// assert_eq!(results[0].as_str("xxabbcyy"), "abbc");
/// assert_eq!(results[1].as_str("xxabbcyy"), "bb");
/// ```
#[derive(Clone)]
pub struct Regex {
    pattern: String,
    program: Program,
}

impl Regex {
    /// Compile a pattern with the default configuration.
    ///
    /// Errors carry an [`ErrorKind`](crate::ErrorKind) and the byte
    /// offset in the pattern where the problem was found.
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        RegexBuilder::new(pattern).build()
    }

    /// Returns the pattern string this regex was compiled from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Returns the number of capturing groups, including the implicit
    /// group 0 that spans the whole match.
    pub fn mark_count(&self) -> usize {
        self.program.mark_count()
    }

    /// Returns a read-only view of the compiled program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Match this regex at the start of `haystack`, writing group extents
    /// into `results`.
    ///
    /// Returns true if an accepting path consumed a prefix of the
    /// haystack (the whole haystack need not be consumed; group 0 records
    /// how far the match reached). With several accepting prefixes, the
    /// leftmost-first, greedy one wins. On success every group of the
    /// pattern has an entry in `results`, unparticipating ones unmatched.
    pub fn matches(&self, haystack: &str, results: &mut MatchResults) -> bool {
        pikevm::run(&self.program, haystack, results)
    }

    /// Search for this regex anywhere in `haystack`, writing group
    /// extents into `results`.
    ///
    /// The occurrence starting leftmost wins, and group 0 records its
    /// extent. The search runs a clone of the program behind a non-greedy
    /// any-character prefix, so the prefix consumes input only when no
    /// match can start at the current position.
    pub fn search(&self, haystack: &str, results: &mut MatchResults) -> bool {
        let program = self.program.unanchored();
        pikevm::run(&program, haystack, results)
    }

    /// Returns true if this regex matches anywhere in `haystack`.
    ///
    /// This is [`search`](Regex::search) without the capture bookkeeping
    /// at the call site.
    pub fn is_match(&self, haystack: &str) -> bool {
        let mut results = MatchResults::new();
        self.search(haystack, &mut results)
    }
}

impl core::fmt::Display for Regex {
    /// Shows the original pattern.
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl core::fmt::Debug for Regex {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_tuple("Regex").field(&self.pattern).finish()
    }
}

impl core::str::FromStr for Regex {
    type Err = Error;

    fn from_str(pattern: &str) -> Result<Regex, Error> {
        Regex::new(pattern)
    }
}

/// A configurable builder for a [`Regex`].
///
/// # Example
///
/// ```
/// use regex_pike::RegexBuilder;
///
/// let re = RegexBuilder::new("a|b").optimize(false).build().unwrap();
/// assert!(re.is_match("b"));
/// ```
#[derive(Clone, Debug)]
pub struct RegexBuilder {
    pattern: String,
    optimize: bool,
}

impl RegexBuilder {
    /// Create a new builder for the given pattern.
    pub fn new(pattern: &str) -> RegexBuilder {
        RegexBuilder { pattern: pattern.to_string(), optimize: true }
    }

    /// Whether to run the pass that short-circuits redundant `Goto`
    /// instructions after compilation (enabled by default). The pass is
    /// semantics preserving; disabling it keeps the program exactly as
    /// the parser laid it out.
    pub fn optimize(&mut self, yes: bool) -> &mut RegexBuilder {
        self.optimize = yes;
        self
    }

    /// Compile the pattern with this configuration.
    pub fn build(&self) -> Result<Regex, Error> {
        let mut program = parser::parse(&self.pattern)?;
        if self.optimize {
            optimize::eliminate_gotos(&mut program);
        }
        debug!(
            "compiled {:?}: {} instructions, {} groups",
            self.pattern,
            program.len(),
            program.mark_count(),
        );
        Ok(Regex { pattern: self.pattern.clone(), program })
    }
}
