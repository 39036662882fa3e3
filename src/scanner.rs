use crate::error::{Error, ErrorKind};

/// A single token produced by the scanner.
///
/// Each token corresponds to one syntactic element of the pattern. A
/// `Character` token carries the (possibly escaped) character it stands
/// for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Token {
    /// The scanner has reached the end of the pattern.
    Eof,
    /// The `*` quantifier.
    Star,
    /// The `+` quantifier.
    Plus,
    /// The `?` quantifier.
    Optional,
    /// The `|` operator.
    Or,
    /// The `(` operator.
    LeftGroup,
    /// The `)` operator.
    RightGroup,
    /// An ordinary character.
    Character(char),
}

/// A scanner over a regular expression pattern.
///
/// The scanner maintains one token of lookahead: `current` returns the
/// token most recently produced and `advance` replaces it with the next
/// one. Construction primes the first token, so scanning errors in the
/// leading token surface from `new` rather than from the first `advance`.
///
/// Positions are byte offsets into the pattern. The position reported for
/// a token is the offset of its first character, so the position of an
/// escaped character token is the offset of its backslash.
#[derive(Clone, Debug)]
pub(crate) struct Scanner<'p> {
    pattern: &'p str,
    /// Offset of the first byte not yet consumed.
    pos: usize,
    /// Offset of the first byte of the current token.
    token_pos: usize,
    token: Token,
}

impl<'p> Scanner<'p> {
    /// Create a scanner over the given pattern and read the first token.
    pub(crate) fn new(pattern: &'p str) -> Result<Scanner<'p>, Error> {
        let mut scanner =
            Scanner { pattern, pos: 0, token_pos: 0, token: Token::Eof };
        scanner.advance()?;
        Ok(scanner)
    }

    /// Returns the current token.
    pub(crate) fn current(&self) -> Token {
        self.token
    }

    /// Returns the byte offset of the current token's first character.
    ///
    /// For `Token::Eof` this is the length of the pattern.
    pub(crate) fn current_position(&self) -> usize {
        self.token_pos
    }

    /// Consume the current token and read the next one.
    pub(crate) fn advance(&mut self) -> Result<(), Error> {
        self.token_pos = self.pos;
        let ch = match self.rest().chars().next() {
            None => {
                self.token = Token::Eof;
                return Ok(());
            }
            Some(ch) => ch,
        };
        self.pos += ch.len_utf8();
        self.token = match ch {
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::Optional,
            '(' => Token::LeftGroup,
            ')' => Token::RightGroup,
            '|' => Token::Or,
            '\\' => self.scan_escape()?,
            ch => Token::Character(ch),
        };
        Ok(())
    }

    /// Scan the character following a backslash.
    ///
    /// A backslash turns a metacharacter into an ordinary one; escaping
    /// anything else is an error.
    fn scan_escape(&mut self) -> Result<Token, Error> {
        let ch = match self.rest().chars().next() {
            None => {
                return Err(Error::new(
                    ErrorKind::EscapeEof,
                    Some(self.pos),
                ));
            }
            Some(ch) => ch,
        };
        match ch {
            '*' | '+' | '?' | '(' | ')' | '|' | '\\' => {
                self.pos += ch.len_utf8();
                Ok(Token::Character(ch))
            }
            _ => Err(Error::new(ErrorKind::EscapeBadChar, Some(self.pos))),
        }
    }

    fn rest(&self) -> &'p str {
        &self.pattern[self.pos..]
    }
}
