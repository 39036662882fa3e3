use crate::{
    error::{Error, ErrorKind},
    nfa::{CharCategory, InstrId, Program, DANGLED},
    scanner::{Scanner, Token},
};

/// Parse a pattern into a complete program.
pub(crate) fn parse(pattern: &str) -> Result<Program, Error> {
    Parser::new(Scanner::new(pattern)?).parse_regex()
}

/// A region of a program under construction.
///
/// `start` is the fragment's entry instruction. `end` is its exit
/// instruction, whose dangling successors must be patched when the
/// fragment is composed with whatever follows it. `maybe_empty` records
/// whether the fragment can match the empty string, which decides whether
/// a repetition of it needs a progress guard.
#[derive(Clone, Copy, Debug)]
struct Fragment {
    start: InstrId,
    end: InstrId,
    maybe_empty: bool,
}

/// A recursive-descent parser that translates the token stream directly
/// into a program.
///
/// The grammar, with `Regex` as the start symbol:
///
/// ```text
/// Regex      ::= Sub EOF
/// Sub        ::= Seq ('|' Seq)*
/// Seq        ::= Term*                 (empty allowed)
/// Term       ::= Atom Quantifier*
/// Quantifier ::= '*' | '+' | '?'
/// Atom       ::= Character | '(' Sub ')'
/// ```
///
/// Quantifiers and alternations are handled iteratively, so only group
/// nesting consumes stack depth.
#[derive(Debug)]
struct Parser<'p> {
    scanner: Scanner<'p>,
    program: Program,
}

impl<'p> Parser<'p> {
    fn new(scanner: Scanner<'p>) -> Parser<'p> {
        Parser { scanner, program: Program::new() }
    }

    fn parse_regex(mut self) -> Result<Program, Error> {
        let sub = self.parse_sub()?;
        if self.scanner.current() != Token::Eof {
            return Err(self.error(ErrorKind::UnexpectedToken));
        }
        let accept = self.program.append_accept();
        self.program.patch_dangled(sub.end, accept);
        self.program.set_start_id(sub.start);
        self.program.assert_complete();
        Ok(self.program)
    }

    /// Parse `Seq ('|' Seq)*` and wrap the result in a capturing group.
    ///
    /// The group identifier is allocated before the body is parsed, so
    /// groups are numbered in the order their `(` appears, with the
    /// implicit whole-pattern group first.
    fn parse_sub(&mut self) -> Result<Fragment, Error> {
        let group_id = self.program.alloc_group_id();
        let mut prev = self.parse_seq()?;

        while self.scanner.current() == Token::Or {
            self.scanner.advance()?;
            let alt = self.parse_seq()?;

            // The left branch goes in the preferred fork slot, which is
            // what makes alternation leftmost-first.
            let start = self.program.append_fork(prev.start, alt.start);
            let end = self.program.append_goto(DANGLED);
            self.program.patch_dangled(prev.end, end);
            self.program.patch_dangled(alt.end, end);

            prev = Fragment {
                start,
                end,
                maybe_empty: prev.maybe_empty || alt.maybe_empty,
            };
        }

        let group_start =
            self.program.append_mark_group_start(prev.start, group_id);
        let group_end =
            self.program.append_mark_group_end(DANGLED, group_id);
        self.program.patch_dangled(prev.end, group_end);

        Ok(Fragment {
            start: group_start,
            end: group_end,
            maybe_empty: prev.maybe_empty,
        })
    }

    /// Parse `Term*`. An empty sequence compiles to a lone `Goto`.
    fn parse_seq(&mut self) -> Result<Fragment, Error> {
        if self.at_seq_end() {
            let id = self.program.append_goto(DANGLED);
            return Ok(Fragment { start: id, end: id, maybe_empty: true });
        }
        let mut prev = self.parse_term()?;
        while !self.at_seq_end() {
            let term = self.parse_term()?;
            self.program.patch_dangled(prev.end, term.start);
            prev = Fragment {
                start: prev.start,
                end: term.end,
                maybe_empty: prev.maybe_empty && term.maybe_empty,
            };
        }
        Ok(prev)
    }

    /// Parse `Atom Quantifier*`.
    fn parse_term(&mut self) -> Result<Fragment, Error> {
        let mut prev = self.parse_atom()?;
        loop {
            prev = match self.scanner.current() {
                Token::Star => self.parse_star(prev)?,
                Token::Plus => self.parse_plus(prev)?,
                Token::Optional => self.parse_optional(prev)?,
                _ => return Ok(prev),
            };
        }
    }

    fn parse_star(&mut self, frag: Fragment) -> Result<Fragment, Error> {
        self.scanner.advance()?;

        // A body that can match the empty string gets a progress guard at
        // the loop head, so re-entering it without consuming input is cut
        // off.
        let mut entry = frag.start;
        if frag.maybe_empty {
            entry = self.program.append_advance(frag.start);
        }

        let fork = self.program.append_fork(entry, DANGLED);
        self.program.patch_dangled(frag.end, fork);

        Ok(Fragment { start: fork, end: fork, maybe_empty: true })
    }

    fn parse_plus(&mut self, frag: Fragment) -> Result<Fragment, Error> {
        self.scanner.advance()?;

        let mut entry = frag.start;
        if frag.maybe_empty {
            entry = self.program.append_advance(frag.start);
        }

        let fork = self.program.append_fork(entry, DANGLED);
        self.program.patch_dangled(frag.end, fork);

        // Unlike star, the body runs at least once, so the fragment enters
        // at the body and stays non-empty unless the body itself is.
        Ok(Fragment { start: entry, end: fork, maybe_empty: frag.maybe_empty })
    }

    fn parse_optional(&mut self, frag: Fragment) -> Result<Fragment, Error> {
        self.scanner.advance()?;

        let merge = self.program.append_goto(DANGLED);
        let fork = self.program.append_fork(frag.start, merge);
        self.program.patch_dangled(frag.end, merge);

        Ok(Fragment { start: fork, end: merge, maybe_empty: true })
    }

    fn parse_atom(&mut self) -> Result<Fragment, Error> {
        match self.scanner.current() {
            Token::Character(ch) => {
                let id = self.program.append_match_char_category(
                    CharCategory::Ordinary(ch),
                    DANGLED,
                );
                self.scanner.advance()?;
                Ok(Fragment { start: id, end: id, maybe_empty: false })
            }
            Token::LeftGroup => {
                self.scanner.advance()?;
                let sub = self.parse_sub()?;
                if self.scanner.current() != Token::RightGroup {
                    return Err(self.error(ErrorKind::MissingRightGroup));
                }
                self.scanner.advance()?;
                Ok(sub)
            }
            _ => Err(self.error(ErrorKind::MissingAtom)),
        }
    }

    /// Returns true if the current token ends a sequence, i.e. cannot
    /// start another term.
    fn at_seq_end(&self) -> bool {
        matches!(
            self.scanner.current(),
            Token::Or | Token::RightGroup | Token::Eof,
        )
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error::new(kind, Some(self.scanner.current_position()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::Instr;

    fn p(pattern: &str) -> Program {
        parse(pattern).unwrap()
    }

    fn perr(pattern: &str) -> Error {
        parse(pattern).unwrap_err()
    }

    fn ch(c: char, next: InstrId) -> Instr {
        Instr::MatchCharCategory { cc: CharCategory::Ordinary(c), next }
    }

    fn insns(program: &Program) -> Vec<Instr> {
        (0..program.len()).map(|id| *program.instr(id)).collect()
    }

    #[test]
    fn empty_pattern() {
        let program = p("");
        assert_eq!(
            insns(&program),
            vec![
                Instr::Goto { next: 2 },
                Instr::MarkGroupStart { next: 0, group_id: 0 },
                Instr::MarkGroupEnd { next: 3, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 1);
        assert_eq!(program.mark_count(), 1);
    }

    #[test]
    fn one_char() {
        let program = p("a");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 2),
                Instr::MarkGroupStart { next: 0, group_id: 0 },
                Instr::MarkGroupEnd { next: 3, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 1);
    }

    #[test]
    fn star() {
        let program = p("a*");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 1),
                Instr::Fork { next: 0, next2: 3 },
                Instr::MarkGroupStart { next: 1, group_id: 0 },
                Instr::MarkGroupEnd { next: 4, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 2);
    }

    #[test]
    fn plus() {
        let program = p("a+");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 1),
                Instr::Fork { next: 0, next2: 3 },
                Instr::MarkGroupStart { next: 0, group_id: 0 },
                Instr::MarkGroupEnd { next: 4, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 2);
    }

    #[test]
    fn optional() {
        let program = p("a?");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 1),
                Instr::Goto { next: 4 },
                Instr::Fork { next: 0, next2: 1 },
                Instr::MarkGroupStart { next: 2, group_id: 0 },
                Instr::MarkGroupEnd { next: 5, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 3);
    }

    #[test]
    fn alternation() {
        let program = p("a|b");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 3),
                ch('b', 3),
                Instr::Fork { next: 0, next2: 1 },
                Instr::Goto { next: 5 },
                Instr::MarkGroupStart { next: 2, group_id: 0 },
                Instr::MarkGroupEnd { next: 6, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 4);
    }

    #[test]
    fn starred_group() {
        let program = p("(ab)*");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 1),
                ch('b', 3),
                Instr::MarkGroupStart { next: 0, group_id: 1 },
                Instr::MarkGroupEnd { next: 4, group_id: 1 },
                Instr::Fork { next: 2, next2: 6 },
                Instr::MarkGroupStart { next: 4, group_id: 0 },
                Instr::MarkGroupEnd { next: 7, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 5);
        assert_eq!(program.mark_count(), 2);
    }

    #[test]
    fn starred_empty_group() {
        let program = p("()*");
        assert_eq!(
            insns(&program),
            vec![
                Instr::Goto { next: 2 },
                Instr::MarkGroupStart { next: 0, group_id: 1 },
                Instr::MarkGroupEnd { next: 4, group_id: 1 },
                Instr::Advance { next: 1 },
                Instr::Fork { next: 3, next2: 6 },
                Instr::MarkGroupStart { next: 4, group_id: 0 },
                Instr::MarkGroupEnd { next: 7, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 5);
    }

    #[test]
    fn plussed_empty_group() {
        let program = p("()+");
        assert_eq!(
            insns(&program),
            vec![
                Instr::Goto { next: 2 },
                Instr::MarkGroupStart { next: 0, group_id: 1 },
                Instr::MarkGroupEnd { next: 4, group_id: 1 },
                Instr::Advance { next: 1 },
                Instr::Fork { next: 3, next2: 6 },
                Instr::MarkGroupStart { next: 3, group_id: 0 },
                Instr::MarkGroupEnd { next: 7, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 5);
    }

    #[test]
    fn double_star_gets_one_guard() {
        // The inner star's fragment can match the empty string, so the
        // outer star wraps it with a progress guard.
        let program = p("a**");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 1),
                Instr::Fork { next: 0, next2: 3 },
                Instr::Advance { next: 1 },
                Instr::Fork { next: 2, next2: 5 },
                Instr::MarkGroupStart { next: 3, group_id: 0 },
                Instr::MarkGroupEnd { next: 6, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 4);
    }

    #[test]
    fn group_ids_follow_left_parens() {
        let program = p("a(b)((c))");
        assert_eq!(program.mark_count(), 4);
    }

    #[test]
    fn quantifier_without_atom() {
        let err = perr("*a");
        assert_eq!(err.kind(), ErrorKind::MissingAtom);
        assert_eq!(err.position(), Some(0));
        assert_eq!(perr("+a").kind(), ErrorKind::MissingAtom);
        assert_eq!(perr("?a").kind(), ErrorKind::MissingAtom);
        assert_eq!(perr("a|*b").kind(), ErrorKind::MissingAtom);
    }

    #[test]
    fn unclosed_group() {
        let err = perr("a(bc");
        assert_eq!(err.kind(), ErrorKind::MissingRightGroup);
        assert_eq!(err.position(), Some(4));
    }

    #[test]
    fn unbalanced_right_group() {
        let err = perr("a(b)c)");
        assert_eq!(err.kind(), ErrorKind::UnexpectedToken);
        assert_eq!(err.position(), Some(5));
    }

    #[test]
    fn scanner_errors_propagate() {
        assert_eq!(perr(r"ab\").kind(), ErrorKind::EscapeEof);
        assert_eq!(perr(r"\x").kind(), ErrorKind::EscapeBadChar);
    }

    #[test]
    fn alternation_is_left_associative() {
        let program = p("a|b|c");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 3),
                ch('b', 3),
                Instr::Fork { next: 0, next2: 1 },
                Instr::Goto { next: 6 },
                ch('c', 6),
                Instr::Fork { next: 2, next2: 4 },
                Instr::Goto { next: 8 },
                Instr::MarkGroupStart { next: 5, group_id: 0 },
                Instr::MarkGroupEnd { next: 9, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 7);
    }

    #[test]
    fn quantifiers_stack_without_recursion() {
        // Each additional quantifier wraps the previous fragment in place.
        let program = p("a?+");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 1),
                Instr::Goto { next: 4 },
                Instr::Fork { next: 0, next2: 1 },
                Instr::Advance { next: 2 },
                Instr::Fork { next: 3, next2: 6 },
                Instr::MarkGroupStart { next: 3, group_id: 0 },
                Instr::MarkGroupEnd { next: 7, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 5);
    }

    #[test]
    fn empty_alternation_branches() {
        // Both branches may be empty; each compiles to its own goto.
        let program = p("a|");
        assert_eq!(
            insns(&program),
            vec![
                ch('a', 3),
                Instr::Goto { next: 3 },
                Instr::Fork { next: 0, next2: 1 },
                Instr::Goto { next: 5 },
                Instr::MarkGroupStart { next: 2, group_id: 0 },
                Instr::MarkGroupEnd { next: 6, group_id: 0 },
                Instr::Accept,
            ],
        );
        assert_eq!(program.start_id(), 4);
    }
}
