/*!
A small regular expression engine built on a Thompson NFA and a Pike-style
virtual machine, with capturing groups and leftmost-first match semantics.

A pattern is compiled into a linear program of NFA instructions, and
matching simulates every thread of that program in lock step over the
input, so matching time is bounded by the product of the input length and
the program size. No backtracking ever happens, and pathological patterns
like `a**` are handled by a progress guard compiled into repetitions that
could otherwise loop without consuming input.

# Example

```
use regex_pike::{MatchResults, Regex};

let re = Regex::new("(a|bc)+d").unwrap();
let hay = "xxbcadyy";
let mut results = MatchResults::new();

assert!(re.search(hay, &mut results));
assert_eq!(results[0].as_str(hay), "bcad");
assert_eq!(results[1].as_str(hay), "a");
```

# Matching modes

There are two entry points with identical capture contracts:

* [`Regex::matches`] anchors the match at the start of the haystack and
  reports whether an accepting path consumed a prefix of it. Group 0
  records exactly the prefix that matched.
* [`Regex::search`] finds the leftmost occurrence anywhere in the
  haystack, by running a clone of the program behind a non-greedy
  any-character loop.

Both report their result through a caller-provided [`MatchResults`], one
[`SubMatch`] per capturing group in left-paren order, with the implicit
group 0 first. All positions are byte offsets into the haystack, and every
offset lies on a `char` boundary.

# Syntax

The supported syntax is deliberately small:

```text
a        any character not listed below matches itself
e*       zero or more of e, greedy
e+       one or more of e, greedy
e?       zero or one of e, greedy
e|f      e or f, preferring e
(e)      capturing group
\*       escaped metacharacter; one of * + ? ( ) | \
```

There are no anchors, character classes, bounded repetitions or
backreferences. `.` is an ordinary character.

# Tie-breaking

At every fork in the compiled program the preferred branch is tried first:
quantifiers prefer to keep matching and alternations prefer their left
branch. The first accepting thread in that priority order decides the
captures, which reproduces the semantics of a backtracking engine without
its running time.
*/

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]
#![deny(missing_docs)]

pub use crate::{
    error::{Error, ErrorKind},
    matches::{MatchResults, SubMatch},
    nfa::{CharCategory, Instr, InstrId, Program, DANGLED},
    regex::{Regex, RegexBuilder},
};

mod error;
mod matches;
mod nfa;
mod optimize;
mod parser;
mod pikevm;
mod regex;
mod scanner;
