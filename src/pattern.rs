//! # Pattern Compiler
//!
//! Compiles the pluck and strum mini-languages into a reusable [`Pattern`].
//!
//! ## Grammar
//! ```text
//! spec       := offset [displacement] action+
//! offset     := non-negative beat, 1-relative ("1", "2.5", "7/2")
//! displacement := signed beat or fraction ("1/16", "-1/32", "0")
//! action     := string-set ":" velocity
//! string-set := item ("," item)*
//! item       := n | n "-" m
//! ```
//!
//! Strings are numbered from the highest-pitched string (1) downwards, so on a
//! guitar `1` is the high E and `6` the low E.
//!
//! ## Strums
//! With a non-zero displacement every action token becomes its own action
//! group, each one `|displacement|` beats after the previous. A negative
//! displacement plays the whole strike sequence backwards (an up-strum).
//! With a zero displacement all actions sound together at the offset.
//!
//! ## Example
//! ```rust
//! use strumline::{compile_strum, Beat};
//!
//! let pattern = compile_strum(&["1 1 6:90 1-3:80"]).unwrap();
//! assert_eq!(pattern.len(), 2);
//! assert_eq!(pattern.groups()[1].offset, Beat::from_int(2));
//! let strings: Vec<u32> = pattern.groups()[1].strikes.iter().map(|s| s.string).collect();
//! assert_eq!(strings, vec![1, 2, 3]);
//! ```

use crate::beat::Beat;
use crate::error::StrumError;

/// A single string strike: string number counted from the highest string,
/// and the raw velocity (0 mutes the string).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strike {
    pub string: u32,
    pub velocity: u32,
}

/// Strikes that share one beat offset, in strike order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGroup {
    pub offset: Beat,
    pub strikes: Vec<Strike>,
}

/// A compiled, immutable sequence of action groups.
///
/// Groups keep generation order; they are never sorted by offset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pattern {
    groups: Vec<ActionGroup>,
}

impl Pattern {
    pub fn groups(&self) -> &[ActionGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Compile pluck specs (`"<offset> <action>+"`).
///
/// Every spec is rewritten with a zero displacement and handed to
/// [`compile_strum`], so all actions of one spec sound together.
pub fn compile_pluck<S: AsRef<str>>(specs: &[S]) -> Result<Pattern, StrumError> {
    let rewritten: Vec<String> = specs
        .iter()
        .map(|spec| {
            let spec = spec.as_ref().trim();
            match spec.split_once(char::is_whitespace) {
                Some((offset, rest)) => format!("{} 0 {}", offset, rest.trim_start()),
                None => spec.to_string(),
            }
        })
        .collect();
    compile_strum(&rewritten)
}

/// Compile strum specs (`"<offset> [<displacement>] <action>+"`).
pub fn compile_strum<S: AsRef<str>>(specs: &[S]) -> Result<Pattern, StrumError> {
    let mut groups = Vec::new();
    for spec in specs {
        let spec = spec.as_ref();
        let parsed = SpecParser::new(spec).parse()?;
        parsed.expand_into(&mut groups).ok_or_else(|| {
            StrumError::parse(spec.trim(), "strum offsets overflow the beat range")
        })?;
    }
    log::trace!(target: "pattern", "compiled {} spec(s) into {} group(s)", specs.len(), groups.len());
    Ok(Pattern { groups })
}

/// Expand a string set like `"2-4"`, `"4-2"` or `"5,1"` into string numbers.
///
/// Ranges run in the written direction; order is significant for strums.
pub fn parse_string_set(set: &str) -> Result<Vec<u32>, StrumError> {
    let mut strings = Vec::new();
    for item in set.split(',') {
        let item = item.trim();
        let bad = || StrumError::parse(set, format!("invalid string set item '{}'", item));
        match item.split_once('-') {
            Some((from, to)) => {
                let from = parse_unsigned(from).ok_or_else(bad)?;
                let to = parse_unsigned(to).ok_or_else(bad)?;
                if from <= to {
                    strings.extend(from..=to);
                } else {
                    strings.extend((to..=from).rev());
                }
            }
            None => strings.push(parse_unsigned(item).ok_or_else(bad)?),
        }
    }
    Ok(strings)
}

fn parse_unsigned(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// One spec after parsing, before expansion into groups.
struct ParsedSpec {
    offset: Beat,
    displacement: Beat,
    actions: Vec<Vec<Strike>>,
}

impl ParsedSpec {
    /// Returns `None` when a strum step leaves the beat range.
    fn expand_into(self, groups: &mut Vec<ActionGroup>) -> Option<()> {
        if self.displacement.is_zero() {
            groups.push(ActionGroup {
                offset: self.offset,
                strikes: self.actions.into_iter().flatten().collect(),
            });
            return Some(());
        }

        let mut actions = self.actions;
        if self.displacement.is_negative() {
            actions.reverse();
            for strikes in &mut actions {
                strikes.reverse();
            }
        }

        let step = self.displacement.abs();
        let mut expanded = Vec::with_capacity(actions.len());
        let mut offset = self.offset;
        for (i, strikes) in actions.into_iter().enumerate() {
            if i > 0 {
                offset = offset.checked_add(step)?;
            }
            expanded.push(ActionGroup { offset, strikes });
        }
        groups.extend(expanded);
        Some(())
    }
}

/// Word-level scanner over a single spec string.
struct SpecParser<'a> {
    spec: &'a str,
    words: std::iter::Peekable<std::str::SplitWhitespace<'a>>,
}

impl<'a> SpecParser<'a> {
    fn new(spec: &'a str) -> Self {
        Self {
            spec,
            words: spec.split_whitespace().peekable(),
        }
    }

    fn error(&self, message: impl Into<String>) -> StrumError {
        StrumError::parse(self.spec.trim(), message)
    }

    fn parse(mut self) -> Result<ParsedSpec, StrumError> {
        let offset_word = self
            .words
            .next()
            .ok_or_else(|| self.error("empty pattern spec"))?;
        let offset: Beat = offset_word
            .parse()
            .map_err(|_| self.error(format!("invalid offset '{}'", offset_word)))?;
        if offset.is_negative() {
            return Err(self.error(format!("offset '{}' must not be negative", offset_word)));
        }

        // The displacement is optional: an action always contains ':'.
        let displacement = match self.words.peek() {
            Some(word) if !word.contains(':') => {
                let word = *word;
                self.words.next();
                word.parse()
                    .map_err(|_| self.error(format!("invalid displacement '{}'", word)))?
            }
            _ => Beat::ZERO,
        };

        let mut actions = Vec::new();
        while let Some(word) = self.words.next() {
            actions.push(self.parse_action(word)?);
        }
        if actions.is_empty() {
            return Err(self.error("pattern spec has no actions"));
        }

        Ok(ParsedSpec {
            offset,
            displacement,
            actions,
        })
    }

    fn parse_action(&self, word: &str) -> Result<Vec<Strike>, StrumError> {
        let (set, velocity) = word
            .split_once(':')
            .ok_or_else(|| self.error(format!("action '{}' is not <strings>:<velocity>", word)))?;
        let velocity = parse_unsigned(velocity)
            .ok_or_else(|| self.error(format!("invalid velocity '{}'", velocity)))?;
        let strings = parse_string_set(set).map_err(|_| {
            self.error(format!("invalid string set '{}'", set))
        })?;
        Ok(strings
            .into_iter()
            .map(|string| Strike { string, velocity })
            .collect())
    }
}
