//! Package version model and ordering
//!
//! Versions are dot-separated numeric components, an optional single
//! trailing letter, zero or more typed suffixes (`_alpha`, `_beta`,
//! `_pre`, `_rc`, `_p`, each with an optional number), and an optional
//! `-rN` revision. `_p` sorts above the unsuffixed version, the other
//! suffix kinds below it. A trailing `*` marks the version as a prefix
//! pattern, which is only meaningful under the `=` operator.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Version comparison operator used in atoms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `<` - strictly less than.
    Less,
    /// `<=` - less than or equal.
    LessOrEqual,
    /// `=` - exact match including revision; with a `*`-suffixed version,
    /// numeric-prefix match instead.
    Equal,
    /// `~` - same base version, any revision.
    Approximate,
    /// `>=` - greater than or equal.
    GreaterOrEqual,
    /// `>` - strictly greater than.
    Greater,
}

impl Operator {
    /// Split a leading operator off a specifier, longest form first.
    pub(crate) fn strip(s: &str) -> (Option<Operator>, &str) {
        if let Some(rest) = s.strip_prefix("<=") {
            (Some(Operator::LessOrEqual), rest)
        } else if let Some(rest) = s.strip_prefix(">=") {
            (Some(Operator::GreaterOrEqual), rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (Some(Operator::Less), rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (Some(Operator::Greater), rest)
        } else if let Some(rest) = s.strip_prefix('~') {
            (Some(Operator::Approximate), rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (Some(Operator::Equal), rest)
        } else {
            (None, s)
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Less => write!(f, "<"),
            Operator::LessOrEqual => write!(f, "<="),
            Operator::Equal => write!(f, "="),
            Operator::Approximate => write!(f, "~"),
            Operator::GreaterOrEqual => write!(f, ">="),
            Operator::Greater => write!(f, ">"),
        }
    }
}

/// Version suffix kind, in comparison order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuffixKind {
    Alpha,
    Beta,
    Pre,
    Rc,
    /// Patchlevel; sorts above the unsuffixed base version.
    P,
}

impl SuffixKind {
    fn rank(&self) -> i32 {
        match self {
            SuffixKind::Alpha => -4,
            SuffixKind::Beta => -3,
            SuffixKind::Pre => -2,
            SuffixKind::Rc => -1,
            SuffixKind::P => 1,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            SuffixKind::Alpha => "alpha",
            SuffixKind::Beta => "beta",
            SuffixKind::Pre => "pre",
            SuffixKind::Rc => "rc",
            SuffixKind::P => "p",
        }
    }
}

/// One `_suffix` segment with an optional numeric qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Suffix {
    pub kind: SuffixKind,
    pub number: Option<u64>,
}

impl Suffix {
    fn parse(segment: &str) -> Option<Self> {
        // "pre" must be tried before "p".
        let kinds = [
            SuffixKind::Alpha,
            SuffixKind::Beta,
            SuffixKind::Pre,
            SuffixKind::Rc,
            SuffixKind::P,
        ];
        for kind in kinds {
            if let Some(tail) = segment.strip_prefix(kind.tag()) {
                if tail.is_empty() {
                    return Some(Suffix { kind, number: None });
                }
                if tail.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(number) = tail.parse() {
                        return Some(Suffix {
                            kind,
                            number: Some(number),
                        });
                    }
                }
            }
        }
        None
    }
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.kind.tag())?;
        if let Some(number) = self.number {
            write!(f, "{}", number)?;
        }
        Ok(())
    }
}

impl PartialOrd for Suffix {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Suffix {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.kind.rank().cmp(&other.kind.rank()) {
            Ordering::Equal => match (&self.number, &other.number) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            },
            other => other,
        }
    }
}

/// Package version
///
/// Comparison defines a strict total order: numeric components
/// left-to-right with missing components treated as zero, then the
/// letter, then suffixes, then the revision. `1.2` and `1.2.0` compare
/// equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    /// Dot-separated numeric components.
    pub numbers: Vec<u64>,
    /// Optional single lowercase letter after the numbers (e.g. `1.2.3a`).
    pub letter: Option<char>,
    /// Ordered version suffixes.
    pub suffixes: Vec<Suffix>,
    /// Revision (`-rN`); 0 is the implicit default and not displayed.
    pub revision: u64,
    /// Trailing `*` prefix-pattern marker.
    pub glob: bool,
}

impl Version {
    /// Parse a version string such as `1.2.3a_rc2-r1` or `1.2*`.
    pub fn parse(input: &str) -> Result<Self> {
        let err = || Error::InvalidVersion(input.to_string());

        let mut rest = input;
        let glob = match rest.strip_suffix('*') {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };

        let mut revision = 0;
        if let Some(idx) = rest.rfind("-r") {
            let tail = &rest[idx + 2..];
            if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
                revision = tail.parse().map_err(|_| err())?;
                rest = &rest[..idx];
            }
        }

        let (mut head, suffix_part) = match rest.find('_') {
            Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
            None => (rest, None),
        };

        let mut suffixes = Vec::new();
        if let Some(part) = suffix_part {
            for segment in part.split('_') {
                suffixes.push(Suffix::parse(segment).ok_or_else(&err)?);
            }
        }

        let mut letter = None;
        if let Some(last) = head.chars().last() {
            if last.is_ascii_lowercase() {
                letter = Some(last);
                head = &head[..head.len() - 1];
            }
        }

        if head.is_empty() {
            return Err(err());
        }
        let mut numbers = Vec::new();
        for component in head.split('.') {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            numbers.push(component.parse().map_err(|_| err())?);
        }

        Ok(Version {
            numbers,
            letter,
            suffixes,
            revision,
            glob,
        })
    }

    /// The version without its revision, for `~` comparisons.
    pub fn base(&self) -> Version {
        Version {
            numbers: self.numbers.clone(),
            letter: self.letter,
            suffixes: self.suffixes.clone(),
            revision: 0,
            glob: false,
        }
    }

    /// Numeric-prefix match for `=…*` constraints: every component (and
    /// the letter, if present) of `self` must equal the corresponding
    /// component of `other`. Suffixes and revision are not constrained.
    pub fn prefix_matches(&self, other: &Version) -> bool {
        if other.numbers.len() < self.numbers.len() {
            return false;
        }
        for (i, n) in self.numbers.iter().enumerate() {
            if other.numbers[i] != *n {
                return false;
            }
        }
        match self.letter {
            Some(letter) => other.letter == Some(letter),
            None => true,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, number) in self.numbers.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", number)?;
        }
        if let Some(letter) = self.letter {
            write!(f, "{}", letter)?;
        }
        for suffix in &self.suffixes {
            write!(f, "{}", suffix)?;
        }
        if self.revision != 0 {
            write!(f, "-r{}", self.revision)?;
        }
        if self.glob {
            write!(f, "*")?;
        }
        Ok(())
    }
}

// Equality follows the ordering so that `1.2` == `1.2.0`.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let components = self.numbers.len().max(other.numbers.len());
        for i in 0..components {
            let a = self.numbers.get(i).copied().unwrap_or(0);
            let b = other.numbers.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ordering => return ordering,
            }
        }

        let a_letter = self.letter.unwrap_or('\0');
        let b_letter = other.letter.unwrap_or('\0');
        match a_letter.cmp(&b_letter) {
            Ordering::Equal => {}
            ordering => return ordering,
        }

        let suffixes = self.suffixes.len().max(other.suffixes.len());
        for i in 0..suffixes {
            match (self.suffixes.get(i), other.suffixes.get(i)) {
                (Some(a), Some(b)) => match a.cmp(b) {
                    Ordering::Equal => {}
                    ordering => return ordering,
                },
                (Some(suffix), None) => {
                    return if suffix.kind == SuffixKind::P {
                        Ordering::Greater
                    } else {
                        Ordering::Less
                    };
                }
                (None, Some(suffix)) => {
                    return if suffix.kind == SuffixKind::P {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    };
                }
                (None, None) => break,
            }
        }

        self.revision.cmp(&other.revision)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
