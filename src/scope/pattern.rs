//! Scope glob patterns
//!
//! Scopes are hierarchical strings whose segments are separated by `:` or
//! `/` (e.g. `folders:7`, `org:current/users:42`). Permission scopes may use
//! globs:
//! - `*` matches any run of characters within one segment
//! - `**` matches any run of characters across segments
//! - `?` matches exactly one character within a segment
//! - `{a,b}` matches either alternative
//! - `[abc]`, `[a-z]` and `[!abc]` match one character from (or outside) a class
//! - `\\` makes the next character literal

use crate::error::{AuthzError, Result};
use regex::Regex;
use std::fmt;

/// Characters that separate scope segments
pub const SEPARATORS: [char; 2] = [':', '/'];

/// A compiled permission scope
#[derive(Debug, Clone)]
pub struct ScopePattern {
    raw: String,
    regex: Option<Regex>,
}

impl ScopePattern {
    /// Compile a scope pattern
    ///
    /// Patterns without wildcards are matched by string equality.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidScopePattern`] if the glob is malformed or
    /// the generated matcher cannot be built (e.g. a reversed class range).
    pub fn compile(pattern: &str) -> Result<Self> {
        if !has_wildcards(pattern) {
            return Ok(Self {
                raw: pattern.to_string(),
                regex: None,
            });
        }

        let regex = Regex::new(&glob_to_regex(pattern)?).map_err(|e| {
            AuthzError::InvalidScopePattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            raw: pattern.to_string(),
            regex: Some(regex),
        })
    }

    /// A pattern that only matches its own text
    pub fn literal(pattern: &str) -> Self {
        Self {
            raw: pattern.to_string(),
            regex: None,
        }
    }

    /// Returns the pattern text
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern contains wildcards
    pub fn has_wildcards(&self) -> bool {
        self.regex.is_some()
    }

    /// Check a requested scope against this pattern
    pub fn matches(&self, scope: &str) -> bool {
        if self.raw == scope {
            return true;
        }
        match &self.regex {
            Some(regex) => regex.is_match(scope),
            None => false,
        }
    }
}

impl fmt::Display for ScopePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Characters with glob meaning
const META: [char; 5] = ['*', '?', '[', '{', '\\'];

/// Whether a scope string uses glob syntax
pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(META)
}

/// Translate a scope glob into an anchored regular expression
///
/// Besides `*`, `**` and `?`, the glob supports `{a,b}` alternation (which
/// may nest and contain globs), `[abc]`/`[a-z]` classes, negated `[!...]`
/// classes that never match a separator, and `\x` escapes for a literal `x`.
///
/// # Errors
///
/// Returns [`AuthzError::InvalidScopePattern`] for an unclosed `[` or `{`,
/// an empty class, or a trailing `\`.
pub fn glob_to_regex(pattern: &str) -> Result<String> {
    let separators: String = SEPARATORS.iter().collect();
    let segment_char = format!("[^{}]", regex::escape(&separators));
    let invalid = |reason: &str| AuthzError::InvalidScopePattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    let mut depth = 0usize;
    let mut buf = [0u8; 4];
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    while chars.peek() == Some(&'*') {
                        chars.next();
                    }
                    out.push_str(".*");
                } else {
                    out.push_str(&segment_char);
                    out.push('*');
                }
            }
            '?' => out.push_str(&segment_char),
            '\\' => {
                let escaped = chars.next().ok_or_else(|| invalid("trailing escape"))?;
                out.push_str(&regex::escape(escaped.encode_utf8(&mut buf)));
            }
            '{' => {
                depth += 1;
                out.push_str("(?:");
            }
            ',' if depth > 0 => out.push('|'),
            '}' if depth > 0 => {
                depth -= 1;
                out.push(')');
            }
            '[' => {
                let negated = chars.next_if_eq(&'!').is_some();
                let mut class = String::new();
                let mut closed = false;
                while let Some(item) = chars.next() {
                    if item == ']' {
                        closed = true;
                        break;
                    }
                    if item == '-' && !class.is_empty() && chars.peek().is_some_and(|n| *n != ']') {
                        class.push('-');
                        continue;
                    }
                    class.push_str(&regex::escape(item.encode_utf8(&mut buf)));
                }
                if !closed {
                    return Err(invalid("unclosed character class"));
                }
                if class.is_empty() {
                    return Err(invalid("empty character class"));
                }
                if negated {
                    out.push_str(&format!("[^{}{}]", class, regex::escape(&separators)));
                } else {
                    out.push_str(&format!("[{}]", class));
                }
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }

    if depth > 0 {
        return Err(invalid("unclosed alternation"));
    }

    out.push('$');
    Ok(out)
}
