//! Glob patterns over object keys
//!
//! Supports `*` (within one path segment), `?` (one character within a
//! segment), `**` (any number of segments) and `[...]` character classes.

use crate::error::{Error, Result};
use regex::Regex;

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim_start_matches('/').to_string();
        let regex = Regex::new(&glob_to_regex(&pattern)?)
            .map_err(|e| Error::invalid_value("glob", format!("{pattern}: {e}")))?;
        Ok(Self { pattern, regex })
    }

    /// The source pattern
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Whether a relative key matches the whole pattern
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Leading directory segments that contain no wildcard
    ///
    /// Used to narrow object listings, e.g. `log_data/2018/11/*.json`
    /// lists under `log_data/2018/11`.
    pub fn literal_prefix(&self) -> String {
        let segments: Vec<&str> = self.pattern.split('/').collect();
        let dirs = &segments[..segments.len().saturating_sub(1)];
        dirs.iter()
            .take_while(|s| !has_wildcard(s))
            .copied()
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

/// Translate a glob into an anchored regular expression
fn glob_to_regex(pattern: &str) -> Result<String> {
    let mut out = String::with_capacity(pattern.len() * 2);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    // `**/` also matches zero directories
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        out.push_str("(?:.*/)?");
                    } else {
                        out.push_str(".*");
                    }
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    class.push(c);
                }
                if !closed || class.is_empty() {
                    return Err(Error::invalid_value(
                        "glob",
                        format!("unterminated character class in '{pattern}'"),
                    ));
                }
                let class = match class.strip_prefix('!') {
                    Some(negated) => format!("^{}", negated.replace('\\', "\\\\")),
                    None => class.replace('\\', "\\\\"),
                };
                out.push('[');
                out.push_str(&class);
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    Ok(out)
}
