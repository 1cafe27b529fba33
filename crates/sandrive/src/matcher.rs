//! Name predicates for list filtering.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{DriveError, DriveResult};

/// Predicate over an entry's base name.
///
/// Cheap to clone; the underlying predicate is shared.
#[derive(Clone)]
pub struct NameMatcher {
    pattern: String,
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl NameMatcher {
    /// Wrap an arbitrary predicate.
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            pattern: "<fn>".to_string(),
            predicate: Arc::new(predicate),
        }
    }

    /// Match names against a regular expression (unanchored, as `Regex::is_match`).
    pub fn regex(pattern: &str) -> DriveResult<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| DriveError::config(format!("invalid pattern {pattern:?}: {e}")))?;
        Ok(Self {
            pattern: pattern.to_string(),
            predicate: Arc::new(move |name: &str| re.is_match(name)),
        })
    }

    /// Match names against a shell glob: `*`, `?` and `[...]` classes
    /// (`[!...]` negates). The whole name must match.
    pub fn glob(glob: &str) -> DriveResult<Self> {
        let re = Regex::new(&glob_to_regex(glob))
            .map_err(|e| DriveError::config(format!("invalid glob {glob:?}: {e}")))?;
        Ok(Self {
            pattern: glob.to_string(),
            predicate: Arc::new(move |name: &str| re.is_match(name)),
        })
    }

    /// Match if any of `globs` matches. `None` for an empty list.
    pub fn any_glob<S: AsRef<str>>(globs: &[S]) -> DriveResult<Option<Self>> {
        if globs.is_empty() {
            return Ok(None);
        }
        let alternatives: Vec<String> = globs
            .iter()
            .map(|g| format!("(?:{})", glob_to_regex(g.as_ref())))
            .collect();
        let joined = alternatives.join("|");
        let re = Regex::new(&joined)
            .map_err(|e| DriveError::config(format!("invalid glob list: {e}")))?;
        let pattern = globs
            .iter()
            .map(|g| g.as_ref())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(Some(Self {
            pattern,
            predicate: Arc::new(move |name: &str| re.is_match(name)),
        }))
    }

    pub fn matches(&self, name: &str) -> bool {
        (self.predicate)(name)
    }
}

impl fmt::Debug for NameMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NameMatcher").field(&self.pattern).finish()
    }
}

/// Translate a glob into an anchored regex.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                // An unclosed or empty class is a literal '['.
                match chars.clone().position(|ch| ch == ']') {
                    Some(end) if end > 0 => {
                        let class: String = chars.by_ref().take(end).collect();
                        chars.next();
                        out.push('[');
                        let mut body = class.as_str();
                        if let Some(negated) = body.strip_prefix('!') {
                            out.push('^');
                            body = negated;
                        }
                        for ch in body.chars() {
                            if matches!(ch, '\\' | '[' | ']' | '^') {
                                out.push('\\');
                            }
                            out.push(ch);
                        }
                        out.push(']');
                    }
                    _ => out.push_str(r"\["),
                }
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}
