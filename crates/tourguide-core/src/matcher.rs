//! Declarative text matchers
//!
//! Phrase tables and regex tables sit behind one trait so classifier and gate
//! rules can be swapped or tuned without touching control flow.

use regex::Regex;
use std::fmt;

/// A predicate over already-normalized text
pub trait TextMatcher: Send + Sync + fmt::Debug {
    /// Whether the text matches
    fn matches(&self, text: &str) -> bool;

    /// The matched fragment, when there is one
    fn find<'t>(&self, text: &'t str) -> Option<&'t str>;
}

/// Case-sensitive substring set; callers lowercase the input first
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrases: Vec<String>,
}

impl PhraseMatcher {
    /// Create from phrases (stored lowercased)
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl TextMatcher for PhraseMatcher {
    fn matches(&self, text: &str) -> bool {
        self.phrases.iter().any(|p| text.contains(p.as_str()))
    }

    fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.phrases
            .iter()
            .find_map(|p| text.find(p.as_str()).map(|start| &text[start..start + p.len()]))
    }
}

/// Ordered regex set; the first pattern that matches wins
#[derive(Clone)]
pub struct PatternMatcher {
    patterns: Vec<Regex>,
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

impl PatternMatcher {
    /// Compile a pattern set
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Compile a built-in table; the tables are constants covered by tests
    pub(crate) fn builtin(patterns: &[&str]) -> Self {
        #[allow(clippy::expect_used)]
        Self::new(patterns).expect("built-in pattern table must compile")
    }

    /// Index and matched fragment of the first matching pattern
    #[must_use]
    pub fn first_match<'t>(&self, text: &'t str) -> Option<(usize, &'t str)> {
        self.patterns
            .iter()
            .enumerate()
            .find_map(|(index, re)| re.find(text).map(|m| (index, m.as_str())))
    }
}

impl TextMatcher for PatternMatcher {
    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns
            .iter()
            .find_map(|re| re.find(text).map(|m| m.as_str()))
    }
}
