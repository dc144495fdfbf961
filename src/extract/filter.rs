//! Keyword filtering and match-count limiting for one tail session.

use bstr::{BStr, ByteSlice};

/// Per-session line filter.
///
/// A line passes when it contains the keyword as a literal, case-sensitive
/// byte substring (every line passes without a keyword). Each passing line
/// counts toward the optional limit; once the limit is reached nothing else
/// passes.
#[derive(Debug, Clone, Default)]
pub struct LineFilter {
    keyword: Option<Vec<u8>>,
    match_limit: Option<usize>,
    matches_counted: usize,
}

impl LineFilter {
    /// Create a filter. An empty keyword is treated as no keyword.
    pub fn new(keyword: Option<impl Into<Vec<u8>>>, match_limit: Option<usize>) -> Self {
        let keyword = keyword.map(Into::into).filter(|k: &Vec<u8>| !k.is_empty());
        Self {
            keyword,
            match_limit,
            matches_counted: 0,
        }
    }

    /// A filter that lets every line through
    pub fn pass_all() -> Self {
        Self::default()
    }

    pub fn keyword(&self) -> Option<&BStr> {
        self.keyword.as_deref().map(ByteSlice::as_bstr)
    }

    pub fn match_limit(&self) -> Option<usize> {
        self.match_limit
    }

    pub fn matches_counted(&self) -> usize {
        self.matches_counted
    }

    /// Whether `line` contains the keyword, ignoring the limit
    pub fn matches(&self, line: &[u8]) -> bool {
        match &self.keyword {
            Some(keyword) => line.contains_str(keyword),
            None => true,
        }
    }

    pub fn is_limit_reached(&self) -> bool {
        self.match_limit
            .is_some_and(|limit| self.matches_counted >= limit)
    }

    /// Decide whether `line` is forwarded, counting it if so
    pub fn admit(&mut self, line: &[u8]) -> bool {
        if self.is_limit_reached() || !self.matches(line) {
            return false;
        }
        self.matches_counted += 1;
        true
    }
}
