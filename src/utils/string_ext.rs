//! String helpers

/// Trim and drop empty values.
///
/// # Example
/// ```ignore
/// let search = clean_optional_string(query.search.as_ref());
/// ```
#[inline]
pub fn clean_optional_string(s: Option<&String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub trait StringExt {
    /// Trimmed copy, `None` when blank
    fn clean(&self) -> Option<String>;

    /// Case-insensitive substring match; `needle` must already be lowercase
    fn contains_lowercase(&self, needle: &str) -> bool;
}

impl StringExt for str {
    #[inline]
    fn clean(&self) -> Option<String> {
        let trimmed = self.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    }

    #[inline]
    fn contains_lowercase(&self, needle: &str) -> bool {
        self.to_lowercase().contains(needle)
    }
}

impl StringExt for String {
    #[inline]
    fn clean(&self) -> Option<String> {
        self.as_str().clean()
    }

    #[inline]
    fn contains_lowercase(&self, needle: &str) -> bool {
        self.as_str().contains_lowercase(needle)
    }
}

impl<T: AsRef<str>> StringExt for Option<T> {
    #[inline]
    fn clean(&self) -> Option<String> {
        self.as_ref().and_then(|s| s.as_ref().clean())
    }

    #[inline]
    fn contains_lowercase(&self, needle: &str) -> bool {
        self.as_ref().is_some_and(|s| s.as_ref().contains_lowercase(needle))
    }
}
