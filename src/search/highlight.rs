use std::fmt;

/// A label split around the first case-insensitive occurrence of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight<'a> {
    pub before: &'a str,
    pub matched: &'a str,
    pub after: &'a str,
}

impl<'a> Highlight<'a> {
    pub fn is_match(&self) -> bool {
        !self.matched.is_empty()
    }

    /// The label with the matched span wrapped in `open`/`close`.
    pub fn wrap(&self, open: &str, close: &str) -> String {
        if !self.is_match() {
            return self.before.to_string();
        }
        format!("{}{open}{}{close}{}", self.before, self.matched, self.after)
    }
}

impl fmt::Display for Highlight<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wrap("<strong>", "</strong>"))
    }
}

/// Mark the first occurrence of `query` in `label`, ignoring case. Without a
/// match the whole label comes back unmarked.
pub fn highlight<'a>(label: &'a str, query: &str) -> Highlight<'a> {
    match find_ignore_case(label, query.trim()) {
        Some((start, end)) => Highlight {
            before: &label[..start],
            matched: &label[start..end],
            after: &label[end..],
        },
        None => Highlight {
            before: label,
            matched: "",
            after: "",
        },
    }
}

/// Byte range in `haystack` whose lowercase form equals the lowercase form of
/// `needle`. Works on chars so the range always lands on char boundaries.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }

    'start: for (start, _) in haystack.char_indices() {
        let mut expected = needle.iter();
        for (offset, ch) in haystack[start..].char_indices() {
            for lower in ch.to_lowercase() {
                match expected.next() {
                    Some(&want) if want == lower => {}
                    _ => continue 'start,
                }
            }
            if expected.len() == 0 {
                return Some((start, start + offset + ch.len_utf8()));
            }
        }
        return None;
    }
    None
}
