//! Cache key scheme for owner listings.
//!
//! Keys have the shape `{prefix}:v{version}:owner:{owner}:list:page:{page}:size:{size}`.
//! Every component before the owner is fixed for a given scheme and the owner
//! is a hyphenated UUID, so `{prefix}:v{version}:owner:{owner}:list:*` covers
//! exactly one owner's listings without knowing which pages were cached.

use uuid::Uuid;

use crate::codec::PAYLOAD_VERSION;
use crate::model::PageRequest;

/// Prefix used when the configuration does not name one.
pub const DEFAULT_KEY_PREFIX: &str = "todos";

/// Builds listing keys and per-owner invalidation patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListKeyScheme {
    prefix: String,
}

impl ListKeyScheme {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key under which one page of an owner's listing is cached.
    pub fn list_key(&self, owner_id: Uuid, request: PageRequest) -> String {
        format!(
            "{}:v{}:owner:{}:list:page:{}:size:{}",
            self.prefix,
            PAYLOAD_VERSION,
            owner_id.hyphenated(),
            request.page(),
            request.page_size()
        )
    }

    /// Glob pattern matching every listing key of `owner_id` and nothing else.
    pub fn list_key_pattern(&self, owner_id: Uuid) -> String {
        format!(
            "{}:v{}:owner:{}:list:*",
            escape_glob(&self.prefix),
            PAYLOAD_VERSION,
            owner_id.hyphenated()
        )
    }

    /// Inverse of [`list_key`](Self::list_key). Returns `None` for keys this
    /// scheme did not produce.
    pub fn parse_list_key(&self, key: &str) -> Option<(Uuid, PageRequest)> {
        let rest = key.strip_prefix(self.prefix.as_str())?;
        let rest = rest.strip_prefix(&format!(":v{PAYLOAD_VERSION}:owner:"))?;

        let mut parts = rest.split(':');
        let owner = parts.next()?;
        if parts.next()? != "list" || parts.next()? != "page" {
            return None;
        }
        let page = parse_canonical_u32(parts.next()?)?;
        if parts.next()? != "size" {
            return None;
        }
        let size = parse_canonical_u32(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }

        let owner_id = Uuid::try_parse(owner).ok()?;
        // Only the hyphenated lowercase form is ever written.
        if owner_id.hyphenated().to_string() != owner {
            return None;
        }
        let request = PageRequest::new(page, size).ok()?;
        Some((owner_id, request))
    }
}

impl Default for ListKeyScheme {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

fn parse_canonical_u32(s: &str) -> Option<u32> {
    let value: u32 = s.parse().ok()?;
    (value.to_string() == s).then_some(value)
}

/// Escapes Redis glob metacharacters so the text matches only itself.
pub fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Matches `text` against a glob `pattern`.
///
/// Supports the subset of Redis glob syntax this crate emits: `*`, `?` and
/// backslash escapes. Any other character matches itself.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    backtrack = Some((p, t));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    t += 1;
                    continue;
                }
                '\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == text[t] {
                        p += 2;
                        t += 1;
                        continue;
                    }
                }
                c => {
                    if c == text[t] {
                        p += 1;
                        t += 1;
                        continue;
                    }
                }
            }
        }

        match backtrack {
            Some((star_p, star_t)) => {
                p = star_p + 1;
                t = star_t + 1;
                backtrack = Some((star_p, star_t + 1));
            }
            None => return false,
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}
