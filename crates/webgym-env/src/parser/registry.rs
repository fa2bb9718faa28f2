//! Identifier registry and slug normalization.
//!
//! The registry is owned by a single traversal: created empty, discarded at
//! the end, never shared across invocations. That keeps concurrent
//! traversals of distinct pages fully independent.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum length of an identifier's base slug.
const SLUG_MAX: usize = 20;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").unwrap());

/// Normalize text into an identifier base: lowercase, non-word runs collapsed
/// to `_`, trimmed, truncated to [`SLUG_MAX`] characters. Returns an empty
/// string when nothing survives.
pub fn slug(text: &str) -> String {
    let lower = text.to_lowercase();
    let collapsed = NON_WORD.replace_all(&lower, "_");
    let mut out: String = collapsed.trim_matches('_').chars().take(SLUG_MAX).collect();
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Set of identifiers allocated by one traversal.
#[derive(Debug, Default)]
pub struct IdRegistry {
    used: HashSet<String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `candidate`, or `candidate` plus the smallest positive integer
    /// suffix not yet taken.
    pub fn unique(&mut self, candidate: &str) -> String {
        if self.used.insert(candidate.to_string()) {
            return candidate.to_string();
        }
        let mut n = 1u32;
        loop {
            let suffixed = format!("{candidate}{n}");
            if self.used.insert(suffixed.clone()) {
                return suffixed;
            }
            n += 1;
        }
    }

    /// Build and reserve a parent-prefixed identifier.
    pub fn assign(&mut self, parent: &str, base: &str) -> String {
        if parent.is_empty() {
            self.unique(base)
        } else {
            self.unique(&format!("{parent}.{base}"))
        }
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lowercases_and_collapses() {
        assert_eq!(slug("Add to Cart"), "add_to_cart");
        assert_eq!(slug("  Sign   In!  "), "sign_in");
        assert_eq!(slug("20% off — today"), "20_off_today");
    }

    #[test]
    fn slug_truncates_to_twenty() {
        let long = "This is a very long button label indeed";
        let s = slug(long);
        assert!(s.len() <= 20, "slug too long: {s}");
        assert_eq!(s, "this_is_a_very_long");
    }

    #[test]
    fn slug_drops_non_ascii_runs() {
        assert_eq!(slug("Café ☕ menu"), "caf_menu");
    }

    #[test]
    fn slug_can_be_empty() {
        assert_eq!(slug("  ★★★  "), "");
        assert_eq!(slug(""), "");
    }

    #[test]
    fn unique_suffixes_in_order() {
        let mut reg = IdRegistry::new();
        assert_eq!(reg.unique("submit"), "submit");
        assert_eq!(reg.unique("submit"), "submit1");
        assert_eq!(reg.unique("submit"), "submit2");
    }

    #[test]
    fn unique_skips_taken_suffixes() {
        let mut reg = IdRegistry::new();
        assert_eq!(reg.unique("item1"), "item1");
        assert_eq!(reg.unique("item"), "item");
        // "item1" is taken by the literal candidate above
        assert_eq!(reg.unique("item"), "item2");
    }

    #[test]
    fn assign_prefixes_with_parent() {
        let mut reg = IdRegistry::new();
        assert_eq!(reg.assign("", "menu"), "menu");
        assert_eq!(reg.assign("menu", "settings"), "menu.settings");
        assert_eq!(reg.assign("menu", "settings"), "menu.settings1");
    }
}
