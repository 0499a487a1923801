//! Nameable placeholders.
//!
//! Text fields may carry tokens bounded by a marker character (`@` by
//! default), e.g. `"Weapon Master (@Weapon@)"`. Extraction collects the
//! enclosed names so an editor can ask the user for replacements;
//! substitution swaps each token for its replacement.

use std::collections::{BTreeSet, HashMap};

/// The marker used when no settings say otherwise.
pub const DEFAULT_MARKER: char = '@';

/// Yields `(start, end, name)` for each marker-bounded token, where
/// `start..end` spans the markers too. Empty tokens (`@@`) are skipped.
fn tokens(text: &str, marker: char) -> Vec<(usize, usize, &str)> {
    let mut found = Vec::new();
    let width = marker.len_utf8();
    let mut offset = 0;
    while let Some(open) = text[offset..].find(marker).map(|i| i + offset) {
        let body = open + width;
        let Some(close) = text[body..].find(marker).map(|i| i + body) else {
            break;
        };
        if close > body {
            found.push((open, close + width, &text[body..close]));
        }
        offset = close + width;
    }
    found
}

/// Add every placeholder name found in `text` to `set`.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeSet;
/// use gurps_bonus::nameable;
///
/// let mut set = BTreeSet::new();
/// nameable::extract_into(&mut set, "@Weapon@ and @Weapon@ or @Style@", '@');
/// assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["Style", "Weapon"]);
/// ```
pub fn extract_into(set: &mut BTreeSet<String>, text: &str, marker: char) {
    for (_, _, name) in tokens(text, marker) {
        set.insert(name.to_string());
    }
}

/// The set of placeholder names found in `text`.
pub fn extract(text: &str, marker: char) -> BTreeSet<String> {
    let mut set = BTreeSet::new();
    extract_into(&mut set, text, marker);
    set
}

/// Replace every placeholder that has an entry in `map`.
///
/// Placeholders without an entry stay exactly as authored.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use gurps_bonus::nameable;
///
/// let mut map = HashMap::new();
/// map.insert("Weapon".to_string(), "Broadsword".to_string());
/// assert_eq!(
///     nameable::substitute("@Weapon@ (@Style@)", &map, '@'),
///     "Broadsword (@Style@)"
/// );
/// ```
pub fn substitute(text: &str, map: &HashMap<String, String>, marker: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end, name) in tokens(text, marker) {
        if let Some(replacement) = map.get(name) {
            out.push_str(&text[last..start]);
            out.push_str(replacement);
            last = end;
        }
    }
    out.push_str(&text[last..]);
    out
}

/// Substitute in place. Returns `true` if the text changed.
pub fn apply(text: &mut String, map: &HashMap<String, String>, marker: char) -> bool {
    let replaced = substitute(text, map, marker);
    if replaced == *text {
        return false;
    }
    *text = replaced;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_collapses_duplicates() {
        let set = extract("@a@ @b@ @a@", '@');
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert!(set.contains("b"));
    }

    #[test]
    fn test_extract_ignores_unpaired_and_empty() {
        assert!(extract("user@example", '@').is_empty());
        assert!(extract("@@", '@').is_empty());
        let set = extract("x @@ @name@ @tail", '@');
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_substitute_leaves_unmapped() {
        let mut map = HashMap::new();
        map.insert("A".to_string(), "1".to_string());
        assert_eq!(substitute("@A@-@B@-@A@", &map, '@'), "1-@B@-1");
        assert_eq!(substitute("plain", &map, '@'), "plain");
    }

    #[test]
    fn test_custom_marker() {
        let mut map = HashMap::new();
        map.insert("who".to_string(), "Ann".to_string());
        assert_eq!(substitute("hi %who%", &map, '%'), "hi Ann");
        assert_eq!(extract("hi %who%", '%').len(), 1);
    }

    #[test]
    fn test_apply_reports_change() {
        let mut map = HashMap::new();
        map.insert("A".to_string(), "1".to_string());
        let mut text = "@A@".to_string();
        assert!(apply(&mut text, &map, '@'));
        assert_eq!(text, "1");
        assert!(!apply(&mut text, &map, '@'));
    }
}
