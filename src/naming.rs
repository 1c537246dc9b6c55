//! Display text for column names and record values.
//!
//! ## Column headers
//!
//! Record sets carry identifier-style column names (`AreaPath`,
//! `IterationPath`, `WorkItemID`). Header rows show them as words:
//! - `"AreaPath"` → "Area Path"
//! - `"WorkItemID"` → "Work Item ID"
//! - `"HTMLParser"` → "HTML Parser"
//! - `"ID"` → "ID"
//!
//! ## Record values
//!
//! Work-item descriptions arrive as rich text. [`plain_text`] strips tags and
//! the two entities the tracker emits, then collapses whitespace runs.

use regex::Regex;
use std::sync::LazyLock;

/// Split a PascalCase identifier into space-separated words.
///
/// A space goes before an upper-case letter when the previous character is
/// lower-case, or when the previous character is a letter and the next one is
/// lower-case (the last capital of an acronym starts the next word).
pub fn space_capitalized_names(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary =
                prev.is_lowercase() || (prev.is_alphabetic() && prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with(' ') {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

/// Strip markup from a value: tags, `&nbsp;`, `&quot;`, and repeated whitespace.
///
/// A `<` with no closing `>` is kept as text (`"a < b"` survives).
pub fn plain_text(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, "");
    let stripped = stripped.replace("&nbsp;", " ").replace("&quot;", "");
    WHITESPACE_RUN_RE
        .replace_all(stripped.trim(), " ")
        .trim()
        .to_string()
}

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Two or more whitespace characters. A lone newline is left as-is.
static WHITESPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_simple_pascal_case() {
        assert_eq!(space_capitalized_names("AreaPath"), "Area Path");
        assert_eq!(space_capitalized_names("IterationPath"), "Iteration Path");
    }

    #[test]
    fn keeps_acronyms_together() {
        assert_eq!(space_capitalized_names("ID"), "ID");
        assert_eq!(space_capitalized_names("WorkItemID"), "Work Item ID");
        assert_eq!(space_capitalized_names("HTMLParser"), "HTML Parser");
    }

    #[test]
    fn single_words_untouched() {
        assert_eq!(space_capitalized_names("Title"), "Title");
        assert_eq!(space_capitalized_names("steps"), "steps");
        assert_eq!(space_capitalized_names(""), "");
    }

    #[test]
    fn already_spaced_names_not_doubled() {
        assert_eq!(space_capitalized_names("Area Path"), "Area Path");
    }

    #[test]
    fn digits_do_not_split() {
        assert_eq!(space_capitalized_names("Build2Id"), "Build2Id");
    }

    #[test]
    fn plain_text_strips_tags() {
        assert_eq!(
            plain_text("<div><b>Fix</b> the&nbsp;login page</div>"),
            "Fix the login page"
        );
    }

    #[test]
    fn plain_text_collapses_whitespace_runs() {
        assert_eq!(plain_text("  a   b \t\t c  "), "a b c");
    }

    #[test]
    fn plain_text_keeps_single_newline() {
        assert_eq!(plain_text("line one\nline two"), "line one\nline two");
    }

    #[test]
    fn plain_text_keeps_unclosed_angle_bracket() {
        assert_eq!(plain_text("a < b"), "a < b");
        assert_eq!(plain_text("x <> y"), "x <> y");
    }

    #[test]
    fn plain_text_drops_quot_entity() {
        assert_eq!(plain_text("say &quot;hi&quot;"), "say hi");
    }

    #[test]
    fn plain_text_strips_tags_spanning_lines() {
        assert_eq!(
            plain_text("<a\n  href=\"https://t/7\">Login&nbsp;failed  for</a>\n\n<b>SSO</b>"),
            "Login failed for SSO"
        );
    }
}
