//! Removal of page-builder shortcodes from rich text.
//!
//! Builder tags (`[fusion_text]`, `[/fusion_builder_column]`, `[fusion_separator /]`)
//! are removed as wrappers: the prose they enclose is kept. Any remaining
//! bracketed directive is dropped by a catch-all, runs of three or more
//! newlines collapse to two, and the result is trimmed.
//!
//! `sanitize` is idempotent. The catch-all matches from the leftmost `[` that
//! is followed by a closing `]`, so removing a match never leaves an opening
//! bracket that a second pass could pair with later text.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ANY_DIRECTIVE: Regex = Regex::new(r"\[[^\]]+\]").unwrap();
    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref DEFAULT_FAMILIES: Vec<Regex> = DEFAULT_SHORTCODE_PREFIXES
        .iter()
        .map(|prefix| Regex::new(&family_pattern(prefix)).unwrap())
        .collect();
}

/// The builder family stripped when no prefixes are configured.
pub const DEFAULT_SHORTCODE_PREFIXES: &[&str] = &["fusion_"];

#[derive(Debug, Clone)]
pub struct Sanitizer {
    families: Vec<Regex>,
}

impl Sanitizer {
    /// Builds a sanitizer for the given tag prefixes, e.g. `["fusion_", "vc_"]`.
    pub fn new<S: AsRef<str>>(prefixes: &[S]) -> Result<Self, regex::Error> {
        let families = prefixes
            .iter()
            .map(|prefix| prefix.as_ref().trim())
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| Regex::new(&family_pattern(prefix)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { families })
    }

    pub fn sanitize(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        let mut cleaned = raw.to_string();
        for family in &self.families {
            cleaned = family.replace_all(&cleaned, "").into_owned();
        }
        let cleaned = ANY_DIRECTIVE.replace_all(&cleaned, "");
        let cleaned = EXCESS_NEWLINES.replace_all(&cleaned, "\n\n");
        cleaned.trim().to_string()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            families: DEFAULT_FAMILIES.clone(),
        }
    }
}

/// Opening, closing and self-closing tags whose name starts with `prefix`.
fn family_pattern(prefix: &str) -> String {
    format!(r"\[/?{}[^\]]*\]", regex::escape(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_wrappers_keep_inner_text() {
        let sanitizer = Sanitizer::default();
        let raw = r#"[fusion_builder_container hundred_percent="no"][fusion_text]Hello world[/fusion_text][/fusion_builder_container]"#;
        assert_eq!(sanitizer.sanitize(raw), "Hello world");
    }

    #[test]
    fn test_self_closing_and_foreign_directives() {
        let sanitizer = Sanitizer::default();
        assert_eq!(
            sanitizer.sanitize("Before [fusion_separator style_type=\"none\" /] after [gallery ids=\"1,2\"]"),
            "Before  after"
        );
    }

    #[test]
    fn test_collapses_newlines_and_trims() {
        let sanitizer = Sanitizer::default();
        assert_eq!(sanitizer.sanitize("\n\n a\n\n\n\n\nb \n"), "a\n\nb");
    }

    #[test]
    fn test_custom_prefixes() {
        let sanitizer = Sanitizer::new(&["vc_"]).unwrap();
        assert_eq!(sanitizer.sanitize("[vc_row]Text[/vc_row]"), "Text");
    }

    #[test]
    fn test_idempotent_on_malformed_input() {
        let sanitizer = Sanitizer::default();
        let inputs = [
            "",
            "plain text",
            "[[fusion_text]x]y]",
            "[][x]",
            "a[b[c]d]e",
            "[unclosed [fusion_text",
            "]] [[ ]] [",
            "[fusion_a][fusion_b]]\n\n\n\n[/fusion_b]",
            "line\n\n\n[tag]\n\n\nline",
            "  [x]  \n\n\n\n",
        ];
        for input in inputs {
            let once = sanitizer.sanitize(input);
            assert_eq!(sanitizer.sanitize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_empty_prefix_list_still_strips_directives() {
        let sanitizer = Sanitizer::new::<&str>(&[]).unwrap();
        assert_eq!(sanitizer.sanitize("[fusion_text]Hi[/fusion_text]"), "Hi");
    }
}
