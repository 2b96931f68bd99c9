use std::borrow::Cow;

use regex::{Captures, Regex, RegexBuilder};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    #[error("The target term must not be empty")]
    EmptyTarget,
    #[error("The term `{0}` must not contain any of the characters < > & \"")]
    Markup(String),
    #[error("The replacement term `{replacement}` can form the target term `{target}` again")]
    Recursive { target: String, replacement: String },
}

/// The casing of a single matched occurrence of the target term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasePattern {
    /// `YALE`
    Uppercase,
    /// `Yale`
    TitleCase,
    /// `yale`
    Lowercase,
    /// `yAlE`, `YAle`, ...
    Other,
}

impl CasePattern {
    pub fn classify(word: &str) -> Self {
        let has_upper = word.chars().any(char::is_uppercase);
        let has_lower = word.chars().any(char::is_lowercase);

        if has_upper && !has_lower {
            return CasePattern::Uppercase;
        }
        if !has_upper {
            return CasePattern::Lowercase;
        }

        let mut chars = word.chars();
        match chars.next() {
            Some(first) if first.is_uppercase() && !chars.any(char::is_uppercase) => {
                CasePattern::TitleCase
            }
            _ => CasePattern::Other,
        }
    }
}

/// Case-preserving substring replacement of one fixed term by another.
#[derive(Debug, Clone)]
pub struct TermSubstitution {
    pattern: Regex,
    references: Regex,
    replacement: String,
    upper: String,
    title: String,
    lower: String,
}

impl TermSubstitution {
    pub fn new(target: &str, replacement: &str) -> Result<Self, TermError> {
        if target.is_empty() {
            return Err(TermError::EmptyTarget);
        }

        for term in [target, replacement] {
            if term.contains(['<', '>', '&', '"']) {
                return Err(TermError::Markup(term.to_string()));
            }
        }

        let pattern = RegexBuilder::new(&regex::escape(target))
            .case_insensitive(true)
            .build()
            .map_err(|_| TermError::Markup(target.to_string()))?;

        // A second pass must find nothing, so no occurrence may overlap a rendered replacement.
        if can_rematch(target, replacement) {
            return Err(TermError::Recursive {
                target: target.to_string(),
                replacement: replacement.to_string(),
            });
        }

        let references = Regex::new(r"&(?:#[0-9]+;?|#[xX][0-9a-fA-F]+;?|[A-Za-z][A-Za-z0-9]*;?)")
            .map_err(|_| TermError::Markup(target.to_string()))?;

        Ok(Self {
            pattern,
            references,
            replacement: replacement.to_string(),
            upper: replacement.to_uppercase(),
            title: title_case(replacement),
            lower: replacement.to_lowercase(),
        })
    }

    /// The replacement term rendered in the casing of `pattern`.
    pub fn render(&self, pattern: CasePattern) -> &str {
        match pattern {
            CasePattern::Uppercase => &self.upper,
            CasePattern::TitleCase => &self.title,
            CasePattern::Lowercase => &self.lower,
            CasePattern::Other => &self.replacement,
        }
    }

    /// Replaces every occurrence of the target term in `text`, borrowing when nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, |caps: &Captures| {
            self.render(CasePattern::classify(&caps[0])).to_string()
        })
    }

    pub fn substitute(&self, text: &str) -> String {
        self.apply(text).into_owned()
    }

    /// Like [`apply`](Self::apply) for raw HTML source text: character references are copied
    /// through untouched and only the literal runs between them are substituted.
    pub fn apply_source<'t>(&self, source: &'t str) -> Cow<'t, str> {
        if !self.pattern.is_match(source) {
            return Cow::Borrowed(source);
        }

        let mut output = String::with_capacity(source.len());
        let mut last = 0;
        for reference in self.references.find_iter(source) {
            output.push_str(&self.apply(&source[last..reference.start()]));
            output.push_str(reference.as_str());
            last = reference.end();
        }
        output.push_str(&self.apply(&source[last..]));

        Cow::Owned(output)
    }
}

/// Whether an occurrence of `target` can overlap a rendered `replacement` in substituted text:
/// inside it, around it, or straddling either of its edges. Compared case-insensitively, since
/// every rendering of the replacement differs only in case.
fn can_rematch(target: &str, replacement: &str) -> bool {
    let target: Vec<char> = target.chars().flat_map(char::to_lowercase).collect();
    let replacement: Vec<char> = replacement.chars().flat_map(char::to_lowercase).collect();

    if replacement.is_empty() {
        // Deleting an occurrence can join its neighbours into a new one.
        return true;
    }

    let contains = |haystack: &[char], needle: &[char]| {
        haystack.windows(needle.len()).any(|window| window == needle)
    };
    if contains(&replacement, &target) || contains(&target, &replacement) {
        return true;
    }

    (1..target.len()).any(|k| {
        let (head, tail) = target.split_at(k);
        replacement.ends_with(head) || replacement.starts_with(tail)
    })
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fale() -> TermSubstitution {
        TermSubstitution::new("Yale", "Fale").unwrap()
    }

    #[test]
    fn classifies_case_patterns() {
        assert_eq!(CasePattern::classify("YALE"), CasePattern::Uppercase);
        assert_eq!(CasePattern::classify("Yale"), CasePattern::TitleCase);
        assert_eq!(CasePattern::classify("yale"), CasePattern::Lowercase);
        assert_eq!(CasePattern::classify("yAlE"), CasePattern::Other);
        assert_eq!(CasePattern::classify("YAle"), CasePattern::Other);
    }

    #[test]
    fn preserves_case_of_each_occurrence() {
        let sub = fale();
        assert_eq!(sub.substitute("YALE"), "FALE");
        assert_eq!(sub.substitute("Yale"), "Fale");
        assert_eq!(sub.substitute("yale"), "fale");
        assert_eq!(sub.substitute("yAlE"), "Fale");
        assert_eq!(
            sub.substitute("Yale, yale and YALE"),
            "Fale, fale and FALE"
        );
    }

    #[test]
    fn matches_inside_longer_words() {
        let sub = fale();
        assert_eq!(sub.substitute("Yalesville"), "Falesville");
        assert_eq!(sub.substitute("www.yale.edu"), "www.fale.edu");
        assert_eq!(sub.substitute("YaleYale"), "FaleFale");
    }

    #[test]
    fn leaves_unrelated_text_alone() {
        let sub = fale();
        assert_eq!(sub.substitute(""), "");
        assert_eq!(sub.substitute("Harvard University"), "Harvard University");
        assert!(matches!(sub.apply("Harvard"), Cow::Borrowed("Harvard")));
    }

    #[test]
    fn rejects_bad_terms() {
        assert_eq!(
            TermSubstitution::new("", "Fale").unwrap_err(),
            TermError::EmptyTarget
        );
        assert!(matches!(
            TermSubstitution::new("Yale", "<b>Fale</b>"),
            Err(TermError::Markup(_))
        ));
        assert!(matches!(
            TermSubstitution::new("Yale", "NewYale"),
            Err(TermError::Recursive { .. })
        ));
    }

    #[test]
    fn rejects_replacements_that_join_into_the_target() {
        for (target, replacement) in [("ab", "b"), ("ab", "a"), ("aba", "xa"), ("Yale", ""), ("abc", "B")]
        {
            assert!(
                matches!(
                    TermSubstitution::new(target, replacement),
                    Err(TermError::Recursive { .. })
                ),
                "{target} -> {replacement}"
            );
        }
        assert!(TermSubstitution::new("ab", "x").is_ok());
    }

    #[test]
    fn source_text_keeps_character_references() {
        let sub = TermSubstitution::new("amp", "volt").unwrap();
        assert_eq!(sub.apply_source("Tom &amp; Jerry camp"), "Tom &amp; Jerry cvolt");
        assert_eq!(sub.apply_source("&amp &#97;mp &#x61;mp"), "&amp &#97;mp &#x61;mp");

        let sub = fale();
        assert_eq!(sub.apply_source("Yale&nbsp;yale &#89;ale"), "Fale&nbsp;fale &#89;ale");
        assert!(matches!(sub.apply_source("&amp;"), Cow::Borrowed("&amp;")));
    }

    #[test]
    fn escapes_regex_metacharacters_in_target() {
        let sub = TermSubstitution::new("a.b", "x").unwrap();
        assert_eq!(sub.substitute("a.b acb"), "x acb");
    }

    proptest! {
        #[test]
        fn text_without_target_is_unchanged(text in "[a-zA-Z0-9 .,!?]{0,64}") {
            prop_assume!(!text.to_lowercase().contains("yale"));
            prop_assert_eq!(fale().substitute(&text), text);
        }

        #[test]
        fn substitution_is_idempotent(text in "([yY][aA][lL][eE]|[a-zA-Z .]){0,32}") {
            let sub = fale();
            let once = sub.substitute(&text);
            prop_assert_eq!(sub.substitute(&once), once.clone());
            prop_assert!(!once.to_lowercase().contains("yale"));
        }

        #[test]
        fn accepted_term_pairs_are_idempotent(
            target in "[abAB]{1,3}",
            replacement in "[abcABC]{0,3}",
            text in "[abcABC]{0,16}",
        ) {
            if let Ok(sub) = TermSubstitution::new(&target, &replacement) {
                let once = sub.substitute(&text);
                prop_assert_eq!(sub.substitute(&once), once.clone());
            }
        }
    }
}
