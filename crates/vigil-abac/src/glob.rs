//! Wildcard matching for target identifiers.
//!
//! Target patterns use a single reserved marker, `*`, which matches any
//! (possibly empty) substring. Every other character matches itself. There is
//! no escape syntax and no single-character wildcard.
//!
//! Storage backends that filter candidates natively must keep these exact
//! semantics. [`to_sql_like`] provides the translation for engines that speak
//! SQL `LIKE`.

/// The wildcard marker.
pub const WILDCARD: char = '*';

/// Escape character used by [`to_sql_like`]. Backends must pass it as
/// `ESCAPE '\'` alongside the translated pattern.
pub const SQL_LIKE_ESCAPE: char = '\\';

/// Returns `true` if the pattern contains the wildcard marker.
pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains(WILDCARD)
}

/// Matches `value` against a target `pattern`.
///
/// A pattern without `*` requires exact equality. Runs in
/// `O(pattern.len() * value.len())` worst case by backtracking only to the
/// most recent `*`, so adversarial patterns cannot blow up evaluation.
pub fn matches(pattern: &str, value: &str) -> bool {
    if !is_wildcard(pattern) {
        return pattern == value;
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();

    let (mut p, mut v) = (0usize, 0usize);
    // Position of the last `*` seen and the value index it was tried against.
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && pattern[p] == WILDCARD {
            backtrack = Some((p, v));
            p += 1;
        } else if p < pattern.len() && pattern[p] == value[v] {
            p += 1;
            v += 1;
        } else if let Some((star, tried)) = backtrack {
            // Let the last `*` swallow one more character.
            p = star + 1;
            v = tried + 1;
            backtrack = Some((star, tried + 1));
        } else {
            return false;
        }
    }

    // Value exhausted: only trailing stars may remain.
    pattern[p..].iter().all(|&c| c == WILDCARD)
}

/// Translates a target pattern into an SQL `LIKE` pattern.
///
/// `*` becomes `%`; the `LIKE` metacharacters `%` and `_` and the escape
/// character itself are escaped with [`SQL_LIKE_ESCAPE`], so the translated
/// pattern matches exactly the same identifiers as [`matches`].
pub fn to_sql_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    for c in pattern.chars() {
        match c {
            WILDCARD => out.push('%'),
            '%' | '_' | SQL_LIKE_ESCAPE => {
                out.push(SQL_LIKE_ESCAPE);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    /// Reference evaluator for SQL `LIKE` with `\` escapes, used to check
    /// that [`to_sql_like`] preserves match semantics.
    fn like_matches(pattern: &str, value: &str) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Tok {
            Any,
            One,
            Lit(char),
        }

        let mut toks = Vec::new();
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => toks.push(Tok::Lit(chars.next().unwrap_or('\\'))),
                '%' => toks.push(Tok::Any),
                '_' => toks.push(Tok::One),
                c => toks.push(Tok::Lit(c)),
            }
        }

        fn go(toks: &[Tok], value: &[char]) -> bool {
            match toks.first() {
                None => value.is_empty(),
                Some(Tok::Any) => (0..=value.len()).any(|i| go(&toks[1..], &value[i..])),
                Some(Tok::One) => !value.is_empty() && go(&toks[1..], &value[1..]),
                Some(Tok::Lit(c)) => value.first() == Some(c) && go(&toks[1..], &value[1..]),
            }
        }

        let value: Vec<char> = value.chars().collect();
        go(&toks, &value)
    }

    #[test_case("read", "read", true ; "literal equal")]
    #[test_case("read", "write", false ; "literal different")]
    #[test_case("read", "reader", false ; "literal is not a prefix match")]
    #[test_case("*", "", true ; "star matches empty")]
    #[test_case("*", "anything", true ; "star matches all")]
    #[test_case("/api/*", "/api/users", true ; "prefix")]
    #[test_case("/api/*", "/api/", true ; "prefix with empty tail")]
    #[test_case("/api/*", "/other/users", false ; "prefix mismatch")]
    #[test_case("*.pdf", "report.pdf", true ; "suffix")]
    #[test_case("*.pdf", "report.pdf.txt", false ; "suffix mismatch")]
    #[test_case("a*b*c", "axxbyyc", true ; "two stars")]
    #[test_case("a*b*c", "axxbyy", false ; "two stars missing tail")]
    #[test_case("a**b", "ab", true ; "adjacent stars")]
    #[test_case("user:?", "user:1", false ; "question mark is literal")]
    #[test_case("user:?", "user:?", true ; "question mark literal match")]
    #[test_case("ü*ß", "übergroß", true ; "multibyte")]
    fn test_matches(pattern: &str, value: &str, expected: bool) {
        assert_eq!(matches(pattern, value), expected);
    }

    #[test]
    fn test_pathological_pattern_is_fast() {
        let pattern = "a*a*a*a*a*a*a*a*a*a*a*a*a*b";
        let value = "a".repeat(5_000);
        assert!(!matches(pattern, &value));
    }

    #[test]
    fn test_to_sql_like_escapes_metacharacters() {
        assert_eq!(to_sql_like("/docs/*"), "/docs/%");
        assert_eq!(to_sql_like("100%_done"), "100\\%\\_done");
        assert_eq!(to_sql_like("a\\b*"), "a\\\\b%");
    }

    proptest! {
        #[test]
        fn prop_trailing_wildcard_is_superset(literal in "[a-z/:._%-]{0,12}") {
            prop_assert!(matches(&literal, &literal));
            let widened = format!("{literal}*");
            prop_assert!(matches(&widened, &literal));
        }

        #[test]
        fn prop_star_matches_everything(value in "\\PC{0,24}") {
            prop_assert!(matches("*", &value));
        }

        #[test]
        fn prop_sql_like_translation_preserves_semantics(
            pattern in "[ab*%_\\\\]{0,8}",
            value in "[ab%_\\\\]{0,8}",
        ) {
            prop_assert_eq!(
                matches(&pattern, &value),
                like_matches(&to_sql_like(&pattern), &value)
            );
        }

        #[test]
        fn prop_matching_is_deterministic(pattern in "[ab*]{0,8}", value in "[ab]{0,10}") {
            prop_assert_eq!(matches(&pattern, &value), matches(&pattern, &value));
        }
    }
}
