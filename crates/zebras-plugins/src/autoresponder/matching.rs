//! Phrase matching for auto-responder rules.

use regex::RegexBuilder;
use zebras_framework::store::{AutoResponderRule, MatchType};

/// Whether `rule` matches `text`.
///
/// Case-insensitive `contains` and `exact` compare lower-cased strings;
/// `regex` searches the original text with the case-insensitive flag. A
/// pattern that does not compile never matches.
pub fn matches(rule: &AutoResponderRule, text: &str) -> bool {
    match rule.match_type {
        MatchType::Regex => RegexBuilder::new(&rule.phrase)
            .case_insensitive(!rule.case_sensitive)
            .build()
            .is_ok_and(|re| re.is_match(text)),
        MatchType::Contains | MatchType::Exact => {
            let (text, phrase) = if rule.case_sensitive {
                (text.to_string(), rule.phrase.clone())
            } else {
                (text.to_lowercase(), rule.phrase.to_lowercase())
            };
            match rule.match_type {
                MatchType::Exact => text == phrase,
                _ => text.contains(&phrase),
            }
        }
    }
}

/// The first rule in `rules` that matches `text`.
pub fn first_match<'a>(rules: &'a [AutoResponderRule], text: &str) -> Option<&'a AutoResponderRule> {
    rules.iter().find(|rule| matches(rule, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: u64, phrase: &str, match_type: MatchType, case_sensitive: bool) -> AutoResponderRule {
        AutoResponderRule {
            id,
            phrase: phrase.to_string(),
            response_text: format!("reply {id}"),
            match_type,
            case_sensitive,
            channel_id: None,
            enabled: true,
        }
    }

    #[test]
    fn test_contains_ignores_case() {
        assert!(matches(&rule(1, "Hello", MatchType::Contains, false), "oh hello there"));
        assert!(!matches(&rule(1, "Hello", MatchType::Contains, true), "oh hello there"));
    }

    #[test]
    fn test_exact_requires_whole_text() {
        let exact = rule(1, "ping", MatchType::Exact, false);
        assert!(matches(&exact, "PING"));
        assert!(!matches(&exact, "ping pong"));
    }

    #[test]
    fn test_regex_case_flag() {
        assert!(matches(&rule(1, r"^deploy\s+\w+$", MatchType::Regex, false), "Deploy prod"));
        assert!(!matches(&rule(1, r"^deploy", MatchType::Regex, true), "Deploy prod"));
    }

    #[test]
    fn test_exact_case_sensitive() {
        let exact = rule(1, "Hello", MatchType::Exact, true);
        assert!(!matches(&exact, "hello"));
        assert!(matches(&exact, "Hello"));
    }

    #[test]
    fn test_contains_mixed_case_text() {
        assert!(matches(&rule(1, "hello", MatchType::Contains, false), "Well, HELLO there"));
    }

    #[test]
    fn test_regex_digits() {
        assert!(matches(&rule(1, "[0-9]+", MatchType::Regex, false), "order #42"));
        assert!(!matches(&rule(1, "[0-9]+", MatchType::Regex, false), "no numbers"));
    }

    #[test]
    fn test_invalid_regex_never_matches() {
        assert!(!matches(&rule(1, "([", MatchType::Regex, false), "(["));
        assert!(!matches(&rule(1, "[unclosed", MatchType::Regex, false), "[unclosed"));
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            rule(1, "nope", MatchType::Exact, false),
            rule(2, "hi", MatchType::Contains, false),
            rule(3, "hi there", MatchType::Contains, false),
        ];
        assert_eq!(first_match(&rules, "hi there").map(|r| r.id), Some(2));
        assert!(first_match(&rules, "bye").is_none());
    }
}
