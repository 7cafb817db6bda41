//! Boolean intent flags and complaint severity estimation.

use crate::sentiment::lexicon::{Lexicons, has_any, lexicon_sentiment};
use crate::text::normalize_text;

/// A comment is a question if it carries a literal `?` or any question phrase.
pub fn is_question(text: &str, lex: &Lexicons) -> bool {
    text.contains('?') || has_any(text, &lex.question)
}

pub fn is_complaint(text: &str, lex: &Lexicons) -> bool {
    has_any(text, &lex.complaint)
}

pub fn is_feature_request(text: &str, lex: &Lexicons) -> bool {
    has_any(text, &lex.feature_request)
}

pub fn is_resolution(text: &str, lex: &Lexicons) -> bool {
    has_any(text, &lex.resolution)
}

/// Praise = clearly positive sentiment, or an explicit thanks phrase.
pub fn is_praise(text: &str, lex: &Lexicons) -> bool {
    lexicon_sentiment(text, lex) > 0.3 || has_any(text, &lex.thanks)
}

/// Estimates product-issue severity 1–5 from keyword buckets, highest
/// bucket first. Only meaningful for complaints; texts matching no bucket
/// default to 2.
pub fn estimate_severity(text: &str, lex: &Lexicons) -> u8 {
    let t = normalize_text(text);
    if t.is_empty() {
        return 1;
    }
    for (i, bucket) in lex.severity.iter().enumerate() {
        if has_any(&t, bucket) {
            return 5 - i as u8;
        }
    }
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_mark_wins() {
        let lex = Lexicons::default();
        assert!(is_question("balance koto?", &lex));
        assert!(is_question("কিভাবে একাউন্ট খুলবো", &lex));
        assert!(!is_question("nice offer", &lex));
    }

    #[test]
    fn test_complaint_detection() {
        let lex = Lexicons::default();
        assert!(is_complaint("App is not working, very slow", &lex));
        assert!(is_complaint("অ্যাপ কাজ করছে না", &lex));
        assert!(!is_complaint("dhonnobad", &lex));
    }

    #[test]
    fn test_feature_request_detection() {
        let lex = Lexicons::default();
        assert!(is_feature_request("please add dark mode", &lex));
    }

    #[test]
    fn test_resolution_detection() {
        let lex = Lexicons::default();
        assert!(is_resolution("issue solved, works now", &lex));
        assert!(is_resolution("সমস্যার সমাধান হয়ে গেছে", &lex));
    }

    #[test]
    fn test_praise_via_sentiment_or_thanks() {
        let lex = Lexicons::default();
        assert!(is_praise("excellent service, love it", &lex));
        assert!(is_praise("dhonnobad", &lex));
        assert!(!is_praise("very slow service", &lex));
    }

    #[test]
    fn test_severity_buckets() {
        let lex = Lexicons::default();
        // "not working" / "slow" sit in the level-3 bucket
        assert_eq!(estimate_severity("App is not working, very slow", &lex), 3);
        assert_eq!(estimate_severity("টাকা কাটা হয়েছে", &lex), 5);
        assert_eq!(estimate_severity("app crash on login page", &lex), 4);
        assert_eq!(estimate_severity("no response from support", &lex), 2);
        assert_eq!(estimate_severity("so confusing layout", &lex), 1);
    }

    #[test]
    fn test_severity_priority_highest_bucket_wins() {
        let lex = Lexicons::default();
        // "fraud" (5) and "not working" (3) together resolve to 5
        assert_eq!(estimate_severity("fraud! app not working", &lex), 5);
    }

    #[test]
    fn test_severity_default_for_unbucketed_complaint() {
        let lex = Lexicons::default();
        assert_eq!(estimate_severity("extra fee for everything", &lex), 2);
    }
}
