//! Immutable lexicon configuration and the lexicon sentiment scorer.
//!
//! The word lists are a minimal Bangladesh-focused seed set covering
//! English, বাংলা, and Banglish; they are expected to be expanded over
//! time from labeled data. All scorer functions take the lexicons as an
//! explicit argument so alternative sets can be swapped in.

use crate::text::normalize_text;
use std::collections::HashSet;

/// Word and phrase sets used by the sentiment scorer and intent taggers.
/// Built once, read-only thereafter.
#[derive(Debug, Clone)]
pub struct Lexicons {
    pub positive: HashSet<String>,
    pub negative: HashSet<String>,
    pub question: Vec<String>,
    pub complaint: Vec<String>,
    pub feature_request: Vec<String>,
    pub resolution: Vec<String>,
    pub thanks: Vec<String>,
    /// Severity keyword buckets, highest priority first (5 down to 1).
    pub severity: [Vec<String>; 5],
}

fn word_set(words: &[&str]) -> HashSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn phrase_list(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|p| normalize_text(p)).filter(|p| !p.is_empty()).collect()
}

impl Lexicons {
    /// The default Bangladesh lexicon set.
    pub fn bangladesh_default() -> Self {
        Lexicons {
            positive: word_set(&[
                "good", "great", "excellent", "awesome", "love", "nice", "best", "amazing",
                "thanks", "thank", "thankyou", "dhonnobad", "ধন্যবাদ", "ভালো", "valo", "bhalo",
                "সুন্দর", "চমৎকার", "দারুণ", "helpful", "fast", "quick", "smooth", "easy", "cool",
            ]),
            negative: word_set(&[
                "bad", "worse", "worst", "poor", "hate", "scam", "fraud", "fake", "slow", "down",
                "bug", "problem", "issue", "kharap", "খারাপ", "বিরক্ত", "সমস্যা", "can't",
                "cannot", "unable", "delay", "late", "charging", "charge", "fee", "fees",
                "unprofessional", "helpless", "disappointed", "blocked", "block", "error",
                "fails", "failed",
            ]),
            question: phrase_list(&[
                "how", "why", "what", "when", "where", "which", "can i", "could i", "kivabe",
                "kibhabe", "কিভাবে", "কি ভাবে", "কেন", "কি", "কবে", "কোথায়", "কোন", "help",
                "please help", "plz", "pls",
            ]),
            complaint: phrase_list(&[
                "problem", "issue", "scam", "fraud", "fake", "not working", "doesn't work",
                "can't", "cannot", "unable", "slow", "down", "error", "blocked", "charging",
                "fee", "fees", "সমস্যা", "হচ্ছে না", "কাজ করছে না", "ডাউন", "স্লো", "ব্লক", "ফি",
            ]),
            feature_request: phrase_list(&[
                "please add", "add feature", "feature", "request", "wish", "need", "should have",
                "update", "improve", "চাই", "দরকার", "যোগ", "অপশন", "ফিচার", "আপডেট", "উন্নতি",
            ]),
            resolution: phrase_list(&[
                "fixed", "solved", "resolved", "works now", "working now", "thanks, fixed",
                "ok now", "now ok", "সমাধান", "ঠিক", "হয়ে গেছে", "হইছে", "কাজ করছে",
            ]),
            thanks: phrase_list(&["thanks", "thank", "dhonnobad", "ধন্যবাদ", "ভালো", "valo", "bhalo"]),
            severity: [
                phrase_list(&[
                    "data loss", "lost money", "money lost", "stolen", "fraud", "scam",
                    "chargeback", "account hacked", "টাকা কাটা", "টাকা নাই", "হ্যাক", "প্রতারনা",
                ]),
                phrase_list(&[
                    "cannot login", "can't login", "unable to login", "app crash", "crash",
                    "service down", "লগইন", "ঢুকতে পারছি না", "ডাউন", "ক্র্যাশ",
                ]),
                phrase_list(&[
                    "not working", "doesn't work", "error", "failed", "otp", "verification",
                    "slow", "হচ্ছে না", "কাজ করছে না", "এরর", "ফেইল", "ওটিপি", "স্লো",
                ]),
                phrase_list(&[
                    "delay", "late", "pending", "wait", "support", "no response", "unresponsive",
                    "দেরি", "লেট", "পেন্ডিং", "রেসপন্স",
                ]),
                phrase_list(&[
                    "annoying", "irritating", "confusing", "hard", "difficult", "বিরক্ত",
                    "ঝামেলা", "কনফিউজিং",
                ]),
            ],
        }
    }
}

impl Default for Lexicons {
    fn default() -> Self {
        Self::bangladesh_default()
    }
}

/// Lexicon sentiment in [-1, +1]: `(pos − neg) / (pos + neg)` over
/// whitespace tokens, 0.0 when no lexicon words are present.
pub fn lexicon_sentiment(text: &str, lex: &Lexicons) -> f64 {
    let t = normalize_text(text);
    if t.is_empty() {
        return 0.0;
    }
    let mut pos = 0usize;
    let mut neg = 0usize;
    for tok in t.split_whitespace() {
        if lex.positive.contains(tok) {
            pos += 1;
        }
        if lex.negative.contains(tok) {
            neg += 1;
        }
    }
    if pos == 0 && neg == 0 {
        return 0.0;
    }
    let score = (pos as f64 - neg as f64) / (pos + neg).max(1) as f64;
    score.clamp(-1.0, 1.0)
}

/// Whether any of the (normalized) phrases occurs in the text. Both
/// Bengali and Latin phrases match by substring here, matching the loose
/// intent-tagging behavior rather than the stricter taxonomy matcher.
pub fn has_any(text: &str, phrases: &[String]) -> bool {
    let t = normalize_text(text);
    if t.is_empty() {
        return false;
    }
    phrases.iter().any(|p| !p.is_empty() && t.contains(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_positive() {
        let lex = Lexicons::default();
        assert!(lexicon_sentiment("great app, very helpful", &lex) > 0.0);
    }

    #[test]
    fn test_sentiment_negative() {
        let lex = Lexicons::default();
        assert!(lexicon_sentiment("worst service, very slow", &lex) < 0.0);
    }

    #[test]
    fn test_sentiment_bengali() {
        let lex = Lexicons::default();
        assert!(lexicon_sentiment("সেবা খারাপ", &lex) < 0.0);
        assert!(lexicon_sentiment("ভালো সার্ভিস", &lex) > 0.0);
    }

    #[test]
    fn test_sentiment_neutral_when_no_hits() {
        let lex = Lexicons::default();
        assert_eq!(lexicon_sentiment("the branch opens at nine", &lex), 0.0);
        assert_eq!(lexicon_sentiment("", &lex), 0.0);
    }

    #[test]
    fn test_sentiment_bounds() {
        let lex = Lexicons::default();
        let s = lexicon_sentiment("good good good bad", &lex);
        assert!((-1.0..=1.0).contains(&s));
    }

    #[test]
    fn test_has_any_matches_substring() {
        let lex = Lexicons::default();
        assert!(has_any("app is not working today", &lex.complaint));
        assert!(!has_any("all fine here", &lex.complaint));
    }
}
