//! Match-phrase expansion for taxonomy labels.
//!
//! Bank taxonomies embed brand-specific product names ("Prime Personal
//! Loan"). To score content from other Bangladeshi banks against the same
//! taxonomy, every label is expanded with brand-stripped variants and
//! generic financial-product synonyms in English, বাংলা, and Banglish.

use crate::text::normalize_text;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(.*?\)\s*").unwrap());
static DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-–—]").unwrap());
static PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z\x{0980}-\x{09FF}\s]").unwrap());

/// Tokens removed when deriving a brand-stripped variant of a label.
/// Kept small on purpose; only used for stripping, never for matching.
const BRAND_STOPWORDS: &[&str] = &[
    // Bank words
    "bank", "banks", "limited", "ltd", "plc", "bd", "bangladesh",
    // Known bank brand tokens
    "prime", "brac", "dutch", "bangla", "dbbl", "eastern", "ebl", "city",
    // Prime sub-brand markers sometimes embedded in product names
    "hasanah", "neera", "neer", "swapna",
];

/// Removes bank/brand tokens from a phrase, producing a generic match key
/// ("Prime Personal Loan" -> "personal loan").
pub fn strip_brand_words(phrase: &str) -> String {
    let t = normalize_text(phrase);
    t.split_whitespace()
        .filter(|w| !BRAND_STOPWORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expands a taxonomy label into its normalized match phrases.
///
/// Includes the label itself, a parenthetical-free form, dash/punctuation
/// variants, a brand-stripped variant, and generic Bangladesh product
/// synonyms. Output is deduplicated and ordered by descending length then
/// lexicographically, so more specific phrases come first.
pub fn expand_phrases(raw: &str) -> Vec<String> {
    let base = raw.trim().to_string();
    let base_no_paren = PAREN_RE.replace_all(&base, " ").trim().to_string();

    let mut phrases: BTreeSet<String> = BTreeSet::new();
    phrases.insert(base.clone());
    phrases.insert(base_no_paren.clone());

    for p in phrases.clone() {
        phrases.insert(DASH_RE.replace_all(&p, " ").to_string());
        phrases.insert(PUNCT_RE.replace_all(&p, " ").to_string());
    }

    let lower = base_no_paren.to_lowercase();

    let stripped = strip_brand_words(&base_no_paren);
    if !stripped.is_empty() {
        phrases.insert(stripped);
    }

    for s in generic_synonyms(&lower) {
        phrases.insert(s.to_string());
    }

    if lower.contains("loan") {
        extend(&mut phrases, &["loan", "rin", "ঋণ", "লোন"]);
    }
    if lower.contains("deposit") || lower.contains("savings") || lower.contains("account") {
        extend(
            &mut phrases,
            &["account", "a/c", "savings", "deposit", "dps", "fdr", "সেভিংস", "একাউন্ট", "অ্যাকাউন্ট"],
        );
    }
    if lower.contains("card") {
        extend(&mut phrases, &["card", "debit card", "credit card", "কার্ড", "ক্রেডিট", "ডেবিট"]);
    }
    if lower.contains("app") || lower.contains("digital") {
        extend(&mut phrases, &["app", "apps", "mobile app", "অ্যাপ", "ডিজিটাল"]);
    }
    if lower.contains("remit") {
        extend(&mut phrases, &["remit", "remittance", "প্রবাসী", "রেমিট্যান্স"]);
    }
    if lower.contains("islamic") || lower.contains("hasanah") || lower.contains("mudaraba") {
        extend(&mut phrases, &["islamic", "shariah", "হালাল", "ইসলামিক", "মুদারাবা"]);
    }
    if lower.contains("women") || lower.contains("neera") {
        extend(&mut phrases, &["women", "female", "নারী", "উইমেন", "neera"]);
    }
    if lower.contains("sme") {
        extend(&mut phrases, &["sme", "উদ্যোক্তা", "ব্যবসা"]);
    }
    if lower.contains("corporate") {
        extend(&mut phrases, &["corporate", "company", "ব্যবসা", "কর্পোরেট"]);
    }
    if lower.contains("priority") {
        extend(&mut phrases, &["priority", "premium", "privilege"]);
    }

    let mut out: Vec<String> = phrases
        .iter()
        .map(|p| normalize_text(p))
        .filter(|n| n.chars().count() >= 3)
        .collect();
    out.sort();
    out.dedup();
    // Prefer specific phrases: longest first, ties alphabetical.
    out.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    out
}

fn extend(set: &mut BTreeSet<String>, items: &[&str]) {
    for i in items {
        set.insert((*i).to_string());
    }
}

fn contains_any(hay: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| hay.contains(n))
}

/// Generic Bangladesh-relevant synonyms for a lowercased taxonomy label.
/// Heuristic by design: broad enough to catch common post/comment wording
/// across banks, not exact.
fn generic_synonyms(lower: &str) -> Vec<&'static str> {
    let mut s: Vec<&'static str> = Vec::new();

    // Loans
    if contains_any(lower, &["loan", "ঋণ", "rin", "emi"]) {
        s.extend([
            "loan", "loans", "ঋণ", "রিন", "rin", "lone", "emi", "installment", "কিস্তি", "সুদ",
            "interest",
        ]);
        if lower.contains("personal") {
            s.extend(["personal loan", "consumer loan", "ব্যক্তিগত ঋণ", "পার্সোনাল লোন"]);
        }
        if lower.contains("home") || lower.contains("house") {
            s.extend(["home loan", "housing loan", "mortgage", "গৃহঋণ", "হোম লোন", "বাড়ি ঋণ"]);
        }
        if lower.contains("car") || lower.contains("auto") {
            s.extend(["car loan", "auto loan", "vehicle loan", "গাড়ি ঋণ", "কার লোন"]);
        }
        if lower.contains("education") || lower.contains("student") {
            s.extend(["education loan", "student loan", "স্টুডেন্ট লোন", "শিক্ষা ঋণ"]);
        }
        if lower.contains("travel") {
            s.extend(["travel loan", "ট্রাভেল লোন", "ভ্রমণ ঋণ"]);
        }
        if lower.contains("marriage") || lower.contains("wedding") {
            s.extend(["marriage loan", "wedding loan", "বিয়ে ঋণ", "ম্যারেজ লোন"]);
        }
        if lower.contains("doctor") {
            s.extend(["doctor loan", "physician loan", "ডাক্তার লোন"]);
        }
        if lower.contains("sme") || lower.contains("business") {
            s.extend(["sme loan", "business loan", "enterprise loan", "ব্যবসা ঋণ", "উদ্যোক্তা ঋণ"]);
        }
    }

    // Deposits / accounts
    if contains_any(lower, &["deposit", "savings", "account", "a/c", "fdr", "dps", "term"]) {
        s.extend([
            "account", "accounts", "a/c", "savings", "deposit", "deposits", "একাউন্ট",
            "অ্যাকাউন্ট", "সেভিংস", "ডিপোজিট",
        ]);
        s.extend(["fdr", "fixed deposit", "term deposit", "fd", "ফিক্সড ডিপোজিট", "এফডিআর"]);
        s.extend(["dps", "deposit pension scheme", "monthly deposit", "ডিপিএস", "সঞ্চয়"]);
        if lower.contains("current") {
            s.extend(["current account", "c/a", "কারেন্ট একাউন্ট"]);
        }
        if lower.contains("salary") {
            s.extend(["salary account", "payroll", "বেতন একাউন্ট"]);
        }
        if lower.contains("student") {
            s.extend(["student account", "students", "স্টুডেন্ট একাউন্ট"]);
        }
        if lower.contains("women") || lower.contains("neera") {
            s.extend(["women account", "women banking", "নারী একাউন্ট", "উইমেন"]);
        }
        if contains_any(lower, &["islamic", "hasanah", "mudaraba"]) {
            s.extend(["islamic account", "shariah account", "মুদারাবা", "ইসলামিক একাউন্ট", "হালাল"]);
        }
    }

    // Cards
    if contains_any(lower, &["card", "visa", "mastercard", "debit", "credit"]) {
        s.extend(["card", "cards", "visa", "mastercard", "amex", "কার্ড", "ভিসা", "মাস্টারকার্ড"]);
        if lower.contains("debit") {
            s.extend(["debit card", "ডেবিট কার্ড"]);
        }
        if lower.contains("credit") {
            s.extend(["credit card", "ক্রেডিট কার্ড", "cc"]);
        }
        if lower.contains("prepaid") {
            s.extend(["prepaid card", "gift card", "প্রিপেইড কার্ড"]);
        }
    }

    // Digital / channels
    if contains_any(lower, &["app", "digital", "internet", "online", "mobile", "sms", "qr"]) {
        s.extend([
            "digital", "online", "internet banking", "online banking", "mobile banking",
            "mobile app", "app", "apps", "ইন্টারনেট ব্যাংকিং", "অনলাইন ব্যাংকিং",
            "মোবাইল ব্যাংকিং", "অ্যাপ", "ডিজিটাল",
        ]);
        s.extend(["otp", "password", "login", "sign in", "লগইন", "পাসওয়ার্ড", "ওটিপি"]);
        s.extend(["qr", "qr pay", "scan", "স্ক্যান", "কিউআর"]);
    }

    // Remittance / NRB
    if contains_any(lower, &["remit", "nrb", "expat", "prabashi", "wage"]) {
        s.extend(["remittance", "remit", "nrb", "expat", "prabashi", "প্রবাসী", "রেমিট্যান্স", "ওয়েজ আর্নার"]);
    }

    // Service touchpoints
    if contains_any(lower, &["atm", "branch", "agent", "call", "hotline", "service", "support"]) {
        s.extend(["atm", "booth", "atm booth", "এটিএম", "বুথ"]);
        s.extend(["branch", "branches", "শাখা"]);
        s.extend(["agent banking", "agent", "এজেন্ট ব্যাংকিং", "এজেন্ট"]);
        s.extend([
            "customer service", "support", "help", "hotline", "call center",
            "কাস্টমার সার্ভিস", "হেল্পলাইন",
        ]);
    }

    // Offers / campaigns
    if contains_any(lower, &["offer", "discount", "cashback", "campaign", "promo"]) {
        s.extend([
            "offer", "offers", "discount", "cashback", "promo", "promotion", "campaign",
            "অফার", "ডিসকাউন্ট", "ক্যাশব্যাক", "প্রোমো", "ক্যাম্পেইন",
        ]);
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_brand_words() {
        assert_eq!(strip_brand_words("Prime Personal Loan"), "personal loan");
        assert_eq!(strip_brand_words("BRAC Bank SME Loan"), "sme loan");
        assert_eq!(strip_brand_words("Prime Bank"), "");
    }

    #[test]
    fn test_expand_includes_brand_stripped_variant() {
        let phrases = expand_phrases("Prime Personal Loan");
        assert!(phrases.iter().any(|p| p == "personal loan"));
    }

    #[test]
    fn test_expand_loan_synonyms() {
        let phrases = expand_phrases("Personal Loan");
        assert!(phrases.iter().any(|p| p == "loan"));
        assert!(phrases.iter().any(|p| p == "ঋণ"));
        assert!(phrases.iter().any(|p| p == "emi"));
    }

    #[test]
    fn test_expand_removes_parentheticals() {
        let phrases = expand_phrases("Savings Account (Mudaraba)");
        assert!(phrases.iter().any(|p| p == "savings account"));
    }

    #[test]
    fn test_expand_orders_longest_first() {
        let phrases = expand_phrases("Credit Card");
        for pair in phrases.windows(2) {
            assert!(pair[0].chars().count() >= pair[1].chars().count());
        }
    }

    #[test]
    fn test_expand_drops_short_phrases() {
        let phrases = expand_phrases("Credit Card");
        assert!(phrases.iter().all(|p| p.chars().count() >= 3));
    }
}
