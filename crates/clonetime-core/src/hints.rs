//! Keyword heuristics over crawled text.
//!
//! Hints bias the prompt and gate which missions survive post-processing.
//! They are deliberately cheap regex checks and will misfire on ambiguous
//! marketing copy (a blog post titled "Why we removed sign-up" still sets
//! `has_auth`).

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::models::CrawlResult;

static AUTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(sign[ -]?in|sign[ -]?up|log[ -]?in|log[ -]?out|register|my account|create (an )?account|password|oauth|sso|single sign[ -]on|authenticat\w*)\b",
    )
    .expect("valid auth regex")
});

static ADMIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(admin\w*|dashboard|back[ -]?office|moderat\w*|manage (users|team|members)|roles? (and|&) permissions|team management)\b",
    )
    .expect("valid admin regex")
});

static API_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(apis?|restful|graphql|webhooks?|sdks?|endpoints?|developer (docs|portal|platform))\b",
    )
    .expect("valid api regex")
});

static PORTFOLIO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(portfolio|our work|selected work|case stud(y|ies)|agency|studio|freelanc\w*|hire me|about me|my work)\b",
    )
    .expect("valid portfolio regex")
});

/// Heuristic signals derived from a crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Hints {
    pub has_auth: bool,
    pub has_admin: bool,
    pub mentions_api: bool,
    pub is_portfolio_like: bool,
}

/// Derive hints from the titles and content of every successful page.
pub fn detect_hints(pages: &[CrawlResult]) -> Hints {
    let corpus = pages
        .iter()
        .filter(|p| p.is_ok())
        .map(|p| format!("{}\n{}", p.title, p.content))
        .collect::<Vec<_>>()
        .join("\n");
    detect_hints_in_text(&corpus)
}

/// Derive hints from raw text. Matching is case-insensitive.
pub fn detect_hints_in_text(text: &str) -> Hints {
    let text = text.to_lowercase();
    let has_auth = AUTH_RE.is_match(&text);
    let has_admin = ADMIN_RE.is_match(&text);
    let mentions_api = API_RE.is_match(&text);
    let is_portfolio_like = PORTFOLIO_RE.is_match(&text) && !has_auth && !has_admin;

    Hints {
        has_auth,
        has_admin,
        mentions_api,
        is_portfolio_like,
    }
}

/// Title keywords that mark a mission as account/auth work.
pub(crate) fn title_mentions_auth(title: &str) -> bool {
    static TITLE_AUTH_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"\b(auth[nz]?|authenticat\w*|authori[sz]ation|log[ -]?in|sign[ -]?(in|up)|accounts?|registration|password|oauth|sso)\b",
        )
        .expect("valid title auth regex")
    });
    TITLE_AUTH_RE.is_match(&title.to_lowercase())
}

/// Title keywords that mark a mission as admin work.
pub(crate) fn title_mentions_admin(title: &str) -> bool {
    static TITLE_ADMIN_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b(admin\w*|back[ -]?office|moderation)\b").expect("valid title admin regex")
    });
    TITLE_ADMIN_RE.is_match(&title.to_lowercase())
}

/// Title keywords that mark a mission as public API work.
pub(crate) fn title_mentions_api(title: &str) -> bool {
    static TITLE_API_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b(apis?|graphql|webhooks?|sdks?)\b").expect("valid title api regex")
    });
    TITLE_API_RE.is_match(&title.to_lowercase())
}
