//! Text normalization applied before chunking and again after summarization.
//!
//! Scraped articles and model output both carry artifacts: tracking links, e-mail footers, and
//! runs of repeated words or phrases. The sanitizer strips links and addresses, then collapses
//! three kinds of repetition in a fixed order:
//!
//! 1. a domain-like token repeated back to back (`onet.pl onet.pl`),
//! 2. a two-word phrase repeated three or more times,
//! 3. a single word repeated three or more times.
//!
//! Repeats are matched on each token's word core. Punctuation between repeats ends a run and the
//! punctuation around a collapsed run is kept. Collapsing runs to a fixpoint so the result is
//! idempotent.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid URL pattern"));
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+").expect("valid e-mail pattern"));
static DOMAIN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[\w.\-]+\.[a-z]{2,}$").expect("valid domain pattern"));

const DOMAIN_MIN_REPEATS: usize = 2;
const PHRASE_MIN_REPEATS: usize = 3;
const WORD_MIN_REPEATS: usize = 3;

/// Strip URLs and e-mail addresses, collapse repetition, and normalize whitespace.
pub fn sanitize(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let without_urls = URL_PATTERN.replace_all(text, " ");
    let stripped = EMAIL_PATTERN.replace_all(&without_urls, " ");

    let mut tokens: Vec<Cow<'_, str>> = stripped.split_whitespace().map(Cow::Borrowed).collect();
    loop {
        let before = tokens.len();
        tokens = collapse_runs(&tokens, DOMAIN_MIN_REPEATS, is_domain);
        tokens = collapse_phrases(&tokens);
        tokens = collapse_runs(&tokens, WORD_MIN_REPEATS, is_word);
        if tokens.len() == before {
            break;
        }
    }
    tokens.join(" ")
}

/// Collapse repeated phrases and words only; used on model output.
pub fn collapse_repeats(text: &str) -> String {
    let mut tokens: Vec<Cow<'_, str>> = text.split_whitespace().map(Cow::Borrowed).collect();
    loop {
        let before = tokens.len();
        tokens = collapse_phrases(&tokens);
        tokens = collapse_runs(&tokens, WORD_MIN_REPEATS, is_word);
        if tokens.len() == before {
            break;
        }
    }
    tokens.join(" ")
}

/// A whitespace token split around its core: `"(very,"` is `"("`, `"very"`, `","`.
struct Parts<'t> {
    lead: &'t str,
    core: &'t str,
    trail: &'t str,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn split_token(token: &str) -> Parts<'_> {
    let rest = token.trim_start_matches(|c: char| !is_word_char(c));
    let core = rest.trim_end_matches(|c: char| !is_word_char(c));
    Parts {
        lead: &token[..token.len() - rest.len()],
        core,
        trail: &rest[core.len()..],
    }
}

fn is_word(core: &str) -> bool {
    !core.is_empty() && core.chars().all(is_word_char)
}

fn is_domain(core: &str) -> bool {
    DOMAIN_TOKEN.is_match(core)
}

fn same_ignoring_case(left: &str, right: &str) -> bool {
    left == right || left.to_lowercase() == right.to_lowercase()
}

/// Whether token `k` continues the token before it: only whitespace separates their cores.
fn joins(parts: &[Parts<'_>], k: usize) -> bool {
    parts[k - 1].trail.is_empty() && parts[k].lead.is_empty()
}

/// First token's leading punctuation and core, last token's trailing punctuation.
fn rejoin<'a>(first: &Parts<'_>, last: &Parts<'_>) -> Cow<'a, str> {
    Cow::Owned(format!("{}{}{}", first.lead, first.core, last.trail))
}

/// Collapse runs of one candidate core repeated at least `min_repeats` times.
fn collapse_runs<'a>(
    tokens: &[Cow<'a, str>],
    min_repeats: usize,
    is_candidate: fn(&str) -> bool,
) -> Vec<Cow<'a, str>> {
    let parts: Vec<Parts<'_>> = tokens.iter().map(|token| split_token(token)).collect();
    let mut collapsed = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let core = parts[i].core;
        let mut end = i + 1;
        if is_candidate(core) {
            while end < tokens.len()
                && joins(&parts, end)
                && same_ignoring_case(parts[end].core, core)
            {
                end += 1;
            }
        }
        if end - i >= min_repeats {
            collapsed.push(rejoin(&parts[i], &parts[end - 1]));
            i = end;
        } else {
            collapsed.push(tokens[i].clone());
            i += 1;
        }
    }
    collapsed
}

fn collapse_phrases<'a>(tokens: &[Cow<'a, str>]) -> Vec<Cow<'a, str>> {
    let parts: Vec<Parts<'_>> = tokens.iter().map(|token| split_token(token)).collect();
    let mut collapsed = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if i + 1 < tokens.len()
            && joins(&parts, i + 1)
            && is_word(parts[i].core)
            && is_word(parts[i + 1].core)
        {
            let (first, second) = (parts[i].core, parts[i + 1].core);
            let mut repeats = 1;
            while i + 2 * repeats + 1 < tokens.len() {
                let (a, b) = (i + 2 * repeats, i + 2 * repeats + 1);
                if joins(&parts, a)
                    && joins(&parts, b)
                    && parts[a].core == first
                    && parts[b].core == second
                {
                    repeats += 1;
                } else {
                    break;
                }
            }
            if repeats >= PHRASE_MIN_REPEATS {
                let last = &parts[i + 2 * repeats - 1];
                collapsed.push(Cow::Owned(format!("{}{first}", parts[i].lead)));
                collapsed.push(rejoin(&parts[i + 1], last));
                i += 2 * repeats;
                continue;
            }
        }
        collapsed.push(tokens[i].clone());
        i += 1;
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_repeated_phrase() {
        assert_eq!(
            sanitize("breaking news breaking news breaking news report"),
            "breaking news report"
        );
    }

    #[test]
    fn two_phrase_repeats_are_kept() {
        assert_eq!(
            sanitize("breaking news breaking news report"),
            "breaking news breaking news report"
        );
    }

    #[test]
    fn collapses_repeated_words_case_insensitively() {
        assert_eq!(sanitize("Very very VERY long day"), "Very long day");
        assert_eq!(sanitize("no no answer"), "no no answer");
    }

    #[test]
    fn collapses_repeated_domains() {
        assert_eq!(
            sanitize("Source: Onet.pl onet.pl ONET.PL article"),
            "Source: Onet.pl article"
        );
    }

    #[test]
    fn strips_urls_and_emails() {
        assert_eq!(
            sanitize("Read https://example.org/a?b=1 or www.example.org now, mail kontakt@example.pl."),
            "Read or now, mail"
        );
    }

    #[test]
    fn normalizes_whitespace_and_handles_empty_input() {
        assert_eq!(sanitize("  one\n\n two\tthree  "), "one two three");
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize(" \n\t "), "");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "breaking news breaking news breaking news report",
            "a b a b a b a a a b b b",
            "go go go go go go",
            "x.com x.com www.y.com mail@z.pl z z z",
            "Polska Polska polska gola gola gola strzeliła",
            "a@www.example.org tail",
            "Zażółć gęślą jaźń. Zażółć gęślą jaźń.",
            "breaking news breaking news breaking news.",
            "go go go. go go go",
            "(a b a b a b) c",
            "Visit onet.pl onet.pl, today",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn sanitized_text_is_never_longer() {
        let input = "Breaking  news\n\nbreaking news https://t.co/x";
        assert!(sanitize(input).chars().count() <= input.chars().count());
    }

    #[test]
    fn repeated_phrase_keeps_surrounding_punctuation() {
        assert_eq!(
            sanitize("breaking news breaking news breaking news."),
            "breaking news."
        );
        assert_eq!(
            sanitize("(breaking news breaking news breaking news) today"),
            "(breaking news) today"
        );
    }

    #[test]
    fn repeated_word_keeps_trailing_punctuation() {
        assert_eq!(sanitize("It was very very very. Done"), "It was very. Done");
        assert_eq!(collapse_repeats("Stop, stop stop stop!"), "Stop, stop!");
    }

    #[test]
    fn punctuation_between_repeats_ends_the_run() {
        assert_eq!(sanitize("go, go, go"), "go, go, go");
        assert_eq!(sanitize("go go go. go go go"), "go. go");
    }

    #[test]
    fn repeated_domain_keeps_trailing_punctuation() {
        assert_eq!(sanitize("Visit onet.pl onet.pl, today"), "Visit onet.pl, today");
    }

    #[test]
    fn collapse_repeats_leaves_links_alone() {
        assert_eq!(
            collapse_repeats("see see see example.org example.org"),
            "see example.org example.org"
        );
    }
}
