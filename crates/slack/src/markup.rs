//! Convert arbitrary rich-text output into Slack's mrkdwn dialect.
//!
//! Slack rejects or mis-renders three markup classes the reasoning service
//! likes to emit: HTML anchor tags, ATX markdown headers, and
//! double-asterisk bold. Detection and the deterministic rewrite live here;
//! the preferred LLM-backed rewrite tier is orchestrated by the workflow's
//! normalize node, which falls back to [`normalize_fallback`] whenever that
//! call fails or returns text that still trips a detector.
//!
//! Everything in this module is pure: identical input yields identical
//! output, and normalizing already-clean text is an exact identity.

use std::sync::LazyLock;

use regex::Regex;

fn re(pattern: &str) -> Regex {
    #[allow(clippy::expect_used)]
    Regex::new(pattern).expect("static pattern is valid")
}

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r#"(?is)<a\s[^>]*href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#));

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?m)^ {0,3}#{1,6}[ \t]+(.*?)[ \t]*#*[ \t]*$"));

static DOUBLE_BOLD_RE: LazyLock<Regex> = LazyLock::new(|| re(r"\*\*([^*\n]+)\*\*"));

static INNER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| re(r"<[^>]+>"));

// Link-target canonicalization: verse-style references in library URLs.
static VERSE_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| re(r"[ \t]+(\d+[:.]\d+)"));
static VERSE_COLON_RE: LazyLock<Regex> = LazyLock::new(|| re(r"(\d+):(\d+)"));
static PATH_WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| re(r"\s+"));

// ── Defect detection ─────────────────────────────────────────────────────

#[must_use]
pub fn has_anchor_links(text: &str) -> bool {
    ANCHOR_RE.is_match(text)
}

#[must_use]
pub fn has_atx_headers(text: &str) -> bool {
    HEADER_RE.is_match(text)
}

#[must_use]
pub fn has_double_bold(text: &str) -> bool {
    DOUBLE_BOLD_RE.is_match(text)
}

/// Whether the text carries any markup Slack's dialect rejects. False here
/// guarantees [`normalize_fallback`] returns its input unchanged.
#[must_use]
pub fn needs_normalization(text: &str) -> bool {
    has_anchor_links(text) || has_atx_headers(text) || has_double_bold(text)
}

// ── Deterministic rewrite (fallback tier) ────────────────────────────────

/// Rule specification handed to the preferred rewriting call. The fallback
/// below implements exactly these rules.
#[must_use]
pub fn rewrite_rules() -> &'static str {
    "Rewrite the text into Slack mrkdwn, changing markup only, never wording:\n\
     - HTML links <a href=\"URL\">TEXT</a> become <URL|TEXT>\n\
     - Markdown headers (#, ##, ...) become a single-asterisk bold line: *TEXT*\n\
     - Double-asterisk bold **TEXT** becomes single-asterisk *TEXT*\n\
     - In link URLs: decode %2C to a comma, replace the space before a\n\
       chapter:verse reference with a period, replace the colon inside\n\
       chapter:verse with a period, and replace remaining spaces in the\n\
       path with underscores.\n\
     Return only the rewritten text."
}

/// Deterministic mrkdwn rewrite. Clean input is returned unchanged, and the
/// output never trips the detectors above, so applying this twice equals
/// applying it once.
#[must_use]
pub fn normalize_fallback(text: &str) -> String {
    if !needs_normalization(text) {
        return text.to_string();
    }
    let out = rewrite_anchors(text);
    let mut out = HEADER_RE.replace_all(&out, "*$1*").into_owned();
    // Nested emphasis like ***x*** sheds one delimiter pair per round.
    while DOUBLE_BOLD_RE.is_match(&out) {
        out = DOUBLE_BOLD_RE.replace_all(&out, "*$1*").into_owned();
    }
    out
}

fn rewrite_anchors(text: &str) -> String {
    ANCHOR_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let url = canonicalize_link_target(&caps[1]);
            let label = INNER_TAG_RE.replace_all(&caps[2], "");
            format!("<{url}|{}>", label.trim())
        })
        .into_owned()
}

/// Canonicalize a link target for Slack delivery. Only the path segment is
/// touched; scheme and host pass through untouched.
#[must_use]
pub fn canonicalize_link_target(url: &str) -> String {
    let url = url.replace("%2C", ",").replace("%2c", ",");
    let Some(path_start) = url.find("://").and_then(|scheme_end| {
        url[scheme_end + 3..]
            .find('/')
            .map(|rel| scheme_end + 3 + rel)
    }) else {
        return canonicalize_path(&url);
    };
    let (head, path) = url.split_at(path_start);
    format!("{head}{}", canonicalize_path(path))
}

fn canonicalize_path(path: &str) -> String {
    let path = VERSE_SPACE_RE.replace_all(path, ".$1");
    let path = VERSE_COLON_RE.replace_all(&path, "$1.$2");
    PATH_WHITESPACE_RE.replace_all(&path, "_").into_owned()
}

// ── Inbound markup stripping (context assembly) ──────────────────────────

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| re(r"<@[A-Za-z0-9_]+>"));
static CHANNEL_REF_RE: LazyLock<Regex> = LazyLock::new(|| re(r"<#[A-Za-z0-9_]+\|([^>]*)>"));
static LINK_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"<([^<>|@#!][^<>|]*)\|([^>]*)>|<([^<>|@#!][^<>|]*)>"));

/// Strip Slack mention/link markup down to plain text.
#[must_use]
pub fn strip_markup(text: &str) -> String {
    let out = MENTION_RE.replace_all(text, "");
    let out = CHANNEL_REF_RE.replace_all(&out, "#$1");
    let out = LINK_REF_RE.replace_all(&out, |caps: &regex::Captures<'_>| {
        caps.get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    });
    out.trim().to_string()
}

// ── Delivery post-pass ───────────────────────────────────────────────────

/// Phrases indicating the answer leaned on general knowledge rather than
/// retrieved sources. Matched case-insensitively.
const COVERAGE_TRIGGERS: &[&str] = &[
    "don't have specific sources",
    "couldn't find a source",
    "couldn't find specific sources",
    "based on general knowledge",
    "not in the sources available to me",
];

const COVERAGE_BANNER: &str = ":warning: _Parts of this answer may rely on general knowledge \
rather than cited sources. Please verify citations before relying on them._";

static TRAILING_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| re(r"[ \t]+\n"));
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| re(r"\n{3,}"));

#[must_use]
pub fn coverage_warning_needed(text: &str) -> bool {
    let lowered = text.to_lowercase();
    COVERAGE_TRIGGERS.iter().any(|t| lowered.contains(t))
}

/// Final delivery cleanup: collapse redundant whitespace and append the
/// limited-coverage banner when a trigger phrase is present. Idempotent,
/// and independent of whether normalization ran before it.
#[must_use]
pub fn apply_post_pass(text: &str) -> String {
    let out = TRAILING_SPACE_RE.replace_all(text, "\n");
    let out = BLANK_RUN_RE.replace_all(&out, "\n\n");
    let out = out.trim().to_string();
    if coverage_warning_needed(&out) && !out.contains(COVERAGE_BANNER) {
        return format!("{out}\n\n{COVERAGE_BANNER}");
    }
    out
}
