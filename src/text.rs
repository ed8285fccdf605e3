//! Comment body tokenization.
//!
//! Raw comment text is split into paragraphs on newline runs, and each
//! paragraph into literal text, URLs and email addresses so the renderer can
//! turn the latter two into links.
//!
//! URL matching tries to separate characters that belong to a URL from
//! characters that are punctuation around it:
//!
//! - `#$%&'+-/<=>@_|~`, letters and digits may end a URL;
//! - `!()*,.:;?"` and non-ASCII characters (dashes, curly quotes) may appear
//!   inside a URL but never end one;
//! - `()`, `[]` and `{}` are part of a URL only as a balanced pair, so that
//!   `(http://example.com/)` leaves the parentheses outside while
//!   `http://example.com/foo+(bar)?a[1]=2` is one URL.
//!
//! A backslash followed by a non-alphanumeric character escapes it, so
//! `http://example.com/a\ b\)c` is a single URL. Escapes are removed by
//! dropping the backslash. Bracket groups do not nest: `[[]]` matches only
//! `[[]`; write `[[\]]` to keep all four.

use std::borrow::Cow;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"[Hh][Tt][Tt][Pp][Ss]?://(?:",
        r"\\[^A-Za-z0-9]",
        r"|[^\s(){}\[\]]*[A-Za-z0-9#$%&'+\-/<=>@_|~]",
        r"|\((?:\\[^A-Za-z0-9]|[^\s)])*\)",
        r"|\[(?:\\[^A-Za-z0-9]|[^\s\]])*\]",
        r"|\{(?:\\[^A-Za-z0-9]|[^\s}])*\}",
        r")+",
    ))
    .expect("valid url regex")
});

static ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([^A-Za-z0-9])").expect("valid escape regex"));

// Assumes the address ends in an alphabetic TLD. Quoted local parts, IP hosts
// and non-ASCII local parts are not recognized.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9!#$%&'*+\-/=?^_`{|}~.]+@\S+\.[A-Za-z0-9\-]*[A-Za-z]+")
        .expect("valid email regex")
});

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A run of paragraph content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Url { text: String, href: String },
    Email { text: String, href: String },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Url { text, .. } | Self::Email { text, .. } => text,
        }
    }

    pub fn href(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Url { href, .. } | Self::Email { href, .. } => Some(href),
        }
    }
}

pub type Paragraph = Vec<Segment>;

fn split_by<'a>(re: &Regex, s: &'a str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in re.find_iter(s) {
        parts.push(&s[last..m.start()]);
        parts.push(m.as_str());
        last = m.end();
    }
    parts.push(&s[last..]);
    parts
}

/// Split `s` around URLs. Even indices hold the text between URLs (possibly
/// empty), odd indices the URLs themselves.
pub fn split_by_url(s: &str) -> Vec<&str> {
    split_by(&URL_RE, s)
}

/// Split `s` around email addresses, with the same layout as [`split_by_url`].
pub fn split_by_email(s: &str) -> Vec<&str> {
    split_by(&EMAIL_RE, s)
}

/// Remove backslash escapes from a matched URL. A backslash before an
/// alphanumeric character, or at the very end, is kept.
pub fn unescape_url(s: &str) -> Cow<'_, str> {
    ESCAPE_RE.replace_all(s, "$1")
}

pub fn mailto_href(email: &str) -> String {
    format!("mailto:{}", utf8_percent_encode(email, URI_COMPONENT))
}

/// Split raw comment text into paragraphs of text, URL and email segments.
/// Empty paragraphs are dropped.
pub fn tokenize(text: &str) -> Vec<Paragraph> {
    text.split('\n')
        .filter(|paragraph| !paragraph.is_empty())
        .map(tokenize_paragraph)
        .collect()
}

fn tokenize_paragraph(paragraph: &str) -> Paragraph {
    let mut segments = Vec::new();
    for (i, part) in split_by_url(paragraph).into_iter().enumerate() {
        if i % 2 == 1 {
            segments.push(Segment::Url {
                text: part.to_string(),
                href: unescape_url(part).into_owned(),
            });
            continue;
        }
        for (j, piece) in split_by_email(part).into_iter().enumerate() {
            if j % 2 == 1 {
                segments.push(Segment::Email {
                    text: piece.to_string(),
                    href: mailto_href(piece),
                });
            } else if !piece.is_empty() {
                segments.push(Segment::Text(piece.to_string()));
            }
        }
    }
    segments
}

/// Plain text of a paragraph, links included verbatim.
pub fn paragraph_text(paragraph: &[Segment]) -> String {
    paragraph.iter().map(Segment::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_by_url_basic() {
        assert_eq!(split_by_url("http://example"), ["", "http://example", ""]);
        assert_eq!(split_by_url("https://example"), ["", "https://example", ""]);
        assert_eq!(
            split_by_url("Read http://the-manual.com!"),
            ["Read ", "http://the-manual.com", "!"]
        );
        assert_eq!(
            split_by_url("foo http://example/1 bar http://example/2 baz"),
            ["foo ", "http://example/1", " bar ", "http://example/2", " baz"]
        );
        assert_eq!(
            split_by_url("foohttps://example"),
            ["foo", "https://example", ""]
        );
    }

    #[test]
    fn test_split_by_url_punctuation() {
        assert_eq!(
            split_by_url("http://example/http://example/"),
            ["", "http://example/http://example/", ""]
        );
        assert_eq!(
            split_by_url("http://example/,http://example/"),
            ["", "http://example/,http://example/", ""]
        );
        assert_eq!(
            split_by_url("http://example/, http://example/"),
            ["", "http://example/", ", ", "http://example/", ""]
        );
        assert_eq!(
            split_by_url("http://example/,;:\"http://example/"),
            ["", "http://example/,;:\"http://example/", ""]
        );
        assert_eq!(
            split_by_url("http://example/,;:\" http://example/"),
            ["", "http://example/", ",;:\" ", "http://example/", ""]
        );
    }

    #[test]
    fn test_split_by_url_brackets() {
        assert_eq!(
            split_by_url("https://example.com/[bla]?q=(bla)#{bla}&<>"),
            ["", "https://example.com/[bla]?q=(bla)#{bla}&<>", ""]
        );
        assert_eq!(
            split_by_url("(http://example/)"),
            ["(", "http://example/", ")"]
        );
        assert_eq!(
            split_by_url("(http://example/(a))"),
            ["(", "http://example/(a)", ")"]
        );
        assert_eq!(
            split_by_url("[http://example/[a]]"),
            ["[", "http://example/[a]", "]"]
        );
        assert_eq!(
            split_by_url("{http://example/{a}}"),
            ["{", "http://example/{a}", "}"]
        );
    }

    #[test]
    fn test_split_by_url_nested_brackets_truncate() {
        assert_eq!(
            split_by_url("http://example/[[]]"),
            ["", "http://example/[[]", "]"]
        );
        assert_eq!(
            split_by_url("http://example/[[\\]]"),
            ["", "http://example/[[\\]]", ""]
        );
        assert_eq!(
            split_by_url("http://example/[[]\\]"),
            ["", "http://example/[[]\\]", ""]
        );
        assert_eq!(
            split_by_url("http://example/\\[\\[\\]\\]"),
            ["", "http://example/\\[\\[\\]\\]", ""]
        );
    }

    #[test]
    fn test_split_by_url_case_and_unicode() {
        assert_eq!(
            split_by_url("HtTp://eXamPlE-123.com/føo"),
            ["", "HtTp://eXamPlE-123.com/føo", ""]
        );
        assert_eq!(
            split_by_url("\u{201c}http://example.com\u{201d}"),
            ["\u{201c}", "http://example.com", "\u{201d}"]
        );
        assert_eq!(
            split_by_url("http://example.com/føö"),
            ["", "http://example.com/f", "øö"]
        );
    }

    #[test]
    fn test_split_by_url_rejects_other_protocols() {
        assert_eq!(split_by_url("http:bla http/:bla"), ["http:bla http/:bla"]);
        assert_eq!(split_by_url("ftp://example.com/"), ["ftp://example.com/"]);
    }

    #[test]
    fn test_split_by_url_escapes() {
        assert_eq!(
            split_by_url("foo http://example/bar\\ baz"),
            ["foo ", "http://example/bar\\ baz", ""]
        );
        assert_eq!(
            split_by_url("http://exa\\mple/"),
            ["", "http://exa\\mple/", ""]
        );
    }

    #[test]
    fn test_unescape_url() {
        assert_eq!(
            unescape_url("https://example.com/foo+(bar%20baz)"),
            "https://example.com/foo+(bar%20baz)"
        );
        assert_eq!(
            unescape_url("https://example.com/foo\\ bar"),
            "https://example.com/foo bar"
        );
        assert_eq!(unescape_url("\\"), "\\");
        assert_eq!(unescape_url("\\ \\\\\\(\\)\\+"), " \\()+");
        assert_eq!(unescape_url("\\0"), "\\0");
        assert_eq!(unescape_url("\\n"), "\\n");
        assert_eq!(unescape_url("\\ñ"), "ñ");
    }

    #[test]
    fn test_split_by_email() {
        assert_eq!(
            split_by_email("Email me at <First.Last@eXamPle.Com>"),
            ["Email me at <", "First.Last@eXamPle.Com", ">"]
        );
        assert_eq!(
            split_by_email("(user-1.2_3+bla@456.xn--blabla)"),
            ["(", "user-1.2_3+bla@456.xn--blabla", ")"]
        );
        assert_eq!(split_by_email("bla@bla.blä"), ["", "bla@bla.bl", "ä"]);
        assert_eq!(
            split_by_email("user@example.com?subject=foo&dummy=@x.y"),
            ["", "user@example.com?subject=foo&dummy=@x.y", ""]
        );
        assert_eq!(
            split_by_email("foo\\ bar@baz.com"),
            ["foo\\ ", "bar@baz.com", ""]
        );
    }

    #[test]
    fn test_split_by_email_unsupported_forms() {
        assert_eq!(
            split_by_email("\"First.Last\"@domain.com"),
            ["\"First.Last\"@domain.com"]
        );
        assert_eq!(split_by_email("josé@domain.com"), ["josé@domain.com"]);
        assert_eq!(split_by_email("user@1.2.3.4"), ["user@1.2.3.4"]);
    }

    #[test]
    fn test_mailto_href_percent_encodes() {
        assert_eq!(
            mailto_href("user@example.com?subject=foo&dummy=@x.y"),
            "mailto:user%40example.com%3Fsubject%3Dfoo%26dummy%3D%40x.y"
        );
        assert_eq!(mailto_href("a.b-c_d@e.org"), "mailto:a.b-c_d%40e.org");
    }

    #[test]
    fn test_tokenize_paragraphs() {
        let paragraphs = tokenize("first\n\n\nsecond\n");
        assert_eq!(
            paragraphs,
            vec![
                vec![Segment::Text("first".into())],
                vec![Segment::Text("second".into())],
            ]
        );
        assert!(tokenize("").is_empty());
        assert!(tokenize("\n\n").is_empty());
    }

    #[test]
    fn test_tokenize_links_and_emails() {
        let paragraphs = tokenize("See http://example.com/a\\ b, or mail me@example.org.");
        assert_eq!(
            paragraphs,
            vec![vec![
                Segment::Text("See ".into()),
                Segment::Url {
                    text: "http://example.com/a\\ b".into(),
                    href: "http://example.com/a b".into(),
                },
                Segment::Text(", or mail ".into()),
                Segment::Email {
                    text: "me@example.org".into(),
                    href: "mailto:me%40example.org".into(),
                },
                Segment::Text(".".into()),
            ]]
        );
    }

    #[test]
    fn test_email_inside_url_is_part_of_url() {
        let paragraphs = tokenize("http://example.com/user@example.com");
        assert_eq!(paragraphs[0].len(), 1);
        assert!(matches!(paragraphs[0][0], Segment::Url { .. }));
    }

    #[test]
    fn test_paragraph_text_round_trips_source() {
        let source = "Read http://the-manual.com! or a@b.io";
        let paragraphs = tokenize(source);
        assert_eq!(paragraph_text(&paragraphs[0]), source);
    }
}
