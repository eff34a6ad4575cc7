//! Canonical video identifiers and the URL → identifier extractor.
//!
//! The extractor recognises the address shapes people actually paste:
//!
//! ```text
//!   https://youtu.be/<id>                       short link
//!   https://www.youtube.com/watch?v=<id>        watch page (v= after ? or &)
//!   https://www.youtube.com/embed/<id>          embed path (also /v/ and /e/)
//!   https://www.youtube.com/<seg>/<...>/<id>    any nested path
//! ```
//!
//! Scheme and `www.` are optional and the match is unanchored, so text around
//! the URL is tolerated.  A bare 11-character token is deliberately *not*
//! accepted: only URL- or query-embedded tokens count.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Number of characters in a canonical identifier.
pub const VIDEO_ID_LEN: usize = 11;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/(?:[^/\n\s]+/\s*\S*/|(?:v|e(?:mbed)?)/|\S*?[?&]v=)|youtu\.be/)([a-zA-Z0-9_-]{11})",
    )
    .expect("video URL pattern is a valid literal")
});

/// An 11-character token from `[A-Za-z0-9_-]`.  Case is preserved exactly as
/// captured.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a video identifier: {0:?}")]
pub struct InvalidVideoId(pub String);

impl VideoId {
    /// Validate a bare token.  This is the strict path used for config values
    /// and tests; the URL field always goes through [`extract`].
    pub fn parse(token: &str) -> Result<Self, InvalidVideoId> {
        if is_id_token(token) {
            Ok(Self(token.to_string()))
        } else {
            Err(InvalidVideoId(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch-page address handed to the player library.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for VideoId {
    type Err = InvalidVideoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_id_token(s: &str) -> bool {
    s.len() == VIDEO_ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Extract the canonical identifier from free-form user text.
///
/// Total and pure: no match is a normal `None`, never an error.
pub fn extract(raw: &str) -> Option<VideoId> {
    URL_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> Option<String> {
        extract(raw).map(|v| v.to_string())
    }

    #[test]
    fn watch_page_url() {
        assert_eq!(
            id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn short_link() {
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(id("youtu.be/abc12345678").as_deref(), Some("abc12345678"));
    }

    #[test]
    fn embed_paths() {
        assert_eq!(
            id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(id("youtube.com/v/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(id("http://youtube.com/e/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            id("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn v_param_after_other_params() {
        assert_eq!(
            id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn nested_path() {
        assert_eq!(
            id("https://www.youtube.com/user/SomeChannel/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn surrounding_text_is_tolerated() {
        assert_eq!(
            id("look at this https://youtu.be/dQw4w9WgXcQ !!").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(id("https://youtu.be/DQW4W9WGXCQ").as_deref(), Some("DQW4W9WGXCQ"));
    }

    #[test]
    fn no_shape_yields_none() {
        assert_eq!(id(""), None);
        assert_eq!(id("hello world"), None);
        assert_eq!(id("https://example.com/watch?v=dQw4w9WgXcQ"), None);
    }

    #[test]
    fn bare_token_is_not_matched() {
        assert_eq!(id("dQw4w9WgXcQ"), None);
    }

    #[test]
    fn too_short_yields_none() {
        assert_eq!(id("youtu.be/abc"), None);
        assert_eq!(id("https://www.youtube.com/watch?v=dQw4w9WgXc"), None);
    }

    #[test]
    fn extract_is_idempotent() {
        let raw = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        assert_eq!(extract(raw), extract(raw));
    }

    #[test]
    fn parse_validates_bare_tokens() {
        assert!(VideoId::parse("dQw4w9WgXcQ").is_ok());
        assert!(VideoId::parse("abc-_123XYZ").is_ok());
        assert!(VideoId::parse("too-short").is_err());
        assert!(VideoId::parse("has space!!").is_err());
        assert!("dQw4w9WgXcQ".parse::<VideoId>().is_ok());
    }

    #[test]
    fn watch_url_round_trips_through_extract() {
        let v = VideoId::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(v.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(extract(&v.watch_url()), Some(v));
    }
}
