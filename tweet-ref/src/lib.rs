use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};
use thiserror::Error as ThisError;
use urlencoding::decode;

pub const STATUS_URL_BASE: &str = "https://twitter.com";

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefError {
    #[error("Does not match as {ref_type}: {input}")]
    BadFormat {
        ref_type: &'static str,
        input: String,
    },
    #[error("No file name in media url: {0}")]
    NoFileName(String),
    #[error("No file extension in media url: {0}")]
    NoExtension(String),
}

/// Numeric tweet id, as found in `id_str`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct TweetRef(String);

impl TweetRef {
    pub fn from_string(string: String) -> Result<Self, RefError> {
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Tweet",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^[0-9]+$").unwrap();
        }
        &RE
    }

    pub fn is_match(string: &str) -> bool {
        Self::single_regex().is_match(string)
    }
}

impl TryFrom<String> for TweetRef {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TweetRef::from_string(value)
    }
}

impl From<TweetRef> for String {
    fn from(value: TweetRef) -> String {
        value.0
    }
}

impl fmt::Display for TweetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric account (user) id, as found in `accountId` and `in_reply_to_user_id_str`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountRef(String);

impl AccountRef {
    pub fn from_string(string: String) -> Result<Self, RefError> {
        if !Self::is_match(string.as_str()) {
            Err(RefError::BadFormat {
                ref_type: "Account",
                input: string,
            })
        } else {
            Ok(Self(string))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(string: &str) -> bool {
        // same shape as tweet ids
        TweetRef::is_match(string)
    }
}

impl TryFrom<String> for AccountRef {
    type Error = RefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountRef::from_string(value)
    }
}

impl From<AccountRef> for String {
    fn from(value: AccountRef) -> String {
        value.0
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A status permalink: `https://twitter.com/<user>/status/<id>`.
///
/// `user` is either a screen name or a numeric account id, both resolve on
/// twitter.com.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusUrl {
    pub user: String,
    pub tweet_ref: TweetRef,
}

impl StatusUrl {
    pub fn new(user: impl Into<String>, tweet_ref: TweetRef) -> Self {
        Self {
            user: user.into(),
            tweet_ref,
        }
    }

    pub fn from_string(string: &str) -> Result<Self, RefError> {
        let caps = Self::single_regex()
            .captures(string)
            .ok_or_else(|| RefError::BadFormat {
                ref_type: "Status",
                input: string.to_string(),
            })?;
        let user = caps["user"].to_string();
        let tweet_ref = TweetRef::from_string(caps["id"].to_string())?;
        Ok(Self { user, tweet_ref })
    }

    // twitter.com and x.com, with or without www./mobile.; trailing query or
    // path (e.g. /photo/1) allowed
    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex = Regex::new(
                r"^https?://(?:www\.|mobile\.)?(?:twitter|x)\.com/(?P<user>[A-Za-z0-9_]+)/status(?:es)?/(?P<id>[0-9]+)(?:[/?#].*)?$"
            )
            .unwrap();
        }
        &RE
    }

    pub fn is_match(string: &str) -> bool {
        Self::single_regex().is_match(string)
    }

    /// Whether this permalink belongs to the given account, by id or by
    /// (case-insensitive) screen name.
    pub fn is_by(&self, account_ref: &AccountRef, username: &str) -> bool {
        self.user == account_ref.as_str() || self.user.eq_ignore_ascii_case(username)
    }
}

impl fmt::Display for StatusUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/status/{}", STATUS_URL_BASE, self.user, self.tweet_ref)
    }
}

/// The file name part of a media url, split into stem and extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaFile {
    stem: String,
    extension: String,
}

impl MediaFile {
    pub fn from_url(url: &str) -> Result<Self, RefError> {
        let without_query = url.split(['?', '#']).next().unwrap_or(url);
        let segment = without_query
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| RefError::NoFileName(url.to_string()))?;
        let name = decode(segment)
            .map(|name| name.into_owned())
            .unwrap_or_else(|_| segment.to_string());

        let caps = Self::single_regex()
            .captures(name.as_str())
            .ok_or_else(|| RefError::NoExtension(url.to_string()))?;

        Ok(Self {
            stem: caps["stem"].to_string(),
            extension: caps["ext"].to_string(),
        })
    }

    pub fn single_regex() -> &'static Regex {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(r"^(?P<stem>[^/]+)\.(?P<ext>[A-Za-z0-9]+)$").unwrap();
        }
        &RE
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn with_extension(&self, extension: &str) -> Self {
        Self {
            stem: self.stem.clone(),
            extension: extension.to_string(),
        }
    }

    /// Name of the file as the archive stores it next to its tweet:
    /// `<owner id>-<file name>`.
    pub fn to_archive_name(&self, owner: &str) -> String {
        format!("{}-{}", owner, self)
    }
}

impl fmt::Display for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stem, self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_tweet_id() {
        assert!(TweetRef::is_match("1050118621198921728"));
        assert!(!TweetRef::is_match("10501186211989x"));
        assert!(!TweetRef::is_match(""));
    }

    #[test]
    fn test_tweet_ref_rejects_bad_format() {
        assert_eq!(
            TweetRef::from_string("abc".to_string()),
            Err(RefError::BadFormat {
                ref_type: "Tweet",
                input: "abc".to_string()
            })
        );
    }

    #[test]
    fn test_parse_status_url() {
        let status =
            StatusUrl::from_string("https://twitter.com/jack/status/20").unwrap();
        assert_eq!(status.user, "jack");
        assert_eq!(status.tweet_ref.as_str(), "20");
    }

    #[test]
    fn test_parse_status_url_variants() {
        for url in [
            "http://twitter.com/jack/status/20",
            "https://www.twitter.com/jack/status/20",
            "https://mobile.twitter.com/jack/status/20",
            "https://x.com/jack/status/20",
            "https://twitter.com/jack/statuses/20",
            "https://twitter.com/jack/status/20/photo/1",
            "https://twitter.com/jack/status/20?s=21",
        ] {
            let status = StatusUrl::from_string(url).unwrap();
            assert_eq!(status.tweet_ref.as_str(), "20", "{}", url);
        }
    }

    #[test]
    fn test_status_url_rejects_other_urls() {
        assert!(!StatusUrl::is_match("https://example.com/jack/status/20"));
        assert!(!StatusUrl::is_match("https://twitter.com/jack"));
        assert!(!StatusUrl::is_match("https://twitter.com/jack/status/abc"));
    }

    #[test]
    fn test_status_url_is_by() {
        let account_ref = AccountRef::from_string("12".to_string()).unwrap();
        let by_id = StatusUrl::from_string("https://twitter.com/12/status/20").unwrap();
        let by_name = StatusUrl::from_string("https://twitter.com/Jack/status/20").unwrap();
        let other = StatusUrl::from_string("https://twitter.com/jill/status/20").unwrap();
        assert!(by_id.is_by(&account_ref, "jack"));
        assert!(by_name.is_by(&account_ref, "jack"));
        assert!(!other.is_by(&account_ref, "jack"));
    }

    #[test]
    fn test_status_url_to_string() {
        let status = StatusUrl::new("12", TweetRef::from_string("20".to_string()).unwrap());
        assert_eq!(status.to_string(), "https://twitter.com/12/status/20");
    }

    #[test]
    fn test_media_file_from_url() {
        let media = MediaFile::from_url("http://pbs.twimg.com/media/DpOXMbGU0AA9_Mt.jpg").unwrap();
        assert_eq!(media.stem(), "DpOXMbGU0AA9_Mt");
        assert_eq!(media.extension(), "jpg");
        assert_eq!(media.to_archive_name("20"), "20-DpOXMbGU0AA9_Mt.jpg");
    }

    #[test]
    fn test_media_file_drops_query() {
        let media = MediaFile::from_url(
            "https://video.twimg.com/ext_tw_video/1/pu/vid/480x270/Ab-c.mp4?tag=12",
        )
        .unwrap();
        assert_eq!(media.to_string(), "Ab-c.mp4");
    }

    #[test]
    fn test_media_file_with_extension() {
        let media = MediaFile::from_url("https://video.twimg.com/tweet_video/Xyz.mp4").unwrap();
        assert_eq!(media.with_extension("gif").to_string(), "Xyz.gif");
    }

    #[test]
    fn test_media_file_errors() {
        assert_eq!(
            MediaFile::from_url("http://pbs.twimg.com/media/"),
            Err(RefError::NoFileName("http://pbs.twimg.com/media/".to_string()))
        );
        assert_eq!(
            MediaFile::from_url("http://pbs.twimg.com/media/noext"),
            Err(RefError::NoExtension(
                "http://pbs.twimg.com/media/noext".to_string()
            ))
        );
    }
}
