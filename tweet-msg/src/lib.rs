use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError, DisplayFromStr, PickFirst};
use thiserror::Error as ThisError;
use tweet_ref::{AccountRef, TweetRef};

pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
pub const DISPLAY_DATE_FORMAT: &str = "%a %b %d %Y";

#[derive(Debug, ThisError)]
pub enum MsgError {
    #[error("Failed to parse created_at {input:?} of tweet {tweet_ref}: {source}")]
    CreatedAt {
        tweet_ref: TweetRef,
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}

// account.js: [{ "account": { .. } }]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccountRecord {
    pub account: Account,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: AccountRef,
    pub username: String,
    pub account_display_name: String,
}

// profile.js: [{ "profile": { .. } }]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProfileRecord {
    pub profile: Profile,
}

#[serde_as]
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub avatar_media_url: Option<String>,
}

// tweets.js: [{ "tweet": { .. } }]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TweetRecord {
    pub tweet: Tweet,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Tweet {
    pub id_str: TweetRef,
    #[serde(default)]
    pub in_reply_to_status_id_str: Option<TweetRef>,
    #[serde(default)]
    pub in_reply_to_user_id_str: Option<AccountRef>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub in_reply_to_screen_name: Option<String>,
    pub created_at: String,
    #[serde(alias = "text")]
    pub full_text: String,
    #[serde(default)]
    pub entities: Entities,
    #[serde(default)]
    pub extended_entities: Option<ExtendedEntities>,
}

impl Tweet {
    pub fn parse_created_at(&self) -> Result<DateTime<Utc>, MsgError> {
        DateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT)
            .map(|date| date.with_timezone(&Utc))
            .map_err(|source| MsgError::CreatedAt {
                tweet_ref: self.id_str.clone(),
                input: self.created_at.clone(),
                source,
            })
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to_status_id_str.is_some()
    }

    pub fn urls(&self) -> &[UrlEntity] {
        &self.entities.urls
    }

    pub fn media(&self) -> &[MediaEntity] {
        self.extended_entities
            .as_ref()
            .map(|extended| extended.media.as_slice())
            .unwrap_or_default()
    }

    pub fn has_media(&self) -> bool {
        !self.media().is_empty()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UrlEntity {
    /// Shortened token as it appears in the text.
    pub url: String,
    pub expanded_url: String,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub display_url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<MediaEntity>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MediaEntity {
    /// Shortened token as it appears in the text.
    pub url: String,
    pub media_url: String,
    #[serde(default)]
    pub media_url_https: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

impl MediaEntity {
    /// Highest bitrate mp4 variant, which is the one the archive keeps.
    pub fn best_video_variant(&self) -> Option<&VideoVariant> {
        self.video_info
            .as_ref()?
            .variants
            .iter()
            .filter(|variant| variant.is_mp4())
            .max_by_key(|variant| variant.bitrate.unwrap_or(0))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Photo,
    Video,
    AnimatedGif,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub variants: Vec<VideoVariant>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VideoVariant {
    // archives store bitrate as a string
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    pub url: String,
}

impl VideoVariant {
    pub fn is_mp4(&self) -> bool {
        match &self.content_type {
            Some(content_type) => content_type == "video/mp4",
            None => self.url.split('?').next().unwrap_or("").ends_with(".mp4"),
        }
    }
}

/// Identifier derived from a timestamp alone: the ISO 8601 form with every
/// separator removed, e.g. `20181010201924000`.
pub fn timestamp_id(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

pub fn display_date(date: &DateTime<Utc>) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}
