use axohtml::{
    dom::DOMTree,
    elements::{div, li, ol, FlowContent},
    html, text, unsafe_text,
};
use log::{debug, info, trace};
use std::{io, io::Write, path::PathBuf};
use thiserror::Error as ThisError;
use tweet_msg::{display_date, timestamp_id, Account, MediaEntity, MediaKind, Profile, Tweet, UrlEntity};
use tweet_ref::{MediaFile, RefError, StatusUrl, TweetRef};
use tweet_text::{resolve, to_html, Replacement};
use tweet_threads::{Index, Post, Thread};

mod style;
pub use style::Classes;

pub const DEFAULT_STYLE_PREFIX: &str = "twitter";

// extension of animated gifs after converting the archive's mp4s
const ANIMATED_GIF_EXTENSION: &str = "gif";

// user part of a status url when the screen name is unknown
const ANONYMOUS_USER: &str = "i";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Bad media reference in tweet {tweet_ref}: {source}")]
    Media {
        tweet_ref: TweetRef,
        #[source]
        source: RefError,
    },
    #[error("Bad avatar reference: {0}")]
    Avatar(#[source] RefError),
    #[error("Failed to assemble thread: {0}")]
    Thread(#[from] tweet_threads::Error),
    #[error("Failed to write document: {0}")]
    Write(#[source] io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Archive directory, used as the base of media and avatar paths.
    pub base_dir: PathBuf,
    /// Show the external reply target and a permalink to each tweet.
    pub link: bool,
    pub timestamp_ids: bool,
    pub video_posters: bool,
    pub animated_gifs: bool,
    pub style_prefix: String,
    pub started_by_account: bool,
    pub started_with_media: bool,
    /// Only render threads whose root has one of these ids. Empty means all.
    pub ids: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            link: false,
            timestamp_ids: false,
            video_posters: false,
            animated_gifs: false,
            style_prefix: DEFAULT_STYLE_PREFIX.to_string(),
            started_by_account: false,
            started_with_media: false,
            ids: Vec::new(),
        }
    }
}

/// Where a media entity lives in the archive, and how to show it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaSource {
    Image { src: String },
    Video { src: String, poster: Option<String> },
}

pub struct Renderer<'a> {
    config: &'a Config,
    account: &'a Account,
    index: &'a Index,
    classes: Classes,
    avatar: Option<String>,
}

impl<'a> Renderer<'a> {
    pub fn new(
        config: &'a Config,
        account: &'a Account,
        profile: &Profile,
        index: &'a Index,
    ) -> Result<Self, Error> {
        let avatar = match &profile.avatar_media_url {
            Some(url) => {
                let file = MediaFile::from_url(url).map_err(Error::Avatar)?;
                let name = file.to_archive_name(account.account_id.as_str());
                Some(archive_path(config, "profile_media", &name))
            }
            None => None,
        };

        Ok(Self {
            config,
            account,
            index,
            classes: Classes::new(&config.style_prefix),
            avatar,
        })
    }

    /// Identifier shown in the header and matched against `Config::ids`.
    pub fn display_id(&self, post: &Post) -> String {
        if self.config.timestamp_ids {
            timestamp_id(&post.date)
        } else {
            post.tweet_ref().to_string()
        }
    }

    pub fn render_tweet(&self, post: &Post) -> Result<Box<div<String>>, Error> {
        self.render_post(post, &[])
    }

    fn render_post(&self, post: &Post, ancestors: &[&TweetRef]) -> Result<Box<div<String>>, Error> {
        let tweet = &post.tweet;
        let tweet_ref = post.tweet_ref();
        let mut chain: Vec<&TweetRef> = ancestors.to_vec();
        chain.push(tweet_ref);

        let mut tokens: Vec<(&str, Replacement)> = Vec::new();

        let mut quotes: Vec<Box<div<String>>> = Vec::new();
        for url in tweet.urls() {
            match self.self_quote(url, &chain) {
                Some(quoted) => {
                    trace!("{} quotes {}", tweet_ref, quoted.tweet_ref());
                    quotes.push(self.render_post(quoted, &chain)?);
                    tokens.push((url.url.as_str(), Replacement::Strip));
                }
                None => tokens.push((
                    url.url.as_str(),
                    Replacement::Link {
                        href: url.expanded_url.clone(),
                        text: url.expanded_url.clone(),
                    },
                )),
            }
        }

        let mut media: Vec<Box<dyn FlowContent<String>>> = Vec::new();
        for entity in tweet.media() {
            let source = self
                .media_source(tweet_ref, entity)
                .map_err(|source| Error::Media {
                    tweet_ref: tweet_ref.clone(),
                    source,
                })?;
            media.push(self.render_media(&source));
            tokens.push((entity.url.as_str(), Replacement::Strip));
        }

        let body_html = to_html(&resolve(&tweet.full_text, tokens));

        let tweet_class = self.classes.tweet();
        let header_class = self.classes.part("header");
        let displayname_class = self.classes.part("displayname");
        let username_class = self.classes.part("username");
        let timestamp_class = self.classes.part("timestamp");
        let id_class = self.classes.part("id");
        let body_class = self.classes.part("body");

        let display_name = &self.account.account_display_name;
        let username = &self.account.username;
        let date = display_date(&post.date);
        let display_id = self.display_id(post);

        let avatar = self.render_avatar();
        let reply = self.render_reply(tweet);
        let media_block = self.render_media_block(media);
        let quotes_block = self.render_quotes_block(quotes);
        let original = self.render_original(tweet_ref);

        Ok(html!(
            <div class=tweet_class.as_str()>
                { avatar }
                <div class=header_class.as_str()>
                    <span class=displayname_class.as_str()>{ text!("{}", display_name) }</span>
                    { text!(" ") }
                    <span class=username_class.as_str()>{ text!("@{}", username) }</span>
                    { text!(" • ") }
                    <span class=timestamp_class.as_str()>{ text!("{}", date) }</span>
                    { text!(" ") }
                    <span class=id_class.as_str()>{ text!("{}", display_id) }</span>
                </div>
                { reply }
                <div class=body_class.as_str()>
                    { unsafe_text!(body_html) }
                </div>
                { media_block }
                { quotes_block }
                { original }
            </div>
        ))
    }

    // a link to another loaded tweet by this account, not already being rendered
    fn self_quote(&self, url: &UrlEntity, chain: &[&TweetRef]) -> Option<&'a Post> {
        let status = StatusUrl::from_string(&url.expanded_url).ok()?;
        if !status.is_by(&self.account.account_id, &self.account.username) {
            return None;
        }
        if chain.contains(&&status.tweet_ref) {
            debug!("{} quotes itself, rendering as a link", status.tweet_ref);
            return None;
        }
        self.index.get(&status.tweet_ref)
    }

    pub fn media_source(
        &self,
        tweet_ref: &TweetRef,
        media: &MediaEntity,
    ) -> Result<MediaSource, RefError> {
        let source = match media.kind {
            MediaKind::Photo | MediaKind::Unknown => MediaSource::Image {
                src: self.media_path(tweet_ref, &MediaFile::from_url(&media.media_url)?),
            },
            MediaKind::Video => MediaSource::Video {
                src: self.media_path(tweet_ref, &video_file(media)?),
                poster: self.poster(tweet_ref, media)?,
            },
            MediaKind::AnimatedGif => {
                let file = video_file(media)?;
                if self.config.animated_gifs {
                    MediaSource::Image {
                        src: self.media_path(
                            tweet_ref,
                            &file.with_extension(ANIMATED_GIF_EXTENSION),
                        ),
                    }
                } else {
                    MediaSource::Video {
                        src: self.media_path(tweet_ref, &file),
                        poster: self.poster(tweet_ref, media)?,
                    }
                }
            }
        };
        Ok(source)
    }

    fn poster(&self, tweet_ref: &TweetRef, media: &MediaEntity) -> Result<Option<String>, RefError> {
        if !self.config.video_posters {
            return Ok(None);
        }
        let file = MediaFile::from_url(&media.media_url)?;
        Ok(Some(self.media_path(tweet_ref, &file)))
    }

    fn media_path(&self, tweet_ref: &TweetRef, file: &MediaFile) -> String {
        archive_path(
            self.config,
            "tweets_media",
            &file.to_archive_name(tweet_ref.as_str()),
        )
    }

    fn render_avatar(&self) -> Option<Box<div<String>>> {
        let avatar_class = self.classes.part("avatar");
        self.avatar.as_ref().map(|avatar| {
            html!(
                <div class=avatar_class.as_str()>
                    <img src=avatar.as_str() alt=""/>
                </div>
            )
        })
    }

    // replies to tweets outside the archive link to the original
    fn reply_url(&self, tweet: &Tweet) -> Option<String> {
        let parent_ref = tweet.in_reply_to_status_id_str.as_ref()?;
        if self.index.contains(parent_ref) {
            return None;
        }
        let user = tweet
            .in_reply_to_screen_name
            .as_deref()
            .unwrap_or(ANONYMOUS_USER);
        Some(StatusUrl::new(user, parent_ref.clone()).to_string())
    }

    fn render_reply(&self, tweet: &Tweet) -> Option<Box<div<String>>> {
        if !self.config.link {
            return None;
        }
        let reply_url = self.reply_url(tweet)?;
        let reply_class = self.classes.part("reply");
        let replyid_class = self.classes.part("replyid");
        Some(html!(
            <div class=reply_class.as_str()>
                { text!("↩️ ") }
                <span class=replyid_class.as_str()>
                    <a href=reply_url.as_str()>{ text!("{}", reply_url) }</a>
                </span>
            </div>
        ))
    }

    fn render_media(&self, source: &MediaSource) -> Box<dyn FlowContent<String>> {
        match source {
            MediaSource::Image { src } => {
                let img_class = self.classes.part("img");
                html!(<img class=img_class.as_str() src=src.as_str() alt=""/>)
            }
            MediaSource::Video { src, poster } => {
                let video_class = self.classes.part("video");
                match poster {
                    Some(poster) => html!(
                        <video class=video_class.as_str() src=src.as_str() poster=poster.as_str() controls=true></video>
                    ),
                    None => html!(
                        <video class=video_class.as_str() src=src.as_str() controls=true></video>
                    ),
                }
            }
        }
    }

    fn render_media_block(
        &self,
        media: Vec<Box<dyn FlowContent<String>>>,
    ) -> Option<Box<div<String>>> {
        if media.is_empty() {
            return None;
        }
        let media_class = self.classes.part("media");
        Some(html!(<div class=media_class.as_str()>{ media }</div>))
    }

    // quoted tweets in the order they are linked
    fn render_quotes_block(&self, quotes: Vec<Box<div<String>>>) -> Option<Box<ol<String>>> {
        if quotes.is_empty() {
            return None;
        }
        let items: Vec<Box<li<String>>> = quotes
            .into_iter()
            .map(|quote| html!(<li>{ quote }</li>))
            .collect();
        let quotes_class = self.classes.part("quotes");
        Some(html!(<ol class=quotes_class.as_str()>{ items }</ol>))
    }

    fn render_original(&self, tweet_ref: &TweetRef) -> Option<Box<div<String>>> {
        if !self.config.link {
            return None;
        }
        let original_url = StatusUrl::new(self.account.account_id.as_str(), tweet_ref.clone()).to_string();
        let original_class = self.classes.part("original");
        Some(html!(
            <div class=original_class.as_str()>
                { text!("• ") }
                <a href=original_url.as_str()>{ text!("{}", original_url) }</a>
                { text!(" •") }
            </div>
        ))
    }

    pub fn render_thread(&self, thread: &Thread) -> Result<Box<div<String>>, Error> {
        let posts = thread
            .iter()
            .map(|post| self.render_tweet(post))
            .collect::<Result<Vec<Box<div<String>>>, Error>>()?;
        let thread_class = self.classes.part("thread");
        Ok(html!(<div class=thread_class.as_str()>{ posts }</div>))
    }

    fn is_selected(&self, root: &Post) -> bool {
        let Config {
            ids,
            started_by_account,
            started_with_media,
            ..
        } = self.config;

        if !ids.is_empty() && !ids.contains(&self.display_id(root)) {
            trace!("skipping {}: not in selected ids", root.tweet_ref());
            return false;
        }
        if *started_by_account && root.tweet.is_reply() {
            debug!("skipping {}: thread starts with a reply", root.tweet_ref());
            return false;
        }
        if *started_with_media && !root.tweet.has_media() {
            debug!("skipping {}: thread starts without media", root.tweet_ref());
            return false;
        }
        true
    }

    /// Threads that pass every filter, in chronological root order.
    pub fn selected_threads(&self) -> Result<Vec<Thread<'a>>, Error> {
        let mut threads: Vec<Thread<'a>> = Vec::new();
        for root in self.index.roots() {
            if self.is_selected(root) {
                threads.push(self.index.thread(root.tweet_ref())?);
            }
        }
        info!("rendering {} threads", threads.len());
        Ok(threads)
    }

    pub fn render_list(&self) -> Result<DOMTree<String>, Error> {
        let mut items: Vec<Box<li<String>>> = Vec::new();
        for thread in self.selected_threads()? {
            let label = self.display_id(thread.root());
            let thread_html = self.render_thread(&thread)?;
            items.push(html!(
                <li>
                    { text!("THREAD {}", label) }
                    { thread_html }
                </li>
            ));
        }
        Ok(html!(<ul>{ items }</ul>))
    }

    /// The whole page. Nothing is returned unless every thread rendered.
    pub fn render_document(&self) -> Result<String, Error> {
        let list = self.render_list()?;
        Ok(format!(
            "<!doctype html>\n<html>\n <head>\n  <meta charset='utf-8'>\n  <style>\n{}\n  </style>\n </head>\n <body>\n{}\n </body>\n</html>\n",
            self.classes.stylesheet(),
            list
        ))
    }
}

fn video_file(media: &MediaEntity) -> Result<MediaFile, RefError> {
    let url = media
        .best_video_variant()
        .map(|variant| variant.url.as_str())
        .unwrap_or(media.media_url.as_str());
    MediaFile::from_url(url)
}

fn archive_path(config: &Config, folder: &str, name: &str) -> String {
    config
        .base_dir
        .join("data")
        .join(folder)
        .join(name)
        .display()
        .to_string()
}

pub fn write_document(writer: &mut impl Write, document: &str) -> Result<(), Error> {
    writer
        .write_all(document.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(Error::Write)
}
