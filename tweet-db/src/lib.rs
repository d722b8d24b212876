use log::{debug, info, trace};
use serde::de::DeserializeOwned;
use std::{
    collections::HashSet,
    fs::read_to_string,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;
use tweet_msg::{Account, AccountRecord, Profile, ProfileRecord, Tweet, TweetRecord};
use tweet_ref::TweetRef;

const YTD_PREFIX: &str = "window.YTD.";

// current archives first, then the pre-2020 name
const TWEET_FILE_STEMS: [&str; 2] = ["tweets", "tweet"];

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Failed to read file {path:?}, cause: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No tweets file found in {0:?}")]
    MissingTweets(PathBuf),
    #[error("File {0:?} does not start with a window.YTD assignment")]
    NoAssignment(PathBuf),
    #[error("Json error in {path:?}, cause: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("File {0:?} holds no records")]
    Empty(PathBuf),
    #[error("Tweet {0} appears more than once in the archive")]
    DuplicateTweet(TweetRef),
}

/// Everything read from an archive directory, owned and immutable once loaded.
#[derive(Clone, Debug)]
pub struct Archive {
    pub account: Account,
    pub profile: Profile,
    pub tweets: Vec<Tweet>,
}

impl Archive {
    /// Load `data/account.js`, `data/profile.js` and every tweets part from
    /// the archive rooted at `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let data_dir = dir.as_ref().join("data");
        info!("loading archive from {:?}", data_dir);

        let account = first_record::<AccountRecord>(&data_dir.join("account.js"))?.account;
        debug!("account: {:?}", account);

        let profile = first_record::<ProfileRecord>(&data_dir.join("profile.js"))?.profile;
        debug!("profile: {:?}", profile);

        let tweets = load_tweets(&data_dir)?;
        info!("loaded {} tweets", tweets.len());

        Ok(Self {
            account,
            profile,
            tweets,
        })
    }
}

fn load_tweets(data_dir: &Path) -> Result<Vec<Tweet>, Error> {
    let stem = TWEET_FILE_STEMS
        .iter()
        .find(|stem| data_dir.join(format!("{}.js", stem)).is_file())
        .ok_or_else(|| Error::MissingTweets(data_dir.to_path_buf()))?;

    let first_path = data_dir.join(format!("{}.js", stem));
    let mut paths = vec![first_path.clone()];
    let mut part = 1;
    loop {
        let path = data_dir.join(format!("{}-part{}.js", stem, part));
        if !path.is_file() {
            break;
        }
        paths.push(path);
        part += 1;
    }

    let mut seen: HashSet<TweetRef> = HashSet::new();
    let mut tweets: Vec<Tweet> = Vec::new();
    for path in paths {
        let records: Vec<TweetRecord> = read_records(&path)?;
        trace!("read {} tweets from {:?}", records.len(), path);
        for TweetRecord { tweet } in records {
            if !seen.insert(tweet.id_str.clone()) {
                return Err(Error::DuplicateTweet(tweet.id_str));
            }
            tweets.push(tweet);
        }
    }

    if tweets.is_empty() {
        return Err(Error::Empty(first_path));
    }
    Ok(tweets)
}

fn first_record<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    read_records::<T>(path)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Empty(path.to_path_buf()))
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, Error> {
    trace!("reading {:?}", path);
    let content = read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(path, &content)
}

/// Parse the body of an archive data file: `window.YTD.<name>.part<n> = [..]`.
pub fn parse_records<T: DeserializeOwned>(path: &Path, content: &str) -> Result<Vec<T>, Error> {
    let content = content.trim_start_matches('\u{feff}');
    let (assignment, json) = content
        .split_once('=')
        .ok_or_else(|| Error::NoAssignment(path.to_path_buf()))?;
    if !assignment.trim().starts_with(YTD_PREFIX) {
        return Err(Error::NoAssignment(path.to_path_buf()));
    }

    serde_json::from_str(json.trim().trim_end_matches(';')).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}
