use chrono::{DateTime, Utc};
use log::{debug, info, trace};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use tweet_msg::{MsgError, Tweet};
use tweet_ref::{AccountRef, TweetRef};

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Failed to index tweet, cause: {0}")]
    Date(#[from] MsgError),
    #[error("Tweet {0} appears more than once")]
    DuplicateTweet(TweetRef),
    #[error("Tweet {0} is not indexed")]
    UnknownTweet(TweetRef),
    #[error("Thread starting at {root} is longer than the {limit} indexed tweets")]
    Cycle { root: TweetRef, limit: usize },
}

/// A tweet together with its parsed timestamp.
#[derive(Clone, Debug)]
pub struct Post {
    pub tweet: Tweet,
    pub date: DateTime<Utc>,
}

impl Post {
    pub fn tweet_ref(&self) -> &TweetRef {
        &self.tweet.id_str
    }
}

/// A root post followed by its chain of direct self-replies.
#[derive(Clone, Debug)]
pub struct Thread<'a> {
    posts: Vec<&'a Post>,
}

impl<'a> Thread<'a> {
    pub fn root(&self) -> &'a Post {
        self.posts[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Post> + '_ {
        self.posts.iter().copied()
    }
}

/// Tweets sorted by date, looked up by id, and linked into threads.
///
/// Each post has at most one successor. When a post was replied to by the
/// account more than once, the chronologically last reply wins and the
/// earlier ones are no longer reachable.
#[derive(Clone, Debug)]
pub struct Index {
    posts: Vec<Post>,
    by_ref: HashMap<TweetRef, usize>,
    next: Vec<Option<usize>>,
    roots: Vec<usize>,
    dropped: Vec<usize>,
}

impl Index {
    pub fn build(tweets: Vec<Tweet>, account_ref: &AccountRef) -> Result<Self, Error> {
        let mut posts = tweets
            .into_iter()
            .map(|tweet| {
                let date = tweet.parse_created_at()?;
                Ok(Post { tweet, date })
            })
            .collect::<Result<Vec<Post>, Error>>()?;

        // stable: equal dates keep archive order
        posts.sort_by_key(|post| post.date);

        let mut by_ref: HashMap<TweetRef, usize> = HashMap::with_capacity(posts.len());
        for (position, post) in posts.iter().enumerate() {
            if by_ref.insert(post.tweet_ref().clone(), position).is_some() {
                return Err(Error::DuplicateTweet(post.tweet_ref().clone()));
            }
        }

        let mut next: Vec<Option<usize>> = vec![None; posts.len()];
        let mut roots: Vec<usize> = Vec::new();
        let mut dropped: Vec<usize> = Vec::new();

        for (position, post) in posts.iter().enumerate() {
            let tweet = &post.tweet;
            match &tweet.in_reply_to_status_id_str {
                Some(parent_ref)
                    if tweet.in_reply_to_user_id_str.as_ref() == Some(account_ref) =>
                {
                    if let Some(&parent) = by_ref.get(parent_ref) {
                        trace!("{} -> {}", tweet.id_str, parent_ref);
                        next[parent] = Some(position);
                    } else {
                        debug!(
                            "dropping {}: replies to {} which is not in the archive",
                            tweet.id_str, parent_ref
                        );
                        dropped.push(position);
                    }
                }
                _ => {
                    trace!("{}", tweet.id_str);
                    roots.push(position);
                }
            }
        }
        info!("found {} threads", roots.len());

        Ok(Self {
            posts,
            by_ref,
            next,
            roots,
            dropped,
        })
    }

    pub fn get(&self, tweet_ref: &TweetRef) -> Option<&Post> {
        self.by_ref.get(tweet_ref).map(|&position| &self.posts[position])
    }

    pub fn contains(&self, tweet_ref: &TweetRef) -> bool {
        self.by_ref.contains_key(tweet_ref)
    }

    /// All posts, oldest first.
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter()
    }

    /// Thread roots, oldest first.
    pub fn roots(&self) -> impl Iterator<Item = &Post> {
        self.roots.iter().map(|&position| &self.posts[position])
    }

    /// Replies whose parent is outside the archive. They belong to no thread.
    pub fn dropped(&self) -> impl Iterator<Item = &Post> {
        self.dropped.iter().map(|&position| &self.posts[position])
    }

    pub fn next_in_thread(&self, tweet_ref: &TweetRef) -> Option<&Post> {
        let position = *self.by_ref.get(tweet_ref)?;
        self.next[position].map(|next| &self.posts[next])
    }

    /// Follow the reply chain from `root` until it ends.
    pub fn thread(&self, root: &TweetRef) -> Result<Thread<'_>, Error> {
        let limit = self.posts.len();
        let mut position = *self
            .by_ref
            .get(root)
            .ok_or_else(|| Error::UnknownTweet(root.clone()))?;

        let mut posts = vec![&self.posts[position]];
        while let Some(next) = self.next[position] {
            if posts.len() >= limit {
                return Err(Error::Cycle {
                    root: root.clone(),
                    limit,
                });
            }
            posts.push(&self.posts[next]);
            position = next;
        }

        Ok(Thread { posts })
    }

    /// Every thread, in root order.
    pub fn threads(&self) -> impl Iterator<Item = Result<Thread<'_>, Error>> {
        self.roots().map(move |root| self.thread(root.tweet_ref()))
    }
}
