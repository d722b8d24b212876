use anyhow::{Context, Result};
use clap::Parser;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use std::{
    fs::File,
    io::{stdout, BufWriter},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;
use tweet_db::Archive;
use tweet_pages::{write_document, Config, Renderer, DEFAULT_STYLE_PREFIX};
use tweet_threads::Index;

/// Render the threads of a Twitter archive as a single static HTML page
#[derive(Parser, Debug)]
#[command(name = "tweet-archive")]
#[command(version)]
pub struct Args {
    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Archive directory, the one holding `data/`
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Show reply targets outside the archive and a permalink to each tweet
    #[arg(short, long)]
    pub link: bool,

    /// Identify tweets by their timestamp instead of their id
    #[arg(short, long)]
    pub timestamp_ids: bool,

    /// Give videos their thumbnail as a poster
    #[arg(long)]
    pub video_posters: bool,

    /// Show animated gifs as `.gif` images instead of videos
    #[arg(long)]
    pub animated_gifs: bool,

    /// Prefix of every CSS class in the page
    #[arg(long, default_value = DEFAULT_STYLE_PREFIX, value_parser = parse_style_prefix)]
    pub style_prefix: String,

    /// Only threads started by the account itself, not replies to others
    #[arg(long)]
    pub started_by_account: bool,

    /// Only threads whose first tweet has media
    #[arg(long)]
    pub started_with_media: bool,

    /// Write the page here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only these threads, by the id of their first tweet
    pub ids: Vec<String>,
}

impl Args {
    pub fn config(&self) -> Config {
        Config {
            base_dir: self.dir.clone(),
            link: self.link,
            timestamp_ids: self.timestamp_ids,
            video_posters: self.video_posters,
            animated_gifs: self.animated_gifs,
            style_prefix: self.style_prefix.clone(),
            started_by_account: self.started_by_account,
            started_with_media: self.started_with_media,
            ids: self.ids.clone(),
        }
    }
}

fn style_prefix_regex() -> &'static Regex {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").unwrap();
    }
    &RE
}

fn parse_style_prefix(prefix: &str) -> Result<String, String> {
    if style_prefix_regex().is_match(prefix) {
        Ok(prefix.to_string())
    } else {
        Err(format!(
            "{:?} is not a CSS class name: use a letter, then letters, digits, '-' or '_'",
            prefix
        ))
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load, index and render, entirely in memory.
pub fn render(args: &Args) -> Result<String> {
    let archive = Archive::load(&args.dir)
        .with_context(|| format!("Failed to load archive from {:?}", args.dir))?;
    let Archive {
        account,
        profile,
        tweets,
    } = archive;

    let index = Index::build(tweets, &account.account_id).context("Failed to index tweets")?;

    let config = args.config();
    let renderer = Renderer::new(&config, &account, &profile, &index)
        .context("Failed to prepare renderer")?;
    renderer.render_document().context("Failed to render threads")
}

pub fn run(args: &Args) -> Result<()> {
    let document = render(args)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {:?}", path))?;
            write_document(&mut BufWriter::new(file), &document)
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!("wrote {:?}", path);
        }
        None => {
            write_document(&mut stdout().lock(), &document).context("Failed to write stdout")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["tweet-archive"]).unwrap();
        assert!(!args.verbose);
        assert_eq!(args.dir, PathBuf::from("."));
        assert_eq!(args.style_prefix, "twitter");
        assert!(args.output.is_none());
        assert!(args.ids.is_empty());
        assert_eq!(args.config(), Config::default());
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "tweet-archive",
            "-v",
            "-d",
            "archive",
            "-l",
            "-t",
            "--video-posters",
            "--animated-gifs",
            "--style-prefix",
            "birds",
            "--started-by-account",
            "--started-with-media",
            "-o",
            "out.html",
            "1",
            "2",
        ])
        .unwrap();
        let config = args.config();
        assert!(args.verbose);
        assert_eq!(args.output, Some(PathBuf::from("out.html")));
        assert_eq!(config.base_dir, PathBuf::from("archive"));
        assert!(config.link);
        assert!(config.timestamp_ids);
        assert!(config.video_posters);
        assert!(config.animated_gifs);
        assert_eq!(config.style_prefix, "birds");
        assert!(config.started_by_account);
        assert!(config.started_with_media);
        assert_eq!(config.ids, vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_bad_style_prefix() {
        for prefix in ["1abc", "a b", "", "x{}"] {
            let result = Args::try_parse_from(["tweet-archive", "--style-prefix", prefix]);
            assert!(result.is_err(), "{:?} was accepted", prefix);
        }
        let args = Args::try_parse_from(["tweet-archive", "--style-prefix", "my-tw_1"]).unwrap();
        assert_eq!(args.style_prefix, "my-tw_1");
    }

    #[test]
    fn test_missing_archive() {
        let args = Args::try_parse_from(["tweet-archive", "-d", "/nonexistent/archive"]).unwrap();
        let err = render(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to load archive"));
    }
}
