use std::{
    convert::Infallible,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use clap::{ArgAction, Parser};
use url::Url;

use crate::{
    eutils::pubmed::DEFAULT_BASE_URL, pipeline::Request, sink::prompt::with_default_extension,
};

/// Search PubMed and save title, publication date and corresponding email of each hit as CSV.
///
/// Anything not given on the command line is asked for interactively.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Search term, as typed into PubMed
    #[arg(short, long)]
    pub query: Option<String>,

    /// Maximum number of papers to fetch [default when prompted: 5]
    #[arg(short = 'n', long)]
    pub count: Option<u32>,

    /// Save here instead of asking for a destination
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<Destination>,

    /// Base URL of the E-utilities service
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub eutils_url: Url,

    /// NCBI API key, sent with every request
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Give up on a request after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn request(&self) -> Request {
        Request {
            query: self.query.clone(),
            count: self.count,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Where the CSV file goes. A path without an extension gets `.csv`, as a save dialog would.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination(PathBuf);

impl Destination {
    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

impl FromStr for Destination {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Destination(with_default_extension(Path::new(s))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_everything_to_prompts() {
        let cli = Cli::try_parse_from(["pubmed-fetch"]).expect("parse");
        assert!(cli.query.is_none());
        assert!(cli.count.is_none());
        assert!(cli.output.is_none());
        assert!(cli.timeout().is_none());
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.eutils_url.as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn flags_fill_the_request() {
        let cli = Cli::try_parse_from([
            "pubmed-fetch",
            "-q",
            "crispr cas9",
            "-n",
            "12",
            "-o",
            "results",
            "--timeout",
            "30",
            "-vv",
        ])
        .expect("parse");
        let req = cli.request();
        assert_eq!(req.query.as_deref(), Some("crispr cas9"));
        assert_eq!(req.count, Some(12));
        assert_eq!(
            cli.output.clone().map(Destination::into_path),
            Some(PathBuf::from("results.csv"))
        );
        assert_eq!(cli.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn rejects_bad_count_and_url() {
        assert!(Cli::try_parse_from(["pubmed-fetch", "-n", "many"]).is_err());
        assert!(Cli::try_parse_from(["pubmed-fetch", "-n", "-1"]).is_err());
        assert!(Cli::try_parse_from(["pubmed-fetch", "--eutils-url", "not a url"]).is_err());
    }

    #[test]
    fn destination_keeps_explicit_extensions() {
        proptest::proptest!(|(stem in "[A-Za-z0-9_-]{1,16}", ext in "(csv|tsv|txt)")| {
            let name = format!("{stem}.{ext}");
            let d = Destination::from_str(&name).expect("parse");
            proptest::prop_assert_eq!(d.into_path(), PathBuf::from(name));
        })
    }
}
