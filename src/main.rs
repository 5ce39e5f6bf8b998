//! # edge-download
//!
//! Downloads NHL play-by-play documents for a range of games, then every
//! replay file they reference, caching each one as a local JSON file.

use anyhow::Result;
use clap::Parser;
use edge_download::driver::{self, Plan, REPLAY_URL_FIELD};
use edge_download::fetch::{CacheFetcher, HttpTransport, PolitenessDelay, request_headers};
use edge_download::logging;
use std::path::PathBuf;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "edge-download: fetches play-by-play JSON for a range of NHL games and the replay data linked from it.\n\
                  Files already present in the cache directory are never requested again."
)]
struct Args {
    /// Season start year
    #[arg(long, default_value_t = 2024)]
    season: u16,

    /// Game type (1 preseason, 2 regular season, 3 playoffs)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=99))]
    game_type: u8,

    /// First game number
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=9999))]
    first: u16,

    /// Last game number (inclusive)
    #[arg(long, default_value_t = 1312, value_parser = clap::value_parser!(u16).range(1..=9999))]
    last: u16,

    /// Directory holding the cached JSON files
    #[arg(short, long, default_value = ".")]
    cache_dir: PathBuf,

    /// Key whose values are fetched as secondary URLs
    #[arg(long, default_value = REPLAY_URL_FIELD)]
    field: String,

    /// Minimum pause before each request, in seconds
    #[arg(long, default_value_t = 4.0)]
    min_delay: f64,

    /// Maximum pause before each request, in seconds
    #[arg(long, default_value_t = 10.0)]
    max_delay: f64,

    /// Root of the game-center API
    #[arg(long, default_value = "https://api-web.nhle.com/v1")]
    api_base: String,

    /// Referer header sent with every request
    #[arg(long, default_value = "https://www.nhl.com/")]
    referer: String,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;

    if args.first > args.last {
        anyhow::bail!(
            "first game {} is after last game {}",
            args.first,
            args.last
        );
    }

    let delay = PolitenessDelay::new(args.min_delay, args.max_delay)?;
    let plan = Plan {
        season: args.season,
        game_type: args.game_type,
        games: args.first..=args.last,
        api_base: args.api_base,
        field: args.field,
        headers: request_headers(&args.referer, &args.user_agent)?,
    };

    let fetcher = CacheFetcher::new(HttpTransport::new()?, args.cache_dir, delay)?;
    driver::run(&fetcher, &plan)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_run() {
        let args = Args::try_parse_from(["edge-download"]).unwrap();
        assert_eq!(args.season, 2024);
        assert_eq!(args.game_type, 2);
        assert_eq!((args.first, args.last), (1, 1312));
        assert_eq!(args.field, REPLAY_URL_FIELD);
    }

    #[test]
    fn test_game_type_must_fit_two_digits() {
        assert!(Args::try_parse_from(["edge-download", "--game-type", "3"]).is_ok());
        assert!(Args::try_parse_from(["edge-download", "--game-type", "100"]).is_err());
        assert!(Args::try_parse_from(["edge-download", "--game-type", "0"]).is_err());
    }

    #[test]
    fn test_game_numbers_are_bounded() {
        assert!(Args::try_parse_from(["edge-download", "--last", "10000"]).is_err());
        assert!(Args::try_parse_from(["edge-download", "--first", "0"]).is_err());
    }
}
