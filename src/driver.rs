//! Sequential walk over a range of games: primary play-by-play documents
//! first, then every replay they link to.

use crate::extract::extract_strings;
use crate::fetch::{CacheFetcher, FetchOutcome, Transport};
use crate::model::{GameId, replay_cache_key};
use anyhow::Result;
use reqwest::header::HeaderMap;
use std::ops::RangeInclusive;
use tracing::{info, warn};

/// Key under which play-by-play documents carry replay links.
pub const REPLAY_URL_FIELD: &str = "pptReplayUrl";

/// What to download.
#[derive(Debug, Clone)]
pub struct Plan {
    pub season: u16,
    pub game_type: u8,
    pub games: RangeInclusive<u16>,
    pub api_base: String,
    /// Key searched for secondary URLs.
    pub field: String,
    pub headers: HeaderMap,
}

/// Per-kind tallies of fetch outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub cached: usize,
    pub downloaded: usize,
    pub unavailable: usize,
}

impl Tally {
    fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Cached(_) => self.cached += 1,
            FetchOutcome::Downloaded(_) => self.downloaded += 1,
            FetchOutcome::Unavailable => self.unavailable += 1,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub games: usize,
    pub primary: Tally,
    pub replay_urls_found: usize,
    pub replays: Tally,
}

/// Runs the whole batch. Unavailable resources are skipped; local cache
/// errors stop the run.
pub fn run<T: Transport>(fetcher: &CacheFetcher<T>, plan: &Plan) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for number in plan.games.clone() {
        let game_id = GameId::new(plan.season, plan.game_type, number);
        summary.games += 1;

        let outcome = fetcher.fetch(
            &game_id.play_by_play_url(&plan.api_base),
            &game_id.cache_key(),
            &plan.headers,
        )?;
        summary.primary.record(&outcome);
        let Some(data) = outcome.content() else {
            continue;
        };

        let replay_urls = extract_strings(data, &plan.field, |value| {
            warn!(%game_id, %value, "ignoring non-string {}", plan.field);
        });
        info!("{}: Found {} replay URLs", game_id, replay_urls.len());
        summary.replay_urls_found += replay_urls.len();

        for url in replay_urls {
            let outcome = fetcher.fetch(url, &replay_cache_key(url), &plan.headers)?;
            summary.replays.record(&outcome);
        }
    }

    info!(
        games = summary.games,
        primary_cached = summary.primary.cached,
        primary_downloaded = summary.primary.downloaded,
        primary_unavailable = summary.primary.unavailable,
        replay_urls = summary.replay_urls_found,
        replays_cached = summary.replays.cached,
        replays_downloaded = summary.replays.downloaded,
        replays_unavailable = summary.replays.unavailable,
        "run complete"
    );
    Ok(summary)
}
