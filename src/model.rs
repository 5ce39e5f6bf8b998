//! Identifiers and cache-key naming shared by the fetcher and the driver.

use std::fmt;

/// Cache key used when a replay URL path is too short to name a file.
pub const FALLBACK_CACHE_KEY: &str = "unknown_file.json";

/// A game-center identifier such as `2024020001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameId {
    /// Season start year (e.g. 2024 for 2024-25).
    pub season: u16,
    /// Game type: 1 preseason, 2 regular season, 3 playoffs.
    pub game_type: u8,
    /// Game number within the season, rendered with four digits.
    pub number: u16,
}

impl GameId {
    pub fn new(season: u16, game_type: u8, number: u16) -> Self {
        Self {
            season,
            game_type,
            number,
        }
    }

    /// Play-by-play endpoint for this game under `api_base`.
    pub fn play_by_play_url(&self, api_base: &str) -> String {
        format!(
            "{}/gamecenter/{}/play-by-play",
            api_base.trim_end_matches('/'),
            self
        )
    }

    /// Local file name of the primary document.
    pub fn cache_key(&self) -> String {
        format!("pbp_{}.json", self)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}{:04}", self.season, self.game_type, self.number)
    }
}

/// Derives the cache key of a secondary resource from its URL path.
///
/// The path is trimmed of surrounding slashes and split on `/`; the second and
/// third segments are joined with an underscore. Anything shorter, or a URL
/// that does not parse, maps to [`FALLBACK_CACHE_KEY`].
pub fn replay_cache_key(raw_url: &str) -> String {
    let Ok(url) = url::Url::parse(raw_url) else {
        return FALLBACK_CACHE_KEY.to_string();
    };

    let parts: Vec<&str> = url.path().trim_matches('/').split('/').collect();
    if parts.len() >= 3 {
        format!("{}_{}", parts[1], parts[2])
    } else {
        FALLBACK_CACHE_KEY.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_formatting() {
        let id = GameId::new(2024, 2, 1);
        assert_eq!(id.to_string(), "2024020001");
        assert_eq!(id.cache_key(), "pbp_2024020001.json");

        let last = GameId::new(2024, 2, 1312);
        assert_eq!(last.to_string(), "2024021312");
    }

    #[test]
    fn test_play_by_play_url() {
        let id = GameId::new(2024, 2, 17);
        assert_eq!(
            id.play_by_play_url("https://api-web.nhle.com/v1"),
            "https://api-web.nhle.com/v1/gamecenter/2024020017/play-by-play"
        );
        assert_eq!(
            id.play_by_play_url("http://localhost:8080/v1/"),
            "http://localhost:8080/v1/gamecenter/2024020017/play-by-play"
        );
    }

    #[test]
    fn test_replay_cache_key_uses_second_and_third_segments() {
        let key = replay_cache_key("https://wsr.nhle.com/sprites/20242025/ev151.json");
        assert_eq!(key, "20242025_ev151.json");
    }

    #[test]
    fn test_replay_cache_key_ignores_surrounding_slashes() {
        assert_eq!(replay_cache_key("https://host/a/b/c/"), "b_c");
        assert_eq!(replay_cache_key("https://host//a/b/c"), "b_c");
    }

    #[test]
    fn test_replay_cache_key_fallback() {
        assert_eq!(replay_cache_key("https://host/a/b"), FALLBACK_CACHE_KEY);
        assert_eq!(replay_cache_key("https://host/"), FALLBACK_CACHE_KEY);
        assert_eq!(replay_cache_key("https://host"), FALLBACK_CACHE_KEY);
        assert_eq!(replay_cache_key("not a url"), FALLBACK_CACHE_KEY);
    }
}
