pub mod fetch;
pub mod standings;
pub mod types;

pub use fetch::{Fetcher, FetcherConfig, Transport};
pub use standings::{extract_standings, league_standings_url, StandingsExtractor};
pub use types::{League, PlayerStat, StandingsReport, TeamStanding};
