// src/standings/mod.rs

pub mod row;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument, trace, warn};

use crate::types::{League, TeamStanding};
use row::{cell_texts, parse_row, MIN_CELLS};

/// Season used when none is given.
pub const DEFAULT_SEASON: i32 = 2024;

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table[id]").expect("table selector should parse"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector should parse"));
pub(crate) static CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("cell selector should parse"));

/// Season standings page on the NPB site.
pub fn league_standings_url(season: i32) -> String {
    format!("https://npb.jp/standings/{}/league.html", season)
}

/// A standings table on the page: its element id and the league it lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub league: League,
}

impl Section {
    pub fn new(id: impl Into<String>, league: League) -> Self {
        Self {
            id: id.into(),
            league,
        }
    }
}

/// Pulls team lines out of a standings page, one table per league.
#[derive(Debug, Clone)]
pub struct StandingsExtractor {
    sections: Vec<Section>,
}

impl Default for StandingsExtractor {
    fn default() -> Self {
        Self::with_sections(vec![
            Section::new("st_c", League::Central),
            Section::new("st_p", League::Pacific),
        ])
    }
}

impl StandingsExtractor {
    /// Look the tables up in the given order instead of the defaults.
    pub fn with_sections(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Extract every convertible row, sections in declared order and rows
    /// in document order.
    ///
    /// A missing table or an unparseable row is logged and skipped; rows
    /// with fewer than [`MIN_CELLS`] cells are skipped silently. The result
    /// may therefore be shorter than the visible table, or empty.
    #[instrument(level = "debug", skip(self, html), fields(html_len = html.len()))]
    pub fn extract(&self, html: &str) -> Vec<TeamStanding> {
        let document = Html::parse_document(html);
        let mut teams = Vec::new();

        for section in &self.sections {
            let league = section.league;
            let Some(table) = document
                .select(&TABLE)
                .find(|t| t.value().id() == Some(section.id.as_str()))
            else {
                warn!(%league, table_id = %section.id, "Could not find standings table");
                continue;
            };

            // first row is the column header
            for (i, tr) in table.select(&ROW).skip(1).enumerate() {
                let cells = cell_texts(tr);
                if cells.len() < MIN_CELLS {
                    trace!(%league, row = i + 1, cells = cells.len(), "short row");
                    continue;
                }

                match parse_row(&cells, league) {
                    Ok(team) => {
                        if !team.is_consistent() {
                            debug!(
                                %league,
                                team = %team.name,
                                games = team.games,
                                wins = team.wins,
                                losses = team.losses,
                                draws = team.draws,
                                "games differ from wins + losses + draws"
                            );
                        }
                        teams.push(team);
                    }
                    Err(e) => {
                        warn!(%league, row = i + 1, error = %format!("{:#}", e), "Error parsing row");
                    }
                }
            }
        }

        debug!(teams = teams.len(), "Finished standings extraction");
        teams
    }
}

/// [`StandingsExtractor::extract`] with the default Central/Pacific tables.
pub fn extract_standings(html: &str) -> Vec<TeamStanding> {
    StandingsExtractor::default().extract(html)
}
