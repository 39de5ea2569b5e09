// src/standings/row.rs
//
// Positional layout of a standings row. The page gives no per-cell
// labels, so every column index lives here.

use anyhow::{bail, ensure, Context, Result};
use scraper::ElementRef;

use super::CELL;
use crate::types::{League, TeamStanding};

/// A data row needs at least this many cells to be a team line.
pub const MIN_CELLS: usize = 8;

const COL_RANK: usize = 0;
const COL_NAME: usize = 1;
const COL_GAMES: usize = 2;
const COL_WINS: usize = 3;
const COL_LOSSES: usize = 4;
const COL_DRAWS: usize = 5;
const COL_WIN_RATE: usize = 6;
const COL_GAME_DIFF: usize = 7;

/// Rank marker, as in "3位". Removed wherever it appears in the cell.
pub const RANK_MARKER: char = '位';

/// Shown instead of a number for the league leader.
pub const LEADER_PLACEHOLDER: &str = "-";

/// Text of every `td`/`th` in the row, in document order. Each text node
/// is trimmed before joining, so markup inside a cell is flattened.
pub fn cell_texts(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL)
        .map(|cell| cell.text().map(str::trim).collect::<String>())
        .collect()
}

fn parse_rank(text: &str) -> Result<u32> {
    let digits = text.replace(RANK_MARKER, "");
    let rank: u32 = digits
        .trim()
        .parse()
        .with_context(|| format!("rank: {:?} is not a number", text))?;
    ensure!(rank > 0, "rank: {:?} is not a positive rank", text);
    Ok(rank)
}

fn parse_count(text: &str, field: &str) -> Result<u32> {
    text.parse()
        .with_context(|| format!("{}: {:?} is not a count", field, text))
}

fn parse_win_rate(text: &str) -> Result<f64> {
    if text == LEADER_PLACEHOLDER {
        return Ok(0.0);
    }
    let rate: f64 = text
        .parse()
        .with_context(|| format!("win_rate: {:?} is not a decimal", text))?;
    if !(0.0..=1.0).contains(&rate) {
        bail!("win_rate: {:?} is outside 0..1", text);
    }
    Ok(rate)
}

/// Turn one row's cell texts into a `TeamStanding` tagged with `league`.
pub fn parse_row(cells: &[String], league: League) -> Result<TeamStanding> {
    ensure!(
        cells.len() >= MIN_CELLS,
        "expected {} cells, found {}",
        MIN_CELLS,
        cells.len()
    );

    let name = cells[COL_NAME].clone();
    ensure!(!name.is_empty(), "team name is empty");

    Ok(TeamStanding {
        rank: parse_rank(&cells[COL_RANK])?,
        name,
        games: parse_count(&cells[COL_GAMES], "games")?,
        wins: parse_count(&cells[COL_WINS], "wins")?,
        losses: parse_count(&cells[COL_LOSSES], "losses")?,
        draws: parse_count(&cells[COL_DRAWS], "draws")?,
        win_rate: parse_win_rate(&cells[COL_WIN_RATE])?,
        game_diff: cells[COL_GAME_DIFF].clone(),
        league,
    })
}
