use anyhow::{bail, Context, Result};
use chrono::Utc;
use npbscraper::{
    extract_standings, league_standings_url, standings::DEFAULT_SEASON, Fetcher,
    StandingsReport,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) args: [SEASON] [--json] ──────────────────────────────────
    let mut season = DEFAULT_SEASON;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            season = arg
                .parse()
                .with_context(|| format!("season must be a year, got {:?}", arg))?;
        }
    }

    // ─── 3) fetch ────────────────────────────────────────────────────
    let url = league_standings_url(season);
    info!(%url, "Fetching standings");
    let fetcher = Fetcher::new()?;
    let Some(html) = fetcher.fetch(&url) else {
        error!(%url, "could not retrieve standings page");
        bail!("failed to fetch {}", url);
    };

    // ─── 4) extract & print ──────────────────────────────────────────
    let teams = extract_standings(&html);
    info!(count = teams.len(), "extracted team standings");

    if json {
        let report = StandingsReport {
            season,
            source_url: url,
            fetched_at: Utc::now(),
            teams,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for team in &teams {
            println!(
                "[{}] {}位: {} (勝率: {:.3})",
                team.league, team.rank, team.name, team.win_rate
            );
        }
    }

    Ok(())
}
