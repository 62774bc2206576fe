// Matchday command-line entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout carries only command output)
// 2. Parse arguments and load config
// 3. Load CSV inputs and run the requested command

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use matchday_core::config::{self, Config};
use matchday_core::import;
use matchday_core::team::{Team, TeamError};

#[derive(Parser, Debug)]
#[command(name = "matchday")]
#[command(about = "Fantasy football league scoring and lineup checks")]
#[command(version)]
struct Cli {
    /// Path to league.toml (defaults to config/league.toml in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every stat line in a round
    Score {
        /// Stats CSV (defaults to data_paths.stats)
        #[arg(long)]
        stats: Option<PathBuf>,

        /// Print scores as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a team's lineup pick by pick and report what the rules allow
    Lineup {
        /// Team id from the squad file
        #[arg(long)]
        team: String,

        /// Player ids to add, in order
        #[arg(long, value_delimiter = ',', required = true)]
        picks: Vec<String>,

        /// Squad CSV (defaults to data_paths.squads)
        #[arg(long)]
        squad: Option<PathBuf>,

        /// Stats CSV; when given, the lineup's points are printed
        #[arg(long)]
        stats: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => config::load_config().context("failed to load configuration")?,
    };
    info!(
        "Config loaded: league={}, season {}, sub limit {}",
        config.league.name, config.league.season, config.league.sub_limit
    );

    match cli.command {
        Commands::Score { stats, json } => {
            let path = stats.unwrap_or_else(|| PathBuf::from(&config.data_paths.stats));
            run_score(&config, &path, json)
        }
        Commands::Lineup {
            team,
            picks,
            squad,
            stats,
        } => {
            let squad_path = squad.unwrap_or_else(|| PathBuf::from(&config.data_paths.squads));
            run_lineup(&config, &team, &picks, &squad_path, stats.as_deref())
        }
    }
}

fn run_score(config: &Config, stats_path: &Path, json: bool) -> anyhow::Result<()> {
    let rows = import::load_stat_lines(stats_path).context("failed to load stat lines")?;
    info!("Loaded {} stat lines from {}", rows.len(), stats_path.display());

    if json {
        let scored: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                serde_json::json!({
                    "player_id": row.player_id,
                    "position": row.position,
                    "score": config.scoring.score(row.position, &row.stats),
                })
            })
            .collect();
        let out = serde_json::to_string_pretty(&scored).context("failed to encode scores")?;
        println!("{out}");
        return Ok(());
    }

    for row in &rows {
        let score = config.scoring.score(row.position, &row.stats);
        println!(
            "{:<12} {:<3} {:>4}",
            row.player_id,
            row.position.display_str(),
            score.total
        );
        for action in &score.breakdown {
            println!("    {:>+4}  {}", action.pts, action.label());
        }
    }
    Ok(())
}

fn run_lineup(
    config: &Config,
    team_id: &str,
    picks: &[String],
    squad_path: &Path,
    stats_path: Option<&Path>,
) -> anyhow::Result<()> {
    let rows = import::load_squad(squad_path).context("failed to load squads")?;
    let teams = import::build_teams(rows, config.league.sub_limit)
        .context("failed to assemble teams")?;
    let Some(mut team) = teams.into_iter().find(|t| t.id == team_id) else {
        bail!("team `{team_id}` not found in {}", squad_path.display());
    };
    info!("Team {} has {} squad players", team.name, team.squad().len());

    let mut rejected = 0;
    for id in picks {
        match team.add_to_lineup(id) {
            Ok(()) => println!("  added     {}", describe(&team, id)),
            Err(e) => {
                rejected += 1;
                println!("  rejected  {id}: {e}");
                if let TeamError::Rejected(reason) = &e {
                    warn!("{} rejected with {}", id, reason.code());
                }
            }
        }
    }

    let size = team.lineup_ids().len();
    println!();
    for player in team.lineup_by_position() {
        println!("  {:<3} {} ({})", player.position.display_str(), player.name, player.real_team);
    }
    println!("{} ({}): {} players, formation {}", team.name, team.id, size, team.formation());
    if team.has_valid_lineup() {
        println!("lineup is complete and valid");
    } else {
        println!("lineup is not complete ({rejected} picks rejected)");
    }

    if let Some(path) = stats_path {
        let stat_rows = import::load_stat_lines(path).context("failed to load stat lines")?;
        let by_id = import::stat_lines_by_id(&stat_rows);
        println!("points: {}", team.lineup_points(&config.scoring, &by_id));
    }
    Ok(())
}

fn describe(team: &Team, id: &str) -> String {
    match team.player(id) {
        Some(p) => format!("{} {} ({})", p.position, p.name, p.real_team),
        None => id.to_string(),
    }
}

/// Initialize tracing to stderr. `RUST_LOG` overrides the default filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("matchday=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
