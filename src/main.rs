use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use connect_four_streaks::ai::Difficulty;
use connect_four_streaks::config::AppConfig;
use connect_four_streaks::history::{GameId, GameWinner, PlayerIdentity};
use connect_four_streaks::session::{GameSession, Seat};
use connect_four_streaks::store::{GameStore, JsonStore, UserProfile};

/// Connect Four against the computer, with game history and win streaks.
#[derive(Parser)]
#[command(name = "connect-four", about = "Play Connect Four and track win streaks")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a game against the computer on the terminal
    Play {
        /// easy, medium or hard (defaults to the configured difficulty)
        #[arg(long)]
        difficulty: Option<Difficulty>,

        /// Your player id
        #[arg(long, default_value_t = 1)]
        fid: u64,

        /// Username stored with your profile
        #[arg(long)]
        username: Option<String>,

        /// Play yellow and let the computer open
        #[arg(long)]
        yellow: bool,
    },
    /// Show the final position of a stored game
    Replay { id: u64 },
    /// List recent games for a player
    History {
        fid: u64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show a player's streak
    Streak { fid: u64 },
    /// Show the best current streaks
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Reset every streak whose window has passed
    Cleanup,
    /// Write a config file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::InitConfig { force } => init_config(&cli.config, force),
        command => run(&cli.config, command),
    }
}

fn run(config_path: &Path, command: Command) -> Result<()> {
    let config = AppConfig::load_or_default(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let mut store = JsonStore::open(&config.store.data_dir, config.streak.policy())
        .with_context(|| format!("opening store at {}", config.store.data_dir.display()))?;

    match command {
        Command::Play {
            difficulty,
            fid,
            username,
            yellow,
        } => play(&config, &mut store, difficulty, fid, username, yellow),
        Command::Replay { id } => replay(&store, GameId(id)),
        Command::History { fid, limit } => history(&store, fid, limit),
        Command::Streak { fid } => streak(&mut store, fid),
        Command::Leaderboard { limit } => leaderboard(&store, limit),
        Command::Cleanup => {
            let reset = store.expire_streaks(Utc::now())?;
            println!("Reset {reset} expired streak(s).");
            Ok(())
        }
        Command::InitConfig { force } => init_config(config_path, force),
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let toml = AppConfig::default_toml().context("serializing default config")?;
    std::fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn play(
    config: &AppConfig,
    store: &mut JsonStore,
    difficulty: Option<Difficulty>,
    fid: u64,
    username: Option<String>,
    yellow: bool,
) -> Result<()> {
    let difficulty = difficulty.unwrap_or(config.ai.difficulty);

    let mut identity = PlayerIdentity::new(fid);
    if let Some(name) = username {
        let mut profile = UserProfile::new(fid);
        profile.username = Some(name.clone());
        store.upsert_user(profile, Utc::now())?;
        identity = identity.with_username(name);
    } else if let Some(profile) = store.user(fid)? {
        identity.username = profile.username;
        identity.display_name = profile.display_name;
        identity.avatar = profile.avatar;
    }

    let human = Seat::Human(identity);
    let (red, yellow_seat) = if yellow {
        (Seat::Computer, human)
    } else {
        (human, Seat::Computer)
    };
    let mut session = GameSession::new(
        config.game,
        red,
        yellow_seat,
        difficulty,
        config.ai.think_delay(),
    );
    info!(fid, %difficulty, "starting game");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while !session.state().is_terminal() {
        println!("\n{}", session.state().board());
        if session.is_computer_turn() {
            let Some(column) = session.computer_turn() else {
                bail!("computer found no legal column");
            };
            println!("Computer plays column {column}.");
            continue;
        }

        print!(
            "{} to move, column (q to quit): ",
            session.state().current_player()
        );
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        let input = line?;
        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            println!("Game abandoned.");
            return Ok(());
        }
        match input.parse::<usize>() {
            Ok(column) if session.play(column) => {}
            _ => println!("Column must be one of {:?}.", session.state().legal_actions()),
        }
    }

    let state = session.state();
    println!("\n{}", state.board());
    match state.winner() {
        Some(winner) => println!(
            "{} ({winner}) wins along {:?}.",
            session.seat(winner).identity().label(),
            state.winning_cells()
        ),
        None => println!("Draw."),
    }

    let now = Utc::now();
    let record = session.finish(store, now).context("saving finished game")?;
    println!("Saved game {}.", record.id);
    if let Some(streak) = store.streak(fid, now)? {
        println!(
            "Streak: {} (best {}), {} wins from {} games.",
            streak.current_streak, streak.longest_streak, streak.total_wins, streak.total_games
        );
    }
    Ok(())
}

fn replay(store: &JsonStore, id: GameId) -> Result<()> {
    let Some(record) = store.game(id)? else {
        bail!("no game with id {id}");
    };
    let replayed = record
        .replay()
        .with_context(|| format!("replaying game {id}"))?;

    println!(
        "Game {} on {}: {} (red) vs {} (yellow), {} moves",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.players.red.label(),
        record.players.yellow.label(),
        record.moves.len()
    );
    println!("{}", replayed.board);
    match replayed.winner {
        Some(player) => println!("{player} won along {:?}.", replayed.winning_cells),
        None if record.winner == GameWinner::Draw => println!("Draw."),
        None => println!("No winning line."),
    }
    Ok(())
}

fn history(store: &JsonStore, fid: u64, limit: usize) -> Result<()> {
    let games = store.games_for_player(fid, limit)?;
    if games.is_empty() {
        println!("No games for fid {fid}.");
        return Ok(());
    }
    for game in games {
        let result = match (game.won_by(fid), game.winner) {
            (_, GameWinner::Draw) => "draw",
            (Some(true), _) => "won",
            _ => "lost",
        };
        let opponent = match game.players.colour_of(fid) {
            Some(colour) => game.players.get(colour.other()).label(),
            None => String::from("?"),
        };
        let difficulty = game
            .ai_difficulty
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        println!(
            "#{:<5} {}  {:<5} vs {}{}  {} moves",
            game.id,
            game.created_at.format("%Y-%m-%d %H:%M"),
            result,
            opponent,
            difficulty,
            game.moves.len()
        );
    }
    Ok(())
}

fn streak(store: &mut JsonStore, fid: u64) -> Result<()> {
    match store.streak(fid, Utc::now())? {
        Some(s) => println!(
            "fid {}: current {}, longest {}, {} wins / {} games ({}%)",
            s.fid,
            s.current_streak,
            s.longest_streak,
            s.total_wins,
            s.total_games,
            s.win_rate()
        ),
        None => println!("fid {fid} has not finished a game yet."),
    }
    Ok(())
}

fn leaderboard(store: &JsonStore, limit: usize) -> Result<()> {
    let top = store.top_streaks(limit)?;
    if top.is_empty() {
        println!("No streaks yet.");
        return Ok(());
    }
    println!("{:>4}  {:<20} {:>7} {:>7}", "rank", "player", "current", "longest");
    for (rank, s) in top.iter().enumerate() {
        let name = store
            .user(s.fid)?
            .and_then(|u| u.display_name.or(u.username))
            .unwrap_or_else(|| format!("fid:{}", s.fid));
        println!(
            "{:>4}  {:<20} {:>7} {:>7}",
            rank + 1,
            name,
            s.current_streak,
            s.longest_streak
        );
    }
    Ok(())
}
