use clap::Parser;
use game_core::config::{SessionConfig, DEFAULT_GAMES, DEFAULT_PORT};
use game_core::game::SEATS;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use uecda_server::journal::{self, Journal};
use uecda_server::session::{self, Session};

#[derive(Parser)]
#[command(name = "uecda-server")]
#[command(about = "UECda Daifugo/Daihinmin card game server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of games in the session
    #[arg(short = 'n', long, default_value_t = DEFAULT_GAMES)]
    num_games: u32,

    /// Game journal destination: a .jsonl file, or a directory to generate
    /// a timestamped file in
    #[arg(long)]
    game_log: Option<PathBuf>,

    /// Log dealt hands at info level
    #[arg(long)]
    show_hands: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Deal seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Per-turn response deadline in seconds
    #[arg(long, default_value_t = 60)]
    turn_timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args).await {
        Ok(points) => {
            info!("session complete; final points: {points:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("server error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<[u32; SEATS], Box<dyn std::error::Error>> {
    let config = SessionConfig {
        port: args.port,
        total_games: args.num_games,
        seed: args.seed,
        turn_timeout: Duration::from_secs(args.turn_timeout),
        show_hands: args.show_hands,
        ..SessionConfig::default()
    };

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("listening on {}", listener.local_addr()?);
    info!(
        "waiting for {SEATS} players, {} games to play",
        config.total_games
    );

    let endpoints = session::accept_players(&listener).await?;

    let journal = match &args.game_log {
        Some(arg) => {
            let names: Vec<String> = endpoints.iter().map(|e| e.name.clone()).collect();
            let path = journal::journal_path(arg, &names);
            info!("game journal: {}", path.display());
            Journal::create(&path)?
        }
        None => Journal::disabled(),
    };

    let mut session = Session::new(endpoints, config, journal);
    tokio::select! {
        result = session.run() => Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted; abandoning session");
            Err("session interrupted".into())
        }
    }
}
