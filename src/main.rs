use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use arcade_rl::arcade::{BreakoutConfig, BreakoutGame, VolleyConfig, VolleyGame};
use arcade_rl::game::GameConfig;
use arcade_rl::modes::{ArcadeMode, EvalConfig, EvalMode, HumanMode, TrainConfig, TrainMode};
use arcade_rl::render::{Scene, TerminalRenderer};
use arcade_rl::rl::{
    BreakoutEnvironment, Discretizer, Environment, SnakeEnvironment, VolleyEnvironment,
};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arcade_rl")]
#[command(version, about = "Arcade games as reinforcement learning environments")]
struct Cli {
    /// What to run
    #[arg(long, value_enum, default_value = "human")]
    mode: Mode,

    /// Which game to run
    #[arg(long, value_enum, default_value = "snake")]
    game: Game,

    /// Episodes to train or evaluate
    #[arg(long, default_value = "10000")]
    episodes: usize,

    /// Step budget per episode (defaults to the game's own)
    #[arg(long)]
    max_steps: Option<u32>,

    /// Seed for the game and the agent
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Q-table path (default: models/<game>.json)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Draw the game in the terminal while training or evaluating
    #[arg(long, default_value_t = false)]
    render: bool,

    /// Delay between rendered evaluation frames in milliseconds
    #[arg(long, default_value = "50")]
    tick_ms: u64,

    /// Snake grid width in cells
    #[arg(long, default_value = "80")]
    width: i32,

    /// Snake grid height in cells
    #[arg(long, default_value = "60")]
    height: i32,
}

impl Cli {
    /// Whether a terminal UI takes over the screen
    fn draws_terminal(&self) -> bool {
        self.render || matches!(self.mode, Mode::Human)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Play with keyboard controls
    Human,
    /// Train a Q-table
    Train,
    /// Watch or score a trained Q-table
    Eval,
}

#[derive(Clone, Copy, ValueEnum)]
enum Game {
    Snake,
    Volley,
    Breakout,
}

impl Game {
    fn name(self) -> &'static str {
        match self {
            Game::Snake => "snake",
            Game::Volley => "volley",
            Game::Breakout => "breakout",
        }
    }
}

/// Log file used while the terminal is drawn
const LOG_FILE: &str = "arcade_rl.log";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.draws_terminal())?;

    match cli.game {
        Game::Snake => {
            let mut config = GameConfig::new(cli.width, cli.height);
            if let Some(max_steps) = cli.max_steps {
                config.max_steps = max_steps;
            }

            if let Mode::Human = cli.mode {
                let mut human_mode = HumanMode::new(config, cli.seed)?;
                return human_mode.run().await;
            }

            let discretizer = Discretizer::for_snake(&config);
            let env = SnakeEnvironment::new(config, cli.seed)?;
            dispatch(&cli, env, discretizer)
        }
        Game::Volley => {
            let mut config = VolleyConfig::default();
            if let Some(max_steps) = cli.max_steps {
                config.max_steps = max_steps;
            }

            if let Mode::Human = cli.mode {
                let mut arcade_mode = ArcadeMode::new(VolleyGame::new(config, cli.seed)?);
                return arcade_mode.run().await;
            }

            let discretizer = Discretizer::for_volley(&config);
            let env = VolleyEnvironment::new(config, cli.seed)?;
            dispatch(&cli, env, discretizer)
        }
        Game::Breakout => {
            let mut config = BreakoutConfig::default();
            if let Some(max_steps) = cli.max_steps {
                config.max_steps = max_steps;
            }

            if let Mode::Human = cli.mode {
                let mut arcade_mode = ArcadeMode::new(BreakoutGame::new(config, cli.seed)?);
                return arcade_mode.run().await;
            }

            let discretizer = Discretizer::for_breakout(&config);
            let env = BreakoutEnvironment::new(config, cli.seed)?;
            dispatch(&cli, env, discretizer)
        }
    }
}

/// Log to stderr, or to a file while a terminal UI owns the screen
fn init_tracing(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if to_file {
        let file = File::create(LOG_FILE)
            .with_context(|| format!("Failed to create log file {LOG_FILE}"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

/// Run a learning mode on an already configured environment
fn dispatch<E>(cli: &Cli, mut env: E, discretizer: Discretizer) -> Result<()>
where
    E: Environment,
    E::State: Scene,
{
    let model_path = cli
        .model
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("models/{}.json", cli.game.name())));

    if cli.render {
        env.attach_renderer(Box::new(TerminalRenderer::new()?));
    }

    match cli.mode {
        Mode::Human => Err(anyhow!("keyboard play is started before dispatch")),
        Mode::Train => {
            let mut config = TrainConfig::new(cli.episodes, model_path);
            config.seed = cli.seed;
            config.render = cli.render;

            let mut train_mode = TrainMode::new(env, discretizer, config)?;
            train_mode.run()
        }
        Mode::Eval => {
            let mut config = EvalConfig::new(cli.episodes);
            config.seed = cli.seed;
            config.render = cli.render;
            config.tick_delay = Duration::from_millis(cli.tick_ms);

            let mut eval_mode = EvalMode::from_file(env, &model_path, config)?;
            eval_mode.run()?;
            Ok(())
        }
    }
}
