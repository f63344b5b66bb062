use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use chrono::Local;
use clap::Parser;
use engine::app::{AppConfig, FrameApp, run_app};
use engine::graphics::Renderer2d;
use engine::{FrameControl, FrameLogic};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;

use uniformity::recorder::file_stem;
use uniformity::{Catalog, DataRecorder, ExperimentConfig, Session, SessionStatus};

#[derive(Debug, Parser)]
#[command(name = "uniformity", about = "Uniformity illusion experiment")]
struct Cli {
    /// Participant identifier; prompted for on stdin when absent.
    #[arg(long)]
    participant: Option<String>,
    /// JSON config file. Falls back to $UNIFORMITY_CONFIG, then built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Run in a window instead of fullscreen.
    #[arg(long)]
    windowed: bool,
    #[arg(long)]
    seed: Option<u64>,
    /// Must be a multiple of 3.
    #[arg(long)]
    repetitions: Option<u32>,
}

/// Exits non-zero when the session could not write its data.
struct ExperimentApp(Session);

impl FrameLogic for ExperimentApp {
    fn advance(
        &mut self,
        input: &engine::app::InputFrame,
        dt: std::time::Duration,
    ) -> FrameControl {
        self.0.advance(input, dt)
    }
}

impl FrameApp for ExperimentApp {
    fn render(&self, gfx: &mut dyn Renderer2d) {
        self.0.render(gfx);
    }

    fn cursor_visible(&self) -> bool {
        self.0.cursor_visible()
    }

    fn on_exit(&mut self) {
        self.0.on_exit();
        if self.0.status() == SessionStatus::Failed {
            error!("data could not be saved; see the backup file for recorded trials");
            std::process::exit(1);
        }
    }
}

fn prompt_participant() -> anyhow::Result<String> {
    print!("Participant ID: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading participant id")?;
    Ok(line.trim().to_owned())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config =
        ExperimentConfig::resolve(cli.config.as_deref()).context("loading experiment config")?;
    if let Some(reps) = cli.repetitions {
        config.repetitions = reps;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    config.validate().context("invalid experiment config")?;

    let participant = match cli.participant {
        Some(id) => id.trim().to_owned(),
        None => prompt_participant()?,
    };
    if participant.is_empty() {
        bail!("no participant id given");
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let catalog = Catalog::standard(&config.stimulus, &mut rng).context("building trial grids")?;

    let date = Local::now().format("%Y_%b_%d_%H%M").to_string();
    let stem = file_stem(&participant, &config.experiment_name, &date);
    let data_dir = config.data_dir();
    let recorder = DataRecorder::create(&data_dir, &stem)
        .with_context(|| format!("preparing data files in {}", data_dir.display()))?;
    info!(
        participant = %participant,
        csv = %recorder.csv_path().display(),
        blocks = ?config.blocks,
        repetitions = config.repetitions,
        "starting session"
    );

    let app_config = AppConfig {
        title: config.experiment_name.clone(),
        desired_size: PhysicalSize::new(1920, 1080),
        fullscreen: !cli.windowed,
        vsync: true,
    };
    let session = Session::new(config, catalog, participant, recorder, rng)?;
    run_app(app_config, ExperimentApp(session)).map_err(|e| anyhow!("display error: {e}"))
}
