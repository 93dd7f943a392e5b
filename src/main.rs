mod camera;
mod config;
mod graphics;
mod math;
mod scene;
mod spinner;
mod spring;
mod state;
mod target_point;
mod timers;
mod vertex;
mod widget;

use crate::config::{Args, SceneConfig};
use crate::scene::Scene;
use crate::state::AppState;
use crate::widget::SceneWidget;
use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    style::ResetColor,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::fs::File;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Puts the terminal in raw mode on an alternate screen and restores it on drop
struct TerminalGuard;

impl TerminalGuard {
    /// Enables raw mode, the alternate screen and mouse capture
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            ResetColor,
            Show,
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

/// Sets up env_logger, writing to `--log-file` when given
fn init_logging(args: &Args) -> anyhow::Result<()> {
    // Anything on stderr tears the alternate screen, so stay quiet unless
    // logs go to a file or RUST_LOG asks for them.
    let default_level = if args.log_file.is_some() { "info" } else { "error" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Runs the frame loop until the user quits
fn run(args: &Args, scene: &mut Scene, data: &mut AppState) -> anyhow::Result<()> {
    let (width, height) = termsize::get()
        .map(|size| (size.cols, size.rows))
        .unwrap_or((80, 24));
    let mut widget = SceneWidget::new(width, height, args.cell_aspect);
    log::debug!("initial viewport {:?}", widget.viewport());
    let frame_time = Duration::from_secs_f64(1.0 / args.fps as f64);
    let mut stdout = io::stdout();
    let mut last_frame = Instant::now();

    while data.running {
        let now = Instant::now();
        widget.update(scene, data, now - last_frame);
        last_frame = now;
        widget.paint(scene, data, &mut stdout)?;

        // Wait out the rest of the frame, handling input as it arrives
        let deadline = now + frame_time;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !event::poll(remaining)? {
                break;
            }
            widget.event(&event::read()?, scene, data);
            if !data.running {
                break;
            }
        }
    }
    stdout.flush()?;
    Ok(())
}

/// Main function
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = SceneConfig::resolve(&args).context("invalid scene configuration")?;
    let mut scene = Scene::from_config(&config);
    log::info!(
        "scene with {} targets, {:?} animation, preempt={}",
        scene.targets.len(),
        scene.animation.mode,
        scene.animation.preempt
    );

    let mut data = AppState {
        debug: args.debug,
        wireframe: args.wireframe,
        show_helpers: !args.hide_helpers,
        ..AppState::default()
    };

    let _terminal = TerminalGuard::enter().context("failed to set up terminal")?;
    run(&args, &mut scene, &mut data)
}
