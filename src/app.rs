use crate::config::{load_settings, load_settings_or_default, project_paths, Settings};
use crate::effects;
use crate::engine::{Engine, Flow, FrameOutcome};
use crate::host::{Clock, HeadlessSurface, ManualClock, SystemClock};
use crate::terminal::{TerminalInput, TerminalSurface};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How long startup waits for the first effect before drawing anyway.
const FIRST_LOAD_WAIT: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "ledwall", about = "LED matrix effects in the terminal")]
struct Args {
    /// Settings file (JSON). Defaults to the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Active frame rate
    #[arg(long)]
    fps: Option<f64>,

    /// Frame rate after the idle timeout
    #[arg(long)]
    idle_fps: Option<f64>,

    #[arg(long)]
    idle_timeout_ms: Option<u64>,

    /// Effect to show first
    #[arg(long)]
    effect: Option<String>,

    /// Random seed (0 = from entropy)
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Render to memory and print the last frame instead of taking over the terminal
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Headless viewport in pixels
    #[arg(long, value_parser = parse_viewport, default_value = "1280x720")]
    viewport: (u32, u32),

    /// Headless host frame callbacks to simulate
    #[arg(long, default_value_t = 90)]
    frames: u32,
}

impl Args {
    fn apply(&self, s: &mut Settings) {
        if let Some(v) = self.fps {
            s.active_fps = v;
        }
        if let Some(v) = self.idle_fps {
            s.idle_fps = v;
        }
        if let Some(v) = self.idle_timeout_ms {
            s.idle_timeout_ms = v;
        }
        if let Some(v) = &self.effect {
            s.start_effect = Some(v.clone());
        }
        if let Some(v) = self.seed {
            s.seed = v;
        }
    }
}

fn parse_viewport(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let w = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if w == 0 || h == 0 {
        return Err("viewport must be non-empty".to_string());
    }
    Ok((w, h))
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let paths = project_paths().ok();

    let mut settings = match &args.config {
        Some(path) => load_settings(path)?,
        None => paths
            .as_ref()
            .map(|p| load_settings_or_default(&p.settings_path))
            .unwrap_or_default(),
    };
    args.apply(&mut settings);

    if args.headless {
        init_tracing(args.log_file.as_deref())?;
        return run_headless(&settings, args.viewport, args.frames);
    }

    // the terminal is the display, so logs go to a file
    let log_path = args
        .log_file
        .clone()
        .or_else(|| paths.as_ref().map(|p| p.log_path.clone()));
    if let Some(path) = &log_path {
        init_tracing(Some(path))?;
    }
    install_panic_hook();
    run_terminal(&settings)
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    // RUST_LOG=ledwall=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|e| anyhow!("installing log subscriber: {e}"))
}

/// Logs every panic. Effect panics are caught by the engine; anything else
/// unwinds through `run_terminal`, and dropping the surface restores the screen.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "<unknown>".to_string());
        tracing::error!(%location, %payload, "panic");
    }));
}

fn start_engine<S: crate::host::Surface>(
    settings: &Settings,
    surface: S,
    viewport: (u32, u32),
    now_ms: u64,
) -> Result<Engine<S>> {
    let mut engine = Engine::new(settings, surface, effects::loader());
    engine.init(viewport, now_ms)?;
    for path in &settings.effects {
        engine.load(path);
    }
    Ok(engine)
}

fn run_terminal(settings: &Settings) -> Result<()> {
    let clock = SystemClock::default();
    let surface = TerminalSurface::begin()?;
    let viewport = surface.viewport();
    let mut input = TerminalInput::new(
        settings.key_release_ms,
        settings.key_repeat_delay_ms,
        surface.reports_key_release(),
    );
    let mut engine = start_engine(settings, surface, viewport, clock.now_ms())?;
    engine.wait_for_loads(FIRST_LOAD_WAIT);

    loop {
        let now = clock.now_ms();
        let wait = engine.next_frame_in(now);
        let mut quit = false;
        for ev in input.poll(wait, clock.now_ms())? {
            if engine.handle_event(ev, clock.now_ms())? == Flow::Quit {
                quit = true;
                break;
            }
        }
        if quit {
            break;
        }

        let status = status_line(&engine);
        engine.surface_mut().set_status(status);
        if engine.frame(clock.now_ms())? == FrameOutcome::Stopped {
            break;
        }
    }

    engine.shutdown();
    engine.into_surface().end()?;
    Ok(())
}

fn status_line<S: crate::host::Surface>(engine: &Engine<S>) -> String {
    let dims = engine.dimensions();
    format!(
        " {}  {}x{} -> {}x{}  {}  ^N: next  hold click: fullscreen  ^Q: quit",
        engine.active_effect().unwrap_or("-"),
        dims.logical_cols(),
        dims.logical_rows(),
        dims.visual_cols(),
        dims.visual_rows(),
        if engine.scheduler().is_idle() { "idle" } else { "live" },
    )
}

fn run_headless(settings: &Settings, viewport: (u32, u32), frames: u32) -> Result<()> {
    let clock = ManualClock::new(0);
    let surface = HeadlessSurface::new(settings.pixel_limits());
    let mut engine = start_engine(settings, surface, viewport, clock.now_ms())?;
    let loaded = engine.wait_for_loads(Duration::from_secs(5));
    if engine.pending_loads() > 0 {
        warn!(pending = engine.pending_loads(), "some effects did not finish loading");
    }

    let step = settings.pacing().active_interval_ms().ceil() as u64;
    let mut rendered = 0;
    let mut faulted = 0;
    for _ in 0..frames {
        match engine.frame(clock.now_ms())? {
            FrameOutcome::Rendered { .. } => rendered += 1,
            FrameOutcome::Faulted => faulted += 1,
            _ => {}
        }
        clock.advance(step.max(1));
    }
    engine.shutdown();

    let dims = engine.dimensions().clone();
    let names = engine.effect_names();
    let active = engine.active_effect().map(str::to_string);
    info!(rendered, faulted, "headless run finished");

    let surface = engine.into_surface();
    println!(
        "viewport {}x{}  visual {}x{} @{}px  logical {}x{}  offsets {:?}",
        viewport.0,
        viewport.1,
        dims.visual_cols(),
        dims.visual_rows(),
        surface.pixel(),
        dims.logical_cols(),
        dims.logical_rows(),
        dims.offsets(),
    );
    println!(
        "effects loaded {loaded} [{}]  last active {}",
        names.join(", "),
        active.as_deref().unwrap_or("-")
    );
    println!(
        "frames {frames}  rendered {rendered}  faulted {faulted}  element writes {}",
        surface.writes()
    );
    print!("{}", surface.render_text());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_parses_both_separators() {
        assert_eq!(parse_viewport("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_viewport("720X1280"), Ok((720, 1280)));
        assert!(parse_viewport("1280").is_err());
        assert!(parse_viewport("0x10").is_err());
    }

    #[test]
    fn cli_overrides_settings() {
        let args = Args::parse_from([
            "ledwall",
            "--fps",
            "60",
            "--effect",
            "pong",
            "--seed",
            "7",
            "--headless",
        ]);
        let mut s = Settings::default();
        args.apply(&mut s);
        assert_eq!(s.active_fps, 60.0);
        assert_eq!(s.start_effect.as_deref(), Some("pong"));
        assert_eq!(s.seed, 7);
        assert_eq!(args.viewport, (1280, 720));
        assert!(args.headless);
    }
}
