use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reel_playback::config::Config;
use reel_playback::models::{MediaSource, PlaybackOptions, PlayerSnapshot};
use reel_playback::player::{
    ActivitySignal, Key, Modifiers, PlaybackCallbacks, PlayerController, PlayerHandle,
    SimulatedEngine, SimulatedEngineOptions,
};
use reel_playback::utils::format_seconds;

const HELP: &str = "\
keys:     space | f | m | 9 | 0 | left | right | up | down | home | end
          (prefix arrows with shift+ or ctrl+ for 1s / 10s skips)
commands: seek <fraction> | skip <seconds> | volume <0..1> | drag <fraction>
          hover | leave | move | load <source> | status | help | quit";

#[derive(Parser)]
#[command(name = "reel-playback")]
#[command(version, about = "Drive a playback controller against a simulated engine", after_help = HELP)]
struct Args {
    /// Media URL or local path
    source: String,

    /// Start playing as soon as the media is ready
    #[arg(long)]
    autoplay: bool,

    /// Start with audio muted
    #[arg(long)]
    muted: bool,

    /// Length of the simulated media in seconds
    #[arg(long, value_name = "SECONDS")]
    duration: Option<f64>,
}

impl Args {
    fn playback_options(&self) -> PlaybackOptions {
        PlaybackOptions::default()
            .auto_play(self.autoplay)
            .start_muted(self.muted)
    }
}

fn parse_key(input: &str) -> Option<(Key, Modifiers)> {
    let (modifiers, name) = if let Some(rest) = input.strip_prefix("shift+") {
        (Modifiers::SHIFT, rest)
    } else if let Some(rest) = input.strip_prefix("ctrl+") {
        (Modifiers::CTRL, rest)
    } else {
        (Modifiers::NONE, input)
    };

    let key = match name {
        "" | "space" => Key::Space,
        "left" => Key::Left,
        "right" => Key::Right,
        "up" => Key::Up,
        "down" => Key::Down,
        "home" => Key::Home,
        "end" => Key::End,
        "f11" => Key::F11,
        "esc" => Key::Escape,
        single if single.chars().count() == 1 => Key::Char(single.chars().next()?),
        _ => return None,
    };
    Some((key, modifiers))
}

fn status_line(snapshot: &PlayerSnapshot) -> String {
    let session = &snapshot.session;
    let duration = session
        .duration
        .map(format_seconds)
        .unwrap_or_else(|| "--:--".to_string());
    let volume = if session.is_muted {
        "muted".to_string()
    } else {
        format!("{:.0}%", session.volume * 100.0)
    };

    let mut line = format!(
        "[{}] {} / {}  vol {}  buffered {:.0}%",
        session.state,
        format_seconds(session.current_time),
        duration,
        volume,
        session.buffered_fraction * 100.0
    );
    if session.is_fullscreen {
        line.push_str("  fullscreen");
    }
    if !snapshot.controls.visible {
        line.push_str("  (controls hidden)");
    }
    if let Some(gesture) = snapshot.seek_gesture {
        line.push_str(&format!("  dragging {:.0}%", gesture.proposed_fraction * 100.0));
    }
    if let Some(error) = &session.error {
        line.push_str(&format!("  error: {}", error));
    }
    line
}

/// Returns false when the user asked to quit.
async fn handle_line(handle: &PlayerHandle, line: &str) -> Result<bool> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");
    let argument = parts.next();

    let number = || -> Result<f64> {
        let value = argument.context("missing numeric argument")?;
        value
            .parse::<f64>()
            .with_context(|| format!("Invalid number: {}", value))
    };

    match command {
        "quit" | "q" => return Ok(false),
        "help" => println!("{}", HELP),
        "status" => {
            let snapshot = handle.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        "seek" => handle.seek_to_fraction(number()?),
        "skip" => handle.skip_by_seconds(number()?),
        "volume" => handle.set_volume(number()?),
        "drag" => {
            handle.begin_seek_gesture();
            handle.seek_to_fraction(number()?);
            handle.end_seek_gesture();
        }
        "hover" => handle.activity(ActivitySignal::PointerEnter),
        "leave" => handle.activity(ActivitySignal::PointerLeave),
        "move" => handle.activity(ActivitySignal::PointerMove),
        "load" => {
            let source = argument.context("load needs a source")?;
            handle
                .set_source(MediaSource::new(source), PlaybackOptions::default())
                .await?;
        }
        key => match parse_key(key) {
            Some((key, modifiers)) => handle.key_pressed(key, modifiers),
            None => warn!("Unknown command {:?}, type help", key),
        },
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Status lines go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reel_playback=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load().context("Failed to load configuration")?;

    let mut engine_options = SimulatedEngineOptions::default();
    if let Some(duration) = args.duration {
        engine_options.duration = duration;
    }
    let engine = Arc::new(SimulatedEngine::new(engine_options));

    let callbacks = PlaybackCallbacks::default()
        .on_play(|| info!("on_play"))
        .on_pause(|| info!("on_pause"));

    let source = MediaSource::new(args.source.as_str()).with_title(args.source.clone());
    let handle = PlayerController::spawn(
        engine,
        source,
        args.playback_options(),
        callbacks,
        &config,
    );

    let mut snapshots = handle.subscribe();
    let printer = tokio::spawn(async move {
        let mut last = String::new();
        while snapshots.changed().await.is_ok() {
            let line = status_line(&snapshots.borrow_and_update());
            if line != last {
                println!("{}", line);
                last = line;
            }
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match handle_line(&handle, line.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => warn!("{:#}", e),
        }
    }

    handle.detach().await?;
    drop(handle);
    let _ = printer.await;
    info!("Bye");
    Ok(())
}
