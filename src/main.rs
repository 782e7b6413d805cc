//! Lanes - automation lanes for synthesis engine parameters

use anyhow::{bail, Result};
use clap::Parser;
use lanes::config;
use lanes::engine::{normalize, LaneRecorder, RenderOptions, Renderer};
use std::io::Write;

mod cli;

use cli::{csv_field, Cli, Commands};

fn render_options(frame_ms: f64) -> Result<RenderOptions> {
    if !(frame_ms > 0.0 && frame_ms.is_finite()) {
        bail!("Frame length must be a positive number of milliseconds");
    }
    Ok(RenderOptions {
        frame_ms,
        ..RenderOptions::default()
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { session: path } => {
            println!("Checking session at {:?}...", path);

            match config::load_session(&path) {
                Ok(session) => {
                    println!("Session is valid!");
                    println!("  BPM: {}", session.bpm);
                    println!(
                        "  Swing: {}{}",
                        session.swing,
                        if session.swing_steps { "" } else { " (not applied to steps)" }
                    );
                    println!("  Length: {}s", session.length_sec);
                    println!("  Spline: {:?}", session.spline);
                    println!("  Lanes: {}", session.lanes.len());
                    for (name, lane) in &session.lanes {
                        println!(
                            "    - {} [{}, {}] {}",
                            name,
                            lane.min,
                            lane.max,
                            if lane.enabled { "[enabled]" } else { "[disabled]" }
                        );
                    }
                    println!("  Bindings: {}", session.bindings.len());
                    for binding in &session.bindings {
                        println!(
                            "    - {} <- {} (default {})",
                            binding.param,
                            binding.lane_name(),
                            binding.default
                        );
                    }
                    let warnings = session.warnings();
                    if !warnings.is_empty() {
                        println!("  Warnings:");
                        for warning in warnings {
                            println!("    - {}", warning);
                        }
                    }
                }
                Err(e) => {
                    println!("Session is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Eval { session: path, lane, time } => {
            let session = config::load_session(&path)?;
            if session.lane(&lane).is_none() {
                bail!("Unknown lane '{}'", lane);
            }

            match session.evaluate(&lane, time) {
                Some(value) => println!("{}", value),
                None => println!("none"),
            }
        }

        Commands::Dump { session: path, frame_ms } => {
            let session = config::load_session(&path)?;
            let names: Vec<String> = session.lanes.keys().map(|name| csv_field(name)).collect();
            let mut renderer = Renderer::new(session, render_options(frame_ms)?);

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "time,{}", names.join(","))?;
            for frame in renderer.frames() {
                let row: Vec<String> = frame
                    .lanes
                    .values()
                    .map(|value| value.map(|v| format!("{:.6}", v)).unwrap_or_default())
                    .collect();
                writeln!(out, "{:.4},{}", frame.time, row.join(","))?;
            }
        }

        Commands::Record {
            session: path,
            output,
            frame_ms,
            bits,
        } => {
            println!("Loading session from {:?}...", path);
            let session = config::load_session(&path)?;
            let mut renderer = Renderer::new(session, render_options(frame_ms)?);

            let Some(frame_rate) = renderer.exact_frame_rate() else {
                bail!(
                    "Frame length {} ms does not divide one second; WAV needs a whole-number rate",
                    frame_ms
                );
            };
            let total = renderer.frame_count();
            let length = renderer.session().length_sec;
            let bounds: Vec<(f64, f64)> = renderer
                .session()
                .lanes
                .values()
                .map(|lane| (lane.min, lane.max))
                .collect();

            println!(
                "Recording {} lanes, {} frames at {} Hz to {:?}...",
                bounds.len(),
                total,
                frame_rate,
                output
            );
            let mut recorder = LaneRecorder::new(&output, bounds.len(), frame_rate, bits)?;

            let mut samples = vec![0.0f32; bounds.len()];
            for frame in renderer.frames() {
                for ((sample, value), &(min, max)) in
                    samples.iter_mut().zip(frame.lanes.values()).zip(&bounds)
                {
                    *sample = match (value, bits) {
                        (None, _) => 0.0,
                        (Some(v), 32) => *v as f32,
                        (Some(v), _) => normalize(*v, min, max),
                    };
                }
                recorder.write_frame(&samples)?;

                // Progress update every second
                if frame.index % frame_rate as usize == 0 {
                    print!("\r  Progress: {:.0}s / {:.0}s", frame.time, length);
                    std::io::stdout().flush()?;
                }
            }

            recorder.finalize()?;
            println!("\nRecorded to {:?}", output);
        }

        Commands::Init => {
            let path = "session.yaml";
            if std::path::Path::new(path).exists() {
                println!("session.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, config::EXAMPLE_SESSION)?;
                println!("Created session.yaml with example lanes.");
            }
        }
    }

    Ok(())
}
