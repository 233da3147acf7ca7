use anyhow::{bail, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use rep_tracker::config::Config;
use rep_tracker::counter::Exercise;
use rep_tracker::pose::load_recording;
use rep_tracker::session::{EventSink, Session};
use rep_tracker::stats::UserStats;

/// Replay a recorded keypoint stream through one exercise detector
#[derive(Parser)]
#[command(name = "rep_replay")]
#[command(about = "Count exercise reps in a recorded keypoint stream", long_about = None)]
struct Cli {
    /// Exercise to detect (e.g. "squat", "jumping_jack")
    #[arg(short, long)]
    exercise: Exercise,

    /// Detector and session config
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// JSON-lines recording: {"t_ms": 0, "keypoints": [[x, y, c], ...]}
    #[arg(value_name = "RECORDING")]
    recording: PathBuf,

    /// Stats file to fold the session summary into
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Print events and the summary as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config);
    // recorded streams start in position
    config.session.countdown_secs = 0;

    let frames = load_recording(&cli.recording)?;
    if frames.is_empty() {
        bail!("{} contains no frames", cli.recording.display());
    }

    if !cli.json {
        println!("Rep Replay ({})", env!("GIT_VERSION"));
        println!("Exercise: {}", cli.exercise);
        println!("Frames: {}", frames.len());
        println!("Goal: {} reps", config.session.target_reps);
        println!();
    }

    let mut session = Session::new(cli.exercise, &config, EventSink::discard());
    session.start(frames[0].timestamp());

    let mut last = frames[0].timestamp();
    for frame in &frames {
        last = frame.timestamp();
        if let Some(event) = session.push_raw(&frame.keypoints, last) {
            if cli.json {
                println!("{}", serde_json::to_string(&event)?);
            } else {
                println!(
                    "[{:>8.3}s] {} #{}",
                    event.timestamp.as_secs_f64(),
                    event.exercise,
                    event.count
                );
            }
        }
    }
    session.stop(last);

    let summary = session.summary();
    if cli.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!();
        println!(
            "{}: {} reps in {:.1}s{}",
            summary.exercise,
            summary.reps,
            summary.duration.as_secs_f64(),
            if summary.completed {
                format!(" (goal reached, +{} XP)", summary.xp_earned)
            } else {
                String::new()
            }
        );
    }

    if let Some(path) = &cli.stats {
        let mut stats = UserStats::load_or_default(path);
        stats.record(&summary);
        stats.save(path)?;
        info!(
            "stats: {} XP, level {}, {} to next level",
            stats.xp,
            stats.level,
            stats.xp_to_next_level()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_exercise_alias() {
        let cli = Cli::try_parse_from(["rep_replay", "-e", "jack-jumps", "rec.jsonl"]).unwrap();
        assert_eq!(cli.exercise, Exercise::JumpingJack);
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(cli.stats.is_none());
    }

    #[test]
    fn test_cli_rejects_unknown_exercise() {
        assert!(Cli::try_parse_from(["rep_replay", "-e", "burpee", "rec.jsonl"]).is_err());
    }
}
