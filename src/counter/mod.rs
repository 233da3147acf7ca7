//! Per-exercise repetition detectors.
//!
//! Every detector is a small streaming state machine: it consumes one
//! [`Pose`] per call together with a monotonic timestamp and returns at most
//! one [`RepEvent`]. Detectors never block, never do I/O and never fail; bad
//! input simply produces no event.

pub mod arm_circle;
pub mod biceps_curl;
pub mod cooldown;
pub mod high_knee;
pub mod jump;
pub mod jumping_jack;
pub mod shoulder_press;
pub mod side_reach;
pub mod squat;

pub use arm_circle::ArmCircleCounter;
pub use biceps_curl::BicepsCurlCounter;
pub use cooldown::Cooldown;
pub use high_knee::HighKneeCounter;
pub use jump::JumpCounter;
pub use jumping_jack::JumpingJackCounter;
pub use shoulder_press::ShoulderPressCounter;
pub use side_reach::SideReachCounter;
pub use squat::SquatCounter;

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::CountersConfig;
use crate::pose::Pose;

/// Exercise selected for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    Jump,
    ArmCircle,
    HighKnee,
    JumpingJack,
    BicepsCurl,
    ShoulderPress,
    SideReach,
    Squat,
}

impl Exercise {
    pub const ALL: [Exercise; 8] = [
        Exercise::Jump,
        Exercise::ArmCircle,
        Exercise::HighKnee,
        Exercise::JumpingJack,
        Exercise::BicepsCurl,
        Exercise::ShoulderPress,
        Exercise::SideReach,
        Exercise::Squat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Exercise::Jump => "jump",
            Exercise::ArmCircle => "arm_circle",
            Exercise::HighKnee => "high_knee",
            Exercise::JumpingJack => "jumping_jack",
            Exercise::BicepsCurl => "biceps_curl",
            Exercise::ShoulderPress => "shoulder_press",
            Exercise::SideReach => "side_reach",
            Exercise::Squat => "squat",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown exercise: {0}")]
pub struct UnknownExercise(pub String);

impl FromStr for Exercise {
    type Err = UnknownExercise;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "jump" => Ok(Exercise::Jump),
            "arm_circle" | "arm_circles" => Ok(Exercise::ArmCircle),
            "high_knee" | "high_knees" => Ok(Exercise::HighKnee),
            "jumping_jack" | "jumping_jacks" | "jack_jumps" => Ok(Exercise::JumpingJack),
            "biceps_curl" | "bicep_curl" => Ok(Exercise::BicepsCurl),
            "shoulder_press" => Ok(Exercise::ShoulderPress),
            "side_reach" => Ok(Exercise::SideReach),
            "squat" | "squats" => Ok(Exercise::Squat),
            _ => Err(UnknownExercise(s.to_string())),
        }
    }
}

/// One confirmed repetition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepEvent {
    pub exercise: Exercise,
    /// Cumulative count after this repetition
    pub count: u32,
    /// Stream time of the frame that completed the repetition
    pub timestamp: Duration,
}

/// Contract shared by every exercise detector
pub trait RepCounter {
    fn exercise(&self) -> Exercise;

    /// Consume one frame. `now` is read once by the caller per frame and must
    /// be non-decreasing across calls.
    fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent>;

    /// Clear everything: count, baselines, flags and timers
    fn reset(&mut self);

    fn count(&self) -> u32;
}

/// Build the detector for `exercise` from its config section
pub fn build_counter(exercise: Exercise, config: &CountersConfig) -> Box<dyn RepCounter + Send> {
    match exercise {
        Exercise::Jump => Box::new(JumpCounter::from_config(&config.jump)),
        Exercise::ArmCircle => Box::new(ArmCircleCounter::from_config(&config.arm_circle)),
        Exercise::HighKnee => Box::new(HighKneeCounter::from_config(&config.high_knee)),
        Exercise::JumpingJack => Box::new(JumpingJackCounter::from_config(&config.jumping_jack)),
        Exercise::BicepsCurl => Box::new(BicepsCurlCounter::from_config(&config.biceps_curl)),
        Exercise::ShoulderPress => {
            Box::new(ShoulderPressCounter::from_config(&config.shoulder_press))
        }
        Exercise::SideReach => Box::new(SideReachCounter::from_config(&config.side_reach)),
        Exercise::Squat => Box::new(SquatCounter::from_config(&config.squat)),
    }
}

/// Active detector for one session, with an enable switch.
///
/// While disabled, frames are accepted but dropped before they reach the
/// detector, so neither counts nor calibration change.
pub struct Detector {
    counter: Box<dyn RepCounter + Send>,
    enabled: bool,
}

impl Detector {
    pub fn new(exercise: Exercise, config: &CountersConfig) -> Self {
        Self {
            counter: build_counter(exercise, config),
            enabled: true,
        }
    }

    pub fn exercise(&self) -> Exercise {
        self.counter.exercise()
    }

    pub fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent> {
        if !self.enabled {
            return None;
        }
        self.counter.process(pose, now)
    }

    /// Raw `(x, y, confidence)` ingestion; malformed frames are a no-op
    pub fn process_raw(&mut self, triples: &[[f32; 3]], now: Duration) -> Option<RepEvent> {
        match Pose::from_triples(triples) {
            Ok(pose) => self.process(&pose, now),
            Err(e) => {
                debug!("{}: dropping frame: {}", self.exercise(), e);
                None
            }
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enable(&mut self) {
        self.set_enabled(true);
    }

    pub fn disable(&mut self) {
        self.set_enabled(false);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn reset(&mut self) {
        self.counter.reset();
    }

    pub fn count(&self) -> u32 {
        self.counter.count()
    }
}
