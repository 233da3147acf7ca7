use log::{debug, info};
use std::time::Duration;

use super::{Cooldown, Exercise, RepCounter, RepEvent};
use crate::config::HighKneeConfig;
use crate::pose::{Pose, Side};

/// Knee height state for one leg
struct LegTracker {
    side: Side,
    baseline_frames: u32,
    up_threshold: f32,
    down_threshold: f32,
    samples: u32,
    sum: f32,
    baseline: Option<f32>,
    is_up: bool,
    cooldown: Cooldown,
}

impl LegTracker {
    fn new(side: Side, config: &HighKneeConfig) -> Self {
        Self {
            side,
            baseline_frames: config.baseline_frames.max(1),
            up_threshold: config.up_threshold,
            down_threshold: config.down_threshold,
            samples: 0,
            sum: 0.0,
            baseline: None,
            is_up: false,
            cooldown: Cooldown::inclusive_millis(config.cooldown_ms),
        }
    }

    /// True when this frame completes a knee raise
    fn update(&mut self, knee_y: f32, now: Duration) -> bool {
        let baseline = match self.baseline {
            Some(b) => b,
            None => {
                self.sum += knee_y;
                self.samples += 1;
                if self.samples >= self.baseline_frames {
                    let b = self.sum / self.samples as f32;
                    debug!("high_knee: {} knee baseline {:.3}", self.side.name(), b);
                    self.baseline = Some(b);
                }
                return false;
            }
        };

        let raise = baseline - knee_y;
        if raise > self.up_threshold && !self.is_up && self.cooldown.is_ready(now) {
            self.is_up = true;
            self.cooldown.trigger(now);
            return true;
        }
        if raise < self.down_threshold {
            self.is_up = false;
        }
        false
    }

    /// Leg out of sight: keep the baseline, drop the raise in progress
    fn lose_sight(&mut self) {
        self.is_up = false;
    }

    fn reset(&mut self) {
        self.samples = 0;
        self.sum = 0.0;
        self.baseline = None;
        self.is_up = false;
        self.cooldown.reset();
    }
}

/// High knee detector: each leg counts on its own.
///
/// Each leg averages a resting knee height over its first frames, then counts
/// a rep when the knee rises far enough above that baseline. A leg must drop
/// back near the baseline before it can count again.
pub struct HighKneeCounter {
    min_confidence: f32,
    left: LegTracker,
    right: LegTracker,
    warmed_up: bool,
    count: u32,
}

impl HighKneeCounter {
    pub fn from_config(config: &HighKneeConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            left: LegTracker::new(Side::Left, config),
            right: LegTracker::new(Side::Right, config),
            warmed_up: false,
            count: 0,
        }
    }

    /// Knee Y for a leg whose hip and knee both pass the gate
    fn knee_y(&self, pose: &Pose, side: Side) -> Option<f32> {
        let hip = pose.get(side.hip());
        let knee = pose.get(side.knee());
        if hip.is_valid(self.min_confidence) && knee.is_valid(self.min_confidence) {
            Some(knee.y)
        } else {
            None
        }
    }
}

impl RepCounter for HighKneeCounter {
    fn exercise(&self) -> Exercise {
        Exercise::HighKnee
    }

    fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent> {
        let left_y = self.knee_y(pose, Side::Left);
        let right_y = self.knee_y(pose, Side::Right);
        if left_y.is_none() {
            self.left.lose_sight();
        }
        if right_y.is_none() {
            self.right.lose_sight();
        }
        if left_y.is_none() && right_y.is_none() {
            debug!("high_knee: no leg visible");
            return None;
        }

        // first frame with a visible leg is often a partial detection
        if !self.warmed_up {
            self.warmed_up = true;
            return None;
        }

        let mut reps = 0;
        if let Some(y) = left_y {
            if self.left.update(y, now) {
                reps += 1;
            }
        }
        if let Some(y) = right_y {
            if self.right.update(y, now) {
                reps += 1;
            }
        }
        if reps == 0 {
            return None;
        }

        self.count += reps;
        info!("high knee #{} (+{})", self.count, reps);
        Some(RepEvent {
            exercise: Exercise::HighKnee,
            count: self.count,
            timestamp: now,
        })
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.warmed_up = false;
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}
