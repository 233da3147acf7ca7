use log::{debug, info};
use std::time::Duration;

use super::{Cooldown, Exercise, RepCounter, RepEvent};
use crate::config::SquatConfig;
use crate::pose::Pose;

/// Squat detector on the mean shoulder height.
///
/// The first frame with both shoulders visible sets the standing baseline.
/// Dropping below it by `down_threshold` enters the squat; coming back within
/// `up_band` of the baseline completes the rep. While standing, the baseline
/// follows the body slowly on a fixed interval.
pub struct SquatCounter {
    config: SquatConfig,
    baseline: Option<f32>,
    last_drift: Duration,
    is_down: bool,
    cooldown: Cooldown,
    count: u32,
}

impl SquatCounter {
    pub fn from_config(config: &SquatConfig) -> Self {
        Self {
            config: config.clone(),
            baseline: None,
            last_drift: Duration::ZERO,
            is_down: false,
            cooldown: Cooldown::from_millis(config.cooldown_ms),
            count: 0,
        }
    }

    pub fn baseline(&self) -> Option<f32> {
        self.baseline
    }
}

impl RepCounter for SquatCounter {
    fn exercise(&self) -> Exercise {
        Exercise::Squat
    }

    fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent> {
        let Some(shoulder_y) = pose.shoulder_mid_y(self.config.min_confidence) else {
            // the baseline stays, a squat in progress does not
            if self.is_down {
                debug!("squat: shoulders lost while down, dropping squat");
            }
            self.is_down = false;
            return None;
        };

        let Some(baseline) = self.baseline else {
            debug!("squat: baseline shoulder y {:.3}", shoulder_y);
            self.baseline = Some(shoulder_y);
            self.last_drift = now;
            return None;
        };

        // positive = below the baseline
        let movement = shoulder_y - baseline;
        let mut completed = false;
        if !self.is_down && movement > self.config.down_threshold {
            self.is_down = true;
            debug!("squat: down ({:.3})", movement);
        } else if self.is_down && movement.abs() < self.config.up_band {
            self.is_down = false;
            completed = true;
        }

        let interval = Duration::from_millis(self.config.drift_interval_ms);
        if now.saturating_sub(self.last_drift) >= interval {
            self.last_drift = now;
            if !self.is_down && movement.abs() < self.config.up_band {
                let rate = self.config.drift_rate;
                self.baseline = Some(baseline * (1.0 - rate) + shoulder_y * rate);
            }
        }

        if !completed {
            return None;
        }
        if !self.cooldown.is_ready(now) {
            debug!("squat: rep inside cooldown");
            return None;
        }

        self.count += 1;
        self.cooldown.trigger(now);
        info!("squat #{}", self.count);
        Some(RepEvent {
            exercise: Exercise::Squat,
            count: self.count,
            timestamp: now,
        })
    }

    fn reset(&mut self) {
        self.baseline = None;
        self.last_drift = Duration::ZERO;
        self.is_down = false;
        self.cooldown.reset();
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}
