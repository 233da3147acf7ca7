use log::{debug, info};
use std::time::Duration;

use super::{Cooldown, Exercise, RepCounter, RepEvent};
use crate::config::ShoulderPressConfig;
use crate::pose::{Pose, Side};

/// Shoulder press detector.
///
/// Each arm arms its own flag when the wrist is level with the shoulder and
/// completes a rep when the wrist is pushed well above it. The arm has to come
/// back down to shoulder height before it can press again.
pub struct ShoulderPressCounter {
    min_confidence: f32,
    start_band: f32,
    press_threshold: f32,
    seen_valid: bool,
    /// Starting-position flags, `[left, right]`
    in_start: [bool; 2],
    cooldown: Cooldown,
    count: u32,
}

impl ShoulderPressCounter {
    pub fn from_config(config: &ShoulderPressConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            start_band: config.start_band,
            press_threshold: config.press_threshold,
            seen_valid: false,
            in_start: [false; 2],
            cooldown: Cooldown::from_millis(config.cooldown_ms),
            count: 0,
        }
    }

    /// `shoulder.y - wrist.y` for a visible arm; positive = wrist above shoulder
    fn wrist_height(&self, pose: &Pose, side: Side) -> Option<f32> {
        let shoulder = pose.get(side.shoulder());
        let wrist = pose.get(side.wrist());
        if shoulder.is_valid(self.min_confidence) && wrist.is_valid(self.min_confidence) {
            Some(shoulder.y - wrist.y)
        } else {
            None
        }
    }
}

impl RepCounter for ShoulderPressCounter {
    fn exercise(&self) -> Exercise {
        Exercise::ShoulderPress
    }

    fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent> {
        let heights = Side::BOTH.map(|side| self.wrist_height(pose, side));
        // an arm out of sight loses its starting position
        for (side, height) in Side::BOTH.into_iter().zip(heights) {
            if height.is_none() {
                self.in_start[side as usize] = false;
            }
        }
        if heights.iter().all(Option::is_none) {
            debug!("shoulder_press: no arm visible");
            return None;
        }
        if !self.seen_valid {
            self.seen_valid = true;
            return None;
        }

        let mut pressed = false;
        for (side, height) in Side::BOTH.into_iter().zip(heights) {
            let Some(h) = height else { continue };
            let in_start = &mut self.in_start[side as usize];
            if h.abs() <= self.start_band {
                if !*in_start {
                    debug!("shoulder_press: {} arm in starting position", side.name());
                }
                *in_start = true;
            } else if h > self.press_threshold && *in_start {
                *in_start = false;
                pressed = true;
            }
        }

        if !pressed {
            return None;
        }
        if !self.cooldown.is_ready(now) {
            debug!("shoulder_press: press inside cooldown");
            return None;
        }

        self.count += 1;
        self.cooldown.trigger(now);
        info!("shoulder press #{}", self.count);
        Some(RepEvent {
            exercise: Exercise::ShoulderPress,
            count: self.count,
            timestamp: now,
        })
    }

    fn reset(&mut self) {
        self.seen_valid = false;
        self.in_start = [false; 2];
        self.cooldown.reset();
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}
