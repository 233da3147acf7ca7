use log::{debug, info};
use std::time::Duration;

use super::{Cooldown, Exercise, RepCounter, RepEvent};
use crate::config::BicepsCurlConfig;
use crate::pose::{Pose, Side};

#[derive(Debug, Default)]
struct ArmState {
    /// Last `elbow.y - wrist.y` seen while the arm was visible
    prev_rel: Option<f32>,
    curled: bool,
}

/// Biceps curl detector.
///
/// Watches the wrist height relative to the elbow on each arm. A fast rise
/// marks the curl, a fast drop afterwards completes it. By default every arm
/// keeps its own curl flag; `shared_curl_flag` switches to a single flag that
/// either arm can set or clear.
pub struct BicepsCurlCounter {
    min_confidence: f32,
    up_threshold: f32,
    down_threshold: f32,
    shared_curl_flag: bool,
    left: ArmState,
    right: ArmState,
    shared_curled: bool,
    cooldown: Cooldown,
    count: u32,
}

impl BicepsCurlCounter {
    pub fn from_config(config: &BicepsCurlConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            up_threshold: config.up_threshold,
            down_threshold: config.down_threshold,
            shared_curl_flag: config.shared_curl_flag,
            left: ArmState::default(),
            right: ArmState::default(),
            shared_curled: false,
            cooldown: Cooldown::from_millis(config.cooldown_ms),
            count: 0,
        }
    }

    /// Frame-to-frame change of `elbow.y - wrist.y`. The first visible frame
    /// of an arm only seeds it; losing the arm drops its curl in progress.
    fn arm_movement(&mut self, pose: &Pose, side: Side) -> Option<f32> {
        let elbow = pose.get(side.elbow());
        let wrist = pose.get(side.wrist());
        let visible = elbow.is_valid(self.min_confidence) && wrist.is_valid(self.min_confidence);
        let state = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        if !visible {
            *state = ArmState::default();
            return None;
        }
        let rel = elbow.y - wrist.y;
        state.prev_rel.replace(rel).map(|prev| rel - prev)
    }

    /// Advances a curl flag; true when a curl completes
    fn step(curled: &mut bool, movement: f32, up: f32, down: f32) -> bool {
        if !*curled && movement > up {
            *curled = true;
            false
        } else if *curled && movement < -down {
            *curled = false;
            true
        } else {
            false
        }
    }
}

impl RepCounter for BicepsCurlCounter {
    fn exercise(&self) -> Exercise {
        Exercise::BicepsCurl
    }

    fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent> {
        let left = self.arm_movement(pose, Side::Left);
        let right = self.arm_movement(pose, Side::Right);
        let (up, down) = (self.up_threshold, self.down_threshold);
        if self.left.prev_rel.is_none() && self.right.prev_rel.is_none() {
            self.shared_curled = false;
        }

        let completed = if self.shared_curl_flag {
            let mut done = false;
            if let Some(m) = left {
                done = Self::step(&mut self.shared_curled, m, up, down);
            }
            if !done {
                if let Some(m) = right {
                    done = Self::step(&mut self.shared_curled, m, up, down);
                }
            }
            done
        } else {
            let l = left.is_some_and(|m| Self::step(&mut self.left.curled, m, up, down));
            let r = right.is_some_and(|m| Self::step(&mut self.right.curled, m, up, down));
            l || r
        };

        if !completed {
            return None;
        }
        if !self.cooldown.is_ready(now) {
            debug!("biceps_curl: curl inside cooldown");
            return None;
        }

        self.count += 1;
        self.cooldown.trigger(now);
        info!("biceps curl #{}", self.count);
        Some(RepEvent {
            exercise: Exercise::BicepsCurl,
            count: self.count,
            timestamp: now,
        })
    }

    fn reset(&mut self) {
        self.left = ArmState::default();
        self.right = ArmState::default();
        self.shared_curled = false;
        self.cooldown.reset();
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}
