use log::{debug, info};
use std::time::Duration;

use super::{Cooldown, Exercise, RepCounter, RepEvent};
use crate::config::JumpingJackConfig;
use crate::pose::{KeypointIndex, Pose};

/// Body centre height and the hips it was averaged over
#[derive(Debug, Clone, Copy)]
struct Center {
    y: f32,
    hips: [bool; 2],
}

/// Jumping jack detector.
///
/// A rep is a frame where the body centre moves up while both wrists are
/// raised above the shoulders. The rep is edge-triggered: the position has to
/// be left before the next one can count, even when the cooldown held it back.
pub struct JumpingJackCounter {
    min_confidence: f32,
    movement_threshold: f32,
    arm_raise_threshold: f32,
    prev_center: Option<Center>,
    in_position: bool,
    cooldown: Cooldown,
    count: u32,
}

impl JumpingJackCounter {
    pub fn from_config(config: &JumpingJackConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            movement_threshold: config.movement_threshold,
            arm_raise_threshold: config.arm_raise_threshold,
            prev_center: None,
            in_position: false,
            cooldown: Cooldown::from_millis(config.cooldown_ms),
            count: 0,
        }
    }

    /// Mean Y of the shoulders and whichever hips pass the gate
    fn center(&self, pose: &Pose) -> Center {
        let hip_points = [KeypointIndex::LeftHip, KeypointIndex::RightHip];
        let hips = hip_points.map(|i| pose.get(i).is_valid(self.min_confidence));
        let mut sum =
            pose.get(KeypointIndex::LeftShoulder).y + pose.get(KeypointIndex::RightShoulder).y;
        let mut n = 2;
        for (i, seen) in hip_points.into_iter().zip(hips) {
            if seen {
                sum += pose.get(i).y;
                n += 1;
            }
        }
        Center {
            y: sum / n as f32,
            hips,
        }
    }

    fn arms_raised(&self, pose: &Pose) -> bool {
        let pairs = [
            (KeypointIndex::LeftShoulder, KeypointIndex::LeftWrist),
            (KeypointIndex::RightShoulder, KeypointIndex::RightWrist),
        ];
        pairs.iter().all(|&(s, w)| {
            let shoulder = pose.get(s);
            let wrist = pose.get(w);
            wrist.is_valid(self.min_confidence)
                && shoulder.y - wrist.y > self.arm_raise_threshold
        })
    }
}

impl RepCounter for JumpingJackCounter {
    fn exercise(&self) -> Exercise {
        Exercise::JumpingJack
    }

    fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent> {
        let ls = pose.get(KeypointIndex::LeftShoulder);
        let rs = pose.get(KeypointIndex::RightShoulder);
        if !ls.is_valid(self.min_confidence) || !rs.is_valid(self.min_confidence) {
            debug!("jumping_jack: shoulders not visible");
            self.in_position = false;
            return None;
        }

        let center = self.center(pose);
        let prev = match self.prev_center.replace(center) {
            Some(prev) if prev.hips == center.hips => prev,
            Some(_) => {
                // centres over different joints are not comparable
                debug!("jumping_jack: hip visibility changed, reseeding centre");
                self.in_position = false;
                return None;
            }
            None => return None,
        };

        let jumping = center.y - prev.y < -self.movement_threshold;
        let valid = jumping && self.arms_raised(pose);
        let was_in_position = std::mem::replace(&mut self.in_position, valid);
        if !valid || was_in_position {
            return None;
        }
        if !self.cooldown.is_ready(now) {
            debug!("jumping_jack: rep inside cooldown");
            return None;
        }

        self.count += 1;
        self.cooldown.trigger(now);
        info!("jumping jack #{}", self.count);
        Some(RepEvent {
            exercise: Exercise::JumpingJack,
            count: self.count,
            timestamp: now,
        })
    }

    fn reset(&mut self) {
        self.prev_center = None;
        self.in_position = false;
        self.cooldown.reset();
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}
