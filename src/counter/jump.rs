use log::{debug, info};
use std::time::Duration;

use super::{Cooldown, Exercise, RepCounter, RepEvent};
use crate::config::JumpConfig;
use crate::pose::{KeypointIndex, Pose};

/// Vertical jump detector.
///
/// Tracks the frame-to-frame vertical delta of the shoulder pair and the hip
/// pair and fires on the first frame whose weighted upward movement exceeds
/// the threshold. It does not wait for the landing.
pub struct JumpCounter {
    min_confidence: f32,
    movement_threshold: f32,
    shoulder_weight: f32,
    hip_weight: f32,
    prev_shoulder_y: Option<f32>,
    prev_hip_y: Option<f32>,
    seeded: bool,
    cooldown: Cooldown,
    count: u32,
}

impl JumpCounter {
    pub fn from_config(config: &JumpConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            movement_threshold: config.movement_threshold,
            shoulder_weight: config.shoulder_weight,
            hip_weight: config.hip_weight,
            prev_shoulder_y: None,
            prev_hip_y: None,
            seeded: false,
            cooldown: Cooldown::from_millis(config.cooldown_ms),
            count: 0,
        }
    }

    /// Confidence-weighted mean Y of a left/right pair, skipping joints under the gate
    fn pair_y(&self, pose: &Pose, left: KeypointIndex, right: KeypointIndex) -> Option<f32> {
        let mut sum = 0.0;
        let mut weight = 0.0;
        for kp in [pose.get(left), pose.get(right)] {
            if kp.is_valid(self.min_confidence) {
                sum += kp.y * kp.confidence;
                weight += kp.confidence;
            }
        }
        if weight > 0.0 {
            Some(sum / weight)
        } else {
            None
        }
    }

    /// Weighted delta over the groups seen in both frames. Negative = upward.
    fn body_movement(&self, shoulder_y: Option<f32>, hip_y: Option<f32>) -> Option<f32> {
        let mut movement = 0.0;
        let mut weight = 0.0;
        if let (Some(cur), Some(prev)) = (shoulder_y, self.prev_shoulder_y) {
            movement += (cur - prev) * self.shoulder_weight;
            weight += self.shoulder_weight;
        }
        if let (Some(cur), Some(prev)) = (hip_y, self.prev_hip_y) {
            movement += (cur - prev) * self.hip_weight;
            weight += self.hip_weight;
        }
        if weight > 0.0 {
            Some(movement / weight)
        } else {
            None
        }
    }
}

impl RepCounter for JumpCounter {
    fn exercise(&self) -> Exercise {
        Exercise::Jump
    }

    fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent> {
        let shoulder_y = self.pair_y(pose, KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder);
        let hip_y = self.pair_y(pose, KeypointIndex::LeftHip, KeypointIndex::RightHip);

        if shoulder_y.is_none() && hip_y.is_none() {
            debug!("jump: shoulders and hips not observed, skipping frame");
            return None;
        }

        if !self.seeded {
            self.prev_shoulder_y = shoulder_y;
            self.prev_hip_y = hip_y;
            self.seeded = true;
            return None;
        }

        let movement = self.body_movement(shoulder_y, hip_y);

        // a group that drops out keeps its last observed position
        if shoulder_y.is_some() {
            self.prev_shoulder_y = shoulder_y;
        }
        if hip_y.is_some() {
            self.prev_hip_y = hip_y;
        }

        let movement = movement?;
        if movement >= -self.movement_threshold {
            return None;
        }

        if !self.cooldown.is_ready(now) {
            debug!("jump: upward movement {:.3} inside cooldown", movement);
            return None;
        }

        self.count += 1;
        self.cooldown.trigger(now);
        info!("jump #{} (movement {:.3})", self.count, movement);
        Some(RepEvent {
            exercise: Exercise::Jump,
            count: self.count,
            timestamp: now,
        })
    }

    fn reset(&mut self) {
        self.prev_shoulder_y = None;
        self.prev_hip_y = None;
        self.seeded = false;
        self.cooldown.reset();
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use super::*;

    fn shifted(dy: f32) -> Pose {
        let mut pose = standing();
        for kp in pose.keypoints.iter_mut() {
            kp.y += dy;
        }
        pose
    }

    fn counter() -> JumpCounter {
        JumpCounter::from_config(&JumpConfig::default())
    }

    #[test]
    fn test_first_frame_only_seeds() {
        let mut c = counter();
        assert!(c.process(&shifted(-0.2), ms(0)).is_none());
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn test_single_frame_upward_trigger() {
        let mut c = counter();
        c.process(&shifted(0.0), ms(0));
        let event = c.process(&shifted(-0.05), ms(33)).unwrap();
        assert_eq!(event.count, 1);
        assert_eq!(event.timestamp, ms(33));
        assert_eq!(c.count(), 1);
    }

    #[test]
    fn test_downward_and_small_moves_ignored() {
        let mut c = counter();
        c.process(&shifted(0.0), ms(0));
        assert!(c.process(&shifted(0.05), ms(33)).is_none());
        assert!(c.process(&shifted(0.03), ms(66)).is_none());
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn test_cooldown_blocks_second_trigger() {
        let mut c = counter();
        c.process(&shifted(0.0), ms(0));
        assert!(c.process(&shifted(-0.05), ms(100)).is_some());
        // keeps rising within 250 ms
        assert!(c.process(&shifted(-0.10), ms(200)).is_none());
        assert!(c.process(&shifted(-0.05), ms(300)).is_none());
        // next take-off after the window
        assert!(c.process(&shifted(-0.10), ms(400)).is_some());
        assert_eq!(c.count(), 2);
    }

    #[test]
    fn test_hips_alone_can_trigger() {
        let mut c = counter();
        let mut base = shifted(0.0);
        for idx in [KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder] {
            base.keypoints[idx as usize].confidence = 0.0;
        }
        let mut up = base.clone();
        for idx in [KeypointIndex::LeftHip, KeypointIndex::RightHip] {
            up.keypoints[idx as usize].y -= 0.05;
        }
        c.process(&base, ms(0));
        assert!(c.process(&up, ms(33)).is_some());
    }

    #[test]
    fn test_hip_weighted_higher() {
        // shoulders up by 0.06, hips down by 0.02:
        // 0.4 * -0.06 + 0.6 * 0.02 = -0.012 -> below threshold
        let mut c = counter();
        let base = shifted(0.0);
        let mut moved = base.clone();
        for idx in [KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder] {
            moved.keypoints[idx as usize].y -= 0.06;
        }
        for idx in [KeypointIndex::LeftHip, KeypointIndex::RightHip] {
            moved.keypoints[idx as usize].y += 0.02;
        }
        c.process(&base, ms(0));
        assert!(c.process(&moved, ms(33)).is_none());
    }

    #[test]
    fn test_invisible_frame_keeps_previous_positions() {
        let mut c = counter();
        c.process(&shifted(0.0), ms(0));
        c.process(&invisible(), ms(33));
        assert!(c.process(&shifted(-0.05), ms(66)).is_some());
    }

    #[test]
    fn test_reset() {
        let mut c = counter();
        c.process(&shifted(0.0), ms(0));
        c.process(&shifted(-0.05), ms(33));
        c.reset();
        assert_eq!(c.count(), 0);
        // next frame is a fresh seed
        assert!(c.process(&shifted(-0.2), ms(66)).is_none());
        assert!(c.process(&shifted(-0.25), ms(99)).is_some());
        assert_eq!(c.count(), 1);
    }
}
