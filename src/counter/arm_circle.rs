use log::{debug, info};
use std::time::Duration;

use super::{Cooldown, Exercise, RepCounter, RepEvent};
use crate::config::ArmCircleConfig;
use crate::pose::{Keypoint, Pose, Side};

/// Shoulder, elbow and wrist of one arm
struct Arm {
    shoulder: Keypoint,
    elbow: Keypoint,
    wrist: Keypoint,
}

impl Arm {
    fn from_pose(pose: &Pose, side: Side) -> Self {
        Self {
            shoulder: *pose.get(side.shoulder()),
            elbow: *pose.get(side.elbow()),
            wrist: *pose.get(side.wrist()),
        }
    }

    fn is_valid(&self, threshold: f32) -> bool {
        self.shoulder.is_valid(threshold)
            && self.elbow.is_valid(threshold)
            && self.wrist.is_valid(threshold)
    }

    /// 1.0 = shoulder, elbow and wrist on one line
    fn straightness(&self) -> f32 {
        let segments = self.shoulder.distance(&self.elbow) + self.elbow.distance(&self.wrist);
        if segments <= f32::EPSILON {
            return 0.0;
        }
        self.shoulder.distance(&self.wrist) / segments
    }

    fn length(&self) -> f32 {
        self.shoulder.distance(&self.wrist)
    }

    /// Wrist Y relative to the shoulder (negative = above)
    fn wrist_offset_y(&self) -> f32 {
        self.wrist.y - self.shoulder.y
    }
}

/// Peak/valley tracker on one wrist's height.
///
/// A circle is a high point and a low point with at least two direction
/// changes since the last completion.
struct ArmTracker {
    peak_threshold: f32,
    cooldown: Cooldown,
    initialized: bool,
    current_y: f32,
    going_up: bool,
    going_down: bool,
    direction_changes: u32,
    seen_high: bool,
    seen_low: bool,
}

impl ArmTracker {
    fn new(peak_threshold: f32, cooldown_ms: u64) -> Self {
        Self {
            peak_threshold,
            cooldown: Cooldown::inclusive_millis(cooldown_ms),
            initialized: false,
            current_y: 0.0,
            going_up: false,
            going_down: false,
            direction_changes: 0,
            seen_high: false,
            seen_low: false,
        }
    }

    fn initialize(&mut self, offset_y: f32) {
        self.current_y = offset_y;
        self.initialized = true;
        self.clear_cycle();
    }

    fn update(&mut self, offset_y: f32) {
        if !self.initialized {
            self.initialize(offset_y);
            return;
        }

        let dy = offset_y - self.current_y;
        self.current_y = offset_y;
        if dy.abs() < self.peak_threshold {
            return;
        }

        let up = dy < 0.0;
        let down = dy > 0.0;
        if self.going_up && down {
            self.seen_high = true;
            self.direction_changes += 1;
        }
        if self.going_down && up {
            self.seen_low = true;
            self.direction_changes += 1;
        }
        self.going_up = up;
        self.going_down = down;
    }

    /// Consumes the cycle when complete
    fn take_completion(&mut self, now: Duration) -> bool {
        if !self.initialized || !self.cooldown.is_ready(now) {
            return false;
        }
        let complete = self.seen_high && self.seen_low && self.direction_changes >= 2;
        if complete {
            self.cooldown.trigger(now);
            self.clear_cycle();
        }
        complete
    }

    fn clear_cycle(&mut self) {
        self.going_up = false;
        self.going_down = false;
        self.direction_changes = 0;
        self.seen_high = false;
        self.seen_low = false;
    }

    fn reset(&mut self) {
        self.initialized = false;
        self.current_y = 0.0;
        self.cooldown.reset();
        self.clear_cycle();
    }
}

/// Arm circle detector: both arms extended sideways, circling together.
pub struct ArmCircleCounter {
    config: ArmCircleConfig,
    left: ArmTracker,
    right: ArmTracker,
    primed: bool,
    left_done_at: Option<Duration>,
    right_done_at: Option<Duration>,
    cooldown: Cooldown,
    count: u32,
}

impl ArmCircleCounter {
    pub fn from_config(config: &ArmCircleConfig) -> Self {
        Self {
            config: config.clone(),
            left: ArmTracker::new(config.peak_threshold, config.tracker_cooldown_ms),
            right: ArmTracker::new(config.peak_threshold, config.tracker_cooldown_ms),
            primed: false,
            left_done_at: None,
            right_done_at: None,
            cooldown: Cooldown::from_millis(config.cooldown_ms),
            count: 0,
        }
    }

    fn sync_window(&self) -> Duration {
        Duration::from_millis(self.config.sync_window_ms)
    }

    /// Both arms visible, straight, long enough, roughly horizontal and level
    fn is_valid_position(&self, left: &Arm, right: &Arm) -> bool {
        let c = &self.config;
        if !left.is_valid(c.min_confidence) || !right.is_valid(c.min_confidence) {
            debug!("arm_circle: arm keypoints not visible");
            return false;
        }
        let (ls, rs) = (left.straightness(), right.straightness());
        if ls < c.min_straightness || rs < c.min_straightness {
            debug!("arm_circle: arms bent (left {:.2}, right {:.2})", ls, rs);
            return false;
        }
        if left.length() < c.min_arm_length || right.length() < c.min_arm_length {
            debug!("arm_circle: arms not extended");
            return false;
        }
        if left.wrist_offset_y().abs() > c.horizontal_tolerance
            || right.wrist_offset_y().abs() > c.horizontal_tolerance
        {
            debug!("arm_circle: arms not horizontal");
            return false;
        }
        if (left.wrist.y - right.wrist.y).abs() > c.horizontal_tolerance {
            debug!("arm_circle: arms at different heights");
            return false;
        }
        true
    }

    fn reset_trackers(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

impl RepCounter for ArmCircleCounter {
    fn exercise(&self) -> Exercise {
        Exercise::ArmCircle
    }

    fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent> {
        let left = Arm::from_pose(pose, Side::Left);
        let right = Arm::from_pose(pose, Side::Right);

        if !self.is_valid_position(&left, &right) {
            self.reset_trackers();
            self.left_done_at = None;
            self.right_done_at = None;
            return None;
        }

        if !self.primed {
            self.primed = true;
            self.left.initialize(left.wrist_offset_y());
            self.right.initialize(right.wrist_offset_y());
            return None;
        }

        self.left.update(left.wrist_offset_y());
        self.right.update(right.wrist_offset_y());

        if self.left.take_completion(now) {
            debug!("arm_circle: left arm completed");
            self.left_done_at = Some(now);
        }
        if self.right.take_completion(now) {
            debug!("arm_circle: right arm completed");
            self.right_done_at = Some(now);
        }

        let window = self.sync_window();
        let synced = match (self.left_done_at, self.right_done_at) {
            (Some(l), Some(r)) => {
                let apart = if l > r { l - r } else { r - l };
                apart <= window && now.saturating_sub(l.max(r)) < window
            }
            _ => false,
        };
        if synced {
            self.left_done_at = None;
            self.right_done_at = None;
        }

        // a lone completion that waited too long is dropped
        if let Some(l) = self.left_done_at {
            if now.saturating_sub(l) > window {
                debug!("arm_circle: left completion timed out");
                self.left_done_at = None;
                self.left.reset();
            }
        }
        if let Some(r) = self.right_done_at {
            if now.saturating_sub(r) > window {
                debug!("arm_circle: right completion timed out");
                self.right_done_at = None;
                self.right.reset();
            }
        }

        if !synced {
            return None;
        }

        self.reset_trackers();
        if !self.cooldown.is_ready(now) {
            debug!("arm_circle: circle inside cooldown");
            return None;
        }

        self.count += 1;
        self.cooldown.trigger(now);
        info!("arm circle #{}", self.count);
        Some(RepEvent {
            exercise: Exercise::ArmCircle,
            count: self.count,
            timestamp: now,
        })
    }

    fn reset(&mut self) {
        self.reset_trackers();
        self.primed = false;
        self.left_done_at = None;
        self.right_done_at = None;
        self.cooldown.reset();
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}
