use log::{debug, info};
use std::time::Duration;

use super::{Cooldown, Exercise, RepCounter, RepEvent};
use crate::config::SideReachConfig;
use crate::pose::{Pose, Side};

/// Side reach detector.
///
/// An arm is reaching when its wrist is far enough outward or upward from the
/// shoulder. Hanging below the shoulder never counts. Each arm is
/// edge-triggered on its own, so two arms going out on the same frame give
/// two reps. A reach that starts inside the cooldown is lost, not deferred.
pub struct SideReachCounter {
    min_confidence: f32,
    reach_threshold: f32,
    /// Held-reach flags, `[left, right]`
    reaching: [bool; 2],
    cooldown: Cooldown,
    count: u32,
}

impl SideReachCounter {
    pub fn from_config(config: &SideReachConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            reach_threshold: config.reach_threshold,
            reaching: [false; 2],
            cooldown: Cooldown::from_millis(config.cooldown_ms),
            count: 0,
        }
    }

    fn is_reaching(&self, pose: &Pose, side: Side) -> bool {
        let shoulder = pose.get(side.shoulder());
        let wrist = pose.get(side.wrist());
        if !wrist.is_valid(self.min_confidence) {
            return false;
        }
        let outward = match side {
            Side::Left => shoulder.x - wrist.x,
            Side::Right => wrist.x - shoulder.x,
        };
        let upward = shoulder.y - wrist.y;
        outward > self.reach_threshold || upward > self.reach_threshold
    }
}

impl RepCounter for SideReachCounter {
    fn exercise(&self) -> Exercise {
        Exercise::SideReach
    }

    fn process(&mut self, pose: &Pose, now: Duration) -> Option<RepEvent> {
        let ls = pose.get(Side::Left.shoulder());
        let rs = pose.get(Side::Right.shoulder());
        if !ls.is_valid(self.min_confidence) || !rs.is_valid(self.min_confidence) {
            debug!("side_reach: shoulders not visible");
            self.reaching = [false; 2];
            return None;
        }

        // read once: both arms may count on the same frame
        let ready = self.cooldown.is_ready(now);
        let mut reps = 0;
        for side in Side::BOTH {
            let reaching = self.is_reaching(pose, side);
            let was_reaching = std::mem::replace(&mut self.reaching[side as usize], reaching);
            if reaching && !was_reaching && ready {
                reps += 1;
                debug!("side_reach: {} arm reach", side.name());
            }
        }

        if reps == 0 {
            return None;
        }
        self.count += reps;
        self.cooldown.trigger(now);
        info!("side reach #{} (+{})", self.count, reps);
        Some(RepEvent {
            exercise: Exercise::SideReach,
            count: self.count,
            timestamp: now,
        })
    }

    fn reset(&mut self) {
        self.reaching = [false; 2];
        self.cooldown.reset();
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}
