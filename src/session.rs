//! Exercise session: countdown, rep goal and event dispatch around one detector.

use log::{debug, info};
use serde::Serialize;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::config::{Config, SessionConfig};
use crate::counter::{Detector, Exercise, RepEvent};
use crate::pose::Pose;

/// Where confirmed reps go. The detector never calls into UI or storage
/// directly; the session hands every event to this sink.
pub struct EventSink(Box<dyn FnMut(RepEvent) + Send>);

impl EventSink {
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(RepEvent) + Send + 'static,
    {
        Self(Box::new(f))
    }

    /// Sink backed by a channel; events are dropped once the receiver is gone
    pub fn channel() -> (Self, mpsc::Receiver<RepEvent>) {
        let (tx, rx) = mpsc::channel();
        let sink = Self::new(move |event| {
            if tx.send(event).is_err() {
                debug!("rep event receiver dropped");
            }
        });
        (sink, rx)
    }

    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    fn emit(&mut self, event: RepEvent) {
        (self.0)(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, `start` not called yet
    Idle,
    /// Frames are accepted but the detector is disabled
    Countdown { until: Duration },
    Active,
    /// Goal reached or stopped; further frames are ignored
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub exercise: Exercise,
    pub reps: u32,
    pub xp_earned: u32,
    /// Time spent in the active phase
    pub duration: Duration,
    /// True only when the rep goal was reached
    pub completed: bool,
}

/// One exercise session around a single detector.
///
/// Timestamps are monotonic stream times. `push` reads the session's own
/// clock once per call; `push_at` takes the time from the caller (recorded
/// streams, tests).
pub struct Session {
    config: SessionConfig,
    detector: Detector,
    sink: EventSink,
    phase: SessionPhase,
    clock: Instant,
    active_since: Option<Duration>,
    last_seen: Duration,
    ended_at: Option<Duration>,
    goal_reached: bool,
    xp_earned: u32,
}

impl Session {
    pub fn new(exercise: Exercise, config: &Config, sink: EventSink) -> Self {
        let mut detector = Detector::new(exercise, &config.counters);
        detector.disable();
        Self {
            config: config.session.clone(),
            detector,
            sink,
            phase: SessionPhase::Idle,
            clock: Instant::now(),
            active_since: None,
            last_seen: Duration::ZERO,
            ended_at: None,
            goal_reached: false,
            xp_earned: 0,
        }
    }

    pub fn exercise(&self) -> Exercise {
        self.detector.exercise()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn count(&self) -> u32 {
        self.detector.count()
    }

    /// Reps left to reach the goal. A goal of 0 means open-ended.
    pub fn remaining(&self) -> u32 {
        self.config.target_reps.saturating_sub(self.count())
    }

    pub fn xp_earned(&self) -> u32 {
        self.xp_earned
    }

    /// Stream time according to the session clock
    pub fn now(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Begin the countdown at `at`. Calling it again restarts the session.
    pub fn start(&mut self, at: Duration) {
        self.reset();
        let until = at.saturating_add(self.config.countdown());
        info!(
            "{} session: countdown {}s, goal {} reps",
            self.exercise(),
            self.config.countdown_secs,
            self.config.target_reps
        );
        self.phase = SessionPhase::Countdown { until };
        self.last_seen = at;
        self.advance(at);
    }

    /// Move from countdown to active once the countdown has run out
    pub fn advance(&mut self, at: Duration) {
        if let SessionPhase::Countdown { until } = self.phase {
            if at >= until {
                // anything seen during the countdown must not leak into the session
                self.detector.reset();
                self.detector.enable();
                self.phase = SessionPhase::Active;
                self.active_since = Some(at);
                info!("{} session active", self.exercise());
            }
        }
    }

    /// Feed a frame stamped with the session clock
    pub fn push(&mut self, pose: &Pose) -> Option<RepEvent> {
        let now = self.now();
        self.push_at(pose, now)
    }

    pub fn push_at(&mut self, pose: &Pose, at: Duration) -> Option<RepEvent> {
        self.advance(at);
        match self.phase {
            SessionPhase::Idle | SessionPhase::Completed => return None,
            SessionPhase::Countdown { .. } | SessionPhase::Active => {}
        }
        self.last_seen = at;

        let event = self.detector.process(pose, at)?;
        self.sink.emit(event);

        let target = self.config.target_reps;
        if target > 0 && event.count >= target {
            self.goal_reached = true;
            self.xp_earned = self.config.xp_reward;
            self.finish(at);
            info!(
                "{} goal of {} reached, +{} XP",
                self.exercise(),
                target,
                self.xp_earned
            );
        }
        Some(event)
    }

    /// Raw `(x, y, confidence)` ingestion; malformed frames are a no-op
    pub fn push_raw(&mut self, triples: &[[f32; 3]], at: Duration) -> Option<RepEvent> {
        match Pose::from_triples(triples) {
            Ok(pose) => self.push_at(&pose, at),
            Err(e) => {
                debug!("{} session: dropping frame: {}", self.exercise(), e);
                None
            }
        }
    }

    /// End the session early. No XP is awarded.
    pub fn stop(&mut self, at: Duration) {
        if self.phase != SessionPhase::Completed {
            self.finish(at);
            info!("{} session stopped at {} reps", self.exercise(), self.count());
        }
    }

    fn finish(&mut self, at: Duration) {
        self.detector.disable();
        self.phase = SessionPhase::Completed;
        self.ended_at = Some(at);
    }

    pub fn summary(&self) -> SessionSummary {
        let end = self.ended_at.unwrap_or(self.last_seen);
        let duration = self
            .active_since
            .map(|since| end.saturating_sub(since))
            .unwrap_or_default();
        SessionSummary {
            exercise: self.exercise(),
            reps: self.count(),
            xp_earned: self.xp_earned,
            duration,
            completed: self.goal_reached,
        }
    }

    /// Back to idle with a fresh detector
    pub fn reset(&mut self) {
        self.detector.reset();
        self.detector.disable();
        self.phase = SessionPhase::Idle;
        self.active_since = None;
        self.last_seen = Duration::ZERO;
        self.ended_at = None;
        self.goal_reached = false;
        self.xp_earned = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::testutil::*;
    use crate::pose::KeypointIndex;
    use std::sync::{Arc, Mutex};

    fn squat_pose(y: f32) -> Pose {
        let mut pose = standing();
        set(&mut pose, KeypointIndex::LeftShoulder, 0.4, y);
        set(&mut pose, KeypointIndex::RightShoulder, 0.6, y);
        pose
    }

    /// One full squat over 300 ms starting at `start_ms`
    fn squat(session: &mut Session, start_ms: u64) -> Vec<RepEvent> {
        [0.40, 0.50, 0.41]
            .iter()
            .enumerate()
            .filter_map(|(i, &y)| session.push_at(&squat_pose(y), ms(start_ms + i as u64 * 100)))
            .collect()
    }

    fn config(countdown_secs: u64, target_reps: u32) -> Config {
        let mut config = Config::default();
        config.session.countdown_secs = countdown_secs;
        config.session.target_reps = target_reps;
        config
    }

    #[test]
    fn test_idle_session_ignores_frames() {
        let mut s = Session::new(Exercise::Squat, &config(0, 20), EventSink::discard());
        assert!(squat(&mut s, 0).is_empty());
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn test_countdown_suppresses_detection() {
        let mut s = Session::new(Exercise::Squat, &config(3, 20), EventSink::discard());
        s.start(ms(0));
        assert_eq!(s.phase(), SessionPhase::Countdown { until: ms(3000) });
        assert!(squat(&mut s, 0).is_empty());
        assert!(squat(&mut s, 1500).is_empty());
        assert_eq!(s.count(), 0);

        assert_eq!(squat(&mut s, 3000).len(), 1);
        assert_eq!(s.phase(), SessionPhase::Active);
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn test_countdown_frames_do_not_calibrate() {
        let mut s = Session::new(Exercise::Squat, &config(1, 20), EventSink::discard());
        s.start(ms(0));
        // deep baseline during the countdown would make the real squat invisible
        s.push_at(&squat_pose(0.60), ms(500));
        assert_eq!(squat(&mut s, 1000).len(), 1);
    }

    #[test]
    fn test_huge_countdown_saturates() {
        let mut s = Session::new(Exercise::Squat, &config(u64::MAX, 20), EventSink::discard());
        s.start(ms(1000));
        assert_eq!(s.phase(), SessionPhase::Countdown { until: Duration::MAX });
        assert!(squat(&mut s, 2000).is_empty());
    }

    #[test]
    fn test_zero_countdown_is_active_immediately() {
        let mut s = Session::new(Exercise::Squat, &config(0, 20), EventSink::discard());
        s.start(ms(0));
        assert_eq!(s.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_goal_completes_session_and_awards_xp() {
        let mut s = Session::new(Exercise::Squat, &config(0, 2), EventSink::discard());
        s.start(ms(0));
        squat(&mut s, 0);
        assert_eq!(s.remaining(), 1);
        assert_eq!(s.xp_earned(), 0);
        squat(&mut s, 1200);
        assert_eq!(s.phase(), SessionPhase::Completed);
        assert_eq!(s.remaining(), 0);
        assert_eq!(s.xp_earned(), 20);

        // further reps are ignored
        assert!(squat(&mut s, 3000).is_empty());
        assert_eq!(s.count(), 2);

        let summary = s.summary();
        assert!(summary.completed);
        assert_eq!(summary.reps, 2);
        assert_eq!(summary.xp_earned, 20);
        assert_eq!(summary.duration, ms(1400));
    }

    #[test]
    fn test_stop_early_gives_no_xp() {
        let mut s = Session::new(Exercise::Squat, &config(0, 20), EventSink::discard());
        s.start(ms(0));
        squat(&mut s, 0);
        s.stop(ms(2000));
        let summary = s.summary();
        assert!(!summary.completed);
        assert_eq!(summary.reps, 1);
        assert_eq!(summary.xp_earned, 0);
        assert_eq!(summary.duration, ms(2000));
    }

    #[test]
    fn test_channel_sink_receives_events() {
        let (sink, rx) = EventSink::channel();
        let mut s = Session::new(Exercise::Squat, &config(0, 20), sink);
        s.start(ms(0));
        squat(&mut s, 0);
        squat(&mut s, 1200);
        let events: Vec<RepEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].count, 1);
        assert_eq!(events[1].count, 2);
        assert_eq!(events[1].exercise, Exercise::Squat);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_sink = Arc::clone(&seen);
        let sink = EventSink::new(move |e: RepEvent| seen_by_sink.lock().unwrap().push(e.count));
        let mut s = Session::new(Exercise::Squat, &config(0, 20), sink);
        s.start(ms(0));
        squat(&mut s, 0);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_dropped_receiver_does_not_break_session() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        let mut s = Session::new(Exercise::Squat, &config(0, 20), sink);
        s.start(ms(0));
        assert_eq!(squat(&mut s, 0).len(), 1);
    }

    #[test]
    fn test_push_raw_rejects_short_frame() {
        let mut s = Session::new(Exercise::Squat, &config(0, 20), EventSink::discard());
        s.start(ms(0));
        let short = [[0.5, 0.4, 0.9]; 12];
        assert!(s.push_raw(&short, ms(0)).is_none());

        let full: Vec<[f32; 3]> = squat_pose(0.40)
            .keypoints
            .iter()
            .map(|k| [k.x, k.y, k.confidence])
            .collect();
        assert!(s.push_raw(&full, ms(100)).is_none());
    }

    #[test]
    fn test_restart_resets_count() {
        let mut s = Session::new(Exercise::Squat, &config(0, 20), EventSink::discard());
        s.start(ms(0));
        squat(&mut s, 0);
        assert_eq!(s.count(), 1);
        s.start(ms(5000));
        assert_eq!(s.count(), 0);
        assert_eq!(s.summary().reps, 0);
    }
}
