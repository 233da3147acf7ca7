use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration (`config.toml`).
///
/// Every detector threshold lives here so behaviour can be tuned without
/// recompiling. All values are heuristics picked empirically; none of them
/// make a detector an exact motion classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub counters: CountersConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Falls back to defaults when the file is missing or broken
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}; using default config", e);
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Countdown before detection is enabled (seconds)
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,
    /// Reps needed to complete a session
    #[serde(default = "default_target_reps")]
    pub target_reps: u32,
    /// XP awarded on completion
    #[serde(default = "default_xp_reward")]
    pub xp_reward: u32,
}

fn default_countdown_secs() -> u64 { 3 }
fn default_target_reps() -> u32 { 20 }
fn default_xp_reward() -> u32 { 20 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            target_reps: default_target_reps(),
            xp_reward: default_xp_reward(),
        }
    }
}

impl SessionConfig {
    pub fn countdown(&self) -> Duration {
        Duration::from_secs(self.countdown_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountersConfig {
    #[serde(default)]
    pub jump: JumpConfig,
    #[serde(default)]
    pub arm_circle: ArmCircleConfig,
    #[serde(default)]
    pub high_knee: HighKneeConfig,
    #[serde(default)]
    pub jumping_jack: JumpingJackConfig,
    #[serde(default)]
    pub biceps_curl: BicepsCurlConfig,
    #[serde(default)]
    pub shoulder_press: ShoulderPressConfig,
    #[serde(default)]
    pub side_reach: SideReachConfig,
    #[serde(default)]
    pub squat: SquatConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub min_confidence: f32,
    /// Upward body movement per frame that counts as a jump
    pub movement_threshold: f32,
    pub shoulder_weight: f32,
    pub hip_weight: f32,
    pub cooldown_ms: u64,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.05,
            movement_threshold: 0.03,
            shoulder_weight: 0.4,
            hip_weight: 0.6,
            cooldown_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmCircleConfig {
    pub min_confidence: f32,
    /// shoulder→wrist / (shoulder→elbow + elbow→wrist)
    pub min_straightness: f32,
    /// Minimum shoulder→wrist distance
    pub min_arm_length: f32,
    /// Max |wrist.y - shoulder.y| per arm, and max |left wrist.y - right wrist.y|
    pub horizontal_tolerance: f32,
    /// Wrist movement below this is ignored by the peak tracker
    pub peak_threshold: f32,
    pub tracker_cooldown_ms: u64,
    /// Both arms must complete within this window
    pub sync_window_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for ArmCircleConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.25,
            min_straightness: 0.7,
            min_arm_length: 0.075,
            horizontal_tolerance: 0.35,
            peak_threshold: 0.02,
            tracker_cooldown_ms: 500,
            sync_window_ms: 400,
            cooldown_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighKneeConfig {
    pub min_confidence: f32,
    /// Frames averaged into the resting knee baseline
    pub baseline_frames: u32,
    pub up_threshold: f32,
    pub down_threshold: f32,
    /// Per leg
    pub cooldown_ms: u64,
}

impl Default for HighKneeConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.25,
            baseline_frames: 10,
            up_threshold: 0.04,
            down_threshold: 0.02,
            cooldown_ms: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpingJackConfig {
    pub min_confidence: f32,
    pub movement_threshold: f32,
    /// How far both wrists must be above their shoulders
    pub arm_raise_threshold: f32,
    pub cooldown_ms: u64,
}

impl Default for JumpingJackConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            movement_threshold: 0.015,
            arm_raise_threshold: 0.05,
            cooldown_ms: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BicepsCurlConfig {
    pub min_confidence: f32,
    pub up_threshold: f32,
    pub down_threshold: f32,
    pub cooldown_ms: u64,
    /// One curl flag for both arms instead of one per arm
    pub shared_curl_flag: bool,
}

impl Default for BicepsCurlConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            up_threshold: 0.08,
            down_threshold: 0.05,
            cooldown_ms: 800,
            shared_curl_flag: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoulderPressConfig {
    pub min_confidence: f32,
    /// |wrist - shoulder| band that counts as the starting position
    pub start_band: f32,
    /// Wrist height above shoulder that completes a press
    pub press_threshold: f32,
    pub cooldown_ms: u64,
}

impl Default for ShoulderPressConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            start_band: 0.12,
            press_threshold: 0.18,
            cooldown_ms: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideReachConfig {
    pub min_confidence: f32,
    pub reach_threshold: f32,
    pub cooldown_ms: u64,
}

impl Default for SideReachConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            reach_threshold: 0.20,
            cooldown_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquatConfig {
    pub min_confidence: f32,
    /// Shoulder drop below baseline that enters the squat
    pub down_threshold: f32,
    /// Band around baseline that completes the rep
    pub up_band: f32,
    /// Weight of the current position when the baseline drifts
    pub drift_rate: f32,
    pub drift_interval_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            down_threshold: 0.08,
            up_band: 0.06,
            drift_rate: 0.1,
            drift_interval_ms: 300,
            cooldown_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [session]
            target_reps = 5

            [counters.squat]
            cooldown_ms = 1500
            "#,
        )
        .unwrap();
        assert_eq!(config.session.target_reps, 5);
        assert_eq!(config.session.xp_reward, 20);
        assert_eq!(config.counters.squat.cooldown_ms, 1500);
        assert_eq!(config.counters.squat.down_threshold, 0.08);
        assert_eq!(config.counters.jump, JumpConfig::default());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("nope.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[counters.biceps_curl]\nshared_curl_flag = true\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert!(config.counters.biceps_curl.shared_curl_flag);
        assert_eq!(config.session.countdown(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[session\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
