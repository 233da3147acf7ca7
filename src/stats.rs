//! Local XP / level bookkeeping across sessions.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::counter::Exercise;
use crate::session::SessionSummary;

pub const XP_PER_LEVEL: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub xp: u32,
    pub level: u32,
    /// Sessions finished with the rep goal reached
    pub exercises_completed: u32,
    /// Reps per exercise, including sessions that were stopped early
    pub totals: BTreeMap<Exercise, u32>,
}

impl UserStats {
    /// Fold a finished session in
    pub fn record(&mut self, summary: &SessionSummary) {
        *self.totals.entry(summary.exercise).or_insert(0) += summary.reps;
        if summary.completed {
            self.exercises_completed += 1;
        }
        let before = self.level;
        self.xp += summary.xp_earned;
        self.level = self.xp / XP_PER_LEVEL;
        if self.level > before {
            info!("level up: {} -> {}", before, self.level);
        }
    }

    pub fn total_reps(&self, exercise: Exercise) -> u32 {
        self.totals.get(&exercise).copied().unwrap_or(0)
    }

    /// XP gained inside the current level
    pub fn current_level_xp(&self) -> u32 {
        self.xp % XP_PER_LEVEL
    }

    pub fn xp_to_next_level(&self) -> u32 {
        XP_PER_LEVEL - self.current_level_xp()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write stats file {}", path.display()))?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read stats file {}", path.display()))?;
        let mut stats: UserStats = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse stats file {}", path.display()))?;
        // level is derived; a hand-edited file may disagree
        stats.level = stats.xp / XP_PER_LEVEL;
        Ok(stats)
    }

    /// Missing file means a fresh user
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(stats) => stats,
            Err(e) => {
                warn!("{:#}; starting with empty stats", e);
                Self::default()
            }
        }
    }
}
