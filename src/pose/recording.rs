//! Recorded keypoint streams, one JSON object per line.
//!
//! `{"t_ms": 1200, "keypoints": [[x, y, confidence], ...]}`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Milliseconds since the start of the recording
    pub t_ms: u64,
    /// Raw triples; the length is not checked here so that malformed frames
    /// reach the detectors exactly as the pipeline produced them
    pub keypoints: Vec<[f32; 3]>,
}

impl RecordedFrame {
    pub fn timestamp(&self) -> Duration {
        Duration::from_millis(self.t_ms)
    }
}

pub fn read_recording<R: BufRead>(reader: R) -> Result<Vec<RecordedFrame>> {
    let mut frames = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let frame: RecordedFrame = serde_json::from_str(line)
            .with_context(|| format!("Invalid frame on line {}", line_no + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

pub fn write_recording<W: Write>(mut writer: W, frames: &[RecordedFrame]) -> Result<()> {
    for frame in frames {
        let line = serde_json::to_string(frame)?;
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Vec<RecordedFrame>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open recording {}", path.display()))?;
    read_recording(BufReader::new(file))
}

pub fn save_recording<P: AsRef<Path>>(path: P, frames: &[RecordedFrame]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create recording {}", path.display()))?;
    write_recording(file, frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_skips_blank_and_comment_lines() {
        let input = "# squat take 1\n\n{\"t_ms\": 0, \"keypoints\": [[0.1, 0.2, 0.9]]}\n";
        let frames = read_recording(Cursor::new(input)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].keypoints, vec![[0.1, 0.2, 0.9]]);
        assert_eq!(frames[0].timestamp(), Duration::ZERO);
    }

    #[test]
    fn test_read_reports_line_number() {
        let input = "{\"t_ms\": 0, \"keypoints\": []}\nnot json\n";
        let err = read_recording(Cursor::new(input)).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"), "got {:#}", err);
    }

    #[test]
    fn test_save_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.jsonl");
        let frames = vec![
            RecordedFrame { t_ms: 0, keypoints: vec![[0.5, 0.5, 0.9]; 17] },
            RecordedFrame { t_ms: 33, keypoints: vec![[0.5, 0.4, 0.8]; 17] },
        ];
        save_recording(&path, &frames).unwrap();
        assert_eq!(load_recording(&path).unwrap(), frames);
    }
}
