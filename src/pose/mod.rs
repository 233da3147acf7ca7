pub mod keypoint;
pub mod recording;

pub use keypoint::{FrameError, Keypoint, KeypointIndex, Pose, Side};
pub use recording::{load_recording, read_recording, save_recording, RecordedFrame};
