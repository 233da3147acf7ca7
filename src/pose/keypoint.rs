use thiserror::Error;

/// COCO 17-keypoint index (MoveNet / YOLO-pose ordering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            1 => Some(Self::LeftEye),
            2 => Some(Self::RightEye),
            3 => Some(Self::LeftEar),
            4 => Some(Self::RightEar),
            5 => Some(Self::LeftShoulder),
            6 => Some(Self::RightShoulder),
            7 => Some(Self::LeftElbow),
            8 => Some(Self::RightElbow),
            9 => Some(Self::LeftWrist),
            10 => Some(Self::RightWrist),
            11 => Some(Self::LeftHip),
            12 => Some(Self::RightHip),
            13 => Some(Self::LeftKnee),
            14 => Some(Self::RightKnee),
            15 => Some(Self::LeftAnkle),
            16 => Some(Self::RightAnkle),
            _ => None,
        }
    }
}

/// Body side, as seen by the (already mirror-corrected) pose pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn shoulder(self) -> KeypointIndex {
        match self {
            Side::Left => KeypointIndex::LeftShoulder,
            Side::Right => KeypointIndex::RightShoulder,
        }
    }

    pub fn elbow(self) -> KeypointIndex {
        match self {
            Side::Left => KeypointIndex::LeftElbow,
            Side::Right => KeypointIndex::RightElbow,
        }
    }

    pub fn wrist(self) -> KeypointIndex {
        match self {
            Side::Left => KeypointIndex::LeftWrist,
            Side::Right => KeypointIndex::RightWrist,
        }
    }

    pub fn hip(self) -> KeypointIndex {
        match self {
            Side::Left => KeypointIndex::LeftHip,
            Side::Right => KeypointIndex::RightHip,
        }
    }

    pub fn knee(self) -> KeypointIndex {
        match self {
            Side::Left => KeypointIndex::LeftKnee,
            Side::Right => KeypointIndex::RightKnee,
        }
    }
}

/// A frame that cannot be turned into a [`Pose`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("expected {expected} keypoints, got {actual}")]
    WrongJointCount { expected: usize, actual: usize },
    #[error("keypoint {index} has a non-finite component")]
    NonFinite { index: usize },
}

/// Single keypoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Normalized X (0.0..=1.0)
    pub x: f32,
    /// Normalized Y (0.0..=1.0), grows downward
    pub y: f32,
    /// Confidence score (0.0..=1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Observed iff confidence is strictly above the threshold
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }

    pub fn distance(&self, other: &Keypoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for Keypoint {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            confidence: 0.0,
        }
    }
}

/// One frame of 17 keypoints
#[derive(Debug, Clone)]
pub struct Pose {
    pub keypoints: [Keypoint; KeypointIndex::COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; KeypointIndex::COUNT]) -> Self {
        Self { keypoints }
    }

    /// Build a pose from raw `(x, y, confidence)` triples as delivered by the
    /// pose pipeline. Anything other than exactly 17 finite triples is rejected.
    pub fn from_triples(triples: &[[f32; 3]]) -> Result<Self, FrameError> {
        if triples.len() != KeypointIndex::COUNT {
            return Err(FrameError::WrongJointCount {
                expected: KeypointIndex::COUNT,
                actual: triples.len(),
            });
        }

        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        for (index, (slot, t)) in keypoints.iter_mut().zip(triples).enumerate() {
            if !t.iter().all(|v| v.is_finite()) {
                return Err(FrameError::NonFinite { index });
            }
            *slot = Keypoint::new(t[0], t[1], t[2]);
        }
        Ok(Self { keypoints })
    }

    pub fn get(&self, index: KeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    pub fn average_confidence(&self) -> f32 {
        let sum: f32 = self.keypoints.iter().map(|k| k.confidence).sum();
        sum / KeypointIndex::COUNT as f32
    }

    /// Mean Y of the two shoulders, only if both pass the confidence gate
    pub fn shoulder_mid_y(&self, threshold: f32) -> Option<f32> {
        let l = self.get(KeypointIndex::LeftShoulder);
        let r = self.get(KeypointIndex::RightShoulder);
        if l.is_valid(threshold) && r.is_valid(threshold) {
            Some((l.y + r.y) / 2.0)
        } else {
            None
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            keypoints: [Keypoint::default(); KeypointIndex::COUNT],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_index_count() {
        assert_eq!(KeypointIndex::COUNT, 17);
    }

    #[test]
    fn test_keypoint_index_from_index() {
        assert_eq!(KeypointIndex::from_index(0), Some(KeypointIndex::Nose));
        assert_eq!(KeypointIndex::from_index(16), Some(KeypointIndex::RightAnkle));
        assert_eq!(KeypointIndex::from_index(17), None);
    }

    #[test]
    fn test_keypoint_is_valid_is_strict() {
        let kp = Keypoint::new(0.5, 0.5, 0.3);
        assert!(kp.is_valid(0.25));
        assert!(!kp.is_valid(0.3));
    }

    #[test]
    fn test_side_lookup() {
        assert_eq!(Side::Left.wrist(), KeypointIndex::LeftWrist);
        assert_eq!(Side::Right.knee(), KeypointIndex::RightKnee);
        assert_eq!(Side::Right.hip() as usize, 12);
    }

    #[test]
    fn test_from_triples_accepts_17() {
        let mut triples = [[0.5, 0.5, 0.9]; KeypointIndex::COUNT];
        triples[KeypointIndex::Nose as usize] = [0.5, 0.3, 0.8];
        let pose = Pose::from_triples(&triples).unwrap();
        let nose = pose.get(KeypointIndex::Nose);
        assert_eq!(nose.y, 0.3);
        assert_eq!(nose.confidence, 0.8);
    }

    #[test]
    fn test_from_triples_rejects_short_frame() {
        let triples = [[0.5, 0.5, 0.9]; 16];
        assert_eq!(
            Pose::from_triples(&triples).unwrap_err(),
            FrameError::WrongJointCount { expected: 17, actual: 16 }
        );
    }

    #[test]
    fn test_from_triples_rejects_nan() {
        let mut triples = [[0.5, 0.5, 0.9]; KeypointIndex::COUNT];
        triples[3][1] = f32::NAN;
        assert_eq!(
            Pose::from_triples(&triples).unwrap_err(),
            FrameError::NonFinite { index: 3 }
        );
    }

    #[test]
    fn test_distance() {
        let a = Keypoint::new(0.0, 0.0, 1.0);
        let b = Keypoint::new(0.3, 0.4, 1.0);
        assert!((a.distance(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_shoulder_mid_y_requires_both() {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[KeypointIndex::LeftShoulder as usize] = Keypoint::new(0.4, 0.3, 0.9);
        keypoints[KeypointIndex::RightShoulder as usize] = Keypoint::new(0.6, 0.5, 0.1);
        let pose = Pose::new(keypoints);
        assert_eq!(pose.shoulder_mid_y(0.3), None);

        let mut pose = pose;
        pose.keypoints[KeypointIndex::RightShoulder as usize].confidence = 0.9;
        assert!((pose.shoulder_mid_y(0.3).unwrap() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_pose_average_confidence() {
        let keypoints = [Keypoint::new(0.0, 0.0, 0.5); KeypointIndex::COUNT];
        let pose = Pose::new(keypoints);
        assert!((pose.average_confidence() - 0.5).abs() < 0.001);
    }
}
