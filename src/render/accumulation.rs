//! Temporal accumulation state
//!
//! Successive traced frames are blended while the view is static. Any
//! camera movement or active input resets the running count so the
//! accumulation pass overwrites instead of blending.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Tolerance when comparing camera poses between frames
const POSE_EPSILON: f32 = 1e-6;

/// Camera position and view direction for one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub direction: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self { position, direction }
    }

    /// Check if two poses describe the same view
    pub fn same_view(&self, other: &CameraPose) -> bool {
        self.position.abs_diff_eq(other.position, POSE_EPSILON)
            && self.direction.abs_diff_eq(other.direction, POSE_EPSILON)
    }
}

/// Accumulation constants for the GPU (16 bytes, matches the shader struct)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct AccumulationParams {
    /// Frames blended so far, including the current one
    pub frames_accumulated: i32,
    /// 1 = blend with history, 0 = overwrite
    pub should_accumulate: u32,
    pub _pad: [u32; 2],
}

impl AccumulationParams {
    /// Weight of the current frame in the running average
    pub fn blend_weight(&self) -> f32 {
        if self.should_accumulate != 0 {
            1.0 / self.frames_accumulated.max(1) as f32
        } else {
            1.0
        }
    }
}

/// Reset/continue state machine for frame accumulation
#[derive(Clone, Debug)]
pub struct AccumulationController {
    frames_accumulated: i32,
    should_accumulate: bool,
    last_pose: Option<CameraPose>,
}

impl AccumulationController {
    /// Controller in the reset state
    pub fn new() -> Self {
        Self {
            frames_accumulated: 1,
            should_accumulate: false,
            last_pose: None,
        }
    }

    /// Advance one frame
    ///
    /// A reset restarts the count at 1 and disables blending; otherwise
    /// the count grows and blending is enabled.
    pub fn update(&mut self, should_reset: bool) {
        if should_reset {
            self.frames_accumulated = 1;
            self.should_accumulate = false;
            return;
        }
        self.frames_accumulated = self.frames_accumulated.saturating_add(1);
        self.should_accumulate = true;
    }

    /// Advance one frame, resetting if the camera moved or input is active
    ///
    /// The first observed frame always resets.
    pub fn observe(&mut self, pose: CameraPose, input_active: bool) {
        let moved = self
            .last_pose
            .as_ref()
            .is_none_or(|last| !last.same_view(&pose));
        self.last_pose = Some(pose);
        self.update(moved || input_active);
    }

    pub fn frames_accumulated(&self) -> i32 {
        self.frames_accumulated
    }

    pub fn should_accumulate(&self) -> bool {
        self.should_accumulate
    }

    /// Constants for this frame's accumulation pass
    pub fn params(&self) -> AccumulationParams {
        AccumulationParams {
            frames_accumulated: self.frames_accumulated,
            should_accumulate: self.should_accumulate as u32,
            _pad: [0; 2],
        }
    }

    pub fn blend_weight(&self) -> f32 {
        self.params().blend_weight()
    }
}

impl Default for AccumulationController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_size() {
        assert_eq!(std::mem::size_of::<AccumulationParams>(), 16);
    }

    #[test]
    fn test_initial_state() {
        let controller = AccumulationController::new();
        assert_eq!(controller.frames_accumulated(), 1);
        assert!(!controller.should_accumulate());
        assert_eq!(controller.blend_weight(), 1.0);
    }

    #[test]
    fn test_counts_up_after_reset() {
        let mut controller = AccumulationController::new();
        controller.update(true);
        assert_eq!(controller.frames_accumulated(), 1);
        assert!(!controller.should_accumulate());

        for expected in 2..=6 {
            controller.update(false);
            assert_eq!(controller.frames_accumulated(), expected);
            assert!(controller.should_accumulate());
        }

        controller.update(true);
        assert_eq!(controller.frames_accumulated(), 1);
        assert!(!controller.should_accumulate());
    }

    #[test]
    fn test_blend_weight() {
        let mut controller = AccumulationController::new();
        controller.update(false);
        controller.update(false);
        controller.update(false);
        assert_eq!(controller.frames_accumulated(), 4);
        assert!((controller.blend_weight() - 0.25).abs() < 1e-6);

        let params = controller.params();
        assert_eq!(params.should_accumulate, 1);
        assert_eq!(bytemuck::bytes_of(&params).len(), 16);
    }

    #[test]
    fn test_observe() {
        let mut controller = AccumulationController::new();
        let pose = CameraPose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::NEG_Z);

        // First frame resets
        controller.observe(pose, false);
        assert_eq!(controller.frames_accumulated(), 1);
        assert!(!controller.should_accumulate());

        controller.observe(pose, false);
        controller.observe(pose, false);
        assert_eq!(controller.frames_accumulated(), 3);
        assert!(controller.should_accumulate());

        // Input resets even without movement
        controller.observe(pose, true);
        assert_eq!(controller.frames_accumulated(), 1);

        controller.observe(pose, false);
        assert_eq!(controller.frames_accumulated(), 2);

        // Turning the camera resets
        controller.observe(CameraPose::new(pose.position, Vec3::X), false);
        assert_eq!(controller.frames_accumulated(), 1);
        assert!(!controller.should_accumulate());
    }
}
