//! Depth-range culling in clip space.
//!
//! The projection keeps view depth in clip `w`, so whole-triangle culling
//! only has to look at the three `w` values.

use crate::{VIEW_FAR, VIEW_NEAR};

/// Open range of view depths a triangle must lie strictly inside to be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    pub near: f32,
    pub far: f32,
}

impl ClipRange {
    /// The camera's view range.
    pub const VIEW: ClipRange = ClipRange {
        near: VIEW_NEAR,
        far: VIEW_FAR,
    };

    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// True when every depth lies strictly between near and far.
    ///
    /// A triangle partially outside is rejected whole; there is no clipping.
    pub fn contains_all(&self, depths: [f32; 3]) -> bool {
        let min = depths[0].min(depths[1]).min(depths[2]);
        let max = depths[0].max(depths[1]).max(depths[2]);
        min > self.near && max < self.far
    }
}

impl Default for ClipRange {
    fn default() -> Self {
        Self::VIEW
    }
}
