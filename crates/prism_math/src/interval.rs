/// Admissible ray parameters `[min, max)`, with a mirrored range behind the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Hit in front of the origin: `min <= t < max`.
    pub fn accepts_forward(&self, t: f32) -> bool {
        self.min <= t && t < self.max
    }

    /// Hit behind the origin: `-max < t <= -min`.
    pub fn accepts_behind(&self, t: f32) -> bool {
        -self.max < t && t <= -self.min
    }
}
