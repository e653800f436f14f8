//! Mock encoder implementation for testing

use crate::platform::{traits::Encoder, Result};

/// Mock quadrature encoder
///
/// The count is set directly by the test; the driver under test sees it as a
/// free-running hardware counter.
#[derive(Debug, Default)]
pub struct MockEncoder {
    count: i32,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Set the absolute count
    pub fn set_count(&mut self, count: i32) {
        self.count = count;
    }

    /// Move the count by a delta
    pub fn turn(&mut self, delta: i32) {
        self.count = self.count.wrapping_add(delta);
    }
}

impl Encoder for MockEncoder {
    fn read(&mut self) -> Result<i32> {
        Ok(self.count)
    }
}
