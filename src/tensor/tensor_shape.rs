use std::fmt;

use crate::error::{ConvNetError, Result};

// Largest f64 buffer a Vec can hold
const MAX_ELEMENTS: usize = isize::MAX as usize / std::mem::size_of::<f64>();

/// Extent of a 3-D volume. Immutable once a tensor is built from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorShape {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl TensorShape {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self { width, height, depth }
    }

    // Saturates instead of overflowing; exact for any shape that passed `validate`
    pub fn num_elements(&self) -> usize {
        self.width.saturating_mul(self.height).saturating_mul(self.depth)
    }

    pub fn checked_num_elements(&self) -> Option<usize> {
        self.width.checked_mul(self.height)?.checked_mul(self.depth)
    }

    pub fn validate(&self) -> Result<()> {
        let elements = self.checked_num_elements().ok_or_else(|| {
            ConvNetError::DegenerateConfig(format!("tensor shape {} overflows the element count", self))
        })?;

        if elements == 0 {
            return Err(ConvNetError::DegenerateConfig(format!(
                "tensor shape {} has a zero-sized dimension",
                self
            )));
        }

        if elements > MAX_ELEMENTS {
            return Err(ConvNetError::DegenerateConfig(format!(
                "tensor shape {} exceeds the addressable element count",
                self
            )));
        }

        Ok(())
    }

    pub fn contains(&self, depth: usize, row: usize, col: usize) -> bool {
        depth < self.depth && row < self.height && col < self.width
    }

    // Depth is the fastest-varying axis: (row * width + col) * depth + d
    pub(crate) fn offset(&self, depth: usize, row: usize, col: usize) -> usize {
        (row * self.width + col) * self.depth + depth
    }

}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}
