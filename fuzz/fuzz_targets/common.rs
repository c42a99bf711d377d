// SPDX-License-Identifier: MIT OR Apache-2.0

/// Reads fixed-width values from fuzz input, yielding zeros once exhausted.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn next_u8(&mut self) -> u8 {
        let value = self.data.get(self.offset).copied().unwrap_or(0);
        self.offset = self.offset.saturating_add(1);
        value
    }

    pub fn next_i16(&mut self) -> i16 {
        i16::from_le_bytes([self.next_u8(), self.next_u8()])
    }

    /// Finite value in `[-scale, scale]`.
    pub fn next_unit(&mut self, scale: f64) -> f64 {
        f64::from(self.next_i16()) / f64::from(i16::MAX) * scale
    }
}

/// Maps `seed` into `[min, max]`.
pub fn bounded(seed: u8, min: usize, max: usize) -> usize {
    min + usize::from(seed) % (max - min + 1)
}
