//! Reusable coordinate buffers for element-by-element copy loops.
//!
//! Shape transforms walk every element of one shape, remap its coordinates,
//! and read or write the element at the remapped position in another shape.
//! `CoordScratch` owns the coordinate and stride arrays for that walk so the
//! loop body never allocates. It is created per call and dropped on every
//! exit path, including early error returns.

use crate::core::coords::{offset, strides, TensorShape};

/// Scratch state for mapping flat indices of a `from` shape onto a `to` shape.
pub(crate) struct CoordScratch {
    from_shape: TensorShape,
    to_strides: TensorShape,
    coords: TensorShape,
    mapped: TensorShape,
}

impl CoordScratch {
    /// Create scratch buffers for walking `from_shape` and addressing `to_shape`.
    pub(crate) fn new(from_shape: &[usize], to_shape: &[usize]) -> Self {
        Self {
            from_shape: TensorShape::from_slice(from_shape),
            to_strides: strides(to_shape),
            coords: smallvec::smallvec![0usize; from_shape.len()],
            mapped: TensorShape::with_capacity(to_shape.len()),
        }
    }

    /// Unravel `index`, let `remap` build the matching `to` coordinates from
    /// the `from` coordinates, and return the flat offset in the `to` shape.
    ///
    /// `remap` receives a cleared buffer and must push exactly `to.len()` coordinates.
    pub(crate) fn map_index(
        &mut self,
        index: usize,
        remap: impl FnOnce(&[usize], &mut TensorShape),
    ) -> usize {
        crate::core::coords::index_to_coords(&self.from_shape, index, &mut self.coords);
        self.mapped.clear();
        remap(&self.coords, &mut self.mapped);
        debug_assert_eq!(self.mapped.len(), self.to_strides.len());
        offset(&self.mapped, &self.to_strides)
    }
}
