pub mod floor;
pub mod point;
pub mod rect;
pub mod room;

/// Geometric precision in room units.
pub(crate) const EPS: f64 = 1e-9;
