//! Grow-surface layout: packs tables/beds into the free floor area.

pub mod config;
pub mod generator;
pub mod surface;

pub use config::LayoutConfig;
pub use generator::generate_layout;
pub use surface::GrowSurface;
