//! Room shell and static obstacles.
//!
//! [`Geometry`] is the validated pair of a [`Room`] and its [`Obstacle`]s.
//! It is immutable for the lifetime of a design session and answers the
//! containment and intersection queries used by the layout generator.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::geom::floor::FloorPlan;
use crate::geom::rect::Rect;

/// Unit of every length in a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    /// Lengths in meters.
    #[default]
    Metric,
    /// Lengths in feet.
    Imperial,
}

impl UnitSystem {
    pub fn meters_per_unit(self) -> f64 {
        match self {
            UnitSystem::Metric => 1.0,
            UnitSystem::Imperial => 0.3048,
        }
    }

    /// Converts an area in room units² to m².
    pub fn square_meters(self, area: f64) -> f64 {
        let m = self.meters_per_unit();
        area * m * m
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    #[default]
    Column,
    Wall,
    Other,
}

/// A structural element nothing may be placed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    #[serde(default)]
    pub kind: ObstacleKind,
    /// Corner with the smallest coordinates.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
    /// Exclusion distance kept clear around the footprint.
    #[serde(default)]
    pub buffer: f64,
}

impl Obstacle {
    pub fn new(kind: ObstacleKind, x: f64, y: f64, width: f64, depth: f64, buffer: f64) -> Self {
        Self {
            kind,
            x,
            y,
            width,
            depth,
            buffer,
        }
    }

    /// Square column centered on `(cx, cy)`.
    pub fn column(cx: f64, cy: f64, size: f64, buffer: f64) -> Self {
        let r = Rect::centered(cx, cy, size, size);
        Self::new(ObstacleKind::Column, r.x, r.y, size, size, buffer)
    }

    pub fn footprint(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.depth)
    }

    /// Footprint grown by the obstacle's own buffer plus `extra`.
    pub fn buffered(&self, extra: f64) -> Rect {
        self.footprint().inflate(self.buffer + extra)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Extent along x.
    pub length: f64,
    /// Extent along y.
    pub width: f64,
    /// Ceiling height.
    pub height: f64,
    #[serde(default)]
    pub units: UnitSystem,
    /// Outline of a non-rectangular floor inside `[0, length] x [0, width]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_plan: Option<FloorPlan>,
}

impl Room {
    /// Rectangular room in meters.
    pub fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
            units: UnitSystem::Metric,
            floor_plan: None,
        }
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }

    pub fn with_floor_plan(mut self, plan: FloorPlan) -> Self {
        self.floor_plan = Some(plan);
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::geometry(format!(
                    "room {name} must be positive, got {value}"
                )));
            }
        }
        if let Some(plan) = &self.floor_plan {
            plan.validate()?;
            if !self.bounds().contains_rect(&plan.bounds()) {
                return Err(EngineError::geometry(
                    "floor plan extends beyond the room length/width",
                ));
            }
        }
        Ok(())
    }

    /// Room rectangle `[0, length] x [0, width]`.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.length, self.width)
    }

    /// Floor area in room units².
    pub fn floor_area(&self) -> f64 {
        match &self.floor_plan {
            Some(plan) => plan.area(),
            None => self.length * self.width,
        }
    }

    /// Checks whether a floor point lies inside the room outline.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.bounds().contains_point(x, y)
            && self
                .floor_plan
                .as_ref()
                .is_none_or(|plan| plan.contains_point(x, y))
    }

    /// Checks whether a rectangle lies inside the room outline.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        self.bounds().contains_rect(rect)
            && self
                .floor_plan
                .as_ref()
                .is_none_or(|plan| plan.contains_rect(rect))
    }
}

/// Validated room and obstacles.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    room: Room,
    obstacles: Vec<Obstacle>,
}

impl Geometry {
    /// Validates the room and every obstacle.
    ///
    /// Fails with [`EngineError::InvalidGeometry`] if a room dimension is not
    /// positive or an obstacle lies partially or fully outside the room.
    pub fn new(room: Room, obstacles: Vec<Obstacle>) -> Result<Self> {
        room.validate()?;
        for (i, obs) in obstacles.iter().enumerate() {
            let finite = [obs.x, obs.y, obs.width, obs.depth, obs.buffer]
                .iter()
                .all(|v| v.is_finite());
            if !finite || obs.width <= 0.0 || obs.depth <= 0.0 {
                return Err(EngineError::geometry(format!(
                    "obstacle {i} must have a positive footprint"
                )));
            }
            if obs.buffer < 0.0 {
                return Err(EngineError::geometry(format!(
                    "obstacle {i} has a negative buffer"
                )));
            }
            if !room.contains_rect(&obs.footprint()) {
                return Err(EngineError::geometry(format!(
                    "obstacle {i} at ({}, {}) lies outside the room",
                    obs.x, obs.y
                )));
            }
        }
        Ok(Self { room, obstacles })
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn units(&self) -> UnitSystem {
        self.room.units
    }

    pub fn bounds(&self) -> Rect {
        self.room.bounds()
    }

    pub fn floor_area(&self) -> f64 {
        self.room.floor_area()
    }

    /// Checks whether a point falls within any obstacle's buffered footprint,
    /// grown further by `extra_buffer`.
    pub fn point_in_obstacle(&self, x: f64, y: f64, extra_buffer: f64) -> bool {
        self.obstacles
            .iter()
            .any(|obs| obs.buffered(extra_buffer).contains_point(x, y))
    }

    /// Checks whether a rectangle overlaps any obstacle's buffered footprint,
    /// grown further by `extra_buffer`.
    pub fn rect_intersects_obstacle(&self, rect: &Rect, extra_buffer: f64) -> bool {
        self.obstacles
            .iter()
            .any(|obs| obs.buffered(extra_buffer).overlaps(rect))
    }

    /// Checks whether a rectangle lies on the floor at least `margin` away from
    /// the room perimeter.
    pub fn rect_within_floor(&self, rect: &Rect, margin: f64) -> bool {
        self.room.contains_rect(&rect.inflate(margin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_dimensions() {
        for room in [
            Room::new(0.0, 5.0, 3.0),
            Room::new(10.0, -1.0, 3.0),
            Room::new(10.0, 5.0, 0.0),
            Room::new(f64::NAN, 5.0, 3.0),
        ] {
            let err = Geometry::new(room, vec![]).unwrap_err();
            assert!(matches!(err, EngineError::InvalidGeometry(_)));
        }
    }

    #[test]
    fn test_rejects_obstacles_outside_the_room() {
        let room = Room::new(10.0, 5.0, 3.0);
        let partially = Obstacle::column(9.8, 2.0, 0.5, 0.0);
        let fully = Obstacle::column(20.0, 2.0, 0.5, 0.0);
        assert!(Geometry::new(room.clone(), vec![partially]).is_err());
        assert!(Geometry::new(room.clone(), vec![fully]).is_err());
        assert!(Geometry::new(room, vec![Obstacle::column(5.0, 2.5, 0.5, 0.3)]).is_ok());
    }

    #[test]
    fn test_obstacle_buffer_may_extend_past_walls() {
        let room = Room::new(10.0, 5.0, 3.0);
        let wall = Obstacle::new(ObstacleKind::Wall, 0.0, 0.0, 10.0, 0.2, 0.5);
        assert!(Geometry::new(room, vec![wall]).is_ok());
    }

    #[test]
    fn test_obstacle_queries() -> anyhow::Result<()> {
        let room = Room::new(10.0, 5.0, 3.0);
        let geometry = Geometry::new(room, vec![Obstacle::column(5.0, 2.5, 1.0, 0.5)])?;

        assert!(geometry.point_in_obstacle(5.0, 2.5, 0.0));
        assert!(geometry.point_in_obstacle(4.1, 2.5, 0.0));
        assert!(!geometry.point_in_obstacle(3.9, 2.5, 0.0));
        assert!(geometry.point_in_obstacle(3.9, 2.5, 0.2));

        let near = Rect::new(2.0, 2.0, 2.1, 1.0);
        assert!(geometry.rect_intersects_obstacle(&near, 0.0));
        let clear = Rect::new(0.5, 0.5, 1.0, 1.0);
        assert!(!geometry.rect_intersects_obstacle(&clear, 0.0));
        Ok(())
    }

    #[test]
    fn test_rect_within_floor_margin() -> anyhow::Result<()> {
        let geometry = Geometry::new(Room::new(10.0, 5.0, 3.0), vec![])?;
        let r = Rect::new(0.5, 0.5, 2.0, 2.0);
        assert!(geometry.rect_within_floor(&r, 0.5));
        assert!(!geometry.rect_within_floor(&r, 0.6));
        Ok(())
    }

    #[test]
    fn test_floor_plan_outside_room_is_rejected() -> anyhow::Result<()> {
        let plan = FloorPlan::new(vec![(0.0, 0.0), (12.0, 0.0), (12.0, 5.0), (0.0, 5.0)])?;
        let room = Room::new(10.0, 5.0, 3.0).with_floor_plan(plan);
        assert!(Geometry::new(room, vec![]).is_err());
        Ok(())
    }

    #[test]
    fn test_units() {
        assert_eq!(UnitSystem::Metric.meters_per_unit(), 1.0);
        let sq = UnitSystem::Imperial.square_meters(16.0);
        assert!((sq - 1.486448).abs() < 1e-6);
    }
}
