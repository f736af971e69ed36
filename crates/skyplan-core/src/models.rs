pub mod geometry;
pub mod mission;

pub use geometry::{Feature, FeatureCollection, Geometry, Position};
pub use mission::{Mission, MissionSource};
