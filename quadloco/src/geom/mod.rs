pub mod area;
pub mod circle;
pub mod ray;
pub mod vec2;

pub use area::{Area, Span};
pub use circle::{Circle, CircleIntersector};
pub use ray::Ray;
pub use vec2::{Grad, Spot, Vec2};
