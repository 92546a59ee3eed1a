use glam::Vec3;

pub type Color = Vec3;

pub mod canvas;
pub mod cli;
pub mod clrs;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod img;
pub mod math;
pub mod matrix;
pub mod quadtree;
pub mod sketch;
pub mod sketches;

pub use error::{Result, SketchError};
