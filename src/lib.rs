//! Scene Engine — procedural 3D scene composition for games.
//!
//! Composes renderer-ready scene definitions at runtime from inheritable
//! templates, parameterized patterns, and per-location world data, using
//! procedural placement algorithms and a keyframe/state-machine animation
//! model.

pub mod core;
pub mod schema;
