pub mod animation;
pub mod location;
pub mod quality;
pub mod scene;
