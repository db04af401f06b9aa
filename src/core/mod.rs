pub mod animation;
pub mod composer;
pub mod layout;
pub mod pattern;
pub mod scatter;
pub mod substitute;
pub mod template;
