//! ECS components.

pub mod emitter;
pub mod screentext;
