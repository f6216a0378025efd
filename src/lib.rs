//! Freeroam movement core
//!
//! First-person movement and ray-based collision against a static obstacle
//! world. Rendering, input devices, and world layout live outside this crate.

pub mod config;
pub mod game;
