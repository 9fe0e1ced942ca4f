//! Small shared helpers.

pub mod duration;
pub mod lock;
pub mod timezone;
