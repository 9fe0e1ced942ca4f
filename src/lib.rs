//! Server-rendered console for access request audit timelines and group administration.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
