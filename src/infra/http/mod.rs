mod admin;
mod middleware;

pub use admin::{AdminState, build_admin_router};
