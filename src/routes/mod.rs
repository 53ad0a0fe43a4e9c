//! src/routes/mod.rs

mod health_check;
mod update_users;

pub use health_check::*;
pub use update_users::*;
