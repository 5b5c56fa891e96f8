//! Command implementations for the social CLI

pub mod feed;
pub mod follow;
pub mod health;
pub mod migrate;
pub mod post;
pub mod seed;
pub mod user;

// Re-export dispatcher functions for flat access from main.rs
pub use feed::run_feed;
pub use follow::{run_follow, run_unfollow};
pub use health::run_health;
pub use migrate::run_migrate;
pub use post::run_post;
pub use seed::run_seed;
pub use user::run_user;
