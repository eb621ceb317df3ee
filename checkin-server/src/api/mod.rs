//! HTTP API handlers for checkin-server

pub mod check_in;
pub mod export;
pub mod health;
pub mod participants;
pub mod upload;

pub use check_in::check_in;
pub use export::export_checkins;
pub use health::health_routes;
pub use participants::{
    clear_participants, daily_check_in_count, list_participants, set_demo_mode, total_people,
};
pub use upload::upload_participants;
