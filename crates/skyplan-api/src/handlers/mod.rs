mod health;
mod missions;

pub use health::health_check;
pub use missions::{create_mission, delete_mission, get_mission, list_missions, update_mission};
