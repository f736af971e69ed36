mod request;
mod response;

pub use request::MissionRequest;
pub use response::{HealthResponse, MissionListResponse, MissionResponse};
