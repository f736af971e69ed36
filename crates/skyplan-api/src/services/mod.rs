mod missions;

pub use missions::MissionRegistry;
