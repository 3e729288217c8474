pub mod encoder;
pub mod queue_system;
pub mod types;
