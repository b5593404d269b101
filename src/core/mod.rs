pub mod checker;
pub mod debug_logger;

pub use checker::{HealthCheck, HealthReport};
pub use debug_logger::{debug_logger, DebugLogger};
