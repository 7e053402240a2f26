pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_app, create_router, security_headers};
pub use health::{HealthCheckFuture, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
