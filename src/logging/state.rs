use once_cell::sync::OnceCell;
use std::sync::Once;
use tracing_appender::non_blocking::WorkerGuard;

// Keep the non-blocking worker guard alive for the entire process lifetime
pub(super) static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
pub(super) static INIT_ONCE: Once = Once::new();
pub(super) static INIT_ERROR: OnceCell<String> = OnceCell::new();
