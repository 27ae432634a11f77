pub mod calendar; // Calendar service: day/month views, mutation entry points
pub mod config;
pub mod date_utils; // Recurrence generation, occurrence test, expansion
pub mod db;
pub mod import; // Calendar import/export documents
pub mod models;
pub mod shifts; // Shift store seam + series-aware mutation resolver

pub use calendar::CalendarService;
pub use date_utils::{expand_shift, generate_occurrence_dates, normalize, occurs_on};
pub use shifts::{
    create_shift, delete_shift, delete_shift_with, update_shift, update_shift_with, ShiftError,
    ShiftStore,
};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise [`config::default_log_filter`] applies.
/// Safe to call more than once: later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::info!("{} core v{}", config::APP_NAME, config::APP_VERSION);
}
