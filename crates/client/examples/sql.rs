//! Minimal embedding example: open a session, submit one statement, print the
//! result table. Failures are reported through an error slot and stop the
//! program early; every handle is released on every path.

use dfe_client::{Engine, ErrorSlot};
use tracing_subscriber::EnvFilter;

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let Some(context) = Engine::create() else {
        eprintln!("failed to create session context");
        return;
    };

    let mut error = ErrorSlot::new();
    let Some(data_frame) = context.submit_sql("SELECT 100;", &mut error) else {
        eprintln!("failed to run SQL: {}", error.message().unwrap_or_default());
        error.clear();
        return;
    };

    if !data_frame.materialize_and_show(&mut error) {
        eprintln!("failed to show data frame: {}", error.message().unwrap_or_default());
        error.clear();
    }

    data_frame.release();
    context.close();
}
