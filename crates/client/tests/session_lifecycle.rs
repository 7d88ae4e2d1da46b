use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread;

use dfe_client::{Engine, ErrorSlot};
use dfe_common::{EngineConfig, ErrorCode, ErrorPhase};
#[path = "support/mod.rs"]
mod support;

#[test]
fn select_literal_renders_one_row_one_column() {
    let engine = support::engine();
    let mut error = ErrorSlot::new();

    let df = engine
        .submit_sql("SELECT 100;", &mut error)
        .expect("valid sql yields a frame");
    assert!(!error.is_set());

    let rendered = df.render().expect("render");
    let rows = support::table_rows(&rendered);
    assert_eq!(rows.len(), 2, "header plus one data row:\n{rendered}");
    assert!(rows[1].contains("100"));
    assert_eq!(rows[1].matches('|').count(), 2, "single column:\n{rendered}");
    assert_eq!(support::single_i64(&df), 100);

    assert!(df.materialize_and_show(&mut error));
    assert!(!error.is_set());
    df.release();
    engine.close();
}

#[test]
fn malformed_keyword_fails_at_submit() {
    let engine = support::engine();
    let mut error = ErrorSlot::new();

    let df = engine.submit_sql("SELEKT 100;", &mut error);
    assert!(df.is_none());
    assert!(error.is_set());
    assert_eq!(error.code(), Some(ErrorCode::Sql));
    assert!(!error.message().expect("message").is_empty());
    error.clear();
    assert!(!error.is_set());
}

#[test]
fn unknown_table_fails_at_submit_not_at_materialize() {
    let engine = support::engine();
    let mut error = ErrorSlot::new();

    let df = engine.submit_sql("SELECT * FROM missing_table", &mut error);
    assert!(df.is_none());
    let code = error.code().expect("error set");
    assert_eq!(code.phase(), ErrorPhase::Planning);
    assert!(error.message().expect("message").contains("missing_table"));
}

#[test]
fn execution_failure_surfaces_at_materialize_and_frame_stays_valid() {
    let engine = support::engine();
    let mut error = ErrorSlot::new();

    let df = engine
        .submit_sql("SELECT 1 / 0 AS boom", &mut error)
        .expect("planning succeeds");
    assert!(!error.is_set());
    assert_eq!(df.schema().field(0).name(), "boom");

    assert!(!df.materialize_and_show(&mut error));
    assert!(error.is_set());
    assert!(!error.message().expect("message").is_empty());
    error.clear();

    // Still a live handle: the failure is reproducible and release is normal.
    assert!(df.collect().is_err());
    df.release();
}

#[test]
fn session_is_reusable_after_a_failed_submission() {
    let engine = support::engine();
    let mut error = ErrorSlot::new();

    assert!(engine.submit_sql("SELECT 1 +", &mut error).is_none());
    assert!(error.is_set());
    error.clear();

    let df = engine
        .submit_sql("SELECT 41 + 1", &mut error)
        .expect("retry on same session");
    assert!(!error.is_set());
    assert_eq!(support::single_i64(&df), 42);
}

#[test]
fn clearing_an_empty_slot_twice_does_not_disturb_later_calls() {
    let engine = support::engine();
    let mut error = ErrorSlot::new();
    error.clear();
    error.clear();

    let df = engine.submit_sql("SELECT 5", &mut error).expect("frame");
    assert!(!error.is_set());
    assert_eq!(support::single_i64(&df), 5);

    assert!(engine.submit_sql("SELEKT 5", &mut error).is_none());
    assert_eq!(error.code(), Some(ErrorCode::Sql));
}

#[test]
fn released_frame_identity_is_never_handed_out_again() {
    let engine = support::engine();
    let first = engine.sql("SELECT 1").expect("frame");
    let first_id = first.id();
    assert_eq!(first.session_id(), engine.id());
    first.release();

    let mut seen = vec![first_id];
    for _ in 0..8 {
        let df = engine.sql("SELECT 1").expect("frame");
        assert!(!seen.contains(&df.id()), "frame id {} reused", df.id());
        seen.push(df.id());
    }

    let other = support::engine();
    assert_ne!(other.id(), engine.id());
}

#[test]
fn frames_can_outlive_their_session() {
    let engine = support::engine();
    let df = engine.sql("SELECT 7").expect("frame");
    engine.close();
    assert_eq!(support::single_i64(&df), 7);
}

#[test]
fn distinct_sessions_run_on_different_threads() {
    let handles: Vec<_> = (0..3_i64)
        .map(|i| {
            thread::spawn(move || {
                let engine = support::engine();
                let df = engine.sql(&format!("SELECT {i} * 10")).expect("frame");
                support::single_i64(&df)
            })
        })
        .collect();
    let mut results: Vec<i64> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();
    results.sort();
    assert_eq!(results, vec![0, 10, 20]);
}

#[test]
fn invalid_config_is_rejected_before_allocation() {
    let config = EngineConfig {
        batch_size_rows: 0,
        ..EngineConfig::default()
    };
    let err = Engine::new(config).expect_err("zero batch size");
    assert_eq!(err.code(), ErrorCode::InvalidConfig);
}

#[test]
fn create_returns_a_usable_session() {
    let engine = Engine::create().expect("default session");
    assert_eq!(engine.config(), &EngineConfig::default());
    assert_eq!(support::single_i64(&engine.sql("SELECT 3").expect("frame")), 3);
}

#[test]
fn blocking_calls_panic_inside_an_async_context() {
    let engine = support::engine();
    let outer = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("outer runtime");

    let attempt = outer.block_on(async {
        catch_unwind(AssertUnwindSafe(|| engine.sql("SELECT 1")))
    });
    assert!(attempt.is_err());
    drop(outer);

    // Outside the async context the same engine keeps working.
    assert_eq!(support::single_i64(&engine.sql("SELECT 1").expect("frame")), 1);
}

// Releasing a session twice is undefined behavior at the C boundary and is
// not exercised. In Rust, `Engine::close` consumes the engine, so a second
// close or any use after close does not compile (see the `Engine` docs).
