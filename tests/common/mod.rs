//! Shared test setup, following the teacher's `tests/common/mod.rs`
//! convention of a single `init()` called at the top of each integration
//! test so failures come with a log capture.

pub fn init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
