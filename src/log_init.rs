use std::sync::Once;

static INIT: Once = Once::new();

/// Idempotent `env_logger` setup for tests; mirrors the `Once`-guarded
/// `init_log`/`setup` pattern the teacher repo uses in its test modules.
pub fn init_log() {
    INIT.call_once(|| {
        use env_logger::Builder;
        use std::io::Write;

        let mut builder = Builder::from_default_env();
        builder
            .format_timestamp_micros()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} - {}] {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .is_test(true)
            .init();
    });
}
