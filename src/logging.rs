use tracing::Level;

/// Install the fmt subscriber. Logs go to stderr so stdout stays free for
/// PNG and JSON output. Safe to call more than once.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}
