use tracing_subscriber::EnvFilter;

/// Installs a `tracing-subscriber` `fmt` layer, honouring `RUST_LOG` and
/// falling back to `info` (`debug` when `--debug`/`debug: true` is set).
pub fn init(debug: bool) {
    let default_directive = if debug { "migrator=debug,info" } else { "migrator=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
