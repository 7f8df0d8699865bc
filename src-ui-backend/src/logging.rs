use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize `env_logger` once per process; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    INIT.call_once(|| {
        let installed =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .try_init();
        match installed {
            Ok(()) => log::debug!("aqua backend v{} logging initialised", env!("CARGO_PKG_VERSION")),
            Err(e) => log::debug!("keeping the installed logger: {}", e),
        }
    });
}
