use std::sync::Once;

static INIT: Once = Once::new();

/// Installs the global `env_logger` once; later calls are no-ops.
///
/// `RUST_LOG` wins when set. Otherwise the viewer logs at `info` and keeps the
/// chatty GPU crates at `warn`.
pub fn init() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        match std::env::var("RUST_LOG") {
            Ok(filter) => {
                builder.parse_filters(&filter);
            }
            Err(_) => {
                builder
                    .filter_level(log::LevelFilter::Info)
                    .filter_module("wgpu_core", log::LevelFilter::Warn)
                    .filter_module("wgpu_hal", log::LevelFilter::Warn)
                    .filter_module("naga", log::LevelFilter::Warn);
            }
        }
        if let Err(e) = builder.try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        }
        log::debug!("logging initialized");
    });
}
