use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Environment;

/// Filter used when `RUST_LOG` is unset. Production keeps only warnings and errors.
pub fn default_directive(environment: Environment) -> String {
    let level = match environment {
        Environment::Production => "warn",
        Environment::Development => "debug",
    };
    format!("{}={level},tower_http={level}", env!("CARGO_PKG_NAME"))
}

/// Initializes structured logging once per process. `RUST_LOG` overrides the environment default.
pub fn init(environment: Environment) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(environment))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
