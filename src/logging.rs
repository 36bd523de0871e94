use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ABACUS_LOG";
const FORMAT_ENV: &str = "ABACUS_LOG_FORMAT";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Verbose while developing, errors only in release builds.
pub fn default_directive() -> &'static str {
    if cfg!(debug_assertions) {
        "abacus=debug,tower_http=debug,info"
    } else {
        "error"
    }
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive()));
    let format = LogFormat::parse(std::env::var(FORMAT_ENV).ok().as_deref());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if let Err(err) = result {
        tracing::debug!("logging already initialised: {err}");
    }
}
