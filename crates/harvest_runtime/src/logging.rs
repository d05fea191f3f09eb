//! Logging bootstrap

/// Install the process logger. `RUST_LOG` wins over `default_level`.
/// Returns false when a logger was already installed.
pub fn init(default_level: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_once() {
        init("debug");
        assert!(!init("info"));
        log::debug!("logger installed");
    }
}
