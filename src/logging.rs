use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber for host applications and tests.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this more
/// than once, or after another subscriber is installed, is a no-op and
/// returns `false`.
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_noop() {
        init("cyclecore=debug");
        assert!(!init("cyclecore=debug"));
    }
}
