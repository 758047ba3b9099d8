// common/src/utils.rs
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Setup tracing for consistent logging across crates.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn setup_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Length of a form value once surrounding whitespace is dropped
pub fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}

/// True when an optional form field is missing or whitespace only
pub fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_len_counts_chars() {
        assert_eq!(trimmed_len("  lương  "), 5);
        assert_eq!(trimmed_len("   "), 0);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some(" \t")));
        assert!(!is_blank(Some("a")));
    }
}
