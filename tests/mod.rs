//! Test suite for the Rusty DJ bot
//! This module contains all test configurations and common utilities

pub mod common;
pub mod integration;

/// Common test setup and utilities
pub mod test_utils {
    use std::sync::Once;
    use tracing::Level;

    static INIT: Once = Once::new();

    /// Initialize test environment
    pub fn init() {
        INIT.call_once(|| {
            // Initialize tracing for tests
            tracing_subscriber::fmt()
                .with_max_level(Level::DEBUG)
                .with_test_writer()
                .init();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_setup() {
        test_utils::init();
        test_utils::init();
    }
}
