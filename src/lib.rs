// Library exports for integration tests and the terminal front-end

pub mod config;
pub mod events;
pub mod host;
pub mod import;

// Test support (only available with test-utils feature)
#[cfg(feature = "test-utils")]
pub mod test_support;
