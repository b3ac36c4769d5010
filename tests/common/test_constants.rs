//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// Address of the image lookup block used throughout acceptance cases.
pub const QUERY_ADDRESS: &str = "data.cumulus_images_image.test";

/// Provider-published image the public query cases select.
pub const PUBLIC_IMAGE_NAME: &str = "CentOS 7.4 64bit";

/// Anchored pattern matching the public image family.
pub const PUBLIC_IMAGE_REGEX: &str = "^CentOS 7.4";
