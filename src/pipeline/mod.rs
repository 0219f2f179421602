pub use manager::*;
pub use store::*;

mod manager;
mod store;

/// Served when even copying the fallback image into place fails.
pub const FALLBACK_THUMBNAIL_URL: &str = "/error_thumbnail.jpg";
