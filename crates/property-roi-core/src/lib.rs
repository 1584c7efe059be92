pub mod amortization;
pub mod error;
pub mod projection;
pub mod scoring;
pub mod time_value;
pub mod types;

#[cfg(feature = "rental")]
pub mod rental;

pub use error::PropertyRoiError;
pub use types::*;

/// Standard result type for all property-roi operations
pub type PropertyRoiResult<T> = Result<T, PropertyRoiError>;
