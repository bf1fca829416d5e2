//! Typed errors for the geometry toolkit boundary.
//!
//! Everything above this boundary (config, fetch, cache persistence, the
//! scheduler) uses `anyhow` so call sites can attach context with `.context(..)`
//! without inventing a new variant for every failure mode.

use thiserror::Error;

/// Validation failure for a geodetic calculation.
///
/// Toolkit functions return this instead of panicking on bad input; callers
/// (usually a filter's `preprocess`) exclude the aircraft from that filter
/// rather than aborting the cycle.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("value is not finite")]
    NotFinite,
    #[error("latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(f64),
}

pub type GeometryResult<T> = Result<T, GeometryError>;
