//! Provider orchestration.
//!
//! This module wraps providers with the machinery shared by all of them:
//! - Per-provider rate limiting
//! - Bar series validation
//! - The cache-then-limit-then-fetch adapter that never fails

mod adapter;
mod rate_limiter;
mod unavailable;
mod validator;

pub use adapter::{ProviderAdapter, ProviderResult};
pub use rate_limiter::{RateLimiter, DEFAULT_REQUESTS_PER_MINUTE};
pub use unavailable::UnavailableReason;
pub use validator::{
    BarValidator, SeriesViolation, ValidationFailed, ValidationIssue, ValidationSeverity,
    ValidatorConfig,
};
