//! # Common API Types
//!
//! Shared request/response pieces for the list endpoints and partial
//! updates.

use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::ListingConfig;
use crate::error::{ApiError, validation_error};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Offset pagination accepted by every list endpoint
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Number of items to skip (default 0)
    pub skip: Option<u64>,
    /// Maximum number of items to return (default and maximum are configured)
    pub limit: Option<u64>,
}

impl Pagination {
    /// Resolve `(skip, limit)` against the configured bounds.
    pub fn resolve(&self, listing: &ListingConfig) -> Result<(u64, u64), ApiError> {
        let limit = match self.limit {
            None => listing.default_limit,
            Some(0) => {
                return Err(validation_error(
                    "Invalid limit",
                    serde_json::json!({ "limit": "Minimum allowed limit is 1" }),
                ));
            }
            Some(limit) if limit > listing.max_limit => {
                return Err(validation_error(
                    "Invalid limit",
                    serde_json::json!({
                        "limit": format!("Maximum allowed limit is {}", listing.max_limit)
                    }),
                ));
            }
            Some(limit) => limit,
        };

        Ok((self.skip.unwrap_or(0), limit))
    }
}

/// List envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    /// Items of the requested page
    pub data: Vec<T>,
    /// Offset that was applied
    pub skip: u64,
    /// Page size that was applied
    pub limit: u64,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, skip: u64, limit: u64) -> Self {
        Self { data, skip, limit }
    }
}

/// RFC 3339 rendering used by every response body.
pub fn timestamp(value: DateTimeWithTimeZone) -> String {
    value.to_rfc3339()
}
