use crate::{config::Limits, errors::AppError};
use governor::{DefaultDirectRateLimiter, DefaultKeyedRateLimiter, Quota, RateLimiter};
use http::{header, HeaderMap};
use nonzero_ext::nonzero;
use std::{num::NonZeroU32, sync::Arc};

pub fn require_bearer(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized("missing authorization header"))?;
    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized("invalid authorization format, expected 'Bearer <token>'"))?
        .trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("empty token"));
    }
    if token != expected {
        return Err(AppError::Unauthorized("invalid auth token"));
    }
    Ok(())
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn content_length_ok(headers: &HeaderMap, max_bytes: usize) -> Result<(), AppError> {
    if let Some(len) = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
    {
        if len > max_bytes {
            return Err(AppError::RequestTooLarge);
        }
    }
    Ok(())
}

/// Global quota plus one quota per bearer token.
#[derive(Clone)]
pub struct RateLimiters {
    per_token: Arc<DefaultKeyedRateLimiter<String>>,
    global: Arc<DefaultDirectRateLimiter>,
}

impl RateLimiters {
    pub fn new(per_token_rps: u32, per_token_burst: u32, global_rps: u32, global_burst: u32) -> Self {
        Self {
            per_token: Arc::new(RateLimiter::keyed(quota(per_token_rps, per_token_burst))),
            global: Arc::new(RateLimiter::direct(quota(global_rps, global_burst))),
        }
    }

    pub fn from_limits(limits: &Limits) -> Self {
        Self::new(limits.per_token_rps, limits.per_token_burst, limits.global_rps, limits.global_burst)
    }

    pub fn check(&self, token: Option<&str>) -> Result<(), AppError> {
        if self.global.check().is_err() {
            return Err(AppError::RateLimited);
        }
        if let Some(token) = token {
            if self.per_token.check_key(&token.to_string()).is_err() {
                return Err(AppError::RateLimited);
            }
        }
        Ok(())
    }
}

fn quota(rps: u32, burst: u32) -> Quota {
    let rps = NonZeroU32::new(rps).unwrap_or(nonzero!(1u32));
    let burst = NonZeroU32::new(burst).unwrap_or(rps);
    Quota::per_second(rps).allow_burst(burst)
}
