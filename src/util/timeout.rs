//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::{ForgeError, Result};
use crate::models::Vendor;

/// Wrap a vendor call with an optional timeout.
///
/// `None` awaits the future without a bound.
pub async fn with_timeout<T>(
    vendor: Vendor,
    duration: Option<Duration>,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    let Some(duration) = duration else {
        return future.await;
    };
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ForgeError::Timeout {
            vendor,
            millis: duration.as_millis() as u64,
        }),
    }
}
