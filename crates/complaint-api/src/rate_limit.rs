use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::warn;

use crate::error::ApiError;

/// Buckets are pruned once this many clients are tracked.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Token bucket per client IP, refilled at `rps` tokens per second with a
/// burst of `rps`.
#[derive(Clone)]
pub struct ClientRateLimiter {
    buckets: Arc<DashMap<IpAddr, Bucket>>,
    rps: u32,
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last: Instant,
}

impl ClientRateLimiter {
    /// `None` when `rps` is absent or zero.
    pub fn new(rps: Option<u32>) -> Option<Self> {
        let rps = rps.filter(|&n| n > 0)?;
        Some(Self {
            buckets: Arc::new(DashMap::new()),
            rps,
        })
    }

    /// Take one token from `client`'s bucket.
    pub fn check(&self, client: IpAddr) -> Result<(), String> {
        let rate = self.rps as f64;
        let now = Instant::now();
        if self.buckets.len() >= MAX_TRACKED_CLIENTS {
            self.prune(now);
        }

        let mut bucket = self.buckets.entry(client).or_insert_with(|| Bucket {
            tokens: rate,
            last: now,
        });
        let elapsed = now.duration_since(bucket.last).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(rate);
        bucket.last = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Ok(());
        }

        let wait = Duration::from_secs_f64((1.0 - bucket.tokens) / rate);
        Err(format!(
            "rate limit exceeded (RATE_LIMIT_RPS={}): try again in ~{}ms",
            self.rps,
            wait.as_millis()
        ))
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Drop buckets that would have refilled completely by `now`.
    fn prune(&self, now: Instant) {
        let rate = self.rps as f64;
        self.buckets.retain(|_, bucket| {
            bucket.tokens + now.duration_since(bucket.last).as_secs_f64() * rate < rate
        });
    }
}

/// Peer address from `ConnectInfo`; in-process requests without one share
/// the loopback bucket.
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub async fn limit_requests(
    State(limiter): State<ClientRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);
    match limiter.check(client) {
        Ok(()) => next.run(request).await,
        Err(message) => {
            warn!(%client, "rate limit exceeded");
            ApiError::TooManyRequests(message).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 1));
    const BOB: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 2));

    #[test]
    fn test_disabled_when_zero_or_absent() {
        assert!(ClientRateLimiter::new(None).is_none());
        assert!(ClientRateLimiter::new(Some(0)).is_none());
    }

    #[test]
    fn test_burst_then_reject() {
        let limiter = ClientRateLimiter::new(Some(2)).unwrap();
        assert!(limiter.check(ALICE).is_ok());
        assert!(limiter.check(ALICE).is_ok());
        let Err(message) = limiter.check(ALICE) else {
            panic!("third request inside the burst window must be rejected");
        };
        assert!(message.starts_with("rate limit exceeded (RATE_LIMIT_RPS=2)"));
    }

    #[test]
    fn test_clients_have_separate_buckets() {
        let limiter = ClientRateLimiter::new(Some(1)).unwrap();
        assert!(limiter.check(ALICE).is_ok());
        assert!(limiter.check(ALICE).is_err());
        assert!(limiter.check(BOB).is_ok());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_prune_keeps_draining_buckets() {
        let limiter = ClientRateLimiter::new(Some(1)).unwrap();
        limiter.check(ALICE).unwrap();
        limiter.prune(Instant::now());
        assert_eq!(limiter.tracked_clients(), 1);

        limiter.prune(Instant::now() + Duration::from_secs(5));
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
