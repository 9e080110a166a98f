use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Json};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde_json::json;

use crate::error::{rate_limited_error, Error, HiddenDetail};

/// At most `max` requests per client within `window`.
#[derive(Clone, Copy, Debug)]
pub struct RateLimit {
    pub max: u32,
    pub window: Duration,
}

impl RateLimit {
    pub const GENERAL: RateLimit = RateLimit {
        max: 100,
        window: Duration::from_secs(15 * 60),
    };

    pub const CONTACT: RateLimit = RateLimit {
        max: 5,
        window: Duration::from_secs(15 * 60),
    };

    fn quota(self) -> Quota {
        let max = NonZeroU32::new(self.max).unwrap_or(NonZeroU32::MIN);

        Quota::with_period(self.window / max.get())
            .unwrap_or_else(|| Quota::per_second(max))
            .allow_burst(max)
    }

    pub fn limiter(self) -> Arc<DefaultKeyedRateLimiter<IpAddr>> {
        Arc::new(RateLimiter::keyed(self.quota()))
    }
}

#[derive(Clone)]
pub struct GeneralLimiter(pub Arc<DefaultKeyedRateLimiter<IpAddr>>);

#[derive(Clone)]
pub struct ContactLimiter(pub Arc<DefaultKeyedRateLimiter<IpAddr>>);

/// Socket peer when known, else the first `X-Forwarded-For` hop.
fn client_ip<B>(req: &Request<B>) -> IpAddr {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }

    req.headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|ip| ip.trim().parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn limit_requests<B>(req: Request<B>, next: Next<B>) -> Result<Response, Error> {
    if req.uri().path() != "/health" {
        if let Some(GeneralLimiter(limiter)) = req.extensions().get::<GeneralLimiter>() {
            if limiter.check_key(&client_ip(&req)).is_err() {
                return Err(rate_limited_error(
                    "too many requests from this IP, try again later",
                ));
            }
        }
    }

    Ok(next.run(req).await)
}

pub async fn limit_contact<B>(req: Request<B>, next: Next<B>) -> Result<Response, Error> {
    if let Some(ContactLimiter(limiter)) = req.extensions().get::<ContactLimiter>() {
        if limiter.check_key(&client_ip(&req)).is_err() {
            return Err(rate_limited_error(
                "too many contact attempts, try again later",
            ));
        }
    }

    Ok(next.run(req).await)
}

/// Development only: puts hidden server-side error messages back into the
/// response body.
pub async fn expose_hidden_details<B>(req: Request<B>, next: Next<B>) -> Response {
    let response = next.run(req).await;

    match response.extensions().get::<HiddenDetail>().cloned() {
        Some(HiddenDetail(detail)) => {
            let status = response.status();
            (status, Json(json!({ "ok": false, "error": detail }))).into_response()
        }
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn forwarded_for_is_used_without_socket() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "203.0.113.7".parse::<IpAddr>().unwrap());

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn socket_address_wins() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));

        assert_eq!(client_ip(&req), "192.0.2.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn burst_matches_max() {
        let limiter = RateLimit::CONTACT.limiter();
        let ip: IpAddr = "198.51.100.2".parse().unwrap();

        for _ in 0..5 {
            assert!(limiter.check_key(&ip).is_ok());
        }
        assert!(limiter.check_key(&ip).is_err());

        let other: IpAddr = "198.51.100.3".parse().unwrap();
        assert!(limiter.check_key(&other).is_ok());
    }
}
