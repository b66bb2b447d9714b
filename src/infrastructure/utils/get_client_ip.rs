use actix_web::{dev::ServiceRequest, HttpRequest};

/// Client IP, honouring the first `X-Forwarded-For` hop only when the proxy is trusted.
pub fn get_client_ip(req: &HttpRequest, trust_x_forwarded_for: bool) -> String {
    if trust_x_forwarded_for {
        if let Some(ip) = forwarded_ip(req) {
            return ip;
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn service_client_ip(req: &ServiceRequest, trust_x_forwarded_for: bool) -> String {
    get_client_ip(req.request(), trust_x_forwarded_for)
}

fn forwarded_ip(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

pub fn user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(256).collect())
}
