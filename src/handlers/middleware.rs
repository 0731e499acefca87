//! Middleware for caller identity and security headers

use crate::error::SchedulingError;
use crate::handlers::AppState;
use crate::models::{Caller, Person, PersonStatus};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

/// Resolve the portal session into a [`Caller`], available via `Extension<Caller>`
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_session_token(request.headers(), &state.session_cookie) else {
        return SchedulingError::Unauthenticated.into_response();
    };

    let person = sqlx::query_as::<_, Person>(
        r#"
        SELECT p.id, p.display_name, p.role, p.status
        FROM sessions s
        JOIN persons p ON p.id = s.person_id
        WHERE s.token_hash = $1 AND s.expires_at > NOW()
        "#,
    )
    .bind(hash_token(&token))
    .fetch_optional(&state.pool)
    .await;

    let person = match person {
        Ok(Some(p)) => p,
        Ok(None) => return SchedulingError::Unauthenticated.into_response(),
        Err(e) => {
            tracing::error!("Database error during session validation: {}", e);
            return SchedulingError::DependencyFailure(e.into()).into_response();
        }
    };

    let caller = match caller_for(person) {
        Ok(caller) => caller,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}

/// Security headers middleware
pub async fn security_headers(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    if state.is_production {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        );
    }

    response
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Inactive and banned accounts never reach the scheduling core
fn caller_for(person: Person) -> Result<Caller, SchedulingError> {
    if person.status != PersonStatus::Active {
        tracing::info!("Rejected request from {:?} person {}", person.status, person.id);
        return Err(SchedulingError::Forbidden);
    }

    Ok(Caller {
        person_id: person.id,
        role: person.role,
        status: person.status,
    })
}

/// Session token from `Authorization: Bearer` or the session cookie
fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        let bearer = bearer.trim();
        if !bearer.is_empty() {
            return Some(bearer.to_string());
        }
    }

    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    let prefix = format!("{}=", cookie_name);
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(&prefix))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
