//! Axum middleware enforcing bearer authentication.
//!
//! Extracts the Authorization header and runs the decision engine on the
//! blocking pool. The request then either carries the
//! [`AuthenticatedIdentity`] in its extensions or gets a 401 with a
//! challenge header.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/orders", get(list_orders))
//!     .layer(axum::middleware::from_fn_with_state(authenticator, require_bearer));
//! ```

use crate::authenticator::BearerAuthenticator;
use crate::challenge::www_authenticate;
use crate::error::{FailureKind, Rejection};
use crate::outcome::{AuthenticatedIdentity, Decision};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// 401 response for a rejected request.
#[derive(Debug)]
pub struct AuthRejection {
    realm: String,
    rejection: Rejection,
}

impl AuthRejection {
    #[must_use]
    pub fn new(realm: impl Into<String>, rejection: Rejection) -> Self {
        Self {
            realm: realm.into(),
            rejection,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.rejection.kind.as_str().to_ascii_uppercase(),
                message: self.rejection.description.clone(),
            },
        };

        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();

        match HeaderValue::from_str(&www_authenticate(&self.realm, &self.rejection)) {
            Ok(value) => {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
            Err(e) => {
                // Realm with control characters; fall back to a bare challenge
                tracing::warn!(target: "bearer.auth.engine", error = %e, "Challenge header is not a valid header value");
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
        }

        response
    }
}

/// Authentication middleware for `axum::middleware::from_fn_with_state`.
///
/// # Response
///
/// - 401 with `WWW-Authenticate` and a JSON error body on rejection
/// - Otherwise continues with the identity in request extensions
#[instrument(skip_all, name = "bearer.auth.middleware")]
pub async fn require_bearer(
    State(authenticator): State<Arc<BearerAuthenticator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let decision = match req.headers().get(header::AUTHORIZATION) {
        None => authenticator.authenticate(None),
        Some(value) => match value.to_str() {
            Ok(text) => decide_off_runtime(&authenticator, text.to_string()).await,
            Err(_) => {
                tracing::debug!(target: "bearer.auth.token", "Authorization header is not visible ASCII");
                Decision::Rejected(Rejection::new(FailureKind::MalformedHeader))
            }
        },
    };

    match decision {
        Decision::Accepted(identity) => {
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        Decision::Rejected(rejection) => Err(AuthRejection::new(authenticator.realm_name(), rejection)),
    }
}

/// Run the decision on the blocking pool.
///
/// A cache miss may call into the identity store, which is free to block.
/// A decision task that dies is reported as a store outage, never a 500.
async fn decide_off_runtime(authenticator: &Arc<BearerAuthenticator>, header: String) -> Decision {
    let authenticator = Arc::clone(authenticator);
    tokio::task::spawn_blocking(move || authenticator.authenticate(Some(header.as_str())))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(target: "bearer.auth.engine", error = %e, "Authentication task failed");
            Decision::Rejected(Rejection::new(FailureKind::IdentityStoreUnavailable))
        })
}

/// Access to the identity injected by [`require_bearer`].
pub trait IdentityExt {
    /// `None` if the middleware did not run for this request.
    fn identity(&self) -> Option<&AuthenticatedIdentity>;
}

impl<B> IdentityExt for axum::http::Request<B> {
    fn identity(&self) -> Option<&AuthenticatedIdentity> {
        self.extensions().get::<AuthenticatedIdentity>()
    }
}
