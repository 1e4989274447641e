//! Axum extractors for actor identity
//!
//! Authentication itself lives upstream: the gateway validates the
//! caller's credentials and forwards the resolved user id in the
//! `x-user-id` header. These extractors only parse that assertion.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

/// Header carrying the authenticated user's id
pub const ACTOR_HEADER: &str = "x-user-id";

/// Acting user extracted from the request
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Uuid);

/// Error response for identity failures
#[derive(Debug, Serialize)]
struct ActorErrorResponse {
    error: ActorErrorDetail,
}

#[derive(Debug, Serialize)]
struct ActorErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Identity rejection type
pub struct ActorRejection {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for ActorRejection {
    fn into_response(self) -> Response {
        let body = ActorErrorResponse {
            error: ActorErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ActorRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(ACTOR_HEADER).ok_or(ActorRejection {
            status: StatusCode::UNAUTHORIZED,
            code: "MISSING_IDENTITY",
            message: "No authenticated identity provided",
        })?;

        let value = header.to_str().map_err(|_| ActorRejection {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_HEADER",
            message: "Invalid x-user-id header encoding",
        })?;

        let user_id = Uuid::parse_str(value).map_err(|_| ActorRejection {
            status: StatusCode::UNAUTHORIZED,
            code: "INVALID_IDENTITY",
            message: "Malformed user id",
        })?;

        Ok(Actor(user_id))
    }
}
