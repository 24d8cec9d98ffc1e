//! `/rtp/{channel_id}/{channel_key}/{token}` routing.
//!
//! The token's prefix picks the path: multicast addresses are redirected to
//! the multicast proxy, program tokens go through the on-demand pipeline and
//! anything else is rejected before any work is done.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;
use u7d_common::{Error, RequestIdentity, TokenKind};

use super::error::AppError;
use super::AppContext;
use crate::streaming::{open_program_stream, MIME_TS};

/// Address of the requesting client.
///
/// Taken from the first `X-Forwarded-For` entry when present, else from the
/// TCP peer address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(
            forwarded
                .or(peer)
                .unwrap_or_else(|| "unknown".to_string()),
        ))
    }
}

/// Serve a relay request.
pub async fn handle_rtp(
    State(ctx): State<AppContext>,
    ClientIp(client_ip): ClientIp,
    Path((channel_id, channel_key, token)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    let identity = RequestIdentity::new(channel_id, channel_key, token);
    info!("Request: GET /rtp/{} [{}]", identity, client_ip);

    match identity.kind() {
        TokenKind::Multicast => {
            let location = format!("{}{}", ctx.config.relay.multicast_base_url, identity.token);
            info!("Redirect: {}", location);
            Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
        }
        TokenKind::Program => {
            let relay = open_program_stream(&ctx, &identity, &client_ip).await?;

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, MIME_TS)
                .body(Body::from_stream(relay.into_stream()))
                .map_err(|e| AppError::from(Error::relay(e)))
        }
        TokenKind::Unrecognized => Err(Error::UnrecognizedRequest.into()),
    }
}
