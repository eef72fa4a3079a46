use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::HeaderMap;
use axum::response::Response;
use http_body_util::BodyExt;
use strata::domain::CapturedResponse;
use tracing::warn;

/// Buffer the completed origin response so the same bytes can be replayed to
/// the client and handed to the write path.
///
/// If the body cannot be collected the response is rebuilt empty and nothing
/// is captured; the cache layer never turns a body error into a client error
/// of its own.
pub(crate) async fn buffer_response(response: Response) -> (Response, Option<CapturedResponse>) {
    let (parts, body) = response.into_parts();
    match BodyExt::collect(body).await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let captured = CapturedResponse {
                status: parts.status.as_u16(),
                headers: header_map(&parts.headers),
                body: bytes.clone(),
            };
            (Response::from_parts(parts, Body::from(bytes)), Some(captured))
        }
        Err(err) => {
            warn!("failed to buffer response body: {}", err);
            (Response::from_parts(parts, Body::empty()), None)
        }
    }
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
