use crate::ServerState;
use crate::reply::JsonReply;
use log::{error, warn};
use rocket::http::Status;
use rocket::{Request, State, catch, delete, get, options, patch, post, put, route};
use tactix_core::{AnalysisError, ApiReply, HttpMethod, ReplyBody, ValidationError};

#[post("/", data = "<body>")]
pub async fn analyze(state: &State<ServerState>, body: String) -> JsonReply {
    JsonReply(state.handler.handle(&HttpMethod::Post, Some(&body)).await)
}

#[options("/")]
pub async fn preflight(state: &State<ServerState>) -> JsonReply {
    JsonReply(state.handler.handle(&HttpMethod::Options, None).await)
}

#[get("/<_..>")]
pub async fn reject_get(state: &State<ServerState>) -> JsonReply {
    JsonReply(state.handler.handle(&HttpMethod::Get, None).await)
}

#[put("/<_..>")]
pub async fn reject_put(state: &State<ServerState>) -> JsonReply {
    JsonReply(state.handler.handle(&HttpMethod::Put, None).await)
}

#[delete("/<_..>")]
pub async fn reject_delete(state: &State<ServerState>) -> JsonReply {
    JsonReply(state.handler.handle(&HttpMethod::Delete, None).await)
}

#[patch("/<_..>")]
pub async fn reject_patch(state: &State<ServerState>) -> JsonReply {
    JsonReply(state.handler.handle(&HttpMethod::Patch, None).await)
}

#[route(TRACE, uri = "/<_..>")]
pub async fn reject_trace(state: &State<ServerState>) -> JsonReply {
    JsonReply(state.handler.handle(&HttpMethod::Other("TRACE".to_string()), None).await)
}

#[route(CONNECT, uri = "/<_..>")]
pub async fn reject_connect(state: &State<ServerState>) -> JsonReply {
    JsonReply(state.handler.handle(&HttpMethod::Other("CONNECT".to_string()), None).await)
}

/// Envelope for failures raised by Rocket itself (unreadable bodies,
/// unknown paths, panics in handlers).
#[catch(default)]
pub fn fallback(status: Status, request: &Request<'_>) -> JsonReply {
    let err = match status.code {
        400 | 413 | 415 | 422 => {
            AnalysisError::from(ValidationError::InvalidJson(status.to_string()))
        }
        405 => AnalysisError::MethodNotAllowed(request.method().to_string()),
        _ => AnalysisError::Unknown(status.reason().unwrap_or_default().to_string()),
    };
    if status.code >= 500 {
        error!(
            "request failed inside the server (status={}, method={}, uri={})",
            status.code,
            request.method(),
            request.uri()
        );
    } else {
        warn!(
            "request rejected by the server (status={}, method={}, uri={})",
            status.code,
            request.method(),
            request.uri()
        );
    }
    JsonReply(ApiReply {
        status: status.code,
        body: ReplyBody::Error(err.to_envelope()),
    })
}
