use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{ContentType, Header, Status};
use rocket::response::{self, Responder, Response};
use rocket::{Request, async_trait};
use std::io::Cursor;
use tactix_core::ApiReply;

/// Rocket responder for a handler reply.
pub struct JsonReply(pub ApiReply);

impl<'r> Responder<'r, 'static> for JsonReply {
    fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
        let status = Status::from_code(self.0.status).unwrap_or(Status::InternalServerError);
        let body = self.0.to_json();
        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

/// Stamps CORS and content-type headers on every response, catchers included.
pub struct CorsHeaders;

#[async_trait]
impl Fairing for CorsHeaders {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(ContentType::JSON);
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
        response.set_header(Header::new("Access-Control-Allow-Methods", "POST, OPTIONS"));
    }
}
