use std::sync::Arc;

use slog::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{with_status, WithStatus};

use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod rejection;
mod response;

pub use internal::*;

/// The maximum form data size to accept. This should be enforced by
/// the HTTP gateway, so on the Rust side it’s set to an unreasonably
/// large number.
const MAX_CONTENT_LENGTH: u64 = 2 * 1024 * 1024 * 1024;

/// The user-facing message for an email or license-number collision.
const DUPLICATE_ENTRY_MESSAGE: &str =
    "Duplicate entry detected. Please check your email or license number.";

/// Converts a handler rejection into a plain-text error response,
/// logging it with its context on the way out.
pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<String>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Registration failed"; "context" => ?r.context, "error" => ?e, "message" => %e);

        return Ok(with_status(message_for(e), StatusCode::BAD_REQUEST));
    }

    Err(rej)
}

/// Every handled failure surfaces as a 400 with a human-readable
/// message; only the duplicate case gets a specific one.
fn message_for(e: &BackendError) -> String {
    match e {
        BackendError::DuplicateEntry => DUPLICATE_ENTRY_MESSAGE.to_owned(),
        other => format!("Error: {}", other),
    }
}

mod internal {
    use warp::filters::multipart::form;
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{get, path as p, post};

    use super::{handlers, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    /// `POST /register`: the single registration endpoint.
    pub fn make_register_route(environment: Environment) -> Route {
        warp::any()
            .map(move || environment.clone())
            .and(p("register"))
            .and(end())
            .and(post())
            .and(form().max_length(MAX_CONTENT_LENGTH))
            .and_then(handlers::register)
            .boxed()
    }

    /// `GET /`: the static landing page carrying the registration form.
    pub fn make_index_route() -> Route {
        get()
            .and(end())
            .and(warp::fs::file("public/index.html"))
            .map(|file: warp::fs::File| Box::new(file) as Box<dyn Reply>)
            .boxed()
    }
}
