//! HTTP routes for bloodline
//!
//! [`route`] is the whole HTTP surface as one async function over a fully
//! collected request, so it can be driven without sockets.

pub mod auth_routes;
pub mod cors;
pub mod donors;
pub mod health;
pub mod messages;
pub mod payments;
pub mod response;
pub mod reviews;
pub mod users;

pub use response::FullBody;

use bytes::Bytes;
use hyper::{Method, Request, Response};

use crate::server::AppState;
use response::not_found;

/// The single segment after `prefix`, if the path has exactly that shape
fn path_param<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    path.strip_prefix(prefix)
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
}

/// Dispatch a request to its handler and apply CORS
pub async fn route(state: &AppState, req: Request<Bytes>) -> Response<FullBody> {
    let (parts, body) = req.into_parts();
    let origin = cors::allowed_origin(&parts.headers, &state.cors_origins).cloned();

    if parts.method == Method::OPTIONS {
        return cors::preflight(&parts.headers, origin.as_ref());
    }

    let method = parts.method.clone();
    let path = parts.uri.path();
    let query = parts.uri.query();
    let headers = &parts.headers;

    let response = match (&method, path) {
        (&Method::GET, "/") => health::root(),
        (&Method::GET, "/health") => health::health_check(state),
        (&Method::GET, "/version") => health::version_info(),

        // Session
        (&Method::POST, "/jwt") => auth_routes::issue(state, &body),
        (&Method::GET, "/logout") => auth_routes::logout(),

        // Users and roles
        (&Method::GET, "/users") => users::list(state, headers).await,
        (&Method::PUT, "/save-user") => users::save_user(state, &body).await,
        (&Method::PATCH, "/save-as-a-donator") => users::toggle_donator(state, &body).await,
        (&Method::GET, "/admin-state") => users::admin_state(state, headers).await,

        // Donor directory
        (&Method::GET, "/donors") => donors::list(state, query).await,
        (&Method::POST, "/donors") => donors::create(state, &body).await,

        // Reviews
        (&Method::GET, "/reviews") => reviews::list(state).await,
        (&Method::POST, "/reviews") => reviews::create(state, &body).await,

        // Payments
        (&Method::GET, "/paymentInfo") => payments::list(state, query).await,
        (&Method::POST, "/savePaymentInfo") => payments::save(state, &body).await,
        (&Method::POST, "/create-payment-intent") => payments::create_intent(state, &body).await,

        // Mail
        (&Method::POST, "/sendReq") => messages::send_request(state, &body).await,
        (&Method::POST, "/contactDetails") => messages::contact(state, &body).await,

        (m, p) => {
            if let Some(email) = path_param(p, "/user/").filter(|_| m == Method::GET) {
                users::by_email(state, email).await
            } else if let Some(id) = path_param(p, "/update-role/").filter(|_| m == Method::PUT) {
                users::update_role(state, headers, id, &body).await
            } else if let Some(id) = path_param(p, "/users/").filter(|_| m == Method::DELETE) {
                users::delete_user(state, headers, id).await
            } else if let Some(id) = path_param(p, "/donors/") {
                match *m {
                    Method::GET => donors::get(state, id).await,
                    Method::PUT => donors::update(state, id, &body).await,
                    Method::DELETE => donors::delete(state, id).await,
                    _ => not_found(m, p),
                }
            } else if let Some(id) = path_param(p, "/reviews/").filter(|_| m == Method::DELETE) {
                reviews::delete(state, id).await
            } else {
                not_found(m, p)
            }
        }
    };

    cors::decorate(response, origin.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_param() {
        assert_eq!(path_param("/user/a@x.com", "/user/"), Some("a@x.com"));
        assert_eq!(path_param("/user/", "/user/"), None);
        assert_eq!(path_param("/user/a/b", "/user/"), None);
        assert_eq!(path_param("/users/abc", "/user/"), None);
    }
}
