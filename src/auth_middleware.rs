//! Authentication middleware that validates the auth cookies and attaches
//! the authenticated user ID to the request.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    auth_cookie::{AuthError, get_user_id_from_cookies},
    state::AppState,
};

/// Middleware function that checks for valid auth cookies.
///
/// The user ID is placed into the request and then the request is executed
/// normally if the cookies are valid, otherwise a 401 response is returned
/// and the inner handler never runs.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
///
/// **Note**: The app state must contain an `axum_extra::extract::cookie::Key`
/// for decrypting and verifying the cookie contents.
pub async fn auth_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Rejecting request.");
            return AuthError::CookieMissing.into_response();
        }
    };

    let user_id = match get_user_id_from_cookies(&jar) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router,
        http::StatusCode,
        middleware,
        routing::get,
    };
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{state::AppState, user::UserID};

    use super::auth_guard;

    async fn whoami(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    fn new_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state = AppState::new(connection, "foobar").expect("Could not create app state");

        let app = Router::new()
            .route("/protected", get(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn rejects_request_without_cookies() {
        let server = new_test_server();

        let response = server.get("/protected").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
