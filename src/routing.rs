//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};

use crate::{
    accounts::{create_account_endpoint, get_accounts},
    auth_middleware::auth_guard,
    endpoints,
    log_in::post_log_in,
    log_out::get_log_out,
    logging::logging_middleware,
    register::create_user,
    state::AppState,
    summary::get_summary,
    transactions::{create_transaction_endpoint, delete_transaction_endpoint, get_transactions},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::USERS, post(create_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(
            endpoints::ACCOUNTS,
            get(get_accounts).post(create_account_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            delete(delete_transaction_endpoint),
        )
        .route(endpoints::SUMMARY, get(get_summary))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    StatusCode::IM_A_TEAPOT.into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{auth_cookie::COOKIE_USER_ID, endpoints, state::AppState};

    use super::build_router;

    fn new_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state = AppState::new(connection, "foobar").expect("Could not create app state");
        let app = build_router(state);

        TestServer::builder()
            .save_cookies()
            .build(app)
    }

    async fn register(server: &TestServer, username: &str, bank_name: &str, balance: f64) -> Value {
        let response = server
            .post(endpoints::USERS)
            .json(&json!({
                "username": username,
                "password": "averylongandsecurepassword",
                "bank_name": bank_name,
                "initial_balance": balance,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()
    }

    async fn log_in(server: &TestServer, username: &str) {
        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "username": username,
                "password": "averylongandsecurepassword",
            }))
            .await;

        response.assert_status(StatusCode::OK);
        // A log-in response must set the session cookie.
        response.cookie(COOKIE_USER_ID);
    }

    #[tokio::test]
    async fn coffee_route_returns_teapot() {
        let server = new_test_server();

        let response = server.get(endpoints::COFFEE).await;

        response.assert_status(StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn protected_routes_reject_unauthenticated_requests() {
        let server = new_test_server();

        server
            .get(endpoints::ACCOUNTS)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get(endpoints::TRANSACTIONS)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get(endpoints::SUMMARY)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "account_id": 1,
                "type": "income",
                "amount": 50.0,
                "category": "salary",
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .delete(&endpoints::format_endpoint(endpoints::TRANSACTION, 1))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_duplicate_username_returns_conflict() {
        let server = new_test_server();
        register(&server, "alice", "Chase", 100.0).await;

        let response = server
            .post(endpoints::USERS)
            .json(&json!({
                "username": "alice",
                "password": "averylongandsecurepassword",
                "bank_name": "Kiwibank",
                "initial_balance": 50.0,
            }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = new_test_server();
        register(&server, "alice", "Chase", 100.0).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "username": "alice",
                "password": "thewrongpassword",
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        // The message must not reveal whether the username or password was wrong.
        let body = response.json::<Value>();
        assert_eq!(body["error"], "incorrect username or password");

        let unknown_user_response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "username": "mallory",
                "password": "thewrongpassword",
            }))
            .await;

        unknown_user_response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user_response.json::<Value>()["error"], body["error"]);
    }

    #[tokio::test]
    async fn unrecognized_transaction_type_is_rejected() {
        let server = new_test_server();
        let registration = register(&server, "alice", "Chase", 100.0).await;
        let account_id = registration["account"]["id"].as_i64().unwrap();
        log_in(&server, "alice").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "account_id": account_id,
                "type": "transfer",
                "amount": 50.0,
                "category": "salary",
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn tracks_balances_across_transactions() {
        let server = new_test_server();
        let registration = register(&server, "alice", "Chase", 100.0).await;
        let account_id = registration["account"]["id"].as_i64().unwrap();
        log_in(&server, "alice").await;

        // One income of 50 brings the account from 100 to 150.
        let income_response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "account_id": account_id,
                "type": "income",
                "amount": 50.0,
                "category": "salary",
            }))
            .await;
        income_response.assert_status(StatusCode::CREATED);
        let income_id = income_response.json::<Value>()["id"].as_i64().unwrap();

        let accounts = server.get(endpoints::ACCOUNTS).await.json::<Value>();
        assert_eq!(accounts[0]["balance"].as_f64(), Some(150.0));

        let summary = server.get(endpoints::SUMMARY).await.json::<Value>();
        assert_eq!(summary["income"].as_f64(), Some(50.0));
        assert_eq!(summary["balance"].as_f64(), Some(50.0));

        // One expense of 30 brings the account down to 120.
        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "account_id": account_id,
                "type": "expense",
                "amount": 30.0,
                "category": "food",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let accounts = server.get(endpoints::ACCOUNTS).await.json::<Value>();
        assert_eq!(accounts[0]["balance"].as_f64(), Some(120.0));

        let summary = server.get(endpoints::SUMMARY).await.json::<Value>();
        assert_eq!(summary["income"].as_f64(), Some(50.0));
        assert_eq!(summary["expense"].as_f64(), Some(30.0));
        assert_eq!(summary["balance"].as_f64(), Some(20.0));

        // Deleting the income removes it from the log but the account
        // balance stays at 120.
        server
            .delete(&endpoints::format_endpoint(endpoints::TRANSACTION, income_id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let transactions = server.get(endpoints::TRANSACTIONS).await.json::<Value>();
        let transactions = transactions.as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["type"], "expense");

        let accounts = server.get(endpoints::ACCOUNTS).await.json::<Value>();
        assert_eq!(accounts[0]["balance"].as_f64(), Some(120.0));
    }

    #[tokio::test]
    async fn deleting_another_users_transaction_is_a_no_op() {
        let server = new_test_server();
        let registration = register(&server, "alice", "Chase", 100.0).await;
        let account_id = registration["account"]["id"].as_i64().unwrap();
        log_in(&server, "alice").await;

        let income_response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "account_id": account_id,
                "type": "income",
                "amount": 50.0,
                "category": "salary",
            }))
            .await;
        income_response.assert_status(StatusCode::CREATED);
        let income_id = income_response.json::<Value>()["id"].as_i64().unwrap();

        // Log in as a different user, who must not be able to delete
        // alice's transaction or learn that it exists.
        register(&server, "bob", "Kiwibank", 0.0).await;
        log_in(&server, "bob").await;

        server
            .delete(&endpoints::format_endpoint(endpoints::TRANSACTION, income_id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        log_in(&server, "alice").await;
        let transactions = server.get(endpoints::TRANSACTIONS).await.json::<Value>();
        assert_eq!(transactions.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_account_adds_a_second_account() {
        let server = new_test_server();
        register(&server, "alice", "Chase", 100.0).await;
        log_in(&server, "alice").await;

        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({
                "bank_name": "Kiwibank",
                "initial_balance": 25.0,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let accounts = server.get(endpoints::ACCOUNTS).await.json::<Value>();
        let accounts = accounts.as_array().unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0]["bank_name"], "Chase");
        assert_eq!(accounts[0]["balance"].as_f64(), Some(100.0));
        assert_eq!(accounts[1]["bank_name"], "Kiwibank");
        assert_eq!(accounts[1]["balance"].as_f64(), Some(25.0));
    }

    #[tokio::test]
    async fn log_out_ends_the_session() {
        let server = new_test_server();
        register(&server, "alice", "Chase", 100.0).await;
        log_in(&server, "alice").await;

        server
            .get(endpoints::LOG_OUT)
            .await
            .assert_status(StatusCode::OK);

        server
            .get(endpoints::ACCOUNTS)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
