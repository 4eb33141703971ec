//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    capture::capture_transaction_endpoint,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_proxy, edit_transaction_endpoint,
        get_create_transaction_page, get_edit_transaction_page, get_transaction_proxy,
        get_transactions_page, refresh_transaction_form, update_transaction_proxy,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        // The JSON proxy authenticates with the bearer header instead of the cookie.
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_proxy)
                .patch(update_transaction_proxy)
                .delete(delete_transaction_proxy),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION_FORM_API,
                post(refresh_transaction_form),
            )
            .route(
                endpoints::EDIT_TRANSACTION_VIEW,
                put(edit_transaction_endpoint),
            )
            .route(endpoints::CAPTURE_API, post(capture_transaction_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the transactions page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::TRANSACTIONS_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_transactions() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::TRANSACTIONS_VIEW);
    }
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use time::Duration;

    use crate::{
        AppState, endpoints,
        test_utils::{StubServer, auth_cookie, describe_client, upstream_client},
    };

    use super::build_router;

    fn get_test_server(upstream: &StubServer) -> (TestServer, AppState) {
        let state = AppState::new(
            "42",
            Duration::days(7),
            "Etc/UTC",
            upstream_client(upstream),
            describe_client(upstream),
        )
        .expect("Could not create app state");

        let server =
            TestServer::try_new(build_router(state.clone())).expect("Could not create test server");

        (server, state)
    }

    #[tokio::test]
    async fn pages_redirect_to_log_in_without_cookie() {
        let upstream = StubServer::spawn(StatusCode::OK, "[]").await;
        let (server, _) = get_test_server(&upstream);

        let response = server.get(endpoints::TRANSACTIONS_VIEW).await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            response.header("location"),
            "/log_in?redirect_url=%2Ftransactions"
        );
        upstream.assert_no_requests();
    }

    #[tokio::test]
    async fn htmx_routes_redirect_with_hx_redirect() {
        let upstream = StubServer::spawn(StatusCode::OK, "{}").await;
        let (server, _) = get_test_server(&upstream);

        let response = server.post(endpoints::TRANSACTIONS_API).await;

        assert!(response.maybe_header("hx-redirect").is_some());
        upstream.assert_no_requests();
    }

    #[tokio::test]
    async fn pages_are_served_with_cookie() {
        let upstream = StubServer::spawn(StatusCode::OK, "[]").await;
        let (server, state) = get_test_server(&upstream);

        let response = server
            .get(endpoints::TRANSACTIONS_VIEW)
            .add_cookie(auth_cookie(&state.cookie_key, "secret"))
            .await;

        response.assert_status_ok();
        assert_eq!(
            upstream.single_request().authorization.as_deref(),
            Some("Bearer secret")
        );
    }

    #[tokio::test]
    async fn proxy_uses_bearer_header_not_cookie() {
        let upstream = StubServer::spawn(StatusCode::OK, "{}").await;
        let (server, state) = get_test_server(&upstream);

        let response = server
            .get(&format!("{}/1", endpoints::TRANSACTIONS_API))
            .add_cookie(auth_cookie(&state.cookie_key, "secret"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "Authorization token is required" }));
        upstream.assert_no_requests();
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let upstream = StubServer::spawn(StatusCode::OK, "{}").await;
        let (server, _) = get_test_server(&upstream);

        let response = server.get("/does-not-exist").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
