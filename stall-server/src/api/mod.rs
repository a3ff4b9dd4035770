//! API 路由模块
//!
//! 所有路由都在 `/api/v1` 下，认证由外部网关负责。
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 顾客下单与查询
//! - [`queue`] - 叫号队列
//! - [`menu`] - 可售菜单
//! - [`staff`] - 员工确认付款 / 出餐 / 取消
//! - [`admin`] - 菜单管理与订单清理

pub mod admin;
pub mod health;
pub mod menu;
pub mod orders;
pub mod queue;
pub mod staff;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(queue::router())
        .merge(menu::router())
        .merge(staff::router())
        .merge(admin::router())
}

/// Router with state and HTTP layers applied
pub fn create_router(state: ServerState) -> Router {
    build_app()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use axum::body::Body;
    use http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use shared::models::MenuItemCreate;
    use tower::ServiceExt;

    async fn test_app() -> (Router, ServerState) {
        let state = ServerState::in_memory(Config::with_overrides("./data", 0)).unwrap();
        state
            .menu
            .create(MenuItemCreate {
                name: "Pad Thai".to_string(),
                price: 40.0,
                category: Some("Noodles".to_string()),
                image_url: None,
                available: None,
            })
            .await
            .unwrap();
        (create_router(state.clone()), state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn pad_thai_order(quantity: i32) -> Value {
        json!({
            "customer_name": "John Doe",
            "date_key": 1401,
            "items": [{ "menu_item_id": 1, "name": "Pad Thai", "price": 40.0, "quantity": quantity }]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["checks"]["database"]["status"], "ok");
        // 默认 ORDER_CACHE=noop
        assert_eq!(body["checks"]["cache"]["enabled"], false);
    }

    #[tokio::test]
    async fn test_order_lifecycle_over_http() {
        let (app, _) = test_app().await;

        let (status, order) =
            send(&app, Method::POST, "/api/v1/orders", Some(pad_thai_order(2))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["id"], "14010001");
        assert_eq!(order["total_amount"], 80.0);
        assert_eq!(order["status"], "PENDING_PAYMENT");

        let (status, pending) = send(&app, Method::GET, "/api/v1/staff/orders/pending", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().unwrap().len(), 1);

        // 空 body 也可以确认付款
        let (status, paid) =
            send(&app, Method::PUT, "/api/v1/staff/orders/14010001/verify", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["status"], "PAID");
        assert_eq!(paid["queue_number"], 1);

        let (_, queue) = send(&app, Method::GET, "/api/v1/queue", None).await;
        assert_eq!(queue[0]["id"], "14010001");

        let (status, done) =
            send(&app, Method::PUT, "/api/v1/staff/orders/14010001/complete", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["status"], "COMPLETED");

        let (_, completed) =
            send(&app, Method::GET, "/api/v1/staff/orders/completed", None).await;
        assert_eq!(completed.as_array().unwrap().len(), 1);

        let (status, fetched) = send(&app, Method::GET, "/api/v1/orders/14010001", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["status"], "COMPLETED");
    }

    #[tokio::test]
    async fn test_verify_with_payment_method() {
        let (app, _) = test_app().await;
        send(&app, Method::POST, "/api/v1/orders", Some(pad_thai_order(1))).await;

        let (status, paid) = send(
            &app,
            Method::PUT,
            "/api/v1/staff/orders/14010001/verify",
            Some(json!({ "payment_method": "PROMPTPAY" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["payment_method"], "PROMPTPAY");

        // 重复确认
        let (status, body) =
            send(&app, Method::PUT, "/api/v1/staff/orders/14010001/verify", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 4002);
        assert_eq!(body["details"]["actual"], "PAID");
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let (app, _) = test_app().await;

        let mut tampered = pad_thai_order(1);
        tampered["items"][0]["price"] = json!(10.0);
        let (status, body) = send(&app, Method::POST, "/api/v1/orders", Some(tampered)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], 6004);

        let mut bad_name = pad_thai_order(1);
        bad_name["customer_name"] = json!("J");
        let (status, body) = send(&app, Method::POST, "/api/v1/orders", Some(bad_name)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 2);

        let mut empty = pad_thai_order(1);
        empty["items"] = json!([]);
        let (status, body) = send(&app, Method::POST, "/api/v1/orders", Some(empty)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 4007);

        let (status, body) = send(&app, Method::GET, "/api/v1/orders/14019999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 4001);

        let (status, _) =
            send(&app, Method::PUT, "/api/v1/staff/orders/14019999/complete", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancel_over_http() {
        let (app, _) = test_app().await;
        send(&app, Method::POST, "/api/v1/orders", Some(pad_thai_order(1))).await;

        let (status, body) = send(&app, Method::DELETE, "/api/v1/staff/orders/14010001", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "CANCELLED");

        let (status, _) = send(&app, Method::DELETE, "/api/v1/staff/orders/14010001", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_menu_admin() {
        let (app, _) = test_app().await;

        let (status, item) = send(
            &app,
            Method::POST,
            "/api/v1/admin/menu",
            Some(json!({ "name": "Som Tam", "price": 35.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["id"], 2);
        assert_eq!(item["available"], true);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/admin/menu",
            Some(json!({ "name": "Som Tam", "price": 30.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 6005);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/v1/admin/menu/2",
            Some(json!({ "available": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, public) = send(&app, Method::GET, "/api/v1/menu", None).await;
        assert_eq!(public.as_array().unwrap().len(), 1);
        let (_, all) = send(&app, Method::GET, "/api/v1/admin/menu", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (status, _) = send(&app, Method::DELETE, "/api/v1/admin/menu/2", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::GET, "/api/v1/admin/menu/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_lists_orders_in_every_status() {
        let (app, _) = test_app().await;
        for _ in 0..3 {
            send(&app, Method::POST, "/api/v1/orders", Some(pad_thai_order(1))).await;
        }
        send(&app, Method::PUT, "/api/v1/staff/orders/14010001/verify", None).await;
        send(&app, Method::DELETE, "/api/v1/staff/orders/14010002", None).await;

        let (status, orders) = send(&app, Method::GET, "/api/v1/admin/orders", None).await;
        assert_eq!(status, StatusCode::OK);
        let orders = orders.as_array().unwrap();
        assert_eq!(orders.len(), 3);
        let statuses: Vec<&str> = orders
            .iter()
            .map(|o| o["status"].as_str().unwrap())
            .collect();
        assert!(statuses.contains(&"PAID"));
        assert!(statuses.contains(&"CANCELLED"));
        assert!(statuses.contains(&"PENDING_PAYMENT"));
    }

    #[tokio::test]
    async fn test_purge_orders() {
        let (app, state) = test_app().await;
        for _ in 0..3 {
            send(&app, Method::POST, "/api/v1/orders", Some(pad_thai_order(1))).await;
        }

        let (status, body) = send(
            &app,
            Method::DELETE,
            "/api/v1/admin/orders",
            Some(json!({ "ids": ["14010001"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 1);

        let (status, _) = send(&app, Method::DELETE, "/api/v1/admin/orders", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            send(&app, Method::DELETE, "/api/v1/admin/orders?all=true", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 2);
        assert!(state.orders.get_pending_payment().await.unwrap().is_empty());
    }
}
