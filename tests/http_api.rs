mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use bank_ms::web::{account_routes, customer_routes, json_config};

macro_rules! app {
    ($system:expr) => {
        test::init_service(
            App::new()
                .app_data(json_config())
                .app_data(web::Data::new($system.settings))
                .app_data(web::Data::from($system.accounts.clone()))
                .app_data(web::Data::from($system.customers.clone()))
                .app_data(web::Data::from($system.projection.clone()))
                .configure(account_routes)
                .configure(customer_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_customer_and_account_over_http() {
    let system = common::system();
    let app = app!(system);

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .set_json(json!({
            "name": "Grace Hopper",
            "nationalId": "289012345678",
            "customerType": "RETAIL",
            "address": "1 Navy Yard Road, Arlington"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let customer: Value = test::read_body_json(resp).await;
    assert_eq!(customer["customerNumber"], "1234567");
    assert_eq!(customer["status"], "PENDING");

    let req = test::TestRequest::put()
        .uri("/api/customers/1234567/status")
        .set_json(json!({ "status": "ACTIVE" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/accounts")
        .set_json(json!({ "customerNumber": "1234567", "accountType": "SAVING" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let account: Value = test::read_body_json(resp).await;
    assert_eq!(account["accountNumber"], "1234567001");
    assert_eq!(account["status"], "PENDING");

    let req = test::TestRequest::put()
        .uri("/api/accounts/1234567001/status")
        .set_json(json!({ "status": "ACTIVE" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/accounts/1234567001/credit")
        .set_json(json!({ "amount": "100.500", "description": "salary" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let account: Value = test::read_body_json(resp).await;
    assert_eq!(account["balance"], "100.500");

    let req = test::TestRequest::post()
        .uri("/api/accounts/1234567001/debit")
        .set_json(json!({ "amount": "500" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "INSUFFICIENT_FUNDS");

    let req = test::TestRequest::get().uri("/api/customers/1234567/accounts/active").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let active: Value = test::read_body_json(resp).await;
    assert_eq!(active["activeAccountCount"], 1);
    assert_eq!(active["activeAccountNumbers"], json!(["1234567001"]));

    let req = test::TestRequest::get().uri("/api/accounts/customer/1234567").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn test_search_is_not_mistaken_for_a_customer_number() {
    let system = common::system();
    common::active_customer(&system, "289012345678").await;
    let app = app!(system);

    let req = test::TestRequest::get().uri("/api/customers/search?name=hopper").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let found: Value = test::read_body_json(resp).await;
    assert_eq!(found[0]["customerNumber"], "1234567");
    assert_eq!(found[0]["lastName"], "Hopper");
}

#[actix_web::test]
async fn test_error_statuses() {
    let system = common::system();
    let app = app!(system);

    let req = test::TestRequest::get().uri("/api/accounts/1234567001").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "ACCOUNT_NOT_FOUND");
    assert_eq!(body["status"], 404);

    let req = test::TestRequest::get().uri("/api/customers/12ab").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/accounts")
        .set_json(json!({ "customerNumber": "1234567", "accountType": "CHECKING" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/accounts")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error_code"], "INVALID_REQUEST");

    let req = test::TestRequest::put()
        .uri("/api/customers/1234567")
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_close_returns_no_content() {
    let system = common::system();
    let customer_number = common::active_customer(&system, "289012345678").await;
    let ctx = common::ctx(&system);
    system
        .accounts
        .create_account(&ctx, &customer_number, bank_ms::domain::shared::AccountType::Saving)
        .await
        .unwrap();
    let app = app!(system);

    let req = test::TestRequest::delete().uri("/api/accounts/1234567001?reason=done").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/api/accounts/1234567001").to_request();
    let account: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(account["status"], "CLOSED");
}
