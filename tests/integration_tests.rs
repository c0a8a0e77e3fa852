use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use laganbus::config::{AppConfig, BankDetails};
use laganbus::handlers;
use laganbus::services::dashboard::Dashboard;
use laganbus::services::sheet::{SheetClient, SheetEnvelope, SheetQuery, SheetWrite};
use laganbus::state::AppState;

// ── Mock Sheet ──

#[derive(Clone, Default)]
struct SheetLog {
    writes: Arc<Mutex<Vec<SheetWrite>>>,
    reads: Arc<Mutex<Vec<SheetQuery>>>,
}

impl SheetLog {
    fn writes(&self) -> Vec<SheetWrite> {
        self.writes.lock().unwrap().clone()
    }

    fn reads(&self) -> Vec<SheetQuery> {
        self.reads.lock().unwrap().clone()
    }
}

struct MockSheet {
    log: SheetLog,
    search: Value,
    active: Value,
    archive: Value,
    fail_writes: bool,
    fail_reads: bool,
}

impl MockSheet {
    fn new(log: SheetLog) -> Self {
        Self {
            log,
            search: json!({ "success": false }),
            active: json!({ "success": true, "bookings": [] }),
            archive: json!({ "success": true, "bookings": [] }),
            fail_writes: false,
            fail_reads: false,
        }
    }
}

#[async_trait]
impl SheetClient for MockSheet {
    async fn write(&self, write: &SheetWrite) -> anyhow::Result<()> {
        self.log.writes.lock().unwrap().push(write.clone());
        if self.fail_writes {
            anyhow::bail!("sheet script returned 500 Internal Server Error");
        }
        Ok(())
    }

    async fn read(&self, query: &SheetQuery) -> anyhow::Result<SheetEnvelope> {
        self.log.reads.lock().unwrap().push(query.clone());
        if self.fail_reads {
            anyhow::bail!("connection refused");
        }
        let body = match query {
            SheetQuery::Search { .. } => self.search.clone(),
            SheetQuery::GetAll(laganbus::models::Collection::Active) => self.active.clone(),
            SheetQuery::GetAll(laganbus::models::Collection::Archive) => self.archive.clone(),
        };
        Ok(serde_json::from_value(body)?)
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        sheet_url: "https://script.example.com/exec".to_string(),
        admin_token: "test-token".to_string(),
        admin_whatsapp_number: "94701362527".to_string(),
        display_utc_offset_minutes: 330,
        bank: BankDetails {
            bank_name: "Hatton National Bank (HNB)".to_string(),
            account_name: "LAGAN BUS".to_string(),
            account_number: "0000000000".to_string(),
            branch: "Nintavur Branch".to_string(),
        },
    }
}

fn test_state(sheet: MockSheet) -> Arc<AppState> {
    Arc::new(AppState {
        config: test_config(),
        sheet: Box::new(sheet),
        dashboard: Mutex::new(Dashboard::default()),
    })
}

fn admin_sheet(log: SheetLog) -> MockSheet {
    let mut sheet = MockSheet::new(log);
    sheet.active = json!({
        "success": true,
        "bookings": [
            {
                "Booking ID": "LB-0001",
                "Name": "Sara",
                "Phone": "0779998887",
                "Status": "Confirmed",
                "Total": "5,400",
                "Male Seat": "1",
                "Female Seat": "2",
                "rowIndex": 2
            },
            {
                "Booking ID": "LB-0002",
                "name": "Nimal",
                "phone": "0771112223",
                "status": "New",
                "totalAmount": 2700,
                "maleSeats": "",
                "rowIndex": 3
            }
        ]
    });
    sheet.archive = json!({
        "success": true,
        "allBookings": [
            { "Booking Id": "LB-0000", "Name": "Old Trip", "Total": 1600, "Female Seat": "9" }
        ]
    });
    sheet
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/catalog", get(handlers::public::get_catalog))
        .route("/api/bookings", post(handlers::public::create_booking))
        .route("/api/bookings/status", get(handlers::public::booking_status))
        .route("/api/admin/dashboard", get(handlers::admin::get_dashboard))
        .route(
            "/api/admin/bookings/approve",
            post(handlers::admin::approve_booking),
        )
        .route(
            "/api/admin/bookings/update",
            post(handlers::admin::update_booking),
        )
        .route(
            "/api/admin/bookings/delete",
            post(handlers::admin::delete_booking),
        )
        .route("/api/admin/quote", post(handlers::admin::quote_total))
        .with_state(state)
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer test-token")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn booking_body() -> Value {
    json!({
        "name": "Amal Perera",
        "phone": "0771234567",
        "from": "Nintavur",
        "to": "Colombo",
        "date": "2099-03-07",
        "time": "",
        "bus": "Sakeer Express",
        "maleSeats": 2,
        "femaleSeats": 1
    })
}

// ── Public API Tests ──

#[tokio::test]
async fn test_health() {
    let state = test_state(MockSheet::new(SheetLog::default()));
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, json) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_catalog() {
    let state = test_state(MockSheet::new(SheetLog::default()));
    let req = Request::builder()
        .uri("/api/catalog")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["buses"].as_array().unwrap().len(), 8);
    assert_eq!(json["cities"].as_array().unwrap().len(), 17);
    assert_eq!(json["payment"]["bank_name"], "Hatton National Bank (HNB)");
}

#[tokio::test]
async fn test_create_booking_relays_to_sheet() {
    let log = SheetLog::default();
    let state = test_state(MockSheet::new(log.clone()));

    let (status, json) = send(&state, json_post("/api/bookings", booking_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["saved"], true);
    assert_eq!(json["total"], 8100.0);
    assert_eq!(json["sheet_date"], "03/07/2099");
    assert_eq!(json["sheet_time"], "09.00 PM");
    assert!(json["whatsapp_url"]
        .as_str()
        .unwrap()
        .starts_with("https://wa.me/94701362527?text="));
    assert_eq!(json["payment"]["reference"], "Your Name + Phone");

    let writes = log.writes();
    assert_eq!(writes.len(), 1);
    match &writes[0] {
        SheetWrite::Add(fields) => {
            assert_eq!(fields.name, "Amal Perera");
            assert_eq!(fields.total, "8100");
            assert_eq!(fields.male_seats, "2");
            assert_eq!(fields.female_seats, "1");
            assert_eq!(fields.payment, "Pending");
        }
        other => panic!("expected add, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_booking_requires_seats() {
    let log = SheetLog::default();
    let state = test_state(MockSheet::new(log.clone()));

    let mut body = booking_body();
    body["maleSeats"] = json!(0);
    body["femaleSeats"] = json!(0);

    let (status, json) = send(&state, json_post("/api/bookings", body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("at least one"));
    assert!(log.writes().is_empty());
}

#[tokio::test]
async fn test_create_booking_short_phone() {
    let log = SheetLog::default();
    let state = test_state(MockSheet::new(log.clone()));

    let mut body = booking_body();
    body["phone"] = json!("07712");

    let (status, _) = send(&state, json_post("/api/bookings", body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(log.writes().is_empty());
}

#[tokio::test]
async fn test_create_booking_rejects_too_many_seats() {
    let log = SheetLog::default();
    let state = test_state(MockSheet::new(log.clone()));

    let mut body = booking_body();
    body["maleSeats"] = json!(11);
    let (status, json) = send(&state, json_post("/api/bookings", body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("at most 10"));

    let mut body = booking_body();
    body["maleSeats"] = json!(u32::MAX);
    body["femaleSeats"] = json!(1);
    let (status, json) = send(&state, json_post("/api/bookings", body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());

    assert!(log.writes().is_empty());
}

#[tokio::test]
async fn test_create_booking_malformed_body_is_json_error() {
    let log = SheetLog::default();
    let state = test_state(MockSheet::new(log.clone()));

    let mut body = booking_body();
    body["femaleSeats"] = json!(-1);
    let (status, json) = send(&state, json_post("/api/bookings", body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());

    let mut body = booking_body();
    body["maleSeats"] = json!("two");
    let (status, json) = send(&state, json_post("/api/bookings", body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());

    assert!(log.writes().is_empty());
}

#[tokio::test]
async fn test_create_booking_sheet_down_falls_back_to_whatsapp() {
    let log = SheetLog::default();
    let mut sheet = MockSheet::new(log.clone());
    sheet.fail_writes = true;
    let state = test_state(sheet);

    let (status, json) = send(&state, json_post("/api/bookings", booking_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["saved"], false);
    assert!(json["whatsapp_url"].as_str().unwrap().starts_with("https://wa.me/"));
    assert!(json["message"].as_str().unwrap().contains("WhatsApp"));
    assert_eq!(log.writes().len(), 1);
}

#[tokio::test]
async fn test_status_lookup_found() {
    let log = SheetLog::default();
    let mut sheet = MockSheet::new(log.clone());
    sheet.search = json!({
        "booking": {
            "Booking ID": "LB-0042",
            "Name": "Fathima",
            "bus": "Al Ahla",
            "Time": "8:30 PM",
            "Pickup": "Kalmunai",
            "destination": "Dehiwala",
            "Male Seat": "",
            "femaleSeats": "7,8",
            "Payment": "Paid",
            "Total": "5,600"
        }
    });
    let state = test_state(sheet);

    let (status, json) = send(
        &state,
        Request::builder()
            .uri("/api/bookings/status?phone=%2B94%2077%20123%204567")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking_id"], "LB-0042");
    assert_eq!(json["route"], "Kalmunai → Dehiwala");
    assert_eq!(json["time"], "08.30 PM");
    assert_eq!(json["seats"], "0M • 7,8F");
    assert_eq!(json["paid"], true);
    assert_eq!(json["total"], 5600.0);

    assert_eq!(
        log.reads(),
        vec![SheetQuery::Search {
            phone_suffix: "771234567".to_string()
        }]
    );
}

#[tokio::test]
async fn test_status_lookup_not_found() {
    let state = test_state(MockSheet::new(SheetLog::default()));
    let (status, json) = send(
        &state,
        Request::builder()
            .uri("/api/bookings/status?phone=0771234567")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("771234567"));
}

#[tokio::test]
async fn test_status_lookup_short_phone_skips_sheet() {
    let log = SheetLog::default();
    let state = test_state(MockSheet::new(log.clone()));
    let (status, _) = send(
        &state,
        Request::builder()
            .uri("/api/bookings/status?phone=12345")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(log.reads().is_empty());
}

#[tokio::test]
async fn test_status_lookup_sheet_unreachable() {
    let mut sheet = MockSheet::new(SheetLog::default());
    sheet.fail_reads = true;
    let state = test_state(sheet);
    let (status, _) = send(
        &state,
        Request::builder()
            .uri("/api/bookings/status?phone=0771234567")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

// ── Admin API Tests ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let state = test_state(admin_sheet(SheetLog::default()));

    let (status, _) = send(
        &state,
        Request::builder()
            .uri("/api/admin/dashboard")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &state,
        Request::builder()
            .uri("/api/admin/dashboard")
            .header("Authorization", "Bearer wrong-token")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_dashboard_buckets_and_totals() {
    let log = SheetLog::default();
    let state = test_state(admin_sheet(log.clone()));

    let (status, json) = send(&state, admin_get("/api/admin/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["view"], "active");
    assert_eq!(json["bookings"].as_array().unwrap().len(), 1);
    assert_eq!(json["bookings"][0]["booking_id"], "LB-0001");
    assert_eq!(json["totals"]["pending"], 1);
    assert_eq!(json["totals"]["archived"], 1);
    assert_eq!(json["totals"]["revenue"], 7000.0);
    assert_eq!(json["totals"]["passengers"], 3);
    assert_eq!(json["stale"], false);

    let reads = log.reads();
    assert_eq!(reads.len(), 2);
    assert!(reads.contains(&SheetQuery::GetAll(laganbus::models::Collection::Active)));
    assert!(reads.contains(&SheetQuery::GetAll(laganbus::models::Collection::Archive)));

    // second read is served from the local mirror
    let (_, json) = send(&state, admin_get("/api/admin/dashboard?view=pending")).await;
    assert_eq!(json["bookings"][0]["booking_id"], "LB-0002");
    assert_eq!(json["bookings"][0]["origin"], "active");
    assert_eq!(log.reads().len(), 2);

    let (_, json) = send(&state, admin_get("/api/admin/dashboard?view=archive&refresh=true")).await;
    assert_eq!(json["bookings"][0]["name"], "Old Trip");
    assert_eq!(log.reads().len(), 4);
}

#[tokio::test]
async fn test_admin_dashboard_search() {
    let state = test_state(admin_sheet(SheetLog::default()));
    let (_, json) = send(&state, admin_get("/api/admin/dashboard?view=pending&q=nim")).await;
    assert_eq!(json["bookings"].as_array().unwrap().len(), 1);

    let (_, json) = send(&state, admin_get("/api/admin/dashboard?view=pending&q=sara")).await;
    assert!(json["bookings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_dashboard_sheet_unreachable() {
    let mut sheet = admin_sheet(SheetLog::default());
    sheet.fail_reads = true;
    let state = test_state(sheet);

    let (status, json) = send(&state, admin_get("/api/admin/dashboard")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("booking server"));
}

#[tokio::test]
async fn test_admin_approve() {
    let log = SheetLog::default();
    let state = test_state(admin_sheet(log.clone()));

    let (status, json) = send(
        &state,
        admin_post(
            "/api/admin/bookings/approve",
            json!({ "id": "LB-0002", "collection": "active" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["status"], "confirmed");

    let writes = log.writes();
    assert_eq!(writes.len(), 1);
    let form = writes[0].to_form();
    assert!(form.contains(&("method", "update".to_string())));
    assert!(form.contains(&("id", "LB-0002".to_string())));
    assert!(form.contains(&("row", "3".to_string())));
    assert!(form.contains(&("Status", "Confirmed".to_string())));

    // optimistic: visible without a refetch
    let (_, json) = send(&state, admin_get("/api/admin/dashboard")).await;
    assert_eq!(json["bookings"][0]["booking_id"], "LB-0002");
    assert_eq!(json["totals"]["pending"], 0);
    assert_eq!(json["totals"]["revenue"], 9700.0);
    assert_eq!(log.reads().len(), 2);

    // already confirmed
    let (status, _) = send(
        &state,
        admin_post(
            "/api/admin/bookings/approve",
            json!({ "id": "LB-0002", "collection": "active" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_update() {
    let log = SheetLog::default();
    let state = test_state(admin_sheet(log.clone()));

    let (status, json) = send(
        &state,
        admin_post(
            "/api/admin/bookings/update",
            json!({
                "key": { "id": "LB-0001", "collection": "active" },
                "changes": {
                    "time": "21:00",
                    "date": "2099-03-07",
                    "total": "8,100",
                    "male_seats": "4,5",
                    "payment": "Paid"
                }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["total"], 8100.0);
    assert_eq!(json["booking"]["payment"], "Paid");

    let writes = log.writes();
    match &writes[0] {
        SheetWrite::Update(key, fields) => {
            assert_eq!(key.id.as_deref(), Some("LB-0001"));
            assert_eq!(key.row, Some(2));
            assert_eq!(fields.time, "09.00 PM");
            assert_eq!(fields.date, "03/07/2099");
            assert_eq!(fields.total, "8100");
            assert_eq!(fields.male_seats, "4,5");
            assert_eq!(fields.status.as_deref(), Some("Confirmed"));
        }
        other => panic!("expected update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_admin_delete_failure_marks_stale() {
    let log = SheetLog::default();
    let mut sheet = admin_sheet(log.clone());
    sheet.fail_writes = true;
    let state = test_state(sheet);

    let (status, _) = send(
        &state,
        admin_post(
            "/api/admin/bookings/delete",
            json!({ "id": "LB-0000", "collection": "archive" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(log.writes().len(), 1);
    assert_eq!(log.reads().len(), 2);

    // the failed write forces a refetch, which brings the row back
    let (status, json) = send(&state, admin_get("/api/admin/dashboard?view=archive")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log.reads().len(), 4);
    assert_eq!(json["bookings"][0]["booking_id"], "LB-0000");
    assert_eq!(json["stale"], false);
}

#[tokio::test]
async fn test_admin_delete_by_row() {
    let log = SheetLog::default();
    let state = test_state(admin_sheet(log.clone()));

    let (status, json) = send(
        &state,
        admin_post(
            "/api/admin/bookings/delete",
            json!({ "row": 2, "collection": "archive" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking"]["name"], "Old Trip");

    let form = log.writes()[0].to_form();
    assert!(form.contains(&("method", "delete".to_string())));
    assert!(form.contains(&("type", "archive".to_string())));
    assert!(form.contains(&("row", "2".to_string())));
}

#[tokio::test]
async fn test_admin_mutation_needs_id_or_row() {
    let log = SheetLog::default();
    let state = test_state(admin_sheet(log.clone()));

    let (status, _) = send(
        &state,
        admin_post("/api/admin/bookings/delete", json!({ "collection": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(log.writes().is_empty());
    assert!(log.reads().is_empty());
}

#[tokio::test]
async fn test_admin_quote() {
    let state = test_state(MockSheet::new(SheetLog::default()));

    let (status, json) = send(
        &state,
        admin_post(
            "/api/admin/quote",
            json!({ "bus": "RS Express", "male_seats": "1,2", "female_seats": "3" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["passengers"], 3);
    assert_eq!(json["total"], 8700.0);

    let (status, _) = send(
        &state,
        admin_post("/api/admin/quote", json!({ "bus": "Ghost Bus", "male_seats": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = send(
        &state,
        admin_post("/api/admin/quote", json!({ "male_seats": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());
}
