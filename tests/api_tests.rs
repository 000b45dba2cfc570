use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use auto_shop_crm::build_app;
use auto_shop_crm::config::EnvironmentConfig;
use auto_shop_crm::database::MemoryDocumentStore;
use auto_shop_crm::services::notification_service::{Notification, NotificationError, Notifier};
use auto_shop_crm::state::AppState;

/// Guarda los avisos en memoria; opcionalmente falla todos los envíos
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Unavailable("gateway down".into()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct TestApp {
    router: Router,
    notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    fn with_notifier(notifier: RecordingNotifier) -> Self {
        let notifier = Arc::new(notifier);
        let config = EnvironmentConfig {
            shop_name: "Test Garage".to_string(),
            tax_rate: Decimal::from_str("0.08").unwrap(),
            ..EnvironmentConfig::default()
        };
        let state = AppState::new(
            Arc::new(MemoryDocumentStore::new()),
            notifier.clone(),
            config,
        );
        Self {
            router: build_app(state),
            notifier,
        }
    }

    fn new() -> Self {
        Self::with_notifier(RecordingNotifier::default())
    }

    async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    async fn create_customer(&self) -> String {
        let (status, body) = self
            .post(
                "/api/customers",
                json!({
                    "firstName": "Ana",
                    "lastName": "García",
                    "email": "ana@example.com",
                    "phone": "555-201-3344",
                    "communicationPreference": "both"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn create_vehicle(&self, customer_id: &str) -> String {
        let (status, body) = self
            .post(
                "/api/vehicles",
                json!({
                    "customerId": customer_id,
                    "year": 2018,
                    "make": "Honda",
                    "model": "Civic",
                    "vin": "1hgbh41jxmn109186",
                    "mileage": 42000
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn create_work_order(&self, customer_id: &str, vehicle_id: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/work-orders",
                json!({
                    "customerId": customer_id,
                    "vehicleId": vehicle_id,
                    "services": [
                        { "description": "Brake pads replacement" },
                        { "description": "Oil change" }
                    ],
                    "parts": [
                        { "partNumber": "BP-22", "name": "Brake pads", "quantity": 2, "unitPrice": "45.50" },
                        { "name": "Oil filter", "quantity": 1, "unitPrice": "12.99" }
                    ],
                    "labor": [
                        { "description": "Brakes", "hours": "1.5", "actualHours": "2", "rate": "100" }
                    ],
                    "mileage": 43100
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    async fn set_status(&self, work_order_id: &str, status: &str) -> (StatusCode, Value) {
        self.patch(
            &format!("/api/work-orders/{}/status", work_order_id),
            json!({ "status": status }),
        )
        .await
    }
}

fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/nothing-here").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_customer_create_then_read() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;

    let (status, body) = app.get(&format!("/api/customers/{}", customer_id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["firstName"], "Ana");
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["communicationPreference"], "both");
    assert_eq!(body["vehicles"][0]["id"], vehicle_id.as_str());
}

#[tokio::test]
async fn test_customer_invalid_email_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/customers",
            json!({ "firstName": "Ana", "lastName": "García", "email": "not-an-email" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"]["email"].is_array());
}

#[tokio::test]
async fn test_not_found_and_bad_ids() {
    let app = TestApp::new();

    let (status, body) = app
        .get("/api/customers/00000000-0000-0000-0000-000000000001")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = app.get("/api/customers/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_customer_list_search() {
    let app = TestApp::new();
    app.create_customer().await;
    app.post(
        "/api/customers",
        json!({ "firstName": "Bruno", "lastName": "Pérez" }),
    )
    .await;

    let (status, body) = app.get("/api/customers?q=bru").await;
    assert_eq!(status, StatusCode::OK);
    let customers = body.as_array().unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["firstName"], "Bruno");
}

#[tokio::test]
async fn test_customer_with_vehicles_cannot_be_deleted() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;

    let (status, body) = app.delete(&format!("/api/customers/{}", customer_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = app.delete(&format!("/api/vehicles/{}", vehicle_id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.delete(&format!("/api/customers/{}", customer_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_vehicle_requires_existing_customer() {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            "/api/vehicles",
            json!({
                "customerId": "00000000-0000-0000-0000-000000000002",
                "year": 2020,
                "make": "Ford",
                "model": "Focus"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_vehicle_vin_is_validated_and_normalized() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;

    let (status, _) = app
        .post(
            "/api/vehicles",
            json!({
                "customerId": customer_id,
                "year": 2020,
                "make": "Ford",
                "model": "Focus",
                "vin": "IOQ123"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let vehicle_id = app.create_vehicle(&customer_id).await;
    let (_, body) = app.get(&format!("/api/vehicles/{}", vehicle_id)).await;
    assert_eq!(body["vin"], "1HGBH41JXMN109186");
    assert_eq!(body["currentMileage"], 42000);
    assert_eq!(body["customer"]["id"], customer_id.as_str());
}

#[tokio::test]
async fn test_work_order_totals_and_service_requested() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;

    let order = app.create_work_order(&customer_id, &vehicle_id).await;

    assert_eq!(order["status"], "created");
    assert_eq!(order["serviceRequested"], "Brake pads replacement, Oil change");
    // 2 x 45.50 + 12.99
    assert_eq!(dec(&order["partsTotal"]), d("103.99"));
    // actualHours 2 x 100
    assert_eq!(dec(&order["laborTotal"]), d("200"));
    // estimado: 1.5 x 100
    assert_eq!(dec(&order["totalEstimate"]), d("253.99"));
    assert_eq!(dec(&order["totalActual"]), d("303.99"));

    // Editar líneas recalcula los totales
    let id = order["id"].as_str().unwrap();
    let (status, body) = app
        .put(
            &format!("/api/work-orders/{}", id),
            json!({ "parts": [], "serviceRequested": "Alignment" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["data"]["partsTotal"]), Decimal::ZERO);
    assert_eq!(dec(&body["data"]["totalActual"]), d("200"));
    assert_eq!(body["data"]["serviceRequested"], "Alignment");
}

#[tokio::test]
async fn test_work_order_vehicle_must_belong_to_customer() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let other_customer = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&other_customer).await;

    let (status, _) = app
        .post(
            "/api/work-orders",
            json!({
                "customerId": customer_id,
                "vehicleId": vehicle_id,
                "services": [{ "description": "Inspection" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_work_order_syncs_vehicle_mileage_and_history() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;
    let order = app.create_work_order(&customer_id, &vehicle_id).await;

    let (_, vehicle) = app.get(&format!("/api/vehicles/{}", vehicle_id)).await;
    assert_eq!(vehicle["currentMileage"], 43100);
    assert_eq!(vehicle["serviceHistory"][0], order["id"]);
    assert_eq!(vehicle["serviceRecords"][0]["id"], order["id"]);
    assert_eq!(vehicle["mileageHistory"].as_array().unwrap().len(), 2);

    // Lectura manual hacia atrás no se acepta
    let (status, _) = app
        .post(
            &format!("/api/vehicles/{}/mileage", vehicle_id),
            json!({ "mileage": 40000 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            &format!("/api/vehicles/{}/mileage", vehicle_id),
            json!({ "mileage": 45000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentMileage"], 45000);

    // Con work orders el vehículo no se borra
    let (status, _) = app.delete(&format!("/api/vehicles/{}", vehicle_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_status_change_notifies_customer() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;
    let order = app.create_work_order(&customer_id, &vehicle_id).await;
    let id = order["id"].as_str().unwrap();

    let (status, body) = app.set_status(id, "in_progress").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in_progress");

    // Preferencia "both": SMS + email
    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().any(|n| n.to == "ana@example.com"));
    assert!(sent.iter().any(|n| n.to == "555-201-3344"));

    // Guardar sin cambiar el estado no vuelve a avisar
    app.put(
        &format!("/api/work-orders/{}", id),
        json!({ "diagnosticNotes": "Pads worn to 2mm" }),
    )
    .await;
    assert_eq!(app.notifier.sent().len(), 2);

    let (_, body) = app.set_status(id, "completed").await;
    assert!(body["data"]["completedAt"].is_string());
    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 4);
    assert!(sent[3].body.contains("ready for pickup"));
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_the_update() {
    let app = TestApp::with_notifier(RecordingNotifier::failing());
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;
    let order = app.create_work_order(&customer_id, &vehicle_id).await;
    let id = order["id"].as_str().unwrap();

    let (status, _) = app.set_status(id, "in_progress").await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&format!("/api/work-orders/{}", id)).await;
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["statusHistory"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_status_transitions() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;
    let order = app.create_work_order(&customer_id, &vehicle_id).await;
    let id = order["id"].as_str().unwrap();

    let (status, _) = app.set_status(id, "completed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.set_status(id, "invoiced").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.set_status(id, "bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.set_status(id, "cancelled").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.set_status(id, "in_progress").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invoice_generation_and_payment() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;
    let order = app.create_work_order(&customer_id, &vehicle_id).await;
    let id = order["id"].as_str().unwrap();

    // Sólo se factura lo terminado
    let (status, _) = app.post(&format!("/api/work-orders/{}/invoice", id), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.set_status(id, "in_progress").await;
    app.set_status(id, "completed").await;

    let (status, body) = app.post(&format!("/api/work-orders/{}/invoice", id), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    let invoice = &body["data"]["invoice"];
    assert!(invoice["invoiceNumber"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(dec(&invoice["subtotal"]), d("303.99"));
    // 8% sólo sobre repuestos: 103.99 x 0.08 = 8.3192
    assert_eq!(dec(&invoice["tax"]), d("8.32"));
    assert_eq!(dec(&invoice["total"]), d("312.31"));
    assert_eq!(body["data"]["workOrder"]["status"], "invoiced");

    // El aviso cita el total facturado, impuestos incluidos
    let invoiced_messages: Vec<_> = app
        .notifier
        .sent()
        .into_iter()
        .filter(|n| n.body.contains("invoice"))
        .collect();
    assert_eq!(invoiced_messages.len(), 2);
    assert!(invoiced_messages.iter().all(|n| n.body.contains("$312.31")));

    // Facturado: ni se edita ni se vuelve a facturar
    let (status, _) = app.post(&format!("/api/work-orders/{}/invoice", id), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app
        .put(&format!("/api/work-orders/{}", id), json!({ "diagnosticNotes": "late" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let invoice_id = invoice["id"].as_str().unwrap();
    let (status, body) = app
        .post(
            &format!("/api/invoices/{}/payment", invoice_id),
            json!({ "paymentMethod": "card" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "paid");

    let (status, _) = app
        .post(&format!("/api/invoices/{}/payment", invoice_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, detail) = app.get(&format!("/api/work-orders/{}", id)).await;
    assert_eq!(detail["invoice"]["status"], "paid");
    assert_eq!(detail["customer"]["id"], customer_id.as_str());
}

#[tokio::test]
async fn test_appointment_overlap_and_work_order_conversion() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;

    let (status, body) = app
        .post(
            "/api/technicians",
            json!({ "firstName": "Marta", "lastName": "Ruiz", "hourlyRate": "85" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let technician_id = body["data"]["id"].as_str().unwrap().to_string();

    let appointment = |start: &str, end: &str| {
        json!({
            "customerId": customer_id,
            "vehicleId": vehicle_id,
            "technicianId": technician_id,
            "startTime": start,
            "endTime": end,
            "serviceType": "Brake inspection"
        })
    };

    let (status, body) = app
        .post(
            "/api/appointments",
            appointment("2030-05-01T09:00:00Z", "2030-05-01T10:00:00Z"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let appointment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/appointments",
            appointment("2030-05-01T09:30:00Z", "2030-05-01T11:00:00Z"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // Pegada a la anterior no choca
    let (status, _) = app
        .post(
            "/api/appointments",
            appointment("2030-05-01T10:00:00Z", "2030-05-01T11:00:00Z"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            "/api/appointments",
            appointment("2030-05-02T10:00:00Z", "2030-05-02T09:00:00Z"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(&format!("/api/appointments/{}/work-order", appointment_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "scheduled");
    assert_eq!(body["data"]["serviceRequested"], "Brake inspection");
    assert_eq!(body["data"]["assignedTechnicianId"], technician_id.as_str());

    let (_, appointment) = app.get(&format!("/api/appointments/{}", appointment_id)).await;
    assert_eq!(appointment["workOrderId"], body["data"]["id"]);

    // Técnico con trabajo abierto no se borra
    let (status, _) = app.delete(&format!("/api/technicians/{}", technician_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_global_search() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;
    app.create_work_order(&customer_id, &vehicle_id).await;

    let (status, body) = app.get("/api/search?q=honda").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vehicles"].as_array().unwrap().len(), 1);
    assert!(body["customers"].as_array().unwrap().is_empty());

    let (_, body) = app.get("/api/search?q=brake").await;
    assert_eq!(body["workOrders"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/search?q=a").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_line_values_are_rejected() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;

    let (status, body) = app
        .post(
            "/api/work-orders",
            json!({
                "customerId": customer_id,
                "vehicleId": vehicle_id,
                "services": [{ "description": "Fleet parts" }],
                "parts": [
                    { "name": "Bulk", "quantity": "100000000000000000000", "unitPrice": "100000000000000000000" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let order = app.create_work_order(&customer_id, &vehicle_id).await;
    let id = order["id"].as_str().unwrap();
    let (status, _) = app
        .put(
            &format!("/api/work-orders/{}", id),
            json!({
                "labor": [
                    { "description": "Overtime", "hours": "100000000000000000000", "rate": "100000000000000000000" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stored) = app.get(&format!("/api/work-orders/{}", id)).await;
    assert_eq!(dec(&stored["totalActual"]), d("303.99"));
}

#[tokio::test]
async fn test_moving_work_order_releases_old_vehicle_mileage() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_a = app.create_vehicle(&customer_id).await;
    let (status, body) = app
        .post(
            "/api/vehicles",
            json!({
                "customerId": customer_id,
                "year": 2012,
                "make": "Toyota",
                "model": "Hilux",
                "mileage": 1000
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let vehicle_b = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/work-orders",
            json!({
                "customerId": customer_id,
                "vehicleId": vehicle_b,
                "services": [{ "description": "Timing belt" }],
                "mileage": 150000
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, vehicle) = app.get(&format!("/api/vehicles/{}", vehicle_b)).await;
    assert_eq!(vehicle["currentMileage"], 150000);

    // Se cargó en el vehículo equivocado
    let (status, _) = app
        .put(&format!("/api/work-orders/{}", id), json!({ "vehicleId": vehicle_a }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, vehicle) = app.get(&format!("/api/vehicles/{}", vehicle_b)).await;
    assert_eq!(vehicle["currentMileage"], 1000);
    assert!(vehicle["serviceHistory"].as_array().unwrap().is_empty());
    assert_eq!(vehicle["mileageHistory"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .post(&format!("/api/vehicles/{}/mileage", vehicle_b), json!({ "mileage": 1200 }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, vehicle) = app.get(&format!("/api/vehicles/{}", vehicle_a)).await;
    assert_eq!(vehicle["currentMileage"], 150000);
    assert_eq!(vehicle["serviceHistory"][0], id.as_str());
}

#[tokio::test]
async fn test_clearing_work_order_mileage_drops_its_reading() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;
    let order = app.create_work_order(&customer_id, &vehicle_id).await;
    let id = order["id"].as_str().unwrap();

    let (status, body) = app
        .put(&format!("/api/work-orders/{}", id), json!({ "mileage": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["mileage"].is_null());

    let (_, vehicle) = app.get(&format!("/api/vehicles/{}", vehicle_id)).await;
    assert_eq!(vehicle["currentMileage"], 42000);
    assert_eq!(vehicle["mileageHistory"].as_array().unwrap().len(), 1);
    assert_eq!(vehicle["serviceHistory"][0], id);
}

#[tokio::test]
async fn test_appointment_work_order_link_stays_in_sync() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;
    let other_customer = app.create_customer().await;
    let vehicle_id = app.create_vehicle(&customer_id).await;

    let new_appointment = |customer: &str, day: u32| {
        let vehicle = if customer == customer_id {
            Value::from(vehicle_id.as_str())
        } else {
            Value::Null
        };
        json!({
            "customerId": customer,
            "vehicleId": vehicle,
            "startTime": format!("2030-06-{:02}T09:00:00Z", day),
            "endTime": format!("2030-06-{:02}T10:00:00Z", day),
            "serviceType": "Oil change"
        })
    };

    let (_, body) = app.post("/api/appointments", new_appointment(&customer_id, 1)).await;
    let first = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = app
        .post(&format!("/api/appointments/{}/work-order", first), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let work_order_id = body["data"]["id"].as_str().unwrap().to_string();

    // Quitar el enlace desde la cita lo quita también del work order
    let (status, _) = app
        .put(&format!("/api/appointments/{}", first), json!({ "workOrderId": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, order) = app.get(&format!("/api/work-orders/{}", work_order_id)).await;
    assert!(order["appointmentId"].is_null());

    let (status, _) = app.delete(&format!("/api/appointments/{}", first)).await;
    assert_eq!(status, StatusCode::OK);

    // Enlazar desde otra cita
    let (_, body) = app.post("/api/appointments", new_appointment(&customer_id, 2)).await;
    let second = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .put(&format!("/api/appointments/{}", second), json!({ "workOrderId": work_order_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, order) = app.get(&format!("/api/work-orders/{}", work_order_id)).await;
    assert_eq!(order["appointmentId"], second.as_str());
    assert_eq!(order["appointment"]["id"], second.as_str());

    let (status, _) = app.delete(&format!("/api/appointments/{}", second)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Un work order sólo tiene una cita
    let (_, body) = app.post("/api/appointments", new_appointment(&customer_id, 3)).await;
    let third = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .put(&format!("/api/appointments/{}", third), json!({ "workOrderId": work_order_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Citas de otro cliente no se enlazan en ninguna dirección
    let (_, body) = app.post("/api/appointments", new_appointment(&other_customer, 4)).await;
    let foreign = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .put(&format!("/api/appointments/{}", foreign), json!({ "workOrderId": work_order_id }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/work-orders",
            json!({
                "customerId": customer_id,
                "vehicleId": vehicle_id,
                "appointmentId": foreign,
                "services": [{ "description": "Inspection" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_appointment_list_filters_by_window() {
    let app = TestApp::new();
    let customer_id = app.create_customer().await;

    for (start, end) in [
        ("2030-07-03T09:00:00Z", "2030-07-03T10:00:00Z"),
        ("2030-07-01T09:00:00Z", "2030-07-01T10:00:00Z"),
        ("2030-07-02T09:00:00Z", "2030-07-02T10:00:00Z"),
    ] {
        let (status, _) = app
            .post(
                "/api/appointments",
                json!({ "customerId": customer_id, "startTime": start, "endTime": end }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .get("/api/appointments?from=2030-07-01T09:30:00Z&to=2030-07-03T09:00:00Z")
        .await;
    assert_eq!(status, StatusCode::OK);
    let starts: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["startTime"].as_str().unwrap())
        .collect();
    assert_eq!(starts, vec!["2030-07-01T09:00:00Z", "2030-07-02T09:00:00Z"]);

    let (_, body) = app.get("/api/appointments?limit=1&offset=2").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["startTime"], "2030-07-03T09:00:00Z");
}
