//! End-to-end flow against a real Postgres. Skipped when DATABASE_URL is not set.
//!
//! Citizens log in with OTP, one becomes an mKisan seller, another registers as a buyer and is
//! approved by an admin, a third becomes an e-Sanjeevani doctor. The test then exercises
//! listings, purchases, bookings and the ownership/role checks around them.

use jansetu_platform::crypto::{hash_identity, hash_password};
use jansetu_platform::storage::repo::admins;
use jansetu_platform::{create_router, AppState, Config, DatabaseService, MemoryOtpStore, OtpDelivery};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

#[derive(Default)]
struct CapturedCodes {
    codes: Mutex<HashMap<Uuid, String>>,
}

#[async_trait::async_trait]
impl OtpDelivery for CapturedCodes {
    async fn deliver(&self, _identity_hash: &str, otp_id: Uuid, code: &str) -> anyhow::Result<()> {
        self.codes.lock().await.insert(otp_id, code.to_string());
        Ok(())
    }
}

struct Harness {
    client: Client,
    base: String,
    codes: Arc<CapturedCodes>,
}

impl Harness {
    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), Box<dyn std::error::Error>> {
        let mut request = self.client.request(method, format!("{}{}", self.base, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await?;
        Ok((status, body))
    }

    /// Runs login + verify-otp and returns `(otp_id, code, access_token)`.
    async fn citizen_login(&self, identity: &str) -> Result<(String, String, String), Box<dyn std::error::Error>> {
        let (status, body) = self
            .send(reqwest::Method::POST, "/auth/login", None, Some(json!({ "aadhar": identity })))
            .await?;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        let otp_id = body["data"]["otp_id"].as_str().ok_or("missing otp_id")?.to_string();
        let code = self
            .codes
            .lock_code(&otp_id)
            .await
            .ok_or("OTP was not delivered")?;

        let (status, body) = self
            .send(
                reqwest::Method::POST,
                "/auth/verify-otp",
                None,
                Some(json!({ "aadhar": identity, "otp_id": otp_id, "otp_code": code })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "verify-otp failed: {}", body);
        assert_eq!(body["data"]["token_type"], "bearer");
        let token = body["data"]["access_token"].as_str().ok_or("missing token")?.to_string();
        Ok((otp_id, code, token))
    }
}

impl Harness {
    async fn admin_login(&self, username: &str) -> Result<String, Box<dyn std::error::Error>> {
        let (status, body) = self
            .send(
                reqwest::Method::POST,
                "/auth/admin/login",
                None,
                Some(json!({ "username": username, "password": ADMIN_PASSWORD })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "admin login failed: {}", body);
        Ok(body["data"]["access_token"].as_str().ok_or("missing admin token")?.to_string())
    }

    /// Logs in a fresh citizen and files a PENDING MKISAN buyer request.
    async fn buyer_request(&self) -> Result<(String, String), Box<dyn std::error::Error>> {
        let (_, _, token) = self.citizen_login(&random_identity()).await?;
        let (status, body) = self
            .send(
                reqwest::Method::POST,
                "/sp-registration/register",
                Some(&token),
                Some(json!({ "request_type": "MKISAN", "provider_category": "BUYER" })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let request_id = body["data"]["request_id"].as_str().ok_or("missing request_id")?.to_string();
        Ok((token, request_id))
    }
}

impl CapturedCodes {
    async fn lock_code(&self, otp_id: &str) -> Option<String> {
        let otp_id: Uuid = otp_id.parse().ok()?;
        self.codes.lock().await.get(&otp_id).cloned()
    }
}

fn random_identity() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("T{}", &hex[..15]).to_uppercase()
}

const ADMIN_PASSWORD: &str = "s3cret-pass";

/// A server on an ephemeral port plus a freshly created admin account.
struct Running {
    h: Harness,
    admin_username: String,
    salt: String,
    pool: PgPool,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

/// `None` when DATABASE_URL is not configured.
async fn start() -> Result<Option<Running>, Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").map(|v| v.trim().is_empty()).unwrap_or(true) {
        eprintln!("DATABASE_URL not set; skipping end-to-end flow");
        return Ok(None);
    }
    let config = Config::from_env()?;
    let salt = config.identity_hash_salt.clone();
    let db = DatabaseService::new(&config).await?;

    // Admin account with a unique name so parallel runs do not collide.
    let admin_username = format!("admin-{}", &Uuid::new_v4().simple().to_string()[..8]);
    {
        let mut conn = db.pool().acquire().await?;
        admins::upsert(&mut conn, &admin_username, &hash_password(ADMIN_PASSWORD), "Test Admin", None).await?;
    }
    let pool = db.pool().clone();

    let codes = Arc::new(CapturedCodes::default());
    let state = AppState::new(db, config, Arc::new(MemoryOtpStore::new()), codes.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let mut ready = false;
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_ok() {
            ready = true;
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    assert!(ready, "server did not start listening on {}", addr);

    let h = Harness {
        client: Client::new(),
        base: format!("http://{}", addr),
        codes,
    };
    Ok(Some(Running {
        h,
        admin_username,
        salt,
        pool,
        addr,
        server,
    }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_citizen_provider_and_marketplace_flow() -> Result<(), Box<dyn std::error::Error>> {
    let Some(Running {
        h,
        admin_username,
        salt,
        pool,
        addr,
        server,
    }) = start().await?
    else {
        return Ok(());
    };
    use reqwest::Method;

    let (status, body) = h.send(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"].as_bool(), Some(true));
    assert_eq!(body["data"]["status"], "ok");

    // --- auth edge cases ---
    let (status, body) = h
        .send(Method::POST, "/auth/login", None, Some(json!({ "aadhar": "123" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"].as_bool(), Some(false));

    let (status, _) = h.send(Method::GET, "/auth/me", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // --- seller citizen ---
    let seller_identity = random_identity();
    let (seller_otp_id, seller_code, _first_token) = h.citizen_login(&seller_identity).await?;

    let (status, _) = h
        .send(
            Method::POST,
            "/auth/verify-otp",
            None,
            Some(json!({ "aadhar": seller_identity, "otp_id": seller_otp_id, "otp_code": seller_code })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "an OTP must not verify twice");

    // A second login reuses the same user record.
    let (_, _, seller) = h.citizen_login(&seller_identity).await?;
    let user_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE identity_hash = $1")
        .bind(hash_identity(&salt, &seller_identity))
        .fetch_one(&pool)
        .await?;
    assert_eq!(user_rows, 1);

    let (status, body) = h.send(Method::GET, "/auth/me", Some(&seller), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "CITIZEN");

    let (status, body) = h
        .send(
            Method::PUT,
            "/citizen/profile",
            Some(&seller),
            Some(json!({ "full_name": "Test Farmer", "gender": "MALE", "date_of_birth": "1980-06-15" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["full_name"], "Test Farmer");
    assert!(body["data"]["age"].as_i64().unwrap_or(0) >= 45);

    let (status, _) = h
        .send(Method::POST, "/mkisan/register-seller", Some(&seller), Some(json!({})))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "seller registration needs a kisan id");

    let kisan_id = format!("KT-{}", &Uuid::new_v4().simple().to_string()[..10]).to_uppercase();
    let (status, body) = h
        .send(Method::PUT, "/mkisan/kisan-id", Some(&seller), Some(json!({ "kisan_id": kisan_id })))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = h
        .send(Method::POST, "/mkisan/register-seller", Some(&seller), Some(json!({ "primary_crop": "Wheat" })))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, body) = h.send(Method::GET, "/mkisan/check-kisan-id", Some(&seller), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_registered_as_seller"].as_bool(), Some(true));

    let (status, body) = h
        .send(
            Method::POST,
            "/mkisan/products",
            Some(&seller),
            Some(json!({
                "product_name": "Sharbati Wheat",
                "product_type": "GRAIN",
                "category": "CEREALS",
                "quantity": "500 kg",
                "price_per_unit": 25.0
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let product_id = body["data"]["product_id"].as_str().ok_or("missing product_id")?.to_string();

    let (status, body) = h
        .send(Method::GET, "/mkisan/products?category=CEREALS", None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"].as_array().ok_or("products not a list")?;
    assert!(listed.iter().any(|p| p["product_id"] == product_id.as_str()));

    // --- buyer citizen ---
    let buyer_identity = random_identity();
    let (_, _, buyer) = h.citizen_login(&buyer_identity).await?;

    let (status, _) = h
        .send(Method::PUT, "/mkisan/kisan-id", Some(&buyer), Some(json!({ "kisan_id": kisan_id })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "kisan id is unique across citizens");

    let (status, _) = h
        .send(
            Method::PUT,
            &format!("/mkisan/products/{}", product_id),
            Some(&buyer),
            Some(json!({
                "product_name": "Hijacked",
                "product_type": "GRAIN",
                "category": "CEREALS",
                "quantity": "1 kg",
                "price_per_unit": 1.0
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = h
        .send(
            Method::POST,
            "/mkisan/purchases",
            Some(&buyer),
            Some(json!({ "product_id": product_id, "quantity": 2.0 })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "only approved buyers can purchase");

    let (status, _) = h
        .send(
            Method::POST,
            "/sp-registration/register",
            Some(&buyer),
            Some(json!({ "request_type": "MKISAN", "provider_category": "SELLER" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .send(
            Method::POST,
            "/sp-registration/register",
            Some(&buyer),
            Some(json!({ "request_type": "MKISAN", "provider_category": "BUYER", "gst_number": "09ABCDE1234F1Z5" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "PENDING");
    let buyer_request = body["data"]["request_id"].as_str().ok_or("missing request_id")?.to_string();

    let (status, _) = h
        .send(
            Method::POST,
            "/sp-registration/register",
            Some(&buyer),
            Some(json!({ "request_type": "MKISAN", "provider_category": "BUYER" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "one request per type");

    // --- admin review ---
    let (status, _) = h
        .send(
            Method::POST,
            "/auth/admin/login",
            None,
            Some(json!({ "username": admin_username, "password": "wrong" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = h
        .send(
            Method::POST,
            "/auth/admin/login",
            None,
            Some(json!({ "username": admin_username, "password": ADMIN_PASSWORD })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["role"], "ADMIN");
    let admin = body["data"]["access_token"].as_str().ok_or("missing admin token")?.to_string();

    let (status, _) = h
        .send(Method::GET, "/admin/sp-registration-requests", Some(&buyer), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h
        .send(Method::GET, "/admin/sp-registration-requests?status=PENDING", Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let pending = body["data"].as_array().ok_or("requests not a list")?;
    assert!(pending.iter().any(|r| r["request_id"] == buyer_request.as_str()));

    let approve_path = format!("/admin/sp-registration-requests/{}/approve", buyer_request);
    let (status, body) = h.send(Method::PUT, &approve_path, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["request"]["status"], "APPROVED");
    assert_eq!(body["data"]["service"]["status"], "ACTIVE");
    let buyer_service = body["data"]["service"]["service_id"]
        .as_str()
        .ok_or("missing service_id")?
        .to_string();

    let (status, _) = h.send(Method::PUT, &approve_path, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "approved requests are terminal");

    let (status, _) = h
        .send(
            Method::PUT,
            &format!("/admin/sp-registration-requests/{}/reject", buyer_request),
            Some(&admin),
            Some(json!({})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "reject needs a reason");

    // The role is read fresh, so the existing token now acts as a provider.
    let (status, body) = h.send(Method::GET, "/auth/me", Some(&buyer), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "SERVICE_PROVIDER");

    // --- purchase ---
    let (status, body) = h
        .send(
            Method::POST,
            "/mkisan/purchases",
            Some(&buyer),
            Some(json!({ "product_id": product_id, "quantity": 4.0, "notes": "deliver Monday" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "CONFIRMED");
    assert_eq!(body["data"]["total_price"].as_f64(), Some(100.0));
    let purchase_id = body["data"]["purchase_id"].as_str().ok_or("missing purchase_id")?.to_string();

    let (status, body) = h.send(Method::GET, "/mkisan/purchases", Some(&buyer), None).await?;
    assert_eq!(status, StatusCode::OK);
    let purchases = body["data"].as_array().ok_or("purchases not a list")?;
    assert!(purchases.iter().any(|p| p["purchase_id"] == purchase_id.as_str()));

    let (status, _) = h
        .send(
            Method::POST,
            "/mkisan/purchases",
            Some(&buyer),
            Some(json!({ "product_id": Uuid::new_v4(), "quantity": 1.0 })),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deactivating the buyer service blocks new purchases but keeps the history.
    let (status, body) = h
        .send(
            Method::PUT,
            &format!("/admin/services/{}/deactivate", buyer_service),
            Some(&admin),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "INACTIVE");

    let (status, _) = h
        .send(
            Method::POST,
            "/mkisan/purchases",
            Some(&buyer),
            Some(json!({ "product_id": product_id, "quantity": 1.0 })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h.send(Method::GET, "/mkisan/purchases", Some(&buyer), None).await?;
    assert_eq!(status, StatusCode::OK);
    let history = body["data"].as_array().ok_or("purchases not a list")?;
    assert!(history.iter().any(|p| p["purchase_id"] == purchase_id.as_str()));

    // --- e-Sanjeevani doctor and booking ---
    let doctor_identity = random_identity();
    let (_, _, doctor) = h.citizen_login(&doctor_identity).await?;
    let (status, body) = h
        .send(
            Method::POST,
            "/sp-registration/register",
            Some(&doctor),
            Some(json!({
                "request_type": "ESANJEEVANI",
                "provider_type": "DOCTOR",
                "specialization": "General Medicine",
                "years_of_experience": 7
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let doctor_request = body["data"]["request_id"].as_str().ok_or("missing request_id")?.to_string();

    let (status, body) = h
        .send(
            Method::PUT,
            &format!("/admin/sp-registration-requests/{}/request-changes", doctor_request),
            Some(&admin),
            Some(json!({ "admin_comments": "Please add your registration number" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["request"]["status"], "CHANGES_REQUESTED");

    let (status, body) = h
        .send(
            Method::PUT,
            &format!("/sp-registration/requests/{}/resubmit", doctor_request),
            Some(&doctor),
            Some(json!({ "registration_number": "MCI-12345" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["specialization"], "General Medicine");

    let (status, _) = h
        .send(
            Method::PUT,
            &format!("/admin/sp-registration-requests/{}/approve", doctor_request),
            Some(&admin),
            Some(json!({ "admin_comments": "Verified" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h
        .send(Method::GET, "/appointments/providers/esanjeevani", Some(&seller), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let providers = body["data"].as_array().ok_or("providers not a list")?;
    let provider_id = providers
        .iter()
        .find(|p| p["specialization"] == "General Medicine" && p["years_of_experience"] == 7)
        .and_then(|p| p["esanjeevani_provider_id"].as_str())
        .ok_or("approved doctor not listed")?
        .to_string();

    let slot_day = format!("2099-{:02}-{:02}", 1 + (addr.port() % 12), 1 + (addr.port() % 28));
    let booking = json!({
        "esanjeevani_provider_id": provider_id,
        "appointment_date": slot_day,
        "appointment_time": "10:30",
        "symptoms": "fever"
    });
    let (status, _) = h
        .send(Method::POST, "/appointments/book", Some(&doctor), Some(booking.clone()))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "providers cannot book");

    let (status, body) = h
        .send(Method::POST, "/appointments/book", Some(&seller), Some(booking.clone()))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "PENDING");
    let consultation_id = body["data"]["consultation_id"].as_str().ok_or("missing consultation_id")?.to_string();

    let (status, _) = h
        .send(Method::POST, "/appointments/book", Some(&seller), Some(booking))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "slot already taken");

    let (status, body) = h
        .send(Method::GET, "/appointments/provider/appointments", Some(&doctor), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let queue = body["data"].as_array().ok_or("appointments not a list")?;
    assert!(queue.iter().any(|a| a["consultation_id"] == consultation_id.as_str()));

    let action_path = format!("/appointments/provider/appointments/{}/action", consultation_id);
    let (status, _) = h
        .send(Method::PUT, &action_path, Some(&doctor), Some(json!({ "action": "REJECT" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "rejection needs a reason");

    let (status, body) = h
        .send(
            Method::PUT,
            &action_path,
            Some(&doctor),
            Some(json!({ "action": "APPROVE", "provider_notes": "Bring previous reports" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "APPROVED");

    let (status, body) = h
        .send(Method::GET, "/appointments/my-appointments", Some(&seller), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let mine = body["data"].as_array().ok_or("appointments not a list")?;
    assert!(mine
        .iter()
        .any(|a| a["consultation_id"] == consultation_id.as_str() && a["status"] == "APPROVED"));

    // --- activity log ---
    let (status, body) = h
        .send(
            Method::GET,
            "/activity-logs/my-history?activity_type=BOOK_APPOINTMENT",
            Some(&seller),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let history = body["data"].as_array().ok_or("history not a list")?;
    assert!(history.iter().any(|e| e["entity_id"] == consultation_id.as_str()));

    let (status, _) = h
        .send(
            Method::POST,
            "/activity-logs/log",
            Some(&seller),
            Some(json!({ "activity_type": "view_products", "activity_description": "Browsed cereals" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = h
        .send(Method::GET, "/activity-logs/my-history?limit=1", Some(&seller), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let latest = body["data"].as_array().ok_or("history not a list")?;
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0]["activity_type"], "VIEW_PRODUCTS");

    // --- seller cleans up ---
    let (status, _) = h
        .send(Method::DELETE, &format!("/mkisan/products/{}", product_id), Some(&buyer), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h
        .send(Method::DELETE, &format!("/mkisan/products/{}", product_id), Some(&seller), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    server.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_review_text_from_query_or_missing_body() -> Result<(), Box<dyn std::error::Error>> {
    let Some(Running { h, admin_username, server, .. }) = start().await? else {
        return Ok(());
    };
    use reqwest::Method;
    let admin = h.admin_login(&admin_username).await?;
    let (_, request_id) = h.buyer_request().await?;
    let base = format!("/admin/sp-registration-requests/{}", request_id);

    // No body at all reaches the workflow rules instead of failing JSON parsing.
    let (status, body) = h.send(Method::PUT, &format!("{}/reject", base), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["success"].as_bool(), Some(false));

    let (status, body) = h
        .send(Method::PUT, &format!("{}/request-changes", base), Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, body) = h.send(Method::GET, &base, Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PENDING");

    let (status, body) = h
        .send(
            Method::PUT,
            &format!("{}/request-changes?admin_comments=Add%20GST%20number", base),
            Some(&admin),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["request"]["status"], "CHANGES_REQUESTED");
    assert_eq!(body["data"]["request"]["admin_comments"], "Add GST number");

    let (status, body) = h
        .send(
            Method::PUT,
            &format!("{}/reject?rejection_reason=bad%20docs", base),
            Some(&admin),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["request"]["status"], "REJECTED");
    assert_eq!(body["data"]["request"]["rejection_reason"], "bad docs");

    // A JSON body wins over the query string.
    let (_, other_request) = h.buyer_request().await?;
    let (status, body) = h
        .send(
            Method::PUT,
            &format!(
                "/admin/sp-registration-requests/{}/reject?rejection_reason=from%20query",
                other_request
            ),
            Some(&admin),
            Some(json!({ "rejection_reason": "from body" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["request"]["rejection_reason"], "from body");

    server.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_service_onboarding_review() -> Result<(), Box<dyn std::error::Error>> {
    let Some(Running { h, admin_username, server, .. }) = start().await? else {
        return Ok(());
    };
    use reqwest::Method;
    let admin = h.admin_login(&admin_username).await?;

    // Two approved providers.
    let (provider, request_id) = h.buyer_request().await?;
    let (rival, rival_request) = h.buyer_request().await?;
    for id in [&request_id, &rival_request] {
        let (status, _) = h
            .send(
                Method::PUT,
                &format!("/admin/sp-registration-requests/{}/approve", id),
                Some(&admin),
                None,
            )
            .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let identifier = format!("mandi-prices-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let declaration = json!({
        "name": "Mandi Price Feed",
        "category": "agriculture",
        "base_url": "https://mandi.example.org/api",
        "service_identifier": identifier
    });

    let (_, _, citizen) = h.citizen_login(&random_identity()).await?;
    let (status, _) = h
        .send(Method::POST, "/sp-registration/onboarding-requests", Some(&citizen), Some(declaration.clone()))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "citizens cannot onboard services");

    let (status, _) = h
        .send(
            Method::POST,
            "/sp-registration/onboarding-requests",
            Some(&provider),
            Some(json!({ "name": "Bad", "category": "X", "service_identifier": "no spaces allowed" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .send(Method::POST, "/sp-registration/onboarding-requests", Some(&provider), Some(declaration.clone()))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["category"], "AGRICULTURE");
    let onboarding_id = body["data"]["onboarding_id"].as_str().ok_or("missing onboarding_id")?.to_string();

    let (status, _) = h
        .send(Method::POST, "/sp-registration/onboarding-requests", Some(&rival), Some(declaration.clone()))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "identifier already under review");

    let base = format!("/admin/onboarding-requests/{}", onboarding_id);
    let (status, body) = h.send(Method::GET, "/admin/onboarding-requests?status=PENDING", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    let pending = body["data"].as_array().ok_or("onboarding not a list")?;
    assert!(pending.iter().any(|r| r["onboarding_id"] == onboarding_id.as_str()));

    let (status, _) = h.send(Method::GET, &base, Some(&provider), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = h.send(Method::PUT, &format!("{}/reject", base), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "reject needs notes");

    let (status, body) = h
        .send(
            Method::PUT,
            &format!("{}/request-changes?admin_notes=Add%20a%20description", base),
            Some(&admin),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["request"]["status"], "CHANGES_REQUESTED");
    assert_eq!(body["data"]["request"]["admin_notes"], "Add a description");

    let (status, _) = h
        .send(
            Method::PUT,
            &format!("/sp-registration/onboarding-requests/{}/resubmit", onboarding_id),
            Some(&rival),
            Some(json!({ "description": "hijack" })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h
        .send(
            Method::PUT,
            &format!("/sp-registration/onboarding-requests/{}/resubmit", onboarding_id),
            Some(&provider),
            Some(json!({ "description": "Daily wholesale prices by district" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["name"], "Mandi Price Feed");

    let (status, body) = h
        .send(Method::PUT, &format!("{}/approve", base), Some(&admin), Some(json!({ "admin_notes": "Live" })))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["request"]["status"], "APPROVED");
    assert_eq!(body["data"]["service"]["service_identifier"], identifier.as_str());
    assert_eq!(body["data"]["service"]["status"], "ACTIVE");
    assert_eq!(body["data"]["service"]["description"], "Daily wholesale prices by district");
    assert_eq!(body["data"]["request"]["service_id"], body["data"]["service"]["service_id"]);

    let (status, _) = h.send(Method::PUT, &format!("{}/approve", base), Some(&admin), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "approved onboarding is terminal");

    let (status, body) = h.send(Method::GET, "/admin/services", Some(&admin), None).await?;
    assert_eq!(status, StatusCode::OK);
    let services = body["data"].as_array().ok_or("services not a list")?;
    assert!(services.iter().any(|s| s["service_identifier"] == identifier.as_str()));

    // The identifier is now bound to the first provider.
    let (status, body) = h
        .send(Method::POST, "/sp-registration/onboarding-requests", Some(&rival), Some(declaration))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let rival_onboarding = body["data"]["onboarding_id"].as_str().ok_or("missing onboarding_id")?.to_string();
    let (status, _) = h
        .send(
            Method::PUT,
            &format!("/admin/onboarding-requests/{}/approve", rival_onboarding),
            Some(&admin),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h.send(Method::GET, "/sp-registration/onboarding-requests", Some(&rival), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["status"], "PENDING");

    server.abort();
    Ok(())
}
