//! Workflow rules, OTP lifecycle and configuration parsing. None of these need a database.

use jansetu_platform::domain::appointment::{parse_slot, AppointmentAction, AppointmentStatus};
use jansetu_platform::domain::identity::validate_identity;
use jansetu_platform::domain::marketplace::{normalize_kisan_id, validate_purchase_quantity, ProductDraft};
use jansetu_platform::domain::onboarding::ServiceDeclaration;
use jansetu_platform::domain::registration::{
    resubmit, ApplicationDetails, RegistrationStatus, RequestType, ReviewAction,
};
use jansetu_platform::domain::DomainError;
use jansetu_platform::infra::config::{CorsOrigins, LogFormat, OtpSettings, OtpStoreKind};
use jansetu_platform::{Config, MemoryOtpStore, OtpDelivery, OtpService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

// --- registration review ---

#[test]
fn approve_moves_reviewable_requests_to_approved() {
    let approve = ReviewAction::Approve { comments: Some("  looks good ".into()) };
    for current in [RegistrationStatus::Pending, RegistrationStatus::ChangesRequested] {
        let outcome = approve.apply(current).unwrap();
        assert_eq!(outcome.status, RegistrationStatus::Approved);
        assert_eq!(outcome.admin_comments.as_deref(), Some("looks good"));
    }
}

#[test]
fn approving_a_terminal_request_is_a_conflict() {
    let approve = ReviewAction::Approve { comments: None };
    for current in [RegistrationStatus::Approved, RegistrationStatus::Rejected] {
        assert!(matches!(approve.apply(current), Err(DomainError::Conflict(_))));
    }
}

#[test]
fn reject_requires_a_reason_before_anything_else() {
    let blank = ReviewAction::Reject { reason: Some("   ".into()) };
    assert!(matches!(blank.apply(RegistrationStatus::Pending), Err(DomainError::Validation(_))));
    assert!(matches!(blank.apply(RegistrationStatus::Approved), Err(DomainError::Validation(_))));

    let with_reason = ReviewAction::Reject { reason: Some("incomplete documents".into()) };
    assert!(matches!(with_reason.apply(RegistrationStatus::Approved), Err(DomainError::Conflict(_))));
    let outcome = with_reason.apply(RegistrationStatus::ChangesRequested).unwrap();
    assert_eq!(outcome.status, RegistrationStatus::Rejected);
    assert_eq!(outcome.rejection_reason.as_deref(), Some("incomplete documents"));
}

#[test]
fn request_changes_requires_comments() {
    let none = ReviewAction::RequestChanges { comments: None };
    assert!(matches!(none.apply(RegistrationStatus::Pending), Err(DomainError::Validation(_))));

    let some = ReviewAction::RequestChanges { comments: Some("add GST number".into()) };
    assert_eq!(
        some.apply(RegistrationStatus::Pending).unwrap().status,
        RegistrationStatus::ChangesRequested
    );
    assert!(matches!(some.apply(RegistrationStatus::Rejected), Err(DomainError::Conflict(_))));
}

#[test]
fn only_changes_requested_can_be_resubmitted() {
    assert_eq!(
        resubmit(RegistrationStatus::ChangesRequested).unwrap(),
        RegistrationStatus::Pending
    );
    for current in [
        RegistrationStatus::Pending,
        RegistrationStatus::Approved,
        RegistrationStatus::Rejected,
    ] {
        assert!(resubmit(current).is_err());
    }
}

#[test]
fn request_type_parsing_and_service_identifier() {
    assert_eq!("mkisan".parse::<RequestType>().unwrap(), RequestType::Mkisan);
    assert!("TELEMEDICINE".parse::<RequestType>().is_err());

    let sp = Uuid::nil();
    assert_eq!(
        RequestType::Esanjeevani.service_identifier(sp),
        format!("esanjeevani-{}", sp)
    );
}

#[test]
fn application_details_are_checked_per_request_type() {
    let doctor = ApplicationDetails {
        provider_type: Some("doctor".into()),
        specialization: Some("General Medicine".into()),
        years_of_experience: Some(8),
        ..Default::default()
    };
    let validated = doctor.clone().validated(RequestType::Esanjeevani).unwrap();
    assert_eq!(validated.provider_type.as_deref(), Some("DOCTOR"));

    let no_specialization = ApplicationDetails {
        specialization: Some(" ".into()),
        ..doctor
    };
    assert!(no_specialization.validated(RequestType::Esanjeevani).is_err());

    let buyer = ApplicationDetails {
        provider_category: Some("buyer".into()),
        ..Default::default()
    };
    assert_eq!(
        buyer.validated(RequestType::Mkisan).unwrap().provider_category.as_deref(),
        Some("BUYER")
    );

    let seller = ApplicationDetails {
        provider_category: Some("SELLER".into()),
        ..Default::default()
    };
    assert!(seller.validated(RequestType::Mkisan).is_err());

    let negative = ApplicationDetails {
        provider_category: Some("BUYER".into()),
        years_in_business: Some(-1),
        ..Default::default()
    };
    assert!(negative.validated(RequestType::Mkisan).is_err());
}

// --- appointments ---

#[test]
fn appointment_actions_follow_the_pending_state_machine() {
    let approve = AppointmentAction::parse("approve", None, Some("bring reports".into())).unwrap();
    let decision = approve.apply(AppointmentStatus::Pending).unwrap();
    assert_eq!(decision.status, AppointmentStatus::Approved);
    assert_eq!(decision.provider_notes.as_deref(), Some("bring reports"));

    assert!(matches!(
        approve.apply(AppointmentStatus::Rejected),
        Err(DomainError::Conflict(_))
    ));

    let reject_without_reason = AppointmentAction::parse("REJECT", None, None).unwrap();
    assert!(matches!(
        reject_without_reason.apply(AppointmentStatus::Pending),
        Err(DomainError::Validation(_))
    ));

    assert!(AppointmentAction::parse("CANCEL", None, None).is_err());
}

#[test]
fn slots_accept_minutes_with_or_without_seconds() {
    let (date, time) = parse_slot("2030-01-05", "09:30").unwrap();
    assert_eq!(date.to_string(), "2030-01-05");
    assert_eq!(time.to_string(), "09:30:00");
    assert!(parse_slot("2030-01-05", "09:30:15").is_ok());
    assert!(parse_slot("05/01/2030", "09:30").is_err());
    assert!(parse_slot("2030-01-05", "9am").is_err());
}

// --- identity and marketplace input ---

#[test]
fn identity_must_be_12_to_20_alphanumerics() {
    assert_eq!(validate_identity(" ABC123456789 ").unwrap(), "ABC123456789");
    assert!(validate_identity("12345678901").is_err());
    assert!(validate_identity("123456789012345678901").is_err());
    assert!(validate_identity("1234-5678-9012").is_err());
}

#[test]
fn kisan_ids_are_normalized() {
    assert_eq!(normalize_kisan_id(" kisan-up-1 ").unwrap(), "KISAN-UP-1");
    assert!(normalize_kisan_id("ab").is_err());
    assert!(normalize_kisan_id("bad id!").is_err());
}

#[test]
fn product_and_purchase_inputs_are_validated() {
    let draft = ProductDraft {
        product_name: " Wheat ".into(),
        product_type: "GRAIN".into(),
        category: "CEREALS".into(),
        quantity: "100 kg".into(),
        price_per_unit: 22.5,
        location: Some("".into()),
        description: None,
    };
    let validated = draft.clone().validated().unwrap();
    assert_eq!(validated.product_name, "Wheat");
    assert_eq!(validated.location, None);

    let negative = ProductDraft { price_per_unit: -1.0, ..draft.clone() };
    assert!(negative.validated().is_err());
    let unnamed = ProductDraft { product_name: "  ".into(), ..draft };
    assert!(unnamed.validated().is_err());

    assert_eq!(validate_purchase_quantity(2.5).unwrap(), 2.5);
    assert!(validate_purchase_quantity(0.0).is_err());
    assert!(validate_purchase_quantity(f64::NAN).is_err());
}

// --- OTP ---

#[derive(Default)]
struct CapturedCodes {
    codes: tokio::sync::Mutex<HashMap<Uuid, String>>,
}

#[async_trait::async_trait]
impl OtpDelivery for CapturedCodes {
    async fn deliver(&self, _identity_hash: &str, otp_id: Uuid, code: &str) -> anyhow::Result<()> {
        self.codes.lock().await.insert(otp_id, code.to_string());
        Ok(())
    }
}

fn otp_settings(ttl: Duration, max_attempts: u32) -> OtpSettings {
    OtpSettings {
        length: 6,
        ttl,
        max_attempts,
        store: OtpStoreKind::Memory,
    }
}

fn otp_service(settings: OtpSettings) -> (OtpService, Arc<MemoryOtpStore>, Arc<CapturedCodes>) {
    let store = Arc::new(MemoryOtpStore::new());
    let delivery = Arc::new(CapturedCodes::default());
    let service = OtpService::new(store.clone(), delivery.clone(), settings);
    (service, store, delivery)
}

#[tokio::test]
async fn otp_verifies_exactly_once() {
    let (otp, _, delivery) = otp_service(otp_settings(Duration::from_secs(300), 5));
    let issued = otp.issue("hash-a").await.unwrap();

    assert_eq!(issued.code.len(), 6);
    assert!(issued.code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(delivery.codes.lock().await.get(&issued.otp_id), Some(&issued.code));

    assert!(otp.verify(issued.otp_id, "hash-a", &issued.code).await.unwrap());
    assert!(!otp.verify(issued.otp_id, "hash-a", &issued.code).await.unwrap());
}

#[tokio::test]
async fn reissuing_invalidates_the_previous_code() {
    let (otp, store, _) = otp_service(otp_settings(Duration::from_secs(300), 5));
    let first = otp.issue("hash-a").await.unwrap();
    let second = otp.issue("hash-a").await.unwrap();
    assert_eq!(store.len().await, 1);

    assert!(!otp.verify(first.otp_id, "hash-a", &first.code).await.unwrap());
    assert!(otp.verify(second.otp_id, "hash-a", &second.code).await.unwrap());
}

#[tokio::test]
async fn wrong_code_or_identity_keeps_the_otp_until_attempts_run_out() {
    let (otp, store, _) = otp_service(otp_settings(Duration::from_secs(300), 3));
    let issued = otp.issue("hash-a").await.unwrap();
    let wrong = if issued.code == "000000" { "111111" } else { "000000" };

    assert!(!otp.verify(issued.otp_id, "hash-a", wrong).await.unwrap());
    assert!(!otp.verify(issued.otp_id, "hash-b", &issued.code).await.unwrap());
    assert_eq!(store.len().await, 1);
    assert!(otp.verify(issued.otp_id, "hash-a", &issued.code).await.unwrap());

    let again = otp.issue("hash-a").await.unwrap();
    for _ in 0..3 {
        assert!(!otp.verify(again.otp_id, "hash-a", wrong).await.unwrap());
    }
    assert_eq!(store.len().await, 0);
    assert!(!otp.verify(again.otp_id, "hash-a", &again.code).await.unwrap());
}

#[tokio::test]
async fn expired_codes_fail_and_are_purged() {
    let (otp, store, _) = otp_service(otp_settings(Duration::ZERO, 5));
    let a = otp.issue("hash-a").await.unwrap();
    otp.issue("hash-b").await.unwrap();

    assert!(!otp.verify(a.otp_id, "hash-a", &a.code).await.unwrap());
    assert_eq!(otp.purge_expired().await.unwrap(), 1);
    assert_eq!(store.len().await, 0);
}

// --- configuration ---

fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
    let env: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn config_defaults() {
    let config = config_from(&[("DATABASE_URL", "postgres://localhost/jansetu")]).unwrap();
    assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8000");
    assert_eq!(config.db_max_connections, 5);
    assert_eq!(config.jwt_ttl, Duration::from_secs(30 * 60));
    assert_eq!(config.otp.length, 6);
    assert_eq!(config.otp.ttl, Duration::from_secs(300));
    assert_eq!(config.otp.max_attempts, 5);
    assert_eq!(config.otp.store, OtpStoreKind::Memory);
    assert_eq!(config.log_format, LogFormat::Text);
    assert!(matches!(config.cors_origins, CorsOrigins::List(ref l) if l.len() == 2));
    assert!(config.uses_default_secrets());
}

#[test]
fn config_overrides_and_errors() {
    let config = config_from(&[
        ("DATABASE_URL", "postgres://db/jansetu"),
        ("BIND_ADDR", "127.0.0.1:9000"),
        ("AADHAAR_HASH_SALT", "pepper"),
        ("JWT_SECRET_KEY", "s3cret"),
        ("OTP_LENGTH", "8"),
        ("OTP_STORE", "Postgres"),
        ("CORS_ORIGINS", "*"),
        ("LOG_FORMAT", "json"),
    ])
    .unwrap();
    assert_eq!(config.bind_addr.port(), 9000);
    assert_eq!(config.otp.length, 8);
    assert_eq!(config.otp.store, OtpStoreKind::Postgres);
    assert_eq!(config.cors_origins, CorsOrigins::Any);
    assert_eq!(config.log_format, LogFormat::Json);
    assert!(!config.uses_default_secrets());

    assert!(config_from(&[]).is_err());
    assert!(config_from(&[("DATABASE_URL", "x"), ("OTP_LENGTH", "3")]).is_err());
    assert!(config_from(&[("DATABASE_URL", "x"), ("OTP_STORE", "redis")]).is_err());
    assert!(config_from(&[("DATABASE_URL", "x"), ("BIND_ADDR", "localhost")]).is_err());
    assert!(config_from(&[("DATABASE_URL", "x"), ("DB_MAX_CONNECTIONS", "many")]).is_err());
}

#[test]
fn service_declaration_is_normalized() {
    let declared = ServiceDeclaration {
        name: "  Mandi Prices ".to_string(),
        description: Some("   ".to_string()),
        base_url: Some("https://mandi.example.org".to_string()),
        category: "agriculture".to_string(),
        service_identifier: " Mandi_Prices-01 ".to_string(),
    }
    .validated()
    .unwrap();
    assert_eq!(declared.name, "Mandi Prices");
    assert_eq!(declared.category, "AGRICULTURE");
    assert_eq!(declared.service_identifier, "mandi_prices-01");
    assert_eq!(declared.description, None);

    let base = ServiceDeclaration {
        name: "Feed".to_string(),
        category: "X".to_string(),
        service_identifier: "feed".to_string(),
        ..Default::default()
    };
    assert!(base.clone().validated().is_ok());

    for bad in [
        ServiceDeclaration { service_identifier: "a b c".to_string(), ..base.clone() },
        ServiceDeclaration { service_identifier: "ab".to_string(), ..base.clone() },
        ServiceDeclaration { base_url: Some("ftp://feed".to_string()), ..base.clone() },
        ServiceDeclaration { name: " ".to_string(), ..base.clone() },
        ServiceDeclaration { category: String::new(), ..base.clone() },
    ] {
        assert!(matches!(bad.validated(), Err(DomainError::Validation(_))));
    }
}

#[test]
fn token_lifetime_is_bounded() {
    let year = config_from(&[("DATABASE_URL", "x"), ("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", "525600")]).unwrap();
    assert_eq!(year.jwt_ttl, Duration::from_secs(525_600 * 60));

    assert!(config_from(&[("DATABASE_URL", "x"), ("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", "525601")]).is_err());
    assert!(config_from(&[
        ("DATABASE_URL", "x"),
        ("JWT_ACCESS_TOKEN_EXPIRE_MINUTES", "18446744073709551615"),
    ])
    .is_err());
}
