use crate::app::{DatabaseService, OtpDelivery, OtpService};
use crate::crypto::TokenIssuer;
use crate::domain::identity::Role;
use crate::domain::marketplace::ProductDraft;
use crate::domain::onboarding::ServiceDeclaration;
use crate::domain::registration::ApplicationDetails;
use crate::infra::Config;
use crate::storage::otp::OtpStore;
use crate::storage::repo::citizens::CitizenRow;
use crate::storage::repo::marketplace::SellerProfile;
use crate::storage::repo::onboarding::OnboardingRow;
use crate::storage::repo::registrations::RegistrationRow;
use crate::storage::repo::services::ServiceRow;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseService>,
    pub config: Arc<Config>,
    pub otp: Arc<OtpService>,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Wires the OTP and token services from `config`.
    pub fn new(
        db: DatabaseService,
        config: Config,
        otp_store: Arc<dyn OtpStore>,
        delivery: Arc<dyn OtpDelivery>,
    ) -> Self {
        let otp = OtpService::new(otp_store, delivery, config.otp.clone());
        let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_ttl);
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
            otp: Arc::new(otp),
            tokens: Arc::new(tokens),
        }
    }
}

/// Envelope returned by every endpoint.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// --- auth ---

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    /// National ID, 12-20 letters or digits.
    pub aadhar: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct LoginResponse {
    #[schema(value_type = String)]
    pub otp_id: Uuid,
    pub message: String,
    /// Seconds until the code expires.
    pub expires_in: u64,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct VerifyOtpRequest {
    pub aadhar: String,
    #[schema(value_type = String)]
    pub otp_id: Uuid,
    pub otp_code: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: i64,
    pub role: Role,
}

// --- service-provider registration ---

/// Application fields. Which ones are required depends on the request type.
#[derive(Deserialize, Debug, Default, Clone, ToSchema)]
pub struct ApplicationFields {
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    /// ESANJEEVANI: e.g. DOCTOR, NURSE.
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub years_of_experience: Option<i32>,
    /// MKISAN: only BUYER is accepted.
    #[serde(default)]
    pub provider_category: Option<String>,
    #[serde(default)]
    pub business_license: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub years_in_business: Option<i32>,
}

impl ApplicationFields {
    pub fn is_empty(&self) -> bool {
        self.organization_name.is_none()
            && self.registration_number.is_none()
            && self.provider_type.is_none()
            && self.specialization.is_none()
            && self.years_of_experience.is_none()
            && self.provider_category.is_none()
            && self.business_license.is_none()
            && self.gst_number.is_none()
            && self.years_in_business.is_none()
    }

    /// Fields present here replace the ones in `base`.
    pub fn merged_over(self, base: ApplicationDetails) -> ApplicationDetails {
        ApplicationDetails {
            organization_name: self.organization_name.or(base.organization_name),
            registration_number: self.registration_number.or(base.registration_number),
            provider_type: self.provider_type.or(base.provider_type),
            specialization: self.specialization.or(base.specialization),
            years_of_experience: self.years_of_experience.or(base.years_of_experience),
            provider_category: self.provider_category.or(base.provider_category),
            business_license: self.business_license.or(base.business_license),
            gst_number: self.gst_number.or(base.gst_number),
            years_in_business: self.years_in_business.or(base.years_in_business),
        }
    }
}

impl From<ApplicationFields> for ApplicationDetails {
    fn from(fields: ApplicationFields) -> Self {
        fields.merged_over(ApplicationDetails::default())
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterProviderRequest {
    /// ESANJEEVANI or MKISAN.
    pub request_type: String,
    #[serde(flatten)]
    pub fields: ApplicationFields,
}

/// Accepted as a JSON body or as query parameters.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct ReviewRequest {
    #[serde(default)]
    pub admin_comments: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl ReviewRequest {
    /// Fields missing here are taken from `fallback`.
    pub fn or(self, fallback: ReviewRequest) -> Self {
        Self {
            admin_comments: self.admin_comments.or(fallback.admin_comments),
            rejection_reason: self.rejection_reason.or(fallback.rejection_reason),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct RegistrationListQuery {
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to_me: bool,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ReviewResponse {
    pub message: String,
    pub request: RegistrationRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceRow>,
}

// --- service onboarding ---

#[derive(Deserialize, Debug, ToSchema)]
pub struct OnboardingRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    pub category: String,
    /// Stable public identifier, e.g. `pm-kisan-portal`.
    pub service_identifier: String,
}

impl From<OnboardingRequest> for ServiceDeclaration {
    fn from(r: OnboardingRequest) -> Self {
        ServiceDeclaration {
            name: r.name,
            description: r.description,
            base_url: r.base_url,
            category: r.category,
            service_identifier: r.service_identifier,
        }
    }
}

/// Partial declaration sent on resubmission; present fields replace the stored ones.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct OnboardingUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub service_identifier: Option<String>,
}

impl OnboardingUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.base_url.is_none()
            && self.category.is_none()
            && self.service_identifier.is_none()
    }

    pub fn merged_over(self, base: ServiceDeclaration) -> ServiceDeclaration {
        ServiceDeclaration {
            name: self.name.unwrap_or(base.name),
            description: self.description.or(base.description),
            base_url: self.base_url.or(base.base_url),
            category: self.category.unwrap_or(base.category),
            service_identifier: self.service_identifier.unwrap_or(base.service_identifier),
        }
    }
}

/// Accepted as a JSON body or as a query parameter.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct OnboardingReviewRequest {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct OnboardingListQuery {
    pub status: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct OnboardingReviewResponse {
    pub message: String,
    pub request: OnboardingRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceRow>,
}

// --- appointments ---

#[derive(Deserialize, Debug, ToSchema)]
pub struct BookAppointmentRequest {
    #[schema(value_type = String)]
    pub esanjeevani_provider_id: Uuid,
    /// `YYYY-MM-DD`
    pub appointment_date: String,
    /// `HH:MM`
    pub appointment_time: String,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AppointmentActionRequest {
    /// APPROVE or REJECT.
    pub action: String,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub provider_notes: Option<String>,
}

// --- citizen ---

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// MALE, FEMALE or OTHER.
    #[serde(default)]
    pub gender: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct CitizenProfileResponse {
    #[serde(flatten)]
    pub citizen: CitizenRow,
    pub age: Option<i32>,
}

// --- mKisan ---

#[derive(Deserialize, Debug, ToSchema)]
pub struct KisanIdRequest {
    pub kisan_id: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct KisanIdStatusResponse {
    pub has_kisan_id: bool,
    pub is_registered_as_seller: bool,
    pub kisan_id: Option<String>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct RegisterSellerRequest {
    #[serde(default)]
    pub land_area: Option<f64>,
    #[serde(default)]
    pub land_unit: Option<String>,
    #[serde(default)]
    pub primary_crop: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl From<RegisterSellerRequest> for SellerProfile {
    fn from(r: RegisterSellerRequest) -> Self {
        SellerProfile {
            land_area: r.land_area,
            land_unit: r.land_unit,
            primary_crop: r.primary_crop,
            district: r.district,
            state: r.state,
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ProductRequest {
    pub product_name: String,
    pub product_type: String,
    pub category: String,
    /// Free-form amount with unit, e.g. "50 kg".
    pub quantity: String,
    pub price_per_unit: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<ProductRequest> for ProductDraft {
    fn from(r: ProductRequest) -> Self {
        ProductDraft {
            product_name: r.product_name,
            product_type: r.product_type,
            category: r.category,
            quantity: r.quantity,
            price_per_unit: r.price_per_unit,
            location: r.location,
            description: r.description,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub product_type: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct PurchaseRequest {
    #[schema(value_type = String)]
    pub product_id: Uuid,
    pub quantity: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

// --- activity log ---

#[derive(Deserialize, Debug, ToSchema)]
pub struct ActivityLogRequest {
    pub activity_type: String,
    pub activity_description: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
}

#[derive(Deserialize, Debug, Default)]
pub struct HistoryQuery {
    pub activity_type: Option<String>,
    pub limit: Option<i64>,
}
