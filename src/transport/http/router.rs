use crate::domain::appointment::AppointmentStatus;
use crate::domain::identity::Role;
use crate::domain::registration::{RegistrationStatus, RequestType};
use crate::storage::repo::activity::ActivityRow;
use crate::storage::repo::admins::AdminSummary;
use crate::storage::repo::appointments::AppointmentRow;
use crate::storage::repo::citizens::CitizenRow;
use crate::storage::repo::marketplace::{ProductRow, PurchaseRow, SellerRow};
use crate::storage::repo::onboarding::OnboardingRow;
use crate::storage::repo::providers::EsanjeevaniProviderView;
use crate::storage::repo::registrations::RegistrationRow;
use crate::storage::repo::services::ServiceRow;
use crate::storage::repo::users::UserRow;
use crate::transport::http::handlers::{
    activity_logs, admin, appointments, auth, citizen, health, mkisan, sp_registration,
};
use crate::transport::http::types::{
    ActivityLogRequest, AdminLoginRequest, ApiResponse, AppState, AppointmentActionRequest,
    ApplicationFields, BookAppointmentRequest, CitizenProfileResponse, KisanIdRequest,
    KisanIdStatusResponse, LoginRequest, LoginResponse, OnboardingRequest, OnboardingReviewRequest,
    OnboardingReviewResponse, OnboardingUpdate, ProductRequest, ProfileUpdateRequest, PurchaseRequest,
    RegisterProviderRequest, RegisterSellerRequest, ReviewRequest, ReviewResponse, TokenResponse,
    VerifyOtpRequest,
};
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        auth::login_handler,
        auth::verify_otp_handler,
        auth::admin_login_handler,
        auth::me_handler,
        admin::list_requests_handler,
        admin::get_request_handler,
        admin::approve_handler,
        admin::reject_handler,
        admin::request_changes_handler,
        admin::list_services_handler,
        admin::activate_service_handler,
        admin::deactivate_service_handler,
        admin::list_onboarding_handler,
        admin::get_onboarding_handler,
        admin::approve_onboarding_handler,
        admin::reject_onboarding_handler,
        admin::request_onboarding_changes_handler,
        sp_registration::register_handler,
        sp_registration::my_requests_handler,
        sp_registration::resubmit_handler,
        sp_registration::submit_onboarding_handler,
        sp_registration::my_onboarding_handler,
        sp_registration::resubmit_onboarding_handler,
        appointments::list_providers_handler,
        appointments::book_handler,
        appointments::my_appointments_handler,
        appointments::provider_appointments_handler,
        appointments::appointment_action_handler,
        citizen::get_profile_handler,
        citizen::update_profile_handler,
        mkisan::check_kisan_id_handler,
        mkisan::set_kisan_id_handler,
        mkisan::register_seller_handler,
        mkisan::create_product_handler,
        mkisan::list_products_handler,
        mkisan::my_products_handler,
        mkisan::update_product_handler,
        mkisan::delete_product_handler,
        mkisan::create_purchase_handler,
        mkisan::list_purchases_handler,
        activity_logs::log_activity_handler,
        activity_logs::my_history_handler
    ),
    components(schemas(
        ApiResponse,
        LoginRequest,
        LoginResponse,
        VerifyOtpRequest,
        AdminLoginRequest,
        TokenResponse,
        Role,
        ApplicationFields,
        RegisterProviderRequest,
        ReviewRequest,
        ReviewResponse,
        RequestType,
        RegistrationStatus,
        RegistrationRow,
        ServiceRow,
        OnboardingRequest,
        OnboardingUpdate,
        OnboardingReviewRequest,
        OnboardingReviewResponse,
        OnboardingRow,
        AdminSummary,
        BookAppointmentRequest,
        AppointmentActionRequest,
        AppointmentStatus,
        AppointmentRow,
        EsanjeevaniProviderView,
        ProfileUpdateRequest,
        CitizenProfileResponse,
        CitizenRow,
        UserRow,
        KisanIdRequest,
        KisanIdStatusResponse,
        RegisterSellerRequest,
        SellerRow,
        ProductRequest,
        ProductRow,
        PurchaseRequest,
        PurchaseRow,
        ActivityLogRequest,
        ActivityRow
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "OTP and admin login"),
        (name = "admin", description = "Registration and onboarding review, service registry"),
        (name = "sp-registration", description = "Provider registration and service onboarding"),
        (name = "appointments", description = "e-Sanjeevani consultations"),
        (name = "citizen", description = "Citizen profile"),
        (name = "mkisan", description = "Farmer marketplace"),
        (name = "activity-logs", description = "Citizen activity history")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn create_router(app_state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login_handler))
        .route("/verify-otp", post(auth::verify_otp_handler))
        .route("/admin/login", post(auth::admin_login_handler))
        .route("/me", get(auth::me_handler));

    let admin_routes = Router::new()
        .route("/sp-registration-requests", get(admin::list_requests_handler))
        .route("/sp-registration-requests/:request_id", get(admin::get_request_handler))
        .route("/sp-registration-requests/:request_id/approve", put(admin::approve_handler))
        .route("/sp-registration-requests/:request_id/reject", put(admin::reject_handler))
        .route(
            "/sp-registration-requests/:request_id/request-changes",
            put(admin::request_changes_handler),
        )
        .route("/onboarding-requests", get(admin::list_onboarding_handler))
        .route("/onboarding-requests/:onboarding_id", get(admin::get_onboarding_handler))
        .route(
            "/onboarding-requests/:onboarding_id/approve",
            put(admin::approve_onboarding_handler),
        )
        .route("/onboarding-requests/:onboarding_id/reject", put(admin::reject_onboarding_handler))
        .route(
            "/onboarding-requests/:onboarding_id/request-changes",
            put(admin::request_onboarding_changes_handler),
        )
        .route("/services", get(admin::list_services_handler))
        .route("/services/:service_id/activate", put(admin::activate_service_handler))
        .route("/services/:service_id/deactivate", put(admin::deactivate_service_handler));

    let registration_routes = Router::new()
        .route("/register", post(sp_registration::register_handler))
        .route("/my-requests", get(sp_registration::my_requests_handler))
        .route("/requests/:request_id/resubmit", put(sp_registration::resubmit_handler))
        .route(
            "/onboarding-requests",
            post(sp_registration::submit_onboarding_handler).get(sp_registration::my_onboarding_handler),
        )
        .route(
            "/onboarding-requests/:onboarding_id/resubmit",
            put(sp_registration::resubmit_onboarding_handler),
        );

    let appointment_routes = Router::new()
        .route("/providers/esanjeevani", get(appointments::list_providers_handler))
        .route("/book", post(appointments::book_handler))
        .route("/my-appointments", get(appointments::my_appointments_handler))
        .route("/provider/appointments", get(appointments::provider_appointments_handler))
        .route(
            "/provider/appointments/:consultation_id/action",
            put(appointments::appointment_action_handler),
        );

    let citizen_routes = Router::new().route(
        "/profile",
        get(citizen::get_profile_handler).put(citizen::update_profile_handler),
    );

    let mkisan_routes = Router::new()
        .route("/check-kisan-id", get(mkisan::check_kisan_id_handler))
        .route("/kisan-id", put(mkisan::set_kisan_id_handler))
        .route("/register-seller", post(mkisan::register_seller_handler))
        .route(
            "/products",
            post(mkisan::create_product_handler).get(mkisan::list_products_handler),
        )
        .route("/my-products", get(mkisan::my_products_handler))
        .route(
            "/products/:product_id",
            put(mkisan::update_product_handler).delete(mkisan::delete_product_handler),
        )
        .route(
            "/purchases",
            post(mkisan::create_purchase_handler).get(mkisan::list_purchases_handler),
        );

    let activity_routes = Router::new()
        .route("/log", post(activity_logs::log_activity_handler))
        .route("/my-history", get(activity_logs::my_history_handler));

    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .nest("/sp-registration", registration_routes)
        .nest("/appointments", appointment_routes)
        .nest("/citizen", citizen_routes)
        .nest("/mkisan", mkisan_routes)
        .nest("/activity-logs", activity_routes)
        .with_state(app_state)
}
