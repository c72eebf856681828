use crate::app::marketplace_service;
use crate::transport::http::auth::AuthUser;
use crate::transport::http::error::{json_422, ApiError};
use crate::transport::http::handlers::common::{body_or_default, created, ok};
use crate::transport::http::types::{
    ApiResponse, AppState, KisanIdRequest, KisanIdStatusResponse, ProductQuery, ProductRequest,
    PurchaseRequest, RegisterSellerRequest,
};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

const PRODUCT_SHAPE: &str = "{\"product_name\", \"product_type\", \"category\", \"quantity\": \"50 kg\", \"price_per_unit\": 20.0, \"location\", \"description\"}";

#[utoipa::path(
    get,
    path = "/mkisan/check-kisan-id",
    tag = "mkisan",
    security(("bearer" = [])),
    responses((status = 200, description = "Farmer-ID and seller registration status", body = ApiResponse))
)]
pub async fn check_kisan_id_handler(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    let mut conn = state.db.pool().acquire().await?;
    let status = marketplace_service::kisan_id_status(&mut conn, &user.identity_hash).await?;
    ok(KisanIdStatusResponse {
        has_kisan_id: status.has_kisan_id,
        is_registered_as_seller: status.is_registered_as_seller,
        kisan_id: status.kisan_id,
    })
}

#[utoipa::path(
    put,
    path = "/mkisan/kisan-id",
    tag = "mkisan",
    security(("bearer" = [])),
    request_body = KisanIdRequest,
    responses(
        (status = 200, description = "Farmer-ID bound to the caller", body = ApiResponse),
        (status = 400, description = "Malformed ID or already bound to another citizen", body = ApiResponse)
    )
)]
pub async fn set_kisan_id_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<KisanIdRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(|e| json_422(e, "{\"kisan_id\": \"KISAN-123\"}"))?;

    let mut tx = state.db.begin().await?;
    let citizen = marketplace_service::set_kisan_id(&mut tx, &user.identity_hash, &request.kisan_id).await?;
    tx.commit().await?;

    ok(json!({ "message": "Kisan ID saved", "kisan_id": citizen.kisan_id }))
}

#[utoipa::path(
    post,
    path = "/mkisan/register-seller",
    tag = "mkisan",
    security(("bearer" = [])),
    request_body = RegisterSellerRequest,
    responses(
        (status = 201, description = "Registered as a seller", body = ApiResponse),
        (status = 400, description = "No farmer-ID or already registered", body = ApiResponse)
    )
)]
pub async fn register_seller_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<RegisterSellerRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = body_or_default(request, "{\"land_area\", \"land_unit\", \"primary_crop\", \"district\", \"state\"}")?;

    let mut tx = state.db.begin().await?;
    let seller = marketplace_service::register_seller(&mut tx, &user.identity_hash, request.into()).await?;
    tx.commit().await?;

    created(seller)
}

#[utoipa::path(
    post,
    path = "/mkisan/products",
    tag = "mkisan",
    security(("bearer" = [])),
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Listing created", body = ApiResponse),
        (status = 403, description = "Caller is not a registered seller", body = ApiResponse)
    )
)]
pub async fn create_product_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request.map_err(|e| json_422(e, PRODUCT_SHAPE))?;

    let mut tx = state.db.begin().await?;
    let product = marketplace_service::create_product(&mut tx, &user.identity_hash, request.into()).await?;
    tx.commit().await?;

    created(product)
}

#[utoipa::path(
    get,
    path = "/mkisan/products",
    tag = "mkisan",
    params(
        ("category" = Option<String>, Query, description = "Exact category"),
        ("product_type" = Option<String>, Query, description = "Exact product type")
    ),
    responses((status = 200, description = "Listings with seller contact, newest first", body = ApiResponse))
)]
pub async fn list_products_handler(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let mut conn = state.db.pool().acquire().await?;
    ok(marketplace_service::list_products(
        &mut conn,
        query.category.as_deref(),
        query.product_type.as_deref(),
    )
    .await?)
}

#[utoipa::path(
    get,
    path = "/mkisan/my-products",
    tag = "mkisan",
    security(("bearer" = [])),
    responses((status = 200, description = "The caller's listings", body = ApiResponse))
)]
pub async fn my_products_handler(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    let mut conn = state.db.pool().acquire().await?;
    ok(marketplace_service::my_products(&mut conn, &user.identity_hash).await?)
}

#[utoipa::path(
    put,
    path = "/mkisan/products/{product_id}",
    tag = "mkisan",
    security(("bearer" = [])),
    params(("product_id" = String, Path, description = "Product id")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Listing updated", body = ApiResponse),
        (status = 403, description = "Listing belongs to someone else", body = ApiResponse),
        (status = 404, description = "Unknown product", body = ApiResponse)
    )
)]
pub async fn update_product_handler(
    State(state): State<AppState>,
    user: AuthUser,
    product_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(product_id) = product_id?;
    let Json(request) = request.map_err(|e| json_422(e, PRODUCT_SHAPE))?;

    let mut tx = state.db.begin().await?;
    let product =
        marketplace_service::update_product(&mut tx, &user.identity_hash, product_id, request.into()).await?;
    tx.commit().await?;

    ok(product)
}

#[utoipa::path(
    delete,
    path = "/mkisan/products/{product_id}",
    tag = "mkisan",
    security(("bearer" = [])),
    params(("product_id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Listing deleted", body = ApiResponse),
        (status = 403, description = "Listing belongs to someone else", body = ApiResponse),
        (status = 404, description = "Unknown product", body = ApiResponse)
    )
)]
pub async fn delete_product_handler(
    State(state): State<AppState>,
    user: AuthUser,
    product_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(product_id) = product_id?;

    let mut tx = state.db.begin().await?;
    marketplace_service::delete_product(&mut tx, &user.identity_hash, product_id).await?;
    tx.commit().await?;

    ok(json!({ "message": "Product deleted successfully", "product_id": product_id }))
}

#[utoipa::path(
    post,
    path = "/mkisan/purchases",
    tag = "mkisan",
    security(("bearer" = [])),
    request_body = PurchaseRequest,
    responses(
        (status = 201, description = "CONFIRMED purchase", body = ApiResponse),
        (status = 403, description = "Caller is not an active mKisan buyer", body = ApiResponse),
        (status = 404, description = "Unknown product", body = ApiResponse)
    )
)]
pub async fn create_purchase_handler(
    State(state): State<AppState>,
    user: AuthUser,
    request: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request
        .map_err(|e| json_422(e, "{\"product_id\": \"uuid\", \"quantity\": 10.0, \"notes\": \"...\"}"))?;

    let mut tx = state.db.begin().await?;
    let purchase = marketplace_service::purchase(
        &mut tx,
        &user.identity_hash,
        request.product_id,
        request.quantity,
        request.notes.as_deref(),
    )
    .await?;
    tx.commit().await?;

    created(purchase)
}

#[utoipa::path(
    get,
    path = "/mkisan/purchases",
    tag = "mkisan",
    security(("bearer" = [])),
    responses((status = 200, description = "The caller's purchases with product details", body = ApiResponse))
)]
pub async fn list_purchases_handler(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    let mut conn = state.db.pool().acquire().await?;
    ok(marketplace_service::my_purchases(&mut conn, &user.identity_hash).await?)
}
