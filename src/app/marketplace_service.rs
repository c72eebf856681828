//! mKisan: farmer-IDs, seller registration, product listings and buyer purchases.

use crate::app::citizen_service::require_citizen;
use crate::app::error::{AppError, AppResult};
use crate::domain::marketplace::{normalize_kisan_id, validate_purchase_quantity, ProductDraft};
use crate::domain::non_blank;
use crate::storage::repo::citizens::{self, CitizenRow};
use crate::storage::repo::marketplace::{self, ProductRow, PurchaseRow, SellerProfile, SellerRow};
use crate::storage::repo::providers;
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KisanIdStatus {
    pub has_kisan_id: bool,
    pub is_registered_as_seller: bool,
    pub kisan_id: Option<String>,
}

pub async fn kisan_id_status(conn: &mut PgConnection, identity_hash: &str) -> AppResult<KisanIdStatus> {
    let citizen = require_citizen(conn, identity_hash).await?;
    let is_registered_as_seller = marketplace::find_seller(conn, citizen.citizen_id).await?.is_some();
    Ok(KisanIdStatus {
        has_kisan_id: citizen.kisan_id.is_some(),
        is_registered_as_seller,
        kisan_id: citizen.kisan_id,
    })
}

/// Binds a farmer-ID to the caller. The ID must not belong to anyone else, and it is frozen
/// once the caller registers as a seller.
pub async fn set_kisan_id(conn: &mut PgConnection, identity_hash: &str, raw: &str) -> AppResult<CitizenRow> {
    let kisan_id = normalize_kisan_id(raw)?;
    let citizen = require_citizen(conn, identity_hash).await?;
    if citizen.kisan_id.as_deref() == Some(kisan_id.as_str()) {
        return Ok(citizen);
    }
    if marketplace::find_seller(conn, citizen.citizen_id).await?.is_some() {
        return Err(AppError::Conflict(
            "Kisan ID cannot be changed after registering as a seller".to_string(),
        ));
    }

    citizens::set_kisan_id(conn, citizen.citizen_id, &kisan_id)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("Kisan ID already exists for another citizen".to_string())
            }
            other => other,
        })
}

pub async fn register_seller(
    conn: &mut PgConnection,
    identity_hash: &str,
    profile: SellerProfile,
) -> AppResult<SellerRow> {
    let citizen = require_citizen(conn, identity_hash).await?;
    let Some(kisan_id) = citizen.kisan_id.as_deref() else {
        return Err(AppError::Validation(
            "A Kisan ID is required before registering as a seller".to_string(),
        ));
    };
    if marketplace::find_seller(conn, citizen.citizen_id).await?.is_some() {
        return Err(AppError::Conflict("Already registered as a seller".to_string()));
    }
    if matches!(profile.land_area, Some(a) if !a.is_finite() || a < 0.0) {
        return Err(AppError::Validation("land_area cannot be negative".to_string()));
    }

    let profile = SellerProfile {
        land_area: profile.land_area,
        land_unit: non_blank(profile.land_unit.as_deref()),
        primary_crop: non_blank(profile.primary_crop.as_deref()),
        district: non_blank(profile.district.as_deref()),
        state: non_blank(profile.state.as_deref()),
    };
    let seller = marketplace::insert_seller(conn, citizen.citizen_id, kisan_id, &profile).await?;
    tracing::info!(seller = %seller.mkisan_citizen_id, "mKisan seller registered");
    Ok(seller)
}

pub async fn create_product(
    conn: &mut PgConnection,
    identity_hash: &str,
    draft: ProductDraft,
) -> AppResult<ProductRow> {
    let draft = draft.validated()?;
    let citizen = require_citizen(conn, identity_hash).await?;
    let seller = marketplace::find_seller(conn, citizen.citizen_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Register as a seller before listing products".to_string()))?;

    let product_id = marketplace::insert_product(conn, seller.mkisan_citizen_id, &draft).await?;
    marketplace::find_product(conn, product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

pub async fn list_products(
    conn: &mut PgConnection,
    category: Option<&str>,
    product_type: Option<&str>,
) -> AppResult<Vec<ProductRow>> {
    let category = non_blank(category);
    let product_type = non_blank(product_type);
    Ok(marketplace::list_products(conn, category.as_deref(), product_type.as_deref()).await?)
}

pub async fn my_products(conn: &mut PgConnection, identity_hash: &str) -> AppResult<Vec<ProductRow>> {
    Ok(marketplace::list_products_for_identity(conn, identity_hash).await?)
}

async fn owned_product(conn: &mut PgConnection, identity_hash: &str, product_id: Uuid) -> AppResult<ProductRow> {
    let product = marketplace::find_product(conn, product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    if product.seller_identity_hash != identity_hash {
        return Err(AppError::Forbidden(
            "You don't have permission to modify this product".to_string(),
        ));
    }
    Ok(product)
}

pub async fn update_product(
    conn: &mut PgConnection,
    identity_hash: &str,
    product_id: Uuid,
    draft: ProductDraft,
) -> AppResult<ProductRow> {
    let draft = draft.validated()?;
    owned_product(conn, identity_hash, product_id).await?;
    marketplace::update_product(conn, product_id, &draft).await?;
    marketplace::find_product(conn, product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

pub async fn delete_product(conn: &mut PgConnection, identity_hash: &str, product_id: Uuid) -> AppResult<()> {
    owned_product(conn, identity_hash, product_id).await?;
    marketplace::delete_product(conn, product_id).await?;
    Ok(())
}

/// Records a CONFIRMED purchase by an active mKisan buyer. Listing stock is not adjusted.
pub async fn purchase(
    conn: &mut PgConnection,
    identity_hash: &str,
    product_id: Uuid,
    quantity: f64,
    notes: Option<&str>,
) -> AppResult<PurchaseRow> {
    let buyer = providers::active_mkisan_id_for_identity(conn, identity_hash)
        .await?
        .ok_or_else(|| {
            AppError::Forbidden("Only approved mKisan buyers can make purchases".to_string())
        })?;
    let quantity = validate_purchase_quantity(quantity)?;
    let product = marketplace::find_product(conn, product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let notes = non_blank(notes);
    let purchase_id = marketplace::insert_purchase(conn, buyer, &product, quantity, notes.as_deref()).await?;
    tracing::info!(%purchase_id, %product_id, quantity, "purchase confirmed");

    marketplace::find_purchase(conn, purchase_id)
        .await?
        .ok_or_else(|| AppError::not_found("Purchase"))
}

/// Purchases made by the caller, including those made before the buyer service was
/// deactivated. Empty for callers without an mKisan buyer profile.
pub async fn my_purchases(conn: &mut PgConnection, identity_hash: &str) -> AppResult<Vec<PurchaseRow>> {
    match providers::mkisan_id_for_identity(conn, identity_hash).await? {
        Some(buyer) => Ok(marketplace::list_purchases(conn, buyer).await?),
        None => Ok(Vec::new()),
    }
}
