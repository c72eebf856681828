use crate::domain::marketplace::{ProductDraft, PURCHASE_CONFIRMED};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct SellerRow {
    #[schema(value_type = String)]
    pub mkisan_citizen_id: Uuid,
    #[schema(value_type = String)]
    pub citizen_id: Uuid,
    pub kisan_id: String,
    pub land_area: Option<f64>,
    pub land_unit: Option<String>,
    pub primary_crop: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SellerProfile {
    pub land_area: Option<f64>,
    pub land_unit: Option<String>,
    pub primary_crop: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
}

/// A listing joined with the seller's contact details.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct ProductRow {
    #[schema(value_type = String)]
    pub product_id: Uuid,
    #[schema(value_type = String)]
    pub mkisan_citizen_id: Uuid,
    pub product_name: String,
    pub product_type: String,
    pub category: String,
    pub quantity: String,
    pub price_per_unit: f64,
    pub location: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
    pub seller_name: Option<String>,
    pub seller_phone: Option<String>,
    #[serde(skip_serializing)]
    pub seller_identity_hash: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct PurchaseRow {
    #[schema(value_type = String)]
    pub purchase_id: Uuid,
    #[schema(value_type = String)]
    pub mkisan_provider_id: Uuid,
    #[schema(value_type = Option<String>)]
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_type: Option<String>,
    pub category: Option<String>,
    pub quantity: f64,
    pub price_per_unit: f64,
    pub total_price: f64,
    pub status: String,
    pub notes: Option<String>,
    pub seller_name: Option<String>,
    pub seller_phone: Option<String>,
    #[schema(value_type = String)]
    pub purchased_at: DateTime<Utc>,
}

const SELECT_PRODUCT: &str = "SELECT p.product_id, p.mkisan_citizen_id, p.product_name, p.product_type,
            p.category, p.quantity, p.price_per_unit, p.location, p.description,
            p.created_at, p.updated_at,
            c.full_name AS seller_name, c.phone AS seller_phone,
            c.identity_hash AS seller_identity_hash
     FROM mkisan_products p
     JOIN mkisan_sellers ms ON ms.mkisan_citizen_id = p.mkisan_citizen_id
     JOIN citizens c ON c.citizen_id = ms.citizen_id";

const SELECT_PURCHASE: &str = "SELECT pu.purchase_id, pu.mkisan_provider_id, pu.product_id, pu.product_name,
            p.product_type, p.category, pu.quantity, pu.price_per_unit, pu.total_price,
            pu.status, pu.notes, c.full_name AS seller_name, c.phone AS seller_phone,
            pu.purchased_at
     FROM mkisan_purchases pu
     LEFT JOIN mkisan_products p ON p.product_id = pu.product_id
     LEFT JOIN mkisan_sellers ms ON ms.mkisan_citizen_id = p.mkisan_citizen_id
     LEFT JOIN citizens c ON c.citizen_id = ms.citizen_id";

pub async fn find_seller(conn: &mut PgConnection, citizen_id: Uuid) -> Result<Option<SellerRow>, sqlx::Error> {
    sqlx::query_as::<_, SellerRow>(
        "SELECT mkisan_citizen_id, citizen_id, kisan_id, land_area, land_unit, primary_crop,
                district, state, created_at
         FROM mkisan_sellers WHERE citizen_id = $1",
    )
    .bind(citizen_id)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn insert_seller(
    conn: &mut PgConnection,
    citizen_id: Uuid,
    kisan_id: &str,
    profile: &SellerProfile,
) -> Result<SellerRow, sqlx::Error> {
    sqlx::query_as::<_, SellerRow>(
        "INSERT INTO mkisan_sellers
            (mkisan_citizen_id, citizen_id, kisan_id, land_area, land_unit, primary_crop, district, state)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING mkisan_citizen_id, citizen_id, kisan_id, land_area, land_unit, primary_crop,
                   district, state, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(citizen_id)
    .bind(kisan_id)
    .bind(profile.land_area)
    .bind(profile.land_unit.as_deref())
    .bind(profile.primary_crop.as_deref())
    .bind(profile.district.as_deref())
    .bind(profile.state.as_deref())
    .fetch_one(&mut *conn)
    .await
}

pub async fn insert_product(
    conn: &mut PgConnection,
    mkisan_citizen_id: Uuid,
    draft: &ProductDraft,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO mkisan_products
            (product_id, mkisan_citizen_id, product_name, product_type, category, quantity,
             price_per_unit, location, description)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING product_id",
    )
    .bind(Uuid::new_v4())
    .bind(mkisan_citizen_id)
    .bind(&draft.product_name)
    .bind(&draft.product_type)
    .bind(&draft.category)
    .bind(&draft.quantity)
    .bind(draft.price_per_unit)
    .bind(draft.location.as_deref())
    .bind(draft.description.as_deref())
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_product(conn: &mut PgConnection, product_id: Uuid) -> Result<Option<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(&format!("{} WHERE p.product_id = $1", SELECT_PRODUCT))
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_products(
    conn: &mut PgConnection,
    category: Option<&str>,
    product_type: Option<&str>,
) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "{} WHERE ($1::TEXT IS NULL OR p.category = $1)
              AND ($2::TEXT IS NULL OR p.product_type = $2)
         ORDER BY p.created_at DESC",
        SELECT_PRODUCT
    ))
    .bind(category)
    .bind(product_type)
    .fetch_all(&mut *conn)
    .await
}

pub async fn list_products_for_identity(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(&format!(
        "{} WHERE c.identity_hash = $1 ORDER BY p.created_at DESC",
        SELECT_PRODUCT
    ))
    .bind(identity_hash)
    .fetch_all(&mut *conn)
    .await
}

pub async fn update_product(
    conn: &mut PgConnection,
    product_id: Uuid,
    draft: &ProductDraft,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE mkisan_products SET
            product_name = $2, product_type = $3, category = $4, quantity = $5,
            price_per_unit = $6, location = $7, description = $8, updated_at = now()
         WHERE product_id = $1",
    )
    .bind(product_id)
    .bind(&draft.product_name)
    .bind(&draft.product_type)
    .bind(&draft.category)
    .bind(&draft.quantity)
    .bind(draft.price_per_unit)
    .bind(draft.location.as_deref())
    .bind(draft.description.as_deref())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn delete_product(conn: &mut PgConnection, product_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM mkisan_products WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Records a CONFIRMED purchase priced from the listing at the time of purchase.
pub async fn insert_purchase(
    conn: &mut PgConnection,
    mkisan_provider_id: Uuid,
    product: &ProductRow,
    quantity: f64,
    notes: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO mkisan_purchases
            (purchase_id, mkisan_provider_id, product_id, product_name, quantity,
             price_per_unit, total_price, status, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING purchase_id",
    )
    .bind(Uuid::new_v4())
    .bind(mkisan_provider_id)
    .bind(product.product_id)
    .bind(&product.product_name)
    .bind(quantity)
    .bind(product.price_per_unit)
    .bind(quantity * product.price_per_unit)
    .bind(PURCHASE_CONFIRMED)
    .bind(notes)
    .fetch_one(&mut *conn)
    .await
}

pub async fn find_purchase(conn: &mut PgConnection, purchase_id: Uuid) -> Result<Option<PurchaseRow>, sqlx::Error> {
    sqlx::query_as::<_, PurchaseRow>(&format!("{} WHERE pu.purchase_id = $1", SELECT_PURCHASE))
        .bind(purchase_id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_purchases(
    conn: &mut PgConnection,
    mkisan_provider_id: Uuid,
) -> Result<Vec<PurchaseRow>, sqlx::Error> {
    sqlx::query_as::<_, PurchaseRow>(&format!(
        "{} WHERE pu.mkisan_provider_id = $1 ORDER BY pu.purchased_at DESC",
        SELECT_PURCHASE
    ))
    .bind(mkisan_provider_id)
    .fetch_all(&mut *conn)
    .await
}
