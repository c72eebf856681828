use crate::storage::repo::citizens::CitizenRow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct ServiceProviderRow {
    #[schema(value_type = String)]
    pub service_provider_id: Uuid,
    #[serde(skip_serializing)]
    pub identity_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    #[schema(value_type = Option<String>)]
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub organization_name: Option<String>,
    pub registration_number: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// An approved e-Sanjeevani provider as shown to citizens.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, ToSchema)]
pub struct EsanjeevaniProviderView {
    #[schema(value_type = String)]
    pub esanjeevani_provider_id: Uuid,
    #[schema(value_type = String)]
    pub service_provider_id: Uuid,
    pub full_name: Option<String>,
    pub specialization: String,
    pub provider_type: String,
    pub years_of_experience: Option<i32>,
    pub phone: Option<String>,
}

const SP_COLUMNS: &str = "service_provider_id, identity_hash, full_name, phone, gender, date_of_birth, \
                          address, organization_name, registration_number, created_at";

const ESANJEEVANI_VIEW: &str = "SELECT esp.esanjeevani_provider_id, esp.service_provider_id, sp.full_name,
            esp.specialization, esp.provider_type, esp.years_of_experience, sp.phone
     FROM esanjeevani_providers esp
     JOIN service_providers sp ON sp.service_provider_id = esp.service_provider_id
     JOIN services s ON s.service_provider_id = esp.service_provider_id
          AND s.category = 'ESANJEEVANI' AND s.status = 'ACTIVE'";

pub async fn find_by_identity(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> Result<Option<ServiceProviderRow>, sqlx::Error> {
    sqlx::query_as::<_, ServiceProviderRow>(&format!(
        "SELECT {} FROM service_providers WHERE identity_hash = $1",
        SP_COLUMNS
    ))
    .bind(identity_hash)
    .fetch_optional(&mut *conn)
    .await
}

/// Creates the provider record from the citizen's demographic fields.
pub async fn create_from_citizen(
    conn: &mut PgConnection,
    citizen: &CitizenRow,
    organization_name: Option<&str>,
    registration_number: Option<&str>,
) -> Result<ServiceProviderRow, sqlx::Error> {
    sqlx::query_as::<_, ServiceProviderRow>(&format!(
        "INSERT INTO service_providers
            (service_provider_id, identity_hash, full_name, phone, gender, date_of_birth, address,
             organization_name, registration_number)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {}",
        SP_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&citizen.identity_hash)
    .bind(citizen.full_name.as_deref())
    .bind(citizen.phone.as_deref())
    .bind(citizen.gender.as_deref())
    .bind(citizen.date_of_birth)
    .bind(citizen.address.as_deref())
    .bind(organization_name)
    .bind(registration_number)
    .fetch_one(&mut *conn)
    .await
}

pub async fn upsert_esanjeevani(
    conn: &mut PgConnection,
    service_provider_id: Uuid,
    provider_type: &str,
    specialization: &str,
    years_of_experience: Option<i32>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO esanjeevani_providers
            (esanjeevani_provider_id, service_provider_id, provider_type, specialization, years_of_experience)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (service_provider_id) DO UPDATE
            SET provider_type = EXCLUDED.provider_type,
                specialization = EXCLUDED.specialization,
                years_of_experience = EXCLUDED.years_of_experience
         RETURNING esanjeevani_provider_id",
    )
    .bind(Uuid::new_v4())
    .bind(service_provider_id)
    .bind(provider_type)
    .bind(specialization)
    .bind(years_of_experience)
    .fetch_one(&mut *conn)
    .await
}

pub async fn upsert_mkisan(
    conn: &mut PgConnection,
    service_provider_id: Uuid,
    provider_category: &str,
    business_license: Option<&str>,
    gst_number: Option<&str>,
    years_in_business: Option<i32>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO mkisan_providers
            (mkisan_provider_id, service_provider_id, provider_category, business_license,
             gst_number, years_in_business)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (service_provider_id) DO UPDATE
            SET provider_category = EXCLUDED.provider_category,
                business_license = EXCLUDED.business_license,
                gst_number = EXCLUDED.gst_number,
                years_in_business = EXCLUDED.years_in_business
         RETURNING mkisan_provider_id",
    )
    .bind(Uuid::new_v4())
    .bind(service_provider_id)
    .bind(provider_category)
    .bind(business_license)
    .bind(gst_number)
    .bind(years_in_business)
    .fetch_one(&mut *conn)
    .await
}

pub async fn list_active_esanjeevani(conn: &mut PgConnection) -> Result<Vec<EsanjeevaniProviderView>, sqlx::Error> {
    sqlx::query_as::<_, EsanjeevaniProviderView>(&format!("{} ORDER BY sp.full_name", ESANJEEVANI_VIEW))
        .fetch_all(&mut *conn)
        .await
}

pub async fn find_active_esanjeevani(
    conn: &mut PgConnection,
    esanjeevani_provider_id: Uuid,
) -> Result<Option<EsanjeevaniProviderView>, sqlx::Error> {
    sqlx::query_as::<_, EsanjeevaniProviderView>(&format!(
        "{} WHERE esp.esanjeevani_provider_id = $1",
        ESANJEEVANI_VIEW
    ))
    .bind(esanjeevani_provider_id)
    .fetch_optional(&mut *conn)
    .await
}

/// The e-Sanjeevani provider id owned by `identity_hash`, active or not.
pub async fn esanjeevani_id_for_identity(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT esp.esanjeevani_provider_id
         FROM esanjeevani_providers esp
         JOIN service_providers sp ON sp.service_provider_id = esp.service_provider_id
         WHERE sp.identity_hash = $1",
    )
    .bind(identity_hash)
    .fetch_optional(&mut *conn)
    .await
}

/// The mKisan provider id owned by `identity_hash`, active or not.
pub async fn mkisan_id_for_identity(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT mp.mkisan_provider_id
         FROM mkisan_providers mp
         JOIN service_providers sp ON sp.service_provider_id = mp.service_provider_id
         WHERE sp.identity_hash = $1",
    )
    .bind(identity_hash)
    .fetch_optional(&mut *conn)
    .await
}

/// The mKisan provider id owned by `identity_hash`, only while its service is ACTIVE.
pub async fn active_mkisan_id_for_identity(
    conn: &mut PgConnection,
    identity_hash: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT mp.mkisan_provider_id
         FROM mkisan_providers mp
         JOIN service_providers sp ON sp.service_provider_id = mp.service_provider_id
         JOIN services s ON s.service_provider_id = mp.service_provider_id
              AND s.category = 'MKISAN' AND s.status = 'ACTIVE'
         WHERE sp.identity_hash = $1",
    )
    .bind(identity_hash)
    .fetch_optional(&mut *conn)
    .await
}
