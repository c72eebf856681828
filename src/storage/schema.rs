//! Platform tables. Every statement is idempotent so the schema can be applied on each start.

use sqlx::PgPool;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        user_id BIGSERIAL PRIMARY KEY,
        identity_hash TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL CHECK (role IN ('CITIZEN', 'SERVICE_PROVIDER', 'ADMIN')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        last_login_at TIMESTAMPTZ
    )",
    "CREATE TABLE IF NOT EXISTS admins (
        admin_id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        full_name TEXT NOT NULL,
        email TEXT,
        user_id BIGINT UNIQUE REFERENCES users(user_id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS citizens (
        citizen_id UUID PRIMARY KEY,
        identity_hash TEXT NOT NULL UNIQUE,
        full_name TEXT,
        phone TEXT,
        gender TEXT CHECK (gender IN ('MALE', 'FEMALE', 'OTHER')),
        date_of_birth DATE,
        address TEXT,
        kisan_id TEXT UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS service_providers (
        service_provider_id UUID PRIMARY KEY,
        identity_hash TEXT NOT NULL UNIQUE,
        full_name TEXT,
        phone TEXT,
        gender TEXT,
        date_of_birth DATE,
        address TEXT,
        organization_name TEXT,
        registration_number TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS sp_registration_requests (
        request_id UUID PRIMARY KEY,
        service_provider_id UUID NOT NULL REFERENCES service_providers(service_provider_id),
        request_type TEXT NOT NULL CHECK (request_type IN ('ESANJEEVANI', 'MKISAN')),
        status TEXT NOT NULL CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED', 'CHANGES_REQUESTED')),
        service_identifier TEXT NOT NULL,
        organization_name TEXT,
        registration_number TEXT,
        provider_type TEXT,
        specialization TEXT,
        years_of_experience INTEGER,
        provider_category TEXT,
        business_license TEXT,
        gst_number TEXT,
        years_in_business INTEGER,
        assigned_admin_id UUID REFERENCES admins(admin_id),
        reviewed_by UUID REFERENCES admins(admin_id),
        reviewed_at TIMESTAMPTZ,
        admin_comments TEXT,
        rejection_reason TEXT,
        submitted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (service_provider_id, request_type)
    )",
    "CREATE INDEX IF NOT EXISTS idx_sp_registration_requests_status
        ON sp_registration_requests(status)",
    "CREATE TABLE IF NOT EXISTS services (
        service_id UUID PRIMARY KEY,
        service_identifier TEXT NOT NULL UNIQUE,
        service_provider_id UUID NOT NULL REFERENCES service_providers(service_provider_id),
        category TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('ACTIVE', 'INACTIVE')),
        request_id UUID REFERENCES sp_registration_requests(request_id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "ALTER TABLE services ADD COLUMN IF NOT EXISTS name TEXT",
    "ALTER TABLE services ADD COLUMN IF NOT EXISTS description TEXT",
    "ALTER TABLE services ADD COLUMN IF NOT EXISTS base_url TEXT",
    "CREATE TABLE IF NOT EXISTS service_onboarding_requests (
        onboarding_id UUID PRIMARY KEY,
        service_provider_id UUID NOT NULL REFERENCES service_providers(service_provider_id),
        name TEXT NOT NULL,
        description TEXT,
        base_url TEXT,
        category TEXT NOT NULL,
        service_identifier TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED', 'CHANGES_REQUESTED')),
        admin_notes TEXT,
        reviewed_by UUID REFERENCES admins(admin_id),
        reviewed_at TIMESTAMPTZ,
        service_id UUID REFERENCES services(service_id),
        submitted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_onboarding_open_identifier
        ON service_onboarding_requests(service_identifier)
        WHERE status IN ('PENDING', 'CHANGES_REQUESTED')",
    "CREATE TABLE IF NOT EXISTS esanjeevani_providers (
        esanjeevani_provider_id UUID PRIMARY KEY,
        service_provider_id UUID NOT NULL UNIQUE REFERENCES service_providers(service_provider_id),
        provider_type TEXT NOT NULL,
        specialization TEXT NOT NULL,
        years_of_experience INTEGER,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS mkisan_providers (
        mkisan_provider_id UUID PRIMARY KEY,
        service_provider_id UUID NOT NULL UNIQUE REFERENCES service_providers(service_provider_id),
        provider_category TEXT NOT NULL CHECK (provider_category IN ('BUYER')),
        business_license TEXT,
        gst_number TEXT,
        years_in_business INTEGER,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS consultation_requests (
        consultation_id UUID PRIMARY KEY,
        citizen_id UUID NOT NULL REFERENCES citizens(citizen_id),
        esanjeevani_provider_id UUID NOT NULL REFERENCES esanjeevani_providers(esanjeevani_provider_id),
        appointment_date DATE NOT NULL,
        appointment_time TIME NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED')),
        symptoms TEXT,
        medical_history TEXT,
        rejection_reason TEXT,
        provider_notes TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_consultation_slot
        ON consultation_requests(esanjeevani_provider_id, appointment_date, appointment_time)
        WHERE status <> 'REJECTED'",
    "CREATE TABLE IF NOT EXISTS mkisan_sellers (
        mkisan_citizen_id UUID PRIMARY KEY,
        citizen_id UUID NOT NULL UNIQUE REFERENCES citizens(citizen_id),
        kisan_id TEXT NOT NULL,
        land_area DOUBLE PRECISION,
        land_unit TEXT,
        primary_crop TEXT,
        district TEXT,
        state TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS mkisan_products (
        product_id UUID PRIMARY KEY,
        mkisan_citizen_id UUID NOT NULL REFERENCES mkisan_sellers(mkisan_citizen_id) ON DELETE CASCADE,
        product_name TEXT NOT NULL,
        product_type TEXT NOT NULL,
        category TEXT NOT NULL,
        quantity TEXT NOT NULL,
        price_per_unit DOUBLE PRECISION NOT NULL,
        location TEXT,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS idx_mkisan_products_category ON mkisan_products(category)",
    "CREATE INDEX IF NOT EXISTS idx_mkisan_products_product_type ON mkisan_products(product_type)",
    "CREATE TABLE IF NOT EXISTS mkisan_purchases (
        purchase_id UUID PRIMARY KEY,
        mkisan_provider_id UUID NOT NULL REFERENCES mkisan_providers(mkisan_provider_id),
        product_id UUID REFERENCES mkisan_products(product_id) ON DELETE SET NULL,
        product_name TEXT NOT NULL,
        quantity DOUBLE PRECISION NOT NULL,
        price_per_unit DOUBLE PRECISION NOT NULL,
        total_price DOUBLE PRECISION NOT NULL,
        status TEXT NOT NULL,
        notes TEXT,
        purchased_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS user_activity_logs (
        activity_id UUID PRIMARY KEY,
        citizen_id UUID NOT NULL REFERENCES citizens(citizen_id),
        activity_type TEXT NOT NULL,
        activity_description TEXT NOT NULL,
        entity_type TEXT,
        entity_id TEXT,
        metadata JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS idx_user_activity_logs_citizen
        ON user_activity_logs(citizen_id, created_at DESC)",
    "CREATE TABLE IF NOT EXISTS otp_codes (
        otp_id UUID PRIMARY KEY,
        identity_hash TEXT NOT NULL UNIQUE,
        code TEXT NOT NULL,
        attempts INTEGER NOT NULL DEFAULT 0,
        expires_at TIMESTAMPTZ NOT NULL
    )",
];

/// Creates any missing tables and indexes.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
