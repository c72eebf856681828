// src/bin/seed.rs
//
// Creates the schema and inserts the default admins plus a few sample citizens.

use chrono::NaiveDate;
use jansetu_platform::crypto::{hash_identity, hash_password};
use jansetu_platform::infra::logging;
use jansetu_platform::storage::repo::{admins, citizens};
use jansetu_platform::{Config, DatabaseService};

struct SeedAdmin {
    username: &'static str,
    password: &'static str,
    full_name: &'static str,
    email: &'static str,
}

struct SeedCitizen {
    identity: &'static str,
    full_name: &'static str,
    phone: &'static str,
    gender: &'static str,
    date_of_birth: (i32, u32, u32),
    address: &'static str,
    kisan_id: Option<&'static str>,
}

const ADMINS: &[SeedAdmin] = &[
    SeedAdmin {
        username: "admin",
        password: "admin123",
        full_name: "Platform Administrator",
        email: "admin@jansetu.gov.in",
    },
    SeedAdmin {
        username: "admin2",
        password: "admin456",
        full_name: "Second Administrator",
        email: "admin2@jansetu.gov.in",
    },
];

const CITIZENS: &[SeedCitizen] = &[
    SeedCitizen {
        identity: "123456789012",
        full_name: "Ramesh Kumar",
        phone: "9876543210",
        gender: "MALE",
        date_of_birth: (1985, 3, 12),
        address: "Village Rampur, District Sitapur, Uttar Pradesh",
        kisan_id: Some("KISAN-UP-0001"),
    },
    SeedCitizen {
        identity: "234567890123",
        full_name: "Sunita Devi",
        phone: "9876501234",
        gender: "FEMALE",
        date_of_birth: (1990, 7, 25),
        address: "Ward 4, Hajipur, Bihar",
        kisan_id: Some("KISAN-BR-0002"),
    },
    SeedCitizen {
        identity: "345678901234",
        full_name: "Dr. Anil Sharma",
        phone: "9812345678",
        gender: "MALE",
        date_of_birth: (1978, 11, 2),
        address: "Civil Lines, Jaipur, Rajasthan",
        kisan_id: None,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(config.log_format);

    let db = DatabaseService::new(&config).await?;
    let mut tx = db.begin().await?;

    for admin in ADMINS {
        let admin_id = admins::upsert(
            &mut tx,
            admin.username,
            &hash_password(admin.password),
            admin.full_name,
            Some(admin.email),
        )
        .await?;
        tracing::info!(username = admin.username, %admin_id, "admin seeded");
    }

    for citizen in CITIZENS {
        let (y, m, d) = citizen.date_of_birth;
        let date_of_birth = NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| anyhow::anyhow!("invalid seed date of birth for {}", citizen.full_name))?;
        citizens::upsert_seed(
            &mut tx,
            &hash_identity(&config.identity_hash_salt, citizen.identity),
            citizen.full_name,
            citizen.phone,
            citizen.gender,
            date_of_birth,
            citizen.address,
            citizen.kisan_id,
        )
        .await?;
        tracing::info!(name = citizen.full_name, "citizen seeded");
    }

    tx.commit().await?;
    tracing::info!(admins = ADMINS.len(), citizens = CITIZENS.len(), "seed complete");
    Ok(())
}
