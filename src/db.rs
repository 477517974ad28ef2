//! Database connection management
//!
//! Builds the connection pool and prepares the schema at startup.

pub mod users;

use crate::auth::{hash_password, Role};
use crate::config::DatabaseConfig;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{info, warn};
use uuid::Uuid;

/// Create the application pool from configuration and verify connectivity.
pub async fn init_pool(config: &DatabaseConfig) -> anyhow::Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(config.max_pool_size));

    let pool = if config.use_tls {
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| anyhow::anyhow!("Failed to create TLS pool: {}", e))?
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| anyhow::anyhow!("Failed to create pool: {}", e))?
    };

    // Verify the connection before the server starts accepting requests
    let client = pool
        .get()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to get pool connection: {}", e))?;
    client
        .query_one("SELECT 1 AS ok", &[])
        .await
        .map_err(|e| anyhow::anyhow!("Failed to verify database connection: {}", e))?;

    info!("Database connection verified (TLS: {})", config.use_tls);
    Ok(pool)
}

/// Create the schema if it does not exist and seed the first admin account.
pub async fn init_schema(pool: &Pool) -> anyhow::Result<()> {
    let client = pool.get().await?;

    client
        .batch_execute(
            "DO $$ BEGIN
                CREATE TYPE user_role AS ENUM ('employee', 'manager', 'admin');
            EXCEPTION WHEN duplicate_object THEN NULL;
            END $$;

            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                full_name TEXT,
                role user_role NOT NULL DEFAULT 'employee',
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );

            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);",
        )
        .await?;

    seed_admin(&client).await?;

    info!("Database schema initialized");
    Ok(())
}

/// Seed a first admin account when the users table is empty, so a fresh
/// deployment has a way to log in.
async fn seed_admin(client: &deadpool_postgres::Client) -> anyhow::Result<()> {
    let row = client.query_one("SELECT COUNT(*) FROM users", &[]).await?;
    let count: i64 = row.get(0);
    if count > 0 {
        return Ok(());
    }

    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        warn!("ADMIN_PASSWORD not set, seeding admin with the default password (change it!)");
        "admin123".to_string()
    });

    let now = chrono::Utc::now();
    client
        .execute(
            "INSERT INTO users (id, email, username, password_hash, full_name, role, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            &[
                &Uuid::new_v4(),
                &"admin@timeclock.local",
                &"admin",
                &hash_password(&password)?,
                &Some("Administrator".to_string()),
                &Role::Admin,
                &true,
                &now,
                &now,
            ],
        )
        .await?;

    info!("Seeded initial admin account (admin@timeclock.local)");
    Ok(())
}
