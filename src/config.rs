use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Storage API root, e.g. `https://<project>.supabase.co/storage/v1`.
    pub base_url: String,
    /// Base used when resolving public URLs; defaults to `base_url`.
    pub public_base_url: String,
    pub bucket: String,
    pub service_key: String,
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub upload_concurrency: usize,
    pub phase_timeout_secs: u64,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let storage_base = env_or("STORAGE_URL", "http://localhost:54321/storage/v1");
        Self {
            port: env_or_parse("PORT", 3000),
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:3000,http://localhost:8080")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            db: DbConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or_parse("DB_PORT", 5432),
                database: env_or("DB_NAME", "campus_clash"),
                user: env_or("DB_USER", "campus_admin"),
                password: env_or("DB_PASSWORD", ""),
                pool_min: env_or_parse("DB_POOL_MIN", 5),
                pool_max: env_or_parse("DB_POOL_MAX", 50),
                acquire_timeout_secs: env_or_parse("DB_ACQUIRE_TIMEOUT", 10),
            },
            jwt: JwtConfig {
                secret: env_or("JWT_SECRET", "change-me-to-a-secure-random-string"),
            },
            storage: StorageConfig {
                public_base_url: env_or("STORAGE_PUBLIC_URL", &storage_base),
                base_url: storage_base,
                bucket: env_or("STORAGE_BUCKET", "registrations"),
                service_key: env_or("STORAGE_SERVICE_KEY", ""),
            },
            pipeline: PipelineConfig {
                upload_concurrency: env_or_parse("UPLOAD_CONCURRENCY", 3),
                phase_timeout_secs: env_or_parse("PHASE_TIMEOUT_SECS", 30),
            },
        }
    }

    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.db.host, self.db.port, self.db.database
        )
    }
}
