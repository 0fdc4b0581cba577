use crate::AppResult;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub claim_secret: String,
    pub bind_addr: String,
    pub upload_dir: String,
}

impl Config {
    /// Reads process configuration once at startup. `.env` values are folded
    /// into the environment first.
    pub fn from_env() -> AppResult<Config> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: dotenv::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://whisperpair.db?mode=rwc".to_owned()),
            claim_secret: dotenv::var("CLAIM_SECRET")
                .map_err(|_| anyhow::anyhow!("CLAIM_SECRET must be set"))?,
            bind_addr: dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            upload_dir: dotenv::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_owned()),
        })
    }
}
