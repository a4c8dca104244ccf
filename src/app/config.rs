use crate::app::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub http_bind: String,
    pub http_workers: Option<usize>,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_workers = match non_blank(&lookup, "HTTP_WORKERS") {
            Some(raw) => Some(
                raw.parse::<usize>()
                    .ok()
                    .filter(|workers| *workers > 0)
                    .ok_or_else(|| AppError::config("HTTP_WORKERS must be a valid number"))?,
            ),
            None => None,
        };

        Ok(Self {
            db_path: non_blank(&lookup, "DB_PATH")
                .unwrap_or_else(|| "/var/lib/weather/weather.db".to_string()),
            http_bind: non_blank(&lookup, "HTTP_BIND").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            http_workers,
            cors_allowed_origin: non_blank(&lookup, "CORS_ALLOWED_ORIGIN"),
        })
    }
}

fn non_blank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
