use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Context};
use tracing::{info, warn};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_HOST_NAME: &str = "http://localhost:3000";
/// No font ships with the server, so this path usually does not exist and
/// the shopping list is drawn in built-in Helvetica (Latin-1 only). Point
/// `SHOPPING_LIST_FONT` at a Unicode TTF to print Cyrillic names.
const DEFAULT_FONT_PATH: &str = "static/fonts/DejaVuSans.ttf";

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Public origin used to build short links and redirect targets.
    pub host_name: String,
    /// TTF for the shopping-list PDF. A missing file falls back to Helvetica.
    pub font_path: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        Ok(Self {
            database_url,
            bind_addr: try_load("BIND_ADDR", DEFAULT_BIND_ADDR)?,
            host_name: try_load::<String>("HOST_NAME", DEFAULT_HOST_NAME)?
                .trim_end_matches('/')
                .to_string(),
            font_path: try_load("SHOPPING_LIST_FONT", DEFAULT_FONT_PATH)?,
        })
    }

    /// Settings for tests and tooling that never read the environment.
    pub fn for_host(database_url: &str, host_name: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            host_name: host_name.trim_end_matches('/').to_string(),
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow!("invalid {key} value {raw:?}: {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use potluck_core::{render_shopping_list, ShoppingItem, ShoppingList};

    #[test]
    fn test_for_host_trims_trailing_slash() {
        let config = Config::for_host("postgres://localhost/potluck", "https://food.example/");
        assert_eq!(config.host_name, "https://food.example");
    }

    #[test]
    fn test_default_font_may_be_missing() {
        let config = Config::for_host("postgres://localhost/potluck", "https://food.example");
        assert!(!config.font_path.exists());

        let list = ShoppingList {
            recipes: vec!["Борщ".to_string()],
            items: vec![ShoppingItem {
                name: "свёкла".to_string(),
                unit: "г".to_string(),
                amount: 300,
            }],
        };
        let pdf = render_shopping_list(&list, Some(config.font_path.as_path())).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_try_load_uses_default_when_unset() {
        let addr: SocketAddr = try_load("POTLUCK_TEST_UNSET_ADDR", "127.0.0.1:8080").unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_try_load_rejects_bad_default() {
        let result = try_load::<SocketAddr>("POTLUCK_TEST_UNSET_ADDR", "not an address");
        assert!(result.is_err());
    }
}
