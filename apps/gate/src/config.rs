use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;

use crate::routing::RouteTable;

const DEFAULT_API_BASE_URL: &str = "https://api.profresume.com/api";
const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SIGN_OUT_GRACE_MS: u64 = 150;

/// Deployment environment. Gates HTTPS enforcement and default log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "test" => Ok(Environment::Development),
            other => Err(anyhow!("unknown APP_ENV '{other}'")),
        }
    }
}

/// Which product application this gate instance fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppKind {
    Editor,
    Interview,
    Admin,
    Landing,
}

impl AppKind {
    /// Route lists each application shipped with.
    pub fn preset_routes(self) -> RouteTable {
        match self {
            AppKind::Editor => RouteTable::new(
                ["/cover-letter/templates"],
                [
                    "/",
                    "/editor",
                    "/cover-letter",
                    "/tailor",
                    "/ats-check",
                    "/subscription",
                ],
            ),
            AppKind::Interview => {
                RouteTable::new(Vec::<String>::new(), ["/", "/session", "/reports"])
            }
            AppKind::Admin => RouteTable::new(
                Vec::<String>::new(),
                [
                    "/",
                    "/users",
                    "/templates",
                    "/cover-letters",
                    "/blog",
                    "/interviews",
                    "/plans",
                    "/features",
                    "/analytics",
                    "/settings",
                ],
            ),
            AppKind::Landing => RouteTable::default(),
        }
    }
}

impl FromStr for AppKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "editor" => Ok(AppKind::Editor),
            "interview" => Ok(AppKind::Interview),
            "admin" => Ok(AppKind::Admin),
            "landing" => Ok(AppKind::Landing),
            other => Err(anyhow!("unknown GATE_APP '{other}'")),
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppKind::Editor => "editor",
            AppKind::Interview => "interview",
            AppKind::Admin => "admin",
            AppKind::Landing => "landing",
        };
        f.write_str(name)
    }
}

/// Gate configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppKind,
    pub environment: Environment,
    /// Central sign-in application. Parsed once so redirect building cannot fail.
    pub auth_origin: Url,
    /// Public origin of the application behind this gate.
    pub self_origin: String,
    pub upstream_url: String,
    pub api_base_url: String,
    /// Parent domain the `token` cookie is scoped to, e.g. `.profresume.com`.
    pub cookie_domain: Option<String>,
    pub routes: RouteTable,
    pub verify_timeout: Duration,
    pub sign_out_grace: Duration,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source. `from_env` passes the process environment.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            var(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let app: AppKind = require("GATE_APP")?.parse()?;
        let environment = match var("APP_ENV") {
            Some(value) => value.parse()?,
            None => Environment::Development,
        };

        let auth_origin = parse_origin("AUTH_ORIGIN", &require("AUTH_ORIGIN")?)?;
        let self_origin = parse_origin("SELF_ORIGIN", &require("SELF_ORIGIN")?)?;
        let upstream_url = parse_origin("UPSTREAM_URL", &require("UPSTREAM_URL")?)?;

        let preset = app.preset_routes();
        let routes = RouteTable::new(
            var("PUBLIC_ROUTES")
                .map(|v| parse_route_list(&v))
                .unwrap_or_else(|| preset.public().to_vec()),
            var("PROTECTED_ROUTES")
                .map(|v| parse_route_list(&v))
                .unwrap_or_else(|| preset.protected().to_vec()),
        );

        Ok(Config {
            app,
            environment,
            auth_origin,
            self_origin: self_origin.as_str().trim_end_matches('/').to_string(),
            upstream_url: upstream_url.as_str().trim_end_matches('/').to_string(),
            api_base_url: var("API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            cookie_domain: var("COOKIE_DOMAIN").filter(|d| !d.trim().is_empty()),
            routes,
            verify_timeout: Duration::from_millis(parse_number(
                &var,
                "VERIFY_TIMEOUT_MS",
                DEFAULT_VERIFY_TIMEOUT_MS,
            )?),
            sign_out_grace: Duration::from_millis(parse_number(
                &var,
                "SIGN_OUT_GRACE_MS",
                DEFAULT_SIGN_OUT_GRACE_MS,
            )?),
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
        })
    }
}

fn parse_origin(key: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value.trim()).with_context(|| format!("{key} must be an absolute URL"))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        bail!("{key} must be an http(s) URL with a host");
    }
    Ok(url)
}

fn parse_number(var: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match var(key) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of milliseconds")),
        None => Ok(default),
    }
}

/// Splits a comma-separated route list, e.g. `/,/editor,/tailor`.
pub fn parse_route_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("GATE_APP", "editor"),
        ("AUTH_ORIGIN", "https://auth.example.com"),
        ("SELF_ORIGIN", "https://edit.example.com/"),
        ("UPSTREAM_URL", "http://127.0.0.1:3000"),
    ];

    #[test]
    fn test_defaults_with_required_only() {
        let config = Config::from_vars(vars(REQUIRED)).unwrap();
        assert_eq!(config.app, AppKind::Editor);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.self_origin, "https://edit.example.com");
        assert_eq!(config.upstream_url, "http://127.0.0.1:3000");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.routes, AppKind::Editor.preset_routes());
        assert_eq!(config.verify_timeout, Duration::from_millis(10_000));
        assert_eq!(config.port, 8080);
        assert!(config.cookie_domain.is_none());
    }

    #[test]
    fn test_missing_required_variable() {
        let err = Config::from_vars(vars(&REQUIRED[..3])).unwrap_err();
        assert!(err.to_string().contains("UPSTREAM_URL"));
    }

    #[test]
    fn test_route_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PROTECTED_ROUTES", "/dashboard, /billing,,"));
        pairs.push(("PUBLIC_ROUTES", "/dashboard/demo"));
        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert_eq!(config.routes.protected(), ["/dashboard", "/billing"]);
        assert_eq!(config.routes.public(), ["/dashboard/demo"]);
    }

    #[test]
    fn test_rejects_relative_auth_origin() {
        let mut pairs = REQUIRED.to_vec();
        pairs[1] = ("AUTH_ORIGIN", "/signin");
        assert!(Config::from_vars(vars(&pairs)).is_err());
    }

    #[test]
    fn test_environment_and_app_parsing() {
        assert_eq!("PRODUCTION".parse::<Environment>().unwrap(), Environment::Production);
        assert!("staging".parse::<Environment>().is_err());
        assert_eq!("Admin".parse::<AppKind>().unwrap(), AppKind::Admin);
        assert_eq!(AppKind::Interview.to_string(), "interview");
        assert!(AppKind::Landing.preset_routes().protected().is_empty());
    }
}
