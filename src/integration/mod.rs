use std::env;
use std::str::FromStr;
use std::time::Duration;
use std::{fs::File, net::SocketAddr};

use axum::http::{HeaderValue, Method, header};
use dotenv::dotenv;
use log::{LevelFilter, warn};
use simplelog::{
    ColorChoice, CombinedLogger, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod db;
pub mod stream;

const DEFAULT_PORT: u16 = 8000;
const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5173"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Env {
    #[default]
    Local,
    Dev,
    Stage,
    Production,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Env::Local),
            "dev" => Ok(Env::Dev),
            "stg" => Ok(Env::Stage),
            "prod" => Ok(Env::Production),
            other => Err(format!("Invalid environment: {other}")),
        }
    }
}

impl Env {
    /// Loopback only when running locally. `PORT` overrides the port.
    pub fn addr(&self) -> SocketAddr {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        match self {
            Env::Local => SocketAddr::from(([127, 0, 0, 1], port)),
            Env::Dev | Env::Stage | Env::Production => SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }

    /// Browser origins allowed to call the API with the session cookie.
    pub fn allowed_origins(&self) -> Vec<HeaderValue> {
        match self {
            Env::Local | Env::Dev => DEV_ORIGINS.into_iter().map(HeaderValue::from_static).collect(),
            Env::Stage | Env::Production => {
                let raw = env::var("ALLOW_ORIGIN").unwrap_or_default();
                parse_origins(&raw)
            }
        }
    }

    pub fn cors(&self) -> CorsLayer {
        let origins = self.allowed_origins();
        if origins.is_empty() {
            warn!("No CORS origins configured for {self:?}, browsers will be rejected");
        }

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Skipping invalid ALLOW_ORIGIN value '{o}': {e}");
                None
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct Config {
    pub env: Env,

    pub mongo: db::Config,
    pub stream: stream::Config,

    pub jwt_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        dotenv().ok();
        init_logger();

        let env = match env::var("ENV") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| panic!("{e}")),
            Err(_) => Env::default(),
        };

        Self {
            env,
            mongo: db::Config::env().unwrap_or_default(),
            stream: stream::Config::env().expect("STREAM_API_KEY and STREAM_API_SECRET must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
        }
    }
}

/// Terminal plus `<SERVICE_NAME>.log`, level from `RUST_LOG`.
fn init_logger() {
    let level = env::var("RUST_LOG")
        .ok()
        .and_then(|l| LevelFilter::from_str(&l).ok())
        .unwrap_or(LevelFilter::Info);
    let log_file = format!(
        "{}.log",
        env::var("SERVICE_NAME").unwrap_or_else(|_| "campus_service".into())
    );

    let term: Box<dyn SharedLogger> = TermLogger::new(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    let loggers: Vec<Box<dyn SharedLogger>> = match File::create(&log_file) {
        Ok(file) => vec![
            term,
            WriteLogger::new(level, simplelog::Config::default(), file),
        ],
        Err(e) => {
            eprintln!("Logging to terminal only, cannot create {log_file}: {e}");
            vec![term]
        }
    };

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Logger already initialized: {e}");
    }
}

/// Client for the chat provider. Remote calls are bounded so a slow
/// provider fails the request instead of holding it.
pub fn init_http_client() -> reqwest::Client {
    match reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(2))
        .timeout(Duration::from_secs(5))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => panic!("Failed to initialize HTTP client: {e}"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_parse_env_names() {
        assert_eq!("local".parse::<Env>(), Ok(Env::Local));
        assert_eq!("dev".parse::<Env>(), Ok(Env::Dev));
        assert_eq!("stg".parse::<Env>(), Ok(Env::Stage));
        assert_eq!("prod".parse::<Env>(), Ok(Env::Production));
        assert!("production".parse::<Env>().is_err());
    }

    #[test]
    fn should_allow_dev_servers_locally() {
        let origins = Env::Local.allowed_origins();
        let origins = origins.iter().map(|o| o.to_str().unwrap()).collect::<Vec<_>>();

        assert_eq!(origins, vec!["http://localhost:3000", "http://localhost:5173"]);
    }

    #[test]
    fn should_skip_blank_and_invalid_origins() {
        let origins =
            parse_origins("https://campus.example, ,https://bad\norigin,https://app.example");
        let origins = origins.iter().map(|o| o.to_str().unwrap()).collect::<Vec<_>>();

        assert_eq!(origins, vec!["https://campus.example", "https://app.example"]);
    }
}
