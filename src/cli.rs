//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::ADMIN_AUTHORITY;
use crate::db::Database;
use crate::password::hash_password;
use clap::Parser;
use rand::Rng;
use std::net::IpAddr;
use std::num::NonZeroU32;
use tracing::{error, info};

const MIN_SECRET_LENGTH: usize = 32;

const GENERATED_PASSWORD_LENGTH: usize = 24;

/// Permission granted to the bootstrap admin role.
pub const USER_READ_PERMISSION: &str = "USER_READ";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Header set by a trusted reverse proxy carrying the client address.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientIpHeader {
    /// `X-Forwarded-For`, last entry (the one appended by the proxy)
    XForwardFor,
    /// `X-Real-IP`
    XRealIp,
    /// `CF-Connecting-IP`
    CfConnectingIp,
}

/// Reads the client IP from a proxy header.
#[derive(Clone, Copy, Debug)]
pub struct IpExtractor {
    pub header_name: &'static str,
    parse: fn(&str) -> Result<String, &'static str>,
}

impl IpExtractor {
    pub fn extract(&self, header_value: &str) -> Result<String, &'static str> {
        (self.parse)(header_value)
    }
}

fn parse_ip(value: &str) -> Result<String, &'static str> {
    value
        .trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| "IP header does not contain a valid address")
}

fn parse_forwarded_for(value: &str) -> Result<String, &'static str> {
    let last = value.rsplit(',').next().ok_or("IP header is empty")?;
    parse_ip(last)
}

impl From<ClientIpHeader> for IpExtractor {
    fn from(header: ClientIpHeader) -> Self {
        match header {
            ClientIpHeader::XForwardFor => Self {
                header_name: "x-forwarded-for",
                parse: parse_forwarded_for,
            },
            ClientIpHeader::XRealIp => Self {
                header_name: "x-real-ip",
                parse: parse_ip,
            },
            ClientIpHeader::CfConnectingIp => Self {
                header_name: "cf-connecting-ip",
                parse: parse_ip,
            },
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "blog-api", about = "Blog API with bearer-token authentication")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "blog.db")]
    pub database: String,

    /// Path to file containing the access token secret. Prefer ACCESS_TOKEN_SECRET env var instead
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer REFRESH_TOKEN_SECRET env var instead
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Create an admin user with this email on startup and print its password
    #[arg(long, value_name = "EMAIL")]
    pub create_admin: Option<String>,

    /// Login attempts allowed per client per minute (0 disables the limit)
    #[arg(long, env = "LOGIN_RATE_LIMIT", default_value = "10")]
    pub login_rate_limit: u32,

    /// Read the client IP from this proxy header instead of the socket address.
    /// Only set this behind a reverse proxy that overwrites the header
    #[arg(long, env = "IP_HEADER")]
    pub ip_header: Option<ClientIpHeader>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load one secret from an environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
fn load_secret(env_var: &str, file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            "{} is required. Set the environment variable (recommended) or pass a secret file",
            env_var
        );
        return None;
    };

    if secret.len() < MIN_SECRET_LENGTH {
        error!(
            "{} is shorter than {} characters. Use a longer secret",
            env_var, MIN_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Load the access and refresh secrets. They must both be present and differ.
pub fn load_secrets(
    access_secret_file: Option<&str>,
    refresh_secret_file: Option<&str>,
) -> Option<(String, String)> {
    let access = load_secret("ACCESS_TOKEN_SECRET", access_secret_file)?;
    let refresh = load_secret("REFRESH_TOKEN_SECRET", refresh_secret_file)?;

    if access == refresh {
        error!("Access and refresh token secrets must differ");
        return None;
    }

    Some((access, refresh))
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    access_secret: String,
    refresh_secret: String,
    login_rate_limit: u32,
    ip_header: Option<ClientIpHeader>,
) -> ServerConfig {
    ServerConfig {
        db,
        access_secret: access_secret.into_bytes(),
        refresh_secret: refresh_secret.into_bytes(),
        login_rate_limit: NonZeroU32::new(login_rate_limit),
        ip_extractor: ip_header.map(IpExtractor::from),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Give a user the admin role, creating the role and its permission if needed.
pub async fn grant_admin(db: &Database, user_id: i64) -> Result<(), sqlx::Error> {
    let users = db.users();
    let role_id = users.ensure_role(ADMIN_AUTHORITY).await?;
    users.grant_permission(role_id, USER_READ_PERMISSION).await?;
    users.assign_role(user_id, role_id).await?;
    Ok(())
}

/// Handle the --create-admin flag: create a new admin or promote an existing user.
pub async fn handle_create_admin(db: &Database, email: &str) {
    let user_id = match db.users().get_by_email(email).await {
        Ok(Some(existing)) => {
            println!();
            println!("User already exists: {}", existing.email);
            println!();
            existing.id
        }
        Ok(None) => {
            let password = generate_password();
            let hash = match hash_password(&password) {
                Ok(hash) => hash,
                Err(e) => {
                    error!(error = %e, "Failed to hash admin password");
                    std::process::exit(1);
                }
            };
            let name = email.split('@').next().unwrap_or(email);

            match db.users().create(name, email, &hash).await {
                Ok(id) => {
                    println!();
                    println!("Admin user created: {}", email);
                    println!("Password: {}", password);
                    println!();
                    id
                }
                Err(e) => {
                    error!(error = %e, "Failed to create admin user");
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            std::process::exit(1);
        }
    };

    if let Err(e) = grant_admin(db, user_id).await {
        error!(error = %e, "Failed to grant admin role");
        std::process::exit(1);
    }
}
