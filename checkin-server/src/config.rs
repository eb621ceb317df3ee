//! checkin-server configuration
//!
//! Resolution order for every setting: command line (or its environment
//! variable) → TOML config file → compiled default. The root folder follows
//! the shared resolver in `checkin_common::config`.

use axum::http::HeaderValue;
use chrono_tz::Tz;
use checkin_common::config::{resolve_in_root, resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use checkin_common::time::{parse_timezone, DEFAULT_TIMEZONE};
use checkin_common::{Error, Result};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://localhost:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_ROLLOVER_POLL_SECS: u64 = 60;

pub const DATA_FILE_NAME: &str = "participants_data.json";
pub const UPLOAD_DIR_NAME: &str = "uploads";
const DEFAULT_TLS_CERT: &str = "cert.pem";
const DEFAULT_TLS_KEY: &str = "key.pem";

/// Command-line arguments for checkin-server
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "checkin-server")]
#[command(about = "Event check-in backend: roster import, QR check-in, spreadsheet export")]
#[command(version)]
pub struct Args {
    /// Folder holding participant data, uploads and TLS material
    /// (falls back to CHECKIN_ROOT_FOLDER, then the config file)
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// TOML config file (default: ~/.config/checkin/config.toml)
    #[arg(short, long, env = "CHECKIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "CHECKIN_BIND_ADDR")]
    pub bind_addr: Option<IpAddr>,

    /// Origin allowed by CORS
    #[arg(long, env = "CHECKIN_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// IANA timezone of the event
    #[arg(long, env = "CHECKIN_TIMEZONE")]
    pub timezone: Option<String>,

    /// Serve plain HTTP instead of HTTPS (local development)
    #[arg(long)]
    pub no_tls: bool,
}

/// PEM files for the HTTPS listener
#[derive(Debug, Clone, PartialEq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub root_folder: PathBuf,
    /// Persisted participant document
    pub data_file: PathBuf,
    /// Scratch space for uploads awaiting import
    pub upload_dir: PathBuf,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub allowed_origin: HeaderValue,
    pub timezone: Tz,
    /// `None` serves plain HTTP
    pub tls: Option<TlsPaths>,
    pub max_upload_bytes: usize,
    pub rollover_poll: Duration,
}

impl Config {
    /// Merge command line, environment and TOML settings
    pub fn resolve(args: &Args, toml: &TomlConfig) -> Result<Self> {
        let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, toml);
        let mut config = Self::for_root(root_folder);

        if let Some(port) = args.port.or(toml.server.port) {
            config.port = port;
        }

        if let Some(addr) = args.bind_addr {
            config.bind_addr = addr;
        } else if let Some(addr) = &toml.server.bind_addr {
            config.bind_addr = addr
                .parse()
                .map_err(|e| Error::Config(format!("Invalid bind_addr '{}': {}", addr, e)))?;
        }

        if let Some(origin) = args
            .allowed_origin
            .as_deref()
            .or(toml.server.allowed_origin.as_deref())
        {
            config.allowed_origin = HeaderValue::from_str(origin)
                .map_err(|e| Error::Config(format!("Invalid allowed_origin '{}': {}", origin, e)))?;
        }

        if let Some(tz) = args.timezone.as_deref().or(toml.event.timezone.as_deref()) {
            config.timezone = parse_timezone(tz)?;
        }

        if let Some(bytes) = toml.server.max_upload_bytes {
            config.max_upload_bytes = bytes;
        }

        if let Some(secs) = toml.event.rollover_poll_secs {
            if secs == 0 {
                return Err(Error::Config("rollover_poll_secs must be positive".to_string()));
            }
            config.rollover_poll = Duration::from_secs(secs);
        }

        config.tls = if args.no_tls {
            None
        } else {
            let cert = toml
                .server
                .tls_cert
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TLS_CERT));
            let key = toml
                .server
                .tls_key
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TLS_KEY));
            Some(TlsPaths {
                cert: resolve_in_root(&config.root_folder, &cert),
                key: resolve_in_root(&config.root_folder, &key),
            })
        };

        Ok(config)
    }

    /// Defaults for a given root folder, plain HTTP
    pub fn for_root(root_folder: PathBuf) -> Self {
        Self {
            data_file: root_folder.join(DATA_FILE_NAME),
            upload_dir: root_folder.join(UPLOAD_DIR_NAME),
            root_folder,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            allowed_origin: HeaderValue::from_static(DEFAULT_ALLOWED_ORIGIN),
            timezone: chrono_tz::Asia::Hong_Kong,
            tls: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            rollover_poll: Duration::from_secs(DEFAULT_ROLLOVER_POLL_SECS),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
