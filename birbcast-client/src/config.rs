//! Environment-based client configuration and endpoint resolution.

use crate::reconnect::ReconnectPolicy;
use birbcast_core::utils::DEFAULT_STUN_URLS;
use birbcast_core::{IceServerConfig, SessionConfig, TransportPolicy, UnknownTransportPolicy};
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Relays used when TURN credentials are set but no TURN urls are.
pub const DEFAULT_TURN_URLS: [&str; 2] = [
    "turn:global.relay.metered.ca:80?transport=udp",
    "turn:global.relay.metered.ca:443?transport=udp",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} endpoint `{value}`: {source}")]
    Endpoint {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Policy(#[from] UnknownTransportPolicy),

    #[error("relay-only transport policy needs at least one TURN server with credentials")]
    NoRelayServers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// `host[:port][/prefix]`, without scheme.
    pub api_url: String,
    pub secure: bool,
    pub signaling_path: String,
    pub chat_path: String,
    pub presence_path: String,
    pub frame_path: String,
    pub stun_urls: Vec<String>,
    pub turn: TurnConfig,
    pub transport_policy: TransportPolicy,
    pub signaling_timeout: Duration,
    pub reconnect: ReconnectConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectConfig {
    pub presence: ReconnectPolicy,
    pub chat: ReconnectPolicy,
    pub frames: ReconnectPolicy,
    pub media: ReconnectPolicy,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            presence: ReconnectPolicy::presence_default(),
            chat: ReconnectPolicy::chat_default(),
            frames: ReconnectPolicy::presence_default(),
            media: ReconnectPolicy::disabled(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "localhost:8000".to_string(),
            secure: false,
            signaling_path: "/webrtc/offer".to_string(),
            chat_path: "/chat".to_string(),
            presence_path: "/viewers".to_string(),
            frame_path: "/stream".to_string(),
            stun_urls: DEFAULT_STUN_URLS.iter().map(|s| s.to_string()).collect(),
            turn: TurnConfig::default(),
            transport_policy: TransportPolicy::Any,
            signaling_timeout: Duration::from_secs(10),
            reconnect: ReconnectConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset or unparsable numbers
    /// fall back to defaults; an unknown transport policy is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str, default: bool| {
            var(key)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(default)
        };
        let millis = |key: &str, default: Duration| {
            var(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };
        let list = |key: &str| {
            var(key).map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
        };

        let transport_policy = match var("BIRBCAST_TRANSPORT_POLICY") {
            Some(v) => v.parse()?,
            None => defaults.transport_policy,
        };

        let mut reconnect = defaults.reconnect;
        reconnect.presence =
            ReconnectPolicy::fixed(millis("BIRBCAST_PRESENCE_RECONNECT_MS", Duration::from_secs(5)));
        reconnect.frames = reconnect.presence;
        if !flag("BIRBCAST_CHAT_RECONNECT", true) {
            reconnect.chat = ReconnectPolicy::disabled();
        }
        if flag("BIRBCAST_MEDIA_AUTO_RESTART", false) {
            reconnect.media =
                ReconnectPolicy::exponential(Duration::from_secs(2), 2.0, Duration::from_secs(30));
        }

        Ok(Self {
            api_url: var("BIRBCAST_API_URL").unwrap_or(defaults.api_url),
            secure: flag("BIRBCAST_SECURE", defaults.secure),
            signaling_path: var("BIRBCAST_SIGNALING_PATH").unwrap_or(defaults.signaling_path),
            chat_path: var("BIRBCAST_CHAT_PATH").unwrap_or(defaults.chat_path),
            presence_path: var("BIRBCAST_PRESENCE_PATH").unwrap_or(defaults.presence_path),
            frame_path: var("BIRBCAST_FRAME_PATH").unwrap_or(defaults.frame_path),
            stun_urls: list("BIRBCAST_STUN_URLS").unwrap_or(defaults.stun_urls),
            turn: TurnConfig {
                urls: list("BIRBCAST_TURN_URLS").unwrap_or_default(),
                username: var("BIRBCAST_TURN_USERNAME"),
                credential: var("BIRBCAST_TURN_CREDENTIAL"),
            },
            transport_policy,
            signaling_timeout: millis("BIRBCAST_SIGNALING_TIMEOUT_MS", defaults.signaling_timeout),
            reconnect,
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    /// Ordered ICE servers: STUN first, then TURN when both credentials are
    /// present.
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let mut servers = Vec::new();
        if !self.stun_urls.is_empty() {
            servers.push(IceServerConfig::stun(self.stun_urls.iter().cloned()));
        }

        match (&self.turn.username, &self.turn.credential) {
            (Some(username), Some(credential)) => {
                let urls: Vec<String> = if self.turn.urls.is_empty() {
                    DEFAULT_TURN_URLS.iter().map(|s| s.to_string()).collect()
                } else {
                    self.turn.urls.clone()
                };
                servers.push(IceServerConfig::turn(urls, username, credential));
            }
            (None, None) if self.turn.urls.is_empty() => {}
            _ => warn!("TURN server credentials not found. Using STUN servers only."),
        }

        servers
    }

    fn endpoint(&self, name: &'static str, scheme: &str, path: &str) -> Result<Url, ConfigError> {
        let host = self
            .api_url
            .split_once("://")
            .map_or(self.api_url.as_str(), |(_, rest)| rest)
            .trim_end_matches('/');
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let value = format!("{scheme}://{host}{path}");

        Url::parse(&value).map_err(|source| ConfigError::Endpoint {
            name,
            value,
            source,
        })
    }

    /// Resolves endpoints and ICE servers into the immutable session config.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let (http, ws) = if self.secure {
            ("https", "wss")
        } else {
            ("http", "ws")
        };

        let ice_servers = self.ice_servers();
        if self.transport_policy == TransportPolicy::RelayOnly
            && !ice_servers.iter().any(IceServerConfig::is_relay)
        {
            return Err(ConfigError::NoRelayServers);
        }

        Ok(SessionConfig::new(
            self.endpoint("signaling", http, &self.signaling_path)?,
            self.endpoint("chat", ws, &self.chat_path)?,
            self.endpoint("presence", ws, &self.presence_path)?,
        )
        .with_frame_endpoint(self.endpoint("frame", ws, &self.frame_path)?)
        .with_ice_servers(ice_servers)
        .with_transport_policy(self.transport_policy))
    }
}
