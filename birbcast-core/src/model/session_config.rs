use crate::error::UnknownTransportPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            username: None,
            credential: None,
        }
    }

    pub fn turn<I, S>(urls: I, username: impl Into<String>, credential: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            username: Some(username.into()),
            credential: Some(credential.into()),
        }
    }

    /// True when at least one url points at a TURN relay.
    pub fn is_relay(&self) -> bool {
        self.urls
            .iter()
            .any(|u| u.starts_with("turn:") || u.starts_with("turns:"))
    }
}

/// Which ICE candidates the media transport may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportPolicy {
    #[default]
    #[serde(rename = "all")]
    Any,
    #[serde(rename = "relay")]
    RelayOnly,
}

impl FromStr for TransportPolicy {
    type Err = UnknownTransportPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "any" => Ok(Self::Any),
            "relay" | "relay-only" | "relay_only" => Ok(Self::RelayOnly),
            other => Err(UnknownTransportPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for TransportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("all"),
            Self::RelayOnly => f.write_str("relay"),
        }
    }
}

/// Endpoints and ICE setup for one viewer process.
///
/// Built once at startup and shared read-only by every controller.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    signaling_endpoint: Url,
    chat_endpoint: Url,
    presence_endpoint: Url,
    frame_endpoint: Option<Url>,
    ice_servers: Vec<IceServerConfig>,
    transport_policy: TransportPolicy,
}

impl SessionConfig {
    pub fn new(signaling_endpoint: Url, chat_endpoint: Url, presence_endpoint: Url) -> Self {
        Self {
            signaling_endpoint,
            chat_endpoint,
            presence_endpoint,
            frame_endpoint: None,
            ice_servers: Vec::new(),
            transport_policy: TransportPolicy::Any,
        }
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_transport_policy(mut self, policy: TransportPolicy) -> Self {
        self.transport_policy = policy;
        self
    }

    pub fn with_frame_endpoint(mut self, endpoint: Url) -> Self {
        self.frame_endpoint = Some(endpoint);
        self
    }

    pub fn signaling_endpoint(&self) -> &Url {
        &self.signaling_endpoint
    }

    pub fn chat_endpoint(&self) -> &Url {
        &self.chat_endpoint
    }

    pub fn presence_endpoint(&self) -> &Url {
        &self.presence_endpoint
    }

    pub fn frame_endpoint(&self) -> Option<&Url> {
        self.frame_endpoint.as_ref()
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub fn transport_policy(&self) -> TransportPolicy {
        self.transport_policy
    }

    /// Chat socket url for `username`, carried as a query parameter.
    pub fn chat_url_for(&self, username: &str) -> Url {
        let mut url = self.chat_endpoint.clone();
        url.query_pairs_mut().append_pair("username", username);
        url
    }
}
