//! Host environment detection and transport selection.

use std::env;
use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

const TRANSPORT_ENV: &str = "QUILL_TRANSPORT";
const PROTOCOL_ENV: &str = "QUILL_HOST_PROTOCOL";
const USER_AGENT_ENV: &str = "QUILL_HOST_USER_AGENT";
/// Relay endpoint used by [`crate::ProxyBackend`] when set.
pub const PROXY_URL_ENV: &str = "QUILL_PROXY_URL";

/// How requests reach the AI vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Straight to the provider's base URL.
    Direct,
    /// Through a relay, for hosts that cannot reach the vendor themselves.
    Proxied,
}

impl Transport {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "proxy" | "proxied" => Some(Self::Proxied),
            _ => None,
        }
    }
}

/// Facts about the host the editor runs in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Page protocol such as `https:` when hosted in a browser.
    pub protocol: Option<String>,
    /// Host user agent string.
    pub user_agent: Option<String>,
}

impl Environment {
    /// Describe an environment explicitly.
    pub fn new(protocol: Option<&str>, user_agent: Option<&str>) -> Self {
        Self {
            protocol: protocol.map(str::to_owned),
            user_agent: user_agent.map(str::to_owned),
        }
    }

    /// Read `QUILL_HOST_PROTOCOL` and `QUILL_HOST_USER_AGENT`.
    pub fn from_env() -> Self {
        Self {
            protocol: env::var(PROTOCOL_ENV).ok(),
            user_agent: env::var(USER_AGENT_ENV).ok(),
        }
    }

    /// Served over http(s) rather than from a desktop shell.
    pub fn is_browser(&self) -> bool {
        self.protocol.as_deref().is_some_and(|protocol| {
            matches!(
                protocol.trim().trim_end_matches(':').to_ascii_lowercase().as_str(),
                "http" | "https"
            )
        })
    }

    /// Phone or tablet user agent.
    pub fn is_mobile(&self) -> bool {
        self.user_agent
            .as_deref()
            .is_some_and(|agent| mobile_agents().is_match(agent))
    }

    /// Browser and mobile hosts cannot call vendors directly.
    pub fn is_restricted(&self) -> bool {
        self.is_browser() || self.is_mobile()
    }

    /// Transport implied by the environment alone.
    pub fn preferred_transport(&self) -> Transport {
        if self.is_restricted() {
            Transport::Proxied
        } else {
            Transport::Direct
        }
    }
}

#[allow(clippy::expect_used)]
fn mobile_agents() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)android|webos|iphone|ipad|ipod|blackberry|iemobile|opera mini|mobile|tablet")
            .expect("mobile user agent pattern is a valid literal")
    })
}

/// Picks the transport once per selector and remembers it.
///
/// An explicit override wins over `QUILL_TRANSPORT`, which wins over
/// environment detection.
#[derive(Debug, Default)]
pub struct TransportSelector {
    environment: Environment,
    forced: Option<Transport>,
    cached: OnceLock<Transport>,
}

impl TransportSelector {
    /// Selector for an explicit environment.
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            forced: None,
            cached: OnceLock::new(),
        }
    }

    /// Selector reading the process environment, honoring `QUILL_TRANSPORT`.
    pub fn from_env() -> Self {
        let mut selector = Self::new(Environment::from_env());
        selector.forced = env::var(TRANSPORT_ENV)
            .ok()
            .as_deref()
            .and_then(Transport::parse);
        selector
    }

    /// Force a transport regardless of the environment.
    #[must_use]
    pub fn with_override(mut self, transport: Transport) -> Self {
        self.forced = Some(transport);
        self.cached = OnceLock::new();
        self
    }

    /// Environment the selector was built from.
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    /// The selected transport, computed on first use.
    pub fn transport(&self) -> Transport {
        *self.cached.get_or_init(|| {
            let transport = self
                .forced
                .unwrap_or_else(|| self.environment.preferred_transport());
            info!(
                ?transport,
                forced = self.forced.is_some(),
                restricted = self.environment.is_restricted(),
                "selected chat transport"
            );
            transport
        })
    }
}
