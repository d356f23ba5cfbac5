use serde::Deserialize;
use callgate_core::error::{GateError, Result};

use crate::events::DEFAULT_QUEUE_CAPACITY;
use crate::policy::AclMode;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub host: HostSection,

    pub acl: AclSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GateError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        self.host.validate()?;
        self.acl.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_max_stat_interval_secs")]
    pub max_stat_interval_secs: u64,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            queue_capacity: default_queue_capacity(),
            max_stat_interval_secs: default_max_stat_interval_secs(),
        }
    }
}

impl HostSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(GateError::Config(format!(
                "host.listen must be a valid socket address: {}",
                self.listen
            )));
        }
        if !(1..=65536).contains(&self.queue_capacity) {
            return Err(GateError::Config(
                "host.queue_capacity must be between 1 and 65536".into(),
            ));
        }
        if !(1..=86400).contains(&self.max_stat_interval_secs) {
            return Err(GateError::Config(
                "host.max_stat_interval_secs must be between 1 and 86400".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "127.0.0.1:8082".into()
}
fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}
fn default_max_stat_interval_secs() -> u64 {
    3600
}

/// Where the ACL JSON comes from, and how strictly it is compiled.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclSection {
    #[serde(default)]
    pub strict: bool,

    /// ACL JSON embedded in the config file.
    #[serde(default)]
    pub inline: Option<String>,

    /// Path to an ACL JSON file.
    #[serde(default)]
    pub file: Option<String>,
}

impl AclSection {
    pub fn validate(&self) -> Result<()> {
        match (&self.inline, &self.file) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(GateError::Config(
                "acl requires exactly one of acl.inline or acl.file".into(),
            )),
        }
    }

    pub fn mode(&self) -> AclMode {
        if self.strict {
            AclMode::Strict
        } else {
            AclMode::Lenient
        }
    }

    /// Raw ACL JSON, reading `file` if that is the configured source.
    pub fn load_raw(&self) -> Result<String> {
        match (&self.inline, &self.file) {
            (Some(raw), _) => Ok(raw.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map_err(|e| GateError::Config(format!("read acl file {path} failed: {e}"))),
            (None, None) => Err(GateError::Config("acl source missing".into())),
        }
    }
}
