//! Access control list compilation and lookup.
//!
//! Input is a JSON object `{consumer: ["/service/method", "/service/*", ...]}`.
//! Wildcards are expanded against the service catalog once, at compile time,
//! so runtime validation is a plain set-membership check.

use std::collections::{HashMap, HashSet};

use callgate_core::error::{GateError, Result};
use callgate_core::protocol::{MethodPath, ServiceDescriptor};

/// How to treat ACL entries that do not resolve against the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AclMode {
    /// Log and skip unresolvable entries.
    #[default]
    Lenient,
    /// Reject the whole policy on the first unresolvable entry.
    Strict,
}

/// Why an entry did not resolve.
#[derive(Debug)]
enum Unresolved<'a> {
    Malformed(&'a str),
    UnknownService(&'a str),
    UnknownMethod { service: &'a str, method: &'a str },
}

impl std::fmt::Display for Unresolved<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unresolved::Malformed(raw) => write!(f, "malformed method path {raw}"),
            Unresolved::UnknownService(svc) => write!(f, "unknown service {svc}"),
            Unresolved::UnknownMethod { service, method } => {
                write!(f, "unknown method {method} for service {service}")
            }
        }
    }
}

/// Immutable authorization table: consumer -> service -> full method paths.
/// Construct once at startup, then share via Arc.
#[derive(Debug, Default)]
pub struct AccessPolicy {
    grants: HashMap<String, HashMap<String, HashSet<String>>>,
}

impl AccessPolicy {
    /// Compile in lenient mode (unknown services/methods are skipped).
    pub fn from_json(raw: &str, catalog: &[ServiceDescriptor]) -> Result<Self> {
        Self::compile(raw, catalog, AclMode::Lenient)
    }

    pub fn compile(raw: &str, catalog: &[ServiceDescriptor], mode: AclMode) -> Result<Self> {
        let parsed: HashMap<String, Vec<String>> = serde_json::from_str(raw)
            .map_err(|e| GateError::Config(format!("invalid acl json: {e}")))?;

        let mut grants = HashMap::with_capacity(parsed.len());
        for (consumer, paths) in &parsed {
            // A consumer whose entries all get skipped is still known: its
            // calls fail as "forbidden", not "unknown consumer".
            let services: &mut HashMap<String, HashSet<String>> =
                grants.entry(consumer.clone()).or_default();

            for raw_path in paths {
                match resolve(raw_path, catalog) {
                    Ok((service, methods)) => {
                        services
                            .entry(service.name.to_string())
                            .or_default()
                            .extend(methods);
                    }
                    Err(why) => match mode {
                        AclMode::Strict => {
                            return Err(GateError::Config(format!(
                                "acl entry for consumer {consumer}: {why}"
                            )));
                        }
                        AclMode::Lenient => {
                            tracing::warn!(
                                consumer = %consumer,
                                entry = %raw_path,
                                "acl entry skipped: {why}"
                            );
                        }
                    },
                }
            }
        }

        tracing::debug!(consumers = grants.len(), "acl compiled");
        Ok(Self { grants })
    }

    /// Check whether `consumer` may invoke `full_method` (`/service/method`).
    pub fn validate(&self, consumer: &str, full_method: &str) -> Result<()> {
        let services = self
            .grants
            .get(consumer)
            .ok_or(GateError::Unauthenticated("unknown consumer"))?;

        let service = MethodPath::parse(full_method)
            .map(|p| p.service)
            .map_err(|_| GateError::Unauthenticated("forbidden"))?;

        let methods = services
            .get(service)
            .ok_or(GateError::Unauthenticated("forbidden"))?;

        if !methods.contains(full_method) {
            return Err(GateError::Unauthenticated("access forbidden"));
        }
        Ok(())
    }

    pub fn is_allowed(&self, consumer: &str, full_method: &str) -> bool {
        self.validate(consumer, full_method).is_ok()
    }

    pub fn knows_consumer(&self, consumer: &str) -> bool {
        self.grants.contains_key(consumer)
    }
}

/// Resolve one ACL entry to its service and the full method paths it grants.
fn resolve<'a>(
    raw: &'a str,
    catalog: &[ServiceDescriptor],
) -> std::result::Result<(ServiceDescriptor, Vec<String>), Unresolved<'a>> {
    let path = MethodPath::parse(raw).map_err(|_| Unresolved::Malformed(raw))?;
    let service = catalog
        .iter()
        .find(|s| s.name == path.service)
        .copied()
        .ok_or(Unresolved::UnknownService(path.service))?;

    if path.is_wildcard() {
        return Ok((service, service.full_methods().collect()));
    }
    if !service.has_method(path.method) {
        return Err(Unresolved::UnknownMethod {
            service: path.service,
            method: path.method,
        });
    }
    Ok((service, vec![raw.to_string()]))
}
