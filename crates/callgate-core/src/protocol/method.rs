//! Method path grammar: `/<service>/<method>`.
//!
//! The service segment is the fully-qualified service name (for example
//! `service.Admin`); the method segment is either a method name or, in policy
//! input only, the `*` wildcard.

use crate::error::{GateError, Result};

/// Wildcard method segment accepted in policy input.
pub const WILDCARD: &str = "*";

/// Borrowed view of a parsed `/<service>/<method>` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodPath<'a> {
    pub service: &'a str,
    pub method: &'a str,
}

impl<'a> MethodPath<'a> {
    /// Parse a full method path. Both segments must be non-empty and the
    /// method segment must not contain another `/`.
    pub fn parse(raw: &'a str) -> Result<Self> {
        let rest = raw.strip_prefix('/').ok_or_else(|| {
            GateError::InvalidArgument(format!("method path must start with '/': {raw}"))
        })?;
        let (service, method) = rest.split_once('/').ok_or_else(|| {
            GateError::InvalidArgument(format!("method path has no method segment: {raw}"))
        })?;

        if service.is_empty() || method.is_empty() || method.contains('/') {
            return Err(GateError::InvalidArgument(format!(
                "invalid method path: {raw} (expected /service/method)"
            )));
        }
        Ok(Self { service, method })
    }

    pub fn is_wildcard(&self) -> bool {
        self.method == WILDCARD
    }
}

/// Static description of one RPC service: its name and every method it
/// exposes. Wildcard grants expand against `methods` at policy build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub methods: &'static [&'static str],
}

impl ServiceDescriptor {
    /// Full path of one method, e.g. `/service.Admin/Logging`.
    pub fn path(&self, method: &str) -> String {
        format!("/{}/{}", self.name, method)
    }

    /// Full paths of every method of this service.
    pub fn full_methods(&self) -> impl Iterator<Item = String> + '_ {
        self.methods.iter().map(|m| self.path(m))
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains(&method)
    }
}
