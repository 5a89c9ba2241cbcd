//! Package identities and the repositories that back them

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderIdentity {
    pub namespace: String,
    /// Provider type, e.g. `aws`
    pub name: String,
}

impl ProviderIdentity {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn repo_name(&self) -> String {
        format!("terraform-provider-{}", self.name)
    }

    pub fn cache_key(&self) -> String {
        cache_key(&self.namespace, &self.repo_name())
    }
}

impl fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentity {
    pub namespace: String,
    pub name: String,
    /// Target system, e.g. `aws`
    pub system: String,
}

impl ModuleIdentity {
    pub fn new(namespace: &str, name: &str, system: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            system: system.to_string(),
        }
    }

    pub fn repo_name(&self) -> String {
        format!("terraform-{}-{}", self.system, self.name)
    }

    pub fn cache_key(&self) -> String {
        cache_key(&self.namespace, &self.repo_name())
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.name, self.system)
    }
}

pub fn cache_key(namespace: &str, repo_name: &str) -> String {
    format!("{}/{}", namespace, repo_name)
}
