use std::collections::HashMap;

use crate::models::Role;

/// LandingPages
///
/// Where an authenticated visitor lands when a view turns them away for their role.
/// An explicit role → path map with a mandatory default; roles without an entry (and
/// unrecognized roles) go to the default. Landing pages must not themselves be guarded
/// by the requirement that sent the visitor there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingPages {
    routes: HashMap<Role, String>,
    default: String,
}

impl LandingPages {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            routes: HashMap::new(),
            default: default.into(),
        }
    }

    pub fn with(mut self, role: Role, path: impl Into<String>) -> Self {
        self.routes.insert(role, path.into());
        self
    }

    pub fn for_role(&self, role: Option<Role>) -> &str {
        role.and_then(|r| self.routes.get(&r))
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    pub fn default_path(&self) -> &str {
        &self.default
    }
}

impl Default for LandingPages {
    fn default() -> Self {
        LandingPages::new("/")
            .with(Role::Admin, "/admin")
            .with(Role::Vendor, "/vendor")
    }
}

