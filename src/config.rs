use std::fmt;
use std::str::FromStr;

use console::style;
use tracing::{debug, info};

pub const STAGING_API_URL: &str = "https://learning-api-dev.quantum-computing.ibm.com";
pub const STAGING_WEBSITE_URL: &str = "https://learning.www-dev.quantum-computing.ibm.com";
pub const PRODUCTION_API_URL: &str = "https://learning-api.quantum-computing.ibm.com";
pub const PRODUCTION_WEBSITE_URL: &str = "https://learning.quantum-computing.ibm.com";

/// Named deployment of the learning platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Staging,
    Production,
}

impl Target {
    pub fn name(self) -> &'static str {
        match self {
            Target::Staging => "staging",
            Target::Production => "production",
        }
    }

    /// Key holding this target's lesson id in the lesson index, e.g. `idStaging`.
    pub fn id_key(self) -> &'static str {
        match self {
            Target::Staging => "idStaging",
            Target::Production => "idProduction",
        }
    }

    pub fn environment(self) -> Environment {
        match self {
            Target::Staging => Environment::new(self.name(), STAGING_API_URL, STAGING_WEBSITE_URL),
            Target::Production => {
                Environment::new(self.name(), PRODUCTION_API_URL, PRODUCTION_WEBSITE_URL)
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown target '{0}'; expected 's'/'staging' or 'p'/'production'")]
pub struct UnknownTarget(String);

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "staging" => Ok(Target::Staging),
            "p" | "production" => Ok(Target::Production),
            _ => Err(UnknownTarget(s.to_owned())),
        }
    }
}

/// Where a sync run sends its requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    pub api_url: String,
    pub website_url: String,
}

impl Environment {
    pub fn new(
        name: impl Into<String>,
        api_url: impl Into<String>,
        website_url: impl Into<String>,
    ) -> Self {
        let env = Self {
            name: name.into(),
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            website_url: website_url.into().trim_end_matches('/').to_owned(),
        };
        env.trace_loaded();
        env
    }

    /// Send API requests to `api_url` instead, e.g. a local instance.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_owned();
        self.trace_loaded();
        self
    }

    /// Name styled for the terminal; production stands out in yellow.
    pub fn highlighted_name(&self) -> String {
        let name = style(&self.name).bold();
        if self.name == Target::Production.name() {
            name.yellow().to_string()
        } else {
            name.blue().to_string()
        }
    }

    pub fn trace_loaded(&self) {
        info!(environment = %self.name, api_url = %self.api_url, "Resolved environment");
        debug!(?self, "Environment (full debug)");
    }
}
