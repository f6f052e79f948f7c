//! Client configuration: a JSON file with defaults for every field, and
//! command line overrides layered on top.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ConsoleError, Result};
use crate::form::{ConsoleForm, EVAL};
use crate::history::DEFAULT_HISTORY_SIZE;

/// Longest accepted request timeout, one day.
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConsoleConfig {
    /// Scheme, host and port of the server, e.g. `http://localhost:8001`.
    pub base_url: String,
    pub console_path: String,
    pub nav_path: String,
    pub version_path: String,
    pub type_code: String,
    pub history_size: usize,
    pub timeout_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            console_path: "/emissary/Console.action".to_string(),
            nav_path: "/api/nav".to_string(),
            version_path: "/api/version".to_string(),
            type_code: EVAL.to_string(),
            history_size: DEFAULT_HISTORY_SIZE,
            timeout_secs: 60,
        }
    }
}

/// Values given explicitly on the command line.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub console_path: Option<String>,
    pub nav_path: Option<String>,
    pub version_path: Option<String>,
    pub history_size: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl ConsoleConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading config");
        let f = std::fs::File::open(path)?;
        let config = serde_json::from_reader(f)?;
        Ok(config)
    }

    /// Load `path` if given, apply `overrides`, and check the result.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        let Overrides {
            base_url,
            console_path,
            nav_path,
            version_path,
            history_size,
            timeout_secs,
        } = overrides;
        if let Some(v) = base_url {
            self.base_url = v;
        }
        if let Some(v) = console_path {
            self.console_path = v;
        }
        if let Some(v) = nav_path {
            self.nav_path = v;
        }
        if let Some(v) = version_path {
            self.version_path = v;
        }
        if let Some(v) = history_size {
            self.history_size = v;
        }
        if let Some(v) = timeout_secs {
            self.timeout_secs = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base()?;
        if base.cannot_be_a_base() {
            return Err(ConsoleError::Config(format!(
                "base-url {} cannot carry paths",
                self.base_url
            )));
        }
        if self.history_size == 0 {
            return Err(ConsoleError::Config("history-size must be at least 1".into()));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(ConsoleError::Config(format!(
                "timeout-secs must be between 1 and {MAX_TIMEOUT_SECS}, got {}",
                self.timeout_secs
            )));
        }
        if self.type_code.is_empty() {
            return Err(ConsoleError::Config("type-code must not be empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn base(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?)
    }

    pub fn console_url(&self) -> Result<Url> {
        self.resolve_path(&self.console_path)
    }

    pub fn nav_url(&self) -> Result<Url> {
        self.resolve_path(&self.nav_path)
    }

    pub fn version_url(&self) -> Result<Url> {
        self.resolve_path(&self.version_path)
    }

    /// Absolute links pass through, anything else is joined onto the base.
    pub fn resolve_path(&self, path: &str) -> Result<Url> {
        Ok(self.base()?.join(path)?)
    }

    pub fn console_form(&self) -> Result<ConsoleForm> {
        let mut form = ConsoleForm::new(self.console_url()?);
        form.type_code = Some(self.type_code.clone());
        Ok(form)
    }
}
