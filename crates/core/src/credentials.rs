use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The environment variable that supplies the API token.
pub const MLHUB_ENV_VARIABLE: &str = "MLHUB_API_TOKEN";

/// The name of the TOML config file that can hold the API token.
pub const MLHUB_CONFIG_FILE: &str = ".ml-hub";

/// Resolves the MLHub API token.
///
/// Sources are tried in a fixed order:
///
/// 1. an explicit, non-empty token
/// 2. the [MLHUB_ENV_VARIABLE] environment variable
/// 3. the `auth.api_token` field of a [MLHUB_CONFIG_FILE] TOML file in the
///    current working directory or, failing that, the home directory
///
/// # Examples
///
/// ```
/// use mlhub::CredentialResolver;
///
/// let resolver = CredentialResolver::new();
/// assert_eq!(resolver.resolve(Some("a-token")).unwrap(), "a-token");
/// ```
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    env_var: String,
    file_name: String,
    search_dirs: Option<Vec<PathBuf>>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    auth: Option<AuthSection>,
}

#[derive(Debug, Deserialize)]
struct AuthSection {
    api_token: Option<String>,
}

impl CredentialResolver {
    /// Creates a resolver that uses the default environment variable, config
    /// file name, and search directories.
    pub fn new() -> CredentialResolver {
        CredentialResolver {
            env_var: MLHUB_ENV_VARIABLE.to_string(),
            file_name: MLHUB_CONFIG_FILE.to_string(),
            search_dirs: None,
        }
    }

    /// Sets the environment variable to read the token from.
    pub fn with_env_var(mut self, env_var: impl ToString) -> CredentialResolver {
        self.env_var = env_var.to_string();
        self
    }

    /// Sets the config file name.
    pub fn with_file_name(mut self, file_name: impl ToString) -> CredentialResolver {
        self.file_name = file_name.to_string();
        self
    }

    /// Replaces the default search directories (working directory, then home
    /// directory) with these, searched in order.
    pub fn with_search_dirs<I, P>(mut self, dirs: I) -> CredentialResolver
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Resolves the token.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mlhub::CredentialResolver;
    ///
    /// let token = CredentialResolver::new().resolve(None).unwrap();
    /// ```
    pub fn resolve(&self, explicit_token: Option<&str>) -> Result<String> {
        if let Some(token) = explicit_token.filter(|token| !token.is_empty()) {
            return Ok(token.to_string());
        }
        match self.token_from_environment() {
            Ok(token) => {
                tracing::info!("using api token from {}", self.env_var);
                Ok(token)
            }
            Err(err) => {
                tracing::debug!("{err}, trying config file");
                self.token_from_config()
            }
        }
    }

    /// Reads the token from the environment variable.
    pub fn token_from_environment(&self) -> Result<String> {
        match std::env::var(&self.env_var) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::Configuration(
                "missing environment credential".to_string(),
            )),
        }
    }

    /// Reads the token from the first config file found in the search
    /// directories.
    pub fn token_from_config(&self) -> Result<String> {
        let path = self
            .search_dirs()
            .into_iter()
            .map(|dir| dir.join(&self.file_name))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::NotFound("config file missing".to_string()))?;
        let token = read_api_token(&path)?;
        tracing::info!("using api token from {}", path.display());
        Ok(token)
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        if let Some(dirs) = &self.search_dirs {
            dirs.clone()
        } else {
            default_search_dirs()
        }
    }
}

/// The working directory, then the home directory.
fn default_search_dirs() -> Vec<PathBuf> {
    std::env::current_dir()
        .ok()
        .into_iter()
        .chain(dirs::home_dir())
        .collect()
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn read_api_token(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&contents)?;
    config
        .auth
        .and_then(|auth| auth.api_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::Configuration("missing api token field".to_string()))
}
