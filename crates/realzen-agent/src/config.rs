use std::env;
use std::fmt::{self, Debug};
use std::num::NonZeroUsize;
use std::time::Duration;

use realzen_agent_openai_model::{OpenAIConfig, OpenAIConfigBuilder};

/// The model used unless `REALZEN_MODEL` says otherwise.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// The system prompt used unless `REALZEN_SYSTEM_PROMPT` says otherwise.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant.\n\nSystem time: {system_time}";

const DEFAULT_MAX_SEARCH_RESULTS: NonZeroUsize = NonZeroUsize::new(10).unwrap();
const DEFAULT_MAX_TURNS: NonZeroUsize = NonZeroUsize::new(25).unwrap();
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors reported while loading a [`Configuration`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is not a positive integer.
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber {
        /// The name of the variable.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
    /// A credential needed by the caller is not configured.
    #[error("{0} is not set")]
    MissingCredential(&'static str),
    /// The HTTP client could not be created.
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Runtime options of the agent, built once at process start.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    model: String,
    system_prompt: String,
    max_search_results: NonZeroUsize,
    max_turns: NonZeroUsize,
    rapidapi_key: Option<String>,
    openai_api_key: Option<String>,
    openai_base_url: Option<String>,
    http_timeout: Duration,
}

impl Configuration {
    /// Loads the configuration from the process environment.
    ///
    /// | variable | option |
    /// |----------|--------|
    /// | `REALZEN_MODEL` | model identifier |
    /// | `REALZEN_SYSTEM_PROMPT` | system prompt |
    /// | `REALZEN_MAX_SEARCH_RESULTS` | max search results |
    /// | `REALZEN_MAX_TURNS` | max turns |
    /// | `REALZEN_HTTP_TIMEOUT_SECS` | HTTP timeout in seconds |
    /// | `RAPIDAPI_KEY` | listings API key |
    /// | `OPENAI_API_KEY` | model API key |
    /// | `OPENAI_BASE_URL` | model endpoint |
    ///
    /// Unset or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Loads the configuration from an arbitrary variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut builder = ConfigurationBuilder::new();

        if let Some(model) = lookup("REALZEN_MODEL") {
            builder = builder.with_model(model);
        }
        if let Some(prompt) = lookup("REALZEN_SYSTEM_PROMPT") {
            builder = builder.with_system_prompt(prompt);
        }
        if let Some(value) = lookup("REALZEN_MAX_SEARCH_RESULTS") {
            builder = builder.with_max_search_results(parse_positive(
                "REALZEN_MAX_SEARCH_RESULTS",
                value,
            )?);
        }
        if let Some(value) = lookup("REALZEN_MAX_TURNS") {
            builder = builder
                .with_max_turns(parse_positive("REALZEN_MAX_TURNS", value)?);
        }
        if let Some(value) = lookup("REALZEN_HTTP_TIMEOUT_SECS") {
            let secs = parse_positive("REALZEN_HTTP_TIMEOUT_SECS", value)?;
            builder = builder
                .with_http_timeout(Duration::from_secs(secs.get() as u64));
        }
        if let Some(key) = lookup("RAPIDAPI_KEY") {
            builder = builder.with_rapidapi_key(key);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            builder = builder.with_openai_api_key(key);
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            builder = builder.with_openai_base_url(base_url);
        }

        Ok(builder.build())
    }

    /// Returns the model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the system prompt, possibly holding `{system_time}`.
    #[inline]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Returns the maximum number of records a search hands back.
    #[inline]
    pub fn max_search_results(&self) -> NonZeroUsize {
        self.max_search_results
    }

    /// Returns the maximum number of model invocations in one run.
    #[inline]
    pub fn max_turns(&self) -> NonZeroUsize {
        self.max_turns
    }

    /// Returns the listings API key, if any.
    #[inline]
    pub fn rapidapi_key(&self) -> Option<&str> {
        self.rapidapi_key.as_deref()
    }

    /// Returns the timeout applied to every outbound HTTP request.
    #[inline]
    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Makes the configuration of the model provider.
    pub fn openai_config(&self) -> Result<OpenAIConfig, ConfigError> {
        let api_key = self
            .openai_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential("OPENAI_API_KEY"))?;
        let mut builder = OpenAIConfigBuilder::with_api_key(api_key)
            .with_model(&self.model)
            .with_timeout(self.http_timeout);
        if let Some(base_url) = &self.openai_base_url {
            builder = builder.with_base_url(base_url);
        }
        Ok(builder.build())
    }
}

impl Default for Configuration {
    #[inline]
    fn default() -> Self {
        ConfigurationBuilder::new().build()
    }
}

impl Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("max_search_results", &self.max_search_results)
            .field("max_turns", &self.max_turns)
            .field("rapidapi_key", &redacted(&self.rapidapi_key))
            .field("openai_api_key", &redacted(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[inline]
fn redacted(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

fn parse_positive(
    var: &'static str,
    value: String,
) -> Result<NonZeroUsize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { var, value })
}

/// Builder for [`Configuration`].
#[derive(Clone, Debug)]
pub struct ConfigurationBuilder {
    config: Configuration,
}

impl ConfigurationBuilder {
    /// Creates a builder holding the defaults.
    #[inline]
    pub fn new() -> Self {
        Self {
            config: Configuration {
                model: DEFAULT_MODEL.to_owned(),
                system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
                max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
                max_turns: DEFAULT_MAX_TURNS,
                rapidapi_key: None,
                openai_api_key: None,
                openai_base_url: None,
                http_timeout: DEFAULT_HTTP_TIMEOUT,
            },
        }
    }

    /// Sets the model identifier.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.config.model = model.into();
        self
    }

    /// Sets the system prompt.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    /// Sets the maximum number of records a search hands back.
    #[inline]
    pub fn with_max_search_results(mut self, max: NonZeroUsize) -> Self {
        self.config.max_search_results = max;
        self
    }

    /// Sets the maximum number of model invocations in one run.
    #[inline]
    pub fn with_max_turns(mut self, max: NonZeroUsize) -> Self {
        self.config.max_turns = max;
        self
    }

    /// Sets the listings API key.
    #[inline]
    pub fn with_rapidapi_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.rapidapi_key = Some(key.into());
        self
    }

    /// Sets the model API key.
    #[inline]
    pub fn with_openai_api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.config.openai_api_key = Some(key.into());
        self
    }

    /// Sets the model endpoint.
    #[inline]
    pub fn with_openai_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.config.openai_base_url = Some(base_url.into());
        self
    }

    /// Sets the timeout applied to every outbound HTTP request.
    #[inline]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> Configuration {
        self.config
    }
}

impl Default for ConfigurationBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
