use serde::Deserialize;

/// Default request-context key recognized parameters are stored under.
pub const DEFAULT_PARAMETERS_KEY: &str = "pathway.path_parameters";

/// Router configuration.
///
/// Can be built in code or deserialized, e.g. from a settings file:
///
/// ```
/// use pathway::RouterConfig;
///
/// let config: RouterConfig = serde_json::from_str(r#"{ "reserved_keys": ["controller"] }"#).unwrap();
/// assert_eq!(config.parameters_key(), "pathway.path_parameters");
/// assert!(config.is_reserved("controller"));
/// assert!(!config.is_reserved("action"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    parameters_key: String,
    reserved_keys: Vec<String>,
}

impl RouterConfig {
    /// Key recognized parameters are stored under when a request is dispatched.
    pub fn parameters_key(&self) -> &str {
        &self.parameters_key
    }

    /// Keys never reported as generation leftovers.
    pub fn reserved_keys(&self) -> &[String] {
        &self.reserved_keys
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        self.reserved_keys.iter().any(|reserved| reserved == key)
    }

    /// Sets the parameters key.
    pub fn with_parameters_key(mut self, key: impl Into<String>) -> Self {
        self.parameters_key = key.into();
        self
    }

    /// Replaces the reserved keys.
    pub fn with_reserved_keys<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.reserved_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            parameters_key: DEFAULT_PARAMETERS_KEY.to_owned(),
            reserved_keys: vec!["controller".to_owned(), "action".to_owned()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.parameters_key(), DEFAULT_PARAMETERS_KEY);
        assert_eq!(config.reserved_keys(), ["controller", "action"]);
    }

    #[test]
    fn builder() {
        let config = RouterConfig::default()
            .with_parameters_key("app.params")
            .with_reserved_keys(["handler"]);

        assert_eq!(config.parameters_key(), "app.params");
        assert!(config.is_reserved("handler"));
        assert!(!config.is_reserved("controller"));
    }

    #[test]
    fn deserialize() {
        let config: RouterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RouterConfig::default());

        let config: RouterConfig = serde_json::from_str(
            r#"{ "parameters_key": "routing.params", "reserved_keys": [] }"#,
        )
        .unwrap();
        assert_eq!(config.parameters_key(), "routing.params");
        assert!(config.reserved_keys().is_empty());
    }
}
