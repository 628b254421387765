/// How the tracing subscriber is set up. `json_format` is meant for
/// production log shipping; local runs keep the human-readable layer.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}

impl TracingConfig {
    pub fn new(environment: impl Into<String>, json_format: bool) -> Self {
        Self {
            environment: environment.into(),
            json_format,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let json_format = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        Self {
            environment,
            json_format,
        }
    }
}
