use super::RequestsLoggingLevel;

#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    pub port: u16,
    pub requests_logging_level: RequestsLoggingLevel,
    /// Path to the frontend directory to be statically served, if any.
    pub frontend_dir_path: Option<String>,
}
