use orchestrator::OrchestratorConfig;
use tracing::warn;

const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "video/mp4",
    "video/webm",
];

/// Runtime configuration, sourced from the environment with working
/// defaults for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    /// Upload cap in bytes, applied to the request body and re-checked per
    /// file.
    pub max_file_size: usize,
    /// Mime allow-list for image and video submissions.
    pub allowed_file_types: Vec<String>,
    pub cors_origin: Option<String>,
    /// Deployment environment label, reported by the health endpoints.
    pub environment: String,
    pub max_iterations: u32,
    pub pass_threshold: f64,
    pub parallel_agents: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let orchestrator = OrchestratorConfig::default();
        Self {
            port: 3001,
            database_url: "sqlite:pixelgen.db".to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_file_types: DEFAULT_ALLOWED_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cors_origin: None,
            environment: "development".to_string(),
            max_iterations: orchestrator.max_iterations,
            pass_threshold: orchestrator.pass_threshold,
            parallel_agents: orchestrator.parallel_stages,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env_parsed("PORT", defaults.port),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_file_size: env_parsed("MAX_FILE_SIZE", defaults.max_file_size),
            allowed_file_types: std::env::var("ALLOWED_FILE_TYPES")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_file_types),
            cors_origin: std::env::var("CORS_ORIGIN").ok(),
            environment: std::env::var("APP_ENV").unwrap_or(defaults.environment),
            max_iterations: env_parsed("MAX_ITERATIONS", defaults.max_iterations),
            pass_threshold: env_parsed("PASS_THRESHOLD", defaults.pass_threshold),
            parallel_agents: env_parsed("PARALLEL_AGENTS", defaults.parallel_agents),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_iterations: self.max_iterations,
            pass_threshold: self.pass_threshold,
            parallel_stages: self.parallel_agents,
            ..OrchestratorConfig::default()
        }
    }

    pub fn is_allowed_type(&self, mime: &str) -> bool {
        self.allowed_file_types.iter().any(|t| t == mime)
    }
}

fn env_parsed<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, "Unparseable env var, using default");
            default
        }),
        Err(_) => default,
    }
}
