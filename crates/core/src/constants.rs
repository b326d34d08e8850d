/// Constants used throughout the gatehouse codebase
// Environment variable names
pub const GATEHOUSE_CONFIG_VAR: &str = "GATEHOUSE_CONFIG";
pub const GATEHOUSE_SIGNING_KEY_VAR: &str = "GATEHOUSE_SIGNING_KEY";
pub const GATEHOUSE_TOKEN_TTL_VAR: &str = "GATEHOUSE_TOKEN_TTL_SECS";
pub const GATEHOUSE_CACHE_TTL_VAR: &str = "GATEHOUSE_CACHE_TTL_SECS";
pub const GATEHOUSE_CACHE_MAX_ENTRIES_VAR: &str = "GATEHOUSE_CACHE_MAX_ENTRIES";
pub const GATEHOUSE_ENV_PREFIX: &str = "GATEHOUSE_";

// Config file location under the user config directory
pub const CONFIG_DIR_NAME: &str = "gatehouse";
pub const CONFIG_FILE_NAME: &str = "config.json";

// Credential defaults
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60;
pub const BEARER_SCHEME: &str = "Bearer";
pub const TOKEN_ISSUER: &str = "gatehouse";

// Rate limiting defaults (limit, window in milliseconds)
pub const LOGIN_RATE_LIMIT: (u32, u64) = (5, 15 * 60 * 1000);
pub const REGISTER_RATE_LIMIT: (u32, u64) = (3, 60 * 60 * 1000);
pub const API_RATE_LIMIT: (u32, u64) = (100, 15 * 60 * 1000);

// Response cache defaults
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 100;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

// Response headers
pub const HEADER_RATE_LIMIT: &str = "RateLimit-Limit";
pub const HEADER_RATE_REMAINING: &str = "RateLimit-Remaining";
pub const HEADER_RATE_RESET: &str = "RateLimit-Reset";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";
pub const HEADER_CACHE_STATUS: &str = "X-Cache";
pub const HEADER_CACHE_KEY: &str = "X-Cache-Key";
