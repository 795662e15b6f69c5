//! Route prefixes, `OpenAPI` tags and header names shared by every slice.

/// Root of every API route. `GET /` redirects here.
pub const API_ROOT: &str = "/api";
/// Machine-readable `OpenAPI` document.
pub const OPENAPI_PATH: &str = "/api/swagger.json";

pub const HEALTH_TAG: &str = "Health";
pub const MODEL_TAG: &str = "Model";
pub const SEGMENTATION_TAG: &str = "Segmentation";
pub const SECURITY_TAG: &str = "Security";

/// Header carrying the CSRF token on unsafe requests.
pub const CSRF_HEADER: &str = "x-csrftoken";
/// Header carrying a comma-separated response field mask.
pub const FIELDS_MASK_HEADER: &str = "x-fields";

/// Environment variable a process host sets to identify itself.
pub const HOST_SOFTWARE_VAR: &str = "SERVER_SOFTWARE";
/// Environment variable overriding the settings file location.
pub const SETTINGS_PATH_VAR: &str = "DWASTE_SETTINGS";

/// Origins allowed to call `/api/*` cross-origin unless configured otherwise.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["https://www.dwaste.live", "https://dwaste.live"];
