pub mod types;

pub use types::{ApiResponse, ClipPayload, HealthResponse, SaveResult};

/// Envelope codes shared with the browser extension.
pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const AUTH_FAILED: i32 = 1001;
    pub const BAD_REQUEST: i32 = 1002;
    pub const RATE_LIMITED: i32 = 1003;
    pub const PAYLOAD_TOO_LARGE: i32 = 1004;
    pub const DIR_CREATE_FAILED: i32 = 2001;
    pub const MARKDOWN_WRITE_FAILED: i32 = 2002;
    pub const ASSET_WRITE_FAILED: i32 = 2003;
    pub const PERMISSION_DENIED: i32 = 2004;
    pub const SECURITY_VIOLATION: i32 = 3001;
    pub const INTERNAL_ERROR: i32 = 9999;
}
