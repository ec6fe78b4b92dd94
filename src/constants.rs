pub mod network {
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
    pub const TIMEOUT_TOKEN_EXCHANGE_MS: u64 = 10_000;
}

pub mod retry {
    pub const MAX_ATTEMPTS: usize = 4;
    pub const BASE_DELAY_MS: u64 = 250;
    pub const JITTER_MS: u64 = 100;
    pub const STATUS_CODES: &[u16] = &[429, 502, 503, 504];
}

pub mod pagination {
    pub const DEFAULT_PAGE: u64 = 1;
    pub const DEFAULT_PAGE_SIZE: u64 = 50;
}

pub mod poll {
    pub const INTERVAL_MS: u64 = 1_500;
    pub const TIMEOUT_MS: u64 = 300_000;
}

pub mod limits {
    pub const BODY_SNIPPET_CHARS: usize = 500;
    pub const AUDIT_SAMPLE_LIMIT: usize = 5;
    pub const LOG_META_MAX_CHARS: usize = 2_048;
}

pub mod protocols {
    pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];
}
