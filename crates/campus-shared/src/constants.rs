/// Default REST base URL (local development backend)
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Prefix reserved for client-assigned provisional identifiers.
/// Server identifiers never start with it.
pub const PROVISIONAL_ID_PREFIX: &str = "local_";

/// Fallback message when a failed response carries no `message` field
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

/// Default page size for feed requests
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Quiet period before a search-driven fetch is issued
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Delay before the events screen refetches after a sync-back pass
pub const DEFAULT_EVENTS_RESYNC_DELAY_MS: u64 = 2_000;

/// Placeholder identity used when a valid token is found without a user object
pub const PLACEHOLDER_USER_ID: &str = "temp-user";
pub const PLACEHOLDER_DISPLAY_NAME: &str = "User";
pub const PLACEHOLDER_HANDLE: &str = "user";

/// Minimum password length accepted by registration and reset forms
pub const MIN_PASSWORD_LEN: usize = 8;

/// Key derivation context for sync-back content hashes (BLAKE3)
pub const KDF_CONTEXT_EVENT_HASH: &str = "campus-event-sync-v1";
