pub mod pacing {
    use std::time::Duration;

    pub const MIN_PROVIDER_INTERVAL: Duration = Duration::from_millis(1000);

    pub const THROTTLE_HOLD: Duration = Duration::from_millis(5000);

    pub const RETRY_BASE: Duration = Duration::from_millis(2000);

    pub const MAX_RETRIES: u32 = 2;
}

pub mod cache {
    use std::time::Duration;

    pub const RESPONSE_TTL: Duration = Duration::from_secs(5 * 60);
}

pub mod guide {

    pub const DEFAULT_EPISODE_DURATION_MINUTES: u32 = 24;

    /// Worker-pool width for per-episode detail fetches. The governor
    /// still serializes the actual dispatches per provider.
    pub const SYNOPSIS_WORKERS: usize = 3;
}

pub mod limits {

    pub const MAX_SEARCH_RESULTS: usize = 10;

    /// Hard stop for the paginated episode fetch, in pages.
    pub const MAX_EPISODE_PAGES: u32 = 30;
}
