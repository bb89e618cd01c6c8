pub mod metrics {
    pub const HISTORY_CAPACITY: usize = 20;
    pub const HISTORY_TIME_FORMAT: &str = "%H:%M";
}


pub mod devices {
    pub const ACTIVITY_FEED_CAPACITY: usize = 50;
}


pub mod polling {
    use tokio::time::{Duration};

    pub const INTERVAL: Duration = Duration::from_secs(5);
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);
    pub const SENSOR_PATH: &str = "/api/sensor-data";
}


pub mod push {
    use tokio::time::{Duration};

    pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
    pub const MAX_BACKOFF: Duration = Duration::from_secs(30);
    pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
}


pub mod assistant {
    use tokio::time::{Duration};

    pub const PATH: &str = "/api/assistant";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const RECENT_ACTIVITY: usize = 10;
}


pub mod render {
    use tokio::time::{Duration};

    pub const TICK: Duration = Duration::from_secs(1);
}
