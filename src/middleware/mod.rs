pub mod metrics;
pub mod observer;
pub mod rate_limit;
