pub mod alerting;
pub mod db;
pub mod notifications;
pub mod probes;
pub mod server;
