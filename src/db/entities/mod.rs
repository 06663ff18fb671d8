//! SeaORM entities for the host store tables.
//!
//! The schema itself is owned by the surrounding service; these entities only
//! describe the columns the monitor reads and writes.

pub mod alert_channel;
pub mod check_config;
pub mod host;
pub mod host_history;

pub mod prelude {
    pub use super::host::Entity as Host;
    pub use super::host::Model as HostModel;
    pub use super::host::ActiveModel as HostActiveModel;
    pub use super::host::Column as HostColumn;

    pub use super::host_history::Entity as HostHistory;
    pub use super::host_history::Model as HostHistoryModel;
    pub use super::host_history::ActiveModel as HostHistoryActiveModel;
    pub use super::host_history::Column as HostHistoryColumn;

    pub use super::alert_channel::Entity as AlertChannel;
    pub use super::alert_channel::Model as AlertChannelModel;
    pub use super::alert_channel::ActiveModel as AlertChannelActiveModel;
    pub use super::alert_channel::Column as AlertChannelColumn;

    pub use super::check_config::Entity as CheckConfig;
    pub use super::check_config::Model as CheckConfigModel;
    pub use super::check_config::ActiveModel as CheckConfigActiveModel;
    pub use super::check_config::Column as CheckConfigColumn;
}
