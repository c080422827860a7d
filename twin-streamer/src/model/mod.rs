//! Domain records shared by ingestion, the store gateways and aggregation.

pub(crate) mod asset;
pub(crate) mod reading;
pub(crate) mod sensor;

pub use asset::{
    AssetType, AssetValidationError, MonitoredAsset, MIN_TWINNING_INTERVAL_SECONDS, STATUS_ONLINE,
};
pub use reading::SensorReading;
pub use sensor::{MeasureUnit, SensorStatistics, SensorTwin, SensorType};
