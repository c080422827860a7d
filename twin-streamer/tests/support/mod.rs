use integration_test_utils::ScriptedTransport;
use std::sync::Arc;
use twin_store_static_file::InMemoryReadingStore;
use twin_streamer::ingestion::{
    sensor_topic_pattern, ReadingIngestHandler, ReadingValidator, ValidatorConfig,
};
use twin_streamer::IngestionDispatcher;

pub(crate) const NAMESPACE: &str = "water/sensors";

pub(crate) struct IngestionPipeline {
    pub(crate) dispatcher: IngestionDispatcher,
    pub(crate) transport: Arc<ScriptedTransport>,
    pub(crate) readings: Arc<InMemoryReadingStore>,
}

/// Dispatcher wired to the persisting reading handler on `water/sensors/+`, connected and
/// started.
pub(crate) async fn start_ingestion_pipeline(
    default_water_system_id: Option<&str>,
) -> IngestionPipeline {
    let transport = Arc::new(ScriptedTransport::new());
    let readings = Arc::new(InMemoryReadingStore::new());
    let validator = ReadingValidator::new(ValidatorConfig {
        default_water_system_id: default_water_system_id.map(str::to_string),
        ..Default::default()
    });

    let dispatcher = IngestionDispatcher::new("ingestion-test", transport.clone(), 64);
    dispatcher
        .register(
            &sensor_topic_pattern(NAMESPACE),
            Arc::new(ReadingIngestHandler::new(validator, readings.clone())),
        )
        .await
        .expect("sensor pattern is valid");
    dispatcher.connect().await.expect("scripted transport connects");
    dispatcher.start().await.expect("dispatch loop starts");

    IngestionPipeline {
        dispatcher,
        transport,
        readings,
    }
}

pub(crate) fn sensor_topic(sensor_id: &str) -> String {
    format!("{NAMESPACE}/{sensor_id}")
}
