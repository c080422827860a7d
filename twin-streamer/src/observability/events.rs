//! Canonical structured event names used across `twin-streamer`.

// Dispatcher lifecycle events.
pub const DISPATCHER_CREATED: &str = "dispatcher_created";
pub const DISPATCHER_REGISTER: &str = "dispatcher_register";
pub const DISPATCHER_REGISTER_REPLACED: &str = "dispatcher_register_replaced";
pub const DISPATCHER_CONNECT_OK: &str = "dispatcher_connect_ok";
pub const DISPATCHER_CONNECT_FAILED: &str = "dispatcher_connect_failed";
pub const DISPATCHER_START: &str = "dispatcher_start";
pub const DISPATCHER_STOP_START: &str = "dispatcher_stop_start";
pub const DISPATCHER_STOP_OK: &str = "dispatcher_stop_ok";
pub const SUBSCRIBE_OK: &str = "subscribe_ok";
pub const SUBSCRIBE_FAILED: &str = "subscribe_failed";
pub const RESUBSCRIBE_ON_RECONNECT: &str = "resubscribe_on_reconnect";
pub const TRANSPORT_CONNECTION_LOST: &str = "transport_connection_lost";

// Delivery (network-callback side) events.
pub const DELIVERY_RECEIVE: &str = "delivery_receive";
pub const DELIVERY_QUEUE_FULL: &str = "delivery_queue_full";
pub const DELIVERY_QUEUE_CLOSED: &str = "delivery_queue_closed";
pub const DELIVERY_DROP_STOPPED: &str = "delivery_drop_stopped";

// Dispatch-loop events.
pub const DISPATCH_UNMATCHED: &str = "dispatch_unmatched";
pub const DISPATCH_HANDLER_OK: &str = "dispatch_handler_ok";
pub const DISPATCH_HANDLER_FAILED: &str = "dispatch_handler_failed";
pub const DISPATCH_HANDLER_PANICKED: &str = "dispatch_handler_panicked";
pub const DISPATCH_LOOP_DRAINED: &str = "dispatch_loop_drained";
pub const DISPATCH_LOOP_ABORTED: &str = "dispatch_loop_aborted";

// Reading ingestion events.
pub const READING_REJECTED: &str = "reading_rejected";
pub const READING_PERSISTED: &str = "reading_persisted";
pub const READING_PERSIST_FAILED: &str = "reading_persist_failed";

// Aggregation events.
pub const AGGREGATION_CYCLE_START: &str = "aggregation_cycle_start";
pub const AGGREGATION_CYCLE_FINISH: &str = "aggregation_cycle_finish";
pub const AGGREGATION_LIST_FAILED: &str = "aggregation_list_failed";
pub const ASSET_AGGREGATED: &str = "asset_aggregated";
pub const ASSET_EMPTY_WINDOW: &str = "asset_empty_window";
pub const ASSET_UPDATED: &str = "asset_updated";
pub const ASSET_SKIPPED_IN_FLIGHT: &str = "asset_skipped_in_flight";
pub const ASSET_CYCLE_FAILED: &str = "asset_cycle_failed";
pub const ASSET_VANISHED: &str = "asset_vanished";
pub const READING_WITHOUT_SENSOR_ID: &str = "reading_without_sensor_id";

// Scheduler and runtime events.
pub const SCHEDULER_START: &str = "scheduler_start";
pub const SCHEDULER_TICK: &str = "scheduler_tick";
pub const SCHEDULER_STOP: &str = "scheduler_stop";
pub const SCHEDULER_CYCLE_ABORTED: &str = "scheduler_cycle_aborted";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
pub const RUNTIME_SPAWN_FAILED: &str = "runtime_spawn_failed";
