/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Quiz authoring and catalogue operations.
pub mod quiz_service;
/// Per-session clock task driving timed transitions.
pub mod session_clock;
/// Session commands funnelled through the engine.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Storage connection supervision and degraded mode.
pub mod storage_supervisor;
