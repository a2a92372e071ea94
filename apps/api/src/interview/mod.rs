// Interview conversation engine: session state machine, interviewer script,
// summary cache, and archival of finished interviews.
// All model calls go through llm_client.

pub mod archive;
pub mod controller;
pub mod handlers;
pub mod prompts;
pub mod summary;
