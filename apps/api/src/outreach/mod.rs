// Outreach: email drafting, the dispatch cycle, and the background sweep.
// All LLM calls go through llm_client; cadence decisions come from cadence::engine.

pub mod dispatch;
pub mod drafter;
pub mod handlers;
pub mod prompts;
pub mod scheduler;
