pub mod process_ctx;
pub mod process_flow;

pub use process_ctx::ProcessCtx;
pub use process_flow::{FlowHooks, FlowOutcome, NoopHooks, ProcessFlow};
