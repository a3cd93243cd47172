//! No-op `ApmProvider`, the default used when no real backend is wired in.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 3: Internal module imports
use super::traits::{ApmProvider, ApmTransaction};

/// Satisfies the `ApmProvider` contract by doing nothing (SPEC_FULL.md §9).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopApmProvider;

impl ApmProvider for NoopApmProvider {
    fn background_transaction(&self, _name: &str) -> Box<dyn ApmTransaction> {
        Box::new(())
    }

    fn get_trace_id(&self) -> Option<String> {
        None
    }

    fn get_span_id(&self) -> Option<String> {
        None
    }

    fn set_distributed_trace_context(&self, _headers: &HashMap<String, String>) {}

    fn get_distributed_trace_context(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn active(&self) -> bool {
        false
    }
}
