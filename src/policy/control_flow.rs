//! Control-flow policy (SPEC_FULL.md §3, §5): the back-pressure bound on a
//! single pull issued by a poll task.

/// Upper bounds on one in-flight pull batch (§5 "Back-pressure").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageControlFlowPolicy {
    max_messages: u32,
    max_bytes: u64,
}

impl MessageControlFlowPolicy {
    pub fn new(max_messages: u32, max_bytes: u64) -> Self {
        Self {
            max_messages,
            max_bytes,
        }
    }

    pub fn max_messages(&self) -> u32 {
        self.max_messages
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

impl Default for MessageControlFlowPolicy {
    fn default() -> Self {
        Self {
            max_messages: 1000,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}
