//! Lifecycle policy (SPEC_FULL.md §3): whether the subscription builder
//! provisions and/or reconciles bus resources for a subscriber.

/// Controls whether `SubscriptionBuilder::build` creates or updates bus
/// resources for a subscriber (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    autocreate: bool,
    autoupdate: bool,
}

impl LifecyclePolicy {
    pub fn new(autocreate: bool, autoupdate: bool) -> Self {
        Self {
            autocreate,
            autoupdate,
        }
    }

    pub fn autocreate(&self) -> bool {
        self.autocreate
    }

    pub fn autoupdate(&self) -> bool {
        self.autoupdate
    }
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            autocreate: true,
            autoupdate: true,
        }
    }
}
