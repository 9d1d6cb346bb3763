//! Always-delivering reliability strategy.
//!
//! Used for gates that are configured off, such as the field registry's
//! `annotate_field` gate when no fail rate is set.

use super::reliability::{ChannelReliability, Operation};

/// A reliability strategy that never drops an attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDeliver;

impl AlwaysDeliver {
    pub fn new() -> Self {
        Self
    }
}

impl ChannelReliability for AlwaysDeliver {
    fn attempt(&self, _operation: Operation) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_delivers() {
        let gate = AlwaysDeliver::new();
        assert!((0..1000).all(|_| gate.attempt(Operation::Annotate)));
    }
}
