//! Projector configuration.

/// How the projector reacts to `Move` notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovePolicy {
    /// Moves are unsupported and fail fatally.
    #[default]
    Reject,
    /// A move is applied as a removal of the moved items followed by an
    /// insertion at the new index, within the same parent.
    RemoveInsert,
}

/// Configuration for a [`FlatCollection`](crate::FlatCollection).
#[derive(Debug, Clone, Default)]
pub struct FlatCollectionConfig {
    /// Policy for `Move` notifications.
    pub move_policy: MovePolicy,
    /// Run the full invariant check after every mutation.
    pub verify_invariants: bool,
}

impl FlatCollectionConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy for `Move` notifications.
    pub fn move_policy(mut self, policy: MovePolicy) -> Self {
        self.move_policy = policy;
        self
    }

    /// Set whether invariants are verified after every mutation.
    pub fn verify_invariants(mut self, verify: bool) -> Self {
        self.verify_invariants = verify;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FlatCollectionConfig::new();
        assert_eq!(config.move_policy, MovePolicy::Reject);
        assert!(!config.verify_invariants);
    }

    #[test]
    fn test_config_builder() {
        let config = FlatCollectionConfig::new()
            .move_policy(MovePolicy::RemoveInsert)
            .verify_invariants(true);
        assert_eq!(config.move_policy, MovePolicy::RemoveInsert);
        assert!(config.verify_invariants);
    }
}
