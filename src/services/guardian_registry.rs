//! Guardian registry: explicit, injected lookup of guardian implementations.
//!
//! Built once at startup and passed to the assigner and supervisor; there is
//! no process-global registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::Guardian;

#[derive(Default)]
pub struct GuardianRegistry {
    guardians: HashMap<String, Arc<dyn Guardian>>,
}

impl GuardianRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a guardian under its own code.
    ///
    /// An empty code is rejected; overwriting an existing registration is
    /// allowed but logged as a warning.
    pub fn register(&mut self, guardian: Arc<dyn Guardian>) -> DomainResult<()> {
        let code = guardian.code().to_string();
        if code.trim().is_empty() {
            return Err(DomainError::EmptyGuardianCode);
        }

        if self.guardians.contains_key(&code) {
            tracing::warn!(code = %code, "overwriting existing guardian registration");
        }
        self.guardians.insert(code, guardian);
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<Arc<dyn Guardian>> {
        self.guardians.get(code).cloned()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.guardians.contains_key(code)
    }

    /// Registered codes, sorted for stable output.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.guardians.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.guardians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guardians.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{GuardianAssignment, GuardianVerdictSnapshot};
    use async_trait::async_trait;
    use std::collections::HashMap as StdHashMap;

    struct NamedGuardian(&'static str);

    #[async_trait]
    impl Guardian for NamedGuardian {
        fn code(&self) -> &str {
            self.0
        }

        async fn verify(
            &self,
            assignment: &GuardianAssignment,
            _context: &StdHashMap<String, serde_json::Value>,
        ) -> DomainResult<GuardianVerdictSnapshot> {
            Ok(GuardianVerdictSnapshot::pass(assignment))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = GuardianRegistry::new();
        registry.register(Arc::new(NamedGuardian("alpha"))).unwrap();
        registry.register(Arc::new(NamedGuardian("beta"))).unwrap();

        assert!(registry.contains("alpha"));
        assert!(registry.get("beta").is_some());
        assert!(registry.get("gamma").is_none());
        assert_eq!(registry.codes(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_empty_code_rejected() {
        let mut registry = GuardianRegistry::new();
        let err = registry.register(Arc::new(NamedGuardian("  "))).unwrap_err();
        assert!(matches!(err, DomainError::EmptyGuardianCode));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_overwrite_is_allowed() {
        let mut registry = GuardianRegistry::new();
        registry.register(Arc::new(NamedGuardian("alpha"))).unwrap();
        // Second registration under the same code replaces, never errors
        registry.register(Arc::new(NamedGuardian("alpha"))).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
