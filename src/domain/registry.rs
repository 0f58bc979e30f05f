//! Set of tracked addresses, keyed case-insensitively

use std::collections::HashSet;

use super::address::fold;

#[derive(Debug, Clone, Default)]
pub struct AddressRegistry {
    known: HashSet<String>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.known.contains(&fold(address))
    }

    pub fn add(&mut self, address: &str) {
        self.known.insert(fold(address));
    }

    pub fn remove(&mut self, address: &str) {
        self.known.remove(&fold(address));
    }

    pub fn clear(&mut self) {
        self.known.clear();
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_and_idempotent() {
        let mut registry = AddressRegistry::new();
        registry.add("0xABCdef0000000000000000000000000000000001");
        registry.add("0xabcdef0000000000000000000000000000000001");
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("0XABCDEF0000000000000000000000000000000001"));

        registry.remove("0xAbCdEf0000000000000000000000000000000001");
        registry.remove("0xAbCdEf0000000000000000000000000000000001");
        assert!(registry.is_empty());
    }
}
