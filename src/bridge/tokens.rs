use alloy_primitives::Address;
use std::collections::HashMap;

/// Origin token to counterpart token mapping.
///
/// A token is allowed iff it maps to a non-zero counterpart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    counterparts: HashMap<Address, Address>,
    registered: Vec<Address>,
}

impl TokenRegistry {
    /// Maps `token` to `counterpart`. A zero counterpart deregisters `token`.
    pub fn register(&mut self, token: Address, counterpart: Address) {
        if counterpart.is_zero() {
            self.deregister(token);
            return;
        }
        if self.counterparts.insert(token, counterpart).is_none() {
            self.registered.push(token);
        }
    }

    /// Returns `false` if `token` was not registered.
    pub fn deregister(&mut self, token: Address) -> bool {
        if self.counterparts.remove(&token).is_none() {
            return false;
        }
        self.registered.retain(|registered| *registered != token);
        true
    }

    /// Counterpart of `token`, or the zero address.
    pub fn counterpart(&self, token: Address) -> Address {
        self.counterparts.get(&token).copied().unwrap_or(Address::ZERO)
    }

    pub fn is_allowed(&self, token: Address) -> bool {
        self.counterparts.contains_key(&token)
    }

    pub fn registered(&self) -> &[Address] {
        &self.registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const T_A: Address = address!("000000000000000000000000000000000000a0a0");
    const T_B: Address = address!("000000000000000000000000000000000000b0b0");

    #[test]
    fn test_register_and_deregister() {
        let mut registry = TokenRegistry::default();
        assert!(!registry.is_allowed(T_A));

        registry.register(T_A, T_B);
        registry.register(T_A, T_B);
        assert!(registry.is_allowed(T_A));
        assert_eq!(registry.counterpart(T_A), T_B);
        assert_eq!(registry.registered(), &[T_A]);

        assert!(registry.deregister(T_A));
        assert!(!registry.deregister(T_A));
        assert_eq!(registry.counterpart(T_A), Address::ZERO);
        assert!(registry.registered().is_empty());
    }

    #[test]
    fn test_zero_counterpart_disallows() {
        let mut registry = TokenRegistry::default();
        registry.register(T_A, T_B);
        registry.register(T_A, Address::ZERO);
        assert!(!registry.is_allowed(T_A));
        assert!(registry.registered().is_empty());
    }
}
