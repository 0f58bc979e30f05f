//! Address validation against the registry
//!
//! `check` is pure; `validate` additionally moves the registry entry from
//! the field's previous address to the new one.

use super::address::{canonical, fold, parse_address};
use super::error::RejectReason;
use super::registry::AddressRegistry;

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Empty input: the field is simply not set yet
    NotSet,
    /// Well-formed, not tracked elsewhere; checksummed form
    Accepted(String),
}

/// Decide whether `raw` may become the field's address.
///
/// `previous` is the field's currently committed address, which may be
/// re-validated without tripping the duplicate check.
pub fn check(
    raw: &str,
    previous: Option<&str>,
    registry: &AddressRegistry,
) -> Result<Validation, RejectReason> {
    let input = raw.trim();
    if input.is_empty() {
        return Ok(Validation::NotSet);
    }

    let address = canonical(&parse_address(input).ok_or(RejectReason::InvalidFormat)?);
    let folded = fold(&address);
    let unchanged = previous.map(fold).is_some_and(|prev| prev == folded);
    if registry.contains(&folded) && !unchanged {
        return Err(RejectReason::Duplicate);
    }

    Ok(Validation::Accepted(address))
}

/// `check`, then commit: unregister the previous address and register the
/// new one. `NotSet` leaves the registry untouched.
pub fn validate(
    raw: &str,
    previous: Option<&str>,
    registry: &mut AddressRegistry,
) -> Result<Validation, RejectReason> {
    let validation = check(raw, previous, registry)?;
    if let Validation::Accepted(address) = &validation {
        if let Some(prev) = previous {
            registry.remove(prev);
        }
        registry.add(address);
    }
    Ok(validation)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
    const B: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

    #[test]
    fn test_empty_is_not_set() {
        let mut registry = AddressRegistry::new();
        assert_eq!(validate("   ", None, &mut registry), Ok(Validation::NotSet));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_format() {
        let mut registry = AddressRegistry::new();
        assert_eq!(
            validate("0x123", None, &mut registry),
            Err(RejectReason::InvalidFormat)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_in_other_field() {
        let mut registry = AddressRegistry::new();
        validate(A, None, &mut registry).unwrap();
        assert_eq!(
            validate(&A.to_lowercase(), None, &mut registry),
            Err(RejectReason::Duplicate)
        );
        assert_eq!(
            validate(A, Some(B), &mut registry),
            Err(RejectReason::Duplicate)
        );
    }

    #[test]
    fn test_revalidating_unchanged_field_is_not_duplicate() {
        for address in [A, B] {
            let mut registry = AddressRegistry::new();
            let committed = match validate(address, None, &mut registry).unwrap() {
                Validation::Accepted(addr) => addr,
                Validation::NotSet => unreachable!(),
            };
            let again = validate(address, Some(&committed), &mut registry);
            assert_eq!(again, Ok(Validation::Accepted(committed.clone())));
            assert_eq!(registry.len(), 1);
        }
    }

    #[test]
    fn test_replacing_moves_registration() {
        let mut registry = AddressRegistry::new();
        validate(A, None, &mut registry).unwrap();
        validate(B, Some(A), &mut registry).unwrap();
        assert!(!registry.contains(A));
        assert!(registry.contains(B));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_prefix_still_detected_as_duplicate() {
        let mut registry = AddressRegistry::new();
        validate(A, None, &mut registry).unwrap();
        assert_eq!(
            validate(&A[2..], None, &mut registry),
            Err(RejectReason::Duplicate)
        );
    }

    #[test]
    fn test_accepts_lowercase_and_returns_checksum() {
        let mut registry = AddressRegistry::new();
        assert_eq!(
            validate(&format!("  {}  ", A.to_lowercase()), None, &mut registry),
            Ok(Validation::Accepted(A.to_string()))
        );
    }
}
