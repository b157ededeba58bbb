use serde::{Deserialize, Serialize};
use std::fmt;

/// A precomputed low-order point used by an invalid-curve or twist vector.
///
/// The coordinates live with the handshake engine; the probe only needs the
/// order to size the number of attempts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttackPoint {
    pub order: u32,
}

impl AttackPoint {
    const fn of_order(order: u32) -> Option<Self> {
        Some(Self { order })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NamedGroup {
    Secp160k1,
    Secp160r1,
    Secp160r2,
    Secp192k1,
    Secp192r1,
    Secp224k1,
    Secp224r1,
    Secp256k1,
    Secp256r1,
    Secp384r1,
    Secp521r1,
    BrainpoolP256r1,
    BrainpoolP384r1,
    BrainpoolP512r1,
    Sect163k1,
    Sect233r1,
    Sect283k1,
    #[serde(rename = "ECDH_X25519")]
    X25519,
    #[serde(rename = "ECDH_X448")]
    X448,
    Ffdhe2048,
    Ffdhe3072,
}

impl NamedGroup {
    pub fn wire_value(self) -> u16 {
        match self {
            NamedGroup::Sect163k1 => 0x0001,
            NamedGroup::Sect233r1 => 0x0006,
            NamedGroup::Sect283k1 => 0x0009,
            NamedGroup::Secp160k1 => 0x000f,
            NamedGroup::Secp160r1 => 0x0010,
            NamedGroup::Secp160r2 => 0x0011,
            NamedGroup::Secp192k1 => 0x0012,
            NamedGroup::Secp192r1 => 0x0013,
            NamedGroup::Secp224k1 => 0x0014,
            NamedGroup::Secp224r1 => 0x0015,
            NamedGroup::Secp256k1 => 0x0016,
            NamedGroup::Secp256r1 => 0x0017,
            NamedGroup::Secp384r1 => 0x0018,
            NamedGroup::Secp521r1 => 0x0019,
            NamedGroup::BrainpoolP256r1 => 0x001a,
            NamedGroup::BrainpoolP384r1 => 0x001b,
            NamedGroup::BrainpoolP512r1 => 0x001c,
            NamedGroup::X25519 => 0x001d,
            NamedGroup::X448 => 0x001e,
            NamedGroup::Ffdhe2048 => 0x0100,
            NamedGroup::Ffdhe3072 => 0x0101,
        }
    }

    /// Montgomery curves with x-only encodings.
    pub fn is_x_curve(self) -> bool {
        matches!(self, NamedGroup::X25519 | NamedGroup::X448)
    }

    /// Elliptic curves over a prime field, the only ones the invalid-curve
    /// family can attack.
    pub fn is_prime_field_curve(self) -> bool {
        !matches!(
            self,
            NamedGroup::Sect163k1
                | NamedGroup::Sect233r1
                | NamedGroup::Sect283k1
                | NamedGroup::Ffdhe2048
                | NamedGroup::Ffdhe3072
        )
    }

    /// Point off the curve used by the classic vector, if one is configured.
    pub fn invalid_curve_point(self) -> Option<AttackPoint> {
        match self {
            NamedGroup::Secp160k1
            | NamedGroup::Secp160r1
            | NamedGroup::Secp160r2
            | NamedGroup::Secp192k1
            | NamedGroup::Secp192r1 => AttackPoint::of_order(5),
            NamedGroup::Secp224k1 | NamedGroup::Secp224r1 | NamedGroup::Secp256k1 => {
                AttackPoint::of_order(7)
            }
            NamedGroup::Secp256r1 => AttackPoint::of_order(5),
            NamedGroup::Secp384r1 => AttackPoint::of_order(7),
            NamedGroup::Secp521r1 => AttackPoint::of_order(5),
            NamedGroup::BrainpoolP256r1
            | NamedGroup::BrainpoolP384r1
            | NamedGroup::BrainpoolP512r1 => AttackPoint::of_order(11),
            _ => None,
        }
    }

    /// Point on the quadratic twist used by the variant vector, if configured.
    pub fn twisted_curve_point(self) -> Option<AttackPoint> {
        match self {
            NamedGroup::Secp160k1 | NamedGroup::Secp160r1 | NamedGroup::Secp160r2 => {
                AttackPoint::of_order(3)
            }
            NamedGroup::Secp192k1 | NamedGroup::Secp192r1 => AttackPoint::of_order(5),
            NamedGroup::Secp224k1 | NamedGroup::Secp224r1 => AttackPoint::of_order(11),
            NamedGroup::X25519 => AttackPoint::of_order(4),
            NamedGroup::X448 => AttackPoint::of_order(2),
            _ => None,
        }
    }

    /// Whether the twist has a subgroup small enough to recover key material.
    pub fn is_twist_vulnerable(self) -> bool {
        matches!(
            self,
            NamedGroup::Secp160k1
                | NamedGroup::Secp160r1
                | NamedGroup::Secp160r2
                | NamedGroup::Secp192k1
                | NamedGroup::Secp192r1
                | NamedGroup::Secp224k1
                | NamedGroup::Secp224r1
        )
    }
}

impl fmt::Display for NamedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NamedGroup::Secp160k1 => "secp160k1",
            NamedGroup::Secp160r1 => "secp160r1",
            NamedGroup::Secp160r2 => "secp160r2",
            NamedGroup::Secp192k1 => "secp192k1",
            NamedGroup::Secp192r1 => "secp192r1",
            NamedGroup::Secp224k1 => "secp224k1",
            NamedGroup::Secp224r1 => "secp224r1",
            NamedGroup::Secp256k1 => "secp256k1",
            NamedGroup::Secp256r1 => "secp256r1",
            NamedGroup::Secp384r1 => "secp384r1",
            NamedGroup::Secp521r1 => "secp521r1",
            NamedGroup::BrainpoolP256r1 => "brainpoolP256r1",
            NamedGroup::BrainpoolP384r1 => "brainpoolP384r1",
            NamedGroup::BrainpoolP512r1 => "brainpoolP512r1",
            NamedGroup::Sect163k1 => "sect163k1",
            NamedGroup::Sect233r1 => "sect233r1",
            NamedGroup::Sect283k1 => "sect283k1",
            NamedGroup::X25519 => "x25519",
            NamedGroup::X448 => "x448",
            NamedGroup::Ffdhe2048 => "ffdhe2048",
            NamedGroup::Ffdhe3072 => "ffdhe3072",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_curves_only_carry_twist_points() {
        for group in [NamedGroup::X25519, NamedGroup::X448] {
            assert!(group.is_x_curve());
            assert!(group.invalid_curve_point().is_none());
            assert!(group.twisted_curve_point().is_some());
            assert!(!group.is_twist_vulnerable());
        }
    }

    #[test]
    fn binary_and_ff_groups_are_not_prime_field_curves() {
        assert!(!NamedGroup::Sect163k1.is_prime_field_curve());
        assert!(!NamedGroup::Ffdhe2048.is_prime_field_curve());
        assert!(NamedGroup::Secp256r1.is_prime_field_curve());
        assert!(NamedGroup::X25519.is_prime_field_curve());
    }

    #[test]
    fn twist_vulnerable_groups_have_twist_points() {
        let groups = [
            NamedGroup::Secp160k1,
            NamedGroup::Secp160r1,
            NamedGroup::Secp160r2,
            NamedGroup::Secp192k1,
            NamedGroup::Secp192r1,
            NamedGroup::Secp224k1,
            NamedGroup::Secp224r1,
        ];
        for group in groups {
            assert!(group.is_twist_vulnerable());
            assert!(group.twisted_curve_point().is_some(), "{group}");
        }
    }
}
