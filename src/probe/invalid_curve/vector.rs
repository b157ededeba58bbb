//! Enumerates the invalid-curve and twist vectors worth sending, bounded by
//! the scan detail level.

use crate::model::{DetailLevel, TestResult};
use crate::probe::coverage::filter_cipher_suites;
use crate::report::{Property, Report};
use crate::tls::{CipherSuite, NamedGroup, PointFormat, ProtocolVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// One vector: everything needed to run a crafted key exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterSet {
    pub version: ProtocolVersion,
    pub cipher_suites: Vec<CipherSuite>,
    pub group: NamedGroup,
    pub point_format: PointFormat,
    pub twist: bool,
    pub renegotiation: bool,
}

impl ParameterSet {
    /// Suite that decides whether the vector counts as static or ephemeral.
    pub fn leading_suite(&self) -> Option<CipherSuite> {
        self.cipher_suites.first().copied()
    }

    fn in_renegotiation(&self) -> Self {
        Self {
            renegotiation: true,
            ..self.clone()
        }
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.version, self.group, self.point_format)?;
        for suite in &self.cipher_suites {
            write!(f, " {}", suite)?;
        }
        if self.twist {
            write!(f, " twist")?;
        }
        if self.renegotiation {
            write!(f, " renegotiation")?;
        }
        Ok(())
    }
}

/// Confirmed-supported dimensions the generator draws from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvalidCurveScope {
    pub versions: Vec<ProtocolVersion>,
    pub groups: Vec<NamedGroup>,
    pub tls13_groups: Vec<NamedGroup>,
    /// ECDH suites per version; TLS 1.3 maps to its own suites.
    pub suites: BTreeMap<ProtocolVersion, Vec<CipherSuite>>,
    pub point_formats: Vec<PointFormat>,
    pub tls13_point_formats: Vec<PointFormat>,
    /// Secure or insecure client-initiated renegotiation works.
    pub supports_renegotiation: bool,
    pub supports_secure_renegotiation: bool,
    pub tls13_session_tickets: bool,
    pub tls13_psk_dhe: bool,
}

impl InvalidCurveScope {
    pub fn from_report(report: &Report, detail: DetailLevel) -> Self {
        let is_true = |property| report.result(property) == TestResult::True;

        let groups = match &report.supported_groups {
            Some(groups) => prime_field_groups(groups),
            None => {
                warn!("supported groups have not been collected");
                Vec::new()
            }
        };

        let mut suites = BTreeMap::new();
        match &report.version_suites {
            Some(map) => {
                for (version, list) in map {
                    if version.is_tls13() {
                        continue;
                    }
                    let ecdh: Vec<_> = list.iter().copied().filter(|s| s.is_ecdh()).collect();
                    suites.insert(*version, ecdh);
                }
            }
            None => warn!("supported cipher suites have not been collected"),
        }

        if !is_true(Property::SupportsUncompressedPoint) {
            warn!("server did not list uncompressed points as supported");
        }
        let mut point_formats = vec![PointFormat::Uncompressed];
        if is_true(Property::SupportsAnsix962CompressedPrime) || detail == DetailLevel::All {
            point_formats.push(PointFormat::Ansix962CompressedPrime);
        }

        let mut versions = Vec::new();
        for (property, version) in [
            (Property::SupportsTls10, ProtocolVersion::Tls10),
            (Property::SupportsTls11, ProtocolVersion::Tls11),
            (Property::SupportsTls12, ProtocolVersion::Tls12),
        ] {
            if is_true(property) {
                versions.push(version);
            }
        }

        let mut tls13_groups = Vec::new();
        let mut tls13_point_formats = Vec::new();
        if is_true(Property::SupportsTls13) {
            versions.push(ProtocolVersion::Tls13);
            tls13_groups = report
                .supported_tls13_groups
                .as_deref()
                .map(prime_field_groups)
                .unwrap_or_default();
            let tls13_suites = report
                .version_suites
                .iter()
                .flat_map(|map| map.iter())
                .filter(|(version, _)| version.is_tls13())
                .flat_map(|(_, list)| list.iter().copied())
                .filter(|suite| suite.is_tls13())
                .collect();
            suites.insert(ProtocolVersion::Tls13, tls13_suites);
            tls13_point_formats.push(PointFormat::Uncompressed);
            if is_true(Property::SupportsSecpCompressionTls13) {
                tls13_point_formats.push(PointFormat::Ansix962CompressedPrime);
            }
        }

        // Suite enumeration sometimes finds versions the version probe missed.
        for version in suites.keys() {
            if !versions.contains(version) {
                versions.push(*version);
            }
        }

        Self {
            versions,
            groups,
            tls13_groups,
            suites,
            point_formats,
            tls13_point_formats,
            supports_renegotiation: is_true(Property::SupportsClientSideSecureRenegotiation)
                || is_true(Property::SupportsClientSideInsecureRenegotiation),
            supports_secure_renegotiation: is_true(
                Property::SupportsClientSideSecureRenegotiation,
            ),
            tls13_session_tickets: is_true(Property::SupportsTls13SessionTickets),
            tls13_psk_dhe: is_true(Property::SupportsTls13PskDhe),
        }
    }

    /// Whether a vector for `version` can be repeated inside a renegotiation
    /// (a resumption for TLS 1.3).
    pub fn renegotiation_possible(&self, version: ProtocolVersion) -> bool {
        if version.is_tls13() {
            self.tls13_session_tickets && self.tls13_psk_dhe
        } else {
            self.supports_renegotiation
        }
    }

    fn groups_for(&self, version: ProtocolVersion) -> (&[NamedGroup], &[PointFormat]) {
        if version.is_tls13() {
            (&self.tls13_groups, &self.tls13_point_formats)
        } else {
            (&self.groups, &self.point_formats)
        }
    }
}

fn prime_field_groups(groups: &[NamedGroup]) -> Vec<NamedGroup> {
    groups
        .iter()
        .copied()
        .filter(|group| group.is_prime_field_curve())
        .collect()
}

/// Classic vectors need an uncompressed point off a Weierstrass curve.
pub fn is_legit_invalid_curve_vector(group: NamedGroup, format: PointFormat) -> bool {
    format == PointFormat::Uncompressed
        && !group.is_x_curve()
        && group.invalid_curve_point().is_some()
}

/// X-curves have no compressed form; they are scheduled as uncompressed.
pub fn is_legit_twist_vector(group: NamedGroup, format: PointFormat) -> bool {
    if group.twisted_curve_point().is_none() {
        return false;
    }
    !(format == PointFormat::Ansix962CompressedPrime && group.is_x_curve())
}

/// Highest legacy version plus TLS 1.3, the versions covered below
/// `Detailed`.
pub fn pick_protocol_versions(versions: &[ProtocolVersion]) -> Vec<ProtocolVersion> {
    let mut picked = Vec::with_capacity(2);
    if let Some(legacy) = ProtocolVersion::LEGACY_DESCENDING
        .into_iter()
        .find(|version| versions.contains(version))
    {
        picked.push(legacy);
    }
    if versions.contains(&ProtocolVersion::Tls13) {
        picked.push(ProtocolVersion::Tls13);
    }
    picked
}

/// The one version whose vectors are repeated inside a renegotiation.
pub fn pick_renegotiation_version(scope: &InvalidCurveScope) -> Option<ProtocolVersion> {
    let picked = ProtocolVersion::LEGACY_DESCENDING
        .into_iter()
        .chain(std::iter::once(ProtocolVersion::Tls13))
        .find(|version| scope.versions.contains(version) && scope.renegotiation_possible(*version));
    if picked.is_none() {
        info!("no suitable version for invalid curve renegotiation vectors");
    }
    picked
}

/// Builds the ordered vector list. Equal scopes give equal sequences.
pub fn generate_vectors(scope: &InvalidCurveScope, detail: DetailLevel) -> Vec<ParameterSet> {
    let picked = pick_protocol_versions(&scope.versions);
    let mut sets = Vec::new();

    for &version in &scope.versions {
        let Some(version_suites) = scope.suites.get(&version) else {
            warn!(%version, "no cipher suite entry for version, omitting it");
            continue;
        };
        let suites = if detail == DetailLevel::All {
            version_suites.clone()
        } else if picked.contains(&version) || detail >= DetailLevel::Detailed {
            filter_cipher_suites(version_suites, detail)
        } else {
            continue;
        };

        let (groups, formats) = scope.groups_for(version);
        for &group in groups {
            for &point_format in formats {
                for &suite in &suites {
                    let set = |twist| ParameterSet {
                        version,
                        cipher_suites: vec![suite],
                        group,
                        point_format,
                        twist,
                        renegotiation: false,
                    };
                    if is_legit_invalid_curve_vector(group, point_format) {
                        sets.push(set(false));
                    }
                    if is_legit_twist_vector(group, point_format) {
                        sets.push(set(true));
                    }
                }
            }
        }
    }

    if detail >= DetailLevel::Detailed {
        let clones: Vec<_> = if detail == DetailLevel::All {
            sets.iter()
                .filter(|set| scope.renegotiation_possible(set.version))
                .map(ParameterSet::in_renegotiation)
                .collect()
        } else if let Some(version) = pick_renegotiation_version(scope) {
            sets.iter()
                .filter(|set| set.version == version)
                .map(ParameterSet::in_renegotiation)
                .collect()
        } else {
            Vec::new()
        };
        sets.extend(clones);
    }

    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> InvalidCurveScope {
        let mut suites = BTreeMap::new();
        suites.insert(
            ProtocolVersion::Tls12,
            vec![
                CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA,
                CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            ],
        );
        InvalidCurveScope {
            versions: vec![ProtocolVersion::Tls12],
            groups: vec![NamedGroup::Secp256r1, NamedGroup::X25519],
            suites,
            point_formats: vec![PointFormat::Uncompressed, PointFormat::Ansix962CompressedPrime],
            ..InvalidCurveScope::default()
        }
    }

    #[test]
    fn legitimacy_predicates() {
        assert!(is_legit_invalid_curve_vector(NamedGroup::Secp256r1, PointFormat::Uncompressed));
        assert!(!is_legit_invalid_curve_vector(
            NamedGroup::Secp256r1,
            PointFormat::Ansix962CompressedPrime
        ));
        assert!(!is_legit_invalid_curve_vector(NamedGroup::X25519, PointFormat::Uncompressed));
        assert!(is_legit_twist_vector(NamedGroup::X25519, PointFormat::Uncompressed));
        assert!(!is_legit_twist_vector(NamedGroup::X448, PointFormat::Ansix962CompressedPrime));
        assert!(!is_legit_twist_vector(NamedGroup::Secp256r1, PointFormat::Uncompressed));
        assert!(is_legit_twist_vector(
            NamedGroup::Secp224r1,
            PointFormat::Ansix962CompressedPrime
        ));
    }

    #[test]
    fn a_pair_yields_classic_and_twist_sets() {
        let mut scope = scope();
        scope.groups = vec![NamedGroup::Secp192r1];
        scope.point_formats = vec![PointFormat::Uncompressed];
        let sets = generate_vectors(&scope, DetailLevel::Minimal);
        // two suites (one static, one ephemeral), classic and twist each
        assert_eq!(sets.len(), 4);
        assert_eq!(sets.iter().filter(|set| set.twist).count(), 2);
    }

    #[test]
    fn picks_highest_legacy_version_and_tls13() {
        let versions = [ProtocolVersion::Tls10, ProtocolVersion::Tls11, ProtocolVersion::Tls13];
        assert_eq!(
            pick_protocol_versions(&versions),
            vec![ProtocolVersion::Tls11, ProtocolVersion::Tls13]
        );
        assert!(pick_protocol_versions(&[]).is_empty());
    }

    #[test]
    fn renegotiation_prefers_legacy_versions() {
        let mut scope = scope();
        scope.versions = vec![ProtocolVersion::Tls11, ProtocolVersion::Tls13];
        scope.tls13_session_tickets = true;
        scope.tls13_psk_dhe = true;
        assert_eq!(pick_renegotiation_version(&scope), Some(ProtocolVersion::Tls13));
        scope.supports_renegotiation = true;
        assert_eq!(pick_renegotiation_version(&scope), Some(ProtocolVersion::Tls11));
    }

    #[test]
    fn skips_versions_below_detailed_that_were_not_picked() {
        let mut scope = scope();
        scope.versions.insert(0, ProtocolVersion::Tls11);
        scope.suites.insert(
            ProtocolVersion::Tls11,
            vec![CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA],
        );
        let sets = generate_vectors(&scope, DetailLevel::Normal);
        assert!(sets.iter().all(|set| set.version == ProtocolVersion::Tls12));
        let sets = generate_vectors(&scope, DetailLevel::Detailed);
        assert!(sets.iter().any(|set| set.version == ProtocolVersion::Tls11));
    }

    #[test]
    fn versions_without_suite_entry_are_omitted() {
        let mut scope = scope();
        scope.versions.push(ProtocolVersion::Tls13);
        scope.tls13_groups = vec![NamedGroup::Secp256r1];
        scope.tls13_point_formats = vec![PointFormat::Uncompressed];
        let sets = generate_vectors(&scope, DetailLevel::All);
        assert!(sets.iter().all(|set| !set.version.is_tls13()));
    }
}
