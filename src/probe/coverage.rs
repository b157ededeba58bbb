//! Cipher-suite sampling that keeps behavioral diversity while keeping the
//! number of vectors roughly linear in the number of supported suites.

use crate::model::DetailLevel;
use crate::tls::{CipherSuite, HashAlgorithm, SignatureFamily};
use std::collections::BTreeSet;

/// Tracks which axes already have an exemplar.
#[derive(Debug, Default)]
struct Coverage {
    got_static: bool,
    got_ephemeral: bool,
    got_aead: bool,
    got_block: bool,
    hashes: BTreeSet<HashAlgorithm>,
    signatures: BTreeSet<SignatureFamily>,
    got_weak: bool,
}

impl Coverage {
    /// Admits `suite` if it is the first exemplar of any tracked axis.
    fn admit(&mut self, suite: CipherSuite, detail: DetailLevel) -> bool {
        let mut add = false;

        if suite.is_ephemeral() {
            add |= !std::mem::replace(&mut self.got_ephemeral, true);
        } else {
            add |= !std::mem::replace(&mut self.got_static, true);
        }

        if detail >= DetailLevel::Detailed {
            // every AEAD cipher shares one exemplar; stream ciphers only count
            // through the weak flag
            if suite.is_aead() {
                add |= !std::mem::replace(&mut self.got_aead, true);
            } else if suite.is_block() {
                add |= !std::mem::replace(&mut self.got_block, true);
            }
            add |= self.hashes.insert(suite.hash());
            if suite.signature_family() != SignatureFamily::Negotiated {
                add |= self.signatures.insert(suite.signature_family());
            }
            if suite.is_weak() {
                add |= !std::mem::replace(&mut self.got_weak, true);
            }
        }

        add
    }
}

/// Picks exemplars from `suites`, preserving their order.
pub fn filter_cipher_suites(suites: &[CipherSuite], detail: DetailLevel) -> Vec<CipherSuite> {
    let mut coverage = Coverage::default();
    suites
        .iter()
        .copied()
        .filter(|suite| coverage.admit(*suite, detail))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use CipherSuite::*;

    const SUITES: [CipherSuite; 6] = [
        TLS_ECDH_RSA_WITH_AES_128_CBC_SHA,
        TLS_ECDH_RSA_WITH_AES_256_CBC_SHA,
        TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
        TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA,
        TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA,
    ];

    #[test]
    fn normal_detail_keeps_one_static_and_one_ephemeral() {
        let picked = filter_cipher_suites(&SUITES, DetailLevel::Normal);
        assert_eq!(
            picked,
            vec![
                TLS_ECDH_RSA_WITH_AES_128_CBC_SHA,
                TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA
            ]
        );
    }

    #[test]
    fn detailed_adds_mode_hash_signature_and_weak_exemplars() {
        let picked = filter_cipher_suites(&SUITES, DetailLevel::Detailed);
        assert_eq!(
            picked,
            vec![
                TLS_ECDH_RSA_WITH_AES_128_CBC_SHA,
                TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
                TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
                TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA,
            ]
        );
    }

    #[test]
    fn aead_ciphers_share_one_exemplar() {
        let suites = [
            TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
        ];
        assert_eq!(
            filter_cipher_suites(&suites, DetailLevel::Detailed),
            vec![TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256]
        );
        let tls13 = [
            TLS_AES_128_GCM_SHA256,
            TLS_CHACHA20_POLY1305_SHA256,
            TLS_AES_128_CCM_SHA256,
        ];
        assert_eq!(
            filter_cipher_suites(&tls13, DetailLevel::Detailed),
            vec![TLS_AES_128_GCM_SHA256]
        );
    }

    #[test]
    fn never_picks_more_suites_than_offered() {
        for detail in [DetailLevel::Minimal, DetailLevel::Normal, DetailLevel::Detailed] {
            let picked = filter_cipher_suites(&SUITES, detail);
            assert!(picked.len() <= SUITES.len());
            assert!(!picked.is_empty());
        }
        assert!(filter_cipher_suites(&[], DetailLevel::Detailed).is_empty());
    }
}
