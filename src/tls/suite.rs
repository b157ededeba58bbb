use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyExchange {
    Rsa,
    EcdhEcdsa,
    EcdhRsa,
    EcdheEcdsa,
    EcdheRsa,
    Tls13,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BulkMode {
    Gcm,
    Ccm,
    ChaCha20Poly1305,
    Cbc,
    Stream,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignatureFamily {
    Ecdsa,
    Rsa,
    /// TLS 1.3 suites do not fix the signature scheme.
    Negotiated,
}

struct SuiteInfo {
    code: u16,
    key_exchange: KeyExchange,
    bulk: BulkMode,
    hash: HashAlgorithm,
    weak: bool,
}

const fn info(
    code: u16,
    key_exchange: KeyExchange,
    bulk: BulkMode,
    hash: HashAlgorithm,
    weak: bool,
) -> SuiteInfo {
    SuiteInfo {
        code,
        key_exchange,
        bulk,
        hash,
        weak,
    }
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CipherSuite {
    TLS_RSA_WITH_AES_128_CBC_SHA,
    TLS_RSA_WITH_AES_256_CBC_SHA256,
    TLS_RSA_WITH_AES_128_GCM_SHA256,
    TLS_ECDH_ECDSA_WITH_RC4_128_SHA,
    TLS_ECDH_ECDSA_WITH_3DES_EDE_CBC_SHA,
    TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA,
    TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA,
    TLS_ECDH_RSA_WITH_AES_128_CBC_SHA,
    TLS_ECDH_RSA_WITH_AES_256_CBC_SHA,
    TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA,
    TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA,
    TLS_ECDHE_RSA_WITH_RC4_128_SHA,
    TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA,
    TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
    TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA,
    TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256,
    TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384,
    TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA256,
    TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA384,
    TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256,
    TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384,
    TLS_ECDH_RSA_WITH_AES_128_CBC_SHA256,
    TLS_ECDH_RSA_WITH_AES_256_CBC_SHA384,
    TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256,
    TLS_ECDH_ECDSA_WITH_AES_256_GCM_SHA384,
    TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
    TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256,
    TLS_ECDH_RSA_WITH_AES_256_GCM_SHA384,
    TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
    TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
    TLS_AES_128_GCM_SHA256,
    TLS_AES_256_GCM_SHA384,
    TLS_CHACHA20_POLY1305_SHA256,
    TLS_AES_128_CCM_SHA256,
}

impl CipherSuite {
    fn info(self) -> SuiteInfo {
        use BulkMode::*;
        use CipherSuite::*;
        use HashAlgorithm::*;
        use KeyExchange::*;
        match self {
            TLS_RSA_WITH_AES_128_CBC_SHA => info(0x002f, Rsa, Cbc, Sha1, false),
            TLS_RSA_WITH_AES_256_CBC_SHA256 => info(0x003d, Rsa, Cbc, Sha256, false),
            TLS_RSA_WITH_AES_128_GCM_SHA256 => info(0x009c, Rsa, Gcm, Sha256, false),
            TLS_ECDH_ECDSA_WITH_RC4_128_SHA => info(0xc002, EcdhEcdsa, Stream, Sha1, true),
            TLS_ECDH_ECDSA_WITH_3DES_EDE_CBC_SHA => info(0xc003, EcdhEcdsa, Cbc, Sha1, true),
            TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA => info(0xc004, EcdhEcdsa, Cbc, Sha1, false),
            TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA => info(0xc005, EcdhEcdsa, Cbc, Sha1, false),
            TLS_ECDH_RSA_WITH_AES_128_CBC_SHA => info(0xc00e, EcdhRsa, Cbc, Sha1, false),
            TLS_ECDH_RSA_WITH_AES_256_CBC_SHA => info(0xc00f, EcdhRsa, Cbc, Sha1, false),
            TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA => info(0xc009, EcdheEcdsa, Cbc, Sha1, false),
            TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA => info(0xc00a, EcdheEcdsa, Cbc, Sha1, false),
            TLS_ECDHE_RSA_WITH_RC4_128_SHA => info(0xc011, EcdheRsa, Stream, Sha1, true),
            TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA => info(0xc012, EcdheRsa, Cbc, Sha1, true),
            TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA => info(0xc013, EcdheRsa, Cbc, Sha1, false),
            TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA => info(0xc014, EcdheRsa, Cbc, Sha1, false),
            TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256 => {
                info(0xc023, EcdheEcdsa, Cbc, Sha256, false)
            }
            TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384 => {
                info(0xc024, EcdheEcdsa, Cbc, Sha384, false)
            }
            TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA256 => info(0xc025, EcdhEcdsa, Cbc, Sha256, false),
            TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA384 => info(0xc026, EcdhEcdsa, Cbc, Sha384, false),
            TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256 => info(0xc027, EcdheRsa, Cbc, Sha256, false),
            TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384 => info(0xc028, EcdheRsa, Cbc, Sha384, false),
            TLS_ECDH_RSA_WITH_AES_128_CBC_SHA256 => info(0xc029, EcdhRsa, Cbc, Sha256, false),
            TLS_ECDH_RSA_WITH_AES_256_CBC_SHA384 => info(0xc02a, EcdhRsa, Cbc, Sha384, false),
            TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 => {
                info(0xc02b, EcdheEcdsa, Gcm, Sha256, false)
            }
            TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 => {
                info(0xc02c, EcdheEcdsa, Gcm, Sha384, false)
            }
            TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256 => info(0xc02d, EcdhEcdsa, Gcm, Sha256, false),
            TLS_ECDH_ECDSA_WITH_AES_256_GCM_SHA384 => info(0xc02e, EcdhEcdsa, Gcm, Sha384, false),
            TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 => info(0xc02f, EcdheRsa, Gcm, Sha256, false),
            TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 => info(0xc030, EcdheRsa, Gcm, Sha384, false),
            TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256 => info(0xc031, EcdhRsa, Gcm, Sha256, false),
            TLS_ECDH_RSA_WITH_AES_256_GCM_SHA384 => info(0xc032, EcdhRsa, Gcm, Sha384, false),
            TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256 => {
                info(0xcca8, EcdheRsa, ChaCha20Poly1305, Sha256, false)
            }
            TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256 => {
                info(0xcca9, EcdheEcdsa, ChaCha20Poly1305, Sha256, false)
            }
            TLS_AES_128_GCM_SHA256 => info(0x1301, Tls13, Gcm, Sha256, false),
            TLS_AES_256_GCM_SHA384 => info(0x1302, Tls13, Gcm, Sha384, false),
            TLS_CHACHA20_POLY1305_SHA256 => info(0x1303, Tls13, ChaCha20Poly1305, Sha256, false),
            TLS_AES_128_CCM_SHA256 => info(0x1304, Tls13, Ccm, Sha256, false),
        }
    }

    pub fn wire_value(self) -> u16 {
        self.info().code
    }

    pub fn key_exchange(self) -> KeyExchange {
        self.info().key_exchange
    }

    pub fn bulk_mode(self) -> BulkMode {
        self.info().bulk
    }

    pub fn hash(self) -> HashAlgorithm {
        self.info().hash
    }

    pub fn is_weak(self) -> bool {
        self.info().weak
    }

    pub fn is_tls13(self) -> bool {
        matches!(self.key_exchange(), KeyExchange::Tls13)
    }

    /// Elliptic-curve Diffie-Hellman key exchange, static or ephemeral.
    pub fn is_ecdh(self) -> bool {
        matches!(
            self.key_exchange(),
            KeyExchange::EcdhEcdsa
                | KeyExchange::EcdhRsa
                | KeyExchange::EcdheEcdsa
                | KeyExchange::EcdheRsa
        )
    }

    pub fn is_ephemeral(self) -> bool {
        matches!(
            self.key_exchange(),
            KeyExchange::EcdheEcdsa | KeyExchange::EcdheRsa | KeyExchange::Tls13
        )
    }

    pub fn is_aead(self) -> bool {
        matches!(
            self.bulk_mode(),
            BulkMode::Gcm | BulkMode::Ccm | BulkMode::ChaCha20Poly1305
        )
    }

    pub fn is_block(self) -> bool {
        matches!(self.bulk_mode(), BulkMode::Cbc)
    }

    pub fn signature_family(self) -> SignatureFamily {
        match self.key_exchange() {
            KeyExchange::EcdhEcdsa | KeyExchange::EcdheEcdsa => SignatureFamily::Ecdsa,
            KeyExchange::Rsa | KeyExchange::EcdhRsa | KeyExchange::EcdheRsa => {
                SignatureFamily::Rsa
            }
            KeyExchange::Tls13 => SignatureFamily::Negotiated,
        }
    }

    /// Suites that authenticate records with a separate HMAC.
    pub fn uses_mac(self) -> bool {
        !self.is_aead()
    }

    /// Length in bytes of the record MAC, if the suite uses one.
    pub fn mac_size(self) -> Option<usize> {
        if !self.uses_mac() {
            return None;
        }
        Some(match self.hash() {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
        })
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_key_exchange() {
        let suite = CipherSuite::TLS_ECDH_RSA_WITH_AES_128_CBC_SHA;
        assert!(suite.is_ecdh());
        assert!(!suite.is_ephemeral());
        assert_eq!(suite.signature_family(), SignatureFamily::Rsa);

        let suite = CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256;
        assert!(suite.is_ecdh());
        assert!(suite.is_ephemeral());
        assert!(suite.is_aead());

        assert!(!CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA.is_ecdh());
        assert!(CipherSuite::TLS_AES_128_GCM_SHA256.is_tls13());
    }

    #[test]
    fn mac_size_follows_hash() {
        assert_eq!(CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA.mac_size(), Some(20));
        assert_eq!(
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384.mac_size(),
            Some(48)
        );
        assert_eq!(CipherSuite::TLS_AES_128_GCM_SHA256.mac_size(), None);
    }

    #[test]
    fn display_uses_iana_name() {
        assert_eq!(
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256.to_string(),
            "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"
        );
        assert_eq!(CipherSuite::TLS_ECDHE_RSA_WITH_RC4_128_SHA.wire_value(), 0xc011);
    }
}
