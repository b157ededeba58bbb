#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tls_probe_engine::engine::handshake::{ExchangePlan, Execution};
use tls_probe_engine::engine::scripted::ScriptedEngine;
use tls_probe_engine::model::TestResult;
use tls_probe_engine::oracle::{MessageKind, ResponseFingerprint};
use tls_probe_engine::report::{Property, Report};
use tls_probe_engine::tls::{CipherSuite, EcPoint, NamedGroup, ProtocolVersion};

/// Report for a server speaking every version with static and ephemeral
/// ECDH, renegotiation and TLS 1.3 resumption.
pub fn full_report() -> Report {
    let mut report = Report::new("example.com");
    for property in [
        Property::SupportsTls10,
        Property::SupportsTls11,
        Property::SupportsTls12,
        Property::SupportsTls13,
        Property::SupportsEcdh,
        Property::SupportsStaticEcdh,
        Property::SupportsUncompressedPoint,
        Property::SupportsAnsix962CompressedPrime,
        Property::SupportsClientSideSecureRenegotiation,
        Property::SupportsTls13SessionTickets,
        Property::SupportsTls13PskDhe,
        Property::SupportsHttps,
    ] {
        report.put_result(property, TestResult::True);
    }
    report.put_result(Property::SupportsClientSideInsecureRenegotiation, TestResult::False);
    report.put_result(Property::SupportsSecpCompressionTls13, TestResult::False);

    report.versions = Some(vec![
        ProtocolVersion::Tls10,
        ProtocolVersion::Tls11,
        ProtocolVersion::Tls12,
        ProtocolVersion::Tls13,
    ]);
    report.supported_groups = Some(vec![
        NamedGroup::Secp256r1,
        NamedGroup::Secp192r1,
        NamedGroup::X25519,
        NamedGroup::X448,
        NamedGroup::Sect163k1,
    ]);
    report.supported_tls13_groups = Some(vec![
        NamedGroup::X25519,
        NamedGroup::Secp256r1,
        NamedGroup::X448,
    ]);

    let legacy = vec![
        CipherSuite::TLS_ECDH_RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA,
        CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
    ];
    let mut tls12 = legacy.clone();
    tls12.extend([
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    ]);
    let mut suites = BTreeMap::new();
    suites.insert(ProtocolVersion::Tls10, legacy.clone());
    suites.insert(ProtocolVersion::Tls11, legacy);
    suites.insert(ProtocolVersion::Tls12, tls12);
    suites.insert(
        ProtocolVersion::Tls13,
        vec![
            CipherSuite::TLS_AES_128_GCM_SHA256,
            CipherSuite::TLS_CHACHA20_POLY1305_SHA256,
        ],
    );
    report.version_suites = Some(suites);
    report
}

pub fn fingerprint(messages: Vec<MessageKind>) -> ResponseFingerprint {
    ResponseFingerprint {
        messages,
        ..ResponseFingerprint::default()
    }
}

/// Peer that rejects every crafted point and draws a fresh key per handshake.
pub fn validating_engine() -> ScriptedEngine {
    let counter = Arc::new(AtomicU64::new(1));
    ScriptedEngine::new(move |_plan: &ExchangePlan| {
        let key = counter.fetch_add(1, Ordering::SeqCst).to_be_bytes();
        Ok(Execution {
            fingerprint: fingerprint(vec![
                MessageKind::ServerHello,
                MessageKind::Alert {
                    level: 2,
                    description: 47,
                },
            ]),
            peer_public_key: Some(EcPoint::new(key.to_vec(), key.to_vec())),
            crafted_point_negotiated: false,
        })
    })
}

/// Peer that finishes every crafted handshake with one static key.
pub fn vulnerable_engine() -> ScriptedEngine {
    ScriptedEngine::new(|_plan: &ExchangePlan| {
        Ok(Execution {
            fingerprint: fingerprint(vec![
                MessageKind::ServerHello,
                MessageKind::ChangeCipherSpec,
                MessageKind::Finished,
            ]),
            peer_public_key: Some(EcPoint::new(vec![0x00, 0x42], vec![0x17])),
            crafted_point_negotiated: true,
        })
    })
}
