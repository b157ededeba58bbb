//! Dependency-scheduled TLS probes with statistical oracle vectors.
//!
//! A [`engine::Scheduler`] runs [`probe::Probe`] implementations against one
//! shared [`report::ReportStore`]. Probes talk to the peer only through a
//! [`engine::handshake::HandshakeEngine`].

pub mod engine;
pub mod model;
pub mod oracle;
pub mod output;
pub mod plan;
pub mod probe;
pub mod report;
pub mod tls;
pub mod util;
