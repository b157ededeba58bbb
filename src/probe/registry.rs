use crate::engine::handshake::HandshakeEngine;
use crate::model::ScanConfig;
use std::sync::Arc;

use super::false_start::HttpFalseStartProbe;
use super::invalid_curve::InvalidCurveProbe;
use super::mac::MacProbe;
use super::sni::SniProbe;
use super::Probe;

/// Every probe this crate ships, sharing one handshake engine.
pub fn default_probes(config: &ScanConfig, engine: Arc<dyn HandshakeEngine>) -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(SniProbe::new(config.clone(), engine.clone())),
        Box::new(HttpFalseStartProbe::new(config.clone(), engine.clone())),
        Box::new(MacProbe::new(config.clone(), engine.clone())),
        Box::new(InvalidCurveProbe::new(config.clone(), engine)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::handshake::{ExchangePlan, Execution};
    use crate::engine::scripted::ScriptedEngine;
    use crate::probe::ProbeKind;

    #[test]
    fn one_probe_per_kind() {
        let engine = ScriptedEngine::new(|_plan: &ExchangePlan| Ok(Execution::default()));
        let probes = default_probes(&ScanConfig::default(), Arc::new(engine));
        let kinds: Vec<_> = probes.iter().map(|probe| probe.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ProbeKind::Sni,
                ProbeKind::HttpFalseStart,
                ProbeKind::Mac,
                ProbeKind::InvalidCurve
            ]
        );
    }
}
