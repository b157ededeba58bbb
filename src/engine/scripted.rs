//! In-memory handshake engine answering every exchange from a closure.
//! Used for dry runs and tests; it never touches the network.

use super::handshake::{Connection, ExchangePlan, Execution, HandshakeEngine};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Script = dyn Fn(&ExchangePlan) -> anyhow::Result<Execution> + Send + Sync;

#[derive(Clone)]
pub struct ScriptedEngine {
    script: Arc<Script>,
    connects: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    plans: Arc<Mutex<Vec<ExchangePlan>>>,
}

impl ScriptedEngine {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&ExchangePlan) -> anyhow::Result<Execution> + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(script),
            connects: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            plans: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Every plan executed so far, in order.
    pub fn plans(&self) -> Vec<ExchangePlan> {
        self.plans
            .lock()
            .map(|plans| plans.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HandshakeEngine for ScriptedEngine {
    async fn connect(&self) -> anyhow::Result<Box<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection {
            engine: self.clone(),
        }))
    }
}

struct ScriptedConnection {
    engine: ScriptedEngine,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn execute(&mut self, plan: &ExchangePlan) -> anyhow::Result<Execution> {
        if let Ok(mut plans) = self.engine.plans.lock() {
            plans.push(plan.clone());
        }
        (self.engine.script)(plan)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.engine.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
