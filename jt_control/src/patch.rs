use crate::config::EngineConfig;
use crate::dispatcher::MessageDispatcher;
use crate::error::EngineError;
use crate::protocol::{ControlValue, ParamKind, ParamValue, DATA_MAX};
use crate::registry::{Parameter, ParameterRegistry};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Every parameter's value, in registry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSnapshot {
    entries: Vec<(&'static str, u8)>,
}

impl PatchSnapshot {
    fn from_values(registry: &ParameterRegistry, values: &[u8]) -> Self {
        Self {
            entries: registry
                .all()
                .iter()
                .zip(values)
                .map(|(p, v)| (p.id, *v))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[(&'static str, u8)] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<u8> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_wire(&self) -> Vec<ParamValue> {
        self.entries
            .iter()
            .map(|(id, value)| ParamValue {
                id: id.to_string(),
                value: *value,
            })
            .collect()
    }
}

/// Whole-patch operations plus the generic per-parameter handler.
pub struct PatchController<R = StdRng> {
    registry: ParameterRegistry,
    values: Vec<u8>,
    toggle_on_weight: u32,
    toggle_choices: u32,
    rng: R,
}

impl PatchController<StdRng> {
    pub fn new(registry: ParameterRegistry, config: &EngineConfig) -> Self {
        Self::with_rng(registry, config, StdRng::from_entropy())
    }
}

impl<R: Rng> PatchController<R> {
    pub fn with_rng(registry: ParameterRegistry, config: &EngineConfig, rng: R) -> Self {
        Self {
            values: registry.all().iter().map(|p| p.default_value).collect(),
            registry,
            toggle_on_weight: config.toggle_on_weight,
            toggle_choices: config.toggle_choices.max(1),
            rng,
        }
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    /// Values last sent for every parameter. Starts at the defaults.
    pub fn current(&self) -> PatchSnapshot {
        PatchSnapshot::from_values(&self.registry, &self.values)
    }

    /// Sends every parameter's default. Repeated calls produce identical traffic.
    pub fn apply_init(&mut self, dispatcher: &mut MessageDispatcher<'_>) -> PatchSnapshot {
        info!("initializing patch");
        let values = self.registry.all().iter().map(|p| p.default_value).collect();
        self.apply(dispatcher, values)
    }

    /// Sends a fresh random patch: levels uniform over `0..=127`, toggles on
    /// with odds `toggle_on_weight / toggle_choices`.
    pub fn apply_random(&mut self, dispatcher: &mut MessageDispatcher<'_>) -> PatchSnapshot {
        info!("randomizing patch");
        let params = self.registry.all();
        let values = params.iter().map(|p| self.random_value(p)).collect();
        self.apply(dispatcher, values)
    }

    /// Normalizes a UI value for one parameter, sends it and records it.
    pub fn set(
        &mut self,
        dispatcher: &mut MessageDispatcher<'_>,
        id: &str,
        value: ControlValue,
    ) -> Result<(&'static Parameter, u8), EngineError> {
        let index = self
            .registry
            .all()
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::UnknownParameter(id.to_string()))?;
        let param = &self.registry.all()[index];
        let wire = param.normalize(value);
        self.values[index] = wire;
        dispatcher.send(param.address, i32::from(wire));
        Ok((param, wire))
    }

    fn random_value(&mut self, param: &Parameter) -> u8 {
        match param.kind {
            ParamKind::Continuous => self.rng.gen_range(0..=DATA_MAX),
            ParamKind::Boolean => {
                if self.rng.gen_range(0..self.toggle_choices) < self.toggle_on_weight {
                    DATA_MAX
                } else {
                    0
                }
            }
        }
    }

    fn apply(&mut self, dispatcher: &mut MessageDispatcher<'_>, values: Vec<u8>) -> PatchSnapshot {
        self.values = values;
        for (param, value) in self.registry.all().iter().zip(&self.values) {
            dispatcher.send(param.address, i32::from(*value));
        }
        PatchSnapshot::from_values(&self.registry, &self.values)
    }
}
