use crate::error::EngineError;
use crate::protocol::{ControlValue, OscSlot, ParamKind, ParameterInfo, DATA_MAX};

pub mod cc {
    pub mod global {
        pub const MODULATION: u8 = 1;
        pub const PORTAMENTO_TIME: u8 = 5;
    }

    pub mod osc {
        pub const BALANCE: u8 = 29;
        pub const OSC1_WAVE: u8 = 24;
        pub const OSC2_WAVE: u8 = 25;
        pub const OSC1_COARSE: u8 = 115;
        pub const OSC2_COARSE: u8 = 116;
        pub const OSC1_FINE: u8 = 111;
        pub const OSC2_FINE: u8 = 112;
        /// PWM, supersaw detune or FM feedback depending on the osc 1 waveform.
        pub const OSC1_PWM_DETUNE: u8 = 113;
        pub const OSC2_PWM: u8 = 114;
    }

    pub mod ring_mod {
        pub const AMOUNT: u8 = 95;
        pub const ON_OFF: u8 = 96;
    }

    pub mod lfo {
        pub const LFO1_AMOUNT: u8 = 70;
        pub const LFO2_AMOUNT: u8 = 28;
        pub const LFO1_RATE: u8 = 72;
        pub const LFO2_RATE: u8 = 73;
        pub const LFO1_WAVE: u8 = 54;
        pub const LFO2_WAVE: u8 = 55;
        pub const LFO1_DEST: u8 = 56;
    }

    pub mod vcf {
        pub const CUTOFF: u8 = 74;
        pub const RESONANCE: u8 = 71;
        pub const ENV_AMOUNT: u8 = 47;
        pub const ATTACK: u8 = 85;
        pub const DECAY: u8 = 86;
        pub const SUSTAIN: u8 = 87;
        pub const RELEASE: u8 = 88;
    }

    pub mod vca {
        pub const ATTACK: u8 = 81;
        pub const DECAY: u8 = 82;
        pub const SUSTAIN: u8 = 83;
        pub const RELEASE: u8 = 84;
    }
}

/// A controllable synth parameter and the CC address it is sent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub id: &'static str,
    pub group: &'static str,
    pub address: u8,
    pub default_value: u8,
    pub kind: ParamKind,
    pub waveform_slot: Option<OscSlot>,
}

impl Parameter {
    const fn level(id: &'static str, group: &'static str, address: u8, default_value: u8) -> Self {
        Self {
            id,
            group,
            address,
            default_value,
            kind: ParamKind::Continuous,
            waveform_slot: None,
        }
    }

    const fn toggle(id: &'static str, group: &'static str, address: u8, on: bool) -> Self {
        Self {
            id,
            group,
            address,
            default_value: if on { DATA_MAX } else { 0 },
            kind: ParamKind::Boolean,
            waveform_slot: None,
        }
    }

    const fn waveform(id: &'static str, address: u8, slot: OscSlot) -> Self {
        Self {
            id,
            group: "Oscillator",
            address,
            default_value: 0,
            kind: ParamKind::Continuous,
            waveform_slot: Some(slot),
        }
    }

    /// Maps a UI value onto the wire value for this parameter.
    ///
    /// Continuous parameters clamp into `0..=127`; boolean parameters only
    /// ever produce 0 or 127.
    pub fn normalize(&self, value: ControlValue) -> u8 {
        match (self.kind, value) {
            (ParamKind::Continuous, ControlValue::Level(v)) => v.clamp(0, DATA_MAX as i32) as u8,
            (ParamKind::Continuous, ControlValue::Toggle(on))
            | (ParamKind::Boolean, ControlValue::Toggle(on)) => {
                if on {
                    DATA_MAX
                } else {
                    0
                }
            }
            (ParamKind::Boolean, ControlValue::Level(v)) => {
                if v > 0 {
                    DATA_MAX
                } else {
                    0
                }
            }
        }
    }

    pub fn is_toggle(&self) -> bool {
        matches!(self.kind, ParamKind::Boolean)
    }

    pub fn info(&self) -> ParameterInfo {
        ParameterInfo {
            id: self.id.to_string(),
            group: self.group.to_string(),
            address: self.address,
            default_value: self.default_value,
            kind: self.kind,
            waveform_slot: self.waveform_slot,
        }
    }
}

// Order matters: init/random patches are replayed in this order.
const CATALOG: &[Parameter] = &[
    Parameter::level("mod-wheel", "Global", cc::global::MODULATION, 0),
    Parameter::level("portamento-time", "Global", cc::global::PORTAMENTO_TIME, 0),
    Parameter::level("osc-balance", "Oscillator", cc::osc::BALANCE, 64),
    Parameter::waveform("osc1-wave", cc::osc::OSC1_WAVE, OscSlot::Osc1),
    Parameter::waveform("osc2-wave", cc::osc::OSC2_WAVE, OscSlot::Osc2),
    Parameter::level("osc1-coarse", "Oscillator", cc::osc::OSC1_COARSE, 64),
    Parameter::level("osc2-coarse", "Oscillator", cc::osc::OSC2_COARSE, 64),
    Parameter::level("osc1-fine", "Oscillator", cc::osc::OSC1_FINE, 64),
    Parameter::level("osc2-fine", "Oscillator", cc::osc::OSC2_FINE, 64),
    Parameter::level("osc1-pwm-detune", "Oscillator", cc::osc::OSC1_PWM_DETUNE, 0),
    Parameter::level("osc2-pwm", "Oscillator", cc::osc::OSC2_PWM, 0),
    Parameter::level("ring-mod-amount", "Ring Mod", cc::ring_mod::AMOUNT, 0),
    Parameter::toggle("ring-mod-onoff", "Ring Mod", cc::ring_mod::ON_OFF, false),
    Parameter::level("lfo1-amount", "LFO", cc::lfo::LFO1_AMOUNT, 0),
    Parameter::level("lfo2-amount", "LFO", cc::lfo::LFO2_AMOUNT, 0),
    Parameter::level("lfo1-rate", "LFO", cc::lfo::LFO1_RATE, 64),
    Parameter::level("lfo2-rate", "LFO", cc::lfo::LFO2_RATE, 64),
    Parameter::level("lfo1-wave", "LFO", cc::lfo::LFO1_WAVE, 0),
    Parameter::level("lfo2-wave", "LFO", cc::lfo::LFO2_WAVE, 0),
    Parameter::level("lfo1-dest", "LFO", cc::lfo::LFO1_DEST, 0),
    Parameter::level("vcf-cutoff", "Filter", cc::vcf::CUTOFF, 80),
    Parameter::level("vcf-resonance", "Filter", cc::vcf::RESONANCE, 10),
    Parameter::level("vcf-env-amount", "Filter", cc::vcf::ENV_AMOUNT, 64),
    Parameter::level("vcf-attack", "Filter Envelope", cc::vcf::ATTACK, 0),
    Parameter::level("vcf-decay", "Filter Envelope", cc::vcf::DECAY, 64),
    Parameter::level("vcf-sustain", "Filter Envelope", cc::vcf::SUSTAIN, 0),
    Parameter::level("vcf-release", "Filter Envelope", cc::vcf::RELEASE, 0),
    Parameter::level("vca-attack", "Amp Envelope", cc::vca::ATTACK, 0),
    Parameter::level("vca-decay", "Amp Envelope", cc::vca::DECAY, 64),
    // Full sustain keeps the gate open on an init patch.
    Parameter::level("vca-sustain", "Amp Envelope", cc::vca::SUSTAIN, 127),
    Parameter::level("vca-release", "Amp Envelope", cc::vca::RELEASE, 0),
];

/// Read-only catalog of every parameter the surface can drive.
#[derive(Debug, Clone, Copy)]
pub struct ParameterRegistry {
    params: &'static [Parameter],
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self { params: CATALOG }
    }

    pub fn all(&self) -> &'static [Parameter] {
        self.params
    }

    pub fn get(&self, id: &str) -> Result<&'static Parameter, EngineError> {
        self.params
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::UnknownParameter(id.to_string()))
    }

    pub fn by_address(&self, address: u8) -> Option<&'static Parameter> {
        self.params.iter().find(|p| p.address == address)
    }

    pub fn waveform_parameters(&self) -> impl Iterator<Item = &'static Parameter> {
        self.params.iter().filter(|p| p.waveform_slot.is_some())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn infos(&self) -> Vec<ParameterInfo> {
        self.params.iter().map(Parameter::info).collect()
    }
}
