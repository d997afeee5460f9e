use crate::protocol::{OscSlot, DATA_MAX};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Off,
    Triangle,
    Square,
    PulseWidth,
    Saw,
    SuperSaw,
    Fm,
    Noise,
}

impl Waveform {
    pub fn label(self) -> &'static str {
        match self {
            Waveform::Off => "OFF",
            Waveform::Triangle => "TRI",
            Waveform::Square => "SQR",
            Waveform::PulseWidth => "PWM",
            Waveform::Saw => "SAW",
            Waveform::SuperSaw => "SSAW",
            Waveform::Fm => "FM",
            Waveform::Noise => "NOISE",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Buckets as `(upper bound inclusive, waveform)`, ascending. The last bound is 127.
type BucketTable = &'static [(u8, Waveform)];

const OSC1_BUCKETS: BucketTable = &[
    (17, Waveform::Off),
    (35, Waveform::Triangle),
    (53, Waveform::Square),
    (71, Waveform::PulseWidth),
    (89, Waveform::Saw),
    (107, Waveform::SuperSaw),
    (127, Waveform::Fm),
];

const OSC2_BUCKETS: BucketTable = &[
    (20, Waveform::Off),
    (41, Waveform::Triangle),
    (62, Waveform::Square),
    (83, Waveform::PulseWidth),
    (104, Waveform::Saw),
    (127, Waveform::Noise),
];

pub fn buckets(slot: OscSlot) -> BucketTable {
    match slot {
        OscSlot::Osc1 => OSC1_BUCKETS,
        OscSlot::Osc2 => OSC2_BUCKETS,
    }
}

/// Names the waveform a raw CC value selects on the given oscillator.
pub fn decode(slot: OscSlot, value: u8) -> Waveform {
    let value = value.min(DATA_MAX);
    buckets(slot)
        .iter()
        .find(|(upper, _)| value <= *upper)
        .map(|(_, wave)| *wave)
        .unwrap_or(Waveform::Off)
}
