use crate::protocol::{EngineEvent, OscSlot};
use crate::waveform;

#[derive(Debug, Clone, PartialEq, Eq)]
enum OverlayState {
    Idle,
    Overlaying { saved_label: Option<String> },
}

/// Shows the waveform name in the device selector while a waveform control
/// is dragged, and puts the selector text back when the drag ends.
#[derive(Debug, Clone)]
pub struct LabelOverlay {
    slot: OscSlot,
    state: OverlayState,
}

impl LabelOverlay {
    pub fn new(slot: OscSlot) -> Self {
        Self {
            slot,
            state: OverlayState::Idle,
        }
    }

    pub fn slot(&self) -> OscSlot {
        self.slot
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, OverlayState::Overlaying { .. })
    }

    /// Captures the selector text and blanks it. A repeated pointer-down keeps
    /// the text captured first.
    pub fn pointer_down(&mut self, current_label: Option<String>) -> EngineEvent {
        if !self.is_active() {
            self.state = OverlayState::Overlaying {
                saved_label: current_label,
            };
        }
        self.preview(String::new())
    }

    /// Preview for a value change, if a drag is in progress.
    pub fn input(&self, value: u8) -> Option<EngineEvent> {
        if !self.is_active() {
            return None;
        }
        let label = waveform::decode(self.slot, value).label();
        Some(self.preview(label.to_string()))
    }

    /// Ends the drag and restores the captured text verbatim.
    pub fn pointer_up(&mut self) -> Option<EngineEvent> {
        match std::mem::replace(&mut self.state, OverlayState::Idle) {
            OverlayState::Idle => None,
            OverlayState::Overlaying { saved_label } => Some(EngineEvent::WaveformLabelRestore {
                slot: self.slot,
                label: saved_label.unwrap_or_default(),
            }),
        }
    }

    fn preview(&self, label: String) -> EngineEvent {
        EngineEvent::WaveformLabelPreview {
            slot: self.slot,
            label,
        }
    }
}
