//! Start models: how a composite's waiting and service areas map onto its
//! sub-queues.

use std::fmt;

/// | Model                   | Waiting area           | Service area           | Start-armed        |
/// |-------------------------|------------------------|------------------------|--------------------|
/// | `Local`                 | composite's own        | composite's own        | always             |
/// | `EncapsulatorQueue`     | sub-queue's waiting    | sub-queue's service    | sub-queue's        |
/// | `EncapsulatorHideStart` | the whole sub-queue    | always empty           | never              |
/// | `CompressedTandem2`     | sub-queue 0's waiting  | sub-queue 1's service  | sub-queue 1's      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartModel {
    /// Jobs start at the composite; on start the delegate is sent to the
    /// selector's first sub-queue.
    #[default]
    Local,
    EncapsulatorQueue,
    EncapsulatorHideStart,
    CompressedTandem2,
}

impl StartModel {
    /// Exact number of sub-queues the model needs; `None` = any non-zero
    /// number.
    pub fn required_sub_queues(self) -> Option<usize> {
        match self {
            StartModel::Local => None,
            StartModel::EncapsulatorQueue | StartModel::EncapsulatorHideStart => Some(1),
            StartModel::CompressedTandem2 => Some(2),
        }
    }

    /// Whether discipline-specific sub-queue notifications are re-emitted at
    /// the composite.
    #[inline]
    pub fn is_encapsulator(self) -> bool {
        matches!(self, StartModel::EncapsulatorQueue | StartModel::EncapsulatorHideStart)
    }
}

impl fmt::Display for StartModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StartModel::Local => "local",
            StartModel::EncapsulatorQueue => "encapsulator",
            StartModel::EncapsulatorHideStart => "encapsulator-hide-start",
            StartModel::CompressedTandem2 => "compressed-tandem-2",
        };
        f.write_str(s)
    }
}
