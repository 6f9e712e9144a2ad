pub mod assembler;
pub mod countdown;
pub mod dosage;
pub mod indications;
pub mod monitor;

pub use assembler::{AnswerAssembler, ItemSelection, SelectionEdit, SelectionState};
pub use countdown::{Countdown, CountdownTimer, TimerEvent};
pub use dosage::{DosageClass, FormDosageSelection};
pub use indications::IndicationCatalog;
pub use monitor::{
    HostBus, HostEvent, Interaction, MonitorEvent, MonitorPolicy, ViolationMonitor,
};
