use typed_builder::TypedBuilder;

use crate::cpu::DEFAULT_HALT_SKIP_LIMIT;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Model {
    #[default]
    Dmg,
    /// Only difference modelled: KEY1 and the double-speed switch.
    Cgb,
}

/// Machine construction options.
///
/// ```
/// use tickboy_core::{MachineConfig, Model};
///
/// let config = MachineConfig::builder().model(Model::Cgb).build();
/// assert!(config.skip_boot);
/// ```
#[derive(Clone, Debug, TypedBuilder)]
pub struct MachineConfig {
    #[builder(default)]
    pub model: Model,
    /// Start at 0x0100 with the registers and IO the boot ROM leaves behind.
    /// When false everything starts zeroed at PC=0x0000 with the LCD off.
    #[builder(default = true)]
    pub skip_boot: bool,
    /// Scheduler events HALT may skip before the CPU counts as stuck.
    #[builder(default = DEFAULT_HALT_SKIP_LIMIT)]
    pub halt_skip_limit: u32,
    /// Ticks between audio mix samples.
    #[builder(default = 128)]
    pub sample_period: u32,
    #[builder(default = 16384)]
    pub sample_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
