use crate::domain::model::{
    ChipsetFamily, Component, CpuVendor, GpuVendor, HardwareProfile, OverclockDecision,
};
use std::collections::BTreeSet;

/// Intel B-series chipsets that still allow memory overclocking.
pub const INTEL_RAM_B_CHIPSETS: [&str; 3] = ["B560", "B660", "B760"];

/// Each component is checked on its own; the results are unioned.
pub struct EligibilityEngine;

impl EligibilityEngine {
    pub fn evaluate(profile: &HardwareProfile) -> OverclockDecision {
        if profile.is_laptop {
            return OverclockDecision::laptop();
        }

        let mut eligible = BTreeSet::new();
        if Self::cpu_eligible(profile) {
            eligible.insert(Component::Cpu);
        }
        if Self::ram_eligible(profile) {
            eligible.insert(Component::Ram);
        }
        if Self::gpu_eligible(profile) {
            eligible.insert(Component::Gpu);
        }

        tracing::debug!("Eligible components: {:?}", eligible);
        OverclockDecision::from_components(eligible)
    }

    fn cpu_eligible(profile: &HardwareProfile) -> bool {
        let Some(cpu) = &profile.cpu else {
            return false;
        };
        let family = profile.chipset_family();

        match cpu.vendor {
            CpuVendor::Amd => {
                cpu.is_ryzen() && matches!(family, Some(ChipsetFamily::B | ChipsetFamily::X))
            }
            CpuVendor::Intel => cpu.is_unlocked_intel && family == Some(ChipsetFamily::Z),
            CpuVendor::Unknown => false,
        }
    }

    fn ram_eligible(profile: &HardwareProfile) -> bool {
        if profile.ram_slot_empty {
            return false;
        }
        let Some(cpu) = &profile.cpu else {
            return false;
        };
        let family = profile.chipset_family();

        match cpu.vendor {
            CpuVendor::Amd => {
                cpu.is_ryzen() && matches!(family, Some(ChipsetFamily::B | ChipsetFamily::X))
            }
            CpuVendor::Intel => {
                family == Some(ChipsetFamily::Z)
                    || profile
                        .motherboard_chipset
                        .as_deref()
                        .map(|token| {
                            let token = token.to_ascii_uppercase();
                            INTEL_RAM_B_CHIPSETS.iter().any(|b| token.starts_with(b))
                        })
                        .unwrap_or(false)
            }
            CpuVendor::Unknown => false,
        }
    }

    fn gpu_eligible(profile: &HardwareProfile) -> bool {
        matches!(
            profile.gpu.as_ref().map(|gpu| gpu.vendor),
            Some(GpuVendor::Nvidia | GpuVendor::Amd)
        )
    }
}
