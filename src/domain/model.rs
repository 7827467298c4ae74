use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RamGeneration {
    Ddr4,
    Ddr5,
    Unknown,
}

impl fmt::Display for RamGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RamGeneration::Ddr4 => write!(f, "DDR4"),
            RamGeneration::Ddr5 => write!(f, "DDR5"),
            RamGeneration::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuVendor {
    Amd,
    Intel,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub vendor: CpuVendor,
    pub raw_label: String,
    /// 型號帶 K / KF / KS 後綴
    pub is_unlocked_intel: bool,
}

impl CpuInfo {
    pub fn is_ryzen(&self) -> bool {
        self.vendor == CpuVendor::Amd && self.raw_label.to_ascii_lowercase().contains("ryzen")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuVendor {
    Nvidia,
    Amd,
    IntelIntegrated,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuInfo {
    pub vendor: GpuVendor,
    pub raw_label: String,
}

/// Leading letter of a motherboard chipset token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipsetFamily {
    B,
    X,
    Z,
    Other(char),
}

impl ChipsetFamily {
    pub fn of(token: &str) -> Option<Self> {
        token.chars().next().map(|c| match c.to_ascii_uppercase() {
            'B' => ChipsetFamily::B,
            'X' => ChipsetFamily::X,
            'Z' => ChipsetFamily::Z,
            other => ChipsetFamily::Other(other),
        })
    }
}

/// Two conflicting pieces of evidence were found for one field; the first one won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ambiguity {
    RamGeneration,
    CpuVendor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub ram_generation: RamGeneration,
    pub motherboard_chipset: Option<String>,
    pub cpu: Option<CpuInfo>,
    pub gpu: Option<GpuInfo>,
    pub is_laptop: bool,
    pub ram_slot_empty: bool,
    pub ambiguities: Vec<Ambiguity>,
}

impl HardwareProfile {
    pub fn chipset_family(&self) -> Option<ChipsetFamily> {
        self.motherboard_chipset.as_deref().and_then(ChipsetFamily::of)
    }

    /// 缺少的必要欄位（RAM 世代、晶片組、CPU 廠牌）
    pub fn missing_mandatory(&self) -> Vec<MandatoryField> {
        let mut missing = Vec::new();
        if self.ram_generation == RamGeneration::Unknown {
            missing.push(MandatoryField::RamGeneration);
        }
        if self.motherboard_chipset.is_none() {
            missing.push(MandatoryField::Chipset);
        }
        if self
            .cpu
            .as_ref()
            .map(|cpu| cpu.vendor == CpuVendor::Unknown)
            .unwrap_or(true)
        {
            missing.push(MandatoryField::CpuVendor);
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MandatoryField {
    RamGeneration,
    Chipset,
    CpuVendor,
}

impl fmt::Display for MandatoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MandatoryField::RamGeneration => write!(f, "RAM generation"),
            MandatoryField::Chipset => write!(f, "motherboard chipset"),
            MandatoryField::CpuVendor => write!(f, "CPU vendor"),
        }
    }
}

/// Declaration order is the rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Component {
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "RAM")]
    Ram,
    #[serde(rename = "GPU")]
    Gpu,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Cpu => write!(f, "CPU"),
            Component::Ram => write!(f, "RAM"),
            Component::Gpu => write!(f, "GPU"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    Eligible,
    NoMatch,
    Laptop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverclockDecision {
    pub eligible_components: BTreeSet<Component>,
    pub reason: DecisionReason,
}

impl OverclockDecision {
    pub fn laptop() -> Self {
        Self {
            eligible_components: BTreeSet::new(),
            reason: DecisionReason::Laptop,
        }
    }

    pub fn from_components(eligible_components: BTreeSet<Component>) -> Self {
        let reason = if eligible_components.is_empty() {
            DecisionReason::NoMatch
        } else {
            DecisionReason::Eligible
        };
        Self {
            eligible_components,
            reason,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.eligible_components.is_empty()
    }
}

/// 組件集合的標準名稱，例如 "CPU + RAM + GPU"
pub fn bundle_name<'a, I>(components: I) -> String
where
    I: IntoIterator<Item = &'a Component>,
{
    let ordered: BTreeSet<&Component> = components.into_iter().collect();
    ordered
        .into_iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" + ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceBundle {
    pub bundle_name: String,
    pub price_amount: u32,
    pub installments_allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosisResult {
    Formatted(String),
    InsufficientInformation { missing: Vec<MandatoryField> },
    LaptopExcluded,
}

pub const LAPTOP_EXCLUDED_MESSAGE: &str = "No overclocking service available for laptops.";
pub const NO_SERVICE_MESSAGE: &str = "No overclocking service available.";
pub const INSUFFICIENT_INFORMATION_MESSAGE: &str =
    "Could not extract the required information from the report.";

impl DiagnosisResult {
    /// Text shown to the user for every outcome.
    pub fn message(&self) -> &str {
        match self {
            DiagnosisResult::Formatted(text) => text,
            DiagnosisResult::InsufficientInformation { .. } => INSUFFICIENT_INFORMATION_MESSAGE,
            DiagnosisResult::LaptopExcluded => LAPTOP_EXCLUDED_MESSAGE,
        }
    }

    /// Turns `InsufficientInformation` into an error for callers that want a hard failure.
    pub fn into_result(self) -> crate::utils::error::Result<String> {
        match self {
            DiagnosisResult::InsufficientInformation { missing } => {
                Err(crate::utils::error::AdvisorError::ExtractionInsufficient {
                    missing: missing.iter().map(|m| m.to_string()).collect(),
                })
            }
            other => Ok(other.message().to_string()),
        }
    }
}
