pub mod diagnosis;
pub mod eligibility;
pub mod extractor;
pub mod formatter;
pub mod pricing;

pub use crate::domain::model::{DiagnosisResult, HardwareProfile, OverclockDecision, PriceBundle};
pub use crate::domain::ports::{Advisor, ReportSource};
pub use crate::utils::error::Result;
