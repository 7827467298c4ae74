use crate::config::toml_config::AdvisorConfig;
use crate::core::eligibility::EligibilityEngine;
use crate::core::extractor::AttributeExtractor;
use crate::core::formatter::ResponseFormatter;
use crate::core::pricing::{PriceTable, PricingResolver};
use crate::domain::model::{DiagnosisResult, HardwareProfile};
use crate::domain::ports::Advisor;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// text → profile → eligibility → price → formatted answer
///
/// Holds only read-only configuration, so one instance can serve concurrent requests.
pub struct DiagnosisPipeline {
    config: Arc<AdvisorConfig>,
    prices: PriceTable,
}

impl DiagnosisPipeline {
    pub fn new(config: Arc<AdvisorConfig>) -> Self {
        let prices = PriceTable::from_config(&config.pricing);
        Self { config, prices }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    pub fn price_table(&self) -> &PriceTable {
        &self.prices
    }

    pub fn extract(&self, text: &str) -> HardwareProfile {
        AttributeExtractor::new(&self.config.vocabulary).extract(text)
    }

    /// Only a price table miss is returned as `Err`; every other outcome is a `DiagnosisResult`.
    pub fn diagnose(&self, text: &str) -> Result<DiagnosisResult> {
        let profile = self.extract(text);
        self.diagnose_profile(&profile)
    }

    pub fn diagnose_profile(&self, profile: &HardwareProfile) -> Result<DiagnosisResult> {
        if profile.is_laptop {
            tracing::info!("💻 Laptop detected, no overclocking service");
            return Ok(DiagnosisResult::LaptopExcluded);
        }

        let missing = profile.missing_mandatory();
        if !missing.is_empty() {
            tracing::info!(
                "❓ Insufficient information, missing: {}",
                missing
                    .iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return Ok(DiagnosisResult::InsufficientInformation { missing });
        }

        let decision = EligibilityEngine::evaluate(profile);
        let bundle = PricingResolver::new(&self.prices).resolve(&decision, profile.ram_generation)?;

        if let Some(bundle) = &bundle {
            tracing::info!(
                "✅ Bundle '{}' at {}{} ({})",
                bundle.bundle_name,
                bundle.price_amount,
                self.prices.currency(),
                profile.ram_generation
            );
        } else {
            tracing::info!("🚫 No overclocking bundle available");
        }

        let text = ResponseFormatter::new(self.prices.currency()).format(&decision, bundle.as_ref());
        Ok(DiagnosisResult::Formatted(text))
    }
}

#[async_trait]
impl Advisor for DiagnosisPipeline {
    async fn advise(&self, profile: &HardwareProfile) -> Result<String> {
        self.diagnose_profile(profile)
            .map(|result| result.message().to_string())
    }

    fn name(&self) -> &str {
        "rules"
    }
}
