use crate::adapters::remote::RemoteAdvisor;
use crate::config::toml_config::{AdvisorConfig, AdvisorMode};
use crate::core::diagnosis::DiagnosisPipeline;
use crate::domain::model::{DiagnosisResult, HardwareProfile};
use crate::domain::ports::{Advisor, ReportSource};
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use std::sync::Arc;

/// Entry point for the message-handling collaborator.
///
/// Laptop and insufficient-information answers are always produced locally so both
/// advisors agree on them; everything else goes to the configured advisor.
pub struct DiagnosisService {
    pipeline: Arc<DiagnosisPipeline>,
    remote: Option<Box<dyn Advisor>>,
    fallback_to_rules: bool,
    strict_extraction: bool,
}

impl DiagnosisService {
    pub fn new(config: Arc<AdvisorConfig>) -> Result<Self> {
        let pipeline = Arc::new(DiagnosisPipeline::new(config.clone()));
        let prices = pipeline.price_table();
        tracing::info!(
            "💶 Price table {} effective from {}",
            prices.version(),
            prices.effective_from()
        );

        let remote: Option<Box<dyn Advisor>> = match config.service.mode {
            AdvisorMode::Rules => None,
            AdvisorMode::Remote => {
                let remote_config = validate_required_field("remote", &config.remote)?;
                let advisor = RemoteAdvisor::new(remote_config.clone(), pipeline.price_table().clone())?;
                Some(Box::new(advisor))
            }
        };

        Ok(Self {
            pipeline,
            remote,
            fallback_to_rules: config.service.fallback_to_rules,
            strict_extraction: config.service.strict_extraction,
        })
    }

    /// 以自訂的遠端 advisor 取代配置中的設定
    pub fn with_remote_advisor(mut self, advisor: Box<dyn Advisor>) -> Self {
        self.remote = Some(advisor);
        self
    }

    pub fn with_fallback_to_rules(mut self, enabled: bool) -> Self {
        self.fallback_to_rules = enabled;
        self
    }

    pub fn with_strict_extraction(mut self, enabled: bool) -> Self {
        self.strict_extraction = enabled;
        self
    }

    pub fn pipeline(&self) -> &DiagnosisPipeline {
        &self.pipeline
    }

    pub async fn handle_file<R: ReportSource>(&self, source: &R, path: &str) -> Result<String> {
        let text = source.read_report(path).await?;
        self.handle_report(&text).await
    }

    pub async fn handle_report(&self, text: &str) -> Result<String> {
        let profile = self.pipeline.extract(text);

        if let Some(answer) = self.local_short_circuit(&profile) {
            return answer;
        }

        let Some(remote) = &self.remote else {
            return self.pipeline.advise(&profile).await;
        };

        tracing::info!("🌐 Asking {} advisor", remote.name());
        match remote.advise(&profile).await {
            Ok(answer) => Ok(answer),
            Err(e) if self.fallback_to_rules => {
                tracing::warn!(
                    "⚠️ {} advisor failed ({}), answering with {}",
                    remote.name(),
                    e,
                    self.pipeline.name()
                );
                self.pipeline.advise(&profile).await
            }
            Err(e) => Err(e),
        }
    }

    fn local_short_circuit(&self, profile: &HardwareProfile) -> Option<Result<String>> {
        if profile.is_laptop {
            return Some(DiagnosisResult::LaptopExcluded.into_result());
        }
        let missing = profile.missing_mandatory();
        if missing.is_empty() {
            return None;
        }
        let result = DiagnosisResult::InsufficientInformation { missing };
        if self.strict_extraction {
            Some(result.into_result())
        } else {
            Some(Ok(result.message().to_string()))
        }
    }
}
