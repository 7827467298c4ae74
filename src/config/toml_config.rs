use crate::domain::model::{Component, GpuVendor, RamGeneration};
use crate::utils::error::{AdvisorError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

/// 隨程式發佈的預設配置
pub const BUILTIN_CONFIG: &str = include_str!("../../advisor.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub pricing: PricingConfig,
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    pub remote: Option<RemoteConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub version: String,
    pub effective_from: NaiveDate,
    pub currency: String,
    pub bundles: Vec<BundlePriceConfig>,
    /// 可超頻但不販售的組合
    #[serde(default)]
    pub unsold: Vec<Vec<Component>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlePriceConfig {
    pub components: Vec<Component>,
    pub ddr4: u32,
    pub ddr5: u32,
}

impl BundlePriceConfig {
    pub fn price_for(&self, generation: RamGeneration) -> Option<u32> {
        match generation {
            RamGeneration::Ddr4 => Some(self.ddr4),
            RamGeneration::Ddr5 => Some(self.ddr5),
            RamGeneration::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    pub laptop_markers: Vec<String>,
    pub chipsets: Vec<String>,
    pub cpu_labels: Vec<String>,
    pub gpu_labels: Vec<String>,
    pub gpu: Vec<GpuKeywordConfig>,
    #[serde(default)]
    pub ram_slot_labels: Vec<String>,
    #[serde(default)]
    pub empty_slot_markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuKeywordConfig {
    pub keywords: Vec<String>,
    pub vendor: GpuVendor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisorMode {
    #[default]
    Rules,
    Remote,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub mode: AdvisorMode,
    #[serde(default)]
    pub fallback_to_rules: bool,
    /// 資訊不足時回傳錯誤而非提示句
    #[serde(default)]
    pub strict_extraction: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: Option<u64>,
    pub max_rate_limit_retries: Option<u32>,
    pub default_retry_after_seconds: Option<u64>,
    pub max_retry_after_seconds: Option<u64>,
}

impl RemoteConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(60)
    }

    pub fn max_rate_limit_retries(&self) -> u32 {
        self.max_rate_limit_retries.unwrap_or(1)
    }

    pub fn default_retry_after_seconds(&self) -> u64 {
        self.default_retry_after_seconds.unwrap_or(10)
    }

    pub fn max_retry_after_seconds(&self) -> u64 {
        self.max_retry_after_seconds.unwrap_or(60)
    }

    /// 環境變數未設定時 `${VAR}` 會原樣保留
    pub fn has_resolved_api_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && !key.starts_with("${")
    }
}

impl AdvisorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdvisorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 內建配置（advisor.toml）
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdvisorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MISTRAL_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdvisorError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        self.validate_pricing()?;
        self.validate_vocabulary()?;

        if let Some(remote) = &self.remote {
            validation::validate_url("remote.endpoint", &remote.endpoint)?;
            validation::validate_non_empty_string("remote.model", &remote.model)?;
            validation::validate_positive_number("remote.timeout_seconds", remote.timeout_seconds(), 1)?;
        }

        if self.service.mode == AdvisorMode::Remote {
            validation::validate_required_field("remote", &self.remote)?;
        }

        for (generation, bundle) in self.missing_bundle_rows() {
            tracing::warn!(
                "⚠️ Price table {} has no entry for '{}' ({}); that outcome will fail",
                self.pricing.version,
                bundle,
                generation
            );
        }

        Ok(())
    }

    fn validate_pricing(&self) -> Result<()> {
        validation::validate_non_empty_string("pricing.version", &self.pricing.version)?;
        validation::validate_non_empty_list("pricing.bundles", &self.pricing.bundles)?;

        let mut seen = HashSet::new();
        for bundle in &self.pricing.bundles {
            validation::validate_non_empty_list("pricing.bundles.components", &bundle.components)?;

            let set: BTreeSet<Component> = bundle.components.iter().copied().collect();
            if set.len() != bundle.components.len() {
                return Err(AdvisorError::ConfigValidationError {
                    field: "pricing.bundles.components".to_string(),
                    message: format!("Duplicate component in {:?}", bundle.components),
                });
            }

            let name = crate::domain::model::bundle_name(&set);
            if !seen.insert(name.clone()) {
                return Err(AdvisorError::ConfigValidationError {
                    field: "pricing.bundles".to_string(),
                    message: format!("Bundle '{}' is defined more than once", name),
                });
            }

            validation::validate_positive_number(&format!("pricing.bundles[{}].ddr4", name), bundle.ddr4.into(), 1)?;
            validation::validate_positive_number(&format!("pricing.bundles[{}].ddr5", name), bundle.ddr5.into(), 1)?;
        }

        for components in &self.pricing.unsold {
            validation::validate_non_empty_list("pricing.unsold", components)?;
            let name = crate::domain::model::bundle_name(components);
            if seen.contains(&name) {
                return Err(AdvisorError::ConfigValidationError {
                    field: "pricing.unsold".to_string(),
                    message: format!("Bundle '{}' is both priced and unsold", name),
                });
            }
        }

        Ok(())
    }

    fn validate_vocabulary(&self) -> Result<()> {
        let vocab = &self.vocabulary;
        validation::validate_non_empty_list("vocabulary.laptop_markers", &vocab.laptop_markers)?;
        validation::validate_non_empty_list("vocabulary.chipsets", &vocab.chipsets)?;
        validation::validate_non_empty_list("vocabulary.gpu", &vocab.gpu)?;

        for chipset in &vocab.chipsets {
            if !chipset.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                return Err(AdvisorError::InvalidConfigValueError {
                    field: "vocabulary.chipsets".to_string(),
                    value: chipset.clone(),
                    reason: "Chipset tokens must start with their family letter".to_string(),
                });
            }
        }

        for entry in &vocab.gpu {
            validation::validate_non_empty_list("vocabulary.gpu.keywords", &entry.keywords)?;
            for keyword in &entry.keywords {
                validation::validate_non_empty_string("vocabulary.gpu.keywords", keyword)?;
            }
        }

        Ok(())
    }

    /// 每個非空組件子集在各 RAM 世代下缺少的價格（不含明列不販售者）
    pub fn missing_bundle_rows(&self) -> Vec<(RamGeneration, String)> {
        let configured: HashSet<String> = self
            .pricing
            .bundles
            .iter()
            .map(|b| crate::domain::model::bundle_name(&b.components))
            .chain(
                self.pricing
                    .unsold
                    .iter()
                    .map(|components| crate::domain::model::bundle_name(components)),
            )
            .collect();

        let all = [Component::Cpu, Component::Ram, Component::Gpu];
        let mut missing = Vec::new();
        for mask in 1u8..8 {
            let subset: Vec<Component> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << *i) != 0)
                .map(|(_, c)| *c)
                .collect();
            let name = crate::domain::model::bundle_name(&subset);
            if !configured.contains(&name) {
                missing.push((RamGeneration::Ddr4, name.clone()));
                missing.push((RamGeneration::Ddr5, name));
            }
        }
        missing
    }
}

impl Validate for AdvisorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[pricing]
version = "test"
effective_from = "2024-01-01"
currency = "€"

[[pricing.bundles]]
components = ["GPU"]
ddr4 = 30
ddr5 = 135

[vocabulary]
laptop_markers = ["Laptop"]
chipsets = ["B550"]
cpu_labels = ["CPU"]
gpu_labels = ["GPU"]

[[vocabulary.gpu]]
keywords = ["NVIDIA"]
vendor = "nvidia"
"#;

    #[test]
    fn test_builtin_config_parses_and_validates() {
        let config = AdvisorConfig::builtin().unwrap();

        assert_eq!(config.pricing.bundles.len(), 6);
        assert_eq!(config.vocabulary.chipsets[0], "A520M");
        assert_eq!(config.service.mode, AdvisorMode::Rules);
        assert_eq!(
            config.pricing.effective_from,
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builtin_table_covers_every_subset() {
        let config = AdvisorConfig::builtin().unwrap();

        assert!(config.missing_bundle_rows().is_empty());
        assert_eq!(config.pricing.unsold, vec![vec![Component::Ram]]);
    }

    #[test]
    fn test_minimal_table_reports_missing_rows() {
        let config = AdvisorConfig::from_toml_str(MINIMAL).unwrap();
        let missing = config.missing_bundle_rows();

        // 7 個非空子集，只設定了 GPU
        assert_eq!(missing.len(), 12);
        assert!(missing.iter().any(|(g, name)| *g == RamGeneration::Ddr5 && name == "CPU + RAM"));
    }

    #[test]
    fn test_priced_and_unsold_conflict_rejected() {
        let conflicting = MINIMAL.replace("currency = \"€\"", "currency = \"€\"\nunsold = [[\"GPU\"]]");
        let config = AdvisorConfig::from_toml_str(&conflicting).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = AdvisorConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.service.mode, AdvisorMode::Rules);
        assert!(!config.service.fallback_to_rules);
        assert!(config.remote.is_none());
        assert!(config.vocabulary.empty_slot_markers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("OC_ADVISOR_TEST_KEY", "secret-123");

        let content = format!(
            "{}\n[remote]\nendpoint = \"https://api.example.com/v1/chat/completions\"\napi_key = \"${{OC_ADVISOR_TEST_KEY}}\"\nmodel = \"mistral-small\"\n",
            MINIMAL
        );
        let config = AdvisorConfig::from_toml_str(&content).unwrap();
        let remote = config.remote.unwrap();

        assert_eq!(remote.api_key, "secret-123");
        assert!(remote.has_resolved_api_key());
        assert_eq!(remote.max_rate_limit_retries(), 1);
        assert_eq!(remote.default_retry_after_seconds(), 10);

        std::env::remove_var("OC_ADVISOR_TEST_KEY");
    }

    #[test]
    fn test_unresolved_api_key_is_detected() {
        let content = format!(
            "{}\n[remote]\nendpoint = \"https://api.example.com\"\napi_key = \"${{OC_ADVISOR_SURELY_UNSET_VAR}}\"\nmodel = \"m\"\n",
            MINIMAL
        );
        let config = AdvisorConfig::from_toml_str(&content).unwrap();
        assert!(!config.remote.unwrap().has_resolved_api_key());
    }

    #[test]
    fn test_duplicate_bundle_rejected() {
        let content = MINIMAL.replace(
            "[vocabulary]",
            "[[pricing.bundles]]\ncomponents = [\"GPU\"]\nddr4 = 1\nddr5 = 2\n\n[vocabulary]",
        );
        let config = AdvisorConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_price_rejected() {
        let content = MINIMAL.replace("ddr4 = 30", "ddr4 = 0");
        let config = AdvisorConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_remote_mode_requires_remote_section() {
        let content = format!("{}\n[service]\nmode = \"remote\"\n", MINIMAL);
        let config = AdvisorConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(AdvisorError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = AdvisorConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pricing.version, "test");
    }
}
