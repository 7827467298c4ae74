use crate::config::toml_config::RemoteConfig;
use crate::core::formatter::{HEADER_LINE, INSTALLMENTS_SUFFIX, PRICE_LINE_PREFIX};
use crate::core::pricing::PriceTable;
use crate::domain::model::{
    CpuVendor, GpuVendor, HardwareProfile, LAPTOP_EXCLUDED_MESSAGE, NO_SERVICE_MESSAGE,
};
use crate::domain::ports::Advisor;
use crate::utils::error::{AdvisorError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// 委派給遠端文字生成服務（Mistral 相容的 chat completions API）
///
/// Only the extracted profile is sent, never the raw report. The answer is expected to
/// follow the same template as the local formatter but cannot be validated here.
pub struct RemoteAdvisor {
    client: Client,
    config: RemoteConfig,
    prices: PriceTable,
}

impl RemoteAdvisor {
    pub fn new(config: RemoteConfig, prices: PriceTable) -> Result<Self> {
        if !config.has_resolved_api_key() {
            return Err(AdvisorError::MissingConfigError {
                field: "remote.api_key".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            config,
            prices,
        })
    }

    pub fn build_prompt(&self, profile: &HardwareProfile) -> String {
        let cpu = profile
            .cpu
            .as_ref()
            .map(|cpu| {
                let vendor = match cpu.vendor {
                    CpuVendor::Amd => "AMD",
                    CpuVendor::Intel => "Intel",
                    CpuVendor::Unknown => "unknown",
                };
                format!(
                    "{} ({}, unlocked K/KF/KS: {})",
                    cpu.raw_label,
                    vendor,
                    if cpu.is_unlocked_intel { "yes" } else { "no" }
                )
            })
            .unwrap_or_else(|| "unknown".to_string());

        let gpu = profile
            .gpu
            .as_ref()
            .map(|gpu| {
                let vendor = match gpu.vendor {
                    GpuVendor::Nvidia => "NVIDIA",
                    GpuVendor::Amd => "AMD",
                    GpuVendor::IntelIntegrated => "Intel integrated",
                    GpuVendor::Unknown => "unknown",
                };
                format!("{} ({})", gpu.raw_label, vendor)
            })
            .unwrap_or_else(|| "none detected".to_string());

        let currency = self.prices.currency();
        let price_rows = self
            .prices
            .rows()
            .iter()
            .map(|row| {
                format!(
                    "   - {}: DDR4 {}{}, DDR5 {}{}",
                    row.bundle_name, row.ddr4, currency, row.ddr5, currency
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let unsold = {
            let mut names: Vec<&str> = self.prices.unsold().collect();
            names.sort_unstable();
            if names.is_empty() {
                String::new()
            } else {
                format!("   Not sold on their own: {}\n", names.join(", "))
            }
        };

        format!(
            r#"Hardware extracted from a PC diagnostic report:
- RAM type: {ram}
- RAM slot reported empty: {empty_slot}
- Motherboard chipset: {chipset}
- CPU: {cpu}
- GPU: {gpu}
- Laptop: {laptop}

1. Decide which components can be overclocked:
   CPU: AMD Ryzen only with a B- or X-series chipset; Intel only for K, KF or KS models on a Z-series chipset.
   RAM: AMD Ryzen only with a B- or X-series chipset; Intel only with a Z-series, B560, B660 or B760 chipset; never when a RAM slot is reported empty.
   GPU: only NVIDIA or AMD cards, never Intel integrated graphics (Intel UHD, Intel Iris).
   No overclocking at all for laptops.

2. Prices (price table {version}):
{price_rows}
{unsold}
3. Reply with exactly this format and nothing else:
{header}
- <one line per overclockable component, in the order CPU, RAM, GPU>

{prefix} <components joined with " + "> for <price>{currency}

   - Append "{suffix}" to the price line for DDR5 prices.
   - For a laptop reply only: "{laptop_sentence}"
   - When nothing can be overclocked reply only: "{none_sentence}""#,
            ram = profile.ram_generation,
            empty_slot = if profile.ram_slot_empty { "yes" } else { "no" },
            chipset = profile.motherboard_chipset.as_deref().unwrap_or("unknown"),
            cpu = cpu,
            gpu = gpu,
            laptop = if profile.is_laptop { "yes" } else { "no" },
            version = self.prices.version(),
            price_rows = price_rows,
            unsold = unsold,
            header = HEADER_LINE,
            prefix = PRICE_LINE_PREFIX,
            currency = currency,
            suffix = INSTALLMENTS_SUFFIX.trim(),
            laptop_sentence = LAPTOP_EXCLUDED_MESSAGE,
            none_sentence = NO_SERVICE_MESSAGE,
        )
    }

    fn retry_after_seconds(&self, headers: &HeaderMap) -> u64 {
        headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or_else(|| self.config.default_retry_after_seconds())
            .min(self.config.max_retry_after_seconds())
    }
}

#[async_trait]
impl Advisor for RemoteAdvisor {
    async fn advise(&self, profile: &HardwareProfile) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: self.build_prompt(profile),
            }],
        };

        let max_retries = self.config.max_rate_limit_retries();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            tracing::debug!(
                "Calling remote advisor {} (attempt {})",
                self.config.endpoint,
                attempts
            );

            let response = self
                .client
                .post(&self.config.endpoint)
                .bearer_auth(&self.config.api_key)
                .json(&request)
                .send()
                .await
                .inspect_err(|e| tracing::error!("❌ Remote advisor request failed: {}", e))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = self.retry_after_seconds(response.headers());
                if attempts > max_retries {
                    tracing::error!(
                        "❌ Remote advisor still rate limited after {} attempts",
                        attempts
                    );
                    return Err(AdvisorError::UpstreamRateLimited {
                        attempts,
                        retry_after_secs,
                    });
                }
                tracing::warn!(
                    "⏳ Remote advisor rate limited, retrying in {}s",
                    retry_after_secs
                );
                tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::error!("❌ Remote advisor returned HTTP {}", status);
                return Err(AdvisorError::UpstreamStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().await?;
            let completion: ChatCompletionResponse = serde_json::from_str(&body)
                .inspect_err(|e| tracing::error!("❌ Remote advisor returned malformed JSON: {}", e))?;
            return completion
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content.trim().to_string())
                .filter(|content| !content.is_empty())
                .ok_or_else(|| AdvisorError::UpstreamResponseError {
                    message: "response contained no message content".to_string(),
                });
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}
