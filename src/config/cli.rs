use crate::domain::ports::ReportSource;
use crate::utils::error::Result;
use crate::utils::text::normalize_report;
use crate::utils::validation::validate_file_extension;
use std::path::Path;

pub const REPORT_EXTENSIONS: &[&str] = &["html", "htm", "txt"];

/// 從本機磁碟讀取診斷報告並轉成純文字
#[derive(Debug, Clone)]
pub struct LocalReportSource {
    base_path: String,
}

impl LocalReportSource {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Default for LocalReportSource {
    fn default() -> Self {
        Self::new(".".to_string())
    }
}

impl ReportSource for LocalReportSource {
    async fn read_report(&self, path: &str) -> Result<String> {
        validate_file_extension("report", path, REPORT_EXTENSIONS)?;

        let full_path = Path::new(&self.base_path).join(path);
        let bytes = tokio::fs::read(&full_path).await?;
        // 非 UTF-8 位元組以替換字元處理，不中斷分析
        let raw = String::from_utf8_lossy(&bytes);

        let is_html = full_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "html" | "htm"))
            .unwrap_or(false);

        tracing::debug!(
            "Read report {} ({} bytes, html: {})",
            full_path.display(),
            bytes.len(),
            is_html
        );

        Ok(normalize_report(&raw, is_html))
    }
}
