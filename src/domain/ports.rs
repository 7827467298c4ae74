use crate::domain::model::HardwareProfile;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ReportSource: Send + Sync {
    fn read_report(&self, path: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Produces the user-facing recommendation for an already extracted profile.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, profile: &HardwareProfile) -> Result<String>;

    fn name(&self) -> &str;
}
