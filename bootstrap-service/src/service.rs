//! 引导执行服务模块

use async_trait::async_trait;

use crate::initializer::Initializer;
use common::errors::AppResult;
use common::models::report::BootstrapReport;
use common::models::spec::ProvisionPlan;

/// 引导服务 Trait
#[async_trait]
pub trait ProvisionerTrait: Send + Sync {
    /// 检查服务器连通性，返回往返延迟（毫秒）
    async fn ping(&self) -> AppResult<u64>;

    /// 应用预配计划
    async fn apply(&self, plan: &ProvisionPlan, run_id: &str) -> AppResult<BootstrapReport>;
}

/// MongoDB 引导执行服务
pub struct Provisioner {
    initializer: Initializer,
}

impl Provisioner {
    /// 创建新的引导服务实例
    pub fn new(initializer: Initializer) -> Self {
        Self { initializer }
    }

    /// 关闭底层客户端连接
    pub async fn close(self) {
        self.initializer.close().await;
    }
}

#[async_trait]
impl ProvisionerTrait for Provisioner {
    async fn ping(&self) -> AppResult<u64> {
        let latency = self.initializer.ping().await?;
        Ok(latency.as_millis() as u64)
    }

    async fn apply(&self, plan: &ProvisionPlan, run_id: &str) -> AppResult<BootstrapReport> {
        let report = self.initializer.apply(plan, run_id).await?;
        tracing::info!(
            run_id = %run_id,
            created = report.created(),
            already_existed = report.already_existed(),
            "预配计划已应用"
        );
        Ok(report)
    }
}
