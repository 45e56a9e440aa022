//! MongoDB 数据库初始化引导服务
//!
//! 在环境预配阶段运行一次，包括：
//! - 连接目标 MongoDB 服务器并校验连通性
//! - 按预配计划创建数据库与集合
//! - 已存在的集合视为成功（幂等重跑）

mod initializer;
mod service;

use anyhow::Context;
use common::config::AppConfig;
use common::models::report::BootstrapReport;
use common::models::spec::ProvisionPlan;
use initializer::Initializer;
use service::{Provisioner, ProvisionerTrait};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const SERVICE_NAME: &str = "bootstrap-service";

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME);

    if let Err(e) = run(config).await {
        error!(error = %e, "引导执行失败");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let run_id = Uuid::new_v4().to_string();
    let plan = load_plan(&config).context("failed to load provision plan")?;
    info!(
        run_id = %run_id,
        server = %config.mongo_bind_addr,
        databases = plan.databases.len(),
        "启动引导"
    );

    let initializer = Initializer::connect(&config)
        .await
        .context("failed to connect to MongoDB")?;
    let provisioner = Provisioner::new(initializer);

    // 无论成败，先释放客户端再传播结果
    let outcome = provision(&provisioner, &plan, &run_id).await;
    provisioner.close().await;

    let report = outcome?;
    info!(
        run_id = %run_id,
        created = report.created(),
        already_existed = report.already_existed(),
        duration_ms = report.duration_ms,
        "引导完成"
    );
    Ok(())
}

async fn provision(
    provisioner: &impl ProvisionerTrait,
    plan: &ProvisionPlan,
    run_id: &str,
) -> anyhow::Result<BootstrapReport> {
    let latency_ms = provisioner.ping().await.context("MongoDB ping failed")?;
    info!(latency_ms, "服务器连通正常");

    let report = provisioner
        .apply(plan, run_id)
        .await
        .context("failed to apply provision plan")?;
    Ok(report)
}

/// 解析预配计划：优先使用外部 JSON 计划文件，否则使用编译内置目标
fn load_plan(config: &AppConfig) -> anyhow::Result<ProvisionPlan> {
    let plan = match &config.plan_path {
        Some(path) => {
            info!(path = %path, "使用外部预配计划");
            ProvisionPlan::from_json_file(path)?
        }
        None => ProvisionPlan::default(),
    };
    plan.validate()?;
    Ok(plan.normalized())
}

/// Load .env file from the working directory (best-effort, no error if missing).
fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if env_path.exists() {
        if let Ok(content) = std::fs::read_to_string(env_path) {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim();
                    // Only set if not already set by the environment
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
        }
    }
}
