use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use tracing::error;

use layout_assembler::orchestrator::App;
use layout_assembler::utils::logging;
use layout_assembler::Config;

const DEFAULT_CONFIG: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // 配置加载失败时日志可能还没初始化
            logging::init(false);
            error!("❌ 运行失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    // 加载配置
    let mut config = Config::load(&config_path).await?;
    config.apply_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    config.validate()?;

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
