use clap::Parser;
use keeper_cli::{Cli, CliApp, Commands, run_init, setup_logging};
use keeper_core::KeeperError;
use tracing::error;

#[tokio::main]
async fn main() {
    // 解析命令行参数
    let cli = Cli::parse();

    // 设置日志记录
    setup_logging(cli.verbose);

    // `init` 命令是特例，它不需要预先加载配置
    if let Commands::Init { force } = cli.command {
        if let Err(e) = run_init(force).await {
            error!("❌ 初始化失败: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // 对于其他所有命令，先加载配置并初始化App。
    // 显式传入 --config 时只认该文件；否则按候选列表智能查找。
    let loaded = if cli.config.as_os_str() == "config.toml" {
        CliApp::new_with_auto_config()
    } else {
        CliApp::new_with_config_file(&cli.config)
    };

    let app = match loaded {
        Ok(app) => app,
        Err(KeeperError::ConfigNotFound) => {
            error!("❌ 配置文件 '{}' 未找到。", cli.config.display());
            error!("👉 请先运行 'keeper-cli init' 命令来创建配置文件。");
            std::process::exit(1);
        }
        Err(KeeperError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            error!("❌ 配置文件 '{}' 未找到。", cli.config.display());
            error!("👉 请先运行 'keeper-cli init' 命令来创建配置文件。");
            std::process::exit(1);
        }
        Err(e) => {
            error!("❌ 应用初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    // 运行命令
    if let Err(e) = app.run(cli.command).await {
        error!("❌ 操作失败: {}", e);
        std::process::exit(1);
    }
}
