/// 设置日志记录系统
///
/// 库代码只使用 tracing 宏记录日志，输出行为在应用入口统一配置：
/// - 支持 RUST_LOG 环境变量控制日志级别
/// - 默认输出到stderr，终端使用简洁格式
/// - 设置 KEEPER_LOG_FILE 时改写到文件，使用详细格式便于排查
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Ok(log_file) = std::env::var("KEEPER_LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .expect("无法创建日志文件");

        fmt()
            .with_env_filter(env_filter)
            .with_writer(file)
            .with_target(true)
            .with_line_number(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .without_time()
            .compact()
            .init();
    }
}
