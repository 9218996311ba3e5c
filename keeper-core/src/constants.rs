/// 备份制品相关常量
pub mod backup {
    /// 默认制品文件名前缀
    pub const DEFAULT_PREFIX: &str = "dump_";

    /// 默认备份根目录
    pub const DEFAULT_DIR: &str = "backups";

    /// 制品文件名中的UTC时间戳格式（秒级，字典序即时间序）
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// 摘要sidecar文件的扩展名
    pub const SIDECAR_SUFFIX: &str = "sha256";

    /// 加密副本的扩展名
    pub const ENCRYPTED_SUFFIX: &str = "enc";
}

/// 定时调度相关常量
pub mod cron {
    /// 默认自动备份cron表达式（每天凌晨2点）
    pub const DEFAULT_BACKUP_CRON: &str = "0 2 * * *";

    /// Cron表达式字段数量
    pub const CRON_FIELDS_COUNT: usize = 5;

    /// 调度日志文件名
    pub const LOG_FILE_NAME: &str = "scheduler.log";
}

/// 加密子系统相关常量
pub mod crypto {
    /// AES-256-GCM 密钥长度（字节）
    pub const KEY_LEN: usize = 32;

    /// AES-256-GCM nonce长度（96位）
    pub const NONCE_LEN: usize = 12;

    /// CSRF令牌的随机字节数（128位，hex编码后32字符）
    pub const CSRF_TOKEN_BYTES: usize = 16;
}

/// TOTP (RFC 6238) 相关常量
pub mod totp {
    /// 时间步长（秒）
    pub const STEP_SECS: i64 = 30;

    /// 验证码位数
    pub const DIGITS: u32 = 6;

    /// 默认允许的时间步偏移窗口
    pub const DEFAULT_WINDOW: i64 = 1;
}

/// 外部转储/装载工具相关常量
pub mod tool {
    /// mysqldump 的常见安装位置（按顺序探测，最后回退到 PATH）
    pub const MYSQLDUMP_CANDIDATES: &[&str] =
        &["/usr/bin/mysqldump", "/usr/local/bin/mysqldump"];

    /// mysql 客户端的常见安装位置
    pub const MYSQL_CANDIDATES: &[&str] = &["/usr/bin/mysql", "/usr/local/bin/mysql"];

    /// PATH 中查找的转储工具名
    pub const MYSQLDUMP_BIN: &str = "mysqldump";

    /// PATH 中查找的装载工具名
    pub const MYSQL_BIN: &str = "mysql";
}

/// 应用配置相关常量
pub mod config {
    /// 默认配置文件名
    pub const CONFIG_FILE_NAME: &str = "config.toml";

    /// 按优先级查找的配置文件候选列表
    pub const CONFIG_CANDIDATES: &[&str] = &["config.toml", "keeper.toml", ".keeper.toml"];

    /// 默认单批INSERT的行数
    pub const DEFAULT_CHUNK_SIZE: usize = 1000;

    /// 默认轮换保留数量
    pub const DEFAULT_KEEP: usize = 30;
}
