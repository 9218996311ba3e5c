use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeeperError>;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("配置文件解析错误: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("配置文件序列化错误: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("数据库错误: {0}")]
    Db(#[from] sqlx::Error),

    #[error("外部工具退出码 {code}: {message}")]
    Tool { code: i32, message: String },

    #[error("加密错误: {0}")]
    Crypto(String),

    #[error("CSRF 校验失败")]
    Csrf,

    #[error("认证失败: {0}")]
    Auth(String),

    #[error("备份操作失败: {0}")]
    Backup(String),

    #[error("恢复操作失败: {0}")]
    Restore(String),

    #[error("任务执行错误: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("配置文件未找到")]
    ConfigNotFound,
}

impl KeeperError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn backup(msg: impl Into<String>) -> Self {
        Self::Backup(msg.into())
    }

    pub fn restore(msg: impl Into<String>) -> Self {
        Self::Restore(msg.into())
    }

    pub fn tool(code: i32, message: impl Into<String>) -> Self {
        Self::Tool {
            code,
            message: message.into(),
        }
    }
}
