//! 会话状态：CSRF令牌与多阶段登录进度。
//!
//! 会话由外层（Web壳或CLI交互层）持有并在请求间持久化，
//! 核心只读写其中与安全相关的字段。

/// 多阶段登录的单向状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginStage {
    /// 等待输入用户名
    #[default]
    AwaitingUser,
    /// 等待输入口令
    AwaitingPassword,
    /// 口令通过，等待TOTP验证码
    AwaitingTotp,
    /// 已认证
    Authenticated,
}

/// 一次登录会话的可变状态
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// 会话期内稳定的CSRF令牌，首次取用时生成
    pub csrf: Option<String>,
    pub stage: LoginStage,
    /// 用户名阶段暂存、口令阶段校验的用户
    pub pending_user: Option<String>,
    /// 认证通过后的用户与角色
    pub user: Option<String>,
    pub role: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.stage == LoginStage::Authenticated
    }
}
