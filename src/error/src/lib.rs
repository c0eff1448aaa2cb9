//! 游戏错误处理模块
//!
//! 模拟核心中所有可失败操作共用的错误类型。每帧 tick 内部从不向外抛出错误，
//! 这些错误只在 `try_*` 接口、配置加载和命令行入口处出现。

use thiserror::Error;

/// 模拟运行过程中可能出现的错误类型
#[derive(Debug, Error)]
pub enum GameError {
    /// 技能目录中不存在该技能
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// 技能已达到最高等级
    #[error("Skill already at max level: {0}")]
    SkillMaxed(String),

    /// 被动技能槽位已满
    #[error("Passive skill slots are full ({0} owned)")]
    PassiveSlotsFull(usize),

    /// 主动技能槽位已满
    #[error("Active skill slots are full ({0} owned)")]
    ActiveSlotsFull(usize),

    /// 怪物目录中不存在该怪物
    #[error("Unknown monster: {0}")]
    UnknownMonster(String),

    /// 配置无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO操作错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON 解析错误
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// 模拟状态无效（例如游戏已结束）
    #[error("Invalid game state: {0}")]
    InvalidGameState(String),
}

impl GameError {
    /// 是否属于"静默失败"类错误（只需记录日志，不应中断会话）
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            GameError::UnknownSkill(_)
                | GameError::SkillMaxed(_)
                | GameError::PassiveSlotsFull(_)
                | GameError::ActiveSlotsFull(_)
                | GameError::UnknownMonster(_)
        )
    }
}

/// 处理游戏错误并转换为用户友好的消息
pub fn handle_error(error: &GameError) -> String {
    match error {
        GameError::SkillMaxed(id) => format!("技能 {} 已满级", id),
        GameError::PassiveSlotsFull(_) => "被动技能槽位已满".to_string(),
        GameError::ActiveSlotsFull(_) => "主动技能槽位已满".to_string(),
        GameError::IoError(e) => match e.kind() {
            std::io::ErrorKind::NotFound => "配置文件不存在".to_string(),
            std::io::ErrorKind::PermissionDenied => "没有权限访问配置文件".to_string(),
            _ => format!("IO错误: {}", e),
        },
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_errors() {
        assert!(GameError::SkillMaxed("nova".into()).is_soft());
        assert!(GameError::PassiveSlotsFull(3).is_soft());
        assert!(!GameError::InvalidConfig("bad".into()).is_soft());
    }

    #[test]
    fn test_handle_error_messages() {
        let err = GameError::SkillMaxed("nova".into());
        assert_eq!(handle_error(&err), "技能 nova 已满级");

        let io = GameError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "x"));
        assert_eq!(handle_error(&io), "配置文件不存在");

        let cfg = GameError::InvalidConfig("viewport height must be positive".into());
        assert_eq!(
            handle_error(&cfg),
            "Invalid config: viewport height must be positive"
        );
    }
}
