//! 逻辑时钟
//!
//! 只在模拟推进时前进，暂停期间冻结，所有冷却与计时都与它比较。

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameClock {
    elapsed_ms: u64,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.elapsed_ms
    }

    /// 推进并返回新的时间
    pub fn advance(&mut self, delta_ms: u64) -> u64 {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        self.elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut clock = GameClock::new();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.advance(16), 16);
        assert_eq!(clock.advance(0), 16);
        assert_eq!(clock.advance(u64::MAX), u64::MAX);
    }
}
