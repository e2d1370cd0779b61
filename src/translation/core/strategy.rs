//! 监控策略与路径规则
//!
//! 每个被观察节点都有一个监控策略，决定它在哪个节奏上被重新检查。
//! 策略由路径规则决定：所有作为子串出现在节点路径中的规则字面量里，
//! 最长的那条胜出。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 节点监控策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStrategy {
    /// 高优先级界面（交互提示、字幕），每个 tick 检查，仍受快照门控
    Immediate,
    /// 每帧被宿主重新生成的内容，每个 tick 无条件重写
    EveryFrame,
    /// 快节奏轮询
    Fast,
    /// 慢节奏轮询（常驻）
    Slow,
    /// 慢节奏检查，首次成功后移除
    OneShot,
    /// 同 `OneShot`，用于宿主较晚才创建的节点
    OneShotLate,
    /// 只在节点由隐藏变为可见时翻译
    OnVisible,
}

impl MonitorStrategy {
    pub const ALL: [MonitorStrategy; 7] = [
        MonitorStrategy::Immediate,
        MonitorStrategy::EveryFrame,
        MonitorStrategy::Fast,
        MonitorStrategy::Slow,
        MonitorStrategy::OneShot,
        MonitorStrategy::OneShotLate,
        MonitorStrategy::OnVisible,
    ];

    /// 首次成功后是否停止追踪
    pub fn is_one_shot(&self) -> bool {
        matches!(self, MonitorStrategy::OneShot | MonitorStrategy::OneShotLate)
    }

    /// 是否跳过快照比较，每次都尝试改写
    pub fn is_unconditional(&self) -> bool {
        matches!(self, MonitorStrategy::EveryFrame)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MonitorStrategy::Immediate => "immediate",
            MonitorStrategy::EveryFrame => "every_frame",
            MonitorStrategy::Fast => "fast",
            MonitorStrategy::Slow => "slow",
            MonitorStrategy::OneShot => "one_shot",
            MonitorStrategy::OneShotLate => "one_shot_late",
            MonitorStrategy::OnVisible => "on_visible",
        }
    }
}

impl fmt::Display for MonitorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 一条路径规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    pub literal: String,
    pub strategy: MonitorStrategy,
}

/// 路径规则集
#[derive(Debug, Clone, Default)]
pub struct StrategyRules {
    rules: Vec<PathRule>,
}

impl StrategyRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加规则；同一字面量以最后一次为准
    pub fn add(&mut self, literal: &str, strategy: MonitorStrategy) {
        match self.rules.iter_mut().find(|rule| rule.literal == literal) {
            Some(rule) => rule.strategy = strategy,
            None => self.rules.push(PathRule {
                literal: literal.to_string(),
                strategy,
            }),
        }
    }

    /// 最长匹配的规则
    pub fn resolve_rule(&self, path: &str) -> Option<&PathRule> {
        self.rules
            .iter()
            .filter(|rule| path.contains(rule.literal.as_str()))
            .max_by_key(|rule| rule.literal.len())
    }

    pub fn resolve(&self, path: &str) -> Option<MonitorStrategy> {
        self.resolve_rule(path).map(|rule| rule.strategy)
    }

    pub fn remove(&mut self, literal: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.literal != literal);
        self.rules.len() != before
    }

    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }
}

/// 累计时间计时器
///
/// 累计值越过间隔时触发并归零（不减去间隔）。
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTimer {
    interval: f32,
    elapsed: f32,
}

impl IntervalTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// 推进时间，返回本次是否触发
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_literal_wins() {
        let mut rules = StrategyRules::new();
        rules.add("GUI/HUD", MonitorStrategy::Fast);
        rules.add("GUI/HUD/Day/HUDValue", MonitorStrategy::EveryFrame);

        assert_eq!(
            rules.resolve("Canvas/GUI/HUD/Day/HUDValue"),
            Some(MonitorStrategy::EveryFrame)
        );
        assert_eq!(rules.resolve("Canvas/GUI/HUD/Money"), Some(MonitorStrategy::Fast));
        assert_eq!(rules.resolve("Canvas/Menu"), None);
    }

    #[test]
    fn test_add_replaces_same_literal() {
        let mut rules = StrategyRules::new();
        rules.add("Menu", MonitorStrategy::Slow);
        rules.add("Menu", MonitorStrategy::OneShot);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.resolve("Menu/Title"), Some(MonitorStrategy::OneShot));

        assert!(rules.remove("Menu"));
        assert!(!rules.remove("Menu"));
        assert!(rules.is_empty());
    }

    #[test]
    fn test_interval_timer_resets_to_zero() {
        let mut timer = IntervalTimer::new(1.0);
        assert!(!timer.advance(0.6));
        assert!(timer.advance(0.6));
        // 归零而不是保留 0.2 的余量
        assert_eq!(timer.elapsed(), 0.0);
        assert!(!timer.advance(0.5));
        assert!(timer.advance(0.5));
    }

    #[test]
    fn test_strategy_serde_names() {
        let parsed: MonitorStrategy = serde_json::from_str("\"one_shot_late\"").unwrap();
        assert_eq!(parsed, MonitorStrategy::OneShotLate);
        assert_eq!(
            serde_json::to_string(&MonitorStrategy::EveryFrame).unwrap(),
            "\"every_frame\""
        );
        assert!(MonitorStrategy::OneShot.is_one_shot());
        assert!(!MonitorStrategy::Slow.is_one_shot());
    }
}
