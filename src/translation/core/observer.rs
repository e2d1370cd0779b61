//! 节点观察注册表
//!
//! 追踪宿主场景图中的显示节点，按监控策略分组，在分级节奏上重新检查
//! 可能变化的节点，并把翻译写回宿主。
//!
//! ## 节奏
//!
//! 每次 `tick(dt)` 按以下顺序服务各组：
//!
//! 1. `Immediate`、`EveryFrame`：每个 tick
//! 2. `Fast`：快计时器触发时
//! 3. `Slow`、`OneShot`、`OneShotLate`：慢计时器触发时，随后重试尚未
//!    解析到根节点的路径规则
//! 4. `OnVisible`：可见性计时器触发时，只处理由隐藏变为可见的节点
//!
//! 计时器累计时间越过间隔后归零。
//!
//! ## 变化门控
//!
//! 除 `EveryFrame` 外，只有当前文本与快照不同、或节点从未成功翻译过时
//! 才会重新尝试。宿主自行改写文本后快照不再相等，节点会被再次翻译。
//!
//! ## 错误
//!
//! 宿主访问异常按原因只记录一次，节点视为暂不可用；被宿主销毁的节点
//! 直接移除。任何单个节点的失败都不会中断本次 tick。

use std::collections::HashMap;

use crate::host::{HostError, NodeId, SceneHost};
use crate::translation::config::EngineConfig;
use crate::translation::error::LogOnce;
use crate::translation::pipeline::{TranslateOutcome, Translator};

use super::strategy::{IntervalTimer, MonitorStrategy, StrategyRules};

/// 被观察的节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedNode {
    pub id: NodeId,
    pub path: String,
    pub strategy: MonitorStrategy,
    /// 上次检查时的文本
    pub snapshot: Option<String>,
    /// 是否至少成功翻译过一次
    pub translated: bool,
    /// 上次检查时的激活状态
    pub was_active: bool,
}

/// 注册表统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub registered: u64,
    pub serviced: u64,
    pub translated: u64,
    pub removed: u64,
    pub invalidated: u64,
    pub pending_rules: usize,
    pub tracked: usize,
}

/// 单次 tick 的节点部分结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryTick {
    pub serviced: usize,
    pub translated: usize,
    pub removed: usize,
    pub late_registered: usize,
}

/// 节点路径缓存
///
/// 以实例标识为键，随注册表 `clear()` 一起清空。
#[derive(Debug, Default)]
pub struct PathCache {
    paths: HashMap<NodeId, String>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询路径，未缓存时向宿主解析
    pub fn resolve<H: SceneHost + ?Sized>(&mut self, host: &H, node: NodeId) -> Option<String> {
        if let Some(path) = self.paths.get(&node) {
            return Some(path.clone());
        }
        let path = host.node_path(node)?;
        self.paths.insert(node, path.clone());
        Some(path)
    }

    pub fn forget(&mut self, node: NodeId) {
        self.paths.remove(&node);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

/// 一次根路径扫描的结果
#[derive(Debug, Clone, Copy, Default)]
struct RootScan {
    resolved: bool,
    seen: usize,
    registered: usize,
}

/// 节点处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceResult {
    Skipped,
    Unchanged,
    Attempted { wrote: bool },
    Removed,
}

/// 节点观察注册表
pub struct NodeRegistry {
    rules: StrategyRules,
    default_strategy: MonitorStrategy,
    nodes: HashMap<NodeId, ObservedNode>,
    by_path: HashMap<String, Vec<NodeId>>,
    groups: HashMap<MonitorStrategy, Vec<NodeId>>,
    pending: Vec<String>,
    fast_timer: IntervalTimer,
    slow_timer: IntervalTimer,
    visibility_timer: IntervalTimer,
    paths: PathCache,
    log_once: LogOnce,
    stats: RegistryStats,
}

impl NodeRegistry {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            rules: StrategyRules::new(),
            default_strategy: config.default_strategy,
            nodes: HashMap::new(),
            by_path: HashMap::new(),
            groups: HashMap::new(),
            pending: Vec::new(),
            fast_timer: IntervalTimer::new(config.fast_interval),
            slow_timer: IntervalTimer::new(config.slow_interval),
            visibility_timer: IntervalTimer::new(config.visibility_interval),
            paths: PathCache::new(),
            log_once: LogOnce::new(),
            stats: RegistryStats::default(),
        }
    }

    /// 记录路径规则
    pub fn add_path_rule(&mut self, literal: &str, strategy: MonitorStrategy) {
        tracing::debug!("路径规则: {} -> {}", literal, strategy);
        self.rules.add(literal, strategy);
    }

    pub fn rules(&self) -> &StrategyRules {
        &self.rules
    }

    /// 为路径选择策略，没有规则命中时使用默认策略
    pub fn strategy_for(&self, path: &str) -> MonitorStrategy {
        self.rules.resolve(path).unwrap_or(self.default_strategy)
    }

    /// 以每条规则的字面量为根路径注册子树
    ///
    /// 根节点尚未出现（或还没有任何显示节点）的规则进入待重试集合，
    /// 在慢节奏上继续尝试。
    pub fn register_rules<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
    ) -> usize {
        let literals: Vec<String> = self
            .rules
            .rules()
            .iter()
            .map(|rule| rule.literal.clone())
            .collect();

        let mut total = 0;
        for literal in literals {
            let scan = self.scan_root(host, translator, &literal);
            total += scan.registered;
            if (!scan.resolved || scan.seen == 0) && !self.pending.contains(&literal) {
                tracing::debug!("路径尚未就绪，稍后重试: {}", literal);
                self.pending.push(literal);
            }
        }
        total
    }

    /// 注册根路径下的所有显示节点，返回新注册的节点数
    pub fn register_subtree<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
        root_path: &str,
    ) -> usize {
        self.scan_root(host, translator, root_path).registered
    }

    fn scan_root<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
        root_path: &str,
    ) -> RootScan {
        let Some(root) = host.resolve(root_path) else {
            return RootScan::default();
        };

        let descendants = match host.descendants(root) {
            Ok(nodes) => nodes,
            Err(e) => {
                self.log_once.warn(&format!("枚举子节点失败 {}", root_path), e);
                return RootScan::default();
            }
        };

        let mut scan = RootScan {
            resolved: true,
            seen: descendants.len(),
            registered: 0,
        };

        for node in descendants {
            if self.nodes.contains_key(&node) {
                continue;
            }
            if self.register_node(host, translator, node) {
                scan.registered += 1;
            }
        }

        if scan.registered > 0 {
            tracing::debug!("{} 下注册了 {} 个节点", root_path, scan.registered);
        }
        scan
    }

    /// 注册单个节点并立即尝试翻译
    fn register_node<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
        id: NodeId,
    ) -> bool {
        let Some(path) = self.paths.resolve(host, id) else {
            return false;
        };
        let strategy = self.strategy_for(&path);
        let was_active = host.is_active(id).unwrap_or(false);

        let node = ObservedNode {
            id,
            path: path.clone(),
            strategy,
            snapshot: None,
            translated: false,
            was_active,
        };

        self.nodes.insert(id, node);
        self.by_path.entry(path).or_default().push(id);
        self.groups.entry(strategy).or_default().push(id);
        self.stats.registered += 1;

        self.attempt(host, translator, id);
        if strategy.is_one_shot() && self.nodes.get(&id).is_some_and(|n| n.translated) {
            self.remove(id);
        }
        true
    }

    /// 推进一个 tick
    pub fn tick<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
        dt: f32,
    ) -> RegistryTick {
        let mut report = RegistryTick::default();

        self.service_group(host, translator, MonitorStrategy::Immediate, &mut report);
        self.service_group(host, translator, MonitorStrategy::EveryFrame, &mut report);

        if self.fast_timer.advance(dt) {
            self.service_group(host, translator, MonitorStrategy::Fast, &mut report);
        }

        if self.slow_timer.advance(dt) {
            self.service_group(host, translator, MonitorStrategy::Slow, &mut report);
            self.service_group(host, translator, MonitorStrategy::OneShot, &mut report);
            self.service_group(host, translator, MonitorStrategy::OneShotLate, &mut report);
            report.late_registered += self.retry_pending(host, translator);
        }

        if self.visibility_timer.advance(dt) {
            self.service_visibility(host, translator, &mut report);
        }

        if report.serviced > 0 {
            tracing::trace!(
                "tick: 检查 {} 个节点，翻译 {} 个，移除 {} 个",
                report.serviced,
                report.translated,
                report.removed
            );
        }
        report
    }

    fn group_ids(&self, strategy: MonitorStrategy) -> Vec<NodeId> {
        self.groups.get(&strategy).cloned().unwrap_or_default()
    }

    fn service_group<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
        strategy: MonitorStrategy,
        report: &mut RegistryTick,
    ) {
        for id in self.group_ids(strategy) {
            let result = self.service_node(host, translator, id);
            Self::record(report, result);
        }
    }

    fn service_visibility<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
        report: &mut RegistryTick,
    ) {
        for id in self.group_ids(MonitorStrategy::OnVisible) {
            if !host.is_alive(id) {
                self.invalidate(id);
                report.removed += 1;
                continue;
            }

            let active = match host.is_active(id) {
                Ok(active) => active,
                Err(e) => {
                    self.log_once.warn(&format!("读取激活状态失败 {}", id), e);
                    continue;
                }
            };

            let became_visible = match self.nodes.get_mut(&id) {
                Some(node) => {
                    let transition = active && !node.was_active;
                    node.was_active = active;
                    transition
                }
                None => continue,
            };

            if became_visible {
                let result = self.service_node(host, translator, id);
                Self::record(report, result);
            }
        }
    }

    fn record(report: &mut RegistryTick, result: ServiceResult) {
        match result {
            ServiceResult::Skipped => {}
            ServiceResult::Unchanged => report.serviced += 1,
            ServiceResult::Attempted { wrote } => {
                report.serviced += 1;
                if wrote {
                    report.translated += 1;
                }
            }
            ServiceResult::Removed => report.removed += 1,
        }
    }

    /// 检查一个节点，按需重新翻译
    fn service_node<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
        id: NodeId,
    ) -> ServiceResult {
        if !host.is_alive(id) {
            self.invalidate(id);
            return ServiceResult::Removed;
        }

        let Some(node) = self.nodes.get(&id) else {
            return ServiceResult::Skipped;
        };
        let strategy = node.strategy;

        let text = match host.text(id) {
            Ok(text) => text,
            Err(HostError::Destroyed(_)) => {
                self.invalidate(id);
                return ServiceResult::Removed;
            }
            Err(e) => {
                self.log_once.warn(&format!("读取文本失败 {}", node.path), e);
                return ServiceResult::Skipped;
            }
        };

        let unchanged = node.translated && node.snapshot.as_deref() == Some(text.as_str());
        self.stats.serviced += 1;

        if unchanged && strategy.is_one_shot() {
            self.remove(id);
            return ServiceResult::Removed;
        }
        if unchanged && !strategy.is_unconditional() {
            return ServiceResult::Unchanged;
        }

        let wrote = self.attempt_with_text(host, translator, id, text);
        if strategy.is_one_shot() && self.nodes.get(&id).is_some_and(|n| n.translated) {
            self.remove(id);
            return ServiceResult::Removed;
        }
        ServiceResult::Attempted { wrote }
    }

    fn attempt<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
        id: NodeId,
    ) -> bool {
        match host.text(id) {
            Ok(text) => self.attempt_with_text(host, translator, id, text),
            Err(e) => {
                self.log_once.warn(&format!("读取文本失败 {}", id), e);
                false
            }
        }
    }

    /// 翻译并写回，更新快照；返回是否写入了宿主
    fn attempt_with_text<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
        id: NodeId,
        text: String,
    ) -> bool {
        let Some(path) = self.nodes.get(&id).map(|n| n.path.clone()) else {
            return false;
        };

        let (snapshot, translated, wrote) = match translator.translate(&text, &path) {
            TranslateOutcome::Translated(output) => match host.set_text(id, &output) {
                Ok(()) => {
                    tracing::trace!("{}: {:?} -> {:?}", path, text, output);
                    (output, true, true)
                }
                Err(e) => {
                    self.log_once.warn(&format!("写入文本失败 {}", path), e);
                    return false;
                }
            },
            TranslateOutcome::AlreadyTranslated => (text, true, false),
            TranslateOutcome::NoMatch => (text, false, false),
        };

        if wrote {
            self.stats.translated += 1;
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.snapshot = Some(snapshot);
            node.translated |= translated;
        }
        wrote
    }

    fn retry_pending<H: SceneHost + ?Sized>(
        &mut self,
        host: &mut H,
        translator: &mut Translator,
    ) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let mut registered = 0;
        let mut still_pending = Vec::new();
        for literal in std::mem::take(&mut self.pending) {
            let scan = self.scan_root(host, translator, &literal);
            registered += scan.registered;
            if scan.resolved && scan.seen > 0 {
                tracing::debug!("延迟路径已就绪: {}（新增 {} 个节点）", literal, scan.registered);
            } else {
                still_pending.push(literal);
            }
        }
        self.pending = still_pending;
        registered
    }

    /// 节点被宿主销毁
    fn invalidate(&mut self, id: NodeId) {
        if self.remove(id) {
            self.stats.invalidated += 1;
            tracing::debug!("节点已失效: {}", id);
        }
    }

    fn remove(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.remove(&id) else {
            return false;
        };

        if let Some(ids) = self.by_path.get_mut(&node.path) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_path.remove(&node.path);
            }
        }
        if let Some(ids) = self.groups.get_mut(&node.strategy) {
            ids.retain(|other| *other != id);
        }
        self.paths.forget(id);
        self.stats.removed += 1;
        true
    }

    /// 停止追踪路径上的所有节点，返回移除数量
    pub fn unregister(&mut self, path: &str) -> usize {
        let ids = self.by_path.get(path).cloned().unwrap_or_default();
        ids.into_iter().filter(|id| self.remove(*id)).count()
    }

    /// 停止追踪单个节点
    pub fn unregister_instance(&mut self, id: NodeId) -> bool {
        self.remove(id)
    }

    /// 丢弃所有节点、规则、待重试路径与计时器
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.by_path.clear();
        self.groups.clear();
        self.rules.clear();
        self.pending.clear();
        self.fast_timer.reset();
        self.slow_timer.reset();
        self.visibility_timer.reset();
        self.paths.clear();
        self.log_once.clear();
        self.stats = RegistryStats::default();
        tracing::debug!("节点注册表已清空");
    }

    pub fn get(&self, id: NodeId) -> Option<&ObservedNode> {
        self.nodes.get(&id)
    }

    pub fn nodes_at(&self, path: &str) -> &[NodeId] {
        self.by_path.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn group_len(&self, strategy: MonitorStrategy) -> usize {
        self.groups.get(&strategy).map(Vec::len).unwrap_or(0)
    }

    pub fn pending_rules(&self) -> &[String] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            pending_rules: self.pending.len(),
            tracked: self.nodes.len(),
            ..self.stats.clone()
        }
    }
}
