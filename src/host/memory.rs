//! 内存宿主实现
//!
//! 用 `BTreeMap` 保存节点树与数组，支持注入故障（读取异常、形状异常），
//! 并统计引擎写入次数，便于验证幂等性。

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{ArrayHost, ArrayKey, HostError, HostResult, NodeId, SceneHost};

#[derive(Debug, Clone)]
struct MemoryNode {
    path: String,
    text: String,
    display: bool,
    active: bool,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
struct MemoryArray {
    items: Vec<String>,
    malformed: bool,
    replacements: usize,
}

/// 内存场景图
#[derive(Debug, Default)]
pub struct MemoryScene {
    nodes: BTreeMap<NodeId, MemoryNode>,
    by_path: HashMap<String, NodeId>,
    arrays: HashMap<ArrayKey, MemoryArray>,
    failing: HashSet<NodeId>,
    writes: HashMap<NodeId, usize>,
    next_id: u64,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加显示节点，缺失的上级路径会自动创建为容器节点
    pub fn add_node(&mut self, path: &str, text: &str) -> NodeId {
        let id = self.ensure_path(path);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.display = true;
            node.text = text.to_string();
        }
        id
    }

    /// 添加不携带文本的容器节点
    pub fn add_container(&mut self, path: &str) -> NodeId {
        self.ensure_path(path)
    }

    fn ensure_path(&mut self, path: &str) -> NodeId {
        let path = path.trim_matches('/');
        if let Some(&id) = self.by_path.get(path) {
            return id;
        }

        let parent = path
            .rfind('/')
            .map(|pos| self.ensure_path(&path[..pos]));

        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            MemoryNode {
                path: path.to_string(),
                text: String::new(),
                display: false,
                active: true,
                children: Vec::new(),
            },
        );
        self.by_path.insert(path.to_string(), id);

        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(id);
        }
        id
    }

    /// 宿主自身改写文本（不计入引擎写入次数）
    pub fn host_set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.text = text.to_string();
        }
    }

    pub fn set_active(&mut self, node: NodeId, active: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.active = active;
        }
    }

    /// 销毁节点及其子树
    pub fn destroy(&mut self, node: NodeId) {
        let Some(removed) = self.nodes.remove(&node) else {
            return;
        };
        self.by_path.remove(&removed.path);
        for child in removed.children {
            self.destroy(child);
        }
        for n in self.nodes.values_mut() {
            n.children.retain(|c| *c != node);
        }
    }

    /// 让后续对该节点的文本访问抛出异常
    pub fn fail_node(&mut self, node: NodeId) {
        self.failing.insert(node);
    }

    pub fn text_of(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.text.as_str())
    }

    /// 引擎通过 `SceneHost::set_text` 写入该节点的次数
    pub fn write_count(&self, node: NodeId) -> usize {
        self.writes.get(&node).copied().unwrap_or(0)
    }

    pub fn set_array(&mut self, key: ArrayKey, items: Vec<String>) {
        let entry = self.arrays.entry(key).or_default();
        entry.items = items;
        entry.malformed = false;
    }

    /// 让数组读取报告形状异常
    pub fn malform_array(&mut self, key: &ArrayKey) {
        self.arrays.entry(key.clone()).or_default().malformed = true;
    }

    pub fn array(&self, key: &ArrayKey) -> Option<&[String]> {
        self.arrays.get(key).map(|a| a.items.as_slice())
    }

    /// 引擎整体替换该数组的次数
    pub fn replacement_count(&self, key: &ArrayKey) -> usize {
        self.arrays.get(key).map(|a| a.replacements).unwrap_or(0)
    }

    fn collect_display(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if let Some(n) = self.nodes.get(&node) {
            if n.display {
                out.push(node);
            }
            for child in &n.children {
                self.collect_display(*child, out);
            }
        }
    }
}

impl SceneHost for MemoryScene {
    fn resolve(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path.trim_matches('/')).copied()
    }

    fn descendants(&self, root: NodeId) -> HostResult<Vec<NodeId>> {
        if !self.nodes.contains_key(&root) {
            return Err(HostError::Destroyed(root));
        }
        let mut out = Vec::new();
        self.collect_display(root, &mut out);
        Ok(out)
    }

    fn node_path(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).map(|n| n.path.clone())
    }

    fn is_alive(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn text(&self, node: NodeId) -> HostResult<String> {
        if self.failing.contains(&node) {
            return Err(HostError::Access(format!("读取 {} 文本时抛出异常", node)));
        }
        self.nodes
            .get(&node)
            .map(|n| n.text.clone())
            .ok_or(HostError::Destroyed(node))
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> HostResult<()> {
        if self.failing.contains(&node) {
            return Err(HostError::Access(format!("写入 {} 文本时抛出异常", node)));
        }
        let n = self.nodes.get_mut(&node).ok_or(HostError::Destroyed(node))?;
        n.text = text.to_string();
        *self.writes.entry(node).or_insert(0) += 1;
        Ok(())
    }

    fn is_active(&self, node: NodeId) -> HostResult<bool> {
        self.nodes
            .get(&node)
            .map(|n| n.active)
            .ok_or(HostError::Destroyed(node))
    }
}

impl ArrayHost for MemoryScene {
    fn read_array(&self, key: &ArrayKey) -> HostResult<Option<Vec<String>>> {
        match self.arrays.get(key) {
            None => Ok(None),
            Some(array) if array.malformed => Err(HostError::UnexpectedShape(format!(
                "{} 不是字符串数组",
                key
            ))),
            Some(array) => Ok(Some(array.items.clone())),
        }
    }

    fn replace_array(&mut self, key: &ArrayKey, items: Vec<String>) -> HostResult<()> {
        let array = self
            .arrays
            .get_mut(key)
            .ok_or_else(|| HostError::NotFound(key.to_string()))?;
        if array.malformed {
            return Err(HostError::UnexpectedShape(key.to_string()));
        }
        array.items = items;
        array.replacements += 1;
        Ok(())
    }
}
