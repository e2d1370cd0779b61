//! # 宿主接口模块
//!
//! 引擎与宿主场景图之间的能力边界：
//!
//! - `SceneHost` - 按路径解析显示节点、枚举子节点、读写文本、读取激活状态
//! - `ArrayHost` - 按位置键解析宿主数组、读取元素、整体替换底层集合
//! - `TextHolder` - 适配层交给引擎的封闭“可写字符串容器”变体集合
//! - `memory` - 内存实现，供测试与离线演练使用
//!
//! 宿主的具体实现不在本 crate 范围内；引擎只依赖这里的 trait。

use std::fmt;

use thiserror::Error;

pub mod memory;

pub use memory::MemoryScene;

/// 宿主显示节点的实例标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 宿主数组的稳定键（位置 + 子索引）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayKey {
    pub location: String,
    pub sub_index: usize,
}

impl ArrayKey {
    pub fn new(location: impl Into<String>, sub_index: usize) -> Self {
        Self {
            location: location.into(),
            sub_index,
        }
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.location, self.sub_index)
    }
}

/// 宿主边界错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// 对象尚不存在
    #[error("未找到: {0}")]
    NotFound(String),

    /// 节点已被宿主销毁
    #[error("节点已销毁: {0}")]
    Destroyed(NodeId),

    /// 对象存在但形状不符合预期
    #[error("形状异常: {0}")]
    UnexpectedShape(String),

    /// 访问时宿主抛出异常
    #[error("访问失败: {0}")]
    Access(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// 宿主场景图能力
pub trait SceneHost {
    /// 按斜杠分隔路径解析节点；不存在时返回 `None`，这不是错误
    fn resolve(&self, path: &str) -> Option<NodeId>;

    /// 枚举节点下的所有显示节点（含自身与未激活节点）
    fn descendants(&self, root: NodeId) -> HostResult<Vec<NodeId>>;

    /// 节点的完整路径
    fn node_path(&self, node: NodeId) -> Option<String>;

    /// 节点是否仍然有效
    fn is_alive(&self, node: NodeId) -> bool;

    fn text(&self, node: NodeId) -> HostResult<String>;

    fn set_text(&mut self, node: NodeId, text: &str) -> HostResult<()>;

    fn is_active(&self, node: NodeId) -> HostResult<bool>;
}

/// 宿主数组能力
pub trait ArrayHost {
    /// 读取数组当前内容；宿主尚未创建时返回 `Ok(None)`
    fn read_array(&self, key: &ArrayKey) -> HostResult<Option<Vec<String>>>;

    /// 用新集合整体替换数组的底层引用
    fn replace_array(&mut self, key: &ArrayKey, items: Vec<String>) -> HostResult<()>;
}

/// 可写字符串容器
///
/// 适配层把宿主特有的类型转换成这些变体后交给引擎，引擎本身不做反射。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextHolder {
    /// 单个字符串字段
    Plain(String),
    /// 字符串列表字段（例如选项、对话行），逐项翻译
    Lines(Vec<String>),
    /// 富文本包裹的字符串，只翻译标签内部文本
    Rich {
        open: String,
        inner: String,
        close: String,
    },
}

impl TextHolder {
    /// 拼回宿主可写回的字符串
    pub fn render(&self) -> String {
        match self {
            TextHolder::Plain(text) => text.clone(),
            TextHolder::Lines(lines) => lines.join("\n"),
            TextHolder::Rich { open, inner, close } => format!("{}{}{}", open, inner, close),
        }
    }
}
