//! 转发规则
//!
//! 控制器下发给交换机的流表项：匹配 (源地址, 目的地址)，动作为转发或丢弃，带一个超时。

use serde::{Deserialize, Serialize};

use super::id::{MacAddr, PortNo};

/// 匹配字段：二层源/目的地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowMatch {
    pub src: MacAddr,
    pub dst: MacAddr,
}

impl FlowMatch {
    pub fn new(src: MacAddr, dst: MacAddr) -> Self {
        Self { src, dst }
    }

    /// 同一条流的反方向
    pub fn reversed(self) -> Self {
        Self {
            src: self.dst,
            dst: self.src,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "port", rename_all = "snake_case")]
pub enum FlowAction {
    Output(PortNo),
    Drop,
}

/// 超时（秒）。空闲超时在命中时刷新，硬超时从安装时刻起算。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "secs", rename_all = "snake_case")]
pub enum FlowTimeout {
    Idle(u16),
    Hard(u16),
}

impl FlowTimeout {
    pub fn secs(self) -> u16 {
        match self {
            FlowTimeout::Idle(s) | FlowTimeout::Hard(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRule {
    #[serde(rename = "match")]
    pub matches: FlowMatch,
    pub action: FlowAction,
    pub timeout: FlowTimeout,
}

impl FlowRule {
    /// 转发到指定端口，使用空闲超时
    pub fn forward(matches: FlowMatch, port: PortNo, idle_secs: u16) -> Self {
        Self {
            matches,
            action: FlowAction::Output(port),
            timeout: FlowTimeout::Idle(idle_secs),
        }
    }

    /// 丢弃规则，使用硬超时
    pub fn drop(matches: FlowMatch, hard_secs: u16) -> Self {
        Self {
            matches,
            action: FlowAction::Drop,
            timeout: FlowTimeout::Hard(hard_secs),
        }
    }

    pub fn out_port(&self) -> Option<PortNo> {
        match self.action {
            FlowAction::Output(p) => Some(p),
            FlowAction::Drop => None,
        }
    }
}
