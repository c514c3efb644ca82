//! 拓扑存储
//!
//! 保存交换机之间的有向邻接关系 `(from, to) -> 出端口`，以及每台交换机的负载估计。
//! 只由链路事件和统计回复修改。

use std::collections::BTreeMap;

use crate::net::{DatapathId, PortNo};
use tracing::{debug, trace};

/// `from` 上通往 `to` 的出端口，以及发现协议同时报告的对端端口。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPorts {
    pub port: PortNo,
    pub peer_port: PortNo,
}

/// 单台交换机的统计记录
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwitchRecord {
    /// 上一次聚合统计的累计字节数；None 表示还没有收到过回复
    pub last_byte_count: Option<u64>,
    pub last_flow_count: u32,
    /// 最近一个采样周期的吞吐估计（kbit/s）
    pub throughput_kbps: Option<f64>,
}

#[derive(Debug, Default, Clone)]
pub struct TopologyStore {
    switches: BTreeMap<DatapathId, SwitchRecord>,
    adjacency: BTreeMap<DatapathId, BTreeMap<DatapathId, LinkPorts>>,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册交换机。重复连接不会清掉已有统计。
    pub fn add_switch(&mut self, dpid: DatapathId) -> bool {
        if self.switches.contains_key(&dpid) {
            return false;
        }
        self.switches.insert(dpid, SwitchRecord::default());
        true
    }

    pub fn contains(&self, dpid: DatapathId) -> bool {
        self.switches.contains_key(&dpid)
    }

    pub fn switch(&self, dpid: DatapathId) -> Option<&SwitchRecord> {
        self.switches.get(&dpid)
    }

    pub fn switch_mut(&mut self, dpid: DatapathId) -> Option<&mut SwitchRecord> {
        self.switches.get_mut(&dpid)
    }

    /// 已知交换机（按 id 升序）
    pub fn switch_ids(&self) -> impl Iterator<Item = DatapathId> + '_ {
        self.switches.keys().copied()
    }

    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    pub fn throughput_kbps(&self, dpid: DatapathId) -> Option<f64> {
        self.switches.get(&dpid).and_then(|s| s.throughput_kbps)
    }

    /// 记录 `from -> to` 链路，返回是否为新链路。
    pub fn link_up(
        &mut self,
        from: DatapathId,
        to: DatapathId,
        port: PortNo,
        peer_port: PortNo,
    ) -> bool {
        let prev = self
            .adjacency
            .entry(from)
            .or_default()
            .insert(to, LinkPorts { port, peer_port });
        trace!(%from, %to, %port, replaced = prev.is_some(), "邻接关系已更新");
        prev.is_none()
    }

    /// 删除 `from -> to` 链路，返回被删除的端口信息。
    pub fn link_down(&mut self, from: DatapathId, to: DatapathId) -> Option<LinkPorts> {
        let nbrs = self.adjacency.get_mut(&from)?;
        let removed = nbrs.remove(&to);
        if nbrs.is_empty() {
            self.adjacency.remove(&from);
        }
        debug!(%from, %to, removed = removed.is_some(), "邻接关系已删除");
        removed
    }

    pub fn link(&self, from: DatapathId, to: DatapathId) -> Option<LinkPorts> {
        self.adjacency.get(&from)?.get(&to).copied()
    }

    /// `from` 上到 `to` 的出端口
    pub fn port(&self, from: DatapathId, to: DatapathId) -> Option<PortNo> {
        self.link(from, to).map(|l| l.port)
    }

    /// 从 `from` 出发的所有有向边
    pub fn neighbours(&self, from: DatapathId) -> impl Iterator<Item = (DatapathId, PortNo)> + '_ {
        self.adjacency
            .get(&from)
            .into_iter()
            .flat_map(|m| m.iter().map(|(to, l)| (*to, l.port)))
    }

    pub fn link_count(&self) -> usize {
        self.adjacency.values().map(|m| m.len()).sum()
    }
}
