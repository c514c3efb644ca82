//! 交换机拓扑构建
//!
//! 生成交换机集合和双向链路（含两端端口号），交给仿真层模拟发现协议的链路事件。
//! 端口号在每台交换机上从 1 开始顺序分配。

use std::collections::BTreeMap;

use crate::net::{DatapathId, PortNo};

pub mod diamond;
pub mod line;

pub use diamond::build_diamond;
pub use line::{build_line, build_ring};

/// 双向链路：`a` 的 `a_port` 连到 `b` 的 `b_port`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopoLink {
    pub a: DatapathId,
    pub a_port: PortNo,
    pub b: DatapathId,
    pub b_port: PortNo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub switches: Vec<DatapathId>,
    pub links: Vec<TopoLink>,
}

impl Topology {
    pub fn has_switch(&self, dpid: DatapathId) -> bool {
        self.switches.contains(&dpid)
    }

    /// `a`、`b` 之间的链路（不分方向）
    pub fn find_link(&self, a: DatapathId, b: DatapathId) -> Option<TopoLink> {
        self.links
            .iter()
            .copied()
            .find(|l| (l.a == a && l.b == b) || (l.a == b && l.b == a))
    }

    /// `dpid` 上已被链路占用的端口
    pub fn link_ports(&self, dpid: DatapathId) -> impl Iterator<Item = PortNo> + '_ {
        self.links.iter().filter_map(move |l| {
            if l.a == dpid {
                Some(l.a_port)
            } else if l.b == dpid {
                Some(l.b_port)
            } else {
                None
            }
        })
    }

    /// `dpid` 上第一个没被链路占用的端口，用来挂主机
    pub fn free_port(&self, dpid: DatapathId) -> PortNo {
        let used = self.link_ports(dpid).map(|p| p.0).max().unwrap_or(0);
        PortNo(used.saturating_add(1))
    }
}

/// 按顺序分配端口的拓扑构建器
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    topo: Topology,
    next_port: BTreeMap<DatapathId, u16>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_switch(&mut self, id: u64) -> DatapathId {
        let dpid = DatapathId(id);
        if !self.topo.switches.contains(&dpid) {
            self.topo.switches.push(dpid);
        }
        dpid
    }

    /// 连接两台交换机，两端各分配一个新端口
    pub fn connect(&mut self, a: DatapathId, b: DatapathId) -> TopoLink {
        let a_port = self.alloc_port(a);
        let b_port = self.alloc_port(b);
        let link = TopoLink { a, a_port, b, b_port };
        self.topo.links.push(link);
        link
    }

    pub fn build(self) -> Topology {
        self.topo
    }

    fn alloc_port(&mut self, dpid: DatapathId) -> PortNo {
        let next = self.next_port.entry(dpid).or_insert(1);
        let port = PortNo(*next);
        *next += 1;
        port
    }
}
