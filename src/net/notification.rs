//! 入站通知
//!
//! 控制器运行时交给核心逻辑的事件：交换机上线、packet-in、链路变化、聚合统计回复、定时器。

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::id::{DatapathId, MacAddr, PortNo};

pub const ETH_TYPE_IPV4: u16 = 0x0800;
pub const ETH_TYPE_ARP: u16 = 0x0806;

/// 交换机上送控制器的数据包（字段已由外部解析）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketIn {
    pub src: MacAddr,
    pub dst: MacAddr,
    pub ether_type: u16,
    /// IPv4 报文的源地址，仅用于诊断日志
    #[serde(default)]
    pub src_ip: Option<Ipv4Addr>,
    pub dpid: DatapathId,
    pub in_port: PortNo,
    #[serde(default)]
    pub payload: Vec<u8>,
}

/// 链路发现事件：`dpid1` 的 `port1` 连到 `dpid2` 的 `port2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEvent {
    pub added: bool,
    pub dpid1: DatapathId,
    pub dpid2: DatapathId,
    pub port1: PortNo,
    pub port2: PortNo,
}

impl LinkEvent {
    pub fn up(dpid1: DatapathId, port1: PortNo, dpid2: DatapathId, port2: PortNo) -> Self {
        Self {
            added: true,
            dpid1,
            dpid2,
            port1,
            port2,
        }
    }

    pub fn down(dpid1: DatapathId, port1: PortNo, dpid2: DatapathId, port2: PortNo) -> Self {
        Self {
            added: false,
            ..Self::up(dpid1, port1, dpid2, port2)
        }
    }
}

/// 聚合统计回复（累计计数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStatsReply {
    pub dpid: DatapathId,
    pub byte_count: u64,
    pub flow_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    SwitchConnect { dpid: DatapathId },
    PacketIn(PacketIn),
    LinkEvent(LinkEvent),
    AggregateStats(AggregateStatsReply),
    TimerTick,
}
