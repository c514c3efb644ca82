//! 交换网络世界
//!
//! 持有控制器和数据平面模型。每个事件执行后，把控制器发出的命令取出来：
//! 流表命令作用到数据平面，统计请求变成延迟到达的统计回复事件。

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::dataplane::DataPlane;
use super::events::{HostSend, StatsReplyDue};
use crate::config::ControllerConfig;
use crate::ctrl::{Controller, PacketOutcome};
use crate::net::{
    CommandLog, DatapathId, ETH_TYPE_ARP, ETH_TYPE_IPV4, FlowAction, FlowMatch, LinkEvent,
    MacAddr, PacketIn, PortNo, SwitchCommand,
};
use crate::sim::{SimTime, Simulator, World};
use crate::topo::TopoLink;

/// 单个包在数据平面里最多经过的交换机数
const MAX_HOPS: usize = 64;

/// 被泛洪的目的主机回包前的时延
const FLOOD_REPLY_DELAY: SimTime = SimTime(1_000_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPlacement {
    pub dpid: DatapathId,
    pub port: PortNo,
    pub ip: Option<Ipv4Addr>,
}

/// 带时间戳的已发出命令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCommand {
    pub at_ms: u64,
    #[serde(flatten)]
    pub cmd: SwitchCommand,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSummary {
    pub installs: usize,
    pub drops: usize,
    pub flushes: usize,
    pub floods: usize,
    pub stats_requests: usize,
}

/// 数据平面统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FabricStats {
    pub sent_pkts: u64,
    pub delivered_pkts: u64,
    pub dropped_pkts: u64,
    pub packet_ins: u64,
}

/// 一个包从源主机发出后的去向
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered { hops: Vec<DatapathId> },
    /// 命中丢弃规则或被送进没有对端的端口
    Dropped { at: DatapathId },
    /// 查表未命中，上送控制器
    Escalated { at: DatapathId, outcome: PacketOutcome },
    /// 源主机未放置
    Lost,
}

pub struct FabricWorld {
    pub ctrl: Controller<CommandLog>,
    pub dataplane: DataPlane,
    pub stats: FabricStats,
    hosts: BTreeMap<MacAddr, HostPlacement>,
    /// 物理连线：(交换机, 端口) -> (对端交换机, 对端端口)
    wiring: BTreeMap<(DatapathId, PortNo), (DatapathId, PortNo)>,
    issued: Vec<IssuedCommand>,
    stats_reply_delay: SimTime,
}

impl FabricWorld {
    pub fn new(cfg: ControllerConfig) -> Self {
        Self {
            ctrl: Controller::new(cfg, CommandLog::default()),
            dataplane: DataPlane::default(),
            stats: FabricStats::default(),
            hosts: BTreeMap::new(),
            wiring: BTreeMap::new(),
            issued: Vec::new(),
            stats_reply_delay: SimTime::from_millis(10),
        }
    }

    pub fn set_stats_reply_delay(&mut self, delay: SimTime) {
        self.stats_reply_delay = delay;
    }

    pub fn add_switch(&mut self, dpid: DatapathId) {
        self.dataplane.add_switch(dpid);
    }

    pub fn place_host(
        &mut self,
        mac: MacAddr,
        dpid: DatapathId,
        port: PortNo,
        ip: Option<Ipv4Addr>,
    ) {
        self.hosts.insert(mac, HostPlacement { dpid, port, ip });
    }

    pub fn host(&self, mac: MacAddr) -> Option<HostPlacement> {
        self.hosts.get(&mac).copied()
    }

    /// 接上物理链路，返回发现协议应报告的两个方向的链路事件
    pub fn wire(&mut self, link: TopoLink) -> [LinkEvent; 2] {
        self.wiring.insert((link.a, link.a_port), (link.b, link.b_port));
        self.wiring.insert((link.b, link.b_port), (link.a, link.a_port));
        [
            LinkEvent::up(link.a, link.a_port, link.b, link.b_port),
            LinkEvent::up(link.b, link.b_port, link.a, link.a_port),
        ]
    }

    /// 断开物理链路，返回两个方向的链路断开事件
    pub fn unwire(&mut self, link: TopoLink) -> [LinkEvent; 2] {
        self.wiring.remove(&(link.a, link.a_port));
        self.wiring.remove(&(link.b, link.b_port));
        [
            LinkEvent::down(link.a, link.a_port, link.b, link.b_port),
            LinkEvent::down(link.b, link.b_port, link.a, link.a_port),
        ]
    }

    pub fn issued(&self) -> &[IssuedCommand] {
        &self.issued
    }

    pub fn summary(&self) -> CommandSummary {
        let mut s = CommandSummary::default();
        for c in &self.issued {
            match &c.cmd {
                SwitchCommand::InstallFlow { rule, .. } => match rule.action {
                    FlowAction::Output(_) => s.installs += 1,
                    FlowAction::Drop => s.drops += 1,
                },
                SwitchCommand::DeleteFlowsByPort { .. } => s.flushes += 1,
                SwitchCommand::FloodPacket { .. } => s.floods += 1,
                SwitchCommand::RequestAggregateStats { .. } => s.stats_requests += 1,
            }
        }
        s
    }

    /// 从主机 `src` 发一个包给 `dst`，沿各交换机流表转发；未命中的交换机把包上送控制器。
    #[tracing::instrument(skip(self), fields(src = %src, dst = %dst, now = %now))]
    pub fn send_packet(&mut self, src: MacAddr, dst: MacAddr, now: SimTime) -> SendOutcome {
        let Some(origin) = self.host(src) else {
            warn!("源主机未放置，包丢失");
            return SendOutcome::Lost;
        };
        self.stats.sent_pkts += 1;

        let m = FlowMatch::new(src, dst);
        let dst_at = self.host(dst);
        let (mut dpid, mut in_port) = (origin.dpid, origin.port);
        let mut hops = Vec::new();

        for _ in 0..MAX_HOPS {
            hops.push(dpid);
            match self.dataplane.lookup(dpid, m, now) {
                None => {
                    self.stats.packet_ins += 1;
                    let pkt = PacketIn {
                        src,
                        dst,
                        ether_type: if origin.ip.is_some() { ETH_TYPE_IPV4 } else { ETH_TYPE_ARP },
                        src_ip: origin.ip,
                        dpid,
                        in_port,
                        payload: ethernet_header(src, dst, origin.ip.is_some()),
                    };
                    debug!(%dpid, %in_port, "查表未命中，上送控制器");
                    let outcome = self.ctrl.on_packet_in(pkt);
                    return SendOutcome::Escalated { at: dpid, outcome };
                }
                Some(FlowAction::Drop) => {
                    self.stats.dropped_pkts += 1;
                    return SendOutcome::Dropped { at: dpid };
                }
                Some(FlowAction::Output(port)) => {
                    if dst_at.is_some_and(|d| d.dpid == dpid && d.port == port) {
                        self.stats.delivered_pkts += 1;
                        trace!(?hops, "📨 送达目的主机");
                        return SendOutcome::Delivered { hops };
                    }
                    match self.wiring.get(&(dpid, port)) {
                        Some(&(next, next_port)) => {
                            dpid = next;
                            in_port = next_port;
                        }
                        None => {
                            self.stats.dropped_pkts += 1;
                            return SendOutcome::Dropped { at: dpid };
                        }
                    }
                }
            }
        }

        warn!(?hops, "超过最大跳数，疑似转发环路");
        self.stats.dropped_pkts += 1;
        SendOutcome::Dropped { at: dpid }
    }

    /// 取出控制器发出的命令并作用到数据平面。
    ///
    /// 泛洪只到达直接挂在该交换机上的主机，不会再经过其他交换机转发。
    /// 帧的目的主机收到后回一个包，相当于 ARP 应答，控制器借此学到它的位置。
    fn dispatch(&mut self, sim: &mut Simulator) {
        let now = sim.now();
        for cmd in self.ctrl.channel_mut().drain() {
            match &cmd {
                SwitchCommand::InstallFlow { dpid, rule } => {
                    self.dataplane.install(*dpid, *rule, now)
                }
                SwitchCommand::DeleteFlowsByPort { dpid, port } => {
                    let n = self.dataplane.delete_by_port(*dpid, *port);
                    debug!(%dpid, %port, deleted = n, "按端口删除规则");
                }
                SwitchCommand::FloodPacket {
                    dpid,
                    exclude_port,
                    payload,
                } => {
                    if let Some(reply) = self.flood_reply(*dpid, *exclude_port, payload) {
                        sim.schedule_in(FLOOD_REPLY_DELAY, reply);
                    }
                }
                SwitchCommand::RequestAggregateStats { dpid } => {
                    sim.schedule_in(self.stats_reply_delay, StatsReplyDue { dpid: *dpid });
                }
            }
            self.issued.push(IssuedCommand {
                at_ms: now.as_millis(),
                cmd,
            });
        }
    }

    /// 泛洪帧的目的主机若接在 `dpid` 的其他端口上，返回它的回包事件
    fn flood_reply(
        &self,
        dpid: DatapathId,
        exclude_port: PortNo,
        payload: &[u8],
    ) -> Option<HostSend> {
        let (dst, src) = frame_addrs(payload)?;
        let h = self.host(dst)?;
        if h.dpid != dpid || h.port == exclude_port {
            return None;
        }
        debug!(%dpid, host = %dst, "📣 泛洪到达目的主机，回包");
        Some(HostSend { src: dst, dst: src })
    }
}

impl World for FabricWorld {
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn after_event(&mut self, sim: &mut Simulator) {
        self.dispatch(sim);
    }
}

/// 以太网头里的 (目的地址, 源地址)
fn frame_addrs(frame: &[u8]) -> Option<(MacAddr, MacAddr)> {
    let dst: [u8; 6] = frame.get(0..6)?.try_into().ok()?;
    let src: [u8; 6] = frame.get(6..12)?.try_into().ok()?;
    Some((MacAddr(dst), MacAddr(src)))
}

/// 14 字节以太网头：目的地址、源地址、类型
fn ethernet_header(src: MacAddr, dst: MacAddr, ipv4: bool) -> Vec<u8> {
    let ether_type = if ipv4 { ETH_TYPE_IPV4 } else { ETH_TYPE_ARP };
    let mut frame = Vec::with_capacity(14);
    frame.extend_from_slice(&dst.0);
    frame.extend_from_slice(&src.0);
    frame.extend_from_slice(&ether_type.to_be_bytes());
    frame
}
