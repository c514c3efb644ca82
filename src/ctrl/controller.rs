//! 事件控制器
//!
//! 控制器入口：按到达顺序处理交换机上线、packet-in、链路变化、统计回复和定时器事件，
//! 协调拓扑存储、主机表、负载采样、路径选择和流表下发。每个处理函数都运行到结束，
//! 不阻塞在交换机 I/O 上，也不会向调用者返回错误。

use super::flows::FlowProgrammer;
use super::hosts::HostTable;
use super::policy::{PathResult, compute_path};
use super::sampler::LoadSampler;
use super::topology::TopologyStore;
use crate::config::ControllerConfig;
use crate::net::{
    AggregateStatsReply, DatapathId, ETH_TYPE_IPV4, LinkEvent, MacAddr, Notification, PacketIn,
    SwitchChannel, SwitchCommand,
};
use tracing::{debug, info, trace, warn};

/// 一次 packet-in 的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    /// 首次看到源主机，记录位置后结束
    LearnedSource,
    /// 目的主机未知，泛洪
    Flooded,
    /// 已沿路径安装规则
    Routed { hops: Vec<DatapathId>, rules: usize },
    /// 没有路径，安装了丢弃规则
    Dropped,
    /// 找到路径但下发中途失败
    Aborted,
}

pub struct Controller<C: SwitchChannel> {
    cfg: ControllerConfig,
    topo: TopologyStore,
    hosts: HostTable,
    sampler: LoadSampler,
    channel: C,
}

impl<C: SwitchChannel> Controller<C> {
    pub fn new(cfg: ControllerConfig, channel: C) -> Self {
        let sampler = LoadSampler::new(cfg.sampling_interval_secs);
        Self {
            cfg,
            topo: TopologyStore::new(),
            hosts: HostTable::new(),
            sampler,
            channel,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.cfg
    }

    pub fn topology(&self) -> &TopologyStore {
        &self.topo
    }

    pub fn hosts(&self) -> &HostTable {
        &self.hosts
    }

    pub fn sampler(&self) -> &LoadSampler {
        &self.sampler
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// 分发一条通知
    pub fn handle(&mut self, n: Notification) {
        match n {
            Notification::SwitchConnect { dpid } => self.on_switch_connect(dpid),
            Notification::PacketIn(pkt) => {
                self.on_packet_in(pkt);
            }
            Notification::LinkEvent(ev) => self.on_link_event(ev),
            Notification::AggregateStats(reply) => self.on_aggregate_stats(reply),
            Notification::TimerTick => self.on_timer(),
        }
    }

    #[tracing::instrument(skip(self), fields(dpid = %dpid))]
    pub fn on_switch_connect(&mut self, dpid: DatapathId) {
        if self.topo.add_switch(dpid) {
            info!("🔌 交换机已连接");
        } else {
            debug!("交换机重复连接");
        }
    }

    #[tracing::instrument(
        skip(self, pkt),
        fields(src = %pkt.src, dst = %pkt.dst, dpid = %pkt.dpid, in_port = %pkt.in_port)
    )]
    pub fn on_packet_in(&mut self, pkt: PacketIn) -> PacketOutcome {
        if pkt.ether_type == ETH_TYPE_IPV4 {
            if let Some(ip) = pkt.src_ip {
                self.hosts.learn_ip(pkt.src, ip);
            }
        }

        let src_at = self.hosts.lookup(pkt.src);
        let dst_at = self.hosts.lookup(pkt.dst);

        match (src_at, dst_at) {
            (Some(s), Some(d)) => self.on_both_endpoints_known(s.dpid, d.dpid, pkt.src, pkt.dst),
            (None, _) => {
                self.hosts.learn(pkt.src, pkt.dpid, pkt.in_port);
                info!("📍 记录主机位置");
                PacketOutcome::LearnedSource
            }
            (Some(_), None) => {
                debug!("目的主机未知，泛洪");
                self.channel.send(SwitchCommand::FloodPacket {
                    dpid: pkt.dpid,
                    exclude_port: pkt.in_port,
                    payload: pkt.payload,
                });
                PacketOutcome::Flooded
            }
        }
    }

    #[tracing::instrument(skip(self), fields(added = ev.added, from = %ev.dpid1, to = %ev.dpid2))]
    pub fn on_link_event(&mut self, ev: LinkEvent) {
        if !self.topo.contains(ev.dpid1) || !self.topo.contains(ev.dpid2) {
            trace!("忽略涉及未知交换机的链路事件");
            return;
        }

        if ev.added {
            self.topo.link_up(ev.dpid1, ev.dpid2, ev.port1, ev.port2);
            debug!(port = %ev.port1, "🔗 链路已加入");
            return;
        }

        self.topo.link_down(ev.dpid1, ev.dpid2);
        // 删掉经过该端口的规则，让受影响的流量回到控制器重新算路
        self.channel.send(SwitchCommand::DeleteFlowsByPort {
            dpid: ev.dpid1,
            port: ev.port1,
        });
        info!(port = %ev.port1, "⛓️  链路断开，已清除相关流表");
    }

    pub fn on_aggregate_stats(&mut self, reply: AggregateStatsReply) {
        self.sampler.on_reply(&mut self.topo, &reply);
    }

    pub fn on_timer(&mut self) {
        self.sampler.on_timer(&self.topo, &mut self.channel);
    }

    fn on_both_endpoints_known(
        &mut self,
        src_sw: DatapathId,
        dst_sw: DatapathId,
        src: MacAddr,
        dst: MacAddr,
    ) -> PacketOutcome {
        let result = compute_path(&self.topo, src_sw, dst_sw, self.cfg.bandwidth_threshold_kbps);
        let mut programmer = FlowProgrammer::new(
            &self.topo,
            &self.hosts,
            &mut self.channel,
            self.cfg.flow_idle_timeout_secs,
        );

        match result {
            PathResult::Found(path) => {
                let path = path.oriented_from(src_sw);
                match programmer.install_path(&path, src, dst) {
                    Ok(rules) => {
                        info!(
                            hops = ?path.hops(),
                            rules,
                            src_ip = ?self.hosts.ip(src),
                            dst_ip = ?self.hosts.ip(dst),
                            "✅ 流路径已下发"
                        );
                        PacketOutcome::Routed {
                            hops: path.hops().to_vec(),
                            rules,
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, installed = programmer.installed(), "流表下发中止");
                        PacketOutcome::Aborted
                    }
                }
            }
            PathResult::NotFound => {
                let hard = self.cfg.drop_hard_timeout_secs;
                match programmer.install_drop(src_sw, src, dst, hard) {
                    Ok(()) => info!(
                        %src_sw,
                        %dst_sw,
                        hard_timeout = hard,
                        "🛑 无可用路径，已下发丢弃规则"
                    ),
                    Err(e) => warn!(error = %e, "丢弃规则下发失败"),
                }
                PacketOutcome::Dropped
            }
        }
    }
}
