//! 流表下发
//!
//! 把路径翻译成一组有序的流表安装命令；找不到路径时只下发一条丢弃规则。

use super::hosts::{Attachment, HostTable};
use super::policy::Path;
use super::topology::TopologyStore;
use crate::net::{DatapathId, FlowMatch, FlowRule, MacAddr, PortNo, SwitchChannel, SwitchCommand};
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("path is empty")]
    EmptyPath,
    #[error("switch {0} is not connected")]
    UnknownSwitch(DatapathId),
    #[error("host {0} has no known attachment")]
    UnknownHost(MacAddr),
    #[error("no port from {from} towards {to}")]
    MissingLink { from: DatapathId, to: DatapathId },
}

/// 借用控制器状态的一次性下发器
pub struct FlowProgrammer<'a, C: SwitchChannel> {
    topo: &'a TopologyStore,
    hosts: &'a HostTable,
    channel: &'a mut C,
    idle_timeout_secs: u16,
    installed: usize,
}

impl<'a, C: SwitchChannel> FlowProgrammer<'a, C> {
    pub fn new(
        topo: &'a TopologyStore,
        hosts: &'a HostTable,
        channel: &'a mut C,
        idle_timeout_secs: u16,
    ) -> Self {
        Self {
            topo,
            hosts,
            channel,
            idle_timeout_secs,
            installed: 0,
        }
    }

    /// 已发出的安装命令数（失败时包含中止前已发出的部分）
    pub fn installed(&self) -> usize {
        self.installed
    }

    /// 为 src -> dst 这条流沿 `path` 安装双向转发规则。
    ///
    /// 中途遇到无法解析的交换机或端口时，停止安装剩余规则并返回错误，已发出的命令不回收。
    #[tracing::instrument(skip(self, path), fields(hops = ?path.hops(), src = %src, dst = %dst))]
    pub fn install_path(
        &mut self,
        path: &Path,
        src: MacAddr,
        dst: MacAddr,
    ) -> Result<usize, FlowError> {
        let hops = path.hops();
        if hops.is_empty() {
            return Err(FlowError::EmptyPath);
        }
        let src_at = self.attachment(src)?;
        let dst_at = self.attachment(dst)?;
        let fwd = FlowMatch::new(src, dst);

        if hops.len() == 1 {
            let sw = self.resolve(hops[0])?;
            self.install(sw, fwd.reversed(), src_at.port);
            self.install(sw, fwd, dst_at.port);
            debug!(dpid = %sw, "同一交换机上的本地转发");
            return Ok(self.installed);
        }

        let last = hops.len() - 1;
        for (i, pair) in hops.windows(2).enumerate() {
            let up = self.resolve(pair[0])?;
            let down = self.resolve(pair[1])?;

            if i == 0 {
                // 源交换机：回程流量交给源主机
                self.install(up, fwd.reversed(), src_at.port);
            }
            if i + 1 == last {
                // 目的交换机：去程流量交给目的主机
                self.install(down, fwd, dst_at.port);
            }

            let out = self
                .topo
                .link(up, down)
                .ok_or(FlowError::MissingLink { from: up, to: down })?;
            self.install(up, fwd, out.port);

            // 反向优先用反向邻接，缺失时退回同一链路事件报告的对端端口
            let back = self.topo.port(down, up).unwrap_or(out.peer_port);
            self.install(down, fwd.reversed(), back);
            trace!(%up, %down, out = %out.port, back = %back, "逐跳规则已下发");
        }

        Ok(self.installed)
    }

    /// 在 `dpid` 上下发 (src -> dst) 的丢弃规则，带硬超时。
    pub fn install_drop(
        &mut self,
        dpid: DatapathId,
        src: MacAddr,
        dst: MacAddr,
        hard_timeout_secs: u16,
    ) -> Result<(), FlowError> {
        let sw = self.resolve(dpid)?;
        let rule = FlowRule::drop(FlowMatch::new(src, dst), hard_timeout_secs);
        self.channel.send(SwitchCommand::InstallFlow { dpid: sw, rule });
        self.installed += 1;
        Ok(())
    }

    fn attachment(&self, mac: MacAddr) -> Result<Attachment, FlowError> {
        self.hosts.lookup(mac).ok_or(FlowError::UnknownHost(mac))
    }

    fn resolve(&self, dpid: DatapathId) -> Result<DatapathId, FlowError> {
        if self.topo.contains(dpid) {
            Ok(dpid)
        } else {
            warn!(%dpid, "路径中的交换机未连接");
            Err(FlowError::UnknownSwitch(dpid))
        }
    }

    fn install(&mut self, dpid: DatapathId, matches: FlowMatch, port: PortNo) {
        let rule = FlowRule::forward(matches, port, self.idle_timeout_secs);
        self.channel.send(SwitchCommand::InstallFlow { dpid, rule });
        self.installed += 1;
    }
}
