//! 数据平面模型
//!
//! 每台交换机的累计字节计数（按负载曲线增长）和流表（按空闲/硬超时过期）。
//! 只有查表未命中的包才会上送控制器。

use std::collections::BTreeMap;

use crate::net::{DatapathId, FlowAction, FlowMatch, FlowRule, FlowTimeout, PortNo};
use crate::sim::SimTime;
use tracing::trace;

#[derive(Debug, Clone)]
struct InstalledRule {
    rule: FlowRule,
    installed_at: SimTime,
    last_hit: SimTime,
}

impl InstalledRule {
    fn expired(&self, now: SimTime) -> bool {
        let since = match self.rule.timeout {
            FlowTimeout::Idle(_) => self.last_hit,
            FlowTimeout::Hard(_) => self.installed_at,
        };
        now.since(since) >= SimTime::from_secs(u64::from(self.rule.timeout.secs()))
    }
}

#[derive(Debug, Clone, Default)]
struct SwitchState {
    load_kbps: f64,
    bytes: f64,
    counted_until: SimTime,
    rules: Vec<InstalledRule>,
}

impl SwitchState {
    fn advance(&mut self, now: SimTime) {
        let dt = now.since(self.counted_until).as_secs_f64();
        self.bytes += self.load_kbps * 1000.0 / 8.0 * dt;
        self.counted_until = self.counted_until.max(now);
    }

    fn expire(&mut self, now: SimTime) {
        self.rules.retain(|r| !r.expired(now));
    }
}

#[derive(Debug, Default)]
pub struct DataPlane {
    switches: BTreeMap<DatapathId, SwitchState>,
}

impl DataPlane {
    pub fn add_switch(&mut self, dpid: DatapathId) {
        self.switches.entry(dpid).or_default();
    }

    /// 从 `now` 起按 `kbps` 累加字节数；之前的部分按旧速率结算。
    pub fn set_load(&mut self, dpid: DatapathId, kbps: f64, now: SimTime) {
        if let Some(sw) = self.switches.get_mut(&dpid) {
            sw.advance(now);
            sw.load_kbps = kbps.max(0.0);
        }
    }

    /// 截至 `now` 的累计字节数
    pub fn byte_count(&mut self, dpid: DatapathId, now: SimTime) -> Option<u64> {
        let sw = self.switches.get_mut(&dpid)?;
        sw.advance(now);
        Some(sw.bytes as u64)
    }

    /// 当前未过期的规则数
    pub fn flow_count(&mut self, dpid: DatapathId, now: SimTime) -> u32 {
        match self.switches.get_mut(&dpid) {
            Some(sw) => {
                sw.expire(now);
                sw.rules.len() as u32
            }
            None => 0,
        }
    }

    /// 安装规则；相同匹配的旧规则被替换
    pub fn install(&mut self, dpid: DatapathId, rule: FlowRule, now: SimTime) {
        let Some(sw) = self.switches.get_mut(&dpid) else {
            return;
        };
        sw.rules.retain(|r| r.rule.matches != rule.matches);
        sw.rules.push(InstalledRule {
            rule,
            installed_at: now,
            last_hit: now,
        });
        trace!(%dpid, ?rule, "规则已安装");
    }

    /// 删除所有从 `port` 转发出去的规则，返回删除数
    pub fn delete_by_port(&mut self, dpid: DatapathId, port: PortNo) -> usize {
        let Some(sw) = self.switches.get_mut(&dpid) else {
            return 0;
        };
        let before = sw.rules.len();
        sw.rules.retain(|r| r.rule.out_port() != Some(port));
        before - sw.rules.len()
    }

    /// 查表，命中时刷新空闲超时
    pub fn lookup(&mut self, dpid: DatapathId, m: FlowMatch, now: SimTime) -> Option<FlowAction> {
        let sw = self.switches.get_mut(&dpid)?;
        sw.expire(now);
        let hit = sw.rules.iter_mut().find(|r| r.rule.matches == m)?;
        hit.last_hit = now;
        Some(hit.rule.action)
    }
}
