//! 负载采样
//!
//! 每个采样周期向所有已知交换机请求聚合统计，并把累计字节数换算成吞吐（kbit/s）。

use std::collections::BTreeMap;

use super::topology::TopologyStore;
use crate::net::{AggregateStatsReply, DatapathId, SwitchChannel, SwitchCommand};
use tracing::{debug, info, trace};

#[derive(Debug, Clone)]
pub struct LoadSampler {
    interval_secs: u64,
    /// 本周期内已回复的交换机及其字节数；每次定时器触发时清空
    responded: BTreeMap<DatapathId, u64>,
}

impl LoadSampler {
    /// 周期为 0 时按 1 秒处理
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs: interval_secs.max(1),
            responded: BTreeMap::new(),
        }
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// 定时器触发：清空本周期记录，向每台已知交换机发送统计请求。返回请求数。
    pub fn on_timer<C: SwitchChannel>(&mut self, topo: &TopologyStore, channel: &mut C) -> usize {
        self.responded.clear();
        let mut sent = 0;
        for dpid in topo.switch_ids() {
            channel.send(SwitchCommand::RequestAggregateStats { dpid });
            sent += 1;
        }
        debug!(requests = sent, "⏱️  已请求聚合统计");
        sent
    }

    /// 处理统计回复，返回新的吞吐估计。未知交换机的回复被忽略。
    pub fn on_reply(
        &mut self,
        topo: &mut TopologyStore,
        reply: &AggregateStatsReply,
    ) -> Option<f64> {
        let Some(rec) = topo.switch_mut(reply.dpid) else {
            trace!(dpid = %reply.dpid, "忽略未知交换机的统计回复");
            return None;
        };

        // 首次观测时把上次计数视为本次计数，得到零增量。
        // 计数回退（交换机重启）同样按零增量处理。
        let prev = rec.last_byte_count.unwrap_or(reply.byte_count);
        let delta = reply.byte_count.saturating_sub(prev);
        let kbps = throughput_kbps(delta, self.interval_secs);

        rec.throughput_kbps = Some(kbps);
        rec.last_byte_count = Some(reply.byte_count);
        rec.last_flow_count = reply.flow_count;
        self.responded.insert(reply.dpid, reply.byte_count);

        info!(
            dpid = %reply.dpid,
            byte_count = reply.byte_count,
            flow_count = reply.flow_count,
            kbps,
            "📊 交换机负载"
        );
        Some(kbps)
    }

    /// 本周期内是否已收到该交换机的回复
    pub fn responded(&self, dpid: DatapathId) -> bool {
        self.responded.contains_key(&dpid)
    }

    pub fn responded_count(&self) -> usize {
        self.responded.len()
    }
}

/// 8 * delta / interval / 1000，`interval_secs` 必须大于 0
pub fn throughput_kbps(delta_bytes: u64, interval_secs: u64) -> f64 {
    (delta_bytes as f64) * 8.0 / (interval_secs as f64) / 1000.0
}
