//! 交换网络事件
//!
//! 把外部世界的动作（交换机上线、链路发现与变化、统计回复、定时器、主机发包、负载变化）
//! 包装成仿真事件，逐个交给控制器。

use super::fabric_world::FabricWorld;
use crate::net::{AggregateStatsReply, DatapathId, MacAddr, Notification};
use crate::sim::{Event, SimTime, Simulator, World};
use crate::topo::TopoLink;
use tracing::{debug, info};

fn fabric(world: &mut dyn World) -> &mut FabricWorld {
    world
        .as_any_mut()
        .downcast_mut::<FabricWorld>()
        .expect("world must be FabricWorld")
}

/// 事件：把一条通知原样交给控制器
#[derive(Debug)]
pub struct Notify {
    pub notification: Notification,
}

impl Event for Notify {
    fn execute(self: Box<Self>, _sim: &mut Simulator, world: &mut dyn World) {
        let Notify { notification } = *self;
        fabric(world).ctrl.handle(notification);
    }
}

/// 事件：交换机上线（数据平面和控制器同时登记）
#[derive(Debug)]
pub struct SwitchUp {
    pub dpid: DatapathId,
}

impl Event for SwitchUp {
    fn execute(self: Box<Self>, _sim: &mut Simulator, world: &mut dyn World) {
        let w = fabric(world);
        w.add_switch(self.dpid);
        w.ctrl.on_switch_connect(self.dpid);
    }
}

/// 事件：统计回复到达。字节数按到达时刻的计数采样。
#[derive(Debug)]
pub struct StatsReplyDue {
    pub dpid: DatapathId,
}

impl Event for StatsReplyDue {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = fabric(world);
        let now = sim.now();
        let Some(byte_count) = w.dataplane.byte_count(self.dpid, now) else {
            return;
        };
        let flow_count = w.dataplane.flow_count(self.dpid, now);
        w.ctrl.on_aggregate_stats(AggregateStatsReply {
            dpid: self.dpid,
            byte_count,
            flow_count,
        });
    }
}

/// 事件：周期定时器，执行后按 `interval` 重新调度自己
#[derive(Debug)]
pub struct TimerTick {
    pub interval: SimTime,
}

impl Event for TimerTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        debug!(now = %sim.now(), "⏱️  定时器触发");
        fabric(world).ctrl.on_timer();
        let interval = self.interval;
        sim.schedule_in(interval, *self);
    }
}

/// 事件：主机发一个包
#[derive(Debug)]
pub struct HostSend {
    pub src: MacAddr,
    pub dst: MacAddr,
}

impl Event for HostSend {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let outcome = fabric(world).send_packet(self.src, self.dst, sim.now());
        debug!(src = %self.src, dst = %self.dst, ?outcome, "主机发包");
    }
}

/// 事件：改变交换机的负载速率
#[derive(Debug)]
pub struct SetLoad {
    pub dpid: DatapathId,
    pub kbps: f64,
}

impl Event for SetLoad {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        fabric(world).dataplane.set_load(self.dpid, self.kbps, sim.now());
        debug!(dpid = %self.dpid, kbps = self.kbps, "负载已更新");
    }
}

/// 事件：物理链路接通或断开，发现协议随即报告两个方向的链路事件
#[derive(Debug)]
pub struct LinkChange {
    pub link: TopoLink,
    pub up: bool,
}

impl Event for LinkChange {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = fabric(world);
        let events = if self.up {
            w.wire(self.link)
        } else {
            w.unwire(self.link)
        };
        info!(
            now = %sim.now(),
            a = %self.link.a,
            b = %self.link.b,
            up = self.up,
            "链路状态变化"
        );
        for ev in events {
            w.ctrl.handle(Notification::LinkEvent(ev));
        }
    }
}
