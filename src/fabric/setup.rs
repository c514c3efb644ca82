//! 按场景描述搭建交换网络并调度初始事件

use super::events::{HostSend, LinkChange, SetLoad, SwitchUp, TimerTick};
use super::fabric_world::FabricWorld;
use crate::net::{MacAddr, PortNo};
use crate::sim::{
    HostSpec, SCHEMA_VERSION, ScenarioError, ScenarioSpec, SimTime, Simulator, TopologySpec,
    TrafficSpec,
};
use tracing::info;

/// 交换机上线后，发现协议报告链路前的时延
const DISCOVERY_DELAY: SimTime = SimTime(1_000_000);

/// 校验场景、构建世界，并把上线、链路发现、定时器、负载、发包和链路变化事件放进调度器。
pub fn load_scenario(
    sim: &mut Simulator,
    spec: &ScenarioSpec,
) -> Result<FabricWorld, ScenarioError> {
    let topo = spec.validate()?;
    let cfg = spec.controller_config()?;
    let interval = SimTime::from_secs(cfg.sampling_interval_secs);

    let mut world = FabricWorld::new(cfg);
    if let Some(ms) = spec.stats_reply_delay_ms {
        world.set_stats_reply_delay(SimTime::from_millis(ms));
    }
    for h in &spec.hosts {
        world.place_host(h.mac, h.switch, h.port, h.ip);
    }

    let start = sim.now();
    for &dpid in &topo.switches {
        sim.schedule(start, SwitchUp { dpid });
    }
    for &link in &topo.links {
        sim.schedule(start + DISCOVERY_DELAY, LinkChange { link, up: true });
    }
    sim.schedule(start + interval, TimerTick { interval });

    for l in &spec.loads {
        sim.schedule(
            start + SimTime::from_millis(l.at_ms),
            SetLoad {
                dpid: l.switch,
                kbps: l.kbps,
            },
        );
    }
    for t in &spec.traffic {
        sim.schedule(
            start + SimTime::from_millis(t.at_ms),
            HostSend {
                src: t.src,
                dst: t.dst,
            },
        );
    }
    for c in &spec.link_changes {
        // validate() 已确认链路存在
        if let Some(link) = topo.find_link(c.a, c.b) {
            sim.schedule(start + SimTime::from_millis(c.at_ms), LinkChange { link, up: c.up });
        }
    }

    info!(
        switches = topo.switches.len(),
        links = topo.links.len(),
        hosts = spec.hosts.len(),
        traffic = spec.traffic.len(),
        "🏗️  场景已加载"
    );
    Ok(world)
}

/// 预置场景：首、末交换机各挂一台主机。
///
/// 两台主机先互相发一次包完成位置学习，之后 h0 每秒向 h1 发一个包。
pub fn preset_scenario(
    topology: TopologySpec,
    until_ms: u64,
) -> Result<ScenarioSpec, ScenarioError> {
    let topo = topology.build()?;
    let (Some(&first), Some(&last)) = (topo.switches.first(), topo.switches.last()) else {
        return Err(ScenarioError::EmptyTopology);
    };
    let h0 = MacAddr::from_u64(0x0000_0000_0001);
    let h1 = MacAddr::from_u64(0x0000_0000_0002);
    let port_on = |dpid| {
        let p = topo.free_port(dpid);
        // 首末交换机相同时两台主机不能共用端口
        if first == last && dpid == last { PortNo(p.0 + 1) } else { p }
    };

    let hosts = vec![
        HostSpec {
            mac: h0,
            switch: first,
            port: topo.free_port(first),
            ip: Some([10, 0, 0, 1].into()),
        },
        HostSpec {
            mac: h1,
            switch: last,
            port: port_on(last),
            ip: Some([10, 0, 0, 2].into()),
        },
    ];

    let mut traffic = vec![
        TrafficSpec { at_ms: 100, src: h0, dst: h1 },
        TrafficSpec { at_ms: 200, src: h1, dst: h0 },
    ];
    traffic.extend(
        (1..)
            .map(|s| s * 1000)
            .take_while(|&ms| ms <= until_ms)
            .map(|at_ms| TrafficSpec {
                at_ms,
                src: h0,
                dst: h1,
            }),
    );

    Ok(ScenarioSpec {
        schema_version: SCHEMA_VERSION,
        meta: None,
        controller: None,
        topology,
        hosts,
        loads: Vec::new(),
        traffic,
        link_changes: Vec::new(),
        stats_reply_delay_ms: None,
    })
}
