//! 仿真场景描述（scenario.json）
//!
//! 描述交换机拓扑、主机接入位置、各交换机的负载曲线、主机间发包时刻以及链路变化。

use std::collections::BTreeSet;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, ControllerConfig};
use crate::net::{DatapathId, MacAddr, PortNo};
use crate::topo::{TopoLink, Topology, TopologyBuilder, build_diamond, build_line, build_ring};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported schema_version {0}")]
    SchemaVersion(u32),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{context} references unknown switch {dpid}")]
    UnknownSwitch { context: &'static str, dpid: DatapathId },
    #[error("{context} references unknown host {mac}")]
    UnknownHost { context: &'static str, mac: MacAddr },
    #[error("no link between {a} and {b}")]
    UnknownLink { a: DatapathId, b: DatapathId },
    #[error("host {mac} declared twice")]
    DuplicateHost { mac: MacAddr },
    #[error("host {mac} uses port {port} on {dpid}, which is a switch link port")]
    HostPortInUse {
        mac: MacAddr,
        dpid: DatapathId,
        port: PortNo,
    },
    #[error("port {port} on {dpid} is used by more than one link")]
    PortInUse { dpid: DatapathId, port: PortNo },
    #[error("link connects {dpid} to itself")]
    SelfLink { dpid: DatapathId },
    #[error("topology needs at least one switch")]
    EmptyTopology,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<ScenarioMeta>,
    #[serde(default)]
    pub controller: Option<ControllerConfig>,
    pub topology: TopologySpec,
    #[serde(default)]
    pub hosts: Vec<HostSpec>,
    #[serde(default)]
    pub loads: Vec<LoadSpec>,
    #[serde(default)]
    pub traffic: Vec<TrafficSpec>,
    #[serde(default)]
    pub link_changes: Vec<LinkChangeSpec>,
    /// 统计请求到回复之间的时延（毫秒）
    #[serde(default)]
    pub stats_reply_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySpec {
    Line { switches: u64 },
    Ring { switches: u64 },
    Diamond,
    Custom {
        switches: Vec<DatapathId>,
        #[serde(default)]
        links: Vec<LinkSpec>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinkSpec {
    pub a: DatapathId,
    pub a_port: PortNo,
    pub b: DatapathId,
    pub b_port: PortNo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSpec {
    pub mac: MacAddr,
    pub switch: DatapathId,
    pub port: PortNo,
    #[serde(default)]
    pub ip: Option<Ipv4Addr>,
}

/// 从 `at_ms` 起，交换机以 `kbps` 的速率累加字节计数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSpec {
    pub switch: DatapathId,
    pub kbps: f64,
    #[serde(default)]
    pub at_ms: u64,
}

/// 在 `at_ms` 时刻，主机 `src` 向 `dst` 发一个包
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficSpec {
    pub at_ms: u64,
    pub src: MacAddr,
    pub dst: MacAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkChangeSpec {
    pub at_ms: u64,
    pub a: DatapathId,
    pub b: DatapathId,
    pub up: bool,
}

impl ScenarioSpec {
    pub fn from_json_str(raw: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// 场景里的控制器配置，缺省时使用默认值
    pub fn controller_config(&self) -> Result<ControllerConfig, ScenarioError> {
        let cfg = self.controller.clone().unwrap_or_default();
        cfg.validate()?;
        Ok(cfg)
    }

    /// 检查所有引用并构建拓扑
    pub fn validate(&self) -> Result<Topology, ScenarioError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ScenarioError::SchemaVersion(self.schema_version));
        }
        let topo = self.topology.build()?;

        let mut macs = BTreeSet::new();
        for h in &self.hosts {
            if !topo.has_switch(h.switch) {
                return Err(ScenarioError::UnknownSwitch {
                    context: "host",
                    dpid: h.switch,
                });
            }
            if !macs.insert(h.mac) {
                return Err(ScenarioError::DuplicateHost { mac: h.mac });
            }
            if topo.link_ports(h.switch).any(|p| p == h.port) {
                return Err(ScenarioError::HostPortInUse {
                    mac: h.mac,
                    dpid: h.switch,
                    port: h.port,
                });
            }
        }
        for l in &self.loads {
            if !topo.has_switch(l.switch) {
                return Err(ScenarioError::UnknownSwitch {
                    context: "load",
                    dpid: l.switch,
                });
            }
        }
        for t in &self.traffic {
            for mac in [t.src, t.dst] {
                if !macs.contains(&mac) {
                    return Err(ScenarioError::UnknownHost {
                        context: "traffic",
                        mac,
                    });
                }
            }
        }
        for c in &self.link_changes {
            if topo.find_link(c.a, c.b).is_none() {
                return Err(ScenarioError::UnknownLink { a: c.a, b: c.b });
            }
        }
        Ok(topo)
    }
}

impl TopologySpec {
    pub fn build(&self) -> Result<Topology, ScenarioError> {
        let topo = match self {
            TopologySpec::Line { switches } => build_line(*switches),
            TopologySpec::Ring { switches } => build_ring(*switches),
            TopologySpec::Diamond => build_diamond(),
            TopologySpec::Custom { switches, links } => {
                let mut b = TopologyBuilder::new();
                for s in switches {
                    b.add_switch(s.0);
                }
                let mut topo = b.build();
                // 一个端口只能接一条物理链路
                let mut used = BTreeSet::new();
                for l in links {
                    for dpid in [l.a, l.b] {
                        if !topo.has_switch(dpid) {
                            return Err(ScenarioError::UnknownSwitch {
                                context: "link",
                                dpid,
                            });
                        }
                    }
                    if l.a == l.b {
                        return Err(ScenarioError::SelfLink { dpid: l.a });
                    }
                    for (dpid, port) in [(l.a, l.a_port), (l.b, l.b_port)] {
                        if !used.insert((dpid, port)) {
                            return Err(ScenarioError::PortInUse { dpid, port });
                        }
                    }
                    topo.links.push(TopoLink {
                        a: l.a,
                        a_port: l.a_port,
                        b: l.b,
                        b_port: l.b_port,
                    });
                }
                topo
            }
        };
        if topo.switches.is_empty() {
            return Err(ScenarioError::EmptyTopology);
        }
        Ok(topo)
    }
}
