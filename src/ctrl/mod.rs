//! 控制器核心模块
//!
//! 拓扑存储、主机位置表、负载采样、路径选择、流表下发，以及把它们串起来的事件控制器。
//! 所有表都由 `Controller` 持有，组件函数通过参数拿到状态，便于用构造出来的状态快照单独测试。

// 子模块声明
mod topology;
mod hosts;
mod sampler;
mod policy;
mod flows;
mod controller;

// 重新导出公共接口
pub use topology::{LinkPorts, SwitchRecord, TopologyStore};
pub use hosts::{Attachment, HostTable};
pub use sampler::{LoadSampler, throughput_kbps};
pub use policy::{Path, PathResult, PolicyGraph, bellman_ford, compute_path, rank_candidates};
pub use flows::{FlowError, FlowProgrammer};
pub use controller::{Controller, PacketOutcome};
