//! 仿真核心模块
//!
//! 单线程事件驱动的调度器，以及仿真场景的 JSON 描述。

// 子模块声明
mod event;
mod simulator;
mod time;
mod world;
mod scenario;

// 重新导出公共接口
pub use event::Event;
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;
pub use scenario::{
    HostSpec, LinkChangeSpec, LinkSpec, LoadSpec, SCHEMA_VERSION, ScenarioError, ScenarioMeta,
    ScenarioSpec, TopologySpec, TrafficSpec,
};
