//! 交换网络仿真模块
//!
//! 用事件驱动仿真器模拟控制器周围的世界：交换机上线、链路发现、统计回复、流表转发。

// 子模块声明
mod dataplane;
mod events;
mod fabric_world;
mod setup;

// 重新导出公共接口
pub use dataplane::DataPlane;
pub use events::{HostSend, LinkChange, Notify, SetLoad, StatsReplyDue, SwitchUp, TimerTick};
pub use fabric_world::{
    CommandSummary, FabricStats, FabricWorld, HostPlacement, IssuedCommand, SendOutcome,
};
pub use setup::{load_scenario, preset_scenario};
