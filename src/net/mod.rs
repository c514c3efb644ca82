//! 网络对象模块
//!
//! 此模块包含控制器与交换机之间交换的对象：标识符、流表项、出站命令和入站通知。

// 子模块声明
mod id;
mod flow;
mod command;
mod notification;

// 重新导出公共接口
pub use id::{DatapathId, MacAddr, MacParseError, PortNo};
pub use flow::{FlowAction, FlowMatch, FlowRule, FlowTimeout};
pub use command::{CommandLog, SwitchChannel, SwitchCommand};
pub use notification::{
    AggregateStatsReply, ETH_TYPE_ARP, ETH_TYPE_IPV4, LinkEvent, Notification, PacketIn,
};
