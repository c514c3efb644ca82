//! 世界 trait
//!
//! 事件作用的对象，由上层实现（例如持有控制器和数据平面的交换网络）。

use super::simulator::Simulator;
use std::any::Any;

pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 每个事件执行后调用一次，用来把控制器发出的命令转成后续事件。
    fn after_event(&mut self, _sim: &mut Simulator) {}
}
