//! 事件 trait
//!
//! 定义仿真事件接口。

use super::simulator::Simulator;
use super::world::World;

/// 事件：到点后被取出并执行一次。
///
/// `self: Box<Self>` 让事件执行时拿回所有权，周期性事件可以把自己重新调度。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
