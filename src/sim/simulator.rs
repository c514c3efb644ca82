//! 仿真器
//!
//! 单线程事件调度：按 (时间, 调度序号) 取出事件，一次执行一个，执行完才取下一个。

use super::event::Event;
use super::time::SimTime;
use super::world::World;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 队列中的一个待执行事件；同一时刻按调度先后执行。
struct Slot {
    at: SimTime,
    seq: u64,
    ev: Box<dyn Event>,
}

impl Slot {
    fn key(&self) -> (SimTime, u64) {
        (self.at, self.seq)
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Slot {}

#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    executed: u64,
    q: BinaryHeap<Reverse<Slot>>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    /// 累计已执行的事件数
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// 调度事件在 `at` 执行；早于当前时间的按当前时间处理。
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(now = %self.now, %at, seq, event_type = std::any::type_name::<E>(), "调度事件");
        self.q.push(Reverse(Slot {
            at,
            seq,
            ev: Box::new(ev),
        }));
    }

    /// 调度事件在 `delay` 之后执行
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) {
        let at = self.now + delay;
        self.schedule(at, ev);
    }

    /// 运行直到事件队列为空或到达 `until`，返回本次执行的事件数。
    ///
    /// 恰好在 `until` 的事件会被执行；结束时时间推进到 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) -> u64 {
        let mut count = 0;
        while self.q.peek().is_some_and(|Reverse(top)| top.at <= until) {
            let Some(Reverse(slot)) = self.q.pop() else {
                break;
            };
            self.step(slot, world);
            count += 1;
        }
        self.now = self.now.max(until);
        debug!(
            now = %self.now,
            executed = count,
            remaining = self.q.len(),
            "运行到指定时间"
        );
        count
    }

    /// 运行所有事件直到队列为空。队列里有周期性事件时不会返回，请用 `run_until`。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) -> u64 {
        info!("▶️  开始运行仿真");
        let mut count = 0;
        while let Some(Reverse(slot)) = self.q.pop() {
            self.step(slot, world);
            count += 1;
        }
        info!(total_events = count, final_time = %self.now, "✅ 仿真完成");
        count
    }

    fn step(&mut self, slot: Slot, world: &mut dyn World) {
        self.now = slot.at;
        self.executed += 1;
        trace!(now = %self.now, seq = slot.seq, "执行事件");
        slot.ev.execute(self, world);
        world.after_event(self);
    }
}
