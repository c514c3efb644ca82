//! 线形 / 环形拓扑构建

use super::{Topology, TopologyBuilder};

/// 构建线形拓扑：s1 - s2 - ... - sn
pub fn build_line(switches: u64) -> Topology {
    let mut b = TopologyBuilder::new();
    let ids: Vec<_> = (1..=switches).map(|i| b.add_switch(i)).collect();
    for pair in ids.windows(2) {
        b.connect(pair[0], pair[1]);
    }
    b.build()
}

/// 构建环形拓扑：在线形基础上再连 sn - s1（至少 3 台交换机才成环）
pub fn build_ring(switches: u64) -> Topology {
    let mut b = TopologyBuilder::new();
    let ids: Vec<_> = (1..=switches).map(|i| b.add_switch(i)).collect();
    for pair in ids.windows(2) {
        b.connect(pair[0], pair[1]);
    }
    if ids.len() >= 3 {
        b.connect(ids[ids.len() - 1], ids[0]);
    }
    b.build()
}
