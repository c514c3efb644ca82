//! Diamond 拓扑构建
//!
//! 拓扑结构：
//!
//! ```text
//!       s2
//!      /  \
//!    s1    s4
//!      \  /
//!       s3
//! ```
//!
//! s1 到 s4 有两条等跳数路径，用来观察负载对选路的影响。

use super::{Topology, TopologyBuilder};

pub fn build_diamond() -> Topology {
    let mut b = TopologyBuilder::new();
    let s1 = b.add_switch(1);
    let s2 = b.add_switch(2);
    let s3 = b.add_switch(3);
    let s4 = b.add_switch(4);

    // 上半边
    b.connect(s1, s2);
    b.connect(s2, s4);
    // 下半边
    b.connect(s1, s3);
    b.connect(s3, s4);
    b.build()
}
