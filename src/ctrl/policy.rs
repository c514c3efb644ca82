//! 路径选择
//!
//! 按负载从低到高逐个把交换机“准入”到策略子图，每准入一个就在子图上重新跑一次
//! Bellman-Ford（单位边权），直到找到连接 src 和 dst 的路径，或者候选耗尽。
//!
//! 这是贪心的最小拥塞优先启发式，不保证全局最优：早准入的节点在后续更大的子图上
//! 被松弛跳过后不会再被重新考虑。

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::topology::TopologyStore;
use crate::net::{DatapathId, PortNo};
use tracing::{debug, info, trace};

/// 交换机序列，首元素为源交换机、末元素为目的交换机，相邻元素在计算所用的图中相邻。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(Vec<DatapathId>);

impl Path {
    pub fn new(hops: Vec<DatapathId>) -> Self {
        Path(hops)
    }

    pub fn hops(&self) -> &[DatapathId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<DatapathId> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<DatapathId> {
        self.0.last().copied()
    }

    pub fn contains(&self, dpid: DatapathId) -> bool {
        self.0.contains(&dpid)
    }

    /// 保证首元素为 `src`：若路径是反向的则翻转。
    pub fn oriented_from(mut self, src: DatapathId) -> Self {
        if self.first() != Some(src) && self.last() == Some(src) {
            self.0.reverse();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResult {
    Found(Path),
    NotFound,
}

impl PathResult {
    pub fn path(&self) -> Option<&Path> {
        match self {
            PathResult::Found(p) => Some(p),
            PathResult::NotFound => None,
        }
    }
}

/// 一次路径计算用的临时子图：拓扑邻接关系在已准入节点集合上的投影。
#[derive(Debug, Default, Clone)]
pub struct PolicyGraph {
    nodes: BTreeSet<DatapathId>,
    edges: BTreeMap<(DatapathId, DatapathId), PortNo>,
}

impl PolicyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 准入一个节点，并补上它与已准入节点之间的所有有向边。
    ///
    /// 子图只增不减，所以只需处理与新节点相关的边。
    pub fn admit(&mut self, node: DatapathId, topo: &TopologyStore) {
        if !self.nodes.insert(node) {
            return;
        }
        for &other in &self.nodes {
            if let Some(port) = topo.port(node, other) {
                self.edges.insert((node, other), port);
            }
            if other != node {
                if let Some(port) = topo.port(other, node) {
                    self.edges.insert((other, node), port);
                }
            }
        }
    }

    pub fn contains(&self, node: DatapathId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = DatapathId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = (DatapathId, DatapathId)> + '_ {
        self.edges.keys().copied()
    }

    pub fn has_edge(&self, from: DatapathId, to: DatapathId) -> bool {
        self.edges.contains_key(&(from, to))
    }
}

/// 单位边权 Bellman-Ford，最多松弛 |V|-1 轮。
///
/// 从 dst 沿前驱回溯到 src；中途断链说明当前子图不连通，返回 `NotFound`。
pub fn bellman_ford(graph: &PolicyGraph, src: DatapathId, dst: DatapathId) -> PathResult {
    if !graph.contains(src) || !graph.contains(dst) {
        return PathResult::NotFound;
    }

    let mut dist: BTreeMap<DatapathId, u32> = graph.nodes().map(|n| (n, u32::MAX)).collect();
    let mut prev: BTreeMap<DatapathId, DatapathId> = BTreeMap::new();
    dist.insert(src, 0);

    for round in 1..graph.node_count() {
        let mut changed = false;
        for (p, q) in graph.edges() {
            let dp = dist[&p];
            if dp == u32::MAX {
                continue;
            }
            if dp + 1 < dist[&q] {
                dist.insert(q, dp + 1);
                prev.insert(q, p);
                changed = true;
            }
        }
        // 本轮没有任何更新，后续轮次也不会有
        if !changed {
            trace!(round, "松弛提前收敛");
            break;
        }
    }

    let mut hops = vec![dst];
    let mut cur = dst;
    while cur != src {
        match prev.get(&cur) {
            Some(&p) => {
                hops.push(p);
                cur = p;
            }
            None => return PathResult::NotFound,
        }
        if hops.len() > graph.node_count() {
            return PathResult::NotFound;
        }
    }
    hops.reverse();
    PathResult::Found(Path(hops))
}

/// 候选交换机排序：未测量的在前，然后按吞吐升序，吞吐相同按 id 升序。
pub fn rank_candidates(topo: &TopologyStore, src: DatapathId, dst: DatapathId) -> Vec<DatapathId> {
    let mut ranked: Vec<(DatapathId, Option<f64>)> = topo
        .switch_ids()
        .filter(|&d| d != src && d != dst)
        .map(|d| (d, topo.throughput_kbps(d)))
        .collect();
    ranked.sort_by(|(da, ka), (db, kb)| {
        let by_load = match (ka, kb) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.total_cmp(b),
        };
        by_load.then(da.cmp(db))
    });
    ranked.into_iter().map(|(d, _)| d).collect()
}

/// 计算 src 到 dst 的最小拥塞路径。
///
/// 吞吐达到 `threshold_kbps` 的候选在本次计算中被永久排除。src/dst 自身不受阈值限制。
#[tracing::instrument(skip(topo), fields(src = %src, dst = %dst))]
pub fn compute_path(
    topo: &TopologyStore,
    src: DatapathId,
    dst: DatapathId,
    threshold_kbps: f64,
) -> PathResult {
    let mut graph = PolicyGraph::new();
    graph.admit(src, topo);
    graph.admit(dst, topo);

    // 只有端点时先试一次：同一交换机或直连的情况不需要任何中间节点。
    if let found @ PathResult::Found(_) = bellman_ford(&graph, src, dst) {
        debug!(admitted = graph.node_count(), "端点之间直接可达");
        return found;
    }

    for cand in rank_candidates(topo, src, dst) {
        let load = topo.throughput_kbps(cand);
        if load.is_some_and(|kbps| kbps >= threshold_kbps) {
            info!(dpid = %cand, kbps = load, "🚫 交换机负载过高，排除");
            continue;
        }
        graph.admit(cand, topo);
        debug!(dpid = %cand, kbps = load, admitted = graph.node_count(), "节点加入路径计算");

        let result = bellman_ford(&graph, src, dst);
        if let PathResult::Found(path) = &result {
            if path.first() == Some(src) && path.last() == Some(dst) {
                debug!(hops = ?path.hops(), "Bellman-Ford 找到最短路径");
                return result;
            }
        }
    }

    info!("❌ 候选耗尽，没有可用路径");
    PathResult::NotFound
}
