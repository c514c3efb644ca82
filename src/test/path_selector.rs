use super::{set_load, store, sw};
use crate::ctrl::{
    Path, PathResult, PolicyGraph, TopologyStore, bellman_ford, compute_path, rank_candidates,
};
use crate::net::DatapathId;

const LIMIT: f64 = 5000.0;

fn hops(result: &PathResult) -> Vec<u64> {
    result
        .path()
        .expect("expected a path")
        .hops()
        .iter()
        .map(|d| d.0)
        .collect()
}

fn assert_edges_exist(topo: &TopologyStore, path: &Path) {
    for pair in path.hops().windows(2) {
        assert!(
            topo.port(pair[0], pair[1]).is_some(),
            "{} -> {} is not a link",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn overloaded_destination_is_still_an_endpoint() {
    let mut topo = store(&[1, 2, 3], &[(1, 2), (2, 3)]);
    set_load(&mut topo, 2, 100.0);
    set_load(&mut topo, 3, 9000.0);

    assert_eq!(hops(&compute_path(&topo, sw(1), sw(3), LIMIT)), vec![1, 2, 3]);
}

#[test]
fn overloaded_relay_is_never_used() {
    let mut topo = store(&[1, 2, 3], &[(1, 2), (2, 3)]);
    set_load(&mut topo, 2, 9000.0);

    assert_eq!(compute_path(&topo, sw(1), sw(3), LIMIT), PathResult::NotFound);
}

#[test]
fn load_at_threshold_is_excluded() {
    let mut topo = store(&[1, 2, 3], &[(1, 2), (2, 3)]);
    set_load(&mut topo, 2, LIMIT);
    assert_eq!(compute_path(&topo, sw(1), sw(3), LIMIT), PathResult::NotFound);

    set_load(&mut topo, 2, LIMIT - 0.5);
    assert_eq!(hops(&compute_path(&topo, sw(1), sw(3), LIMIT)), vec![1, 2, 3]);
}

#[test]
fn diamond_prefers_the_least_loaded_branch() {
    // 1 - 2 - 4 and 1 - 3 - 4
    let mut topo = store(&[1, 2, 3, 4], &[(1, 2), (2, 4), (1, 3), (3, 4)]);
    set_load(&mut topo, 2, 4000.0);
    set_load(&mut topo, 3, 100.0);
    assert_eq!(hops(&compute_path(&topo, sw(1), sw(4), LIMIT)), vec![1, 3, 4]);

    set_load(&mut topo, 3, 4500.0);
    assert_eq!(hops(&compute_path(&topo, sw(1), sw(4), LIMIT)), vec![1, 2, 4]);

    set_load(&mut topo, 2, 7000.0);
    assert_eq!(hops(&compute_path(&topo, sw(1), sw(4), LIMIT)), vec![1, 3, 4]);
}

#[test]
fn unmeasured_switches_rank_first_and_ties_break_by_id() {
    let mut topo = store(&[1, 2, 3, 4, 5, 6], &[]);
    set_load(&mut topo, 2, 50.0);
    set_load(&mut topo, 3, 10.0);
    set_load(&mut topo, 6, 10.0);

    let ranked: Vec<DatapathId> = rank_candidates(&topo, sw(1), sw(5));
    assert_eq!(ranked, vec![sw(4), sw(3), sw(6), sw(2)]);
}

#[test]
fn same_switch_yields_single_element_path() {
    let topo = store(&[1, 2], &[(1, 2)]);
    assert_eq!(hops(&compute_path(&topo, sw(1), sw(1), LIMIT)), vec![1]);
}

#[test]
fn directly_linked_endpoints_need_no_candidates() {
    let topo = store(&[1, 2], &[(1, 2)]);
    assert_eq!(hops(&compute_path(&topo, sw(1), sw(2), LIMIT)), vec![1, 2]);
}

#[test]
fn disconnected_graph_yields_not_found() {
    let topo = store(&[1, 2, 3, 4], &[(1, 2), (3, 4)]);
    assert_eq!(compute_path(&topo, sw(1), sw(4), LIMIT), PathResult::NotFound);
}

#[test]
fn one_way_link_is_not_usable_backwards() {
    let mut topo = store(&[1, 2], &[]);
    topo.link_up(sw(1), sw(2), crate::net::PortNo(2), crate::net::PortNo(1));
    assert_eq!(hops(&compute_path(&topo, sw(1), sw(2), LIMIT)), vec![1, 2]);
    assert_eq!(compute_path(&topo, sw(2), sw(1), LIMIT), PathResult::NotFound);
}

#[test]
fn greedy_admission_stops_at_first_connecting_path() {
    // 1 - 2 - 3 - 5 (idle) and 1 - 4 - 5 (busier). The idle switches are admitted
    // first and connect before 4 is ever considered.
    let mut topo = store(&[1, 2, 3, 4, 5], &[(1, 2), (2, 3), (3, 5), (1, 4), (4, 5)]);
    set_load(&mut topo, 2, 0.0);
    set_load(&mut topo, 3, 0.0);
    set_load(&mut topo, 4, 100.0);

    assert_eq!(hops(&compute_path(&topo, sw(1), sw(5), LIMIT)), vec![1, 2, 3, 5]);
}

#[test]
fn every_hop_of_every_ring_path_is_a_stored_link() {
    for n in 3..=8u64 {
        let ids: Vec<u64> = (1..=n).collect();
        let mut links: Vec<(u64, u64)> = ids.windows(2).map(|w| (w[0], w[1])).collect();
        links.push((n, 1));
        let mut topo = store(&ids, &links);
        for &s in &ids {
            set_load(&mut topo, s, (s * 37 % 11) as f64 * 100.0);
        }

        for &a in &ids {
            for &b in &ids {
                let result = compute_path(&topo, sw(a), sw(b), LIMIT);
                let path = result.path().expect("ring is connected");
                assert_eq!(path.first(), Some(sw(a)));
                assert_eq!(path.last(), Some(sw(b)));
                assert_edges_exist(&topo, path);
            }
        }
    }
}

#[test]
fn link_round_trip_reproduces_the_same_path() {
    let mut topo = store(&[1, 2, 3, 4], &[(1, 2), (2, 4), (1, 3), (3, 4)]);
    set_load(&mut topo, 2, 10.0);
    set_load(&mut topo, 3, 20.0);
    let before = compute_path(&topo, sw(1), sw(4), LIMIT);
    assert_eq!(hops(&before), vec![1, 2, 4]);

    let ports = topo.link_down(sw(2), sw(4)).expect("link existed");
    assert_eq!(hops(&compute_path(&topo, sw(1), sw(4), LIMIT)), vec![1, 3, 4]);

    topo.link_up(sw(2), sw(4), ports.port, ports.peer_port);
    assert_eq!(compute_path(&topo, sw(1), sw(4), LIMIT), before);
}

#[test]
fn bellman_ford_only_sees_admitted_switches() {
    let topo = store(&[1, 2, 3], &[(1, 2), (2, 3), (1, 3)]);
    let mut graph = PolicyGraph::new();
    graph.admit(sw(1), &topo);
    graph.admit(sw(2), &topo);
    assert!(graph.has_edge(sw(1), sw(2)));
    assert!(!graph.has_edge(sw(1), sw(3)));
    assert_eq!(bellman_ford(&graph, sw(1), sw(3)), PathResult::NotFound);

    graph.admit(sw(3), &topo);
    assert_eq!(graph.edges().count(), 6);
    assert_eq!(hops(&bellman_ford(&graph, sw(1), sw(3))), vec![1, 3]);
}

#[test]
fn path_orientation_puts_source_first() {
    let p = Path::new(vec![sw(3), sw(2), sw(1)]);
    assert_eq!(p.clone().oriented_from(sw(1)).hops(), &[sw(1), sw(2), sw(3)]);
    assert_eq!(p.clone().oriented_from(sw(3)).hops(), &[sw(3), sw(2), sw(1)]);
}
