use super::{mac, sw};
use crate::fabric::DataPlane;
use crate::net::{FlowAction, FlowMatch, FlowRule, FlowTimeout, PortNo};
use crate::sim::SimTime;

fn secs(s: u64) -> SimTime {
    SimTime::from_secs(s)
}

fn plane() -> DataPlane {
    let mut dp = DataPlane::default();
    dp.add_switch(sw(1));
    dp
}

#[test]
fn timeout_reports_its_seconds() {
    assert_eq!(FlowTimeout::Idle(100).secs(), 100);
    assert_eq!(FlowTimeout::Hard(20).secs(), 20);
}

#[test]
fn idle_timeout_is_refreshed_by_hits() {
    let mut dp = plane();
    let m = FlowMatch::new(mac(1), mac(2));
    dp.install(sw(1), FlowRule::forward(m, PortNo(2), 100), SimTime::ZERO);

    assert_eq!(dp.lookup(sw(1), m, secs(60)), Some(FlowAction::Output(PortNo(2))));
    // 150 s after install but only 90 s after the last hit
    assert_eq!(dp.lookup(sw(1), m, secs(150)), Some(FlowAction::Output(PortNo(2))));
    assert_eq!(dp.lookup(sw(1), m, secs(250)), None);
    assert_eq!(dp.flow_count(sw(1), secs(250)), 0);
}

#[test]
fn hard_timeout_ignores_hits() {
    let mut dp = plane();
    let m = FlowMatch::new(mac(1), mac(2));
    dp.install(sw(1), FlowRule::drop(m, 20), secs(1));

    assert_eq!(dp.lookup(sw(1), m, secs(11)), Some(FlowAction::Drop));
    assert_eq!(dp.lookup(sw(1), m, secs(20)), Some(FlowAction::Drop));
    assert_eq!(dp.lookup(sw(1), m, secs(21)), None);
}

#[test]
fn install_replaces_same_match_and_delete_by_port_is_selective() {
    let mut dp = plane();
    let fwd = FlowMatch::new(mac(1), mac(2));
    let back = fwd.reversed();
    dp.install(sw(1), FlowRule::forward(fwd, PortNo(1), 100), SimTime::ZERO);
    dp.install(sw(1), FlowRule::forward(fwd, PortNo(2), 100), SimTime::ZERO);
    dp.install(sw(1), FlowRule::forward(back, PortNo(3), 100), SimTime::ZERO);
    assert_eq!(dp.flow_count(sw(1), SimTime::ZERO), 2);

    assert_eq!(dp.delete_by_port(sw(1), PortNo(1)), 0);
    assert_eq!(dp.delete_by_port(sw(1), PortNo(2)), 1);
    assert_eq!(dp.lookup(sw(1), fwd, SimTime::ZERO), None);
    assert_eq!(dp.lookup(sw(1), back, SimTime::ZERO), Some(FlowAction::Output(PortNo(3))));
}

#[test]
fn byte_count_follows_load_profile() {
    let mut dp = plane();
    // 8 kbit/s = 1000 bytes/s
    dp.set_load(sw(1), 8.0, SimTime::ZERO);
    assert_eq!(dp.byte_count(sw(1), secs(5)), Some(5_000));
    dp.set_load(sw(1), 0.0, secs(5));
    assert_eq!(dp.byte_count(sw(1), secs(10)), Some(5_000));
    assert_eq!(dp.byte_count(sw(9), secs(10)), None);
}
