//! Outbound commands the controller issues to switches.

use serde::{Deserialize, Serialize};

use super::flow::FlowRule;
use super::id::{DatapathId, PortNo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SwitchCommand {
    InstallFlow {
        dpid: DatapathId,
        rule: FlowRule,
    },
    /// Delete every rule on `dpid` whose output port is `port`.
    DeleteFlowsByPort {
        dpid: DatapathId,
        port: PortNo,
    },
    /// Send `payload` out every port of `dpid` except `exclude_port`.
    FloodPacket {
        dpid: DatapathId,
        exclude_port: PortNo,
        payload: Vec<u8>,
    },
    RequestAggregateStats {
        dpid: DatapathId,
    },
}

impl SwitchCommand {
    pub fn dpid(&self) -> DatapathId {
        match self {
            SwitchCommand::InstallFlow { dpid, .. }
            | SwitchCommand::DeleteFlowsByPort { dpid, .. }
            | SwitchCommand::FloodPacket { dpid, .. }
            | SwitchCommand::RequestAggregateStats { dpid } => *dpid,
        }
    }
}

/// Fire-and-forget transport to the switches. No acknowledgement is awaited.
pub trait SwitchChannel {
    fn send(&mut self, cmd: SwitchCommand);
}

/// A channel that only records what was sent, in order.
#[derive(Debug, Default, Clone)]
pub struct CommandLog {
    sent: Vec<SwitchCommand>,
}

impl CommandLog {
    pub fn commands(&self) -> &[SwitchCommand] {
        &self.sent
    }

    /// Take everything sent since the last drain.
    pub fn drain(&mut self) -> Vec<SwitchCommand> {
        std::mem::take(&mut self.sent)
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}

impl SwitchChannel for CommandLog {
    fn send(&mut self, cmd: SwitchCommand) {
        self.sent.push(cmd);
    }
}

impl<C: SwitchChannel + ?Sized> SwitchChannel for &mut C {
    fn send(&mut self, cmd: SwitchCommand) {
        (**self).send(cmd)
    }
}
