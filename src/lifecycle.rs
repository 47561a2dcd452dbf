//! Birth/data/death ordering for a node and its devices.

use crate::error::{Error, Result};
use crate::topic::MessageType;
use std::collections::HashMap;

/// Where a node or device is in its Sparkplug lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// No birth published yet
    #[default]
    Unborn,
    /// Birth published, no data since
    Born,
    /// Birth published and data flowing
    Publishing,
    /// Death published
    Dead,
}

impl LifecycleState {
    /// Returns true once a birth has been published and no death since.
    pub fn is_alive(&self) -> bool {
        matches!(self, LifecycleState::Born | LifecycleState::Publishing)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleState::Unborn => "Unborn",
            LifecycleState::Born => "Born",
            LifecycleState::Publishing => "Publishing",
            LifecycleState::Dead => "Dead",
        };
        write!(f, "{}", s)
    }
}

/// Tracks the lifecycle of one edge node and the devices under it, and
/// rejects messages that would break birth-before-data-before-death order.
///
/// Checking and recording are separate so a caller can check, build and
/// publish, and only then record what actually went out:
///
/// - NBIRTH: allowed unless the node is dead; every device goes back to
///   unborn and must be born again.
/// - NDATA: needs a born node.
/// - NDEATH: allowed once; the node and all its devices end up dead.
/// - DBIRTH: needs a born node; a device may be reborn after DDEATH.
/// - DDATA / DDEATH: need a born node and a born device.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    node: LifecycleState,
    devices: HashMap<String, LifecycleState>,
}

impl Lifecycle {
    /// Creates a lifecycle with an unborn node and no known devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of the node.
    pub fn node_state(&self) -> LifecycleState {
        self.node
    }

    /// State of a device; devices never seen are unborn.
    pub fn device_state(&self, device_id: &str) -> LifecycleState {
        self.devices.get(device_id).copied().unwrap_or_default()
    }

    /// Returns an error if `message_type` may not be published now.
    pub fn check(&self, message_type: MessageType, device_id: Option<&str>) -> Result<()> {
        let node_ok = match message_type {
            MessageType::NBirth => self.node != LifecycleState::Dead,
            MessageType::NDeath => self.node != LifecycleState::Dead,
            MessageType::NData
            | MessageType::DBirth
            | MessageType::DData
            | MessageType::DDeath => self.node.is_alive(),
            MessageType::NCmd | MessageType::DCmd | MessageType::State => false,
        };
        if !node_ok {
            return Err(Error::LifecycleViolation {
                message_type,
                scope: "node".to_string(),
                state: self.node,
            });
        }

        if message_type.is_device_message() {
            let device_id = device_id.ok_or(Error::MissingDeviceId { message_type })?;
            let device = self.device_state(device_id);
            let device_ok = match message_type {
                MessageType::DBirth => true,
                _ => device.is_alive(),
            };
            if !device_ok {
                return Err(Error::LifecycleViolation {
                    message_type,
                    scope: format!("device '{}'", device_id),
                    state: device,
                });
            }
        }

        Ok(())
    }

    /// Records that `message_type` was published.
    pub fn record(&mut self, message_type: MessageType, device_id: Option<&str>) {
        match (message_type, device_id) {
            (MessageType::NBirth, _) => {
                self.node = LifecycleState::Born;
                for state in self.devices.values_mut() {
                    *state = LifecycleState::Unborn;
                }
            }
            (MessageType::NData, _) => self.node = LifecycleState::Publishing,
            (MessageType::NDeath, _) => {
                self.node = LifecycleState::Dead;
                for state in self.devices.values_mut() {
                    *state = LifecycleState::Dead;
                }
            }
            (MessageType::DBirth, Some(id)) => self.set_device(id, LifecycleState::Born),
            (MessageType::DData, Some(id)) => self.set_device(id, LifecycleState::Publishing),
            (MessageType::DDeath, Some(id)) => self.set_device(id, LifecycleState::Dead),
            _ => {}
        }
    }

    fn set_device(&mut self, device_id: &str, state: LifecycleState) {
        self.devices.insert(device_id.to_string(), state);
    }
}
