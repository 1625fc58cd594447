use std::sync::{Arc, Mutex};

use crate::control::domain::rc_command::RcCommand;
use crate::drone::domain::drone_link::DroneLink;

/// One call observed by a [`DryRunLink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    Connect,
    StreamOn,
    StreamOff,
    Takeoff,
    Land,
    Rc(RcCommand),
}

/// Link that flies nothing: logs every call and keeps a shared history.
///
/// Lets a recorded video drive the full loop on the ground.
#[derive(Default)]
pub struct DryRunLink {
    history: Arc<Mutex<Vec<LinkEvent>>>,
}

impl DryRunLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays readable after the link is moved into a session.
    pub fn history(&self) -> Arc<Mutex<Vec<LinkEvent>>> {
        self.history.clone()
    }

    fn record(&self, event: LinkEvent) -> Result<(), Box<dyn std::error::Error>> {
        match &event {
            LinkEvent::Rc(cmd) => log::debug!("dry-run: {cmd}"),
            other => log::info!("dry-run: {other:?}"),
        }
        self.history
            .lock()
            .map_err(|_| "dry-run history lock poisoned")?
            .push(event);
        Ok(())
    }
}

impl DroneLink for DryRunLink {
    fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.record(LinkEvent::Connect)
    }

    fn stream_on(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.record(LinkEvent::StreamOn)
    }

    fn stream_off(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.record(LinkEvent::StreamOff)
    }

    fn takeoff(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.record(LinkEvent::Takeoff)
    }

    fn land(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.record(LinkEvent::Land)
    }

    fn send_rc(&mut self, command: &RcCommand) -> Result<(), Box<dyn std::error::Error>> {
        self.record(LinkEvent::Rc(*command))
    }
}
