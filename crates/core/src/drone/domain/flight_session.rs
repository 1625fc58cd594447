use std::time::Duration;

use crate::control::domain::rc_command::RcCommand;
use crate::drone::domain::drone_link::DroneLink;
use crate::shared::constants::{DEFAULT_ASCENT_MS, DEFAULT_ASCENT_SPEED};

/// What happens between "connected" and "ready to track".
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchPlan {
    /// Held for `ascent_duration` after takeoff, then replaced by hover.
    pub ascent: RcCommand,
    pub ascent_duration: Duration,
}

impl Default for LaunchPlan {
    fn default() -> Self {
        Self {
            ascent: RcCommand::new(0, 0, DEFAULT_ASCENT_SPEED, 0),
            ascent_duration: Duration::from_millis(DEFAULT_ASCENT_MS),
        }
    }
}

/// An owned, airborne connection to the drone.
///
/// Created by [`FlightSession::start`]; landing and stopping the video
/// stream happen when the session is finished or dropped, whichever comes
/// first. Cancellation and early returns on error both land the aircraft.
/// A panic only does so when it unwinds: release builds abort on panic, so
/// `Drop` never runs there.
pub struct FlightSession {
    link: Box<dyn DroneLink>,
    streaming: bool,
    airborne: bool,
    closed: bool,
}

impl FlightSession {
    /// Connects, starts video, takes off and climbs per `plan`.
    ///
    /// If a step fails, whatever already succeeded is undone before the
    /// error is returned.
    pub fn start(
        link: Box<dyn DroneLink>,
        plan: &LaunchPlan,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut session = Self {
            link,
            streaming: false,
            airborne: false,
            closed: false,
        };

        session.link.connect()?;
        log::info!("Drone connected");
        session.link.stream_on()?;
        session.streaming = true;
        session.link.takeoff()?;
        session.airborne = true;
        log::info!("Airborne");

        if !plan.ascent_duration.is_zero() {
            session.link.send_rc(&plan.ascent)?;
            std::thread::sleep(plan.ascent_duration);
        }
        session.link.send_rc(&RcCommand::HOVER)?;

        Ok(session)
    }

    pub fn link(&mut self) -> &mut dyn DroneLink {
        self.link.as_mut()
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne
    }

    /// Lands and stops the stream, reporting the first failure.
    pub fn finish(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut first_err: Option<Box<dyn std::error::Error>> = None;

        if self.airborne {
            if let Err(e) = self.link.send_rc(&RcCommand::HOVER) {
                log::warn!("Failed to zero velocity before landing: {e}");
            }
            match self.link.land() {
                Ok(()) => {
                    self.airborne = false;
                    log::info!("Landed");
                }
                Err(e) => first_err = Some(e),
            }
        }
        if self.streaming {
            match self.link.stream_off() {
                Ok(()) => self.streaming = false,
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for FlightSession {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::error!("Flight teardown failed: {e}");
        }
    }
}
