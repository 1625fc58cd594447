use crate::control::domain::rc_command::RcCommand;

/// Control channel to the aircraft.
///
/// Lifecycle calls are acknowledged by the drone and may block until it
/// answers. `send_rc` is fire-and-forget: the setpoint holds until the
/// next one arrives.
pub trait DroneLink: Send {
    /// Puts the drone into SDK mode.
    fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn stream_on(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn stream_off(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn takeoff(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn land(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn send_rc(&mut self, command: &RcCommand) -> Result<(), Box<dyn std::error::Error>>;
}
