use std::fmt;

/// Largest magnitude the flight controller accepts on any axis.
pub const MAX_AXIS_SPEED: i32 = 100;

/// One 4-axis velocity setpoint, each axis a percentage in [-100, 100].
///
/// Held by the drone until the next command supersedes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RcCommand {
    left_right: i32,
    forward_back: i32,
    up_down: i32,
    yaw: i32,
}

impl RcCommand {
    pub const HOVER: RcCommand = RcCommand {
        left_right: 0,
        forward_back: 0,
        up_down: 0,
        yaw: 0,
    };

    /// Clamps every axis into range, so a constructed command is always
    /// safe to transmit.
    pub fn new(left_right: i32, forward_back: i32, up_down: i32, yaw: i32) -> Self {
        Self {
            left_right: clamp_axis(left_right),
            forward_back: clamp_axis(forward_back),
            up_down: clamp_axis(up_down),
            yaw: clamp_axis(yaw),
        }
    }

    pub fn left_right(&self) -> i32 {
        self.left_right
    }

    pub fn forward_back(&self) -> i32 {
        self.forward_back
    }

    pub fn up_down(&self) -> i32 {
        self.up_down
    }

    pub fn yaw(&self) -> i32 {
        self.yaw
    }

    pub fn axes(&self) -> [i32; 4] {
        [self.left_right, self.forward_back, self.up_down, self.yaw]
    }

    pub fn is_hover(&self) -> bool {
        *self == Self::HOVER
    }
}

fn clamp_axis(v: i32) -> i32 {
    v.clamp(-MAX_AXIS_SPEED, MAX_AXIS_SPEED)
}

/// Tello SDK wire form: `rc a b c d`.
impl fmt::Display for RcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rc {} {} {} {}",
            self.left_right, self.forward_back, self.up_down, self.yaw
        )
    }
}
