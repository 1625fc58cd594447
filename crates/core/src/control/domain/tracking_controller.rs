use crate::control::domain::rc_command::{RcCommand, MAX_AXIS_SPEED};
use crate::control::domain::tracking_config::{NoTargetPolicy, TrackingConfig};
use crate::detection::domain::target_selector::Target;

/// The only value carried from one tick to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub previous_horizontal_error: i32,
}

/// PD yaw controller plus a dead-band forward/back policy.
///
/// Yaw steers the face toward the horizontal center of the frame; forward
/// and back hold its apparent size inside the configured area band. The
/// lateral and vertical axes are never actuated.
///
/// No integral term.
#[derive(Clone, Debug)]
pub struct TrackingController {
    config: TrackingConfig,
}

impl TrackingController {
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Computes this tick's command and the state to carry forward.
    ///
    /// Total over its inputs: out-of-range outputs are clamped, never
    /// reported.
    pub fn tick(&self, state: ControllerState, target: &Target) -> (RcCommand, ControllerState) {
        // widened: any i32 center and previous error must not overflow
        let half_width = i64::from(self.config.frame_width / 2);
        let mut error = i64::from(target.center_x) - half_width;

        let derivative = error - i64::from(state.previous_horizontal_error);
        let raw_yaw = self.config.gain_p * error as f64 + self.config.gain_d * derivative as f64;
        let limit = MAX_AXIS_SPEED as f64;
        let mut yaw = self.config.rounding.apply(raw_yaw.clamp(-limit, limit));

        let forward_back = self.forward_back(target.area);

        // center_x == 0 is how a lost target shows up
        if target.center_x == 0 {
            yaw = 0;
            error = 0;
        }

        log::trace!(
            "tick: cx={} area={} error={error} d={derivative} raw_yaw={raw_yaw:.2} fb={forward_back}",
            target.center_x,
            target.area
        );

        (
            RcCommand::new(0, forward_back, 0, yaw),
            ControllerState {
                previous_horizontal_error: saturate_i32(error),
            },
        )
    }

    fn forward_back(&self, area: i64) -> i32 {
        let low = self.config.area_band_low;
        let high = self.config.area_band_high;
        let speed = self.config.approach_speed;

        if low < area && area < high {
            0
        } else if area >= high {
            -speed
        } else if area < low {
            if area == 0 && self.config.no_target_policy == NoTargetPolicy::Hold {
                0
            } else {
                speed
            }
        } else {
            0
        }
    }
}

fn saturate_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::domain::tracking_config::RoundingPolicy;
    use rstest::rstest;

    fn controller() -> TrackingController {
        TrackingController::new(TrackingConfig::default())
    }

    fn target(center_x: i32, area: i64) -> Target {
        Target {
            center_x,
            center_y: 120,
            area,
        }
    }

    fn state(previous: i32) -> ControllerState {
        ControllerState {
            previous_horizontal_error: previous,
        }
    }

    #[test]
    fn test_centered_face_in_band() {
        // face at (200, 130), 80x80: error 20, yaw 0.4*20 + 0.4*20 = 16
        let (cmd, next) = controller().tick(ControllerState::default(), &target(200, 6400));
        assert_eq!(cmd, RcCommand::new(0, 0, 0, 16));
        assert_eq!(next.previous_horizontal_error, 20);
    }

    #[test]
    fn test_no_target_approaches_by_default() {
        let (cmd, next) = controller().tick(state(35), &Target::NONE);
        assert_eq!(cmd, RcCommand::new(0, 20, 0, 0));
        assert_eq!(next.previous_horizontal_error, 0);
    }

    #[test]
    fn test_no_target_hold_policy_hovers() {
        let c = TrackingController::new(TrackingConfig {
            no_target_policy: NoTargetPolicy::Hold,
            ..TrackingConfig::default()
        });
        let (cmd, next) = c.tick(state(-12), &Target::NONE);
        assert!(cmd.is_hover());
        assert_eq!(next.previous_horizontal_error, 0);
    }

    #[test]
    fn test_no_target_with_non_positive_band_low_holds() {
        let c = TrackingController::new(TrackingConfig {
            area_band_low: 0,
            ..TrackingConfig::default()
        });
        let (cmd, _) = c.tick(ControllerState::default(), &Target::NONE);
        assert_eq!(cmd.forward_back(), 0);
    }

    #[rstest]
    #[case(6201, 0)]
    #[case(6500, 0)]
    #[case(6799, 0)]
    #[case(6800, -20)]
    #[case(20_000, -20)]
    #[case(6200, 0)]
    #[case(6199, 20)]
    #[case(1, 20)]
    fn test_area_dead_band(#[case] area: i64, #[case] expected_fb: i32) {
        let (cmd, _) = controller().tick(ControllerState::default(), &target(180, area));
        assert_eq!(cmd.forward_back(), expected_fb);
    }

    #[test]
    fn test_derivative_term_changes_yaw() {
        let c = controller();
        let t = target(230, 6500);
        let (a, _) = c.tick(state(0), &t);
        let (b, _) = c.tick(state(40), &t);
        // error 50: 0.4*50 + 0.4*50 = 40 vs 0.4*50 + 0.4*10 = 24
        assert_eq!(a.yaw(), 40);
        assert_eq!(b.yaw(), 24);
    }

    #[test]
    fn test_zero_derivative_gain_ignores_history() {
        let c = TrackingController::new(TrackingConfig {
            gain_d: 0.0,
            ..TrackingConfig::default()
        });
        let t = target(230, 6500);
        assert_eq!(c.tick(state(0), &t).0, c.tick(state(-90), &t).0);
    }

    #[rstest]
    #[case(359, -500)]
    #[case(1, 500)]
    #[case(359, 0)]
    #[case(1, 0)]
    fn test_yaw_is_clamped(#[case] center_x: i32, #[case] previous: i32) {
        let c = TrackingController::new(TrackingConfig {
            gain_p: 3.0,
            gain_d: 3.0,
            ..TrackingConfig::default()
        });
        let (cmd, _) = c.tick(state(previous), &target(center_x, 6500));
        assert_eq!(cmd.yaw().abs(), 100);
    }

    #[rstest]
    #[case(200, i32::MIN, 100)]
    #[case(200, i32::MAX, -100)]
    #[case(i32::MIN + 5, 0, -100)]
    #[case(i32::MIN, i32::MAX, -100)]
    #[case(i32::MAX, i32::MIN, 100)]
    fn test_extreme_inputs_keep_yaw_direction(
        #[case] center_x: i32,
        #[case] previous: i32,
        #[case] expected_yaw: i32,
    ) {
        let (cmd, next) = controller().tick(state(previous), &target(center_x, 6400));
        assert_eq!(cmd.yaw(), expected_yaw);
        let error = i64::from(center_x) - 180;
        assert_eq!(
            i64::from(next.previous_horizontal_error),
            error.clamp(i64::from(i32::MIN), i64::from(i32::MAX))
        );
    }

    #[test]
    fn test_outputs_bounded_over_sweep() {
        let c = controller();
        for cx in (0..=360).step_by(7) {
            for area in [0, 10, 6200, 6500, 6800, 90_000] {
                for previous in [-1000, -180, 0, 180, 1000] {
                    let (cmd, _) = c.tick(state(previous), &target(cx, area));
                    assert!((-100..=100).contains(&cmd.yaw()));
                    assert!([-20, 0, 20].contains(&cmd.forward_back()));
                    assert_eq!(cmd.left_right(), 0);
                    assert_eq!(cmd.up_down(), 0);
                }
            }
        }
    }

    #[test]
    fn test_state_carries_raw_error() {
        let c = controller();
        let (_, s1) = c.tick(ControllerState::default(), &target(100, 6500));
        assert_eq!(s1.previous_horizontal_error, -80);
        let (cmd, s2) = c.tick(s1, &target(120, 6500));
        // error -60, derivative 20: 0.4*-60 + 0.4*20 = -16
        assert_eq!(cmd.yaw(), -16);
        assert_eq!(s2.previous_horizontal_error, -60);
    }

    #[test]
    fn test_face_touching_left_edge_is_treated_as_lost() {
        let (cmd, next) = controller().tick(state(-100), &target(0, 6500));
        assert_eq!(cmd.yaw(), 0);
        assert_eq!(cmd.forward_back(), 0);
        assert_eq!(next.previous_horizontal_error, 0);
    }

    #[rstest]
    #[case(RoundingPolicy::Truncate, -2)]
    #[case(RoundingPolicy::Nearest, -3)]
    fn test_rounding_policy_applies_to_yaw(#[case] rounding: RoundingPolicy, #[case] yaw: i32) {
        let c = TrackingController::new(TrackingConfig {
            gain_p: 0.5,
            gain_d: 0.0,
            rounding,
            ..TrackingConfig::default()
        });
        // error -5 → raw -2.5
        let (cmd, _) = c.tick(ControllerState::default(), &target(175, 6500));
        assert_eq!(cmd.yaw(), yaw);
    }

    #[test]
    fn test_odd_frame_width_uses_integer_half() {
        let c = TrackingController::new(TrackingConfig {
            frame_width: 361,
            ..TrackingConfig::default()
        });
        let (_, next) = c.tick(ControllerState::default(), &target(181, 6500));
        assert_eq!(next.previous_horizontal_error, 1);
    }
}
