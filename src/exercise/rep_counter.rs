// src/exercise/rep_counter.rs
//
// UP/DOWN repetition state machine driven by a smoothed joint angle.
//
//   UP   --(smoothed <= th_down)-------------------------------> DOWN
//   DOWN --(smoothed >= th_up, depth reached, debounce passed)--> UP  (+1 rep)
//   DOWN --(smoothed >= th_up, inside debounce window)----------> UP  (too_fast)
//
// Threshold checks always use the smoothed angle, never the raw one.
// Frames without a trustworthy angle are flagged and leave the state alone.

use super::angle::STRAIGHT_ANGLE;
use super::keypoints::KeypointSelector;
use super::report::{round2, FormFlag, FrameReport, RepState};
use super::smoother::AngleSmoother;
use crate::error::CounterResult;
use crate::types::{CounterConfig, KeypointFrame, LimbJoints};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RepCounter {
    config: CounterConfig,
    selector: KeypointSelector,
    smoother: AngleSmoother,

    state: RepState,
    reps: u32,
    /// th_down crossed during the current cycle
    depth_reached: bool,
    /// Call ordinal, incremented on every update
    frame: u64,
    /// Frame of the most recently counted rep; `None` = never
    last_rep_frame: Option<u64>,
    /// Lowest smoothed angle seen while UP (diagnostic)
    min_angle_since_up: f64,
}

impl RepCounter {
    /// Knee counter (hip/knee/ankle). Fails only on invalid configuration.
    pub fn new(config: CounterConfig) -> CounterResult<Self> {
        Self::with_joints(config, LimbJoints::default())
    }

    pub fn with_joints(config: CounterConfig, joints: LimbJoints) -> CounterResult<Self> {
        config.validate()?;
        let smoother = AngleSmoother::new(config.alpha)?;
        Ok(Self {
            selector: KeypointSelector::new(joints, config.min_conf),
            smoother,
            config,
            state: RepState::Up,
            reps: 0,
            depth_reached: false,
            frame: 0,
            last_rep_frame: None,
            min_angle_since_up: STRAIGHT_ANGLE,
        })
    }

    /// Full pipeline: pick a leg, measure its angle, advance the state machine.
    pub fn update(&mut self, keypoints: &KeypointFrame) -> FrameReport {
        match self.selector.select(keypoints) {
            Some(m) => self.update_with_angle(Some(m.angle), Some(m.confidence)),
            None => self.update_with_angle(None, None),
        }
    }

    /// Advance with an already measured angle. Never fails: anything
    /// missing, non-finite or below `min_conf` takes the low-confidence path.
    pub fn update_with_angle(&mut self, angle: Option<f64>, confidence: Option<f64>) -> FrameReport {
        self.frame += 1;

        let trusted = match (angle, confidence) {
            (Some(a), Some(c)) if a.is_finite() && c >= self.config.min_conf => Some(a),
            _ => None,
        };

        let Some(raw) = trusted else {
            debug!(
                "frame {}: low confidence (angle={:?}, conf={:?})",
                self.frame, angle, confidence
            );
            return self.report(self.smoother.value(), vec![FormFlag::LowConfidence]);
        };

        let smoothed = self.smoother.update(Some(raw));
        let mut flags = Vec::with_capacity(1);

        match self.state {
            RepState::Up => {
                self.min_angle_since_up = self.min_angle_since_up.min(smoothed);
                if smoothed <= self.config.th_down {
                    self.state = RepState::Down;
                    self.depth_reached = true;
                    flags.push(FormFlag::DepthOk);
                    debug!("frame {}: DOWN at {:.1}°", self.frame, smoothed);
                }
            }
            RepState::Down => {
                if smoothed >= self.config.th_up {
                    flags.push(self.complete_cycle(smoothed));
                } else {
                    flags.push(self.coaching_flag(smoothed));
                }
            }
        }

        self.report(Some(smoothed), flags)
    }

    /// Back to standing: count the rep if depth and debounce allow it, then
    /// start a fresh cycle either way.
    fn complete_cycle(&mut self, smoothed: f64) -> FormFlag {
        let flag = if !self.depth_reached {
            debug!("frame {}: stood up without depth", self.frame);
            FormFlag::GoLower
        } else if self.debounce_passed() {
            self.reps += 1;
            self.last_rep_frame = Some(self.frame);
            info!(
                "✅ Rep {} counted at frame {} ({:.1}°)",
                self.reps, self.frame, smoothed
            );
            FormFlag::DepthOk
        } else {
            debug!(
                "frame {}: rep too fast ({} frames since last, need {})",
                self.frame,
                self.frames_since_last_rep().unwrap_or_default(),
                self.config.min_frames_between
            );
            FormFlag::TooFast
        };

        self.state = RepState::Up;
        self.depth_reached = false;
        self.min_angle_since_up = STRAIGHT_ANGLE;
        flag
    }

    /// Live feedback while still DOWN and not yet standing.
    fn coaching_flag(&self, smoothed: f64) -> FormFlag {
        let midpoint = (self.config.th_down + self.config.th_up) / 2.0;
        if self.depth_reached && smoothed <= midpoint {
            FormFlag::DepthOk
        } else {
            FormFlag::GoLower
        }
    }

    fn debounce_passed(&self) -> bool {
        self.frames_since_last_rep()
            .map_or(true, |gap| gap >= self.config.min_frames_between)
    }

    fn frames_since_last_rep(&self) -> Option<u64> {
        self.last_rep_frame.map(|last| self.frame - last)
    }

    fn report(&self, smoothed: Option<f64>, form_flags: Vec<FormFlag>) -> FrameReport {
        FrameReport {
            reps: self.reps,
            state: self.state,
            knee_angle: smoothed.map(round2),
            form_flags,
        }
    }

    /// Start a new session. Configuration and alpha are kept.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.state = RepState::Up;
        self.reps = 0;
        self.depth_reached = false;
        self.frame = 0;
        self.last_rep_frame = None;
        self.min_angle_since_up = STRAIGHT_ANGLE;
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn depth_reached(&self) -> bool {
        self.depth_reached
    }

    pub fn last_rep_frame(&self) -> Option<u64> {
        self.last_rep_frame
    }

    pub fn min_angle_since_up(&self) -> f64 {
        self.min_angle_since_up
    }

    pub fn smoothed_angle(&self) -> Option<f64> {
        self.smoother.value()
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CounterError;
    use crate::exercise::angle::joint_angle;
    use crate::types::Point;

    fn unsmoothed(min_frames_between: u64) -> RepCounter {
        RepCounter::new(CounterConfig {
            alpha: 1.0,
            min_frames_between,
            ..Default::default()
        })
        .unwrap()
    }

    fn feed(counter: &mut RepCounter, angles: &[f64]) -> Vec<FrameReport> {
        angles
            .iter()
            .map(|&a| counter.update_with_angle(Some(a), Some(1.0)))
            .collect()
    }

    /// Deterministic LCG so the sweep below needs no extra crates.
    struct Lcg(u64);

    impl Lcg {
        fn next_f64(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    #[test]
    fn test_initial_state() {
        let c = RepCounter::new(CounterConfig::default()).unwrap();
        assert_eq!(c.reps(), 0);
        assert_eq!(c.state(), RepState::Up);
        assert_eq!(c.frame(), 0);
        assert_eq!(c.last_rep_frame(), None);
        assert_eq!(c.smoothed_angle(), None);
        assert_eq!(c.min_angle_since_up(), STRAIGHT_ANGLE);
    }

    #[test]
    fn test_invalid_alpha_is_fatal() {
        let result = RepCounter::new(CounterConfig {
            alpha: 0.0,
            ..Default::default()
        });
        assert_eq!(result.err(), Some(CounterError::InvalidSmoothingFactor(0.0)));
    }

    #[test]
    fn test_canonical_two_rep_sequence() {
        let mut c = unsmoothed(3);
        let reports = feed(
            &mut c,
            &[170.0, 88.0, 88.0, 165.0, 170.0, 170.0, 170.0, 88.0, 88.0, 165.0],
        );

        assert_eq!(c.reps(), 2);
        assert_eq!(reports[3].reps, 1);
        assert_eq!(reports[9].reps, 2);
        assert!(reports.iter().all(|r| !r.has_flag(FormFlag::TooFast)));

        // depth_ok while holding the bottom
        assert_eq!(reports[2].state, RepState::Down);
        assert_eq!(reports[2].form_flags, vec![FormFlag::DepthOk]);
        assert_eq!(reports[8].state, RepState::Down);
        assert_eq!(reports[8].form_flags, vec![FormFlag::DepthOk]);

        // completions
        assert_eq!(reports[3].form_flags, vec![FormFlag::DepthOk]);
        assert_eq!(reports[3].state, RepState::Up);
        assert_eq!(c.last_rep_frame(), Some(10));
    }

    #[test]
    fn test_standing_frames_have_no_flags() {
        let mut c = unsmoothed(3);
        let reports = feed(&mut c, &[170.0, 175.0, 150.0]);
        assert!(reports.iter().all(|r| r.form_flags.is_empty()));
        assert!(reports.iter().all(|r| r.state == RepState::Up));
    }

    #[test]
    fn test_low_confidence_frame_holds_state() {
        let mut c = RepCounter::new(CounterConfig::default()).unwrap();
        c.update_with_angle(Some(170.0), Some(1.0));

        let r = c.update_with_angle(Some(60.0), Some(0.1));
        assert_eq!(r.form_flags, vec![FormFlag::LowConfidence]);
        assert_eq!(r.state, RepState::Up);
        assert_eq!(r.reps, 0);
        assert_eq!(r.knee_angle, Some(170.0));
        // the rejected angle never reached the smoother
        assert_eq!(c.smoothed_angle(), Some(170.0));
    }

    #[test]
    fn test_low_confidence_while_down() {
        let mut c = unsmoothed(3);
        feed(&mut c, &[170.0, 80.0]);
        let r = c.update_with_angle(None, None);
        assert_eq!(r.form_flags, vec![FormFlag::LowConfidence]);
        assert_eq!(r.state, RepState::Down);
        assert_eq!(r.knee_angle, Some(80.0));
        assert!(c.depth_reached());
    }

    #[test]
    fn test_knee_angle_absent_before_first_valid_frame() {
        let mut c = RepCounter::new(CounterConfig::default()).unwrap();
        let r = c.update_with_angle(None, Some(1.0));
        assert_eq!(r.knee_angle, None);
        let r = c.update_with_angle(Some(120.0), None);
        assert_eq!(r.knee_angle, None);
        let r = c.update_with_angle(Some(120.0), Some(0.9));
        assert_eq!(r.knee_angle, Some(120.0));
    }

    #[test]
    fn test_non_finite_input_is_low_confidence() {
        let mut c = unsmoothed(3);
        for (angle, conf) in [
            (Some(f64::NAN), Some(1.0)),
            (Some(f64::INFINITY), Some(1.0)),
            (Some(100.0), Some(f64::NAN)),
        ] {
            let r = c.update_with_angle(angle, conf);
            assert_eq!(r.form_flags, vec![FormFlag::LowConfidence]);
        }
        assert_eq!(c.smoothed_angle(), None);
        assert_eq!(c.frame(), 3);
    }

    #[test]
    fn test_confidence_exactly_at_threshold_is_trusted() {
        let mut c = RepCounter::new(CounterConfig::default()).unwrap();
        let r = c.update_with_angle(Some(150.0), Some(0.3));
        assert!(r.form_flags.is_empty());
        assert_eq!(r.knee_angle, Some(150.0));
    }

    #[test]
    fn test_debounce_rejects_fast_second_rep() {
        let mut c = unsmoothed(10);
        feed(&mut c, &[170.0, 80.0, 170.0]);
        assert_eq!(c.reps(), 1);
        assert_eq!(c.last_rep_frame(), Some(3));

        // second cycle completes 2 frames later
        let reports = feed(&mut c, &[80.0, 170.0]);
        assert_eq!(reports[1].form_flags, vec![FormFlag::TooFast]);
        assert_eq!(c.reps(), 1);
        assert_eq!(c.state(), RepState::Up);
        assert_eq!(c.last_rep_frame(), Some(3));

        // third cycle completes exactly 10 frames after the counted rep
        let mut angles = vec![170.0; 6];
        angles.extend([80.0, 170.0]);
        let reports = feed(&mut c, &angles);
        assert_eq!(c.frame(), 13);
        assert_eq!(reports.last().unwrap().form_flags, vec![FormFlag::DepthOk]);
        assert_eq!(c.reps(), 2);
    }

    #[test]
    fn test_rep_counted_once_per_cycle() {
        let mut c = unsmoothed(1);
        let reports = feed(&mut c, &[170.0, 85.0, 165.0, 170.0, 162.0, 175.0, 161.0]);
        assert_eq!(c.reps(), 1);
        assert_eq!(reports.iter().filter(|r| r.has_flag(FormFlag::DepthOk)).count(), 2);
    }

    #[test]
    fn test_shallow_squat_never_counts() {
        let mut c = unsmoothed(1);
        feed(&mut c, &[170.0, 120.0, 100.0, 91.0, 120.0, 170.0]);
        assert_eq!(c.reps(), 0);
        assert_eq!(c.state(), RepState::Up);
        assert!((c.min_angle_since_up() - 91.0).abs() < 1e-9);
    }

    #[test]
    fn test_coaching_while_down() {
        let mut c = unsmoothed(1);
        let reports = feed(&mut c, &[170.0, 90.0, 110.0, 125.0, 140.0, 159.9]);
        assert_eq!(reports[1].state, RepState::Down);
        assert_eq!(reports[1].form_flags, vec![FormFlag::DepthOk]);
        assert_eq!(reports[2].form_flags, vec![FormFlag::DepthOk]);
        // midpoint (125) still counts as deep
        assert_eq!(reports[3].form_flags, vec![FormFlag::DepthOk]);
        assert_eq!(reports[4].form_flags, vec![FormFlag::GoLower]);
        assert_eq!(reports[5].form_flags, vec![FormFlag::GoLower]);
        assert_eq!(c.state(), RepState::Down);
        assert_eq!(c.reps(), 0);
    }

    #[test]
    fn test_thresholds_use_smoothed_angle() {
        // single raw dip below th_down is absorbed by the smoother
        let mut c = RepCounter::new(CounterConfig::default()).unwrap();
        feed(&mut c, &[170.0, 170.0, 60.0, 170.0, 170.0]);
        assert_eq!(c.state(), RepState::Up);
        assert!(c.min_angle_since_up() > 90.0);
        assert_eq!(c.reps(), 0);
    }

    #[test]
    fn test_cycle_reset_after_completion() {
        let mut c = unsmoothed(1);
        feed(&mut c, &[170.0, 80.0, 100.0]);
        assert!(c.depth_reached());
        feed(&mut c, &[170.0]);
        assert!(!c.depth_reached());
        assert_eq!(c.min_angle_since_up(), STRAIGHT_ANGLE);
    }

    #[test]
    fn test_low_confidence_frames_count_toward_debounce() {
        let mut c = unsmoothed(5);
        feed(&mut c, &[170.0, 80.0, 170.0]);
        for _ in 0..3 {
            c.update_with_angle(None, None);
        }
        let reports = feed(&mut c, &[80.0, 170.0]);
        assert_eq!(c.frame(), 8);
        assert_eq!(reports[1].form_flags, vec![FormFlag::DepthOk]);
        assert_eq!(c.reps(), 2);
    }

    #[test]
    fn test_reps_monotonic_and_flags_exclusive() {
        let mut c = RepCounter::new(CounterConfig {
            min_frames_between: 4,
            alpha: 0.6,
            ..Default::default()
        })
        .unwrap();
        let mut rng = Lcg(42);
        let mut prev = 0;

        for _ in 0..5000 {
            let angle = match rng.next_f64() {
                r if r < 0.05 => None,
                r if r < 0.5 => Some(60.0 + rng.next_f64() * 40.0),
                _ => Some(150.0 + rng.next_f64() * 30.0),
            };
            let conf = Some(rng.next_f64());
            let r = c.update_with_angle(angle, conf);

            assert!(r.reps >= prev);
            assert!(r.reps - prev <= 1);
            assert!(r.form_flags.len() <= 1, "flags {:?}", r.form_flags);
            prev = r.reps;
        }
        assert!(c.reps() > 0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut c = RepCounter::new(CounterConfig {
            alpha: 0.5,
            min_frames_between: 1,
            ..Default::default()
        })
        .unwrap();
        feed(&mut c, &[170.0, 40.0, 40.0, 40.0, 175.0, 175.0, 175.0]);
        assert_eq!(c.reps(), 1);

        c.reset();
        assert_eq!(c.reps(), 0);
        assert_eq!(c.state(), RepState::Up);
        assert_eq!(c.frame(), 0);
        assert_eq!(c.last_rep_frame(), None);
        assert_eq!(c.smoothed_angle(), None);
        assert_eq!(c.config().alpha, 0.5);

        // first sample after reset seeds the smoother again
        let r = c.update_with_angle(Some(100.0), Some(1.0));
        assert_eq!(r.knee_angle, Some(100.0));
    }

    #[test]
    fn test_update_from_keypoints() {
        let mut c = unsmoothed(1);
        let standing = KeypointFrame::new()
            .with("left_hip", Point::with_confidence(0.0, 0.0, 1.0))
            .with("left_knee", Point::with_confidence(0.0, 1.0, 1.0))
            .with("left_ankle", Point::with_confidence(0.0, 2.0, 1.0));
        let squatting = KeypointFrame::new()
            .with("left_hip", Point::with_confidence(0.0, 0.0, 1.0))
            .with("left_knee", Point::with_confidence(0.0, 1.0, 1.0))
            .with("left_ankle", Point::with_confidence(1.0, 0.8, 1.0));

        let r = c.update(&standing);
        assert_eq!(r.knee_angle, Some(180.0));
        let r = c.update(&squatting);
        assert_eq!(r.state, RepState::Down);
        let r = c.update(&standing);
        assert_eq!(r.reps, 1);
    }

    #[test]
    fn test_right_side_only_keypoints() {
        let mut c = unsmoothed(1);
        let hip = Point::new(2.0, 0.0);
        let knee = Point::new(2.0, 1.0);
        let ankle = Point::new(3.0, 2.0);
        let frame = KeypointFrame::new()
            .with("right_hip", hip)
            .with("right_knee", knee)
            .with("right_ankle", ankle);

        let r = c.update(&frame);
        let expected = round2(joint_angle(&hip, &knee, &ankle));
        assert_eq!(r.knee_angle, Some(expected));
        assert!(r.form_flags.is_empty());
    }

    #[test]
    fn test_empty_keypoints_are_low_confidence() {
        let mut c = RepCounter::new(CounterConfig::default()).unwrap();
        let r = c.update(&KeypointFrame::new());
        assert_eq!(r.form_flags, vec![FormFlag::LowConfidence]);
        assert_eq!(r.knee_angle, None);
        assert_eq!(c.frame(), 1);
    }
}
