//! Builds the starting machine: fixed structures plus the encoded tape.

use crate::error::SimError;
use crate::model::{
    Ball, BallKind, Ramp, Rope, Seesaw, Side, SimulationState, INCLINE_SLOPE,
    STANDARD_BALL_DIAMETER,
};

pub(crate) const TAPE_X: f64 = 860.0;
pub(crate) const TAPE_Y: f64 = 120.0;
pub(crate) const TAPE_SPACING: f64 = 6.0;

pub(crate) const ZERO_RADIUS: f64 = 10.0;
pub(crate) const ONE_RADIUS: f64 = 12.5;
pub(crate) const SPACER_RADIUS: f64 = 8.0;

/// Parse a production rule written as a string of `0`/`1`.
pub(crate) fn parse_rule(which: char, s: &str) -> Result<Vec<u8>, SimError> {
    let bits = s
        .trim()
        .chars()
        .map(|ch| match ch {
            '0' => Ok(0),
            '1' => Ok(1),
            _ => Err(SimError::InvalidRuleBit { which, ch }),
        })
        .collect::<Result<Vec<u8>, _>>()?;
    if bits.is_empty() {
        return Err(SimError::EmptyRule { which });
    }
    Ok(bits)
}

fn tape_ball(k: usize, kind: BallKind) -> Ball {
    let k = k as f64;
    let x = TAPE_X + k * STANDARD_BALL_DIAMETER + TAPE_SPACING;
    let y = TAPE_Y - k * STANDARD_BALL_DIAMETER * INCLINE_SLOPE + TAPE_SPACING * INCLINE_SLOPE;
    let radius = match kind {
        BallKind::Zero => ZERO_RADIUS,
        BallKind::One => ONE_RADIUS,
        BallKind::Spacer => SPACER_RADIUS,
    };
    Ball::new(x, y, radius, kind)
}

/// Lay out `count` balls along the feed diagonal: rule A, spacer, rule B,
/// spacer, and so on, cut off after `count` balls.
pub(crate) fn encode_tape(rule_a: &[u8], rule_b: &[u8], count: usize) -> Vec<Ball> {
    let bit_kind = |bit: &u8| if *bit == 0 { BallKind::Zero } else { BallKind::One };
    let mut period: Vec<BallKind> = Vec::with_capacity(rule_a.len() + rule_b.len() + 2);
    period.extend(rule_a.iter().map(bit_kind));
    period.push(BallKind::Spacer);
    period.extend(rule_b.iter().map(bit_kind));
    period.push(BallKind::Spacer);

    period
        .iter()
        .copied()
        .cycle()
        .take(count)
        .enumerate()
        .map(|(k, kind)| tape_ball(k, kind))
        .collect()
}

/// The reference tag machine with the given rules on its feed ramp.
pub(crate) fn standard_machine(
    rule_a: &[u8],
    rule_b: &[u8],
    tape_len: usize,
) -> Result<SimulationState, SimError> {
    let seesaws = vec![
        Seesaw::new(190.0, 490.0, true, true),
        Seesaw::new(195.0, 550.0, true, true),
        Seesaw::new(295.0, 675.0, true, true),
        Seesaw::new(400.0, 730.0, false, true),
        Seesaw::new(700.0, 275.0, true, false),
        Seesaw::new(780.0, 125.0, false, true),
        Seesaw::new(855.0, 195.0, true, true),
        Seesaw::new(820.0, 850.0, false, true),
    ];
    let ramps = vec![
        Ramp::new(450.0, 425.0, 400.0, true),
        Ramp::new(260.0, 610.0, 50.0, false),
        Ramp::new(340.0, 650.0, 50.0, false),
        Ramp::new(755.0, 200.0, 106.0, true),
        // long feed ramp the tape sits on
        Ramp::new(3110.0, -975.0, 4541.0, true),
    ];
    let ropes = vec![
        Rope::new(0, Side::Right, 1, Side::Right),
        Rope::new(2, Side::Right, 4, Side::Right),
        Rope::new(3, Side::Left, 5, Side::Left),
        Rope::new(5, Side::Right, 6, Side::Left),
        Rope::new(0, Side::Left, 7, Side::Left),
        Rope::new(4, Side::Left, 7, Side::Left),
    ];

    let mut balls = vec![Ball::new(270.0, 500.0, ONE_RADIUS, BallKind::One)];
    balls.extend(encode_tape(rule_a, rule_b, tape_len));

    SimulationState::new(ramps, seesaws, balls, ropes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Surface, STANDARD_BALL_RADIUS};
    use crate::predicates::is_over;
    use crate::sim::{resolve_balls, step, Outcome};
    use proptest::prelude::*;

    fn data_bits(balls: &[Ball]) -> Vec<u8> {
        balls
            .iter()
            .filter_map(|b| match b.kind {
                BallKind::Zero => Some(0),
                BallKind::One => Some(1),
                BallKind::Spacer => None,
            })
            .collect()
    }

    #[test]
    fn parses_rules() {
        assert_eq!(parse_rule('A', "101").unwrap(), vec![1, 0, 1]);
        assert_eq!(parse_rule('B', " 1 ").unwrap(), vec![1]);
        assert_eq!(parse_rule('A', "").unwrap_err(), SimError::EmptyRule { which: 'A' });
        assert_eq!(
            parse_rule('B', "1x0").unwrap_err(),
            SimError::InvalidRuleBit { which: 'B', ch: 'x' }
        );
    }

    #[test]
    fn tape_follows_rule_order_and_diagonal() {
        let tape = encode_tape(&[1], &[1, 0, 1], 7);
        let kinds: Vec<BallKind> = tape.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BallKind::One,
                BallKind::Spacer,
                BallKind::One,
                BallKind::Zero,
                BallKind::One,
                BallKind::Spacer,
                BallKind::One,
            ]
        );
        assert_eq!(tape[0].pos.x, 866.0);
        assert_eq!(tape[0].pos.y, 123.0);
        assert_eq!(tape[2].pos.x, 916.0);
        assert_eq!(tape[2].pos.y, 98.0);
        assert_eq!(tape[1].radius, SPACER_RADIUS);
        assert_eq!(tape[3].radius, ZERO_RADIUS);
        assert_eq!(tape[4].radius, ONE_RADIUS);
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(encode_tape(&[1], &[0], 0).is_empty());
    }

    #[test]
    fn standard_machine_shape() {
        let st = standard_machine(&[1], &[1, 0, 1], 180).unwrap();
        assert_eq!(st.seesaws.len(), 8);
        assert_eq!(st.ramps.len(), 5);
        assert_eq!(st.ropes.len(), 6);
        assert_eq!(st.balls.len(), 181);
        assert_eq!(st.balls[0].pos.x, 270.0);
    }

    #[test]
    fn standard_machine_is_deterministic() {
        let run = || {
            let mut st = standard_machine(&[1], &[1, 0, 1], 180).unwrap();
            let reports: Vec<_> = (0..300).map(|_| step(&mut st).unwrap()).collect();
            let positions: Vec<_> = st.balls.iter().map(|b| b.pos).collect();
            let orientations: Vec<_> = st.seesaws.iter().map(|s| s.incline.right_up()).collect();
            (reports, positions, orientations)
        };
        assert_eq!(run(), run());
    }

    fn assert_on_surface(st: &SimulationState, ball: &Ball, outcome: Outcome) {
        let h = match outcome {
            Outcome::RampSettle { ramp } => st.ramps[ramp].height_at(ball.pos.x),
            // a slide that carried the ball past the end is held in the air
            Outcome::RampSlide { ramp } if is_over(ball, &st.ramps[ramp]) => {
                st.ramps[ramp].height_at(ball.pos.x)
            }
            // a later ball may have tipped the seesaw after this one slid on it
            Outcome::SeesawSlide { seesaw } if st.seesaws[seesaw].just_switched => {
                let live = &st.seesaws[seesaw];
                let mut before = live.clone();
                before.flip();
                let ys = [live.height_at(ball.pos.x), before.height_at(ball.pos.x)]
                    .map(|h| h - STANDARD_BALL_RADIUS);
                assert!(ys.contains(&ball.pos.y), "{:?} at x={}", outcome, ball.pos.x);
                return;
            }
            Outcome::SeesawSlide { seesaw } | Outcome::SeesawFlip { seesaw } => {
                st.seesaws[seesaw].height_at(ball.pos.x)
            }
            Outcome::RampSlide { .. } | Outcome::FreeFall => return,
        };
        assert_eq!(ball.pos.y, h - STANDARD_BALL_RADIUS, "{:?} at x={}", outcome, ball.pos.x);
    }

    #[test]
    fn supported_balls_rest_exactly_on_their_surface() {
        let mut st = standard_machine(&[1], &[1, 0, 1], 180).unwrap();
        for _ in 0..300 {
            for s in &mut st.seesaws {
                s.just_switched = false;
            }
            let outcomes = resolve_balls(&mut st);
            assert_eq!(outcomes.len(), st.balls.len());
            for (ball, outcome) in st.balls.iter().zip(&outcomes) {
                assert_on_surface(&st, ball, *outcome);
            }
            crate::rope::propagate(&mut st.seesaws, &st.ropes).unwrap();
            st.tick += 1;
        }
    }

    #[test]
    fn tick_report_load_matches_supported_counts() {
        let mut st = standard_machine(&[1], &[1, 0, 1], 180).unwrap();
        for _ in 0..200 {
            let report = step(&mut st).unwrap();
            assert_eq!(report.ramp_load.iter().sum::<usize>(), report.ramp_supported);
            assert_eq!(report.seesaw_load.iter().sum::<usize>(), report.seesaw_supported);
            assert_eq!(
                report.ramp_supported + report.seesaw_supported + report.falling,
                st.balls.len()
            );
        }
    }

    proptest! {
        #[test]
        fn stripped_tape_matches_alternating_rules(
            a in prop::collection::vec(0u8..2, 1..5),
            b in prop::collection::vec(0u8..2, 1..5),
            count in 0usize..60,
        ) {
            let tape = encode_tape(&a, &b, count);
            prop_assert_eq!(tape.len(), count);

            let mut expected = Vec::new();
            let mut emitted = 0;
            'outer: loop {
                for rule in [&a, &b] {
                    for bit in rule.iter() {
                        if emitted == count { break 'outer; }
                        expected.push(*bit);
                        emitted += 1;
                    }
                    if emitted == count { break 'outer; }
                    emitted += 1; // spacer
                }
            }
            prop_assert_eq!(data_bits(&tape), expected);
        }

        #[test]
        fn tape_steps_down_the_feed_slope(count in 2usize..40) {
            let tape = encode_tape(&[1], &[1, 0, 1], count);
            for pair in tape.windows(2) {
                prop_assert_eq!(pair[1].pos.x - pair[0].pos.x, STANDARD_BALL_DIAMETER);
                prop_assert_eq!(
                    pair[0].pos.y - pair[1].pos.y,
                    STANDARD_BALL_DIAMETER * INCLINE_SLOPE
                );
            }
        }
    }
}
