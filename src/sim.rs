use crate::error::SimError;
use crate::model::{
    Ball, Ramp, Seesaw, Side, SimulationState, Surface, STANDARD_BALL_DIAMETER,
    STANDARD_BALL_RADIUS,
};
use crate::predicates::{
    is_adjacent, is_far_left, is_far_right, is_near_above, is_over, is_resting_on, resting_y,
};
use crate::rope::propagate;
use serde::Serialize;

/// What happened to one ball during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    RampSlide { ramp: usize },
    RampSettle { ramp: usize },
    SeesawSlide { seesaw: usize },
    SeesawFlip { seesaw: usize },
    FreeFall,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct TickReport {
    pub(crate) tick: u64,
    pub(crate) ramp_supported: usize,
    pub(crate) seesaw_supported: usize,
    pub(crate) falling: usize,
    /// Balls carried by each ramp, in layout order.
    pub(crate) ramp_load: Vec<usize>,
    /// Balls carried by each seesaw, in layout order.
    pub(crate) seesaw_load: Vec<usize>,
    /// Seesaws flipped by a ball landing on them.
    pub(crate) ball_flips: Vec<usize>,
    /// Seesaws flipped through a rope, in the order they were forced.
    pub(crate) rope_flips: Vec<usize>,
}

impl TickReport {
    fn tally(
        tick: u64,
        outcomes: &[Outcome],
        state: &SimulationState,
        ball_flips: Vec<usize>,
        rope_flips: Vec<usize>,
    ) -> Self {
        let mut report = Self {
            tick,
            ramp_load: vec![0; state.ramps.len()],
            seesaw_load: vec![0; state.seesaws.len()],
            ball_flips,
            rope_flips,
            ..Self::default()
        };
        for o in outcomes {
            match *o {
                Outcome::RampSlide { ramp } | Outcome::RampSettle { ramp } => {
                    report.ramp_supported += 1;
                    report.ramp_load[ramp] += 1;
                }
                Outcome::SeesawSlide { seesaw } | Outcome::SeesawFlip { seesaw } => {
                    report.seesaw_supported += 1;
                    report.seesaw_load[seesaw] += 1;
                }
                Outcome::FreeFall => report.falling += 1,
            }
        }
        report
    }

    pub(crate) fn flips(&self) -> usize {
        self.ball_flips.len() + self.rope_flips.len()
    }
}

/// Advance the machine by one tick: balls, then ropes.
pub(crate) fn step(state: &mut SimulationState) -> Result<TickReport, SimError> {
    for s in &mut state.seesaws {
        s.just_switched = false;
    }

    let outcomes = resolve_balls(state);
    let ball_flips: Vec<usize> = state
        .seesaws
        .iter()
        .enumerate()
        .filter(|(_, s)| s.just_switched)
        .map(|(i, _)| i)
        .collect();

    let rope_flips = propagate(&mut state.seesaws, &state.ropes)?;

    state.tick += 1;
    let report = TickReport::tally(state.tick, &outcomes, state, ball_flips, rope_flips);
    if report.flips() > 0 {
        log::debug!(
            "tick {}: ball flips {:?}, rope flips {:?}",
            report.tick,
            report.ball_flips,
            report.rope_flips
        );
    }
    Ok(report)
}

/// One pass over every ball in list order.
///
/// Seesaw orientations are read from the start-of-tick snapshot; a flip lands
/// on the live seesaw and is applied at most once per tick. Ball positions are
/// live, so later balls see earlier balls' moves.
pub(crate) fn resolve_balls(state: &mut SimulationState) -> Vec<Outcome> {
    let snapshot: Vec<Seesaw> = state.seesaws.clone();
    let mut outcomes = Vec::with_capacity(state.balls.len());

    for i in 0..state.balls.len() {
        let mut ball = state.balls[i];
        let outcome = resolve_ball(
            &mut ball,
            i,
            &state.balls,
            &state.ramps,
            &snapshot,
            &mut state.seesaws,
        );
        state.balls[i] = ball;
        outcomes.push(outcome);
    }
    outcomes
}

fn resolve_ball(
    ball: &mut Ball,
    index: usize,
    balls: &[Ball],
    ramps: &[Ramp],
    snapshot: &[Seesaw],
    live: &mut [Seesaw],
) -> Outcome {
    for (r, ramp) in ramps.iter().enumerate() {
        if !is_over(ball, ramp) {
            continue;
        }
        if is_resting_on(ball, ramp) {
            let x = slide_target(ball, index, ramp.incline.downhill(), balls, snapshot);
            ball.pos.x = x;
            if is_over(ball, ramp) {
                if is_near_above(ball, ramp) {
                    ball.pos.y = resting_y(ramp, x);
                }
                return Outcome::RampSlide { ramp: r };
            }
            // Rolled off the end. Another ramp just below holds it until next
            // tick; otherwise the seesaws get a look at it right away.
            if ramps.iter().any(|o| is_over(ball, o) && is_near_above(ball, o)) {
                return Outcome::RampSlide { ramp: r };
            }
            break;
        }
        if is_near_above(ball, ramp) {
            ball.pos.y = resting_y(ramp, ball.pos.x);
            return Outcome::RampSettle { ramp: r };
        }
    }

    for (s, seesaw) in snapshot.iter().enumerate() {
        if !is_over(ball, seesaw) || !(is_near_above(ball, seesaw) || is_resting_on(ball, seesaw)) {
            continue;
        }
        ball.pos.y = resting_y(seesaw, ball.pos.x);

        let half = if ball.pos.x >= seesaw.incline.center().x {
            Side::Right
        } else {
            Side::Left
        };
        let (x, outcome) = if seesaw.ball_switchable && seesaw.incline.is_up(half) {
            // The ball's weight pushes the raised end down; it holds its spot.
            if !live[s].just_switched {
                live[s].flip();
            }
            (ball.pos.x, Outcome::SeesawFlip { seesaw: s })
        } else {
            let x = slide_target(ball, index, seesaw.incline.downhill(), balls, snapshot);
            (x, Outcome::SeesawSlide { seesaw: s })
        };
        ball.pos.relocate(x, resting_y(&live[s], x));
        return outcome;
    }

    ball.fall();
    Outcome::FreeFall
}

/// Where a ball rolling toward `dir` ends up this tick.
///
/// A seesaw end at the ball's height stops it first, then a neighbouring
/// ball; otherwise it rolls one of its own diameters.
fn slide_target(ball: &Ball, index: usize, dir: Side, balls: &[Ball], seesaws: &[Seesaw]) -> f64 {
    let neighbours = || {
        balls
            .iter()
            .enumerate()
            .filter(move |(j, _)| *j != index)
            .map(|(_, b)| b)
    };

    // Only ends facing the roll direction can stop it; the first such seesaw wins.
    match dir {
        Side::Left => {
            if let Some(s) = seesaws.iter().find(|s| is_far_right(ball, s)) {
                s.right_edge().x + STANDARD_BALL_RADIUS
            } else if let Some(o) = neighbours().find(|o| is_adjacent(ball, o, Side::Left)) {
                o.pos.x + STANDARD_BALL_DIAMETER
            } else {
                ball.pos.x - ball.diameter()
            }
        }
        Side::Right => {
            if let Some(s) = seesaws.iter().find(|s| is_far_left(ball, s)) {
                s.left_edge().x - STANDARD_BALL_RADIUS
            } else if let Some(o) = neighbours().find(|o| is_adjacent(ball, o, Side::Right)) {
                o.pos.x - STANDARD_BALL_DIAMETER
            } else {
                ball.pos.x + ball.diameter()
            }
        }
    }
}
