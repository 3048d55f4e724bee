use crate::error::SimError;
use serde::Serialize;

pub(crate) const WORLD_W: f64 = 1200.0;
pub(crate) const WORLD_H: f64 = 950.0;

pub(crate) const STANDARD_BALL_RADIUS: f64 = 12.5;
pub(crate) const STANDARD_BALL_DIAMETER: f64 = 2.0 * STANDARD_BALL_RADIUS;
pub(crate) const INCLINE_SLOPE: f64 = 0.5;
pub(crate) const SEESAW_LENGTH: f64 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Point {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Point {
    pub(crate) fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub(crate) fn relocate(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }
}

/* -----------------------------
   Incline geometry
------------------------------ */

/// Straight sloped segment centred on `center`.
///
/// The horizontal span equals `length` and the two ends differ in height by
/// `length * INCLINE_SLOPE`. Endpoints and slope are derived from
/// `right_up` and are only ever recomputed together.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Incline {
    center: Point,
    length: f64,
    right_up: bool,
    left_x: f64,
    right_x: f64,
    left_y: f64,
    right_y: f64,
    slope: f64,
}

impl Incline {
    pub(crate) fn new(x: f64, y: f64, length: f64, right_up: bool) -> Self {
        let mut incline = Self {
            center: Point::new(x, y),
            length,
            right_up,
            left_x: x - length * INCLINE_SLOPE,
            right_x: x + length * INCLINE_SLOPE,
            left_y: y,
            right_y: y,
            slope: 0.0,
        };
        incline.recompute();
        incline
    }

    fn recompute(&mut self) {
        let rise = self.length * INCLINE_SLOPE / 2.0;
        if self.right_up {
            self.left_y = self.center.y + rise;
            self.right_y = self.center.y - rise;
        } else {
            self.left_y = self.center.y - rise;
            self.right_y = self.center.y + rise;
        }
        self.slope = (self.right_y - self.left_y) / (self.right_x - self.left_x);
    }

    pub(crate) fn set_right_up(&mut self, right_up: bool) {
        self.right_up = right_up;
        self.recompute();
    }

    pub(crate) fn center(&self) -> Point {
        self.center
    }

    pub(crate) fn right_up(&self) -> bool {
        self.right_up
    }

    pub(crate) fn height_at(&self, x: f64) -> f64 {
        self.slope * (x - self.left_x) + self.left_y
    }

    pub(crate) fn end(&self, side: Side) -> Point {
        match side {
            Side::Left => Point::new(self.left_x, self.left_y),
            Side::Right => Point::new(self.right_x, self.right_y),
        }
    }

    pub(crate) fn is_up(&self, side: Side) -> bool {
        match side {
            Side::Left => !self.right_up,
            Side::Right => self.right_up,
        }
    }

    /// Direction a ball rolls on this incline.
    pub(crate) fn downhill(&self) -> Side {
        if self.right_up {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Anything a ball can rest on.
pub(crate) trait Surface {
    fn incline(&self) -> &Incline;

    fn height_at(&self, x: f64) -> f64 {
        self.incline().height_at(x)
    }
    fn left_edge(&self) -> Point {
        self.incline().end(Side::Left)
    }
    fn right_edge(&self) -> Point {
        self.incline().end(Side::Right)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Ramp {
    pub(crate) incline: Incline,
}

impl Ramp {
    pub(crate) fn new(x: f64, y: f64, length: f64, right_up: bool) -> Self {
        Self {
            incline: Incline::new(x, y, length, right_up),
        }
    }
}

impl Surface for Ramp {
    fn incline(&self) -> &Incline {
        &self.incline
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Seesaw {
    pub(crate) incline: Incline,
    pub(crate) ball_switchable: bool,
    pub(crate) just_switched: bool,
}

impl Seesaw {
    pub(crate) fn new(x: f64, y: f64, right_up: bool, ball_switchable: bool) -> Self {
        Self {
            incline: Incline::new(x, y, SEESAW_LENGTH, right_up),
            ball_switchable,
            just_switched: false,
        }
    }

    pub(crate) fn flip(&mut self) {
        self.just_switched = true;
        let right_up = !self.incline.right_up();
        self.incline.set_right_up(right_up);
    }
}

impl Surface for Seesaw {
    fn incline(&self) -> &Incline {
        &self.incline
    }
}

/* -----------------------------
   Balls and ropes
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) enum BallKind {
    Zero,
    One,
    Spacer,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Ball {
    pub(crate) pos: Point,
    pub(crate) radius: f64,
    pub(crate) kind: BallKind,
}

impl Ball {
    pub(crate) fn new(x: f64, y: f64, radius: f64, kind: BallKind) -> Self {
        Self {
            pos: Point::new(x, y),
            radius,
            kind,
        }
    }

    pub(crate) fn diameter(&self) -> f64 {
        2.0 * self.radius
    }

    pub(crate) fn fall(&mut self) {
        self.pos.y += STANDARD_BALL_DIAMETER;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RopeEnd {
    pub(crate) seesaw: usize,
    pub(crate) side: Side,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rope {
    pub(crate) a: RopeEnd,
    pub(crate) b: RopeEnd,
}

impl Rope {
    pub(crate) fn new(a: usize, a_side: Side, b: usize, b_side: Side) -> Self {
        Self {
            a: RopeEnd { seesaw: a, side: a_side },
            b: RopeEnd { seesaw: b, side: b_side },
        }
    }

    /// Current screen coordinates of both ends.
    pub(crate) fn endpoints(&self, seesaws: &[Seesaw]) -> (Point, Point) {
        (
            seesaws[self.a.seesaw].incline.end(self.a.side),
            seesaws[self.b.seesaw].incline.end(self.b.side),
        )
    }
}

/* -----------------------------
   Whole machine
------------------------------ */

#[derive(Clone, Debug)]
pub(crate) struct SimulationState {
    pub(crate) ramps: Vec<Ramp>,
    pub(crate) seesaws: Vec<Seesaw>,
    pub(crate) balls: Vec<Ball>,
    pub(crate) ropes: Vec<Rope>,
    pub(crate) tick: u64,
}

impl SimulationState {
    pub(crate) fn new(
        ramps: Vec<Ramp>,
        seesaws: Vec<Seesaw>,
        balls: Vec<Ball>,
        ropes: Vec<Rope>,
    ) -> Result<Self, SimError> {
        for (i, rope) in ropes.iter().enumerate() {
            for end in [rope.a, rope.b] {
                if end.seesaw >= seesaws.len() {
                    return Err(SimError::DanglingRope {
                        rope: i,
                        seesaw: end.seesaw,
                    });
                }
            }
            if rope.a.seesaw == rope.b.seesaw {
                return Err(SimError::SelfRope { rope: i });
            }
        }
        Ok(Self {
            ramps,
            seesaws,
            balls,
            ropes,
            tick: 0,
        })
    }

    /// Balls that have not yet dropped below the bottom of the world.
    pub(crate) fn balls_in_play(&self) -> usize {
        self.balls
            .iter()
            .filter(|b| b.pos.y - b.radius <= WORLD_H)
            .count()
    }
}
