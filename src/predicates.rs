//! Proximity tests shared by the step resolver.
//!
//! Everything except `is_over` measures in standard radii/diameters so that
//! balls of different drawn sizes sit on the same spacing grid.

use crate::model::{Ball, Seesaw, Side, Surface, STANDARD_BALL_DIAMETER, STANDARD_BALL_RADIUS};

const R: f64 = STANDARD_BALL_RADIUS;
const D: f64 = STANDARD_BALL_DIAMETER;

/// Ball's drawn horizontal extent overlaps the surface's span.
pub(crate) fn is_over<S: Surface>(ball: &Ball, s: &S) -> bool {
    ball.pos.x + ball.radius > s.left_edge().x && ball.pos.x - ball.radius < s.right_edge().x
}

/// Between one and three radii above the surface: approaching, not yet resting.
pub(crate) fn is_near_above<S: Surface>(ball: &Ball, s: &S) -> bool {
    let h = s.height_at(ball.pos.x);
    ball.pos.y >= h - 3.0 * R && ball.pos.y < h - R
}

pub(crate) fn is_resting_on<S: Surface>(ball: &Ball, s: &S) -> bool {
    ball.pos.y == resting_y(s, ball.pos.x)
}

pub(crate) fn resting_y<S: Surface>(s: &S, x: f64) -> f64 {
    s.height_at(x) - R
}

pub(crate) fn is_far_right(ball: &Ball, seesaw: &Seesaw) -> bool {
    let end = seesaw.right_edge();
    ball.pos.x >= end.x + R
        && ball.pos.x < end.x + 3.0 * R
        && ball.pos.y - R < end.y
        && ball.pos.y + R > end.y
}

pub(crate) fn is_far_left(ball: &Ball, seesaw: &Seesaw) -> bool {
    let end = seesaw.left_edge();
    ball.pos.x <= end.x - R
        && ball.pos.x > end.x - 3.0 * R
        && ball.pos.y - R < end.y
        && ball.pos.y + R > end.y
}

/// `other` occupies the next slot to `side` of `ball`.
pub(crate) fn is_adjacent(ball: &Ball, other: &Ball, side: Side) -> bool {
    let (x, ox) = (ball.pos.x, other.pos.x);
    let in_slot = match side {
        Side::Right => ox >= x + D && ox < x + 2.0 * D,
        Side::Left => ox <= x - D && ox > x - 2.0 * D,
    };
    in_slot && ball.pos.y <= other.pos.y + D && ball.pos.y >= other.pos.y - D
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BallKind, Ramp};

    fn ball(x: f64, y: f64) -> Ball {
        Ball::new(x, y, R, BallKind::One)
    }

    #[test]
    fn over_uses_drawn_radius() {
        // span 250..650
        let ramp = Ramp::new(450.0, 425.0, 400.0, true);
        assert!(is_over(&ball(240.0, 0.0), &ramp));
        assert!(!is_over(&ball(237.5, 0.0), &ramp));
        let small = Ball::new(241.0, 0.0, 8.0, BallKind::Spacer);
        assert!(!is_over(&small, &ramp));
        assert!(is_over(&ball(660.0, 0.0), &ramp));
        assert!(!is_over(&ball(662.5, 0.0), &ramp));
    }

    #[test]
    fn near_and_resting_are_disjoint() {
        let ramp = Ramp::new(450.0, 425.0, 400.0, true);
        let h = ramp.height_at(450.0);
        assert!(is_resting_on(&ball(450.0, h - R), &ramp));
        assert!(!is_near_above(&ball(450.0, h - R), &ramp));
        assert!(is_near_above(&ball(450.0, h - 3.0 * R), &ramp));
        assert!(is_near_above(&ball(450.0, h - R - 0.5), &ramp));
        assert!(!is_near_above(&ball(450.0, h - 3.0 * R - 0.5), &ramp));
        assert!(!is_resting_on(&ball(450.0, h - R + 1e-9), &ramp));
        assert!(!is_near_above(&ball(450.0, h), &ramp));
    }

    #[test]
    fn far_checks_need_matching_height() {
        // right end (230, 470), left end (150, 510)
        let s = Seesaw::new(190.0, 490.0, true, true);
        assert!(is_far_right(&ball(242.5, 470.0), &s));
        assert!(is_far_right(&ball(260.0, 480.0), &s));
        assert!(!is_far_right(&ball(267.5, 470.0), &s));
        assert!(!is_far_right(&ball(242.0, 470.0), &s));
        assert!(!is_far_right(&ball(250.0, 482.5), &s));

        assert!(is_far_left(&ball(137.5, 510.0), &s));
        assert!(!is_far_left(&ball(112.5, 510.0), &s));
        assert!(!is_far_left(&ball(137.5, 470.0), &s));
    }

    #[test]
    fn adjacency_window_is_one_to_two_diameters() {
        let a = ball(100.0, 100.0);
        assert!(is_adjacent(&a, &ball(125.0, 100.0), Side::Right));
        assert!(is_adjacent(&a, &ball(149.0, 120.0), Side::Right));
        assert!(!is_adjacent(&a, &ball(150.0, 100.0), Side::Right));
        assert!(!is_adjacent(&a, &ball(124.0, 100.0), Side::Right));
        assert!(!is_adjacent(&a, &ball(125.0, 126.0), Side::Right));
        assert!(!is_adjacent(&a, &ball(125.0, 100.0), Side::Left));

        assert!(is_adjacent(&a, &ball(75.0, 87.5), Side::Left));
        assert!(!is_adjacent(&a, &ball(50.0, 100.0), Side::Left));
    }
}
