use crate::error::SimError;
use crate::model::{Rope, Seesaw};

/// Most scans allowed before a tick's rope network is declared cyclic.
pub(crate) fn pass_ceiling(seesaws: usize, ropes: usize) -> usize {
    seesaws * (ropes + 1) + 1
}

/// Spread this tick's flips through the ropes until nothing more moves.
///
/// Each scan starts from the first rope and stops at the first forced flip.
/// Returns the indices of forced seesaws in order.
pub(crate) fn propagate(seesaws: &mut [Seesaw], ropes: &[Rope]) -> Result<Vec<usize>, SimError> {
    let ceiling = pass_ceiling(seesaws.len(), ropes.len());
    let mut forced = Vec::new();
    let mut passes = 0;

    loop {
        passes += 1;
        if passes > ceiling {
            return Err(SimError::RopeCycle { passes: ceiling });
        }
        let Some(target) = ropes.iter().find_map(|rope| forced_flip(rope, seesaws)) else {
            break;
        };
        seesaws[target].flip();
        log::trace!("rope forced seesaw {} (pass {})", target, passes);
        forced.push(target);
    }
    Ok(forced)
}

/// The seesaw this rope pulls over, if any.
///
/// A rope is out of balance when its higher end sits on a raised side and its
/// lower end on a lowered side. Only a rope touching a seesaw that switched
/// this tick acts, and it moves the other end.
pub(crate) fn forced_flip(rope: &Rope, seesaws: &[Seesaw]) -> Option<usize> {
    let a = &seesaws[rope.a.seesaw];
    let b = &seesaws[rope.b.seesaw];
    let (a_end, b_end) = rope.endpoints(seesaws);
    let a_over_b = a_end.y < b_end.y;

    let a_up = a.incline.is_up(rope.a.side);
    let b_up = b.incline.is_up(rope.b.side);
    let out_of_balance = if a_over_b { a_up && !b_up } else { !a_up && b_up };

    if !out_of_balance {
        return None;
    }
    if a.just_switched {
        Some(rope.b.seesaw)
    } else if b.just_switched {
        Some(rope.a.seesaw)
    } else {
        None
    }
}
