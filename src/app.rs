use crate::config::{load_settings, project_paths, save_settings_atomic, Args, Settings};
use crate::input::TerminalInput;
use crate::layout::{parse_rule, standard_machine};
use crate::model::{Side, SimulationState};
use crate::render::Terminal;
use crate::sim::{step, TickReport};
use anyhow::Context;
use serde::Serialize;
use std::time::{Duration, Instant};

pub(crate) const HEADLESS_TICKS: u64 = 600;

/// Draws the machine once per tick.
pub(crate) trait Renderer {
    fn draw(&mut self, st: &SimulationState, last: Option<&TickReport>) -> anyhow::Result<()>;
}

/// Polled once per tick; `true` ends the run before the next tick.
pub(crate) trait InputSource {
    fn quit_requested(&mut self) -> anyhow::Result<bool>;
}

pub(crate) struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw(&mut self, _st: &SimulationState, _last: Option<&TickReport>) -> anyhow::Result<()> {
        Ok(())
    }
}

pub(crate) struct NeverQuit;

impl InputSource for NeverQuit {
    fn quit_requested(&mut self) -> anyhow::Result<bool> {
        Ok(false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StopReason {
    Quit,
    TickLimit,
}

/// Fixed-rate loop: step, draw, poll, pace.
pub(crate) struct Driver<R, I> {
    pub(crate) renderer: R,
    pub(crate) input: I,
    /// `None` runs as fast as possible.
    pub(crate) tick_dt: Option<Duration>,
    pub(crate) max_ticks: Option<u64>,
}

impl<R: Renderer, I: InputSource> Driver<R, I> {
    pub(crate) fn run(&mut self, st: &mut SimulationState) -> anyhow::Result<(StopReason, Option<TickReport>)> {
        let mut last: Option<TickReport> = None;
        self.renderer.draw(st, None)?;

        loop {
            if self.max_ticks.is_some_and(|max| st.tick >= max) {
                return Ok((StopReason::TickLimit, last));
            }
            let started = Instant::now();

            let report = step(st).with_context(|| format!("tick {} failed", st.tick + 1))?;
            self.renderer.draw(st, Some(&report))?;
            last = Some(report);

            if self.input.quit_requested()? {
                return Ok((StopReason::Quit, last));
            }
            if let Some(dt) = self.tick_dt {
                spin_sleep(dt, started);
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RunReport {
    pub(crate) ticks: u64,
    pub(crate) balls: usize,
    pub(crate) balls_in_play: usize,
    /// Raised side of every seesaw, in layout order.
    pub(crate) seesaws_up: Vec<Side>,
    pub(crate) last_tick: Option<TickReport>,
}

impl RunReport {
    pub(crate) fn new(st: &SimulationState, last_tick: Option<TickReport>) -> Self {
        Self {
            ticks: st.tick,
            balls: st.balls.len(),
            balls_in_play: st.balls_in_play(),
            seesaws_up: st
                .seesaws
                .iter()
                .map(|s| if s.incline.right_up() { Side::Right } else { Side::Left })
                .collect(),
            last_tick,
        }
    }

    pub(crate) fn render_text(&self) -> String {
        let seesaws: Vec<&str> = self
            .seesaws_up
            .iter()
            .map(|s| match s {
                Side::Left => "\\",
                Side::Right => "/",
            })
            .collect();
        let mut out = format!(
            "ticks: {}\nballs in play: {}/{}\nseesaws: {}\n",
            self.ticks,
            self.balls_in_play,
            self.balls,
            seesaws.join(" ")
        );
        if let Some(t) = &self.last_tick {
            out.push_str(&format!(
                "last tick: {} on ramps, {} on seesaws, {} falling, {} flips\n",
                t.ramp_supported,
                t.seesaw_supported,
                t.falling,
                t.flips()
            ));
        }
        out
    }
}

fn build_machine(settings: &Settings) -> anyhow::Result<SimulationState> {
    let rule_a = parse_rule('A', &settings.rule_a).context("bad rule A")?;
    let rule_b = parse_rule('B', &settings.rule_b).context("bad rule B")?;
    let st = standard_machine(&rule_a, &rule_b, settings.ball_count)?;
    log::info!(
        "machine: {} ramps, {} seesaws, {} ropes, {} balls (rules A={} B={})",
        st.ramps.len(),
        st.seesaws.len(),
        st.ropes.len(),
        st.balls.len(),
        settings.rule_a,
        settings.rule_b
    );
    Ok(st)
}

pub(crate) fn run(args: Args) -> anyhow::Result<()> {
    let paths = project_paths()?;
    let settings = load_settings(&paths.settings_path).merged_with(&args);
    if args.save_settings {
        save_settings_atomic(&paths.settings_path, &settings)?;
        log::info!("settings saved to {}", paths.settings_path.display());
    }

    let mut st = build_machine(&settings)?;

    if args.headless {
        let mut driver = Driver {
            renderer: NullRenderer,
            input: NeverQuit,
            tick_dt: None,
            max_ticks: Some(args.ticks.unwrap_or(HEADLESS_TICKS)),
        };
        let (_, last) = driver.run(&mut st)?;
        let report = RunReport::new(&st, last);
        log::info!("stopped after {} ticks", report.ticks);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", report.render_text());
        }
        return Ok(());
    }

    let term = Terminal::begin(settings.enable_color)?;
    let mut driver = Driver {
        renderer: term,
        input: TerminalInput,
        tick_dt: Some(Duration::from_secs_f64(1.0 / settings.tick_rate as f64)),
        max_ticks: args.ticks,
    };
    let result = driver.run(&mut st);
    driver.renderer.end()?;

    let (reason, _) = result?;
    log::info!("stopped ({:?}) at tick {}", reason, st.tick);
    Ok(())
}

/* -----------------------------
   Tick pacing helper
------------------------------ */

/// Wait out the rest of `target` measured from `start`. A late tick returns
/// immediately; nothing is caught up.
fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ball, BallKind, Rope, Seesaw};

    #[derive(Default)]
    struct Recorder {
        frames: Vec<u64>,
    }

    impl Renderer for Recorder {
        fn draw(&mut self, st: &SimulationState, _last: Option<&TickReport>) -> anyhow::Result<()> {
            self.frames.push(st.tick);
            Ok(())
        }
    }

    struct QuitAfter(u32);

    impl InputSource for QuitAfter {
        fn quit_requested(&mut self) -> anyhow::Result<bool> {
            if self.0 == 0 {
                return Ok(true);
            }
            self.0 -= 1;
            Ok(false)
        }
    }

    fn falling_ball() -> SimulationState {
        SimulationState::new(
            Vec::new(),
            Vec::new(),
            vec![Ball::new(100.0, 0.0, 12.5, BallKind::One)],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn quit_stops_before_the_next_tick() {
        let mut st = falling_ball();
        let mut driver = Driver {
            renderer: Recorder::default(),
            input: QuitAfter(2),
            tick_dt: None,
            max_ticks: None,
        };
        let (reason, last) = driver.run(&mut st).unwrap();
        assert_eq!(reason, StopReason::Quit);
        assert_eq!(st.tick, 3);
        assert_eq!(last.map(|r| r.tick), Some(3));
        assert_eq!(driver.renderer.frames, vec![0, 1, 2, 3]);
        assert_eq!(st.balls[0].pos.y, 75.0);
    }

    #[test]
    fn tick_limit_stops_the_loop() {
        let mut st = falling_ball();
        let mut driver = Driver {
            renderer: Recorder::default(),
            input: NeverQuit,
            tick_dt: None,
            max_ticks: Some(5),
        };
        let (reason, _) = driver.run(&mut st).unwrap();
        assert_eq!(reason, StopReason::TickLimit);
        assert_eq!(st.tick, 5);
        assert_eq!(driver.renderer.frames.len(), 6);
    }

    #[test]
    fn paced_ticks_take_at_least_their_slot() {
        let mut st = falling_ball();
        let mut driver = Driver {
            renderer: NullRenderer,
            input: NeverQuit,
            tick_dt: Some(Duration::from_millis(5)),
            max_ticks: Some(4),
        };
        let started = Instant::now();
        driver.run(&mut st).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn rope_cycle_aborts_the_run() {
        // a ball sits on the raised right end of seesaw 0, which is tied to
        // seesaw 1 twice with crossed sides
        let s0 = Seesaw::new(100.0, 100.0, true, true);
        let x = 130.0;
        let y = crate::predicates::resting_y(&s0, x);
        let mut st = SimulationState::new(
            Vec::new(),
            vec![s0, Seesaw::new(100.0, 300.0, true, true)],
            vec![Ball::new(x, y, 12.5, BallKind::One)],
            vec![
                Rope::new(0, Side::Left, 1, Side::Right),
                Rope::new(0, Side::Left, 1, Side::Left),
            ],
        )
        .unwrap();
        let mut driver = Driver {
            renderer: NullRenderer,
            input: NeverQuit,
            tick_dt: None,
            max_ticks: Some(3),
        };
        let err = driver.run(&mut st).unwrap_err();
        assert!(format!("{:#}", err).contains("did not settle"));
    }

    #[test]
    fn report_lists_seesaw_orientation() {
        let st = SimulationState::new(
            Vec::new(),
            vec![Seesaw::new(0.0, 0.0, true, true), Seesaw::new(0.0, 0.0, false, true)],
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        let report = RunReport::new(&st, None);
        assert_eq!(report.seesaws_up, vec![Side::Right, Side::Left]);
        assert!(report.render_text().contains("seesaws: / \\"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["seesaws_up"][1], "Left");
        assert_eq!(json["ticks"], 0);
    }
}
