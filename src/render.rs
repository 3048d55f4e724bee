use crate::app::Renderer;
use crate::model::{BallKind, Point, SimulationState, Surface, WORLD_H, WORLD_W};
use crate::sim::TickReport;
use crossterm::{
    cursor,
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell {
                bg,
                ..Cell::default()
            };
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    pub(crate) const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Braille sub-pixel canvas: 2×4 dots per terminal cell.
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn clear(&mut self, p: Pixel) {
        self.px.fill(p);
    }
    #[cfg(test)]
    pub(crate) fn get(&self, x: i32, y: i32) -> Option<Pixel> {
        if x < 0 || y < 0 || x as u32 >= self.w || y as u32 >= self.h {
            return None;
        }
        Some(self.px[self.idx(x as u32, y as u32)])
    }
    pub(crate) fn plot(&mut self, x: i32, y: i32, p: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        self.px[i] = p;
    }

    /// Bresenham line, both ends inclusive.
    pub(crate) fn line(&mut self, (x0, y0): (i32, i32), (x1, y1): (i32, i32), p: Pixel) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;
        loop {
            self.plot(x, y, p);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub(crate) fn fill_circle(&mut self, (cx, cy): (i32, i32), r: i32, p: Pixel) {
        for y in -r..=r {
            for x in -r..=r {
                if x * x + y * y <= r * r {
                    self.plot(cx + x, cy + y, p);
                }
            }
        }
    }

    /// Midpoint circle outline.
    pub(crate) fn stroke_circle(&mut self, (cx, cy): (i32, i32), r: i32, p: Pixel) {
        let (mut x, mut y) = (r, 0);
        let mut err = 1 - r;
        while x >= y {
            for (ox, oy) in [
                (x, y),
                (y, x),
                (-y, x),
                (-x, y),
                (-x, -y),
                (-y, -x),
                (y, -x),
                (x, -y),
            ] {
                self.plot(cx + ox, cy + oy, p);
            }
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }
}

/// Maps world coordinates onto a canvas, keeping the world's aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) scale: f64,
    pub(crate) off_x: f64,
    pub(crate) off_y: f64,
}

impl Viewport {
    pub(crate) fn fit(canvas_w: u32, canvas_h: u32) -> Self {
        let scale = (canvas_w as f64 / WORLD_W).min(canvas_h as f64 / WORLD_H);
        Self {
            scale,
            off_x: (canvas_w as f64 - WORLD_W * scale) / 2.0,
            off_y: (canvas_h as f64 - WORLD_H * scale) / 2.0,
        }
    }

    pub(crate) fn project(&self, p: Point) -> (i32, i32) {
        (
            (p.x * self.scale + self.off_x).round() as i32,
            (p.y * self.scale + self.off_y).round() as i32,
        )
    }

    pub(crate) fn radius(&self, r: f64) -> i32 {
        ((r * self.scale).round() as i32).max(1)
    }
}

/* -----------------------------
   Palette
------------------------------ */

const SWITCHABLE: Pixel = Pixel::rgb(60, 110, 255);
const FIXED_SEESAW: Pixel = Pixel::rgb(40, 220, 80);
const RAMP: Pixel = Pixel::rgb(230, 230, 230);
const ROPE: Pixel = Pixel::rgb(235, 50, 50);
const BALL_ONE: Pixel = Pixel::rgb(255, 255, 255);
const BALL_ZERO: Pixel = Pixel::rgb(200, 200, 200);
const BALL_SPACER: Pixel = Pixel::rgb(60, 110, 255);

/// Paint the whole machine: seesaws, balls, ropes, then ramps on top.
pub(crate) fn draw_machine(canvas: &mut PixelCanvas, st: &SimulationState, vp: Viewport) {
    for s in &st.seesaws {
        let color = if s.ball_switchable {
            SWITCHABLE
        } else {
            FIXED_SEESAW
        };
        canvas.line(vp.project(s.left_edge()), vp.project(s.right_edge()), color);
    }
    for b in &st.balls {
        let c = vp.project(b.pos);
        let r = vp.radius(b.radius);
        match b.kind {
            BallKind::Zero => canvas.stroke_circle(c, r, BALL_ZERO),
            BallKind::One => canvas.fill_circle(c, r, BALL_ONE),
            BallKind::Spacer => canvas.fill_circle(c, r, BALL_SPACER),
        }
    }
    for rope in &st.ropes {
        let (a, b) = rope.endpoints(&st.seesaws);
        canvas.line(vp.project(a), vp.project(b), ROPE);
    }
    for ramp in &st.ramps {
        canvas.line(vp.project(ramp.left_edge()), vp.project(ramp.right_edge()), RAMP);
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, enable_color: bool, bg: Color) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let mut mask: u8 = 0;
            let (mut sum_r, mut sum_g, mut sum_b) = (0u32, 0u32, 0u32);
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let x = cx * 2 + dx;
                    let y = cy * 4 + dy;
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink_count += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');
            let fg = if enable_color && ink_count > 0 {
                Color::Rgb {
                    r: (sum_r / ink_count) as u8,
                    g: (sum_g / ink_count) as u8,
                    b: (sum_b / ink_count) as u8,
                }
            } else {
                Color::White
            };

            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

pub(crate) fn hud_line(st: &SimulationState, last: Option<&TickReport>) -> String {
    let flips = last.map(|r| r.flips()).unwrap_or(0);
    format!(
        " tick {}  flips {}  balls in play {}/{}  q quit ",
        st.tick,
        flips,
        st.balls_in_play(),
        st.balls.len()
    )
}

/* -----------------------------
   Terminal backend
------------------------------ */

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
    enable_color: bool,
    active: bool,
}

impl Terminal {
    pub(crate) fn begin(enable_color: bool) -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as u32 * 2, rows as u32 * 4),
            enable_color,
            active: true,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

impl Renderer for Terminal {
    fn draw(&mut self, st: &SimulationState, last: Option<&TickReport>) -> anyhow::Result<()> {
        let resized = self.resize_if_needed()?;
        let bg = Color::Black;
        self.cur.clear(bg);
        self.canvas.clear(Pixel::default());

        // top row is reserved for the HUD
        let vp = Viewport::fit(self.canvas.w, self.canvas.h.saturating_sub(4));
        let vp = Viewport {
            off_y: vp.off_y + 4.0,
            ..vp
        };
        draw_machine(&mut self.canvas, st, vp);
        canvas_to_cells(&self.canvas, &mut self.cur, self.enable_color, bg);
        draw_text(&mut self.cur, 0, 0, &hud_line(st, last), Color::Black, Color::White);

        self.present(!resized)
    }
}
