/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer (array of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each grid cell is two terminal columns wide: actors are drawn as one
/// wide emoji, walls as two block characters.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::actor::{Actor, ActorKind};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: [u8; 8],   // one UTF-8 encoded char (emoji included)
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // occupies 2 terminal columns
    cont: bool,    // right half of a wide char (never printed)
}

impl Cell {
    /// Explicit background for every "empty" terminal cell, so the gap
    /// pixels between rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 24, g: 22, b: 30 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 8],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Differs from any real cell; used to force a full repaint.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::from_char(c, fg, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            self.set(cx, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Write a 2-column glyph at (x, y). Dropped if it would be cut off.
    fn put_wide(&mut self, x: usize, y: usize, ch: char, fg: Color, bg: Color) {
        if x + 1 >= self.width {
            return;
        }
        self.set(x, y, Cell::from_char_wide(ch, fg, bg));
        let mut cont = Cell::WIDE_CONT;
        cont.bg = Cell::norm_bg(bg);
        self.set(x + 1, y, cont);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for row in y..y + h {
            for col in x..x + w {
                self.set(col, row, Cell::from_char(' ', Color::White, bg));
            }
        }
    }
}

// ── Glyphs ──

/// How one stage cell looks: either a wide emoji or two narrow chars.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Glyph {
    Wide(char, Color),
    Pair(char, Color),
}

const FLOOR_BG: Color = Color::Rgb { r: 36, g: 34, b: 44 };
const STUCK_BG: Color = Color::Rgb { r: 90, g: 60, b: 20 };
const WALL_FG: Color = Color::Rgb { r: 140, g: 130, b: 120 };

/// Glyph and background for an actor. Captured monsters and the sticky
/// boxes holding them get a warm background.
fn glyph(actor: &Actor) -> (Glyph, Color) {
    match actor.kind {
        ActorKind::Player { .. } => (Glyph::Wide('😃', Color::White), FLOOR_BG),
        ActorKind::Box => (Glyph::Wide('📦', Color::White), FLOOR_BG),
        ActorKind::StickyBox => {
            let bg = if actor.captives().is_empty() { FLOOR_BG } else { STUCK_BG };
            (Glyph::Wide('🍯', Color::White), bg)
        }
        ActorKind::Wall => (Glyph::Pair('█', WALL_FG), FLOOR_BG),
        ActorKind::Monster { stuck, .. } => {
            let bg = if stuck { STUCK_BG } else { FLOOR_BG };
            (Glyph::Wide('👾', Color::White), bg)
        }
    }
}

// ── Renderer ──

/// Game cell gx maps to terminal columns (gx*2, gx*2+1).
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
/// Top border of the map frame; grid rows start one below.
const FRAME_ROW: usize = 2;
const FRAME_COL: usize = 1;

const HUD_BG: Color = Color::Rgb { r: 30, g: 40, b: 70 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const TITLE_FG: Color = Color::Rgb { r: 255, g: 190, b: 60 };
const HI: Color = Color::Rgb { r: 90, g: 240, b: 110 };
const KEY_FG: Color = Color::Rgb { r: 110, g: 200, b: 255 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        log::debug!("terminal {}x{}", self.term_w, self.term_h);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clean transition
        if self.last_phase != Some(world.phase) {
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.compose(world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.invalidate();
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Never ResetColor here: the terminal default may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, w: &WorldState) {
        self.front.clear();

        match w.phase {
            Phase::Title => self.compose_title(w),
            Phase::Playing => self.compose_stage(w),
            Phase::Won | Phase::Lost => {
                self.compose_stage(w);
                self.compose_end_banner(w);
            }
        }

        if w.paused && w.phase == Phase::Playing {
            self.compose_pause_overlay(w);
        }
    }

    /// Terminal rows/cols the framed map needs.
    fn map_extent(w: &WorldState) -> (usize, usize) {
        let cols = w.stage.width() as usize * CELL_W + 2;
        let rows = w.stage.height() as usize + 2;
        (cols, rows)
    }

    fn compose_stage(&mut self, w: &WorldState) {
        // ── HUD row ──
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = format!(
            " WAREHOUSE WARS   Monsters {}/{}   Trapped {}   Pushes {}   Tick {}",
            w.monsters_left(), w.monsters_total, w.monsters_killed, w.boxes_pushed, w.tick,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Frame ──
        let (cols, rows) = Self::map_extent(w);
        let frame_fg = Color::Rgb { r: 110, g: 100, b: 90 };
        let inner = "─".repeat(cols - 2);
        self.front.put_str(FRAME_COL, FRAME_ROW, &format!("┌{inner}┐"), frame_fg, Color::Reset);
        self.front.put_str(FRAME_COL, FRAME_ROW + rows - 1, &format!("└{inner}┘"), frame_fg, Color::Reset);
        for row in FRAME_ROW + 1..FRAME_ROW + rows - 1 {
            self.front.set(FRAME_COL, row, Cell::from_char('│', frame_fg, Color::Reset));
            self.front.set(FRAME_COL + cols - 1, row, Cell::from_char('│', frame_fg, Color::Reset));
        }

        // ── Floor, then actors in insertion order ──
        let (ox, oy) = (FRAME_COL + 1, FRAME_ROW + 1);
        self.front.fill_rect(ox, oy, cols - 2, rows - 2, FLOOR_BG);
        for (_, actor) in w.stage.actors() {
            if !w.stage.is_in_bounds(actor.x, actor.y) {
                continue;
            }
            let col = ox + actor.x as usize * CELL_W;
            let row = oy + actor.y as usize;
            match glyph(actor) {
                (Glyph::Wide(ch, fg), bg) => self.front.put_wide(col, row, ch, fg, bg),
                (Glyph::Pair(ch, fg), bg) => {
                    self.front.set(col, row, Cell::from_char(ch, fg, bg));
                    self.front.set(col + 1, row, Cell::from_char(ch, fg, bg));
                }
            }
        }

        // ── Message bar ──
        let msg_row = FRAME_ROW + rows + 1;
        if !w.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" ▶ {} ", w.message), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help = " WASD/←↑↓→ Move  Q E Z X Diagonal  F1 Pause  R Restart  ESC Title";
        self.front.put_str(0, msg_row + 2, help, Color::DarkGrey, Color::Reset);

        if self.term_w < cols + FRAME_COL || self.term_h < msg_row + 1 {
            let warn = format!(" terminal too small: need {}x{} ", cols + FRAME_COL, msg_row + 1);
            let last = self.front.height.saturating_sub(1);
            self.front.put_str(0, last, &warn, Color::Black, Color::Rgb { r: 230, g: 80, b: 80 });
        }
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            "█   █  ███  ████  █████ █   █  ███  █   █  ████ █████",
            "█   █ █   █ █   █ █     █   █ █   █ █   █ █     █    ",
            "█ █ █ █████ ████  ████  █████ █   █ █   █  ███  ████ ",
            "██ ██ █   █ █  █  █     █   █ █   █ █   █     █ █    ",
            "█   █ █   █ █   █ █████ █   █  ███   ███  ████  █████",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(3, 1 + i, line, TITLE_FG, Color::Reset);
        }
        let subtitle = "━━━━━━━━━━━━━━━━━━━━  W A R S  ━━━━━━━━━━━━━━━━━━━━";
        self.front.put_str(4, 7, subtitle, HI, Color::Reset);

        let menu = 10;
        self.front.put_str(8, menu, "ENTER   New Game", HI, Color::Reset);
        self.front.put_str(8, menu + 1, "  Q     Quit", Color::White, Color::Reset);

        // ── Legend ──
        let legend = menu + 3;
        self.front.put_str(8, legend, "Legend", TITLE_FG, Color::Reset);
        let entries = [
            ('😃', "you: push boxes, avoid monsters"),
            ('👾', "monster: dies when fully boxed in"),
            ('📦', "box: pushable, chains push along"),
            ('🍯', "sticky box: catches monsters that touch it"),
        ];
        for (i, (ch, text)) in entries.iter().enumerate() {
            self.front.put_wide(10, legend + 1 + i, *ch, Color::White, Color::Reset);
            self.front.put_str(13, legend + 1 + i, text, Color::White, Color::Reset);
        }
        let wall_row = legend + 1 + entries.len();
        self.front.put_str(10, wall_row, "██", WALL_FG, Color::Reset);
        self.front.put_str(13, wall_row, "wall: never moves", Color::White, Color::Reset);

        // ── Controls ──
        let help = [
            "Controls",
            "  W A S D / arrows   Move",
            "  Q E Z X            Move diagonally",
            "  F1 Pause   R Restart   ESC Title",
        ];
        let help_base = wall_row + 2;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { TITLE_FG } else { KEY_FG };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }

        if w.games_won + w.games_lost > 0 {
            let record = format!("Session: {} won, {} lost", w.games_won, w.games_lost);
            self.front.put_str(8, help_base + help.len() + 1, &record, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_end_banner(&mut self, w: &WorldState) {
        let (cols, rows) = Self::map_extent(w);
        let won = w.phase == Phase::Won;
        let fg = if won { TITLE_FG } else { Color::Rgb { r: 255, g: 70, b: 70 } };
        let bg = Color::Rgb { r: 20, g: 18, b: 26 };

        let lines = [
            String::new(),
            w.message.clone(),
            String::new(),
            format!("Trapped {} of {}  ·  {} pushes", w.monsters_killed, w.monsters_total, w.boxes_pushed),
            String::new(),
            "ENTER play again   R new stage   ESC/Q quit".to_string(),
            String::new(),
        ];
        let box_w = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 6;
        let box_h = lines.len();
        let box_x = FRAME_COL + cols.saturating_sub(box_w) / 2;
        let box_y = FRAME_ROW + rows.saturating_sub(box_h) / 2;

        self.front.fill_rect(box_x, box_y, box_w, box_h, bg);
        for (i, line) in lines.iter().enumerate() {
            let x = box_x + (box_w - line.chars().count()) / 2;
            let color = if i == 1 { fg } else { Color::White };
            self.front.put_str(x, box_y + i, line, color, bg);
        }
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let (cols, rows) = Self::map_extent(w);
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let blink = (w.anim_tick / 8) % 2 == 0;

        let box_w = 26_usize;
        let box_h = 7_usize;
        let box_x = FRAME_COL + cols.saturating_sub(box_w) / 2;
        let box_y = FRAME_ROW + rows.saturating_sub(box_h) / 2;
        self.front.fill_rect(box_x, box_y, box_w, box_h, bg);

        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(box_x + 7, box_y + 1, label, TITLE_FG, bg);
        self.front.put_str(box_x + 3, box_y + 3, "F1   Resume", KEY_FG, bg);
        self.front.put_str(box_x + 3, box_y + 4, "R    Restart", KEY_FG, bg);
        self.front.put_str(box_x + 3, box_y + 5, "ESC  Back to Title", KEY_FG, bg);
    }
}
