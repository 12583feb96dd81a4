//! This module maps the unbounded tape onto a single fixed-width terminal line.
//!
//! The head starts in the middle of the line and glides with the machine while it stays in
//! the central 80% of the window. Once it reaches the outer 10% on either side, the head stays
//! put on screen and the tape scrolls underneath it instead.
//!
//! Rendering produces plain text split into styled [`Segment`]s; how a [`Style`] looks is up
//! to whatever displays the [`Frame`].

use unicode_width::UnicodeWidthChar;

use crate::engine::{Model, SimulationState};
use crate::types::Symbol;

/// Printed at both ends of the tape line.
pub const ELLIPSIS: &str = "...";
/// Printed between two tape cells.
pub const SEPARATOR: char = '|';
/// Share of the window, on each side, in which the tape scrolls instead of the head moving.
pub const MARGIN_PERCENT: usize = 10;

const TITLE: &str = "Turing Machine Simulator";
const SEARCHING: &str = "...looking for transition";
const FINISHED: &str = "FINISHED";
const INTERRUPTED: &str = "INTERRUPTED";
const EXIT_HINT: &str = "Press Any Key to Exit";
/// Drawn in place of a symbol that doesn't fill exactly one column.
const REPLACEMENT: char = '?';

/// The text styles a display has to be able to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Normal,
    Underlined,
    Selected,
    SelectedUnderlined,
    Title,
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
}

impl Segment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Width in terminal columns.
    pub fn width(&self) -> usize {
        display_width(&self.text)
    }
}

pub type Line = Vec<Segment>;

/// Returns the total width of a line.
pub fn line_width(line: &[Segment]) -> usize {
    line.iter().map(Segment::width).sum()
}

/// Returns how many terminal columns `text` occupies. Control characters take none.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Returns the unstyled text of a line.
pub fn line_text(line: &[Segment]) -> String {
    line.iter().map(|s| s.text.as_str()).collect()
}

/// Everything needed to draw one animation frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub title: Line,
    /// The machine state label, aligned above the head.
    pub ceiling: Line,
    pub tape: Line,
    pub transition: Line,
    pub footer: Line,
}

/// Renders the tape window and keeps track of where the head is on screen.
///
/// The head column is animation state: it depends on every frame rendered before, so a
/// renderer must be [`reset`](Self::reset) when a new session starts.
#[derive(Debug, Clone)]
pub struct ViewportRenderer {
    title: String,
    head_column: Option<usize>,
    last_head: Option<i64>,
}

impl Default for ViewportRenderer {
    fn default() -> Self {
        Self::new(TITLE)
    }
}

impl ViewportRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            head_column: None,
            last_head: None,
        }
    }

    /// Forgets the on-screen head column; the next frame centers the head again.
    pub fn reset(&mut self) {
        self.head_column = None;
        self.last_head = None;
    }

    /// Returns the head column of the last rendered frame.
    pub fn head_column(&self) -> Option<usize> {
        self.head_column
    }

    /// Renders a frame for a terminal `width` columns wide.
    pub fn render(&mut self, width: usize, model: &Model) -> Frame {
        let head_column = self.updated_head_column(width, model);
        let symbols = visible_symbols(model, head_column, n_symbols(width));
        let (ceiling, tape) = tape_lines(&model.machine_state, &symbols, model.head);

        Frame {
            title: vec![Segment::new(self.title.as_str(), Style::Title)],
            ceiling,
            tape,
            transition: transition_line(model),
            footer: footer_line(model),
        }
    }

    /// Returns how far the head moves on screen for this frame.
    ///
    /// The head follows a move that happened since the previous frame, as long as that keeps
    /// it out of the margins; otherwise the window scrolls and the head stays at the margin
    /// boundary. A head found inside a margin (after the terminal shrank) is pulled back to the
    /// boundary.
    fn movement_direction(&self, model: &Model, n_symbols: usize) -> isize {
        let Some(column) = self.head_column else {
            return 0;
        };

        let step = match (&model.transition, self.last_head) {
            (Some(transition), Some(last))
                if model.state == SimulationState::Moved && last != model.head =>
            {
                transition.effect.action.offset() as isize
            }
            _ => 0,
        };

        let (low, high) = head_bounds(n_symbols);
        let column = column as isize;
        (column + step).clamp(low as isize, high as isize) - column
    }

    fn updated_head_column(&mut self, width: usize, model: &Model) -> usize {
        let n_symbols = n_symbols(width);
        let column = match self.head_column {
            None => n_symbols / 2,
            Some(column) => column.saturating_add_signed(self.movement_direction(model, n_symbols)),
        };

        self.head_column = Some(column);
        self.last_head = Some(model.head);
        column
    }
}

/// Returns how many tape cells fit on a line `width` columns wide.
///
/// A line with `n` cells is `...|a|b|...|z|...`, i.e. `2 * 3 + (n + 1) + n` columns wide.
/// At least one cell is always shown, even if the line then overflows.
pub fn n_symbols(width: usize) -> usize {
    let frame = 2 * ELLIPSIS.len() + 1;
    (width.saturating_sub(frame) / 2).max(1)
}

/// Returns the lowest and highest column the head may occupy.
fn head_bounds(n_symbols: usize) -> (usize, usize) {
    let margin = n_symbols * MARGIN_PERCENT / 100;
    (margin, n_symbols - 1 - margin)
}

/// Returns `(tape position, rendered symbol)` for every visible cell, left to right.
///
/// The head sits at `head_column`, so `head_column` cells are shown to its left and
/// `n_symbols - head_column - 1` to its right. Blank cells render as a space.
fn visible_symbols(model: &Model, head_column: usize, n_symbols: usize) -> Vec<(i64, char)> {
    let first = model.head.saturating_sub(head_column as i64);
    let last = model
        .head
        .saturating_add(n_symbols.saturating_sub(head_column + 1) as i64);
    let blank = model.tape.blank();

    (first..=last)
        .map(|position| (position, render_symbol(model.tape.read(position), blank)))
        .collect()
}

fn render_symbol(symbol: Symbol, blank: Symbol) -> char {
    if symbol == blank {
        ' '
    } else if char_width(symbol) != 1 {
        REPLACEMENT
    } else {
        symbol
    }
}

/// Builds the ceiling (state label) and the tape line.
fn tape_lines(state: &str, symbols: &[(i64, char)], head: i64) -> (Line, Line) {
    let head_index = symbols
        .iter()
        .position(|(position, _)| *position == head)
        .unwrap_or(0);
    let head_symbol = symbols.get(head_index).map_or(' ', |(_, s)| *s);

    let mut before_head = String::from(ELLIPSIS);
    for (_, symbol) in &symbols[..head_index] {
        before_head.push(SEPARATOR);
        before_head.push(*symbol);
    }
    let head = format!("{SEPARATOR}{head_symbol}{SEPARATOR}");
    let mut after_head = String::new();
    for (_, symbol) in symbols.iter().skip(head_index + 1) {
        after_head.push(*symbol);
        after_head.push(SEPARATOR);
    }
    after_head.push_str(ELLIPSIS);

    let before_width = display_width(&before_head);
    let tape_width = before_width + display_width(&head) + display_width(&after_head);

    let tape = vec![
        Segment::new(before_head, Style::Underlined),
        Segment::new(head, Style::SelectedUnderlined),
        Segment::new(after_head, Style::Underlined),
    ];

    (ceiling_line(state, before_width, tape_width), tape)
}

/// Places the state label so its middle slice sits right above the head cell.
///
/// The label is cut into a left half, a middle slice of up to three characters and a right
/// half. Whatever would stick out of either end of the tape line is clipped, so the ceiling is
/// always exactly `tape_width` wide.
fn ceiling_line(state: &str, before_width: usize, tape_width: usize) -> Line {
    let chars: Vec<char> = state.chars().collect();
    let left_len = (chars.len() / 2).saturating_sub(1);
    let center_len = chars.len().saturating_sub(left_len).min(3);
    let left: String = chars[..left_len].iter().collect();
    let center: String = chars[left_len..left_len + center_len].iter().collect();
    let right: String = chars[left_len + center_len..].iter().collect();

    let mut label = Vec::new();
    if !left.is_empty() {
        label.push(Segment::new(
            format!("{SEPARATOR}{left}"),
            Style::SelectedUnderlined,
        ));
    }
    let mut middle = String::new();
    if left.is_empty() {
        middle.push(SEPARATOR);
    }
    middle.push_str(&center);
    if right.is_empty() {
        middle.push(SEPARATOR);
    }
    label.push(Segment::new(middle, Style::Selected));
    if !right.is_empty() {
        label.push(Segment::new(
            format!("{right}{SEPARATOR}"),
            Style::SelectedUnderlined,
        ));
    }

    // The head cell spans `before_width..before_width + 3`; one separator always precedes
    // the middle slice.
    let start = before_width as isize
        - (display_width(&center) / 2) as isize
        - display_width(&left) as isize;
    let label_width = line_width(&label) as isize;
    let skip = (-start).max(0) as usize;
    let pad_before = start.max(0) as usize;
    let take = (tape_width as isize - start).min(label_width) as usize - skip;

    let label = clip(label, skip, take);
    let pad_after = tape_width.saturating_sub(pad_before + line_width(&label));

    let mut line = Vec::with_capacity(label.len() + 2);
    line.push(Segment::new(" ".repeat(pad_before), Style::Underlined));
    line.extend(label);
    line.push(Segment::new(" ".repeat(pad_after), Style::Underlined));
    line.retain(|segment| !segment.text.is_empty());
    line
}

/// Drops the first `skip` columns of a line and keeps the next `take`.
///
/// A wide character cut by either edge is replaced by spaces for the columns that remain.
fn clip(line: Line, mut skip: usize, mut take: usize) -> Line {
    let mut clipped = Vec::new();
    for segment in line {
        if take == 0 {
            break;
        }
        let mut text = String::new();
        for c in segment.text.chars() {
            let mut width = char_width(c);
            if skip > 0 {
                let skipped = skip.min(width);
                skip -= skipped;
                if skipped == width {
                    continue;
                }
                width -= skipped;
                text.extend(std::iter::repeat(' ').take(width.min(take)));
                take -= width.min(take);
            } else if width <= take {
                text.push(c);
                take -= width;
            } else {
                text.extend(std::iter::repeat(' ').take(take));
                take = 0;
            }
            if take == 0 {
                break;
            }
        }
        if !text.is_empty() {
            clipped.push(Segment::new(text, segment.style));
        }
    }
    clipped
}

/// Describes the current transition, emphasizing the part that the current phase applies.
fn transition_line(model: &Model) -> Line {
    let emphasis = |selected: bool| {
        if selected {
            Style::Selected
        } else {
            Style::Normal
        }
    };

    match (model.state, &model.transition) {
        (SimulationState::Finished, _) => vec![Segment::new(FINISHED, Style::Title)],
        (SimulationState::Interrupted, _) => vec![Segment::new(INTERRUPTED, Style::Title)],
        (SimulationState::Idle, _) | (_, None) => vec![Segment::new(SEARCHING, Style::Normal)],
        (state, Some(transition)) => {
            let condition = &transition.condition;
            let effect = &transition.effect;
            vec![
                Segment::new(
                    format!("{} {}", condition.state, condition.symbol),
                    emphasis(state == SimulationState::FoundTransition),
                ),
                Segment::new(" -> ", Style::Normal),
                Segment::new(
                    format!("{} {}", effect.new_state, effect.new_symbol),
                    emphasis(state == SimulationState::ChangedState),
                ),
                Segment::new(" -> ", Style::Normal),
                Segment::new(
                    effect.action.to_string(),
                    emphasis(state == SimulationState::Moved),
                ),
            ]
        }
    }
}

fn footer_line(model: &Model) -> Line {
    let text = if model.state.is_terminal() {
        EXIT_HINT.to_string()
    } else {
        format!(
            " [a] - accelerate | [s] - slow down | [q] - quit | current refresh interval: {} | steps: {}",
            model.step_interval, model.step_count
        )
    };
    vec![Segment::new(text, Style::Normal)]
}
