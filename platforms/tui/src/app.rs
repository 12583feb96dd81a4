use action::Action;
use keymap::{Config, KeyMapConfig};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Duration;
use tracing::debug;
use tumas::{
    viewport::{self, Segment},
    Machine, Model, SimulationEngine, StepInterval, ViewportRenderer,
};

const TITLE: &str = "Turing Machine Simulator";

pub struct App {
    engine: SimulationEngine,
    renderer: ViewportRenderer,
    pub(crate) keymap: Config<Action>,
}

impl App {
    pub fn new(machine: Machine, step_interval: StepInterval) -> Self {
        let renderer = ViewportRenderer::new(format!("{TITLE} - {}", machine.name()));

        Self {
            engine: SimulationEngine::new(machine, step_interval),
            renderer,
            keymap: Action::keymap_config(),
        }
    }

    /// Draws the current frame, sized to the terminal as it is right now.
    pub fn render(&mut self, f: &mut Frame) {
        let area = f.area();
        let frame = self
            .renderer
            .render(usize::from(area.width), self.engine.model());

        let lines = vec![
            line(&frame.title).centered(),
            Line::default(),
            line(&frame.ceiling),
            line(&frame.tape),
            Line::default(),
            line(&frame.transition).centered(),
            Line::default(),
            line(&frame.footer).centered(),
        ];

        let paragraph = Paragraph::new(lines).style(normal());
        f.render_widget(paragraph, area);
    }

    /// Advances the simulation by one micro-step.
    pub fn step(&mut self) -> bool {
        self.engine.advance()
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Accelerate => self.engine.interval_mut().accelerate(),
            Action::SlowDown => self.engine.interval_mut().slow_down(),
            Action::Quit => self.engine.interrupt(),
        }
        debug!(?action, interval = %self.engine.step_interval(), "handled key");
    }

    pub fn step_interval(&self) -> Duration {
        self.engine.step_interval().as_duration()
    }

    pub fn is_terminated(&self) -> bool {
        self.engine.is_terminated()
    }

    pub fn model(&self) -> &Model {
        self.engine.model()
    }
}

fn line(segments: &[Segment]) -> Line<'static> {
    Line::from(
        segments
            .iter()
            .map(|segment| Span::styled(segment.text.clone(), style(segment.style)))
            .collect::<Vec<_>>(),
    )
}

fn style(style: viewport::Style) -> Style {
    match style {
        viewport::Style::Normal => normal(),
        viewport::Style::Underlined => normal().add_modifier(Modifier::UNDERLINED),
        viewport::Style::Selected => selected(),
        viewport::Style::SelectedUnderlined => selected().add_modifier(Modifier::UNDERLINED),
        viewport::Style::Title => normal().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    }
}

fn normal() -> Style {
    Style::default().fg(Color::White).bg(Color::Black)
}

fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use tumas::{ProgramManager, SimulationState};

    fn app(name: &str) -> App {
        let machine = ProgramManager::get_program_by_name(name).unwrap();
        App::new(machine, StepInterval::default())
    }

    fn draw(app: &mut App, width: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, 10)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_render_first_frame() {
        let mut app = app("Right walker");
        let rows = draw(&mut app, 120);

        assert!(rows[0].contains("Turing Machine Simulator - Right walker"));
        assert!(rows[2].contains("|A|"));
        assert!(rows[3].starts_with("...|"));
        assert!(rows[3].trim_end().ends_with("|..."));
        assert!(rows[5].contains("looking for transition"));
        assert!(rows[7].contains("[q] - quit"));
    }

    #[test]
    fn test_render_found_transition() {
        let mut app = app("Right walker");
        app.step();
        let rows = draw(&mut app, 60);

        assert!(rows[5].contains("A _ -> A 1 -> R"));
    }

    #[test]
    fn test_render_narrow_terminal() {
        let mut app = app("Right walker");
        let rows = draw(&mut app, 4);

        assert_eq!(rows[3], "...|");
    }

    #[test]
    fn test_speed_keys() {
        let mut app = app("Right walker");
        assert_eq!(app.step_interval(), Duration::from_millis(500));

        app.handle_action(Action::SlowDown);
        assert_eq!(app.step_interval(), Duration::from_millis(600));

        for _ in 0..10 {
            app.handle_action(Action::Accelerate);
        }
        assert_eq!(app.step_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_quit_interrupts() {
        let mut app = app("Binary increment");
        app.step();
        app.handle_action(Action::Quit);

        assert!(app.is_terminated());
        assert_eq!(app.model().state, SimulationState::Interrupted);
        assert!(!app.step());

        let rows = draw(&mut app, 60);
        assert!(rows[5].contains("INTERRUPTED"));
        assert!(rows[7].contains("Press Any Key to Exit"));
    }
}
