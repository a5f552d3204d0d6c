mod app_logic;
mod app_state;
mod event_handler;
mod ui_renderer;

pub use self::run_tui::run_tui_with_engine;

mod run_tui {
    use super::app_logic::TuiApp;
    use super::event_handler::handle_events;
    use super::ui_renderer::ui_frame;
    use crate::content::ContentInbox;
    use crate::engine::SelectionEngine;
    use anyhow::Result;
    use crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::prelude::{CrosstermBackend, Terminal};
    use std::io::{self, Stdout};

    /// Runs the interactive picker until the user confirms or quits. The engine keeps
    /// every change either way; the returned flag says whether the user confirmed.
    pub fn run_tui_with_engine(
        engine: SelectionEngine,
        inbox: ContentInbox,
    ) -> Result<(SelectionEngine, ContentInbox, bool)> {
        let mut app = TuiApp::new(engine, inbox);

        let mut terminal = init_terminal()?;
        let loop_result = run_loop(&mut terminal, &mut app);
        restore_terminal(terminal)?;
        loop_result?;

        let confirmed = app.confirmed;
        let (engine, inbox) = app.into_parts();
        Ok((engine, inbox, confirmed))
    }

    fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut TuiApp) -> Result<()> {
        while !app.quit {
            terminal.draw(|frame| ui_frame(frame, app))?;
            handle_events(app)?;
        }
        Ok(())
    }

    fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend).map_err(Into::into)
    }

    fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor().map_err(Into::into)
    }
}
