use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;

use crate::models::{PopupMode, Task, TaskPatch};
use crate::repo::TaskRepository;
use crate::store::TaskStore;

pub struct App<S: TaskStore> {
    repo: TaskRepository<S>,
    pub tasks: Vec<Task>,
    pub list_state: ListState,
    pub should_quit: bool,
    // UI state
    pub popup_mode: PopupMode,
    pub input_buffer: String,
    pub editing_id: Option<i64>,
    pub status_message: Option<String>,
}

impl<S: TaskStore> App<S> {
    pub fn new(repo: TaskRepository<S>) -> Self {
        let mut app = App {
            repo,
            tasks: Vec::new(),
            list_state: ListState::default(),
            should_quit: false,
            popup_mode: PopupMode::None,
            input_buffer: String::new(),
            editing_id: None,
            status_message: None,
        };
        app.refresh_data();
        app
    }

    /// Re-fetches the task snapshot from the repository. Called on load and
    /// after every mutation; the list is never kept live across events.
    pub fn refresh_data(&mut self) {
        self.tasks = self.repo.list();
        // Keep the selection inside the new list bounds.
        if self.tasks.is_empty() {
            self.list_state.select(None);
        } else {
            match self.list_state.selected() {
                Some(i) if i >= self.tasks.len() => {
                    self.list_state.select(Some(self.tasks.len() - 1));
                }
                None => {
                    self.list_state.select(Some(0));
                }
                _ => {}
            }
        }
    }

    pub fn next_item(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => {
                if i >= self.tasks.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous_item(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.tasks.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.list_state.selected().and_then(|i| self.tasks.get(i))
    }

    pub fn open_add_popup(&mut self) {
        self.popup_mode = PopupMode::AddTask;
        self.input_buffer.clear();
        self.status_message = None;
    }

    /// Opens the edit popup pre-filled with the selected task's current text.
    pub fn open_edit_popup(&mut self) {
        let Some((id, text)) = self.selected_task().map(|t| (t.id, t.text.clone())) else {
            return;
        };
        self.editing_id = Some(id);
        self.input_buffer = text;
        self.popup_mode = PopupMode::EditTask;
        self.status_message = None;
    }

    pub fn close_popup(&mut self) {
        self.popup_mode = PopupMode::None;
        self.input_buffer.clear();
        self.editing_id = None;
    }

    pub fn handle_popup_input(&mut self, c: char) {
        if c.is_control() {
            return;
        }
        self.input_buffer.push(c);
    }

    pub fn handle_backspace(&mut self) {
        self.input_buffer.pop();
    }

    /// Commits the popup buffer: create on AddTask, text update on EditTask.
    /// Blank input is rejected with a status message and no state change.
    pub fn submit_input(&mut self) {
        match self.popup_mode {
            PopupMode::AddTask => {
                if self.input_buffer.trim().is_empty() {
                    self.status_message = Some("Task text cannot be empty".to_string());
                    return;
                }
                if !self.repo.add(&self.input_buffer) {
                    self.status_message = Some("Could not save task".to_string());
                }
                self.refresh_data();
                self.close_popup();
            }
            PopupMode::EditTask => {
                if self.input_buffer.trim().is_empty() {
                    self.status_message = Some("Task text cannot be empty".to_string());
                    return;
                }
                if let Some(id) = self.editing_id {
                    if !self.repo.update_by_id(id, &TaskPatch::text(self.input_buffer.clone())) {
                        self.status_message = Some("Could not save task".to_string());
                    }
                }
                self.refresh_data();
                self.close_popup();
            }
            PopupMode::None => {}
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return;
        };
        if !self.repo.toggle_by_id(id) {
            self.status_message = Some("Could not save task".to_string());
        }
        self.refresh_data();
    }

    pub fn remove_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id) else {
            return;
        };
        if !self.repo.remove_by_id(id) {
            self.status_message = Some("Could not remove task".to_string());
        }
        self.refresh_data();
    }
}

pub fn run_tui<S: TaskStore>(repo: TaskRepository<S>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(repo);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: TaskStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                if app.popup_mode != PopupMode::None {
                    match key.code {
                        KeyCode::Esc => {
                            app.close_popup();
                        }
                        KeyCode::Enter => {
                            app.submit_input();
                        }
                        KeyCode::Char(c) => {
                            app.handle_popup_input(c);
                        }
                        KeyCode::Backspace => {
                            app.handle_backspace();
                        }
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Char('q') => {
                            app.should_quit = true;
                        }
                        KeyCode::Down => {
                            app.next_item();
                        }
                        KeyCode::Up => {
                            app.previous_item();
                        }
                        KeyCode::Char(' ') => {
                            app.toggle_selected();
                        }
                        KeyCode::Char('a') | KeyCode::Char('i') => {
                            app.open_add_popup();
                        }
                        KeyCode::Char('e') | KeyCode::Enter => {
                            app.open_edit_popup();
                        }
                        KeyCode::Char('d') => {
                            app.remove_selected();
                        }
                        KeyCode::Char('r') => {
                            app.refresh_data();
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui<S: TaskStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let open = app.tasks.iter().filter(|t| !t.completed).count();
    let header = Paragraph::new(format!("{} open / {} total", open, app.tasks.len()))
        .block(Block::default().borders(Borders::ALL).title("Tend"))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, chunks[0]);

    render_task_list(f, app, chunks[1]);

    let status = match &app.status_message {
        Some(msg) => msg.clone(),
        None => "a: Add | Space: Toggle | e/Enter: Edit | d: Delete | q: Quit".to_string(),
    };
    let status_style = if app.status_message.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::White)
    };
    let status_bar = Paragraph::new(status)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style);
    f.render_widget(status_bar, chunks[2]);

    // Render popups
    if app.popup_mode == PopupMode::AddTask {
        let popup_area = centered_rect(60, 25, f.area());
        let block = Block::default()
            .title("Add Task")
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::DarkGray));
        let content = Paragraph::new(format!(
            "Enter task text:\n\n{}\n\nPress ENTER to save\nPress ESC to cancel",
            app.input_buffer
        ))
        .block(block)
        .alignment(ratatui::layout::Alignment::Center)
        .style(Style::default().fg(Color::White));

        f.render_widget(content, popup_area);
    }

    if app.popup_mode == PopupMode::EditTask {
        let popup_area = centered_rect(60, 25, f.area());
        let block = Block::default()
            .title("Edit Task")
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::DarkGray));
        let content = Paragraph::new(format!(
            "Edit task text:\n\n{}\n\nPress ENTER to save\nPress ESC to cancel",
            app.input_buffer
        ))
        .block(block)
        .alignment(ratatui::layout::Alignment::Center)
        .style(Style::default().fg(Color::White));

        f.render_widget(content, popup_area);
    }
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_task_list<S: TaskStore>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let items = task_rows(&app.tasks);
    let tasks_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    f.render_stateful_widget(tasks_list, chunks[0], &mut app.list_state);

    let info_text = if let Some(task) = app.selected_task() {
        let tags = if task.tags.is_empty() {
            "(none)".to_string()
        } else {
            task.tags.join(", ")
        };
        format!(
            "Task: {}\nCompleted: {}\nTags: {}\nCreated: {}\n\nControls:\n• Space: Toggle completion\n• e/Enter: Edit text\n• d: Delete\n• a: Add new task\n• r: Refresh\n• q: Quit",
            task.text, task.completed, tags, task.created_at
        )
    } else {
        "No task selected\n\nControls:\n• ↑/↓: Navigate\n• a: Add new task\n• r: Refresh\n• q: Quit".to_string()
    };

    let info_paragraph = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("Task Info"))
        .style(Style::default().fg(Color::White));

    f.render_widget(info_paragraph, chunks[1]);
}

/// Projects the task snapshot into list rows, one per task, in stored order.
fn task_rows(tasks: &[Task]) -> Vec<ListItem<'static>> {
    tasks
        .iter()
        .map(|task| {
            let checkbox = if task.completed { "[x] " } else { "[ ] " };
            let text_style = if task.completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(vec![Line::from(vec![
                Span::styled(checkbox.to_string(), Style::default().fg(Color::Green)),
                Span::styled(task.text.clone(), text_style),
            ])])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn sample(id: i64, text: &str, completed: bool) -> Task {
        Task {
            id,
            text: text.to_string(),
            completed,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            tags: Vec::new(),
        }
    }

    fn app_with(tasks: Vec<Task>) -> App<MemStore> {
        App::new(TaskRepository::new(MemStore::with_tasks(tasks)))
    }

    #[test]
    fn rows_mirror_the_list_in_order() {
        let tasks = vec![sample(1, "a", false), sample(2, "b", true), sample(3, "c", false)];
        let rows = task_rows(&tasks);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn rendering_twice_without_mutation_is_identical() {
        let tasks = vec![sample(1, "a", false), sample(2, "b", true)];
        let first = task_rows(&tasks);
        let second = task_rows(&tasks);
        assert_eq!(format!("{:?}", first), format!("{:?}", second));
    }

    #[test]
    fn add_popup_rejects_blank_input_without_mutating() {
        let mut app = app_with(Vec::new());
        app.open_add_popup();
        app.handle_popup_input(' ');
        app.submit_input();

        assert!(app.tasks.is_empty());
        assert_eq!(app.status_message.as_deref(), Some("Task text cannot be empty"));
        // Popup stays open so the user can fix the input.
        assert_eq!(app.popup_mode, PopupMode::AddTask);
    }

    #[test]
    fn add_popup_appends_and_refreshes_snapshot() {
        let mut app = app_with(Vec::new());
        app.open_add_popup();
        for c in "Buy milk".chars() {
            app.handle_popup_input(c);
        }
        app.submit_input();

        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.tasks[0].text, "Buy milk");
        assert_eq!(app.popup_mode, PopupMode::None);
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn edit_popup_prefills_current_text_and_commits() {
        let mut app = app_with(vec![sample(1, "old text", false)]);
        app.open_edit_popup();
        assert_eq!(app.input_buffer, "old text");

        app.input_buffer.clear();
        for c in "new text".chars() {
            app.handle_popup_input(c);
        }
        app.submit_input();

        assert_eq!(app.tasks[0].text, "new text");
        assert!(!app.tasks[0].completed);
    }

    #[test]
    fn toggle_flips_selected_task() {
        let mut app = app_with(vec![sample(1, "a", false)]);
        app.toggle_selected();
        assert!(app.tasks[0].completed);
        app.toggle_selected();
        assert!(!app.tasks[0].completed);
    }

    #[test]
    fn remove_drops_selected_and_clamps_selection() {
        let mut app = app_with(vec![sample(1, "a", false), sample(2, "b", false)]);
        app.next_item();
        assert_eq!(app.list_state.selected(), Some(1));

        app.remove_selected();
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.tasks[0].id, 1);
        assert_eq!(app.list_state.selected(), Some(0));

        app.remove_selected();
        assert!(app.tasks.is_empty());
        assert_eq!(app.list_state.selected(), None);
    }

    #[test]
    fn navigation_wraps_and_tolerates_empty_list() {
        let mut app = app_with(Vec::new());
        app.next_item();
        app.previous_item();
        assert_eq!(app.list_state.selected(), None);

        let mut app = app_with(vec![sample(1, "a", false), sample(2, "b", false)]);
        assert_eq!(app.list_state.selected(), Some(0));
        app.previous_item();
        assert_eq!(app.list_state.selected(), Some(1));
        app.next_item();
        assert_eq!(app.list_state.selected(), Some(0));
    }
}
