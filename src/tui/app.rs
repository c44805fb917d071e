//! Main application logic for the terminal user interface.
//!
//! `App` owns one controller per screen and translates key presses into their
//! intents. It never writes to the store directly. Every loop iteration folds
//! in whatever the store published, so changes made from any tab show up on
//! the others on the next frame.

use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};

use crate::cmd::info_lines;
use crate::config::Config;
use crate::controller::{
    AddController, DetailsController, Dialog, FinishedController, HomeController, Notice,
};
use crate::db::{format_due, format_due_relative, local_date};
use crate::error::Error;
use crate::fields::Category;
use crate::store::TaskStore;
use crate::task::Task;
use crate::tui::{
    colors::{category_color, DARK_GREEN, DARK_PURPLE, DARK_RED, GOLD},
    enums::{AppState, Tab},
    task_form::{TaskForm, FIELD_COUNT, FIELD_LABELS},
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
pub struct App {
    store: TaskStore,
    tab: Tab,
    state: AppState,
    home: HomeController,
    finished: FinishedController,
    add: AddController,
    details: Option<DetailsController>,
    form: TaskForm,
    home_list: TableState,
    finished_list: TableState,
    status_message: String,
    date_format: String,
    info: Vec<(&'static str, String)>,
}

impl App {
    pub fn new(config: &Config, store: &TaskStore) -> Self {
        let mut app = App {
            store: store.clone(),
            tab: Tab::Home,
            state: AppState::Browsing,
            home: HomeController::new(store),
            finished: FinishedController::new(store, config.settings.category_matching),
            add: AddController::new(store),
            details: None,
            form: TaskForm::new(),
            home_list: TableState::default(),
            finished_list: TableState::default(),
            status_message: String::new(),
            date_format: config.settings.date_format.clone(),
            info: info_lines(config),
        };
        app.sync();
        app
    }

    /// Pull the latest snapshot into every controller and keep selections valid.
    pub fn sync(&mut self) {
        self.home.sync();
        self.finished.sync();
        if let Some(details) = self.details.as_mut() {
            details.sync();
        }
        clamp_selection(&mut self.home_list, self.home.tasks().len());
        clamp_selection(&mut self.finished_list, self.finished.groups().len());
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Surface a failed intent. Prefers the controller's notice.
    fn report(&mut self, notice: Option<String>, err: &Error) {
        self.status_message = notice.unwrap_or_else(|| err.to_string());
    }

    fn selected_home_task(&self) -> Option<Task> {
        let index = self.home_list.selected()?;
        self.home.tasks().get(index).cloned()
    }

    /// Finished tasks flattened in section order.
    fn finished_rows(&self) -> Vec<(Category, &Task)> {
        self.finished
            .groups()
            .iter()
            .flat_map(|(category, tasks)| tasks.iter().map(move |t| (category, t)))
            .collect()
    }

    fn selected_finished_task(&self) -> Option<Task> {
        let index = self.finished_list.selected()?;
        self.finished_rows().get(index).map(|(_, t)| (*t).clone())
    }

    fn selected_task(&self) -> Option<Task> {
        match self.tab {
            Tab::Home => self.selected_home_task(),
            Tab::Finished => self.selected_finished_task(),
            Tab::Info => None,
        }
    }

    fn open_details(&mut self) {
        if let Some(task) = self.selected_task() {
            self.details = Some(DetailsController::new(&self.store, task.id, self.date_format.as_str()));
            self.state = AppState::TaskDetail;
        }
    }

    fn toggle_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        match self.home.set_finished(task.id, !task.is_finished) {
            Ok(()) if task.is_finished => self.set_status_message(format!("Reopened '{}'", task.title)),
            Ok(()) => self.set_status_message(format!("Finished '{}'", task.title)),
            Err(e) => {
                let notice = self.home.notice().take();
                self.report(notice, &e);
            }
        }
    }

    fn open_delete(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        match self.tab {
            Tab::Finished => self.finished.open_delete(task),
            _ => self.home.open_delete(task),
        }
        self.state = AppState::Confirm;
    }

    fn open_edit(&mut self) {
        let Some(task) = self.selected_home_task() else {
            return;
        };
        match self.home.open_edit(task.id) {
            Ok(()) => {
                if let Some(editor) = self.home.editor() {
                    self.form = TaskForm::from_task(editor.original());
                }
                self.state = AppState::EditTask;
            }
            Err(e) => {
                let notice = self.home.notice().take();
                self.report(notice, &e);
            }
        }
    }

    fn create_task(&mut self) {
        let result = self
            .form
            .apply_to_add(&mut self.add)
            .and_then(|()| self.add.submit());
        match result {
            Ok(task) => {
                self.state = AppState::Browsing;
                self.set_status_message(format!("Task {} created", task.id));
            }
            Err(e) => {
                let notice = self.add.notice().take();
                self.report(notice, &e);
            }
        }
    }

    fn update_task(&mut self) {
        let result = match self.home.editor_mut() {
            Some(editor) => self.form.apply_to_edit(editor),
            None => Ok(()),
        };
        match result.and_then(|()| self.home.confirm()) {
            Ok(()) => {
                self.state = AppState::Browsing;
                self.set_status_message("Task updated");
            }
            Err(e) => {
                let notice = self.home.editor_mut().and_then(|editor| editor.notice().take());
                self.report(notice, &e);
            }
        }
    }

    /// Handle one key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.clear_status_message();
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        let should_quit = match self.state {
            AppState::Browsing => self.handle_browse_input(key),
            AppState::TaskDetail => self.handle_detail_input(key),
            AppState::AddTask => self.handle_form_input(key, false),
            AppState::EditTask => self.handle_form_input(key, true),
            AppState::Help => self.handle_help_input(key),
            AppState::Confirm => self.handle_confirm_input(key),
        };
        self.sync();
        should_quit
    }

    fn handle_browse_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
            KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.prev(),
            KeyCode::Char('1') => self.tab = Tab::Home,
            KeyCode::Char('2') => self.tab = Tab::Finished,
            KeyCode::Char('3') => self.tab = Tab::Info,
            KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::F(1) => self.state = AppState::Help,
            _ if self.tab == Tab::Info => {}
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Enter => self.open_details(),
            KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(),
            KeyCode::Char('d') => self.open_delete(),
            KeyCode::Char('a') if self.tab == Tab::Home => {
                self.form = TaskForm::new();
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') if self.tab == Tab::Home => self.open_edit(),
            _ => {}
        }
        false
    }

    fn move_selection(&mut self, delta: isize) {
        let (list, len) = match self.tab {
            Tab::Finished => (&mut self.finished_list, self.finished.groups().len()),
            _ => (&mut self.home_list, self.home.tasks().len()),
        };
        if len == 0 {
            return;
        }
        let current = list.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        list.select(Some(next as usize));
    }

    fn handle_detail_input(&mut self, key: KeyCode) -> bool {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
            self.details = None;
            self.state = AppState::Browsing;
        }
        false
    }

    fn handle_form_input(&mut self, key: KeyCode, is_edit: bool) -> bool {
        match key {
            KeyCode::Esc => {
                if is_edit {
                    self.home.cancel();
                }
                self.state = AppState::Browsing;
            }
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
            KeyCode::Left => self.form.handle_left_right(false),
            KeyCode::Right => self.form.handle_left_right(true),
            KeyCode::Backspace => self.form.handle_backspace(),
            KeyCode::Delete => self.form.handle_delete(),
            KeyCode::Enter if is_edit => self.update_task(),
            KeyCode::Enter => self.create_task(),
            KeyCode::Char(c) => self.form.handle_char(c),
            _ => {}
        }
        false
    }

    fn handle_confirm_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let result = match self.tab {
                    Tab::Finished => self.finished.confirm(),
                    _ => self.home.confirm(),
                };
                match result {
                    Ok(()) => {
                        self.state = AppState::Browsing;
                        self.set_status_message("Task deleted");
                    }
                    Err(e) => {
                        let notice = self.dialog_notice().take();
                        self.report(notice, &e);
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.home.cancel();
                self.finished.cancel();
                self.state = AppState::Browsing;
            }
            _ => {}
        }
        false
    }

    fn handle_help_input(&mut self, key: KeyCode) -> bool {
        if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h')) {
            self.state = AppState::Browsing;
        }
        false
    }

    fn dialog_notice(&mut self) -> &mut Notice {
        match self.tab {
            Tab::Finished => self.finished.notice(),
            _ => self.home.notice(),
        }
    }

    fn dialog(&self) -> &Dialog {
        match self.tab {
            Tab::Finished => self.finished.dialog(),
            _ => self.home.dialog(),
        }
    }

    /// Poll for and handle keyboard events. Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn due_text(&self, task: &Task) -> String {
        let today = Local::now().date_naive();
        format!(
            "{} ({})",
            format_due(task.due_date, &self.date_format),
            format_due_relative(local_date(task.due_date), today)
        )
    }

    fn render_tabs(&mut self, f: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("TASKIFY"))
            .select(self.tab.index())
            .highlight_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, area);
    }

    fn render_home(&mut self, f: &mut Frame, area: Rect) {
        if self.home.all_finished() {
            let text = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "All tasks finished!",
                    Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from("Press 'a' to add a task."),
            ];
            let banner = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("To do"));
            f.render_widget(banner, area);
            return;
        }

        let today = Local::now().date_naive();
        let header = Row::new(["", "ID", "Due", "Course", "Title"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(DARK_GREEN).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .home
            .tasks()
            .iter()
            .map(|task| {
                let style = if local_date(task.due_date) < today {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::White)
                };
                Row::new(vec![
                    Cell::from("[ ]"),
                    Cell::from(task.id.to_string()),
                    Cell::from(self.due_text(task)),
                    Cell::from(task.course.clone()),
                    Cell::from(task.title.clone()),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Min(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("To do ({}) - Press 'h' for help", self.home.tasks().len())),
            )
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.home_list);
    }

    fn render_finished(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let mut counts = Vec::new();
        for (category, tasks) in self.finished.groups().iter() {
            counts.push(Span::styled(
                format!(" {} {} ", category.label(), tasks.len()),
                Style::default().fg(category_color(category)),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(counts)), chunks[0]);

        if self.finished.groups().is_empty() {
            let empty = Paragraph::new("No finished tasks yet.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Finished"));
            f.render_widget(empty, chunks[1]);
            return;
        }

        let header = Row::new(["Section", "ID", "Due", "Course", "Title"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(DARK_PURPLE).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .finished_rows()
            .into_iter()
            .map(|(category, task)| {
                Row::new(vec![
                    Cell::from(category.label()).style(Style::default().fg(category_color(category))),
                    Cell::from(task.id.to_string()),
                    Cell::from(format_due(task.due_date, &self.date_format)),
                    Cell::from(task.course.clone()),
                    Cell::from(task.title.clone()),
                ])
                .style(Style::default().fg(Color::DarkGray))
            })
            .collect();

        let widths = [
            Constraint::Length(11),
            Constraint::Length(4),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Min(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Finished ({})", self.finished.groups().len())),
            )
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.finished_list);
    }

    fn render_info(&mut self, f: &mut Frame, area: Rect) {
        let mut text: Vec<Line> = self
            .info
            .iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{label:<12}"), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(value.clone()),
                ])
            })
            .collect();
        text.push(Line::from(""));
        text.push(Line::from("Press 'h' for keyboard shortcuts."));

        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("About"))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_task_form(&mut self, f: &mut Frame, area: Rect, is_edit: bool) {
        let (area, title) = if is_edit {
            let popup = centered_rect(70, 80, area);
            f.render_widget(Clear, popup);
            (popup, "Edit Task")
        } else {
            (area, "Add New Task")
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let mut constraints = vec![Constraint::Length(3); FIELD_COUNT];
        constraints.push(Constraint::Min(1));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (index, label) in FIELD_LABELS.iter().enumerate() {
            let focused = self.form.current_field == index;
            let border = if focused { Style::default().fg(GOLD) } else { Style::default() };
            let field = self.form.field(index);
            let input = Paragraph::new(field.value.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(*label)
                    .border_style(border),
            );
            f.render_widget(input, chunks[index]);
            if focused {
                let x = chunks[index].x + 1 + field.cursor as u16;
                f.set_cursor_position((x.min(chunks[index].right().saturating_sub(2)), chunks[index].y + 1));
            }
        }

        let help = vec![
            Line::from("Tab/Up/Down move between fields, Enter saves, Esc cancels."),
            Line::from("Due accepts YYYY-MM-DD, today, tomorrow, next friday or in 3d."),
        ];
        f.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)).wrap(Wrap { trim: true }),
            chunks[FIELD_COUNT],
        );
    }

    fn render_task_detail(&mut self, f: &mut Frame, area: Rect) {
        let mut text = Vec::new();
        match self.details.as_ref() {
            Some(details) if details.task().is_some() => {
                text.push(Line::from(vec![
                    Span::styled("ID: ", Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(details.task_id().to_string()),
                ]));
                for (label, value) in details.fields() {
                    text.push(Line::from(vec![
                        Span::styled(format!("{label}: "), Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(value),
                    ]));
                }
            }
            _ => text.push(Line::from("This task no longer exists.")),
        }
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Task Details - Esc to return"))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Tabs:", bold)),
            Line::from("  Tab/Right, Shift+Tab/Left  Next / previous tab"),
            Line::from("  1 2 3                      Home, Finished, Info"),
            Line::from(""),
            Line::from(Span::styled("Task lists:", bold)),
            Line::from("  Up/k, Down/j   Move selection"),
            Line::from("  Enter          View task details"),
            Line::from("  Space/x        Toggle finished"),
            Line::from("  a              Add task (Home)"),
            Line::from("  e              Edit task (Home)"),
            Line::from("  d              Delete task"),
            Line::from(""),
            Line::from(Span::styled("Forms:", bold)),
            Line::from("  Tab/Up/Down    Move between fields"),
            Line::from("  Enter          Save"),
            Line::from("  Esc            Cancel"),
            Line::from(""),
            Line::from("  h/?/F1         Show this help"),
            Line::from("  q/Esc/Ctrl+C   Quit"),
        ];
        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help - Esc to return"))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let target = match self.dialog() {
            Dialog::Delete(task) => format!("Delete '{}'?", task.title),
            _ => String::new(),
        };
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(target, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::Browsing => match self.tab {
                    Tab::Home => format!("Tasks: {} | Press 'h' for help", self.home.tasks().len()),
                    Tab::Finished => format!("Finished: {} | Press 'h' for help", self.finished.groups().len()),
                    Tab::Info => "Press 'h' for help".to_string(),
                },
                AppState::TaskDetail => "Task Details".to_string(),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(DARK_GREEN).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_tab_body(&mut self, f: &mut Frame, area: Rect) {
        match self.tab {
            Tab::Home => self.render_home(f, area),
            Tab::Finished => self.render_finished(f, area),
            Tab::Info => self.render_info(f, area),
        }
    }

    /// Main render function that dispatches to appropriate view renderers.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.render_tabs(f, chunks[0]);
        match self.state {
            AppState::Browsing => self.render_tab_body(f, chunks[1]),
            AppState::TaskDetail => self.render_task_detail(f, chunks[1]),
            AppState::AddTask => self.render_task_form(f, chunks[1], false),
            AppState::EditTask => {
                self.render_tab_body(f, chunks[1]);
                self.render_task_form(f, chunks[1], true);
            }
            AppState::Help => self.render_help(f, chunks[1]),
            AppState::Confirm => {
                self.render_tab_body(f, chunks[1]);
                self.render_confirm(f, chunks[1]);
            }
        }
        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop for the TUI application.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.sync();
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

fn clamp_selection(list: &mut TableState, len: usize) {
    match list.selected() {
        _ if len == 0 => list.select(None),
        None => list.select(Some(0)),
        Some(i) if i >= len => list.select(Some(len - 1)),
        Some(_) => {}
    }
}
