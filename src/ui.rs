use crate::commands::LocalPlanner;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, NaiveTime, Timelike, Utc};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use planner::calendar::{
    self, event_block, is_today, month_grid, navigate, week_grid, weekday_labels, Step,
};
use planner::model::{
    validate_event, AppSettings, CalendarView, Category, Event, EventPatch, NewEvent, NewTask,
    Priority, Task, TaskPatch, DEFAULT_COLORS,
};
use planner::planner::resolve;
use planner::query::{self, TaskSort, TaskView};
use planner::storage::DataLocation;
use planner::timefmt::{format_input, format_time, parse_local, relative_date};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListState;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub fn run(planner: LocalPlanner, location: DataLocation) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(planner, location);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    planner: LocalPlanner,
    location: DataLocation,
    screen: Screen,
    calendar_view: CalendarView,
    focus: CalendarFocus,
    cursor: NaiveDate,
    agenda_idx: usize,
    task_idx: usize,
    task_offset: usize,
    task_view: TaskView,
    task_sort: TaskSort,
    last_save: Instant,
    status: String,
    mode: Mode,
}

enum Mode {
    Normal,
    Creating(ItemForm),
    Editing { target: Target, form: ItemForm },
    ConfirmDelete { target: Target },
}

#[derive(Clone, PartialEq, Eq)]
enum Target {
    Event(String),
    Task(String),
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Screen {
    Calendar,
    Tasks,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum CalendarFocus {
    Grid,
    Agenda,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormKind {
    Event,
    Task,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum FormField {
    Title,
    Description,
    Start,
    End,
    Due,
    Priority,
    Category,
}

/// One dialog for both events and tasks; `fields` holds only the fields of `kind`.
struct ItemForm {
    kind: FormKind,
    fields: Vec<(FormField, FieldValue)>,
    active: usize,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl Screen {
    fn label(&self) -> &'static str {
        match self {
            Screen::Calendar => "calendar",
            Screen::Tasks => "tasks",
        }
    }
}

impl Target {
    fn id(&self) -> &str {
        match self {
            Target::Event(id) | Target::Task(id) => id,
        }
    }
}

impl FormField {
    fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Description => "Description",
            FormField::Start => "Start (YYYY.MM.DD@hh:mm)",
            FormField::End => "End (YYYY.MM.DD@hh:mm)",
            FormField::Due => "Due (YYYY.MM.DD@hh:mm, blank for none)",
            FormField::Priority => "Priority (low/medium/high)",
            FormField::Category => "Category",
        }
    }
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        self.cursor = self.value[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(idx, _)| idx)
            .unwrap_or(0);
    }

    fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    fn home(&mut self) {
        self.cursor = 0;
    }

    fn end(&mut self) {
        self.cursor = self.value.len();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let end = self.cursor;
        self.move_left();
        self.value.drain(self.cursor..end);
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl ItemForm {
    fn new_event(start: DateTime<Utc>, settings: &AppSettings, category: &str) -> Self {
        let start_local = start.with_timezone(&Local);
        let end_local = start_local + ChronoDuration::minutes(settings.default_event_duration as i64);
        ItemForm::build(
            FormKind::Event,
            [
                (FormField::Title, String::new()),
                (FormField::Description, String::new()),
                (FormField::Start, format_input(&start_local)),
                (FormField::End, format_input(&end_local)),
                (FormField::Category, category.to_string()),
            ],
        )
    }

    fn from_event(event: &Event, category: &str) -> Self {
        ItemForm::build(
            FormKind::Event,
            [
                (FormField::Title, event.title.clone()),
                (
                    FormField::Description,
                    event.description.clone().unwrap_or_default(),
                ),
                (
                    FormField::Start,
                    format_input(&event.start_date.with_timezone(&Local)),
                ),
                (
                    FormField::End,
                    format_input(&event.end_date.with_timezone(&Local)),
                ),
                (FormField::Category, category.to_string()),
            ],
        )
    }

    fn new_task(due: Option<DateTime<Utc>>, category: &str) -> Self {
        ItemForm::build(
            FormKind::Task,
            [
                (FormField::Title, String::new()),
                (FormField::Description, String::new()),
                (
                    FormField::Due,
                    due.map(|d| format_input(&d.with_timezone(&Local)))
                        .unwrap_or_default(),
                ),
                (FormField::Priority, Priority::Medium.label().to_string()),
                (FormField::Category, category.to_string()),
            ],
        )
    }

    fn from_task(task: &Task, category: &str) -> Self {
        ItemForm::build(
            FormKind::Task,
            [
                (FormField::Title, task.title.clone()),
                (
                    FormField::Description,
                    task.description.clone().unwrap_or_default(),
                ),
                (
                    FormField::Due,
                    task.due_date
                        .map(|d| format_input(&d.with_timezone(&Local)))
                        .unwrap_or_default(),
                ),
                (FormField::Priority, task.priority.label().to_string()),
                (FormField::Category, category.to_string()),
            ],
        )
    }

    fn build<const N: usize>(kind: FormKind, values: [(FormField, String); N]) -> Self {
        ItemForm {
            kind,
            fields: values
                .into_iter()
                .map(|(field, value)| (field, FieldValue::new(&value)))
                .collect(),
            active: 0,
        }
    }

    fn value(&self, field: FormField) -> &str {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.value.trim())
            .unwrap_or("")
    }

    fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    fn prev_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        &mut self.fields[self.active].1
    }

    fn title(&self, editing: bool) -> &'static str {
        match (self.kind, editing) {
            (FormKind::Event, false) => "New Event",
            (FormKind::Event, true) => "Edit Event",
            (FormKind::Task, false) => "New Task",
            (FormKind::Task, true) => "Edit Task",
        }
    }
}

impl App {
    fn new(planner: LocalPlanner, location: DataLocation) -> Self {
        let status = format!(
            "Loaded {} events and {} tasks from {}",
            planner.events().len(),
            planner.tasks().len(),
            location.dir.display()
        );
        let calendar_view = planner.settings().default_view;
        let cursor = planner.today();
        App {
            planner,
            location,
            screen: Screen::Calendar,
            calendar_view,
            focus: CalendarFocus::Grid,
            cursor,
            agenda_idx: 0,
            task_idx: 0,
            task_offset: 0,
            task_view: TaskView::Pending,
            task_sort: TaskSort::DueDate,
            last_save: Instant::now(),
            status,
            mode: Mode::Normal,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let TermEvent::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Creating(_) | Mode::Editing { .. } => {
                self.handle_form_key(key);
                false
            }
            Mode::ConfirmDelete { .. } => {
                self.handle_confirm_key(key);
                false
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('1') => {
                self.set_screen(Screen::Calendar);
                return false;
            }
            KeyCode::Char('2') => {
                self.set_screen(Screen::Tasks);
                return false;
            }
            KeyCode::Char('n') => {
                self.open_create_form();
                return false;
            }
            KeyCode::Char('N') => {
                let due = calendar::end_of_day(self.cursor, &Local);
                let category = self.default_category(false);
                self.mode = Mode::Creating(ItemForm::new_task(Some(due), &category));
                self.status = "Creating task (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
                return false;
            }
            KeyCode::Char('e') => {
                self.open_edit_form();
                return false;
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                match self.selected_target() {
                    Some(target) => {
                        self.status =
                            format!("Delete {}? (y to confirm, n/Esc to cancel)", target.id());
                        self.mode = Mode::ConfirmDelete { target };
                    }
                    None => self.status = "Nothing selected to delete".into(),
                }
                return false;
            }
            _ => {}
        }

        match self.screen {
            Screen::Calendar => self.handle_calendar_key(key),
            Screen::Tasks => self.handle_tasks_key(key),
        }
        false
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('m') => self.set_calendar_view(CalendarView::Month),
            KeyCode::Char('w') => self.set_calendar_view(CalendarView::Week),
            KeyCode::Char('d') => self.set_calendar_view(CalendarView::Day),
            KeyCode::Char('[') => self.step(Step::Prev),
            KeyCode::Char(']') => self.step(Step::Next),
            KeyCode::Char('t') => {
                self.cursor = self.planner.today();
                self.agenda_idx = 0;
                self.status = "Jumped to today".into();
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    CalendarFocus::Grid => CalendarFocus::Agenda,
                    CalendarFocus::Agenda => CalendarFocus::Grid,
                };
            }
            KeyCode::Enter if self.focus == CalendarFocus::Grid => {
                self.set_calendar_view(CalendarView::Day)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if self.browses_agenda() {
                    self.agenda_idx = self.agenda_idx.saturating_sub(1);
                } else {
                    self.shift_cursor(-7);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.browses_agenda() {
                    self.agenda_idx += 1;
                } else {
                    self.shift_cursor(7);
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.shift_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_cursor(1),
            _ => {}
        }
        self.ensure_agenda_bounds();
    }

    fn handle_tasks_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.task_idx = self.task_idx.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.task_idx += 1,
            KeyCode::Char('f') | KeyCode::Tab => {
                self.task_view = self.task_view.next();
                self.task_idx = 0;
                self.status = format!("Showing {} tasks", self.task_view.label());
            }
            KeyCode::Char('s') => {
                self.task_sort = self.task_sort.next();
                self.status = format!("Sorted by {}", self.task_sort.label());
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected_task(),
            _ => {}
        }
        self.ensure_task_bounds();
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::Creating(mut form) => {
                if self.process_form_key(None, &mut form, key) {
                    Mode::Normal
                } else {
                    Mode::Creating(form)
                }
            }
            Mode::Editing { target, mut form } => {
                if self.process_form_key(Some(&target), &mut form, key) {
                    Mode::Normal
                } else {
                    Mode::Editing { target, form }
                }
            }
            other => other,
        };
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let target = match &self.mode {
            Mode::ConfirmDelete { target } => target.clone(),
            _ => return,
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let result = match &target {
                    Target::Event(id) => self.planner.remove_event(id),
                    Target::Task(id) => self.planner.remove_task(id),
                };
                match result {
                    Ok(true) => self.saved(format!("Deleted {}", target.id())),
                    Ok(false) => self.status = format!("{} no longer exists", target.id()),
                    Err(err) => self.status = format!("Delete failed: {}", err),
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    /// Returns true when the form should close.
    fn process_form_key(&mut self, target: Option<&Target>, form: &mut ItemForm, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return true;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.active_field_mut().move_left(),
            KeyCode::Right => form.active_field_mut().move_right(),
            KeyCode::Home => form.active_field_mut().home(),
            KeyCode::End => form.active_field_mut().end(),
            KeyCode::Enter => return self.try_submit(target, form),
            KeyCode::Backspace => form.active_field_mut().backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    form.active_field_mut().insert_char(c);
                }
            }
            _ => {}
        }
        false
    }

    fn try_submit(&mut self, target: Option<&Target>, form: &ItemForm) -> bool {
        let result = match (form.kind, target) {
            (FormKind::Event, None) => self.create_event(form),
            (FormKind::Event, Some(target)) => self.edit_event(target.id(), form),
            (FormKind::Task, None) => self.create_task(form),
            (FormKind::Task, Some(target)) => self.edit_task(target.id(), form),
        };
        match result {
            Ok(message) => {
                self.saved(message);
                true
            }
            Err(err) => {
                self.status = format!("Could not save: {}", err);
                false
            }
        }
    }

    fn create_event(&mut self, form: &ItemForm) -> Result<String> {
        let draft = event_draft(form, self.planner.categories(), self.planner.settings())?;
        let event = self.planner.add_event(draft)?;
        self.cursor = event.start_date.with_timezone(&Local).date_naive();
        Ok(format!("Created event {}", event.id))
    }

    fn edit_event(&mut self, id: &str, form: &ItemForm) -> Result<String> {
        let current = self
            .planner
            .events()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("event {} not found", id))?;
        let draft = event_draft(form, self.planner.categories(), self.planner.settings())?;
        let color = if draft.category != current.category {
            Some(draft.color)
        } else {
            None
        };
        let patch = EventPatch {
            title: Some(draft.title),
            description: Some(draft.description),
            start_date: Some(draft.start_date),
            end_date: Some(draft.end_date),
            category: Some(draft.category),
            color,
            recurring_pattern: None,
        };
        let mut preview = current;
        patch.apply(&mut preview);
        validate_event(&preview)?;
        self.planner.update_event(id, &patch)?;
        Ok(format!("Updated event {}", id))
    }

    fn create_task(&mut self, form: &ItemForm) -> Result<String> {
        let draft = task_draft(form, self.planner.categories())?;
        let task = self.planner.add_task(draft)?;
        Ok(format!("Created task {}", task.id))
    }

    fn edit_task(&mut self, id: &str, form: &ItemForm) -> Result<String> {
        let current_category = self
            .planner
            .tasks()
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.category.clone())
            .ok_or_else(|| anyhow!("task {} not found", id))?;
        let draft = task_draft(form, self.planner.categories())?;
        let color = if draft.category != current_category {
            Some(draft.color)
        } else {
            None
        };
        let patch = TaskPatch {
            title: Some(draft.title),
            description: Some(draft.description),
            due_date: Some(draft.due_date),
            priority: Some(draft.priority),
            completed: None,
            category: Some(draft.category),
            color,
        };
        self.planner.update_task(id, &patch)?;
        Ok(format!("Updated task {}", id))
    }

    fn toggle_selected_task(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            self.status = "No task selected".into();
            return;
        };
        match self.planner.toggle_task(&id) {
            Ok(Some(task)) => {
                let state = if task.completed { "done" } else { "open" };
                self.saved(format!("Marked \"{}\" {}", task.title, state));
            }
            Ok(None) => self.status = format!("{} no longer exists", id),
            Err(err) => self.status = format!("Update failed: {}", err),
        }
    }

    fn open_create_form(&mut self) {
        match self.screen {
            Screen::Calendar => {
                let start = self.suggested_start();
                let category = self.default_category(true);
                self.mode = Mode::Creating(ItemForm::new_event(
                    start,
                    self.planner.settings(),
                    &category,
                ));
                self.status =
                    "Creating event (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
            }
            Screen::Tasks => {
                let category = self.default_category(false);
                self.mode = Mode::Creating(ItemForm::new_task(None, &category));
                self.status = "Creating task (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
            }
        }
    }

    fn open_edit_form(&mut self) {
        let form = match self.selected_target() {
            Some(Target::Event(id)) => self
                .planner
                .events()
                .iter()
                .find(|e| e.id == id)
                .map(|e| (Target::Event(id.clone()), ItemForm::from_event(e, self.planner.category_name(&e.category)))),
            Some(Target::Task(id)) => self
                .planner
                .tasks()
                .iter()
                .find(|t| t.id == id)
                .map(|t| (Target::Task(id.clone()), ItemForm::from_task(t, self.planner.category_name(&t.category)))),
            None => None,
        };
        match form {
            Some((target, form)) => {
                self.status = format!("Editing {}", target.id());
                self.mode = Mode::Editing { target, form };
            }
            None => self.status = "Nothing selected to edit".into(),
        }
    }

    fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.status = format!("Switched to {} view", screen.label());
        }
        self.ensure_task_bounds();
        self.ensure_agenda_bounds();
    }

    fn set_calendar_view(&mut self, view: CalendarView) {
        self.calendar_view = view;
        self.status = format!("{} view", view.label());
        self.ensure_agenda_bounds();
    }

    fn step(&mut self, step: Step) {
        self.cursor = navigate(self.cursor, self.calendar_view, step);
        self.agenda_idx = 0;
    }

    fn shift_cursor(&mut self, days: i64) {
        if let Some(date) = self.cursor.checked_add_signed(ChronoDuration::days(days)) {
            self.cursor = date;
            self.agenda_idx = 0;
        }
    }

    fn browses_agenda(&self) -> bool {
        self.focus == CalendarFocus::Agenda || self.calendar_view == CalendarView::Day
    }

    /// Next full hour when the cursor is today, otherwise 09:00 on the cursor day.
    fn suggested_start(&self) -> DateTime<Utc> {
        let now = self.planner.now_local();
        if self.cursor == now.date_naive() {
            let next_hour = now.hour() + 1;
            if next_hour < calendar::HOURS_PER_DAY {
                if let Some(time) = NaiveTime::from_hms_opt(next_hour, 0, 0) {
                    return at_local(self.cursor, time);
                }
            }
        }
        at_local(self.cursor, NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN))
    }

    fn default_category(&self, for_events: bool) -> String {
        let categories = if for_events {
            query::categories_for_events(self.planner.categories())
        } else {
            query::categories_for_tasks(self.planner.categories())
        };
        categories
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    fn agenda(&self) -> Vec<&Event> {
        query::agenda(self.planner.events(), self.cursor, &Local)
    }

    fn visible_tasks(&self) -> Vec<&Task> {
        let now = self.planner.now_local();
        query::task_view(self.planner.tasks(), self.task_view, self.task_sort, &now)
    }

    fn selected_event(&self) -> Option<&Event> {
        self.agenda().get(self.agenda_idx).copied()
    }

    fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.task_idx).copied()
    }

    fn selected_target(&self) -> Option<Target> {
        match self.screen {
            Screen::Calendar => self.selected_event().map(|e| Target::Event(e.id.clone())),
            Screen::Tasks => self.selected_task().map(|t| Target::Task(t.id.clone())),
        }
    }

    fn ensure_agenda_bounds(&mut self) {
        let len = self.agenda().len();
        self.agenda_idx = self.agenda_idx.min(len.saturating_sub(1));
    }

    fn ensure_task_bounds(&mut self) {
        let len = self.visible_tasks().len();
        self.task_idx = self.task_idx.min(len.saturating_sub(1));
        self.task_offset = self.task_offset.min(len.saturating_sub(1));
    }

    fn saved(&mut self, message: String) {
        info!(%message, "tui change saved");
        self.last_save = Instant::now();
        self.status = message;
        self.ensure_agenda_bounds();
        self.ensure_task_bounds();
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        match self.screen {
            Screen::Calendar => self.draw_calendar(f, layout[1]),
            Screen::Tasks => self.draw_tasks(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Creating(form) => self.draw_form(f, form.title(false), form),
            Mode::Editing { form, .. } => self.draw_form(f, form.title(true), form),
            Mode::ConfirmDelete { target } => self.draw_confirm(f, target),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let view = match self.screen {
            Screen::Calendar => format!("{} {}", self.screen.label(), self.calendar_view.label()),
            Screen::Tasks => format!("{} {}", self.screen.label(), self.task_view.label()),
        };
        let title = Line::from(vec![
            Span::styled(
                "planner ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.planner.today().format("%a %b %-d, %Y").to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(self.location.scope.label(), Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.dir.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(view, Style::default().fg(Color::Magenta)),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let sections = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        let focused = self.focus == CalendarFocus::Grid;
        match self.calendar_view {
            CalendarView::Month => self.draw_month(f, sections[0], focused),
            CalendarView::Week => self.draw_week(f, sections[0], focused),
            CalendarView::Day => self.draw_day(f, sections[0], focused),
        }
        self.draw_agenda(f, sections[1], self.browses_agenda());
    }

    fn visible_day(&self, date: NaiveDate) -> bool {
        self.planner.settings().show_weekends || !calendar::is_weekend(date)
    }

    fn draw_month(&self, f: &mut ratatui::Frame<'_>, area: Rect, focused: bool) {
        let settings = self.planner.settings();
        let now = self.planner.now_local();
        let grid = month_grid(self.cursor, settings.week_starts_on);
        let columns = grid
            .iter()
            .take(calendar::WEEK_DAYS)
            .filter(|d| self.visible_day(d.date))
            .count()
            .max(1);
        let cell = (area.width.saturating_sub(2) as usize / columns).max(6);

        let mut lines = Vec::new();
        let headings: Vec<Span<'static>> = weekday_labels(settings.week_starts_on)
            .iter()
            .zip(&grid)
            .filter(|(_, day)| self.visible_day(day.date))
            .map(|(label, _)| {
                Span::styled(format!("{:^cell$}", label), Style::default().fg(Color::Gray))
            })
            .collect();
        lines.push(Line::from(headings));

        for row in grid.chunks(calendar::WEEK_DAYS) {
            let mut numbers = Vec::new();
            let mut details = Vec::new();
            for day in row.iter().filter(|d| self.visible_day(d.date)) {
                let events = query::events_on_day(self.planner.events(), day.date, &Local);
                let mut style = Style::default().fg(if !day.in_month {
                    Color::DarkGray
                } else if events.is_empty() {
                    Color::Gray
                } else {
                    Color::LightYellow
                });
                if is_today(day.date, &now) {
                    style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
                }
                if day.date == self.cursor {
                    style = style
                        .bg(if focused { Color::Cyan } else { Color::Blue })
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD);
                }
                numbers.push(Span::styled(
                    format!("{:^cell$}", day.date.format("%-d").to_string()),
                    style,
                ));
                let detail = match events.as_slice() {
                    [] => String::new(),
                    [only] => truncate_text(&only.title, cell.saturating_sub(1)),
                    many => format!("{} events", many.len()),
                };
                details.push(Span::styled(
                    format!("{:^cell$}", detail),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            lines.push(Line::from(numbers));
            lines.push(Line::from(details));
        }

        let paragraph = Paragraph::new(lines).block(panel(
            self.cursor.format("%B %Y").to_string(),
            focused,
        ));
        f.render_widget(paragraph, area);
    }

    fn draw_week(&self, f: &mut ratatui::Frame<'_>, area: Rect, focused: bool) {
        let settings = self.planner.settings();
        let now = self.planner.now_local();
        let days: Vec<NaiveDate> = week_grid(self.cursor, settings.week_starts_on)
            .into_iter()
            .filter(|d| self.visible_day(*d))
            .collect();
        let block = panel(
            format!(
                "Week of {}",
                days.first().unwrap_or(&self.cursor).format("%b %-d")
            ),
            focused,
        );
        let inner = block.inner(area);
        f.render_widget(block, area);
        if days.is_empty() {
            return;
        }
        let constraints: Vec<Constraint> = days
            .iter()
            .map(|_| Constraint::Ratio(1, days.len() as u32))
            .collect();
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(inner);
        for (idx, day) in days.iter().enumerate() {
            let width = columns[idx].width.saturating_sub(1) as usize;
            let mut heading = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
            if is_today(*day, &now) {
                heading = heading.fg(Color::LightYellow);
            }
            if *day == self.cursor {
                heading = heading
                    .bg(if focused { Color::Cyan } else { Color::Blue })
                    .fg(Color::Black);
            }
            let mut lines = vec![Line::from(Span::styled(
                truncate_text(&day.format("%a %-d").to_string(), width),
                heading,
            ))];
            for event in query::agenda(self.planner.events(), *day, &Local) {
                lines.push(Line::from(Span::styled(
                    truncate_text(
                        &format!(
                            "{} {}",
                            format_time(&event.start_date.with_timezone(&Local), settings.time_format),
                            event.title
                        ),
                        width,
                    ),
                    Style::default().fg(hex_color(&event.color)),
                )));
            }
            f.render_widget(Paragraph::new(lines), columns[idx]);
        }
    }

    fn draw_day(&self, f: &mut ratatui::Frame<'_>, area: Rect, focused: bool) {
        let settings = self.planner.settings();
        let agenda = self.agenda();
        let selected = self.selected_event().map(|e| e.id.as_str());
        let mut lines = Vec::new();
        for slot in calendar::day_slots(self.cursor) {
            let minute = slot.hour() * 60;
            let label = format_time(
                &at_local(self.cursor, slot.time()).with_timezone(&Local),
                settings.time_format,
            );
            let label_style = Style::default().fg(if calendar::is_business_hour(slot) {
                Color::Gray
            } else {
                Color::DarkGray
            });
            let mut spans = vec![Span::styled(format!("{:>8} │ ", label), label_style)];
            for event in agenda.iter().filter(|e| {
                event_block(e, self.cursor, &Local).is_some_and(|b| {
                    b.top_minutes < minute + 60 && b.top_minutes + b.height_minutes > minute
                })
            }) {
                let mut style = Style::default().fg(hex_color(&event.color));
                if Some(event.id.as_str()) == selected {
                    style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                }
                spans.push(Span::styled(format!("{} ", event.title), style));
            }
            lines.push(Line::from(spans));
        }
        let scroll = calendar::HOURS_PER_DAY
            .saturating_sub(area.height.saturating_sub(2) as u32)
            .min(7) as u16;
        let paragraph = Paragraph::new(lines)
            .scroll((scroll, 0))
            .block(panel(self.cursor.format("%A, %B %-d").to_string(), focused));
        f.render_widget(paragraph, area);
    }

    fn draw_agenda(&self, f: &mut ratatui::Frame<'_>, area: Rect, focused: bool) {
        let settings = self.planner.settings();
        let today = self.planner.today();
        let agenda = self.agenda();
        let mut items: Vec<ListItem> = agenda
            .iter()
            .map(|event| agenda_item(event, self.planner.category_name(&event.category), settings))
            .collect();
        let due = query::tasks_due_on(self.planner.tasks(), self.cursor, &Local);
        if items.is_empty() {
            items.push(ListItem::new("No events"));
        }
        if !due.is_empty() {
            items.push(ListItem::new(Line::from(Span::styled(
                "Tasks due",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))));
            for task in due {
                let mark = if task.completed { "[x]" } else { "[ ]" };
                items.push(ListItem::new(format!("{} {}", mark, task.title)));
            }
        }
        let mut state = ListState::default();
        if focused && !agenda.is_empty() {
            state.select(Some(self.agenda_idx));
        }
        let title = relative_date(self.cursor, today);
        let list = List::new(items)
            .block(panel(title, focused))
            .highlight_style(
                Style::default()
                    .bg(Color::LightCyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_tasks(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        self.ensure_task_bounds();
        let sections = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        let now = self.planner.now_local();
        let tasks = self.visible_tasks();
        let viewport = sections[0].height.saturating_sub(2) as usize;
        let offset = adjust_offset(self.task_idx, self.task_offset, viewport, 1, tasks.len());
        let mut state = ListState::default();
        *state.offset_mut() = offset;
        if !tasks.is_empty() {
            state.select(Some(self.task_idx));
        }
        let items = if tasks.is_empty() {
            vec![ListItem::new("No tasks")]
        } else {
            tasks
                .iter()
                .map(|task| {
                    task_item(
                        task,
                        self.planner.category_name(&task.category),
                        &now,
                        self.planner.settings(),
                    )
                })
                .collect()
        };
        let title = format!(
            "Tasks: {} ({}) by {}",
            self.task_view.label(),
            tasks.len(),
            self.task_sort.label()
        );
        let list = List::new(items).block(panel(title, true)).highlight_style(
            Style::default()
                .bg(Color::LightCyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, sections[0], &mut state);

        let stats = query::task_stats(self.planner.tasks(), &now);
        let lines = vec![
            Line::from(format!("Total       {}", stats.total)),
            Line::from(format!("Completed   {}", stats.completed)),
            Line::from(format!("Pending     {}", stats.pending)),
            Line::from(Span::styled(
                format!("Overdue     {}", stats.overdue),
                Style::default().fg(if stats.overdue > 0 {
                    Color::LightRed
                } else {
                    Color::Gray
                }),
            )),
            Line::from(format!("Due today   {}", stats.due_today)),
            Line::from(""),
            Line::from(Span::styled(
                format!("{}% complete", stats.completion_rate),
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        f.render_widget(Paragraph::new(lines).block(panel("Stats".into(), false)), sections[1]);
        self.task_offset = offset;
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let detail = Paragraph::new(self.detail_line())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title("Selected"),
            );
        f.render_widget(detail, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str, color: Color| Span::styled(k, Style::default().fg(color));
        let mut spans = vec![
            key("1", Color::LightCyan),
            Span::raw(" calendar  "),
            key("2", Color::LightCyan),
            Span::raw(" tasks  "),
        ];
        match self.screen {
            Screen::Calendar => spans.extend([
                key("m/w/d", Color::LightCyan),
                Span::raw(" view  "),
                key("[ ]", Color::LightCyan),
                Span::raw(" prev/next  "),
                key("t", Color::LightCyan),
                Span::raw(" today  "),
                key("Tab", Color::LightCyan),
                Span::raw(" agenda  "),
                key("n", Color::LightMagenta),
                Span::raw(" event  "),
                key("N", Color::LightMagenta),
                Span::raw(" task  "),
            ]),
            Screen::Tasks => spans.extend([
                key("↑↓", Color::LightCyan),
                Span::raw(" browse  "),
                key("space", Color::LightGreen),
                Span::raw(" done  "),
                key("f", Color::LightCyan),
                Span::raw(" filter  "),
                key("s", Color::LightCyan),
                Span::raw(" sort  "),
                key("n", Color::LightMagenta),
                Span::raw(" new  "),
            ]),
        }
        spans.extend([
            key("e", Color::LightYellow),
            Span::raw(" edit  "),
            key("x", Color::LightRed),
            Span::raw(" delete  "),
            key("q", Color::LightRed),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }

    fn detail_line(&self) -> Line<'static> {
        let tf = self.planner.settings().time_format;
        match self.screen {
            Screen::Calendar => match self.selected_event() {
                Some(event) => {
                    let mut spans = vec![
                        Span::styled(
                            event.title.clone(),
                            Style::default()
                                .fg(Color::Yellow)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::raw("  "),
                        Span::styled(
                            format!(
                                "{}-{}",
                                format_time(&event.start_date.with_timezone(&Local), tf),
                                format_time(&event.end_date.with_timezone(&Local), tf)
                            ),
                            Style::default().fg(Color::LightRed),
                        ),
                    ];
                    if let Some(pattern) = &event.recurring_pattern {
                        spans.push(Span::raw(format!("  repeats {}", pattern.kind.label())));
                    }
                    if let Some(desc) = &event.description {
                        spans.push(Span::styled(
                            format!("  {}", desc),
                            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
                        ));
                    }
                    Line::from(spans)
                }
                None => Line::from("No event selected"),
            },
            Screen::Tasks => match self.selected_task() {
                Some(task) => {
                    let mut spans = vec![Span::styled(
                        task.title.clone(),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )];
                    if let Some(desc) = &task.description {
                        spans.push(Span::styled(
                            format!("  {}", desc),
                            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
                        ));
                    }
                    Line::from(spans)
                }
                None => Line::from("No task selected"),
            },
        }
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, title: &str, form: &ItemForm) {
        let area = centered_rect(70, 60, f.size());
        let mut lines = Vec::new();
        for (idx, (field, value)) in form.fields.iter().enumerate() {
            lines.push(field_line(field.label(), value, idx == form.active));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "Categories: {}",
                self.planner
                    .categories()
                    .iter()
                    .filter(|c| match form.kind {
                        FormKind::Event => c.kind.applies_to_events(),
                        FormKind::Task => c.kind.applies_to_tasks(),
                    })
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(Span::styled(
            "Enter to save • Esc to cancel • Tab/Shift-Tab to move",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, target: &Target) {
        let area = centered_rect(50, 30, f.size());
        let title = match target {
            Target::Event(id) => self
                .planner
                .events()
                .iter()
                .find(|e| &e.id == id)
                .map(|e| e.title.clone()),
            Target::Task(id) => self
                .planner
                .tasks()
                .iter()
                .find(|t| &t.id == id)
                .map(|t| t.title.clone()),
        }
        .unwrap_or_else(|| target.id().to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", title),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

/// Builds an event draft from the form. A blank end means start plus the
/// default duration; a blank category means the first one that takes events.
fn event_draft(form: &ItemForm, categories: &[Category], settings: &AppSettings) -> Result<NewEvent> {
    let start = parse_local(form.value(FormField::Start))?;
    let end = match form.value(FormField::End) {
        "" => start + ChronoDuration::minutes(settings.default_event_duration as i64),
        raw => parse_local(raw)?,
    };
    let category = pick_category(categories, form.value(FormField::Category), true)?;
    let draft = NewEvent {
        title: form.value(FormField::Title).to_string(),
        description: non_empty(form.value(FormField::Description)),
        start_date: start,
        end_date: end,
        color: category_color(categories, &category),
        category,
        recurring_pattern: None,
    };
    draft.validate()?;
    Ok(draft)
}

fn task_draft(form: &ItemForm, categories: &[Category]) -> Result<NewTask> {
    let due_date = match form.value(FormField::Due) {
        "" => None,
        raw => Some(parse_local(raw)?),
    };
    let priority = match form.value(FormField::Priority) {
        "" => Priority::Medium,
        raw => raw.parse()?,
    };
    let category = pick_category(categories, form.value(FormField::Category), false)?;
    let draft = NewTask {
        title: form.value(FormField::Title).to_string(),
        description: non_empty(form.value(FormField::Description)),
        due_date,
        priority,
        color: category_color(categories, &category),
        category,
    };
    draft.validate()?;
    Ok(draft)
}

/// Matches a category by name (any case) or by id prefix.
fn pick_category(categories: &[Category], input: &str, for_events: bool) -> Result<String> {
    if input.is_empty() {
        let fallback = if for_events {
            query::categories_for_events(categories)
        } else {
            query::categories_for_tasks(categories)
        };
        return Ok(fallback.first().map(|c| c.id.clone()).unwrap_or_default());
    }
    if let Some(found) = categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(input))
    {
        return Ok(found.id.clone());
    }
    Ok(resolve(categories, input, "category")?.id.clone())
}

fn category_color(categories: &[Category], id: &str) -> String {
    query::find_category(categories, id)
        .map(|c| c.color.clone())
        .unwrap_or_else(|| DEFAULT_COLORS[0].to_string())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn at_local(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    match date.and_time(time).and_local_timezone(Local).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => {
            warn!(%date, %time, "local time does not exist; using the start of the day");
            calendar::start_of_day(date, &Local)
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

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

fn panel(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(if focused { Color::Cyan } else { Color::Gray })
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
}

/// `#rrggbb` to a terminal color; anything else falls back to white.
fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Color::White;
    }
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::White,
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => Color::LightYellow,
        Priority::Low => Color::LightGreen,
    }
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

fn agenda_item(event: &Event, category: &str, settings: &AppSettings) -> ListItem<'static> {
    let start = event.start_date.with_timezone(&Local);
    let end = event.end_date.with_timezone(&Local);
    let spans = vec![
        Span::styled("█ ", Style::default().fg(hex_color(&event.color))),
        Span::styled(
            format!(
                "{}-{} ",
                format_time(&start, settings.time_format),
                format_time(&end, settings.time_format)
            ),
            Style::default().fg(Color::LightYellow),
        ),
        Span::styled(
            truncate_text(&event.title, 32),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", category), Style::default().fg(Color::DarkGray)),
    ];
    ListItem::new(Line::from(spans))
}

fn task_item(
    task: &Task,
    category: &str,
    now: &DateTime<Local>,
    settings: &AppSettings,
) -> ListItem<'static> {
    let mark = if task.completed { "[x] " } else { "[ ] " };
    let mut title_style = Style::default().fg(Color::White);
    if task.completed {
        title_style = title_style
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT);
    }
    let mut spans = vec![
        Span::raw(mark),
        Span::styled(
            format!("{:<6} ", task.priority.label()),
            Style::default().fg(priority_color(task.priority)),
        ),
        Span::styled(truncate_text(&task.title, 40), title_style),
    ];
    if let Some(due) = task.due_date {
        let due = due.with_timezone(&Local);
        let overdue = query::is_overdue(task, now);
        spans.push(Span::styled(
            format!(
                "  {} {}",
                relative_date(due.date_naive(), now.date_naive()),
                format_time(&due, settings.time_format)
            ),
            Style::default().fg(if overdue {
                Color::LightRed
            } else {
                Color::LightYellow
            }),
        ));
    }
    spans.push(Span::styled(
        format!("  {}", category),
        Style::default().fg(hex_color(&task.color)),
    ));
    ListItem::new(Line::from(spans))
}

fn field_line(label: &str, field: &FieldValue, active: bool) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(text, value_style),
    ])
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use planner::model::{default_categories, CategoryKind};

    fn categories() -> Vec<Category> {
        default_categories(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn event_form(title: &str, start: &str, end: &str, category: &str) -> ItemForm {
        ItemForm::build(
            FormKind::Event,
            [
                (FormField::Title, title.to_string()),
                (FormField::Description, String::new()),
                (FormField::Start, start.to_string()),
                (FormField::End, end.to_string()),
                (FormField::Category, category.to_string()),
            ],
        )
    }

    #[test]
    fn field_editing_handles_multibyte_text() {
        let mut field = FieldValue::new("café");
        field.backspace();
        assert_eq!(field.value, "caf");
        field.home();
        field.insert_char('é');
        assert_eq!(field.value, "écaf");
        field.move_right();
        field.move_left();
        field.move_left();
        assert_eq!(field.cursor, 0);
        field.end();
        assert_eq!(field.with_caret(), "écaf▌");
    }

    #[test]
    fn event_form_fills_end_and_color_from_defaults() {
        let settings = AppSettings::default();
        let form = event_form("Lunch", "2024.05.02@12:00", "", "health");
        let draft = event_draft(&form, &categories(), &settings).unwrap();
        assert_eq!(draft.category, "default_2");
        assert_eq!(draft.color, "#ef4444");
        assert_eq!(
            draft.end_date - draft.start_date,
            ChronoDuration::minutes(settings.default_event_duration as i64)
        );
    }

    #[test]
    fn event_form_rejects_bad_input() {
        let settings = AppSettings::default();
        let cats = categories();
        assert!(event_draft(&event_form("", "2024.05.02@12:00", "", ""), &cats, &settings).is_err());
        assert!(event_draft(
            &event_form("Late", "2024.05.02@12:00", "2024.05.02@11:00", ""),
            &cats,
            &settings
        )
        .is_err());
        assert!(event_draft(&event_form("Odd", "tomorrow", "", ""), &cats, &settings).is_err());
        assert!(event_draft(&event_form("Who", "2024.05.02@12:00", "", "Nope"), &cats, &settings).is_err());
    }

    #[test]
    fn task_form_defaults_to_a_task_category() {
        let mut form = ItemForm::new_task(None, "");
        form.fields[0].1 = FieldValue::new("Buy milk");
        let draft = task_draft(&form, &categories()).unwrap();
        assert_eq!(draft.priority, Priority::Medium);
        assert!(draft.due_date.is_none());
        let category = categories()
            .into_iter()
            .find(|c| c.id == draft.category)
            .unwrap();
        assert!(category.kind.applies_to_tasks());
        assert_ne!(category.kind, CategoryKind::Event);
    }

    #[test]
    fn offsets_follow_the_selection() {
        assert_eq!(adjust_offset(0, 0, 5, 1, 20), 0);
        assert_eq!(adjust_offset(10, 0, 5, 1, 20), 7);
        assert_eq!(adjust_offset(19, 7, 5, 1, 20), 15);
        assert_eq!(adjust_offset(3, 0, 0, 1, 20), 0);
    }

    #[test]
    fn text_and_colors() {
        assert_eq!(truncate_text("Quarterly planning", 10), "Quarter...");
        assert_eq!(truncate_text("Short", 10), "Short");
        assert_eq!(hex_color("#10b981"), Color::Rgb(16, 185, 129));
        assert_eq!(hex_color("teal"), Color::White);
    }

    #[test]
    fn non_ascii_colors_fall_back_to_white() {
        assert_eq!(hex_color("#aébcd"), Color::White);
        assert_eq!(hex_color("ééé"), Color::White);
        assert_eq!(hex_color("#12345g"), Color::White);
    }
}
