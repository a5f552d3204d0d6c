use super::app_state::AppMode;
use crate::content::ContentInbox;
use crate::engine::{SelectionEngine, TreeRow};
use crate::tree::NodeKind;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub struct TuiApp {
    pub(super) engine: SelectionEngine,
    inbox: ContentInbox,
    // visible rows, rebuilt from the engine after every intent
    pub(super) rows: Vec<TreeRow>,
    pub(super) current_selection_idx: usize,
    cursor_path: String,
    pub(super) scroll_offset: usize,
    pub(super) quit: bool,
    pub(super) confirmed: bool,
    pub(super) mode: AppMode,
    pub(super) filter_input: String,
    pub(super) filter_cursor_pos: usize,
    pub(super) list_viewport_height: usize,
}

impl TuiApp {
    pub fn new(engine: SelectionEngine, inbox: ContentInbox) -> Self {
        let mut app = TuiApp {
            engine,
            inbox,
            rows: Vec::new(),
            current_selection_idx: 0,
            cursor_path: String::new(),
            scroll_offset: 0,
            quit: false,
            confirmed: false,
            mode: AppMode::Normal,
            filter_input: String::new(),
            filter_cursor_pos: 0,
            list_viewport_height: 0, // Will be updated by ui_renderer
        };
        app.refresh_rows();
        app
    }

    pub(super) fn into_parts(self) -> (SelectionEngine, ContentInbox) {
        (self.engine, self.inbox)
    }

    pub(super) fn pump_content(&mut self) {
        for reply in self.inbox.drain() {
            self.engine.on_content(reply);
        }
    }

    /// Re-reads the visible rows and keeps the cursor on the same path, or on its
    /// nearest visible ancestor when that path disappeared.
    pub(super) fn refresh_rows(&mut self) {
        self.rows = self.engine.rows(&self.filter_input);
        let mut candidate = self.cursor_path.clone();
        loop {
            if let Some(idx) = self.rows.iter().position(|row| row.path == candidate) {
                self.current_selection_idx = idx;
                break;
            }
            match candidate.rfind('/') {
                Some(cut) => candidate.truncate(cut),
                None if !candidate.is_empty() => candidate.clear(),
                None => {
                    self.current_selection_idx = 0;
                    break;
                }
            }
        }
        if let Some(row) = self.rows.get(self.current_selection_idx) {
            self.cursor_path = row.path.clone();
        }
        self.ensure_selection_is_visible_in_viewport();
    }

    pub(super) fn current_row(&self) -> Option<&TreeRow> {
        self.rows.get(self.current_selection_idx)
    }

    pub(super) fn select_next_visible_item(&mut self) {
        self.move_selection_in_visible_list(1);
    }

    pub(super) fn select_previous_visible_item(&mut self) {
        self.move_selection_in_visible_list(-1);
    }

    pub(super) fn move_selection_in_visible_list(&mut self, delta: i32) {
        if self.rows.is_empty() {
            return;
        }
        let len = self.rows.len() as i32;
        let next = (self.current_selection_idx as i32 + delta).rem_euclid(len) as usize;
        self.current_selection_idx = next;
        self.cursor_path = self.rows[next].path.clone();
        self.ensure_selection_is_visible_in_viewport();
    }

    pub(super) fn toggle_current_item_selection(&mut self) {
        let Some(path) = self.current_row().map(|row| row.path.clone()) else {
            return;
        };
        self.engine.toggle_current(&path);
        self.refresh_rows();
    }

    fn visible_files(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|row| row.kind == NodeKind::File)
            .map(|row| row.path.clone())
            .collect()
    }

    pub(super) fn select_all_visible_items(&mut self) {
        for path in self.visible_files() {
            self.engine.toggle(&path, true);
        }
        self.refresh_rows();
    }

    // Directory rows would cascade into files the filter hides, so only file rows count.
    pub(super) fn deselect_all_visible_items(&mut self) {
        for path in self.visible_files() {
            self.engine.toggle(&path, false);
        }
        self.refresh_rows();
    }

    /// Forgets selected paths that no longer exist in the workspace.
    pub(super) fn drop_missing_files(&mut self) {
        for path in self.engine.stale_selection() {
            self.engine.remove_file(&path);
        }
        self.refresh_rows();
    }

    pub(super) fn set_current_expanded(&mut self, expanded: bool) {
        let Some(path) = self.current_row().map(|row| row.path.clone()) else {
            return;
        };
        self.engine.set_expanded(&path, expanded);
        self.refresh_rows();
    }

    pub(super) fn clear_selection(&mut self) {
        self.engine.clear_selection();
        self.refresh_rows();
    }

    pub(super) fn refresh_tree(&mut self) {
        self.engine.refresh_tree();
        self.refresh_rows();
    }

    pub(super) fn expand_all_directories(&mut self) {
        self.engine.expand_all();
        self.refresh_rows();
    }

    pub(super) fn collapse_all_directories(&mut self) {
        self.engine.collapse_all();
        self.refresh_rows();
    }

    pub(super) fn toggle_expansion_and_adjust_selection(&mut self) {
        let Some(path) = self.current_row().map(|row| row.path.clone()) else {
            return;
        };
        self.engine.toggle_expand(&path);
        self.refresh_rows();
    }

    pub(super) fn ensure_selection_is_visible_in_viewport(&mut self) {
        if self.rows.is_empty() || self.list_viewport_height == 0 {
            self.scroll_offset = 0;
            return;
        }
        let list_height = self.list_viewport_height;
        let pos = self.current_selection_idx;
        if pos < self.scroll_offset {
            self.scroll_offset = pos;
        } else if pos >= self.scroll_offset + list_height {
            self.scroll_offset = pos.saturating_sub(list_height - 1);
        }

        let num_visible_items = self.rows.len();
        if num_visible_items <= list_height {
            self.scroll_offset = 0;
        } else {
            self.scroll_offset = self.scroll_offset.min(num_visible_items - list_height);
        }
    }

    // --- Event handling sub-methods ---
    pub(super) fn handle_normal_mode_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('/') => {
                self.mode = AppMode::Filtering;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('y') => {
                self.confirmed = true;
                self.quit = true;
            }
            KeyCode::Down | KeyCode::Char('j') => self.select_next_visible_item(),
            KeyCode::Up | KeyCode::Char('k') => self.select_previous_visible_item(),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current_item_selection(),
            KeyCode::Char('o') | KeyCode::Tab => self.toggle_expansion_and_adjust_selection(),
            KeyCode::Right | KeyCode::Char('l') => self.set_current_expanded(true),
            KeyCode::Left | KeyCode::Char('h') => self.set_current_expanded(false),
            KeyCode::Char('x') => self.drop_missing_files(),
            KeyCode::Char('*') => self.expand_all_directories(),
            KeyCode::Char('-') => self.collapse_all_directories(),
            KeyCode::Char('r') => self.refresh_tree(),
            KeyCode::Char('c') => self.clear_selection(),
            KeyCode::Char('a') => {
                if key_event.modifiers.is_empty() || key_event.modifiers == KeyModifiers::CONTROL {
                    self.select_all_visible_items();
                }
            }
            KeyCode::Char('d') => {
                if key_event.modifiers.is_empty() {
                    self.deselect_all_visible_items();
                }
            }
            _ => {}
        }
    }

    pub(super) fn handle_filtering_mode_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Enter => {
                self.mode = AppMode::Normal;
                self.refresh_rows();
            }
            KeyCode::Esc => {
                self.mode = AppMode::Normal;
                self.filter_input.clear();
                self.filter_cursor_pos = 0;
                self.refresh_rows();
            }
            KeyCode::Char(c) => {
                self.filter_input.insert(self.filter_cursor_pos, c);
                self.filter_cursor_pos += c.len_utf8();
                self.refresh_rows();
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.filter_input[..self.filter_cursor_pos].chars().next_back() {
                    self.filter_cursor_pos -= prev.len_utf8();
                    self.filter_input.remove(self.filter_cursor_pos);
                    self.refresh_rows();
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.filter_input[..self.filter_cursor_pos].chars().next_back() {
                    self.filter_cursor_pos -= prev.len_utf8();
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.filter_input[self.filter_cursor_pos..].chars().next() {
                    self.filter_cursor_pos += next.len_utf8();
                }
            }
            _ => {}
        }
    }
}
