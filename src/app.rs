use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use grocery_list::suggest::suggest;
use grocery_list::{
    categorize, group_by_category, Category, GroceryStore, Item, ItemDraft, ItemPatch,
    KeyValueStore, ListStats,
};

use crate::theme::Theme;

pub struct App<S> {
    pub store: GroceryStore<S>,
    pub theme: Theme,
    pub title: String,
    pub current_index: usize,
    /// Item ids in on-screen order.
    pub item_order: Vec<String>,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub active_popup: Option<PopupState>,
    dirty: Rc<Cell<bool>>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(mut store: GroceryStore<S>) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        store.subscribe(move |_| flag.set(true));
        let mut app = App {
            theme: Theme::for_mode(store.theme()),
            store,
            title: "Grocery List".into(),
            current_index: 0,
            item_order: Vec::new(),
            should_quit: false,
            status_message: None,
            active_popup: None,
            dirty,
        };
        app.refresh();
        app
    }

    /// Re-derives the display order after the store reported a change.
    pub fn refresh(&mut self) {
        if !self.dirty.replace(false) {
            return;
        }
        self.theme = Theme::for_mode(self.store.theme());
        self.item_order = group_by_category(self.store.items())
            .iter()
            .flat_map(|group| group.iter().map(|item| item.id.clone()))
            .collect();
        if self.current_index >= self.item_order.len() {
            self.current_index = self.item_order.len().saturating_sub(1);
        }
    }

    pub fn stats(&self) -> ListStats {
        ListStats::from_items(self.store.items())
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.item_order
            .get(self.current_index)
            .and_then(|id| self.store.get(id))
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.active_popup.is_some() {
            self.handle_popup_key(key);
        } else {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Up | KeyCode::Char('k') => self.move_selection_up(),
                KeyCode::Down | KeyCode::Char('j') => self.move_selection_down(),
                KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
                KeyCode::Char('n') => self.open_item_form(None),
                KeyCode::Char('e') => {
                    let target = self.selected_item().map(|item| item.id.clone());
                    if target.is_some() {
                        self.open_item_form(target);
                    }
                }
                KeyCode::Char('d') => self.delete_selected_item(),
                KeyCode::Char('c') => self.clear_completed(),
                KeyCode::Char('t') => {
                    let mode = self.store.toggle_theme();
                    self.set_status(Some(format!("Switched to {} mode", mode.as_str())));
                }
                KeyCode::Char('i') => self.show_info_popup(),
                _ => {}
            }
        }
        self.refresh();
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        let result = match self.active_popup.as_mut() {
            Some(PopupState::Info(_)) => match key.code {
                KeyCode::Esc | KeyCode::Enter => PopupResult::Close(None),
                _ => PopupResult::None,
            },
            Some(PopupState::ItemForm(form)) => match form.handle_key(key) {
                ItemFormKeyResult::Continue => PopupResult::None,
                ItemFormKeyResult::Cancel => PopupResult::Close(Some("Edit cancelled".into())),
                ItemFormKeyResult::Submit(data) => PopupResult::ItemSubmit(data),
            },
            None => PopupResult::None,
        };
        match result {
            PopupResult::None => {}
            PopupResult::Close(status) => {
                self.active_popup = None;
                if let Some(msg) = status {
                    self.set_status(Some(msg));
                }
            }
            PopupResult::ItemSubmit(data) => match self.apply_item_form_input(data) {
                Ok(msg) => {
                    self.active_popup = None;
                    self.set_status(Some(msg));
                }
                Err(err_msg) => {
                    if let Some(PopupState::ItemForm(form)) = self.active_popup.as_mut() {
                        form.error = Some(err_msg);
                    }
                }
            },
        }
    }

    fn move_selection_up(&mut self) {
        if self.item_order.is_empty() {
            return;
        }
        if self.current_index == 0 {
            self.current_index = self.item_order.len() - 1;
        } else {
            self.current_index -= 1;
        }
    }

    fn move_selection_down(&mut self) {
        if self.item_order.is_empty() {
            return;
        }
        self.current_index = (self.current_index + 1) % self.item_order.len();
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.item_order.get(self.current_index).cloned() else {
            return;
        };
        match self.store.toggle_completed(&id) {
            Ok(completed) => {
                let verb = if completed { "Checked off" } else { "Unchecked" };
                let name = self.store.get(&id).map(|item| item.name.clone()).unwrap_or_default();
                self.set_status(Some(format!("{verb} {name}")));
                // Keep the cursor on the item as it moves within its group
                self.dirty.set(true);
                self.refresh();
                if let Some(position) = self.item_order.iter().position(|entry| *entry == id) {
                    self.current_index = position;
                }
            }
            Err(err) => self.set_status(Some(err.to_string())),
        }
    }

    fn delete_selected_item(&mut self) {
        let Some(id) = self.item_order.get(self.current_index).cloned() else {
            return;
        };
        match self.store.delete(&id) {
            Ok(item) => self.set_status(Some(format!("Deleted {}", item.name))),
            Err(err) => self.set_status(Some(err.to_string())),
        }
    }

    fn clear_completed(&mut self) {
        if self.stats().completed == 0 {
            self.set_status(Some("No completed items to clear".into()));
            return;
        }
        let removed = self.store.clear_completed();
        self.set_status(Some(format!("Cleared {removed} completed item(s)")));
    }

    fn show_info_popup(&mut self) {
        if let Some(item) = self.selected_item() {
            let popup = InfoPopup {
                name: item.name.clone(),
                quantity: item.quantity.clone(),
                category: item.category,
                notes: item.notes.clone(),
                added: item
                    .created_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
                completed: item.completed,
            };
            self.active_popup = Some(PopupState::Info(popup));
        }
    }

    pub fn open_item_form(&mut self, target: Option<String>) {
        let form = match target.as_deref().and_then(|id| self.store.get(id)) {
            Some(item) => ItemFormState::edit(item),
            None => ItemFormState::new(),
        };
        self.active_popup = Some(PopupState::ItemForm(form));
    }

    fn apply_item_form_input(&mut self, input: ItemFormInput) -> Result<String, String> {
        match input.target {
            Some(id) => {
                let category = input
                    .category
                    .unwrap_or_else(|| categorize(input.name.trim()));
                let patch = ItemPatch {
                    name: Some(input.name),
                    quantity: Some(input.quantity),
                    notes: Some(input.notes),
                    category: Some(category),
                    completed: None,
                };
                self.store
                    .update(&id, patch)
                    .map(|item| format!("Updated {}", item.name))
                    .map_err(|err| err.to_string())
            }
            None => {
                let draft = ItemDraft {
                    name: input.name,
                    quantity: input.quantity,
                    notes: input.notes,
                    category: input.category,
                };
                self.store
                    .add(draft)
                    .map(|item| format!("Added {} to {}", item.name, item.category))
                    .map_err(|err| err.to_string())
            }
        }
    }

    pub fn set_status(&mut self, message: Option<String>) {
        self.status_message = message;
    }

    pub fn status_text(&self) -> String {
        let total = self.item_order.len();
        let current = if total == 0 {
            0
        } else {
            self.current_index + 1
        };
        let mut text = format!("Item {}/{} | Theme: {}", current, total, self.theme.name);
        if let Some(msg) = &self.status_message {
            text.push_str(" | ");
            text.push_str(msg);
        }
        text
    }
}

pub struct InfoPopup {
    pub name: String,
    pub quantity: String,
    pub category: Category,
    pub notes: String,
    pub added: String,
    pub completed: bool,
}

pub enum PopupState {
    Info(InfoPopup),
    ItemForm(ItemFormState),
}

enum PopupResult {
    None,
    Close(Option<String>),
    ItemSubmit(ItemFormInput),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ItemField {
    Name,
    Quantity,
    Category,
    Notes,
}

pub struct ItemFormState {
    pub target: Option<String>,
    pub name: String,
    pub quantity: String,
    pub notes: String,
    /// `None` means categorize from the name on save.
    pub category: Option<Category>,
    pub selected_field: ItemField,
    pub suggestion_index: Option<usize>,
    pub show_suggestions: bool,
    pub error: Option<String>,
    pub mode_label: &'static str,
}

#[derive(Clone, Debug)]
pub struct ItemFormInput {
    pub target: Option<String>,
    pub name: String,
    pub quantity: String,
    pub notes: String,
    pub category: Option<Category>,
}

#[derive(Debug)]
pub enum ItemFormKeyResult {
    Continue,
    Cancel,
    Submit(ItemFormInput),
}

impl ItemFormState {
    pub fn new() -> Self {
        Self {
            target: None,
            name: String::new(),
            quantity: String::new(),
            notes: String::new(),
            category: None,
            selected_field: ItemField::Name,
            suggestion_index: None,
            show_suggestions: false,
            error: None,
            mode_label: "Add New Item",
        }
    }

    pub fn edit(item: &Item) -> Self {
        Self {
            target: Some(item.id.clone()),
            name: item.name.clone(),
            quantity: item.quantity.clone(),
            notes: item.notes.clone(),
            category: Some(item.category),
            mode_label: "Edit Item",
            ..Self::new()
        }
    }

    /// Suggestions are offered only while typing a new item's name.
    pub fn suggestions(&self) -> Vec<&'static str> {
        if self.target.is_some() || !self.show_suggestions {
            return Vec::new();
        }
        suggest(&self.name)
    }

    pub fn category_display(&self) -> String {
        match self.category {
            Some(category) => format!("{} {}", category.icon(), category),
            None if self.name.trim().is_empty() => "Auto-categorize".to_string(),
            None => format!("Auto-categorize ({})", categorize(self.name.trim())),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ItemFormKeyResult {
        self.error = None;
        match key.code {
            KeyCode::Esc => ItemFormKeyResult::Cancel,
            KeyCode::Enter => {
                if self.accept_suggestion() {
                    ItemFormKeyResult::Continue
                } else {
                    ItemFormKeyResult::Submit(self.to_input())
                }
            }
            KeyCode::Tab => {
                self.next_field();
                ItemFormKeyResult::Continue
            }
            KeyCode::BackTab => {
                self.previous_field();
                ItemFormKeyResult::Continue
            }
            KeyCode::Down => {
                if !self.move_suggestion(true) {
                    self.next_field();
                }
                ItemFormKeyResult::Continue
            }
            KeyCode::Up => {
                if !self.move_suggestion(false) {
                    self.previous_field();
                }
                ItemFormKeyResult::Continue
            }
            KeyCode::Left if self.selected_field == ItemField::Category => {
                self.cycle_category(false);
                ItemFormKeyResult::Continue
            }
            KeyCode::Right if self.selected_field == ItemField::Category => {
                self.cycle_category(true);
                ItemFormKeyResult::Continue
            }
            KeyCode::Backspace => {
                if let Some(value) = self.active_value_mut() {
                    value.pop();
                }
                self.name_edited();
                ItemFormKeyResult::Continue
            }
            KeyCode::Delete => {
                if let Some(value) = self.active_value_mut() {
                    value.clear();
                }
                self.name_edited();
                ItemFormKeyResult::Continue
            }
            KeyCode::Char(c) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    if let Some(value) = self.active_value_mut() {
                        value.push(c);
                        self.name_edited();
                    }
                }
                ItemFormKeyResult::Continue
            }
            _ => ItemFormKeyResult::Continue,
        }
    }

    pub fn to_input(&self) -> ItemFormInput {
        ItemFormInput {
            target: self.target.clone(),
            name: self.name.clone(),
            quantity: self.quantity.clone(),
            notes: self.notes.clone(),
            category: self.category,
        }
    }

    fn name_edited(&mut self) {
        if self.selected_field == ItemField::Name {
            self.show_suggestions = !self.name.is_empty();
            self.suggestion_index = None;
        }
    }

    fn accept_suggestion(&mut self) -> bool {
        let Some(index) = self.suggestion_index else {
            return false;
        };
        let Some(choice) = self.suggestions().get(index).copied() else {
            return false;
        };
        self.name = choice.to_string();
        self.category = Some(categorize(choice));
        self.show_suggestions = false;
        self.suggestion_index = None;
        true
    }

    fn move_suggestion(&mut self, forward: bool) -> bool {
        if self.selected_field != ItemField::Name {
            return false;
        }
        let count = self.suggestions().len();
        if count == 0 {
            return false;
        }
        self.suggestion_index = match (self.suggestion_index, forward) {
            (None, true) => Some(0),
            (None, false) => Some(count - 1),
            (Some(idx), true) if idx + 1 < count => Some(idx + 1),
            (Some(idx), false) if idx > 0 => Some(idx - 1),
            _ => None,
        };
        true
    }

    fn cycle_category(&mut self, forward: bool) {
        // Slot 0 is auto-categorize, then Category::ALL in order
        let slots = Category::ALL.len() + 1;
        let current = self.category.map(|c| c.position() + 1).unwrap_or(0);
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };
        self.category = next.checked_sub(1).map(|idx| Category::ALL[idx]);
    }

    fn next_field(&mut self) {
        self.suggestion_index = None;
        self.selected_field = match self.selected_field {
            ItemField::Name => ItemField::Quantity,
            ItemField::Quantity => ItemField::Category,
            ItemField::Category => ItemField::Notes,
            ItemField::Notes => ItemField::Name,
        };
    }

    fn previous_field(&mut self) {
        self.suggestion_index = None;
        self.selected_field = match self.selected_field {
            ItemField::Name => ItemField::Notes,
            ItemField::Quantity => ItemField::Name,
            ItemField::Category => ItemField::Quantity,
            ItemField::Notes => ItemField::Category,
        };
    }

    fn active_value_mut(&mut self) -> Option<&mut String> {
        match self.selected_field {
            ItemField::Name => Some(&mut self.name),
            ItemField::Quantity => Some(&mut self.quantity),
            ItemField::Notes => Some(&mut self.notes),
            ItemField::Category => None,
        }
    }
}
