use std::fmt;

/// Called with the selected options, in option order, after every change.
pub type SelectionListener = Box<dyn FnMut(&[String])>;

// ---------------------------------------------------------------------------
// MultiSelect: which options are selected, and who to tell
// ---------------------------------------------------------------------------

/// Multi-select control state owned by the caller's UI.
///
/// The UI reports user actions through [`toggle`](Self::toggle),
/// [`select_all`](Self::select_all) and friends; every action that actually
/// changes the selection runs the registered listeners synchronously.
pub struct MultiSelect {
    options: Vec<String>,
    selected: Vec<bool>,
    listeners: Vec<SelectionListener>,
}

impl fmt::Debug for MultiSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiSelect")
            .field("options", &self.options)
            .field("selected", &self.selected())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MultiSelect {
    /// A control over `options` with nothing selected.
    pub fn new(options: Vec<String>) -> Self {
        let selected = vec![false; options.len()];
        Self {
            options,
            selected,
            listeners: Vec::new(),
        }
    }

    /// A control over `options` with everything selected.
    pub fn all_selected(options: Vec<String>) -> Self {
        let selected = vec![true; options.len()];
        Self {
            options,
            selected,
            listeners: Vec::new(),
        }
    }

    /// Register a listener; it is not called until the next change.
    pub fn on_change(&mut self, listener: impl FnMut(&[String]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn is_selected(&self, option: &str) -> bool {
        self.position(option).map(|i| self.selected[i]).unwrap_or(false)
    }

    /// Selected options in option order.
    pub fn selected(&self) -> Vec<String> {
        self.options
            .iter()
            .zip(&self.selected)
            .filter(|(_, on)| **on)
            .map(|(o, _)| o.clone())
            .collect()
    }

    /// Flip one option. Unknown options are ignored.
    pub fn toggle(&mut self, option: &str) {
        if let Some(i) = self.position(option) {
            self.selected[i] = !self.selected[i];
            self.notify();
        }
    }

    /// Set one option on or off.
    pub fn set(&mut self, option: &str, on: bool) {
        if let Some(i) = self.position(option) {
            if self.selected[i] != on {
                self.selected[i] = on;
                self.notify();
            }
        }
    }

    /// Replace the selection; unknown names are ignored.
    pub fn set_selection<S: AsRef<str>>(&mut self, names: &[S]) {
        let next: Vec<bool> = self
            .options
            .iter()
            .map(|o| names.iter().any(|n| n.as_ref() == o))
            .collect();
        if next != self.selected {
            self.selected = next;
            self.notify();
        }
    }

    pub fn select_all(&mut self) {
        if self.selected.iter().any(|on| !on) {
            self.selected.iter_mut().for_each(|on| *on = true);
            self.notify();
        }
    }

    pub fn select_none(&mut self) {
        if self.selected.iter().any(|on| *on) {
            self.selected.iter_mut().for_each(|on| *on = false);
            self.notify();
        }
    }

    fn position(&self, option: &str) -> Option<usize> {
        self.options.iter().position(|o| o == option)
    }

    fn notify(&mut self) {
        let current = self.selected();
        for listener in &mut self.listeners {
            listener(&current);
        }
    }
}
