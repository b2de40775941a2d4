//! Platform-neutral inline keyboard model.

use crate::callback::Callback;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
  pub text:     String,
  pub callback: Callback,
}

impl Button {
  pub fn callback(text: impl Into<String>, callback: Callback) -> Self {
    Self { text: text.into(), callback }
  }
}

/// Rows of buttons, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
  pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
  pub fn new() -> Self { Self::default() }

  pub fn row(mut self, row: Vec<Button>) -> Self {
    if !row.is_empty() {
      self.rows.push(row);
    }
    self
  }

  pub fn button(self, button: Button) -> Self { self.row(vec![button]) }

  /// Every callback carried by the keyboard, in reading order.
  pub fn callbacks(&self) -> impl Iterator<Item = &Callback> {
    self.rows.iter().flatten().map(|b| &b.callback)
  }

  pub fn find(&self, text: &str) -> Option<&Button> {
    self.rows.iter().flatten().find(|b| b.text == text)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_rows_are_skipped() {
    let keyboard = Keyboard::new().row(vec![]).button(Button::callback("x", Callback::Close));
    assert_eq!(keyboard.rows.len(), 1);
  }

  #[test]
  fn callbacks_follow_reading_order() {
    let keyboard = Keyboard::new()
      .row(vec![Button::callback("a", Callback::Help), Button::callback("b", Callback::BackToMain)])
      .button(Button::callback("c", Callback::Close));
    let callbacks: Vec<_> = keyboard.callbacks().cloned().collect();
    assert_eq!(callbacks, vec![Callback::Help, Callback::BackToMain, Callback::Close]);
    assert_eq!(keyboard.find("c").map(|b| &b.callback), Some(&Callback::Close));
    assert!(keyboard.find("z").is_none());
  }
}
