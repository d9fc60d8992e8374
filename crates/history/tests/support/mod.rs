#![allow(dead_code)]

use mailkit_history::Command;

#[derive(Debug, Default)]
pub struct Journal {
    pub values: Vec<i32>,
    pub calls: Vec<String>,
}

/// Appends a value on execute and pops it again on undo.
pub struct Push {
    pub value: i32,
    pushed: bool,
}

impl Push {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            pushed: false,
        }
    }
}

impl Command<Journal, String> for Push {
    fn execute(&mut self, store: &mut Journal) -> Result<(), String> {
        store.values.push(self.value);
        store.calls.push(format!("execute {}", self.value));
        self.pushed = true;
        Ok(())
    }

    fn undo(&mut self, store: &mut Journal) -> Result<(), String> {
        if !self.pushed {
            return Ok(());
        }
        store.values.pop();
        store.calls.push(format!("undo {}", self.value));
        self.pushed = false;
        Ok(())
    }
}

/// Doubles the last value; depends on an earlier command's effect.
pub struct DoubleLast {
    previous: Option<i32>,
}

impl DoubleLast {
    pub fn new() -> Self {
        Self { previous: None }
    }
}

impl Command<Journal, String> for DoubleLast {
    fn execute(&mut self, store: &mut Journal) -> Result<(), String> {
        let last = store
            .values
            .last_mut()
            .ok_or_else(|| "nothing to double".to_string())?;
        self.previous = Some(*last);
        *last *= 2;
        store.calls.push("execute double".to_string());
        Ok(())
    }

    fn undo(&mut self, store: &mut Journal) -> Result<(), String> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };
        if let Some(last) = store.values.last_mut() {
            *last = previous;
        }
        store.calls.push("undo double".to_string());
        Ok(())
    }
}

pub struct Fail;

impl Command<Journal, String> for Fail {
    fn execute(&mut self, store: &mut Journal) -> Result<(), String> {
        store.calls.push("execute fail".to_string());
        Err("boom".to_string())
    }

    fn undo(&mut self, _store: &mut Journal) -> Result<(), String> {
        Ok(())
    }
}
