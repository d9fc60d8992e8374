use std::fmt;

/// An undoable mutation applied to a store `S`.
///
/// Commands are stateful: whatever prior state `undo` needs is captured inside
/// `execute`. Calling `undo` before `execute` must be a no-op that returns `Ok`.
pub trait Command<S, E> {
    fn execute(&mut self, store: &mut S) -> Result<(), E>;

    fn undo(&mut self, store: &mut S) -> Result<(), E>;

    fn label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub type BoxedCommand<S, E> = Box<dyn Command<S, E>>;

impl<S, E, C> Command<S, E> for Box<C>
where
    C: Command<S, E> + ?Sized,
{
    fn execute(&mut self, store: &mut S) -> Result<(), E> {
        (**self).execute(store)
    }

    fn undo(&mut self, store: &mut S) -> Result<(), E> {
        (**self).undo(store)
    }

    fn label(&self) -> &'static str {
        (**self).label()
    }
}

/// Runs its members in insertion order and undoes them in strict reverse order.
pub struct BatchCommand<S, E> {
    commands: Vec<BoxedCommand<S, E>>,
}

impl<S, E> Default for BatchCommand<S, E> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<S, E> BatchCommand<S, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commands(commands: Vec<BoxedCommand<S, E>>) -> Self {
        Self { commands }
    }

    pub fn add(&mut self, command: impl Command<S, E> + 'static) {
        self.commands.push(Box::new(command));
    }

    pub fn with(mut self, command: impl Command<S, E> + 'static) -> Self {
        self.add(command);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

impl<S, E> Command<S, E> for BatchCommand<S, E> {
    fn execute(&mut self, store: &mut S) -> Result<(), E> {
        for ix in 0..self.commands.len() {
            let Err(err) = self.commands[ix].execute(store) else {
                continue;
            };

            // Roll back what already ran so the batch stays atomic.
            for done in self.commands[..ix].iter_mut().rev() {
                if done.undo(store).is_err() {
                    tracing::warn!(
                        command = done.label(),
                        "failed to roll back batch member after a later member failed"
                    );
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn undo(&mut self, store: &mut S) -> Result<(), E> {
        for command in self.commands.iter_mut().rev() {
            command.undo(store)?;
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "batch"
    }
}

impl<S, E> fmt::Debug for BatchCommand<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.commands.iter().map(|command| command.label()))
            .finish()
    }
}
