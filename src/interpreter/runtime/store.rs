use std::collections::HashMap;

use crate::interpreter::{sandbox::Scope, value::core::Value};

/// The variables of one program run.
///
/// Globals live for the whole run. Each user function call pushes a frame
/// holding its parameters; lookups check the innermost frame first, then the
/// globals. Frames of outer calls are not visible.
///
/// # Example
/// ```
/// use std::collections::HashMap;
///
/// use solar::interpreter::{runtime::store::VariableStore, value::core::Value};
///
/// let mut store = VariableStore::new();
/// store.set("x", Value::Integer(1));
/// store.push_frame(HashMap::from([("x".to_string(), Value::Integer(2))]));
/// assert_eq!(store.get("x"), Some(&Value::Integer(2)));
/// store.set("y", Value::Integer(3));
/// store.pop_frame();
/// assert_eq!(store.get("x"), Some(&Value::Integer(1)));
/// assert_eq!(store.get("y"), Some(&Value::Integer(3)));
/// ```
#[derive(Debug, Default, Clone)]
pub struct VariableStore {
    globals: HashMap<String, Value>,
    frames:  Vec<HashMap<String, Value>>,
}

impl VariableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks a name up in the innermost frame, then in the globals.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames
            .last()
            .and_then(|frame| frame.get(name))
            .or_else(|| self.globals.get(name))
    }

    /// Binds a name.
    ///
    /// A parameter of the innermost frame is rebound in place; any other name
    /// is bound globally.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(frame) = self.frames.last_mut()
           && let Some(slot) = frame.get_mut(&name)
        {
            *slot = value;
            return;
        }
        self.globals.insert(name, value);
    }

    /// Enters a function call with its parameter bindings.
    pub fn push_frame(&mut self, bindings: HashMap<String, Value>) {
        self.frames.push(bindings);
    }

    /// Leaves the innermost function call.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Number of active call frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Scope for VariableStore {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_shadow_globals_only_inside_the_call() {
        let mut store = VariableStore::new();
        store.set("name", Value::from("global"));
        store.push_frame(HashMap::from([("name".to_string(), Value::from("param"))]));
        store.set("name", Value::from("changed"));
        assert_eq!(store.get("name"), Some(&Value::from("changed")));
        store.pop_frame();
        assert_eq!(store.get("name"), Some(&Value::from("global")));
    }

    #[test]
    fn outer_frames_are_not_visible() {
        let mut store = VariableStore::new();
        store.push_frame(HashMap::from([("a".to_string(), Value::Integer(1))]));
        store.push_frame(HashMap::new());
        assert_eq!(store.get("a"), None);
        assert_eq!(store.depth(), 2);
    }
}
