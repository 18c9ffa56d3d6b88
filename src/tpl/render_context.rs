use crate::Result;
use crate::error::LiquidError;
use crate::runtime::{ToValue, Value, to_value};
use crate::tpl::filter::{Filter, Stringifier};
use serde::Serialize;
use std::collections::HashMap;

/// Runtime flags raised by `{% break %}` and `{% continue %}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flag {
    Break = 1,
    Continue = 2,
}

/// Everything one render needs besides the template: variables, filters,
/// stringifiers and the loop-control flags.
///
/// Variables live in a single flat map. Loop variables and `assign` write into
/// it and stay there after the loop or render ends; call
/// [`Context::clear_variables`] to start over.
#[derive(Default)]
pub struct Context {
    variables: HashMap<String, Value>,
    filters: HashMap<String, Box<dyn Filter>>,
    stringifiers: Vec<(String, Box<dyn Stringifier>)>,
    flags: u8,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /* Variables */

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl ToValue) {
        self.variables.insert(name.into(), value.to_value());
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Value bound to `name`, or null when nothing is.
    pub fn lookup(&self, name: &str) -> Value {
        self.variables.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.variables
    }

    /// Binds any serializable value under `name`.
    pub fn expose<T: ?Sized + Serialize>(&mut self, name: impl Into<String>, value: &T) -> Result<()> {
        let value = to_value(value)?;
        self.variables.insert(name.into(), value);
        Ok(())
    }

    /// Binds every field of a JSON object as a variable. Returns the number of bindings.
    pub fn bind_json(&mut self, json: serde_json::Value) -> Result<usize> {
        match Value::from(json) {
            Value::Object(fields) => {
                let count = fields.len();
                self.variables.extend(fields);
                Ok(count)
            }
            other => Err(LiquidError::Serialization(format!(
                "Expected a JSON object, got {}",
                other.type_name()
            ))),
        }
    }

    /* Filters */

    /// Registers a filter, replacing any filter with the same name.
    pub fn add_filter<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&Value, &[Value], &Context) -> Result<Value> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Box::new(filter));
    }

    pub fn add_filter_boxed(&mut self, name: impl Into<String>, filter: Box<dyn Filter>) {
        self.filters.insert(name.into(), filter);
    }

    /// Registers a batch of filters. Returns how many were loaded, counting
    /// those that replaced a filter of the same name.
    pub fn load_filters<I>(&mut self, filters: I) -> usize
    where
        I: IntoIterator<Item = (String, Box<dyn Filter>)>,
    {
        let mut loaded = 0;
        for (name, filter) in filters {
            self.filters.insert(name, filter);
            loaded += 1;
        }
        loaded
    }

    pub fn filter(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name).map(|f| f.as_ref())
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn remove_filter(&mut self, name: &str) -> bool {
        self.filters.remove(name).is_some()
    }

    /* Stringifiers */

    /// Registers a stringifier for values whose runtime type name is `type_name`.
    /// Earlier registrations win when several accept the same type.
    pub fn add_stringifier<F>(&mut self, type_name: impl Into<String>, stringifier: F)
    where
        F: Fn(&Value, &Context) -> String + Send + Sync + 'static,
    {
        self.stringifiers
            .push((type_name.into(), Box::new(stringifier)));
    }

    pub fn add_stringifier_boxed(
        &mut self,
        type_name: impl Into<String>,
        stringifier: Box<dyn Stringifier>,
    ) {
        self.stringifiers.push((type_name.into(), stringifier));
    }

    pub fn load_stringifiers<I>(&mut self, stringifiers: I) -> usize
    where
        I: IntoIterator<Item = (String, Box<dyn Stringifier>)>,
    {
        let before = self.stringifiers.len();
        self.stringifiers.extend(stringifiers);
        self.stringifiers.len() - before
    }

    /// Converts a value through the first stringifier accepting its type.
    /// No match yields an empty string.
    pub fn stringify(&self, value: &Value) -> String {
        self.stringifiers
            .iter()
            .find(|(accepts, _)| accepts == value.type_name())
            .map(|(_, s)| s.stringify(value, self))
            .unwrap_or_default()
    }

    /* Runtime flags */

    pub fn runtime_flags(&self) -> u8 {
        self.flags
    }

    pub fn set_flag(&mut self, flag: Flag) {
        self.flags |= flag as u8;
    }

    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags & flag as u8 != 0
    }

    pub fn clear_flags(&mut self) {
        self.flags = 0;
    }
}
