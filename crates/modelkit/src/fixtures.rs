//! Test fixtures: a scriptable prototype that records its calls.

use std::cell::RefCell;
use std::rc::Rc;

use crate::modifiers::{ConfigView, EvalError, Modifier, ModifierKind, Prototype, PrototypeRef};
use crate::value::Value;

/// Shared record of `(probe name, value seen)` pairs, in call order.
pub type CallLog = Rc<RefCell<Vec<(String, Value)>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Names of the probes recorded in `log`, in call order.
pub fn called(log: &CallLog) -> Vec<String> {
    log.borrow().iter().map(|(name, _)| name.clone()).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Pass,
    Fail,
    Rewrite(Value),
}

#[derive(Debug, Clone)]
pub struct Probe {
    name: String,
    kind: ModifierKind,
    offset: i64,
    behavior: Behavior,
    log: CallLog,
}

impl Probe {
    pub fn constraint(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            kind: ModifierKind::Constraint,
            offset: 0,
            behavior: Behavior::Pass,
            log: Rc::clone(log),
        }
    }

    pub fn filter(name: &str, log: &CallLog) -> Self {
        Self {
            kind: ModifierKind::Filter,
            ..Self::constraint(name, log)
        }
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn failing(mut self) -> Self {
        self.behavior = Behavior::Fail;
        self
    }

    pub fn rewriting(mut self, value: impl Into<Value>) -> Self {
        self.behavior = Behavior::Rewrite(value.into());
        self
    }

    /// Build a modifier around this probe.
    pub fn modifier(self) -> Modifier {
        Modifier::new(PrototypeRef::instance(self)).unwrap()
    }
}

impl Prototype for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModifierKind {
        self.kind
    }

    fn priority_offset(&self) -> i64 {
        self.offset
    }

    fn process(&self, value: &mut Value, _config: &ConfigView<'_>) -> Result<(), EvalError> {
        self.log.borrow_mut().push((self.name.clone(), value.clone()));
        match &self.behavior {
            Behavior::Pass => Ok(()),
            Behavior::Fail => Err(EvalError::new(
                format!("{}.failed", self.name),
                format!("{} rejected {}", self.name, value),
            )),
            Behavior::Rewrite(replacement) => {
                *value = replacement.clone();
                Ok(())
            }
        }
    }
}
