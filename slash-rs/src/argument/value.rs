//! Argument values and the accumulated-values array.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::model::{Attachment, Channel, Member, Mentionable, Role, User};

/// Output of a mapper, stored type-erased
#[derive(Clone)]
pub struct MappedValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl MappedValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for MappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MappedValue<{}>", self.type_name)
    }
}

/// A single resolved argument value
#[derive(Debug, Clone)]
pub enum ArgumentValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Number(f64),
    User(User),
    Channel(Channel),
    Role(Role),
    Mentionable(Mentionable),
    Attachment(Attachment),
    Member(Member),
    /// Value produced by a mapper
    Mapped(MappedValue),
}

impl ArgumentValue {
    /// Wrap an arbitrary mapper output
    pub fn mapped<T: Any + Send + Sync>(value: T) -> Self {
        ArgumentValue::Mapped(MappedValue::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgumentValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numbers, and integers widened to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgumentValue::Number(n) => Some(*n),
            ArgumentValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgumentValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The user behind a user or member value
    pub fn as_user(&self) -> Option<&User> {
        match self {
            ArgumentValue::User(user) => Some(user),
            ArgumentValue::Member(member) => Some(&member.user),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            ArgumentValue::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            ArgumentValue::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&Role> {
        match self {
            ArgumentValue::Role(role) => Some(role),
            _ => None,
        }
    }

    pub fn as_mentionable(&self) -> Option<&Mentionable> {
        match self {
            ArgumentValue::Mentionable(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            ArgumentValue::Attachment(a) => Some(a),
            _ => None,
        }
    }

    /// Downcast a mapped value
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            ArgumentValue::Mapped(mapped) => mapped.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<String> for ArgumentValue {
    fn from(value: String) -> Self {
        ArgumentValue::String(value)
    }
}

impl From<&str> for ArgumentValue {
    fn from(value: &str) -> Self {
        ArgumentValue::String(value.to_string())
    }
}

impl From<i64> for ArgumentValue {
    fn from(value: i64) -> Self {
        ArgumentValue::Integer(value)
    }
}

impl From<f64> for ArgumentValue {
    fn from(value: f64) -> Self {
        ArgumentValue::Number(value)
    }
}

impl From<bool> for ArgumentValue {
    fn from(value: bool) -> Self {
        ArgumentValue::Boolean(value)
    }
}

impl From<User> for ArgumentValue {
    fn from(value: User) -> Self {
        ArgumentValue::User(value)
    }
}

impl From<Member> for ArgumentValue {
    fn from(value: Member) -> Self {
        ArgumentValue::Member(value)
    }
}

/// Values accumulated while checking a command, in handler order
///
/// A slot is "unset" while it holds `None`; absent optional arguments leave
/// their slot unset.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    slots: Vec<Option<ArgumentValue>>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Number of slots, set or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArgumentValue> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Write a slot, growing the array with unset slots as needed
    pub fn set(&mut self, index: usize, value: Option<ArgumentValue>) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&ArgumentValue>> {
        self.slots.iter().map(Option::as_ref)
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(ArgumentValue::as_str)
    }

    pub fn i64(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(ArgumentValue::as_i64)
    }

    pub fn f64(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(ArgumentValue::as_f64)
    }

    pub fn bool(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(ArgumentValue::as_bool)
    }

    pub fn user(&self, index: usize) -> Option<&User> {
        self.get(index).and_then(ArgumentValue::as_user)
    }

    pub fn member(&self, index: usize) -> Option<&Member> {
        self.get(index).and_then(ArgumentValue::as_member)
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.get(index).and_then(ArgumentValue::as_channel)
    }

    pub fn role(&self, index: usize) -> Option<&Role> {
        self.get(index).and_then(ArgumentValue::as_role)
    }

    pub fn attachment(&self, index: usize) -> Option<&Attachment> {
        self.get(index).and_then(ArgumentValue::as_attachment)
    }

    pub fn mapped<T: Any>(&self, index: usize) -> Option<&T> {
        self.get(index).and_then(ArgumentValue::downcast_ref::<T>)
    }
}
