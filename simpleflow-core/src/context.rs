//! Shared context threaded through every node of a run.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::{FlowError, Result};

/// Key/value data handed from node to node.
///
/// Fields are JSON values addressed by string key; their shape is a contract
/// between cooperating nodes and is not checked by the engine. Next to the
/// fields, a context carries *shared handles*: `Arc`-wrapped values keyed by
/// type (queues, counters, clients). Cloning a context deep-copies the fields
/// but shares the handles, so flows started with clones of one context can
/// rendezvous through them.
///
/// The engine never locks a context. Two runs that mutate the same shared
/// handle must synchronize through the handle itself.
#[derive(Clone, Debug, Default)]
pub struct Context {
    fields: HashMap<String, Value>,
    shared: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from JSON fields.
    pub fn from_json(fields: HashMap<String, Value>) -> Self {
        Self {
            fields,
            shared: HashMap::new(),
        }
    }

    /// Create a context from a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_json(map.into_iter().collect())),
            other => Err(FlowError::context(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Set a field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.fields.insert(key.into(), value);
        Ok(())
    }

    /// Read a field and deserialize it.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.fields
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(FlowError::from)
    }

    /// Raw JSON value of a field.
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Mutable raw JSON value of a field.
    pub fn get_raw_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    /// Append to a list-valued field, creating it when missing.
    pub fn push(&mut self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
        let key = key.into();
        let value = serde_json::to_value(value)?;
        match self
            .fields
            .entry(key.clone())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(FlowError::context(format!("field '{key}' is not a list"))),
        }
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Check if a field exists.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// All field names.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    /// All fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Store a shared handle, replacing any previous handle of the same type.
    pub fn insert_shared<T>(&mut self, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.shared.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Get a shared handle by type.
    pub fn shared<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.shared
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|handle| handle.downcast::<T>().ok())
    }

    /// Get a shared handle by type, failing with a context error if absent.
    pub fn require_shared<T>(&self) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.shared::<T>().ok_or_else(|| {
            FlowError::context(format!(
                "missing shared handle: {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Check if a shared handle of the given type exists.
    pub fn contains_shared<T>(&self) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.shared.contains_key(&TypeId::of::<T>())
    }

    /// Copy the fields of another context into this one, overriding
    /// existing keys. Shared handles are left untouched.
    pub fn merge(&mut self, other: &Context) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields as a JSON object, e.g. for template rendering.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

/// Builder for creating contexts with initial data.
#[derive(Default)]
pub struct ContextBuilder {
    context: Context,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    pub fn with_json(mut self, key: impl Into<String>, value: impl Serialize) -> Result<Self> {
        self.context.set(key, value)?;
        Ok(self)
    }

    /// Store a shared handle.
    pub fn with_shared<T>(mut self, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.context.insert_shared(value);
        self
    }

    /// Build the context.
    pub fn build(self) -> Context {
        self.context
    }
}
