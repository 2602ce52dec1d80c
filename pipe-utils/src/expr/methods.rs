//! Registry of named methods callable from expressions and plans.

use super::value_ops::{equals, type_name};
use crate::errors::ExprError;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// A registered method: receiver, positional arguments, keyword arguments.
pub type MethodFn =
    Arc<dyn Fn(&Value, &[Value], &Map<String, Value>) -> Result<Value, ExprError> + Send + Sync>;

/// Registry mapping method names to implementations.
#[derive(Default)]
pub struct MethodRegistry {
    methods: RwLock<HashMap<String, MethodFn>>,
}

impl MethodRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry preloaded with the builtin methods.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        register_builtins(&registry);
        registry
    }

    /// Registers a method, replacing any method of the same name.
    pub fn register<F>(&self, name: impl Into<String>, method: F)
    where
        F: Fn(&Value, &[Value], &Map<String, Value>) -> Result<Value, ExprError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        debug!(method = %name, "registering method");
        self.methods.write().insert(name, Arc::new(method));
    }

    /// Removes a method. Returns true if it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.methods.write().remove(name).is_some()
    }

    /// Gets a method by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<MethodFn> {
        self.methods.read().get(name).cloned()
    }

    /// Checks if a method is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }

    /// Lists registered method names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Calls the named method on `receiver`.
    ///
    /// The registry lock is released before the method runs, so methods may
    /// use the registry themselves.
    pub fn invoke(
        &self,
        name: &str,
        receiver: &Value,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<Value, ExprError> {
        let method = self.get(name).ok_or_else(|| ExprError::UnknownMethod {
            type_name: type_name(receiver),
            name: name.to_string(),
        })?;
        method(receiver, args, kwargs)
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("method_count", &self.methods.read().len())
            .finish()
    }
}

static METHODS: LazyLock<Arc<MethodRegistry>> =
    LazyLock::new(|| Arc::new(MethodRegistry::with_builtins()));

/// Gets the global method registry, preloaded with the builtins.
#[must_use]
pub fn method_registry() -> Arc<MethodRegistry> {
    Arc::clone(&METHODS)
}

/// Registers a method in the global registry.
pub fn register_method<F>(name: impl Into<String>, method: F)
where
    F: Fn(&Value, &[Value], &Map<String, Value>) -> Result<Value, ExprError>
        + Send
        + Sync
        + 'static,
{
    METHODS.register(name, method);
}

/// Arguments of one builtin call.
struct Call<'a> {
    name: &'static str,
    receiver: &'a Value,
    args: &'a [Value],
    kwargs: &'a Map<String, Value>,
}

impl<'a> Call<'a> {
    fn accepts(&self, max_args: usize, keywords: &[&str]) -> Result<(), ExprError> {
        if self.args.len() > max_args {
            return Err(ExprError::invalid_value(
                self.name,
                format!("takes at most {max_args} arguments ({} given)", self.args.len()),
            ));
        }
        if let Some(key) = self.kwargs.keys().find(|key| !keywords.contains(&key.as_str())) {
            return Err(ExprError::invalid_value(
                self.name,
                format!("unexpected keyword argument '{key}'"),
            ));
        }
        Ok(())
    }

    fn receiver_str(&self) -> Result<&'a str, ExprError> {
        self.receiver.as_str().ok_or_else(|| self.no_such_method())
    }

    fn receiver_object(&self) -> Result<&'a Map<String, Value>, ExprError> {
        self.receiver.as_object().ok_or_else(|| self.no_such_method())
    }

    fn no_such_method(&self) -> ExprError {
        ExprError::UnknownMethod {
            type_name: type_name(self.receiver),
            name: self.name.to_string(),
        }
    }

    fn required(&self, index: usize) -> Result<&'a Value, ExprError> {
        self.args.get(index).ok_or_else(|| {
            ExprError::invalid_value(self.name, format!("missing required argument {}", index + 1))
        })
    }

    /// Positional argument `index` or keyword `key`; null counts as absent.
    ///
    /// Passing the same argument both ways is an error.
    fn optional(&self, index: usize, key: &str) -> Result<Option<&'a Value>, ExprError> {
        let value = match (self.args.get(index), self.kwargs.get(key)) {
            (Some(_), Some(_)) => {
                return Err(ExprError::invalid_value(
                    self.name,
                    format!("got multiple values for argument '{key}'"),
                ))
            }
            (positional, keyword) => positional.or(keyword),
        };
        Ok(value.filter(|value| !value.is_null()))
    }

    fn str_arg(&self, value: &'a Value) -> Result<&'a str, ExprError> {
        value
            .as_str()
            .ok_or_else(|| ExprError::operand(self.name, type_name(value)))
    }

    fn int_arg(&self, value: &Value) -> Result<i64, ExprError> {
        value
            .as_i64()
            .ok_or_else(|| ExprError::operand(self.name, type_name(value)))
    }
}

type Builtin = for<'c> fn(&Call<'c>) -> Result<Value, ExprError>;

fn register_builtins(registry: &MethodRegistry) {
    const BUILTINS: &[(&str, Builtin)] = &[
        ("upper", upper),
        ("lower", lower),
        ("strip", strip),
        ("lstrip", lstrip),
        ("rstrip", rstrip),
        ("split", split),
        ("join", join),
        ("replace", replace),
        ("startswith", startswith),
        ("endswith", endswith),
        ("find", find),
        ("index", index),
        ("count", count),
        ("get", get),
        ("keys", keys),
        ("values", values),
        ("items", items),
        ("len", len),
    ];

    for &(name, builtin) in BUILTINS {
        registry.register(name, move |receiver: &Value, args: &[Value], kwargs: &Map<String, Value>| {
            builtin(&Call {
                name,
                receiver,
                args,
                kwargs,
            })
        });
    }
}

fn upper(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(0, &[])?;
    Ok(Value::from(call.receiver_str()?.to_uppercase()))
}

fn lower(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(0, &[])?;
    Ok(Value::from(call.receiver_str()?.to_lowercase()))
}

fn trimmed<'s>(
    call: &Call<'s>,
    whitespace: fn(&'s str) -> &'s str,
    chars: fn(&'s str, &[char]) -> &'s str,
) -> Result<Value, ExprError> {
    call.accepts(1, &["chars"])?;
    let s = call.receiver_str()?;
    let trimmed = match call.optional(0, "chars")? {
        Some(set) => chars(s, &call.str_arg(set)?.chars().collect::<Vec<_>>()),
        None => whitespace(s),
    };
    Ok(Value::from(trimmed))
}

fn strip(call: &Call<'_>) -> Result<Value, ExprError> {
    trimmed(call, str::trim, |s, set| s.trim_matches(set))
}

fn lstrip(call: &Call<'_>) -> Result<Value, ExprError> {
    trimmed(call, str::trim_start, |s, set| s.trim_start_matches(set))
}

fn rstrip(call: &Call<'_>) -> Result<Value, ExprError> {
    trimmed(call, str::trim_end, |s, set| s.trim_end_matches(set))
}

fn split_whitespace(s: &str, maxsplit: Option<usize>) -> Vec<Value> {
    let Some(maxsplit) = maxsplit else {
        return s.split_whitespace().map(Value::from).collect();
    };
    let mut parts = Vec::new();
    let mut rest = s.trim_start();
    while parts.len() < maxsplit {
        let Some(end) = rest.find(char::is_whitespace) else {
            break;
        };
        parts.push(Value::from(&rest[..end]));
        rest = rest[end..].trim_start();
    }
    if !rest.is_empty() {
        parts.push(Value::from(rest));
    }
    parts
}

fn split(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(2, &["sep", "maxsplit"])?;
    let s = call.receiver_str()?;
    let maxsplit = match call.optional(1, "maxsplit")? {
        Some(value) => usize::try_from(call.int_arg(value)?).ok(),
        None => None,
    };
    let parts = match call.optional(0, "sep")? {
        None => split_whitespace(s, maxsplit),
        Some(sep) => {
            let sep = call.str_arg(sep)?;
            if sep.is_empty() {
                return Err(ExprError::invalid_value(call.name, "empty separator"));
            }
            match maxsplit {
                Some(n) => s.splitn(n.saturating_add(1), sep).map(Value::from).collect(),
                None => s.split(sep).map(Value::from).collect(),
            }
        }
    };
    Ok(Value::Array(parts))
}

fn join(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(1, &[])?;
    let separator = call.receiver_str()?;
    let items = call.required(0)?;
    let items = items
        .as_array()
        .ok_or_else(|| ExprError::operand(call.name, type_name(items)))?;
    let parts = items
        .iter()
        .map(|item| call.str_arg(item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::from(parts.join(separator)))
}

fn replace(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(3, &["count"])?;
    let s = call.receiver_str()?;
    let old = call.str_arg(call.required(0)?)?;
    let new = call.str_arg(call.required(1)?)?;
    let replaced = match call.optional(2, "count")? {
        Some(count) => match usize::try_from(call.int_arg(count)?) {
            Ok(count) => s.replacen(old, new, count),
            Err(_) => s.replace(old, new),
        },
        None => s.replace(old, new),
    };
    Ok(Value::from(replaced))
}

fn affixes<'a>(call: &Call<'a>) -> Result<Vec<&'a str>, ExprError> {
    call.accepts(1, &[])?;
    match call.required(0)? {
        Value::Array(options) => options.iter().map(|option| call.str_arg(option)).collect(),
        other => Ok(vec![call.str_arg(other)?]),
    }
}

fn startswith(call: &Call<'_>) -> Result<Value, ExprError> {
    let s = call.receiver_str()?;
    let prefixes = affixes(call)?;
    Ok(Value::Bool(prefixes.iter().any(|prefix| s.starts_with(prefix))))
}

fn endswith(call: &Call<'_>) -> Result<Value, ExprError> {
    let s = call.receiver_str()?;
    let suffixes = affixes(call)?;
    Ok(Value::Bool(suffixes.iter().any(|suffix| s.ends_with(suffix))))
}

/// Character offset of `needle` in `s`.
fn char_offset(s: &str, needle: &str) -> Option<usize> {
    s.find(needle).map(|byte| s[..byte].chars().count())
}

fn find(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(1, &[])?;
    let s = call.receiver_str()?;
    let needle = call.str_arg(call.required(0)?)?;
    Ok(char_offset(s, needle).map_or(Value::from(-1), Value::from))
}

fn index(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(1, &[])?;
    let needle = call.required(0)?;
    let position = match call.receiver {
        Value::String(s) => char_offset(s, call.str_arg(needle)?),
        Value::Array(items) => items.iter().position(|item| equals(item, needle)),
        _ => return Err(call.no_such_method()),
    };
    position
        .map(Value::from)
        .ok_or_else(|| ExprError::invalid_value(call.name, format!("{needle} is not present")))
}

fn count(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(1, &[])?;
    let needle = call.required(0)?;
    let count = match call.receiver {
        Value::String(s) => s.matches(call.str_arg(needle)?).count(),
        Value::Array(items) => items.iter().filter(|item| equals(item, needle)).count(),
        _ => return Err(call.no_such_method()),
    };
    Ok(Value::from(count))
}

fn get(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(2, &["default"])?;
    let map = call.receiver_object()?;
    let key = call.required(0)?;
    let key = match key {
        Value::String(key) => key.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(ExprError::operand(call.name, type_name(other))),
    };
    let default = call.optional(1, "default")?;
    Ok(map.get(&key).or(default).cloned().unwrap_or(Value::Null))
}

fn keys(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(0, &[])?;
    let map = call.receiver_object()?;
    Ok(Value::Array(map.keys().cloned().map(Value::from).collect()))
}

fn values(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(0, &[])?;
    let map = call.receiver_object()?;
    Ok(Value::Array(map.values().cloned().collect()))
}

fn items(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(0, &[])?;
    let map = call.receiver_object()?;
    Ok(Value::Array(
        map.iter()
            .map(|(key, value)| Value::Array(vec![Value::from(key.as_str()), value.clone()]))
            .collect(),
    ))
}

fn len(call: &Call<'_>) -> Result<Value, ExprError> {
    call.accepts(0, &[])?;
    let len = match call.receiver {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => return Err(ExprError::operand(call.name, type_name(other))),
    };
    Ok(Value::from(len))
}
