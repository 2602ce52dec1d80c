//! Pipelines described as JSON.
//!
//! A plan is a list of steps, each naming a registered method:
//!
//! ```json
//! {
//!   "name": "normalize",
//!   "steps": [
//!     "strip",
//!     ["split", ","],
//!     {"then": "join", "args": [["x", "y"]]},
//!     {"catch": "type", "value": ""}
//!   ]
//! }
//! ```
//!
//! A bare array of steps is accepted as well. Step values are checked when
//! the plan is parsed: a value with an unrecognized shape, or naming a method
//! the registry does not know, is rejected with
//! [`PipeError::InvalidStepKind`] instead of being captured into a pipe.

use crate::errors::{ExprErrorKind, PipeError, StepError};
use crate::expr::value_ops::type_name;
use crate::expr::{method_registry, MethodRegistry};
use crate::pipe::{ErrorMatcher, Pipe};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Which captured errors a dynamic catch step accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindMatcher {
    /// Every captured error, whatever its type.
    Any,
    /// Expression errors of one of these kinds.
    Kinds(Vec<ExprErrorKind>),
}

impl KindMatcher {
    /// Parses `"any"`, a kind name, or an array of kind names.
    pub fn parse(value: &Value) -> Result<Self, PipeError> {
        match value {
            Value::String(name) if name == "any" => Ok(Self::Any),
            Value::String(_) => Ok(Self::Kinds(vec![parse_kind(value)?])),
            Value::Array(names) => names
                .iter()
                .map(parse_kind)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Kinds),
            other => Err(PipeError::invalid_step_kind(format!(
                "catch matcher {}",
                describe(other)
            ))),
        }
    }
}

impl ErrorMatcher for KindMatcher {
    fn matches(&self, error: &StepError) -> bool {
        match self {
            Self::Any => true,
            Self::Kinds(kinds) => kinds.matches(error),
        }
    }
}

fn parse_kind(value: &Value) -> Result<ExprErrorKind, PipeError> {
    ExprErrorKind::deserialize(value)
        .map_err(|_| PipeError::invalid_step_kind(format!("error kind {}", describe(value))))
}

/// What a dynamic catch step recovers with.
#[derive(Debug, Clone, PartialEq)]
pub enum CatchHandler {
    /// A fixed replacement value.
    Value(Value),
    /// A registered method, applied to the error message.
    Method(String),
}

impl CatchHandler {
    fn handle(&self, error: &StepError, registry: &MethodRegistry) -> Pipe<Value> {
        match self {
            Self::Value(value) => Pipe::new(value.clone()),
            Self::Method(name) => Pipe::from_result(registry.invoke(
                name,
                &Value::String(error.to_string()),
                &[],
                &Map::new(),
            )),
        }
    }
}

/// A single parsed step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepSpec {
    /// Call a method with no arguments.
    Call {
        /// Method name.
        name: String,
    },
    /// Call a method with arguments.
    Then {
        /// Method name.
        name: String,
        /// Positional arguments.
        args: Vec<Value>,
        /// Keyword arguments.
        kwargs: Map<String, Value>,
    },
    /// Recover from matching errors.
    Catch {
        /// Errors to recover from.
        matcher: KindMatcher,
        /// Recovery.
        handler: CatchHandler,
    },
}

impl StepSpec {
    /// Parses a JSON step, dispatching on its shape.
    ///
    /// Method names are checked against `registry`. An unregistered catch
    /// handler is [`PipeError::UnknownCallable`]; every other unusable value
    /// is [`PipeError::InvalidStepKind`].
    pub fn parse(value: &Value, registry: &MethodRegistry) -> Result<Self, PipeError> {
        match value {
            Value::String(name) => Ok(Self::Call {
                name: registered(name, registry)?,
            }),
            Value::Array(items) => match items.split_first() {
                Some((Value::String(name), args)) => Ok(Self::Then {
                    name: registered(name, registry)?,
                    args: args.to_vec(),
                    kwargs: Map::new(),
                }),
                _ => Err(PipeError::invalid_step_kind(describe(value))),
            },
            Value::Object(fields) => {
                if let Some(then) = fields.get("then") {
                    Self::parse_then(then, fields, registry)
                } else if let Some(catch) = fields.get("catch") {
                    Self::parse_catch(catch, fields, registry)
                } else {
                    Err(PipeError::invalid_step_kind(describe(value)))
                }
            }
            other => Err(PipeError::invalid_step_kind(describe(other))),
        }
    }

    fn parse_then(
        then: &Value,
        fields: &Map<String, Value>,
        registry: &MethodRegistry,
    ) -> Result<Self, PipeError> {
        let name = match then {
            Value::String(name) => registered(name, registry)?,
            other => return Err(PipeError::invalid_step_kind(describe(other))),
        };
        let args = match fields.get("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(args)) => args.clone(),
            Some(other) => {
                return Err(PipeError::invalid_step_kind(format!(
                    "arguments {}",
                    describe(other)
                )))
            }
        };
        let kwargs = match fields.get("kwargs") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(kwargs)) => kwargs.clone(),
            Some(other) => {
                return Err(PipeError::invalid_step_kind(format!(
                    "keyword arguments {}",
                    describe(other)
                )))
            }
        };
        Ok(Self::Then { name, args, kwargs })
    }

    fn parse_catch(
        catch: &Value,
        fields: &Map<String, Value>,
        registry: &MethodRegistry,
    ) -> Result<Self, PipeError> {
        let matcher = KindMatcher::parse(catch)?;
        let handler = match (fields.get("value"), fields.get("handler")) {
            (Some(value), None) => CatchHandler::Value(value.clone()),
            (None, Some(Value::String(name))) => {
                if !registry.contains(name) {
                    return Err(PipeError::unknown_callable(name.as_str()));
                }
                CatchHandler::Method(name.clone())
            }
            (None, Some(other)) => {
                return Err(PipeError::invalid_step_kind(format!(
                    "catch handler {}",
                    describe(other)
                )))
            }
            _ => {
                return Err(PipeError::invalid_step_kind(
                    "catch step without exactly one of \"value\" or \"handler\"",
                ))
            }
        };
        Ok(Self::Catch { matcher, handler })
    }
}

fn registered(name: &str, registry: &MethodRegistry) -> Result<String, PipeError> {
    if registry.contains(name) {
        Ok(name.to_string())
    } else {
        Err(PipeError::invalid_step_kind(format!("unregistered method name '{name}'")))
    }
}

fn describe(value: &Value) -> String {
    format!("{} {value}", type_name(value))
}

impl Pipe<Value> {
    /// Applies a parsed step, resolving method names through `registry`.
    #[must_use]
    pub fn apply_spec(&self, step: &StepSpec, registry: &MethodRegistry) -> Self {
        match step {
            StepSpec::Call { name } => {
                self.try_then(|value| registry.invoke(name, value, &[], &Map::new()))
            }
            StepSpec::Then { name, args, kwargs } => {
                self.try_then(|value| registry.invoke(name, value, args, kwargs))
            }
            StepSpec::Catch { matcher, handler } => match self.error() {
                Some(error) if matcher.matches(error) => {
                    debug!(error = %error, "caught pipeline error");
                    handler.handle(error, registry)
                }
                _ => self.clone(),
            },
        }
    }

    /// Parses and applies a JSON step.
    ///
    /// A value that is not a usable step fails here, synchronously, and the
    /// pipe itself is left untouched.
    pub fn apply_json(&self, step: &Value, registry: &MethodRegistry) -> Result<Self, PipeError> {
        let spec = StepSpec::parse(step, registry)?;
        Ok(self.apply_spec(&spec, registry))
    }
}

// `Steps` comes first: struct variants also deserialize from arrays.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlan {
    Steps(Vec<Value>),
    Named {
        #[serde(default)]
        name: Option<String>,
        steps: Vec<Value>,
    },
}

/// A named sequence of steps.
#[derive(Debug, Clone, PartialEq)]
pub struct PipePlan {
    /// Optional plan name, used in logs.
    pub name: Option<String>,
    /// The steps, in order.
    pub steps: Vec<StepSpec>,
}

impl PipePlan {
    /// Parses a plan, checking method names against `registry`.
    pub fn parse(value: &Value, registry: &MethodRegistry) -> Result<Self, PipeError> {
        let (name, raw_steps) = match RawPlan::deserialize(value) {
            Ok(RawPlan::Named { name, steps }) => (name, steps),
            Ok(RawPlan::Steps(steps)) => (None, steps),
            Err(_) => {
                return Err(PipeError::invalid_plan(format!(
                    "expected an array of steps or an object with \"steps\", found {}",
                    type_name(value)
                )))
            }
        };

        let steps = raw_steps
            .iter()
            .map(|step| StepSpec::parse(step, registry))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(plan = ?name, steps = steps.len(), "parsed plan");
        Ok(Self { name, steps })
    }

    /// Parses a plan against the global registry.
    pub fn from_value(value: &Value) -> Result<Self, PipeError> {
        Self::parse(value, &method_registry())
    }

    /// Parses a plan from JSON text against the global registry.
    pub fn from_json(json: &str) -> Result<Self, PipeError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Loads a plan from a JSON file against the global registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipeError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading plan");
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Runs the plan on `input` with the global registry.
    pub fn run(&self, input: impl Into<Value>) -> Pipe<Value> {
        self.run_with(input, &method_registry())
    }

    /// Runs the plan on `input` with `registry`.
    pub fn run_with(&self, input: impl Into<Value>, registry: &MethodRegistry) -> Pipe<Value> {
        debug!(plan = ?self.name, steps = self.steps.len(), "running plan");
        self.steps
            .iter()
            .fold(Pipe::new(input.into()), |pipe, step| pipe.apply_spec(step, registry))
    }
}
