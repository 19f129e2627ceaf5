//! Property definitions and type coercion.

use std::fmt;
use std::rc::Rc;

use serde_json::{Number, Value};

use super::DataGroup;
use crate::diagnostics::{trigger_warning, CallbackError};

/// Nominal type of a declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Function,
    Any,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "String",
            PropertyType::Number => "Number",
            PropertyType::Boolean => "Boolean",
            PropertyType::Object => "Object",
            PropertyType::Array => "Array",
            PropertyType::Function => "Function",
            PropertyType::Any => "Any",
        }
    }

    fn zero_value(&self) -> Value {
        match self {
            PropertyType::String => Value::String(String::new()),
            PropertyType::Number => Value::from(0),
            PropertyType::Boolean => Value::Bool(false),
            PropertyType::Array => Value::Array(Vec::new()),
            PropertyType::Object | PropertyType::Function | PropertyType::Any => Value::Null,
        }
    }
}

pub type PropertyObserver =
    Rc<dyn Fn(&mut DataGroup, &Value, &Value) -> Result<(), CallbackError>>;

/// Returns `true` when the new value (first argument) differs from the old one.
pub type PropertyComparer = Rc<dyn Fn(&Value, &Value) -> bool>;

#[derive(Clone)]
pub enum PropertyDefault {
    Value(Value),
    Factory(Rc<dyn Fn() -> Value>),
}

#[derive(Clone)]
pub struct PropertyDefinition {
    pub ty: PropertyType,
    pub optional_types: Vec<PropertyType>,
    pub default: Option<PropertyDefault>,
    pub observer: Option<PropertyObserver>,
    pub comparer: Option<PropertyComparer>,
    pub reflect_id_prefix: bool,
}

impl fmt::Debug for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition")
            .field("ty", &self.ty)
            .field("optional_types", &self.optional_types)
            .field("has_observer", &self.observer.is_some())
            .field("has_comparer", &self.comparer.is_some())
            .field("reflect_id_prefix", &self.reflect_id_prefix)
            .finish()
    }
}

impl PropertyDefinition {
    pub fn new(ty: PropertyType) -> Self {
        Self {
            ty,
            optional_types: Vec::new(),
            default: None,
            observer: None,
            comparer: None,
            reflect_id_prefix: false,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(PropertyDefault::Value(value));
        self
    }

    pub fn with_default_factory(mut self, f: impl Fn() -> Value + 'static) -> Self {
        self.default = Some(PropertyDefault::Factory(Rc::new(f)));
        self
    }

    pub fn with_optional_types(mut self, types: &[PropertyType]) -> Self {
        self.optional_types = types.to_vec();
        self
    }

    pub fn with_observer(
        mut self,
        f: impl Fn(&mut DataGroup, &Value, &Value) -> Result<(), CallbackError> + 'static,
    ) -> Self {
        self.observer = Some(Rc::new(f));
        self
    }

    pub fn with_comparer(mut self, f: impl Fn(&Value, &Value) -> bool + 'static) -> Self {
        self.comparer = Some(Rc::new(f));
        self
    }

    pub fn with_reflect_id_prefix(mut self) -> Self {
        self.reflect_id_prefix = true;
        self
    }

    /// The value used when the property is unset or a coercion fails.
    pub fn default_value(&self) -> Value {
        match &self.default {
            Some(PropertyDefault::Value(v)) => v.clone(),
            Some(PropertyDefault::Factory(f)) => f(),
            None => self.ty.zero_value(),
        }
    }
}

// ── Coercion ──────────────────────────────────────────────────────────────

fn matches_type(ty: PropertyType, value: &Value, is_method: &dyn Fn(&str) -> bool) -> bool {
    match ty {
        PropertyType::String => value.is_string(),
        PropertyType::Number => value.is_number(),
        PropertyType::Boolean => value.is_boolean(),
        PropertyType::Object => value.is_object() || value.is_array() || value.is_null(),
        PropertyType::Array => value.is_array(),
        PropertyType::Function => value.as_str().is_some_and(is_method),
        PropertyType::Any => true,
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::Bool(b) => Some(Value::from(u8::from(*b))),
        Value::Null => Some(Value::from(0)),
        Value::String(s) => {
            let n: f64 = s.trim().parse().ok()?;
            n.is_finite().then(|| number_value(n))
        }
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Coerce an incoming value to the property's declared type.
///
/// `None` stands for an undefined value and yields the default. Mismatches
/// fall back to the default and raise a warning.
pub(crate) fn convert_value_to_type(
    value: Option<&Value>,
    name: &str,
    prop: &PropertyDefinition,
    is_method: &dyn Fn(&str) -> bool,
) -> Value {
    let Some(value) = value else {
        return prop.default_value();
    };
    if prop
        .optional_types
        .iter()
        .any(|ty| matches_type(*ty, value, is_method))
    {
        return value.clone();
    }
    let mismatch = || {
        trigger_warning(&format!(
            "property \"{name}\" received type-incompatible value: expected <{}> but got non-{} value. Used default value instead.",
            prop.ty.as_str(),
            prop.ty.as_str().to_lowercase(),
        ));
        prop.default_value()
    };
    match prop.ty {
        PropertyType::String => match value {
            Value::String(_) => value.clone(),
            Value::Null => Value::String(String::new()),
            Value::Bool(_) | Value::Number(_) => Value::String(value.to_string()),
            Value::Array(_) | Value::Object(_) => {
                trigger_warning(&format!(
                    "property \"{name}\" received type-incompatible value: expected <String> but got object-typed value. Force converted."
                ));
                Value::String(value.to_string())
            }
        },
        PropertyType::Number => to_number(value).unwrap_or_else(mismatch),
        PropertyType::Boolean => Value::Bool(truthy(value)),
        PropertyType::Array => {
            if value.is_array() {
                value.clone()
            } else {
                mismatch()
            }
        }
        PropertyType::Object => {
            if matches_type(PropertyType::Object, value, is_method) {
                value.clone()
            } else {
                mismatch()
            }
        }
        PropertyType::Function => {
            if matches_type(PropertyType::Function, value, is_method) {
                value.clone()
            } else {
                mismatch()
            }
        }
        PropertyType::Any => value.clone(),
    }
}
