use spartan_core::interface_map::InterfaceMap;
use spartan_core::value::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingType {
    Any,
    String,
    Int,
    Float,
    Bool,
    Map,
    Array,
}

/// One entry of a settings schema: a module's `verify`able option shape.
#[derive(Debug, Clone)]
pub struct Setting {
    pub name: String,
    pub ty: SettingType,
    pub required: bool,
    pub default: Option<Value>,
    /// For `Array` settings: the element type every item must match.
    pub elem_type: Option<SettingType>,
    /// For `Map` settings: the nested schema to recurse into.
    pub map_def: Option<Vec<Setting>>,
}

impl Setting {
    pub fn new(name: impl Into<String>, ty: SettingType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            default: None,
            elem_type: None,
            map_def: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn elements(mut self, ty: SettingType) -> Self {
        self.elem_type = Some(ty);
        self
    }

    pub fn nested(mut self, schema: Vec<Setting>) -> Self {
        self.map_def = Some(schema);
        self
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum VerifyError {
    #[error("setting '{0}' is required")]
    Missing(String),
    #[error("setting '{0}' has the wrong type")]
    WrongType(String),
}

fn zero_value(ty: &SettingType) -> Option<Value> {
    match ty {
        SettingType::String => Some(Value::String(String::new())),
        SettingType::Int => Some(Value::Int(0)),
        SettingType::Float => Some(Value::Float(0.0)),
        SettingType::Bool => Some(Value::Bool(false)),
        SettingType::Array => Some(Value::Array(Vec::new())),
        SettingType::Map => Some(Value::Map(InterfaceMap::new())),
        SettingType::Any => None,
    }
}

fn matches_type(value: &Value, ty: &SettingType) -> bool {
    match ty {
        SettingType::Any => true,
        SettingType::String => matches!(value, Value::String(_)),
        SettingType::Int => matches!(value, Value::Int(_)),
        SettingType::Float => matches!(value, Value::Float(_)),
        SettingType::Bool => matches!(value, Value::Bool(_)),
        SettingType::Map => matches!(value, Value::Map(_)),
        SettingType::Array => matches!(value, Value::Array(_)),
    }
}

/// Walks `schema` in order, mutating `options` in place: missing optional
/// settings receive their default or a type-appropriate zero value, present
/// settings are type-checked (and recursed into for arrays/maps).
/// Verification leaves every `Get` against the schema infallible afterward.
pub fn verify(options: &mut InterfaceMap, schema: &[Setting]) -> Result<(), VerifyError> {
    for setting in schema {
        match options.get(&setting.name).cloned() {
            None => {
                if setting.required {
                    return Err(VerifyError::Missing(setting.name.clone()));
                }
                if let Some(default) = &setting.default {
                    options.set(&setting.name, default.clone());
                } else if let Some(zero) = zero_value(&setting.ty) {
                    options.set(&setting.name, zero);
                }
            }
            Some(value) => {
                if setting.ty != SettingType::Any && !matches_type(&value, &setting.ty) {
                    return Err(VerifyError::WrongType(setting.name.clone()));
                }
                if let (SettingType::Array, Some(elem_ty)) = (&setting.ty, &setting.elem_type) {
                    if let Value::Array(items) = &value {
                        for item in items {
                            if !matches_type(item, elem_ty) {
                                return Err(VerifyError::WrongType(setting.name.clone()));
                            }
                        }
                    }
                }
                if let (SettingType::Map, Some(nested_schema)) = (&setting.ty, &setting.map_def) {
                    if let Value::Map(mut nested) = value {
                        verify(&mut nested, nested_schema)?;
                        options.set(&setting.name, Value::Map(nested));
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_errors() {
        let mut opts = InterfaceMap::new();
        let schema = vec![Setting::new("patterns", SettingType::Array).required()];
        assert_eq!(verify(&mut opts, &schema), Err(VerifyError::Missing("patterns".into())));
    }

    #[test]
    fn missing_optional_fills_default() {
        let mut opts = InterfaceMap::new();
        let schema = vec![Setting::new("field", SettingType::String).default(Value::String("message".into()))];
        verify(&mut opts, &schema).unwrap();
        assert_eq!(opts.get("field"), Some(&Value::String("message".into())));
    }

    #[test]
    fn missing_optional_without_default_fills_zero_value() {
        let mut opts = InterfaceMap::new();
        let schema = vec![Setting::new("count", SettingType::Int)];
        verify(&mut opts, &schema).unwrap();
        assert_eq!(opts.get("count"), Some(&Value::Int(0)));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut opts = InterfaceMap::new();
        opts.set("count", Value::String("nope".into()));
        let schema = vec![Setting::new("count", SettingType::Int)];
        assert_eq!(verify(&mut opts, &schema), Err(VerifyError::WrongType("count".into())));
    }

    #[test]
    fn any_skips_type_check() {
        let mut opts = InterfaceMap::new();
        opts.set("x", Value::Bool(true));
        let schema = vec![Setting::new("x", SettingType::Any)];
        assert!(verify(&mut opts, &schema).is_ok());
    }
}
