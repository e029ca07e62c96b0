//! ABI description loader - parses and validates ABI JSON into a registry

use std::fs;
use std::path::Path;

use alloy_dyn_abi::Specifier;
use alloy_json_abi::{Event, EventParam, Function, Param};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::abi::{
    AbiRegistry, CodecError, EventSignature, Fragment, FunctionSignature, ParamSpec, Result,
    StateMutability,
};

/// One entry of an ABI JSON array, before validation
#[derive(Debug, Deserialize)]
struct RawFragment {
    /// Omitted `type` means `function` per the ABI JSON convention
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: Option<StateMutability>,
    /// Pre-0.4.16 mutability flags
    #[serde(default)]
    constant: Option<bool>,
    #[serde(default)]
    payable: Option<bool>,
    #[serde(default)]
    anonymous: bool,
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    components: Vec<RawParam>,
    #[serde(default)]
    indexed: bool,
}

impl RawParam {
    fn into_param(self) -> Param {
        Param {
            ty: self.ty,
            name: self.name,
            components: self.components.into_iter().map(Self::into_param).collect(),
            internal_type: None,
        }
    }

    fn into_event_param(self) -> EventParam {
        EventParam {
            ty: self.ty,
            name: self.name,
            indexed: self.indexed,
            components: self.components.into_iter().map(Self::into_param).collect(),
            internal_type: None,
        }
    }
}

impl RawFragment {
    fn mutability(&self) -> StateMutability {
        if let Some(mutability) = self.state_mutability {
            return mutability;
        }
        match (self.constant, self.payable) {
            (Some(true), _) => StateMutability::View,
            (_, Some(true)) => StateMutability::Payable,
            _ => StateMutability::NonPayable,
        }
    }
}

/// ABI description loader
pub struct AbiLoader;

impl AbiLoader {
    /// Load an ABI file: a bare fragment array or a compiler artifact with an `abi` field
    pub fn load_file(path: impl AsRef<Path>) -> Result<AbiRegistry> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| CodecError::Read {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::load_str(&content)
    }

    /// Load an ABI from JSON text
    pub fn load_str(json: &str) -> Result<AbiRegistry> {
        let value: Value = serde_json::from_str(json).map_err(|err| invalid(err.to_string()))?;
        Self::load_value(&value)
    }

    /// Load an ABI from an in-memory JSON document
    pub fn load_value(value: &Value) -> Result<AbiRegistry> {
        // Try to extract ABI - either raw array or nested in "abi" field
        let entries = match value {
            Value::Array(entries) => entries,
            Value::Object(map) => match map.get("abi") {
                Some(Value::Array(entries)) => entries,
                _ => return Err(invalid("expected a JSON array or an object with an `abi` array")),
            },
            _ => return Err(invalid("expected a JSON array of fragments")),
        };

        let mut registry = AbiRegistry::new();
        for (idx, entry) in entries.iter().enumerate() {
            match Self::parse_entry(entry).map_err(|reason| invalid(format!("entry {idx}: {reason}")))? {
                Some(fragment) => registry.insert(fragment),
                None => registry.skipped += 1,
            }
        }

        Ok(registry)
    }

    /// Validate one entry. `Ok(None)` for entries that carry no selector or topic.
    fn parse_entry(entry: &Value) -> Result<Option<Fragment>, String> {
        if let Value::String(human) = entry {
            return Self::parse_human_readable(human);
        }

        let raw: RawFragment =
            serde_json::from_value(entry.clone()).map_err(|err| err.to_string())?;
        let mutability = raw.mutability();

        match raw.kind.as_deref().unwrap_or("function") {
            "function" => {
                let name = required_name(raw.name)?;
                let function = Function {
                    name,
                    inputs: raw.inputs.into_iter().map(RawParam::into_param).collect(),
                    outputs: raw.outputs.into_iter().map(RawParam::into_param).collect(),
                    state_mutability: to_alloy_mutability(mutability),
                };
                function_fragment(&function).map(Some)
            }
            "event" => {
                let name = required_name(raw.name)?;
                let event = Event {
                    name,
                    inputs: raw.inputs.into_iter().map(RawParam::into_event_param).collect(),
                    anonymous: raw.anonymous,
                };
                event_fragment(&event).map(Some)
            }
            "constructor" | "fallback" | "receive" | "error" => Ok(None),
            other => Err(format!("unknown fragment type '{other}'")),
        }
    }

    /// Parse a human-readable entry such as `"function transfer(address to, uint256 amount)"`
    fn parse_human_readable(entry: &str) -> Result<Option<Fragment>, String> {
        let trimmed = entry.trim();
        let keyword = trimmed.split(|c: char| c.is_whitespace() || c == '(').next();
        match keyword {
            Some("function") => {
                let function = Function::parse(trimmed).map_err(|err| err.to_string())?;
                function_fragment(&function).map(Some)
            }
            Some("event") => {
                let event = Event::parse(trimmed).map_err(|err| err.to_string())?;
                event_fragment(&event).map(Some)
            }
            Some("constructor" | "fallback" | "receive" | "error") => Ok(None),
            _ => Err(format!("unrecognized human-readable fragment '{trimmed}'")),
        }
    }
}

fn invalid(reason: impl Into<String>) -> CodecError {
    CodecError::InvalidDescription {
        reason: reason.into(),
    }
}

fn required_name(name: Option<String>) -> Result<String, String> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err("missing `name`".to_string()),
    }
}

/// Resolve a parameter type eagerly so malformed types fail at load time
fn check_param<S: Specifier<alloy_dyn_abi::DynSolType>>(
    spec: &S,
    name: &str,
    ty: &str,
    components: &[Param],
) -> Result<(), String> {
    if ty.starts_with("tuple") && components.is_empty() {
        return Err(format!("tuple parameter '{name}' has no `components`"));
    }
    spec.resolve()
        .map(|_| ())
        .map_err(|err| format!("parameter '{name}' has invalid type '{ty}': {err}"))
}

fn param_specs(params: &[Param]) -> Result<Vec<ParamSpec>, String> {
    params
        .iter()
        .map(|param| {
            check_param(param, &param.name, &param.ty, &param.components)?;
            Ok(ParamSpec::new(param.name.clone(), param.selector_type().into_owned()))
        })
        .collect()
}

fn function_fragment(function: &Function) -> Result<Fragment, String> {
    Ok(Fragment::Function(FunctionSignature {
        selector: function.selector().0,
        name: function.name.clone(),
        signature: function.signature(),
        full_signature: function.full_signature(),
        inputs: param_specs(&function.inputs)?,
        outputs: param_specs(&function.outputs)?,
        state_mutability: from_alloy_mutability(function.state_mutability),
    }))
}

fn event_fragment(event: &Event) -> Result<Fragment, String> {
    let inputs = event
        .inputs
        .iter()
        .map(|param| {
            check_param(param, &param.name, &param.ty, &param.components)?;
            Ok(ParamSpec {
                name: param.name.clone(),
                kind: param.selector_type().into_owned(),
                indexed: param.indexed,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(Fragment::Event(EventSignature {
        topic: event.selector().0,
        name: event.name.clone(),
        signature: event.signature(),
        full_signature: event.full_signature(),
        inputs,
        anonymous: event.anonymous,
    }))
}

fn to_alloy_mutability(mutability: StateMutability) -> alloy_json_abi::StateMutability {
    match mutability {
        StateMutability::Pure => alloy_json_abi::StateMutability::Pure,
        StateMutability::View => alloy_json_abi::StateMutability::View,
        StateMutability::NonPayable => alloy_json_abi::StateMutability::NonPayable,
        StateMutability::Payable => alloy_json_abi::StateMutability::Payable,
    }
}

fn from_alloy_mutability(mutability: alloy_json_abi::StateMutability) -> StateMutability {
    match mutability {
        alloy_json_abi::StateMutability::Pure => StateMutability::Pure,
        alloy_json_abi::StateMutability::View => StateMutability::View,
        alloy_json_abi::StateMutability::NonPayable => StateMutability::NonPayable,
        alloy_json_abi::StateMutability::Payable => StateMutability::Payable,
    }
}
