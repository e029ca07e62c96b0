//! ABI registry - stores the loaded fragments by selector and topic hash

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A function or event parameter specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name (may be empty)
    pub name: String,
    /// Canonical Solidity type (e.g., "address", "uint256", "(uint256,address)[]")
    pub kind: String,
    /// Whether the parameter is carried in a topic (events only)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub indexed: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            indexed: false,
        }
    }

    /// Parameter name, or `arg{idx}` when the ABI leaves it empty
    pub fn display_name(&self, idx: usize) -> String {
        if self.name.trim().is_empty() {
            format!("arg{idx}")
        } else {
            self.name.clone()
        }
    }
}

/// Function state mutability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    #[default]
    NonPayable,
    Payable,
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pure => "pure",
            Self::View => "view",
            Self::NonPayable => "nonpayable",
            Self::Payable => "payable",
        };
        f.write_str(s)
    }
}

/// A function signature with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// 4-byte function selector
    pub selector: [u8; 4],
    /// Function name
    pub name: String,
    /// Canonical signature (e.g., "transfer(address,uint256)")
    pub signature: String,
    /// Human-readable signature with names and returns clause
    pub full_signature: String,
    /// Input parameters
    pub inputs: Vec<ParamSpec>,
    /// Output parameters
    pub outputs: Vec<ParamSpec>,
    pub state_mutability: StateMutability,
}

impl FunctionSignature {
    /// Get selector as hex string
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }
}

/// An event signature with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSignature {
    /// keccak256 of the canonical signature, i.e. `topics[0]` of a log
    pub topic: [u8; 32],
    /// Event name
    pub name: String,
    /// Canonical signature (e.g., "Transfer(address,address,uint256)")
    pub signature: String,
    /// Human-readable signature with names and `indexed` markers
    pub full_signature: String,
    /// Parameters in declaration order, indexed and not
    pub inputs: Vec<ParamSpec>,
    pub anonymous: bool,
}

impl EventSignature {
    /// Get topic hash as hex string
    pub fn topic_hex(&self) -> String {
        format!("0x{}", hex::encode(self.topic))
    }

    /// Number of parameters carried in topics
    pub fn indexed_count(&self) -> usize {
        self.inputs.iter().filter(|p| p.indexed).count()
    }
}

/// One validated entry of an ABI description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Function(FunctionSignature),
    Event(EventSignature),
}

/// Registry of the fragments of one ABI description
///
/// Functions are indexed by selector and events by topic hash; both keep
/// their declaration order for listing.
#[derive(Debug, Default, Clone)]
pub struct AbiRegistry {
    functions: Vec<FunctionSignature>,
    events: Vec<EventSignature>,
    by_selector: HashMap<[u8; 4], usize>,
    by_topic: HashMap<[u8; 32], usize>,
    /// Entries accepted but not addressable (constructor, fallback, receive, error)
    pub skipped: usize,
}

impl AbiRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from fragments in declaration order
    pub fn from_fragments(fragments: impl IntoIterator<Item = Fragment>) -> Self {
        let mut registry = Self::new();
        for fragment in fragments {
            registry.insert(fragment);
        }
        registry
    }

    /// Insert a fragment
    ///
    /// Note: First fragment for a given selector or topic wins the lookup slot;
    /// later duplicates are still listed.
    pub fn insert(&mut self, fragment: Fragment) {
        match fragment {
            Fragment::Function(function) => {
                let idx = self.functions.len();
                self.by_selector.entry(function.selector).or_insert(idx);
                self.functions.push(function);
            }
            Fragment::Event(event) => {
                let idx = self.events.len();
                // Anonymous events have no signature topic to dispatch on
                if !event.anonymous {
                    self.by_topic.entry(event.topic).or_insert(idx);
                }
                self.events.push(event);
            }
        }
    }

    /// Look up a function by selector
    pub fn lookup(&self, selector: [u8; 4]) -> Option<&FunctionSignature> {
        self.by_selector.get(&selector).map(|&idx| &self.functions[idx])
    }

    /// Look up a function by selector hex string (e.g., "0xa9059cbb")
    pub fn lookup_hex(&self, selector_hex: &str) -> Option<&FunctionSignature> {
        let normalized = selector_hex
            .strip_prefix("0x")
            .or_else(|| selector_hex.strip_prefix("0X"))
            .unwrap_or(selector_hex);

        if normalized.len() != 8 {
            return None;
        }

        let bytes = hex::decode(normalized).ok()?;
        let selector: [u8; 4] = bytes.try_into().ok()?;
        self.lookup(selector)
    }

    /// Look up an event by its signature topic
    pub fn lookup_event(&self, topic: [u8; 32]) -> Option<&EventSignature> {
        self.by_topic.get(&topic).map(|&idx| &self.events[idx])
    }

    /// Functions sharing a name, in declaration order
    pub fn functions_named(&self, name: &str) -> Vec<&FunctionSignature> {
        self.functions.iter().filter(|f| f.name == name).collect()
    }

    /// Look up a function by its canonical signature
    pub fn function_by_signature(&self, signature: &str) -> Option<&FunctionSignature> {
        self.functions.iter().find(|f| f.signature == signature)
    }

    /// Get the number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry holds no functions and no events
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.events.is_empty()
    }

    /// Get all functions in declaration order
    pub fn functions(&self) -> &[FunctionSignature] {
        &self.functions
    }

    /// Get all events in declaration order
    pub fn events(&self) -> &[EventSignature] {
        &self.events
    }
}
