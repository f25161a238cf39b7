// shared value types: ids, reference kinds, weights, annotations
use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::graph::GraphError;

pub type ComponentId = u32;

pub type ActivationFn = fn(&Context) -> f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ReferenceKind {
    Direct,
    Indirect,
    Virtual,
    Annotated,
}

/// Confidence value in `[0, 1]`, checked on construction.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Weight(f64);

impl Weight {
    pub const ZERO: Weight = Weight(0.0);
    pub const ONE: Weight = Weight(1.0);

    pub fn new(value: f64) -> Result<Self, GraphError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Weight(value))
        } else {
            Err(GraphError::WeightOutOfRange { value })
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Weight {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Weight {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    Empty,
    Symbol(String),
    Bytes(Vec<u8>),
    Score(Weight),
}

#[derive(Debug, Clone, Copy)]
pub enum Activation {
    Fixed(Weight),
    //non-Score contexts activate at zero
    Score,
    Custom(ActivationFn),
}

impl Activation {
    pub fn evaluate(&self, context: &Context) -> Result<Weight, GraphError> {
        match self {
            Activation::Fixed(w) => Ok(*w),
            Activation::Score => match context {
                Context::Score(w) => Ok(*w),
                _ => Ok(Weight::ZERO),
            },
            //user predicates are untrusted, range check the output
            Activation::Custom(f) => Weight::new(f(context)),
        }
    }

    pub fn same_as(&self, other: &Activation) -> bool {
        match (self, other) {
            (Activation::Fixed(a), Activation::Fixed(b)) => a == b,
            (Activation::Score, Activation::Score) => true,
            (Activation::Custom(a), Activation::Custom(b)) => std::ptr::fn_addr_eq(*a, *b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub key: String,
    //insertion ordered, never empty
    pub contexts: Vec<Context>,
    pub activation: Option<Activation>,
}

impl Annotation {
    pub fn new(key: impl Into<String>, context: Context) -> Self {
        Annotation {
            key: key.into(),
            contexts: vec![context],
            activation: None,
        }
    }

    pub fn anchor(key: impl Into<String>) -> Self {
        Annotation::new(key, Context::Empty)
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = Some(activation);
        self
    }

    //max over contexts, earliest wins ties
    pub fn activation_value(&self) -> Result<Option<Weight>, GraphError> {
        let Some(activation) = self.activation else {
            return Ok(None);
        };

        let mut best: Option<Weight> = None;
        for ctx in &self.contexts {
            let w = activation.evaluate(ctx)?;
            match best {
                Some(b) if b.get() >= w.get() => {}
                _ => best = Some(w),
            }
        }
        Ok(best)
    }
}

//unique by key, iterates in key order
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    pub(crate) entries: BTreeMap<String, Annotation>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Annotation> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn covers(&self, other: &AnnotationSet) -> bool {
        other.iter().all(|theirs| match self.entries.get(&theirs.key) {
            Some(ours) => theirs.contexts.iter().all(|c| ours.contexts.contains(c)),
            None => false,
        })
    }
}
