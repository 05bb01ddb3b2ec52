use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::TmcmcError;

/// Forward model `f(theta, x) -> prediction`.
pub trait ModelFunction: Send + Sync {
    /// Predicts the observable at `x` for parameters `theta`.
    fn predict(&self, theta: &[f64], x: f64) -> f64;
}

impl<F> ModelFunction for F
where
    F: Fn(&[f64], f64) -> f64 + Send + Sync,
{
    fn predict(&self, theta: &[f64], x: f64) -> f64 {
        self(theta, x)
    }
}

/// Name to model-function table supplied by the host application.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, Arc<dyn ModelFunction>>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn linear(theta: &[f64], x: f64) -> f64 {
    theta.first().copied().unwrap_or(0.0) * x
}

fn affine(theta: &[f64], x: f64) -> f64 {
    theta.first().copied().unwrap_or(0.0) + theta.get(1).copied().unwrap_or(0.0) * x
}

fn polynomial(theta: &[f64], x: f64) -> f64 {
    // Horner, highest degree last in theta.
    theta.iter().rev().fold(0.0, |acc, &coef| acc * x + coef)
}

fn exponential(theta: &[f64], x: f64) -> f64 {
    theta.first().copied().unwrap_or(0.0) * (theta.get(1).copied().unwrap_or(0.0) * x).exp()
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with `linear`, `affine`, `polynomial` and `exponential`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("linear", linear);
        registry.register("affine", affine);
        registry.register("polynomial", polynomial);
        registry.register("exponential", exponential);
        registry
    }

    /// Registers (or replaces) a model under `name`.
    pub fn register<M>(&mut self, name: impl Into<String>, model: M)
    where
        M: ModelFunction + 'static,
    {
        self.models.insert(name.into(), Arc::new(model));
    }

    /// Looks up a model by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ModelFunction>, TmcmcError> {
        self.models.get(name).cloned().ok_or_else(|| {
            TmcmcError::Model(
                ErrorInfo::new("unknown-model", format!("model `{name}` is not registered"))
                    .with_hint(format!(
                        "registered models: {}",
                        self.names().collect::<Vec<_>>().join(", ")
                    )),
            )
        })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.models.keys().map(String::as_str)
    }
}
