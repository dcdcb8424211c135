use crate::egg::Egg;

/// What happens when nothing else supplies a parameter
#[derive(Debug, Clone)]
pub enum ParamDefault {
    /// No default - the parameter must be resolved or available
    Required,
    /// The callable falls back to its own default
    Optional,
    /// The default is itself an egg
    Egg(Egg),
}

/// A declared parameter of a provider or target
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    annotation: Option<Egg>,
    default: ParamDefault,
}
impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Param {
            name: name.into(),
            annotation: None,
            default: ParamDefault::Required,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Param {
            default: ParamDefault::Optional,
            ..Param::required(name)
        }
    }

    /// Attaches an egg to the parameter's declaration
    pub fn inject(self, egg: Egg) -> Self {
        Param {
            annotation: Some(egg),
            ..self
        }
    }

    pub fn with_default(self, default: ParamDefault) -> Self {
        Param { default, ..self }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> Option<&Egg> {
        self.annotation.as_ref()
    }

    pub fn default_value(&self) -> &ParamDefault {
        &self.default
    }

    pub fn has_default(&self) -> bool {
        !matches!(self.default, ParamDefault::Required)
    }
}

/// Finds the egg declared on a parameter
///
/// An egg attached to the declaration wins over an egg given as default.
pub fn find_marker(param: &Param) -> Option<&Egg> {
    if let Some(egg) = &param.annotation {
        return Some(egg);
    }

    match &param.default {
        ParamDefault::Egg(egg) => Some(egg),
        _ => None,
    }
}

/// Ordered parameter declaration of a provider or target
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
}
impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing an earlier one with the same name
    pub fn with(mut self, param: Param) -> Self {
        match self.params.iter_mut().find(|p| p.name == param.name) {
            Some(existing) => *existing = param,
            None => self.params.push(param),
        }
        self
    }

    /// A parameter taken from the available values by name
    pub fn param(self, name: impl Into<String>) -> Self {
        self.with(Param::required(name))
    }

    /// A parameter taken by name if available, otherwise left to its default
    pub fn optional(self, name: impl Into<String>) -> Self {
        self.with(Param::optional(name))
    }

    /// A parameter hatched from `egg`
    pub fn inject(self, name: impl Into<String>, egg: Egg) -> Self {
        self.with(Param::required(name).inject(egg))
    }

    /// A parameter whose default is `egg`
    pub fn inject_default(self, name: impl Into<String>, egg: Egg) -> Self {
        self.with(Param::required(name).with_default(ParamDefault::Egg(egg)))
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(Param::name)
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
