//! Skills: the named callables MiniSpec programs invoke
//!
//! - **Low-level skills** run synchronously and return a value plus a replan
//!   flag. Side effects (motion, I/O) belong to them, not to the interpreter.
//! - **High-level skills** return MiniSpec source text, which the interpreter
//!   parses and evaluates as a nested program with a fresh environment.
//!
//! The two registries are built once and injected into the interpreter as a
//! [`Skills`] handle; nothing here is global.

pub mod console;
pub mod library;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::interpreter::types::Value;

/* ===================== Skill Traits ===================== */

/// A skill that executes immediately
pub trait LowLevelSkill: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Run the skill
    ///
    /// Recoverable failures are reported by returning `true` as the second
    /// element (a replan request), never by panicking.
    fn execute(&self, args: &[String]) -> (Value, bool);
}

/// A skill that expands into MiniSpec source text
pub trait HighLevelSkill: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn execute(&self, args: &[String]) -> String;
}

/* ===================== Registries ===================== */

/// Name-to-skill lookup table
pub struct Registry<T: ?Sized> {
    skills: BTreeMap<String, Arc<T>>,
}

pub type LowLevelSkills = Registry<dyn LowLevelSkill>;
pub type HighLevelSkills = Registry<dyn HighLevelSkill>;

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self {
            skills: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.skills.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    /// Skill names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.skills.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<T>)> {
        self.skills.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Add every skill of `other`, replacing same-named entries
    pub fn extend(&mut self, other: Registry<T>) {
        self.skills.extend(other.skills);
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.skills.keys()).finish()
    }
}

impl Registry<dyn LowLevelSkill> {
    pub fn register(&mut self, skill: impl LowLevelSkill + 'static) -> &mut Self {
        self.skills.insert(skill.name().to_string(), Arc::new(skill));
        self
    }

    pub fn with(mut self, skill: impl LowLevelSkill + 'static) -> Self {
        self.register(skill);
        self
    }
}

impl Registry<dyn HighLevelSkill> {
    pub fn register(&mut self, skill: impl HighLevelSkill + 'static) -> &mut Self {
        self.skills.insert(skill.name().to_string(), Arc::new(skill));
        self
    }

    pub fn with(mut self, skill: impl HighLevelSkill + 'static) -> Self {
        self.register(skill);
        self
    }
}

/* ===================== Dispatch ===================== */

/// A resolved skill
#[derive(Clone)]
pub enum Skill {
    LowLevel(Arc<dyn LowLevelSkill>),
    HighLevel(Arc<dyn HighLevelSkill>),
}

/// Both registries, shared by an interpreter and every nested expansion
#[derive(Debug, Clone, Default)]
pub struct Skills {
    low_level: Arc<LowLevelSkills>,
    high_level: Arc<HighLevelSkills>,
}

impl Skills {
    pub fn new(low_level: LowLevelSkills, high_level: HighLevelSkills) -> Self {
        Self {
            low_level: Arc::new(low_level),
            high_level: Arc::new(high_level),
        }
    }

    pub fn low_level(&self) -> &LowLevelSkills {
        &self.low_level
    }

    pub fn high_level(&self) -> &HighLevelSkills {
        &self.high_level
    }

    /// Look a name up, low-level registry first
    pub fn resolve(&self, name: &str) -> Option<Skill> {
        if let Some(skill) = self.low_level.get(name) {
            return Some(Skill::LowLevel(skill));
        }
        self.high_level.get(name).map(Skill::HighLevel)
    }
}

/* ===================== Skill Adapters ===================== */

/// Low-level skill backed by a closure
pub struct FnSkill<F> {
    name: String,
    description: String,
    f: F,
}

impl<F> FnSkill<F>
where
    F: Fn(&[String]) -> (Value, bool) + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            f,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl<F> LowLevelSkill for FnSkill<F>
where
    F: Fn(&[String]) -> (Value, bool) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&self, args: &[String]) -> (Value, bool) {
        (self.f)(args)
    }
}

/// High-level skill defined by MiniSpec text with `$1..$n` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSkill {
    name: String,
    description: String,
    definition: String,
}

impl TemplateSkill {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            definition: definition.into(),
        }
    }
}

impl HighLevelSkill for TemplateSkill {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&self, args: &[String]) -> String {
        // Highest index first so `$1` never eats the prefix of `$10`
        args.iter()
            .enumerate()
            .rev()
            .fold(self.definition.clone(), |text, (i, arg)| {
                text.replace(&format!("${}", i + 1), arg)
            })
    }
}
