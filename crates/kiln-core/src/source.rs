//! Where module declarations come from.

use crate::constraint::ConstraintSet;
use crate::module::Module;

/// Declared modules and constraint sets, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub modules: Vec<Module>,
    pub constraint_sets: Vec<ConstraintSet>,
}

impl Declarations {
    pub fn new(modules: Vec<Module>, constraint_sets: Vec<ConstraintSet>) -> Self {
        Self {
            modules,
            constraint_sets,
        }
    }
}

/// Anything that can yield module declarations: a parsed `Kiln.toml`, a test
/// fixture, or another build description.
pub trait ModuleSource {
    fn load(&self) -> miette::Result<Declarations>;
}

impl ModuleSource for Declarations {
    fn load(&self) -> miette::Result<Declarations> {
        Ok(self.clone())
    }
}
