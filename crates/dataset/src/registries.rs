// SPDX-License-Identifier: MIT

//! The bundle of named-decoder registries every [`crate::dataset::Dataset`]
//! in one lineage DAG shares, so a transform attached anywhere in the chain
//! can look up its body by name regardless of which dataset constructed it.

use crate::builtin::install_builtins;
use crate::element::ElementRegistry;
use crate::transform::TransformRegistry;
use crate::zip::ZipRegistry;
use bndl_shuffle::CombinerRegistry;

#[derive(Clone)]
pub struct Registries {
    pub transforms: TransformRegistry,
    pub elements: ElementRegistry,
    pub zips: ZipRegistry,
    pub combiners: CombinerRegistry,
}

impl Registries {
    /// A fresh registry bundle with every `core.*` builtin already
    /// installed. Call once per worker (and once on the driver, to build
    /// lineage) and share the result across every dataset it constructs.
    pub fn new() -> Self {
        let transforms = TransformRegistry::new();
        let elements = ElementRegistry::new();
        let zips = ZipRegistry::new();
        let combiners = CombinerRegistry::new();
        install_builtins(&transforms, elements.clone(), combiners.clone(), &zips);
        Self { transforms, elements, zips, combiners }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registries_tests.rs"]
mod tests;
