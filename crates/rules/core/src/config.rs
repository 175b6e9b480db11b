/// Engine limits and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Upper bound on fixed-point passes per evaluation.
    ///
    /// Acyclic rule sets settle in one or two passes because targets are
    /// visited in dependency order; anything still changing after this many
    /// passes is treated as a non-converging cycle.
    pub max_passes: usize,
}

impl EngineConfig {
    // ===== compile-time limits applied while parsing formulas =====
    /// Maximum nesting depth of a formula expression.
    pub const MAX_FORMULA_DEPTH: usize = 64;
    /// Maximum length of formula source text, in bytes.
    pub const MAX_FORMULA_LEN: usize = 4096;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_PASSES: usize = 64;

    pub fn new() -> Self {
        Self {
            max_passes: Self::DEFAULT_MAX_PASSES,
        }
    }

    pub fn with_max_passes(max_passes: usize) -> Self {
        Self {
            max_passes: max_passes.max(1),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
