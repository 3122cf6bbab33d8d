//! Pass manager for orchestrating optimization.

use serde::Serialize;
use tracing::{debug, info, instrument};

use qopt_ir::CircuitDag;

use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;
use crate::passes::{HadamardReduction, RotationCnotCancellation};

/// What one pass did to the DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Name of the pass.
    pub pass: String,
    /// 1-based round the pass ran in.
    pub round: usize,
    /// Vertex count before the pass.
    pub ops_before: usize,
    /// Vertex count after the pass.
    pub ops_after: usize,
}

impl PassReport {
    /// Number of gates the pass removed.
    pub fn removed(&self) -> usize {
        self.ops_before.saturating_sub(self.ops_after)
    }
}

/// Manages and executes a sequence of rewrite passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
    /// How many times the pass list may be repeated.
    iterations: usize,
    /// Check DAG integrity after every pass.
    verify: bool,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self {
            passes: vec![],
            iterations: 1,
            verify: false,
        }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given DAG.
    ///
    /// The pass list is repeated up to the configured number of rounds and
    /// stops early after a round that removed no gates.
    #[instrument(skip(self, dag))]
    pub fn run(&self, dag: &mut CircuitDag) -> CompileResult<Vec<PassReport>> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits and {} ops",
            self.passes.len(),
            dag.num_qubits(),
            dag.num_ops()
        );

        let mut reports = Vec::new();
        for round in 1..=self.iterations {
            let round_start = dag.num_ops();

            for pass in &self.passes {
                if !pass.should_run(dag) {
                    debug!("Skipping pass: {}", pass.name());
                    continue;
                }
                debug!("Running pass: {} (round {})", pass.name(), round);
                let ops_before = dag.num_ops();
                pass.run(dag)?;
                if self.verify {
                    dag.verify_integrity()
                        .map_err(|e| CompileError::PassFailed {
                            name: pass.name().to_string(),
                            reason: e.to_string(),
                        })?;
                }
                debug!("Pass {} completed, ops: {}", pass.name(), dag.num_ops());
                reports.push(PassReport {
                    pass: pass.name().to_string(),
                    round,
                    ops_before,
                    ops_after: dag.num_ops(),
                });
            }

            if dag.num_ops() == round_start {
                debug!("Round {} removed nothing, stopping", round);
                break;
            }
        }

        info!(
            "Pass manager completed, final depth: {}, ops: {}",
            dag.depth()?,
            dag.num_ops()
        );

        Ok(reports)
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating pass managers.
pub struct PassManagerBuilder {
    hadamard_reduction: bool,
    cancellation: bool,
    iterations: usize,
    verify: bool,
}

impl PassManagerBuilder {
    /// Create a new builder with both passes enabled and a single round.
    pub fn new() -> Self {
        Self {
            hadamard_reduction: true,
            cancellation: true,
            iterations: 1,
            verify: false,
        }
    }

    /// Enable or disable Hadamard gate reduction.
    #[must_use]
    pub fn with_hadamard_reduction(mut self, enabled: bool) -> Self {
        self.hadamard_reduction = enabled;
        self
    }

    /// Enable or disable rotation and CNOT cancellation.
    #[must_use]
    pub fn with_cancellation(mut self, enabled: bool) -> Self {
        self.cancellation = enabled;
        self
    }

    /// Set the maximum number of rounds. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Check DAG integrity after every pass.
    #[must_use]
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Build the pass manager.
    pub fn build(self) -> PassManager {
        let mut pm = PassManager::new();
        pm.iterations = self.iterations;
        pm.verify = self.verify;

        if self.hadamard_reduction {
            pm.add_pass(HadamardReduction::new());
        }
        if self.cancellation {
            pm.add_pass(RotationCnotCancellation::new());
        }

        pm
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
