//! Pass trait for rewrite passes.

use qopt_ir::CircuitDag;

use crate::error::CompileResult;

/// A rewrite pass that operates on a circuit DAG.
///
/// Passes are the unit of work scheduled by the
/// [`PassManager`](crate::PassManager). Each pass rewrites the DAG in place.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Run the pass on the given DAG.
    fn run(&self, dag: &mut CircuitDag) -> CompileResult<()>;

    /// Check if this pass should run based on current state.
    ///
    /// This can be overridden to skip passes that have nothing to match.
    fn should_run(&self, _dag: &CircuitDag) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestPass;

    impl Pass for TestPass {
        fn name(&self) -> &'static str {
            "test"
        }

        fn run(&self, _dag: &mut CircuitDag) -> CompileResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_should_run() {
        let pass = TestPass;
        assert_eq!(pass.name(), "test");
        assert!(pass.should_run(&CircuitDag::new(1)));
    }
}
