//! Scenario builder API.

use doorlock_core::Timing;

use crate::{HarnessError, Node, World, scenario::OracleFn};

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Press each key printed in the string.
    Keys(String),
    /// Let this many seconds pass.
    Wait(u32),
    /// Raw bytes appear on the link from the given node.
    Inject {
        /// Apparent sender.
        from: Node,
        /// Bytes.
        bytes: Vec<u8>,
    },
}

/// Scenario builder.
///
/// Must call `.oracle()` to get a [`RunnableScenario`].
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    timing: Timing,
    steps: Vec<Step>,
}

impl Scenario {
    /// Empty script with default timing.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), timing: Timing::default(), steps: Vec::new() }
    }

    /// Override the timing both nodes use.
    pub const fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Press raw keys.
    pub fn keys(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::Keys(text.into()));
        self
    }

    /// Type `digits` and press `=`.
    pub fn enter(self, digits: &str) -> Self {
        self.keys(format!("{digits}="))
    }

    /// Enroll `digits` with a matching confirmation.
    pub fn enroll(self, digits: &str) -> Self {
        self.enter(digits).enter(digits)
    }

    /// Pick "open door" from the menu.
    pub fn open_door(self) -> Self {
        self.keys("+")
    }

    /// Pick "change password" from the menu.
    pub fn change_password(self) -> Self {
        self.keys("-")
    }

    /// Let `seconds` pass.
    pub fn wait(mut self, seconds: u32) -> Self {
        self.steps.push(Step::Wait(seconds));
        self
    }

    /// Put raw bytes on the link.
    pub fn inject(mut self, from: Node, bytes: impl Into<Vec<u8>>) -> Self {
        self.steps.push(Step::Inject { from, bytes: bytes.into() });
        self
    }

    /// Set the oracle and return a runnable scenario.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Start the world, play every step, then consult the oracle.
    pub fn run(self) -> Result<(), HarnessError> {
        let Scenario { name, timing, steps } = self.scenario;
        let mut world = World::new(timing);
        world.start()?;

        for step in &steps {
            tracing::debug!(scenario = %name, ?step, "scenario step");
            match step {
                Step::Keys(text) => world.type_text(text)?,
                Step::Wait(seconds) => world.tick_for(*seconds)?,
                Step::Inject { from, bytes } => world.inject(*from, bytes)?,
            }
        }

        (self.oracle)(&world).map_err(|reason| HarnessError::Oracle { scenario: name, reason })
    }
}
