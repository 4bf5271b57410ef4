/// A single entry in a test's step sequence.
/// Steps execute in the order they appear in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// An action to perform paired with the expected response.
    Action(ActionStep),
    /// Another test spliced in at this position: `- other_test_id`
    Embedded(EmbeddedTest),
}

/// An instruction/expected-outcome pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStep {
    pub action: String,
    /// Empty when the source never supplied a response line.
    pub response: String,
    /// Navigation tracking restarts at this step.
    pub redirect: bool,
}

/// A reference to a previously authored test, by RFML ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedTest {
    pub rfml_id: String,
    pub redirect: bool,
}

impl Step {
    pub fn redirect(&self) -> bool {
        match self {
            Step::Action(step) => step.redirect,
            Step::Embedded(test) => test.redirect,
        }
    }
}
