use std::ops::Range;

use crate::document::TestDocument;
use crate::document::step::{ActionStep, EmbeddedTest, Step};
use crate::parser::directive::Directive;
use crate::parser::error::ParseError;
use crate::parser::line::{Line, classify};
use crate::sink::DiagnosticSink;

// ---------------------------------------------------------------------------
// Assembly state
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum State {
    /// Nothing but blank lines seen so far.
    AwaitingHeader,
    /// Last significant line was an identity, directive or comment, and no
    /// step is open.
    InDescriptionRun,
    BuildingStep(PartialStep),
    /// A step was just finalized.
    BetweenSteps,
}

#[derive(Debug)]
struct PartialStep {
    action: String,
    response: Option<String>,
    redirect: bool,
}

impl PartialStep {
    fn new(action: &str, redirect: bool) -> Self {
        PartialStep {
            action: action.to_string(),
            response: None,
            redirect,
        }
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.response {
            Some(response) => {
                response.push('\n');
                response.push_str(text);
            }
            None => self.response = Some(text.to_string()),
        }
    }

    fn into_step(self) -> Step {
        Step::Action(ActionStep {
            action: self.action,
            response: self.response.unwrap_or_default(),
            redirect: self.redirect,
        })
    }
}

/// Builds one TestDocument from a forward pass over its lines.
/// `finish` consumes the assembler, so an instance can only ever produce one
/// document.
pub(crate) struct Assembler<'s> {
    doc: TestDocument,
    state: State,
    /// A redirect seen while no step was open: (value, line number).
    pending_redirect: Option<(bool, usize)>,
    file_id: usize,
    sink: &'s mut dyn DiagnosticSink,
}

impl<'s> Assembler<'s> {
    pub(crate) fn new(file_id: usize, sink: &'s mut dyn DiagnosticSink) -> Self {
        Assembler {
            doc: TestDocument::empty(),
            state: State::AwaitingHeader,
            pending_redirect: None,
            file_id,
            sink,
        }
    }

    /// Consume one line. On error the document under construction must be
    /// discarded.
    pub(crate) fn feed(
        &mut self,
        number: usize,
        text: &str,
        span: Range<usize>,
    ) -> Result<(), ParseError> {
        let line = classify(text);
        self.sink.line(number, text, line.kind());

        match line {
            Line::Identity(id) => {
                self.doc.rfml_id = id.to_string();
                self.enter_description_run();
            }
            Line::Directive { key, value } => {
                let directive = Directive::parse(key, value)
                    .map_err(|reason| ParseError::new(number, reason, span.clone(), self.file_id))?;
                if let Some(Directive::Redirect(redirect)) = directive.apply(&mut self.doc) {
                    self.set_redirect(redirect, number);
                }
                self.enter_description_run();
            }
            Line::Comment(content) => {
                self.doc.description.push_str(content);
                self.doc.description.push('\n');
                self.enter_description_run();
            }
            Line::Blank => self.finalize_step(),
            Line::Embedded(rfml_id) => {
                if rfml_id.is_empty() {
                    return Err(ParseError::new(
                        number,
                        "Embedded test must name an RFML ID.",
                        span,
                        self.file_id,
                    ));
                }
                self.finalize_step();
                let redirect = self.take_pending_redirect();
                self.push_step(Step::Embedded(EmbeddedTest {
                    rfml_id: rfml_id.to_string(),
                    redirect,
                }));
                self.state = State::BetweenSteps;
            }
            Line::Text(text) => {
                if let State::BuildingStep(partial) = &mut self.state {
                    partial.push_text(text);
                } else {
                    let redirect = self.take_pending_redirect();
                    self.state = State::BuildingStep(PartialStep::new(text, redirect));
                }
            }
        }

        Ok(())
    }

    /// End of input: flush the trailing step and hand over the document.
    pub(crate) fn finish(mut self) -> TestDocument {
        self.finalize_step();
        if let Some((_, line)) = self.pending_redirect.take() {
            self.sink
                .note(line, "redirect directive has no following step; ignored");
        }
        self.doc
    }

    fn enter_description_run(&mut self) {
        if matches!(self.state, State::AwaitingHeader | State::BetweenSteps) {
            self.state = State::InDescriptionRun;
        }
    }

    /// Redirect attaches to the open step if there is one, otherwise to the
    /// next step started.
    fn set_redirect(&mut self, redirect: bool, number: usize) {
        match &mut self.state {
            State::BuildingStep(partial) => partial.redirect = redirect,
            _ => self.pending_redirect = Some((redirect, number)),
        }
    }

    fn take_pending_redirect(&mut self) -> bool {
        self.pending_redirect
            .take()
            .map(|(redirect, _)| redirect)
            .unwrap_or(false)
    }

    fn finalize_step(&mut self) {
        if !matches!(self.state, State::BuildingStep(_)) {
            return;
        }
        if let State::BuildingStep(partial) =
            std::mem::replace(&mut self.state, State::BetweenSteps)
        {
            self.push_step(partial.into_step());
        }
    }

    fn push_step(&mut self, step: Step) {
        self.sink.step(self.doc.steps.len(), &step);
        self.doc.steps.push(step);
    }
}
