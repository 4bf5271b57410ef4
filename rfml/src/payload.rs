//! The JSON shape a TestDocument takes on the wire when it is submitted to
//! the test-management service.

use serde::{Deserialize, Serialize};

use crate::document::TestDocument;
use crate::document::step::{ActionStep, EmbeddedTest, Step};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPayload {
    pub rfml_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub browser_json: Vec<BrowserState>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserState {
    pub name: String,
    pub state: BrowserStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserStatus {
    Enabled,
    Disabled,
}

/// One entry of the step sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Step { redirect: bool, element: StepElement },
    Test { redirect: bool, element: TestElement },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepElement {
    pub action: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestElement {
    pub rfml_id: String,
}

impl From<&Step> for Element {
    fn from(step: &Step) -> Self {
        match step {
            Step::Action(action) => Element::Step {
                redirect: action.redirect,
                element: StepElement {
                    action: action.action.clone(),
                    response: action.response.clone(),
                },
            },
            Step::Embedded(test) => Element::Test {
                redirect: test.redirect,
                element: TestElement {
                    rfml_id: test.rfml_id.clone(),
                },
            },
        }
    }
}

impl From<Element> for Step {
    fn from(element: Element) -> Self {
        match element {
            Element::Step { redirect, element } => Step::Action(ActionStep {
                action: element.action,
                response: element.response,
                redirect,
            }),
            Element::Test { redirect, element } => Step::Embedded(EmbeddedTest {
                rfml_id: element.rfml_id,
                redirect,
            }),
        }
    }
}

impl From<&TestDocument> for TestPayload {
    fn from(doc: &TestDocument) -> Self {
        TestPayload {
            rfml_id: doc.rfml_id.clone(),
            title: doc.title.clone(),
            start_uri: doc.start_uri.clone(),
            site_id: doc.site_id,
            description: doc.description.clone(),
            tags: doc.tags.clone(),
            browser_json: doc
                .browsers
                .iter()
                .map(|name| BrowserState {
                    name: name.clone(),
                    state: BrowserStatus::Enabled,
                })
                .collect(),
            elements: doc.steps.iter().map(Element::from).collect(),
        }
    }
}

/// Disabled browsers are dropped: a document only lists browsers to run on.
impl From<TestPayload> for TestDocument {
    fn from(payload: TestPayload) -> Self {
        TestDocument {
            rfml_id: payload.rfml_id,
            title: payload.title,
            start_uri: payload.start_uri,
            site_id: payload.site_id,
            description: payload.description,
            tags: payload.tags,
            browsers: payload
                .browser_json
                .into_iter()
                .filter(|browser| browser.state == BrowserStatus::Enabled)
                .map(|browser| browser.name)
                .collect(),
            steps: payload.elements.into_iter().map(Step::from).collect(),
        }
    }
}
