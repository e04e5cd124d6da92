//! Response envelope and request framing
//!
//! Every dns-master response is wrapped in
//!
//! ```text
//! <response>
//!     <status>success|fail</status>
//!     <errors><error code="4097">...</error></errors>
//!     <data>...</data>
//! </response>
//! ```
//!
//! Write requests carry records as `<request><rr-list><rr/>...</rr-list></request>`.

use crate::error::{Error, Result};
use crate::xml::Element;

/// Status value of a successful response
pub const STATUS_SUCCESS: &str = "success";

/// One `<error>` entry of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub code: Option<String>,
    pub message: String,
}

/// A parsed response envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    status: String,
    errors: Vec<ErrorEntry>,
    data: Option<Element>,
}

impl Envelope {
    /// Parse a response body
    pub fn parse(body: &str) -> Result<Self> {
        let root = Element::parse(body)?;

        let status = root
            .find_text("status")
            .ok_or_else(|| Error::protocol(format!("Can't find <status> in response: {body}")))?
            .trim()
            .to_string();

        let errors = root
            .find_all("errors/error")
            .into_iter()
            .map(|error| ErrorEntry {
                code: error.attribute("code").map(str::to_string),
                message: error.text().unwrap_or("").trim().to_string(),
            })
            .collect();

        let data = root.find("data").cloned();

        Ok(Self {
            status,
            errors,
            data,
        })
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    pub fn data(&self) -> Option<&Element> {
        self.data.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Server error text, `Code: <code>. <message>` per entry, space-joined
    ///
    /// A failed envelope without error entries yields a synthesized message.
    pub fn error_text(&self) -> String {
        if self.errors.is_empty() {
            return if self.is_success() {
                String::new()
            } else {
                format!("Request failed with status '{}'", self.status)
            };
        }

        self.errors
            .iter()
            .map(|entry| {
                format!(
                    "Code: {}. {}",
                    entry.code.as_deref().unwrap_or(""),
                    entry.message
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fail with [`Error::Api`] unless the status is success
    pub fn into_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::api(self.error_text()))
        }
    }

    /// Children of `<data>`; a missing `<data>` is an empty list
    pub fn into_data_list(self) -> Vec<Element> {
        self.data
            .map(|data| data.children().to_vec())
            .unwrap_or_default()
    }

    /// The `<data>` element, which must be present
    ///
    /// `raw_body` is embedded in the error for diagnosis.
    pub fn require_data(self, raw_body: &str) -> Result<Element> {
        self.data.ok_or_else(|| {
            Error::MissingData(format!("Can't find <data> in response: {raw_body}"))
        })
    }
}

/// Frame encoded `<rr>` elements as a write request document
pub fn build_request(records: &[Element]) -> Result<String> {
    let rr_list = records
        .iter()
        .cloned()
        .fold(Element::new("rr-list"), Element::with_child);
    Element::new("request").with_child(rr_list).to_document()
}
