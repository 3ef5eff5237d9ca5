use serde_json::Value;

/// Accumulated per-request settings, built by applying [`RequestOption`]
/// mutators in order.
#[derive(Debug, Default)]
pub struct RequestOptions {
    body: Option<Value>,
    headers: Vec<(String, String)>,
}

/// A single mutation applied to the outgoing request before dispatch.
///
/// Options are applied in the order they are passed, so a later option
/// overrides an earlier one touching the same field.
pub type RequestOption = Box<dyn FnOnce(&mut RequestOptions) + Send>;

/// Set the JSON request body
pub fn with_body(body: Value) -> RequestOption {
    Box::new(move |options| options.body = Some(body))
}

/// Add a header to the outgoing request
pub fn with_header(name: impl Into<String>, value: impl Into<String>) -> RequestOption {
    let name = name.into();
    let value = value.into();
    Box::new(move |options| options.headers.push((name, value)))
}

impl RequestOptions {
    /// Apply the mutators in order and return the final settings
    pub fn assemble(options: Vec<RequestOption>) -> Self {
        let mut assembled = Self::default();
        for option in options {
            option(&mut assembled);
        }
        assembled
    }

    /// The JSON body, if one was set
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Extra headers in application order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}
