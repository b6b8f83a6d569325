use http::{HeaderMap, StatusCode};
use rusoto_core::param::Params;
use rusoto_core::request::{HttpDispatchError, HttpResponse};
use rusoto_core::signature::{SignedRequest, SignedRequestPayload};
use rusoto_core::{ByteStream, DispatchSignedRequest};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Query parameters and body of one dispatched request.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub params: Params,
    pub payload: String,
}

pub(crate) fn payload_text(request: &SignedRequest) -> String {
    match &request.payload {
        Some(SignedRequestPayload::Buffer(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        _ => String::new(),
    }
}

/// Answers each request with the next page, in order, and records what was
/// asked. Once the pages run out every answer is an empty 200.
#[derive(Clone, Default)]
pub(crate) struct PagedDispatcher {
    pages: Arc<Mutex<VecDeque<String>>>,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl PagedDispatcher {
    pub fn with_pages(pages: Vec<String>) -> Self {
        PagedDispatcher {
            pages: Arc::new(Mutex::new(pages.into())),
            requests: Arc::default(),
        }
    }
}

impl DispatchSignedRequest for PagedDispatcher {
    fn dispatch(
        &self,
        request: SignedRequest,
        _timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpDispatchError>> + Send>> {
        self.requests.lock().unwrap().push(RecordedRequest {
            params: request.params.clone(),
            payload: payload_text(&request),
        });
        let body = self.pages.lock().unwrap().pop_front().unwrap_or_default();
        Box::pin(async move {
            Ok(HttpResponse {
                status: StatusCode::OK,
                body: ByteStream::from(body.into_bytes()),
                headers: HeaderMap::default(),
            })
        })
    }
}
