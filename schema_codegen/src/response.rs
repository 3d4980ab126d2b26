//! HTTP response shaping
//!
//! The router owns transport; this module decides the status code and JSON
//! body so the router can forward them unchanged.

use serde::Serialize;

use crate::diagnostics::{DiagnosticKind, INTERNAL_ERROR_MESSAGE};
use crate::package::ArtifactStore;
use crate::pipeline::{GenerationRequest, GenerationResult, Generator};
use crate::schema::InputKind;

/// Endpoint a request arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `POST /generate` with a DDL script
    Generate,
    /// `POST /csv` with a CSV sample
    Csv,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Generate => "/generate",
            Endpoint::Csv => "/csv",
        }
    }

    pub fn input_kind(&self) -> InputKind {
        match self {
            Endpoint::Generate => InputKind::Ddl,
            Endpoint::Csv => InputKind::Csv,
        }
    }
}

/// JSON body returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Zip { zip: String },
    Path { path: String },
    Errors { errors: Vec<String> },
}

/// Status code and body of a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl GenerateResponse {
    pub fn success(endpoint: Endpoint, path: String) -> Self {
        let body = match endpoint {
            Endpoint::Generate => ResponseBody::Zip { zip: path },
            Endpoint::Csv => ResponseBody::Path { path },
        };
        Self { status: 200, body }
    }

    pub fn errors(status: u16, errors: Vec<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Errors { errors },
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Serialized body
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(&self.body)?)
    }
}

/// Status code for a failed result
pub fn error_status(result: &GenerationResult) -> u16 {
    let kinds: Vec<DiagnosticKind> = result.errors().iter().map(|d| d.kind).collect();
    if kinds.contains(&DiagnosticKind::EmissionInvariant) {
        500
    } else if kinds.contains(&DiagnosticKind::LimitExceeded) {
        413
    } else {
        400
    }
}

/// Run a request end to end and shape the response
pub async fn respond(
    generator: &Generator,
    store: &dyn ArtifactStore,
    endpoint: Endpoint,
    request: &GenerationRequest,
) -> GenerateResponse {
    let result = generator.generate(request).await;

    let artifact = match &result {
        GenerationResult::Artifact(artifact) => artifact,
        GenerationResult::Errors(_) => {
            return GenerateResponse::errors(error_status(&result), result.messages());
        }
    };

    match store.store(artifact).await {
        Ok(path) => GenerateResponse::success(endpoint, path),
        Err(e) => {
            tracing::error!(request_id = %request.id, error = %e, "Failed to store artifact");
            GenerateResponse::errors(500, vec![INTERNAL_ERROR_MESSAGE.to_string()])
        }
    }
}
