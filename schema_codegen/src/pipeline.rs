//! Generation pipeline
//!
//! Runs one request through the stages: size limit, target validation,
//! parsing, type resolution, emission and packaging. Limit and target errors
//! stop the request at once; parse and resolution errors are collected so the
//! caller sees every problem in one response.

use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::diagnostics::{user_messages, Diagnostic, DiagnosticKind, Diagnostics, Location};
use crate::dialect::{resolve_schema, Dialect};
use crate::emit::{typemap, CodeEmitter, EmissionUnit, Language};
use crate::error::{Error, Result};
use crate::package::{Artifact, Packager};
use crate::schema::{parse_into, InputKind, ParseOptions};

/// One generation request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub id: Uuid,
    pub input: Vec<u8>,
    pub kind: InputKind,
    /// Name of the uploaded file; CSV tables are named after it
    pub source_name: String,
    /// Requested language identifier, validated by the pipeline
    pub language: String,
    /// Requested dialect identifier, validated by the pipeline
    pub dialect: String,
}

impl GenerationRequest {
    pub fn new(
        kind: InputKind,
        input: impl Into<Vec<u8>>,
        source_name: &str,
        language: &str,
        dialect: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            input: input.into(),
            kind,
            source_name: source_name.to_string(),
            language: language.to_string(),
            dialect: dialect.to_string(),
        }
    }

    /// Request for a DDL script
    pub fn ddl(input: impl Into<Vec<u8>>, language: &str, dialect: &str) -> Self {
        Self::new(InputKind::Ddl, input, "schema.sql", language, dialect)
    }

    /// Request for a CSV sample uploaded as `file_name`
    pub fn csv(input: impl Into<Vec<u8>>, file_name: &str, language: &str, dialect: &str) -> Self {
        Self::new(InputKind::Csv, input, file_name, language, dialect)
    }
}

/// Outcome of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Artifact(Artifact),
    /// Error diagnostics in discovery order
    Errors(Vec<Diagnostic>),
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Artifact(_))
    }

    pub fn errors(&self) -> &[Diagnostic] {
        match self {
            GenerationResult::Artifact(_) => &[],
            GenerationResult::Errors(errors) => errors,
        }
    }

    /// Caller-facing error messages
    pub fn messages(&self) -> Vec<String> {
        user_messages(self.errors())
    }
}

/// Runs requests against a shared, read-only configuration
#[derive(Debug, Clone)]
pub struct Generator {
    config: Arc<Config>,
    options: ParseOptions,
    packager: Packager,
}

impl Generator {
    /// Create a generator, checking the type tables first
    pub fn new(config: Arc<Config>) -> Result<Self> {
        config.validate()?;
        typemap::verify()?;

        Ok(Self {
            options: ParseOptions::from(&config.csv),
            packager: Packager::new(&config.output.archive_prefix),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage and package the result
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let span = tracing::info_span!(
            "generate",
            request_id = %request.id,
            lang = %request.language,
            rdbms = %request.dialect,
            kind = %request.kind,
        );

        async {
            let units = match self.emit(request).await {
                Ok(units) => units,
                Err(errors) => {
                    tracing::info!(errors = errors.len(), "Generation rejected");
                    return GenerationResult::Errors(errors);
                }
            };

            match self.packager.package(&units, request.id, Utc::now()) {
                Ok(artifact) => {
                    tracing::info!(file = %artifact.file_name, kind = ?artifact.kind, "Generation succeeded");
                    GenerationResult::Artifact(artifact)
                }
                Err(e) => GenerationResult::Errors(vec![internal(&e)]),
            }
        }
        .instrument(span)
        .await
    }

    /// Run every stage up to emission and return the units in schema order
    pub async fn emit(&self, request: &GenerationRequest) -> std::result::Result<Vec<EmissionUnit>, Vec<Diagnostic>> {
        let limit = self.config.limits.max_input_bytes;
        if request.input.len() > limit {
            let error = Error::LimitExceededError(format!(
                "Input is {} bytes; the limit is {} bytes",
                request.input.len(),
                limit
            ));
            return Err(vec![Diagnostic::from(&error)]);
        }

        let (language, dialect) = self.targets(request).map_err(|e| vec![Diagnostic::from(&e)])?;

        let mut diagnostics = Diagnostics::new();
        let mut schema = parse_into(
            &request.input,
            request.kind,
            dialect,
            &self.options,
            &request.source_name,
            &mut diagnostics,
        );
        resolve_schema(&mut schema, dialect, &mut diagnostics);
        diagnostics.log_warnings();

        if diagnostics.has_errors() {
            return Err(diagnostics.into_errors());
        }
        tracing::debug!(tables = schema.len(), "Schema resolved");

        let emitter = CodeEmitter::new(language, dialect).with_support_files(self.config.emit.support_files);
        let emitted = if self.config.emit.parallel {
            emitter.emit_parallel(&schema).await
        } else {
            emitter.emit(&schema)
        };

        emitted.map_err(|errors| {
            for error in errors.iter().filter(|e| e.kind == DiagnosticKind::EmissionInvariant) {
                tracing::error!(location = %error.location, "{}", error.message);
            }
            errors
        })
    }

    fn targets(&self, request: &GenerationRequest) -> Result<(Language, Dialect)> {
        let language = request.language.parse::<Language>()?;
        let dialect = request.dialect.parse::<Dialect>()?;
        Ok((language, dialect))
    }
}

/// Diagnostic for a failure that is not the caller's fault
fn internal(error: &Error) -> Diagnostic {
    tracing::error!(error = %error, "Internal generation failure");
    Diagnostic::error(DiagnosticKind::EmissionInvariant, error.to_string(), Location::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ArtifactKind;

    fn generator() -> Generator {
        Generator::new(Arc::new(Config::default())).unwrap()
    }

    #[tokio::test]
    async fn test_limit_short_circuits() {
        let mut config = Config::default();
        config.limits.max_input_bytes = 8;
        let generator = Generator::new(Arc::new(config)).unwrap();

        let request = GenerationRequest::ddl("CREATE TABLE a (x INT);", "nope", "nope");
        let result = generator.generate(&request).await;

        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].kind, DiagnosticKind::LimitExceeded);
    }

    #[tokio::test]
    async fn test_unsupported_target_is_single_error() {
        let request = GenerationRequest::ddl("not even sql", "cobol", "oracle");
        let result = generator().generate(&request).await;

        assert_eq!(result.messages(), vec!["Unsupported language: cobol".to_string()]);
    }

    #[tokio::test]
    async fn test_parse_and_resolution_errors_are_collected() {
        let ddl = "CREATE TABLE a (x INT, PRIMARY KEY (y));\nCREATE TABLE b (shape GEOMETRY);";
        let request = GenerationRequest::ddl(ddl, "go", "mysql");
        let result = generator().generate(&request).await;

        let kinds: Vec<_> = result.errors().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Parse, DiagnosticKind::TypeResolution]);
    }

    #[tokio::test]
    async fn test_csv_request_produces_single_file() {
        let request = GenerationRequest::csv("id,name\n1,Ada\n", "people.csv", "rust", "sqlite");
        let result = generator().generate(&request).await;

        match result {
            GenerationResult::Artifact(artifact) => {
                assert_eq!(artifact.kind, ArtifactKind::SingleFile);
                assert_eq!(artifact.file_name, "people.rs");
            }
            GenerationResult::Errors(errors) => panic!("unexpected errors: {:?}", errors),
        }
    }
}
