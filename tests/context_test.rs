mod common;

use common::{config_for, context, RecordingDatabase, RecordingLogger, CONNECTION};
use schemakeeper::prelude::*;
use schemakeeper::{StepNotExecuted, TracingLoggingService};

#[test]
fn test_duplicate_database_service_is_rejected() {
    let mut builder = UpdateContextBuilder::with_builtins(config_for("sqlite")).unwrap();
    builder
        .register_database_service(RecordingDatabase::new("sqlite", "sqlite"))
        .unwrap();

    let err = builder
        .register_database_service(RecordingDatabase::new("sqlite", "sqlite"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateName);
    assert_eq!(
        err.to_string(),
        "The database service 'sqlite' is already registered"
    );
}

#[test]
fn test_same_name_in_different_registries() {
    #[derive(Debug)]
    struct Shared;

    impl Precondition for Shared {
        fn name(&self) -> &str {
            "shared"
        }

        fn check(&self, _ctx: &UpdateContext, _params: &[String]) -> Result<bool> {
            Ok(true)
        }
    }

    let mut builder = UpdateContextBuilder::new(UpdateConfig::default());
    builder.register_precondition(Shared).unwrap();
    builder
        .register_database_service(RecordingDatabase::new("shared", "sqlite"))
        .unwrap();
}

#[test]
fn test_unmapped_connection_string() {
    let logger = RecordingLogger::default();
    let mut builder = common::builder(config_for("sqlite"), &logger);
    builder
        .register_database_service(RecordingDatabase::new("sqlite", "sqlite"))
        .unwrap();

    let err = builder
        .initialize_database_service("Data Source=elsewhere")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MappingNotFound);
}

#[test]
fn test_mapped_service_not_registered() {
    let logger = RecordingLogger::default();
    let builder = common::builder(config_for("postgres"), &logger);

    let err = builder.initialize_database_service(CONNECTION).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotRegistered);
    assert!(err.to_string().contains("postgres"));
}

#[test]
fn test_empty_connection_string() {
    let builder = UpdateContextBuilder::with_builtins(config_for("sqlite")).unwrap();
    let err = builder.initialize_database_service("").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_unregistered_default_precondition() {
    let config = config_for("sqlite")
        .with_default_precondition(PreconditionDeclaration::new("NotThere"));
    let logger = RecordingLogger::default();
    let mut builder = common::builder(config, &logger);
    builder
        .register_database_service(RecordingDatabase::new("sqlite", "sqlite"))
        .unwrap();

    let err = builder.initialize_database_service(CONNECTION).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_logging_service_initialization() {
    let mut builder = UpdateContextBuilder::new(UpdateConfig::default());
    assert_eq!(
        builder.initialize_logging_service("").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        builder
            .initialize_logging_service(TracingLoggingService::NAME)
            .unwrap_err()
            .kind(),
        ErrorKind::InvalidOperation
    );

    builder
        .register_logging_service(TracingLoggingService::new())
        .unwrap();
    builder
        .initialize_logging_service(TracingLoggingService::NAME)
        .unwrap();
}

#[test]
fn test_context_binds_clone_to_connection_string() {
    let database = RecordingDatabase::new("sqlite", "sqlite");
    let (ctx, logger) = context(config_for("sqlite"), &database);

    assert_eq!(ctx.connection_string(), CONNECTION);
    assert_eq!(ctx.database().unwrap().name(), "sqlite");
    assert_eq!(database.state.lock().unwrap().bound_to, vec![CONNECTION]);
    assert!(logger
        .lines()
        .iter()
        .any(|l| l.contains("Found database service 'sqlite'")));
}

#[test]
fn test_dispose_is_idempotent() {
    let database = RecordingDatabase::new("sqlite", "sqlite");
    let (mut ctx, _logger) = context(config_for("sqlite"), &database);

    ctx.dispose().unwrap();
    ctx.dispose().unwrap();
    assert!(ctx.is_disposed());
    assert_eq!(
        ctx.database().err().map(|e| e.kind()),
        Some(ErrorKind::InvalidOperation)
    );

    drop(ctx);
    assert_eq!(database.dispose_count(), 1);
}

#[test]
fn test_drop_disposes_database() {
    let database = RecordingDatabase::new("sqlite", "sqlite");
    {
        let (_ctx, _logger) = context(config_for("sqlite"), &database);
    }
    assert_eq!(database.dispose_count(), 1);
}

#[test]
fn test_run_after_dispose_fails() {
    let database = RecordingDatabase::new("sqlite", "sqlite");
    let (mut ctx, _logger) = context(config_for("sqlite"), &database);
    ctx.dispose().unwrap();

    let manifest = UpdateManifest::new("billing").version(VersionUpdate::new("1.0").step(
        DeclaredStep::new(1, UpdateStep::sql([SqlAlternative::inline("all", "SELECT 1")])),
    ));

    let errors = Updater::new().execute(&mut ctx, &manifest).unwrap_err().errors;
    assert_eq!(errors[0].kind(), ErrorKind::InvalidOperation);
    assert!(database.statements().is_empty());
}

#[test]
fn test_step_not_executed_outside_step() {
    let database = RecordingDatabase::new("sqlite", "sqlite");
    let (ctx, _logger) = context(config_for("sqlite"), &database);

    assert!(ctx.current_step().is_none());
    let err = ctx
        .check_precondition(StepNotExecuted::NAME, &[])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let err = ctx.check_precondition("", &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_unknown_script_provider() {
    let database = RecordingDatabase::new("sqlite", "sqlite");
    let (ctx, _logger) = context(config_for("sqlite"), &database);

    let err = ctx.script("s3", "001.sql").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
