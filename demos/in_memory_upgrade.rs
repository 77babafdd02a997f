use schemakeeper::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const CONNECTION: &str = "Data Source=demo";

#[derive(Debug, Default)]
struct Tables {
    tables: HashSet<String>,
    executed: HashSet<StepIdentity>,
}

/// Database service that only understands `CREATE TABLE <name>`.
#[derive(Debug, Clone, Default)]
struct InMemoryDatabase {
    state: Arc<Mutex<Tables>>,
}

impl InMemoryDatabase {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        self.state
            .lock()
            .map_err(|_| UpdateError::invalid_operation("database state poisoned"))
    }
}

impl DatabaseService for InMemoryDatabase {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_db_type(&self, tag: &str) -> bool {
        tag == "memory"
    }

    fn execute_sql(&self, statement: &str) -> Result<()> {
        let table = statement
            .strip_prefix("CREATE TABLE ")
            .and_then(|rest| rest.split_whitespace().next())
            .ok_or_else(|| UpdateError::sql(statement, "only CREATE TABLE is supported"))?;
        println!("  > {}", statement);
        self.lock()?.tables.insert(table.to_string());
        Ok(())
    }

    fn object_exists(&self, _name: &str, _owner_table: &str) -> Result<bool> {
        Ok(false)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.lock()?.tables.contains(table))
    }

    fn is_step_executed(&self, step: &StepIdentity) -> Result<bool> {
        Ok(self.lock()?.executed.contains(step))
    }

    fn mark_step_executed(&self, step: &StepIdentity) -> Result<()> {
        self.lock()?.executed.insert(step.clone());
        Ok(())
    }

    fn clone_for_connection_string(
        &self,
        _connection_string: &str,
    ) -> Result<Box<dyn DatabaseService>> {
        Ok(Box::new(self.clone()))
    }
}

define_custom_step!(ListTables, |ctx, params| {
    for table in params {
        let exists = ctx.database()?.table_exists(table)?;
        println!("  table {:<10} exists: {}", table, exists);
    }
    Ok(())
});

fn manifest() -> UpdateManifest {
    UpdateManifest::new("shop").version(
        VersionUpdate::new("1.0")
            .step(
                DeclaredStep::new(
                    1,
                    UpdateStep::sql([
                        SqlAlternative::inline("mysql", "CREATE TABLE customer (id INT) ENGINE=InnoDB;"),
                        SqlAlternative::inline("all", "CREATE TABLE customer (id INT);"),
                    ]),
                )
                .named("customer table"),
            )
            .step(
                DeclaredStep::new(
                    2,
                    UpdateStep::sql([SqlAlternative::inline(
                        "all",
                        "CREATE TABLE orders (id INT);\nCREATE TABLE order_line (id INT);",
                    )]),
                )
                .with_precondition(PreconditionDeclaration::with_params(
                    "TableNotFound",
                    ["orders"],
                )),
            )
            .step(
                DeclaredStep::new(3, UpdateStep::custom(ListTables::NAME, ["customer", "orders"]))
                    .not_recorded(),
            ),
    )
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = UpdateConfig::default()
        .with_mapping(CONNECTION, "memory")
        .with_default_precondition(PreconditionDeclaration::new("StepNotExecuted"));

    let database = InMemoryDatabase::default();
    let manifest = manifest();

    for run in 1..=2 {
        println!("Run {}", run);

        let mut builder = UpdateContextBuilder::with_builtins(config.clone())?;
        builder.register_database_service(database.clone())?;
        builder.register_custom_step(ListTables)?;
        let mut ctx = builder.initialize_database_service(CONNECTION)?;

        match Updater::new().execute(&mut ctx, &manifest) {
            Ok(report) => {
                for step in report.steps() {
                    println!("  {} {}", step.identity, step.state);
                }
            }
            Err(failure) => {
                for error in failure.errors {
                    println!("Update failed: {}", error);
                }
            }
        }

        ctx.dispose()?;
    }

    Ok(())
}
