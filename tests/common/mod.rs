#![allow(dead_code)]

use schemakeeper::{
    DatabaseService, LoggingService, MembershipAdapter, Result, StepIdentity, UpdateConfig,
    UpdateContext, UpdateContextBuilder, UpdateError,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

pub const CONNECTION: &str = "Data Source=memory";

/// State shared between a database prototype and every clone it hands out.
#[derive(Debug, Default)]
pub struct DatabaseState {
    pub statements: Vec<String>,
    pub failing: Vec<String>,
    pub objects: HashSet<(String, String)>,
    pub tables: HashSet<String>,
    pub views: HashSet<String>,
    pub executed_steps: Vec<StepIdentity>,
    pub bound_to: Vec<String>,
    pub dispose_count: usize,
}

/// In-memory database service recording everything it is asked to do.
#[derive(Debug, Clone)]
pub struct RecordingDatabase {
    name: String,
    dialect: String,
    pub state: Arc<Mutex<DatabaseState>>,
}

impl RecordingDatabase {
    pub fn new(name: &str, dialect: &str) -> Self {
        Self {
            name: name.to_string(),
            dialect: dialect.to_string(),
            state: Arc::default(),
        }
    }

    /// Makes every statement containing `fragment` fail.
    pub fn fail_on(self, fragment: &str) -> Self {
        self.state.lock().unwrap().failing.push(fragment.to_string());
        self
    }

    pub fn with_object(self, object: &str, table: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert((object.to_string(), table.to_string()));
        self
    }

    pub fn with_table(self, table: &str) -> Self {
        self.state.lock().unwrap().tables.insert(table.to_string());
        self
    }

    pub fn with_view(self, view: &str) -> Self {
        self.state.lock().unwrap().views.insert(view.to_string());
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn executed_steps(&self) -> Vec<StepIdentity> {
        self.state.lock().unwrap().executed_steps.clone()
    }

    pub fn dispose_count(&self) -> usize {
        self.state.lock().unwrap().dispose_count
    }
}

impl DatabaseService for RecordingDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_db_type(&self, tag: &str) -> bool {
        self.dialect.eq_ignore_ascii_case(tag)
    }

    fn execute_sql(&self, statement: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing.iter().any(|f| statement.contains(f.as_str())) {
            return Err(UpdateError::sql(statement, "rejected by test database"));
        }
        state.statements.push(statement.to_string());
        Ok(())
    }

    fn object_exists(&self, name: &str, owner_table: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .contains(&(name.to_string(), owner_table.to_string())))
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().tables.contains(table))
    }

    fn view_exists(&self, view: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().views.contains(view))
    }

    fn is_step_executed(&self, step: &StepIdentity) -> Result<bool> {
        Ok(self.state.lock().unwrap().executed_steps.contains(step))
    }

    fn mark_step_executed(&self, step: &StepIdentity) -> Result<()> {
        self.state.lock().unwrap().executed_steps.push(step.clone());
        Ok(())
    }

    fn clone_for_connection_string(
        &self,
        connection_string: &str,
    ) -> Result<Box<dyn DatabaseService>> {
        self.state
            .lock()
            .unwrap()
            .bound_to
            .push(connection_string.to_string());
        Ok(Box::new(self.clone()))
    }

    fn dispose(&mut self) -> Result<()> {
        self.state.lock().unwrap().dispose_count += 1;
        Ok(())
    }
}

/// Logging service keeping every line in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    pub const NAME: &'static str = "memory";

    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter_map(|l| l.strip_prefix("WARN ").map(str::to_string))
            .collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LoggingService for RecordingLogger {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn trace_information(&self, message: fmt::Arguments<'_>) {
        self.lines.lock().unwrap().push(format!("INFO {}", message));
    }

    fn trace_warning(&self, message: fmt::Arguments<'_>) {
        self.lines.lock().unwrap().push(format!("WARN {}", message));
    }
}

/// Membership adapter recording calls as plain strings.
#[derive(Debug, Default)]
pub struct RecordingMembership {
    pub calls: Mutex<Vec<String>>,
    pub users: Mutex<HashSet<String>>,
}

impl RecordingMembership {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl MembershipAdapter for RecordingMembership {
    fn create_user(&self, user_name: &str, _password: &str, email: Option<&str>) -> Result<()> {
        if !self.users.lock().unwrap().insert(user_name.to_string()) {
            return Err(UpdateError::membership(format!(
                "user '{}' already exists",
                user_name
            )));
        }
        self.calls.lock().unwrap().push(format!(
            "create_user {} {}",
            user_name,
            email.unwrap_or("-")
        ));
        Ok(())
    }

    fn add_user_to_roles(&self, user_name: &str, roles: &[String]) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("add_user_to_roles {} {}", user_name, roles.join(",")));
        Ok(())
    }

    fn delete_user(&self, user_name: &str) -> Result<bool> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("delete_user {}", user_name));
        Ok(self.users.lock().unwrap().remove(user_name))
    }

    fn user_exists(&self, user_name: &str) -> Result<bool> {
        Ok(self.users.lock().unwrap().contains(user_name))
    }

    fn create_role(&self, role_name: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("create_role {}", role_name));
        Ok(())
    }

    fn delete_role(&self, role_name: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("delete_role {}", role_name));
        Ok(())
    }
}

/// Configuration mapping [`CONNECTION`] to `service` and logging to memory.
pub fn config_for(service: &str) -> UpdateConfig {
    UpdateConfig::default()
        .with_logging_service(RecordingLogger::NAME)
        .with_mapping(CONNECTION, service)
}

/// Builder with the builtins and a [`RecordingLogger`] registered.
pub fn builder(config: UpdateConfig, logger: &RecordingLogger) -> UpdateContextBuilder {
    let mut builder = UpdateContextBuilder::with_builtins(config).unwrap();
    builder.register_logging_service(logger.clone()).unwrap();
    builder
}

/// Context bound to `database` through [`CONNECTION`].
pub fn context(config: UpdateConfig, database: &RecordingDatabase) -> (UpdateContext, RecordingLogger) {
    let logger = RecordingLogger::default();
    let mut builder = builder(config, &logger);
    builder.register_database_service(database.clone()).unwrap();
    let ctx = builder.initialize_database_service(CONNECTION).unwrap();
    (ctx, logger)
}
