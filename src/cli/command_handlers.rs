use crate::api::client::ApiClient;
use crate::cli::main_types::{AuthCommands, Commands, ConfigCommands, ExportKind, OutputFormat};
use crate::core::notifications::NotificationBus;
use crate::core::resources::{self, RESOURCES, ResourceDef};
use crate::core::route_guard::{LOGIN_ROUTE, RouteDecision, guard};
use crate::core::services::traits::{CreateService, GetService, UpdateService};
use crate::core::services::resource_service::record_id;
use crate::core::services::{
    AuthService, ConfigService, FileAttachment, LoginInput, Payload, ResourceService,
    ResourceTable,
};
use crate::display::ProgressSpinner;
use crate::display::pagination::DEFAULT_PAGE_SIZE;
use crate::display::table::{ColumnDescriptor, ColumnSet, DataTable, RowAction, format_value};
use crate::error::{AppError, CliError, DisplayError, ServiceError};
use crate::export::{
    ExportFormat, Extractors, export_filename, render_print_document, to_xlsx_bytes,
    write_export,
};
use crate::storage::config::Profile;
use crate::storage::token::SessionState;
use crate::utils::logging::print_verbose;
use crate::utils::validation::parse_json_object;
use chrono::Local;
use rpassword::read_password;
use serde_json::{Value, json};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn io_error(context: &str, e: io::Error) -> AppError {
    CliError::InvalidArguments(format!("{}: {}", context, e)).into()
}

fn prompt_line(label: &str) -> Result<String, AppError> {
    print!("{}", label);
    io::stdout()
        .flush()
        .map_err(|e| io_error("Failed to flush stdout", e))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| io_error("Failed to read input", e))?;
    Ok(line.trim().to_string())
}

/// Fill in whatever the flags and environment did not provide
fn collect_login_input(
    email: Option<String>,
    password: Option<String>,
    profile_email: Option<&str>,
) -> Result<LoginInput, AppError> {
    let email = match email.or_else(|| profile_email.map(str::to_string)) {
        Some(email) => email,
        None => prompt_line("Email: ")?,
    };

    let password = match password {
        Some(password) => password,
        None => {
            print!("Password: ");
            io::stdout()
                .flush()
                .map_err(|e| io_error("Failed to flush stdout", e))?;
            read_password().map_err(|e| io_error("Failed to read password", e))?
        }
    };

    Ok(LoginInput { email, password })
}

fn to_pretty_json(value: &Value) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DisplayError::TableFormat(format!("JSON output failed: {}", e)).into())
}

/// Human label for a status flag
pub fn status_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::Bool(true)) => "Active".to_string(),
        Some(Value::Bool(false)) => "Inactive".to_string(),
        other => format_value(other),
    }
}

/// What a row action does once it is picked from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIntent {
    Edit,
    ToggleStatus,
    Delete,
}

impl RowIntent {
    pub fn for_resource(resource: &ResourceDef) -> Vec<RowIntent> {
        let mut intents = vec![RowIntent::Edit];
        if resource.has_status_toggle() {
            intents.push(RowIntent::ToggleStatus);
        }
        intents.push(RowIntent::Delete);
        intents
    }

    pub fn label(self) -> &'static str {
        match self {
            RowIntent::Edit => "Edit",
            RowIntent::ToggleStatus => "Toggle status",
            RowIntent::Delete => "Delete",
        }
    }

    pub fn is_destructive(self) -> bool {
        matches!(self, RowIntent::Delete)
    }
}

/// Slot the row action handlers write their intent into
type Selection = Arc<Mutex<Option<RowIntent>>>;

#[derive(Default)]
pub struct AuthHandler;

impl AuthHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: AuthCommands,
        auth_service: &AuthService,
        profile: Option<&Profile>,
        verbose: bool,
    ) -> Result<(), AppError> {
        match command {
            AuthCommands::Login {
                email,
                password,
                reason,
            } => {
                print_verbose(verbose, "Attempting auth login command using AuthService");

                let decision = guard(LOGIN_ROUTE, auth_service.is_authenticated());
                if decision == RouteDecision::RedirectHome {
                    let status = auth_service.status()?;
                    println!(
                        "✅ Already logged in with profile '{}'",
                        status.profile_name
                    );
                    println!("Run 'crmdesk auth logout' first to switch accounts.");
                    return Ok(());
                }

                if let Some(message) = AuthService::login_message(reason.as_deref()) {
                    println!("ℹ️ {}", message);
                }

                let profile_email = profile.and_then(|p| p.email.as_deref());
                let input = collect_login_input(email, password, profile_email)?;
                let email = input.email.trim().to_string();

                let mut spinner = ProgressSpinner::new("Signing in...");
                spinner.start();
                let result = auth_service.login(input).await;
                spinner.stop(None);

                let status = result?;
                println!("✅ Successfully logged in as {}", email);
                println!("Connected to: {}", status.api_url);
                if let Some(expires_at) = status.expires_at() {
                    println!(
                        "Session expires: {}",
                        expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                    );
                }
                Ok(())
            }
            AuthCommands::Logout => {
                print_verbose(verbose, "Attempting auth logout command using AuthService");
                auth_service.logout()?;
                println!(
                    "✅ Successfully logged out from profile: {}",
                    auth_service.status()?.profile_name
                );
                Ok(())
            }
            AuthCommands::Status => {
                print_verbose(verbose, "Attempting auth status command using AuthService");
                let status = auth_service.status()?;

                println!("Authentication Status:");
                println!("=====================");

                match status.session {
                    SessionState::Active { expires_at } => {
                        println!("Session: ✅ Active session found");
                        match expires_at {
                            Some(at) => println!(
                                "Expires: {}",
                                at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                            ),
                            None => println!("Expires: never"),
                        }
                    }
                    SessionState::Expired => {
                        println!("Session: ❌ Session token expired and was cleared");
                        print_verbose(verbose, "Expired token removed from keychain");
                    }
                    SessionState::Absent => {
                        println!("Session: ❌ No active session (use 'auth login' to authenticate)");
                    }
                }

                println!("\nActive Profile: {}", status.profile_name);
                println!("API URL: {}", status.api_url);
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct ConfigHandler;

impl ConfigHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle(
        &self,
        command: ConfigCommands,
        config_service: &mut ConfigService,
        profile_name: &str,
        config_path: Option<PathBuf>,
        verbose: bool,
    ) -> Result<(), AppError> {
        match command {
            ConfigCommands::Show => {
                print_verbose(verbose, "Attempting config show command using ConfigService");

                println!("Current Configuration:");
                println!("=====================");
                println!(
                    "Default Profile: {}",
                    config_service
                        .get_default_profile()
                        .map(String::as_str)
                        .unwrap_or("(none)")
                );

                println!("\nProfiles:");
                let profiles = config_service.list_profiles();
                if profiles.is_empty() {
                    println!("  No profiles configured");
                }
                for (name, profile) in profiles {
                    println!("  [{}]", name);
                    println!("    API URL: {}", profile.api_url);
                    if let Some(email) = &profile.email {
                        println!("    Email: {}", email);
                    }
                    if let Some(page_size) = profile.page_size {
                        println!("    Page size: {}", page_size);
                    }
                    if let Some(timeout) = profile.timeout_seconds {
                        println!("    Timeout: {}s", timeout);
                    }
                }
                Ok(())
            }
            ConfigCommands::Set { field, value } => {
                print_verbose(
                    verbose,
                    &format!(
                        "Attempting config set - profile: {}, field: {}",
                        profile_name, field
                    ),
                );
                config_service.set_profile_field(profile_name, &field, &value)?;
                config_service.save_config(config_path)?;
                println!("✅ Set profile '{}' {} to: {}", profile_name, field, value);
                println!("Configuration saved successfully.");
                Ok(())
            }
            ConfigCommands::Use { name } => {
                config_service.set_default_profile(&name)?;
                config_service.save_config(config_path)?;
                println!("✅ Default profile is now '{}'", name);
                Ok(())
            }
        }
    }
}

/// Runs the list/detail/create/update/delete/toggle/export commands of any
/// registered resource
pub struct ResourceHandler {
    client: ApiClient,
    bus: NotificationBus,
    verbose: bool,
    default_page_size: Option<usize>,
}

impl ResourceHandler {
    pub fn new(client: ApiClient, bus: NotificationBus, verbose: bool) -> Self {
        Self {
            client,
            bus,
            verbose,
            default_page_size: None,
        }
    }

    pub fn with_default_page_size(mut self, page_size: Option<usize>) -> Self {
        self.default_page_size = page_size;
        self
    }

    fn service(&self, name: &str) -> Result<ResourceService, AppError> {
        let resource = resources::resolve(name)?;
        Ok(ResourceService::new(self.client.clone(), resource))
    }

    fn table(&self, name: &str, page_size: Option<usize>) -> Result<ResourceTable, AppError> {
        self.table_for(resources::resolve(name)?, page_size)
    }

    fn table_for(
        &self,
        resource: &'static ResourceDef,
        page_size: Option<usize>,
    ) -> Result<ResourceTable, AppError> {
        let size = page_size
            .or(self.default_page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let service = ResourceService::new(self.client.clone(), resource);
        ResourceTable::new(service, self.bus.clone(), size)
    }

    async fn load(&self, table: &mut ResourceTable) -> Result<usize, AppError> {
        let mut spinner = ProgressSpinner::new(format!(
            "Loading {}...",
            table.resource().title.to_lowercase()
        ));
        spinner.start();
        let result = table.load().await;
        spinner.stop(None);
        let count = result?;
        print_verbose(
            self.verbose,
            &format!("Loaded {} {} records", count, table.resource().name),
        );
        Ok(count)
    }

    fn data_table(resource: &'static ResourceDef) -> DataTable {
        Self::action_table(resource).0
    }

    /// Table whose row actions record the picked intent in the returned slot
    fn action_table(resource: &'static ResourceDef) -> (DataTable, Selection) {
        let mut table = DataTable::new()
            .with_empty_message(format!("No {} found", resource.title.to_lowercase()));

        if let Some(field) = resource.status_field {
            table = table.with_renderer(
                field,
                Box::new(|value: Option<&Value>, _row: &Value| status_label(value)),
            );
        }

        let selection: Selection = Arc::new(Mutex::new(None));
        for intent in RowIntent::for_resource(resource) {
            let slot = Arc::clone(&selection);
            let action = RowAction::new(
                intent.label(),
                Box::new(move |_row: &Value| {
                    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(intent);
                }),
            );
            table = table.with_action(if intent.is_destructive() {
                action.destructive()
            } else {
                action
            });
        }
        (table, selection)
    }

    /// Run the action numbered `position` in the menu against `record`.
    /// Edit needs the changed fields; Delete asks first unless `yes` is set.
    pub async fn run_row_action(
        &self,
        resource: &'static ResourceDef,
        position: usize,
        record: &Value,
        changes: Option<Payload>,
        yes: bool,
    ) -> Result<(), AppError> {
        let index = position
            .checked_sub(1)
            .ok_or_else(|| CliError::InvalidArguments("Actions are numbered from 1".to_string()))?;
        let (table, selection) = Self::action_table(resource);
        table.trigger_action(index, record)?;
        let intent = selection
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| CliError::InvalidArguments("No row action was picked".to_string()))?;

        let id = record_id(record).ok_or_else(|| ServiceError::InvalidPayload {
            message: format!("{} record has no id", resource.title),
        })?;
        print_verbose(
            self.verbose,
            &format!("Running row action '{}' on {} {}", intent.label(), resource.name, id),
        );

        match intent {
            RowIntent::Edit => {
                let changes = changes.ok_or_else(|| {
                    CliError::InvalidArguments(format!(
                        "Edit needs the changed fields: crmdesk get {} {} --action {} --data '<json>'",
                        resource.name, id, position
                    ))
                })?;
                self.update(resource, &id, changes).await
            }
            RowIntent::ToggleStatus => {
                let mut table = self.table_for(resource, None)?.with_rows(vec![record.clone()]);
                self.toggle(&mut table, &id).await
            }
            RowIntent::Delete => self.delete(resource, &id, yes).await,
        }
    }

    async fn update(
        &self,
        resource: &'static ResourceDef,
        id: &str,
        changes: Payload,
    ) -> Result<(), AppError> {
        let service = ResourceService::new(self.client.clone(), resource);
        let record = service.update(id, changes).await?;
        self.bus.success(format!("{} {} updated", resource.title, id));
        if record.is_object() {
            self.print_record(resource, &record, OutputFormat::Table)?;
        }
        Ok(())
    }

    async fn toggle(&self, table: &mut ResourceTable, id: &str) -> Result<(), AppError> {
        let value = table.toggle_status(id).await?;
        println!(
            "{} {} is now {}",
            table.resource().title,
            id,
            status_label(Some(&value))
        );
        Ok(())
    }

    async fn delete(
        &self,
        resource: &'static ResourceDef,
        id: &str,
        yes: bool,
    ) -> Result<(), AppError> {
        if !yes && !confirm_delete(resource, id)? {
            println!("Cancelled.");
            return Ok(());
        }
        self.table_for(resource, None)?.delete(id).await
    }

    fn print_record(
        &self,
        resource: &'static ResourceDef,
        record: &Value,
        format: OutputFormat,
    ) -> Result<(), AppError> {
        match format {
            OutputFormat::Json => println!("{}", to_pretty_json(record)?),
            OutputFormat::Table => {
                let columns = resource.column_set()?;
                println!("{}", Self::data_table(resource).render_detail(&columns, record));
            }
        }
        Ok(())
    }

    fn payload(data: &str, files: &[String]) -> Result<Payload, AppError> {
        let mut payload = Payload::json(parse_json_object(data)?);
        for file in files {
            payload = payload.with_file(FileAttachment::parse(file)?);
        }
        Ok(payload)
    }

    pub fn list_resources(&self) -> Result<(), AppError> {
        let columns = ColumnSet::new(vec![
            ColumnDescriptor::new("name", "Resource"),
            ColumnDescriptor::new("title", "Title"),
            ColumnDescriptor::new("path", "Endpoint"),
            ColumnDescriptor::new("toggle", "Status Toggle"),
        ])?;
        let rows: Vec<Value> = RESOURCES
            .iter()
            .map(|resource| {
                json!({
                    "name": resource.name,
                    "title": resource.title,
                    "path": resource.path,
                    "toggle": if resource.has_status_toggle() { "yes" } else { "no" },
                })
            })
            .collect();
        println!("{}", DataTable::new().render(&columns, &rows));
        Ok(())
    }

    pub async fn handle(&self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::List {
                resource,
                search,
                page,
                page_size,
                hide,
                format,
            } => {
                let mut table = self.table(&resource, page_size)?;
                self.load(&mut table).await?;
                if let Some(query) = search {
                    table.set_query(query);
                }
                table.hide_columns(&hide)?;
                table.go_to_page(page);

                let view = table.view();
                match format {
                    OutputFormat::Json => {
                        let output = json!({
                            "page": view.page,
                            "page_size": view.page_size,
                            "total_records": view.total_records,
                            "total_pages": view.total_pages,
                            "records": view.owned_rows(),
                        });
                        println!("{}", to_pretty_json(&output)?);
                    }
                    OutputFormat::Table => {
                        let data_table = Self::data_table(table.resource());
                        println!("{}", data_table.render(table.columns(), &view.owned_rows()));
                        println!("{}", view.summary());
                        if view.total_pages > 1 {
                            println!("{}", view.render_pager());
                        }
                    }
                }
                Ok(())
            }
            Commands::Get {
                resource,
                id,
                format,
                action,
                data,
                file,
                yes,
            } => {
                let service = self.service(&resource)?;
                let record = service.get(&id).await?;
                let definition = service.resource();

                if let Some(position) = action {
                    let changes = data
                        .as_deref()
                        .map(|data| Self::payload(data, &file))
                        .transpose()?;
                    return self
                        .run_row_action(definition, position, &record, changes, yes)
                        .await;
                }

                self.print_record(definition, &record, format)?;
                if format == OutputFormat::Table {
                    println!("Actions:");
                    println!("{}", Self::data_table(definition).render_action_menu());
                    println!("Run one with: crmdesk get {} {} --action <N>", definition.name, id);
                }
                Ok(())
            }
            Commands::Create {
                resource,
                data,
                file,
            } => {
                let service = self.service(&resource)?;
                let record = service.create(Self::payload(&data, &file)?).await?;
                self.bus
                    .success(format!("{} record created", service.resource().title));
                if record.is_object() {
                    self.print_record(service.resource(), &record, OutputFormat::Table)?;
                }
                Ok(())
            }
            Commands::Update {
                resource,
                id,
                data,
                file,
            } => {
                let definition = resources::resolve(&resource)?;
                self.update(definition, &id, Self::payload(&data, &file)?)
                    .await
            }
            Commands::Delete { resource, id, yes } => {
                self.delete(resources::resolve(&resource)?, &id, yes).await
            }
            Commands::Toggle { resource, id } => {
                let mut table = self.table(&resource, None)?;
                self.load(&mut table).await?;
                self.toggle(&mut table, &id).await
            }
            Commands::Export {
                resource,
                format,
                search,
                hide,
                output,
            } => self.export(&resource, format, search, &hide, output).await,
            Commands::Auth { .. } | Commands::Config { .. } | Commands::Resources => Err(
                CliError::InvalidArguments("Not a resource command".to_string()).into(),
            ),
        }
    }

    async fn export(
        &self,
        resource: &str,
        kind: ExportKind,
        search: Option<String>,
        hide: &[String],
        output: Option<PathBuf>,
    ) -> Result<(), AppError> {
        let mut table = self.table(resource, None)?;
        self.load(&mut table).await?;
        if let Some(query) = search {
            table.set_query(query);
        }
        table.hide_columns(hide)?;

        let definition = table.resource();
        let rows = table.filtered_rows();
        let mut extractors = Extractors::new();
        if let Some(field) = definition.status_field {
            extractors = extractors.with(
                field,
                Box::new(move |row: &Value| status_label(row.get(field))),
            );
        }

        let format = ExportFormat::from(kind);
        let filename = export_filename(definition.name, Local::now().date_naive(), format);
        let path = match output {
            Some(dir) if dir.is_dir() => dir.join(filename),
            Some(path) => path,
            None => PathBuf::from(filename),
        };

        let bytes = match format {
            ExportFormat::Xlsx => {
                to_xlsx_bytes(definition.title, table.columns(), &rows, &extractors)?
            }
            ExportFormat::Print => render_print_document(
                definition.title,
                table.columns(),
                &rows,
                &extractors,
                Local::now(),
            )
            .into_bytes(),
        };

        let written = write_export(&path, &bytes)?;
        self.bus.success(format!(
            "Exported {} {} to {}",
            rows.len(),
            definition.title.to_lowercase(),
            written.display()
        ));
        Ok(())
    }
}

fn confirm_delete(resource: &ResourceDef, id: &str) -> Result<bool, AppError> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError::InvalidArguments(
            "Refusing to delete without confirmation; pass --yes".to_string(),
        )
        .into());
    }
    let answer = prompt_line(&format!(
        "Delete {} record {}? This cannot be undone [y/N]: ",
        resource.title.to_lowercase(),
        id
    ))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}
