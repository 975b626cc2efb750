//! Generic resource controller.
//!
//! One [`ResourceService`] covers the CRUD calls of any registered resource;
//! [`ResourceTable`] adds the page-local state a list screen keeps (rows,
//! column visibility, search and paging) and the optimistic status toggle.

use super::traits::{
    CreateService, DeleteService, GetService, ListParams, ListService, UpdateService,
};
use crate::Result;
use crate::api::client::{ApiClient, RequestOptions};
use crate::api::models::Envelope;
use crate::core::notifications::NotificationBus;
use crate::core::resources::ResourceDef;
use crate::display::pagination::{ListState, PageView, matches_query, total_pages};
use crate::display::table::ColumnSet;
use crate::error::{CliError, ServiceError, StorageError};
use async_trait::async_trait;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use std::path::PathBuf;

/// File sent as one multipart field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub field: String,
    pub path: PathBuf,
}

impl FileAttachment {
    /// Parse `field=path`
    pub fn parse(raw: &str) -> std::result::Result<Self, CliError> {
        match raw.split_once('=') {
            Some((field, path)) if !field.trim().is_empty() && !path.trim().is_empty() => {
                Ok(Self {
                    field: field.trim().to_string(),
                    path: PathBuf::from(path.trim()),
                })
            }
            _ => Err(CliError::InvalidArguments(format!(
                "Invalid file attachment '{}', expected field=path",
                raw
            ))),
        }
    }
}

/// Body of a create or update call. Attachments switch it to multipart.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub fields: Value,
    pub files: Vec<FileAttachment>,
}

impl Payload {
    pub fn json(fields: Value) -> Self {
        Self {
            fields,
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, attachment: FileAttachment) -> Self {
        self.files.push(attachment);
        self
    }

    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }

    async fn into_options(self) -> Result<RequestOptions> {
        if !self.is_multipart() {
            return Ok(RequestOptions::json(self.fields));
        }

        let mut form = Form::new();
        match self.fields {
            Value::Object(fields) => {
                for (key, value) in fields {
                    form = form.text(key, multipart_text(&value));
                }
            }
            Value::Null => {}
            other => {
                return Err(ServiceError::InvalidPayload {
                    message: format!("Expected a JSON object, got {}", other),
                }
                .into());
            }
        }

        for file in self.files {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|source| StorageError::FileIo {
                    path: file.path.to_string_lossy().to_string(),
                    source,
                })?;
            let file_name = file
                .path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| file.field.clone());
            form = form.part(file.field, Part::bytes(bytes).file_name(file_name));
        }

        Ok(RequestOptions::multipart(form))
    }
}

fn multipart_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `id` of a record as text, whether the backend sent a number or a string
pub fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Flip a status flag. Booleans, 0/1 and `active`/`inactive` are understood.
pub fn flipped_status(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(flag) => Some(Value::Bool(!flag)),
        Value::Number(n) if n.as_i64() == Some(0) => Some(json!(1)),
        Value::Number(n) if n.as_i64() == Some(1) => Some(json!(0)),
        Value::String(s) if s.eq_ignore_ascii_case("active") => Some(json!("inactive")),
        Value::String(s) if s.eq_ignore_ascii_case("inactive") => Some(json!("active")),
        Value::Null => Some(Value::Bool(true)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ResourceService {
    client: ApiClient,
    resource: &'static ResourceDef,
}

impl ResourceService {
    pub fn new(client: ApiClient, resource: &'static ResourceDef) -> Self {
        Self { client, resource }
    }

    pub fn resource(&self) -> &'static ResourceDef {
        self.resource
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<Payload>,
        skip_error_handler: bool,
    ) -> Result<Envelope> {
        let mut options = match payload {
            Some(payload) => payload.into_options().await?,
            None => RequestOptions::default(),
        };
        options.skip_error_handler = skip_error_handler;
        Ok(self.client.request(method, path, options).await?)
    }

    /// `PUT` the record with one field changed. The caller reports failures
    /// itself, so the global error callback is bypassed.
    pub async fn put_field(&self, record: &Value, field: &str, value: Value) -> Result<Value> {
        let id = record_id(record).ok_or_else(|| ServiceError::InvalidPayload {
            message: "Record has no id".to_string(),
        })?;
        let mut body = record.clone();
        if let Value::Object(fields) = &mut body {
            fields.insert(field.to_string(), value);
        }
        let envelope = self
            .send(
                Method::PUT,
                &self.resource.item_path(&id),
                Some(Payload::json(body)),
                true,
            )
            .await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ListService<Value> for ResourceService {
    async fn list(&self, params: ListParams) -> Result<Vec<Value>> {
        let envelope = self.send(Method::GET, self.resource.path, None, false).await?;
        let records = envelope.records();
        Ok(match params.search.as_deref() {
            Some(query) => records
                .into_iter()
                .filter(|record| matches_query(record, query))
                .collect(),
            None => records,
        })
    }
}

#[async_trait]
impl GetService<Value> for ResourceService {
    async fn get(&self, id: &str) -> Result<Value> {
        let envelope = self
            .send(Method::GET, &self.resource.item_path(id), None, false)
            .await?;
        match envelope.data {
            Some(record) if !record.is_null() => Ok(record),
            _ => Err(ServiceError::RecordNotFound {
                resource: self.resource.name.to_string(),
                id: id.to_string(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl CreateService<Value, Payload> for ResourceService {
    async fn create(&self, input: Payload) -> Result<Value> {
        let envelope = self
            .send(Method::POST, self.resource.path, Some(input), false)
            .await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl UpdateService<Value, Payload> for ResourceService {
    async fn update(&self, id: &str, input: Payload) -> Result<Value> {
        let envelope = self
            .send(Method::PUT, &self.resource.item_path(id), Some(input), false)
            .await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl DeleteService for ResourceService {
    async fn delete(&self, id: &str) -> Result<()> {
        self.send(Method::DELETE, &self.resource.item_path(id), None, false)
            .await?;
        Ok(())
    }
}

/// Page-local state of one resource list
pub struct ResourceTable {
    service: ResourceService,
    bus: NotificationBus,
    rows: Vec<Value>,
    columns: ColumnSet,
    state: ListState,
}

impl ResourceTable {
    pub fn new(service: ResourceService, bus: NotificationBus, page_size: usize) -> Result<Self> {
        let columns = service.resource().column_set()?;
        Ok(Self {
            service,
            bus,
            rows: Vec::new(),
            columns,
            state: ListState::new(page_size)?,
        })
    }

    pub fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows;
        self
    }

    /// Replace the rows with a fresh fetch of the full list
    pub async fn load(&mut self) -> Result<usize> {
        self.rows = self.service.list(ListParams::default()).await?;
        Ok(self.rows.len())
    }

    pub fn resource(&self) -> &'static ResourceDef {
        self.service.resource()
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn row(&self, id: &str) -> Option<&Value> {
        self.rows
            .iter()
            .find(|row| record_id(row).as_deref() == Some(id))
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.state.set_query(query);
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        Ok(self.state.set_page_size(page_size)?)
    }

    /// Clamped against the current filtered result
    pub fn go_to_page(&mut self, page: usize) {
        let total = total_pages(self.state.filtered(&self.rows).len(), self.state.page_size());
        self.state.set_page(page, total);
    }

    pub fn hide_columns(&mut self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.columns.set_visible(key, false)?;
        }
        Ok(())
    }

    pub fn view(&self) -> PageView<'_> {
        self.state.apply(&self.rows)
    }

    /// Every row matching the query, ignoring pagination
    pub fn filtered_rows(&self) -> Vec<Value> {
        self.state
            .filtered(&self.rows)
            .into_iter()
            .cloned()
            .collect()
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.rows
            .iter()
            .position(|row| record_id(row).as_deref() == Some(id))
            .ok_or_else(|| {
                ServiceError::RecordNotFound {
                    resource: self.resource().name.to_string(),
                    id: id.to_string(),
                }
                .into()
            })
    }

    fn set_field(&mut self, index: usize, field: &str, value: Value) {
        if let Some(Value::Object(fields)) = self.rows.get_mut(index) {
            fields.insert(field.to_string(), value);
        }
    }

    /// Optimistically flip the status flag of a row.
    ///
    /// The row changes before the request is sent. If the backend rejects the
    /// change the previous value is restored and an error toast is raised.
    pub async fn toggle_status(&mut self, id: &str) -> Result<Value> {
        let resource = self.resource();
        let field = resource.status_field.ok_or_else(|| ServiceError::Resource {
            message: format!("{} have no status flag to toggle", resource.title),
        })?;

        let index = self.position(id)?;
        let previous = self.rows[index].get(field).cloned().unwrap_or(Value::Null);
        let next = flipped_status(&previous).ok_or_else(|| ServiceError::InvalidPayload {
            message: format!("Cannot toggle {} value {}", field, previous),
        })?;

        self.set_field(index, field, next.clone());
        let record = self.rows[index].clone();

        match self.service.put_field(&record, field, next.clone()).await {
            Ok(_) => {
                self.bus
                    .success(format!("{} {} status updated", resource.title, id));
                Ok(next)
            }
            Err(e) => {
                tracing::debug!(field, resource = resource.name, id, "rolling back status toggle");
                self.set_field(index, field, previous);
                self.bus.error(format!("Failed to update status: {}", e.display_friendly()));
                Err(e)
            }
        }
    }

    /// Delete a record and drop it from the rows on success
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.service.delete(id).await?;
        self.rows.retain(|row| record_id(row).as_deref() != Some(id));
        self.bus
            .success(format!("{} {} deleted", self.resource().title, id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notifications::Severity;
    use crate::core::resources;
    use crate::storage::token::MemoryTokenStore;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(base_url: &str, resource: &str) -> ResourceService {
        let client = ApiClient::new(
            format!("{}/api", base_url),
            Arc::new(MemoryTokenStore::new()),
            None,
        )
        .expect("client");
        ResourceService::new(client, resources::find(resource).expect("resource"))
    }

    fn departments() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "Sales", "is_active": true}),
            json!({"id": 2, "name": "Support", "is_active": false}),
        ]
    }

    #[test]
    fn test_file_attachment_parse() {
        let file = FileAttachment::parse("avatar=./photos/me.png").unwrap();
        assert_eq!(file.field, "avatar");
        assert_eq!(file.path, PathBuf::from("./photos/me.png"));
        assert!(FileAttachment::parse("avatar").is_err());
        assert!(FileAttachment::parse("=me.png").is_err());
    }

    #[test]
    fn test_flipped_status() {
        assert_eq!(flipped_status(&json!(true)), Some(json!(false)));
        assert_eq!(flipped_status(&json!(0)), Some(json!(1)));
        assert_eq!(flipped_status(&json!("Active")), Some(json!("inactive")));
        assert_eq!(flipped_status(&Value::Null), Some(json!(true)));
        assert_eq!(flipped_status(&json!("pending")), None);
    }

    #[test]
    fn test_record_id() {
        assert_eq!(record_id(&json!({"id": 7})), Some("7".to_string()));
        assert_eq!(record_id(&json!({"id": "a-1"})), Some("a-1".to_string()));
        assert_eq!(record_id(&json!({"name": "x"})), None);
    }

    #[tokio::test]
    async fn test_list_and_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/departments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isSuccess": true,
                "responseCode": 200,
                "data": departments()
            })))
            .mount(&server)
            .await;

        let service = service(&server.uri(), "departments");
        assert_eq!(service.list(ListParams::default()).await.unwrap().len(), 2);

        let hits = service.list(ListParams::search("supp")).await.unwrap();
        assert_eq!(hits, vec![departments()[1].clone()]);
    }

    #[tokio::test]
    async fn test_get_missing_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/departments/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isSuccess": true,
                "responseCode": 200,
                "data": null
            })))
            .mount(&server)
            .await;

        let result = service(&server.uri(), "departments").get("9").await;
        assert!(matches!(
            result,
            Err(crate::AppError::Service(ServiceError::RecordNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_create_sends_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/industries"))
            .and(body_partial_json(json!({"name": "Fintech"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isSuccess": true,
                "responseCode": 201,
                "data": {"id": 5, "name": "Fintech"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = service(&server.uri(), "industries")
            .create(Payload::json(json!({"name": "Fintech"})))
            .await
            .unwrap();
        assert_eq!(created["id"], json!(5));
    }

    #[tokio::test]
    async fn test_toggle_status_success() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/departments/2"))
            .and(body_partial_json(json!({"is_active": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isSuccess": true,
                "responseCode": 200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let bus = NotificationBus::new();
        let mut table = ResourceTable::new(service(&server.uri(), "departments"), bus.clone(), 10)
            .unwrap()
            .with_rows(departments());

        let value = table.toggle_status("2").await.unwrap();
        assert_eq!(value, json!(true));
        assert_eq!(table.row("2").unwrap()["is_active"], json!(true));
        assert_eq!(bus.active()[0].severity, Severity::Success);
    }

    #[tokio::test]
    async fn test_toggle_status_rolls_back_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/departments/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isSuccess": false,
                "responseCode": 409,
                "message": "Department has active staff"
            })))
            .mount(&server)
            .await;

        let bus = NotificationBus::new();
        let mut table = ResourceTable::new(service(&server.uri(), "departments"), bus.clone(), 10)
            .unwrap()
            .with_rows(departments());

        let result = table.toggle_status("1").await;
        assert!(result.is_err());
        assert_eq!(table.row("1").unwrap()["is_active"], json!(true));

        let toasts = bus.active();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].severity, Severity::Error);
        assert!(toasts[0].message.contains("Department has active staff"));
    }

    #[tokio::test]
    async fn test_toggle_status_requires_flag_and_row() {
        let mut table = ResourceTable::new(
            service("http://127.0.0.1:9", "transactions"),
            NotificationBus::new(),
            10,
        )
        .unwrap()
        .with_rows(vec![json!({"id": 1})]);
        assert!(table.toggle_status("1").await.is_err());

        let mut table = ResourceTable::new(
            service("http://127.0.0.1:9", "departments"),
            NotificationBus::new(),
            10,
        )
        .unwrap()
        .with_rows(departments());
        assert!(matches!(
            table.toggle_status("42").await,
            Err(crate::AppError::Service(ServiceError::RecordNotFound { .. }))
        ));
    }

    #[test]
    fn test_table_search_paging_and_hidden_columns() {
        let rows: Vec<Value> = (1..=30)
            .map(|i| json!({"id": i, "name": format!("Dept {}", i), "is_active": i % 2 == 0}))
            .collect();
        let mut table = ResourceTable::new(
            service("http://127.0.0.1:9", "departments"),
            NotificationBus::new(),
            10,
        )
        .unwrap()
        .with_rows(rows);

        table.go_to_page(9);
        assert_eq!(table.view().page, 3);

        table.set_query("Dept 1");
        assert_eq!(table.state().page(), 1);
        // Dept 1, 10..=19
        assert_eq!(table.filtered_rows().len(), 11);

        table.hide_columns(&["description".to_string()]).unwrap();
        assert!(!table.columns().get("description").unwrap().visible);
        assert!(table.hide_columns(&["nope".to_string()]).is_err());
        assert!(table.set_page_size(7).is_err());
    }
}
