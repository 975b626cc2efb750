use crate::Result;
use async_trait::async_trait;

/// Common parameters for listing resources
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Free-text filter applied to every field value
    pub search: Option<String>,
}

impl ListParams {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: Some(query.into()),
        }
    }
}

/// Trait for services that can list resources
#[async_trait]
pub trait ListService<T> {
    /// List all resources matching the given parameters
    async fn list(&self, params: ListParams) -> Result<Vec<T>>;
}

/// Trait for services that can retrieve individual resources
#[async_trait]
pub trait GetService<T> {
    async fn get(&self, id: &str) -> Result<T>;
}

#[async_trait]
pub trait CreateService<T, CreateInput> {
    async fn create(&self, input: CreateInput) -> Result<T>;
}

#[async_trait]
pub trait UpdateService<T, UpdateInput> {
    async fn update(&self, id: &str, input: UpdateInput) -> Result<T>;
}

#[async_trait]
pub trait DeleteService {
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Combined CRUD trait for full resource management
pub trait CrudService<T, CreateInput, UpdateInput>:
    ListService<T>
    + GetService<T>
    + CreateService<T, CreateInput>
    + UpdateService<T, UpdateInput>
    + DeleteService
{
}

impl<S, T, C, U> CrudService<T, C, U> for S where
    S: ListService<T> + GetService<T> + CreateService<T, C> + UpdateService<T, U> + DeleteService
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;

    // In-memory service for exercising the trait seams
    struct StaticNames;

    #[async_trait]
    impl ListService<String> for StaticNames {
        async fn list(&self, params: ListParams) -> Result<Vec<String>> {
            let names = vec!["Acme".to_string(), "Globex".to_string()];
            Ok(match params.search {
                Some(query) => names
                    .into_iter()
                    .filter(|name| name.to_lowercase().contains(&query.to_lowercase()))
                    .collect(),
                None => names,
            })
        }
    }

    #[async_trait]
    impl GetService<String> for StaticNames {
        async fn get(&self, id: &str) -> Result<String> {
            match id {
                "1" => Ok("Acme".to_string()),
                _ => Err(ServiceError::RecordNotFound {
                    resource: "names".to_string(),
                    id: id.to_string(),
                }
                .into()),
            }
        }
    }

    #[tokio::test]
    async fn test_list_service() {
        let service = StaticNames;
        assert_eq!(service.list(ListParams::default()).await.unwrap().len(), 2);
        assert_eq!(
            service.list(ListParams::search("glo")).await.unwrap(),
            vec!["Globex".to_string()]
        );
    }

    #[tokio::test]
    async fn test_get_service() {
        let service = StaticNames;
        assert_eq!(service.get("1").await.unwrap(), "Acme");
        assert!(service.get("9").await.is_err());
    }

    #[test]
    fn test_list_params_default() {
        assert!(ListParams::default().search.is_none());
    }
}
