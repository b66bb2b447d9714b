use std::time::Duration;

use async_trait::async_trait;
use azure_core::{error::ErrorKind, StatusCode};
use azure_storage::{CloudLocation, ConnectionString, StorageCredentials};
use azure_storage::prelude::BlobSasPermissions;
use azure_storage_blobs::prelude::{BlobServiceClient, ClientBuilder};
use time::OffsetDateTime;

use crate::errors::AppError;
use crate::storage::blob_store::BlobStore;

/// Where the blob service lives, resolved from a connection string.
#[derive(Debug, Clone, PartialEq)]
pub enum BlobEndpoint {
    /// `UseDevelopmentStorage=true` (Azurite on the default port).
    Emulator,
    Public { account: String },
    Custom { account: String, uri: String },
}

impl BlobEndpoint {
    pub fn resolve(connection: &ConnectionString<'_>) -> Result<Self, AppError> {
        if connection.use_development_storage == Some(true) {
            return Ok(BlobEndpoint::Emulator);
        }

        let account = connection
            .account_name
            .ok_or_else(|| invalid_connection_string("AccountName is missing"))?
            .to_string();

        Ok(match (connection.blob_endpoint, connection.endpoint_suffix) {
            (Some(uri), _) => BlobEndpoint::Custom {
                account,
                uri: uri.trim_end_matches('/').to_string(),
            },
            (None, Some(suffix)) if suffix != "core.windows.net" => BlobEndpoint::Custom {
                uri: format!("https://{}.blob.{}", account, suffix),
                account,
            },
            (None, _) => BlobEndpoint::Public { account },
        })
    }
}

fn invalid_connection_string(reason: &str) -> AppError {
    AppError::InternalError(format!("Invalid blob storage connection string: {}", reason))
}

fn credentials(connection: &ConnectionString<'_>) -> Result<StorageCredentials, AppError> {
    connection
        .storage_credentials()
        .map_err(|e| invalid_connection_string(&e.to_string()))
}

fn storage_error(action: &str, blob_name: &str, e: azure_core::Error) -> AppError {
    AppError::Storage(format!("{} of {} failed: {}", action, blob_name, e))
}

fn is_not_found(e: &azure_core::Error) -> bool {
    matches!(e.kind(), ErrorKind::HttpResponse { status, .. } if *status == StatusCode::NotFound)
}

/// Azure Blob Storage through the storage SDK, authorized with the account key.
#[derive(Clone)]
pub struct AzureBlobStore {
    service: BlobServiceClient,
}

impl AzureBlobStore {
    pub fn new(connection_string: &str) -> Result<Self, AppError> {
        let connection = ConnectionString::new(connection_string)
            .map_err(|e| invalid_connection_string(&e.to_string()))?;

        let builder = match BlobEndpoint::resolve(&connection)? {
            BlobEndpoint::Emulator => ClientBuilder::emulator(),
            BlobEndpoint::Public { account } => ClientBuilder::new(account, credentials(&connection)?),
            BlobEndpoint::Custom { account, uri } => {
                ClientBuilder::with_location(CloudLocation::Custom { account, uri }, credentials(&connection)?)
            }
        };

        Ok(AzureBlobStore {
            service: builder.blob_service_client(),
        })
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn upload(
        &self,
        container: &str,
        blob_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        self.service
            .container_client(container)
            .blob_client(blob_name)
            .put_block_blob(data)
            .content_type(content_type.to_string())
            .await
            .map_err(|e| storage_error("Upload", blob_name, e))?;

        tracing::debug!(container, blob_name, "Blob uploaded");
        Ok(())
    }

    async fn delete(&self, container: &str, blob_name: &str) -> Result<(), AppError> {
        match self
            .service
            .container_client(container)
            .blob_client(blob_name)
            .delete()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(storage_error("Delete", blob_name, e)),
        }
    }

    async fn read_url(&self, container: &str, blob_name: &str, ttl: Duration) -> Result<String, AppError> {
        let blob = self.service.container_client(container).blob_client(blob_name);
        let permissions = BlobSasPermissions {
            read: true,
            ..Default::default()
        };

        let sas = blob
            .shared_access_signature(permissions, OffsetDateTime::now_utc() + ttl)
            .await
            .map_err(|e| storage_error("Signing", blob_name, e))?;
        let url = blob
            .generate_signed_blob_url(&sas)
            .map_err(|e| storage_error("Signing", blob_name, e))?;

        Ok(url.to_string())
    }
}
