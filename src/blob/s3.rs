use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::stream;
use tracing::debug;

use super::{BlobObject, BlobStore};
use crate::error::IoError;

/// S3-backed implementation of BlobStore.
///
/// Every meme image is one object in a single bucket.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3BlobStore for the given bucket.
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Check that the bucket is reachable.
    pub async fn check_connection(&self) -> Result<(), IoError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| IoError::Connection(e.to_string()))?;
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

/// Map an SDK failure to IoError, recognising missing objects.
fn classify_error<E, R>(err: SdkError<E, R>, location: String) -> IoError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let code_is_missing = err
        .as_service_error()
        .and_then(|se| se.code())
        .map(|code| code == "NoSuchKey" || code == "NotFound")
        .unwrap_or(false);

    if code_is_missing {
        return IoError::NotFound(location);
    }

    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            IoError::Connection(format!("{}", aws_sdk_s3::error::DisplayErrorContext(&err)))
        }
        other => {
            let err_str = format!("{}", aws_sdk_s3::error::DisplayErrorContext(&other));
            if err_str.contains("NoSuchKey") || err_str.contains("NotFound") {
                IoError::NotFound(location)
            } else {
                IoError::S3(err_str)
            }
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), IoError> {
        let len = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| classify_error(e, self.location(key)))?;

        debug!(key, bytes = len, "Stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobObject, IoError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_error(e, self.location(key)))?;

        let content_length = resp.content_length().and_then(|n| u64::try_from(n).ok());

        let body = stream::unfold(resp.body, |mut body| async move {
            body.next().await.map(|chunk| {
                (
                    chunk.map_err(|e| IoError::Connection(e.to_string())),
                    body,
                )
            })
        });

        Ok(BlobObject {
            content_length,
            stream: Box::pin(body),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), IoError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify_error(e, self.location(key)))?;

        debug!(key, "Deleted object");
        Ok(())
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services usually need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
