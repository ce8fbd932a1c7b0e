//! Public image hosting.

use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use futures::future::BoxFuture;
use tracing::info;

use crate::config::Config;
use crate::error::KeywordError;

/// Destination for generated images.
pub trait ImageStore: Send + Sync {
    fn bucket(&self) -> &str;

    fn public_url(&self, key: &str) -> String;

    fn put_object<'a>(
        &'a self,
        key: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<(), KeywordError>>;
}

/// S3 bucket made public through a bucket policy (ACLs stay disabled).
pub struct S3ImageStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
}

impl S3ImageStore {
    /// `None` unless both access key and secret are configured.
    pub fn from_config(cfg: &Config) -> Option<Self> {
        let (access_key, secret_key) = cfg.s3_credentials()?;
        let bucket = cfg.s3_bucket()?.to_string();
        let credentials = Credentials::new(access_key, secret_key, None, None, "environment");
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(cfg.aws_region.clone()))
            .credentials_provider(credentials)
            .build();
        Some(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket,
            region: cfg.aws_region.clone(),
        })
    }
}

impl ImageStore for S3ImageStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.bucket, &self.region, key)
    }

    fn put_object<'a>(
        &'a self,
        key: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<(), KeywordError>> {
        Box::pin(async move {
            let size = bytes.len();
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(ByteStream::from(bytes))
                .content_type(content_type)
                .send()
                .await
                .map_err(upload_error)?;
            info!(bucket = %self.bucket, key, size, "uploaded image");
            Ok(())
        })
    }
}

/// SDK errors print only their outermost layer; keep the whole source chain.
fn upload_error<E: std::error::Error>(e: E) -> KeywordError {
    KeywordError::Storage(DisplayErrorContext(e).to_string())
}

/// Virtual-hosted-style URL: `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
pub fn public_object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{bucket}.s3.{region}.amazonaws.com/{key}")
}

/// Content type implied by a filename, for uploads the generator left untyped.
pub fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        "image/png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_is_virtual_hosted() {
        assert_eq!(
            public_object_url("arb-imgs", "us-east-2", "hero.png"),
            "https://arb-imgs.s3.us-east-2.amazonaws.com/hero.png"
        );
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("anim.gif"), "image/gif");
        assert_eq!(content_type_for("x.webp"), "image/webp");
        assert_eq!(content_type_for("noext"), "image/png");
    }

    #[test]
    fn upload_error_keeps_source_chain() {
        use aws_sdk_s3::config::http::HttpResponse;
        use aws_sdk_s3::error::SdkError;
        use aws_sdk_s3::operation::put_object::PutObjectError;

        let err = SdkError::<PutObjectError, HttpResponse>::construction_failure(
            "bucket name must not be empty",
        );
        let message = upload_error(err).to_string();
        assert!(message.starts_with("Failed to upload image to S3: "), "{message}");
        assert!(message.contains("bucket name must not be empty"), "{message}");
    }

    #[tokio::test]
    async fn store_requires_credentials() {
        assert!(S3ImageStore::from_config(&Config::default()).is_none());

        let cfg = Config {
            aws_access_key_id: Some("AKIA".into()),
            aws_secret_access_key: Some("secret".into()),
            ..Config::default()
        };
        let store = S3ImageStore::from_config(&cfg).unwrap();
        assert_eq!(store.bucket(), "arb-imgs");
    }
}
