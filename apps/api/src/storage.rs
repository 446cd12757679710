//! Backup store — best-effort archival of raw uploads to S3-compatible storage.
//!
//! Strictly off the critical path: the pipeline dispatches `put` in a
//! detached task and never awaits it. A failed write is logged and swallowed.

use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use tracing::{info, warn};

use crate::analysis::models::UploadedDocument;

pub struct BackupStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl BackupStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Writes the raw upload under a collision-resistant key. Never returns
    /// an error: the outcome is logged and must not influence the request.
    pub async fn put(&self, doc: &UploadedDocument) {
        let key = backup_key(Utc::now().timestamp_millis(), &doc.filename);
        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&doc.content_type)
            .body(ByteStream::from(doc.bytes.clone()))
            .send()
            .await;

        match result {
            Ok(_) => info!("backed up upload to s3://{}/{}", self.bucket, key),
            Err(e) => warn!("backup upload failed (ignored): {e}"),
        }
    }
}

/// `resumes/{epoch_millis}_{filename}` — the timestamp prefix makes repeat
/// uploads of the same file distinct.
fn backup_key(epoch_millis: i64, filename: &str) -> String {
    let name = filename.replace(['/', '\\'], "_");
    let name = if name.is_empty() {
        "upload.pdf"
    } else {
        name.as_str()
    };
    format!("resumes/{epoch_millis}_{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_key_is_timestamp_prefixed() {
        let key = backup_key(1754000000123, "alice_resume.pdf");
        assert_eq!(key, "resumes/1754000000123_alice_resume.pdf");
    }

    #[test]
    fn test_backup_key_flattens_path_separators() {
        let key = backup_key(1, "../etc/passwd");
        assert_eq!(key, "resumes/1_.._etc_passwd");
    }

    #[test]
    fn test_backup_key_handles_empty_filename() {
        let key = backup_key(7, "");
        assert_eq!(key, "resumes/7_upload.pdf");
    }
}
