//! CSV upload (`POST /update_csv`).

use std::path::Path;

use reqwest::multipart::{Form, Part};
use tracing::{info, instrument};

use crate::{
    client::BackendClient,
    error_handler::{BackendError, Result},
};

/// Field delimiter used when the caller does not pick one.
pub const DEFAULT_DELIMITER: char = ';';

impl BackendClient {
    /// Reads `path` and uploads it as the unstructured data source.
    ///
    /// The file must have a `.csv` extension and be valid UTF-8; both are
    /// checked before anything is sent.
    ///
    /// # Errors
    /// [`BackendError::InvalidCsv`] for local rejections, [`BackendError::Io`]
    /// for read failures, and any backend rejection.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn upload_csv(
        &self,
        path: impl AsRef<Path>,
        description: &str,
        delimiter: Option<char>,
    ) -> Result<String> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(BackendError::InvalidCsv("Invalid file type. Please upload a CSV file.".into()));
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.csv")
            .to_string();
        self.upload_csv_bytes(file_name, bytes, description, delimiter).await
    }

    /// Uploads CSV content already in memory.
    ///
    /// # Errors
    /// See [`BackendClient::upload_csv`].
    #[instrument(skip_all, fields(file = %file_name, bytes = bytes.len()))]
    pub async fn upload_csv_bytes(
        &self,
        file_name: String,
        bytes: Vec<u8>,
        description: &str,
        delimiter: Option<char>,
    ) -> Result<String> {
        if std::str::from_utf8(&bytes).is_err() {
            return Err(BackendError::InvalidCsv(
                "The uploaded file is not UTF-8 encoded".into(),
            ));
        }

        let part = Part::bytes(bytes).file_name(file_name).mime_str("text/csv")?;
        let form = Form::new()
            .part("file", part)
            .text("description", description.to_string())
            .text("delimiter", delimiter.unwrap_or(DEFAULT_DELIMITER).to_string());

        let req = self.http.post(self.url("/update_csv")).multipart(form);
        let resp = self.send(req, self.cfg.sync_timeout()).await?;
        let reply = self.reply(resp).await?;
        let message = reply.detail().unwrap_or("CSV file uploaded").to_string();
        info!(%message, "csv uploaded");
        Ok(message)
    }
}
