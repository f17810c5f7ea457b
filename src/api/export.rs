// src/api/export.rs - CSV downloads from /api/export/<kind>
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Method;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::client::{ApiClient, ApiRequest};
use crate::error::{ApiError, ApiResult};
use crate::query::ApiQuery;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

lazy_static! {
    static ref FILENAME_REGEX: Regex = Regex::new(r"filename=(.+)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ExportKind {
    Conversations,
    AuthLogs,
    Accidents,
    Experiments,
    Environment,
}

impl ExportKind {
    pub fn path(&self) -> String {
        format!("/api/export/{}", self.as_ref())
    }

    pub fn default_filename(&self) -> String {
        format!("{}_export.csv", self.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportRange {
    /// The most recent 1000 rows.
    #[default]
    Recent,
    All,
}

impl ExportRange {
    pub fn as_param(&self) -> &'static str {
        match self {
            ExportRange::Recent => "1000",
            ExportRange::All => "all",
        }
    }
}

impl fmt::Display for ExportRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

impl FromStr for ExportRange {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1000" | "recent" => Ok(ExportRange::Recent),
            "all" => Ok(ExportRange::All),
            other => Err(ApiError::InvalidInput(format!("Unknown export range '{}'", other))),
        }
    }
}

/// Downloaded CSV file.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    /// Writes the file into `dir` under its own name and returns the path.
    pub fn save_into(&self, dir: &Path) -> ApiResult<PathBuf> {
        let name = Path::new(&self.filename)
            .file_name()
            .ok_or_else(|| ApiError::InvalidInput(format!("Invalid export filename '{}'", self.filename)))?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes)?;
        log::info!("Saved export {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }

    fn content(&self) -> &[u8] {
        self.bytes.strip_prefix(UTF8_BOM).unwrap_or(&self.bytes)
    }

    fn reader(&self) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new().flexible(true).from_reader(self.content())
    }

    pub fn headers(&self) -> ApiResult<Vec<String>> {
        let mut reader = self.reader();
        let headers = reader
            .headers()
            .map_err(|e| ApiError::Decode(format!("Invalid CSV header: {}", e)))?;
        Ok(headers.iter().map(str::to_string).collect())
    }

    /// Data rows, excluding the header line.
    pub fn row_count(&self) -> ApiResult<usize> {
        let mut count = 0;
        for record in self.reader().records() {
            record.map_err(|e| ApiError::Decode(format!("Invalid CSV row: {}", e)))?;
            count += 1;
        }
        Ok(count)
    }
}

/// Extracts the filename of a `Content-Disposition` header value.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let captures = FILENAME_REGEX.captures(value)?;
    let raw = captures.get(1)?.as_str();
    let raw = raw.split(';').next().unwrap_or(raw);
    let name = raw.trim().trim_matches('"').trim_matches('\'').trim();
    (!name.is_empty()).then(|| name.to_string())
}

pub async fn download_export(client: &ApiClient, kind: ExportKind, range: ExportRange) -> ApiResult<ExportFile> {
    let query = ApiQuery::new().param("limit", range).build();
    let request = ApiRequest::new(Method::GET, format!("{}{}", kind.path(), query));
    let response = client.fetch_raw(request).await?;

    let filename = response
        .header_str("content-disposition")
        .and_then(parse_content_disposition)
        .unwrap_or_else(|| kind.default_filename());

    log::info!("Downloaded {} export as {}", kind, filename);
    Ok(ExportFile {
        filename,
        bytes: response.bytes,
    })
}
