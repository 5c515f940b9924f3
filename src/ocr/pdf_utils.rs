//! PDF text-layer extraction and page rasterization via Poppler.
//!
//! All three tools accept `-upw` for user-password protected files. Poppler
//! reports a missing or wrong password as "Incorrect password", which is
//! mapped to a distinct error so callers can ask for a corrected password.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use thiserror::Error;
use tracing::debug;

use super::utils::check_binary;

/// Errors from the PDF tools.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF is password protected and no password was supplied")]
    PasswordRequired,

    #[error("Incorrect PDF password")]
    IncorrectPassword,

    #[error("{0} not found (install poppler-utils)")]
    ToolNotFound(&'static str),

    #[error("{tool} failed: {message}")]
    Failed { tool: &'static str, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// Missing or wrong password.
    pub fn is_password_error(&self) -> bool {
        matches!(self, Self::PasswordRequired | Self::IncorrectPassword)
    }
}

/// What `pdfinfo` reports about a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdfInfo {
    pub pages: u32,
    pub encrypted: bool,
}

/// Structured-document operations used by the extraction cascade.
pub trait PdfTools: Send + Sync {
    /// Check the password (if any) and read page count and encryption state.
    fn inspect(&self, pdf: &Path, password: Option<&str>) -> Result<PdfInfo, PdfError>;

    /// Extract the embedded text layer without running OCR.
    fn text_layer(&self, pdf: &Path, password: Option<&str>) -> Result<String, PdfError>;

    /// Render every page to a PNG under `out_dir`, returned in page order.
    fn rasterize(
        &self,
        pdf: &Path,
        password: Option<&str>,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, PdfError>;
}

/// Poppler command-line implementation.
pub struct PopplerTools {
    dpi: u32,
}

impl PopplerTools {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    /// Report which Poppler tools are installed.
    pub fn check_tools() -> Vec<(&'static str, bool)> {
        ["pdfinfo", "pdftotext", "pdftoppm"]
            .into_iter()
            .map(|tool| (tool, check_binary(tool)))
            .collect()
    }

    fn run(tool: &'static str, cmd: &mut Command, password: Option<&str>) -> Result<Output, PdfError> {
        handle_cmd_output(tool, cmd.output(), password)
    }
}

impl Default for PopplerTools {
    fn default() -> Self {
        Self::new(300)
    }
}

/// Add `-upw PASSWORD` when a password is supplied.
fn with_password<'a>(cmd: &'a mut Command, password: Option<&str>) -> &'a mut Command {
    if let Some(pw) = password {
        cmd.args(["-upw", pw]);
    }
    cmd
}

/// Map a tool invocation to output or a classified error.
fn handle_cmd_output(
    tool: &'static str,
    output: std::io::Result<Output>,
    password: Option<&str>,
) -> Result<Output, PdfError> {
    match output {
        Ok(out) if out.status.success() => Ok(out),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(classify_failure(tool, &stderr, password.is_some()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PdfError::ToolNotFound(tool)),
        Err(e) => Err(PdfError::Io(e)),
    }
}

fn classify_failure(tool: &'static str, stderr: &str, password_given: bool) -> PdfError {
    if stderr.to_lowercase().contains("incorrect password") {
        if password_given {
            PdfError::IncorrectPassword
        } else {
            PdfError::PasswordRequired
        }
    } else {
        PdfError::Failed {
            tool,
            message: stderr.trim().to_string(),
        }
    }
}

/// Parse `Pages:` and `Encrypted:` from pdfinfo output.
pub fn parse_pdfinfo(stdout: &str) -> PdfInfo {
    let mut info = PdfInfo::default();
    for line in stdout.lines() {
        if let Some(rest) = line.strip_prefix("Pages:") {
            info.pages = rest.trim().parse().unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("Encrypted:") {
            info.encrypted = rest.trim().starts_with("yes");
        }
    }
    info
}

/// Find the image file for a specific page number.
///
/// pdftoppm names files like page-01.png, page-02.png, etc.
/// The padding width varies based on total page count.
pub fn find_page_image(dir: &Path, page_num: u32) -> Option<PathBuf> {
    for digits in [1, 2, 3, 4] {
        let filename = format!("page-{:0width$}.png", page_num, width = digits);
        let path = dir.join(&filename);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Collect page images in page order, starting at page 1.
pub fn collect_page_images(dir: &Path) -> Vec<PathBuf> {
    (1..)
        .map_while(|page| find_page_image(dir, page))
        .collect()
}

impl PdfTools for PopplerTools {
    fn inspect(&self, pdf: &Path, password: Option<&str>) -> Result<PdfInfo, PdfError> {
        let mut cmd = Command::new("pdfinfo");
        with_password(&mut cmd, password).arg(pdf);
        let out = Self::run("pdfinfo", &mut cmd, password)?;
        let info = parse_pdfinfo(&String::from_utf8_lossy(&out.stdout));
        debug!("pdfinfo {}: {:?}", pdf.display(), info);
        Ok(info)
    }

    fn text_layer(&self, pdf: &Path, password: Option<&str>) -> Result<String, PdfError> {
        let mut cmd = Command::new("pdftotext");
        cmd.args(["-layout", "-enc", "UTF-8"]);
        with_password(&mut cmd, password).arg(pdf).arg("-");
        let out = Self::run("pdftotext", &mut cmd, password)?;
        Ok(String::from_utf8_lossy(&out.stdout).to_string())
    }

    fn rasterize(
        &self,
        pdf: &Path,
        password: Option<&str>,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, PdfError> {
        let dpi = self.dpi.to_string();
        let mut cmd = Command::new("pdftoppm");
        cmd.args(["-png", "-r", &dpi]);
        with_password(&mut cmd, password)
            .arg(pdf)
            .arg(out_dir.join("page"));
        Self::run("pdftoppm", &mut cmd, password)?;

        let pages = collect_page_images(out_dir);
        if pages.is_empty() {
            return Err(PdfError::Failed {
                tool: "pdftoppm",
                message: "no page images generated".to_string(),
            });
        }
        Ok(pages)
    }
}
