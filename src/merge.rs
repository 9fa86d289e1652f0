use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{Error, Image, Layout, LoadReport, Overflow, Role};

/// Where one run reads its programs and writes its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub code: PathBuf,
    pub handler: PathBuf,
    pub output: PathBuf,
    pub overflow: Overflow,
    pub layout: Layout,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            code: PathBuf::from("code.txt"),
            handler: PathBuf::from("code_handler.txt"),
            output: PathBuf::from("im_data.txt"),
            overflow: Overflow::default(),
            layout: Layout::DEFAULT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub image: Image,
    pub primary: LoadReport,
    /// `None` when the handler program couldn't be read and was skipped.
    pub handler: Option<LoadReport>,
    pub output: PathBuf,
}

/// Builds the image for `job` and writes it out.
///
/// A missing primary program ends the run before anything is written. A
/// missing handler program is logged and skipped.
pub fn build(job: &Job) -> Result<Summary, Error> {
    let mut image = Image::new(job.layout).overflow(job.overflow);

    let source = read_source(Role::Primary, &job.code)?;
    let primary = image.load_primary(&source)?;
    log_load(&job.code, &primary);

    let handler = match read_source(Role::Handler, &job.handler) {
        Ok(source) => {
            let report = image.load_handler(&source)?;
            log_load(&job.handler, &report);
            Some(report)
        },
        Err(Error::SourceUnavailable { path, source, .. }) => {
            warn!(path = %path.display(), "cannot read handler program ({source}), skipped");
            None
        },
        Err(e) => return Err(e),
    };

    image.persist(&job.output)?;
    info!(path = %job.output.display(), words = image.words().len(), "wrote image");

    Ok(Summary { image, primary, handler, output: job.output.clone() })
}

fn read_source(role: Role, path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|source| Error::SourceUnavailable {
        role,
        path: path.to_path_buf(),
        source,
    })
}

fn log_load(path: &Path, report: &LoadReport) {
    debug!(
        path = %path.display(),
        start = report.region.start,
        end = report.region.end(),
        "loaded {}", report.role
    );

    if let Some(m) = &report.truncated {
        warn!(path = %path.display(), "{} stops at malformed token {m}", report.role);
    }
    if report.dropped > 0 {
        warn!(path = %path.display(), dropped = report.dropped, "{} runs past the end of the image, truncated", report.role);
    }
    if report.overlap > 0 {
        warn!(path = %path.display(), words = report.overlap, "{} overwrites the tail of the primary program", report.role);
    }
}
