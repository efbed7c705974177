//! Run orchestration: credentials → rasterise → OCR → compose.
//!
//! A run is strictly sequential and all-or-nothing. The credential blob is
//! checked before anything else, so a missing or malformed key never costs
//! a rasterisation or a network round-trip. Pages are recognised one after
//! another in document order; the first error aborts the run, is reported
//! to the progress callback, and is returned without any partial output.

use crate::config::OcrConfig;
use crate::credentials::ServiceAccountKey;
use crate::error::OcrError;
use crate::output::{DocumentMetadata, OcrOutput, OcrStats, OutputFile, PageText, SavedOutput};
use crate::pipeline::render::PageImage;
use crate::pipeline::vision::{TextRecognizer, VisionClient};
use crate::pipeline::{compose, input, render};
use crate::progress::{PipelineStep, ProgressCallback};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// OCR an in-memory PDF.
///
/// # Arguments
/// * `pdf_bytes`        — raw PDF bytes
/// * `file_name`        — name the PDF was uploaded under; drives output names
/// * `credentials_json` — pasted service-account key
/// * `config`           — run configuration
///
/// # Errors
/// Every failure is fatal; see [`OcrError`] for the taxonomy.
pub async fn ocr_bytes(
    pdf_bytes: Vec<u8>,
    file_name: &str,
    credentials_json: &str,
    config: &OcrConfig,
) -> Result<OcrOutput, OcrError> {
    let result = run(pdf_bytes, file_name, credentials_json, config).await;
    if let (Err(e), Some(cb)) = (&result, &config.progress_callback) {
        cb.on_failure(e);
    }
    result
}

/// OCR a PDF on disk.
pub async fn ocr_file(
    path: impl AsRef<Path>,
    credentials_json: &str,
    config: &OcrConfig,
) -> Result<OcrOutput, OcrError> {
    // The credential check still comes first, ahead of any file I/O.
    if let Err(e) = ServiceAccountKey::from_json(credentials_json) {
        if let Some(ref cb) = config.progress_callback {
            cb.on_failure(&e);
        }
        return Err(e);
    }

    let loaded = match input::load_pdf(path.as_ref()).await {
        Ok(loaded) => loaded,
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_failure(&e);
            }
            return Err(e);
        }
    };
    ocr_bytes(loaded.bytes, &loaded.file_name, credentials_json, config).await
}

/// OCR a PDF and write both downloads into `out_dir`.
///
/// Nothing is written unless the whole run succeeds, and either both files
/// land in `out_dir` or neither does.
pub async fn ocr_to_dir(
    path: impl AsRef<Path>,
    credentials_json: &str,
    out_dir: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<SavedOutput, OcrError> {
    let output = ocr_file(path, credentials_json, config).await?;
    let (text_path, word_path) = save_outputs(&output, out_dir.as_ref()).await?;

    info!(
        "Wrote {} and {}",
        text_path.display(),
        word_path.display()
    );

    Ok(SavedOutput {
        output,
        text_path,
        word_path,
    })
}

/// Synchronous wrapper around [`ocr_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn ocr_file_sync(
    path: impl AsRef<Path>,
    credentials_json: &str,
    config: &OcrConfig,
) -> Result<OcrOutput, OcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(ocr_file(path, credentials_json, config))
}

/// Read PDF metadata without OCR. Needs no credentials.
pub async fn inspect(path: impl AsRef<Path>) -> Result<DocumentMetadata, OcrError> {
    let loaded = input::load_pdf(path.as_ref()).await?;
    render::extract_metadata(loaded.bytes, &loaded.file_name, None).await
}

/// Recognise pages one by one, in order, reporting per-page progress.
///
/// The returned vector has exactly one entry per image, in the same order;
/// a page with no detectable text yields an empty string, not an error.
pub async fn recognize_pages(
    recognizer: &dyn TextRecognizer,
    images: &[PageImage],
    progress: Option<&ProgressCallback>,
) -> Result<Vec<PageText>, OcrError> {
    let total_pages = images.len();
    let mut pages = Vec::with_capacity(total_pages);

    for image in images {
        let page_num = image.page_index + 1;
        if let Some(cb) = progress {
            cb.on_page_start(page_num, total_pages);
        }

        let start = Instant::now();
        let text = recognizer.recognize(page_num, &image.png).await?;
        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Page {}/{}: {} chars in {}ms",
            page_num,
            total_pages,
            text.chars().count(),
            duration_ms
        );

        if let Some(cb) = progress {
            cb.on_page_complete(page_num, total_pages, text.chars().count());
        }

        pages.push(PageText {
            page_num,
            text,
            duration_ms,
        });
    }

    Ok(pages)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run(
    pdf_bytes: Vec<u8>,
    file_name: &str,
    credentials_json: &str,
    config: &OcrConfig,
) -> Result<OcrOutput, OcrError> {
    let total_start = Instant::now();
    let progress = config.progress_callback.as_ref();
    info!("Starting OCR run: {}", file_name);

    // ── Credentials and input checks (no rendering, no network) ──────────
    let key = ServiceAccountKey::from_json(credentials_json)?;
    input::validate_pdf_bytes(&pdf_bytes, file_name)?;
    let recognizer = resolve_recognizer(&key, config).await?;
    drop(key);

    // ── Step 1: Rasterise ────────────────────────────────────────────────
    notify_step(progress, PipelineStep::Rasterizing);
    let render_start = Instant::now();
    let images = render::render_pages(pdf_bytes, file_name, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    let total_pages = images.len();
    info!("Rendered {} pages in {}ms", total_pages, render_duration_ms);
    if let Some(cb) = progress {
        cb.on_pages_rendered(total_pages);
    }

    // ── Step 2: OCR ──────────────────────────────────────────────────────
    notify_step(progress, PipelineStep::Recognizing { total_pages });
    let ocr_start = Instant::now();
    let pages = recognize_pages(recognizer.as_ref(), &images, progress).await?;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    drop(images);

    // ── Step 3: Compose downloads ────────────────────────────────────────
    notify_step(progress, PipelineStep::Composing);
    let (text_document, word_document) = compose::compose_outputs(file_name, &pages)?;

    let stats = OcrStats {
        total_pages,
        empty_pages: pages.iter().filter(|p| p.text.trim().is_empty()).count(),
        render_duration_ms,
        ocr_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "OCR complete: {} pages ({} empty), {}ms total",
        stats.total_pages, stats.empty_pages, stats.total_duration_ms
    );
    if let Some(cb) = progress {
        cb.on_complete(total_pages);
    }

    Ok(OcrOutput {
        source_name: file_name.to_string(),
        pages,
        text_document,
        word_document,
        stats,
    })
}

/// Use the injected recogniser if any, otherwise build a Vision client.
async fn resolve_recognizer(
    key: &ServiceAccountKey,
    config: &OcrConfig,
) -> Result<Arc<dyn TextRecognizer>, OcrError> {
    if let Some(ref recognizer) = config.recognizer {
        return Ok(Arc::clone(recognizer));
    }
    Ok(Arc::new(VisionClient::connect(key, config).await?))
}

fn notify_step(progress: Option<&ProgressCallback>, step: PipelineStep) {
    info!("{}", step);
    if let Some(cb) = progress {
        cb.on_step(step);
    }
}

/// Write both downloads into `out_dir`.
///
/// Both files go to `.tmp` siblings first and are renamed into place only
/// once both temporaries exist. On any failure the temporaries and every
/// file already renamed are removed again.
async fn save_outputs(output: &OcrOutput, out_dir: &Path) -> Result<(PathBuf, PathBuf), OcrError> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| OcrError::OutputWriteFailed {
            path: out_dir.to_path_buf(),
            source: e,
        })?;

    let text_path = out_dir.join(&output.text_document.file_name);
    let word_path = out_dir.join(&output.word_document.file_name);
    let files = [
        (text_path.as_path(), &output.text_document),
        (word_path.as_path(), &output.word_document),
    ];

    let mut committed: Vec<&Path> = Vec::with_capacity(files.len());
    let result = async {
        for (path, file) in &files {
            write_temp(path, file).await?;
        }
        for (path, _) in &files {
            commit(&temp_path(path), path).await?;
            committed.push(*path);
        }
        Ok::<(), OcrError>(())
    }
    .await;

    if let Err(e) = result {
        for (path, _) in &files {
            let _ = tokio::fs::remove_file(temp_path(path)).await;
        }
        for path in &committed {
            let _ = tokio::fs::remove_file(path).await;
        }
        debug!("Rolled back output files in {}", out_dir.display());
        return Err(e);
    }

    Ok((text_path, word_path))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

async fn write_temp(path: &Path, file: &OutputFile) -> Result<(), OcrError> {
    tokio::fs::write(temp_path(path), &file.bytes)
        .await
        .map_err(|e| OcrError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

async fn commit(tmp: &Path, path: &Path) -> Result<(), OcrError> {
    tokio::fs::rename(tmp, path)
        .await
        .map_err(|e| OcrError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::OcrProgressCallback;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Scripted {
        texts: Vec<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextRecognizer for Scripted {
        async fn recognize(&self, page_num: usize, _png: &[u8]) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.texts[page_num - 1].to_string())
        }
    }

    struct FailsOn(usize);

    #[async_trait]
    impl TextRecognizer for FailsOn {
        async fn recognize(&self, page_num: usize, _png: &[u8]) -> Result<String, OcrError> {
            if page_num == self.0 {
                Err(OcrError::QuotaExceeded {
                    detail: "RESOURCE_EXHAUSTED".into(),
                })
            } else {
                Ok("نص".into())
            }
        }
    }

    #[derive(Default)]
    struct Fractions(Mutex<Vec<(usize, usize)>>);

    impl OcrProgressCallback for Fractions {
        fn on_page_complete(&self, page_num: usize, total_pages: usize, _text_len: usize) {
            self.0.lock().unwrap().push((page_num, total_pages));
        }
    }

    fn images(n: usize) -> Vec<PageImage> {
        (0..n)
            .map(|i| PageImage {
                page_index: i,
                width: 1,
                height: 1,
                png: vec![],
            })
            .collect()
    }

    #[tokio::test]
    async fn one_text_per_image_in_order() {
        let rec = Scripted {
            texts: vec!["أول", "", "ثالث"],
            calls: AtomicUsize::new(0),
        };
        let fractions = Arc::new(Fractions::default());
        let cb: ProgressCallback = fractions.clone();

        let pages = recognize_pages(&rec, &images(3), Some(&cb)).await.unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>(),
            vec!["أول", "", "ثالث"]
        );
        assert_eq!(
            pages.iter().map(|p| p.page_num).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(rec.calls.load(Ordering::SeqCst), 3);
        assert_eq!(*fractions.0.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn first_failure_aborts_remaining_pages() {
        let err = recognize_pages(&FailsOn(2), &images(4), None)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::QuotaExceeded { .. }));
    }

    fn sample_output() -> OcrOutput {
        OcrOutput {
            source_name: "report.pdf".into(),
            pages: vec![],
            text_document: OutputFile {
                file_name: "report_OCR.txt".into(),
                mime_type: "text/plain".into(),
                bytes: "\u{202B}نص".as_bytes().to_vec(),
            },
            word_document: OutputFile {
                file_name: "report_OCR.docx".into(),
                mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .into(),
                bytes: b"PK\x03\x04".to_vec(),
            },
            stats: OcrStats::default(),
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn saves_both_files_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let (text_path, word_path) = save_outputs(&sample_output(), &out).await.unwrap();

        assert_eq!(text_path, out.join("report_OCR.txt"));
        assert_eq!(word_path, out.join("report_OCR.docx"));
        assert_eq!(entries(&out), vec!["report_OCR.docx", "report_OCR.txt"]);
    }

    #[tokio::test]
    async fn blocked_docx_path_leaves_no_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let blocker = out.join("report_OCR.docx");
        std::fs::create_dir_all(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        let err = save_outputs(&sample_output(), &out).await.unwrap_err();

        match err {
            OcrError::OutputWriteFailed { path, .. } => assert_eq!(path, blocker),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(entries(&out), vec!["report_OCR.docx"]);
        assert!(blocker.join("keep").exists());
    }

    #[tokio::test]
    async fn no_pages_no_calls() {
        let rec = Scripted {
            texts: vec![],
            calls: AtomicUsize::new(0),
        };
        let pages = recognize_pages(&rec, &[], None).await.unwrap();
        assert!(pages.is_empty());
        assert_eq!(rec.calls.load(Ordering::SeqCst), 0);
    }
}
