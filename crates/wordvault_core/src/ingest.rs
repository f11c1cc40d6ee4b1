//! Resumable, throttled, adaptively-batched population runs.

use crate::batch::BatchSizer;
use crate::config::WordlistConfig;
use crate::error::{CoreError, CoreResult};
use crate::meta::{IngestStatus, MetaRecord};
use crate::normalize::normalize_line;
use crate::progress::PopulationProgress;
use crate::source::SourceReader;
use crate::throttle::Throttle;
use crate::transform::RecordTransform;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wordvault_store::{KeyValueStore, Namespace};

/// How often the engine logs a progress summary during a run.
const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Loads a word-list source into the store.
///
/// A run is:
///
/// 1. Pre-scan the source to learn the total line count (skipped when
///    already known from an earlier run)
/// 2. Skip lines already committed, per the resume bookmark
/// 3. Stream: read, throttle, normalize, transform, batch
/// 4. Flush batches sized by the [`BatchSizer`]; after each durable
///    commit, persist the advanced bookmark
/// 5. On completion, verify words were stored and mark the list
///    `Complete`
///
/// Pausing is cooperative: the flag is checked between lines, the
/// current batch is flushed, and status stays `InProgress` so the next
/// run resumes from the bookmark. A commit failure aborts the run
/// without advancing the bookmark, so resuming reprocesses at most the
/// unflushed tail - never loses lines.
pub struct IngestionEngine {
    store: Arc<dyn KeyValueStore>,
    config: WordlistConfig,
    source: PathBuf,
    words_ns: Namespace,
    meta_ns: Namespace,
    pause: Arc<AtomicBool>,
    progress: Arc<PopulationProgress>,
    total_lines: Option<u64>,
}

impl IngestionEngine {
    /// Creates an engine for one word list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration has
    /// no source path.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        config: WordlistConfig,
        words_ns: Namespace,
        meta_ns: Namespace,
        pause: Arc<AtomicBool>,
        progress: Arc<PopulationProgress>,
    ) -> CoreResult<Self> {
        let source = config
            .source
            .clone()
            .ok_or_else(|| CoreError::invalid_config("no source path configured"))?;
        Ok(Self {
            store,
            config,
            source,
            words_ns,
            meta_ns,
            pause,
            progress,
            total_lines: None,
        })
    }

    /// Pre-scans the source for its total line count.
    ///
    /// Aborts early (leaving the total unknown) if a pause was
    /// requested during the scan.
    ///
    /// # Errors
    ///
    /// Surfaces open and read errors from the source.
    pub fn init(&mut self) -> CoreResult<()> {
        if self.total_lines.is_some() {
            return Ok(());
        }

        debug!(source = %self.source.display(), "pre-scanning source for line count");
        let pause = Arc::clone(&self.pause);
        let reader = SourceReader::open(&self.source)?;
        match reader.count_lines(|| !pause.load(Ordering::Acquire))? {
            Some(total) => {
                self.total_lines = Some(total);
                self.progress.set_total_lines(total);
                debug!(total, "pre-scan complete");
            }
            None => debug!("pre-scan aborted by pause request"),
        }
        Ok(())
    }

    /// Runs the population loop until completion or pause.
    ///
    /// # Errors
    ///
    /// Surfaces read errors, commit failures, and
    /// [`CoreError::EmptyPopulation`] when a completed run stored no
    /// words.
    pub fn populate(&mut self) -> CoreResult<()> {
        if self.pause.load(Ordering::Acquire) {
            return Ok(());
        }

        // Resume point and accumulated elapsed time from prior runs.
        let mut meta = MetaRecord::load(self.store.as_ref(), &self.meta_ns)?
            .unwrap_or_else(|| MetaRecord::dirty(&self.config, None));
        let resume_from = meta.last_line;
        let elapsed_base = Duration::from_secs(meta.elapsed_seconds);

        meta.status = IngestStatus::InProgress;
        meta.save(self.store.as_ref(), &self.meta_ns)?;

        let mut transform =
            RecordTransform::for_kind(self.config.list_kind, self.config.chunk_size);
        if let RecordTransform::SampledIndex { next_index } = &mut transform {
            // Continue numbering from the bookmark's checkpoint, not
            // from the store length: a replayed tail (committed but
            // not yet bookmarked) must overwrite its own indices, not
            // append fresh ones.
            *next_index = meta.next_index;
        }

        info!(
            source = %self.source.display(),
            resume_from,
            "starting population run"
        );
        self.progress.start_run(resume_from);
        let run_started = Instant::now();

        let mut reader = SourceReader::open(&self.source)?;
        for _ in 0..resume_from {
            if reader.next_line()?.is_none() {
                break;
            }
        }

        let mut throttle = Throttle::new(self.config.load_factor);
        let mut sizer = BatchSizer::new(self.config.batch);
        let mut batch: Vec<(String, String)> = Vec::new();
        let mut line_no = resume_from;
        let mut last_progress_log = Instant::now();
        let mut paused = false;

        while let Some(line) = reader.next_line()? {
            throttle.sleep();
            line_no += 1;

            match normalize_line(&line, self.config.case_sensitive, self.config.max_word_length) {
                Some(word) => {
                    transform.emit(&word, &mut batch);
                    self.progress.record_line(true);
                }
                None => self.progress.record_line(false),
            }

            if batch.len() >= sizer.current() {
                meta.next_index = transform.next_index();
                self.flush(&mut batch, &mut sizer, &mut meta, line_no, elapsed_base, run_started)?;
            }

            if last_progress_log.elapsed() >= PROGRESS_LOG_INTERVAL {
                info!(progress = %self.progress.summary(), "population in progress");
                last_progress_log = Instant::now();
            }

            if self.pause.load(Ordering::Acquire) {
                paused = true;
                break;
            }
        }

        if !batch.is_empty() {
            meta.next_index = transform.next_index();
            self.flush(&mut batch, &mut sizer, &mut meta, line_no, elapsed_base, run_started)?;
        }

        if paused {
            // Status stays InProgress; bookmark already persisted by
            // the final flush, so the next run resumes exactly here.
            meta.elapsed_seconds = (elapsed_base + run_started.elapsed()).as_secs();
            meta.save(self.store.as_ref(), &self.meta_ns)?;
            self.progress.finish_run();
            info!(line = line_no, "population paused");
            return Ok(());
        }

        let size = self.store.len(&self.words_ns)?;
        if size == 0 {
            self.progress.finish_run();
            return Err(CoreError::EmptyPopulation);
        }

        meta.status = IngestStatus::Complete;
        meta.size = size;
        meta.last_line = line_no;
        meta.elapsed_seconds = (elapsed_base + run_started.elapsed()).as_secs();
        meta.save(self.store.as_ref(), &self.meta_ns)?;
        self.progress.finish_run();

        info!(
            added = self.progress.added(),
            ignored = self.progress.ignored(),
            stored = size,
            elapsed_seconds = meta.elapsed_seconds,
            "population complete"
        );
        Ok(())
    }

    /// Requests a cooperative pause.
    ///
    /// The engine finishes the current line and flush before honoring
    /// it.
    pub fn pause(&self) {
        self.pause.store(true, Ordering::Release);
    }

    /// Human-readable status of the current run.
    #[must_use]
    pub fn status_line(&self) -> String {
        self.progress.summary()
    }

    /// Commits the batch, then advances the bookmark.
    ///
    /// Ordering is the resume guarantee: the bookmark moves only after
    /// its batch is durable, so an interrupted run can only replay,
    /// never skip.
    fn flush(
        &self,
        batch: &mut Vec<(String, String)>,
        sizer: &mut BatchSizer,
        meta: &mut MetaRecord,
        line_no: u64,
        elapsed_base: Duration,
        run_started: Instant,
    ) -> CoreResult<()> {
        let commit_started = Instant::now();
        if let Err(e) = self.store.put_all(&self.words_ns, batch) {
            warn!(error = %e, "batch commit failed, aborting run");
            return Err(e.into());
        }
        let commit_duration = commit_started.elapsed();

        meta.last_line = line_no;
        meta.elapsed_seconds = (elapsed_base + run_started.elapsed()).as_secs();
        meta.save(self.store.as_ref(), &self.meta_ns)?;

        sizer.record_commit(commit_duration);
        batch.clear();
        Ok(())
    }
}
