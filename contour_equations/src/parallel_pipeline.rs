// THEORY:
// The `parallel_pipeline` module lets a caller vectorize many images at once. A single
// image is always processed synchronously by `EquationPipeline`; parallelism lives one
// level up, with one job per image.
//
// Key architectural principles:
// 1.  **Worker Pool**: A dispatcher hands jobs round-robin to a fixed set of worker
//     tasks. Each worker runs the CPU-bound pipeline on tokio's blocking pool and sends
//     the result back over a oneshot channel.
// 2.  **Nothing Shared**: Every job owns its bytes and its config. Workers share no
//     mutable state, so there is no locking around the pipeline itself.
// 3.  **Bounded Wall Clock**: The pipeline has no internal cancellation. A large noisy
//     image at a tiny tolerance can take a while, so the pool can put a timeout on each
//     job and report it as a `Processing` error. The blocking thread finishes in the
//     background; its result is dropped.
// 4.  **Ordered Batches**: `process_batch` returns results in submission order no matter
//     which worker finishes first.

use crate::error::PipelineError;
use crate::pipeline::{EquationPipeline, EquationReport, PipelineConfig};
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinError;
use tracing::{debug, warn};

pub type JobResult = Result<EquationReport, PipelineError>;

/// Sizing and limits for the worker pool.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    pub worker_count: usize,
    /// Per-image wall-clock limit. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().max(1),
            timeout: None,
        }
    }
}

/// One encoded image waiting to be vectorized.
#[derive(Debug, Clone)]
pub struct ImageJob {
    pub job_id: u64,
    pub bytes: Vec<u8>,
    pub config: PipelineConfig,
}

pub struct JobTask {
    pub job: ImageJob,
    pub result_sender: oneshot::Sender<JobResult>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<JobTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the dispatcher and workers. Must be called inside a tokio runtime.
    pub fn new(parallel: &ParallelConfig) -> Self {
        let worker_count = parallel.worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<JobTask>();
        let mut workers = Vec::with_capacity(worker_count);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<JobTask>())
            .unzip();

        // Spawn dispatcher
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(mpsc::error::SendError(task)) = worker_senders[worker_idx].send(task) {
                    let _ = task
                        .result_sender
                        .send(Err(PipelineError::processing("worker is no longer running")));
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        // Spawn workers
        for (worker_id, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let timeout = parallel.timeout;
            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let job_id = task.job.job_id;
                    debug!(worker_id, job_id, "job started");
                    let result = Self::run_job(task.job, timeout).await;
                    if let Err(err) = &result {
                        warn!(worker_id, job_id, kind = %err.kind(), "job failed: {}", err.message());
                    }
                    let _ = task.result_sender.send(result);
                }
            });
            workers.push(worker);
        }

        Self { task_sender, workers }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    async fn run_job(job: ImageJob, timeout: Option<Duration>) -> JobResult {
        let ImageJob { bytes, config, .. } = job;
        let handle = tokio::task::spawn_blocking(move || EquationPipeline::new(config).process(&bytes));

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    return Err(PipelineError::processing(format!(
                        "processing timed out after {} ms",
                        limit.as_millis()
                    )));
                }
            },
            None => handle.await,
        };

        Self::flatten_join(joined)
    }

    /// A panicked or cancelled blocking task becomes a `Processing` error.
    fn flatten_join(joined: Result<JobResult, JoinError>) -> JobResult {
        joined.unwrap_or_else(|err| {
            Err(PipelineError::processing(format!("worker stopped unexpectedly: {err}")))
        })
    }

    pub async fn process_job(&self, job: ImageJob) -> JobResult {
        let (result_sender, result_receiver) = oneshot::channel();

        self.task_sender
            .send(JobTask { job, result_sender })
            .map_err(|_| PipelineError::processing("Failed to send task to worker pool"))?;

        result_receiver
            .await
            .map_err(|_| PipelineError::processing("Failed to receive result from worker"))?
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

pub struct ParallelPipeline {
    config: PipelineConfig,
    worker_pool: WorkerPool,
    job_counter: AtomicU64,
}

impl ParallelPipeline {
    pub fn new(config: PipelineConfig, parallel: ParallelConfig) -> Self {
        Self {
            config,
            worker_pool: WorkerPool::new(&parallel),
            job_counter: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    /// Vectorizes one encoded image on the pool.
    pub async fn process(&self, image_bytes: Vec<u8>) -> JobResult {
        let job = ImageJob {
            job_id: self.job_counter.fetch_add(1, Ordering::Relaxed),
            bytes: image_bytes,
            config: self.config.clone(),
        };
        self.worker_pool.process_job(job).await
    }

    /// Vectorizes many images concurrently; results follow input order.
    pub async fn process_batch(&self, images: Vec<Vec<u8>>) -> Vec<JobResult> {
        join_all(images.into_iter().map(|bytes| self.process(bytes))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pipeline::NO_EQUATIONS_FALLBACK;
    use image::{ImageEncoder, Rgb, RgbImage};

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(&mut out)
            .write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgb8)
            .expect("Error encoding PNG.");
        out
    }

    fn square(size: u32) -> Vec<u8> {
        let mut img = RgbImage::from_pixel(size, size, Rgb([255, 255, 255]));
        for y in size / 4..size * 3 / 4 {
            for x in size / 4..size * 3 / 4 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        encode_png(&img)
    }

    fn pipeline(workers: usize) -> ParallelPipeline {
        ParallelPipeline::new(
            PipelineConfig::with_tolerance(0.005),
            ParallelConfig { worker_count: workers, timeout: None },
        )
    }

    #[tokio::test]
    async fn batch_results_follow_submission_order() {
        let blank = encode_png(&RgbImage::from_pixel(24, 24, Rgb([9, 9, 9])));
        let pool = pipeline(3);
        let results = pool
            .process_batch(vec![square(40), blank.clone(), b"nope".to_vec(), square(56)])
            .await;

        assert_eq!(results.len(), 4);
        let first = results[0].as_ref().expect("square");
        assert_eq!(first.image_width, 40);
        let second = results[1].as_ref().expect("blank");
        assert_eq!(second.text(), NO_EQUATIONS_FALLBACK);
        assert_eq!(results[2].as_ref().unwrap_err().kind(), ErrorKind::Decode);
        assert_eq!(results[3].as_ref().expect("square").image_width, 56);
    }

    #[tokio::test]
    async fn parallel_and_sequential_agree() {
        let bytes = square(48);
        let pool = pipeline(2);
        let parallel = pool.process(bytes.clone()).await.expect("parallel");
        let sequential = EquationPipeline::new(pool.config().clone()).process(&bytes).expect("sequential");
        assert_eq!(parallel.text(), sequential.text());
    }

    #[tokio::test]
    async fn invalid_config_surfaces_as_validation_error() {
        let pool = ParallelPipeline::new(
            PipelineConfig::with_tolerance(-1.0),
            ParallelConfig { worker_count: 1, timeout: Some(Duration::from_secs(30)) },
        );
        let err = pool.process(square(32)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn slow_job_times_out_as_processing_error() {
        let pool = ParallelPipeline::new(
            PipelineConfig::with_tolerance(0.001),
            ParallelConfig { worker_count: 1, timeout: Some(Duration::from_nanos(1)) },
        );
        let err = pool.process(square(1500)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Processing);
        assert!(err.message().contains("timed out"), "{}", err.message());
    }

    #[tokio::test]
    async fn panicking_job_becomes_processing_error() {
        let handle = tokio::task::spawn_blocking(|| -> JobResult { panic!("canny assertion") });
        let err = WorkerPool::flatten_join(handle.await).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Processing);
        assert!(err.message().contains("worker stopped unexpectedly"));
    }

    #[tokio::test]
    async fn finished_job_passes_through_join() {
        let handle = tokio::task::spawn_blocking(|| -> JobResult { Err(PipelineError::decode("bad")) });
        let err = WorkerPool::flatten_join(handle.await).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn zero_workers_is_clamped_to_one() {
        assert_eq!(pipeline(0).worker_count(), 1);
    }
}
