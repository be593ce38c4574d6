use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, channel, TryRecvError},
        Arc,
    },
};

use crate::assets::bundle::AssetBundle;

const READ_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("failed to load buffers of {}", .path.display())]
    Buffers {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("failed to decode {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },
    #[error("loading {} was cancelled", .path.display())]
    Cancelled { path: PathBuf },
    #[error("loader thread for {} exited without a result", .path.display())]
    WorkerLost { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl LoadProgress {
    /// `None` when the total size is unknown.
    pub fn ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| self.loaded as f64 / self.total as f64)
    }

    pub fn percentage(&self) -> Option<f64> {
        self.ratio().map(|ratio| ratio * 100.0)
    }
}

pub type LoadResult = Result<AssetBundle, LoadError>;

/// An in-flight asset load. Dropping the handle cancels the load.
pub struct LoadHandle {
    path: PathBuf,
    progress: mpsc::Receiver<LoadProgress>,
    result: mpsc::Receiver<LoadResult>,
    cancelled: Arc<AtomicBool>,
}

impl LoadHandle {
    /// Progress reports received since the last call.
    pub fn poll_progress(&self) -> impl Iterator<Item = LoadProgress> + '_ {
        self.progress.try_iter()
    }

    /// The final result, once available.
    pub fn try_result(&self) -> Option<LoadResult> {
        match self.result.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LoadError::WorkerLost {
                path: self.path.clone(),
            })),
        }
    }

    /// Blocks until the load finishes.
    pub fn wait(&self) -> LoadResult {
        self.result.recv().unwrap_or_else(|_| {
            Err(LoadError::WorkerLost {
                path: self.path.clone(),
            })
        })
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Drop for LoadHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct AssetLoader;

impl AssetLoader {
    /// Starts loading a glTF/GLB file on a worker thread.
    pub fn load(path: impl Into<PathBuf>) -> LoadHandle {
        let path = path.into();
        let (send_progress, recv_progress) = channel();
        let (send_result, recv_result) = channel();
        let cancelled = Arc::new(AtomicBool::new(false));

        let worker_path = path.clone();
        let worker_cancelled = cancelled.clone();
        let worker_send_result = send_result.clone();

        let spawned = std::thread::Builder::new()
            .name("asset-loader".to_string())
            .spawn(move || {
                let result = load_asset(&worker_path, &send_progress, &worker_cancelled);
                // The handle may already be gone, in which case nobody is listening.
                let _ = worker_send_result.send(result);
            });

        if let Err(e) = spawned {
            log::error!("Failed to spawn asset loader thread: {}", e);
            let _ = send_result.send(Err(LoadError::Io {
                path: path.clone(),
                source: e,
            }));
        }

        LoadHandle {
            path,
            progress: recv_progress,
            result: recv_result,
            cancelled,
        }
    }
}

fn load_asset(
    path: &Path,
    progress: &mpsc::Sender<LoadProgress>,
    cancelled: &AtomicBool,
) -> LoadResult {
    let bytes = read_with_progress(path, progress, cancelled)?;

    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(&bytes).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let buffers =
        gltf::import_buffers(&document, path.parent(), blob).map_err(|source| {
            LoadError::Buffers {
                path: path.to_path_buf(),
                source,
            }
        })?;

    if cancelled.load(Ordering::Relaxed) {
        return Err(LoadError::Cancelled {
            path: path.to_path_buf(),
        });
    }

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Asset".to_string());

    AssetBundle::from_gltf(name, &document, &buffers).map_err(|e| LoadError::Decode {
        path: path.to_path_buf(),
        message: format!("{:#}", e),
    })
}

fn read_with_progress(
    path: &Path,
    progress: &mpsc::Sender<LoadProgress>,
    cancelled: &AtomicBool,
) -> Result<Vec<u8>, LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_error)?;
    let total = file.metadata().map_err(io_error)?.len();

    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        if cancelled.load(Ordering::Relaxed) {
            return Err(LoadError::Cancelled {
                path: path.to_path_buf(),
            });
        }

        let read = match file.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_error(e)),
        };

        bytes.extend_from_slice(&chunk[..read]);

        let _ = progress.send(LoadProgress {
            loaded: bytes.len() as u64,
            total,
        });
    }

    Ok(bytes)
}
