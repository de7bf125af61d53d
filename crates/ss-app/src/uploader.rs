//! Upload facade
//! 上传门面

use std::sync::Arc;

use ss_core::error::StorageError;
use ss_core::upload::{UploadParameter, UploadResult};

use crate::deps::StorageDeps;
use crate::tasks::{AsyncCallbacks, AsyncTask, TaskRunner};
use crate::usecases::UploadUseCase;

/// Entry point for uploads, blocking or scheduled on the task runner.
#[derive(Clone)]
pub struct Uploader {
    upload: Arc<UploadUseCase>,
    runner: Arc<TaskRunner>,
}

impl Uploader {
    pub fn new(deps: &StorageDeps, runner: Arc<TaskRunner>) -> Self {
        Self {
            upload: Arc::new(UploadUseCase::from_deps(deps)),
            runner,
        }
    }

    /// Runs the upload pipeline on the calling thread.
    pub fn upload(&self, param: &UploadParameter) -> Result<UploadResult, StorageError> {
        self.upload.execute(param)
    }

    /// Schedules the upload and returns immediately.
    pub fn upload_async(
        &self,
        param: UploadParameter,
        callbacks: AsyncCallbacks<UploadResult>,
    ) -> AsyncTask<UploadResult> {
        let upload = self.upload.clone();
        self.runner.spawn(move || upload.execute(&param), callbacks)
    }
}
